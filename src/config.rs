use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{MailformError, MailformResult};
use crate::validator::validate_color;

/// What to do when two labels normalize to the same identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Append `_2`, `_3`, ... to later identifiers
    #[default]
    Disambiguate,
    /// Let colliding labels share one field
    Merge,
}

/// Export and render settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailformConfig {
    /// `<title>` of the exported template document
    pub document_title: String,
    /// Width of the centered email container, in pixels
    pub container_max_width: u32,
    pub page_background: String,
    pub container_background: String,
    pub template_file_name: String,
    pub schema_file_name: String,
    pub collision_policy: CollisionPolicy,
    /// Shown in place of the preview when a template cannot be rendered
    pub render_error_fragment: String,
}

impl Default for MailformConfig {
    fn default() -> Self {
        Self {
            document_title: "Email Template".to_string(),
            container_max_width: 600,
            page_background: "#f4f4f4".to_string(),
            container_background: "#ffffff".to_string(),
            template_file_name: "template.html".to_string(),
            schema_file_name: "schema.json".to_string(),
            collision_policy: CollisionPolicy::default(),
            render_error_fragment: crate::template::RENDER_ERROR_FRAGMENT.to_string(),
        }
    }
}

impl MailformConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML config. Missing keys keep their defaults.
    pub fn from_yaml(src: &str) -> MailformResult<Self> {
        if src.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: MailformConfig =
            serde_yaml::from_str(src).map_err(|e| MailformError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML config file
    pub fn load(path: impl AsRef<Path>) -> MailformResult<Self> {
        let src = std::fs::read_to_string(path.as_ref())?;
        log::debug!("loaded config from {}", path.as_ref().display());
        Self::from_yaml(&src)
    }

    pub fn validate(&self) -> MailformResult<()> {
        validate_color(&self.page_background, "page_background")?;
        validate_color(&self.container_background, "container_background")?;
        Ok(())
    }
}

/// Split `name.ext` into `("name", "ext")`; names without a dot get an empty extension
pub(crate) fn split_file_name(name: &str) -> (&str, &str) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (name, ""),
    }
}
