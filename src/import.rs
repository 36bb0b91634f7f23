//! Loading exported artifacts back for rendering.
//!
//! Files are matched by name, tolerating the numeric suffix browsers add to
//! repeated downloads (`schema (2).json`).

use regex::Regex;
use serde_json::Value;
use std::path::Path;

use crate::config::{split_file_name, MailformConfig};
use crate::error::{MailformError, MailformResult};
use crate::schema::{FormDocument, FormSchema, PropertyType, UiSchema};

/// A named text blob, as picked by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub name: String,
    pub contents: String,
}

impl ArtifactFile {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// Read a file; its name is the path's final component
    pub fn read(path: impl AsRef<Path>) -> MailformResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { name, contents })
    }
}

/// The form description and template, parsed and ready to render
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedArtifacts {
    pub form: FormDocument,
    pub template: String,
    pub schema_file: String,
    pub template_file: String,
}

/// Pattern for `expected` (`schema.json`) plus an optional ` (N)` suffix
/// before the extension
fn artifact_regex(expected: &str) -> MailformResult<Regex> {
    let pattern = match split_file_name(expected) {
        (stem, "") => format!(r"^{}(\s*\(\d+\))?$", regex::escape(stem)),
        (stem, ext) => format!(
            r"^{}(\s*\(\d+\))?\.{}$",
            regex::escape(stem),
            regex::escape(ext)
        ),
    };
    Regex::new(&pattern).map_err(|e| MailformError::ValidationError(e.to_string()))
}

/// Whether `file_name` (a bare name or a path) is the artifact `expected`
pub fn matches_artifact(file_name: &str, expected: &str) -> bool {
    let base = Path::new(file_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string());
    match artifact_regex(expected) {
        Ok(re) => re.is_match(&base),
        Err(err) => {
            log::warn!("cannot match artifact '{}': {}", expected, err);
            false
        }
    }
}

/// Pick the two artifacts out of `files` and parse them.
///
/// The form description is looked up first; a missing file is reported
/// before anything is parsed.
pub fn load_artifacts(files: &[ArtifactFile], config: &MailformConfig) -> MailformResult<LoadedArtifacts> {
    let find = |expected: &str| {
        let found = files.iter().find(|f| matches_artifact(&f.name, expected));
        log::debug!(
            "artifact '{}': {}",
            expected,
            found.map(|f| f.name.as_str()).unwrap_or("not found")
        );
        found.ok_or_else(|| MailformError::MissingArtifact {
            artifact: expected.to_string(),
        })
    };

    let schema_file = find(&config.schema_file_name)?;
    let template_file = find(&config.template_file_name)?;

    let form = parse_form_document(&schema_file.name, &schema_file.contents)?;
    log::info!(
        "loaded {} fields from '{}' and template '{}'",
        form.schema.properties.len(),
        schema_file.name,
        template_file.name
    );
    Ok(LoadedArtifacts {
        form,
        template: template_file.contents.clone(),
        schema_file: schema_file.name.clone(),
        template_file: template_file.name.clone(),
    })
}

/// Read files from disk, then [`load_artifacts`]
pub fn load_artifacts_from_paths<P: AsRef<Path>>(
    paths: &[P],
    config: &MailformConfig,
) -> MailformResult<LoadedArtifacts> {
    let files = paths
        .iter()
        .map(ArtifactFile::read)
        .collect::<MailformResult<Vec<_>>>()?;
    load_artifacts(&files, config)
}

/// Parse a form description: either `{"schema": ..., "uiSchema": ...}` or a
/// bare schema object
pub fn parse_form_document(file: &str, contents: &str) -> MailformResult<FormDocument> {
    let malformed = |message: String| MailformError::MalformedFormDocument {
        file: file.to_string(),
        message,
    };

    let value: Value = serde_json::from_str(contents).map_err(|e| malformed(e.to_string()))?;
    let is_wrapped = value
        .as_object()
        .map(|map| map.contains_key("schema"))
        .ok_or_else(|| malformed("expected a JSON object".to_string()))?;

    let form = if is_wrapped {
        serde_json::from_value::<FormDocument>(value).map_err(|e| malformed(e.to_string()))?
    } else {
        let schema =
            serde_json::from_value::<FormSchema>(value).map_err(|e| malformed(e.to_string()))?;
        FormDocument {
            schema,
            ui_schema: UiSchema::new(),
        }
    };

    if form.schema.schema_type != PropertyType::Object {
        return Err(malformed("top-level type must be \"object\"".to_string()));
    }
    Ok(form)
}
