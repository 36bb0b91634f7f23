//! Filling in a loaded form and previewing the email.

use serde_json::Value;

use crate::config::MailformConfig;
use crate::error::MailformResult;
use crate::import::LoadedArtifacts;
use crate::schema::{FormDocument, FormSchema, FormValues};
use crate::template::{Template, TemplateError};
use crate::visibility::{active_fields, active_schema, ActiveFields};

/// Loaded artifacts plus the values entered so far.
///
/// Everything derived from the values (active fields, preview) is
/// recomputed on each call.
#[derive(Debug, Clone)]
pub struct FormSession {
    form: FormDocument,
    template_src: String,
    /// `Err` when the template does not compile; the preview then shows the
    /// error fragment
    template: Result<Template, TemplateError>,
    values: FormValues,
    error_fragment: String,
}

impl FormSession {
    pub fn new(artifacts: LoadedArtifacts) -> Self {
        Self::with_config(artifacts, &MailformConfig::default())
    }

    pub fn with_config(artifacts: LoadedArtifacts, config: &MailformConfig) -> Self {
        let template = Template::compile(&artifacts.template);
        if let Err(err) = &template {
            log::warn!("template '{}' does not compile: {}", artifacts.template_file, err);
        }
        let mut session = Self {
            form: artifacts.form,
            template_src: artifacts.template,
            template,
            values: FormValues::new(),
            error_fragment: config.render_error_fragment.clone(),
        };
        session.apply_defaults();
        session
    }

    /// Seed values from property defaults
    fn apply_defaults(&mut self) {
        for (name, property) in self.form.schema.properties.iter() {
            if let Some(default) = &property.default {
                self.values.insert(name.to_string(), default.clone());
            }
        }
    }

    pub fn form(&self) -> &FormDocument {
        &self.form
    }

    pub fn schema(&self) -> &FormSchema {
        &self.form.schema
    }

    pub fn template_source(&self) -> &str {
        &self.template_src
    }

    /// The compile error of the template, if any
    pub fn template_error(&self) -> Option<&TemplateError> {
        self.template.as_ref().err()
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn set_value(&mut self, field: impl Into<String>, value: Value) {
        self.values.insert(field.into(), value);
    }

    pub fn remove_value(&mut self, field: &str) -> Option<Value> {
        self.values.remove(field)
    }

    /// Replace all values at once
    pub fn set_values(&mut self, values: FormValues) {
        self.values = values;
    }

    pub fn active_fields(&self) -> ActiveFields {
        active_fields(&self.form.schema, &self.values)
    }

    pub fn active_schema(&self) -> FormSchema {
        active_schema(&self.form.schema, &self.values)
    }

    /// Values the email should see: everything except hidden fields
    pub fn visible_values(&self) -> FormValues {
        let active = self.active_fields();
        self.values
            .iter()
            .filter(|(name, _)| !active.is_hidden(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Render the email with the visible values. Never fails: a broken
    /// template renders as the configured error fragment.
    pub fn preview(&self) -> String {
        match &self.template {
            Ok(template) => template.render(&self.visible_values()),
            Err(_) => self.error_fragment.clone(),
        }
    }

    /// Render, reporting a broken template instead of hiding it
    pub fn try_preview(&self) -> MailformResult<String> {
        match &self.template {
            Ok(template) => Ok(template.render(&self.visible_values())),
            Err(err) => Err(err.clone().into()),
        }
    }

    /// Active required fields without a usable value (missing, null, blank
    /// string or empty list)
    pub fn missing_required(&self) -> Vec<String> {
        self.active_fields()
            .required
            .into_iter()
            .filter(|field| !has_value(self.values.get(field)))
            .collect()
    }

    /// True when every active required field has a value
    pub fn is_complete(&self) -> bool {
        self.missing_required().is_empty()
    }
}

fn has_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}
