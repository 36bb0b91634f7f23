use thiserror::Error;

use crate::template::TemplateError;

pub type MailformResult<T> = Result<T, MailformError>;

#[derive(Error, Debug, Clone)]
pub enum MailformError {
    #[error("Layout parse error: {0}")]
    LayoutParse(String),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Layout is empty")]
    EmptyLayout,

    #[error("Unknown block '{id}'")]
    UnknownBlock { id: String },

    #[error("Unknown column '{column}' in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Duplicate block id '{id}': block ids must be unique within the layout")]
    DuplicateBlockId { id: String },

    #[error("Invalid identifier '{identifier}' in block '{block}': only letters, digits and '_' are allowed")]
    InvalidIdentifier { block: String, identifier: String },

    #[error("Missing variable identifier for dynamic block '{block}'")]
    MissingIdentifier { block: String },

    #[error("Duplicate variable '{variable}': declared by blocks '{first}' and '{second}'")]
    DuplicateVariable {
        variable: String,
        first: String,
        second: String,
    },

    #[error("Block '{block}' ({kind}) must declare at least one option")]
    EmptyOptions { block: String, kind: String },

    #[error("Table block '{block}' must declare at least one column")]
    EmptyTable { block: String },

    #[error("Field '{field}' depends on unknown variable '{parent}'")]
    UnknownDependencyParent { field: String, parent: String },

    #[error("Field '{field}' cannot depend on itself")]
    SelfDependency { field: String },

    #[error("Invalid color value '{value}' for '{property}': {reason}")]
    InvalidColor {
        property: String,
        value: String,
        reason: String,
    },

    #[error("Value out of range for '{property}': {value}. Expected range: {range}")]
    ValueOutOfRange {
        property: String,
        value: String,
        range: String,
    },

    #[error("Too many {what}: maximum {max}")]
    LimitExceeded { what: String, max: usize },

    #[error("No dynamic fields found: add at least one dynamic field with a variable name before exporting")]
    EmptyDerivation,

    #[error("Artifact '{artifact}' not found: both the form description and the template are required")]
    MissingArtifact { artifact: String },

    #[error("Malformed form description in '{file}': {message}")]
    MalformedFormDocument { file: String, message: String },

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for MailformError {
    fn from(err: serde_json::Error) -> Self {
        MailformError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for MailformError {
    fn from(err: serde_yaml::Error) -> Self {
        MailformError::LayoutParse(err.to_string())
    }
}

impl From<std::io::Error> for MailformError {
    fn from(err: std::io::Error) -> Self {
        MailformError::Io(err.to_string())
    }
}
