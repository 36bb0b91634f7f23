//! # Mailform
//!
//! Block-based email layouts that turn into a fillable form description and
//! a placeholder template.
//!
//! ## Features
//! - Layouts of typed blocks (text, image, button, heading, spacer, table, choice groups)
//! - Human labels normalized into stable `snake_case` identifiers (Cyrillic transliterated)
//! - Form description derivation with conditional fields
//! - Template rendering with `{{x}}`, `{{{x}}}` and `{{#each}}`
//! - Export of `template.html` + `schema.json`, and loading them back for preview
//!
//! ## Example
//! ```
//! use mailform_core::{derive, parse_layout, render};
//! use serde_json::json;
//!
//! let layout = parse_layout(r#"
//! - kind: text
//!   id: block-1
//!   content: "Hello {{Client Name}}"
//! "#).expect("Failed to parse layout");
//!
//! let derivation = derive(&layout.blocks);
//! assert_eq!(derivation.schema.field_names().collect::<Vec<_>>(), vec!["client_name"]);
//!
//! let values = json!({"client_name": "Ann"});
//! let html = render("Hello {{client_name}}", values.as_object().unwrap());
//! assert_eq!(html, "Hello Ann");
//! ```

pub mod blocks;
pub mod builder;
pub mod config;
pub mod error;
pub mod export;
pub mod identifier;
pub mod import;
pub mod layout;
pub mod placeholder;
pub mod schema;
pub mod session;
pub mod style;
pub mod template;
pub mod validator;
pub mod visibility;

// --- Core types ---
pub use blocks::{Block, BlockKind, DynamicField, FieldType};
pub use builder::{EditingSession, LayoutBuilder};
pub use config::{CollisionPolicy, MailformConfig};
pub use error::{MailformError, MailformResult};
pub use export::ExportBundle;
pub use identifier::normalize;
pub use import::{ArtifactFile, LoadedArtifacts};
pub use layout::Layout;
pub use schema::{Derivation, FormDocument, FormSchema, FormValues};
pub use session::FormSession;
pub use template::{Template, TemplateError};
pub use visibility::{ActiveFields, Visibility};

/// Parse and validate a layout (YAML or JSON)
pub fn parse_layout(src: &str) -> MailformResult<Layout> {
    layout::parse_layout(src)
}

/// Derive the form description for a block list with the default collision policy
pub fn derive(blocks: &[Block]) -> Derivation {
    schema::derive(blocks)
}

/// Build both export artifacts for a block list
pub fn export(blocks: &[Block], config: &MailformConfig) -> MailformResult<ExportBundle> {
    export::export(blocks, config)
}

/// Load the two artifacts out of a set of picked files
pub fn load_artifacts(files: &[ArtifactFile], config: &MailformConfig) -> MailformResult<LoadedArtifacts> {
    import::load_artifacts(files, config)
}

/// Render a template; a broken template renders as the error fragment
pub fn render(src: &str, values: &FormValues) -> String {
    template::render(src, values)
}

/// Which dependent fields are shown or hidden for the current values
pub fn evaluate_visibility(schema: &FormSchema, values: &FormValues) -> Visibility {
    visibility::evaluate(&schema.dependencies, values)
}
