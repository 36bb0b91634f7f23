//! Placeholder substitution for exported email templates.
//!
//! Supported syntax:
//! - `{{name}}` inserts the HTML-escaped value of `name` (missing keys insert nothing)
//! - `{{{name}}}` and `{{&name}}` insert the value unescaped
//! - `{{#each items}} ... {{/each}}` repeats its body per array element; inside,
//!   `{{this}}`, `{{this.column}}` and `{{@index}}` refer to the current element
//! - `{{! comment }}` is dropped and `\{{` is a literal `{{`
//!
//! Inserted values are never scanned again for placeholders.
//!
//! ```
//! use mailform_core::template::render;
//! use serde_json::json;
//!
//! let values = json!({"items": ["a", "b"]}).as_object().cloned().unwrap();
//! assert_eq!(render("{{#each items}}[{{this}}]{{/each}}", &values), "[a][b]");
//! ```

mod blocks;
mod error;
mod helpers;
mod tokenize;

pub use blocks::MAX_EACH_DEPTH;
pub use error::TemplateError;
pub use helpers::escape_html;

use serde_json::Value;

use crate::schema::FormValues;
use blocks::Node;
use helpers::{resolve, stringify, Frame, Path};

/// Output of [`render`] when the template cannot be compiled
pub const RENDER_ERROR_FRAGMENT: &str = "<p>Template rendering error</p>";

/// A compiled template, reusable across renders
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    pub fn compile(src: &str) -> Result<Self, TemplateError> {
        let tokens = tokenize::tokenize(src)?;
        let nodes = blocks::build(tokens)?;
        Ok(Self { nodes })
    }

    /// Substitute `values`. Rendering a compiled template cannot fail.
    pub fn render(&self, values: &FormValues) -> String {
        let mut out = String::new();
        let mut frames = Vec::new();
        render_nodes(&self.nodes, values, &mut frames, &mut out);
        out
    }

    /// Root-level names the template reads, in first-seen order
    pub fn referenced_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        collect_names(&self.nodes, 0, &mut names);
        names
    }
}

fn render_nodes<'a>(
    nodes: &[Node],
    root: &'a FormValues,
    frames: &mut Vec<Frame<'a>>,
    out: &mut String,
) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Variable { path, escape } => {
                let text = match path {
                    Path::Index => frames
                        .last()
                        .map(|frame| frame.index.to_string())
                        .unwrap_or_default(),
                    _ => resolve(path, root, frames).map(stringify).unwrap_or_default(),
                };
                if *escape {
                    out.push_str(&escape_html(&text));
                } else {
                    out.push_str(&text);
                }
            }
            Node::Each { path, body } => {
                if let Some(Value::Array(items)) = resolve(path, root, frames) {
                    for (index, item) in items.iter().enumerate() {
                        frames.push(Frame { item, index });
                        render_nodes(body, root, frames, out);
                        frames.pop();
                    }
                }
            }
        }
    }
}

/// Names looked up in the root values; keys inside loops may also come
/// from loop items, so only top-level lookups and loop targets count
fn collect_names(nodes: &[Node], depth: usize, names: &mut Vec<String>) {
    for node in nodes {
        let path = match node {
            Node::Text(_) => None,
            Node::Variable { path, .. } => Some(path),
            Node::Each { path, body } => {
                if let Path::Key(segments) = path {
                    push_name(names, segments, depth);
                }
                collect_names(body, depth + 1, names);
                None
            }
        };
        if let Some(Path::Key(segments)) = path {
            push_name(names, segments, depth);
        }
    }
}

fn push_name(names: &mut Vec<String>, segments: &[String], depth: usize) {
    if depth > 0 {
        return;
    }
    if let Some(first) = segments.first() {
        if !names.contains(first) {
            names.push(first.clone());
        }
    }
}

/// Compile and render, reporting syntax errors
pub fn try_render(src: &str, values: &FormValues) -> Result<String, TemplateError> {
    Ok(Template::compile(src)?.render(values))
}

/// Compile and render; a template that cannot be compiled renders as
/// [`RENDER_ERROR_FRAGMENT`]
pub fn render(src: &str, values: &FormValues) -> String {
    render_or(src, values, RENDER_ERROR_FRAGMENT)
}

/// Like [`render`] with a caller-chosen error fragment
pub fn render_or(src: &str, values: &FormValues, fragment: &str) -> String {
    match try_render(src, values) {
        Ok(out) => out,
        Err(err) => {
            log::warn!("template render failed: {}", err);
            fragment.to_string()
        }
    }
}
