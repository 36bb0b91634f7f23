//! Inline `{{label}}` markers inside free-form text.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use crate::identifier::normalize;

/// A distinct label found between `{{` and `}}`, with the identifier minted for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineVariable {
    pub label: String,
    pub identifier: String,
}

impl InlineVariable {
    pub fn new(label: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            identifier: identifier.into(),
        }
    }
}

fn marker_regex() -> &'static Regex {
    static MARKER_REGEX: OnceLock<Regex> = OnceLock::new();
    MARKER_REGEX.get_or_init(|| Regex::new(r"\{\{([^{}]+?)\}\}").unwrap())
}

/// Distinct labels referenced in `text`, in first-seen order.
///
/// Interior whitespace is trimmed; labels that are empty after trimming are
/// ignored. A label seen twice is reported once.
pub fn extract(text: &str) -> Vec<InlineVariable> {
    extract_labels(text)
        .into_iter()
        .map(|label| {
            let identifier = normalize(&label);
            InlineVariable { label, identifier }
        })
        .collect()
}

/// Same scan as [`extract`] without minting identifiers
pub fn extract_labels(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut labels = Vec::new();
    for caps in marker_regex().captures_iter(text) {
        let label = caps[1].trim();
        if label.is_empty() {
            continue;
        }
        if seen.insert(label.to_string()) {
            labels.push(label.to_string());
        }
    }
    labels
}

/// Rewrite every `{{label}}` marker (interior whitespace allowed) as
/// `{{identifier}}`. Labels are compared literally, in a single pass, so an
/// identifier written earlier is never rewritten again by a later label.
pub fn substitute_labels_with_identifiers(text: &str, mappings: &[InlineVariable]) -> String {
    if mappings.is_empty() {
        return text.to_string();
    }
    let by_label: HashMap<&str, &str> = mappings
        .iter()
        .map(|m| (m.label.as_str(), m.identifier.as_str()))
        .collect();
    marker_regex()
        .replace_all(text, |caps: &Captures| match by_label.get(caps[1].trim()) {
            Some(identifier) => format!("{{{{{}}}}}", identifier),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// [`substitute_labels_with_identifiers`] for text that goes into a template.
///
/// Only the rewritten markers stay live. Every other `{{`, including
/// markers with no mapping, is written as `\{{` and renders literally.
pub fn substitute_for_template(text: &str, mappings: &[InlineVariable]) -> String {
    let by_label: HashMap<&str, &str> = mappings
        .iter()
        .map(|m| (m.label.as_str(), m.identifier.as_str()))
        .collect();

    let mut out = String::with_capacity(text.len());
    let mut pending = String::new();
    let mut last = 0;
    for caps in marker_regex().captures_iter(text) {
        let Some(marker) = caps.get(0) else { continue };
        pending.push_str(&text[last..marker.start()]);
        last = marker.end();
        match by_label.get(caps[1].trim()) {
            Some(identifier) => {
                push_literal(&mut out, &pending, true);
                pending.clear();
                out.push_str(&format!("{{{{{}}}}}", identifier));
            }
            None => pending.push_str(marker.as_str()),
        }
    }
    pending.push_str(&text[last..]);
    push_literal(&mut out, &pending, false);
    out
}

/// Append literal text with its `{{` escaped. Before a live marker a trailing
/// `{` or `\` would change how the marker is read, so it becomes an entity.
fn push_literal(out: &mut String, literal: &str, before_marker: bool) {
    let (body, tail) = match literal.chars().last() {
        Some('{') if before_marker => (&literal[..literal.len() - 1], "&#123;"),
        Some('\\') if before_marker => (&literal[..literal.len() - 1], "&#92;"),
        _ => (literal, ""),
    };
    out.push_str(&body.replace("{{", "\\{{"));
    out.push_str(tail);
}
