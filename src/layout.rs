use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::blocks::Block;
use crate::config::{CollisionPolicy, MailformConfig};
use crate::error::{MailformError, MailformResult};
use crate::export::{export, ExportBundle};
use crate::schema::{derive_with, Derivation};
use crate::validator::validate_layout;

/// An ordered list of blocks, optionally titled.
///
/// Written as YAML (or JSON) either as a document:
///
/// ```yaml
/// title: Order confirmation
/// blocks:
///   - kind: heading
///     id: block-1
///     text: Thank you!
/// ```
///
/// or as a bare sequence of blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Layout {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            title: None,
            blocks,
        }
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id() == id)
    }

    pub fn derive(&self) -> Derivation {
        self.derive_with(CollisionPolicy::default())
    }

    pub fn derive_with(&self, policy: CollisionPolicy) -> Derivation {
        derive_with(&self.blocks, policy)
    }

    pub fn export(&self, config: &MailformConfig) -> MailformResult<ExportBundle> {
        export(&self.blocks, config)
    }

    pub fn to_yaml(&self) -> MailformResult<String> {
        serde_yaml::to_string(self).map_err(|e| MailformError::Serialization(e.to_string()))
    }

    pub fn to_json(&self) -> MailformResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Parse and validate a layout
pub fn parse_layout(src: &str) -> MailformResult<Layout> {
    let layout = parse_layout_unchecked(src)?;
    validate_layout(&layout)?;
    Ok(layout)
}

/// Parse a layout without validating it.
///
/// Derivation is total, so unvalidated layouts can still be derived and
/// exported; blocks that cannot produce a field are skipped.
pub fn parse_layout_unchecked(src: &str) -> MailformResult<Layout> {
    if src.trim().is_empty() {
        return Err(MailformError::EmptyLayout);
    }
    let value: serde_yaml::Value = serde_yaml::from_str(src)?;
    let layout = if value.is_sequence() {
        Layout::new(serde_yaml::from_value(value)?)
    } else {
        serde_yaml::from_value(value)?
    };
    log::debug!("parsed layout with {} blocks", layout.blocks.len());
    Ok(layout)
}

/// Read and parse a layout file
pub fn load_layout(path: impl AsRef<Path>) -> MailformResult<Layout> {
    let src = std::fs::read_to_string(path.as_ref())?;
    parse_layout(&src)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::BlockKind;

    const ORDER_LAYOUT: &str = r#"
title: Order confirmation
blocks:
  - kind: heading
    id: block-1
    text: Thanks for your order
  - kind: text
    id: block-2
    content: "<p>Hello {{Client Name}}</p>"
  - kind: table
    id: block-3
    label: Items
    variable: order_items
    columns:
      - id: column-1
        label: Price
        variable: price
        type: number
"#;

    #[test]
    fn test_parse_document_form() {
        let layout = parse_layout(ORDER_LAYOUT).unwrap();
        assert_eq!(layout.title.as_deref(), Some("Order confirmation"));
        assert_eq!(layout.blocks.len(), 3);
        assert_eq!(layout.block("block-3").map(|b| b.kind()), Some(BlockKind::Table));
    }

    #[test]
    fn test_parse_bare_sequence_and_json() {
        let yaml = "- kind: spacer\n  id: s1\n";
        assert_eq!(parse_layout(yaml).unwrap().blocks.len(), 1);

        let json = r#"[{"kind": "image", "id": "i1", "src": "https://example.com/a.png"}]"#;
        assert_eq!(parse_layout(json).unwrap().blocks.len(), 1);
    }

    #[test]
    fn test_empty_layout() {
        assert!(matches!(parse_layout("  \n"), Err(MailformError::EmptyLayout)));
    }

    #[test]
    fn test_unknown_kind_is_parse_error() {
        let err = parse_layout("- kind: video\n  id: v1\n").unwrap_err();
        assert!(matches!(err, MailformError::LayoutParse(_)));
        for kind in ["divider", "list"] {
            let src = format!("- kind: {}\n  id: b1\n", kind);
            assert!(matches!(parse_layout(&src), Err(MailformError::LayoutParse(_))));
        }
    }

    #[test]
    fn test_unchecked_skips_validation() {
        let src = "- kind: table\n  id: t1\n";
        assert!(matches!(parse_layout(src), Err(MailformError::EmptyTable { .. })));
        let layout = parse_layout_unchecked(src).unwrap();
        assert!(layout.derive().is_empty());
    }

    #[test]
    fn test_yaml_round_trip() {
        let layout = parse_layout(ORDER_LAYOUT).unwrap();
        let reparsed = parse_layout(&layout.to_yaml().unwrap()).unwrap();
        assert_eq!(layout, reparsed);
    }
}
