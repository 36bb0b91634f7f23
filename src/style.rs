use serde::{Deserialize, Serialize};

/// Presentation styles for content blocks. Values are CSS strings copied
/// into the exported template as-is (colors are validated).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_css(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

impl BlockStyle {
    /// Resolve each property against per-kind defaults
    pub fn resolved(&self, defaults: &StyleDefaults) -> ResolvedStyle {
        ResolvedStyle {
            font_size: self.font_size.clone().unwrap_or_else(|| defaults.font_size.to_string()),
            color: self.color.clone().unwrap_or_else(|| defaults.color.to_string()),
            background_color: self
                .background_color
                .clone()
                .unwrap_or_else(|| defaults.background_color.to_string()),
            text_align: self.text_align.unwrap_or(defaults.text_align),
            padding: self.padding.clone().unwrap_or_else(|| defaults.padding.to_string()),
            font_weight: self
                .font_weight
                .clone()
                .unwrap_or_else(|| defaults.font_weight.to_string()),
        }
    }
}

/// Defaults a block kind falls back to when a style property is unset
#[derive(Debug, Clone, Copy)]
pub struct StyleDefaults {
    pub font_size: &'static str,
    pub color: &'static str,
    pub background_color: &'static str,
    pub text_align: TextAlign,
    pub padding: &'static str,
    pub font_weight: &'static str,
}

pub const TEXT_DEFAULTS: StyleDefaults = StyleDefaults {
    font_size: "16px",
    color: "#000000",
    background_color: "transparent",
    text_align: TextAlign::Left,
    padding: "10px",
    font_weight: "400",
};

pub const BUTTON_DEFAULTS: StyleDefaults = StyleDefaults {
    font_size: "16px",
    color: "#ffffff",
    background_color: "#007bff",
    text_align: TextAlign::Center,
    padding: "10px 20px",
    font_weight: "400",
};

pub const HEADING_DEFAULTS: StyleDefaults = StyleDefaults {
    font_size: "24px",
    color: "#111827",
    background_color: "transparent",
    text_align: TextAlign::Left,
    padding: "10px",
    font_weight: "700",
};

/// A style with every property filled in
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub font_size: String,
    pub color: String,
    pub background_color: String,
    pub text_align: TextAlign,
    pub padding: String,
    pub font_weight: String,
}
