use serde::{Deserialize, Serialize};

use crate::identifier::normalize;
use crate::schema::PropertyType;
use crate::style::BlockStyle;

/// Variable used for a table whose own variable is unset
pub const DEFAULT_TABLE_VARIABLE: &str = "table_data";

/// One content unit of a layout. The `kind` key selects the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Block {
    Text(TextBlock),
    Image(ImageBlock),
    Button(ButtonBlock),
    Heading(HeadingBlock),
    Spacer(SpacerBlock),
    Table(TableBlock),
    /// Single-choice group; the submitted value is one option value
    RadioGroup(ChoiceGroup),
    /// Multi-choice group; the submitted value is a list of option values
    CheckboxGroup(ChoiceGroup),
}

/// Block kind without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Text,
    Image,
    Button,
    Heading,
    Spacer,
    Table,
    RadioGroup,
    CheckboxGroup,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Text => "text",
            BlockKind::Image => "image",
            BlockKind::Button => "button",
            BlockKind::Heading => "heading",
            BlockKind::Spacer => "spacer",
            BlockKind::Table => "table",
            BlockKind::RadioGroup => "radio-group",
            BlockKind::CheckboxGroup => "checkbox-group",
        }
    }

    /// Choice groups are always manager-supplied
    pub fn is_choice_group(&self) -> bool {
        matches!(self, BlockKind::RadioGroup | BlockKind::CheckboxGroup)
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free text; `content` is plain or marked-up text that may contain
/// inline `{{label}}` markers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic: Option<DynamicField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<BlockStyle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    pub id: String,
    /// Image URL
    #[serde(default)]
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic: Option<DynamicField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ButtonBlock {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic: Option<DynamicField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<BlockStyle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadingBlock {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub level: HeadingLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic: Option<DynamicField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<BlockStyle>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingLevel {
    H1,
    #[default]
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingLevel {
    pub fn tag(&self) -> &'static str {
        match self {
            HeadingLevel::H1 => "h1",
            HeadingLevel::H2 => "h2",
            HeadingLevel::H3 => "h3",
            HeadingLevel::H4 => "h4",
            HeadingLevel::H5 => "h5",
            HeadingLevel::H6 => "h6",
        }
    }
}

fn default_spacer_height() -> u32 {
    30
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacerBlock {
    pub id: String,
    /// Height in pixels
    #[serde(default = "default_spacer_height")]
    pub height: u32,
    #[serde(default)]
    pub show_line: bool,
}

impl Default for SpacerBlock {
    fn default() -> Self {
        Self {
            id: String::new(),
            height: default_spacer_height(),
            show_line: false,
        }
    }
}

/// A repeating table; each submitted row is an object keyed by column variables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableBlock {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub columns: Vec<TableColumn>,
}

impl TableBlock {
    /// The table's variable, or [`DEFAULT_TABLE_VARIABLE`] when unset
    pub fn variable_or_default(&self) -> &str {
        match self.variable.as_deref() {
            Some(v) if !v.is_empty() => v,
            _ => DEFAULT_TABLE_VARIABLE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub variable: String,
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChoiceOption>,
}

impl TableColumn {
    /// Key of this column inside each row: its variable, or the normalized
    /// label when no variable was set
    pub fn key(&self) -> String {
        if self.variable.is_empty() {
            normalize(&self.label)
        } else {
            self.variable.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    Text,
    Number,
    Email,
    Select,
}

impl ColumnType {
    pub fn property_type(&self) -> PropertyType {
        match self {
            ColumnType::Number => PropertyType::Number,
            _ => PropertyType::String,
        }
    }
}

/// Choice-group payload shared by radio and checkbox groups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceGroup {
    pub id: String,
    pub field: DynamicField,
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
}

/// An option shown to the manager (`label`) and emitted into the email (`value`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub label: String,
    pub value: String,
}

impl ChoiceOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// The part of a block whose value is supplied later through the generated form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicField {
    #[serde(default)]
    pub variable: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency: Option<Dependency>,
}

impl DynamicField {
    pub fn new(variable: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            label: label.into(),
            ..Default::default()
        }
    }

    /// The dependency, if both its parent and expected value are non-empty
    pub fn active_dependency(&self) -> Option<&Dependency> {
        self.dependency
            .as_ref()
            .filter(|d| !d.parent.is_empty() && !d.expected.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Email,
    /// Single choice among `options`
    Select,
    /// Boolean
    Checkbox,
    /// Multi-line text
    Textarea,
}

impl FieldType {
    pub fn property_type(&self) -> PropertyType {
        match self {
            FieldType::Number => PropertyType::Number,
            FieldType::Checkbox => PropertyType::Boolean,
            _ => PropertyType::String,
        }
    }
}

/// "Relevant only when `parent`'s submitted value equals `expected`"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub parent: String,
    pub expected: String,
}

impl Dependency {
    pub fn new(parent: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            expected: expected.into(),
        }
    }
}

impl Block {
    pub fn id(&self) -> &str {
        match self {
            Block::Text(b) => &b.id,
            Block::Image(b) => &b.id,
            Block::Button(b) => &b.id,
            Block::Heading(b) => &b.id,
            Block::Spacer(b) => &b.id,
            Block::Table(b) => &b.id,
            Block::RadioGroup(b) | Block::CheckboxGroup(b) => &b.id,
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Text(_) => BlockKind::Text,
            Block::Image(_) => BlockKind::Image,
            Block::Button(_) => BlockKind::Button,
            Block::Heading(_) => BlockKind::Heading,
            Block::Spacer(_) => BlockKind::Spacer,
            Block::Table(_) => BlockKind::Table,
            Block::RadioGroup(_) => BlockKind::RadioGroup,
            Block::CheckboxGroup(_) => BlockKind::CheckboxGroup,
        }
    }

    pub fn dynamic_field(&self) -> Option<&DynamicField> {
        match self {
            Block::Text(b) => b.dynamic.as_ref(),
            Block::Image(b) => b.dynamic.as_ref(),
            Block::Button(b) => b.dynamic.as_ref(),
            Block::Heading(b) => b.dynamic.as_ref(),
            Block::RadioGroup(b) | Block::CheckboxGroup(b) => Some(&b.field),
            Block::Spacer(_) | Block::Table(_) => None,
        }
    }

    pub fn dynamic_field_mut(&mut self) -> Option<&mut DynamicField> {
        match self {
            Block::Text(b) => b.dynamic.as_mut(),
            Block::Image(b) => b.dynamic.as_mut(),
            Block::Button(b) => b.dynamic.as_mut(),
            Block::Heading(b) => b.dynamic.as_mut(),
            Block::RadioGroup(b) | Block::CheckboxGroup(b) => Some(&mut b.field),
            Block::Spacer(_) | Block::Table(_) => None,
        }
    }

    /// Slot holding the optional dynamic field of content kinds
    pub(crate) fn dynamic_slot_mut(&mut self) -> Option<&mut Option<DynamicField>> {
        match self {
            Block::Text(b) => Some(&mut b.dynamic),
            Block::Image(b) => Some(&mut b.dynamic),
            Block::Button(b) => Some(&mut b.dynamic),
            Block::Heading(b) => Some(&mut b.dynamic),
            _ => None,
        }
    }

    /// Whether the whole block is supplied through the form
    pub fn is_dynamic(&self) -> bool {
        match self {
            Block::RadioGroup(_) | Block::CheckboxGroup(_) => true,
            _ => self.dynamic_field().is_some(),
        }
    }

    pub fn style(&self) -> Option<&BlockStyle> {
        match self {
            Block::Text(b) => b.style.as_ref(),
            Block::Button(b) => b.style.as_ref(),
            Block::Heading(b) => b.style.as_ref(),
            _ => None,
        }
    }

    pub fn choice_options(&self) -> Option<&[ChoiceOption]> {
        match self {
            Block::RadioGroup(b) | Block::CheckboxGroup(b) => Some(&b.options),
            _ => None,
        }
    }
}
