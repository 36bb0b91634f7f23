//! Form descriptions derived from a block list.
//!
//! The derived document is a JSON-Schema object (`properties`, `required`,
//! `dependencies`) plus a `uiSchema` of presentation hints, the pair a
//! schema-driven form renderer consumes.

mod derive;

pub use derive::{derive, derive_with, Derivation};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Submitted form values keyed by field name
pub type FormValues = serde_json::Map<String, Value>;

/// String-keyed map in insertion order; property order follows block order
pub type OrderedMap<V> = IndexMap<String, V>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

/// One property of a form description (also used for array items)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaProperty {
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    /// Display labels parallel to `enum`
    #[serde(rename = "enumNames", default, skip_serializing_if = "Option::is_none")]
    pub enum_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaProperty>>,
    #[serde(rename = "uniqueItems", default, skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<OrderedMap<SchemaProperty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl SchemaProperty {
    pub fn new(property_type: PropertyType) -> Self {
        Self {
            property_type,
            title: None,
            enum_values: None,
            enum_names: None,
            format: None,
            default: None,
            items: None,
            unique_items: None,
            properties: None,
            required: None,
        }
    }

    pub fn titled(property_type: PropertyType, title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::new(property_type)
        }
    }

    /// Restrict to `values`, shown to the user as `names`
    pub fn with_choices(mut self, values: Vec<String>, names: Option<Vec<String>>) -> Self {
        self.enum_values = Some(values);
        self.enum_names = names;
        self
    }

    pub fn array_of(title: impl Into<String>, items: SchemaProperty) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::titled(PropertyType::Array, title)
        }
    }
}

/// `{"const": value}` inside a dependency clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseProperty {
    #[serde(rename = "const", default, skip_serializing_if = "Option::is_none")]
    pub const_value: Option<Value>,
}

/// "When the parent equals the const value, these fields are relevant (and required)"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyClause {
    pub properties: OrderedMap<ClauseProperty>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl DependencyClause {
    pub fn new(parent: &str, expected: &str) -> Self {
        let mut properties = OrderedMap::new();
        properties.insert(
            parent.to_string(),
            ClauseProperty {
                const_value: Some(Value::String(expected.to_string())),
            },
        );
        Self {
            properties,
            required: Vec::new(),
        }
    }

    /// The value the parent must hold for this clause to apply
    pub fn expected_value(&self, parent: &str) -> Option<&Value> {
        self.properties.get(parent)?.const_value.as_ref()
    }
}

/// Disjunction of clauses governed by one parent field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyRule {
    #[serde(rename = "oneOf", default)]
    pub one_of: Vec<DependencyClause>,
}

impl DependencyRule {
    /// Register `field` under the clause for `expected`, creating it if needed
    pub fn add_dependent(&mut self, parent: &str, expected: &str, field: &str) {
        let wanted = Value::String(expected.to_string());
        let index = match self
            .one_of
            .iter()
            .position(|c| c.expected_value(parent) == Some(&wanted))
        {
            Some(index) => index,
            None => {
                self.one_of.push(DependencyClause::new(parent, expected));
                self.one_of.len() - 1
            }
        };
        let clause = &mut self.one_of[index];
        if !clause.required.iter().any(|f| f == field) {
            clause.required.push(field.to_string());
        }
    }
}

/// The derived form description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    #[serde(rename = "type")]
    pub schema_type: PropertyType,
    #[serde(default)]
    pub properties: OrderedMap<SchemaProperty>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub dependencies: OrderedMap<DependencyRule>,
}

impl Default for FormSchema {
    fn default() -> Self {
        Self {
            schema_type: PropertyType::Object,
            properties: OrderedMap::new(),
            required: Vec::new(),
            dependencies: OrderedMap::new(),
        }
    }
}

impl FormSchema {
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn is_required(&self, field: &str) -> bool {
        self.required.iter().any(|f| f == field)
    }
}

/// Widget a form renderer should use for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Widget {
    Checkboxes,
    Radio,
    Textarea,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiHint {
    #[serde(rename = "ui:widget")]
    pub widget: Widget,
}

/// Presentation hints keyed by field name
pub type UiSchema = OrderedMap<UiHint>;

/// The form-description artifact: schema plus presentation hints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormDocument {
    pub schema: FormSchema,
    #[serde(rename = "uiSchema", default)]
    pub ui_schema: UiSchema,
}
