use crate::blocks::{Block, ChoiceGroup, ColumnType, DynamicField, FieldType, TableBlock};
use crate::config::CollisionPolicy;
use crate::identifier::{normalize, IdentifierLedger};
use crate::placeholder::{extract_labels, InlineVariable};

use super::{
    DependencyRule, FormDocument, FormSchema, OrderedMap, PropertyType, SchemaProperty, UiHint, UiSchema,
    Widget,
};

/// Everything derived from one block list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Derivation {
    pub schema: FormSchema,
    pub ui_schema: UiSchema,
    /// Label to identifier bindings for `{{label}}` markers in static text,
    /// in first-seen order
    pub inline_variables: Vec<InlineVariable>,
}

impl Derivation {
    /// True when no field could be derived (export is refused in that case)
    pub fn is_empty(&self) -> bool {
        self.schema.properties.is_empty()
    }

    pub fn document(&self) -> FormDocument {
        FormDocument {
            schema: self.schema.clone(),
            ui_schema: self.ui_schema.clone(),
        }
    }

    pub fn into_document(self) -> FormDocument {
        FormDocument {
            schema: self.schema,
            ui_schema: self.ui_schema,
        }
    }

    /// Identifier bound to an inline label, if the label was seen
    pub fn identifier_for(&self, label: &str) -> Option<&str> {
        self.inline_variables
            .iter()
            .find(|v| v.label == label)
            .map(|v| v.identifier.as_str())
    }
}

/// Derive the form description with the default collision policy
pub fn derive(blocks: &[Block]) -> Derivation {
    derive_with(blocks, CollisionPolicy::default())
}

/// Walk `blocks` in order and derive properties, required fields,
/// dependency rules and presentation hints.
///
/// Total and deterministic: blocks that cannot produce a property (empty
/// variable, choice group without options, table without columns) are
/// skipped, never reported.
pub fn derive_with(blocks: &[Block], policy: CollisionPolicy) -> Derivation {
    let mut deriver = Deriver::new(policy);
    deriver.reserve_explicit(blocks);

    for block in blocks {
        match block {
            Block::Text(text) if text.dynamic.is_none() => deriver.inline(&text.content),
            Block::CheckboxGroup(group) => deriver.choice_group(group, true),
            Block::RadioGroup(group) => deriver.choice_group(group, false),
            Block::Table(table) => deriver.table(table),
            _ => match block.dynamic_field() {
                Some(field) if !field.variable.is_empty() => deriver.field(field),
                Some(_) => log::debug!("skipping block '{}': empty variable", block.id()),
                None => {}
            },
        }
    }

    let out = deriver.out;
    log::debug!(
        "derived {} properties ({} required, {} dependency parents, {} inline)",
        out.schema.properties.len(),
        out.schema.required.len(),
        out.schema.dependencies.len(),
        out.inline_variables.len()
    );
    out
}

/// Variable a block will publish, if it publishes one
fn explicit_variable(block: &Block) -> Option<&str> {
    match block {
        Block::Table(table) if !table.columns.is_empty() => Some(table.variable_or_default()),
        Block::Table(_) => None,
        Block::RadioGroup(group) | Block::CheckboxGroup(group) if group.options.is_empty() => None,
        Block::Text(text) if text.dynamic.is_none() => None,
        _ => block
            .dynamic_field()
            .map(|f| f.variable.as_str())
            .filter(|v| !v.is_empty()),
    }
}

struct Deriver {
    policy: CollisionPolicy,
    ledger: IdentifierLedger,
    out: Derivation,
}

impl Deriver {
    fn new(policy: CollisionPolicy) -> Self {
        Self {
            policy,
            ledger: IdentifierLedger::new(),
            out: Derivation::default(),
        }
    }

    /// Explicit variables win over identifiers minted from inline labels
    fn reserve_explicit(&mut self, blocks: &[Block]) {
        for block in blocks {
            if let Some(variable) = explicit_variable(block) {
                if !self.ledger.reserve(variable) {
                    log::warn!(
                        "variable '{}' is declared more than once; block '{}' replaces the earlier property",
                        variable,
                        block.id()
                    );
                }
            }
        }
    }

    fn inline(&mut self, content: &str) {
        for label in extract_labels(content) {
            if self.out.identifier_for(&label).is_some() {
                continue;
            }
            let base = normalize(&label);
            let identifier = match self.policy {
                CollisionPolicy::Disambiguate => {
                    let minted = self.ledger.claim(&base);
                    if minted != base {
                        log::info!("label '{}' collides on '{}', using '{}'", label, base, minted);
                    }
                    minted
                }
                CollisionPolicy::Merge => base,
            };
            let properties = &mut self.out.schema.properties;
            if !properties.contains_key(&identifier) {
                properties.insert(
                    identifier.clone(),
                    SchemaProperty::titled(PropertyType::String, label.clone()),
                );
            }
            self.out.inline_variables.push(InlineVariable { label, identifier });
        }
    }

    fn choice_group(&mut self, group: &ChoiceGroup, multiple: bool) {
        let field = &group.field;
        if field.variable.is_empty() || group.options.is_empty() {
            log::debug!("skipping choice group '{}': no variable or no options", group.id);
            return;
        }
        let values: Vec<String> = group.options.iter().map(|o| o.value.clone()).collect();
        let names: Vec<String> = group.options.iter().map(|o| o.label.clone()).collect();
        let title = field_title(field);

        let (property, widget) = if multiple {
            let items = SchemaProperty::new(PropertyType::String).with_choices(values, Some(names));
            let mut property = SchemaProperty::array_of(title, items);
            property.unique_items = Some(true);
            (property, Widget::Checkboxes)
        } else {
            let property =
                SchemaProperty::titled(PropertyType::String, title).with_choices(values, Some(names));
            (property, Widget::Radio)
        };

        let property = SchemaProperty {
            default: field.default.clone(),
            ..property
        };
        self.insert_property(&field.variable, property);
        self.out
            .ui_schema
            .insert(field.variable.clone(), UiHint { widget });
        self.register_requirement(field);
    }

    fn table(&mut self, table: &TableBlock) {
        if table.columns.is_empty() {
            log::debug!("skipping table '{}': no columns", table.id);
            return;
        }
        let variable = table.variable_or_default();

        let mut row = SchemaProperty::new(PropertyType::Object);
        let mut columns = OrderedMap::new();
        for column in &table.columns {
            let mut property = SchemaProperty::new(column.column_type.property_type());
            if !column.label.trim().is_empty() {
                property.title = Some(column.label.clone());
            }
            if column.column_type == ColumnType::Select && !column.options.is_empty() {
                property = property.with_choices(
                    column.options.iter().map(|o| o.value.clone()).collect(),
                    Some(column.options.iter().map(|o| o.label.clone()).collect()),
                );
            }
            if column.column_type == ColumnType::Email {
                property.format = Some("email".to_string());
            }
            columns.insert(column.key(), property);
        }
        row.properties = Some(columns);

        let title = if table.label.trim().is_empty() {
            variable.to_string()
        } else {
            table.label.clone()
        };
        self.insert_property(variable, SchemaProperty::array_of(title, row));
        if table.required {
            self.push_required(variable);
        }
    }

    fn field(&mut self, field: &DynamicField) {
        let mut property = SchemaProperty::titled(field.field_type.property_type(), field_title(field));
        match field.field_type {
            FieldType::Select => {
                let options: Vec<String> = field
                    .options
                    .iter()
                    .filter(|o| !o.trim().is_empty())
                    .cloned()
                    .collect();
                if !options.is_empty() {
                    property.enum_values = Some(options);
                }
            }
            FieldType::Email => property.format = Some("email".to_string()),
            FieldType::Textarea => {
                self.out.ui_schema.insert(
                    field.variable.clone(),
                    UiHint {
                        widget: Widget::Textarea,
                    },
                );
            }
            _ => {}
        }
        property.default = field.default.clone();

        self.insert_property(&field.variable, property);
        self.register_requirement(field);
    }

    fn insert_property(&mut self, name: &str, property: SchemaProperty) {
        if self.out.schema.properties.insert(name.to_string(), property).is_some() {
            log::debug!("property '{}' replaced by a later block", name);
        }
    }

    /// Dependent fields go into their parent's rule; others into `required`
    fn register_requirement(&mut self, field: &DynamicField) {
        match field.active_dependency() {
            Some(dependency) => {
                self.out
                    .schema
                    .dependencies
                    .entry(dependency.parent.clone())
                    .or_insert_with(DependencyRule::default)
                    .add_dependent(&dependency.parent, &dependency.expected, &field.variable);
            }
            None if field.required => self.push_required(&field.variable),
            None => {}
        }
    }

    fn push_required(&mut self, name: &str) {
        let required = &mut self.out.schema.required;
        if !required.iter().any(|r| r == name) {
            required.push(name.to_string());
        }
    }
}

fn field_title(field: &DynamicField) -> String {
    if field.label.trim().is_empty() {
        field.variable.clone()
    } else {
        field.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{
        ChoiceOption, Dependency, HeadingBlock, SpacerBlock, TableColumn, TextBlock,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn text(id: &str, content: &str) -> Block {
        Block::Text(TextBlock {
            id: id.to_string(),
            content: content.to_string(),
            ..Default::default()
        })
    }

    fn dynamic_heading(id: &str, field: DynamicField) -> Block {
        Block::Heading(HeadingBlock {
            id: id.to_string(),
            text: "Heading".to_string(),
            dynamic: Some(field),
            ..Default::default()
        })
    }

    fn choice(variable: &str, options: &[(&str, &str)]) -> ChoiceGroup {
        ChoiceGroup {
            id: format!("{}-block", variable),
            field: DynamicField::new(variable, variable.to_uppercase()),
            options: options
                .iter()
                .map(|(label, value)| ChoiceOption::new(*label, *value))
                .collect(),
        }
    }

    #[test]
    fn test_empty_block_list() {
        let derived = derive(&[]);
        assert!(derived.is_empty());
        assert!(derived.schema.required.is_empty());
        assert!(derived.schema.dependencies.is_empty());
        assert!(derived.ui_schema.is_empty());
    }

    #[test]
    fn test_derive_is_idempotent() {
        let blocks = vec![
            text("t1", "Hi {{Name}}, your code is {{Code}}"),
            Block::RadioGroup(choice("plan", &[("Basic", "basic"), ("Pro", "pro")])),
            Block::Spacer(SpacerBlock::default()),
        ];
        let first = derive(&blocks);
        let second = derive(&blocks);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.document()).unwrap(),
            serde_json::to_string(&second.document()).unwrap()
        );
    }

    #[test]
    fn test_inline_labels_become_string_properties() {
        let blocks = vec![
            text("t1", "Hello {{Имя Клиента}}! {{ Order Number }}"),
            text("t2", "Again {{Имя Клиента}}"),
        ];
        let derived = derive(&blocks);
        assert_eq!(
            derived.schema.field_names().collect::<Vec<_>>(),
            vec!["imya_klienta", "order_number"]
        );
        assert_eq!(
            derived.schema.properties.get("imya_klienta").and_then(|p| p.title.as_deref()),
            Some("Имя Клиента")
        );
        assert_eq!(derived.inline_variables.len(), 2);
        assert_eq!(derived.identifier_for("Order Number"), Some("order_number"));
    }

    #[test]
    fn test_dynamic_text_is_not_scanned() {
        let block = Block::Text(TextBlock {
            id: "t1".to_string(),
            content: "{{Ignored}}".to_string(),
            dynamic: Some(DynamicField::new("intro", "Intro")),
            ..Default::default()
        });
        let derived = derive(&[block]);
        assert_eq!(derived.schema.field_names().collect::<Vec<_>>(), vec!["intro"]);
        assert!(derived.inline_variables.is_empty());
    }

    #[test]
    fn test_collisions_are_disambiguated() {
        let blocks = vec![
            text("t1", "{{Name}} {{name}}"),
            dynamic_heading("h1", DynamicField::new("name", "Name field")),
        ];
        let derived = derive_with(&blocks, CollisionPolicy::Disambiguate);
        assert_eq!(derived.identifier_for("Name"), Some("name_2"));
        assert_eq!(derived.identifier_for("name"), Some("name_3"));
        assert_eq!(
            derived.schema.properties.get("name").and_then(|p| p.title.as_deref()),
            Some("Name field")
        );
        assert_eq!(derived.schema.properties.len(), 3);
    }

    #[test]
    fn test_collisions_merge_when_configured() {
        let blocks = vec![text("t1", "{{Name}} {{name}}")];
        let derived = derive_with(&blocks, CollisionPolicy::Merge);
        assert_eq!(derived.identifier_for("Name"), Some("name"));
        assert_eq!(derived.identifier_for("name"), Some("name"));
        assert_eq!(derived.schema.properties.len(), 1);
    }

    #[test]
    fn test_checkbox_group_property() {
        let derived = derive(&[Block::CheckboxGroup(choice(
            "extras",
            &[("Gift wrap", "gift"), ("Card", "card")],
        ))]);
        assert_eq!(
            serde_json::to_value(derived.document()).unwrap(),
            json!({
                "schema": {
                    "type": "object",
                    "properties": {
                        "extras": {
                            "type": "array",
                            "title": "EXTRAS",
                            "items": {
                                "type": "string",
                                "enum": ["gift", "card"],
                                "enumNames": ["Gift wrap", "Card"]
                            },
                            "uniqueItems": true
                        }
                    },
                    "required": []
                },
                "uiSchema": {"extras": {"ui:widget": "checkboxes"}}
            })
        );
    }

    #[test]
    fn test_radio_group_required_and_hinted() {
        let mut group = choice("plan", &[("Basic", "basic")]);
        group.field.required = true;
        let derived = derive(&[Block::RadioGroup(group)]);
        let plan = derived.schema.properties.get("plan").unwrap();
        assert_eq!(plan.property_type, PropertyType::String);
        assert_eq!(plan.enum_values, Some(vec!["basic".to_string()]));
        assert_eq!(plan.enum_names, Some(vec!["Basic".to_string()]));
        assert_eq!(derived.schema.required, vec!["plan"]);
        assert_eq!(derived.ui_schema.get("plan").map(|h| h.widget), Some(Widget::Radio));
    }

    #[test]
    fn test_choice_group_without_options_is_skipped() {
        let derived = derive(&[Block::RadioGroup(choice("plan", &[]))]);
        assert!(derived.is_empty());
        assert!(derived.ui_schema.is_empty());
    }

    #[test]
    fn test_table_property() {
        let table = TableBlock {
            id: "tbl".to_string(),
            label: String::new(),
            variable: Some("order_items".to_string()),
            required: false,
            columns: vec![TableColumn {
                id: "c1".to_string(),
                label: String::new(),
                variable: "price".to_string(),
                column_type: ColumnType::Number,
                options: Vec::new(),
            }],
        };
        let derived = derive(&[Block::Table(table)]);
        assert_eq!(
            serde_json::to_value(&derived.schema.properties).unwrap(),
            json!({
                "order_items": {
                    "type": "array",
                    "title": "order_items",
                    "items": {
                        "type": "object",
                        "properties": {"price": {"type": "number"}}
                    }
                }
            })
        );
    }

    #[test]
    fn test_table_select_column_and_default_variable() {
        let table = TableBlock {
            id: "tbl".to_string(),
            label: "Items".to_string(),
            variable: None,
            required: true,
            columns: vec![TableColumn {
                id: "c1".to_string(),
                label: "Size".to_string(),
                variable: String::new(),
                column_type: ColumnType::Select,
                options: vec![ChoiceOption::new("Small", "s"), ChoiceOption::new("Large", "l")],
            }],
        };
        let derived = derive(&[Block::Table(table)]);
        let property = derived.schema.properties.get("table_data").unwrap();
        let row = property.items.as_deref().unwrap();
        let size = row.properties.as_ref().and_then(|p| p.get("size")).unwrap();
        assert_eq!(size.enum_values, Some(vec!["s".to_string(), "l".to_string()]));
        assert_eq!(size.title.as_deref(), Some("Size"));
        assert_eq!(derived.schema.required, vec!["table_data"]);
    }

    #[test]
    fn test_table_without_columns_is_skipped() {
        let derived = derive(&[Block::Table(TableBlock {
            id: "tbl".to_string(),
            ..Default::default()
        })]);
        assert!(derived.is_empty());
    }

    #[test]
    fn test_dynamic_field_types() {
        let mut select = DynamicField::new("size", "Size");
        select.field_type = FieldType::Select;
        select.options = vec!["S".to_string(), " ".to_string(), "M".to_string()];
        select.required = true;
        let mut email = DynamicField::new("contact", "Contact");
        email.field_type = FieldType::Email;
        let mut flag = DynamicField::new("vip", "");
        flag.field_type = FieldType::Checkbox;
        flag.default = Some(json!(false));
        let mut notes = DynamicField::new("notes", "Notes");
        notes.field_type = FieldType::Textarea;

        let derived = derive(&[
            dynamic_heading("h1", select),
            dynamic_heading("h2", email),
            dynamic_heading("h3", flag),
            dynamic_heading("h4", notes),
            dynamic_heading("h5", DynamicField::new("", "No variable")),
        ]);

        let props = &derived.schema.properties;
        assert_eq!(props.len(), 4);
        assert_eq!(
            props.get("size").and_then(|p| p.enum_values.clone()),
            Some(vec!["S".to_string(), "M".to_string()])
        );
        assert_eq!(props.get("contact").and_then(|p| p.format.as_deref()), Some("email"));
        let vip = props.get("vip").unwrap();
        assert_eq!(vip.property_type, PropertyType::Boolean);
        assert_eq!(vip.title.as_deref(), Some("vip"));
        assert_eq!(vip.default, Some(json!(false)));
        assert_eq!(derived.ui_schema.get("notes").map(|h| h.widget), Some(Widget::Textarea));
        assert_eq!(derived.schema.required, vec!["size"]);
    }

    #[test]
    fn test_dependency_registration() {
        let mut child = DynamicField::new("child_var", "Child");
        child.required = true;
        child.dependency = Some(Dependency::new("p", "yes"));
        let mut sibling = DynamicField::new("sibling", "Sibling");
        sibling.dependency = Some(Dependency::new("p", "yes"));
        let mut incomplete = DynamicField::new("loose", "Loose");
        incomplete.required = true;
        incomplete.dependency = Some(Dependency::new("p", ""));

        let derived = derive(&[
            Block::RadioGroup(choice("p", &[("Yes", "yes"), ("No", "no")])),
            dynamic_heading("h1", child),
            dynamic_heading("h2", sibling),
            dynamic_heading("h3", incomplete),
        ]);

        assert_eq!(derived.schema.required, vec!["loose"]);
        assert_eq!(
            serde_json::to_value(&derived.schema.dependencies).unwrap(),
            json!({
                "p": {"oneOf": [{
                    "properties": {"p": {"const": "yes"}},
                    "required": ["child_var", "sibling"]
                }]}
            })
        );
    }
}
