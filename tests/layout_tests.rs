use mailform_core::blocks::{BlockKind, Dependency, FieldType};
use mailform_core::layout::{load_layout, parse_layout_unchecked};
use mailform_core::{derive, Block, LayoutBuilder, MailformConfig, MailformError};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::path::PathBuf;

fn get_fixture_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("fixtures");
    path.push(filename);
    path
}

#[test]
fn test_order_confirmation_fixture_is_valid() {
    let layout = load_layout(get_fixture_path("order-confirmation.yaml")).unwrap();
    assert_eq!(layout.title.as_deref(), Some("Order confirmation"));
    assert_eq!(layout.blocks.len(), 10);
    assert_eq!(layout.block("block-6").map(Block::kind), Some(BlockKind::RadioGroup));
}

#[test]
fn test_static_fixture_is_valid_but_derives_nothing() {
    let layout = load_layout(get_fixture_path("static-only.yaml")).unwrap();
    assert!(layout.derive().is_empty());
    assert!(matches!(
        layout.export(&MailformConfig::default()),
        Err(MailformError::EmptyDerivation)
    ));
}

#[test]
fn test_duplicate_variable_fixture_is_rejected() {
    match load_layout(get_fixture_path("invalid-duplicate-variable.yaml")) {
        Err(MailformError::DuplicateVariable {
            variable,
            first,
            second,
        }) => {
            assert_eq!(variable, "name");
            assert_eq!(first, "block-1");
            assert_eq!(second, "block-2");
        }
        other => panic!("expected DuplicateVariable, got {:?}", other),
    }
}

#[test]
fn test_unknown_dependency_parent_fixture_is_rejected() {
    let result = load_layout(get_fixture_path("invalid-dependency.yaml"));
    assert!(matches!(
        result,
        Err(MailformError::UnknownDependencyParent { .. })
    ));

    // Derivation does not validate, so the dependency is still recorded
    let src = fs::read_to_string(get_fixture_path("invalid-dependency.yaml")).unwrap();
    let derivation = parse_layout_unchecked(&src).unwrap().derive();
    assert!(derivation.schema.dependencies.contains_key("delivery"));
    assert!(derivation.schema.required.is_empty());
}

#[test]
fn test_missing_file_is_io_error() {
    let result = load_layout(get_fixture_path("does-not-exist.yaml"));
    assert!(matches!(result, Err(MailformError::Io(_))));
}

#[test]
fn test_order_fixture_derivation() {
    let layout = load_layout(get_fixture_path("order-confirmation.yaml")).unwrap();
    let derivation = layout.derive();
    let schema = &derivation.schema;

    assert_eq!(
        schema.field_names().collect::<Vec<_>>(),
        vec!["client_name", "order_number", "order_items", "delivery", "address", "extras"]
    );
    assert_eq!(schema.required, vec!["order_items", "delivery"]);
    assert!(!schema.is_required("address"));

    let json = serde_json::to_value(derivation.document()).unwrap();
    assert_eq!(
        json.pointer("/schema/dependencies/delivery/oneOf/0"),
        Some(&json!({
            "properties": {"delivery": {"const": "courier"}},
            "required": ["address"]
        }))
    );
    assert_eq!(json.pointer("/uiSchema/delivery/ui:widget"), Some(&json!("radio")));
    assert_eq!(json.pointer("/uiSchema/extras/ui:widget"), Some(&json!("checkboxes")));
    assert_eq!(json.pointer("/uiSchema/address/ui:widget"), Some(&json!("textarea")));
}

#[test]
fn test_derivation_is_idempotent() {
    let layout = load_layout(get_fixture_path("order-confirmation.yaml")).unwrap();
    let first = serde_json::to_string(&layout.derive().document()).unwrap();
    let second = serde_json::to_string(&layout.derive().document()).unwrap();
    assert_eq!(first, second);
    assert_eq!(derive(&[]).schema.properties.len(), 0);
}

#[test]
fn test_builder_session_round_trips_through_yaml() {
    let mut builder = LayoutBuilder::new();
    builder.set_title(Some("Welcome".to_string()));
    let heading = builder.add_block(BlockKind::Heading);
    let choice = builder.add_block(BlockKind::RadioGroup);
    let note = builder.add_block(BlockKind::Text);

    builder.set_dynamic(&heading, true).unwrap();
    builder.set_field_label(&heading, "Имя Клиента").unwrap();
    builder.set_field_label(&choice, "Plan").unwrap();
    builder.set_dynamic(&note, true).unwrap();
    builder.set_field_label(&note, "Note").unwrap();
    builder
        .update(&note, |block| {
            if let Some(field) = block.dynamic_field_mut() {
                field.field_type = FieldType::Textarea;
                field.required = true;
                field.dependency = Some(Dependency::new("plan", "option_2"));
            }
        })
        .unwrap();

    let yaml = builder.layout().to_yaml().unwrap();
    let layout = mailform_core::parse_layout(&yaml).unwrap();
    assert_eq!(layout, builder.layout());

    let derivation = layout.derive();
    assert_eq!(
        derivation.schema.field_names().collect::<Vec<_>>(),
        vec!["imya_klienta", "plan", "note"]
    );
    assert!(derivation.schema.dependencies.contains_key("plan"));

    let mut resumed = LayoutBuilder::from_layout(layout);
    assert_eq!(resumed.add_block(BlockKind::Spacer), "block-4");
}
