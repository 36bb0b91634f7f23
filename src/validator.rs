use crate::blocks::*;
use crate::error::{MailformError, MailformResult};
use crate::identifier::is_valid_identifier;
use crate::layout::Layout;
use crate::style::BlockStyle;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

pub const MAX_BLOCKS: usize = 200;
pub const MAX_OPTIONS: usize = 50;
pub const MAX_COLUMNS: usize = 20;
pub const MAX_SPACER_HEIGHT: u32 = 400;

/// Validate a whole layout: per-block rules first, then rules that span
/// blocks (unique variables, dependency references)
pub fn validate_layout(layout: &Layout) -> MailformResult<()> {
    validate_blocks(&layout.blocks)
}

pub fn validate_blocks(blocks: &[Block]) -> MailformResult<()> {
    if blocks.len() > MAX_BLOCKS {
        return Err(MailformError::LimitExceeded {
            what: "blocks".to_string(),
            max: MAX_BLOCKS,
        });
    }
    validate_id_uniqueness(blocks)?;
    for block in blocks {
        validate_block(block)?;
    }
    let variables = validate_variable_uniqueness(blocks)?;
    validate_dependencies(blocks, &variables)
}

pub fn validate_id_uniqueness(blocks: &[Block]) -> MailformResult<()> {
    let mut seen = HashSet::new();
    for block in blocks {
        let id = block.id();
        if id.trim().is_empty() {
            return Err(MailformError::ValidationError(format!(
                "Block of kind '{}' has an empty id",
                block.kind()
            )));
        }
        if !seen.insert(id) {
            return Err(MailformError::DuplicateBlockId { id: id.to_string() });
        }
    }
    Ok(())
}

pub fn validate_block(block: &Block) -> MailformResult<()> {
    match block {
        Block::Text(text) => {
            validate_dynamic(&text.id, text.dynamic.as_ref())?;
            validate_style(text.style.as_ref())
        }
        Block::Image(image) => validate_dynamic(&image.id, image.dynamic.as_ref()),
        Block::Button(button) => {
            validate_dynamic(&button.id, button.dynamic.as_ref())?;
            validate_style(button.style.as_ref())
        }
        Block::Heading(heading) => {
            validate_dynamic(&heading.id, heading.dynamic.as_ref())?;
            validate_style(heading.style.as_ref())
        }
        Block::Spacer(spacer) => validate_range(
            spacer.height as f64,
            0.0,
            MAX_SPACER_HEIGHT as f64,
            "spacer.height",
        ),
        Block::Table(table) => validate_table(table),
        Block::RadioGroup(group) | Block::CheckboxGroup(group) => {
            validate_choice_group(group, block.kind())
        }
    }
}

fn validate_dynamic(block: &str, field: Option<&DynamicField>) -> MailformResult<()> {
    let Some(field) = field else {
        return Ok(());
    };
    validate_variable(block, &field.variable)?;
    if field.options.len() > MAX_OPTIONS {
        return Err(MailformError::LimitExceeded {
            what: format!("options in block '{}'", block),
            max: MAX_OPTIONS,
        });
    }
    if field.field_type == FieldType::Select && field.options.iter().all(|o| o.trim().is_empty()) {
        return Err(MailformError::EmptyOptions {
            block: block.to_string(),
            kind: "select field".to_string(),
        });
    }
    Ok(())
}

fn validate_variable(block: &str, variable: &str) -> MailformResult<()> {
    if variable.is_empty() {
        return Err(MailformError::MissingIdentifier {
            block: block.to_string(),
        });
    }
    if !is_valid_identifier(variable) {
        return Err(MailformError::InvalidIdentifier {
            block: block.to_string(),
            identifier: variable.to_string(),
        });
    }
    Ok(())
}

fn validate_choice_group(group: &ChoiceGroup, kind: BlockKind) -> MailformResult<()> {
    validate_dynamic(&group.id, Some(&group.field))?;
    if group.options.is_empty() {
        return Err(MailformError::EmptyOptions {
            block: group.id.clone(),
            kind: kind.to_string(),
        });
    }
    if group.options.len() > MAX_OPTIONS {
        return Err(MailformError::LimitExceeded {
            what: format!("options in block '{}'", group.id),
            max: MAX_OPTIONS,
        });
    }
    validate_options(&group.id, &group.options)
}

fn validate_options(block: &str, options: &[ChoiceOption]) -> MailformResult<()> {
    let mut seen = HashSet::new();
    for option in options {
        if option.value.is_empty() {
            return Err(MailformError::ValidationError(format!(
                "Option '{}' in block '{}' has an empty value",
                option.label, block
            )));
        }
        if !seen.insert(option.value.as_str()) {
            return Err(MailformError::ValidationError(format!(
                "Duplicate option value '{}' in block '{}'",
                option.value, block
            )));
        }
    }
    Ok(())
}

fn validate_table(table: &TableBlock) -> MailformResult<()> {
    if table.columns.is_empty() {
        return Err(MailformError::EmptyTable {
            block: table.id.clone(),
        });
    }
    if table.columns.len() > MAX_COLUMNS {
        return Err(MailformError::LimitExceeded {
            what: format!("columns in table '{}'", table.id),
            max: MAX_COLUMNS,
        });
    }
    if let Some(variable) = table.variable.as_deref().filter(|v| !v.is_empty()) {
        validate_variable(&table.id, variable)?;
    }

    let mut keys = HashSet::new();
    for column in &table.columns {
        let key = column.key();
        if !is_valid_identifier(&key) {
            return Err(MailformError::InvalidIdentifier {
                block: format!("{}/{}", table.id, column.id),
                identifier: key,
            });
        }
        if !keys.insert(key.clone()) {
            return Err(MailformError::ValidationError(format!(
                "Duplicate column variable '{}' in table '{}'",
                key, table.id
            )));
        }
        if column.column_type == ColumnType::Select {
            validate_options(&table.id, &column.options)?;
        }
    }
    Ok(())
}

fn validate_style(style: Option<&BlockStyle>) -> MailformResult<()> {
    let Some(style) = style else {
        return Ok(());
    };
    if let Some(color) = &style.color {
        validate_color(color, "color")?;
    }
    if let Some(color) = &style.background_color {
        validate_color(color, "backgroundColor")?;
    }
    Ok(())
}

pub fn validate_color(color: &str, property: &str) -> MailformResult<()> {
    static HEX_COLOR_REGEX: OnceLock<Regex> = OnceLock::new();
    let hex_regex = HEX_COLOR_REGEX.get_or_init(|| Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap());

    const NAMED_COLORS: &[&str] = &[
        "red", "blue", "green", "white", "black", "transparent", "yellow", "orange", "purple",
        "pink", "gray", "grey",
    ];

    if hex_regex.is_match(color) || NAMED_COLORS.contains(&color) {
        Ok(())
    } else {
        Err(MailformError::InvalidColor {
            property: property.to_string(),
            value: color.to_string(),
            reason: format!(
                "must be a valid hex color (e.g., #ff0000) or named color ({})",
                NAMED_COLORS.join(", ")
            ),
        })
    }
}

fn validate_range(value: f64, min: f64, max: f64, property: &str) -> MailformResult<()> {
    if value < min || value > max {
        Err(MailformError::ValueOutOfRange {
            property: property.to_string(),
            value: value.to_string(),
            range: format!("{} to {}", min, max),
        })
    } else {
        Ok(())
    }
}

/// Every published variable must belong to exactly one block.
/// Returns variable -> owning block id.
fn validate_variable_uniqueness(blocks: &[Block]) -> MailformResult<HashMap<String, String>> {
    let mut owners: HashMap<String, String> = HashMap::new();
    for block in blocks {
        let variable = match block {
            Block::Table(table) => Some(table.variable_or_default().to_string()),
            _ => block.dynamic_field().map(|f| f.variable.clone()),
        };
        let Some(variable) = variable else {
            continue;
        };
        if let Some(first) = owners.get(&variable) {
            return Err(MailformError::DuplicateVariable {
                variable,
                first: first.clone(),
                second: block.id().to_string(),
            });
        }
        owners.insert(variable, block.id().to_string());
    }
    Ok(owners)
}

fn validate_dependencies(
    blocks: &[Block],
    variables: &HashMap<String, String>,
) -> MailformResult<()> {
    for field in blocks.iter().filter_map(Block::dynamic_field) {
        let Some(dependency) = field.active_dependency() else {
            continue;
        };
        if dependency.parent == field.variable {
            return Err(MailformError::SelfDependency {
                field: field.variable.clone(),
            });
        }
        if !variables.contains_key(&dependency.parent) {
            return Err(MailformError::UnknownDependencyParent {
                field: field.variable.clone(),
                parent: dependency.parent.clone(),
            });
        }
    }
    Ok(())
}
