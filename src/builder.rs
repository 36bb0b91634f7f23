//! Editing a layout: adding blocks with defaults, property edits, deletion
//! and reordering.
//!
//! Whether a field's variable follows its label is editor state and lives
//! in [`EditingSession`], never in the blocks themselves.

use std::collections::HashSet;

use crate::blocks::*;
use crate::config::MailformConfig;
use crate::error::{MailformError, MailformResult};
use crate::export::{export, ExportBundle};
use crate::identifier::{normalize, sanitize_identifier, IdCounter};
use crate::layout::Layout;
use crate::schema::{derive_with, Derivation};

pub const DEFAULT_TEXT: &str = "Enter your text here";
pub const DEFAULT_IMAGE_SRC: &str = "https://via.placeholder.com/600x200";
pub const DEFAULT_BUTTON_TEXT: &str = "Click";
pub const DEFAULT_HEADING_TEXT: &str = "Heading";

/// Fields and columns whose variable was typed by hand.
/// Everything else regenerates its variable when its label changes.
#[derive(Debug, Clone, Default)]
pub struct EditingSession {
    manual_fields: HashSet<String>,
    manual_columns: HashSet<(String, String)>,
}

impl EditingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn follows_label(&self, block_id: &str) -> bool {
        !self.manual_fields.contains(block_id)
    }

    pub fn column_follows_label(&self, table_id: &str, column_id: &str) -> bool {
        !self
            .manual_columns
            .contains(&(table_id.to_string(), column_id.to_string()))
    }

    pub fn set_follows_label(&mut self, block_id: &str, follows: bool) {
        if follows {
            self.manual_fields.remove(block_id);
        } else {
            self.manual_fields.insert(block_id.to_string());
        }
    }

    pub fn set_column_follows_label(&mut self, table_id: &str, column_id: &str, follows: bool) {
        let key = (table_id.to_string(), column_id.to_string());
        if follows {
            self.manual_columns.remove(&key);
        } else {
            self.manual_columns.insert(key);
        }
    }

    fn forget_block(&mut self, block_id: &str) {
        self.manual_fields.remove(block_id);
        self.manual_columns.retain(|(table, _)| table != block_id);
    }
}

/// Variable generated from a label; a blank label clears the variable
fn variable_from_label(label: &str) -> String {
    if label.trim().is_empty() {
        String::new()
    } else {
        normalize(label)
    }
}

/// Trailing number of `block-12`, `table_3`, ...
fn trailing_number(id: &str) -> Option<u64> {
    id.rsplit(['-', '_']).next()?.parse().ok()
}

/// An editable block list
#[derive(Debug, Clone, Default)]
pub struct LayoutBuilder {
    title: Option<String>,
    blocks: Vec<Block>,
    counter: IdCounter,
    session: EditingSession,
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue editing an existing layout.
    ///
    /// New ids continue after the highest number already used, and variables
    /// that differ from their generated form are treated as typed by hand.
    pub fn from_layout(layout: Layout) -> Self {
        let mut last = 0;
        let mut session = EditingSession::new();
        for block in &layout.blocks {
            last = last.max(trailing_number(block.id()).unwrap_or(0));
            if let Some(field) = block.dynamic_field() {
                if !field.variable.is_empty() && field.variable != variable_from_label(&field.label) {
                    session.set_follows_label(block.id(), false);
                }
            }
            if let Block::Table(table) = block {
                if let Some(variable) = &table.variable {
                    last = last.max(trailing_number(variable).unwrap_or(0));
                }
                for column in &table.columns {
                    last = last.max(trailing_number(&column.id).unwrap_or(0));
                    if !column.variable.is_empty()
                        && column.variable != variable_from_label(&column.label)
                    {
                        session.set_column_follows_label(&table.id, &column.id, false);
                    }
                }
            }
        }
        Self {
            title: layout.title,
            blocks: layout.blocks,
            counter: IdCounter::starting_after(last),
            session,
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id() == id)
    }

    pub fn session(&self) -> &EditingSession {
        &self.session
    }

    fn block_mut(&mut self, id: &str) -> MailformResult<&mut Block> {
        self.blocks
            .iter_mut()
            .find(|b| b.id() == id)
            .ok_or_else(|| MailformError::UnknownBlock { id: id.to_string() })
    }

    /// Append a block of `kind` with default content; returns its id
    pub fn add_block(&mut self, kind: BlockKind) -> String {
        let n = self.counter.next();
        let id = format!("block-{}", n);
        let block = match kind {
            BlockKind::Text => Block::Text(TextBlock {
                id: id.clone(),
                content: DEFAULT_TEXT.to_string(),
                ..Default::default()
            }),
            BlockKind::Image => Block::Image(ImageBlock {
                id: id.clone(),
                src: DEFAULT_IMAGE_SRC.to_string(),
                ..Default::default()
            }),
            BlockKind::Button => Block::Button(ButtonBlock {
                id: id.clone(),
                text: DEFAULT_BUTTON_TEXT.to_string(),
                ..Default::default()
            }),
            BlockKind::Heading => Block::Heading(HeadingBlock {
                id: id.clone(),
                text: DEFAULT_HEADING_TEXT.to_string(),
                ..Default::default()
            }),
            BlockKind::Spacer => Block::Spacer(SpacerBlock {
                id: id.clone(),
                ..Default::default()
            }),
            BlockKind::Table => {
                let label = format!("Table {}", n);
                let column = self.new_column();
                Block::Table(TableBlock {
                    id: id.clone(),
                    variable: Some(normalize(&label)),
                    label,
                    required: false,
                    columns: vec![column],
                })
            }
            BlockKind::RadioGroup | BlockKind::CheckboxGroup => {
                let label = format!("Choice {}", n);
                let group = ChoiceGroup {
                    id: id.clone(),
                    field: DynamicField::new(normalize(&label), label),
                    options: vec![
                        ChoiceOption::new("Option 1", "option_1"),
                        ChoiceOption::new("Option 2", "option_2"),
                    ],
                };
                if kind == BlockKind::RadioGroup {
                    Block::RadioGroup(group)
                } else {
                    Block::CheckboxGroup(group)
                }
            }
        };
        log::debug!("added {} block '{}'", kind, id);
        self.blocks.push(block);
        id
    }

    fn new_column(&mut self) -> TableColumn {
        let n = self.counter.next();
        let label = format!("Column {}", n);
        TableColumn {
            id: format!("column-{}", n),
            variable: normalize(&label),
            label,
            column_type: ColumnType::Text,
            options: Vec::new(),
        }
    }

    /// Apply an arbitrary edit to one block. The block id cannot be changed;
    /// a rejected edit leaves the block untouched.
    pub fn update(&mut self, id: &str, edit: impl FnOnce(&mut Block)) -> MailformResult<()> {
        let block = self.block_mut(id)?;
        let mut edited = block.clone();
        edit(&mut edited);
        if edited.id() != id {
            return Err(MailformError::ValidationError(format!(
                "Block '{}' cannot be renamed to '{}'",
                id,
                edited.id()
            )));
        }
        *block = edited;
        Ok(())
    }

    /// Turn the dynamic field of a content block on or off.
    ///
    /// Choice groups are always dynamic; tables and spacers never are.
    pub fn set_dynamic(&mut self, id: &str, dynamic: bool) -> MailformResult<()> {
        let block = self.block_mut(id)?;
        let kind = block.kind();
        if kind.is_choice_group() {
            return if dynamic {
                Ok(())
            } else {
                Err(MailformError::ValidationError(format!(
                    "{} block '{}' is always dynamic",
                    kind, id
                )))
            };
        }
        let slot = block.dynamic_slot_mut().ok_or_else(|| {
            MailformError::ValidationError(format!("{} block '{}' cannot be dynamic", kind, id))
        })?;
        match (dynamic, slot.is_some()) {
            (true, false) => *slot = Some(DynamicField::default()),
            (false, true) => {
                *slot = None;
                self.session.set_follows_label(id, true);
            }
            _ => {}
        }
        Ok(())
    }

    fn field_mut(&mut self, id: &str) -> MailformResult<&mut DynamicField> {
        let block = self.block_mut(id)?;
        block
            .dynamic_field_mut()
            .ok_or_else(|| MailformError::ValidationError(format!("Block '{}' is not dynamic", id)))
    }

    /// Change a field's label; its variable follows unless typed by hand
    pub fn set_field_label(&mut self, id: &str, label: &str) -> MailformResult<()> {
        let follows = self.session.follows_label(id);
        let field = self.field_mut(id)?;
        field.label = label.to_string();
        if follows {
            field.variable = variable_from_label(label);
        }
        Ok(())
    }

    /// Set a variable by hand. Characters outside `[A-Za-z0-9_]` become
    /// `_`; an empty variable lets the label drive it again.
    pub fn set_field_variable(&mut self, id: &str, raw: &str) -> MailformResult<String> {
        let variable = sanitize_identifier(raw);
        let manual = !variable.is_empty();
        let field = self.field_mut(id)?;
        field.variable = if manual {
            variable
        } else {
            variable_from_label(&field.label)
        };
        let variable = field.variable.clone();
        self.session.set_follows_label(id, !manual);
        Ok(variable)
    }

    /// Toggle label-driven variables; switching on regenerates right away
    pub fn set_follow_label(&mut self, id: &str, follows: bool) -> MailformResult<()> {
        let field = self.field_mut(id)?;
        if follows {
            field.variable = variable_from_label(&field.label);
        }
        self.session.set_follows_label(id, follows);
        Ok(())
    }

    fn table_mut(&mut self, id: &str) -> MailformResult<&mut TableBlock> {
        match self.block_mut(id)? {
            Block::Table(table) => Ok(table),
            other => Err(MailformError::ValidationError(format!(
                "Block '{}' is a {} block, not a table",
                id,
                other.kind()
            ))),
        }
    }

    fn column_mut(&mut self, table_id: &str, column_id: &str) -> MailformResult<&mut TableColumn> {
        self.table_mut(table_id)?
            .columns
            .iter_mut()
            .find(|c| c.id == column_id)
            .ok_or_else(|| MailformError::UnknownColumn {
                table: table_id.to_string(),
                column: column_id.to_string(),
            })
    }

    /// Append a default column to a table; returns the column id
    pub fn add_column(&mut self, table_id: &str) -> MailformResult<String> {
        self.table_mut(table_id)?;
        let column = self.new_column();
        let column_id = column.id.clone();
        self.table_mut(table_id)?.columns.push(column);
        Ok(column_id)
    }

    pub fn set_column_label(&mut self, table_id: &str, column_id: &str, label: &str) -> MailformResult<()> {
        let follows = self.session.column_follows_label(table_id, column_id);
        let column = self.column_mut(table_id, column_id)?;
        column.label = label.to_string();
        if follows {
            column.variable = variable_from_label(label);
        }
        Ok(())
    }

    pub fn set_column_variable(&mut self, table_id: &str, column_id: &str, raw: &str) -> MailformResult<String> {
        let variable = sanitize_identifier(raw);
        let column = self.column_mut(table_id, column_id)?;
        if variable.is_empty() {
            column.variable = variable_from_label(&column.label);
            let regenerated = column.variable.clone();
            self.session.set_column_follows_label(table_id, column_id, true);
            return Ok(regenerated);
        }
        column.variable = variable.clone();
        self.session.set_column_follows_label(table_id, column_id, false);
        Ok(variable)
    }

    pub fn remove_column(&mut self, table_id: &str, column_id: &str) -> MailformResult<TableColumn> {
        let table = self.table_mut(table_id)?;
        let index = table
            .columns
            .iter()
            .position(|c| c.id == column_id)
            .ok_or_else(|| MailformError::UnknownColumn {
                table: table_id.to_string(),
                column: column_id.to_string(),
            })?;
        let column = table.columns.remove(index);
        self.session.set_column_follows_label(table_id, column_id, true);
        Ok(column)
    }

    pub fn remove_block(&mut self, id: &str) -> MailformResult<Block> {
        let index = self
            .blocks
            .iter()
            .position(|b| b.id() == id)
            .ok_or_else(|| MailformError::UnknownBlock { id: id.to_string() })?;
        self.session.forget_block(id);
        log::debug!("removed block '{}'", id);
        Ok(self.blocks.remove(index))
    }

    /// Move the block at `from` so it ends up at index `to`
    pub fn move_block(&mut self, from: usize, to: usize) -> MailformResult<()> {
        let len = self.blocks.len();
        if from >= len || to >= len {
            return Err(MailformError::ValidationError(format!(
                "Cannot move block from {} to {}: layout has {} blocks",
                from, to, len
            )));
        }
        let block = self.blocks.remove(from);
        self.blocks.insert(to, block);
        Ok(())
    }

    pub fn derive(&self) -> Derivation {
        self.derive_with(&MailformConfig::default())
    }

    pub fn derive_with(&self, config: &MailformConfig) -> Derivation {
        derive_with(&self.blocks, config.collision_policy)
    }

    pub fn export(&self, config: &MailformConfig) -> MailformResult<ExportBundle> {
        export(&self.blocks, config)
    }

    pub fn layout(&self) -> Layout {
        Layout {
            title: self.title.clone(),
            blocks: self.blocks.clone(),
        }
    }

    pub fn into_layout(self) -> Layout {
        Layout {
            title: self.title,
            blocks: self.blocks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_block_defaults() {
        let mut builder = LayoutBuilder::new();
        let text = builder.add_block(BlockKind::Text);
        let table = builder.add_block(BlockKind::Table);
        let radio = builder.add_block(BlockKind::RadioGroup);

        assert_eq!(text, "block-1");
        assert_eq!(table, "block-2");
        assert_eq!(radio, "block-4");

        match builder.block(&text) {
            Some(Block::Text(t)) => assert_eq!(t.content, DEFAULT_TEXT),
            other => panic!("unexpected block {:?}", other),
        }
        match builder.block(&table) {
            Some(Block::Table(t)) => {
                assert_eq!(t.label, "Table 2");
                assert_eq!(t.variable.as_deref(), Some("table_2"));
                assert_eq!(t.columns.len(), 1);
                assert_eq!(t.columns[0].id, "column-3");
                assert_eq!(t.columns[0].variable, "column_3");
            }
            other => panic!("unexpected block {:?}", other),
        }
        let group = builder.block(&radio).unwrap();
        assert!(group.is_dynamic());
        assert_eq!(group.choice_options().map(|o| o.len()), Some(2));
        assert_eq!(group.dynamic_field().map(|f| f.variable.as_str()), Some("choice_4"));
    }

    #[test]
    fn test_variable_follows_label_until_set_by_hand() {
        let mut builder = LayoutBuilder::new();
        let id = builder.add_block(BlockKind::Heading);
        builder.set_dynamic(&id, true).unwrap();

        builder.set_field_label(&id, "Имя Клиента").unwrap();
        assert_eq!(builder.block(&id).unwrap().dynamic_field().unwrap().variable, "imya_klienta");

        assert_eq!(builder.set_field_variable(&id, "client name").unwrap(), "client_name");
        builder.set_field_label(&id, "Customer").unwrap();
        let field = builder.block(&id).unwrap().dynamic_field().unwrap();
        assert_eq!(field.label, "Customer");
        assert_eq!(field.variable, "client_name");

        builder.set_follow_label(&id, true).unwrap();
        assert_eq!(builder.block(&id).unwrap().dynamic_field().unwrap().variable, "customer");
    }

    #[test]
    fn test_clearing_manual_variable_regenerates() {
        let mut builder = LayoutBuilder::new();
        let id = builder.add_block(BlockKind::Text);
        builder.set_dynamic(&id, true).unwrap();
        builder.set_field_label(&id, "Promo Code").unwrap();
        builder.set_field_variable(&id, "code").unwrap();
        assert_eq!(builder.set_field_variable(&id, "").unwrap(), "promo_code");
        assert!(builder.session().follows_label(&id));
    }

    #[test]
    fn test_set_dynamic_rules() {
        let mut builder = LayoutBuilder::new();
        let spacer = builder.add_block(BlockKind::Spacer);
        let radio = builder.add_block(BlockKind::RadioGroup);
        let image = builder.add_block(BlockKind::Image);

        assert!(builder.set_dynamic(&spacer, true).is_err());
        assert!(builder.set_dynamic(&radio, true).is_ok());
        assert!(builder.set_dynamic(&radio, false).is_err());

        builder.set_dynamic(&image, true).unwrap();
        assert!(builder.block(&image).unwrap().is_dynamic());
        builder.set_dynamic(&image, false).unwrap();
        assert!(!builder.block(&image).unwrap().is_dynamic());
        assert!(matches!(
            builder.set_field_label(&image, "X"),
            Err(MailformError::ValidationError(_))
        ));
        assert!(matches!(
            builder.set_dynamic("block-99", true),
            Err(MailformError::UnknownBlock { .. })
        ));
    }

    #[test]
    fn test_columns() {
        let mut builder = LayoutBuilder::new();
        let table = builder.add_block(BlockKind::Table);
        let column = builder.add_column(&table).unwrap();
        builder.set_column_label(&table, &column, "Unit Price").unwrap();
        builder.set_column_variable(&table, "column-2", "item").unwrap();
        builder.set_column_label(&table, "column-2", "Item name").unwrap();

        match builder.block(&table) {
            Some(Block::Table(t)) => {
                assert_eq!(t.columns[0].variable, "item");
                assert_eq!(t.columns[1].variable, "unit_price");
            }
            other => panic!("unexpected block {:?}", other),
        }

        builder.remove_column(&table, &column).unwrap();
        assert!(matches!(
            builder.remove_column(&table, &column),
            Err(MailformError::UnknownColumn { .. })
        ));
        let text = builder.add_block(BlockKind::Text);
        assert!(builder.add_column(&text).is_err());
    }

    #[test]
    fn test_move_and_remove() {
        let mut builder = LayoutBuilder::new();
        let a = builder.add_block(BlockKind::Text);
        let b = builder.add_block(BlockKind::Image);
        let c = builder.add_block(BlockKind::Button);

        builder.move_block(2, 0).unwrap();
        let ids: Vec<&str> = builder.blocks().iter().map(|b| b.id()).collect();
        assert_eq!(ids, vec![c.as_str(), a.as_str(), b.as_str()]);
        assert!(builder.move_block(0, 3).is_err());

        let removed = builder.remove_block(&a).unwrap();
        assert_eq!(removed.id(), a);
        assert!(builder.remove_block(&a).is_err());
        assert_eq!(builder.blocks().len(), 2);
    }

    #[test]
    fn test_update_cannot_rename() {
        let mut builder = LayoutBuilder::new();
        let id = builder.add_block(BlockKind::Spacer);
        builder
            .update(&id, |block| {
                if let Block::Spacer(spacer) = block {
                    spacer.show_line = true;
                }
            })
            .unwrap();
        let err = builder.update(&id, |block| {
            if let Block::Spacer(spacer) = block {
                spacer.id = "renamed".to_string();
                spacer.height = 99;
            }
        });
        assert!(err.is_err());
        assert!(builder.block("renamed").is_none());
        match builder.block(&id) {
            Some(Block::Spacer(spacer)) => {
                assert!(spacer.show_line);
                assert_ne!(spacer.height, 99);
            }
            other => panic!("expected the spacer to keep its id, got {:?}", other),
        }
    }

    #[test]
    fn test_from_layout_resumes_counter_and_manual_marks() {
        let mut heading = DynamicField::new("custom", "Customer Name");
        heading.required = true;
        let layout = Layout::new(vec![
            Block::Heading(HeadingBlock {
                id: "block-7".to_string(),
                dynamic: Some(heading),
                ..Default::default()
            }),
            Block::Text(TextBlock {
                id: "block-3".to_string(),
                dynamic: Some(DynamicField::new("greeting", "Greeting")),
                ..Default::default()
            }),
        ]);
        let mut builder = LayoutBuilder::from_layout(layout);
        assert!(!builder.session().follows_label("block-7"));
        assert!(builder.session().follows_label("block-3"));
        assert_eq!(builder.add_block(BlockKind::Text), "block-8");
    }

    #[test]
    fn test_builder_exports() {
        let mut builder = LayoutBuilder::new();
        assert!(matches!(
            builder.export(&MailformConfig::default()),
            Err(MailformError::EmptyDerivation)
        ));
        let id = builder.add_block(BlockKind::Button);
        builder.set_dynamic(&id, true).unwrap();
        builder.set_field_label(&id, "Call to action").unwrap();
        let bundle = builder.export(&MailformConfig::default()).unwrap();
        assert!(bundle.template_html.contains("{{call_to_action}}"));
        assert_eq!(builder.derive().schema.properties.len(), 1);
        assert_eq!(builder.into_layout().blocks.len(), 1);
    }
}
