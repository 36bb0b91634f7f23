//! Export of a layout as two artifacts: the HTML email template with
//! placeholders and the form description (`schema.json`).

use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::blocks::*;
use crate::config::MailformConfig;
use crate::error::{MailformError, MailformResult};
use crate::placeholder::{substitute_for_template, InlineVariable};
use crate::schema::{derive_with, Derivation, FormDocument};
use crate::style::{ResolvedStyle, BUTTON_DEFAULTS, HEADING_DEFAULTS, TEXT_DEFAULTS};
use crate::template::escape_html;

/// The exported template and form description, ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct ExportBundle {
    pub template_html: String,
    pub form: FormDocument,
}

/// Where [`ExportBundle::write_to`] put the artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub template: PathBuf,
    pub schema: PathBuf,
}

impl ExportBundle {
    /// Number of top-level form fields
    pub fn field_count(&self) -> usize {
        self.form.schema.properties.len()
    }

    /// Pretty-printed `schema.json` contents
    pub fn schema_json(&self) -> MailformResult<String> {
        Ok(serde_json::to_string_pretty(&self.form)?)
    }

    /// Write both artifacts into `dir` using the configured file names
    pub fn write_to(&self, dir: impl AsRef<Path>, config: &MailformConfig) -> MailformResult<ExportPaths> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let paths = ExportPaths {
            template: dir.join(&config.template_file_name),
            schema: dir.join(&config.schema_file_name),
        };
        let schema_json = self.schema_json()?;
        std::fs::write(&paths.template, &self.template_html)?;
        std::fs::write(&paths.schema, schema_json)?;
        log::info!(
            "exported {} fields to {} and {}",
            self.field_count(),
            paths.template.display(),
            paths.schema.display()
        );
        Ok(paths)
    }
}

/// Derive the form description and build the template.
///
/// Refused with [`MailformError::EmptyDerivation`] when no field can be
/// derived; nothing is produced in that case.
pub fn export(blocks: &[Block], config: &MailformConfig) -> MailformResult<ExportBundle> {
    let derivation = derive_with(blocks, config.collision_policy);
    if derivation.is_empty() {
        log::warn!("export refused: no dynamic fields in {} blocks", blocks.len());
        return Err(MailformError::EmptyDerivation);
    }
    let template_html = generate_template(blocks, &derivation, config)?;
    Ok(ExportBundle {
        template_html,
        form: derivation.into_document(),
    })
}

/// Build the HTML template document for `blocks`.
///
/// Inline `{{label}}` markers in static text are rewritten with the
/// identifiers bound in `derivation`. Any other `{{` is kept literal.
pub fn generate_template(
    blocks: &[Block],
    derivation: &Derivation,
    config: &MailformConfig,
) -> MailformResult<String> {
    let mut body = String::new();
    for block in blocks {
        write_block(&mut body, block, &derivation.inline_variables)
            .map_err(|e| MailformError::Serialization(e.to_string()))?;
    }

    let mut html = String::new();
    write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
  <style>
    body {{
      font-family: Arial, sans-serif;
      margin: 0;
      padding: 20px;
      background-color: {page};
    }}
    .email-container {{
      max-width: {width}px;
      margin: 0 auto;
      background-color: {container};
      padding: 20px;
    }}
  </style>
</head>
<body>
  <div class="email-container">
{body}  </div>
</body>
</html>
"#,
        title = static_text(&config.document_title),
        page = config.page_background,
        width = config.container_max_width,
        container = config.container_background,
        body = body
    )
    .map_err(|e| MailformError::Serialization(e.to_string()))?;
    Ok(html)
}

/// HTML-escaped static value. Braces become entities so no `{{` reaches the
/// template engine.
fn static_text(s: &str) -> String {
    escape_html(s).replace('{', "&#123;")
}

/// `{{variable}}` for a dynamic field with a variable
fn placeholder(field: Option<&DynamicField>) -> Option<String> {
    field
        .filter(|f| !f.variable.is_empty())
        .map(|f| format!("{{{{{}}}}}", f.variable))
}

fn text_css(style: &ResolvedStyle) -> String {
    let mut css = format!(
        "font-size: {}; color: {}; text-align: {}; padding: {};",
        static_text(&style.font_size),
        static_text(&style.color),
        style.text_align.as_css(),
        static_text(&style.padding)
    );
    if style.background_color != "transparent" {
        css.push_str(&format!(" background-color: {};", static_text(&style.background_color)));
    }
    css
}

fn write_block(out: &mut String, block: &Block, inline: &[InlineVariable]) -> std::fmt::Result {
    match block {
        Block::Text(text) => {
            let style = text.style.clone().unwrap_or_default().resolved(&TEXT_DEFAULTS);
            let content = placeholder(text.dynamic.as_ref())
                .unwrap_or_else(|| substitute_for_template(&text.content, inline));
            writeln!(out, "    <div style=\"{}\">", text_css(&style))?;
            writeln!(out, "      {}", content)?;
            writeln!(out, "    </div>")
        }
        Block::Image(image) => {
            let src = placeholder(image.dynamic.as_ref()).unwrap_or_else(|| static_text(&image.src));
            let alt = static_text(image.alt.as_deref().unwrap_or("Email image"));
            writeln!(out, "    <div style=\"text-align: center; padding: 10px;\">")?;
            writeln!(
                out,
                "      <img src=\"{}\" alt=\"{}\" style=\"max-width: 100%; height: auto;\" />",
                src, alt
            )?;
            writeln!(out, "    </div>")
        }
        Block::Button(button) => {
            let style = button.style.clone().unwrap_or_default().resolved(&BUTTON_DEFAULTS);
            let label = placeholder(button.dynamic.as_ref()).unwrap_or_else(|| static_text(&button.text));
            let href = static_text(button.href.as_deref().unwrap_or("#"));
            writeln!(
                out,
                "    <div style=\"text-align: {}; padding: 10px;\">",
                style.text_align.as_css()
            )?;
            writeln!(
                out,
                "      <a href=\"{}\" style=\"display: inline-block; font-size: {}; color: {}; background-color: {}; padding: {}; font-weight: {}; text-decoration: none; border-radius: 4px;\">{}</a>",
                href,
                static_text(&style.font_size),
                static_text(&style.color),
                static_text(&style.background_color),
                static_text(&style.padding),
                static_text(&style.font_weight),
                label
            )?;
            writeln!(out, "    </div>")
        }
        Block::Heading(heading) => {
            let style = heading.style.clone().unwrap_or_default().resolved(&HEADING_DEFAULTS);
            let content = placeholder(heading.dynamic.as_ref()).unwrap_or_else(|| static_text(&heading.text));
            let tag = heading.level.tag();
            writeln!(
                out,
                "    <{tag} style=\"{css} font-weight: {weight}; margin: 0;\">{content}</{tag}>",
                tag = tag,
                css = text_css(&style),
                weight = static_text(&style.font_weight),
                content = content
            )
        }
        Block::Spacer(spacer) => {
            if spacer.show_line {
                writeln!(
                    out,
                    "    <hr style=\"margin: {}px 0; border: none; border-top: 1px solid #ddd;\" />",
                    spacer.height / 2
                )
            } else {
                writeln!(out, "    <div style=\"height: {}px;\"></div>", spacer.height)
            }
        }
        Block::Table(table) => write_table(out, table),
        Block::CheckboxGroup(group) => {
            if group.field.variable.is_empty() || group.options.is_empty() {
                return Ok(());
            }
            writeln!(out, "    <div style=\"padding: 10px;\">")?;
            writeln!(
                out,
                "      <ul style=\"margin: 0; padding-left: 20px;\">{{{{#each {var}}}}}<li>{{{{this}}}}</li>{{{{/each}}}}</ul>",
                var = group.field.variable
            )?;
            writeln!(out, "    </div>")
        }
        Block::RadioGroup(group) => {
            if group.field.variable.is_empty() || group.options.is_empty() {
                return Ok(());
            }
            writeln!(
                out,
                "    <div style=\"padding: 10px;\">{{{{{{{}}}}}}}</div>",
                group.field.variable
            )
        }
    }
}

fn write_table(out: &mut String, table: &TableBlock) -> std::fmt::Result {
    if table.columns.is_empty() {
        log::debug!("table '{}' has no columns, nothing to export", table.id);
        return Ok(());
    }
    const CELL: &str = "border: 1px solid #ddd; padding: 8px; text-align: left;";

    writeln!(
        out,
        "    <table style=\"width: 100%; border-collapse: collapse; margin: 10px 0;\">"
    )?;
    write!(out, "      <thead><tr>")?;
    for column in &table.columns {
        write!(
            out,
            "<th style=\"{} background-color: #f8f9fa;\">{}</th>",
            CELL,
            static_text(&column.label)
        )?;
    }
    writeln!(out, "</tr></thead>")?;
    writeln!(out, "      <tbody>")?;
    write!(out, "        {{{{#each {}}}}}<tr>", table.variable_or_default())?;
    for column in &table.columns {
        write!(out, "<td style=\"{}\">{{{{this.{}}}}}</td>", CELL, column.key())?;
    }
    writeln!(out, "</tr>{{{{/each}}}}")?;
    writeln!(out, "      </tbody>")?;
    writeln!(out, "    </table>")
}
