use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use mailform_core::import::{load_artifacts_from_paths, parse_form_document};
use mailform_core::layout::load_layout;
use mailform_core::visibility::active_fields;
use mailform_core::{
    ArtifactFile, FormSession, FormValues, MailformConfig, MailformError, MailformResult,
};

#[derive(Parser)]
#[command(name = "mailform", version, about = "Email layouts to form descriptions and templates")]
struct Cli {
    /// YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that layout files parse and validate
    Validate {
        /// Layout files (YAML or JSON)
        files: Vec<PathBuf>,
    },

    /// Write template.html and schema.json for a layout
    Export {
        /// Layout file
        layout: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// List the fields of an exported form description and whether each is
    /// required, optional or hidden for the given values
    Fields {
        /// Exported form description (schema.json)
        schema: PathBuf,

        /// JSON file with submitted values
        #[arg(long)]
        values: Option<PathBuf>,
    },

    /// Render exported artifacts with submitted values
    Render {
        /// The exported template and schema files
        files: Vec<PathBuf>,

        /// JSON file with submitted values
        #[arg(long)]
        values: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = load_config(cli.config.as_deref()).and_then(|config| run(cli.command, &config));
    if let Err(e) = result {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> MailformResult<MailformConfig> {
    match path {
        Some(path) => MailformConfig::load(path),
        None => Ok(MailformConfig::default()),
    }
}

fn load_values(path: Option<&Path>) -> MailformResult<FormValues> {
    let Some(path) = path else {
        return Ok(FormValues::new());
    };
    let src = std::fs::read_to_string(path)?;
    match serde_json::from_str::<serde_json::Value>(&src)? {
        serde_json::Value::Object(values) => Ok(values),
        _ => Err(MailformError::ValidationError(format!(
            "{} must contain a JSON object",
            path.display()
        ))),
    }
}

fn run(command: Command, config: &MailformConfig) -> MailformResult<()> {
    match command {
        Command::Validate { files } => validate(&files),
        Command::Export { layout, out_dir } => {
            let bundle = load_layout(&layout)?.export(config)?;
            let paths = bundle.write_to(&out_dir, config)?;
            println!("{}", paths.template.display());
            println!("{}", paths.schema.display());
            Ok(())
        }
        Command::Fields { schema, values } => {
            let file = ArtifactFile::read(&schema)?;
            let form = parse_form_document(&file.name, &file.contents)?;
            let values = load_values(values.as_deref())?;
            let active = active_fields(&form.schema, &values);
            for (name, property) in form.schema.properties.iter() {
                let state = if active.is_hidden(name) {
                    "hidden"
                } else if active.is_required(name) {
                    "required"
                } else {
                    "optional"
                };
                println!(
                    "{}\t{}\t{}",
                    name,
                    state,
                    property.title.as_deref().unwrap_or("")
                );
            }
            Ok(())
        }
        Command::Render { files, values } => {
            let mut session = FormSession::with_config(load_artifacts_from_paths(&files, config)?, config);
            for (name, value) in load_values(values.as_deref())? {
                session.set_value(name, value);
            }
            let missing = session.missing_required();
            if !missing.is_empty() {
                log::warn!("missing required fields: {}", missing.join(", "));
            }
            println!("{}", session.try_preview()?);
            Ok(())
        }
    }
}

fn validate(files: &[PathBuf]) -> MailformResult<()> {
    if files.is_empty() {
        return Err(MailformError::ValidationError("no layout files given".to_string()));
    }
    let mut failed = 0;
    for file in files {
        match load_layout(file) {
            Ok(layout) => println!("✓ {} is valid ({} blocks)", file.display(), layout.blocks.len()),
            Err(e) => {
                eprintln!("✗ {} has errors:", file.display());
                eprintln!("  {}", e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        return Err(MailformError::ValidationError(format!(
            "{} of {} layouts failed validation",
            failed,
            files.len()
        )));
    }
    Ok(())
}
