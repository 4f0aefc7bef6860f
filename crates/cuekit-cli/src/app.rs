//! CLI Application logic
//!
//! Contains the command-line interface implementation. Every command
//! returns `Result<ServiceResult<String>>`: the outer error is a failure of
//! the CLI itself (unreadable file, bad config), the inner one an engine
//! error that is printed as a structured error.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use tracing::debug;

use cuekit_core::diagnostics::StructuredError;
use cuekit_service::{default_service, CueService, ServiceResult};

use crate::config::{load_settings, Settings};

#[derive(Parser)]
#[command(name = "cuekit")]
#[command(author, version, about = "Unify, validate and export configuration", long_about = None)]
struct Cli {
    /// Configuration file (default: ./cuekit.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print errors as JSON objects
    #[arg(long, global = true)]
    json_errors: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Unify documents and print the result as JSON
    Unify {
        /// Files or directories (default: configured entry points, else .)
        inputs: Vec<PathBuf>,

        /// Tag value for @tag placeholders (key=value)
        #[arg(short = 't', long = "tag")]
        tags: Vec<String>,
    },

    /// Validate data against a schema
    Vet {
        /// Schema document
        schema: PathBuf,

        /// Data document
        data: PathBuf,
    },

    /// Evaluate a document and print it in an output format
    Export {
        /// Input document
        input: PathBuf,

        /// Output format: json, yaml or cue (default: from config, else json)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Format documents in canonical style
    Fmt {
        /// Input documents
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Rewrite the files instead of printing
        #[arg(short, long)]
        write: bool,
    },

    /// List package and field symbols as JSON
    Symbols {
        /// Input document
        input: PathBuf,
    },

    /// Print the CLI and language versions
    Version,
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let settings = load_settings(cli.config.as_deref())?;
    let json_errors = cli.json_errors || settings.output.json_errors;
    let service = default_service();

    let outcome = match cli.command {
        Commands::Unify { inputs, tags } => unify_command(service, &inputs, &tags, &settings)?,
        Commands::Vet { schema, data } => vet_command(service, &schema, &data)?,
        Commands::Export { input, format } => {
            let format = format.unwrap_or_else(|| settings.export.format.clone());
            export_command(service, &input, &format)?
        }
        Commands::Fmt { inputs, write } => fmt_command(service, &inputs, write)?,
        Commands::Symbols { input } => symbols_command(service, &input)?,
        Commands::Version => Ok(version_line(service)),
    };

    match outcome {
        Ok(output) => {
            print!("{}", output);
            if !output.is_empty() && !output.ends_with('\n') {
                println!();
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", render_error(&err, json_errors));
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Render an engine error for the terminal
pub fn render_error(err: &StructuredError, json: bool) -> String {
    if json {
        err.to_json()
    } else {
        err.to_human()
    }
}

/// Execute the unify command
pub fn unify_command(
    service: &dyn CueService,
    inputs: &[PathBuf],
    tags: &[String],
    settings: &Settings,
) -> Result<ServiceResult<String>> {
    let inputs: Vec<PathBuf> = if !inputs.is_empty() {
        inputs.to_vec()
    } else if !settings.load.entry_points.is_empty() {
        settings.load.entry_points.iter().map(PathBuf::from).collect()
    } else {
        vec![PathBuf::from(".")]
    };
    let documents = collect_documents(&inputs)?;

    // Flags come last so they override configured tags
    let mut all_tags = settings.tag_args();
    all_tags.extend(tags.iter().cloned());

    debug!(documents = documents.len(), tags = all_tags.len(), "unify");
    Ok(service.unify(&documents, &[], &all_tags))
}

/// Execute the vet command
pub fn vet_command(
    service: &dyn CueService,
    schema: &Path,
    data: &Path,
) -> Result<ServiceResult<String>> {
    let schema = read_input(schema)?;
    let data = read_input(data)?;
    Ok(service.validate(&schema, &data).map(|()| String::new()))
}

/// Execute the export command
pub fn export_command(
    service: &dyn CueService,
    input: &Path,
    format: &str,
) -> Result<ServiceResult<String>> {
    let text = read_input(input)?;
    Ok(service.export(&text, format))
}

/// Execute the fmt command
pub fn fmt_command(
    service: &dyn CueService,
    inputs: &[PathBuf],
    write: bool,
) -> Result<ServiceResult<String>> {
    let mut output = String::new();
    for input in inputs {
        let text = read_input(input)?;
        let formatted = match service.format(&text) {
            Ok(formatted) => formatted,
            Err(err) => return Ok(Err(err.with_file(input.display().to_string()))),
        };
        if write {
            if formatted != text {
                fs::write(input, &formatted)
                    .with_context(|| format!("Failed to write file: {}", input.display()))?;
                debug!(file = %input.display(), "reformatted");
            }
        } else {
            output.push_str(&formatted);
        }
    }
    Ok(Ok(output))
}

/// Execute the symbols command
pub fn symbols_command(service: &dyn CueService, input: &Path) -> Result<ServiceResult<String>> {
    let text = read_input(input)?;
    Ok(service.get_symbols(&text))
}

fn version_line(service: &dyn CueService) -> String {
    format!(
        "cuekit {} (language {})",
        crate::VERSION,
        service.version()
    )
}

fn read_input(path: &Path) -> Result<String> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))
}

/// Read documents from files and directories
///
/// A file is named by its path as given. A directory contributes every
/// `.cue` file below it, named relative to the directory, so that module
/// metadata under `cue.mod/` is recognized.
pub fn collect_documents(inputs: &[PathBuf]) -> Result<Vec<(String, String)>> {
    let mut documents = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let pattern = input.join("**/*.cue").display().to_string();
            for entry in glob(&pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))? {
                let path = entry.context("Failed to read directory entry")?;
                let name = path.strip_prefix(input).unwrap_or(&path);
                documents.push((logical_name(name), read_input(&path)?));
            }
        } else {
            documents.push((logical_name(input), read_input(input)?));
        }
    }
    Ok(documents)
}

fn logical_name(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuekit_service::ReaderEngine;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parse_unify() {
        let args = vec!["cuekit", "unify", "a.cue", "dir", "-t", "env=prod", "--tag", "n=1"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Unify { inputs, tags } => {
                assert_eq!(inputs, vec![PathBuf::from("a.cue"), PathBuf::from("dir")]);
                assert_eq!(tags, vec!["env=prod", "n=1"]);
            }
            _ => panic!("Expected Unify command"),
        }
    }

    #[test]
    fn test_cli_parse_export() {
        let args = vec!["cuekit", "export", "a.cue", "--format", "yaml", "--json-errors"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.json_errors);
        match cli.command {
            Commands::Export { input, format } => {
                assert_eq!(input, PathBuf::from("a.cue"));
                assert_eq!(format.as_deref(), Some("yaml"));
            }
            _ => panic!("Expected Export command"),
        }
    }

    #[test]
    fn test_cli_parse_fmt_requires_input() {
        assert!(Cli::try_parse_from(vec!["cuekit", "fmt"]).is_err());
    }

    #[test]
    fn test_cli_parse_version() {
        let cli = Cli::try_parse_from(vec!["cuekit", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_collect_documents_from_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.cue"), "a: 1").unwrap();
        fs::write(dir.path().join("sub/b.cue"), "b: 2").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut docs = collect_documents(&[dir.path().to_path_buf()]).unwrap();
        docs.sort();
        assert_eq!(
            docs,
            vec![
                ("a.cue".to_string(), "a: 1".to_string()),
                ("sub/b.cue".to_string(), "b: 2".to_string())
            ]
        );
    }

    #[test]
    fn test_missing_input_is_cli_error() {
        let err = export_command(&ReaderEngine, Path::new("/nonexistent.cue"), "cue").unwrap_err();
        assert!(err.to_string().contains("Input file not found"));
    }

    #[test]
    fn test_render_error() {
        let err = StructuredError::new(cuekit_core::ErrorKind::Syntax, "expected value")
            .with_file("a.cue")
            .with_position(2, 3);
        assert_eq!(render_error(&err, false), "a.cue:2:3: expected value");
        assert_eq!(
            render_error(&err, true),
            r#"{"message":"expected value","line":2,"column":3,"file":"a.cue"}"#
        );
    }

    #[test]
    fn test_version_line() {
        assert!(version_line(&ReaderEngine).ends_with("(language v1.2.9)"));
    }
}
