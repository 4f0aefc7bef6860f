//! cuekit CLI - Command-line interface library
//!
//! This library provides the CLI functionality for cuekit:
//! - Unify: merge documents into one JSON value
//! - Vet: validate data against a schema
//! - Export: render a document as JSON, YAML or canonical syntax
//! - Fmt / Symbols: syntax-only tools
//!
//! # Binary Usage
//!
//! ```bash
//! # Unify every document below config/ with a tag
//! cuekit unify config/ -t env=prod
//!
//! # Validate data against a schema
//! cuekit vet schema.cue data.cue --json-errors
//!
//! # Export to YAML
//! cuekit export service.cue --format yaml
//! ```

pub mod app;
pub mod config;

pub use app::{
    collect_documents, export_command, fmt_command, render_error, run_cli, symbols_command,
    unify_command, vet_command,
};
pub use config::{load_settings, Settings};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
