//! cuekit-core - Syntax layer of the cuekit configuration engine
//!
//! This crate turns document text into a [`cuekit_ast::SourceFile`], renders
//! syntax trees back in canonical form, lists document symbols, and defines
//! the structured error model shared by every cuekit crate.
//!
//! # Example
//!
//! ```
//! use cuekit_core::{format_source, get_symbols};
//!
//! let formatted = format_source("a:   1\nbb: {x: 1}").unwrap();
//! assert_eq!(formatted, "a:  1\nbb: {x: 1}\n");
//!
//! let symbols = get_symbols("a: {b: 1}").unwrap();
//! assert_eq!(symbols.len(), 2);
//! ```

pub mod diagnostics;
pub mod format;
pub mod literal;
pub mod parser;
pub mod symbols;

pub use diagnostics::{
    report, ErrorKind, Location, Message, PositionedError, Report, StructuredError,
};
pub use format::{
    format_expr, format_file, format_source, format_source_with_config, FormatConfig, Formatter,
};
pub use parser::{parse, parse_file, SyntaxError};
pub use symbols::{get_symbols, symbols_json, Symbol, SymbolAnalyzer, SymbolKind};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Language version reported by the service
pub const LANGUAGE_VERSION: &str = "v1.2.9";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "1.0.0");
        assert!(LANGUAGE_VERSION.starts_with('v'));
    }
}
