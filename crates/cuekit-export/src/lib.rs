//! cuekit-export - Output formats for evaluated configuration values
//!
//! Export always re-checks that the value is concrete: a value that still
//! holds a conflict or an unresolved constraint is never written.
//!
//! # Example
//!
//! ```
//! use cuekit_eval::{evaluate_source, TagSet};
//! use cuekit_export::{export, Format};
//!
//! let value = evaluate_source("a.cue", "a: 1\nb: \"two\"", &TagSet::new()).unwrap();
//! assert_eq!(export(&value, Format::Json).unwrap(), r#"{"a":1,"b":"two"}"#);
//! assert_eq!(export(&value, Format::Yaml).unwrap(), "a: 1\nb: two\n");
//! ```

pub mod cue;
pub mod error;
pub mod manifest;
pub mod yaml;

use std::fmt;
use std::str::FromStr;

use cuekit_eval::Value;
use cuekit_validate::Mode;
use tracing::debug;

pub use error::{ExportError, Result};
pub use manifest::Manifest;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Compact JSON
    #[default]
    Json,
    Yaml,
    /// Canonical configuration syntax
    Cue,
}

impl Format {
    pub fn name(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Cue => "cue",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(Format::Json),
            "yaml" => Ok(Format::Yaml),
            "cue" => Ok(Format::Cue),
            other => Err(ExportError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// Validate a value for concreteness and render it
pub fn export(value: &Value, format: Format) -> Result<String> {
    cuekit_validate::validate(value, Mode::Concrete)?;
    debug!(format = %format, "exporting value");
    match format {
        Format::Json => to_json(value),
        Format::Yaml => yaml::to_yaml(value),
        Format::Cue => Ok(cue::to_cue(value)),
    }
}

/// Compact JSON for a concrete value, without re-validating
pub fn to_json(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(&Manifest(value))?)
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_format_names() {
        for format in [Format::Json, Format::Yaml, Format::Cue] {
            assert_eq!(format.name().parse::<Format>().unwrap(), format);
        }
    }

    #[test]
    fn test_unknown_format() {
        let err = "xml".parse::<Format>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported format: xml");
    }
}
