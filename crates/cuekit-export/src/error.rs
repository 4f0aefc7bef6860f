//! Error types for export.

use std::borrow::Cow;

use cuekit_core::diagnostics::{ErrorKind, PositionedError, Report};
use cuekit_validate::ValidationError;
use thiserror::Error;

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors that can occur while exporting a value
#[derive(Error, Debug)]
pub enum ExportError {
    /// The requested output format is not known
    #[error("unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// The value is not concrete or holds a conflict
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encoding error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Report for ExportError {
    fn kind(&self) -> ErrorKind {
        match self {
            ExportError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            ExportError::Validation(err) => err.kind(),
            ExportError::Json(_) | ExportError::Yaml(_) => ErrorKind::Internal,
        }
    }

    fn positioned(&self) -> Cow<'_, [PositionedError]> {
        match self {
            ExportError::Validation(err) => err.positioned(),
            _ => Cow::Borrowed(&[]),
        }
    }

    fn plain_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuekit_core::report;

    #[test]
    fn test_unsupported_format_message() {
        let err = ExportError::UnsupportedFormat {
            format: "xml".to_string(),
        };
        let structured = report(&err);
        assert_eq!(structured.message, "unsupported format: xml");
        assert_eq!(structured.kind, ErrorKind::UnsupportedFormat);
        assert_eq!(structured.to_json(), r#"{"message":"unsupported format: xml"}"#);
    }
}
