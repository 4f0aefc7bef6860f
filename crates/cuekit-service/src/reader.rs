//! Reader-only service
//!
//! Parses, formats and lists symbols; everything that needs evaluation is
//! refused with a capability error.

use cuekit_core::diagnostics::{ErrorKind, StructuredError};
use tracing::debug;

use crate::{CueService, ServiceResult};

/// Service built without the evaluation engine
#[derive(Debug, Clone, Copy, Default)]
pub struct ReaderEngine;

fn capability(message: &str) -> StructuredError {
    debug!(message, "operation refused by reader engine");
    StructuredError::new(ErrorKind::Capability, message)
}

impl CueService for ReaderEngine {
    fn unify(
        &self,
        _documents: &[(String, String)],
        _load_paths: &[String],
        _tags: &[String],
    ) -> ServiceResult<String> {
        Err(capability("Evaluation (Unify) requires the Full Engine"))
    }

    fn validate(&self, _schema: &str, _data: &str) -> ServiceResult<()> {
        Err(capability("Validation requires the Full Engine"))
    }

    fn export(&self, input: &str, format: &str) -> ServiceResult<String> {
        if format == "cue" {
            return self.format(input);
        }
        Err(capability("Evaluation exports require the Full Engine"))
    }
}
