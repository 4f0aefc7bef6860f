//! Evaluation errors

use std::borrow::Cow;

use cuekit_core::diagnostics::{ErrorKind, PositionedError, Report};
use cuekit_core::SyntaxError;
use thiserror::Error;

/// Failure to assemble the set of documents for one call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("failed to load instances")]
    NoDocuments,

    #[error("cannot find document or directory {0}")]
    UnknownPath(String),

    #[error("malformed tag {0:?}: expected key=value")]
    MalformedTag(String),

    #[error("found packages {first} and {second}")]
    PackageMismatch { first: String, second: String },
}

impl Report for LoadError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Load
    }

    fn plain_message(&self) -> String {
        self.to_string()
    }
}

/// Failure before a value could be produced
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl Report for EvalError {
    fn kind(&self) -> ErrorKind {
        match self {
            EvalError::Syntax(err) => err.kind(),
            EvalError::Load(err) => err.kind(),
        }
    }

    fn positioned(&self) -> Cow<'_, [PositionedError]> {
        match self {
            EvalError::Syntax(err) => err.positioned(),
            EvalError::Load(err) => err.positioned(),
        }
    }

    fn plain_message(&self) -> String {
        self.to_string()
    }
}
