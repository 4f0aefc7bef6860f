//! cuekit-validate - Validation of evaluated configuration values
//!
//! This crate checks an evaluated [`Value`] for conflicts and, when the
//! configuration is about to be exported, for values that are not yet
//! concrete.
//!
//! # Architecture
//!
//! Individual checks implement the [`Validator`] trait. The
//! [`ValidationEngine`] runs its validators in order and collects their
//! errors; conflicts are therefore always reported before incomplete values.
//! Each validator walks the value depth-first: struct fields in declaration
//! order, then list elements by index.
//!
//! # Example
//!
//! ```
//! use cuekit_eval::{evaluate_source, TagSet};
//! use cuekit_validate::{validate, Mode};
//!
//! let value = evaluate_source("a.cue", "a: int\nb: 1", &TagSet::new()).unwrap();
//! assert!(validate(&value, Mode::Structural).is_ok());
//!
//! let err = validate(&value, Mode::Concrete).unwrap_err();
//! assert_eq!(err.to_string(), "a: incomplete value int");
//! ```

pub mod concrete;
pub mod conflict;

use std::borrow::Cow;

use cuekit_core::diagnostics::{ErrorKind, Location, PositionedError, Report};
use cuekit_core::literal;
use cuekit_eval::{Selector, Value};
use thiserror::Error;
use tracing::debug;

pub use concrete::ConcretenessValidator;
pub use conflict::ConflictValidator;

/// How strict validation is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Only contradictions are errors
    #[default]
    Structural,
    /// Every regular field must also be fully determined
    Concrete,
}

/// Trait for value validators
pub trait Validator: Send + Sync {
    /// A short, unique name
    fn name(&self) -> &'static str;

    /// Check a value and return every error found, in walk order
    fn validate(&self, value: &Value) -> Vec<PositionedError>;
}

/// Runs a sequence of validators
pub struct ValidationEngine {
    validators: Vec<Box<dyn Validator>>,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationEngine {
    /// Create an engine without validators
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    /// Create the engine for a validation mode
    pub fn for_mode(mode: Mode) -> Self {
        let mut engine = Self::new();
        engine.add_validator(Box::new(ConflictValidator));
        if mode == Mode::Concrete {
            engine.add_validator(Box::new(ConcretenessValidator));
        }
        engine
    }

    pub fn add_validator(&mut self, validator: Box<dyn Validator>) {
        self.validators.push(validator);
    }

    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    pub fn validator_names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    /// Run every validator and collect their errors
    pub fn validate(&self, value: &Value) -> Vec<PositionedError> {
        let mut errors = Vec::new();
        for validator in &self.validators {
            let found = validator.validate(value);
            debug!(validator = validator.name(), errors = found.len(), "validator finished");
            errors.extend(found);
        }
        errors
    }
}

/// Errors found in a value, in report order
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .errors.first().map(PositionedError::render).unwrap_or_default())]
pub struct ValidationError {
    pub errors: Vec<PositionedError>,
}

impl Report for ValidationError {
    fn kind(&self) -> ErrorKind {
        self.errors.first().map(|e| e.kind).unwrap_or_default()
    }

    fn positioned(&self) -> Cow<'_, [PositionedError]> {
        Cow::Borrowed(&self.errors)
    }

    fn plain_message(&self) -> String {
        self.to_string()
    }
}

/// Validate a value
pub fn validate(value: &Value, mode: Mode) -> Result<(), ValidationError> {
    let errors = ValidationEngine::for_mode(mode).validate(value);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { errors })
    }
}

/// Path segment for a selector, quoted when not an identifier
pub(crate) fn segment(sel: &Selector) -> String {
    match sel {
        Selector::Field(label) if literal::is_identifier(label) => label.clone(),
        Selector::Field(label) => literal::quote(label),
        Selector::Index(i) => i.to_string(),
    }
}

/// First known position: the value's own, else the enclosing field's
pub(crate) fn positions_for(value: &Value, field_pos: Option<&Location>) -> Vec<Location> {
    value
        .pos
        .as_ref()
        .or(field_pos)
        .into_iter()
        .cloned()
        .collect()
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
