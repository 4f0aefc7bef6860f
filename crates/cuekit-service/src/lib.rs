//! cuekit-service - Call surface of the cuekit configuration engine
//!
//! Every operation takes plain text in and hands plain text back. Failures
//! leave the service as a [`StructuredError`], whose `Display` is its JSON
//! form.
//!
//! Two implementations of [`CueService`] exist. [`FullEngine`] evaluates,
//! validates and exports and is available with the `engine` feature (on
//! by default). [`ReaderEngine`] only parses, formats and lists symbols;
//! it answers the evaluating operations with a capability error.
//! [`default_service`] picks the widest one the build provides.
//!
//! # Example
//!
//! ```
//! use cuekit_service::{default_service, CueService};
//!
//! let svc = default_service();
//! assert_eq!(svc.format("a:   1").unwrap(), "a: 1\n");
//! assert_eq!(svc.version(), "v1.2.9");
//! ```

#[cfg(feature = "engine")]
pub mod engine;
pub mod ops;
pub mod reader;
pub mod request;

use cuekit_core::diagnostics::StructuredError;

#[cfg(feature = "engine")]
pub use engine::FullEngine;
pub use ops::{invoke, operation_names};
pub use reader::ReaderEngine;
pub use request::{ExportRequest, Files, SourceRequest, UnifyRequest, ValidateRequest};

/// Result type of every service operation
pub type ServiceResult<T> = Result<T, StructuredError>;

/// The operations a host can call
pub trait CueService: Send + Sync {
    /// Unify documents (`path`, `text`) into one concrete value, as JSON
    ///
    /// `load_paths` restricts evaluation to the named documents or
    /// directories; `tags` are `key=value` pairs for `@tag` placeholders.
    fn unify(
        &self,
        documents: &[(String, String)],
        load_paths: &[String],
        tags: &[String],
    ) -> ServiceResult<String>;

    /// Check `data` against `schema`, compiled together as one document
    fn validate(&self, schema: &str, data: &str) -> ServiceResult<()>;

    /// Evaluate one document and render it as `json`, `yaml` or `cue`
    fn export(&self, input: &str, format: &str) -> ServiceResult<String>;

    /// Syntax check; returns the formatted document
    fn parse(&self, input: &str) -> ServiceResult<String> {
        self.format(input)
    }

    /// Canonical re-rendering of a document
    fn format(&self, input: &str) -> ServiceResult<String> {
        cuekit_core::format_source(input).map_err(|e| e.to_structured())
    }

    /// Package and field symbols of a document, as a JSON array
    fn get_symbols(&self, input: &str) -> ServiceResult<String> {
        cuekit_core::symbols_json(input).map_err(|e| e.to_structured())
    }

    /// Language version implemented by the service
    fn version(&self) -> &'static str {
        cuekit_core::LANGUAGE_VERSION
    }
}

/// The widest service this build provides
pub fn default_service() -> &'static dyn CueService {
    #[cfg(feature = "engine")]
    {
        static FULL: FullEngine = FullEngine;
        &FULL
    }
    #[cfg(not(feature = "engine"))]
    {
        static READER: ReaderEngine = ReaderEngine;
        &READER
    }
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(default_service().version(), "v1.2.9");
    }

    #[test]
    fn test_parse_is_format() {
        let svc = ReaderEngine;
        assert_eq!(svc.parse("a:{b:1}").unwrap(), svc.format("a:{b:1}").unwrap());
    }

    #[test]
    fn test_format_syntax_error_is_structured() {
        let err = ReaderEngine.format("a: ;").unwrap_err();
        assert!(err.line > 0);
        assert!(err.to_string().starts_with("{\"message\":"));
    }

    #[test]
    fn test_empty_symbols() {
        assert_eq!(ReaderEngine.get_symbols("").unwrap(), "[]");
    }
}
