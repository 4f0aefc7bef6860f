//! Named operation table
//!
//! Hosts that dispatch by name (the WebAssembly adapter, scripted callers)
//! go through [`invoke`]: an operation name plus a JSON request object in,
//! a string out. The table is built on first use and never changes.

use std::collections::HashMap;
use std::sync::OnceLock;

use cuekit_core::diagnostics::{ErrorKind, StructuredError};
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::request::{ExportRequest, SourceRequest, UnifyRequest, ValidateRequest};
use crate::{CueService, ServiceResult};

type Handler = fn(&dyn CueService, &str) -> ServiceResult<String>;

fn table() -> &'static HashMap<&'static str, Handler> {
    static TABLE: OnceLock<HashMap<&'static str, Handler>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut ops: HashMap<&'static str, Handler> = HashMap::new();
        ops.insert("unify", unify);
        ops.insert("validate", validate);
        ops.insert("export", export);
        ops.insert("parse", parse);
        ops.insert("format", format);
        ops.insert("getSymbols", get_symbols);
        ops.insert("version", version);
        ops
    })
}

/// Names of all operations, sorted
pub fn operation_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = table().keys().copied().collect();
    names.sort_unstable();
    names
}

/// Run an operation by name
pub fn invoke(service: &dyn CueService, op: &str, request: &str) -> ServiceResult<String> {
    let handler = table().get(op).ok_or_else(|| {
        StructuredError::new(ErrorKind::Internal, format!("unknown operation: {}", op))
    })?;
    trace!(op, "invoke");
    handler(service, request)
}

fn decode<T: DeserializeOwned>(request: &str) -> ServiceResult<T> {
    serde_json::from_str(request).map_err(|e| {
        StructuredError::new(ErrorKind::Internal, format!("invalid request: {}", e))
    })
}

fn unify(service: &dyn CueService, request: &str) -> ServiceResult<String> {
    let req: UnifyRequest = decode(request)?;
    service.unify(&req.files.into_documents(), &req.load_paths, &req.tags)
}

fn validate(service: &dyn CueService, request: &str) -> ServiceResult<String> {
    let req: ValidateRequest = decode(request)?;
    service.validate(&req.schema, &req.data)?;
    Ok("true".to_string())
}

fn export(service: &dyn CueService, request: &str) -> ServiceResult<String> {
    let req: ExportRequest = decode(request)?;
    service.export(&req.input, &req.format)
}

fn parse(service: &dyn CueService, request: &str) -> ServiceResult<String> {
    let req: SourceRequest = decode(request)?;
    service.parse(&req.input)
}

fn format(service: &dyn CueService, request: &str) -> ServiceResult<String> {
    let req: SourceRequest = decode(request)?;
    service.format(&req.input)
}

fn get_symbols(service: &dyn CueService, request: &str) -> ServiceResult<String> {
    let req: SourceRequest = decode(request)?;
    service.get_symbols(&req.input)
}

fn version(service: &dyn CueService, _request: &str) -> ServiceResult<String> {
    Ok(service.version().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReaderEngine;

    #[test]
    fn test_operation_names() {
        assert_eq!(
            operation_names(),
            vec!["export", "format", "getSymbols", "parse", "unify", "validate", "version"]
        );
    }

    #[test]
    fn test_unknown_operation() {
        let err = invoke(&ReaderEngine, "compile", "{}").unwrap_err();
        assert_eq!(err.message, "unknown operation: compile");
    }

    #[test]
    fn test_invalid_request() {
        let err = invoke(&ReaderEngine, "format", "{\"text\": 1}").unwrap_err();
        assert!(err.message.starts_with("invalid request:"));
    }

    #[test]
    fn test_dispatch_format_and_version() {
        assert_eq!(
            invoke(&ReaderEngine, "format", r#"{"input": "a:  1"}"#).unwrap(),
            "a: 1\n"
        );
        assert_eq!(invoke(&ReaderEngine, "version", "").unwrap(), "v1.2.9");
    }
}
