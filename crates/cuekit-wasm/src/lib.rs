//! cuekit-wasm - WebAssembly bindings for cuekit
//!
//! This crate exposes the service operations to a JavaScript host. Every
//! export returns its result or throws the JSON form of a structured
//! error, e.g. `{"message":"a: conflicting values 1 and 2","line":1,...}`.
//!
//! `unify` takes the documents either as an object mapping paths to text
//! or as an array of texts, which are named `input_0.cue`, `input_1.cue`
//! and so on.

use cuekit_service::{default_service, Files, ServiceResult};
use serde::de::DeserializeOwned;
use tracing::debug;
use wasm_bindgen::prelude::*;

/// Language version of the engine
#[wasm_bindgen]
pub fn version() -> String {
    default_service().version().to_string()
}

/// Unify documents; `loadPaths` and `tags` may be undefined or null
#[wasm_bindgen]
pub fn unify(files: JsValue, load_paths: JsValue, tags: JsValue) -> Result<String, JsValue> {
    let files: Files = from_js(files, "first argument must be an object or array")?;
    let load_paths: Vec<String> = optional_list(load_paths)?;
    let tags: Vec<String> = optional_list(tags)?;
    throw(unify_files(files, &load_paths, &tags))
}

/// Check `data` against `schema`
#[wasm_bindgen]
pub fn validate(schema: &str, data: &str) -> Result<bool, JsValue> {
    throw(default_service().validate(schema, data).map(|()| true))
}

/// Evaluate a document and render it as `json`, `yaml` or `cue`
///
/// Exposed as `exportDocument`; `export` is reserved in JavaScript.
#[wasm_bindgen(js_name = exportDocument)]
pub fn export_document(input: &str, format: &str) -> Result<String, JsValue> {
    throw(default_service().export(input, format))
}

#[wasm_bindgen]
pub fn parse(input: &str) -> Result<String, JsValue> {
    throw(default_service().parse(input))
}

#[wasm_bindgen]
pub fn format(input: &str) -> Result<String, JsValue> {
    throw(default_service().format(input))
}

/// Package and field symbols as a JSON array
#[wasm_bindgen(js_name = getSymbols)]
pub fn get_symbols(input: &str) -> Result<String, JsValue> {
    throw(default_service().get_symbols(input))
}

/// Run an operation by name with a JSON request object
#[wasm_bindgen]
pub fn invoke(op: &str, request: &str) -> Result<String, JsValue> {
    throw(cuekit_service::invoke(default_service(), op, request))
}

/// Unify already-decoded documents
pub fn unify_files(files: Files, load_paths: &[String], tags: &[String]) -> ServiceResult<String> {
    let documents = files.into_documents();
    debug!(documents = documents.len(), "unify from host");
    default_service().unify(&documents, load_paths, tags)
}

fn throw<T>(result: ServiceResult<T>) -> Result<T, JsValue> {
    result.map_err(|err| JsValue::from_str(&err.to_json()))
}

fn from_js<T: DeserializeOwned>(value: JsValue, message: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| {
        debug!(error = %e, "rejected host argument");
        JsValue::from_str(&format!("{{\"message\":{:?}}}", message))
    })
}

fn optional_list(value: JsValue) -> Result<Vec<String>, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(Vec::new());
    }
    from_js(value, "expected an array of strings")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(pairs: &[(&str, &str)]) -> Files {
        Files::Named(
            pairs
                .iter()
                .map(|(p, t)| (p.to_string(), t.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_version() {
        assert_eq!(version(), "v1.2.9");
    }

    #[cfg(feature = "engine")]
    #[test]
    fn test_unify_named_files() {
        let out = unify_files(named(&[("a.cue", "a: 1"), ("b.cue", "b: a")]), &[], &[]).unwrap();
        assert_eq!(out, r#"{"a":1,"b":1}"#);
    }

    #[cfg(feature = "engine")]
    #[test]
    fn test_unify_anonymous_files_with_load_path() {
        let files = Files::Anonymous(vec!["a: 1".to_string(), "b: 2".to_string()]);
        let out = unify_files(files, &["input_1.cue".to_string()], &[]).unwrap();
        assert_eq!(out, r#"{"b":2}"#);
    }

    #[cfg(feature = "engine")]
    #[test]
    fn test_unify_tags() {
        let files = named(&[("a.cue", "a: string @tag(foo)")]);
        let out = unify_files(files, &[], &["foo=bar".to_string()]).unwrap();
        assert_eq!(out, r#"{"a":"bar"}"#);
    }

    #[cfg(not(feature = "engine"))]
    #[test]
    fn test_reader_build_refuses_unify() {
        let err = unify_files(named(&[("a.cue", "a: 1")]), &[], &[]).unwrap_err();
        assert_eq!(err.message, "Evaluation (Unify) requires the Full Engine");
    }
}
