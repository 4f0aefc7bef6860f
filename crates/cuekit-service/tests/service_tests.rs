//! Service integration tests
#![cfg(feature = "engine")]

use cuekit_core::diagnostics::{ErrorKind, StructuredError};
use cuekit_service::{invoke, CueService, FullEngine, ReaderEngine};

fn docs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(p, t)| (p.to_string(), t.to_string()))
        .collect()
}

fn tags(items: &[&str]) -> Vec<String> {
    items.iter().map(|t| t.to_string()).collect()
}

fn unify(pairs: &[(&str, &str)], tag_items: &[&str]) -> Result<String, StructuredError> {
    FullEngine.unify(&docs(pairs), &[], &tags(tag_items))
}

// ==================== UNIFY ====================

#[test]
fn test_unify_basic_merge() {
    assert_eq!(
        unify(&[("a.cue", "a: 1"), ("b.cue", "b: 2")], &[]).unwrap(),
        r#"{"a":1,"b":2}"#
    );
}

#[test]
fn test_unify_schema_narrows() {
    assert_eq!(
        unify(&[("a.cue", "a: 1"), ("schema.cue", "a: int")], &[]).unwrap(),
        r#"{"a":1}"#
    );
}

#[test]
fn test_unify_conflict() {
    let err = unify(&[("a.cue", "a: 1"), ("b.cue", "a: 2")], &[]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(err.message, "a: conflicting values 1 and 2");
    assert_eq!(err.file, "/a.cue");
    assert_eq!((err.line, err.column), (1, 4));
}

#[test]
fn test_unify_syntax_error() {
    let err = unify(&[("a.cue", "a: ;")], &[]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert_eq!(err.file, "/a.cue");
    assert_eq!(err.line, 1);
}

#[test]
fn test_unify_with_tags() {
    assert_eq!(
        unify(&[("a.cue", "a: string @tag(foo)")], &["foo=bar"]).unwrap(),
        r#"{"a":"bar"}"#
    );
}

#[test]
fn test_unify_missing_tag_is_incomplete() {
    let err = unify(&[("a.cue", "a: string @tag(foo)")], &[]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Incomplete);
}

#[test]
fn test_unify_load_paths() {
    let files = docs(&[("a.cue", "a: 1"), ("b.cue", "a: 2"), ("sub/c.cue", "c: 3")]);
    let out = FullEngine
        .unify(&files, &["/a.cue".to_string(), "sub".to_string()], &[])
        .unwrap();
    assert_eq!(out, r#"{"a":1,"c":3}"#);
}

#[test]
fn test_unify_unknown_load_path() {
    let files = docs(&[("a.cue", "a: 1")]);
    let err = FullEngine.unify(&files, &["nope.cue".to_string()], &[]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Load);
    assert_eq!(err.message, "cannot find document or directory /nope.cue");
}

#[test]
fn test_unify_no_documents() {
    let err = FullEngine.unify(&[], &[], &[]).unwrap_err();
    assert_eq!(err.to_string(), r#"{"message":"failed to load instances"}"#);
}

#[test]
fn test_unify_module_metadata_skipped() {
    let out = unify(
        &[("cue.mod/module.cue", "module: \"x\""), ("a.cue", "a: 1")],
        &[],
    )
    .unwrap();
    assert_eq!(out, r#"{"a":1}"#);
}

#[test]
fn test_unify_references() {
    assert_eq!(unify(&[("a.cue", "a: b\nb: 1")], &[]).unwrap(), r#"{"a":1,"b":1}"#);
    let err = unify(&[("a.cue", "a: b\nb: a")], &[]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Incomplete);
}

#[test]
fn test_unify_undeclared_reference() {
    let err = unify(&[("a.cue", "a: nothing")], &[]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Reference);
}

// ==================== VALIDATE ====================

#[test]
fn test_validate_valid() {
    assert!(FullEngine
        .validate("#User: { name: string, age: int }", "#User & { name: \"Alice\", age: 30 }")
        .is_ok());
}

#[test]
fn test_validate_invalid_type() {
    let err = FullEngine
        .validate("#User: { age: int }", "#User & { age: \"old\" }")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert!(err.to_string().contains("message"));
    assert!(err.file.is_empty());
}

#[test]
fn test_validate_missing_field() {
    let err = FullEngine
        .validate("#User: { name: string }", "#User & {}")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Incomplete);
    assert_eq!(err.message, "name: incomplete value string");
}

#[test]
fn test_validate_closed_definition() {
    let err = FullEngine
        .validate("#User: { name: string }", "#User & { name: \"a\", extra: 1 }")
        .unwrap_err();
    assert_eq!(err.message, "extra: field not allowed");
}

// ==================== EXPORT ====================

const EXPORT_INPUT: &str = "\na: 1\nb: \"two\"\n";

#[test]
fn test_export_formats() {
    assert_eq!(FullEngine.export(EXPORT_INPUT, "json").unwrap(), r#"{"a":1,"b":"two"}"#);
    assert_eq!(FullEngine.export(EXPORT_INPUT, "yaml").unwrap(), "a: 1\nb: two\n");
    assert_eq!(
        FullEngine.export(EXPORT_INPUT, "cue").unwrap(),
        "{\n\ta: 1\n\tb: \"two\"\n}"
    );
}

#[test]
fn test_export_unsupported_format() {
    let err = FullEngine.export(EXPORT_INPUT, "xml").unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnsupportedFormat);
    assert_eq!(err.to_string(), r#"{"message":"unsupported format: xml"}"#);
}

#[test]
fn test_export_defaults() {
    assert_eq!(
        FullEngine.export("a: *\"dev\" | \"prod\"", "json").unwrap(),
        r#"{"a":"dev"}"#
    );
    assert_eq!(
        FullEngine.export("a: *\"dev\" | \"prod\"\na: \"prod\"", "json").unwrap(),
        r#"{"a":"prod"}"#
    );
}

#[test]
fn test_export_bounds() {
    let err = FullEngine.export("a: int & >=0\na: -1", "json").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert_eq!(
        FullEngine.export("a: >=0 & <10\na: 5", "json").unwrap(),
        r#"{"a":5}"#
    );
}

// ==================== OPERATION TABLE ====================

#[test]
fn test_invoke_unify_with_array() {
    let out = invoke(&FullEngine, "unify", r#"{"files": ["a: 1", "b: a"]}"#).unwrap();
    assert_eq!(out, r#"{"a":1,"b":1}"#);
}

#[test]
fn test_invoke_validate() {
    let out = invoke(
        &FullEngine,
        "validate",
        r#"{"schema": "a: int", "data": "a: 1"}"#,
    )
    .unwrap();
    assert_eq!(out, "true");
}

#[test]
fn test_invoke_get_symbols() {
    let out = invoke(&FullEngine, "getSymbols", r#"{"input": "package p\nx: {y: 1}"}"#).unwrap();
    let symbols: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(symbols.as_array().unwrap().len(), 3);
    assert_eq!(symbols[0]["type"], "package");
}

// ==================== READER VARIANT ====================

#[test]
fn test_reader_and_full_share_syntax_operations() {
    let input = "b:   1\nlong: {x: 1}";
    assert_eq!(ReaderEngine.format(input), FullEngine.format(input));
    assert_eq!(ReaderEngine.get_symbols(input), FullEngine.get_symbols(input));
}

#[test]
fn test_reader_refuses_evaluation() {
    let err = invoke(&ReaderEngine, "unify", r#"{"files": {"a.cue": "a: 1"}}"#).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Capability);
}
