//! Full evaluation service

use cuekit_core::diagnostics::report;
use cuekit_eval::{evaluate, evaluate_text, DocumentStore, TagSet};
use cuekit_export::{export, Format};
use cuekit_validate::{validate, Mode};
use tracing::debug;

use crate::{CueService, ServiceResult};

/// Service with evaluation, validation and export
///
/// Holds no state; every call builds and drops its own evaluation context.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullEngine;

impl CueService for FullEngine {
    fn unify(
        &self,
        documents: &[(String, String)],
        load_paths: &[String],
        tags: &[String],
    ) -> ServiceResult<String> {
        debug!(documents = documents.len(), load_paths = load_paths.len(), "unify");
        let store = DocumentStore::from_documents(documents.iter().map(|(p, t)| (p, t.as_str())));
        let tags = TagSet::parse(tags).map_err(|e| report(&e))?;
        let value = evaluate(&store, load_paths, &tags).map_err(|e| report(&e))?;
        export(&value, Format::Json).map_err(|e| report(&e))
    }

    fn validate(&self, schema: &str, data: &str) -> ServiceResult<()> {
        debug!("validate");
        let source = format!("{}\n{}", schema, data);
        let value = evaluate_text(&source, &TagSet::new()).map_err(|e| report(&e))?;
        validate(&value, Mode::Concrete).map_err(|e| report(&e))
    }

    fn export(&self, input: &str, format: &str) -> ServiceResult<String> {
        let format: Format = format.parse().map_err(|e| report(&e))?;
        debug!(format = %format, "export");
        let value = evaluate_text(input, &TagSet::new()).map_err(|e| report(&e))?;
        export(&value, format).map_err(|e| report(&e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuekit_core::diagnostics::ErrorKind;

    fn docs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(p, t)| (p.to_string(), t.to_string()))
            .collect()
    }

    #[test]
    fn test_unify_merge() {
        let out = FullEngine
            .unify(&docs(&[("a.cue", "a: 1"), ("b.cue", "b: 2")]), &[], &[])
            .unwrap();
        assert_eq!(out, r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn test_unify_malformed_tag() {
        let err = FullEngine
            .unify(&docs(&[("a.cue", "a: 1")]), &[], &["novalue".to_string()])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Load);
    }

    #[test]
    fn test_export_checks_format_first() {
        let err = FullEngine.export("a: ;", "xml").unwrap_err();
        assert_eq!(err.message, "unsupported format: xml");
    }
}
