//! cuekit-eval - Unification engine of the cuekit configuration engine
//!
//! Documents are parsed, compiled into lattice [`Value`]s by the
//! [`builder`], unified into one root with [`unify::meet`] and finally
//! resolved by the arena [`eval::Evaluator`].
//!
//! # Example
//!
//! ```
//! use cuekit_eval::{evaluate, DocumentStore, TagSet, Value};
//!
//! let store = DocumentStore::from_documents([("a.cue", "a: 1"), ("b.cue", "a: int\nb: a")]);
//! let value = evaluate(&store, &[] as &[&str], &TagSet::new()).unwrap();
//! let root = value.as_struct().unwrap();
//! assert_eq!(root.get("b"), Some(&Value::int(1)));
//! ```

pub mod builder;
pub mod error;
pub mod eval;
pub mod kind;
pub mod store;
pub mod tags;
pub mod unify;
pub mod value;

use indexmap::IndexSet;
use tracing::{debug, warn};

pub use builder::Builder;
pub use error::{EvalError, LoadError};
pub use eval::Evaluator;
pub use kind::KindSet;
pub use store::{normalize_path, DocumentStore};
pub use tags::{TagSet, TagType};
pub use unify::{meet, meet_embed, unify_all};
pub use value::{
    Atom, BasicType, Bound, BoundOp, Conflict, Disjunct, Field, ListValue, PathRef, Reference,
    Selector, StructValue, Thunk, Value, ValueKind,
};

/// Evaluate the load set of a store into one value
///
/// The result may still contain conflicts and incomplete values; checking
/// for them is left to the validator.
pub fn evaluate<S: AsRef<str>>(
    store: &DocumentStore,
    load_paths: &[S],
    tags: &TagSet,
) -> Result<Value, EvalError> {
    let documents = store.load_set(load_paths)?;

    let mut package: Option<String> = None;
    let mut values = Vec::with_capacity(documents.len());
    let mut used_tags: IndexSet<String> = IndexSet::new();
    for (path, text) in documents {
        let file = cuekit_core::parse_file(Some(path), text)?;
        if let Some(name) = file.package_name() {
            match &package {
                Some(first) if first != name => {
                    return Err(LoadError::PackageMismatch {
                        first: first.clone(),
                        second: name.to_string(),
                    }
                    .into())
                }
                Some(_) => {}
                None => package = Some(name.to_string()),
            }
        }
        let mut builder = Builder::new(Some(path), tags);
        values.push(builder.build_file(&file));
        used_tags.extend(builder.used_tags().iter().cloned());
    }

    for key in tags.keys().filter(|k| !used_tags.contains(*k)) {
        warn!(tag = key, "tag does not match any @tag attribute");
    }

    debug!(documents = values.len(), package = ?package, "unifying documents");
    let root = unify_all(values);
    Ok(Evaluator::new(root).evaluate())
}

/// Evaluate a single document
pub fn evaluate_source(filename: &str, text: &str, tags: &TagSet) -> Result<Value, EvalError> {
    let mut store = DocumentStore::new();
    store.insert(filename, text);
    evaluate(&store, &[] as &[&str], tags)
}

/// Evaluate text that does not belong to a named document
///
/// Positions in the result carry a line and column but no file.
pub fn evaluate_text(text: &str, tags: &TagSet) -> Result<Value, EvalError> {
    let file = cuekit_core::parse(text)?;
    let mut builder = Builder::new(None, tags);
    let root = builder.build_file(&file);
    Ok(Evaluator::new(root).evaluate())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_mismatch() {
        let store = DocumentStore::from_documents([
            ("a.cue", "package a\nx: 1"),
            ("b.cue", "package b\ny: 1"),
        ]);
        let err = evaluate(&store, &[] as &[&str], &TagSet::new()).unwrap_err();
        assert_eq!(err.to_string(), "found packages a and b");
    }

    #[test]
    fn test_syntax_error_names_file() {
        let store = DocumentStore::from_documents([("bad.cue", "a: ;")]);
        let err = evaluate(&store, &[] as &[&str], &TagSet::new()).unwrap_err();
        match err {
            EvalError::Syntax(syntax) => assert_eq!(syntax.file.as_deref(), Some("/bad.cue")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_evaluate_source() {
        let value = evaluate_source("x.cue", "a: 1\nb: a", &TagSet::new()).unwrap();
        assert_eq!(value.as_struct().unwrap().get("b"), Some(&Value::int(1)));
    }

    #[test]
    fn test_evaluate_text_has_no_file() {
        let value = evaluate_text("a: 1\na: 2", &TagSet::new()).unwrap();
        let conflict = value.as_struct().unwrap().fields["a"].value.conflict_record().cloned();
        let positions = conflict.unwrap().positions;
        assert_eq!(positions.len(), 2);
        assert!(positions.iter().all(|p| p.file.is_none()));
    }
}
