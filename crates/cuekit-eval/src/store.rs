//! In-memory document store
//!
//! Documents are addressed by logical path. Paths are normalized so that
//! `a.cue`, `./a.cue` and `/a.cue` name the same document.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::LoadError;

/// Directory holding module metadata, never loaded by default
const MODULE_DIR: &str = "/cue.mod/";

/// Normalize a logical path: leading `/`, no `./` segments, no trailing `/`
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    format!("/{}", segments.join("/"))
}

/// An ordered overlay of documents
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    docs: IndexMap<String, String>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `(path, text)` pairs
    pub fn from_documents<I, P, T>(documents: I) -> Self
    where
        I: IntoIterator<Item = (P, T)>,
        P: AsRef<str>,
        T: Into<String>,
    {
        let mut store = Self::new();
        for (path, text) in documents {
            store.insert(path.as_ref(), text);
        }
        store
    }

    /// Add or replace a document
    pub fn insert(&mut self, path: &str, text: impl Into<String>) {
        self.docs.insert(normalize_path(path), text.into());
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.docs.get(&normalize_path(path)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Documents to evaluate, sorted by path
    ///
    /// With no explicit paths every document outside `cue.mod/` is loaded.
    /// An explicit path selects the document with that path, or every
    /// document below it when it names a directory.
    pub fn load_set<S: AsRef<str>>(&self, paths: &[S]) -> Result<Vec<(&str, &str)>, LoadError> {
        let mut selected: Vec<(&str, &str)> = Vec::new();
        if paths.is_empty() {
            selected.extend(
                self.docs
                    .iter()
                    .filter(|(path, _)| !format!("{}/", path).starts_with(MODULE_DIR))
                    .map(|(p, t)| (p.as_str(), t.as_str())),
            );
        } else {
            for requested in paths {
                let requested = normalize_path(requested.as_ref());
                let prefix = if requested == "/" {
                    requested.clone()
                } else {
                    format!("{}/", requested)
                };
                let matches: Vec<(&str, &str)> = self
                    .docs
                    .iter()
                    .filter(|(path, _)| **path == requested || path.starts_with(&prefix))
                    .map(|(p, t)| (p.as_str(), t.as_str()))
                    .collect();
                if matches.is_empty() {
                    return Err(LoadError::UnknownPath(requested));
                }
                for doc in matches {
                    if !selected.iter().any(|(p, _)| *p == doc.0) {
                        selected.push(doc);
                    }
                }
            }
        }

        if selected.is_empty() {
            return Err(LoadError::NoDocuments);
        }
        selected.sort_by(|a, b| a.0.cmp(b.0));
        debug!(documents = selected.len(), "load set resolved");
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("a.cue"), "/a.cue");
        assert_eq!(normalize_path("./dir/b.cue"), "/dir/b.cue");
        assert_eq!(normalize_path("/dir/"), "/dir");
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn test_default_load_set_skips_module_metadata() {
        let store = DocumentStore::from_documents([
            ("b.cue", "b: 1"),
            ("a.cue", "a: 1"),
            ("cue.mod/module.cue", "module: \"x\""),
        ]);
        let paths: Vec<&str> = store.load_set::<&str>(&[]).unwrap().iter().map(|d| d.0).collect();
        assert_eq!(paths, vec!["/a.cue", "/b.cue"]);
    }

    #[test]
    fn test_explicit_paths_and_directories() {
        let store = DocumentStore::from_documents([
            ("/cfg/a.cue", "a: 1"),
            ("/cfg/b.cue", "b: 1"),
            ("/other.cue", "c: 1"),
        ]);
        let set = store.load_set(&["cfg"]).unwrap();
        assert_eq!(set.len(), 2);
        let set = store.load_set(&["/other.cue"]).unwrap();
        assert_eq!(set, vec![("/other.cue", "c: 1")]);
    }

    #[test]
    fn test_errors() {
        let empty = DocumentStore::new();
        assert_eq!(empty.load_set::<&str>(&[]), Err(LoadError::NoDocuments));

        let store = DocumentStore::from_documents([("/a.cue", "a: 1")]);
        assert_eq!(
            store.load_set(&["missing.cue"]),
            Err(LoadError::UnknownPath("/missing.cue".to_string()))
        );
    }
}
