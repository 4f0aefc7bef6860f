//! JSON request shapes accepted by the operation table

use indexmap::IndexMap;
use serde::Deserialize;

/// Documents of a unify request
///
/// Either an object mapping paths to text, or an array of texts named
/// `input_0.cue`, `input_1.cue`, ... in order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Files {
    Named(IndexMap<String, String>),
    Anonymous(Vec<String>),
}

impl Files {
    pub fn into_documents(self) -> Vec<(String, String)> {
        match self {
            Files::Named(map) => map.into_iter().collect(),
            Files::Anonymous(texts) => texts
                .into_iter()
                .enumerate()
                .map(|(i, text)| (format!("input_{}.cue", i), text))
                .collect(),
        }
    }
}

impl Default for Files {
    fn default() -> Self {
        Files::Named(IndexMap::new())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifyRequest {
    pub files: Files,
    #[serde(default)]
    pub load_paths: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidateRequest {
    pub schema: String,
    pub data: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportRequest {
    pub input: String,
    pub format: String,
}

/// Request of the syntax-only operations
#[derive(Debug, Clone, Deserialize)]
pub struct SourceRequest {
    pub input: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_files() {
        let req: UnifyRequest =
            serde_json::from_str(r#"{"files": {"b.cue": "b: 1", "a.cue": "a: 1"}}"#).unwrap();
        assert_eq!(
            req.files.into_documents(),
            vec![
                ("b.cue".to_string(), "b: 1".to_string()),
                ("a.cue".to_string(), "a: 1".to_string())
            ]
        );
        assert!(req.load_paths.is_empty());
    }

    #[test]
    fn test_anonymous_files() {
        let req: UnifyRequest = serde_json::from_str(
            r#"{"files": ["a: 1", "b: 2"], "loadPaths": ["input_1.cue"], "tags": ["x=y"]}"#,
        )
        .unwrap();
        assert_eq!(req.load_paths, vec!["input_1.cue"]);
        assert_eq!(req.tags, vec!["x=y"]);
        let docs = req.files.into_documents();
        assert_eq!(docs[1], ("input_1.cue".to_string(), "b: 2".to_string()));
    }
}
