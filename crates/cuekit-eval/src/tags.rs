//! External tag values
//!
//! Tags are `key=value` strings supplied with a call. Fields carrying a
//! `@tag(key)` attribute are met with the parsed value at build time.

use indexmap::IndexMap;

use crate::error::LoadError;
use crate::value::Atom;

/// Declared type of a tag placeholder (`@tag(name,type=int)`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagType {
    #[default]
    String,
    Int,
    Number,
    Bool,
}

impl TagType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(TagType::String),
            "int" => Some(TagType::Int),
            "number" => Some(TagType::Number),
            "bool" => Some(TagType::Bool),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TagType::String => "string",
            TagType::Int => "int",
            TagType::Number => "number",
            TagType::Bool => "bool",
        }
    }

    /// Interpret raw tag text as a value of this type
    pub fn parse(self, raw: &str) -> Option<Atom> {
        match self {
            TagType::String => Some(Atom::String(raw.to_string())),
            TagType::Int => cuekit_core::literal::parse_int(raw).ok().map(Atom::Int),
            TagType::Number => cuekit_core::literal::parse_int(raw)
                .map(Atom::Int)
                .or_else(|_| cuekit_core::literal::parse_float(raw).map(Atom::Float))
                .ok(),
            TagType::Bool => match raw {
                "true" => Some(Atom::Bool(true)),
                "false" => Some(Atom::Bool(false)),
                _ => None,
            },
        }
    }
}

/// Tags supplied with one call, in the order given
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagSet {
    tags: IndexMap<String, String>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `key=value` strings; a later duplicate key overrides
    pub fn parse<S: AsRef<str>>(items: &[S]) -> Result<Self, LoadError> {
        let mut set = TagSet::new();
        for item in items {
            let item = item.as_ref();
            match item.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    set.insert(key.trim(), value);
                }
                _ => return Err(LoadError::MalformedTag(item.to_string())),
            }
        }
        Ok(set)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }
}
