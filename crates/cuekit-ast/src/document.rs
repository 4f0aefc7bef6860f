//! Source file root
//!
//! A parsed document: optional package clause followed by declarations.

use serde::{Deserialize, Serialize};

use crate::decl::{Comment, Decl, DeclKind, Field};
use crate::expr::Ident;

/// A parsed source file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceFile {
    /// Logical path of the document, if known
    pub filename: Option<String>,
    /// `package name` clause
    pub package: Option<PackageClause>,
    /// Top-level declarations
    pub decls: Vec<Decl>,
    /// Comments after the last declaration
    pub trailing_comments: Vec<Comment>,
}

/// A `package name` clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageClause {
    pub name: Ident,
    /// Comment lines directly above the clause
    pub comments: Vec<Comment>,
}

impl SourceFile {
    /// Create an empty file
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty file with a logical path
    pub fn with_filename(filename: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            ..Default::default()
        }
    }

    /// Add a declaration
    pub fn push(&mut self, decl: Decl) {
        self.decls.push(decl);
    }

    /// Name of the package, if declared
    pub fn package_name(&self) -> Option<&str> {
        self.package.as_ref().map(|p| p.name.name.as_str())
    }

    /// Top-level field declarations
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.decls.iter().filter_map(|d| match &d.kind {
            DeclKind::Field(field) => Some(field),
            _ => None,
        })
    }

    /// Check if the file has no declarations
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty() && self.package.is_none()
    }
}
