//! cuekit-ast - Syntax tree definitions
//!
//! This crate provides the syntax tree types produced by the cuekit parser
//! and consumed by the formatter, the symbol outline and the value builder.
//! Node kinds are closed enums so that every consumer matches them
//! exhaustively.

pub mod decl;
pub mod document;
pub mod expr;
pub mod pos;

pub use decl::{Attribute, Comment, Decl, DeclKind, Field, FieldMarker, Label, LabelKind};
pub use document::{PackageClause, SourceFile};
pub use expr::{BinaryOp, Expr, Ident, ListElem, ListLit, Lit, LitKind, StructLit, UnaryOp};
pub use pos::Pos;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
