//! Symbol outline for configuration documents
//!
//! Produces a flat, document-ordered list of symbols:
//! - The package clause → `package`
//! - Every field declaration, including fields of nested struct
//!   literals → `field`
//!
//! Labels are reported unquoted, at the label's own position. No
//! unification or tag substitution happens here.

use cuekit_ast::{Decl, DeclKind, Expr, ListElem, SourceFile};
use serde::{Deserialize, Serialize};

use crate::parser::{self, SyntaxError};

/// Kind of an outline entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Package,
    Field,
}

/// One outline entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SymbolKind,
    pub line: usize,
    pub column: usize,
}

/// Walks a syntax tree collecting symbols
pub struct SymbolAnalyzer;

impl SymbolAnalyzer {
    /// Extract symbols from a parsed file
    pub fn extract_symbols(file: &SourceFile) -> Vec<Symbol> {
        let mut symbols = Vec::new();
        if let Some(package) = &file.package {
            symbols.push(Symbol {
                name: package.name.name.clone(),
                kind: SymbolKind::Package,
                line: package.name.pos.line,
                column: package.name.pos.column,
            });
        }
        Self::walk_decls(&file.decls, &mut symbols);
        symbols
    }

    fn walk_decls(decls: &[Decl], symbols: &mut Vec<Symbol>) {
        for decl in decls {
            match &decl.kind {
                DeclKind::Field(field) => {
                    symbols.push(Symbol {
                        name: field.label.name.clone(),
                        kind: SymbolKind::Field,
                        line: field.label.pos.line,
                        column: field.label.pos.column,
                    });
                    Self::walk_expr(&field.value, symbols);
                }
                DeclKind::Embed(expr) => Self::walk_expr(expr, symbols),
                DeclKind::Ellipsis { ty: Some(ty), .. } => Self::walk_expr(ty, symbols),
                DeclKind::Ellipsis { ty: None, .. } | DeclKind::Attribute(_) => {}
            }
        }
    }

    fn walk_expr(expr: &Expr, symbols: &mut Vec<Symbol>) {
        match expr {
            Expr::Struct(lit) => Self::walk_decls(&lit.decls, symbols),
            Expr::List(list) => {
                for elem in &list.elems {
                    match elem {
                        ListElem::Expr(expr) | ListElem::Ellipsis { ty: Some(expr), .. } => {
                            Self::walk_expr(expr, symbols)
                        }
                        ListElem::Ellipsis { ty: None, .. } => {}
                    }
                }
            }
            Expr::Binary { lhs, rhs, .. } => {
                Self::walk_expr(lhs, symbols);
                Self::walk_expr(rhs, symbols);
            }
            Expr::Unary { operand, .. } => Self::walk_expr(operand, symbols),
            Expr::Paren { inner, .. } => Self::walk_expr(inner, symbols),
            Expr::Selector { base, .. } => Self::walk_expr(base, symbols),
            Expr::Index { base, index, .. } => {
                Self::walk_expr(base, symbols);
                Self::walk_expr(index, symbols);
            }
            Expr::Lit(_) | Expr::Ident(_) => {}
        }
    }
}

/// Parse text and list its symbols
pub fn get_symbols(input: &str) -> Result<Vec<Symbol>, SyntaxError> {
    let file = parser::parse(input)?;
    Ok(SymbolAnalyzer::extract_symbols(&file))
}

/// Parse text and list its symbols as a JSON array
pub fn symbols_json(input: &str) -> Result<String, SyntaxError> {
    let symbols = get_symbols(input)?;
    // A Vec of plain structs always serializes
    Ok(serde_json::to_string(&symbols).unwrap_or_else(|_| "[]".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document() {
        assert!(get_symbols("").unwrap().is_empty());
        assert_eq!(symbols_json("").unwrap(), "[]");
    }

    #[test]
    fn test_package_and_fields() {
        let symbols = get_symbols("package foo\n\na: 1\nb: {\n\tc: 2\n}\n").unwrap();
        let names: Vec<(&str, SymbolKind)> =
            symbols.iter().map(|s| (s.name.as_str(), s.kind)).collect();
        assert_eq!(
            names,
            vec![
                ("foo", SymbolKind::Package),
                ("a", SymbolKind::Field),
                ("b", SymbolKind::Field),
                ("c", SymbolKind::Field),
            ]
        );
        assert_eq!((symbols[0].line, symbols[0].column), (1, 9));
        assert_eq!((symbols[3].line, symbols[3].column), (5, 2));
    }

    #[test]
    fn test_quoted_label_unquoted() {
        let symbols = get_symbols("\"x-y\": 1").unwrap();
        assert_eq!(symbols[0].name, "x-y");
    }

    #[test]
    fn test_shorthand_chain_lists_every_label() {
        let symbols = get_symbols("a: b: 1").unwrap();
        let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_json_shape() {
        let json = symbols_json("a: 1").unwrap();
        assert_eq!(json, r#"[{"name":"a","type":"field","line":1,"column":1}]"#);
    }

    #[test]
    fn test_syntax_error_propagates() {
        assert!(get_symbols("a: ;").is_err());
    }
}
