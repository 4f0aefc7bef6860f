//! Canonical syntax output
//!
//! A concrete value is turned back into a syntax tree and rendered by the
//! shared formatter, so exported text reads exactly like `fmt` output.

use cuekit_ast::{
    Decl, DeclKind, Expr, Field, FieldMarker, Label, ListElem, ListLit, Lit, LitKind, Pos,
    StructLit,
};
use cuekit_core::literal;
use cuekit_eval::{Atom, Value, ValueKind};

/// Render a concrete value in canonical syntax
pub fn to_cue(value: &Value) -> String {
    cuekit_core::format_expr(&to_expr(value))
}

fn to_expr(value: &Value) -> Expr {
    let pos = Pos::default();
    match &value.kind {
        ValueKind::Atom(atom) => Expr::Lit(Lit::new(lit_kind(atom), atom.to_string(), pos)),
        ValueKind::Struct(st) => {
            let mut lit = StructLit::new(pos);
            lit.multiline = true;
            lit.decls = st
                .fields
                .iter()
                .filter(|(_, f)| f.is_regular_data())
                .map(|(name, field)| {
                    Decl::new(DeclKind::Field(Field {
                        label: label(name),
                        marker: FieldMarker::Regular,
                        value: to_expr(&field.value),
                        attributes: Vec::new(),
                    }))
                })
                .collect();
            Expr::Struct(lit)
        }
        ValueKind::List(list) => Expr::List(ListLit {
            elems: list.elems.iter().map(|e| ListElem::Expr(to_expr(e))).collect(),
            multiline: false,
            lbrack: pos,
        }),
        ValueKind::Disjunction(_) => match value.default_value() {
            Some(default) => to_expr(default),
            None => Expr::Lit(Lit::new(LitKind::Top, "_", pos)),
        },
        ValueKind::Bottom(_) => Expr::Lit(Lit::new(LitKind::Bottom, "_|_", pos)),
        ValueKind::Top | ValueKind::Basic(_) | ValueKind::Thunk(_) => {
            Expr::Lit(Lit::new(LitKind::Top, "_", pos))
        }
    }
}

fn lit_kind(atom: &Atom) -> LitKind {
    match atom {
        Atom::Null => LitKind::Null,
        Atom::Bool(_) => LitKind::Bool,
        Atom::Int(_) => LitKind::Int,
        Atom::Float(_) => LitKind::Float,
        Atom::String(_) => LitKind::String,
        Atom::Bytes(_) => LitKind::Bytes,
    }
}

/// Regular labels that would read as definitions or hidden fields are quoted
fn label(name: &str) -> Label {
    let pos = Pos::default();
    if literal::is_identifier(name) && !name.starts_with(['#', '_']) {
        Label::ident(name, pos)
    } else {
        Label::quoted(name, literal::quote(name), pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuekit_eval::{evaluate_source, TagSet};

    fn cue(src: &str) -> String {
        let value = evaluate_source("/c.cue", src, &TagSet::new()).unwrap();
        to_cue(&value)
    }

    #[test]
    fn test_flat_struct() {
        assert_eq!(cue("a: 1\nb: \"two\""), "{\n\ta: 1\n\tb: \"two\"\n}");
    }

    #[test]
    fn test_empty_root() {
        assert_eq!(cue(""), "{}");
    }

    #[test]
    fn test_nested_struct_and_list() {
        assert_eq!(
            cue("server: {port: 80}\nl: [1, 2]"),
            "{\n\tserver: {\n\t\tport: 80\n\t}\n\tl: [1, 2]\n}"
        );
    }

    #[test]
    fn test_labels_quoted_when_needed() {
        assert_eq!(cue("\"x-y\": 1"), "{\n\t\"x-y\": 1\n}");
        assert_eq!(cue("\"_x\": 1"), "{\n\t\"_x\": 1\n}");
    }

    #[test]
    fn test_aligned_values() {
        assert_eq!(cue("a: 1\nlong: 2"), "{\n\ta:    1\n\tlong: 2\n}");
    }

    #[test]
    fn test_default_and_float() {
        assert_eq!(cue("x: *1.5 | 2.0"), "{\n\tx: 1.5\n}");
    }
}
