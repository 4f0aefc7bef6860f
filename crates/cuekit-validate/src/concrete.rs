//! Concreteness validator
//!
//! A value is concrete when it is a scalar, a struct of concrete regular
//! fields, a list of concrete elements, or a disjunction with exactly one
//! default that is itself concrete. Definitions, hidden fields and
//! optional fields are skipped; a required field still carrying its `!`
//! marker was never supplied.
//!
//! Bottom values are left to [`crate::ConflictValidator`].

use cuekit_ast::FieldMarker;
use cuekit_core::diagnostics::{ErrorKind, Location, Message, PositionedError};
use cuekit_eval::{Selector, Value, ValueKind};

use crate::{positions_for, segment, Validator};

/// Finds values that are not fully determined
pub struct ConcretenessValidator;

impl Validator for ConcretenessValidator {
    fn name(&self) -> &'static str {
        "concrete"
    }

    fn validate(&self, value: &Value) -> Vec<PositionedError> {
        let mut errors = Vec::new();
        let mut path = Vec::new();
        walk(value, &mut path, None, &mut errors);
        errors
    }
}

fn walk(
    value: &Value,
    path: &mut Vec<String>,
    field_pos: Option<&Location>,
    errors: &mut Vec<PositionedError>,
) {
    match &value.kind {
        ValueKind::Atom(_) | ValueKind::Bottom(_) => {}
        ValueKind::Struct(st) => {
            for (label, field) in &st.fields {
                if field.definition || field.hidden || field.marker == FieldMarker::Optional {
                    continue;
                }
                path.push(segment(&Selector::Field(label.clone())));
                if field.marker == FieldMarker::Required {
                    errors.push(
                        PositionedError::new(
                            ErrorKind::Incomplete,
                            Message::plain("field is required but not present"),
                        )
                        .with_path(path.clone())
                        .with_positions(field.pos.iter().cloned().collect()),
                    );
                } else {
                    walk(&field.value, path, field.pos.as_ref().or(field_pos), errors);
                }
                path.pop();
            }
        }
        ValueKind::List(list) => {
            for (i, elem) in list.elems.iter().enumerate() {
                path.push(segment(&Selector::Index(i)));
                walk(elem, path, field_pos, errors);
                path.pop();
            }
        }
        ValueKind::Disjunction(_) => match value.default_value() {
            Some(default) => walk(default, path, field_pos, errors),
            None => errors.push(incomplete(value, path, field_pos)),
        },
        ValueKind::Top | ValueKind::Basic(_) | ValueKind::Thunk(_) => {
            errors.push(incomplete(value, path, field_pos))
        }
    }
}

fn incomplete(value: &Value, path: &[String], field_pos: Option<&Location>) -> PositionedError {
    PositionedError::new(
        ErrorKind::Incomplete,
        Message::new("incomplete value {}", vec![value.to_string()]),
    )
    .with_path(path.to_vec())
    .with_positions(positions_for(value, field_pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuekit_eval::{evaluate_source, TagSet};

    fn errors(src: &str) -> Vec<String> {
        let value = evaluate_source("/c.cue", src, &TagSet::new()).unwrap();
        ConcretenessValidator
            .validate(&value)
            .iter()
            .map(PositionedError::render)
            .collect()
    }

    #[test]
    fn test_concrete_document() {
        assert!(errors("a: 1\nb: [\"x\"]\nc: {d: null}").is_empty());
    }

    #[test]
    fn test_type_is_incomplete() {
        assert_eq!(errors("a: {b: string}"), vec!["a.b: incomplete value string"]);
    }

    #[test]
    fn test_bounds_are_incomplete() {
        assert_eq!(errors("port: int & >0"), vec!["port: incomplete value int & >0"]);
    }

    #[test]
    fn test_disjunction_needs_single_default() {
        assert!(errors("a: *1 | 2").is_empty());
        assert_eq!(errors("a: 1 | 2"), vec!["a: incomplete value 1 | 2"]);
    }

    #[test]
    fn test_required_field() {
        assert_eq!(
            errors("a!: string"),
            vec!["a: field is required but not present"]
        );
        assert!(errors("a!: string\na: \"x\"").is_empty());
    }

    #[test]
    fn test_skipped_fields() {
        assert!(errors("#D: int\n_h: string\no?: int").is_empty());
    }

    #[test]
    fn test_unresolved_reference_is_incomplete() {
        assert_eq!(errors("a: b\nb: a").len(), 2);
    }

    #[test]
    fn test_open_list_tail_ignored() {
        assert!(errors("l: [1, ...int]").is_empty());
    }
}
