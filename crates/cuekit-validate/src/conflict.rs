//! Conflict validator
//!
//! Reports every bottom value reachable through regular, definition and
//! hidden fields. Optional fields are constraints only and are not
//! checked.

use cuekit_ast::FieldMarker;
use cuekit_core::diagnostics::{Location, PositionedError};
use cuekit_eval::{Selector, Value, ValueKind};

use crate::{positions_for, segment, Validator};

/// Finds contradictions
///
/// # Example
///
/// ```
/// use cuekit_eval::{evaluate_source, TagSet};
/// use cuekit_validate::{ConflictValidator, Validator};
///
/// let value = evaluate_source("a.cue", "a: 1\na: 2", &TagSet::new()).unwrap();
/// let errors = ConflictValidator.validate(&value);
/// assert_eq!(errors[0].render(), "a: conflicting values 1 and 2");
/// ```
pub struct ConflictValidator;

impl Validator for ConflictValidator {
    fn name(&self) -> &'static str {
        "conflict"
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
        ValueKind::Bottom(conflict) => {
            let positions = if conflict.positions.is_empty() {
                positions_for(value, field_pos)
            } else {
                conflict.positions.clone()
            };
            errors.push(
                PositionedError::new(conflict.kind, conflict.message.clone())
                    .with_path(path.clone())
                    .with_positions(positions),
            );
        }
        ValueKind::Struct(st) => {
            for (label, field) in &st.fields {
                if field.marker == FieldMarker::Optional {
                    continue;
                }
                path.push(segment(&Selector::Field(label.clone())));
                walk(&field.value, path, field.pos.as_ref().or(field_pos), errors);
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
        ValueKind::Top
        | ValueKind::Atom(_)
        | ValueKind::Basic(_)
        | ValueKind::Disjunction(_)
        | ValueKind::Thunk(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuekit_core::diagnostics::ErrorKind;
    use cuekit_eval::{evaluate_source, TagSet};

    fn errors(src: &str) -> Vec<PositionedError> {
        let value = evaluate_source("/c.cue", src, &TagSet::new()).unwrap();
        ConflictValidator.validate(&value)
    }

    #[test]
    fn test_no_conflicts() {
        assert!(errors("a: int\nb: {c: 1}").is_empty());
    }

    #[test]
    fn test_nested_conflict_path() {
        let found = errors("a: {b: [1, {c: 1}]}\na: {b: [1, {c: 2}]}");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, vec!["a", "b", "1", "c"]);
        assert_eq!(found[0].kind, ErrorKind::Conflict);
    }

    #[test]
    fn test_optional_fields_skipped() {
        assert!(errors("a?: 1 & 2").is_empty());
    }

    #[test]
    fn test_definition_conflicts_reported() {
        let found = errors("#D: {a: 1 & 2}");
        assert_eq!(found[0].path, vec!["#D", "a"]);
    }

    #[test]
    fn test_quoted_labels_in_path() {
        let found = errors("\"x-y\": 1 & 2");
        assert_eq!(found[0].render(), "\"x-y\": conflicting values 1 and 2");
    }

    #[test]
    fn test_reference_error_kind() {
        let found = errors("a: missing");
        assert_eq!(found[0].kind, ErrorKind::Reference);
        assert_eq!(found[0].location().unwrap().pos.line, 1);
    }
}
