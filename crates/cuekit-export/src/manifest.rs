//! Serde view of a concrete value
//!
//! [`Manifest`] serializes a value the way it is exported: struct fields in
//! declaration order with definitions, hidden and optional fields left out,
//! disjunctions replaced by their default and bytes written as base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use cuekit_eval::{Atom, Value, ValueKind};

/// Borrowing serializer for a concrete [`Value`]
pub struct Manifest<'v>(pub &'v Value);

impl Serialize for Manifest<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.0;
        match &value.kind {
            ValueKind::Atom(atom) => serialize_atom(atom, serializer),
            ValueKind::Struct(st) => {
                let fields: Vec<_> = st
                    .fields
                    .iter()
                    .filter(|(_, f)| f.is_regular_data())
                    .collect();
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (label, field) in fields {
                    map.serialize_entry(label, &Manifest(&field.value))?;
                }
                map.end()
            }
            ValueKind::List(list) => {
                let mut seq = serializer.serialize_seq(Some(list.elems.len()))?;
                for elem in &list.elems {
                    seq.serialize_element(&Manifest(elem))?;
                }
                seq.end()
            }
            ValueKind::Disjunction(_) => match value.default_value() {
                Some(default) => Manifest(default).serialize(serializer),
                None => Err(S::Error::custom(format!("incomplete value {}", value))),
            },
            ValueKind::Bottom(conflict) => Err(S::Error::custom(conflict.message.render())),
            ValueKind::Top | ValueKind::Basic(_) | ValueKind::Thunk(_) => {
                Err(S::Error::custom(format!("incomplete value {}", value)))
            }
        }
    }
}

fn serialize_atom<S: Serializer>(atom: &Atom, serializer: S) -> Result<S::Ok, S::Error> {
    match atom {
        Atom::Null => serializer.serialize_unit(),
        Atom::Bool(b) => serializer.serialize_bool(*b),
        Atom::Int(n) => serializer.serialize_i64(*n),
        Atom::Float(x) => serializer.serialize_f64(*x),
        Atom::String(s) => serializer.serialize_str(s),
        Atom::Bytes(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuekit_eval::{evaluate_source, TagSet};

    fn json(src: &str) -> String {
        let value = evaluate_source("/m.cue", src, &TagSet::new()).unwrap();
        serde_json::to_string(&Manifest(&value)).unwrap()
    }

    #[test]
    fn test_declaration_order() {
        assert_eq!(json("z: 1\na: 2\nm: 3"), r#"{"z":1,"a":2,"m":3}"#);
    }

    #[test]
    fn test_skipped_fields() {
        assert_eq!(json("#D: {x: int}\n_h: 1\no?: int\nv: 1"), r#"{"v":1}"#);
    }

    #[test]
    fn test_scalars() {
        assert_eq!(
            json("n: null\nb: true\nf: 1.5\ns: \"x\\ny\"\nl: [1, \"a\"]"),
            r#"{"n":null,"b":true,"f":1.5,"s":"x\ny","l":[1,"a"]}"#
        );
    }

    #[test]
    fn test_bytes_as_base64() {
        assert_eq!(json("b: 'hi'"), r#"{"b":"aGk="}"#);
    }

    #[test]
    fn test_default_is_serialized() {
        assert_eq!(json("env: *\"dev\" | \"prod\""), r#"{"env":"dev"}"#);
    }

    #[test]
    fn test_incomplete_value_fails() {
        let value = evaluate_source("/m.cue", "a: int", &TagSet::new()).unwrap();
        let err = serde_json::to_string(&Manifest(&value)).unwrap_err();
        assert!(err.to_string().contains("incomplete value int"));
    }
}
