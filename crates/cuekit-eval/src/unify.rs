//! Pairwise meet
//!
//! [`meet`] computes the greatest lower bound of two values. It is
//! commutative and associative up to field order and positions, with `Top`
//! as identity and `Bottom` absorbing. References are never resolved here:
//! a [`Thunk`] operand defers them by concatenation.
//!
//! [`meet_embed`] is the variant used for embedded declarations, where the
//! allowed labels of the two structs are united instead of intersected.

use cuekit_core::diagnostics::{Location, Message};
use indexmap::IndexSet;

use crate::value::{
    combine_markers, Atom, BasicType, Disjunct, ListValue, Reference, StructValue, Thunk, Value,
    ValueKind,
};

/// How the right operand joins the left one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Conjunct,
    Embed,
}

/// Meet two values
pub fn meet(a: Value, b: Value) -> Value {
    meet_with(a, b, Mode::Conjunct)
}

/// Meet `embedded` into `host` as an embedding
pub fn meet_embed(host: Value, embedded: Value) -> Value {
    meet_with(host, embedded, Mode::Embed)
}

/// Meet a sequence of values, left to right, starting from `Top`
pub fn unify_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::top(), meet)
}

/// Wrap `base` so that `refs` are met into it once resolved
pub fn defer(refs: Vec<Reference>, base: Value) -> Value {
    if refs.is_empty() || base.is_bottom() {
        return base;
    }
    let pos = base.pos.clone();
    Value::new(ValueKind::Thunk(Thunk {
        refs,
        base: Box::new(base),
    }))
    .with_pos(pos)
}

fn positions(a: &Value, b: &Value) -> Vec<Location> {
    a.pos.iter().chain(b.pos.iter()).cloned().collect()
}

fn mismatch(a: &Value, b: &Value) -> Value {
    Value::conflict(
        Message::new(
            "conflicting values {} and {} (mismatched types {} and {})",
            vec![a.to_string(), b.to_string(), a.kind_name(), b.kind_name()],
        ),
        positions(a, b),
    )
}

fn meet_with(a: Value, b: Value, mode: Mode) -> Value {
    if a.is_bottom() {
        return a;
    }
    if b.is_bottom() {
        return b;
    }
    if a.is_top() {
        let pos = b.pos.clone().or(a.pos);
        return b.with_pos(pos);
    }
    if b.is_top() {
        let pos = a.pos.clone().or(b.pos);
        return a.with_pos(pos);
    }

    match (a.kind, b.kind) {
        (ValueKind::Thunk(ta), ValueKind::Thunk(tb)) => {
            let mut refs = ta.refs;
            refs.extend(embed_refs(tb.refs, mode));
            let base = meet_with(*ta.base, *tb.base, mode);
            defer(refs, base).with_pos(a.pos.or(b.pos))
        }
        (ValueKind::Thunk(t), kind) => {
            let other = Value { kind, pos: b.pos };
            let base = meet_with(*t.base, other, mode);
            defer(t.refs, base)
        }
        (kind, ValueKind::Thunk(t)) => {
            let host = Value { kind, pos: a.pos };
            let base = meet_with(host, *t.base, mode);
            defer(embed_refs(t.refs, mode), base)
        }
        (ValueKind::Disjunction(da), ValueKind::Disjunction(db)) => {
            meet_disjunctions(da, db, mode)
        }
        (ValueKind::Disjunction(da), kind) => {
            let single = vec![Disjunct {
                value: Value { kind, pos: b.pos },
                default: false,
            }];
            meet_disjunctions(da, single, mode)
        }
        (kind, ValueKind::Disjunction(db)) => {
            let single = vec![Disjunct {
                value: Value { kind, pos: a.pos },
                default: false,
            }];
            meet_disjunctions(single, db, mode)
        }
        (ka, kb) => {
            let a = Value { kind: ka, pos: a.pos };
            let b = Value { kind: kb, pos: b.pos };
            meet_resolved(a, b, mode)
        }
    }
}

fn embed_refs(refs: Vec<Reference>, mode: Mode) -> Vec<Reference> {
    match mode {
        Mode::Conjunct => refs,
        Mode::Embed => refs.into_iter().map(Reference::into_embedded).collect(),
    }
}

/// Meet operands that are neither top, bottom, thunks nor disjunctions
fn meet_resolved(a: Value, b: Value, mode: Mode) -> Value {
    // `{ 1 }`: a struct without declarations of its own becomes the embedded scalar
    if mode == Mode::Embed
        && !matches!(b.kind, ValueKind::Struct(_))
        && a.as_struct().is_some_and(|s| s.fields.is_empty())
    {
        return b;
    }
    let (ka, kb) = match (a.kind, b.kind) {
        (ValueKind::Struct(x), ValueKind::Struct(y)) => {
            let pos = a.pos.or(b.pos);
            return meet_structs(x, y, mode).with_pos(pos);
        }
        (ValueKind::List(x), ValueKind::List(y)) => return meet_lists(x, y, a.pos, b.pos),
        pair => pair,
    };
    let a = Value { kind: ka, pos: a.pos };
    let b = Value { kind: kb, pos: b.pos };

    match (&a.kind, &b.kind) {
        (ValueKind::Atom(x), ValueKind::Atom(y)) => {
            if x == y {
                let pos = a.pos.clone().or(b.pos);
                a.with_pos(pos)
            } else if x.kind() != y.kind() {
                mismatch(&a, &b)
            } else {
                Value::conflict(
                    Message::new(
                        "conflicting values {} and {}",
                        vec![a.to_string(), b.to_string()],
                    ),
                    positions(&a, &b),
                )
            }
        }
        (ValueKind::Atom(atom), ValueKind::Basic(basic)) => match check_atom(atom, basic, &a, &b) {
            Some(conflict) => conflict,
            None => a,
        },
        (ValueKind::Basic(basic), ValueKind::Atom(atom)) => match check_atom(atom, basic, &b, &a) {
            Some(conflict) => conflict,
            None => b,
        },
        (ValueKind::Basic(x), ValueKind::Basic(y)) => meet_basic(x, y, &a, &b),
        (ValueKind::Basic(basic), ValueKind::Struct(_) | ValueKind::List(_))
            if basic.kinds.contains(b.kinds()) =>
        {
            b
        }
        (ValueKind::Struct(_) | ValueKind::List(_), ValueKind::Basic(basic))
            if basic.kinds.contains(a.kinds()) =>
        {
            a
        }
        _ => mismatch(&a, &b),
    }
}

/// Check a concrete atom against a type constraint
///
/// Returns `None` when the atom satisfies it.
fn check_atom(atom: &Atom, basic: &BasicType, atom_val: &Value, basic_val: &Value) -> Option<Value> {
    if !basic.kinds.contains(atom.kind()) {
        return Some(mismatch(atom_val, basic_val));
    }
    for bound in &basic.bounds {
        match bound.check(atom) {
            Ok(true) => {}
            Ok(false) => {
                return Some(Value::conflict(
                    Message::new(
                        "invalid value {} (out of bound {})",
                        vec![atom.to_string(), bound.to_string()],
                    ),
                    positions(atom_val, basic_val),
                ))
            }
            Err(err) => {
                return Some(Value::conflict(
                    Message::new(
                        "invalid regular expression {}: {}",
                        vec![bound.value.to_string(), err.to_string()],
                    ),
                    basic_val.pos.iter().cloned().collect(),
                ))
            }
        }
    }
    None
}

fn meet_basic(x: &BasicType, y: &BasicType, a: &Value, b: &Value) -> Value {
    let kinds = x.kinds & y.kinds;
    if kinds.is_empty() {
        return mismatch(a, b);
    }
    let mut bounds = x.bounds.clone();
    for bound in &y.bounds {
        if !bounds.contains(bound) {
            bounds.push(bound.clone());
        }
    }
    let merged = BasicType { kinds, bounds };
    if let Some((lower, upper)) = merged.empty_range() {
        return Value::conflict(
            Message::new(
                "incompatible bounds {} and {}",
                vec![lower.to_string(), upper.to_string()],
            ),
            positions(a, b),
        );
    }
    Value::new(ValueKind::Basic(merged)).with_pos(a.pos.clone().or(b.pos.clone()))
}

fn meet_structs(mut x: StructValue, y: StructValue, mode: Mode) -> Value {
    if mode == Mode::Embed && x.fields.is_empty() && x.allowed.is_none() {
        return Value::structure(y);
    }

    let allowed = match mode {
        Mode::Conjunct => match (x.allowed.take(), y.allowed.clone()) {
            (None, None) => None,
            (Some(set), None) | (None, Some(set)) => Some(set),
            (Some(xs), Some(ys)) => Some(xs.intersection(&ys).cloned().collect()),
        },
        Mode::Embed if x.ellipsis => None,
        Mode::Embed => {
            let host_labels: IndexSet<String> = x.fields.keys().cloned().collect();
            let embedded_labels: IndexSet<String> = y.fields.keys().cloned().collect();
            match (x.allowed.take(), y.allowed.clone()) {
                (None, None) => None,
                (Some(own), None) => Some(own.union(&embedded_labels).cloned().collect()),
                (None, Some(theirs)) => Some(theirs.union(&host_labels).cloned().collect()),
                (Some(own), Some(theirs)) => Some(own.union(&theirs).cloned().collect()),
            }
        }
    };
    let ellipsis = match mode {
        Mode::Conjunct => x.ellipsis && y.ellipsis,
        Mode::Embed => x.ellipsis,
    };

    let mut fields = x.fields;
    for (label, incoming) in y.fields {
        match fields.get_mut(&label) {
            Some(existing) => {
                let value = std::mem::replace(&mut existing.value, Value::top());
                existing.value = meet(value, incoming.value);
                existing.marker = combine_markers(existing.marker, incoming.marker);
                if existing.pos.is_none() {
                    existing.pos = incoming.pos;
                }
            }
            None => {
                fields.insert(label, incoming);
            }
        }
    }

    if let Some(allowed) = &allowed {
        fields.retain(|label, field| {
            allowed.contains(label)
                || field.definition
                || field.hidden
                || field.marker != cuekit_ast::FieldMarker::Optional
        });
        for (label, field) in fields.iter_mut() {
            if allowed.contains(label) || field.definition || field.hidden {
                continue;
            }
            field.value = Value::conflict(
                Message::plain("field not allowed"),
                field.pos.iter().cloned().collect(),
            );
        }
    }

    Value::structure(StructValue {
        fields,
        allowed,
        ellipsis,
    })
}

fn meet_lists(
    x: ListValue,
    y: ListValue,
    xpos: Option<Location>,
    ypos: Option<Location>,
) -> Value {
    if x.tail.is_none() && y.elems.len() > x.elems.len()
        || y.tail.is_none() && x.elems.len() > y.elems.len()
    {
        return Value::conflict(
            Message::new(
                "incompatible list lengths ({} and {})",
                vec![x.elems.len().to_string(), y.elems.len().to_string()],
            ),
            xpos.into_iter().chain(ypos).collect(),
        );
    }

    let len = x.elems.len().max(y.elems.len());
    let mut xs = x.elems.into_iter();
    let mut ys = y.elems.into_iter();
    let mut elems = Vec::with_capacity(len);
    for _ in 0..len {
        let elem = match (xs.next(), ys.next()) {
            (Some(l), Some(r)) => meet(l, r),
            (Some(l), None) => match &y.tail {
                Some(tail) => meet(l, (**tail).clone()),
                None => l,
            },
            (None, Some(r)) => match &x.tail {
                Some(tail) => meet((**tail).clone(), r),
                None => r,
            },
            (None, None) => break,
        };
        elems.push(elem);
    }
    let tail = match (x.tail, y.tail) {
        (Some(l), Some(r)) => Some(meet(*l, *r)),
        _ => None,
    };
    Value::list(elems, tail).with_pos(xpos.or(ypos))
}

fn meet_disjunctions(da: Vec<Disjunct>, db: Vec<Disjunct>, mode: Mode) -> Value {
    let marks_a = da.iter().any(|d| d.default);
    let marks_b = db.iter().any(|d| d.default);

    let mut product = Vec::with_capacity(da.len() * db.len());
    for left in &da {
        for right in &db {
            let default = (marks_a || marks_b)
                && (!marks_a || left.default)
                && (!marks_b || right.default);
            let value = meet_with(left.value.clone(), right.value.clone(), mode);
            product.push(Disjunct { value, default });
        }
    }
    normalize(product)
}

/// Build a disjunction: flatten, drop bottoms, dedupe, collapse
pub fn normalize(alternatives: Vec<Disjunct>) -> Value {
    let mut survivors: Vec<Disjunct> = Vec::new();
    let mut first_conflict: Option<Value> = None;

    let mut flat = Vec::with_capacity(alternatives.len());
    for alt in alternatives {
        match alt.value.kind {
            ValueKind::Disjunction(inner) => {
                let marks = inner.iter().any(|d| d.default);
                flat.extend(inner.into_iter().map(|d| Disjunct {
                    default: alt.default && (!marks || d.default),
                    value: d.value,
                }));
            }
            kind => flat.push(Disjunct {
                value: Value {
                    kind,
                    pos: alt.value.pos,
                },
                default: alt.default,
            }),
        }
    }

    for alt in flat {
        if alt.value.is_bottom() {
            first_conflict.get_or_insert(alt.value);
            continue;
        }
        match survivors.iter_mut().find(|s| s.value == alt.value) {
            Some(existing) => existing.default |= alt.default,
            None => survivors.push(alt),
        }
    }

    match survivors.len() {
        0 => match first_conflict.as_ref().and_then(Value::conflict_record) {
            Some(conflict) => Value::conflict(
                Message::new("empty disjunction: {}", vec![conflict.message.render()]),
                conflict.positions.clone(),
            ),
            None => Value::conflict(Message::plain("empty disjunction"), Vec::new()),
        },
        1 => survivors.remove(0).value,
        _ => Value::new(ValueKind::Disjunction(survivors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::KindSet;
    use crate::value::{Bound, BoundOp, Field};

    fn bounded(op: BoundOp, n: i64) -> Value {
        Value::new(ValueKind::Basic(BasicType::bound(Bound::new(op, Atom::Int(n)))))
    }

    fn message(v: &Value) -> String {
        v.conflict_record().unwrap().message.render()
    }

    fn st(fields: &[(&str, Value)]) -> StructValue {
        let mut s = StructValue::new();
        for (label, value) in fields {
            s.fields.insert(label.to_string(), Field::new(value.clone()));
        }
        s
    }

    #[test]
    fn test_top_is_identity() {
        assert_eq!(meet(Value::top(), Value::int(1)), Value::int(1));
        assert_eq!(meet(Value::int(1), Value::top()), Value::int(1));
    }

    #[test]
    fn test_bottom_absorbs() {
        let bottom = Value::conflict(Message::plain("x"), Vec::new());
        assert!(meet(bottom.clone(), Value::int(1)).is_bottom());
        assert!(meet(Value::int(1), bottom).is_bottom());
    }

    #[test]
    fn test_atom_conflicts() {
        let v = meet(Value::int(1), Value::int(2));
        assert_eq!(message(&v), "conflicting values 1 and 2");

        let v = meet(Value::int(1), Value::string("a"));
        assert_eq!(
            message(&v),
            "conflicting values 1 and \"a\" (mismatched types int and string)"
        );
    }

    #[test]
    fn test_kind_intersection() {
        let v = meet(Value::basic(KindSet::NUMBER), Value::basic(KindSet::INT));
        assert_eq!(v, Value::basic(KindSet::INT));
        assert_eq!(meet(Value::basic(KindSet::NUMBER), Value::float(1.5)), Value::float(1.5));
        assert!(meet(Value::basic(KindSet::INT), Value::basic(KindSet::STRING)).is_bottom());
    }

    #[test]
    fn test_bounds() {
        let v = meet(bounded(BoundOp::Ge, 0), Value::int(-1));
        assert_eq!(message(&v), "invalid value -1 (out of bound >=0)");
        assert_eq!(meet(bounded(BoundOp::Lt, 10), Value::int(5)), Value::int(5));

        let v = meet(bounded(BoundOp::Ge, 5), bounded(BoundOp::Lt, 3));
        assert_eq!(message(&v), "incompatible bounds >=5 and <3");
    }

    #[test]
    fn test_struct_meet_merges_fields() {
        let a = Value::structure(st(&[("a", Value::int(1))]));
        let b = Value::structure(st(&[("b", Value::int(2)), ("a", Value::basic(KindSet::INT))]));
        let merged = meet(a, b);
        let s = merged.as_struct().unwrap();
        assert_eq!(s.fields.len(), 2);
        assert_eq!(s.get("a"), Some(&Value::int(1)));
    }

    #[test]
    fn test_closed_struct_rejects_extra_field() {
        let mut closed = st(&[("a", Value::basic(KindSet::INT))]);
        closed.close();
        let merged = meet(
            Value::structure(closed),
            Value::structure(st(&[("a", Value::int(1)), ("b", Value::int(2))])),
        );
        let s = merged.as_struct().unwrap();
        assert_eq!(message(s.get("b").unwrap()), "field not allowed");
        assert_eq!(s.get("a"), Some(&Value::int(1)));
    }

    #[test]
    fn test_embed_unions_allowed_labels() {
        let mut base = st(&[("a", Value::basic(KindSet::INT))]);
        base.close();
        let mut host = st(&[("b", Value::int(2))]);
        host.close();
        let merged = meet_embed(Value::structure(host), Value::structure(base));
        let allowed = merged.as_struct().unwrap().allowed.clone().unwrap();
        assert!(allowed.contains("a") && allowed.contains("b"));
    }

    #[test]
    fn test_list_lengths() {
        let a = Value::list(vec![Value::int(1)], None);
        let b = Value::list(vec![Value::int(1), Value::int(2)], None);
        assert_eq!(message(&meet(a, b)), "incompatible list lengths (1 and 2)");

        let open = Value::list(vec![], Some(Value::basic(KindSet::INT)));
        let fixed = Value::list(vec![Value::int(1), Value::int(2)], None);
        assert_eq!(meet(open, fixed.clone()), fixed);
    }

    #[test]
    fn test_disjunction_narrowing_and_defaults() {
        let disj = normalize(vec![
            Disjunct {
                value: Value::string("dev"),
                default: true,
            },
            Disjunct {
                value: Value::string("prod"),
                default: false,
            },
        ]);
        assert_eq!(disj.default_value(), Some(&Value::string("dev")));
        assert_eq!(meet(disj.clone(), Value::string("prod")), Value::string("prod"));

        let empty = meet(disj, Value::string("qa"));
        assert!(message(&empty).starts_with("empty disjunction: "));
    }

    #[test]
    fn test_meet_is_commutative_on_samples() {
        let samples = vec![
            Value::int(1),
            Value::basic(KindSet::NUMBER),
            bounded(BoundOp::Ge, 0),
            Value::string("x"),
            Value::structure(st(&[("a", Value::int(1))])),
            Value::list(vec![Value::int(1)], Some(Value::basic(KindSet::INT))),
        ];
        for a in &samples {
            for b in &samples {
                let ab = meet(a.clone(), b.clone());
                let ba = meet(b.clone(), a.clone());
                assert_eq!(ab.is_bottom(), ba.is_bottom(), "{} & {}", a, b);
                if !ab.is_bottom() {
                    assert_eq!(ab, ba, "{} & {}", a, b);
                }
            }
        }
    }
}
