//! Lattice values
//!
//! A [`Value`] is a node in the meet-semilattice the engine works on: from
//! `Top` (anything) through type constraints and concrete scalars down to
//! `Bottom` (contradiction). Positions are provenance only and never take
//! part in equality.

use std::cmp::Ordering;
use std::fmt;

use cuekit_ast::FieldMarker;
use cuekit_core::diagnostics::{ErrorKind, Location, Message};
use cuekit_core::literal;
use indexmap::{IndexMap, IndexSet};
use regex::Regex;

use crate::kind::KindSet;

/// A concrete scalar
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl Atom {
    pub fn kind(&self) -> KindSet {
        match self {
            Atom::Null => KindSet::NULL,
            Atom::Bool(_) => KindSet::BOOL,
            Atom::Int(_) => KindSet::INT,
            Atom::Float(_) => KindSet::FLOAT,
            Atom::String(_) => KindSet::STRING,
            Atom::Bytes(_) => KindSet::BYTES,
        }
    }

    /// Order two atoms of comparable kinds
    pub fn compare(&self, other: &Atom) -> Option<Ordering> {
        match (self, other) {
            (Atom::Int(a), Atom::Int(b)) => Some(a.cmp(b)),
            (Atom::Int(a), Atom::Float(b)) => (*a as f64).partial_cmp(b),
            (Atom::Float(a), Atom::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Atom::Float(a), Atom::Float(b)) => a.partial_cmp(b),
            (Atom::String(a), Atom::String(b)) => Some(a.cmp(b)),
            (Atom::Bytes(a), Atom::Bytes(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Null => f.write_str("null"),
            Atom::Bool(b) => write!(f, "{}", b),
            Atom::Int(n) => write!(f, "{}", n),
            Atom::Float(x) => write!(f, "{:?}", x),
            Atom::String(s) => f.write_str(&literal::quote(s)),
            Atom::Bytes(b) => f.write_str(&literal::quote_bytes(b)),
        }
    }
}

/// Bound operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundOp {
    Ge,
    Gt,
    Le,
    Lt,
    Ne,
    Match,
    NotMatch,
}

impl BoundOp {
    pub fn token(self) -> &'static str {
        match self {
            BoundOp::Ge => ">=",
            BoundOp::Gt => ">",
            BoundOp::Le => "<=",
            BoundOp::Lt => "<",
            BoundOp::Ne => "!=",
            BoundOp::Match => "=~",
            BoundOp::NotMatch => "!~",
        }
    }
}

/// A bound such as `>=0` or `=~"^a"`
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub op: BoundOp,
    pub value: Atom,
}

impl Bound {
    pub fn new(op: BoundOp, value: Atom) -> Self {
        Self { op, value }
    }

    /// Kinds a value must have for the bound to apply
    pub fn kinds(&self) -> KindSet {
        match self.op {
            BoundOp::Ne => KindSet::ALL,
            BoundOp::Match | BoundOp::NotMatch => KindSet::STRING,
            _ => match self.value {
                Atom::String(_) => KindSet::STRING,
                Atom::Bytes(_) => KindSet::BYTES,
                _ => KindSet::NUMBER,
            },
        }
    }

    /// Check a concrete value against the bound
    ///
    /// Fails only when a regular expression does not compile.
    pub fn check(&self, atom: &Atom) -> Result<bool, regex::Error> {
        let ordering = atom.compare(&self.value);
        Ok(match self.op {
            BoundOp::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            BoundOp::Gt => matches!(ordering, Some(Ordering::Greater)),
            BoundOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
            BoundOp::Lt => matches!(ordering, Some(Ordering::Less)),
            BoundOp::Ne => atom != &self.value,
            BoundOp::Match | BoundOp::NotMatch => {
                let (Atom::String(text), Atom::String(pattern)) = (atom, &self.value) else {
                    return Ok(false);
                };
                let found = Regex::new(pattern)?.is_match(text);
                found == (self.op == BoundOp::Match)
            }
        })
    }

    fn is_lower(&self) -> bool {
        matches!(self.op, BoundOp::Ge | BoundOp::Gt)
    }

    fn is_upper(&self) -> bool {
        matches!(self.op, BoundOp::Le | BoundOp::Lt)
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.token(), self.value)
    }
}

/// A type constraint: a set of kinds narrowed by bounds
#[derive(Debug, Clone, PartialEq)]
pub struct BasicType {
    pub kinds: KindSet,
    pub bounds: Vec<Bound>,
}

impl BasicType {
    pub fn new(kinds: KindSet) -> Self {
        Self {
            kinds,
            bounds: Vec::new(),
        }
    }

    /// A lone bound, constraining to the kinds the bound applies to
    pub fn bound(bound: Bound) -> Self {
        Self {
            kinds: bound.kinds(),
            bounds: vec![bound],
        }
    }

    /// The tightest lower and upper bound pair that admits nothing
    pub fn empty_range(&self) -> Option<(&Bound, &Bound)> {
        let tightest = |pick_lower: bool| {
            self.bounds
                .iter()
                .filter(|b| if pick_lower { b.is_lower() } else { b.is_upper() })
                .reduce(|best, b| {
                    let ord = b.value.compare(&best.value);
                    let tighter = match ord {
                        Some(Ordering::Greater) => pick_lower,
                        Some(Ordering::Less) => !pick_lower,
                        Some(Ordering::Equal) => matches!(b.op, BoundOp::Gt | BoundOp::Lt),
                        None => false,
                    };
                    if tighter {
                        b
                    } else {
                        best
                    }
                })
        };
        let (lower, upper) = (tightest(true)?, tightest(false)?);
        let empty = match lower.value.compare(&upper.value)? {
            Ordering::Greater => true,
            Ordering::Equal => lower.op == BoundOp::Gt || upper.op == BoundOp::Lt,
            Ordering::Less => false,
        };
        empty.then_some((lower, upper))
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let implied = self
            .bounds
            .iter()
            .fold(KindSet::ALL, |acc, b| acc & b.kinds());
        let mut parts: Vec<String> = Vec::new();
        if self.bounds.is_empty() || self.kinds != implied {
            parts.push(self.kinds.to_string());
        }
        parts.extend(self.bounds.iter().map(Bound::to_string));
        f.write_str(&parts.join(" & "))
    }
}

/// A struct field
#[derive(Debug, Clone)]
pub struct Field {
    pub value: Value,
    pub marker: FieldMarker,
    /// `#name`: schema only
    pub definition: bool,
    /// `_name`: excluded from output
    pub hidden: bool,
    /// Position of the (first) declaring label
    pub pos: Option<Location>,
}

impl Field {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            marker: FieldMarker::Regular,
            definition: false,
            hidden: false,
            pos: None,
        }
    }

    /// Whether the field is part of the configuration's data
    pub fn is_regular_data(&self) -> bool {
        !self.definition && !self.hidden && self.marker != FieldMarker::Optional
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
            && self.marker == other.marker
            && self.definition == other.definition
            && self.hidden == other.hidden
    }
}

/// Combine the markers of a field declared in two operands
pub fn combine_markers(a: FieldMarker, b: FieldMarker) -> FieldMarker {
    match (a, b) {
        (FieldMarker::Regular, _) | (_, FieldMarker::Regular) => FieldMarker::Regular,
        (FieldMarker::Required, _) | (_, FieldMarker::Required) => FieldMarker::Required,
        _ => FieldMarker::Optional,
    }
}

/// An ordered struct
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructValue {
    pub fields: IndexMap<String, Field>,
    /// Labels a closed struct admits; `None` when open
    pub allowed: Option<IndexSet<String>>,
    /// Declared with `...`, keeping embeddings from closing it
    pub ellipsis: bool,
}

impl StructValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_closed(&self) -> bool {
        self.allowed.is_some()
    }

    /// Close the struct to its current labels
    pub fn close(&mut self) {
        self.allowed = Some(self.fields.keys().cloned().collect());
    }

    pub fn get(&self, label: &str) -> Option<&Value> {
        self.fields.get(label).map(|f| &f.value)
    }
}

/// A list with an optional open tail
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListValue {
    pub elems: Vec<Value>,
    /// Constraint on elements beyond `elems`; `None` fixes the length
    pub tail: Option<Box<Value>>,
}

/// One alternative of a disjunction
#[derive(Debug, Clone, PartialEq)]
pub struct Disjunct {
    pub value: Value,
    pub default: bool,
}

/// One step of a path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    Field(String),
    Index(usize),
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Field(name) if literal::is_identifier(name) => f.write_str(name),
            Selector::Field(name) => f.write_str(&literal::quote(name)),
            Selector::Index(i) => write!(f, "{}", i),
        }
    }
}

/// A reference to a field, resolved relative to an absolute scope path
#[derive(Debug, Clone)]
pub struct PathRef {
    /// Path of the struct whose declarations are searched for `name`
    pub scope: Vec<Selector>,
    pub name: String,
    /// Selections applied after `name` (`a.b[0]`)
    pub selectors: Vec<Selector>,
    /// Met into the enclosing struct as an embedding
    pub embedded: bool,
    /// Found in an enclosing declaration block when the document was built
    pub lexical: bool,
    pub pos: Option<Location>,
}

impl PartialEq for PathRef {
    fn eq(&self, other: &Self) -> bool {
        self.scope == other.scope
            && self.name == other.name
            && self.selectors == other.selectors
            && self.embedded == other.embedded
    }
}

impl fmt::Display for PathRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for sel in &self.selectors {
            match sel {
                Selector::Field(_) => write!(f, ".{}", sel)?,
                Selector::Index(i) => write!(f, "[{}]", i)?,
            }
        }
        Ok(())
    }
}

/// A `@tag(name)` placeholder no supplied tag matched
#[derive(Debug, Clone)]
pub struct TagRef {
    pub name: String,
    pub pos: Option<Location>,
}

impl PartialEq for TagRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// A deferred operand
#[derive(Debug, Clone, PartialEq)]
pub enum Reference {
    Path(PathRef),
    Tag(TagRef),
    /// An embedded conjunction, resolved as a whole before it is embedded
    Embed(Box<Value>),
}

impl Reference {
    pub fn is_embedded(&self) -> bool {
        match self {
            Reference::Path(p) => p.embedded,
            Reference::Tag(_) => false,
            Reference::Embed(_) => true,
        }
    }

    /// The same reference, met as an embedding
    pub fn into_embedded(self) -> Self {
        match self {
            Reference::Path(mut p) => {
                p.embedded = true;
                Reference::Path(p)
            }
            tag => tag,
        }
    }
}

/// References waiting to be resolved, and the value they will be met with
#[derive(Debug, Clone, PartialEq)]
pub struct Thunk {
    pub refs: Vec<Reference>,
    pub base: Box<Value>,
}

/// The record kept by a bottom value
#[derive(Debug, Clone)]
pub struct Conflict {
    pub kind: ErrorKind,
    pub message: Message,
    /// Positions of the conflicting operands, left first
    pub positions: Vec<Location>,
}

impl PartialEq for Conflict {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message == other.message
    }
}

/// Value kinds
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Top,
    Bottom(Box<Conflict>),
    Atom(Atom),
    Basic(BasicType),
    Struct(StructValue),
    List(ListValue),
    Disjunction(Vec<Disjunct>),
    Thunk(Thunk),
}

/// A lattice value with its source position
#[derive(Debug, Clone)]
pub struct Value {
    pub kind: ValueKind,
    pub pos: Option<Location>,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Value {
    pub fn new(kind: ValueKind) -> Self {
        Self { kind, pos: None }
    }

    pub fn top() -> Self {
        Self::new(ValueKind::Top)
    }

    /// A conflict record with the given positions
    pub fn bottom(kind: ErrorKind, message: Message, positions: Vec<Location>) -> Self {
        Self::new(ValueKind::Bottom(Box::new(Conflict {
            kind,
            message,
            positions,
        })))
    }

    /// A unification conflict
    pub fn conflict(message: Message, positions: Vec<Location>) -> Self {
        Self::bottom(ErrorKind::Conflict, message, positions)
    }

    pub fn atom(atom: Atom) -> Self {
        Self::new(ValueKind::Atom(atom))
    }

    pub fn int(n: i64) -> Self {
        Self::atom(Atom::Int(n))
    }

    pub fn float(x: f64) -> Self {
        Self::atom(Atom::Float(x))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::atom(Atom::String(s.into()))
    }

    pub fn bool(b: bool) -> Self {
        Self::atom(Atom::Bool(b))
    }

    pub fn null() -> Self {
        Self::atom(Atom::Null)
    }

    pub fn basic(kinds: KindSet) -> Self {
        Self::new(ValueKind::Basic(BasicType::new(kinds)))
    }

    pub fn structure(st: StructValue) -> Self {
        Self::new(ValueKind::Struct(st))
    }

    pub fn list(elems: Vec<Value>, tail: Option<Value>) -> Self {
        Self::new(ValueKind::List(ListValue {
            elems,
            tail: tail.map(Box::new),
        }))
    }

    pub fn with_pos(mut self, pos: Option<Location>) -> Self {
        self.pos = pos;
        self
    }

    pub fn is_top(&self) -> bool {
        matches!(self.kind, ValueKind::Top)
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self.kind, ValueKind::Bottom(_))
    }

    pub fn conflict_record(&self) -> Option<&Conflict> {
        match &self.kind {
            ValueKind::Bottom(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match &self.kind {
            ValueKind::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// The unique default alternative of a disjunction
    pub fn default_value(&self) -> Option<&Value> {
        let ValueKind::Disjunction(alts) = &self.kind else {
            return None;
        };
        let mut defaults = alts.iter().filter(|d| d.default);
        match (defaults.next(), defaults.next()) {
            (Some(only), None) => Some(&only.value),
            _ => None,
        }
    }

    /// This value with a disjunction replaced by its unique default
    pub fn resolve_default(self) -> Value {
        match self.default_value() {
            Some(default) => default.clone(),
            None => self,
        }
    }

    /// Whether the value is fully determined, recursively
    ///
    /// Definitions, hidden and optional fields do not count; open list
    /// tails do not either.
    pub fn is_concrete(&self) -> bool {
        match &self.kind {
            ValueKind::Atom(_) => true,
            ValueKind::Struct(s) => s
                .fields
                .values()
                .filter(|f| !f.definition && !f.hidden)
                .all(|f| match f.marker {
                    FieldMarker::Optional => true,
                    FieldMarker::Required => false,
                    FieldMarker::Regular => f.value.is_concrete(),
                }),
            ValueKind::List(l) => l.elems.iter().all(Value::is_concrete),
            ValueKind::Disjunction(_) => self.default_value().is_some_and(Value::is_concrete),
            ValueKind::Top
            | ValueKind::Bottom(_)
            | ValueKind::Basic(_)
            | ValueKind::Thunk(_) => false,
        }
    }

    /// Name of the value's kind for mismatch messages
    pub fn kind_name(&self) -> String {
        match &self.kind {
            ValueKind::Top => "_".to_string(),
            ValueKind::Bottom(_) => "_|_".to_string(),
            ValueKind::Atom(a) => a.kind().to_string(),
            ValueKind::Basic(b) => b.kinds.to_string(),
            ValueKind::Struct(_) => "struct".to_string(),
            ValueKind::List(_) => "list".to_string(),
            ValueKind::Disjunction(_) => "disjunction".to_string(),
            ValueKind::Thunk(_) => "reference".to_string(),
        }
    }

    /// Kinds the value may still take
    pub fn kinds(&self) -> KindSet {
        match &self.kind {
            ValueKind::Top | ValueKind::Thunk(_) => KindSet::ALL,
            ValueKind::Bottom(_) => KindSet::EMPTY,
            ValueKind::Atom(a) => a.kind(),
            ValueKind::Basic(b) => b.kinds,
            ValueKind::Struct(_) => KindSet::STRUCT,
            ValueKind::List(_) => KindSet::LIST,
            ValueKind::Disjunction(alts) => alts
                .iter()
                .fold(KindSet::EMPTY, |acc, d| acc | d.value.kinds()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValueKind::Top => f.write_str("_"),
            ValueKind::Bottom(_) => f.write_str("_|_"),
            ValueKind::Atom(a) => write!(f, "{}", a),
            ValueKind::Basic(b) => write!(f, "{}", b),
            ValueKind::Struct(s) if s.fields.is_empty() => f.write_str("{}"),
            ValueKind::Struct(_) => f.write_str("{...}"),
            ValueKind::List(l) if l.elems.is_empty() && l.tail.is_none() => f.write_str("[]"),
            ValueKind::List(_) => f.write_str("[...]"),
            ValueKind::Disjunction(alts) => {
                let parts: Vec<String> = alts
                    .iter()
                    .map(|d| {
                        if d.default {
                            format!("*{}", d.value)
                        } else {
                            d.value.to_string()
                        }
                    })
                    .collect();
                f.write_str(&parts.join(" | "))
            }
            ValueKind::Thunk(t) => {
                let mut parts: Vec<String> = t
                    .refs
                    .iter()
                    .filter_map(|r| match r {
                        Reference::Path(p) => Some(p.to_string()),
                        Reference::Embed(inner) => Some(format!("({})", inner)),
                        Reference::Tag(_) => None,
                    })
                    .collect();
                if !t.base.is_top() || parts.is_empty() {
                    parts.push(t.base.to_string());
                }
                f.write_str(&parts.join(" & "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuekit_ast::Pos;

    #[test]
    fn test_equality_ignores_positions() {
        let a = Value::int(1).with_pos(Some(Location::new(Some("/a.cue".into()), Pos::new(0, 1, 1))));
        let b = Value::int(1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_bound_check() {
        let ge = Bound::new(BoundOp::Ge, Atom::Int(0));
        assert!(ge.check(&Atom::Int(0)).unwrap());
        assert!(!ge.check(&Atom::Int(-1)).unwrap());
        assert!(ge.check(&Atom::Float(0.5)).unwrap());

        let re = Bound::new(BoundOp::Match, Atom::String("^a".to_string()));
        assert!(re.check(&Atom::String("abc".to_string())).unwrap());
        assert!(!re.check(&Atom::String("bc".to_string())).unwrap());

        let bad = Bound::new(BoundOp::Match, Atom::String("(".to_string()));
        assert!(bad.check(&Atom::String("x".to_string())).is_err());
    }

    #[test]
    fn test_empty_range() {
        let mut t = BasicType::new(KindSet::NUMBER);
        t.bounds.push(Bound::new(BoundOp::Ge, Atom::Int(5)));
        t.bounds.push(Bound::new(BoundOp::Lt, Atom::Int(3)));
        assert!(t.empty_range().is_some());

        let mut ok = BasicType::new(KindSet::NUMBER);
        ok.bounds.push(Bound::new(BoundOp::Ge, Atom::Int(0)));
        ok.bounds.push(Bound::new(BoundOp::Le, Atom::Int(0)));
        assert!(ok.empty_range().is_none());

        let mut open = BasicType::new(KindSet::NUMBER);
        open.bounds.push(Bound::new(BoundOp::Gt, Atom::Int(0)));
        open.bounds.push(Bound::new(BoundOp::Le, Atom::Int(0)));
        assert!(open.empty_range().is_some());
    }

    #[test]
    fn test_display() {
        let mut t = BasicType::new(KindSet::INT);
        t.bounds.push(Bound::new(BoundOp::Ge, Atom::Int(0)));
        assert_eq!(Value::new(ValueKind::Basic(t)).to_string(), "int & >=0");
        assert_eq!(
            Value::new(ValueKind::Basic(BasicType::bound(Bound::new(BoundOp::Lt, Atom::Int(10)))))
                .to_string(),
            "<10"
        );
        assert_eq!(Value::string("a\"b").to_string(), "\"a\\\"b\"");
        assert_eq!(Value::float(1.0).to_string(), "1.0");

        let disj = Value::new(ValueKind::Disjunction(vec![
            Disjunct {
                value: Value::string("dev"),
                default: true,
            },
            Disjunct {
                value: Value::string("prod"),
                default: false,
            },
        ]));
        assert_eq!(disj.to_string(), "*\"dev\" | \"prod\"");
    }

    #[test]
    fn test_default_value() {
        let disj = Value::new(ValueKind::Disjunction(vec![
            Disjunct {
                value: Value::int(1),
                default: true,
            },
            Disjunct {
                value: Value::basic(KindSet::INT),
                default: false,
            },
        ]));
        assert_eq!(disj.default_value(), Some(&Value::int(1)));
        assert!(disj.is_concrete());
    }

    #[test]
    fn test_combine_markers() {
        use FieldMarker::*;
        assert_eq!(combine_markers(Optional, Regular), Regular);
        assert_eq!(combine_markers(Optional, Required), Required);
        assert_eq!(combine_markers(Optional, Optional), Optional);
    }
}
