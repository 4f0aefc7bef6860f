//! Reference evaluation
//!
//! The evaluator expands the unified root value lazily over an arena of
//! [`Vertex`] nodes, one per field path that has been visited. A vertex
//! holds the conjuncts for its path (`raw`) and, once evaluated, the value
//! with its own references resolved. Nested fields are only expanded when
//! a reference or [`Evaluator::manifest`] walks into them.
//!
//! Cycles are handled in two ways:
//!
//! - A reference to a vertex that is being evaluated sees only that
//!   vertex's non-reference conjuncts. `a: b, b: a` therefore stays
//!   unresolved while `a: b & 1, b: a & 2` conflicts.
//! - A reference to the referring field itself or to one of its ancestors
//!   is a structural cycle and is left unresolved.

use cuekit_ast::FieldMarker;
use cuekit_core::diagnostics::{ErrorKind, Message};
use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use crate::unify::{defer, meet, meet_embed, normalize};
use crate::value::{Disjunct, PathRef, Reference, Selector, Value, ValueKind};

/// Index of a vertex in the arena
pub type VertexId = usize;

/// The package root
pub const ROOT: VertexId = 0;

/// Limit on nested evaluations and on field path length
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Unevaluated,
    Evaluating,
    Done,
}

/// One field path of the configuration
#[derive(Debug)]
struct Vertex {
    path: Vec<Selector>,
    raw: Value,
    value: Value,
    status: Status,
    arcs: IndexMap<Selector, VertexId>,
    /// Arcs were taken from a partial value and are dropped once done
    provisional: bool,
}

impl Vertex {
    fn new(path: Vec<Selector>, raw: Value) -> Self {
        Self {
            path,
            raw,
            value: Value::top(),
            status: Status::Unevaluated,
            arcs: IndexMap::new(),
            provisional: false,
        }
    }
}

/// Outcome of following one selector
enum Step {
    Arc(VertexId),
    Missing,
    Bottom(Value),
}

/// Arena evaluator for one call
pub struct Evaluator {
    vertices: Vec<Vertex>,
    depth: usize,
}

impl Evaluator {
    pub fn new(root: Value) -> Self {
        Self {
            vertices: vec![Vertex::new(Vec::new(), root)],
            depth: 0,
        }
    }

    /// Resolve every reference reachable from the root
    pub fn evaluate(mut self) -> Value {
        let value = self.manifest(ROOT);
        debug!(vertices = self.vertices.len(), "evaluation finished");
        value
    }

    fn path_string(&self, vid: VertexId) -> String {
        let parts: Vec<String> = self.vertices[vid]
            .path
            .iter()
            .map(Selector::to_string)
            .collect();
        parts.join(".")
    }

    /// Non-reference conjuncts of a vertex
    fn partial(&self, vid: VertexId) -> Value {
        let raw = &self.vertices[vid].raw;
        match &raw.kind {
            ValueKind::Thunk(thunk) => (*thunk.base).clone(),
            _ => raw.clone(),
        }
    }

    fn eval(&mut self, vid: VertexId) -> Value {
        match self.vertices[vid].status {
            Status::Done => return self.vertices[vid].value.clone(),
            Status::Evaluating => return self.partial(vid),
            Status::Unevaluated => {}
        }
        if self.depth >= MAX_DEPTH {
            warn!(path = %self.path_string(vid), "evaluation depth limit reached");
            let raw = self.vertices[vid].raw.clone();
            self.finish(vid, raw.clone());
            return raw;
        }

        self.vertices[vid].status = Status::Evaluating;
        self.depth += 1;
        let raw = self.vertices[vid].raw.clone();
        let value = self.resolve(vid, raw);
        self.depth -= 1;
        self.finish(vid, value.clone());
        value
    }

    fn finish(&mut self, vid: VertexId, value: Value) {
        let vertex = &mut self.vertices[vid];
        vertex.value = value;
        vertex.status = Status::Done;
        if vertex.provisional {
            vertex.arcs.clear();
            vertex.provisional = false;
        }
    }

    /// Resolve the references of a value at the level of `vid`
    fn resolve(&mut self, vid: VertexId, value: Value) -> Value {
        let pos = value.pos.clone();
        let thunk = match value.kind {
            ValueKind::Thunk(thunk) => thunk,
            kind => return self.resolve_alternatives(vid, Value { kind, pos }),
        };

        let mut acc = *thunk.base;
        let mut pending = Vec::new();
        for reference in thunk.refs {
            match self.resolve_ref(vid, &reference) {
                Some(resolved) if reference.is_embedded() => acc = meet_embed(acc, resolved),
                Some(resolved) => acc = meet(acc, resolved),
                None => pending.push(reference),
            }
            if acc.is_bottom() {
                return acc;
            }
        }

        // References carried in by resolved values stay pending
        let acc = match acc.kind {
            ValueKind::Thunk(inner) => {
                pending.extend(inner.refs);
                *inner.base
            }
            kind => Value { kind, pos: acc.pos },
        };
        let acc = self.resolve_alternatives(vid, acc);
        let mut result = defer(pending, acc);
        if result.pos.is_none() {
            result.pos = pos;
        }
        result
    }

    fn resolve_alternatives(&mut self, vid: VertexId, value: Value) -> Value {
        match value.kind {
            ValueKind::Disjunction(alts)
                if alts.iter().any(|d| matches!(d.value.kind, ValueKind::Thunk(_))) =>
            {
                let resolved = alts
                    .into_iter()
                    .map(|d| Disjunct {
                        value: self.resolve(vid, d.value),
                        default: d.default,
                    })
                    .collect();
                let mut result = normalize(resolved);
                if result.pos.is_none() {
                    result.pos = value.pos;
                }
                result
            }
            kind => Value {
                kind,
                pos: value.pos,
            },
        }
    }

    /// Value of a reference seen from `vid`, or `None` while unresolved
    fn resolve_ref(&mut self, vid: VertexId, reference: &Reference) -> Option<Value> {
        let r = match reference {
            Reference::Path(r) => r,
            Reference::Embed(inner) => return self.resolve_embedded(vid, inner),
            Reference::Tag(_) => return None,
        };

        let mut cur = ROOT;
        for sel in &r.scope {
            cur = match self.step(cur, sel) {
                Step::Arc(id) => id,
                Step::Missing => return None,
                Step::Bottom(bottom) => return Some(bottom),
            };
        }
        cur = match self.step(cur, &Selector::Field(r.name.clone())) {
            Step::Arc(id) => id,
            Step::Bottom(bottom) => return Some(bottom),
            Step::Missing if r.scope.is_empty() && !r.lexical => {
                return Some(not_found(r));
            }
            Step::Missing => return None,
        };
        for sel in &r.selectors {
            cur = match self.step(cur, sel) {
                Step::Arc(id) => id,
                Step::Missing => return None,
                Step::Bottom(bottom) => return Some(bottom),
            };
        }

        let here = self.vertices[vid].path.clone();
        let there = self.vertices[cur].path.clone();
        if here.starts_with(&there) {
            trace!(reference = %r, path = %self.path_string(vid), "structural cycle left unresolved");
            return None;
        }

        let value = match self.vertices[cur].status {
            Status::Evaluating => {
                let partial = self.partial(cur);
                if partial.is_top() {
                    trace!(reference = %r, "reference cycle left unresolved");
                    return None;
                }
                partial
            }
            _ => self.eval(cur),
        };
        Some(rebase(value, &there, &here))
    }

    /// An embedded conjunction, once none of its own references is pending
    fn resolve_embedded(&mut self, vid: VertexId, inner: &Value) -> Option<Value> {
        let resolved = self.resolve(vid, inner.clone());
        match resolved.kind {
            ValueKind::Thunk(_) => None,
            _ => Some(resolved),
        }
    }

    /// Follow one selector from a vertex, creating the arc on first use
    fn step(&mut self, vid: VertexId, sel: &Selector) -> Step {
        if let Some(&id) = self.vertices[vid].arcs.get(sel) {
            return Step::Arc(id);
        }
        if self.vertices[vid].status == Status::Unevaluated {
            self.eval(vid);
        }
        let provisional = self.vertices[vid].status == Status::Evaluating;

        let child = {
            let partial;
            let source = if provisional {
                partial = self.partial(vid);
                &partial
            } else {
                &self.vertices[vid].value
            };
            let source = source.default_value().unwrap_or(source);
            match (&source.kind, sel) {
                (ValueKind::Bottom(_), _) => return Step::Bottom(source.clone()),
                (ValueKind::Struct(st), Selector::Field(name)) => match st.fields.get(name) {
                    Some(field) => field.value.clone(),
                    None => return Step::Missing,
                },
                (ValueKind::List(list), Selector::Index(i)) => match list.elems.get(*i) {
                    Some(elem) => elem.clone(),
                    None => return Step::Missing,
                },
                _ => return Step::Missing,
            }
        };

        let mut path = self.vertices[vid].path.clone();
        path.push(sel.clone());
        if path.len() > MAX_DEPTH {
            warn!(path = %self.path_string(vid), "field nesting limit reached");
            return Step::Missing;
        }

        let id = self.vertices.len();
        self.vertices.push(Vertex::new(path, child));
        let parent = &mut self.vertices[vid];
        parent.arcs.insert(sel.clone(), id);
        parent.provisional |= provisional;
        Step::Arc(id)
    }

    /// Evaluate a vertex and, recursively, its regular fields and elements
    pub fn manifest(&mut self, vid: VertexId) -> Value {
        let value = self.eval(vid).resolve_default();
        let pos = value.pos;
        match value.kind {
            ValueKind::Struct(mut st) => {
                let labels: Vec<String> = st
                    .fields
                    .iter()
                    .filter(|(_, f)| f.marker != FieldMarker::Optional)
                    .map(|(label, _)| label.clone())
                    .collect();
                for label in labels {
                    if let Step::Arc(id) = self.step(vid, &Selector::Field(label.clone())) {
                        let manifested = self.manifest(id);
                        if let Some(field) = st.fields.get_mut(&label) {
                            field.value = manifested;
                        }
                    }
                }
                Value {
                    kind: ValueKind::Struct(st),
                    pos,
                }
            }
            ValueKind::List(mut list) => {
                for i in 0..list.elems.len() {
                    if let Step::Arc(id) = self.step(vid, &Selector::Index(i)) {
                        list.elems[i] = self.manifest(id);
                    }
                }
                Value {
                    kind: ValueKind::List(list),
                    pos,
                }
            }
            kind => Value { kind, pos },
        }
    }
}

fn not_found(r: &PathRef) -> Value {
    Value::bottom(
        ErrorKind::Reference,
        Message::new("reference {} not found", vec![format!("{:?}", r.name)]),
        r.pos.iter().cloned().collect(),
    )
    .with_pos(r.pos.clone())
}

/// Move references scoped inside `from` to the same place inside `to`
///
/// A value copied from one field into another keeps its internal references
/// pointing into the copy, which is how definitions re-bind at the use site.
pub fn rebase(mut value: Value, from: &[Selector], to: &[Selector]) -> Value {
    if from != to {
        rebase_in_place(&mut value, from, to);
    }
    value
}

fn rebase_in_place(value: &mut Value, from: &[Selector], to: &[Selector]) {
    match &mut value.kind {
        ValueKind::Struct(st) => {
            for field in st.fields.values_mut() {
                rebase_in_place(&mut field.value, from, to);
            }
        }
        ValueKind::List(list) => {
            for elem in &mut list.elems {
                rebase_in_place(elem, from, to);
            }
            if let Some(tail) = &mut list.tail {
                rebase_in_place(tail, from, to);
            }
        }
        ValueKind::Disjunction(alts) => {
            for alt in alts {
                rebase_in_place(&mut alt.value, from, to);
            }
        }
        ValueKind::Thunk(thunk) => {
            for reference in &mut thunk.refs {
                match reference {
                    Reference::Path(r) if r.scope.starts_with(from) => {
                        let mut scope = to.to_vec();
                        scope.extend_from_slice(&r.scope[from.len()..]);
                        r.scope = scope;
                    }
                    Reference::Embed(inner) => rebase_in_place(inner, from, to),
                    Reference::Path(_) | Reference::Tag(_) => {}
                }
            }
            rebase_in_place(&mut thunk.base, from, to);
        }
        ValueKind::Top | ValueKind::Bottom(_) | ValueKind::Atom(_) | ValueKind::Basic(_) => {}
    }
}
