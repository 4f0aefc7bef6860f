//! Value builder
//!
//! Compiles one parsed document into a [`Value`]. Each syntax node maps to
//! one value node: struct literals become structs, literals become atoms,
//! type keywords and bounds become [`BasicType`]s, `&` is met eagerly and
//! identifiers become [`Thunk`]s holding a [`PathRef`].
//!
//! Identifiers are bound lexically here, to the innermost enclosing struct
//! literal declaring the label, and looked up by absolute path when the
//! evaluator resolves them. Names declared nowhere in the document are bound
//! to the package root, which spans every document of the load set.
//!
//! `@tag(name)` attributes are substituted while building: a supplied tag
//! is parsed and met into the field, a missing one leaves a tag reference
//! that never resolves.

use std::collections::HashSet;
use std::sync::Arc;

use cuekit_ast::{
    Attribute, BinaryOp, Decl, DeclKind, Expr, Field as FieldDecl, ListElem, Lit, LitKind,
    Pos, SourceFile, UnaryOp,
};
use cuekit_core::diagnostics::{Location, Message};
use cuekit_core::literal;
use indexmap::IndexSet;
use regex::Regex;
use tracing::trace;

use crate::kind::KindSet;
use crate::tags::{TagSet, TagType};
use crate::unify::{defer, meet, meet_embed, normalize};
use crate::value::{
    combine_markers, Atom, BasicType, Bound, BoundOp, Disjunct, Field, PathRef, Reference,
    Selector, StructValue, TagRef, Value, ValueKind,
};

/// A struct literal being built, with the labels it declares
struct Scope {
    path: Vec<Selector>,
    labels: HashSet<String>,
}

/// Builds the value of one document
pub struct Builder<'a> {
    tags: &'a TagSet,
    file: Option<Arc<str>>,
    scopes: Vec<Scope>,
    definition_depth: usize,
    used_tags: IndexSet<String>,
}

impl<'a> Builder<'a> {
    pub fn new(file: Option<&str>, tags: &'a TagSet) -> Self {
        Self {
            tags,
            file: file.map(Arc::from),
            scopes: Vec::new(),
            definition_depth: 0,
            used_tags: IndexSet::new(),
        }
    }

    /// Tags that matched a `@tag` attribute so far
    pub fn used_tags(&self) -> &IndexSet<String> {
        &self.used_tags
    }

    /// Build the value of a whole document
    pub fn build_file(&mut self, file: &SourceFile) -> Value {
        trace!(file = ?self.file, decls = file.decls.len(), "building document");
        self.build_struct(&file.decls, &[], None)
    }

    fn location(&self, pos: Pos) -> Option<Location> {
        pos.is_valid()
            .then(|| Location::new(self.file.clone(), pos))
    }

    fn error(&self, message: Message, pos: Pos) -> Value {
        Value::conflict(message, self.location(pos).into_iter().collect())
            .with_pos(self.location(pos))
    }

    fn build_struct(&mut self, decls: &[Decl], path: &[Selector], lbrace: Option<Pos>) -> Value {
        let labels = decls
            .iter()
            .filter_map(|d| match &d.kind {
                DeclKind::Field(f) => Some(f.label.name.clone()),
                _ => None,
            })
            .collect();
        self.scopes.push(Scope {
            path: path.to_vec(),
            labels,
        });

        let mut st = StructValue::new();
        let mut embeds = Vec::new();
        for decl in decls {
            match &decl.kind {
                DeclKind::Field(field) => {
                    let (label, built) = self.build_field(field, path);
                    match st.fields.get_mut(&label) {
                        Some(existing) => {
                            let value = std::mem::replace(&mut existing.value, Value::top());
                            existing.value = meet(value, built.value);
                            existing.marker = combine_markers(existing.marker, built.marker);
                        }
                        None => {
                            st.fields.insert(label, built);
                        }
                    }
                }
                DeclKind::Embed(expr) => {
                    let embedded = self.build_expr(expr, path);
                    embeds.push(embedded_operand(embedded));
                }
                DeclKind::Ellipsis { .. } => st.ellipsis = true,
                DeclKind::Attribute(attr) => {
                    trace!(name = %attr.name, "ignoring declaration attribute");
                }
            }
        }
        self.scopes.pop();

        if self.definition_depth > 0 && !st.ellipsis {
            st.close();
        }
        let pos = lbrace.and_then(|p| self.location(p));
        embeds
            .into_iter()
            .fold(Value::structure(st).with_pos(pos), meet_embed)
    }

    fn build_field(&mut self, field: &FieldDecl, path: &[Selector]) -> (String, Field) {
        let label = field.label.name.clone();
        let mut child = path.to_vec();
        child.push(Selector::Field(label.clone()));

        let definition = field.label.is_definition();
        if definition {
            self.definition_depth += 1;
        }
        let mut value = self.build_expr(&field.value, &child);
        if definition {
            self.definition_depth -= 1;
        }
        for attr in field.attributes.iter().filter(|a| a.name == "tag") {
            value = self.apply_tag(value, attr);
        }

        let built = Field {
            value,
            marker: field.marker,
            definition,
            hidden: field.label.is_hidden(),
            pos: self.location(field.label.pos),
        };
        (label, built)
    }

    fn apply_tag(&mut self, value: Value, attr: &Attribute) -> Value {
        let args = attr.args();
        let Some(name) = args.iter().find_map(|(key, v)| key.is_none().then_some(*v)) else {
            return meet(
                value,
                self.error(
                    Message::new("invalid tag attribute @tag({})", vec![attr.body.clone()]),
                    attr.pos,
                ),
            );
        };
        let ty = match args.iter().find(|(key, _)| *key == Some("type")) {
            None => TagType::default(),
            Some((_, ty)) => match TagType::from_name(ty) {
                Some(ty) => ty,
                None => {
                    return meet(
                        value,
                        self.error(
                            Message::new(
                                "invalid type {} for tag {}",
                                vec![ty.to_string(), name.to_string()],
                            ),
                            attr.pos,
                        ),
                    )
                }
            },
        };

        let tags = self.tags;
        match tags.get(name) {
            Some(raw) => {
                self.used_tags.insert(name.to_string());
                let substituted = match ty.parse(raw) {
                    Some(atom) => Value::atom(atom).with_pos(self.location(attr.pos)),
                    None => self.error(
                        Message::new(
                            "invalid value {} for tag {} of type {}",
                            vec![literal::quote(raw), name.to_string(), ty.name().to_string()],
                        ),
                        attr.pos,
                    ),
                };
                meet(value, substituted)
            }
            // A default or a concrete value stands in for a missing tag
            None if value.is_concrete() => value,
            None => {
                let tag = Reference::Tag(TagRef {
                    name: name.to_string(),
                    pos: self.location(attr.pos),
                });
                meet(value, defer(vec![tag], Value::top()))
            }
        }
    }

    fn build_expr(&mut self, expr: &Expr, path: &[Selector]) -> Value {
        match expr {
            Expr::Lit(lit) => self.build_literal(lit),
            Expr::Ident(_) | Expr::Selector { .. } | Expr::Index { .. } => {
                self.build_reference(expr, path)
            }
            Expr::Unary { op, operand, pos } => match bound_op(*op) {
                Some(op) => self.build_bound(op, operand, *pos),
                None => self.build_expr(operand, path),
            },
            Expr::Binary {
                op: BinaryOp::And,
                lhs,
                rhs,
                ..
            } => {
                let l = self.build_expr(lhs, path);
                let r = self.build_expr(rhs, path);
                meet(l, r)
            }
            Expr::Binary { op: BinaryOp::Or, .. } => {
                let mut alternatives = Vec::new();
                collect_alternatives(expr, &mut alternatives);
                let disjuncts = alternatives
                    .into_iter()
                    .map(|(alt, default)| Disjunct {
                        value: self.build_expr(alt, path),
                        default,
                    })
                    .collect();
                normalize(disjuncts)
            }
            Expr::Struct(lit) => self.build_struct(&lit.decls, path, Some(lit.lbrace)),
            Expr::List(list) => {
                let mut elems = Vec::new();
                let mut tail = None;
                for elem in &list.elems {
                    let mut child = path.to_vec();
                    child.push(Selector::Index(elems.len()));
                    match elem {
                        ListElem::Expr(expr) => elems.push(self.build_expr(expr, &child)),
                        ListElem::Ellipsis { ty: Some(ty), .. } => {
                            tail = Some(self.build_expr(ty, &child))
                        }
                        ListElem::Ellipsis { ty: None, .. } => tail = Some(Value::top()),
                    }
                }
                Value::list(elems, tail).with_pos(self.location(list.lbrack))
            }
            Expr::Paren { inner, .. } => self.build_expr(inner, path),
        }
    }

    fn build_literal(&self, lit: &Lit) -> Value {
        let parsed = match lit.kind {
            LitKind::Top => return Value::top().with_pos(self.location(lit.pos)),
            LitKind::Bottom => {
                return self.error(Message::plain("explicit error (_|_ literal) in source"), lit.pos)
            }
            LitKind::Null => Ok(Atom::Null),
            LitKind::Bool => Ok(Atom::Bool(lit.raw == "true")),
            LitKind::Int => literal::parse_int(&lit.raw).map(Atom::Int),
            LitKind::Float => literal::parse_float(&lit.raw).map(Atom::Float),
            LitKind::String => literal::unquote(&lit.raw).map(Atom::String),
            LitKind::Bytes => literal::unquote_bytes(&lit.raw).map(Atom::Bytes),
        };
        match parsed {
            Ok(atom) => Value::atom(atom).with_pos(self.location(lit.pos)),
            Err(message) => self.error(Message::plain(message), lit.pos),
        }
    }

    fn build_bound(&mut self, op: BoundOp, operand: &Expr, pos: Pos) -> Value {
        let operand = strip_parens(operand);
        let Expr::Lit(lit) = operand else {
            return self.error(
                Message::new("bound operand of {} must be a literal", vec![op.token().to_string()]),
                pos,
            );
        };
        let ValueKind::Atom(atom) = self.build_literal(lit).kind else {
            return self.error(
                Message::new("invalid bound {}{}", vec![op.token().to_string(), lit.raw.clone()]),
                pos,
            );
        };

        let valid = match op {
            BoundOp::Ne => true,
            BoundOp::Match | BoundOp::NotMatch => match &atom {
                Atom::String(pattern) => {
                    if let Err(err) = Regex::new(pattern) {
                        return self.error(
                            Message::new(
                                "invalid regular expression {}: {}",
                                vec![lit.raw.clone(), err.to_string()],
                            ),
                            pos,
                        );
                    }
                    true
                }
                _ => false,
            },
            _ => matches!(
                atom,
                Atom::Int(_) | Atom::Float(_) | Atom::String(_) | Atom::Bytes(_)
            ),
        };
        if !valid {
            return self.error(
                Message::new("invalid bound {}{}", vec![op.token().to_string(), lit.raw.clone()]),
                pos,
            );
        }
        Value::new(ValueKind::Basic(BasicType::bound(Bound::new(op, atom))))
            .with_pos(self.location(pos))
    }

    fn build_reference(&mut self, expr: &Expr, path: &[Selector]) -> Value {
        let (root, selectors) = match selection_chain(expr) {
            Ok(chain) => chain,
            Err((message, pos)) => return self.error(Message::plain(message), pos),
        };
        let ident = match root {
            Expr::Ident(ident) => ident,
            Expr::Struct(_) | Expr::List(_) => {
                let base = self.build_expr(root, path);
                return self.select_literal(base, &selectors, expr.pos());
            }
            other => {
                return self.error(
                    Message::plain("selector base must be a reference or literal"),
                    other.pos(),
                )
            }
        };
        let pos = self.location(ident.pos);

        let scope = self
            .scopes
            .iter()
            .rev()
            .find(|scope| scope.labels.contains(&ident.name))
            .map(|scope| scope.path.clone());

        let reference = match scope {
            Some(scope) => PathRef {
                scope,
                name: ident.name.clone(),
                selectors,
                embedded: false,
                lexical: true,
                pos: pos.clone(),
            },
            None => {
                if let Some(kinds) = KindSet::from_keyword(&ident.name) {
                    if selectors.is_empty() {
                        return Value::basic(kinds).with_pos(pos);
                    }
                    return self.error(
                        Message::new("cannot select into type {}", vec![ident.name.clone()]),
                        ident.pos,
                    );
                }
                PathRef {
                    scope: Vec::new(),
                    name: ident.name.clone(),
                    selectors,
                    embedded: false,
                    lexical: false,
                    pos: pos.clone(),
                }
            }
        };
        defer(vec![Reference::Path(reference)], Value::top()).with_pos(pos)
    }

    /// Select into a struct or list literal (`[1, 2][0]`)
    fn select_literal(&self, mut value: Value, selectors: &[Selector], pos: Pos) -> Value {
        for sel in selectors {
            if value.is_bottom() {
                return value;
            }
            value = match (value.kind, sel) {
                (ValueKind::Struct(mut st), Selector::Field(name)) => {
                    match st.fields.shift_remove(name) {
                        Some(field) => field.value,
                        None => {
                            return self.error(
                                Message::new("undefined field: {}", vec![sel.to_string()]),
                                pos,
                            )
                        }
                    }
                }
                (ValueKind::List(mut list), Selector::Index(i)) if *i < list.elems.len() => {
                    list.elems.swap_remove(*i)
                }
                (ValueKind::List(list), Selector::Index(i)) => {
                    return self.error(
                        Message::new(
                            "index out of range [{}] with length {}",
                            vec![i.to_string(), list.elems.len().to_string()],
                        ),
                        pos,
                    )
                }
                _ => {
                    return self.error(
                        Message::new("invalid selector {}", vec![sel.to_string()]),
                        pos,
                    )
                }
            };
        }
        value
    }
}

fn bound_op(op: UnaryOp) -> Option<BoundOp> {
    match op {
        UnaryOp::GreaterEq => Some(BoundOp::Ge),
        UnaryOp::Greater => Some(BoundOp::Gt),
        UnaryOp::LessEq => Some(BoundOp::Le),
        UnaryOp::Less => Some(BoundOp::Lt),
        UnaryOp::NotEq => Some(BoundOp::Ne),
        UnaryOp::Match => Some(BoundOp::Match),
        UnaryOp::NotMatch => Some(BoundOp::NotMatch),
        UnaryOp::Default => None,
    }
}

fn strip_parens(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren { inner, .. } => strip_parens(inner),
        other => other,
    }
}

/// Keep a conjunction with references together as one embedded operand
///
/// `#A & {x: 1}` must be met on its own, so that `#A` closes `{x: 1}`,
/// before the result is embedded into the enclosing struct.
fn embedded_operand(value: Value) -> Value {
    let compound = match &value.kind {
        ValueKind::Thunk(thunk) => thunk.refs.len() > 1 || !thunk.base.is_top(),
        _ => false,
    };
    if !compound {
        return value;
    }
    let pos = value.pos.clone();
    defer(vec![Reference::Embed(Box::new(value))], Value::top()).with_pos(pos)
}

/// Flatten an `|` chain, recording `*` default marks
fn collect_alternatives<'e>(expr: &'e Expr, out: &mut Vec<(&'e Expr, bool)>) {
    match expr {
        Expr::Binary {
            op: BinaryOp::Or,
            lhs,
            rhs,
            ..
        } => {
            collect_alternatives(lhs, out);
            collect_alternatives(rhs, out);
        }
        Expr::Unary {
            op: UnaryOp::Default,
            operand,
            ..
        } => out.push((operand, true)),
        other => out.push((other, false)),
    }
}

/// Split `a.b[0]` into its innermost operand and the selectors after it
fn selection_chain(expr: &Expr) -> Result<(&Expr, Vec<Selector>), (&'static str, Pos)> {
    match expr {
        Expr::Paren { inner, .. } => selection_chain(inner),
        Expr::Selector { base, label } => {
            let (root, mut selectors) = selection_chain(base)?;
            selectors.push(Selector::Field(label.name.clone()));
            Ok((root, selectors))
        }
        Expr::Index { base, index, pos } => {
            let (root, mut selectors) = selection_chain(base)?;
            match strip_parens(index) {
                Expr::Lit(Lit {
                    kind: LitKind::Int,
                    raw,
                    ..
                }) => match literal::parse_int(raw).ok().and_then(|n| usize::try_from(n).ok()) {
                    Some(n) => selectors.push(Selector::Index(n)),
                    None => return Err(("index out of range", *pos)),
                },
                Expr::Lit(Lit {
                    kind: LitKind::String,
                    raw,
                    ..
                }) => match literal::unquote(raw) {
                    Ok(label) => selectors.push(Selector::Field(label)),
                    Err(_) => return Err(("invalid index", *pos)),
                },
                _ => return Err(("index must be an integer or string literal", *pos)),
            }
            Ok((root, selectors))
        }
        other => Ok((other, Vec::new())),
    }
}
