//! Declarations: fields, embeddings, ellipses and attributes

use serde::{Deserialize, Serialize};

use crate::expr::Expr;
use crate::pos::Pos;

/// A declaration inside a file or struct literal, with its comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decl {
    pub kind: DeclKind,
    /// Comment lines directly above the declaration
    pub comments: Vec<Comment>,
    /// Comment on the same line, after the declaration
    pub trailing: Option<Comment>,
    /// Preceded by at least one blank line in the source
    pub blank_before: bool,
}

impl Decl {
    /// Wrap a declaration kind without comments
    pub fn new(kind: DeclKind) -> Self {
        Self {
            kind,
            comments: Vec::new(),
            trailing: None,
            blank_before: false,
        }
    }

    /// Position of the declaration's first token
    pub fn pos(&self) -> Pos {
        match &self.kind {
            DeclKind::Field(field) => field.label.pos,
            DeclKind::Embed(expr) => expr.pos(),
            DeclKind::Ellipsis { pos, .. } => *pos,
            DeclKind::Attribute(attr) => attr.pos,
        }
    }

    /// Whether rendering the declaration needs more than one line
    pub fn is_multiline(&self) -> bool {
        if !self.comments.is_empty() {
            return true;
        }
        match &self.kind {
            DeclKind::Field(field) => field.value.is_multiline(),
            DeclKind::Embed(expr) => expr.is_multiline(),
            DeclKind::Ellipsis { ty, .. } => ty.as_ref().is_some_and(Expr::is_multiline),
            DeclKind::Attribute(_) => false,
        }
    }
}

/// Declaration kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeclKind {
    /// `label: value`
    Field(Field),
    /// An expression unified into the enclosing struct
    Embed(Expr),
    /// `...` or `...T`, keeping the enclosing struct open
    Ellipsis { ty: Option<Expr>, pos: Pos },
    /// A declaration-level attribute such as `@extern(x)`
    Attribute(Attribute),
}

/// A field declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub label: Label,
    pub marker: FieldMarker,
    pub value: Expr,
    pub attributes: Vec<Attribute>,
}

impl Field {
    /// Find the first attribute with the given name
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// Field constraint marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FieldMarker {
    #[default]
    Regular,
    /// `a?: T`
    Optional,
    /// `a!: T`
    Required,
}

impl FieldMarker {
    pub fn token(self) -> &'static str {
        match self {
            FieldMarker::Regular => "",
            FieldMarker::Optional => "?",
            FieldMarker::Required => "!",
        }
    }
}

/// How a label was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabelKind {
    /// `name`
    Ident,
    /// `#Name`
    Definition,
    /// `_name`
    Hidden,
    /// `"any text"`
    Quoted,
}

/// A field label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub kind: LabelKind,
    /// The label name, unquoted
    pub name: String,
    /// Source text of the label
    pub raw: String,
    pub pos: Pos,
}

impl Label {
    /// Build a label from an identifier, classifying it by prefix
    pub fn ident(name: impl Into<String>, pos: Pos) -> Self {
        let name = name.into();
        let kind = if name.starts_with('#') {
            LabelKind::Definition
        } else if name.starts_with('_') {
            LabelKind::Hidden
        } else {
            LabelKind::Ident
        };
        Self {
            kind,
            raw: name.clone(),
            name,
            pos,
        }
    }

    /// Build a quoted label
    pub fn quoted(name: impl Into<String>, raw: impl Into<String>, pos: Pos) -> Self {
        Self {
            kind: LabelKind::Quoted,
            name: name.into(),
            raw: raw.into(),
            pos,
        }
    }

    pub fn is_definition(&self) -> bool {
        self.kind == LabelKind::Definition
    }

    pub fn is_hidden(&self) -> bool {
        self.kind == LabelKind::Hidden
    }
}

/// An attribute `@name(body)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    /// Raw text between the parentheses
    pub body: String,
    pub pos: Pos,
}

impl Attribute {
    /// Comma-separated arguments of the attribute body
    ///
    /// `@tag(env,type=int)` yields `[(None, "env"), (Some("type"), "int")]`.
    pub fn args(&self) -> Vec<(Option<&str>, &str)> {
        self.body
            .split(',')
            .map(str::trim)
            .filter(|arg| !arg.is_empty())
            .map(|arg| match arg.split_once('=') {
                Some((key, value)) => (Some(key.trim()), value.trim()),
                None => (None, arg),
            })
            .collect()
    }
}

/// A `//` line comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment text including the leading `//`
    pub text: String,
    pub pos: Pos,
}
