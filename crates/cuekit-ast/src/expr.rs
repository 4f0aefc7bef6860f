//! Expressions
//!
//! Every expression form the parser can produce is a variant of [`Expr`].
//! Literal text is kept verbatim so that the formatter can reproduce it.

use serde::{Deserialize, Serialize};

use crate::decl::{Comment, Decl, Label};
use crate::pos::Pos;

/// An expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A literal (`1`, `"a"`, `true`, `null`, `_`, `_|_`, ...)
    Lit(Lit),
    /// A reference or predeclared identifier (`a`, `#User`, `int`)
    Ident(Ident),
    /// Field selection (`a.b`)
    Selector {
        base: Box<Expr>,
        label: Label,
    },
    /// List indexing (`a[0]`)
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
        pos: Pos,
    },
    /// A prefix operator (`>=0`, `*"dev"`)
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        pos: Pos,
    },
    /// Conjunction or disjunction
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        pos: Pos,
    },
    /// A struct literal
    Struct(StructLit),
    /// A list literal
    List(ListLit),
    /// A parenthesized expression
    Paren { inner: Box<Expr>, pos: Pos },
}

impl Expr {
    /// Position of the first token of the expression
    pub fn pos(&self) -> Pos {
        match self {
            Expr::Lit(lit) => lit.pos,
            Expr::Ident(ident) => ident.pos,
            Expr::Selector { base, .. } => base.pos(),
            Expr::Index { base, .. } => base.pos(),
            Expr::Unary { pos, .. } => *pos,
            Expr::Binary { lhs, .. } => lhs.pos(),
            Expr::Struct(s) => s.lbrace,
            Expr::List(l) => l.lbrack,
            Expr::Paren { pos, .. } => *pos,
        }
    }

    /// Whether rendering this expression needs more than one line
    pub fn is_multiline(&self) -> bool {
        match self {
            Expr::Struct(s) => s.multiline || s.decls.iter().any(Decl::is_multiline),
            Expr::List(l) => l.multiline,
            Expr::Selector { base, .. } | Expr::Index { base, .. } => base.is_multiline(),
            Expr::Unary { operand, .. } => operand.is_multiline(),
            Expr::Binary { lhs, rhs, .. } => lhs.is_multiline() || rhs.is_multiline(),
            Expr::Paren { inner, .. } => inner.is_multiline(),
            Expr::Lit(_) | Expr::Ident(_) => false,
        }
    }
}

/// An identifier occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ident {
    /// Identifier text, including a leading `#` for definitions
    pub name: String,
    pub pos: Pos,
}

impl Ident {
    pub fn new(name: impl Into<String>, pos: Pos) -> Self {
        Self {
            name: name.into(),
            pos,
        }
    }
}

/// Literal kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LitKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Bytes,
    /// `_`
    Top,
    /// `_|_`
    Bottom,
}

/// A literal, kept as source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lit {
    pub kind: LitKind,
    /// Verbatim source text (quotes included for strings and bytes)
    pub raw: String,
    pub pos: Pos,
}

impl Lit {
    pub fn new(kind: LitKind, raw: impl Into<String>, pos: Pos) -> Self {
        Self {
            kind,
            raw: raw.into(),
            pos,
        }
    }
}

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `*` default marker inside a disjunction
    Default,
    GreaterEq,
    Greater,
    LessEq,
    Less,
    NotEq,
    /// `=~` regular expression match
    Match,
    /// `!~` regular expression non-match
    NotMatch,
}

impl UnaryOp {
    /// Source token for this operator
    pub fn token(self) -> &'static str {
        match self {
            UnaryOp::Default => "*",
            UnaryOp::GreaterEq => ">=",
            UnaryOp::Greater => ">",
            UnaryOp::LessEq => "<=",
            UnaryOp::Less => "<",
            UnaryOp::NotEq => "!=",
            UnaryOp::Match => "=~",
            UnaryOp::NotMatch => "!~",
        }
    }

    /// Parse a relational operator token
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "*" => Some(UnaryOp::Default),
            ">=" => Some(UnaryOp::GreaterEq),
            ">" => Some(UnaryOp::Greater),
            "<=" => Some(UnaryOp::LessEq),
            "<" => Some(UnaryOp::Less),
            "!=" => Some(UnaryOp::NotEq),
            "=~" => Some(UnaryOp::Match),
            "!~" => Some(UnaryOp::NotMatch),
            _ => None,
        }
    }
}

/// Infix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// `&` unification
    And,
    /// `|` disjunction
    Or,
}

impl BinaryOp {
    pub fn token(self) -> &'static str {
        match self {
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
        }
    }
}

/// A struct literal `{ ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructLit {
    pub decls: Vec<Decl>,
    /// The literal spanned several lines in the source
    pub multiline: bool,
    /// Written without braces as part of a label chain (`a: b: 1`)
    pub shorthand: bool,
    /// Comments after the last declaration
    pub trailing_comments: Vec<Comment>,
    pub lbrace: Pos,
}

impl StructLit {
    /// An empty, single-line struct literal
    pub fn new(lbrace: Pos) -> Self {
        Self {
            decls: Vec::new(),
            multiline: false,
            shorthand: false,
            trailing_comments: Vec::new(),
            lbrace,
        }
    }
}

/// A list literal `[ ... ]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListLit {
    pub elems: Vec<ListElem>,
    /// The literal spanned several lines in the source
    pub multiline: bool,
    pub lbrack: Pos,
}

/// A list element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ListElem {
    Expr(Expr),
    /// `...` or `...T`, opening the list
    Ellipsis { ty: Option<Expr>, pos: Pos },
}
