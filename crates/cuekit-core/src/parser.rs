//! Document parser
//!
//! Parses configuration text into a [`cuekit_ast::SourceFile`] using the
//! pest grammar in `cue.pest`.
//!
//! # Supported Syntax
//!
//! - Package clause: `package name`
//! - Fields: `a: 1`, `a?: int`, `a!: string`, `a: b: c: 1`
//! - Definitions and hidden fields: `#User: {...}`, `_tmp: 1`
//! - Embeddings and ellipses inside structs: `{ #Base, ... }`
//! - Attributes: `a: string @tag(env)`
//! - Expressions: `&`, `|`, `*default`, bounds (`>=0`, `=~"^a"`),
//!   selectors (`a.b`), indexes (`a[0]`)
//! - Literals: `null`, booleans, integers, floats, strings, bytes, `_`, `_|_`
//!
//! Comments are attached to the declaration that follows them, or to the
//! declaration on the same line when they trail it.
//!
//! # Example
//!
//! ```
//! use cuekit_core::parser;
//!
//! let file = parser::parse("package app\n\nport: 8080\n").unwrap();
//! assert_eq!(file.package_name(), Some("app"));
//! assert_eq!(file.decls.len(), 1);
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use cuekit_ast::{
    Attribute, BinaryOp, Comment, Decl, DeclKind, Expr, Field, FieldMarker, Ident, Label,
    ListElem, ListLit, Lit, LitKind, PackageClause, Pos, SourceFile, StructLit, UnaryOp,
};
use pest::error::{ErrorVariant, InputLocation, LineColLocation};
use pest::iterators::Pair;
use pest::Parser as _;
use pest_derive::Parser;
use thiserror::Error;
use tracing::debug;

use crate::diagnostics::{ErrorKind, Location, Message, PositionedError, Report, StructuredError};
use crate::literal;

#[derive(Parser)]
#[grammar = "cue.pest"]
struct CueParser;

/// Malformed document text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    /// Logical path of the document, if known
    pub file: Option<String>,
    pub pos: Pos,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, file: Option<&str>, pos: Pos) -> Self {
        Self {
            message: message.into(),
            file: file.map(str::to_string),
            pos,
        }
    }

    fn from_pest(err: pest::error::Error<Rule>, file: Option<&str>) -> Self {
        let (line, column) = match err.line_col {
            LineColLocation::Pos(pos) => pos,
            LineColLocation::Span(start, _) => start,
        };
        let offset = match err.location {
            InputLocation::Pos(offset) => offset,
            InputLocation::Span((start, _)) => start,
        };
        let message = match &err.variant {
            ErrorVariant::ParsingError { positives, .. } => describe_expected(positives),
            ErrorVariant::CustomError { message } => message.clone(),
        };
        Self::new(message, file, Pos::new(offset, line, column))
    }

    /// Normalize into the outward error shape
    pub fn to_structured(&self) -> StructuredError {
        let err = StructuredError::new(ErrorKind::Syntax, self.message.clone())
            .with_position(self.pos.line, self.pos.column);
        match &self.file {
            Some(file) => err.with_file(file.clone()),
            None => err,
        }
    }
}

impl Report for SyntaxError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Syntax
    }

    fn positioned(&self) -> Cow<'_, [PositionedError]> {
        let location = Location::new(self.file.as_deref().map(Arc::from), self.pos);
        Cow::Owned(vec![PositionedError::new(
            ErrorKind::Syntax,
            Message::plain(self.message.clone()),
        )
        .with_positions(vec![location])])
    }

    fn plain_message(&self) -> String {
        self.message.clone()
    }
}

impl From<SyntaxError> for StructuredError {
    fn from(err: SyntaxError) -> Self {
        err.to_structured()
    }
}

/// Human names for grammar rules in error messages
fn rule_name(rule: &Rule) -> &'static str {
    match rule {
        Rule::decl | Rule::field | Rule::embed => "declaration",
        Rule::label | Rule::label_part => "label",
        Rule::expr
        | Rule::alt
        | Rule::conj
        | Rule::unary
        | Rule::primary
        | Rule::operand
        | Rule::paren => "expression",
        Rule::literal
        | Rule::null_lit
        | Rule::bool_lit
        | Rule::bottom_lit
        | Rule::top_lit
        | Rule::float_lit
        | Rule::int_lit
        | Rule::bytes_lit => "literal",
        Rule::string_lit => "string",
        Rule::ident | Rule::ident_ref | Rule::def_ident => "identifier",
        Rule::struct_lit => "struct",
        Rule::list_lit | Rule::list_elem => "list element",
        Rule::ellipsis => "\"...\"",
        Rule::attribute | Rule::attr_name | Rule::attr_body => "attribute",
        Rule::rel_op => "operator",
        Rule::selector => "selector",
        Rule::marker => "\"?\" or \"!\"",
        Rule::default_mark => "\"*\"",
        Rule::comment => "comment",
        Rule::package_clause | Rule::kw_package => "package clause",
        Rule::EOI => "end of input",
        _ => "token",
    }
}

fn describe_expected(positives: &[Rule]) -> String {
    let mut names: Vec<&str> = Vec::new();
    for rule in positives {
        let name = rule_name(rule);
        if !names.contains(&name) {
            names.push(name);
        }
    }
    match names.as_slice() {
        [] => "unexpected input".to_string(),
        [one] => format!("expected {}", one),
        [init @ .., last] => format!("expected {}, or {}", init.join(", "), last),
    }
}

/// Parse a document without a file name
pub fn parse(input: &str) -> Result<SourceFile, SyntaxError> {
    parse_file(None, input)
}

/// Parse a document, recording its logical path in errors and positions
pub fn parse_file(filename: Option<&str>, input: &str) -> Result<SourceFile, SyntaxError> {
    let mut pairs = CueParser::parse(Rule::file, input)
        .map_err(|err| SyntaxError::from_pest(err, filename))?;
    let root = pairs
        .next()
        .ok_or_else(|| SyntaxError::new("empty document", filename, Pos::default()))?;

    let builder = AstBuilder { filename };
    let mut file = builder.file(root)?;
    file.filename = filename.map(str::to_string);
    debug!(
        file = filename.unwrap_or("<input>"),
        decls = file.decls.len(),
        "parsed document"
    );
    Ok(file)
}

fn pos_of(pair: &Pair<'_, Rule>) -> Pos {
    let start = pair.as_span().start_pos();
    let (line, column) = start.line_col();
    Pos::new(start.pos(), line, column)
}

fn end_line(pair: &Pair<'_, Rule>) -> usize {
    pair.as_span().end_pos().line_col().0
}

fn comment_of(pair: &Pair<'_, Rule>) -> Comment {
    Comment {
        text: pair.as_str().trim_end().to_string(),
        pos: pos_of(pair),
    }
}

/// Collects the declarations of a file or struct body and attaches comments
struct DeclBlock {
    decls: Vec<Decl>,
    pending: Vec<Comment>,
    pending_blank: bool,
    last_line: usize,
    last_decl_line: Option<usize>,
}

impl DeclBlock {
    fn new(start_line: usize) -> Self {
        Self {
            decls: Vec::new(),
            pending: Vec::new(),
            pending_blank: false,
            last_line: start_line,
            last_decl_line: None,
        }
    }

    fn comment(&mut self, comment: Comment) {
        let line = comment.pos.line;
        if self.pending.is_empty() && self.last_decl_line == Some(line) {
            if let Some(last) = self.decls.last_mut() {
                if last.trailing.is_none() {
                    last.trailing = Some(comment);
                    self.last_line = line;
                    return;
                }
            }
        }
        if self.pending.is_empty() {
            self.pending_blank = line > self.last_line + 1;
        }
        self.pending.push(comment);
        self.last_line = line;
    }

    fn push(&mut self, mut decl: Decl, start_line: usize, end_line: usize) {
        let blank = if self.pending.is_empty() {
            start_line > self.last_line + 1
        } else {
            self.pending_blank
        };
        decl.comments = std::mem::take(&mut self.pending);
        decl.blank_before = blank && !self.decls.is_empty();
        self.decls.push(decl);
        self.last_line = end_line;
        self.last_decl_line = Some(end_line);
    }

    fn take_pending(&mut self) -> Vec<Comment> {
        std::mem::take(&mut self.pending)
    }

    fn finish(self) -> (Vec<Decl>, Vec<Comment>) {
        (self.decls, self.pending)
    }
}

/// Converts pest pairs into syntax tree nodes
struct AstBuilder<'a> {
    filename: Option<&'a str>,
}

impl AstBuilder<'_> {
    fn error(&self, message: impl Into<String>, pos: Pos) -> SyntaxError {
        SyntaxError::new(message, self.filename, pos)
    }

    fn child<'i>(&self, pair: Pair<'i, Rule>) -> Result<Pair<'i, Rule>, SyntaxError> {
        let pos = pos_of(&pair);
        let rule = pair.as_rule();
        pair.into_inner()
            .next()
            .ok_or_else(|| self.error(format!("malformed {}", rule_name(&rule)), pos))
    }

    fn file(&self, pair: Pair<'_, Rule>) -> Result<SourceFile, SyntaxError> {
        let mut file = SourceFile::new();
        let mut block = DeclBlock::new(0);
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::package_clause => {
                    let pos = pos_of(&inner);
                    let ident = inner
                        .into_inner()
                        .find(|p| p.as_rule() == Rule::ident)
                        .ok_or_else(|| self.error("expected package name", pos))?;
                    file.package = Some(PackageClause {
                        name: Ident::new(ident.as_str(), pos_of(&ident)),
                        comments: block.take_pending(),
                    });
                    block.last_line = pos.line;
                }
                Rule::comment => block.comment(comment_of(&inner)),
                Rule::decl => {
                    let start = pos_of(&inner).line;
                    let end = end_line(&inner);
                    let decl = self.decl(inner)?;
                    block.push(decl, start, end);
                }
                _ => {}
            }
        }
        let (decls, trailing) = block.finish();
        file.decls = decls;
        file.trailing_comments = trailing;
        Ok(file)
    }

    fn decl(&self, pair: Pair<'_, Rule>) -> Result<Decl, SyntaxError> {
        let inner = self.child(pair)?;
        let kind = match inner.as_rule() {
            Rule::field => DeclKind::Field(self.field(inner)?),
            Rule::ellipsis => {
                let (ty, pos) = self.ellipsis(inner)?;
                DeclKind::Ellipsis { ty, pos }
            }
            Rule::attribute => DeclKind::Attribute(self.attribute(inner)),
            Rule::embed => DeclKind::Embed(self.expr(self.child(inner)?)?),
            _ => return Err(self.error("expected declaration", pos_of(&inner))),
        };
        Ok(Decl::new(kind))
    }

    fn ellipsis(&self, pair: Pair<'_, Rule>) -> Result<(Option<Expr>, Pos), SyntaxError> {
        let pos = pos_of(&pair);
        let ty = match pair.into_inner().next() {
            Some(unary) => Some(self.unary(unary)?),
            None => None,
        };
        Ok((ty, pos))
    }

    /// A field; `a: b: 1` becomes `a: {b: 1}` with a shorthand struct
    fn field(&self, pair: Pair<'_, Rule>) -> Result<Field, SyntaxError> {
        let pos = pos_of(&pair);
        let mut labels = Vec::new();
        let mut value = None;
        let mut attributes = Vec::new();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::label_part => labels.push(self.label_part(inner)?),
                Rule::expr => value = Some(self.expr(inner)?),
                Rule::attribute => attributes.push(self.attribute(inner)),
                _ => {}
            }
        }
        let value = value.ok_or_else(|| self.error("expected expression", pos))?;
        let (label, marker) = labels
            .pop()
            .ok_or_else(|| self.error("expected label", pos))?;

        let mut field = Field {
            label,
            marker,
            value,
            attributes,
        };
        while let Some((label, marker)) = labels.pop() {
            let mut lit = StructLit::new(field.label.pos);
            lit.shorthand = true;
            lit.decls.push(Decl::new(DeclKind::Field(field)));
            field = Field {
                label,
                marker,
                value: Expr::Struct(lit),
                attributes: Vec::new(),
            };
        }
        Ok(field)
    }

    fn label_part(&self, pair: Pair<'_, Rule>) -> Result<(Label, FieldMarker), SyntaxError> {
        let mut label = None;
        let mut marker = FieldMarker::Regular;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::label => label = Some(self.label(inner)?),
                Rule::marker => {
                    marker = if inner.as_str() == "?" {
                        FieldMarker::Optional
                    } else {
                        FieldMarker::Required
                    }
                }
                _ => {}
            }
        }
        let label = label.ok_or_else(|| self.error("expected label", Pos::default()))?;
        Ok((label, marker))
    }

    fn label(&self, pair: Pair<'_, Rule>) -> Result<Label, SyntaxError> {
        let inner = self.child(pair)?;
        let pos = pos_of(&inner);
        match inner.as_rule() {
            Rule::string_lit => {
                let raw = inner.as_str();
                let name = literal::unquote(raw).map_err(|msg| self.error(msg, pos))?;
                Ok(Label::quoted(name, raw, pos))
            }
            _ => Ok(Label::ident(inner.as_str(), pos)),
        }
    }

    fn attribute(&self, pair: Pair<'_, Rule>) -> Attribute {
        let pos = pos_of(&pair);
        let mut name = String::new();
        let mut body = String::new();
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::attr_name => name = inner.as_str().to_string(),
                Rule::attr_body => body = inner.as_str().to_string(),
                _ => {}
            }
        }
        Attribute { name, body, pos }
    }

    fn expr(&self, pair: Pair<'_, Rule>) -> Result<Expr, SyntaxError> {
        let pos = pos_of(&pair);
        let mut result: Option<Expr> = None;
        for alt in pair.into_inner().filter(|p| p.as_rule() == Rule::alt) {
            let rhs = self.alt(alt)?;
            result = Some(match result {
                None => rhs,
                Some(lhs) => binary(BinaryOp::Or, lhs, rhs),
            });
        }
        result.ok_or_else(|| self.error("expected expression", pos))
    }

    fn alt(&self, pair: Pair<'_, Rule>) -> Result<Expr, SyntaxError> {
        let pos = pos_of(&pair);
        let mut is_default = false;
        let mut conj = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::default_mark => is_default = true,
                Rule::conj => conj = Some(self.conj(inner)?),
                _ => {}
            }
        }
        let operand = conj.ok_or_else(|| self.error("expected expression", pos))?;
        if is_default {
            Ok(Expr::Unary {
                op: UnaryOp::Default,
                operand: Box::new(operand),
                pos,
            })
        } else {
            Ok(operand)
        }
    }

    fn conj(&self, pair: Pair<'_, Rule>) -> Result<Expr, SyntaxError> {
        let pos = pos_of(&pair);
        let mut result: Option<Expr> = None;
        for unary in pair.into_inner().filter(|p| p.as_rule() == Rule::unary) {
            let rhs = self.unary(unary)?;
            result = Some(match result {
                None => rhs,
                Some(lhs) => binary(BinaryOp::And, lhs, rhs),
            });
        }
        result.ok_or_else(|| self.error("expected expression", pos))
    }

    fn unary(&self, pair: Pair<'_, Rule>) -> Result<Expr, SyntaxError> {
        let pos = pos_of(&pair);
        let mut op = None;
        let mut operand = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::rel_op => op = UnaryOp::from_token(inner.as_str()),
                Rule::primary => operand = Some(self.primary(inner)?),
                _ => {}
            }
        }
        let operand = operand.ok_or_else(|| self.error("expected expression", pos))?;
        Ok(match op {
            Some(op) => Expr::Unary {
                op,
                operand: Box::new(operand),
                pos,
            },
            None => operand,
        })
    }

    fn primary(&self, pair: Pair<'_, Rule>) -> Result<Expr, SyntaxError> {
        let pos = pos_of(&pair);
        let mut expr: Option<Expr> = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::operand => expr = Some(self.operand(inner)?),
                Rule::selector => {
                    let base = expr.ok_or_else(|| self.error("expected expression", pos))?;
                    expr = Some(self.selector(base, inner)?);
                }
                _ => {}
            }
        }
        expr.ok_or_else(|| self.error("expected expression", pos))
    }

    fn selector(&self, base: Expr, pair: Pair<'_, Rule>) -> Result<Expr, SyntaxError> {
        let pos = pos_of(&pair);
        let inner = pair
            .into_inner()
            .find(|p| matches!(p.as_rule(), Rule::label | Rule::expr))
            .ok_or_else(|| self.error("expected selector", pos))?;
        match inner.as_rule() {
            Rule::label => Ok(Expr::Selector {
                base: Box::new(base),
                label: self.label(inner)?,
            }),
            _ => Ok(Expr::Index {
                base: Box::new(base),
                index: Box::new(self.expr(inner)?),
                pos,
            }),
        }
    }

    fn operand(&self, pair: Pair<'_, Rule>) -> Result<Expr, SyntaxError> {
        let inner = self.child(pair)?;
        let pos = pos_of(&inner);
        match inner.as_rule() {
            Rule::literal => self.literal(self.child(inner)?),
            Rule::struct_lit => Ok(Expr::Struct(self.struct_lit(inner)?)),
            Rule::list_lit => Ok(Expr::List(self.list_lit(inner)?)),
            Rule::paren => {
                let expr = inner
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::expr)
                    .ok_or_else(|| self.error("expected expression", pos))?;
                Ok(Expr::Paren {
                    inner: Box::new(self.expr(expr)?),
                    pos,
                })
            }
            Rule::ident_ref => {
                let ident = self.child(inner)?;
                Ok(Expr::Ident(Ident::new(ident.as_str(), pos)))
            }
            _ => Err(self.error("expected expression", pos)),
        }
    }

    fn literal(&self, pair: Pair<'_, Rule>) -> Result<Expr, SyntaxError> {
        let pos = pos_of(&pair);
        let raw = pair.as_str();
        let kind = match pair.as_rule() {
            Rule::null_lit => LitKind::Null,
            Rule::bool_lit => LitKind::Bool,
            Rule::bottom_lit => LitKind::Bottom,
            Rule::top_lit => LitKind::Top,
            Rule::float_lit => {
                literal::parse_float(raw).map_err(|msg| self.error(msg, pos))?;
                LitKind::Float
            }
            Rule::int_lit => {
                literal::parse_int(raw).map_err(|msg| self.error(msg, pos))?;
                LitKind::Int
            }
            Rule::string_lit => {
                literal::unquote(raw).map_err(|msg| self.error(msg, pos))?;
                LitKind::String
            }
            Rule::bytes_lit => {
                literal::unquote_bytes(raw).map_err(|msg| self.error(msg, pos))?;
                LitKind::Bytes
            }
            _ => return Err(self.error("expected literal", pos)),
        };
        Ok(Expr::Lit(Lit::new(kind, raw, pos)))
    }

    fn struct_lit(&self, pair: Pair<'_, Rule>) -> Result<StructLit, SyntaxError> {
        let lbrace = pos_of(&pair);
        let multiline = end_line(&pair) != lbrace.line;
        let mut block = DeclBlock::new(lbrace.line);
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::comment => block.comment(comment_of(&inner)),
                Rule::decl => {
                    let start = pos_of(&inner).line;
                    let end = end_line(&inner);
                    let decl = self.decl(inner)?;
                    block.push(decl, start, end);
                }
                _ => {}
            }
        }
        let (decls, trailing_comments) = block.finish();
        let mut lit = StructLit::new(lbrace);
        lit.decls = decls;
        lit.trailing_comments = trailing_comments;
        lit.multiline = multiline;
        Ok(lit)
    }

    fn list_lit(&self, pair: Pair<'_, Rule>) -> Result<ListLit, SyntaxError> {
        let lbrack = pos_of(&pair);
        let multiline = end_line(&pair) != lbrack.line;
        let mut elems = Vec::new();
        for inner in pair.into_inner().filter(|p| p.as_rule() == Rule::list_elem) {
            let elem = self.child(inner)?;
            match elem.as_rule() {
                Rule::ellipsis => {
                    let (ty, pos) = self.ellipsis(elem)?;
                    elems.push(ListElem::Ellipsis { ty, pos });
                }
                _ => elems.push(ListElem::Expr(self.expr(elem)?)),
            }
        }
        Ok(ListLit {
            elems,
            multiline,
            lbrack,
        })
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    let pos = lhs.pos();
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        pos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(decl: &Decl) -> &Field {
        match &decl.kind {
            DeclKind::Field(field) => field,
            other => panic!("expected field, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_empty() {
        let file = parse("").unwrap();
        assert!(file.is_empty());
    }

    #[test]
    fn test_parse_simple_fields() {
        let file = parse("a: 1\nb: \"two\"").unwrap();
        assert_eq!(file.decls.len(), 2);
        let a = field(&file.decls[0]);
        assert_eq!(a.label.name, "a");
        assert_eq!(a.label.pos, Pos::new(0, 1, 1));
        assert!(matches!(&a.value, Expr::Lit(lit) if lit.kind == LitKind::Int && lit.raw == "1"));
        let b = field(&file.decls[1]);
        assert_eq!(b.label.pos.line, 2);
    }

    #[test]
    fn test_parse_commas_separate_decls() {
        let file = parse("a: 1, b: 2").unwrap();
        assert_eq!(file.decls.len(), 2);
    }

    #[test]
    fn test_parse_shorthand_chain() {
        let file = parse("a: b: c: 1").unwrap();
        let a = field(&file.decls[0]);
        let Expr::Struct(b) = &a.value else {
            panic!("expected struct");
        };
        assert!(b.shorthand);
        let b_field = field(&b.decls[0]);
        assert_eq!(b_field.label.name, "b");
        assert_eq!(b_field.label.pos.column, 4);
    }

    #[test]
    fn test_parse_markers_and_labels() {
        let file = parse("a?: int\nb!: string\n#Def: {}\n_h: 1\n\"x-y\": 2").unwrap();
        assert_eq!(field(&file.decls[0]).marker, FieldMarker::Optional);
        assert_eq!(field(&file.decls[1]).marker, FieldMarker::Required);
        assert!(field(&file.decls[2]).label.is_definition());
        assert!(field(&file.decls[3]).label.is_hidden());
        assert_eq!(field(&file.decls[4]).label.name, "x-y");
    }

    #[test]
    fn test_parse_operator_precedence() {
        let file = parse("a: *1 | int & >0").unwrap();
        let Expr::Binary { op, lhs, rhs, .. } = &field(&file.decls[0]).value else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Or);
        assert!(matches!(**lhs, Expr::Unary { op: UnaryOp::Default, .. }));
        assert!(matches!(**rhs, Expr::Binary { op: BinaryOp::And, .. }));
    }

    #[test]
    fn test_parse_selectors() {
        let file = parse("a: b.c[0]").unwrap();
        let Expr::Index { base, .. } = &field(&file.decls[0]).value else {
            panic!("expected index");
        };
        assert!(matches!(**base, Expr::Selector { .. }));
    }

    #[test]
    fn test_parse_attributes() {
        let file = parse("env: string @tag(env,type=string)").unwrap();
        let env = field(&file.decls[0]);
        let tag = env.attribute("tag").unwrap();
        assert_eq!(tag.body, "env,type=string");
    }

    #[test]
    fn test_parse_struct_multiline() {
        let file = parse("a: {\n\tb: 1\n}\nc: {d: 2}").unwrap();
        let Expr::Struct(a) = &field(&file.decls[0]).value else {
            panic!("expected struct");
        };
        assert!(a.multiline);
        let Expr::Struct(c) = &field(&file.decls[1]).value else {
            panic!("expected struct");
        };
        assert!(!c.multiline);
    }

    #[test]
    fn test_parse_comments_attach() {
        let input = "// leading\na: 1 // trailing\n\n// second\nb: 2\n// end\n";
        let file = parse(input).unwrap();
        assert_eq!(file.decls[0].comments[0].text, "// leading");
        assert_eq!(file.decls[0].trailing.as_ref().unwrap().text, "// trailing");
        assert_eq!(file.decls[1].comments[0].text, "// second");
        assert!(file.decls[1].blank_before);
        assert_eq!(file.trailing_comments[0].text, "// end");
    }

    #[test]
    fn test_parse_package_clause() {
        let file = parse("// pkg\npackage foo\n\nx: 1\n").unwrap();
        assert_eq!(file.package_name(), Some("foo"));
        assert_eq!(file.package.as_ref().unwrap().comments.len(), 1);
    }

    #[test]
    fn test_parse_literals() {
        let file = parse("a: null\nb: true\nc: 1_000\nd: -1.5e3\ne: 'xy'\nf: _\ng: _|_").unwrap();
        let kinds: Vec<LitKind> = file
            .decls
            .iter()
            .map(|d| match &field(d).value {
                Expr::Lit(lit) => lit.kind,
                other => panic!("expected literal, got {:?}", other),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                LitKind::Null,
                LitKind::Bool,
                LitKind::Int,
                LitKind::Float,
                LitKind::Bytes,
                LitKind::Top,
                LitKind::Bottom
            ]
        );
    }

    #[test]
    fn test_syntax_error_position() {
        let err = parse_file(Some("/bad.cue"), "a: 1\nb: ;").unwrap_err();
        assert_eq!(err.pos.line, 2);
        assert_eq!(err.pos.column, 4);
        assert!(err.message.starts_with("expected"));
        let structured = err.to_structured();
        assert_eq!(structured.kind, ErrorKind::Syntax);
        assert_eq!(structured.file, "/bad.cue");
        assert_eq!(structured.line, 2);
    }

    #[test]
    fn test_invalid_escape_is_syntax_error() {
        let err = parse("a: \"\\q\"").unwrap_err();
        assert!(err.message.contains("escape"));
        assert_eq!(err.pos.column, 4);
    }
}
