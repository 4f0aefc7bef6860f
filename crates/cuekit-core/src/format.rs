//! Canonical formatter
//!
//! Re-renders a syntax tree in the canonical layout: tab indentation, one
//! declaration per line at file level, values of consecutive single-line
//! fields aligned, single-line structs and lists kept on one line, and
//! comments plus single blank lines preserved. Formatting is idempotent.
//!
//! # Example
//!
//! ```
//! use cuekit_core::format_source;
//!
//! let out = format_source("a: 1\nlonger: {x: 1, y: 2}").unwrap();
//! assert_eq!(out, "a:      1\nlonger: {x: 1, y: 2}\n");
//! ```

use cuekit_ast::{
    BinaryOp, Comment, Decl, DeclKind, Expr, Field, ListElem, ListLit, SourceFile, StructLit,
};

use crate::parser::{self, SyntaxError};

/// Formatter configuration
#[derive(Debug, Clone)]
pub struct FormatConfig {
    /// Indentation unit
    pub indent: String,
    /// Align the values of consecutive single-line fields
    pub align_fields: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indent: "\t".to_string(),
            align_fields: true,
        }
    }
}

/// Canonical formatter
pub struct Formatter {
    config: FormatConfig,
    output: String,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    /// Create a new formatter with default configuration
    pub fn new() -> Self {
        Self::with_config(FormatConfig::default())
    }

    /// Create a formatter with custom configuration
    pub fn with_config(config: FormatConfig) -> Self {
        Self {
            config,
            output: String::new(),
        }
    }

    /// Render a whole file
    pub fn format_file(&mut self, file: &SourceFile) -> String {
        self.output.clear();

        if let Some(package) = &file.package {
            self.comments(&package.comments, 0);
            self.output.push_str("package ");
            self.output.push_str(&package.name.name);
            self.output.push('\n');
            if !file.decls.is_empty() || !file.trailing_comments.is_empty() {
                self.output.push('\n');
            }
        }

        self.decls(&file.decls, 0);
        self.comments(&file.trailing_comments, 0);

        std::mem::take(&mut self.output)
    }

    /// Render a single expression starting at indentation depth zero
    pub fn format_expr(&mut self, expr: &Expr) -> String {
        self.expr(expr, 0)
    }

    fn indent(&self, depth: usize) -> String {
        self.config.indent.repeat(depth)
    }

    fn comments(&mut self, comments: &[Comment], depth: usize) {
        for comment in comments {
            let indent = self.indent(depth);
            self.output.push_str(&indent);
            self.output.push_str(&comment.text);
            self.output.push('\n');
        }
    }

    /// Write declarations one per line, aligning runs of simple fields
    fn decls(&mut self, decls: &[Decl], depth: usize) {
        let mut i = 0;
        while i < decls.len() {
            let mut end = i + 1;
            let mut width = 0;
            if self.config.align_fields && is_alignable(&decls[i]) {
                width = label_width(&decls[i]);
                while end < decls.len()
                    && is_alignable(&decls[end])
                    && !decls[end].blank_before
                    && decls[end].comments.is_empty()
                {
                    width = width.max(label_width(&decls[end]));
                    end += 1;
                }
            }
            for (offset, decl) in decls[i..end].iter().enumerate() {
                self.decl(decl, depth, width, i + offset > 0);
            }
            i = end;
        }
    }

    fn decl(&mut self, decl: &Decl, depth: usize, width: usize, allow_blank: bool) {
        if allow_blank && decl.blank_before {
            self.output.push('\n');
        }
        self.comments(&decl.comments, depth);
        let indent = self.indent(depth);
        let body = self.decl_body(decl, depth, width);
        self.output.push_str(&indent);
        self.output.push_str(&body);
        if let Some(trailing) = &decl.trailing {
            self.output.push(' ');
            self.output.push_str(&trailing.text);
        }
        self.output.push('\n');
    }

    fn decl_body(&self, decl: &Decl, depth: usize, width: usize) -> String {
        match &decl.kind {
            DeclKind::Field(field) => self.field(field, depth, width),
            DeclKind::Embed(expr) => self.expr(expr, depth),
            DeclKind::Ellipsis { ty, .. } => match ty {
                Some(ty) => format!("...{}", self.expr(ty, depth)),
                None => "...".to_string(),
            },
            DeclKind::Attribute(attr) => format!("@{}({})", attr.name, attr.body),
        }
    }

    fn field(&self, field: &Field, depth: usize, width: usize) -> String {
        let head = field_head(field);
        let pad = " ".repeat(width.saturating_sub(head.chars().count()));
        let value = match shorthand_inner(&field.value) {
            Some(inner) => self.field(inner, depth, 0),
            None => self.expr(&field.value, depth),
        };
        let mut out = format!("{}{} {}", head, pad, value);
        for attr in &field.attributes {
            out.push_str(&format!(" @{}({})", attr.name, attr.body));
        }
        out
    }

    fn expr(&self, expr: &Expr, depth: usize) -> String {
        match expr {
            Expr::Lit(lit) => lit.raw.clone(),
            Expr::Ident(ident) => ident.name.clone(),
            Expr::Selector { base, label } => format!("{}.{}", self.expr(base, depth), label.raw),
            Expr::Index { base, index, .. } => {
                format!("{}[{}]", self.expr(base, depth), self.expr(index, depth))
            }
            Expr::Unary { op, operand, .. } => {
                format!("{}{}", op.token(), self.expr(operand, depth))
            }
            Expr::Binary { op, lhs, rhs, .. } => {
                let sep = match op {
                    BinaryOp::And => " & ",
                    BinaryOp::Or => " | ",
                };
                format!("{}{}{}", self.expr(lhs, depth), sep, self.expr(rhs, depth))
            }
            Expr::Paren { inner, .. } => format!("({})", self.expr(inner, depth)),
            Expr::Struct(lit) => self.struct_lit(lit, depth),
            Expr::List(list) => self.list_lit(list, depth),
        }
    }

    fn struct_lit(&self, lit: &StructLit, depth: usize) -> String {
        if lit.decls.is_empty() && lit.trailing_comments.is_empty() {
            return "{}".to_string();
        }
        let multiline = lit.multiline
            || !lit.trailing_comments.is_empty()
            || lit
                .decls
                .iter()
                .any(|d| d.is_multiline() || d.trailing.is_some());

        if !multiline {
            let parts: Vec<String> = lit
                .decls
                .iter()
                .map(|d| self.decl_body(d, depth, 0))
                .collect();
            return format!("{{{}}}", parts.join(", "));
        }

        let mut inner = Formatter::with_config(self.config.clone());
        inner.decls(&lit.decls, depth + 1);
        inner.comments(&lit.trailing_comments, depth + 1);
        format!("{{\n{}{}}}", inner.output, self.indent(depth))
    }

    fn list_lit(&self, list: &ListLit, depth: usize) -> String {
        if list.elems.is_empty() {
            return "[]".to_string();
        }
        let multiline = list.multiline
            || list.elems.iter().any(|e| match e {
                ListElem::Expr(expr) => expr.is_multiline(),
                ListElem::Ellipsis { ty, .. } => ty.as_ref().is_some_and(Expr::is_multiline),
            });

        if !multiline {
            let parts: Vec<String> = list
                .elems
                .iter()
                .map(|e| self.list_elem(e, depth))
                .collect();
            return format!("[{}]", parts.join(", "));
        }

        let indent = self.indent(depth + 1);
        let mut out = String::from("[\n");
        for elem in &list.elems {
            out.push_str(&indent);
            out.push_str(&self.list_elem(elem, depth + 1));
            out.push_str(",\n");
        }
        out.push_str(&self.indent(depth));
        out.push(']');
        out
    }

    fn list_elem(&self, elem: &ListElem, depth: usize) -> String {
        match elem {
            ListElem::Expr(expr) => self.expr(expr, depth),
            ListElem::Ellipsis { ty: Some(ty), .. } => format!("...{}", self.expr(ty, depth)),
            ListElem::Ellipsis { ty: None, .. } => "...".to_string(),
        }
    }
}

fn field_head(field: &Field) -> String {
    format!("{}{}:", field.label.raw, field.marker.token())
}

fn label_width(decl: &Decl) -> usize {
    match &decl.kind {
        DeclKind::Field(field) => field_head(field).chars().count(),
        _ => 0,
    }
}

fn is_alignable(decl: &Decl) -> bool {
    matches!(&decl.kind, DeclKind::Field(field) if !field.value.is_multiline())
}

/// The single field of an `a: b: 1` label chain
fn shorthand_inner(expr: &Expr) -> Option<&Field> {
    match expr {
        Expr::Struct(lit) if lit.shorthand && lit.decls.len() == 1 => {
            let decl = &lit.decls[0];
            match &decl.kind {
                DeclKind::Field(field) if decl.comments.is_empty() && decl.trailing.is_none() => {
                    Some(field)
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// Render a file with the default configuration
pub fn format_file(file: &SourceFile) -> String {
    Formatter::new().format_file(file)
}

/// Render an expression with the default configuration
pub fn format_expr(expr: &Expr) -> String {
    Formatter::new().format_expr(expr)
}

/// Parse and re-render document text
pub fn format_source(input: &str) -> Result<String, SyntaxError> {
    let file = parser::parse(input)?;
    Ok(format_file(&file))
}

/// Parse and re-render document text with a custom configuration
pub fn format_source_with_config(input: &str, config: FormatConfig) -> Result<String, SyntaxError> {
    let file = parser::parse(input)?;
    Ok(Formatter::with_config(config).format_file(&file))
}
