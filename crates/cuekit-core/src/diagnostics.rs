//! Structured errors for cuekit
//!
//! Every failure produced by the engine is normalized into a
//! [`StructuredError`] before it leaves the library: one message plus an
//! optional position. Engine crates describe their failures as a list of
//! [`PositionedError`]s and implement [`Report`]; [`report`] is the single
//! place where such a failure is turned into the outward shape.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use cuekit_ast::Pos;
use serde::{Deserialize, Serialize};

/// Classification of a failure, kept for Rust callers
///
/// The kind is never serialized: hosts only see the message and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorKind {
    /// Malformed document text
    Syntax,
    /// Unification reached bottom
    Conflict,
    /// A value required to be concrete is not
    Incomplete,
    /// A name that is declared nowhere
    Reference,
    /// Export requested for an unknown target
    UnsupportedFormat,
    /// Documents or tags could not be loaded
    Load,
    /// Operation unsupported by the active build variant
    Capability,
    /// Anything else, such as a malformed host request
    #[default]
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Incomplete => "incomplete value",
            ErrorKind::Reference => "reference error",
            ErrorKind::UnsupportedFormat => "unsupported format",
            ErrorKind::Load => "load error",
            ErrorKind::Capability => "capability error",
            ErrorKind::Internal => "internal error",
        };
        f.write_str(name)
    }
}

/// The error shape handed to callers
///
/// Zero or empty positional fields are omitted from the JSON form:
///
/// ```
/// use cuekit_core::diagnostics::{ErrorKind, StructuredError};
///
/// let err = StructuredError::new(ErrorKind::Conflict, "a: conflicting values 2 and 1")
///     .with_file("/b.cue")
///     .with_position(1, 4);
/// assert_eq!(
///     err.to_json(),
///     r#"{"message":"a: conflicting values 2 and 1","line":1,"column":4,"file":"/b.cue"}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredError {
    pub message: String,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub line: usize,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub column: usize,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,

    #[serde(skip)]
    pub kind: ErrorKind,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl StructuredError {
    /// Create an error without a position
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: 0,
            column: 0,
            file: String::new(),
            kind,
        }
    }

    /// Set the file path
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }

    /// Set line and column
    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    /// Set the position from a source location
    pub fn with_location(mut self, location: &Location) -> Self {
        if location.pos.is_valid() {
            self.line = location.pos.line;
            self.column = location.pos.column;
        }
        if let Some(file) = &location.file {
            self.file = file.to_string();
        }
        self
    }

    /// Whether a line/column position is attached
    pub fn has_position(&self) -> bool {
        self.line > 0
    }

    /// Serialize to the wire form
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!("{{\"message\":{:?}}}", self.message)
        })
    }

    /// Parse the wire form back (the kind is lost)
    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }

    /// Human-readable rendering: `file:line:column: message`
    pub fn to_human(&self) -> String {
        let mut out = String::new();
        if !self.file.is_empty() {
            out.push_str(&self.file);
            out.push(':');
        }
        if self.has_position() {
            out.push_str(&format!("{}:{}: ", self.line, self.column));
        } else if !self.file.is_empty() {
            out.push(' ');
        }
        out.push_str(&self.message);
        out
    }
}

impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

impl std::error::Error for StructuredError {}

/// A position inside a named document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Location {
    pub file: Option<Arc<str>>,
    pub pos: Pos,
}

impl Location {
    pub fn new(file: Option<Arc<str>>, pos: Pos) -> Self {
        Self { file, pos }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}", file, self.pos),
            None => write!(f, "{}", self.pos),
        }
    }
}

/// A message template with positional `{}` arguments
///
/// Arguments are kept apart from the template until rendering so that
/// conflicts can be compared and re-worded without string surgery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    pub template: Cow<'static, str>,
    pub args: Vec<String>,
}

impl Message {
    pub fn new(template: impl Into<Cow<'static, str>>, args: Vec<String>) -> Self {
        Self {
            template: template.into(),
            args,
        }
    }

    /// A message without arguments
    pub fn plain(text: impl Into<Cow<'static, str>>) -> Self {
        Self::new(text, Vec::new())
    }

    /// Substitute the arguments into the template, in order
    ///
    /// Missing arguments leave their `{}` in place; extra ones are ignored.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.template.len());
        let mut args = self.args.iter();
        let mut rest: &str = &self.template;
        while let Some(idx) = rest.find("{}") {
            out.push_str(&rest[..idx]);
            match args.next() {
                Some(arg) => out.push_str(arg),
                None => out.push_str("{}"),
            }
            rest = &rest[idx + 2..];
        }
        out.push_str(rest);
        out
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// One failure at a path in the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedError {
    pub kind: ErrorKind,
    /// Field path from the root, outermost first
    pub path: Vec<String>,
    pub message: Message,
    /// Source positions involved, most relevant first
    pub positions: Vec<Location>,
}

impl PositionedError {
    pub fn new(kind: ErrorKind, message: Message) -> Self {
        Self {
            kind,
            path: Vec::new(),
            message,
            positions: Vec::new(),
        }
    }

    pub fn with_path(mut self, path: Vec<String>) -> Self {
        self.path = path;
        self
    }

    pub fn with_positions(mut self, positions: Vec<Location>) -> Self {
        self.positions = positions;
        self
    }

    /// Render as `path: message`
    pub fn render(&self) -> String {
        if self.path.is_empty() {
            self.message.render()
        } else {
            format!("{}: {}", self.path.join("."), self.message.render())
        }
    }

    /// First valid position, if any
    pub fn location(&self) -> Option<&Location> {
        self.positions.iter().find(|l| l.pos.is_valid())
    }

    /// Normalize into the outward shape
    pub fn to_structured(&self) -> StructuredError {
        let err = StructuredError::new(self.kind, self.render());
        match self.location() {
            Some(location) => err.with_location(location),
            None => err,
        }
    }
}

impl fmt::Display for PositionedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// A failure that can be normalized into a [`StructuredError`]
pub trait Report {
    /// Classification used when no positioned error is available
    fn kind(&self) -> ErrorKind;

    /// Positioned sub-errors, in discovery order
    fn positioned(&self) -> Cow<'_, [PositionedError]> {
        Cow::Borrowed(&[])
    }

    /// Fallback message when there are no positioned sub-errors
    fn plain_message(&self) -> String;
}

/// Normalize a failure: the first positioned sub-error wins, otherwise the
/// plain message without a position
pub fn report<E: Report + ?Sized>(err: &E) -> StructuredError {
    match err.positioned().first() {
        Some(first) => first.to_structured(),
        None => StructuredError::new(err.kind(), err.plain_message()),
    }
}

impl Report for StructuredError {
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    fn plain_message(&self) -> String {
        self.message.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Aggregate(Vec<PositionedError>);

    impl Report for Aggregate {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Conflict
        }

        fn positioned(&self) -> Cow<'_, [PositionedError]> {
            Cow::Borrowed(&self.0)
        }

        fn plain_message(&self) -> String {
            "aggregate failure".to_string()
        }
    }

    #[test]
    fn test_omits_empty_positions() {
        let err = StructuredError::new(ErrorKind::Load, "failed to load instances");
        assert_eq!(err.to_json(), r#"{"message":"failed to load instances"}"#);
    }

    #[test]
    fn test_display_is_json() {
        let err = StructuredError::new(ErrorKind::Syntax, "expected expression")
            .with_position(1, 4);
        assert_eq!(
            err.to_string(),
            r#"{"message":"expected expression","line":1,"column":4}"#
        );
    }

    #[test]
    fn test_from_json_roundtrip() {
        let err = StructuredError::new(ErrorKind::Conflict, "x")
            .with_file("/a.cue")
            .with_position(3, 2);
        let back = StructuredError::from_json(&err.to_json()).unwrap();
        assert_eq!(back.message, "x");
        assert_eq!(back.line, 3);
        assert_eq!(back.file, "/a.cue");
        assert_eq!(back.kind, ErrorKind::Internal);
    }

    #[test]
    fn test_message_render() {
        let msg = Message::new(
            "conflicting values {} and {}",
            vec!["1".to_string(), "2".to_string()],
        );
        assert_eq!(msg.render(), "conflicting values 1 and 2");
        assert_eq!(Message::new("{} and {}", vec!["x".into()]).render(), "x and {}");
    }

    #[test]
    fn test_report_selects_first_positioned() {
        let first = PositionedError::new(
            ErrorKind::Conflict,
            Message::new("conflicting values {} and {}", vec!["2".into(), "1".into()]),
        )
        .with_path(vec!["a".to_string()])
        .with_positions(vec![Location::new(Some("/b.cue".into()), Pos::new(3, 1, 4))]);
        let second = PositionedError::new(ErrorKind::Conflict, Message::plain("other"));

        let err = report(&Aggregate(vec![first, second]));
        assert_eq!(err.message, "a: conflicting values 2 and 1");
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 4);
        assert_eq!(err.file, "/b.cue");
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[test]
    fn test_report_falls_back_to_plain_message() {
        let err = report(&Aggregate(Vec::new()));
        assert_eq!(err.message, "aggregate failure");
        assert!(!err.has_position());
    }

    #[test]
    fn test_to_human() {
        let err = StructuredError::new(ErrorKind::Incomplete, "a: incomplete value string")
            .with_file("x.cue")
            .with_position(2, 4);
        assert_eq!(err.to_human(), "x.cue:2:4: a: incomplete value string");
        let bare = StructuredError::new(ErrorKind::Load, "no documents");
        assert_eq!(bare.to_human(), "no documents");
    }
}
