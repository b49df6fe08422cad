//! Error types for scanning, parsing and compiling filters.
//!
//! Three tiers are kept apart: lexing errors, parsing errors, and semantic
//! errors raised while compiling a filter tree against the catalog.

use crate::token::Span;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FilterError>;

/// An unrecognized character sequence in the filter text.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Lexing error: {message}")]
pub struct LexError {
    pub span: Span,
    pub message: String,
}

impl LexError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    pub fn offset(&self) -> usize {
        self.span.start
    }
}

/// What the parser was looking for when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    /// `(`, `~and`, `~or` or `~not`
    Clause,
    LParen,
    RParen,
    Comma,
    Field,
    Operator,
    Value,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Expected::Clause => "'(' or '~and' / '~or' / '~not'",
            Expected::LParen => "'('",
            Expected::RParen => "')'",
            Expected::Comma => "','",
            Expected::Field => "field name",
            Expected::Operator => "comparison operator",
            Expected::Value => "value",
        };
        f.write_str(s)
    }
}

/// A structural grammar violation.
///
/// Carries the expected token set, the token actually found (if any) and its
/// location, so callers can build a targeted message.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub expected: Vec<Expected>,
    pub found: Option<String>,
    pub span: Option<Span>,
}

impl ParseError {
    pub fn new(expected: Vec<Expected>, found: Option<String>, span: Option<Span>) -> Self {
        let wanted = expected
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(" or ");
        let message = match &found {
            Some(found) => format!("Expecting {wanted}, but found '{found}'"),
            None => format!("Expecting {wanted}, but reached end of input"),
        };
        Self {
            message,
            expected,
            found,
            span,
        }
    }

    pub fn offset(&self) -> Option<usize> {
        self.span.map(|s| s.start)
    }

    /// Translates the raw recognition failure into a user-facing message.
    ///
    /// Falls back to the raw message when no pattern matches.
    pub fn friendly_message(&self) -> String {
        let found = self.found.as_deref().unwrap_or("");
        if self.expected.contains(&Expected::Operator) {
            if found.is_empty() || found == ")" {
                return "expected a comparison operator".to_string();
            }
            return format!("'{found}' is not a recognized operator");
        }
        if self.expected == [Expected::Comma] {
            return "expected comma ',' followed with operator".to_string();
        }
        if self.expected.contains(&Expected::RParen) {
            return "expected a closing parentheses ')'".to_string();
        }
        if self.expected.contains(&Expected::LParen) {
            return "expected an opening parentheses '('".to_string();
        }
        self.message.clone()
    }
}

/// Errors raised by a metadata catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    #[error("no relation descriptor for column '{0}'")]
    RelationNotFound(String),

    #[error("model '{0}' not found")]
    ModelNotFound(String),

    #[error("many-to-many relation '{0}' has no junction table")]
    MissingJunction(String),

    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced by [`crate::parse_filter`] and the predicate compiler.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("{}", join_messages(.0))]
    Lex(Vec<LexError>),

    #[error("{}", join_parse_messages(.0))]
    Parse(Vec<ParseError>),

    #[error("field '{0}' not found")]
    FieldNotFound(String),

    #[error("'{op}' is not supported for fields of type {data_type}")]
    UnsupportedOperator { op: String, data_type: String },

    #[error("'{sub_op}' is not supported for '{op}'")]
    UnsupportedSubOperator { sub_op: String, op: String },

    #[error("'{op}' on field '{field}' requires a value")]
    MissingValue { op: String, field: String },

    #[error("invalid value '{value}' for field '{field}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("invalid filter group: {0}")]
    InvalidGroup(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl FilterError {
    /// Errors caused by the meaning of a single clause.
    ///
    /// In lenient mode these drop the offending clause; everything else
    /// aborts the compilation.
    pub fn is_semantic(&self) -> bool {
        matches!(
            self,
            FilterError::FieldNotFound(_)
                | FilterError::UnsupportedOperator { .. }
                | FilterError::UnsupportedSubOperator { .. }
                | FilterError::MissingValue { .. }
                | FilterError::InvalidValue { .. }
        )
    }
}

fn join_messages(errors: &[LexError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_parse_messages(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| match e.offset() {
            Some(offset) => format!("{} (at offset {offset})", e.friendly_message()),
            None => e.friendly_message(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
