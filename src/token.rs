//! The token definition for the filter language.

/// A token is a single unit of the language, with a specific kind and location.
///
/// `text` holds the token's value: for quoted identifiers it is the unescaped
/// content without the surrounding quotes, for everything else it is the raw
/// source slice.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    /// Byte offset of the first character of the token.
    pub fn offset(&self) -> usize {
        self.span.start
    }

    /// Tokens that may stand for a field name or a value.
    ///
    /// Operator and sub-operator words are included: the grammar position
    /// decides what a word means, so a column literally named `like` is still
    /// a valid field reference.
    pub fn is_word(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Identifier
                | TokenKind::QuotedIdentifier
                | TokenKind::Operator
                | TokenKind::SubOperator
        )
    }
}

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Words
    Identifier,
    QuotedIdentifier,
    Operator,    // eq, like, blank, ...
    SubOperator, // today, daysAgo, ...

    // Connectives
    LogicalAndOr(Connective), // ~and / ~or
    Not,                      // ~not

    // Punctuation
    LParen, // (
    RParen, // )
    Comma,  // ,
}

impl TokenKind {
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::QuotedIdentifier => "quoted identifier",
            TokenKind::Operator => "operator",
            TokenKind::SubOperator => "sub-operator",
            TokenKind::LogicalAndOr(Connective::And) => "'~and'",
            TokenKind::LogicalAndOr(Connective::Or) => "'~or'",
            TokenKind::Not => "'~not'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Comma => "','",
        }
    }
}

/// The binary connectives of the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connective {
    And,
    Or,
}

/// Comparison operator words, matched on whole words only.
pub const OPERATORS: &[&str] = &[
    "eq",
    "neq",
    "not",
    "like",
    "nlike",
    "empty",
    "notempty",
    "null",
    "notnull",
    "checked",
    "notchecked",
    "blank",
    "notblank",
    "allof",
    "anyof",
    "nallof",
    "nanyof",
    "gt",
    "lt",
    "gte",
    "lte",
    "ge",
    "le",
    "in",
    "isnot",
    "is",
    "isWithin",
    "btw",
    "nbtw",
    "gb_eq",
    "gb_null",
    "isblank",
    "is_blank",
    "isnotblank",
    "is_not_blank",
    "is_notblank",
];

/// Date-relative sub-operator words, matched on whole words only.
pub const SUB_OPERATORS: &[&str] = &[
    "today",
    "tomorrow",
    "yesterday",
    "oneWeekAgo",
    "oneWeekFromNow",
    "oneMonthAgo",
    "oneMonthFromNow",
    "daysAgo",
    "daysFromNow",
    "exactDate",
    "pastWeek",
    "pastMonth",
    "pastYear",
    "nextWeek",
    "nextMonth",
    "nextYear",
    "pastNumberOfDays",
    "nextNumberOfDays",
];

/// Represents a span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// The starting byte offset.
    pub start: usize,
    /// The ending byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}
