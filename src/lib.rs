//! Filter text and filter trees compiled into SQL predicates.
//!
//! ```text
//! "(title,eq,x)~or(amount,gt,5)"
//!   -> lexer::scan -> parser::parse -> mapper::map -> FilterNode
//!   -> compiler::PredicateCompiler (+ Catalog, Dialect) -> sea-query condition
//! ```

pub mod ast;
pub mod catalog;
pub mod compiler;
pub mod config;
pub mod dialect;
pub mod error;
pub mod filter;
pub mod lexer;
pub mod mapper;
pub mod parser;
pub mod token;

pub use catalog::{Catalog, MemoryCatalog};
pub use compiler::{CompileOptions, CompileOutput, DroppedClause, Predicate, PredicateCompiler};
pub use dialect::{Dialect, DialectKind};
pub use error::{FilterError, Result};
pub use filter::{FilterClause, FilterGroup, FilterNode};

/// Parses filter text into a normalized filter tree.
///
/// Lexing errors are reported before parsing errors; the parser only runs on
/// a cleanly scanned input.
pub fn parse_filter(text: &str) -> Result<FilterNode> {
    let (tokens, lex_errors) = lexer::scan(text);
    if !lex_errors.is_empty() {
        return Err(FilterError::Lex(lex_errors));
    }

    let (filter, parse_errors) = parser::parse(&tokens);
    if !parse_errors.is_empty() {
        return Err(FilterError::Parse(parse_errors));
    }
    let filter = filter.ok_or_else(|| FilterError::Parse(Vec::new()))?;

    mapper::map(&filter).map_err(|e| FilterError::Parse(vec![e]))
}
