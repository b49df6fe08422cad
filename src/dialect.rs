//! Dialect adapters supplying the raw SQL fragments that differ between
//! backends.
//!
//! Everything the builder can express portably goes through `sea-query`
//! directly; an adapter only covers case-sensitivity, date truncation,
//! delimited-list containment and the final rendering.

use sea_query::{
    Expr, MysqlQueryBuilder, PostgresQueryBuilder, SelectStatement, SimpleExpr,
    SqliteQueryBuilder,
};
use serde::{Deserialize, Serialize};

pub trait Dialect: Send + Sync {
    /// Returns the name of the dialect (e.g. "PostgreSQL", "MySQL").
    fn name(&self) -> &'static str;

    /// Wraps an identifier in the dialect's quotation marks.
    ///
    /// - PostgreSQL and SQLite use double quotes: `"my_column"`
    /// - MySQL uses backticks: `` `my_column` ``
    fn quote_identifier(&self, ident: &str) -> String;

    /// Case-sensitive equality for text values.
    fn text_eq(&self, lhs: SimpleExpr, rhs: SimpleExpr) -> SimpleExpr {
        Expr::expr(lhs).eq(rhs)
    }

    /// The date part of a timestamp.
    fn date_of(&self, lhs: SimpleExpr) -> SimpleExpr;

    /// Compares the date part of a timestamp with a date.
    fn date_eq(&self, lhs: SimpleExpr, rhs: SimpleExpr) -> SimpleExpr;

    /// Equality on a JSON column against a JSON literal.
    fn json_eq(&self, lhs: SimpleExpr, json: &str) -> SimpleExpr {
        Expr::expr(lhs).eq(json)
    }

    /// Case-insensitive pattern match; `pattern` already carries wildcards.
    fn like(&self, lhs: SimpleExpr, pattern: String) -> SimpleExpr {
        Expr::expr(lhs).like(pattern)
    }

    /// Tests whether a comma separated list value contains `item`.
    fn delimited_contains(&self, lhs: SimpleExpr, item: &str) -> SimpleExpr;

    /// A timestamp literal that carries an explicit UTC offset.
    fn timestamp_with_offset(&self, value: &str) -> SimpleExpr {
        Expr::val(value).into()
    }

    /// Renders a complete statement with inlined values.
    fn render(&self, select: &SelectStatement) -> String;
}

fn delimited_pattern(item: &str) -> SimpleExpr {
    Expr::val(format!("%,{item},%")).into()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{}""#, ident.replace('"', "\"\""))
    }

    fn date_of(&self, lhs: SimpleExpr) -> SimpleExpr {
        Expr::cust_with_exprs("$1::date", [lhs])
    }

    fn date_eq(&self, lhs: SimpleExpr, rhs: SimpleExpr) -> SimpleExpr {
        Expr::cust_with_exprs("$1::date = $2", [lhs, rhs])
    }

    fn json_eq(&self, lhs: SimpleExpr, json: &str) -> SimpleExpr {
        Expr::cust_with_exprs("$1::jsonb = $2::jsonb", [lhs, Expr::val(json).into()])
    }

    fn like(&self, lhs: SimpleExpr, pattern: String) -> SimpleExpr {
        Expr::cust_with_exprs("$1::text ILIKE $2", [lhs, Expr::val(pattern).into()])
    }

    fn delimited_contains(&self, lhs: SimpleExpr, item: &str) -> SimpleExpr {
        Expr::cust_with_exprs(
            "(',' || $1::text || ',') ILIKE $2",
            [lhs, delimited_pattern(item)],
        )
    }

    fn timestamp_with_offset(&self, value: &str) -> SimpleExpr {
        Expr::cust_with_exprs("$1::timestamptz", [Expr::val(value).into()])
    }

    fn render(&self, select: &SelectStatement) -> String {
        select.to_string(PostgresQueryBuilder)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "MySQL"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn text_eq(&self, lhs: SimpleExpr, rhs: SimpleExpr) -> SimpleExpr {
        // 默认排序规则不区分大小写
        Expr::cust_with_exprs("BINARY $1 = $2", [lhs, rhs])
    }

    fn date_of(&self, lhs: SimpleExpr) -> SimpleExpr {
        Expr::cust_with_exprs("DATE($1)", [lhs])
    }

    fn date_eq(&self, lhs: SimpleExpr, rhs: SimpleExpr) -> SimpleExpr {
        Expr::cust_with_exprs("DATE($1) = DATE($2)", [lhs, rhs])
    }

    fn delimited_contains(&self, lhs: SimpleExpr, item: &str) -> SimpleExpr {
        Expr::cust_with_exprs("CONCAT(',', $1, ',') LIKE $2", [lhs, delimited_pattern(item)])
    }

    fn render(&self, select: &SelectStatement) -> String {
        select.to_string(MysqlQueryBuilder)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "SQLite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!(r#""{}""#, ident.replace('"', "\"\""))
    }

    fn date_of(&self, lhs: SimpleExpr) -> SimpleExpr {
        Expr::cust_with_exprs("DATE($1)", [lhs])
    }

    fn date_eq(&self, lhs: SimpleExpr, rhs: SimpleExpr) -> SimpleExpr {
        Expr::cust_with_exprs("DATE($1) = DATE($2)", [lhs, rhs])
    }

    fn delimited_contains(&self, lhs: SimpleExpr, item: &str) -> SimpleExpr {
        Expr::cust_with_exprs("(',' || $1 || ',') LIKE $2", [lhs, delimited_pattern(item)])
    }

    fn render(&self, select: &SelectStatement) -> String {
        select.to_string(SqliteQueryBuilder)
    }
}

/// Dialect selector used by configuration and the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Postgres,
    Mysql,
    Sqlite,
}

static POSTGRES: Postgres = Postgres;
static MYSQL: MySql = MySql;
static SQLITE: Sqlite = Sqlite;

impl DialectKind {
    pub fn adapter(&self) -> &'static dyn Dialect {
        match self {
            DialectKind::Postgres => &POSTGRES,
            DialectKind::Mysql => &MYSQL,
            DialectKind::Sqlite => &SQLITE,
        }
    }
}
