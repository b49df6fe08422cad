//! Comparison of a single value expression against a filter clause.
//!
//! Used directly for plain columns and, with the select expression as the
//! left-hand side, for rollups, formulas and the terminal column of a lookup
//! chain.

use super::{dates, Context, Ident};
use crate::catalog::{Column, DataType};
use crate::error::{FilterError, Result};
use crate::filter::{ComparisonOp, ComparisonSubOp, FilterClause, FilterValue};
use sea_query::{Expr, SimpleExpr};
use std::borrow::Cow;

/// The left-hand side of a comparison together with the type information
/// that drives value coercion.
#[derive(Debug, Clone)]
pub(crate) struct Target {
    pub expr: SimpleExpr,
    pub data_type: DataType,
    pub date_format: Option<String>,
    /// Formula whose result is a string; `blank` then also matches `''`.
    pub string_formula: bool,
    /// Name used in error messages.
    pub label: String,
}

impl Target {
    pub fn column(column: &Column, alias: Option<&str>) -> Self {
        Self {
            expr: column_expr(&column.column_name, alias),
            data_type: column.data_type,
            date_format: column.date_format.clone(),
            string_formula: false,
            label: column.label().to_string(),
        }
    }

    pub fn expression(expr: SimpleExpr, data_type: DataType, label: impl Into<String>) -> Self {
        Self {
            expr,
            data_type,
            date_format: None,
            string_formula: false,
            label: label.into(),
        }
    }

    fn col(&self) -> Expr {
        Expr::expr(self.expr.clone())
    }

    /// The date part when the target carries a time of day.
    fn day(&self, ctx: &Context<'_>) -> Expr {
        if self.data_type.is_datetime() {
            Expr::expr(ctx.dialect.date_of(self.expr.clone()))
        } else {
            self.col()
        }
    }

    fn is_null(&self) -> SimpleExpr {
        self.col().is_null()
    }

    fn is_not_null(&self) -> SimpleExpr {
        self.col().is_not_null()
    }

    fn month_granular(&self) -> bool {
        self.date_format.as_deref() == Some(dates::MONTH_FORMAT)
    }

    fn matches_empty_string(&self) -> bool {
        self.string_formula || self.data_type.is_textual()
    }
}

/// `alias.column`, or the bare column when compiling at the root.
pub(crate) fn column_expr(column_name: &str, alias: Option<&str>) -> SimpleExpr {
    match alias {
        Some(alias) => Expr::col((Ident::new(alias), Ident::new(column_name))).into(),
        None => Expr::col(Ident::new(column_name)).into(),
    }
}

/// Compiles `clause` against `target`.
///
/// `Ok(None)` means the clause places no constraint (an `anyof` with no
/// items, for example).
pub(crate) fn compare(
    ctx: &Context<'_>,
    target: &Target,
    clause: &FilterClause,
) -> Result<Option<SimpleExpr>> {
    let op = match clause.comparison_op {
        ComparisonOp::GbEq => ComparisonOp::Eq,
        ComparisonOp::GbNull => ComparisonOp::Blank,
        op => op,
    };
    let clause = &sub_op_as_text(target, op, clause);
    validate(target, op, clause.comparison_sub_op)?;

    let value = resolve_value(ctx, target, op, clause)?;
    let value = value.as_deref();
    check_numeric(target, op, value)?;
    let dialect = ctx.dialect;

    let expr = match op {
        ComparisonOp::Eq => Some(equals(ctx, target, value.unwrap_or(""))),
        ComparisonOp::Neq | ComparisonOp::Not => {
            Some(not_equals(ctx, target, value.unwrap_or("")))
        }
        ComparisonOp::Like | ComparisonOp::Nlike => {
            Some(like(ctx, target, value.unwrap_or(""), op == ComparisonOp::Nlike))
        }
        ComparisonOp::AllOf | ComparisonOp::AnyOf | ComparisonOp::NAllOf | ComparisonOp::NAnyOf => {
            let items: Vec<&str> = value
                .unwrap_or("")
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .collect();
            let all = matches!(op, ComparisonOp::AllOf | ComparisonOp::NAllOf);
            let contained = items
                .into_iter()
                .map(|item| dialect.delimited_contains(target.expr.clone(), item))
                .reduce(|acc, e| if all { acc.and(e) } else { acc.or(e) });
            match contained {
                Some(e) if matches!(op, ComparisonOp::NAllOf | ComparisonOp::NAnyOf) => {
                    Some(e.not().or(target.is_null()))
                }
                other => other,
            }
        }
        ComparisonOp::Gt
        | ComparisonOp::Lt
        | ComparisonOp::Gte
        | ComparisonOp::Ge
        | ComparisonOp::Lte
        | ComparisonOp::Le => Some(ordering(ctx, target, op, value)?),
        ComparisonOp::In => {
            let items = match &clause.value {
                Some(FilterValue::List(items)) => items.clone(),
                _ => value
                    .map(|v| v.split(',').map(str::to_string).collect())
                    .unwrap_or_default(),
            };
            if items.is_empty() {
                None
            } else {
                let literals = items
                    .iter()
                    .map(|item| literal(target, item))
                    .collect::<Vec<_>>();
                Some(target.col().is_in(literals))
            }
        }
        ComparisonOp::Is | ComparisonOp::IsNot => Some(is_form(target, op, clause)?),
        ComparisonOp::Empty => Some(target.col().eq("")),
        ComparisonOp::NotEmpty => Some(target.col().ne("").or(target.is_null())),
        ComparisonOp::Null => Some(target.is_null()),
        ComparisonOp::NotNull => Some(target.is_not_null()),
        ComparisonOp::Blank => Some(blank(ctx, target)),
        ComparisonOp::NotBlank => Some(not_blank(ctx, target)),
        ComparisonOp::Checked => Some(target.col().eq(true)),
        ComparisonOp::NotChecked => Some(target.is_null().or(target.col().eq(false))),
        ComparisonOp::Btw | ComparisonOp::Nbtw => {
            let bounds: Vec<&str> = match &clause.value {
                Some(FilterValue::List(items)) => items.iter().map(String::as_str).collect(),
                _ => value.map(|v| v.split(',').collect()).unwrap_or_default(),
            };
            let [low, high] = bounds.as_slice() else {
                return Err(invalid(target, value.unwrap_or(""), "expected two values"));
            };
            let (low, high) = (literal(target, low.trim()), literal(target, high.trim()));
            Some(if op == ComparisonOp::Btw {
                target.col().between(low, high)
            } else {
                target.col().not_between(low, high)
            })
        }
        ComparisonOp::IsWithin => {
            let bound = value.unwrap_or("").to_string();
            let now = dates::today(ctx.now, false)
                .format(dates::DATE_FORMAT)
                .to_string();
            let past = matches!(
                clause.comparison_sub_op,
                Some(
                    ComparisonSubOp::PastWeek
                        | ComparisonSubOp::PastMonth
                        | ComparisonSubOp::PastYear
                        | ComparisonSubOp::PastNumberOfDays
                )
            );
            Some(if past {
                target.day(ctx).between(bound, now)
            } else {
                target.day(ctx).between(now, bound)
            })
        }
        ComparisonOp::GbEq | ComparisonOp::GbNull => None,
    };
    Ok(expr)
}

/// A sub-operator word given as the only argument on a non-date column is
/// the value itself: `(Note,eq,today)` compares against the text `today`.
fn sub_op_as_text<'c>(
    target: &Target,
    op: ComparisonOp,
    clause: &'c FilterClause,
) -> Cow<'c, FilterClause> {
    match clause.comparison_sub_op {
        Some(sub_op)
            if !target.data_type.is_date()
                && op != ComparisonOp::IsWithin
                && clause.value.is_none() =>
        {
            Cow::Owned(FilterClause {
                comparison_sub_op: None,
                value: Some(FilterValue::text(sub_op.to_string())),
                ..clause.clone()
            })
        }
        _ => Cow::Borrowed(clause),
    }
}

/// Rejects operator, sub-operator and type combinations that have no meaning.
fn validate(target: &Target, op: ComparisonOp, sub_op: Option<ComparisonSubOp>) -> Result<()> {
    if let Some(sub_op) = sub_op {
        let accepts_sub_op = matches!(
            op,
            ComparisonOp::Eq
                | ComparisonOp::Neq
                | ComparisonOp::Not
                | ComparisonOp::Gt
                | ComparisonOp::Lt
                | ComparisonOp::Gte
                | ComparisonOp::Ge
                | ComparisonOp::Lte
                | ComparisonOp::Le
                | ComparisonOp::IsWithin
        );
        if !target.data_type.is_date()
            || !accepts_sub_op
            || sub_op.is_within_range() != (op == ComparisonOp::IsWithin)
        {
            return Err(FilterError::UnsupportedSubOperator {
                sub_op: sub_op.to_string(),
                op: op.to_string(),
            });
        }
    }

    let supported = match op {
        ComparisonOp::IsWithin => target.data_type.is_date(),
        ComparisonOp::AllOf | ComparisonOp::AnyOf | ComparisonOp::NAllOf | ComparisonOp::NAnyOf => {
            target.data_type.is_textual()
        }
        ComparisonOp::Checked | ComparisonOp::NotChecked => {
            target.data_type == DataType::Checkbox
        }
        ComparisonOp::Gt
        | ComparisonOp::Lt
        | ComparisonOp::Gte
        | ComparisonOp::Ge
        | ComparisonOp::Lte
        | ComparisonOp::Le
        | ComparisonOp::Btw
        | ComparisonOp::Nbtw => !matches!(
            target.data_type,
            DataType::Json | DataType::Attachment | DataType::Checkbox
        ),
        _ => true,
    };
    if !supported {
        return Err(FilterError::UnsupportedOperator {
            op: op.to_string(),
            data_type: target.data_type.to_string(),
        });
    }

    if op == ComparisonOp::IsWithin && sub_op.is_none() {
        return Err(FilterError::MissingValue {
            op: op.to_string(),
            field: target.label.clone(),
        });
    }
    Ok(())
}

/// The effective comparison value: date sub-operators are resolved against
/// "now", month-granular dates are moved to the first of the month.
fn resolve_value(
    ctx: &Context<'_>,
    target: &Target,
    op: ComparisonOp,
    clause: &FilterClause,
) -> Result<Option<String>> {
    let raw = clause.value_text();
    if !target.data_type.is_date() {
        return Ok(raw);
    }
    if let Some(sub_op) = clause.comparison_sub_op {
        let resolved = dates::resolve(
            sub_op,
            raw.as_deref(),
            ctx.now,
            target.month_granular(),
            &target.label,
        )?;
        return Ok(Some(resolved));
    }
    match raw {
        Some(value)
            if target.month_granular()
                && !value.is_empty()
                && !matches!(op, ComparisonOp::Is | ComparisonOp::IsNot) =>
        {
            dates::month_start(&target.label, &value).map(Some)
        }
        other => Ok(other),
    }
}

/// A literal for `value`, numeric when the target is numeric and the text
/// parses as a number.
fn literal(target: &Target, value: &str) -> SimpleExpr {
    if target.data_type.is_numeric() {
        if let Some(number) = number(value) {
            return number;
        }
    }
    Expr::val(value).into()
}

fn number(value: &str) -> Option<SimpleExpr> {
    let value = value.trim();
    if let Ok(int) = value.parse::<i64>() {
        return Some(Expr::val(int).into());
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| Expr::val(f).into())
}

/// Values compared against numeric columns must be numbers.
fn check_numeric(target: &Target, op: ComparisonOp, value: Option<&str>) -> Result<()> {
    if !target.data_type.is_numeric() {
        return Ok(());
    }
    let items: Vec<&str> = match op {
        ComparisonOp::Eq | ComparisonOp::Neq | ComparisonOp::Not => value.into_iter().collect(),
        ComparisonOp::In | ComparisonOp::Btw | ComparisonOp::Nbtw => {
            value.map(|v| v.split(',').collect()).unwrap_or_default()
        }
        _ => return Ok(()),
    };
    match items
        .into_iter()
        .map(str::trim)
        .find(|item| !item.is_empty() && number(item).is_none())
    {
        Some(bad) => Err(invalid(target, bad, "expected a number")),
        None => Ok(()),
    }
}

fn is_zero(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok_and(|n| n == 0.0)
}

fn is_positive(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok_and(|n| n > 0.0)
}

fn json_blank(ctx: &Context<'_>, target: &Target) -> SimpleExpr {
    ctx.dialect
        .json_eq(target.expr.clone(), "{}")
        .or(ctx.dialect.json_eq(target.expr.clone(), "[]"))
}

fn equals(ctx: &Context<'_>, target: &Target, value: &str) -> SimpleExpr {
    let dialect = ctx.dialect;
    match target.data_type {
        DataType::Json if value.is_empty() => json_blank(ctx, target).or(target.is_null()),
        DataType::Json => dialect.json_eq(target.expr.clone(), value),
        _ if value.is_empty() && !target.matches_empty_string() => target.is_null(),
        t if t.is_datetime() => dialect.date_eq(target.expr.clone(), Expr::val(value).into()),
        t if t.is_textual() || target.string_formula => {
            dialect.text_eq(target.expr.clone(), Expr::val(value).into())
        }
        DataType::Rating if is_zero(value) => {
            target.col().eq(literal(target, value)).or(target.is_null())
        }
        _ => target.col().eq(literal(target, value)),
    }
}

fn not_equals(ctx: &Context<'_>, target: &Target, value: &str) -> SimpleExpr {
    let dialect = ctx.dialect;
    match target.data_type {
        DataType::Json if value.is_empty() => json_blank(ctx, target).not().or(target.is_null()),
        DataType::Json => dialect
            .json_eq(target.expr.clone(), value)
            .not()
            .or(target.is_null()),
        _ if value.is_empty() && !target.matches_empty_string() => target.is_not_null(),
        t if t.is_datetime() => dialect
            .date_eq(target.expr.clone(), Expr::val(value).into())
            .not()
            .or(target.is_null()),
        DataType::Rating if is_zero(value) => target
            .col()
            .ne(literal(target, value))
            .and(target.is_not_null()),
        DataType::Links => target.col().ne(literal(target, value)),
        t if t.is_textual() || target.string_formula => dialect
            .text_eq(target.expr.clone(), Expr::val(value).into())
            .not()
            .or(target.is_null()),
        _ => target
            .col()
            .ne(literal(target, value))
            .or(target.is_null()),
    }
}

fn like(ctx: &Context<'_>, target: &Target, value: &str, negated: bool) -> SimpleExpr {
    if value.is_empty() {
        return match (target.data_type, negated) {
            (DataType::Attachment, false) => target
                .is_null()
                .or(target.col().eq("[]"))
                .or(target.col().eq("null")),
            (DataType::Attachment, true) => target
                .col()
                .ne("")
                .and(target.col().ne("null"))
                .and(target.col().ne("[]")),
            (_, false) => target.is_not_null(),
            (_, true) => target.is_null(),
        };
    }

    let pattern = if value.starts_with('%') || value.ends_with('%') {
        value.to_string()
    } else {
        format!("%{value}%")
    };
    let matched = ctx.dialect.like(target.expr.clone(), pattern);
    match (target.data_type, negated) {
        (_, false) => matched,
        (DataType::Json, true) => matched.not(),
        (_, true) => matched
            .not()
            .or(target.col().eq(""))
            .or(target.is_null()),
    }
}

fn ordering(
    ctx: &Context<'_>,
    target: &Target,
    op: ComparisonOp,
    value: Option<&str>,
) -> Result<SimpleExpr> {
    let value = match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => {
            return Err(FilterError::MissingValue {
                op: op.to_string(),
                field: target.label.clone(),
            })
        }
    };

    let rhs = if target.data_type.is_date() && has_utc_offset(value) {
        ctx.dialect.timestamp_with_offset(value)
    } else if target.data_type.is_numeric() {
        number(value).ok_or_else(|| invalid(target, value, "expected a number"))?
    } else {
        Expr::val(value).into()
    };

    // 只给日期时按天比较，时间部分不参与
    let col = if dates::is_date_only(value) {
        target.day(ctx)
    } else {
        target.col()
    };
    let compared = match op {
        ComparisonOp::Gt => col.gt(rhs),
        ComparisonOp::Lt => col.lt(rhs),
        ComparisonOp::Gte | ComparisonOp::Ge => col.gte(rhs),
        _ => col.lte(rhs),
    };

    // 未设置的评分视为 0
    let unset_matches = target.data_type == DataType::Rating
        && match op {
            ComparisonOp::Lt => is_positive(value),
            ComparisonOp::Lte | ComparisonOp::Le => true,
            ComparisonOp::Gte | ComparisonOp::Ge => is_zero(value),
            _ => false,
        };
    Ok(if unset_matches {
        compared.or(target.is_null())
    } else {
        compared
    })
}

/// `+05:30` or `-08:00` at the end of a timestamp.
fn has_utc_offset(value: &str) -> bool {
    let bytes = value.as_bytes();
    let Some(tail) = bytes.len().checked_sub(6).map(|i| &bytes[i..]) else {
        return false;
    };
    matches!(tail[0], b'+' | b'-')
        && tail[1].is_ascii_digit()
        && tail[2].is_ascii_digit()
        && tail[3] == b':'
        && tail[4].is_ascii_digit()
        && tail[5].is_ascii_digit()
}

/// `is` / `isnot` with a keyword value.
fn is_form(target: &Target, op: ComparisonOp, clause: &FilterClause) -> Result<SimpleExpr> {
    let keyword = match &clause.value {
        None | Some(FilterValue::Null) => "null".to_string(),
        Some(_) => clause.value_text().unwrap_or_default(),
    };
    let positive = op == ComparisonOp::Is;
    let col = target.col();
    let expr = match (keyword.as_str(), positive) {
        ("null", true) | ("notnull", false) => target.is_null(),
        ("notnull", true) | ("null", false) => target.is_not_null(),
        ("empty", true) | ("notempty", false) => col.eq(""),
        ("notempty", true) => col.ne("").or(target.is_null()),
        ("empty", false) => col.ne(""),
        ("true", true) => col.eq(true),
        ("false", true) => col.eq(false),
        ("true", false) => col.ne(true),
        ("false", false) => col.ne(false),
        _ => {
            return Err(invalid(
                target,
                &keyword,
                "expected null, notnull, empty, notempty, true or false",
            ))
        }
    };
    Ok(expr)
}

fn blank(ctx: &Context<'_>, target: &Target) -> SimpleExpr {
    match target.data_type {
        DataType::Attachment => target
            .is_null()
            .or(target.col().eq("[]"))
            .or(target.col().eq("null")),
        DataType::Json => target.is_null().or(json_blank(ctx, target)),
        _ if target.matches_empty_string() => target.is_null().or(target.col().eq("")),
        _ => target.is_null(),
    }
}

fn not_blank(ctx: &Context<'_>, target: &Target) -> SimpleExpr {
    match target.data_type {
        DataType::Attachment => target
            .is_not_null()
            .and(target.col().ne("[]"))
            .and(target.col().ne("null")),
        DataType::Json => target.is_not_null().and(json_blank(ctx, target).not()),
        _ if target.matches_empty_string() => target.is_not_null().and(target.col().ne("")),
        _ => target.is_not_null(),
    }
}

fn invalid(target: &Target, value: &str, reason: &str) -> FilterError {
    FilterError::InvalidValue {
        field: target.label.clone(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::compiler::AliasCounter;
    use crate::dialect::{Dialect, MySql, Postgres};
    use crate::filter::ComparisonSubOp;
    use chrono::{TimeZone, Utc};
    use sea_query::{Asterisk, Query};

    fn sql_with(dialect: &dyn Dialect, target: &Target, clause: &FilterClause) -> Result<String> {
        let catalog = MemoryCatalog::new();
        let aliases = AliasCounter::new();
        let ctx = Context {
            catalog: &catalog,
            dialect,
            aliases: &aliases,
            now: Utc.with_ymd_and_hms(2024, 3, 31, 15, 30, 0).unwrap(),
        };
        let expr = compare(&ctx, target, clause)?;
        let mut select = Query::select();
        select.column(Asterisk).from(Ident::new("t"));
        if let Some(expr) = expr {
            select.and_where(expr);
        }
        Ok(dialect.render(&select))
    }

    fn sql(target: &Target, clause: &FilterClause) -> String {
        sql_with(&Postgres, target, clause).unwrap()
    }

    fn target(column_name: &str, data_type: DataType) -> Target {
        Target::column(&Column::plain("c", "m", column_name, data_type), None)
    }

    fn clause(op: ComparisonOp, value: &str) -> FilterClause {
        FilterClause::new("c", op).with_value(FilterValue::text(value))
    }

    #[test]
    fn test_numeric_values_are_coerced() {
        let out = sql(&target("amount", DataType::Number), &clause(ComparisonOp::Gt, "5"));
        assert!(out.ends_with(r#"WHERE "amount" > 5"#), "{out}");

        let out = sql(&target("price", DataType::Currency), &clause(ComparisonOp::Eq, "9.5"));
        assert!(out.ends_with(r#"WHERE "price" = 9.5"#), "{out}");

        let err = sql_with(&Postgres, &target("amount", DataType::Number), &clause(ComparisonOp::Gt, "many"))
            .unwrap_err();
        assert!(matches!(err, FilterError::InvalidValue { .. }));
    }

    #[test]
    fn test_text_equality_is_case_sensitive_on_mysql() {
        let out = sql_with(&MySql, &target("title", DataType::SingleLineText), &clause(ComparisonOp::Eq, "Abc"))
            .unwrap();
        assert!(out.contains("BINARY `title` = 'Abc'"), "{out}");
    }

    #[test]
    fn test_not_equal_includes_null() {
        let out = sql(&target("title", DataType::SingleLineText), &clause(ComparisonOp::Neq, "x"));
        assert!(out.contains(r#""title" = 'x'"#), "{out}");
        assert!(out.contains("NOT"), "{out}");
        assert!(out.contains(r#""title" IS NULL"#), "{out}");

        let out = sql(&target("amount", DataType::Number), &clause(ComparisonOp::Not, "3"));
        assert!(out.contains(r#""amount" <> 3"#), "{out}");
        assert!(out.contains(r#""amount" IS NULL"#), "{out}");
    }

    #[test]
    fn test_rating_zero_matches_unset() {
        let out = sql(&target("rating", DataType::Rating), &clause(ComparisonOp::Eq, "0"));
        assert!(out.contains(r#""rating" = 0"#), "{out}");
        assert!(out.contains(r#""rating" IS NULL"#), "{out}");

        let out = sql(&target("rating", DataType::Rating), &clause(ComparisonOp::Neq, "0"));
        assert!(out.contains(r#""rating" IS NOT NULL"#), "{out}");

        let out = sql(&target("rating", DataType::Rating), &clause(ComparisonOp::Lt, "3"));
        assert!(out.contains(r#""rating" < 3"#), "{out}");
        assert!(out.contains(r#""rating" IS NULL"#), "{out}");

        let out = sql(&target("rating", DataType::Rating), &clause(ComparisonOp::Gt, "3"));
        assert!(!out.contains("IS NULL"), "{out}");
    }

    #[test]
    fn test_like_wraps_wildcards() {
        let out = sql(&target("title", DataType::SingleLineText), &clause(ComparisonOp::Like, "abc"));
        assert!(out.contains(r#""title"::text ILIKE '%abc%'"#), "{out}");

        let out = sql(&target("title", DataType::SingleLineText), &clause(ComparisonOp::Like, "abc%"));
        assert!(out.contains("ILIKE 'abc%'"), "{out}");

        let out = sql(&target("title", DataType::SingleLineText), &clause(ComparisonOp::Nlike, "abc"));
        assert!(out.contains("NOT"), "{out}");
        assert!(out.contains(r#""title" = ''"#), "{out}");
        assert!(out.contains(r#""title" IS NULL"#), "{out}");
    }

    #[test]
    fn test_empty_like_and_nlike_are_complements() {
        let out = sql(&target("title", DataType::SingleLineText), &clause(ComparisonOp::Like, ""));
        assert!(out.ends_with(r#"WHERE "title" IS NOT NULL"#), "{out}");
        let out = sql(&target("title", DataType::SingleLineText), &clause(ComparisonOp::Nlike, ""));
        assert!(out.ends_with(r#"WHERE "title" IS NULL"#), "{out}");
    }

    #[test]
    fn test_set_membership() {
        let out = sql(&target("tags", DataType::MultiSelect), &clause(ComparisonOp::AnyOf, "a, b"));
        assert!(out.contains("'%,a,%'") && out.contains("'%,b,%'"), "{out}");
        assert!(out.contains(" OR "), "{out}");

        let out = sql(&target("tags", DataType::MultiSelect), &clause(ComparisonOp::AllOf, "a,b"));
        assert!(out.contains(" AND "), "{out}");

        let out = sql(&target("tags", DataType::MultiSelect), &clause(ComparisonOp::NAnyOf, "a"));
        assert!(out.contains("NOT"), "{out}");
        assert!(out.contains(r#""tags" IS NULL"#), "{out}");

        let out = sql(&target("tags", DataType::MultiSelect), &clause(ComparisonOp::AnyOf, ""));
        assert!(!out.contains("WHERE"), "{out}");
    }

    #[test]
    fn test_blank_depends_on_type() {
        let blank = FilterClause::new("c", ComparisonOp::Blank);
        let out = sql(&target("title", DataType::SingleLineText), &blank);
        assert!(out.contains(r#""title" IS NULL"#) && out.contains(r#""title" = ''"#), "{out}");

        let out = sql(&target("amount", DataType::Number), &blank);
        assert!(out.ends_with(r#"WHERE "amount" IS NULL"#), "{out}");

        let out = sql(&target("meta", DataType::Json), &blank);
        assert!(out.contains("'{}'::jsonb") && out.contains("'[]'::jsonb"), "{out}");

        let out = sql(&target("files", DataType::Attachment), &blank);
        assert!(out.contains(r#""files" = '[]'"#) && out.contains(r#""files" = 'null'"#), "{out}");

        let not_blank = FilterClause::new("c", ComparisonOp::NotBlank);
        let out = sql(&target("title", DataType::SingleLineText), &not_blank);
        assert!(out.contains(r#""title" IS NOT NULL"#) && out.contains(r#""title" <> ''"#), "{out}");

        let gb_null = FilterClause::new("c", ComparisonOp::GbNull);
        let out = sql(&target("amount", DataType::Number), &gb_null);
        assert!(out.ends_with(r#"WHERE "amount" IS NULL"#), "{out}");
    }

    #[test]
    fn test_is_forms() {
        let out = sql(&target("title", DataType::SingleLineText), &clause(ComparisonOp::Is, "null"));
        assert!(out.ends_with(r#"WHERE "title" IS NULL"#), "{out}");
        let out = sql(&target("title", DataType::SingleLineText), &clause(ComparisonOp::IsNot, "null"));
        assert!(out.ends_with(r#"WHERE "title" IS NOT NULL"#), "{out}");
        let out = sql(&target("done", DataType::Checkbox), &clause(ComparisonOp::Is, "true"));
        assert!(out.ends_with(r#"WHERE "done" = TRUE"#), "{out}");

        let err = sql_with(&Postgres, &target("title", DataType::SingleLineText), &clause(ComparisonOp::Is, "maybe"))
            .unwrap_err();
        assert!(matches!(err, FilterError::InvalidValue { .. }));
    }

    #[test]
    fn test_between() {
        let btw = FilterClause::new("c", ComparisonOp::Btw).with_value(FilterValue::list(["1", "5"]));
        let out = sql(&target("amount", DataType::Number), &btw);
        assert!(out.ends_with(r#"WHERE "amount" BETWEEN 1 AND 5"#), "{out}");

        let nbtw = clause(ComparisonOp::Nbtw, "1,5");
        let out = sql(&target("amount", DataType::Number), &nbtw);
        assert!(out.contains("NOT BETWEEN 1 AND 5"), "{out}");

        let err = sql_with(&Postgres, &target("amount", DataType::Number), &clause(ComparisonOp::Btw, "1"))
            .unwrap_err();
        assert!(matches!(err, FilterError::InvalidValue { .. }));
    }

    #[test]
    fn test_date_sub_operators() {
        let due = target("due_date", DataType::Date);
        let out = sql(&due, &FilterClause::new("c", ComparisonOp::Eq).with_sub_op(ComparisonSubOp::Today));
        assert!(out.ends_with(r#"WHERE "due_date" = '2024-03-31'"#), "{out}");

        let days_ago = clause(ComparisonOp::Lt, "3").with_sub_op(ComparisonSubOp::DaysAgo);
        let out = sql(&due, &days_ago);
        assert!(out.ends_with(r#"WHERE "due_date" < '2024-03-28'"#), "{out}");

        let within = clause(ComparisonOp::IsWithin, "10").with_sub_op(ComparisonSubOp::NextNumberOfDays);
        let out = sql(&due, &within);
        assert!(out.ends_with(r#"BETWEEN '2024-03-31' AND '2024-04-10'"#), "{out}");

        let past = FilterClause::new("c", ComparisonOp::IsWithin).with_sub_op(ComparisonSubOp::PastWeek);
        let out = sql(&due, &past);
        assert!(out.ends_with(r#"BETWEEN '2024-03-24' AND '2024-03-31'"#), "{out}");
    }

    #[test]
    fn test_datetime_equality_compares_dates() {
        let created = target("created_at", DataType::DateTime);
        let out = sql(&created, &FilterClause::new("c", ComparisonOp::Eq).with_sub_op(ComparisonSubOp::Yesterday));
        assert!(out.contains(r#""created_at"::date = '2024-03-30'"#), "{out}");

        let offset = clause(ComparisonOp::Gt, "2024-01-01 10:00:00+05:30");
        let out = sql(&created, &offset);
        assert!(out.contains("'2024-01-01 10:00:00+05:30'::timestamptz"), "{out}");
    }

    #[test]
    fn test_datetime_equal_and_not_equal_are_complements() {
        let created = target("created_at", DataType::DateTime);
        let eq = sql(&created, &clause(ComparisonOp::Eq, "2024-03-31"));
        assert!(eq.ends_with(r#"WHERE "created_at"::date = '2024-03-31'"#), "{eq}");

        for op in [ComparisonOp::Neq, ComparisonOp::Not] {
            let out = sql(&created, &clause(op, "2024-03-31"));
            assert!(out.contains(r#""created_at"::date = '2024-03-31'"#), "{out}");
            assert!(out.contains("NOT"), "{out}");
            assert!(out.contains(r#""created_at" IS NULL"#), "{out}");
            assert!(!out.contains("<>"), "{out}");
        }

        let out = sql_with(&MySql, &created, &clause(ComparisonOp::Neq, "2024-03-31")).unwrap();
        assert!(out.contains("DATE(`created_at`) = DATE('2024-03-31')"), "{out}");
    }

    #[test]
    fn test_datetime_ordering_is_day_granular() {
        let created = target("created_at", DataType::DateTime);
        for (op, sign) in [
            (ComparisonOp::Lt, "<"),
            (ComparisonOp::Lte, "<="),
            (ComparisonOp::Gt, ">"),
            (ComparisonOp::Gte, ">="),
        ] {
            let out = sql(&created, &clause(op, "2024-03-31"));
            assert!(out.contains(r#""created_at"::date"#), "{out}");
            assert!(out.ends_with(&format!("{sign} '2024-03-31'")), "{out}");
        }

        let out = sql(&created, &FilterClause::new("c", ComparisonOp::Lte).with_sub_op(ComparisonSubOp::Today));
        assert!(out.contains(r#""created_at"::date"#), "{out}");
        assert!(out.ends_with("<= '2024-03-31'"), "{out}");

        // 带时间的值按时间点比较
        let out = sql(&created, &clause(ComparisonOp::Gt, "2024-03-31 10:00:00"));
        assert!(out.ends_with(r#"WHERE "created_at" > '2024-03-31 10:00:00'"#), "{out}");

        let due = target("due_date", DataType::Date);
        let out = sql(&due, &clause(ComparisonOp::Lte, "2024-03-31"));
        assert!(out.ends_with(r#"WHERE "due_date" <= '2024-03-31'"#), "{out}");
    }

    #[test]
    fn test_datetime_within_includes_today() {
        let created = target("created_at", DataType::DateTime);
        let past = FilterClause::new("c", ComparisonOp::IsWithin).with_sub_op(ComparisonSubOp::PastWeek);
        let out = sql(&created, &past);
        assert!(out.contains(r#""created_at"::date"#), "{out}");
        assert!(out.ends_with("BETWEEN '2024-03-24' AND '2024-03-31'"), "{out}");

        let next = clause(ComparisonOp::IsWithin, "3").with_sub_op(ComparisonSubOp::NextNumberOfDays);
        let out = sql_with(&MySql, &created, &next).unwrap();
        assert!(out.contains("DATE(`created_at`)"), "{out}");
        assert!(out.ends_with("BETWEEN '2024-03-31' AND '2024-04-03'"), "{out}");
    }

    #[test]
    fn test_sub_operator_word_is_text_on_non_date_columns() {
        let today = FilterClause::new("c", ComparisonOp::Eq).with_sub_op(ComparisonSubOp::Today);
        let out = sql(&target("note", DataType::LongText), &today);
        assert!(out.ends_with(r#"WHERE "note" = 'today'"#), "{out}");

        let yesterday = FilterClause::new("c", ComparisonOp::Like).with_sub_op(ComparisonSubOp::Yesterday);
        let out = sql(&target("note", DataType::LongText), &yesterday);
        assert!(out.contains("ILIKE '%yesterday%'"), "{out}");

        let due = target("due_date", DataType::Date);
        let out = sql(&due, &today);
        assert!(out.ends_with(r#"WHERE "due_date" = '2024-03-31'"#), "{out}");
    }

    #[test]
    fn test_month_granular_dates() {
        let mut month = target("month", DataType::Date);
        month.date_format = Some("YYYY-MM".to_string());
        let out = sql(&month, &FilterClause::new("c", ComparisonOp::Eq).with_sub_op(ComparisonSubOp::Today));
        assert!(out.ends_with(r#"WHERE "month" = '2024-03-01'"#), "{out}");

        let out = sql(&month, &clause(ComparisonOp::Eq, "2023-07-19"));
        assert!(out.ends_with(r#"WHERE "month" = '2023-07-01'"#), "{out}");
    }

    #[test]
    fn test_sub_operator_validation() {
        let on_text = clause(ComparisonOp::Eq, "x").with_sub_op(ComparisonSubOp::Today);
        let err = sql_with(&Postgres, &target("title", DataType::SingleLineText), &on_text).unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedSubOperator { .. }));

        let due = target("due_date", DataType::Date);
        let within_on_eq = FilterClause::new("c", ComparisonOp::Eq).with_sub_op(ComparisonSubOp::PastWeek);
        assert!(matches!(
            sql_with(&Postgres, &due, &within_on_eq).unwrap_err(),
            FilterError::UnsupportedSubOperator { .. }
        ));

        let today_on_within = FilterClause::new("c", ComparisonOp::IsWithin).with_sub_op(ComparisonSubOp::Today);
        assert!(matches!(
            sql_with(&Postgres, &due, &today_on_within).unwrap_err(),
            FilterError::UnsupportedSubOperator { .. }
        ));

        let bare_within = FilterClause::new("c", ComparisonOp::IsWithin);
        assert!(matches!(
            sql_with(&Postgres, &due, &bare_within).unwrap_err(),
            FilterError::MissingValue { .. }
        ));
    }

    #[test]
    fn test_unsupported_operator_for_type() {
        let err = sql_with(&Postgres, &target("amount", DataType::Number), &clause(ComparisonOp::AnyOf, "a"))
            .unwrap_err();
        assert!(matches!(
            err,
            FilterError::UnsupportedOperator { ref op, ref data_type } if op == "anyof" && data_type == "Number"
        ));

        let err = sql_with(&Postgres, &target("amount", DataType::Number), &FilterClause::new("c", ComparisonOp::Gt))
            .unwrap_err();
        assert!(matches!(err, FilterError::MissingValue { .. }));
    }

    #[test]
    fn test_in_list() {
        let within = FilterClause::new("c", ComparisonOp::In).with_value(FilterValue::list(["1", "2"]));
        let out = sql(&target("amount", DataType::Number), &within);
        assert!(out.ends_with(r#"WHERE "amount" IN (1, 2)"#), "{out}");
    }

    #[test]
    fn test_equality_with_empty_value() {
        let out = sql(&target("title", DataType::SingleLineText), &clause(ComparisonOp::GbEq, ""));
        assert!(out.ends_with(r#"WHERE "title" = ''"#), "{out}");
        let out = sql(&target("amount", DataType::Number), &clause(ComparisonOp::Eq, ""));
        assert!(out.ends_with(r#"WHERE "amount" IS NULL"#), "{out}");
    }
}
