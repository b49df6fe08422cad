//! Rollup and formula columns.
//!
//! Both are filtered through their select expression: the expression becomes
//! the left-hand side of an ordinary comparison.

use super::plain::{column_expr, Target};
use super::relation::Hops;
use super::Context;
use crate::catalog::{Column, ColumnKind, DataType, FormulaOptions, RollupFunction, RollupOptions};
use crate::error::Result;
use sea_query::{Expr, Func, SimpleExpr, SubQueryStatement};

const TABLE_PLACEHOLDER: &str = "{table}";

pub(crate) async fn target(
    ctx: &Context<'_>,
    column: &Column,
    alias: Option<&str>,
) -> Result<Target> {
    match &column.kind {
        ColumnKind::Formula(options) => Ok(formula(ctx, column, options, alias)),
        ColumnKind::Rollup(options) => rollup(ctx, column, options, alias).await,
        _ => Ok(Target::column(column, alias)),
    }
}

fn formula_sql(ctx: &Context<'_>, options: &FormulaOptions, alias: Option<&str>) -> String {
    match alias {
        Some(alias) => options
            .expression
            .replace(TABLE_PLACEHOLDER, &ctx.dialect.quote_identifier(alias)),
        // 根表不加限定
        None => options
            .expression
            .replace("{table}.", "")
            .replace(TABLE_PLACEHOLDER, ""),
    }
}

fn formula(ctx: &Context<'_>, column: &Column, options: &FormulaOptions, alias: Option<&str>) -> Target {
    let expr = Expr::cust(formula_sql(ctx, options, alias));
    let mut target = Target::expression(expr, options.result_type, column.label());
    target.string_formula = options.result_type.is_textual();
    target
}

/// `(SELECT FN(a.col) FROM ... WHERE <correlated to the outer row>)`
async fn rollup(
    ctx: &Context<'_>,
    column: &Column,
    options: &RollupOptions,
    alias: Option<&str>,
) -> Result<Target> {
    let relation = ctx
        .catalog
        .get_relation_descriptor(&options.relation_column_id)
        .await?;
    let rolled = ctx.column(&options.rollup_column_id).await?;

    let mut hops = Hops::start(ctx, &relation)?;
    let value = match &rolled.kind {
        ColumnKind::Formula(formula) => Expr::cust(formula_sql(ctx, formula, Some(&hops.anchor))),
        _ => column_expr(&rolled.column_name, Some(&hops.anchor)),
    };
    hops.correlate(&relation, alias.unwrap_or(&relation.local.table));
    hops.select.expr(aggregate(options.function, value));

    let data_type = match options.function {
        RollupFunction::Count | RollupFunction::CountDistinct => DataType::Number,
        _ => match &rolled.kind {
            ColumnKind::Formula(formula) => formula.result_type,
            _ => rolled.data_type,
        },
    };
    let subquery = SimpleExpr::SubQuery(None, Box::new(SubQueryStatement::SelectStatement(hops.select)));
    Ok(Target::expression(subquery, data_type, column.label()))
}

fn aggregate(function: RollupFunction, value: SimpleExpr) -> SimpleExpr {
    match function {
        RollupFunction::Count => Func::count(value).into(),
        RollupFunction::Sum => Func::sum(value).into(),
        RollupFunction::Avg => Func::avg(value).into(),
        RollupFunction::Min => Func::min(value).into(),
        RollupFunction::Max => Func::max(value).into(),
        RollupFunction::CountDistinct => Expr::cust_with_exprs("COUNT(DISTINCT $1)", [value]),
        RollupFunction::SumDistinct => Expr::cust_with_exprs("SUM(DISTINCT $1)", [value]),
        RollupFunction::AvgDistinct => Expr::cust_with_exprs("AVG(DISTINCT $1)", [value]),
    }
}
