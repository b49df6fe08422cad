//! Relation traversal for relation and lookup columns.
//!
//! A condition on related rows becomes a membership test of the local key in
//! a subquery over the far side:
//!
//! ```text
//! direct-many   pk IN (SELECT a.fk FROM child AS a WHERE <cond @a> AND a.fk IS NOT NULL)
//! direct-one    fk IN (SELECT a.pk FROM parent AS a WHERE <cond @a> ...)
//! many-to-many  pk IN (SELECT j.local FROM junction AS j
//!                      INNER JOIN foreign AS a ON a.pk = j.foreign WHERE <cond @a> ...)
//! ```
//!
//! Lookup chains join one aliased hop per level onto the same subquery and
//! compile the terminal column at the innermost alias. Negated operators go
//! through the negation map and flip `IN` to `NOT IN`, so "does not equal x"
//! also holds when no related row exists.

use super::negation::{self, Negation};
use super::plain::column_expr;
use super::{Context, Ident};
use crate::catalog::{Column, ColumnKind, Junction, LookupOptions, RelationDescriptor, RelationKind};
use crate::error::{CatalogError, Result};
use crate::filter::{ComparisonOp, FilterClause};
use sea_query::{Expr, JoinType, Query, SelectStatement, SimpleExpr};
use tracing::trace;

/// Rows reachable from the outer table through one or more hops.
pub(crate) struct Hops {
    pub select: SelectStatement,
    /// Column of the first hop that references the outer `local.column`.
    pub key: SimpleExpr,
    /// Alias of the last joined model table.
    pub anchor: String,
}

impl Hops {
    /// Opens the subquery with the far side of `relation`.
    pub fn start(ctx: &Context<'_>, relation: &RelationDescriptor) -> Result<Self> {
        let mut select = Query::select();
        match relation.kind {
            RelationKind::ManyToMany => {
                let junction = junction(relation)?;
                let j = ctx.aliases.next_alias();
                let a = ctx.aliases.next_alias();
                select.from_as(Ident::new(&junction.table), Ident::new(&j)).join_as(
                    JoinType::InnerJoin,
                    Ident::new(&relation.foreign.table),
                    Ident::new(&a),
                    Expr::col((Ident::new(&a), Ident::new(&relation.foreign.column)))
                        .equals((Ident::new(&j), Ident::new(&junction.foreign_column))),
                );
                Ok(Self {
                    select,
                    key: column_expr(&junction.local_column, Some(&j)),
                    anchor: a,
                })
            }
            RelationKind::HasMany | RelationKind::BelongsTo => {
                let a = ctx.aliases.next_alias();
                select.from_as(Ident::new(&relation.foreign.table), Ident::new(&a));
                Ok(Self {
                    select,
                    key: column_expr(&relation.foreign.column, Some(&a)),
                    anchor: a,
                })
            }
        }
    }

    /// Joins the far side of `relation`, whose local end is the current
    /// anchor.
    pub fn join(&mut self, ctx: &Context<'_>, relation: &RelationDescriptor) -> Result<()> {
        let anchor_key = (Ident::new(&self.anchor), Ident::new(&relation.local.column));
        let next = match relation.kind {
            RelationKind::ManyToMany => {
                let junction = junction(relation)?;
                let j = ctx.aliases.next_alias();
                let b = ctx.aliases.next_alias();
                self.select
                    .join_as(
                        JoinType::InnerJoin,
                        Ident::new(&junction.table),
                        Ident::new(&j),
                        Expr::col((Ident::new(&j), Ident::new(&junction.local_column)))
                            .equals(anchor_key),
                    )
                    .join_as(
                        JoinType::InnerJoin,
                        Ident::new(&relation.foreign.table),
                        Ident::new(&b),
                        Expr::col((Ident::new(&b), Ident::new(&relation.foreign.column)))
                            .equals((Ident::new(&j), Ident::new(&junction.foreign_column))),
                    );
                b
            }
            RelationKind::HasMany | RelationKind::BelongsTo => {
                let b = ctx.aliases.next_alias();
                self.select.join_as(
                    JoinType::InnerJoin,
                    Ident::new(&relation.foreign.table),
                    Ident::new(&b),
                    Expr::col((Ident::new(&b), Ident::new(&relation.foreign.column)))
                        .equals(anchor_key),
                );
                b
            }
        };
        trace!(from = %self.anchor, to = %next, kind = %relation.kind, "joined lookup hop");
        self.anchor = next;
        Ok(())
    }

    /// Restricts the subquery to the rows of the outer table `outer`.
    pub fn correlate(&mut self, relation: &RelationDescriptor, outer: &str) {
        self.select.and_where(
            Expr::expr(self.key.clone())
                .equals((Ident::new(outer), Ident::new(&relation.local.column))),
        );
    }

    /// `SELECT key ... WHERE cond AND key IS NOT NULL`
    fn into_key_select(mut self, cond: SimpleExpr) -> SelectStatement {
        self.select
            .expr(self.key.clone())
            .and_where(cond)
            .and_where(Expr::expr(self.key).is_not_null());
        self.select
    }
}

fn junction(relation: &RelationDescriptor) -> Result<&Junction> {
    relation.junction.as_ref().ok_or_else(|| {
        CatalogError::MissingJunction(format!(
            "{} -> {}",
            relation.local.table, relation.foreign.table
        ))
        .into()
    })
}

fn effective_op(op: ComparisonOp) -> ComparisonOp {
    match op {
        ComparisonOp::GbEq => ComparisonOp::Eq,
        ComparisonOp::GbNull => ComparisonOp::Blank,
        op => op,
    }
}

/// `Some(false)` for "has no linked rows", `Some(true)` for "has linked rows".
fn existence(op: ComparisonOp) -> Option<bool> {
    match op {
        ComparisonOp::Blank
        | ComparisonOp::Empty
        | ComparisonOp::NotChecked
        | ComparisonOp::Null => Some(false),
        ComparisonOp::NotBlank
        | ComparisonOp::NotEmpty
        | ComparisonOp::Checked
        | ComparisonOp::NotNull => Some(true),
        _ => None,
    }
}

/// The same clause aimed at `column` on the far side.
fn retarget(clause: &FilterClause, column: &Column, op: ComparisonOp) -> FilterClause {
    FilterClause {
        fk_column_id: Some(column.id.clone()),
        field: None,
        comparison_op: op,
        logical_op: None,
        ..clause.clone()
    }
}

/// `key IN (subquery)`, or `NOT IN` when inverted. A direct-one foreign key
/// that is NULL links to nothing, so it satisfies every inverted test.
fn membership(
    relation: &RelationDescriptor,
    alias: Option<&str>,
    subquery: SelectStatement,
    invert: bool,
) -> SimpleExpr {
    let key = column_expr(&relation.local.column, alias);
    if !invert {
        return Expr::expr(key).in_subquery(subquery);
    }
    let not_in = Expr::expr(key.clone()).not_in_subquery(subquery);
    match relation.kind {
        RelationKind::BelongsTo => not_in.or(Expr::expr(key).is_null()),
        _ => not_in,
    }
}

/// Compiles a clause on a relation column.
pub(crate) async fn compile_relation(
    ctx: &Context<'_>,
    column: &Column,
    clause: &FilterClause,
    alias: Option<&str>,
) -> Result<Option<SimpleExpr>> {
    let relation = ctx.catalog.get_relation_descriptor(&column.id).await?;
    let op = effective_op(clause.comparison_op);

    if let Some(linked) = existence(op) {
        return Ok(Some(has_links(ctx, &relation, alias, linked)?));
    }

    let Negation { positive, invert } = negation::resolve(op);
    let display = ctx.column(&relation.display_column_id).await?;
    let hops = Hops::start(ctx, &relation)?;
    let far = retarget(clause, &display, positive);
    let Some(cond) = ctx.compile_column(&display, &far, Some(&hops.anchor)).await? else {
        return Ok(None);
    };
    let subquery = hops.into_key_select(cond);
    Ok(Some(membership(&relation, alias, subquery, invert)))
}

/// "Has linked rows" (`linked`) or "has none".
fn has_links(
    ctx: &Context<'_>,
    relation: &RelationDescriptor,
    alias: Option<&str>,
    linked: bool,
) -> Result<SimpleExpr> {
    // 自引用和 direct-one 直接检查外键列
    let fk = match relation.kind {
        RelationKind::BelongsTo => Some(&relation.local.column),
        RelationKind::HasMany if relation.is_self_reference() => Some(&relation.foreign.column),
        _ => None,
    };
    if let Some(fk) = fk {
        let fk = Expr::expr(column_expr(fk, alias));
        return Ok(if linked { fk.is_not_null() } else { fk.is_null() });
    }

    let outer = alias.unwrap_or(&relation.local.table);
    let mut hops = Hops::start(ctx, relation)?;
    hops.correlate(relation, outer);
    hops.select.expr(Expr::val(1));
    let exists = Expr::exists(hops.select);
    Ok(if linked { exists } else { exists.not() })
}

/// Compiles a clause on a lookup column, following nested lookups and
/// relations until a plain or computed column is reached.
pub(crate) async fn compile_lookup(
    ctx: &Context<'_>,
    column: &Column,
    options: &LookupOptions,
    clause: &FilterClause,
    alias: Option<&str>,
) -> Result<Option<SimpleExpr>> {
    let relation = ctx
        .catalog
        .get_relation_descriptor(&options.relation_column_id)
        .await?;

    // 查找列为空：没有任何非空的关联值
    let Negation { positive, invert } = match effective_op(clause.comparison_op) {
        ComparisonOp::Blank => Negation {
            positive: ComparisonOp::NotBlank,
            invert: true,
        },
        ComparisonOp::Null => Negation {
            positive: ComparisonOp::NotNull,
            invert: true,
        },
        op => negation::resolve(op),
    };

    let mut hops = Hops::start(ctx, &relation)?;
    let mut target = ctx.column(&options.lookup_column_id).await?;
    loop {
        match &target.kind {
            ColumnKind::Lookup(next) => {
                let next_relation = ctx
                    .catalog
                    .get_relation_descriptor(&next.relation_column_id)
                    .await?;
                hops.join(ctx, &next_relation)?;
                target = ctx.column(&next.lookup_column_id).await?;
            }
            ColumnKind::Relation => {
                let next_relation = ctx.catalog.get_relation_descriptor(&target.id).await?;
                hops.join(ctx, &next_relation)?;
                target = ctx.column(&next_relation.display_column_id).await?;
                break;
            }
            _ => break,
        }
    }
    trace!(lookup = %column.id, terminal = %target.id, alias = %hops.anchor, "resolved lookup chain");

    let far = retarget(clause, &target, positive);
    let Some(cond) = ctx.compile_column(&target, &far, Some(&hops.anchor)).await? else {
        return Ok(None);
    };
    let subquery = hops.into_key_select(cond);
    Ok(Some(membership(&relation, alias, subquery, invert)))
}
