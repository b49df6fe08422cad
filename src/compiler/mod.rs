//! Predicate compiler: lowers a [`FilterNode`] tree into a `sea-query`
//! condition.
//!
//! Groups are folded here; every clause is handed to the field handler for
//! its column kind (see [`handlers`]). Relation and lookup handlers call back
//! into [`Context::compile_column`] for the far side of each hop, so the same
//! alias counter is threaded through the whole tree.

mod computed;
mod dates;
mod handlers;
mod negation;
mod plain;
mod relation;

use crate::catalog::{Catalog, Column};
use crate::dialect::Dialect;
use crate::error::{CatalogError, FilterError, Result};
use crate::filter::{FilterClause, FilterGroup, FilterNode, LogicalOp};
use chrono::{DateTime, Utc};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use sea_query::{Asterisk, Iden, Query, SelectStatement, SimpleExpr};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, trace, warn};

/// A table, alias or column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident(pub String);

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl Iden for Ident {
    fn unquoted(&self, s: &mut dyn fmt::Write) {
        write!(s, "{}", self.0).unwrap();
    }
}

/// Mints `__nc0`, `__nc1`, ... for subquery and join aliases.
///
/// One counter per compilation; it is shared by reference with every
/// recursive step.
#[derive(Debug, Default)]
pub struct AliasCounter {
    next: AtomicUsize,
}

impl AliasCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_alias(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        let alias = format!("__nc{n}");
        trace!(alias = %alias, "minted alias");
        alias
    }

    /// Number of aliases handed out so far.
    pub fn minted(&self) -> usize {
        self.next.load(Ordering::Relaxed)
    }
}

/// Per-call compilation settings.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Abort on the first semantic error instead of dropping the clause.
    pub strict: bool,
    /// Reference time for date sub-operators.
    pub now: DateTime<Utc>,
    /// Alias of the root table in the outer query, if it has one.
    pub alias: Option<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            strict: false,
            now: Utc::now(),
            alias: None,
        }
    }
}

impl CompileOptions {
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// A clause skipped in lenient mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedClause {
    pub field: String,
    pub reason: String,
}

/// The compiled condition. Empty when nothing constrains the rows.
#[derive(Debug, Clone, Default)]
pub struct Predicate {
    expr: Option<SimpleExpr>,
}

impl Predicate {
    pub fn expr(&self) -> Option<&SimpleExpr> {
        self.expr.as_ref()
    }

    pub fn into_expr(self) -> Option<SimpleExpr> {
        self.expr
    }

    pub fn is_empty(&self) -> bool {
        self.expr.is_none()
    }

    /// Adds the condition to `select` with AND.
    pub fn apply(&self, select: &mut SelectStatement) {
        if let Some(expr) = &self.expr {
            select.and_where(expr.clone());
        }
    }

    /// `SELECT * FROM table [AS alias] WHERE ...`
    pub fn select_all(&self, table: &str, alias: Option<&str>) -> SelectStatement {
        let mut select = Query::select();
        select.column(Asterisk);
        match alias {
            Some(alias) => select.from_as(Ident::new(table), Ident::new(alias)),
            None => select.from(Ident::new(table)),
        };
        self.apply(&mut select);
        select
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
    pub predicate: Predicate,
    pub dropped: Vec<DroppedClause>,
    pub aliases_minted: usize,
}

/// What every handler sees: metadata access, the dialect, the alias counter
/// and "now".
pub(crate) struct Context<'a> {
    pub catalog: &'a dyn Catalog,
    pub dialect: &'a dyn Dialect,
    pub aliases: &'a AliasCounter,
    pub now: DateTime<Utc>,
}

impl Context<'_> {
    /// Compiles `clause` against `column`, qualified by `alias` (or unqualified
    /// at the root).
    pub async fn compile_column(
        &self,
        column: &Column,
        clause: &FilterClause,
        alias: Option<&str>,
    ) -> Result<Option<SimpleExpr>> {
        let handler = handlers::handler_for(&column.kind);
        trace!(
            column = %column.id,
            kind = column.kind.name(),
            op = %clause.comparison_op,
            alias = alias.unwrap_or(""),
            "compiling clause"
        );
        handler.compile(self, column, clause, alias).await
    }

    pub async fn column(&self, id: &str) -> Result<Column> {
        self.catalog
            .get_column(id)
            .await?
            .ok_or_else(|| CatalogError::ColumnNotFound(id.to_string()).into())
    }
}

/// Compiles filter trees for one catalog and dialect.
pub struct PredicateCompiler<'a> {
    catalog: &'a dyn Catalog,
    dialect: &'a dyn Dialect,
}

impl<'a> PredicateCompiler<'a> {
    pub fn new(catalog: &'a dyn Catalog, dialect: &'a dyn Dialect) -> Self {
        Self { catalog, dialect }
    }

    /// Compiles `node` for rows of `model_id`.
    ///
    /// A fresh alias counter is used for every call.
    pub async fn compile(
        &self,
        node: &FilterNode,
        model_id: &str,
        options: &CompileOptions,
    ) -> Result<CompileOutput> {
        let aliases = AliasCounter::new();
        let session = Session {
            ctx: Context {
                catalog: self.catalog,
                dialect: self.dialect,
                aliases: &aliases,
                now: options.now,
            },
            model_id,
            strict: options.strict,
            alias: options.alias.as_deref(),
        };

        let compiled = session.compile_node(node).await?;
        let expr = match (compiled.expr, node.logical_op()) {
            (Some(expr), Some(LogicalOp::Not)) => Some(expr.not()),
            (expr, _) => expr,
        };
        debug!(
            model = model_id,
            dropped = compiled.dropped.len(),
            aliases = aliases.minted(),
            "compiled filter"
        );
        Ok(CompileOutput {
            predicate: Predicate { expr },
            dropped: compiled.dropped,
            aliases_minted: aliases.minted(),
        })
    }
}

#[derive(Default)]
struct Compiled {
    expr: Option<SimpleExpr>,
    dropped: Vec<DroppedClause>,
}

struct Session<'a> {
    ctx: Context<'a>,
    model_id: &'a str,
    strict: bool,
    alias: Option<&'a str>,
}

impl Session<'_> {
    fn compile_node<'s>(&'s self, node: &'s FilterNode) -> BoxFuture<'s, Result<Compiled>> {
        async move {
            match node {
                FilterNode::Group(group) => self.compile_group(group).await,
                FilterNode::Clause(clause) => self.compile_clause(clause).await,
            }
        }
        .boxed()
    }

    async fn compile_group(&self, group: &FilterGroup) -> Result<Compiled> {
        if group.children.is_empty() {
            if self.strict {
                return Err(FilterError::InvalidGroup("group has no children".to_string()));
            }
            warn!("skipping empty filter group");
            return Ok(Compiled::default());
        }

        let parts = try_join_all(group.children.iter().map(|child| self.compile_node(child))).await?;

        // 没有连接符的子节点继承分组自身的运算符
        let inherited = match group.logical_op {
            LogicalOp::Or => LogicalOp::Or,
            _ => LogicalOp::And,
        };
        let mut folded = Compiled::default();
        for (child, part) in group.children.iter().zip(parts) {
            folded.dropped.extend(part.dropped);
            let Some(expr) = part.expr else {
                continue;
            };
            let op = child.logical_op().unwrap_or(inherited);
            let expr = if op == LogicalOp::Not { expr.not() } else { expr };
            folded.expr = Some(match folded.expr {
                None => expr,
                Some(acc) if op == LogicalOp::Or => acc.or(expr),
                Some(acc) => acc.and(expr),
            });
        }
        Ok(folded)
    }

    async fn compile_clause(&self, clause: &FilterClause) -> Result<Compiled> {
        match self.try_compile_clause(clause).await {
            Ok(expr) => Ok(Compiled {
                expr,
                dropped: Vec::new(),
            }),
            Err(err) if !self.strict && err.is_semantic() => {
                warn!(field = clause.field_ref(), error = %err, "dropping filter clause");
                Ok(Compiled {
                    expr: None,
                    dropped: vec![DroppedClause {
                        field: clause.field_ref().to_string(),
                        reason: err.to_string(),
                    }],
                })
            }
            Err(err) => Err(err),
        }
    }

    async fn try_compile_clause(&self, clause: &FilterClause) -> Result<Option<SimpleExpr>> {
        let column = self.resolve_column(clause).await?;
        self.ctx.compile_column(&column, clause, self.alias).await
    }

    /// Finds the clause's column: `fk_column_id` by id, otherwise `field`
    /// against the model's columns by id, then title, then column name.
    async fn resolve_column(&self, clause: &FilterClause) -> Result<Column> {
        if let Some(id) = clause.fk_column_id.as_deref() {
            return self
                .ctx
                .catalog
                .get_column(id)
                .await?
                .ok_or_else(|| FilterError::FieldNotFound(id.to_string()));
        }

        let field = clause.field.as_deref().unwrap_or("");
        let columns = self.ctx.catalog.get_model_columns(self.model_id).await?;
        columns
            .iter()
            .find(|c| c.id == field)
            .or_else(|| columns.iter().find(|c| c.title == field))
            .or_else(|| {
                columns
                    .iter()
                    .find(|c| !c.column_name.is_empty() && c.column_name == field)
            })
            .cloned()
            .ok_or_else(|| FilterError::FieldNotFound(field.to_string()))
    }
}
