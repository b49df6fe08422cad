//! Field handler registry: one handler per column kind.

use super::plain::{self, Target};
use super::{computed, relation, Context};
use crate::catalog::{Column, ColumnKind};
use crate::error::Result;
use crate::filter::FilterClause;
use async_trait::async_trait;
use sea_query::SimpleExpr;

#[async_trait]
pub(crate) trait FieldHandler: Send + Sync {
    async fn compile(
        &self,
        ctx: &Context<'_>,
        column: &Column,
        clause: &FilterClause,
        alias: Option<&str>,
    ) -> Result<Option<SimpleExpr>>;
}

pub(crate) struct PlainHandler;
pub(crate) struct ComputedHandler;
pub(crate) struct LookupHandler;
pub(crate) struct RelationHandler;

pub(crate) fn handler_for(kind: &ColumnKind) -> &'static dyn FieldHandler {
    match kind {
        ColumnKind::Plain => &PlainHandler,
        ColumnKind::Rollup(_) | ColumnKind::Formula(_) => &ComputedHandler,
        ColumnKind::Lookup(_) => &LookupHandler,
        ColumnKind::Relation => &RelationHandler,
    }
}

#[async_trait]
impl FieldHandler for PlainHandler {
    async fn compile(
        &self,
        ctx: &Context<'_>,
        column: &Column,
        clause: &FilterClause,
        alias: Option<&str>,
    ) -> Result<Option<SimpleExpr>> {
        plain::compare(ctx, &Target::column(column, alias), clause)
    }
}

#[async_trait]
impl FieldHandler for ComputedHandler {
    async fn compile(
        &self,
        ctx: &Context<'_>,
        column: &Column,
        clause: &FilterClause,
        alias: Option<&str>,
    ) -> Result<Option<SimpleExpr>> {
        let target = computed::target(ctx, column, alias).await?;
        plain::compare(ctx, &target, clause)
    }
}

#[async_trait]
impl FieldHandler for LookupHandler {
    async fn compile(
        &self,
        ctx: &Context<'_>,
        column: &Column,
        clause: &FilterClause,
        alias: Option<&str>,
    ) -> Result<Option<SimpleExpr>> {
        let ColumnKind::Lookup(options) = &column.kind else {
            return PlainHandler.compile(ctx, column, clause, alias).await;
        };
        relation::compile_lookup(ctx, column, options, clause, alias).await
    }
}

#[async_trait]
impl FieldHandler for RelationHandler {
    async fn compile(
        &self,
        ctx: &Context<'_>,
        column: &Column,
        clause: &FilterClause,
        alias: Option<&str>,
    ) -> Result<Option<SimpleExpr>> {
        relation::compile_relation(ctx, column, clause, alias).await
    }
}
