//! Storage contract consumed by the allocator.
//!
//! The allocator only needs ordered access to open funds, compare-and-swap
//! writes and a ledger sink. [`SeaRepository`] provides them on top of any
//! sea-orm connection, usually the `DatabaseTransaction` that wraps a whole
//! allocation pass.

use std::future::Future;

use sea_orm::{
    ActiveModelTrait, ConnectionTrait, QueryFilter, QueryOrder, prelude::*, sea_query::Expr,
};

use crate::{
    Allocation, EngineError, Fund, FundKind, ResultEngine, allocations, donations, projects,
};

pub trait Repository {
    /// Open funds of `kind`, oldest first (ties by ascending id).
    fn list_open(&self, kind: FundKind) -> impl Future<Output = ResultEngine<Vec<Fund>>> + Send;

    /// Write the counters of `fund`.
    ///
    /// The write only applies if the stored `invested` still equals
    /// [`Fund::stored_invested`]; otherwise [`EngineError::Conflict`] is
    /// returned and nothing changes.
    fn persist(&self, fund: &mut Fund) -> impl Future<Output = ResultEngine<()>> + Send;

    /// Re-read the authoritative state of `fund`.
    fn refresh(&self, fund: &Fund) -> impl Future<Output = ResultEngine<Fund>> + Send;

    /// Append a ledger row and return it with its id.
    fn record_allocation(
        &self,
        allocation: &Allocation,
    ) -> impl Future<Output = ResultEngine<Allocation>> + Send;
}

/// [`Repository`] backed by sea-orm.
pub struct SeaRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> SeaRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }
}

impl<C> Repository for SeaRepository<'_, C>
where
    C: ConnectionTrait + Send + Sync,
{
    async fn list_open(&self, kind: FundKind) -> ResultEngine<Vec<Fund>> {
        let funds = match kind {
            FundKind::Project => projects::Entity::find()
                .filter(projects::Column::FullyFunded.eq(false))
                .order_by_asc(projects::Column::CreatedAt)
                .order_by_asc(projects::Column::Id)
                .all(self.db)
                .await?
                .iter()
                .map(Fund::from)
                .collect(),
            FundKind::Donation => donations::Entity::find()
                .filter(donations::Column::FullyAllocated.eq(false))
                .order_by_asc(donations::Column::CreatedAt)
                .order_by_asc(donations::Column::Id)
                .all(self.db)
                .await?
                .iter()
                .map(Fund::from)
                .collect(),
        };
        Ok(funds)
    }

    async fn persist(&self, fund: &mut Fund) -> ResultEngine<()> {
        fund.check()?;
        let result = match fund.kind {
            FundKind::Project => {
                projects::Entity::update_many()
                    .col_expr(projects::Column::InvestedAmount, Expr::value(fund.invested))
                    .col_expr(projects::Column::FullyFunded, Expr::value(fund.is_closed()))
                    .col_expr(projects::Column::ClosedAt, Expr::value(fund.closed_at))
                    .filter(projects::Column::Id.eq(fund.id))
                    .filter(projects::Column::InvestedAmount.eq(fund.stored_invested()))
                    .exec(self.db)
                    .await?
            }
            FundKind::Donation => {
                donations::Entity::update_many()
                    .col_expr(
                        donations::Column::InvestedAmount,
                        Expr::value(fund.invested),
                    )
                    .col_expr(
                        donations::Column::FullyAllocated,
                        Expr::value(fund.is_closed()),
                    )
                    .col_expr(donations::Column::ClosedAt, Expr::value(fund.closed_at))
                    .filter(donations::Column::Id.eq(fund.id))
                    .filter(donations::Column::InvestedAmount.eq(fund.stored_invested()))
                    .exec(self.db)
                    .await?
            }
        };
        if result.rows_affected == 0 {
            return Err(EngineError::Conflict(format!(
                "{} changed since it was read",
                fund.label()
            )));
        }
        fund.mark_persisted();
        Ok(())
    }

    async fn refresh(&self, fund: &Fund) -> ResultEngine<Fund> {
        let refreshed = match fund.kind {
            FundKind::Project => projects::Entity::find_by_id(fund.id)
                .one(self.db)
                .await?
                .map(|model| Fund::from(&model)),
            FundKind::Donation => donations::Entity::find_by_id(fund.id)
                .one(self.db)
                .await?
                .map(|model| Fund::from(&model)),
        };
        refreshed.ok_or_else(|| EngineError::KeyNotFound(fund.label()))
    }

    async fn record_allocation(&self, allocation: &Allocation) -> ResultEngine<Allocation> {
        let model = allocations::ActiveModel::from(allocation)
            .insert(self.db)
            .await?;
        Allocation::try_from(model)
    }
}
