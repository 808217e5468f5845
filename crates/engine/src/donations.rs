//! Donations (pledges).

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::{Fund, FundKind};

/// A pledge of `pledged_amount` minor units.
///
/// `owner_id` is the pledging user and is absent for anonymous or system
/// donations. A donation is never edited after creation: only allocation
/// passes move `invested_amount`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Donation {
    pub id: i64,
    pub pledged_amount: i64,
    pub invested_amount: i64,
    pub fully_allocated: bool,
    pub comment: Option<String>,
    pub owner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Donation {
    pub fn remaining(&self) -> i64 {
        self.pledged_amount - self.invested_amount
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "donations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub pledged_amount: i64,
    pub invested_amount: i64,
    pub fully_allocated: bool,
    pub comment: Option<String>,
    pub owner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Owner,
    #[sea_orm(has_many = "super::allocations::Entity")]
    Allocations,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Donation {
    fn from(value: Model) -> Self {
        Self {
            id: value.id,
            pledged_amount: value.pledged_amount,
            invested_amount: value.invested_amount,
            fully_allocated: value.fully_allocated,
            comment: value.comment,
            owner_id: value.owner_id,
            created_at: value.created_at,
            closed_at: value.closed_at,
        }
    }
}

impl From<&Model> for Fund {
    fn from(value: &Model) -> Self {
        Fund::stored(
            FundKind::Donation,
            value.id,
            value.pledged_amount,
            value.invested_amount,
            value.created_at,
            value.closed_at,
        )
    }
}
