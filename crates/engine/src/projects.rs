//! Fundraising projects.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::{Fund, FundKind};

/// A fundraising campaign.
///
/// `invested_amount` only grows, through allocation passes. Once it reaches
/// `target_amount` the project is fully funded and `closed_at` is stamped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub target_amount: i64,
    pub invested_amount: i64,
    pub fully_funded: bool,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    /// Normalized name used for uniqueness checks.
    #[sea_orm(unique)]
    pub name_key: String,
    pub description: String,
    pub target_amount: i64,
    pub invested_amount: i64,
    pub fully_funded: bool,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::allocations::Entity")]
    Allocations,
}

impl Related<super::allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Project {
    fn from(value: Model) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            target_amount: value.target_amount,
            invested_amount: value.invested_amount,
            fully_funded: value.fully_funded,
            created_at: value.created_at,
            closed_at: value.closed_at,
        }
    }
}

impl From<&Model> for Fund {
    fn from(value: &Model) -> Self {
        Fund::stored(
            FundKind::Project,
            value.id,
            value.target_amount,
            value.invested_amount,
            value.created_at,
            value.closed_at,
        )
    }
}
