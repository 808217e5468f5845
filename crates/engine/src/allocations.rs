//! Allocation ledger.
//!
//! One row per transfer applied by an allocation pass. The ledger is
//! append-only: for every project and donation the sum of its rows equals its
//! `invested_amount`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, Fund, FundKind, ResultEngine, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Allocation {
    /// Database id, `None` until the row is recorded.
    pub id: Option<i64>,
    /// Allocation pass that produced the transfer.
    pub pass_id: Uuid,
    pub donation_id: i64,
    pub project_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl Allocation {
    /// Build the ledger row for a transfer between two funds of opposite kind.
    pub fn between(
        pass_id: Uuid,
        a: &Fund,
        b: &Fund,
        amount: i64,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        let (donation_id, project_id) = match (a.kind, b.kind) {
            (FundKind::Donation, FundKind::Project) => (a.id, b.id),
            (FundKind::Project, FundKind::Donation) => (b.id, a.id),
            _ => {
                return Err(EngineError::InvariantViolation(format!(
                    "cannot allocate between {} and {}",
                    a.label(),
                    b.label()
                )));
            }
        };
        Ok(Self {
            id: None,
            pass_id,
            donation_id,
            project_id,
            amount,
            created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "allocations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub pass_id: String,
    pub donation_id: i64,
    pub project_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::donations::Entity",
        from = "Column::DonationId",
        to = "super::donations::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Donations,
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Projects,
}

impl Related<super::donations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Donations.def()
    }
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Allocation> for ActiveModel {
    fn from(value: &Allocation) -> Self {
        Self {
            id: match value.id {
                Some(id) => ActiveValue::Set(id),
                None => ActiveValue::NotSet,
            },
            pass_id: ActiveValue::Set(value.pass_id.to_string()),
            donation_id: ActiveValue::Set(value.donation_id),
            project_id: ActiveValue::Set(value.project_id),
            amount: ActiveValue::Set(value.amount),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Allocation {
    type Error = EngineError;

    fn try_from(value: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Some(value.id),
            pass_id: parse_uuid(&value.pass_id, "pass")?,
            donation_id: value.donation_id,
            project_id: value.project_id,
            amount: value.amount,
            created_at: value.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn fund(kind: FundKind, id: i64) -> Fund {
        Fund::stored(kind, id, 100, 0, Utc.timestamp_opt(0, 0).unwrap(), None)
    }

    #[test]
    fn between_orders_ids_by_kind() {
        let pass = Uuid::new_v4();
        let now = Utc.timestamp_opt(5, 0).unwrap();
        let project = fund(FundKind::Project, 7);
        let donation = fund(FundKind::Donation, 3);

        let a = Allocation::between(pass, &project, &donation, 40, now).unwrap();
        let b = Allocation::between(pass, &donation, &project, 40, now).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.project_id, 7);
        assert_eq!(a.donation_id, 3);
    }

    #[test]
    fn between_rejects_same_kind() {
        let now = Utc.timestamp_opt(5, 0).unwrap();
        let err = Allocation::between(
            Uuid::new_v4(),
            &fund(FundKind::Project, 1),
            &fund(FundKind::Project, 2),
            10,
            now,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvariantViolation(_)));
    }
}
