use chrono::{DateTime, TimeDelta, Utc};
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{Allocation, EngineError, ResultEngine, allocations, donations, projects};

use super::{Engine, with_tx};

/// A closed project and how long it took to fund it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FundingReportRow {
    pub project_id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    pub time_to_close: TimeDelta,
}

impl FundingReportRow {
    /// Whole calendar days between creation and closing.
    pub fn days(&self) -> i64 {
        self.time_to_close.num_days()
    }
}

impl Engine {
    /// Ledger rows that funded `project_id`, oldest first.
    pub async fn allocations_for_project(&self, project_id: i64) -> ResultEngine<Vec<Allocation>> {
        with_tx!(self, |db_tx| {
            self.require_project(&db_tx, project_id).await?;
            let models = allocations::Entity::find()
                .filter(allocations::Column::ProjectId.eq(project_id))
                .order_by_asc(allocations::Column::Id)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Allocation::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Ledger rows that spent `donation_id`, oldest first.
    pub async fn allocations_for_donation(
        &self,
        donation_id: i64,
    ) -> ResultEngine<Vec<Allocation>> {
        with_tx!(self, |db_tx| {
            if donations::Entity::find_by_id(donation_id)
                .one(&db_tx)
                .await?
                .is_none()
            {
                return Err(EngineError::KeyNotFound("donation not exists".to_string()));
            }
            let models = allocations::Entity::find()
                .filter(allocations::Column::DonationId.eq(donation_id))
                .order_by_asc(allocations::Column::Id)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Allocation::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Fully funded projects, fastest to close first.
    ///
    /// Durations are exact timestamp differences; ties keep id order.
    pub async fn funding_report(&self) -> ResultEngine<Vec<FundingReportRow>> {
        let models = projects::Entity::find()
            .filter(projects::Column::FullyFunded.eq(true))
            .order_by_asc(projects::Column::Id)
            .all(&self.database)
            .await?;

        let mut rows = models
            .into_iter()
            .map(|model| {
                let closed_at = model.closed_at.ok_or_else(|| {
                    EngineError::InvariantViolation(format!(
                        "project {} is fully funded but has no closing time",
                        model.id
                    ))
                })?;
                Ok(FundingReportRow {
                    project_id: model.id,
                    name: model.name,
                    description: model.description,
                    created_at: model.created_at,
                    closed_at,
                    time_to_close: closed_at - model.created_at,
                })
            })
            .collect::<ResultEngine<Vec<_>>>()?;
        rows.sort_by_key(|row| row.time_to_close);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn days_uses_real_calendar_difference() {
        // February 2024 has 29 days, not 30.
        let created_at = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
        let closed_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let row = FundingReportRow {
            project_id: 1,
            name: "Shelter".to_string(),
            description: "Roof for the shelter".to_string(),
            created_at,
            closed_at,
            time_to_close: closed_at - created_at,
        };
        assert_eq!(row.days(), 29);
    }
}
