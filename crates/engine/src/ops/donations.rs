use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Allocator, Donation, DonationNew, EngineError, Fund, ResultEngine, SeaRepository, donations,
    users,
    util::{normalize_optional_text, require_positive_amount},
};

use super::{Engine, with_tx};

impl Engine {
    /// Record a donation and spread it over the open projects, oldest first.
    ///
    /// Returns the donation as stored after the allocation pass.
    pub async fn create_donation(&self, cmd: DonationNew) -> ResultEngine<Donation> {
        require_positive_amount(cmd.pledged_amount, "pledged_amount")?;
        let comment = normalize_optional_text(cmd.comment.as_deref());
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            if let Some(owner_id) = cmd.owner_id
                && users::Entity::find_by_id(owner_id)
                    .one(&db_tx)
                    .await?
                    .is_none()
            {
                return Err(EngineError::KeyNotFound("user not exists".to_string()));
            }

            let model = donations::ActiveModel {
                id: ActiveValue::NotSet,
                pledged_amount: ActiveValue::Set(cmd.pledged_amount),
                invested_amount: ActiveValue::Set(0),
                fully_allocated: ActiveValue::Set(false),
                comment: ActiveValue::Set(comment),
                owner_id: ActiveValue::Set(cmd.owner_id),
                created_at: ActiveValue::Set(now),
                closed_at: ActiveValue::Set(None),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(
                donation_id = model.id,
                amount = model.pledged_amount,
                "donation created"
            );

            let repository = SeaRepository::new(&db_tx);
            let mut fund = Fund::from(&model);
            Allocator::new(&repository)
                .allocate_open(&mut fund, now)
                .await?;

            let donation = donations::Entity::find_by_id(model.id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("donation not exists".to_string()))?;
            Ok(Donation::from(donation))
        })
    }

    pub async fn donation(&self, donation_id: i64) -> ResultEngine<Donation> {
        donations::Entity::find_by_id(donation_id)
            .one(&self.database)
            .await?
            .map(Donation::from)
            .ok_or_else(|| EngineError::KeyNotFound("donation not exists".to_string()))
    }

    /// All donations, oldest first.
    pub async fn donations(&self) -> ResultEngine<Vec<Donation>> {
        let models = donations::Entity::find()
            .order_by_asc(donations::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Donation::from).collect())
    }

    /// Donations pledged by `owner_id`, oldest first.
    pub async fn donations_by_owner(&self, owner_id: i64) -> ResultEngine<Vec<Donation>> {
        let models = donations::Entity::find()
            .filter(donations::Column::OwnerId.eq(owner_id))
            .order_by_asc(donations::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Donation::from).collect())
    }
}
