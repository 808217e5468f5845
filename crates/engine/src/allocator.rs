//! The allocation pass.
//!
//! A pass takes one *driving* fund (a project or a donation that just got
//! capacity) and fills the open funds of the opposite kind, oldest first,
//! until the driving fund is exhausted or no counterpart is left:
//!
//! ```text
//! remaining = target - invested
//! for counterpart in open counterparts (created_at asc, id asc):
//!     transfer = min(remaining, counterpart.remaining)
//!     credit both, close the counterpart when full, persist it, log the edge
//!     remaining -= transfer
//! close the driving fund when full, persist it
//! ```
//!
//! Counters only grow and funds only go from open to closed. Candidates with
//! no remaining capacity are rejected as invariant violations instead of being
//! skipped: they mean the caller's filtering or locking is broken.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Allocation, EngineError, Fund, ResultEngine, repository::Repository};

/// Runs allocation passes against a [`Repository`].
pub struct Allocator<'r, R> {
    repository: &'r R,
}

impl<'r, R: Repository> Allocator<'r, R> {
    pub fn new(repository: &'r R) -> Self {
        Self { repository }
    }

    /// Load the open counterparts of `driving` and run a pass against them.
    pub async fn allocate_open(
        &self,
        driving: &mut Fund,
        now: DateTime<Utc>,
    ) -> ResultEngine<Vec<Allocation>> {
        let counterparts = self
            .repository
            .list_open(driving.kind.counterpart())
            .await?;
        self.allocate(driving, counterparts, now).await
    }

    /// Run one allocation pass.
    ///
    /// `counterparts` must contain open funds of the opposite kind, ordered by
    /// creation time. `driving` is refreshed from the repository first and
    /// holds its persisted state on success.
    ///
    /// Returns the ledger rows appended by the pass. A fully funded driving
    /// fund, or an empty candidate list, writes nothing.
    pub async fn allocate(
        &self,
        driving: &mut Fund,
        counterparts: Vec<Fund>,
        now: DateTime<Utc>,
    ) -> ResultEngine<Vec<Allocation>> {
        *driving = self.repository.refresh(driving).await?;
        driving.check()?;

        let mut remaining = driving.remaining();
        if remaining <= 0 {
            tracing::debug!(fund = %driving.label(), "already full, nothing to allocate");
            return Ok(Vec::new());
        }

        let pass_id = Uuid::new_v4();
        let mut applied = Vec::new();

        for mut counterpart in counterparts {
            if remaining <= 0 {
                break;
            }
            if counterpart.kind != driving.kind.counterpart() {
                return Err(EngineError::InvariantViolation(format!(
                    "{} is not a counterpart of {}",
                    counterpart.label(),
                    driving.label()
                )));
            }
            let counterpart_remaining = counterpart.remaining();
            if counterpart_remaining <= 0 || counterpart.is_closed() {
                return Err(EngineError::InvariantViolation(format!(
                    "{} has no remaining capacity",
                    counterpart.label()
                )));
            }

            let amount = remaining.min(counterpart_remaining);
            counterpart.credit(amount)?;
            driving.credit(amount)?;
            if counterpart.close_if_full(now) {
                tracing::info!(%pass_id, fund = %counterpart.label(), "closed");
            }
            self.repository.persist(&mut counterpart).await?;

            let allocation = Allocation::between(pass_id, driving, &counterpart, amount, now)?;
            let allocation = self.repository.record_allocation(&allocation).await?;
            tracing::debug!(
                %pass_id,
                from = %driving.label(),
                to = %counterpart.label(),
                amount,
                "transfer applied"
            );
            applied.push(allocation);
            remaining -= amount;
        }

        if applied.is_empty() {
            return Ok(applied);
        }

        if driving.close_if_full(now) {
            tracing::info!(%pass_id, fund = %driving.label(), "closed");
        }
        self.repository.persist(driving).await?;
        tracing::debug!(
            %pass_id,
            fund = %driving.label(),
            transfers = applied.len(),
            remaining,
            "allocation pass done"
        );

        Ok(applied)
    }
}
