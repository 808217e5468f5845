//! Kind-agnostic capacity view shared by projects and donations.
//!
//! A [`Fund`] is what the allocator works on: a target, the amount already
//! invested and the closing timestamp. Projects and donations convert into a
//! `Fund` so the matching loop is written once for both directions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundKind {
    Project,
    Donation,
}

impl FundKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Donation => "donation",
        }
    }

    /// The kind a fund of this kind is matched against.
    pub fn counterpart(self) -> Self {
        match self {
            Self::Project => Self::Donation,
            Self::Donation => Self::Project,
        }
    }
}

/// Capacity counters of a project or a donation.
///
/// `target` is the project target or the donation pledge. The struct also
/// remembers the `invested` value last read from the store, which repositories
/// use as the expected value of a compare-and-swap write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fund {
    pub kind: FundKind,
    pub id: i64,
    pub target: i64,
    pub invested: i64,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    stored_invested: i64,
}

impl Fund {
    /// Build a fund as it was read from storage.
    pub fn stored(
        kind: FundKind,
        id: i64,
        target: i64,
        invested: i64,
        created_at: DateTime<Utc>,
        closed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            kind,
            id,
            target,
            invested,
            created_at,
            closed_at,
            stored_invested: invested,
        }
    }

    /// Invested amount the store held when this fund was last read or written.
    pub fn stored_invested(&self) -> i64 {
        self.stored_invested
    }

    /// Record that the current state has been written.
    pub(crate) fn mark_persisted(&mut self) {
        self.stored_invested = self.invested;
    }

    pub fn remaining(&self) -> i64 {
        self.target - self.invested
    }

    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.kind.as_str(), self.id)
    }

    /// Check the at-rest invariants of the counters.
    pub fn check(&self) -> ResultEngine<()> {
        if self.target <= 0 {
            return Err(EngineError::InvariantViolation(format!(
                "{} has non-positive target {}",
                self.label(),
                self.target
            )));
        }
        if self.invested < 0 || self.invested > self.target {
            return Err(EngineError::InvariantViolation(format!(
                "{} has invested {} outside 0..={}",
                self.label(),
                self.invested,
                self.target
            )));
        }
        if self.is_closed() != (self.invested == self.target) {
            return Err(EngineError::InvariantViolation(format!(
                "{} closed state disagrees with counters ({}/{})",
                self.label(),
                self.invested,
                self.target
            )));
        }
        Ok(())
    }

    /// Increase `invested` by `amount`.
    ///
    /// Fails instead of clamping when the amount is not positive or would push
    /// `invested` above `target`.
    pub fn credit(&mut self, amount: i64) -> ResultEngine<()> {
        if amount <= 0 {
            return Err(EngineError::InvariantViolation(format!(
                "transfer of {amount} to {}",
                self.label()
            )));
        }
        let invested = self.invested.checked_add(amount).ok_or_else(|| {
            EngineError::InvariantViolation(format!("{} invested overflow", self.label()))
        })?;
        if invested > self.target {
            return Err(EngineError::InvariantViolation(format!(
                "transfer of {amount} pushes {} to {invested} above target {}",
                self.label(),
                self.target
            )));
        }
        self.invested = invested;
        Ok(())
    }

    /// Stamp `closed_at` when the fund is full. Returns `true` only on the
    /// transition; an already closed fund keeps its original timestamp.
    pub fn close_if_full(&mut self, now: DateTime<Utc>) -> bool {
        if self.invested == self.target && self.closed_at.is_none() {
            self.closed_at = Some(now);
            return true;
        }
        false
    }
}
