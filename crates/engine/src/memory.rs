//! In-process [`Repository`].
//!
//! Same semantics as the SQL repository (ordering, compare-and-swap, ledger)
//! without a database. `fail_persist_after` makes the store "unreachable"
//! after a number of successful writes.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use sea_orm::DbErr;

use crate::{Allocation, EngineError, Fund, FundKind, ResultEngine, repository::Repository};

#[derive(Debug, Default)]
struct State {
    funds: HashMap<(FundKind, i64), Fund>,
    allocations: Vec<Allocation>,
    persisted: usize,
    fail_persist_after: Option<usize>,
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `fund` as is, replacing any previous value.
    pub fn insert(&self, fund: Fund) {
        self.state().funds.insert((fund.kind, fund.id), fund);
    }

    pub fn fund(&self, kind: FundKind, id: i64) -> Option<Fund> {
        self.state().funds.get(&(kind, id)).cloned()
    }

    pub fn allocations(&self) -> Vec<Allocation> {
        self.state().allocations.clone()
    }

    /// Number of successful `persist` calls so far.
    pub fn persisted(&self) -> usize {
        self.state().persisted
    }

    /// Fail every `persist` once `writes` of them have succeeded.
    pub fn fail_persist_after(&self, writes: usize) {
        self.state().fail_persist_after = Some(writes);
    }

    fn open(&self, kind: FundKind) -> Vec<Fund> {
        let mut open: Vec<Fund> = self
            .state()
            .funds
            .values()
            .filter(|fund| fund.kind == kind && !fund.is_closed())
            .cloned()
            .collect();
        open.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        open
    }

    fn write(&self, fund: &mut Fund) -> ResultEngine<()> {
        let mut state = self.state();
        if state
            .fail_persist_after
            .is_some_and(|limit| state.persisted >= limit)
        {
            return Err(EngineError::Database(DbErr::Custom(
                "store unreachable".to_string(),
            )));
        }
        let stored = state
            .funds
            .get(&(fund.kind, fund.id))
            .ok_or_else(|| EngineError::KeyNotFound(fund.label()))?;
        if stored.invested != fund.stored_invested() {
            return Err(EngineError::Conflict(format!(
                "{} changed since it was read",
                fund.label()
            )));
        }
        fund.check()?;
        fund.mark_persisted();
        state.funds.insert((fund.kind, fund.id), fund.clone());
        state.persisted += 1;
        Ok(())
    }

    fn read(&self, fund: &Fund) -> ResultEngine<Fund> {
        self.fund(fund.kind, fund.id)
            .ok_or_else(|| EngineError::KeyNotFound(fund.label()))
    }

    fn append(&self, allocation: &Allocation) -> Allocation {
        let mut state = self.state();
        let mut recorded = allocation.clone();
        recorded.id = Some(state.allocations.len() as i64 + 1);
        state.allocations.push(recorded.clone());
        recorded
    }
}

impl Repository for MemoryRepository {
    async fn list_open(&self, kind: FundKind) -> ResultEngine<Vec<Fund>> {
        Ok(self.open(kind))
    }

    async fn persist(&self, fund: &mut Fund) -> ResultEngine<()> {
        self.write(fund)
    }

    async fn refresh(&self, fund: &Fund) -> ResultEngine<Fund> {
        self.read(fund)
    }

    async fn record_allocation(&self, allocation: &Allocation) -> ResultEngine<Allocation> {
        Ok(self.append(allocation))
    }
}
