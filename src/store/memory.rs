//! In-memory [`LedgerStore`] for embedding, examples, and tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Asset, Category, Debt, Flow, OwnerScope, RecurringSchedule};

use super::{LedgerStore, ResultStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    assets: HashMap<Uuid, Asset>,
    debts: HashMap<Uuid, Debt>,
    categories: HashMap<Uuid, Category>,
    flows: HashMap<Uuid, Flow>,
    schedules: HashMap<Uuid, RecurringSchedule>,
}

/// Thread-safe in-memory store backed by hash maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seeds an asset row.
    pub fn put_asset(&self, asset: Asset) {
        self.inner().assets.insert(asset.id, asset);
    }

    /// Seeds a debt row.
    pub fn put_debt(&self, debt: Debt) {
        self.inner().debts.insert(debt.id, debt);
    }

    /// Seeds a category row.
    pub fn put_category(&self, category: Category) {
        self.inner().categories.insert(category.id, category);
    }

    /// Reads an asset row regardless of scope.
    #[must_use]
    pub fn asset(&self, id: Uuid) -> Option<Asset> {
        self.inner().assets.get(&id).cloned()
    }

    /// Reads a debt row regardless of scope.
    #[must_use]
    pub fn debt(&self, id: Uuid) -> Option<Debt> {
        self.inner().debts.get(&id).cloned()
    }

    /// Reads a flow row regardless of scope.
    #[must_use]
    pub fn flow(&self, id: Uuid) -> Option<Flow> {
        self.inner().flows.get(&id).cloned()
    }

    /// Reads a schedule row regardless of scope.
    #[must_use]
    pub fn schedule(&self, id: Uuid) -> Option<RecurringSchedule> {
        self.inner().schedules.get(&id).cloned()
    }

    /// All flows generated by a schedule, oldest first.
    #[must_use]
    pub fn flows_for_schedule(&self, schedule_id: Uuid) -> Vec<Flow> {
        let mut flows: Vec<Flow> = self
            .inner()
            .flows
            .values()
            .filter(|flow| flow.schedule_id == Some(schedule_id))
            .cloned()
            .collect();
        flows.sort_by_key(|flow| (flow.date, flow.id));
        flows
    }

    /// Number of stored flows.
    #[must_use]
    pub fn flow_count(&self) -> usize {
        self.inner().flows.len()
    }

    /// Number of stored schedules.
    #[must_use]
    pub fn schedule_count(&self) -> usize {
        self.inner().schedules.len()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn find_asset(&self, scope: &OwnerScope, id: Uuid) -> ResultStore<Option<Asset>> {
        Ok(self
            .inner()
            .assets
            .get(&id)
            .filter(|asset| asset.scope == *scope)
            .cloned())
    }

    async fn find_debt(&self, scope: &OwnerScope, id: Uuid) -> ResultStore<Option<Debt>> {
        Ok(self
            .inner()
            .debts
            .get(&id)
            .filter(|debt| debt.scope == *scope)
            .cloned())
    }

    async fn find_category(&self, scope: &OwnerScope, id: Uuid) -> ResultStore<Option<Category>> {
        Ok(self
            .inner()
            .categories
            .get(&id)
            .filter(|category| category.scope == *scope)
            .cloned())
    }

    async fn find_flow(&self, scope: &OwnerScope, id: Uuid) -> ResultStore<Option<Flow>> {
        Ok(self
            .inner()
            .flows
            .get(&id)
            .filter(|flow| flow.scope == *scope)
            .cloned())
    }

    async fn insert_flow(&self, flow: &Flow) -> ResultStore<()> {
        let mut inner = self.inner();
        if inner.flows.contains_key(&flow.id) {
            return Err(StoreError::Rejected(format!(
                "flow {} already exists",
                flow.id
            )));
        }
        inner.flows.insert(flow.id, flow.clone());
        Ok(())
    }

    async fn update_flow(&self, flow: &Flow) -> ResultStore<()> {
        let mut inner = self.inner();
        if !inner.flows.contains_key(&flow.id) {
            return Err(StoreError::Rejected(format!("flow {} missing", flow.id)));
        }
        inner.flows.insert(flow.id, flow.clone());
        Ok(())
    }

    async fn find_schedule(
        &self,
        scope: &OwnerScope,
        id: Uuid,
    ) -> ResultStore<Option<RecurringSchedule>> {
        Ok(self
            .inner()
            .schedules
            .get(&id)
            .filter(|schedule| schedule.scope == *scope)
            .cloned())
    }

    async fn insert_schedule(&self, schedule: &RecurringSchedule) -> ResultStore<()> {
        let mut inner = self.inner();
        if inner.schedules.contains_key(&schedule.id) {
            return Err(StoreError::Rejected(format!(
                "schedule {} already exists",
                schedule.id
            )));
        }
        inner.schedules.insert(schedule.id, schedule.clone());
        Ok(())
    }

    async fn update_schedule(&self, schedule: &RecurringSchedule) -> ResultStore<()> {
        let mut inner = self.inner();
        if !inner.schedules.contains_key(&schedule.id) {
            return Err(StoreError::Rejected(format!(
                "schedule {} missing",
                schedule.id
            )));
        }
        inner.schedules.insert(schedule.id, schedule.clone());
        Ok(())
    }

    async fn link_schedule_source(
        &self,
        schedule_id: Uuid,
        source_flow_id: Uuid,
    ) -> ResultStore<()> {
        let mut inner = self.inner();
        let schedule = inner
            .schedules
            .get_mut(&schedule_id)
            .ok_or_else(|| StoreError::Rejected(format!("schedule {schedule_id} missing")))?;
        schedule.source_flow_id = Some(source_flow_id);
        Ok(())
    }

    async fn delete_schedule(&self, id: Uuid) -> ResultStore<()> {
        self.inner().schedules.remove(&id);
        Ok(())
    }

    async fn due_schedules(
        &self,
        scope: &OwnerScope,
        today: NaiveDate,
    ) -> ResultStore<Vec<RecurringSchedule>> {
        let mut due: Vec<RecurringSchedule> = self
            .inner()
            .schedules
            .values()
            .filter(|schedule| schedule.scope == *scope && schedule.is_due(today))
            .cloned()
            .collect();
        due.sort_by_key(|schedule| (schedule.next_run_date, schedule.id));
        Ok(due)
    }

    async fn update_asset_balance(&self, id: Uuid, balance: Decimal) -> ResultStore<()> {
        let mut inner = self.inner();
        let asset = inner
            .assets
            .get_mut(&id)
            .ok_or_else(|| StoreError::Rejected(format!("asset {id} missing")))?;
        asset.balance = balance;
        Ok(())
    }

    async fn update_debt(&self, debt: &Debt) -> ResultStore<()> {
        let mut inner = self.inner();
        if !inner.debts.contains_key(&debt.id) {
            return Err(StoreError::Rejected(format!("debt {} missing", debt.id)));
        }
        inner.debts.insert(debt.id, debt.clone());
        Ok(())
    }
}
