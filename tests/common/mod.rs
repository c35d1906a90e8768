#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use flusso::{
    Asset, AssetKind, Category, CurrencyCode, Debt, Engine, FixedRates, Flow, LedgerStore,
    MemoryStore, OwnerScope, RecurringSchedule, StoreError,
};

pub fn eur() -> CurrencyCode {
    CurrencyCode::new("EUR").unwrap()
}

pub fn usd() -> CurrencyCode {
    CurrencyCode::new("USD").unwrap()
}

pub fn gbp() -> CurrencyCode {
    CurrencyCode::new("GBP").unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn scope() -> OwnerScope {
    OwnerScope::User(Uuid::new_v4())
}

/// EUR is the reference unit; 1 reference unit buys 1.08 USD.
pub fn default_rates() -> FixedRates {
    FixedRates::new([(eur(), Decimal::ONE), (usd(), Decimal::new(108, 2))])
}

pub fn build_engine(store: Arc<dyn LedgerStore>) -> Engine {
    Engine::builder()
        .store(store)
        .rates(Arc::new(default_rates()))
        .build()
        .unwrap()
}

pub fn seed_asset(
    store: &MemoryStore,
    scope: OwnerScope,
    kind: AssetKind,
    balance: Decimal,
    currency: CurrencyCode,
) -> Uuid {
    let asset = Asset::new(scope, "seed", kind, balance, currency);
    let id = asset.id;
    store.put_asset(asset);
    id
}

pub fn seed_debt(
    store: &MemoryStore,
    scope: OwnerScope,
    balance: Decimal,
    currency: CurrencyCode,
) -> Uuid {
    let debt = Debt::new(scope, "loan", balance, currency, Decimal::new(10_000, 2));
    let id = debt.id;
    store.put_debt(debt);
    id
}

/// Store wrapper with injectable flow-insert failures, for compensation and
/// batch-isolation tests.
pub struct FailingStore {
    pub inner: MemoryStore,
    fail_all_flow_inserts: AtomicBool,
    fail_for_schedule: std::sync::Mutex<Option<Uuid>>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_all_flow_inserts: AtomicBool::new(false),
            fail_for_schedule: std::sync::Mutex::new(None),
        }
    }

    pub fn fail_all_flow_inserts(&self, fail: bool) {
        self.fail_all_flow_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_flows_of_schedule(&self, schedule_id: Uuid) {
        *self.fail_for_schedule.lock().unwrap() = Some(schedule_id);
    }
}

#[async_trait]
impl LedgerStore for FailingStore {
    async fn find_asset(&self, scope: &OwnerScope, id: Uuid) -> Result<Option<Asset>, StoreError> {
        self.inner.find_asset(scope, id).await
    }

    async fn find_debt(&self, scope: &OwnerScope, id: Uuid) -> Result<Option<Debt>, StoreError> {
        self.inner.find_debt(scope, id).await
    }

    async fn find_category(
        &self,
        scope: &OwnerScope,
        id: Uuid,
    ) -> Result<Option<Category>, StoreError> {
        self.inner.find_category(scope, id).await
    }

    async fn find_flow(&self, scope: &OwnerScope, id: Uuid) -> Result<Option<Flow>, StoreError> {
        self.inner.find_flow(scope, id).await
    }

    async fn insert_flow(&self, flow: &Flow) -> Result<(), StoreError> {
        if self.fail_all_flow_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        let failing = *self.fail_for_schedule.lock().unwrap();
        if failing.is_some() && flow.schedule_id == failing {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        self.inner.insert_flow(flow).await
    }

    async fn update_flow(&self, flow: &Flow) -> Result<(), StoreError> {
        self.inner.update_flow(flow).await
    }

    async fn find_schedule(
        &self,
        scope: &OwnerScope,
        id: Uuid,
    ) -> Result<Option<RecurringSchedule>, StoreError> {
        self.inner.find_schedule(scope, id).await
    }

    async fn insert_schedule(&self, schedule: &RecurringSchedule) -> Result<(), StoreError> {
        self.inner.insert_schedule(schedule).await
    }

    async fn update_schedule(&self, schedule: &RecurringSchedule) -> Result<(), StoreError> {
        self.inner.update_schedule(schedule).await
    }

    async fn link_schedule_source(
        &self,
        schedule_id: Uuid,
        source_flow_id: Uuid,
    ) -> Result<(), StoreError> {
        self.inner
            .link_schedule_source(schedule_id, source_flow_id)
            .await
    }

    async fn delete_schedule(&self, id: Uuid) -> Result<(), StoreError> {
        self.inner.delete_schedule(id).await
    }

    async fn due_schedules(
        &self,
        scope: &OwnerScope,
        today: NaiveDate,
    ) -> Result<Vec<RecurringSchedule>, StoreError> {
        self.inner.due_schedules(scope, today).await
    }

    async fn update_asset_balance(&self, id: Uuid, balance: Decimal) -> Result<(), StoreError> {
        self.inner.update_asset_balance(id, balance).await
    }

    async fn update_debt(&self, debt: &Debt) -> Result<(), StoreError> {
        self.inner.update_debt(debt).await
    }
}
