//! The narrow persistence seam the engine writes through.
//!
//! The engine does not own a schema or a database connection; it consumes a
//! [`LedgerStore`] implemented by the hosting application. The store offers no
//! multi-row transaction, which is why the flow/schedule write path carries its
//! own compensation logic.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::{Asset, Category, Debt, Flow, OwnerScope, RecurringSchedule};

pub mod memory;

/// Failures surfaced by a store implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("write rejected: {0}")]
    Rejected(String),
}

pub type ResultStore<T> = Result<T, StoreError>;

/// Record store for flows, schedules, assets, debts, and categories.
///
/// Lookups are ownership-scoped: a row outside the caller's scope behaves as
/// absent. Balance writes replace the stored value; serialization of
/// concurrent writers is the engine's job.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn find_asset(&self, scope: &OwnerScope, id: Uuid) -> ResultStore<Option<Asset>>;
    async fn find_debt(&self, scope: &OwnerScope, id: Uuid) -> ResultStore<Option<Debt>>;
    async fn find_category(&self, scope: &OwnerScope, id: Uuid) -> ResultStore<Option<Category>>;

    async fn find_flow(&self, scope: &OwnerScope, id: Uuid) -> ResultStore<Option<Flow>>;
    async fn insert_flow(&self, flow: &Flow) -> ResultStore<()>;
    async fn update_flow(&self, flow: &Flow) -> ResultStore<()>;

    async fn find_schedule(
        &self,
        scope: &OwnerScope,
        id: Uuid,
    ) -> ResultStore<Option<RecurringSchedule>>;
    async fn insert_schedule(&self, schedule: &RecurringSchedule) -> ResultStore<()>;
    async fn update_schedule(&self, schedule: &RecurringSchedule) -> ResultStore<()>;
    /// Idempotent back-patch of `source_flow_id`; a no-op when already linked
    /// to the same flow.
    async fn link_schedule_source(&self, schedule_id: Uuid, source_flow_id: Uuid)
    -> ResultStore<()>;
    async fn delete_schedule(&self, id: Uuid) -> ResultStore<()>;
    /// Active schedules with `next_run_date <= today`, in scope.
    async fn due_schedules(
        &self,
        scope: &OwnerScope,
        today: NaiveDate,
    ) -> ResultStore<Vec<RecurringSchedule>>;

    async fn update_asset_balance(&self, id: Uuid, balance: Decimal) -> ResultStore<()>;
    async fn update_debt(&self, debt: &Debt) -> ResultStore<()>;
}
