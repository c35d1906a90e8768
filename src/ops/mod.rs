use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::rates::RateProvider;
use crate::store::LedgerStore;
use crate::{
    Asset, Category, CurrencyCode, Debt, EngineError, OwnerScope, RateSnapshot, ResultEngine,
};

mod balances;
mod flows;
mod schedules;

pub use schedules::{ProcessDueReport, ScheduleFailure};

/// Serializes balance mutations per asset/debt id.
///
/// The store offers no atomic increment, so without this two concurrent
/// operations on the same target could lose an update between their read and
/// their write.
#[derive(Default)]
struct BalanceLocks {
    inner: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl BalanceLocks {
    async fn acquire(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.entry(id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// The recurring-flow and balance-adjustment engine.
///
/// Owns no persistence: every row goes through the [`LedgerStore`] seam, and
/// exchange rates come from a [`RateProvider`], fetched once per operation.
pub struct Engine {
    store: Arc<dyn LedgerStore>,
    rates: Arc<dyn RateProvider>,
    balance_locks: BalanceLocks,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub(crate) fn store(&self) -> &dyn LedgerStore {
        self.store.as_ref()
    }

    pub(crate) async fn lock_balance(&self, id: Uuid) -> OwnedMutexGuard<()> {
        self.balance_locks.acquire(id).await
    }

    /// Fetches a rate snapshot for the given codes.
    ///
    /// A provider failure degrades to an empty snapshot: the engine's
    /// convention is to proceed with unconverted amounts, never to block a
    /// write on the rate source.
    pub async fn rate_snapshot(&self, codes: &HashSet<CurrencyCode>) -> RateSnapshot {
        match self.rates.rates(codes).await {
            Ok(rates) => RateSnapshot::new(rates),
            Err(err) => {
                tracing::warn!(error = %err, "rate fetch failed; proceeding without conversion");
                RateSnapshot::empty()
            }
        }
    }

    pub(crate) async fn resolve_asset(
        &self,
        scope: &OwnerScope,
        id: Option<Uuid>,
        label: &str,
    ) -> ResultEngine<Option<Asset>> {
        match id {
            None => Ok(None),
            Some(id) => {
                let asset = self
                    .store
                    .find_asset(scope, id)
                    .await?
                    .ok_or_else(|| EngineError::KeyNotFound(label.to_string()))?;
                Ok(Some(asset))
            }
        }
    }

    pub(crate) async fn resolve_debt(
        &self,
        scope: &OwnerScope,
        id: Option<Uuid>,
    ) -> ResultEngine<Option<Debt>> {
        match id {
            None => Ok(None),
            Some(id) => {
                let debt = self
                    .store
                    .find_debt(scope, id)
                    .await?
                    .ok_or_else(|| EngineError::KeyNotFound("debt".to_string()))?;
                Ok(Some(debt))
            }
        }
    }

    pub(crate) async fn resolve_category(
        &self,
        scope: &OwnerScope,
        id: Option<Uuid>,
    ) -> ResultEngine<Option<Category>> {
        match id {
            None => Ok(None),
            Some(id) => {
                let category = self
                    .store
                    .find_category(scope, id)
                    .await?
                    .ok_or_else(|| EngineError::KeyNotFound("category".to_string()))?;
                Ok(Some(category))
            }
        }
    }
}

/// Applies a text patch: `Some` replaces (normalized empty clears), `None`
/// keeps the current value.
pub(crate) fn patch_text(current: Option<String>, patch: Option<String>) -> Option<String> {
    match patch {
        None => current,
        Some(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Arc<dyn LedgerStore>>,
    rates: Option<Arc<dyn RateProvider>>,
}

impl EngineBuilder {
    /// Pass the required record store.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn LedgerStore>) -> EngineBuilder {
        self.store = Some(store);
        self
    }

    /// Pass the required exchange-rate provider.
    #[must_use]
    pub fn rates(mut self, rates: Arc<dyn RateProvider>) -> EngineBuilder {
        self.rates = Some(rates);
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> ResultEngine<Engine> {
        let store = self
            .store
            .ok_or_else(|| EngineError::Configuration("missing store".to_string()))?;
        let rates = self
            .rates
            .ok_or_else(|| EngineError::Configuration("missing rate provider".to_string()))?;
        Ok(Engine {
            store,
            rates,
            balance_locks: BalanceLocks::default(),
        })
    }
}
