//! flusso: recurring-flow scheduling and multi-currency balance adjustment
//! for personal-finance ledgers.
//!
//! The engine records money movements ("flows") between external
//! sources/sinks and owned assets or debts, optionally on a recurring
//! cadence. It owns the state-machine behavior of the ledger: structural
//! validation per flow kind, currency conversion over per-operation rate
//! snapshots, balance mutation as a flow side effect, and the schedule
//! lifecycle that regenerates flows from templates.
//!
//! Persistence and rate fetching are collaborators behind the
//! [`LedgerStore`] and [`RateProvider`] seams; the crate ships a
//! [`MemoryStore`] and two providers ([`FixedRates`], [`FrankfurterRates`])
//! to start from.

pub use assets::{Asset, AssetKind, Category, Debt, DebtStatus};
pub use commands::{CreateFlowCmd, CreateScheduleCmd, UpdateFlowCmd, UpdateScheduleCmd};
pub use currency::{CurrencyCode, RateSnapshot};
pub use error::EngineError;
pub use flows::{Flow, FlowKind, FlowTemplate, PAY_DEBT_CATEGORY, validate_refs};
pub use money::{SHARES_KEY, round_money, shares_from_metadata};
pub use ops::{Engine, EngineBuilder, ProcessDueReport, ScheduleFailure};
pub use rates::frankfurter::FrankfurterRates;
pub use rates::{FixedRates, RateError, RateProvider};
pub use schedules::{Frequency, RecurringSchedule};
pub use scope::OwnerScope;
pub use store::memory::MemoryStore;
pub use store::{LedgerStore, ResultStore, StoreError};

mod assets;
mod commands;
mod currency;
mod error;
mod flows;
mod money;
mod ops;
mod rates;
mod schedules;
mod scope;
mod store;

pub type ResultEngine<T> = Result<T, EngineError>;
