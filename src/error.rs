//! The module contains the errors the engine can return.
//!
//! Validation failures (`InvalidFlow`, `InvalidAmount`, `InvalidCurrency`,
//! `InvalidSchedule`, `SharesRequired`) are surfaced before any write.
//! `KeyNotFound` covers references that do not exist or are not owned by the
//! caller's scope. Store failures pass through transparently.

use thiserror::Error;

use crate::store::StoreError;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid flow: {0}")]
    InvalidFlow(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid currency: {0}")]
    InvalidCurrency(String),
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),
    #[error("shares required: {0}")]
    SharesRequired(String),
    #[error("{0} not found")]
    KeyNotFound(String),
    #[error("engine misconfigured: {0}")]
    Configuration(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidFlow(a), Self::InvalidFlow(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidCurrency(a), Self::InvalidCurrency(b)) => a == b,
            (Self::InvalidSchedule(a), Self::InvalidSchedule(b)) => a == b,
            (Self::SharesRequired(a), Self::SharesRequired(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Configuration(a), Self::Configuration(b)) => a == b,
            (Self::Store(a), Self::Store(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
