//! Assets, debts, and categories: the rows the engine mutates or checks.
//!
//! The unit of an asset's `balance` depends on its kind: share-based kinds
//! (stock, ETF, crypto) store a share/unit count, every other kind stores a
//! currency amount denominated in the asset's `currency`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CurrencyCode, EngineError, OwnerScope};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Cash,
    Checking,
    Savings,
    Stock,
    Etf,
    Crypto,
    Property,
    Other,
}

impl AssetKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Checking => "checking",
            Self::Savings => "savings",
            Self::Stock => "stock",
            Self::Etf => "etf",
            Self::Crypto => "crypto",
            Self::Property => "property",
            Self::Other => "other",
        }
    }

    /// Whether `balance` counts shares/units instead of money.
    #[must_use]
    pub fn is_share_based(self) -> bool {
        matches!(self, Self::Stock | Self::Etf | Self::Crypto)
    }
}

impl TryFrom<&str> for AssetKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "checking" => Ok(Self::Checking),
            "savings" => Ok(Self::Savings),
            "stock" => Ok(Self::Stock),
            "etf" => Ok(Self::Etf),
            "crypto" => Ok(Self::Crypto),
            "property" => Ok(Self::Property),
            "other" => Ok(Self::Other),
            other => Err(EngineError::InvalidFlow(format!(
                "invalid asset kind: {other}"
            ))),
        }
    }
}

/// An owned resource with a balance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub scope: OwnerScope,
    pub name: String,
    pub kind: AssetKind,
    /// Share count for share-based kinds, currency amount otherwise.
    pub balance: Decimal,
    pub currency: CurrencyCode,
}

impl Asset {
    #[must_use]
    pub fn new(
        scope: OwnerScope,
        name: impl Into<String>,
        kind: AssetKind,
        balance: Decimal,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            scope,
            name: name.into(),
            kind,
            balance,
            currency,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    Active,
    PaidOff,
}

/// An owned liability tracked down to zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    pub id: Uuid,
    pub scope: OwnerScope,
    pub name: String,
    pub current_balance: Decimal,
    pub currency: CurrencyCode,
    pub monthly_payment: Decimal,
    pub status: DebtStatus,
    pub paid_off_date: Option<NaiveDate>,
}

impl Debt {
    #[must_use]
    pub fn new(
        scope: OwnerScope,
        name: impl Into<String>,
        current_balance: Decimal,
        currency: CurrencyCode,
        monthly_payment: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            scope,
            name: name.into(),
            current_balance,
            currency,
            monthly_payment,
            status: DebtStatus::Active,
            paid_off_date: None,
        }
    }

    #[must_use]
    pub fn is_paid_off(&self) -> bool {
        self.status == DebtStatus::PaidOff
    }
}

/// Expense category; the engine only checks existence and ownership.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub scope: OwnerScope,
    pub name: String,
}

impl Category {
    #[must_use]
    pub fn new(scope: OwnerScope, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            scope,
            name: name.into(),
        }
    }
}
