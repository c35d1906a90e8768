//! Flow primitives.
//!
//! A `Flow` is a single recorded money movement between external sources/sinks
//! and owned assets or debts. The structural contract between a flow's kind
//! and its asset references is enforced by [`validate_refs`] before any lookup
//! or write happens.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{CurrencyCode, EngineError, OwnerScope, ResultEngine};

/// Category tag marking a flow as a debt payment.
pub const PAY_DEBT_CATEGORY: &str = "pay_debt";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Income,
    Expense,
    Transfer,
    Other,
}

impl FlowKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
            Self::Other => "other",
        }
    }
}

impl TryFrom<&str> for FlowKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "transfer" => Ok(Self::Transfer),
            "other" => Ok(Self::Other),
            other => Err(EngineError::InvalidFlow(format!(
                "invalid flow kind: {other}"
            ))),
        }
    }
}

/// Checks the structural contract between a flow kind and its asset refs.
///
/// - `income`: `to_asset_id` required (`from_asset_id` may reference e.g. the
///   stock paying a dividend)
/// - `expense`: `from_asset_id` required, `to_asset_id` must be absent
/// - `transfer`: both required and distinct
/// - `other`: unconstrained, used for manual corrections
///
/// Pure and side-effect free; runs before any ownership lookup.
pub fn validate_refs(
    kind: FlowKind,
    from_asset_id: Option<Uuid>,
    to_asset_id: Option<Uuid>,
) -> ResultEngine<()> {
    match kind {
        FlowKind::Income => {
            if to_asset_id.is_none() {
                return Err(EngineError::InvalidFlow(
                    "income requires to_asset_id".to_string(),
                ));
            }
        }
        FlowKind::Expense => {
            if from_asset_id.is_none() {
                return Err(EngineError::InvalidFlow(
                    "expense requires from_asset_id".to_string(),
                ));
            }
            if to_asset_id.is_some() {
                return Err(EngineError::InvalidFlow(
                    "expense must not set to_asset_id".to_string(),
                ));
            }
        }
        FlowKind::Transfer => {
            let (Some(from), Some(to)) = (from_asset_id, to_asset_id) else {
                return Err(EngineError::InvalidFlow(
                    "transfer requires from_asset_id and to_asset_id".to_string(),
                ));
            };
            if from == to {
                return Err(EngineError::InvalidFlow(
                    "from_asset_id and to_asset_id must differ".to_string(),
                ));
            }
        }
        FlowKind::Other => {}
    }
    Ok(())
}

/// Validates that an amount is strictly positive.
pub fn validate_amount(amount: Decimal) -> ResultEngine<()> {
    if amount <= Decimal::ZERO {
        return Err(EngineError::InvalidAmount(
            "amount must be > 0".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub id: Uuid,
    pub scope: OwnerScope,
    pub kind: FlowKind,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub from_asset_id: Option<Uuid>,
    pub to_asset_id: Option<Uuid>,
    pub debt_id: Option<Uuid>,
    pub category: Option<String>,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub expense_category_id: Option<Uuid>,
    /// Back-reference to the schedule that generated this flow, if any.
    pub schedule_id: Option<Uuid>,
    /// Opaque metadata; may carry `"shares"` for share-based assets.
    pub metadata: Map<String, Value>,
    pub needs_review: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Flow {
    /// Builds a flow with the required fields; optional references default to
    /// absent. Fails on a non-positive amount.
    pub fn new(
        scope: OwnerScope,
        kind: FlowKind,
        amount: Decimal,
        currency: CurrencyCode,
        date: NaiveDate,
    ) -> ResultEngine<Self> {
        validate_amount(amount)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            scope,
            kind,
            amount,
            currency,
            from_asset_id: None,
            to_asset_id: None,
            debt_id: None,
            category: None,
            date,
            description: None,
            expense_category_id: None,
            schedule_id: None,
            metadata: Map::new(),
            needs_review: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether this flow pays down the referenced debt.
    #[must_use]
    pub fn is_debt_payment(&self) -> bool {
        self.debt_id.is_some() && self.category.as_deref() == Some(PAY_DEBT_CATEGORY)
    }
}

/// Immutable snapshot of the fields needed to regenerate a flow.
///
/// Embedded in a schedule and used verbatim (with the date substituted) to
/// synthesize new flows. A template carries no frequency: generated flows are
/// never themselves recurring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowTemplate {
    pub kind: FlowKind,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub from_asset_id: Option<Uuid>,
    pub to_asset_id: Option<Uuid>,
    pub debt_id: Option<Uuid>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub expense_category_id: Option<Uuid>,
    pub metadata: Map<String, Value>,
}

impl FlowTemplate {
    /// Validates the template's own invariants (structure and amount).
    pub fn validate(&self) -> ResultEngine<()> {
        validate_refs(self.kind, self.from_asset_id, self.to_asset_id)?;
        validate_amount(self.amount)
    }

    /// Synthesizes a flow from the template, dated `date` and linked back to
    /// `schedule_id`. Generated flows never need review.
    pub fn instantiate(
        &self,
        scope: OwnerScope,
        schedule_id: Uuid,
        date: NaiveDate,
    ) -> ResultEngine<Flow> {
        self.validate()?;
        let mut flow = Flow::new(scope, self.kind, self.amount, self.currency.clone(), date)?;
        flow.from_asset_id = self.from_asset_id;
        flow.to_asset_id = self.to_asset_id;
        flow.debt_id = self.debt_id;
        flow.category = self.category.clone();
        flow.description = self.description.clone();
        flow.expense_category_id = self.expense_category_id;
        flow.schedule_id = Some(schedule_id);
        flow.metadata = self.metadata.clone();
        flow.needs_review = false;
        Ok(flow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn income_requires_target() {
        let (from, to) = ids();
        assert!(validate_refs(FlowKind::Income, None, Some(to)).is_ok());
        assert!(validate_refs(FlowKind::Income, Some(from), Some(to)).is_ok());
        assert_eq!(
            validate_refs(FlowKind::Income, Some(from), None),
            Err(EngineError::InvalidFlow(
                "income requires to_asset_id".to_string()
            ))
        );
    }

    #[test]
    fn expense_rejects_target() {
        let (from, to) = ids();
        assert!(validate_refs(FlowKind::Expense, Some(from), None).is_ok());
        assert!(validate_refs(FlowKind::Expense, None, None).is_err());
        assert_eq!(
            validate_refs(FlowKind::Expense, Some(from), Some(to)),
            Err(EngineError::InvalidFlow(
                "expense must not set to_asset_id".to_string()
            ))
        );
    }

    #[test]
    fn transfer_rejects_self_transfer() {
        let (from, to) = ids();
        assert!(validate_refs(FlowKind::Transfer, Some(from), Some(to)).is_ok());
        assert!(validate_refs(FlowKind::Transfer, Some(from), None).is_err());
        assert_eq!(
            validate_refs(FlowKind::Transfer, Some(from), Some(from)),
            Err(EngineError::InvalidFlow(
                "from_asset_id and to_asset_id must differ".to_string()
            ))
        );
    }

    #[test]
    fn other_is_unconstrained() {
        let (from, _) = ids();
        assert!(validate_refs(FlowKind::Other, None, None).is_ok());
        assert!(validate_refs(FlowKind::Other, Some(from), None).is_ok());
    }

    #[test]
    fn flow_rejects_non_positive_amounts() {
        let scope = OwnerScope::User(Uuid::new_v4());
        let eur = CurrencyCode::new("EUR").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert!(Flow::new(scope, FlowKind::Income, Decimal::ZERO, eur.clone(), date).is_err());
        assert!(Flow::new(scope, FlowKind::Income, Decimal::new(-100, 2), eur, date).is_err());
    }

    #[test]
    fn template_instantiation_links_schedule() {
        let scope = OwnerScope::User(Uuid::new_v4());
        let (_, to) = ids();
        let template = FlowTemplate {
            kind: FlowKind::Income,
            amount: Decimal::new(100_000, 2),
            currency: CurrencyCode::new("USD").unwrap(),
            from_asset_id: None,
            to_asset_id: Some(to),
            debt_id: None,
            category: Some("salary".to_string()),
            description: None,
            expense_category_id: None,
            metadata: Map::new(),
        };
        let schedule_id = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let flow = template.instantiate(scope, schedule_id, date).unwrap();
        assert_eq!(flow.schedule_id, Some(schedule_id));
        assert_eq!(flow.date, date);
        assert_eq!(flow.to_asset_id, Some(to));
        assert!(!flow.needs_review);
    }
}
