//! Command structs for engine operations.
//!
//! These types group parameters for write operations (flow create/update,
//! schedule create/update), keeping call sites readable and avoiding long
//! argument lists.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{CurrencyCode, FlowKind, FlowTemplate, Frequency};

/// Create a flow, optionally with a recurrence and balance adjustment.
#[derive(Clone, Debug)]
pub struct CreateFlowCmd {
    pub kind: FlowKind,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub date: NaiveDate,
    pub from_asset_id: Option<Uuid>,
    pub to_asset_id: Option<Uuid>,
    pub debt_id: Option<Uuid>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub expense_category_id: Option<Uuid>,
    pub metadata: Map<String, Value>,
    pub needs_review: bool,
    /// When set, a recurring schedule is created alongside the flow.
    pub frequency: Option<Frequency>,
    /// When set, asset/debt balances are mutated after the flow is created.
    pub adjust_balances: bool,
}

impl CreateFlowCmd {
    #[must_use]
    pub fn new(kind: FlowKind, amount: Decimal, currency: CurrencyCode, date: NaiveDate) -> Self {
        Self {
            kind,
            amount,
            currency,
            date,
            from_asset_id: None,
            to_asset_id: None,
            debt_id: None,
            category: None,
            description: None,
            expense_category_id: None,
            metadata: Map::new(),
            needs_review: false,
            frequency: None,
            adjust_balances: false,
        }
    }

    #[must_use]
    pub fn from_asset_id(mut self, id: Uuid) -> Self {
        self.from_asset_id = Some(id);
        self
    }

    #[must_use]
    pub fn to_asset_id(mut self, id: Uuid) -> Self {
        self.to_asset_id = Some(id);
        self
    }

    #[must_use]
    pub fn debt_id(mut self, id: Uuid) -> Self {
        self.debt_id = Some(id);
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn expense_category_id(mut self, id: Uuid) -> Self {
        self.expense_category_id = Some(id);
        self
    }

    #[must_use]
    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn needs_review(mut self, needs_review: bool) -> Self {
        self.needs_review = needs_review;
        self
    }

    #[must_use]
    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    #[must_use]
    pub fn adjust_balances(mut self, adjust: bool) -> Self {
        self.adjust_balances = adjust;
        self
    }
}

/// Update an existing flow. `None` fields keep their current value.
#[derive(Clone, Debug, Default)]
pub struct UpdateFlowCmd {
    pub kind: Option<FlowKind>,
    pub amount: Option<Decimal>,
    pub currency: Option<CurrencyCode>,
    pub date: Option<NaiveDate>,
    pub from_asset_id: Option<Uuid>,
    pub to_asset_id: Option<Uuid>,
    pub debt_id: Option<Uuid>,
    /// `Some("")` clears the category.
    pub category: Option<String>,
    /// `Some("")` clears the description.
    pub description: Option<String>,
    pub expense_category_id: Option<Uuid>,
    /// Replaces the whole metadata map when set.
    pub metadata: Option<Map<String, Value>>,
    pub needs_review: Option<bool>,
    /// Attaches a recurrence to a flow that has none.
    pub frequency: Option<Frequency>,
    /// When set and the amount changed, the difference is applied to balances.
    pub adjust_balances: bool,
}

impl UpdateFlowCmd {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn kind(mut self, kind: FlowKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: CurrencyCode) -> Self {
        self.currency = Some(currency);
        self
    }

    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn from_asset_id(mut self, id: Uuid) -> Self {
        self.from_asset_id = Some(id);
        self
    }

    #[must_use]
    pub fn to_asset_id(mut self, id: Uuid) -> Self {
        self.to_asset_id = Some(id);
        self
    }

    #[must_use]
    pub fn debt_id(mut self, id: Uuid) -> Self {
        self.debt_id = Some(id);
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn expense_category_id(mut self, id: Uuid) -> Self {
        self.expense_category_id = Some(id);
        self
    }

    #[must_use]
    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    #[must_use]
    pub fn needs_review(mut self, needs_review: bool) -> Self {
        self.needs_review = Some(needs_review);
        self
    }

    #[must_use]
    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    #[must_use]
    pub fn adjust_balances(mut self, adjust: bool) -> Self {
        self.adjust_balances = adjust;
        self
    }
}

/// Create a recurring schedule directly (not derived from a flow).
#[derive(Clone, Debug)]
pub struct CreateScheduleCmd {
    pub frequency: Frequency,
    pub next_run_date: NaiveDate,
    pub template: FlowTemplate,
    pub source_flow_id: Option<Uuid>,
}

impl CreateScheduleCmd {
    #[must_use]
    pub fn new(frequency: Frequency, next_run_date: NaiveDate, template: FlowTemplate) -> Self {
        Self {
            frequency,
            next_run_date,
            template,
            source_flow_id: None,
        }
    }

    #[must_use]
    pub fn source_flow_id(mut self, id: Uuid) -> Self {
        self.source_flow_id = Some(id);
        self
    }
}

/// Update a recurring schedule. `None` fields keep their current value.
#[derive(Clone, Debug, Default)]
pub struct UpdateScheduleCmd {
    pub frequency: Option<Frequency>,
    pub next_run_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
    pub template: Option<FlowTemplate>,
}

impl UpdateScheduleCmd {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    #[must_use]
    pub fn next_run_date(mut self, date: NaiveDate) -> Self {
        self.next_run_date = Some(date);
        self
    }

    #[must_use]
    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    #[must_use]
    pub fn template(mut self, template: FlowTemplate) -> Self {
        self.template = Some(template);
        self
    }
}
