//! Recurring schedules and next-run-date arithmetic.
//!
//! A schedule loops between "due" (active, `next_run_date <= today`) and
//! "processed" (dates advanced) until it is explicitly deactivated; there is no
//! terminal completed state. Month-based frequencies use calendar arithmetic
//! that clamps to the last day of the target month (Jan 31 + 1 month =
//! Feb 28/29), never rolling over into the following month.

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, FlowTemplate, OwnerScope, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    /// Next run date, one period after `date`.
    ///
    /// Day-based frequencies add fixed day counts; the rest add calendar
    /// months with end-of-month clamping.
    pub fn advance(self, date: NaiveDate) -> ResultEngine<NaiveDate> {
        let next = match self {
            Self::Weekly => date.checked_add_days(Days::new(7)),
            Self::Biweekly => date.checked_add_days(Days::new(14)),
            Self::Monthly => date.checked_add_months(Months::new(1)),
            Self::Quarterly => date.checked_add_months(Months::new(3)),
            Self::Yearly => date.checked_add_months(Months::new(12)),
        };
        next.ok_or_else(|| {
            EngineError::InvalidSchedule("next run date out of range".to_string())
        })
    }
}

impl TryFrom<&str> for Frequency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" => Ok(Self::Yearly),
            other => Err(EngineError::InvalidSchedule(format!(
                "invalid frequency: {other}"
            ))),
        }
    }
}

/// A recurrence rule regenerating flows from an embedded template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecurringSchedule {
    pub id: Uuid,
    pub scope: OwnerScope,
    /// The flow that originally requested the recurrence, once linked.
    pub source_flow_id: Option<Uuid>,
    pub frequency: Frequency,
    pub next_run_date: NaiveDate,
    pub last_run_date: Option<NaiveDate>,
    pub is_active: bool,
    pub template: FlowTemplate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringSchedule {
    #[must_use]
    pub fn new(
        scope: OwnerScope,
        frequency: Frequency,
        next_run_date: NaiveDate,
        template: FlowTemplate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            scope,
            source_flow_id: None,
            frequency,
            next_run_date,
            last_run_date: None,
            is_active: true,
            template,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.is_active && self.next_run_date <= today
    }
}
