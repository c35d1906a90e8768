//! Recurring-schedule lifecycle and due-set processing.
//!
//! A schedule advances anchored to its own cadence, not to the processing
//! date: a schedule that has fallen behind catches up exactly one period per
//! `process_due_schedules` invocation. Re-invoking re-queries the due set, so
//! catch-up converges without skipping or compounding periods.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::money::shares_from_metadata;
use crate::{
    CreateScheduleCmd, EngineError, OwnerScope, RecurringSchedule, ResultEngine, UpdateScheduleCmd,
};

use super::Engine;

/// Outcome of one due-processing run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ProcessDueReport {
    pub processed: usize,
    pub created_flows: Vec<Uuid>,
    pub errors: Vec<ScheduleFailure>,
}

/// One schedule's failure, isolated from the rest of the batch.
#[derive(Clone, Debug, Serialize)]
pub struct ScheduleFailure {
    pub schedule_id: Uuid,
    pub error: String,
}

impl Engine {
    /// Creates a schedule directly from a template (not derived from a flow).
    pub async fn create_schedule(
        &self,
        scope: &OwnerScope,
        cmd: CreateScheduleCmd,
    ) -> ResultEngine<RecurringSchedule> {
        cmd.template.validate()?;
        tokio::try_join!(
            self.resolve_asset(scope, cmd.template.from_asset_id, "from_asset"),
            self.resolve_asset(scope, cmd.template.to_asset_id, "to_asset"),
            self.resolve_debt(scope, cmd.template.debt_id),
            self.resolve_category(scope, cmd.template.expense_category_id),
        )?;

        let mut schedule =
            RecurringSchedule::new(*scope, cmd.frequency, cmd.next_run_date, cmd.template);
        schedule.source_flow_id = cmd.source_flow_id;
        self.store().insert_schedule(&schedule).await?;
        Ok(schedule)
    }

    /// Patches a schedule; `None` fields keep their current value.
    pub async fn update_schedule(
        &self,
        scope: &OwnerScope,
        schedule_id: Uuid,
        cmd: UpdateScheduleCmd,
    ) -> ResultEngine<RecurringSchedule> {
        let mut schedule = self
            .store()
            .find_schedule(scope, schedule_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("schedule".to_string()))?;

        if let Some(frequency) = cmd.frequency {
            schedule.frequency = frequency;
        }
        if let Some(next_run_date) = cmd.next_run_date {
            schedule.next_run_date = next_run_date;
        }
        if let Some(is_active) = cmd.is_active {
            schedule.is_active = is_active;
        }
        if let Some(template) = cmd.template {
            template.validate()?;
            tokio::try_join!(
                self.resolve_asset(scope, template.from_asset_id, "from_asset"),
                self.resolve_asset(scope, template.to_asset_id, "to_asset"),
                self.resolve_debt(scope, template.debt_id),
                self.resolve_category(scope, template.expense_category_id),
            )?;
            schedule.template = template;
        }

        schedule.updated_at = Utc::now();
        self.store().update_schedule(&schedule).await?;
        Ok(schedule)
    }

    /// Deactivates a schedule. Schedules are never deleted implicitly; an
    /// inactive one simply stops appearing in the due set.
    pub async fn deactivate_schedule(
        &self,
        scope: &OwnerScope,
        schedule_id: Uuid,
    ) -> ResultEngine<RecurringSchedule> {
        self.update_schedule(scope, schedule_id, UpdateScheduleCmd::new().is_active(false))
            .await
    }

    /// Processes every active schedule with `next_run_date <= today`.
    ///
    /// Schedules are processed independently: one failure lands in the
    /// report's error list and the batch continues.
    pub async fn process_due_schedules(
        &self,
        scope: &OwnerScope,
        today: NaiveDate,
    ) -> ResultEngine<ProcessDueReport> {
        let due = self.store().due_schedules(scope, today).await?;
        tracing::debug!(count = due.len(), %today, "processing due schedules");

        let mut report = ProcessDueReport::default();
        for schedule in due {
            match self.process_schedule(scope, &schedule, today).await {
                Ok(flow_id) => {
                    report.processed += 1;
                    report.created_flows.push(flow_id);
                }
                Err(err) => {
                    tracing::warn!(
                        schedule_id = %schedule.id,
                        error = %err,
                        "schedule processing failed"
                    );
                    report.errors.push(ScheduleFailure {
                        schedule_id: schedule.id,
                        error: err.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    async fn process_schedule(
        &self,
        scope: &OwnerScope,
        schedule: &RecurringSchedule,
        today: NaiveDate,
    ) -> ResultEngine<Uuid> {
        let flow = schedule
            .template
            .instantiate(*scope, schedule.id, schedule.next_run_date)?;
        self.store().insert_flow(&flow).await?;

        let shares = shares_from_metadata(&flow.metadata);
        self.apply_flow_adjustments(scope, &flow, flow.amount, shares, today)
            .await;

        let mut advanced = schedule.clone();
        advanced.last_run_date = Some(schedule.next_run_date);
        advanced.next_run_date = schedule.frequency.advance(schedule.next_run_date)?;
        advanced.updated_at = Utc::now();
        self.store().update_schedule(&advanced).await?;
        Ok(flow.id)
    }
}
