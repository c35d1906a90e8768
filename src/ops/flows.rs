//! Flow creation and update.
//!
//! The store offers no multi-row transaction, so a flow with a recurrence is
//! written in two phases: the schedule row first (its id is embedded in the
//! flow row), then the flow, then an idempotent back-patch of the schedule's
//! `source_flow_id`. The compensation rules live here: a failed flow insert
//! deletes the freshly created schedule (best effort), a failed back-patch is
//! retried once and then accepted as a half-linked pair.

use chrono::Utc;
use uuid::Uuid;

use crate::money::shares_from_metadata;
use crate::{
    CreateFlowCmd, EngineError, Flow, FlowTemplate, OwnerScope, RecurringSchedule, ResultEngine,
    UpdateFlowCmd, flows,
};

use super::{Engine, patch_text};

impl Engine {
    /// Creates a flow, optionally with a recurring schedule and balance
    /// adjustment.
    ///
    /// Structural validation runs before any lookup or write; all reference
    /// checks run concurrently and the first missing reference aborts the
    /// operation. Balance adjustment happens strictly after the flow is
    /// durably created and its failure never rolls the flow back.
    pub async fn create_flow(&self, scope: &OwnerScope, cmd: CreateFlowCmd) -> ResultEngine<Flow> {
        flows::validate_refs(cmd.kind, cmd.from_asset_id, cmd.to_asset_id)?;
        flows::validate_amount(cmd.amount)?;

        tokio::try_join!(
            self.resolve_asset(scope, cmd.from_asset_id, "from_asset"),
            self.resolve_asset(scope, cmd.to_asset_id, "to_asset"),
            self.resolve_debt(scope, cmd.debt_id),
            self.resolve_category(scope, cmd.expense_category_id),
        )?;

        let mut flow = Flow::new(*scope, cmd.kind, cmd.amount, cmd.currency.clone(), cmd.date)?;
        flow.from_asset_id = cmd.from_asset_id;
        flow.to_asset_id = cmd.to_asset_id;
        flow.debt_id = cmd.debt_id;
        flow.category = patch_text(None, cmd.category);
        flow.description = patch_text(None, cmd.description);
        flow.expense_category_id = cmd.expense_category_id;
        flow.metadata = cmd.metadata;
        flow.needs_review = cmd.needs_review;

        // Schedule first so its id can be embedded in the flow row.
        let schedule = match cmd.frequency {
            Some(frequency) => {
                let next_run_date = frequency.advance(flow.date)?;
                let schedule =
                    RecurringSchedule::new(*scope, frequency, next_run_date, template_of(&flow));
                self.store().insert_schedule(&schedule).await?;
                flow.schedule_id = Some(schedule.id);
                Some(schedule)
            }
            None => None,
        };

        if let Err(err) = self.store().insert_flow(&flow).await {
            self.compensate_schedule(schedule.as_ref()).await;
            return Err(err.into());
        }

        if let Some(schedule) = &schedule {
            self.link_schedule_source(schedule.id, flow.id).await;
        }

        if cmd.adjust_balances {
            let shares = shares_from_metadata(&flow.metadata);
            self.apply_flow_adjustments(scope, &flow, flow.amount, shares, Utc::now().date_naive())
                .await;
        }

        Ok(flow)
    }

    /// Updates a flow; `None` fields keep their current value.
    ///
    /// With `adjust_balances` set and a changed amount, the applied delta is
    /// `new - old`, so repeating the same edit is idempotent. A recurrence may
    /// be attached to a flow that has none; cadence changes on an existing
    /// schedule go through [`update_schedule`](Engine::update_schedule).
    pub async fn update_flow(
        &self,
        scope: &OwnerScope,
        flow_id: Uuid,
        cmd: UpdateFlowCmd,
    ) -> ResultEngine<Flow> {
        let current = self
            .store()
            .find_flow(scope, flow_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("flow".to_string()))?;
        let old_amount = current.amount;
        let old_shares = shares_from_metadata(&current.metadata);

        let mut flow = current;
        if let Some(kind) = cmd.kind {
            flow.kind = kind;
        }
        if let Some(amount) = cmd.amount {
            flow.amount = amount;
        }
        if let Some(currency) = cmd.currency {
            flow.currency = currency;
        }
        if let Some(date) = cmd.date {
            flow.date = date;
        }
        if let Some(id) = cmd.from_asset_id {
            flow.from_asset_id = Some(id);
        }
        if let Some(id) = cmd.to_asset_id {
            flow.to_asset_id = Some(id);
        }
        if let Some(id) = cmd.debt_id {
            flow.debt_id = Some(id);
        }
        if let Some(id) = cmd.expense_category_id {
            flow.expense_category_id = Some(id);
        }
        flow.category = patch_text(flow.category.take(), cmd.category);
        flow.description = patch_text(flow.description.take(), cmd.description);
        if let Some(metadata) = cmd.metadata {
            flow.metadata = metadata;
        }
        if let Some(needs_review) = cmd.needs_review {
            flow.needs_review = needs_review;
        }

        flows::validate_refs(flow.kind, flow.from_asset_id, flow.to_asset_id)?;
        flows::validate_amount(flow.amount)?;

        tokio::try_join!(
            self.resolve_asset(scope, flow.from_asset_id, "from_asset"),
            self.resolve_asset(scope, flow.to_asset_id, "to_asset"),
            self.resolve_debt(scope, flow.debt_id),
            self.resolve_category(scope, flow.expense_category_id),
        )?;

        let schedule = match cmd.frequency {
            Some(frequency) => {
                if flow.schedule_id.is_some() {
                    return Err(EngineError::InvalidSchedule(
                        "flow already has a recurring schedule".to_string(),
                    ));
                }
                let next_run_date = frequency.advance(flow.date)?;
                let schedule =
                    RecurringSchedule::new(*scope, frequency, next_run_date, template_of(&flow));
                self.store().insert_schedule(&schedule).await?;
                flow.schedule_id = Some(schedule.id);
                Some(schedule)
            }
            None => None,
        };

        flow.updated_at = Utc::now();
        if let Err(err) = self.store().update_flow(&flow).await {
            self.compensate_schedule(schedule.as_ref()).await;
            return Err(err.into());
        }

        if let Some(schedule) = &schedule {
            self.link_schedule_source(schedule.id, flow.id).await;
        }

        if cmd.adjust_balances {
            let difference = flow.amount - old_amount;
            let new_shares = shares_from_metadata(&flow.metadata);
            let shares_difference = match (old_shares, new_shares) {
                (None, None) => None,
                (old, new) => Some(new.unwrap_or_default() - old.unwrap_or_default()),
            };
            self.apply_flow_adjustments(
                scope,
                &flow,
                difference,
                shares_difference,
                Utc::now().date_naive(),
            )
            .await;
        }

        Ok(flow)
    }

    /// Best-effort removal of a schedule whose flow write failed. No lock
    /// prevents a concurrent actor from having referenced the schedule
    /// already, so a cleanup failure is logged, not retried.
    async fn compensate_schedule(&self, schedule: Option<&RecurringSchedule>) {
        let Some(schedule) = schedule else { return };
        if let Err(err) = self.store().delete_schedule(schedule.id).await {
            tracing::warn!(
                schedule_id = %schedule.id,
                error = %err,
                "failed to delete schedule after flow write failure"
            );
        }
    }

    /// Back-patches `source_flow_id` on the schedule. The patch is idempotent
    /// and retried once; a final failure leaves the pair half-linked, which is
    /// accepted rather than rolling back the flow.
    pub(crate) async fn link_schedule_source(&self, schedule_id: Uuid, flow_id: Uuid) {
        for attempt in 0..2u8 {
            match self.store().link_schedule_source(schedule_id, flow_id).await {
                Ok(()) => return,
                Err(err) if attempt == 0 => {
                    tracing::debug!(
                        %schedule_id,
                        %flow_id,
                        error = %err,
                        "retrying schedule source link"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        %schedule_id,
                        %flow_id,
                        error = %err,
                        "failed to link schedule to its source flow"
                    );
                }
            }
        }
    }
}

/// Snapshot of a flow's fields as a template for its recurrence.
fn template_of(flow: &Flow) -> FlowTemplate {
    FlowTemplate {
        kind: flow.kind,
        amount: flow.amount,
        currency: flow.currency.clone(),
        from_asset_id: flow.from_asset_id,
        to_asset_id: flow.to_asset_id,
        debt_id: flow.debt_id,
        category: flow.category.clone(),
        description: flow.description.clone(),
        expense_category_id: flow.expense_category_id,
        metadata: flow.metadata.clone(),
    }
}
