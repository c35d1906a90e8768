//! Balance adjustment: the only code that mutates asset and debt balances.
//!
//! Every mutation is a read-modify-write executed under the per-target lock
//! owned by the engine, so concurrent flows touching the same asset cannot
//! lose updates. Currency conversion goes through the operation's rate
//! snapshot; a missing rate falls back to the unconverted amount.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::money::round_money;
use crate::{
    CurrencyCode, DebtStatus, EngineError, Flow, FlowKind, OwnerScope, RateSnapshot, ResultEngine,
};

use super::Engine;

impl Engine {
    /// Applies a signed delta to an asset balance and returns the new balance.
    ///
    /// Share-based assets move by `shares_delta` alone; shares are a unit
    /// count, not money, so no conversion happens. A share-based asset with no
    /// shares delta is rejected instead of mixing a converted currency amount
    /// into a share count.
    pub(crate) async fn adjust_asset_balance(
        &self,
        scope: &OwnerScope,
        asset_id: Uuid,
        flow_currency: &CurrencyCode,
        delta: Decimal,
        shares_delta: Option<Decimal>,
        snapshot: &RateSnapshot,
    ) -> ResultEngine<Decimal> {
        let _guard = self.lock_balance(asset_id).await;
        let asset = self
            .store()
            .find_asset(scope, asset_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("asset".to_string()))?;

        let new_balance = if asset.kind.is_share_based() {
            let shares = shares_delta.ok_or_else(|| {
                EngineError::SharesRequired(format!(
                    "asset {} is {} and the flow carries no shares",
                    asset.id,
                    asset.kind.as_str(),
                ))
            })?;
            asset.balance + shares
        } else {
            let converted = snapshot.convert_or_raw(delta, flow_currency, &asset.currency);
            round_money(asset.balance + converted)
        };

        self.store()
            .update_asset_balance(asset_id, new_balance)
            .await?;
        Ok(new_balance)
    }

    /// Decrements a debt by a payment amount and returns the new balance.
    ///
    /// The balance is clamped at 0; hitting the clamp flips the debt to
    /// paid-off and stamps `today`. A paid-off debt never transitions back.
    pub(crate) async fn apply_debt_payment(
        &self,
        scope: &OwnerScope,
        debt_id: Uuid,
        flow_currency: &CurrencyCode,
        amount: Decimal,
        snapshot: &RateSnapshot,
        today: NaiveDate,
    ) -> ResultEngine<Decimal> {
        let _guard = self.lock_balance(debt_id).await;
        let mut debt = self
            .store()
            .find_debt(scope, debt_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("debt".to_string()))?;

        let converted = snapshot.convert_or_raw(amount, flow_currency, &debt.currency);
        let mut new_balance = round_money(debt.current_balance - converted);
        if new_balance <= Decimal::ZERO {
            new_balance = Decimal::ZERO;
            if !debt.is_paid_off() {
                debt.status = DebtStatus::PaidOff;
                debt.paid_off_date = Some(today);
            }
        }
        debt.current_balance = new_balance;

        self.store().update_debt(&debt).await?;
        Ok(new_balance)
    }

    /// Runs the balance adjustments a flow implies: income credits its target,
    /// expense debits its source, transfer does both (concurrently, each leg
    /// independent), and a `pay_debt` flow additionally pays down its debt.
    ///
    /// Called strictly after the flow is durably written; failures are logged
    /// and never roll the flow back.
    pub(crate) async fn apply_flow_adjustments(
        &self,
        scope: &OwnerScope,
        flow: &Flow,
        amount_delta: Decimal,
        shares_delta: Option<Decimal>,
        today: NaiveDate,
    ) {
        if amount_delta.is_zero() && shares_delta.is_none_or(|shares| shares.is_zero()) {
            return;
        }

        let snapshot = self.snapshot_for(scope, flow).await;

        match flow.kind {
            FlowKind::Income => {
                if let Some(to) = flow.to_asset_id {
                    let result = self
                        .adjust_asset_balance(
                            scope,
                            to,
                            &flow.currency,
                            amount_delta,
                            shares_delta,
                            &snapshot,
                        )
                        .await;
                    log_adjustment(result, flow.id, to);
                }
            }
            FlowKind::Expense => {
                if let Some(from) = flow.from_asset_id {
                    let result = self
                        .adjust_asset_balance(
                            scope,
                            from,
                            &flow.currency,
                            -amount_delta,
                            shares_delta.map(|shares| -shares),
                            &snapshot,
                        )
                        .await;
                    log_adjustment(result, flow.id, from);
                }
            }
            FlowKind::Transfer => {
                if let (Some(from), Some(to)) = (flow.from_asset_id, flow.to_asset_id) {
                    let (debit, credit) = tokio::join!(
                        self.adjust_asset_balance(
                            scope,
                            from,
                            &flow.currency,
                            -amount_delta,
                            shares_delta.map(|shares| -shares),
                            &snapshot,
                        ),
                        self.adjust_asset_balance(
                            scope,
                            to,
                            &flow.currency,
                            amount_delta,
                            shares_delta,
                            &snapshot,
                        ),
                    );
                    log_adjustment(debit, flow.id, from);
                    log_adjustment(credit, flow.id, to);
                }
            }
            FlowKind::Other => {}
        }

        if flow.is_debt_payment()
            && let Some(debt_id) = flow.debt_id
        {
            let result = self
                .apply_debt_payment(scope, debt_id, &flow.currency, amount_delta, &snapshot, today)
                .await;
            log_adjustment(result, flow.id, debt_id);
        }
    }

    /// Builds the rate snapshot for one flow: its currency plus the currency
    /// of every asset/debt it touches, fetched only when more than one
    /// distinct code is involved.
    pub(crate) async fn snapshot_for(&self, scope: &OwnerScope, flow: &Flow) -> RateSnapshot {
        let mut codes: HashSet<CurrencyCode> = HashSet::new();
        codes.insert(flow.currency.clone());

        let (from, to) = tokio::join!(
            self.resolve_asset(scope, flow.from_asset_id, "from_asset"),
            self.resolve_asset(scope, flow.to_asset_id, "to_asset"),
        );
        for asset in [from, to].into_iter().flatten().flatten() {
            codes.insert(asset.currency);
        }

        if flow.is_debt_payment()
            && let Ok(Some(debt)) = self.resolve_debt(scope, flow.debt_id).await
        {
            codes.insert(debt.currency);
        }

        if codes.len() <= 1 {
            return RateSnapshot::empty();
        }
        self.rate_snapshot(&codes).await
    }
}

fn log_adjustment(result: ResultEngine<Decimal>, flow_id: Uuid, target_id: Uuid) {
    match result {
        Ok(balance) => {
            tracing::debug!(%flow_id, %target_id, %balance, "balance adjusted");
        }
        Err(err) => {
            tracing::warn!(%flow_id, %target_id, error = %err, "balance adjustment skipped");
        }
    }
}
