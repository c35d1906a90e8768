mod common;

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::Map;
use uuid::Uuid;

use common::{build_engine, date, eur, scope, seed_asset, seed_debt, usd, FailingStore};
use flusso::{
    AssetKind, CreateScheduleCmd, DebtStatus, EngineError, FlowKind, FlowTemplate, Frequency,
    MemoryStore, UpdateScheduleCmd, PAY_DEBT_CATEGORY,
};

fn income_template(to_asset_id: Uuid, amount: Decimal, currency: flusso::CurrencyCode) -> FlowTemplate {
    FlowTemplate {
        kind: FlowKind::Income,
        amount,
        currency,
        from_asset_id: None,
        to_asset_id: Some(to_asset_id),
        debt_id: None,
        category: Some("salary".to_string()),
        description: None,
        expense_category_id: None,
        metadata: Map::new(),
    }
}

#[tokio::test]
async fn monthly_salary_schedule_processes_one_period() {
    let store = Arc::new(MemoryStore::new());
    let engine = build_engine(store.clone());
    let owner = scope();
    let checking = seed_asset(&store, owner, AssetKind::Checking, Decimal::ZERO, usd());

    let schedule = engine
        .create_schedule(
            &owner,
            CreateScheduleCmd::new(
                Frequency::Monthly,
                date(2024, 1, 15),
                income_template(checking, Decimal::new(100_000, 2), usd()),
            ),
        )
        .await
        .unwrap();

    let report = engine
        .process_due_schedules(&owner, date(2024, 1, 20))
        .await
        .unwrap();

    assert_eq!(report.processed, 1);
    assert_eq!(report.created_flows.len(), 1);
    assert!(report.errors.is_empty());

    let flows = store.flows_for_schedule(schedule.id);
    assert_eq!(flows.len(), 1);
    assert_eq!(flows[0].date, date(2024, 1, 15));
    assert_eq!(flows[0].schedule_id, Some(schedule.id));
    assert!(!flows[0].needs_review);

    assert_eq!(store.asset(checking).unwrap().balance, Decimal::new(100_000, 2));

    let schedule = store.schedule(schedule.id).unwrap();
    assert_eq!(schedule.last_run_date, Some(date(2024, 1, 15)));
    assert_eq!(schedule.next_run_date, date(2024, 2, 15));
}

#[tokio::test]
async fn not_yet_due_schedules_are_skipped() {
    let store = Arc::new(MemoryStore::new());
    let engine = build_engine(store.clone());
    let owner = scope();
    let checking = seed_asset(&store, owner, AssetKind::Checking, Decimal::ZERO, eur());

    engine
        .create_schedule(
            &owner,
            CreateScheduleCmd::new(
                Frequency::Monthly,
                date(2024, 2, 1),
                income_template(checking, Decimal::new(100_000, 2), eur()),
            ),
        )
        .await
        .unwrap();

    let report = engine
        .process_due_schedules(&owner, date(2024, 1, 20))
        .await
        .unwrap();
    assert_eq!(report.processed, 0);
    assert_eq!(store.flow_count(), 0);
}

#[tokio::test]
async fn one_failing_schedule_does_not_abort_the_batch() {
    let store = Arc::new(FailingStore::new());
    let engine = build_engine(store.clone());
    let owner = scope();
    let checking = seed_asset(&store.inner, owner, AssetKind::Checking, Decimal::ZERO, eur());

    let template = income_template(checking, Decimal::new(10_000, 2), eur());
    let first = engine
        .create_schedule(
            &owner,
            CreateScheduleCmd::new(Frequency::Weekly, date(2024, 1, 1), template.clone()),
        )
        .await
        .unwrap();
    let second = engine
        .create_schedule(
            &owner,
            CreateScheduleCmd::new(Frequency::Weekly, date(2024, 1, 2), template.clone()),
        )
        .await
        .unwrap();
    let third = engine
        .create_schedule(
            &owner,
            CreateScheduleCmd::new(Frequency::Weekly, date(2024, 1, 3), template),
        )
        .await
        .unwrap();

    store.fail_flows_of_schedule(second.id);
    let report = engine
        .process_due_schedules(&owner, date(2024, 1, 10))
        .await
        .unwrap();

    assert_eq!(report.processed, 2);
    assert_eq!(report.created_flows.len(), 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].schedule_id, second.id);

    // Siblings advanced; the failed schedule stays due for the next run.
    assert_eq!(
        store.inner.schedule(first.id).unwrap().next_run_date,
        date(2024, 1, 8)
    );
    assert_eq!(
        store.inner.schedule(second.id).unwrap().next_run_date,
        date(2024, 1, 2)
    );
    assert_eq!(
        store.inner.schedule(third.id).unwrap().next_run_date,
        date(2024, 1, 10)
    );
}

#[tokio::test]
async fn late_schedule_catches_up_one_period_per_invocation() {
    let store = Arc::new(MemoryStore::new());
    let engine = build_engine(store.clone());
    let owner = scope();
    let checking = seed_asset(&store, owner, AssetKind::Checking, Decimal::ZERO, eur());

    let schedule = engine
        .create_schedule(
            &owner,
            CreateScheduleCmd::new(
                Frequency::Monthly,
                date(2024, 1, 15),
                income_template(checking, Decimal::new(10_000, 2), eur()),
            ),
        )
        .await
        .unwrap();

    let today = date(2024, 3, 20);
    for expected_date in [date(2024, 1, 15), date(2024, 2, 15), date(2024, 3, 15)] {
        let report = engine.process_due_schedules(&owner, today).await.unwrap();
        assert_eq!(report.processed, 1);
        let flows = store.flows_for_schedule(schedule.id);
        assert_eq!(flows.last().unwrap().date, expected_date);
    }

    // Fully caught up: the due set is empty now.
    let report = engine.process_due_schedules(&owner, today).await.unwrap();
    assert_eq!(report.processed, 0);
    assert_eq!(
        store.schedule(schedule.id).unwrap().next_run_date,
        date(2024, 4, 15)
    );
    assert_eq!(store.flows_for_schedule(schedule.id).len(), 3);
}

#[tokio::test]
async fn generated_flows_do_not_recur_themselves() {
    let store = Arc::new(MemoryStore::new());
    let engine = build_engine(store.clone());
    let owner = scope();
    let checking = seed_asset(&store, owner, AssetKind::Checking, Decimal::ZERO, eur());

    engine
        .create_schedule(
            &owner,
            CreateScheduleCmd::new(
                Frequency::Monthly,
                date(2024, 1, 15),
                income_template(checking, Decimal::new(10_000, 2), eur()),
            ),
        )
        .await
        .unwrap();

    engine
        .process_due_schedules(&owner, date(2024, 1, 20))
        .await
        .unwrap();

    // One schedule in, one schedule out: the generated flow added none.
    assert_eq!(store.schedule_count(), 1);
}

#[tokio::test]
async fn deactivated_schedules_leave_the_due_set() {
    let store = Arc::new(MemoryStore::new());
    let engine = build_engine(store.clone());
    let owner = scope();
    let checking = seed_asset(&store, owner, AssetKind::Checking, Decimal::ZERO, eur());

    let schedule = engine
        .create_schedule(
            &owner,
            CreateScheduleCmd::new(
                Frequency::Monthly,
                date(2024, 1, 15),
                income_template(checking, Decimal::new(10_000, 2), eur()),
            ),
        )
        .await
        .unwrap();

    let deactivated = engine
        .deactivate_schedule(&owner, schedule.id)
        .await
        .unwrap();
    assert!(!deactivated.is_active);

    let report = engine
        .process_due_schedules(&owner, date(2024, 2, 1))
        .await
        .unwrap();
    assert_eq!(report.processed, 0);
    assert_eq!(store.flow_count(), 0);
    // Deactivation never deletes the row.
    assert!(store.schedule(schedule.id).is_some());
}

#[tokio::test]
async fn update_schedule_patches_cadence() {
    let store = Arc::new(MemoryStore::new());
    let engine = build_engine(store.clone());
    let owner = scope();
    let checking = seed_asset(&store, owner, AssetKind::Checking, Decimal::ZERO, eur());

    let schedule = engine
        .create_schedule(
            &owner,
            CreateScheduleCmd::new(
                Frequency::Monthly,
                date(2024, 1, 15),
                income_template(checking, Decimal::new(10_000, 2), eur()),
            ),
        )
        .await
        .unwrap();

    let updated = engine
        .update_schedule(
            &owner,
            schedule.id,
            UpdateScheduleCmd::new()
                .frequency(Frequency::Weekly)
                .next_run_date(date(2024, 1, 22)),
        )
        .await
        .unwrap();

    assert_eq!(updated.frequency, Frequency::Weekly);
    assert_eq!(updated.next_run_date, date(2024, 1, 22));
}

#[tokio::test]
async fn schedule_template_is_structurally_validated() {
    let store = Arc::new(MemoryStore::new());
    let engine = build_engine(store.clone());
    let owner = scope();

    let mut template = income_template(Uuid::new_v4(), Decimal::new(10_000, 2), eur());
    template.to_asset_id = None;

    let err = engine
        .create_schedule(
            &owner,
            CreateScheduleCmd::new(Frequency::Monthly, date(2024, 1, 15), template),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidFlow(_)));
    assert_eq!(store.schedule_count(), 0);
}

#[tokio::test]
async fn processing_pays_debts_from_the_template() {
    let store = Arc::new(MemoryStore::new());
    let engine = build_engine(store.clone());
    let owner = scope();
    let checking = seed_asset(&store, owner, AssetKind::Checking, Decimal::new(100_000, 2), eur());
    let debt = seed_debt(&store, owner, Decimal::new(30_000, 2), eur());

    let template = FlowTemplate {
        kind: FlowKind::Expense,
        amount: Decimal::new(10_000, 2),
        currency: eur(),
        from_asset_id: Some(checking),
        to_asset_id: None,
        debt_id: Some(debt),
        category: Some(PAY_DEBT_CATEGORY.to_string()),
        description: None,
        expense_category_id: None,
        metadata: Map::new(),
    };
    engine
        .create_schedule(
            &owner,
            CreateScheduleCmd::new(Frequency::Monthly, date(2024, 1, 1), template),
        )
        .await
        .unwrap();

    engine
        .process_due_schedules(&owner, date(2024, 1, 5))
        .await
        .unwrap();

    assert_eq!(store.asset(checking).unwrap().balance, Decimal::new(90_000, 2));
    let debt = store.debt(debt).unwrap();
    assert_eq!(debt.current_balance, Decimal::new(20_000, 2));
    assert_eq!(debt.status, DebtStatus::Active);
}

#[tokio::test]
async fn due_query_is_scope_filtered() {
    let store = Arc::new(MemoryStore::new());
    let engine = build_engine(store.clone());
    let owner = scope();
    let stranger = scope();
    let checking = seed_asset(&store, owner, AssetKind::Checking, Decimal::ZERO, eur());

    engine
        .create_schedule(
            &owner,
            CreateScheduleCmd::new(
                Frequency::Monthly,
                date(2024, 1, 15),
                income_template(checking, Decimal::new(10_000, 2), eur()),
            ),
        )
        .await
        .unwrap();

    let report = engine
        .process_due_schedules(&stranger, date(2024, 2, 1))
        .await
        .unwrap();
    assert_eq!(report.processed, 0);
    assert_eq!(store.flow_count(), 0);
}
