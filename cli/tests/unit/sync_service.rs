//! Tests for the sync run: row processing, progress, logging, session
//! lifetime, refresh policy, and cancellation.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;

use attrsync_cli::application::services::sync::{
    CancelToken, SyncOptions, SyncRequest, run_rows, run_sync,
};
use attrsync_cli::domain::{
    ApplyOutcome, AttributeRow, LoadError, LogLine, Progress, RefreshPolicy, RowOutcome,
    SyncError,
};

use crate::mocks::{
    FakeConnector, FakeState, RecordingReporter, StaticTable, datacenter, folder, inventory,
    params, vm, web01_only,
};

fn row(machine: &str, fields: &[(&str, &str)]) -> AttributeRow {
    AttributeRow::new(
        machine,
        fields
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect(),
    )
    .expect("valid row")
}

fn request<'a>(params: &'a attrsync_cli::application::ports::ConnectionParams) -> SyncRequest<'a> {
    SyncRequest {
        file: Path::new("machines.xlsx"),
        identifier_column: "VM Name",
        params,
    }
}

// ── End-to-end scenario ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_web01_resolved_and_ghost_not_found() {
    let table = StaticTable::new(&["VM Name", "Env"], &[&["web01", "prod"], &["ghost", "dev"]]);
    let connector = FakeConnector::new(FakeState::with_inventory(web01_only()));
    let reporter = RecordingReporter::new();
    let params = params();

    let summary = run_sync(
        &table,
        &connector,
        request(&params),
        &reporter,
        &SyncOptions::default(),
    )
    .await
    .expect("run completes");

    assert_eq!(summary.rows.len(), 2);
    match &summary.rows[0].outcome {
        RowOutcome::Resolved { fields } => {
            assert_eq!(fields.len(), 1);
            assert_eq!(fields[0].outcome, ApplyOutcome::Applied);
        }
        other => panic!("expected web01 resolved, got {other:?}"),
    }
    assert_eq!(summary.rows[1].outcome, RowOutcome::MachineNotFound);
    assert_eq!(reporter.last_progress(), Some(Progress { current: 2, total: 2 }));
    assert_eq!(reporter.count_containing("not found"), 1);
    assert_eq!(reporter.count_containing("assigning Env=prod"), 1);
    assert_eq!(reporter.rendered().last().map(String::as_str), Some("done"));
    assert_eq!(connector.state.attribute("vm-1", "Env").as_deref(), Some("prod"));
}

#[tokio::test]
async fn test_log_lines_are_in_row_then_column_order() {
    let connector = FakeConnector::new(FakeState::with_inventory(web01_only()));
    let reporter = RecordingReporter::new();
    let rows = vec![
        row("web01", &[("Env", "prod"), ("Owner", "ops")]),
        row("ghost", &[("Env", "dev")]),
    ];

    run_rows(&connector.session(), &rows, &reporter, &SyncOptions::default()).await;

    assert_eq!(
        reporter.rendered(),
        [
            "assigning Env=prod to machine web01",
            "assigning Owner=ops to machine web01",
            "machine 'ghost' not found",
            "done",
        ]
    );
}

// ── Resolution and mutation ───────────────────────────────────────────────────

#[tokio::test]
async fn test_not_found_row_makes_no_mutation_call() {
    let connector = FakeConnector::new(FakeState::with_inventory(web01_only()));
    let reporter = RecordingReporter::new();
    let rows = vec![row("ghost", &[("Env", "dev"), ("Owner", "ops")])];

    let summary = run_rows(&connector.session(), &rows, &reporter, &SyncOptions::default()).await;

    assert_eq!(summary.not_found, 1);
    assert!(connector.state.set_calls.borrow().is_empty());
}

#[tokio::test]
async fn test_machine_in_nested_folder_of_second_datacenter_resolves() {
    let inv = inventory(vec![
        datacenter("DC1", vec![vm("vm-1", "web01")]),
        datacenter(
            "DC2",
            vec![folder("prod", vec![folder("db", vec![vm("vm-42", "db01")])])],
        ),
    ]);
    let connector = FakeConnector::new(FakeState::with_inventory(inv));
    let reporter = RecordingReporter::new();

    run_rows(
        &connector.session(),
        &[row("db01", &[("Tier", "gold")])],
        &reporter,
        &SyncOptions::default(),
    )
    .await;

    assert_eq!(connector.state.attribute("vm-42", "Tier").as_deref(), Some("gold"));
}

#[tokio::test]
async fn test_identifier_match_is_case_sensitive() {
    let connector = FakeConnector::new(FakeState::with_inventory(web01_only()));
    let reporter = RecordingReporter::new();

    let summary = run_rows(
        &connector.session(),
        &[row("WEB01", &[("Env", "prod")])],
        &reporter,
        &SyncOptions::default(),
    )
    .await;

    assert_eq!(summary.rows[0].outcome, RowOutcome::MachineNotFound);
}

#[tokio::test]
async fn test_failed_field_does_not_stop_later_fields_or_rows() {
    let inv = inventory(vec![datacenter(
        "DC1",
        vec![vm("vm-1", "web01"), vm("vm-2", "web02")],
    )]);
    let connector = FakeConnector::new(FakeState::with_inventory(inv).failing("Owner"));
    let reporter = RecordingReporter::new();
    let rows = vec![
        row("web01", &[("Env", "prod"), ("Owner", "ops"), ("Tier", "gold")]),
        row("web02", &[("Env", "test")]),
    ];

    let summary = run_rows(&connector.session(), &rows, &reporter, &SyncOptions::default()).await;

    assert_eq!(connector.state.keys_set(), ["Env", "Owner", "Tier", "Env"]);
    assert_eq!(summary.fields_applied, 3);
    assert_eq!(summary.fields_failed, 1);
    assert_eq!(
        reporter.count_containing("failed to set Owner on machine web01"),
        1
    );
    let RowOutcome::Resolved { fields } = &summary.rows[0].outcome else {
        panic!("web01 should resolve");
    };
    assert!(matches!(fields[1].outcome, ApplyOutcome::Failed(ref r) if r.contains("does not exist")));
}

#[tokio::test]
async fn test_empty_value_is_assigned_not_skipped() {
    let connector = FakeConnector::new(FakeState::with_inventory(web01_only()));
    let reporter = RecordingReporter::new();

    run_rows(
        &connector.session(),
        &[row("web01", &[("Env", "")])],
        &reporter,
        &SyncOptions::default(),
    )
    .await;

    assert_eq!(connector.state.attribute("vm-1", "Env").as_deref(), Some(""));
}

#[tokio::test]
async fn test_applying_same_row_twice_is_idempotent() {
    let connector = FakeConnector::new(FakeState::with_inventory(web01_only()));
    let rows = vec![row("web01", &[("Env", "prod"), ("Owner", "ops")])];

    let first = run_rows(
        &connector.session(),
        &rows,
        &RecordingReporter::new(),
        &SyncOptions::default(),
    )
    .await;
    let after_first = connector.state.attributes.borrow().clone();
    let second = run_rows(
        &connector.session(),
        &rows,
        &RecordingReporter::new(),
        &SyncOptions::default(),
    )
    .await;

    assert!(first.is_clean());
    assert!(second.is_clean());
    assert_eq!(*connector.state.attributes.borrow(), after_first);
}

#[tokio::test]
async fn test_zero_rows_still_logs_done() {
    let connector = FakeConnector::new(FakeState::with_inventory(web01_only()));
    let reporter = RecordingReporter::new();

    let summary = run_rows(&connector.session(), &[], &reporter, &SyncOptions::default()).await;

    assert_eq!(summary.total_rows, 0);
    assert!(reporter.progress.borrow().is_empty());
    assert_eq!(*reporter.lines.borrow(), [LogLine::Done]);
}

// ── Fatal errors ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_identifier_column_aborts_before_connect() {
    let table = StaticTable::new(&["Name", "Env"], &[&["web01", "prod"]]);
    let connector = FakeConnector::new(FakeState::with_inventory(web01_only()));
    let reporter = RecordingReporter::new();
    let params = params();

    let err = run_sync(
        &table,
        &connector,
        request(&params),
        &reporter,
        &SyncOptions::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        SyncError::Load(LoadError::MissingIdentifierColumn { .. })
    ));
    assert_eq!(connector.state.connects.get(), 0);
    assert_eq!(connector.state.fetches.get(), 0);
    assert!(reporter.lines.borrow().is_empty());
    assert!(reporter.progress.borrow().is_empty());
}

#[tokio::test]
async fn test_unreadable_input_is_fatal() {
    let table = StaticTable(Err(LoadError::Unreadable("not a workbook".to_string())));
    let connector = FakeConnector::new(FakeState::default());
    let reporter = RecordingReporter::new();
    let params = params();

    let err = run_sync(
        &table,
        &connector,
        request(&params),
        &reporter,
        &SyncOptions::default(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.code(), "UNREADABLE_INPUT");
    assert_eq!(connector.state.connects.get(), 0);
}

#[tokio::test]
async fn test_connection_failure_reports_no_progress() {
    let table = StaticTable::new(&["VM Name", "Env"], &[&["web01", "prod"]]);
    let connector = FakeConnector::refusing("incorrect user name or password");
    let reporter = RecordingReporter::new();
    let params = params();

    let err = run_sync(
        &table,
        &connector,
        request(&params),
        &reporter,
        &SyncOptions::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SyncError::Connection(_)));
    assert!(err.to_string().contains("vc01.lab"));
    assert!(reporter.lines.borrow().is_empty());
    assert!(reporter.progress.borrow().is_empty());
    assert_eq!(connector.state.disconnects.get(), 0);
}

// ── Session lifetime ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_session_released_exactly_once() {
    let table = StaticTable::new(&["VM Name", "Env"], &[&["ghost", "dev"]]);
    let connector = FakeConnector::new(FakeState::with_inventory(web01_only()));
    let params = params();

    run_sync(
        &table,
        &connector,
        request(&params),
        &RecordingReporter::new(),
        &SyncOptions::default(),
    )
    .await
    .expect("run completes");

    assert_eq!(connector.state.connects.get(), 1);
    assert_eq!(connector.state.disconnects.get(), 1);
}

// ── Refresh policy and lookup failures ────────────────────────────────────────

#[tokio::test]
async fn test_per_row_refresh_fetches_for_every_row() {
    let connector = FakeConnector::new(FakeState::with_inventory(web01_only()));
    let rows = vec![
        row("web01", &[("Env", "prod")]),
        row("ghost", &[]),
        row("web01", &[("Env", "prod")]),
    ];

    run_rows(
        &connector.session(),
        &rows,
        &RecordingReporter::new(),
        &SyncOptions::default(),
    )
    .await;

    assert_eq!(connector.state.fetches.get(), 3);
}

#[tokio::test]
async fn test_per_run_refresh_fetches_once() {
    let connector = FakeConnector::new(FakeState::with_inventory(web01_only()));
    let rows = vec![
        row("web01", &[("Env", "prod")]),
        row("ghost", &[]),
        row("web01", &[("Env", "prod")]),
    ];
    let opts = SyncOptions {
        refresh: RefreshPolicy::PerRun,
        cancel: CancelToken::new(),
    };

    run_rows(&connector.session(), &rows, &RecordingReporter::new(), &opts).await;

    assert_eq!(connector.state.fetches.get(), 1);
}

#[tokio::test]
async fn test_lookup_failure_is_recorded_and_run_continues() {
    let state = FakeState {
        inventory_error: Some("session expired".to_string()),
        ..FakeState::with_inventory(web01_only())
    };
    let connector = FakeConnector::new(state);
    let reporter = RecordingReporter::new();
    let rows = vec![row("web01", &[("Env", "prod")]), row("web02", &[])];

    let summary = run_rows(&connector.session(), &rows, &reporter, &SyncOptions::default()).await;

    assert_eq!(summary.lookup_failed, 2);
    assert!(matches!(
        summary.rows[0].outcome,
        RowOutcome::LookupFailed { ref reason } if reason.contains("session expired")
    ));
    assert_eq!(reporter.last_progress(), Some(Progress { current: 2, total: 2 }));
    assert!(connector.state.set_calls.borrow().is_empty());
    assert_eq!(reporter.count_containing("inventory lookup for machine 'web01' failed"), 1);
}

// ── Cancellation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cancel_stops_between_rows() {
    let connector = FakeConnector::new(FakeState::with_inventory(web01_only()));
    let opts = SyncOptions::default();
    let reporter = RecordingReporter::cancelling_after(1, opts.cancel.clone());
    let rows = vec![
        row("web01", &[("Env", "prod"), ("Owner", "ops")]),
        row("web01", &[("Env", "test")]),
        row("web01", &[("Env", "dev")]),
    ];

    let summary = run_rows(&connector.session(), &rows, &reporter, &opts).await;

    assert!(summary.cancelled);
    assert_eq!(summary.processed_rows, 1);
    assert_eq!(summary.total_rows, 3);
    // The row in flight finished both of its fields.
    assert_eq!(connector.state.keys_set(), ["Env", "Owner"]);
    assert_eq!(
        reporter.rendered().last().map(String::as_str),
        Some("cancelled after 1 of 3 rows")
    );
    assert_eq!(reporter.count_containing("done"), 0);
}

#[tokio::test]
async fn test_cancelled_run_still_releases_session() {
    let table = StaticTable::new(&["VM Name", "Env"], &[&["web01", "prod"], &["web01", "dev"]]);
    let connector = FakeConnector::new(FakeState::with_inventory(web01_only()));
    let opts = SyncOptions::default();
    opts.cancel.cancel();
    let params = params();

    let summary = run_sync(
        &table,
        &connector,
        request(&params),
        &RecordingReporter::new(),
        &opts,
    )
    .await
    .expect("run completes");

    assert!(summary.cancelled);
    assert_eq!(summary.processed_rows, 0);
    assert_eq!(connector.state.disconnects.get(), 1);
}
