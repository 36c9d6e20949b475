/// CLI integration tests for cadence
///
/// These tests exercise the binary as a black box: argument handling,
/// request files, store snapshots, configuration and error output.
use cadence_core::models::{EditScope, Extent};
use cadence_core::planner::PlanRequest;
use chrono::TimeDelta;
use predicates::prelude::*;

mod helpers;
use helpers::{CliTestHarness, TestFixtures};

#[test]
fn test_cli_help_and_version() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["--help"])
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("split"))
        .stdout(predicate::str::contains("preview"))
        .stdout(predicate::str::contains("apply"));

    harness
        .run_success(&["--version"])
        .stdout(predicate::str::contains("cadence"));

    harness
        .run_failure(&["invalid-command"])
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_preview_stops_at_count() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&[
            "preview",
            "--rule",
            "FREQ=WEEKLY;COUNT=3",
            "--start",
            "2024-01-01T09:00:00Z",
            "--format",
            "json",
        ])
        .stdout(predicate::str::contains("2024-01-01T09:00:00Z"))
        .stdout(predicate::str::contains("2024-01-15T09:00:00Z"))
        .stdout(predicate::str::contains("2024-01-22").not());
}

#[test]
fn test_preview_table_respects_limit() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&[
            "preview",
            "--rule",
            "FREQ=DAILY",
            "--start",
            "2024-03-09 09:00",
            "--timezone",
            "America/New_York",
            "--limit",
            "2",
        ])
        .stdout(predicate::str::contains("2024-03-09 09:00 (EST)"))
        .stdout(predicate::str::contains("2024-03-10 09:00 (EDT)"))
        .stdout(predicate::str::contains("2024-03-11").not());
}

#[test]
fn test_preview_all_day_ignores_zone_shift() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&[
            "preview",
            "--rule",
            "FREQ=WEEKLY;COUNT=3",
            "--start",
            "2024-03-02",
            "--all-day",
            "--timezone",
            "America/New_York",
        ])
        .stdout(predicate::str::contains("2024-03-09 00:00 (UTC)"))
        .stdout(predicate::str::contains("2024-03-16 00:00 (UTC)"))
        .stdout(predicate::str::contains("23:00").not());
}

#[test]
fn test_split_count_bounded_rule() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&[
            "split",
            "--rule",
            "FREQ=WEEKLY;COUNT=10",
            "--start",
            "2024-01-01T09:00:00Z",
            "--cutoff",
            "2024-01-29T09:00:00Z",
            "--format",
            "json",
        ])
        .stdout(predicate::str::contains("FREQ=WEEKLY;COUNT=4"))
        .stdout(predicate::str::contains("FREQ=WEEKLY;COUNT=6"));
}

#[test]
fn test_split_at_anchor_is_an_error() {
    let harness = CliTestHarness::new();

    harness
        .run_failure(&[
            "split",
            "--rule",
            "FREQ=DAILY",
            "--start",
            "2024-01-01T09:00:00Z",
            "--cutoff",
            "2024-01-01T09:00:00Z",
        ])
        .stderr(predicate::str::contains("Cannot split"));
}

#[test]
fn test_bad_arguments_are_reported() {
    let harness = CliTestHarness::new();

    harness
        .run_failure(&[
            "preview",
            "--rule",
            "FREQ=WEEKLY;COUNT=3;UNTIL=20240101T000000Z",
            "--start",
            "2024-01-01T09:00:00Z",
        ])
        .stderr(predicate::str::contains("Malformed recurrence rule"));

    harness
        .run_failure(&[
            "preview",
            "--rule",
            "FREQ=DAILY",
            "--start",
            "2024-01-01",
            "--timezone",
            "berlin",
        ])
        .stderr(predicate::str::contains("Invalid timezone"))
        .stderr(predicate::str::contains("Europe/Berlin"));
}

#[test]
fn test_plan_this_instance_edit() {
    let harness = CliTestHarness::new();
    let original = TestFixtures::weekly_series(10);
    let target = TestFixtures::monday() + TimeDelta::weeks(4);

    let mut edited = original.clone();
    edited.start = target + TimeDelta::hours(2);
    edited.extent = Extent::End(edited.start + TimeDelta::hours(1));
    let request = PlanRequest::edit(original, edited, target, EditScope::ThisInstance);
    let path = harness.write_request("request.json", &request);

    harness
        .run_success(&["plan", path.to_str().unwrap()])
        .stdout(predicate::str::contains("update-series-rule"))
        .stdout(predicate::str::contains("insert-series"))
        .stdout(predicate::str::contains("insert-instance"))
        .stdout(predicate::str::contains("FREQ=WEEKLY;COUNT=4"));
}

#[test]
fn test_plan_unchanged_edit_as_json() {
    let harness = CliTestHarness::new();
    let original = TestFixtures::weekly_series(5);
    let request = PlanRequest::edit(
        original.clone(),
        original.clone(),
        original.start,
        EditScope::AllInSeries,
    );
    let path = harness.write_request("request.json", &request);

    harness
        .run_success(&["plan", path.to_str().unwrap(), "--format", "json"])
        .stdout(predicate::str::diff("[]\n"));
}

#[test]
fn test_apply_rewrites_snapshot() {
    let harness = CliTestHarness::new();
    let original = TestFixtures::weekly_series(10);
    let id = original.id.unwrap();
    let store = harness.write_snapshot("store.json", &TestFixtures::snapshot_with(&original));

    let request = PlanRequest::delete(
        original,
        TestFixtures::monday() + TimeDelta::weeks(3),
        EditScope::ThisAndFollowing,
    );
    let request = harness.write_request("request.json", &request);

    harness
        .run_success(&["apply", store.to_str().unwrap(), request.to_str().unwrap()])
        .stdout(predicate::str::contains("Applied"));

    let snapshot = harness.read_snapshot("store.json");
    assert_eq!(snapshot.events.len(), 1);
    let rule = snapshot.events[&id].rule.as_ref().unwrap();
    assert_eq!(rule.count(), Some(3));
    assert_eq!(snapshot.reminders[&id].len(), 1);
}

#[test]
fn test_apply_dry_run_leaves_snapshot_alone() {
    let harness = CliTestHarness::new();
    let original = TestFixtures::weekly_series(10);
    let store = harness.write_snapshot("store.json", &TestFixtures::snapshot_with(&original));
    let before = std::fs::read_to_string(&store).unwrap();

    let request = PlanRequest::delete(original, TestFixtures::monday(), EditScope::AllInSeries);
    let request = harness.write_request("request.json", &request);

    harness
        .run_success(&[
            "apply",
            store.to_str().unwrap(),
            request.to_str().unwrap(),
            "--dry-run",
        ])
        .stdout(predicate::str::contains("delete-series"));

    assert_eq!(std::fs::read_to_string(&store).unwrap(), before);
}

#[test]
fn test_apply_with_missing_store_fails() {
    let harness = CliTestHarness::new();
    let original = TestFixtures::weekly_series(3);
    let request = PlanRequest::delete(original, TestFixtures::monday(), EditScope::AllInSeries);
    let request = harness.write_request("request.json", &request);
    let missing = harness.path("missing.json");

    harness
        .run_failure(&["apply", missing.to_str().unwrap(), request.to_str().unwrap()])
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_config_file_sets_output_format() {
    let harness = CliTestHarness::new();
    harness.write_file("cadence.toml", "output_format = \"json\"\n");

    harness
        .run_success(&[
            "preview",
            "--rule",
            "FREQ=DAILY;COUNT=1",
            "--start",
            "2024-01-01T09:00:00Z",
        ])
        .stdout(predicate::str::starts_with("["));
}

#[test]
fn test_verbose_logs_to_stderr() {
    let harness = CliTestHarness::new();
    let original = TestFixtures::weekly_series(4);
    let request = PlanRequest::delete(
        original,
        TestFixtures::monday() + TimeDelta::weeks(1),
        EditScope::ThisInstance,
    );
    let path = harness.write_request("request.json", &request);

    harness
        .run_success(&["--verbose", "plan", path.to_str().unwrap()])
        .stderr(predicate::str::contains("resolved mutation shape"));
}
