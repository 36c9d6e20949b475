#![allow(dead_code)]

use assert_cmd::Command;
use cadence_core::models::{EventRecord, ReminderEntry, ReminderMethod};
use cadence_core::planner::PlanRequest;
use cadence_core::store::StoreSnapshot;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

/// Test harness running the binary inside a scratch directory
pub struct CliTestHarness {
    temp_dir: TempDir,
}

impl CliTestHarness {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        Self { temp_dir }
    }

    /// Get a Command instance configured for testing
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("cadence").expect("Failed to find cadence binary");
        cmd.current_dir(self.temp_dir.path());
        cmd.env("CADENCE_DEFAULT_TIMEZONE", "UTC");
        cmd.env_remove("CADENCE_OUTPUT_FORMAT");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, contents).expect("Failed to write test file");
        path
    }

    pub fn write_request(&self, name: &str, request: &PlanRequest) -> PathBuf {
        self.write_file(name, &serde_json::to_string_pretty(request).unwrap())
    }

    pub fn write_snapshot(&self, name: &str, snapshot: &StoreSnapshot) -> PathBuf {
        self.write_file(name, &serde_json::to_string_pretty(snapshot).unwrap())
    }

    pub fn read_snapshot(&self, name: &str) -> StoreSnapshot {
        let text = std::fs::read_to_string(self.path(name)).expect("Failed to read snapshot");
        serde_json::from_str(&text).expect("Snapshot is not valid JSON")
    }

    /// Helper to run a command and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }
}

/// Common test fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub fn monday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    /// A stored weekly series of `count` occurrences starting [`Self::monday`]
    pub fn weekly_series(count: u32) -> EventRecord {
        let start = Self::monday();
        let mut record = EventRecord::new(
            Uuid::now_v7(),
            "owner@example.com",
            start,
            start + TimeDelta::hours(1),
            "UTC",
        )
        .with_title("Weekly sync")
        .with_rule(format!("FREQ=WEEKLY;COUNT={}", count).parse().unwrap())
        .with_reminders(vec![ReminderEntry::new(10, ReminderMethod::Alert)]);
        let id = Uuid::now_v7();
        record.id = Some(id);
        record.anchor_id = Some(id);
        record
    }

    /// A snapshot holding `record` and its reminders
    pub fn snapshot_with(record: &EventRecord) -> StoreSnapshot {
        let id = record.id.expect("fixture record must be stored");
        let mut row = record.clone();
        row.reminders = Vec::new();

        let mut snapshot = StoreSnapshot::default();
        snapshot.events.insert(id, row);
        snapshot.reminders.insert(id, record.reminders.clone());
        snapshot
    }
}
