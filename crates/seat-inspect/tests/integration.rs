//! Integration tests for seat-inspect
//!
//! These tests verify the end-to-end behavior of the pipeline and of the
//! binary's exit codes.

use seat_inspect_api::{AttrValue, Category, FetchCause, RawRecord, Snapshot};
use seat_inspect_config::InspectConfig;
use seat_inspect_core::{Inspector, Tree};
use seat_inspect_source_api::{bag, refs, FixtureFailure, FixtureSource};
use seat_inspect_util::{EntityKind, NodeKey};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Command, Output};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn workstation() -> FixtureSource {
    FixtureSource::new()
        .with_seat(
            "seat0",
            bag([
                ("Sessions", refs(["2", "3", "4"])),
                ("ActiveSession", refs(["2"])),
                ("CanMultiSession", AttrValue::Bool(true)),
                ("CanGraphical", AttrValue::Bool(true)),
            ]),
        )
        .with_session(
            "2",
            bag([
                ("Seat", refs(["seat0"])),
                ("User", refs(["1000"])),
                ("Active", AttrValue::Bool(true)),
                ("Type", AttrValue::Str("wayland".into())),
            ]),
        )
        .with_session(
            "3",
            bag([("Seat", refs(["seat0"])), ("User", refs(["1000"])), ("Type", AttrValue::Str("tty".into()))]),
        )
        .with_session(
            "4",
            bag([("Seat", refs(["seat0"])), ("User", refs(["1001"])), ("Type", AttrValue::Str("tty".into()))]),
        )
        .with_user(
            "1000",
            bag([("Sessions", refs(["2", "3"])), ("State", AttrValue::Str("active".into()))]),
        )
        .with_user(
            "1001",
            bag([("Sessions", refs(["4"])), ("State", AttrValue::Str("online".into()))]),
        )
}

#[tokio::test]
async fn test_consistent_workstation() {
    let source = Arc::new(workstation());
    let inspection = Inspector::new(InspectConfig::default())
        .run(source.clone(), None)
        .await
        .unwrap();

    assert!(source.is_closed());
    assert_eq!(inspection.graph.len(), 6);
    assert!(inspection.findings.is_empty());
    assert!(inspection.warnings.is_empty());

    let tree = Tree::from_inspection(&inspection);
    assert_eq!(tree.roots.len(), 1);
    assert_eq!(tree.roots[0].children.len(), 3);
}

#[tokio::test]
async fn test_partial_fetch_resilience() {
    let source = workstation();
    source.fail_properties_of(EntityKind::Session, "3", FixtureFailure::PermissionDenied);

    let inspection = Inspector::new(InspectConfig::default())
        .run(Arc::new(source), None)
        .await
        .unwrap();

    let sessions: Vec<_> = inspection.graph.nodes_of(EntityKind::Session).collect();
    assert_eq!(sessions.len(), 3);
    assert_eq!(sessions.iter().filter(|n| n.partial).count(), 1);
    assert!(inspection.graph.node(&NodeKey::session("3")).unwrap().partial);

    assert_eq!(inspection.warnings.len(), 1);
    assert_eq!(inspection.warnings[0].cause, FetchCause::PermissionDenied);

    // The bare session stays attached through the seat's and user's lists
    assert!(inspection.findings.is_empty());
    assert_eq!(
        inspection.graph.sessions_on_seat(&NodeKey::seat("seat0")).len(),
        3
    );
}

#[tokio::test]
async fn test_race_between_calls() {
    // Session 5 appeared in the user's list but was gone before enumeration
    let source = FixtureSource::new()
        .with_seat("seat0", bag([("Sessions", refs(["5"])), ("ActiveSession", refs(["5"]))]))
        .with_user(
            "1000",
            bag([("Sessions", refs(["5"])), ("State", AttrValue::Str("active".into()))]),
        );

    let inspection = Inspector::new(InspectConfig::default())
        .run(Arc::new(source), None)
        .await
        .unwrap();

    let categories: Vec<Category> = inspection.findings.iter().map(|f| f.category).collect();
    assert_eq!(
        categories,
        vec![
            Category::DanglingReference,
            Category::DanglingReference,
            Category::DanglingReference,
            Category::OrphanedActiveUser,
        ]
    );
    assert!(inspection.has_warnings());

    let tree = Tree::from_inspection(&inspection);
    assert!(tree.unplaced.is_empty());
}

#[tokio::test]
async fn test_disabled_checks_from_config() {
    let config = seat_inspect_config::parse_config(
        r#"
config_version = 1

[checks]
disabled = ["dangling-reference", "orphaned-active-user"]
"#,
    )
    .unwrap();

    let source = FixtureSource::new().with_user(
        "1000",
        bag([("Sessions", refs(["5"])), ("State", AttrValue::Str("active".into()))]),
    );

    let inspection = Inspector::new(config).run(Arc::new(source), None).await.unwrap();
    assert!(inspection.findings.is_empty());
}

// Binary exit codes

fn write_snapshot(dir: &Path, snapshot: &Snapshot) -> String {
    let path = dir.join("snapshot.json");
    std::fs::write(&path, serde_json::to_string(snapshot).unwrap()).unwrap();
    path.to_string_lossy().into_owned()
}

fn seat_inspect(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_seat-inspect"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("SEAT_INSPECT_CONFIG")
        .env_remove("SEAT_INSPECT_LOGINCTL")
        .env("XDG_CONFIG_HOME", dir)
        .output()
        .unwrap()
}

fn consistent_snapshot() -> Snapshot {
    let mut snapshot = Snapshot::empty("fixture");
    snapshot.seats.push(RawRecord::new(
        "seat0",
        bag([("Sessions", refs(["2"])), ("ActiveSession", refs(["2"]))]),
    ));
    snapshot.sessions.push(RawRecord::new(
        "2",
        bag([("Seat", refs(["seat0"])), ("User", refs(["1000"])), ("Active", AttrValue::Bool(true))]),
    ));
    snapshot.users.push(RawRecord::new("1000", bag([("Sessions", refs(["2"]))])));
    snapshot
}

#[test]
fn test_clean_snapshot_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_snapshot(dir.path(), &consistent_snapshot());

    let output = seat_inspect(dir.path(), &["--from-snapshot", &path]);
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("seat/seat0"));
    assert!(stdout.contains("No findings."));
}

#[test]
fn test_warning_snapshot_exits_one_with_json() {
    let dir = tempfile::tempdir().unwrap();
    let mut snapshot = consistent_snapshot();
    snapshot.sessions[0].attrs.insert("Seat".into(), refs(["seat9"]));
    let path = write_snapshot(dir.path(), &snapshot);

    let output = seat_inspect(dir.path(), &["--from-snapshot", &path, "--format", "json"]);
    assert_eq!(output.status.code(), Some(1));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["version"], 1);
    let tags: Vec<&str> = report["findings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["category"].as_str().unwrap())
        .collect();
    assert!(tags.contains(&"dangling-reference"));
    assert!(tags.contains(&"asymmetric-relation"));
}

#[test]
fn test_malformed_snapshot_exits_five() {
    let dir = tempfile::tempdir().unwrap();
    let mut snapshot = consistent_snapshot();
    snapshot.users[0].id = None;
    let path = write_snapshot(dir.path(), &snapshot);

    let output = seat_inspect(dir.path(), &["--from-snapshot", &path]);
    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn test_missing_loginctl_exits_three() {
    let dir = tempfile::tempdir().unwrap();
    let output = seat_inspect(dir.path(), &["--loginctl", "/nonexistent/loginctl"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unavailable"));
}

#[test]
fn test_missing_config_exits_six() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.toml");
    let output = seat_inspect(dir.path(), &["--config", &missing.to_string_lossy()]);
    assert_eq!(output.status.code(), Some(6));
}

#[test]
fn test_usage_error_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let output = seat_inspect(dir.path(), &["--concurrency", "0"]);
    assert_eq!(output.status.code(), Some(2));
}

fn fake_loginctl(dir: &Path, body: &str) -> String {
    let path = dir.join("loginctl");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

const FAKE_LOGINCTL: &str = r#"
case "$1" in
  list-seats) echo "seat0" ;;
  list-sessions) echo "      2 1000 enrico seat0 tty2" ;;
  list-users) [ -n "$DENY_USERS" ] && { echo "Access denied" >&2; exit 1; }; echo " 1000 enrico" ;;
  show-seat) printf 'Id=seat0\nSessions=2\nActiveSession=2\nCanMultiSession=yes\n' ;;
  show-session) printf 'Id=2\nSeat=seat0\nUser=1000\nActive=yes\nType=tty\nTTY=tty2\nState=active\n' ;;
  show-user) printf 'UID=1000\nName=enrico\nSessions=2\nState=active\n' ;;
  *) echo "Unknown command verb $1" >&2; exit 1 ;;
esac
"#;

#[test]
fn test_fake_service_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_loginctl(dir.path(), FAKE_LOGINCTL);
    let saved = dir.path().join("saved.json");

    let output = seat_inspect(
        dir.path(),
        &["--loginctl", &program, "--no-probe", "--save-snapshot", &saved.to_string_lossy()],
    );
    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("seat/seat0 (multi-session)"));
    assert!(stdout.contains("session/2 console tty2 active"));
    assert!(stdout.contains("user/1000 (enrico)"));

    let snapshot: Snapshot = serde_json::from_str(&std::fs::read_to_string(&saved).unwrap()).unwrap();
    assert_eq!(snapshot.record_count(), 3);
    assert!(snapshot.leaders.is_empty());
}

#[test]
fn test_enumeration_denied_exits_four() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_loginctl(dir.path(), FAKE_LOGINCTL);

    let output = Command::new(env!("CARGO_BIN_EXE_seat-inspect"))
        .args(["--loginctl", &program])
        .env_remove("RUST_LOG")
        .env_remove("SEAT_INSPECT_CONFIG")
        .env("XDG_CONFIG_HOME", dir.path())
        .env("DENY_USERS", "1")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_hanging_service_hits_deadline() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_loginctl(dir.path(), "exec sleep 30");

    let started = Instant::now();
    let output = seat_inspect(dir.path(), &["--loginctl", &program, "--deadline", "1", "--no-probe"]);

    assert!(started.elapsed() < Duration::from_secs(15));
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("deadline"));
}
