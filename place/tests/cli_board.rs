//! CLI tests for the `place` binary.
//!
//! Spawns the binary against a scratch `place.toml` and checks output and
//! exit codes.

use std::fs;
use std::process::{Command, Output};

use place::exit_codes;
use place::io::config::PlaceConfig;
use place::test_support::TestProject;

fn place(project: &TestProject, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_place"))
        .current_dir(project.path())
        .arg("--config")
        .arg(project.config_path())
        .args(args)
        .output()
        .expect("run place")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[test]
fn init_seeds_then_reports_ready() {
    let project = TestProject::new().expect("project");

    let first = place(&project, &["init"]);
    assert_eq!(first.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout(&first), "seeded 16 pixels");
    assert!(project.database_path().exists());

    let second = place(&project, &["init"]);
    assert_eq!(stdout(&second), "board ready");
}

#[test]
fn select_paint_and_read_back() {
    let project = TestProject::new().expect("project");

    let select = place(&project, &["select", "F9D56E"]);
    assert_eq!(select.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout(&select), "selected #f9d56e");

    let paint = place(&project, &["paint", "2", "1"]);
    assert_eq!(paint.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout(&paint), "painted (2, 1) #f9d56e");

    assert_eq!(stdout(&place(&project, &["pixel", "2", "1"])), "#f9d56e");
    assert_eq!(stdout(&place(&project, &["pixel", "0", "0"])), "#2b283b");
    assert_eq!(stdout(&place(&project, &["selected"])), "#f9d56e");

    let show = stdout(&place(&project, &["show"]));
    let lines: Vec<&str> = show.lines().collect();
    assert_eq!(lines[0], "selected: #f9d56e");
    assert_eq!(lines[2], "#2b283b #2b283b #f9d56e #2b283b");
}

#[test]
fn invalid_input_exits_with_invalid_code() {
    let project = TestProject::new().expect("project");

    let paint = place(&project, &["paint", "4", "0"]);
    assert_eq!(paint.status.code(), Some(exit_codes::INVALID_INPUT));
    assert!(String::from_utf8_lossy(&paint.stderr).contains("invalid coordinates: 4, 0"));

    let paint = place(&project, &["paint", "-1", "0"]);
    assert_eq!(paint.status.code(), Some(exit_codes::INVALID_INPUT));

    let select = place(&project, &["select", "not-a-color"]);
    assert_eq!(select.status.code(), Some(exit_codes::INVALID_INPUT));
    assert_eq!(stdout(&place(&project, &["selected"])), "#2b283b");
}

#[test]
fn kv_commands_round_trip_and_list_in_order() {
    let project = TestProject::new().expect("project");
    assert_eq!(place(&project, &["init"]).status.code(), Some(exit_codes::OK));

    let set = place(&project, &["kv", "set", "note", r#"{"text":"hi"}"#]);
    assert_eq!(set.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout(&place(&project, &["kv", "get", "note"])), r#"{"text":"hi"}"#);

    let listed = stdout(&place(&project, &["kv", "list", "pixel:"]));
    let keys: Vec<&str> = listed
        .lines()
        .map(|line| line.split('\t').next().expect("key column"))
        .collect();
    assert_eq!(keys.len(), 16);
    assert_eq!(keys[0], "pixel:0:0");
    assert_eq!(keys[15], "pixel:3:3");

    assert_eq!(place(&project, &["kv", "delete", "note"]).status.code(), Some(exit_codes::OK));
    assert_eq!(place(&project, &["kv", "delete", "note"]).status.code(), Some(exit_codes::OK));
    let missing = place(&project, &["kv", "get", "note"]);
    assert_eq!(missing.status.code(), Some(exit_codes::FAILURE));

    let bad = place(&project, &["kv", "set", "note", "not json"]);
    assert_eq!(bad.status.code(), Some(exit_codes::FAILURE));
}

#[cfg(unix)]
#[test]
fn purge_command_runs_after_paint_and_failures_only_warn() {
    let mut config = PlaceConfig::default();
    config.invalidation.base_url = "https://place.example".to_string();
    config.invalidation.on_paint = vec!["owner/readme".to_string()];
    config.invalidation.command = vec![
        "sh".to_string(),
        "-c".to_string(),
        r#"printf '%s\n' "$@" >> purged.txt"#.to_string(),
        "purge".to_string(),
    ];
    let project = TestProject::with_config(&config).expect("project");

    let paint = place(&project, &["paint", "1", "3"]);
    assert_eq!(paint.status.code(), Some(exit_codes::OK));
    let purged = fs::read_to_string(project.path().join("purged.txt")).expect("purge log");
    assert_eq!(purged, "https://place.example/pixel?x=1&y=3\nowner/readme\n");

    config.invalidation.command = vec!["sh".to_string(), "-c".to_string(), "exit 1".to_string()];
    let failing = TestProject::with_config(&config).expect("project");
    let paint = place(&failing, &["paint", "0", "0"]);
    assert_eq!(paint.status.code(), Some(exit_codes::OK));
    assert!(String::from_utf8_lossy(&paint.stderr).contains("cache purge failed"));
}
