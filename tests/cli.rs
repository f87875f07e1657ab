//! Drives the `weavetree` binary as a subprocess, the way this crate's own
//! CLI is actually invoked, rather than only exercising the library surface.

use std::process::Command;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/two_action.yaml");

#[test]
fn s7_cli_search_round_trip() {
    let output = Command::new(env!("CARGO_BIN_EXE_weavetree"))
        .args([
            "search",
            FIXTURE,
            "--iterations",
            "20",
            "--c",
            "0",
            "--gamma",
            "1",
            "--max-steps",
            "2",
            "--return-type",
            "discounted",
            "--fixed-horizon-steps",
            "2",
            "--seed",
            "7",
            "--rollout-action",
            "0",
        ])
        .output()
        .expect("failed to run the weavetree binary");

    assert!(
        output.status.success(),
        "search exited non-zero: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("completed 20 of 20 iterations"),
        "stdout was:\n{stdout}"
    );
    assert!(
        stdout.contains("recommended action (by value): a1"),
        "stdout was:\n{stdout}"
    );
}

#[test]
fn search_json_report_names_actions_by_id() {
    let output = Command::new(env!("CARGO_BIN_EXE_weavetree"))
        .args([
            "search",
            FIXTURE,
            "--iterations",
            "20",
            "--c",
            "0",
            "--gamma",
            "1",
            "--max-steps",
            "2",
            "--return-type",
            "discounted",
            "--fixed-horizon-steps",
            "2",
            "--seed",
            "7",
            "--rollout-action",
            "0",
            "--json",
        ])
        .output()
        .expect("failed to run the weavetree binary");

    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout must be valid JSON");
    assert_eq!(report["best_by_value"], "a1");
    assert_eq!(report["iterations_completed"], 20);
}

#[test]
fn compile_subcommand_reports_state_count() {
    let output = Command::new(env!("CARGO_BIN_EXE_weavetree"))
        .args(["compile", FIXTURE])
        .output()
        .expect("failed to run the weavetree binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("3 states"), "stdout was:\n{stdout}");
}
