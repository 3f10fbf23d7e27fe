use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("assess-report").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Assessment report aggregation service"));
}

#[test]
fn test_cli_serve_help() {
    let mut cmd = Command::cargo_bin("assess-report").unwrap();
    cmd.arg("serve").arg("--help").assert().success().stdout(predicate::str::contains("port"));
}

#[test]
fn test_cli_rejects_unknown_kind() {
    let mut cmd = Command::cargo_bin("assess-report").unwrap();
    cmd.args(["page", "--kinds", "lecture"]).assert().failure().stderr(predicate::str::contains("lecture"));
}
