//! CLI surface tests
//!
//! Only exercises argument parsing and help output; nothing here talks to a
//! ticket API.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_all_subcommands() {
    Command::cargo_bin("td")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("list")
                .and(predicate::str::contains("create"))
                .and(predicate::str::contains("update"))
                .and(predicate::str::contains("stats"))
                .and(predicate::str::contains("classify")),
        );
}

#[test]
fn version_flag_reports_version() {
    Command::cargo_bin("td")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_subcommand_fails() {
    Command::cargo_bin("td")
        .unwrap()
        .arg("frobnicate")
        .assert()
        .failure();
}

#[test]
fn create_requires_title_and_description() {
    Command::cargo_bin("td")
        .unwrap()
        .args(["create", "--title", "Broken login"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--description"));
}

#[test]
fn update_rejects_non_numeric_id() {
    Command::cargo_bin("td")
        .unwrap()
        .args(["update", "abc", "--status", "resolved"])
        .assert()
        .failure();
}
