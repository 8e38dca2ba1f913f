use assert_cmd::Command;
use predicates::prelude::*;

fn cargo_bin() -> Command { Command::cargo_bin("bf").unwrap() }

#[test]
fn test_ir_prints_block_graph() {
    cargo_bin()
        .args(["ir", "+[-]."])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("declare void @output(i32)")
                .and(predicate::str::contains("define void @main()"))
                .and(predicate::str::contains("entry:"))
                .and(predicate::str::contains("loop.check:"))
                .and(predicate::str::contains("icmp ne"))
                .and(predicate::str::contains("sext"))
                .and(predicate::str::contains("call @output"))
                .and(predicate::str::contains("ret void")),
        );
}

#[test]
fn test_ir_of_empty_program_returns_immediately() {
    cargo_bin()
        .arg("ir")
        .assert()
        .success()
        .stdout(predicate::str::contains("entry:").and(predicate::str::contains("loop.").not()));
}

#[test]
fn test_ir_reports_unmatched_brackets() {
    cargo_bin()
        .args(["ir", "[[]"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("unmatched bracket '['"));
}
