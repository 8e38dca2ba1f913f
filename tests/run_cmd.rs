use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn cargo_bin() -> Command { Command::cargo_bin("bf").unwrap() }

fn hello_world() -> &'static str {
    "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>."
}

fn read_to_tempfile(content: &str) -> tempfile::NamedTempFile {
    let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
    write!(tf, "{}", content).unwrap();
    tf
}

#[test]
fn test_run_positional_code_success() {
    cargo_bin()
        .arg("run").arg(hello_world())
        .assert()
        .success()
        .stdout("Hello World!\n\n")
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_run_concatenates_positional_parts() {
    cargo_bin()
        .args(["run", "++", "++", "."])
        .assert()
        .success()
        .stdout("\u{4}\n");
}

#[test]
fn test_run_file_success() {
    let tf = read_to_tempfile("comments are fine\n+++ +++ +++ +++ +++ +++ +++ +++ + .\n");
    cargo_bin()
        .arg("run").arg("--file").arg(tf.path())
        .assert()
        .success()
        .stdout("\u{19}\n")
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_run_rejects_file_and_code_together() {
    let tf = read_to_tempfile("+.");
    cargo_bin()
        .arg("run").arg("--file").arg(tf.path()).arg("+")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot use positional code together with --file"));
}

#[test]
fn test_run_without_code_prints_usage() {
    cargo_bin()
        .arg("run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_run_trace_prints_table() {
    cargo_bin()
        .args(["run", "--trace", "++[>+<-]>."])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("STEP | BLOCK")
                .and(predicate::str::contains("Branch to loop.body"))
                .and(predicate::str::contains("Return"))
                .and(predicate::str::contains("OUTPUT | 2")),
        )
        .stderr(predicate::str::is_empty());
}
