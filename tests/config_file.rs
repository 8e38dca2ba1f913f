use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::time::Duration;

fn config_file(content: &str) -> tempfile::NamedTempFile {
    let mut tf = tempfile::NamedTempFile::new().expect("tempfile");
    write!(tf, "{}", content).unwrap();
    tf
}

#[test]
fn test_config_file_sets_step_limit() {
    let cfg = config_file("[run]\nmax_steps = 300\n");
    Command::cargo_bin("bf").unwrap()
        .timeout(Duration::from_secs(2))
        .env("BF_CONFIG", cfg.path())
        .env_remove("BF_MAX_STEPS")
        .args(["run", "+[]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("step limit exceeded (300)"));
}

#[test]
fn test_env_wins_over_config_file() {
    let cfg = config_file("[run]\nmax_steps = 300\n");
    Command::cargo_bin("bf").unwrap()
        .timeout(Duration::from_secs(2))
        .env("BF_CONFIG", cfg.path())
        .env("BF_MAX_STEPS", "40")
        .args(["run", "+[]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("step limit exceeded (40)"));
}

#[test]
fn test_missing_config_file_is_ignored() {
    Command::cargo_bin("bf").unwrap()
        .env("BF_CONFIG", "/definitely/not/here/bf.toml")
        .args(["run", "+."])
        .assert()
        .success()
        .stdout("\u{1}\n");
}
