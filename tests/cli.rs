//! Exit-status contract of the `doc2md` binary.
//!
//! None of these reach pandoc: argument handling runs before the
//! pandoc check.

#![cfg(feature = "cli")]

use std::process::{Command, Output};

fn doc2md(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_doc2md"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run doc2md")
}

#[test]
fn unknown_flag_exits_with_one() {
    let out = doc2md(&["--bogus", "x"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("--bogus"), "stderr: {stderr}");
}

#[test]
fn no_arguments_prints_help_and_exits_with_one() {
    let out = doc2md(&[]);
    assert_eq!(out.status.code(), Some(1));
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    assert!(text.contains("Usage"), "output: {text}");
}

#[test]
fn conflicting_modes_exit_with_one() {
    let out = doc2md(&["--step1", "--step2", "a.html"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn version_exits_with_zero() {
    let out = doc2md(&["--version"]);
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")), "stdout: {stdout}");
}

#[test]
fn step2_help_names_its_default_format() {
    let out = doc2md(&["--help"]);
    assert_eq!(out.status.code(), Some(0));
    let help = String::from_utf8_lossy(&out.stdout)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    assert!(help.contains("Targets gfm, not plain markdown"), "help: {help}");
}
