//! Runs the `min-cost-st` binary.

use std::path::PathBuf;
use std::process::{Command, Output};

fn instance_path(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("instances")
        .join(name)
        .display()
        .to_string()
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_min-cost-st"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn prints_total_cost_and_passes_self_test() {
    let table = instance_path("optima.csv");
    let output = run(&["-x", "-r", "-u", "-c", "-t", "--optimum-table", &table, &instance_path("wiki.stp")]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "Total cost: 190.00\nResult is a minimum cost Steiner tree\n"
    );
}

#[test]
fn prints_edge_list() {
    let output = run(&["-a", &instance_path("shortcut.stp")]);
    assert!(output.status.success());
    let line = stdout(&output);
    assert!(line.contains("{1 0 1.00}"));
    assert!(line.contains("{1 2 1.00}"));
    assert_eq!(line.matches('{').count(), 2);
}

#[test]
fn approximation_self_test_reports_gap_or_optimum() {
    let table = instance_path("optima.csv");
    let output = run(&["-a", "-p", "-c", "-t", "--threads", "2", "--optimum-table", &table, &instance_path("grid3.stp")]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Result is a"));
}

#[test]
fn random_instance_solves() {
    let output = run(&["-h", "-c", "-t", "--random", "40", "--terminals", "5", "--seed", "7"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.starts_with("Total cost: "));
    assert!(out.contains("Result is a Steiner tree"));
}

#[test]
fn rejects_conflicting_options() {
    assert_eq!(run(&["-a", "-x", &instance_path("wiki.stp")]).status.code(), Some(2));
    assert_eq!(run(&["-x", "-p", &instance_path("wiki.stp")]).status.code(), Some(2));
    assert_eq!(run(&["-s", "-r", &instance_path("wiki.stp")]).status.code(), Some(2));
    assert_eq!(run(&["-a"]).status.code(), Some(2));
}

#[test]
fn missing_file_fails() {
    let output = run(&["-m", "/no/such/instance.stp"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot read"));
}
