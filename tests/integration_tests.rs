//! Integration tests for the Carbon Shunya CLI

use std::process::{Command, Output};

const MISSING_CONFIG: &str = "/nonexistent/carbon-shunya/config.toml";

fn carbon_shunya(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_carbon-shunya"))
        .args(["--config", MISSING_CONFIG])
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help with explicit help flag
#[test]
fn test_cli_help() {
    let output = carbon_shunya(&["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("carbon-shunya"));
    assert!(stdout.contains("carbon credit score"));
    assert!(stdout.contains("assess"));
    assert!(stdout.contains("serve"));
}

/// Test that running without a subcommand prints the overview
#[test]
fn test_cli_overview_without_command() {
    let output = carbon_shunya(&[]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Carbon Shunya v"));
    assert!(stdout.contains("carbon-shunya assess"));
}

/// Blank location input waits for the user instead of failing
#[test]
fn test_assess_blank_location() {
    let output = carbon_shunya(&["assess", "--location", "   "]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Enter a location"));
}

#[test]
fn test_assess_radius_out_of_range() {
    let output = carbon_shunya(&["assess", "--location", "Dehradun", "--radius", "11"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--radius"));
}

#[test]
fn test_assess_requires_location() {
    let output = carbon_shunya(&["assess"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--location"));
}

/// Test verbose flag shows configuration details
#[test]
fn test_verbose_shows_config_path() {
    let output = carbon_shunya(&["--verbose", "assess", "--location", ""]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Using config from"));
    assert!(stdout.contains(MISSING_CONFIG));
}
