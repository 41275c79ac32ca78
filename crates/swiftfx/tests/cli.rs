use std::fs;
use std::process::{Command, Output};

use tempfile::TempDir;

fn swiftfx(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_swiftfx"))
        .env_remove("SWIFTFX_GPU_POWER")
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run swiftfx")
}

#[test]
fn plan_prints_routes_for_filter_flags() {
    let output = swiftfx(&["plan", "--filter", "blur:3", "--filter", "passthrough"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("2 filters, 3 passes"), "{stdout}");
    assert!(stdout.contains("pass 0: source -> slot 0"), "{stdout}");
    assert!(stdout.contains("pass 1: slot 0 -> slot 1"), "{stdout}");
    assert!(stdout.contains("pass 2: slot 1 -> surface"), "{stdout}");
    assert!(stdout.contains("gaussian-blur (#1 pass 2/2)"), "{stdout}");
}

#[test]
fn plan_reads_chain_file() {
    let dir = TempDir::new().unwrap();
    let chain = dir.path().join("chain.toml");
    fs::write(
        &chain,
        r#"
version = 1

[[filters]]
kind = "passthrough"

[[filters]]
kind = "gaussian-blur"
radius = 8
normalization = "legacy"
"#,
    )
    .unwrap();

    let output = swiftfx(&["plan", "--chain", chain.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("2 filters, 3 passes"), "{stdout}");
    assert!(stdout.contains("passthrough (#1 pass 1/1)"), "{stdout}");
}

#[test]
fn rejects_unknown_filter_flag() {
    let output = swiftfx(&["plan", "--filter", "sharpen:2"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("unknown filter"), "{stderr}");
}

#[test]
fn rejects_invalid_chain_file() {
    let dir = TempDir::new().unwrap();
    let chain = dir.path().join("chain.toml");
    fs::write(&chain, "version = 3\n\n[[filters]]\nkind = \"passthrough\"\n").unwrap();

    let output = swiftfx(&["plan", "--chain", chain.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("unsupported chain version 3"), "{stderr}");
}

#[test]
fn plan_without_filters_fails() {
    let output = swiftfx(&["plan"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("no filters given"), "{stderr}");
}

#[test]
fn render_requires_an_output_or_window() {
    let output = swiftfx(&["input.png", "--filter", "passthrough"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("nothing to do"), "{stderr}");
}

#[test]
fn render_reports_missing_input_image() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.png");
    let out = dir.path().join("out.png");
    let output = swiftfx(&[
        missing.to_str().unwrap(),
        "--filter",
        "passthrough",
        "--output",
        out.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("failed to open image"), "{stderr}");
    assert!(!out.exists());
}
