//! Run the `asd` binary on script files and check stdout, stderr and the
//! exit status.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Path to the `asd` binary built by this Cargo workspace.
fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_asd"))
}

fn script_file(src: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new()
        .suffix(".asd")
        .tempfile()
        .expect("create script");
    f.write_all(src.as_bytes()).expect("write script");
    f
}

/// Run with user config skipped, feeding `stdin`.
fn run_asd(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(binary())
        .arg("-f")
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn asd binary");
    child
        .stdin
        .take()
        .expect("stdin not open")
        .write_all(stdin.as_bytes())
        .expect("write to stdin");
    child.wait_with_output().expect("wait failed")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn runs_script_file() {
    let f = script_file("SETVAR n 2\nLOOP 3 (\nMULT n 2\n)\nPRINT n = =(n)\n");
    let out = run_asd(&[f.path().to_str().unwrap()], "");
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "4\n8\n16\nn = 16\n");
}

#[test]
fn inline_code() {
    let out = run_asd(&["-e", "PRINT inline\nEQ 1 1"], "");
    assert!(out.status.success());
    assert_eq!(stdout(&out), "inline\ntrue\n");
}

#[test]
fn readline_from_stdin() {
    let f = script_file("SETVAR who READLINE()\nPRINT Hello, =(who)!\n");
    let out = run_asd(&[f.path().to_str().unwrap()], "Lin\n");
    assert_eq!(stdout(&out), "Hello, Lin!\n");
}

#[test]
fn exit_is_success() {
    let out = run_asd(&["-e", "EXIT \"bye\"\nPRINT never"], "");
    assert!(out.status.success());
    assert_eq!(stdout(&out), "bye\n");
}

#[test]
fn runtime_diagnostic_goes_to_stderr() {
    let out = run_asd(&["-e", "SETVAR a 1\nDIV a 0\nPRINT still here"], "");
    assert!(out.status.success());
    assert_eq!(stdout(&out), "still here\n");
    let err = stderr(&out);
    assert!(err.contains("ASD ERR!: Runtime Error at line 2;"), "stderr: {err}");
    assert!(err.contains("💡 Tip:"), "stderr: {err}");
}

#[test]
fn tips_can_be_disabled() {
    let out = run_asd(&["-T", "-e", "DIV 1 0"], "");
    let err = stderr(&out);
    assert!(err.contains("ASD ERR!"));
    assert!(!err.contains("Tip:"), "stderr: {err}");
}

#[test]
fn structural_error_exits_nonzero() {
    let f = script_file("PRINT first\nIF 1 THEN DO\nPRINT inside\n");
    let out = run_asd(&[f.path().to_str().unwrap()], "");
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).is_empty());
    assert!(stderr(&out).contains("at line 2"), "stderr: {}", stderr(&out));
}

#[test]
fn missing_script_exits_nonzero() {
    let out = run_asd(&["/no/such/script.asd"], "");
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("cannot read script"));
}

#[test]
fn usage_error() {
    let out = Command::new(binary()).arg("-z").output().expect("spawn");
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("Usage: asd"));
}

#[test]
fn iteration_cap_flag() {
    let out = run_asd(&["-m3", "-e", "WHILE 1 (\nINC n\n)"], "");
    assert!(out.status.success());
    assert_eq!(stdout(&out), "1\n2\n3\n");
    assert!(stderr(&out).contains("after 3 iterations"));
}

#[test]
fn seed_flag_is_reproducible() {
    let src = "LOOP 10 (\nRANDOM 1 1000\n)";
    let a = run_asd(&["-s42", "-e", src], "");
    let b = run_asd(&["-s42", "-e", src], "");
    assert_eq!(stdout(&a), stdout(&b));
    assert_eq!(stdout(&a).lines().count(), 10);
}

#[test]
fn explicit_config_file() {
    let mut rc = tempfile::NamedTempFile::new().unwrap();
    writeln!(rc, "# test config\nmax_iterations = 2\nshow_tips = off\nbogus = 1").unwrap();
    let flag = format!("-f{}", rc.path().display());
    let out = Command::new(binary())
        .args([flag.as_str(), "-e", "WHILE 1 (\nINC n\n)"])
        .env_remove("RUST_LOG")
        .output()
        .expect("spawn");
    assert!(out.status.success());
    assert_eq!(stdout(&out), "1\n2\n");
    let err = stderr(&out);
    assert!(err.contains("asd: warning:"), "stderr: {err}");
    assert!(!err.contains("Tip:"), "stderr: {err}");
}
