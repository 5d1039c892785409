//! End-to-end tests for the `subc` binary: file I/O, `--output`, and exit
//! codes. The compiler's own behavior is covered by `tests/compile.rs`;
//! these only check the thin CLI wrapper around it.

use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_subc")
}

#[test]
fn writes_assembly_to_the_output_file() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let source_path = dir.path().join("main.c");
    let output_path = dir.path().join("main.s");
    fs::write(&source_path, "int main() { return 42; }").unwrap();

    let status = Command::new(bin())
        .arg(&source_path)
        .arg("-o")
        .arg(&output_path)
        .status()
        .expect("failed to run subc");

    assert!(status.success());
    let asm = fs::read_to_string(&output_path).unwrap();
    assert!(asm.contains("mov x0, #42"));
    assert!(asm.contains(".globl main"));
}

#[test]
fn prints_assembly_to_stdout_without_output_flag() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let source_path = dir.path().join("main.c");
    fs::write(&source_path, "int main() { return 0; }").unwrap();

    let output = Command::new(bin())
        .arg(&source_path)
        .output()
        .expect("failed to run subc");

    assert!(output.status.success());
    let asm = String::from_utf8(output.stdout).unwrap();
    assert!(asm.contains("main:"));
}

#[test]
fn reports_a_missing_source_file() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let missing = dir.path().join("does-not-exist.c");

    let output = Command::new(bin())
        .arg(&missing)
        .output()
        .expect("failed to run subc");

    assert!(!output.status.success());
    assert!(!String::from_utf8(output.stderr).unwrap().is_empty());
}

#[test]
fn reports_a_compile_error_with_nonzero_exit() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let source_path = dir.path().join("main.c");
    fs::write(&source_path, "int main() { return x; }").unwrap();

    let output = Command::new(bin())
        .arg(&source_path)
        .output()
        .expect("failed to run subc");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("undefined variable"));
}
