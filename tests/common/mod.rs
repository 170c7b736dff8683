#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::{Builder, TempDir};

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Runs the binary from an empty working directory so no stray
/// `testsift.toml` is picked up.
pub fn run_testsift(args: &[&str]) -> Output {
    let workdir = TempDir::new().expect("temp workdir should be created");
    run_testsift_in(workdir.path(), args)
}

pub fn run_testsift_in(workdir: &Path, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_testsift"));
    command.current_dir(workdir);
    command.env_remove("TESTSIFT_LOG");
    command.args(args);
    command.output().expect("failed to run testsift binary")
}

pub fn write_temp_source(suffix: &str, content: &str) -> PathBuf {
    let mut temp_file = Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp source file should be created");
    temp_file
        .write_all(content.as_bytes())
        .expect("temp source write should succeed");
    temp_file.keep().expect("temp file should persist").1
}

pub fn path_arg(path: &Path) -> &str {
    path.to_str().expect("path should be utf-8")
}

pub fn success_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "command failed: stdout={} stderr={}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON")
}

pub fn failure_json(output: &Output) -> Value {
    assert!(
        !output.status.success(),
        "command unexpectedly succeeded: {}",
        String::from_utf8_lossy(&output.stdout)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON")
}
