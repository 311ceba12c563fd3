use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};

#[allow(dead_code, deprecated)]
pub fn cfn_tools_cmd() -> Command {
    let mut cmd = Command::cargo_bin("cfn-tools").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Writes `content` to `dir/name`, creating parent directories.
#[allow(dead_code)]
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

#[allow(dead_code)]
pub const OPENAPI_YAML: &str = "openapi: 3.0.0\ninfo:\n  title: My API\n  version: 1.0.0";
