use assert_cmd::{Command, cargo::cargo_bin_cmd};
use std::fs;
use std::path::Path;

pub fn tamperwatch_cmd() -> Command {
    cargo_bin_cmd!("tamperwatch")
}

/// Creates each file (and its parent directories) under `root`.
#[allow(dead_code)]
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let full = root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }
}

// Each integration test file is compiled as its own crate, and not every one
// of them records a baseline through the binary.
#[allow(dead_code)]
pub fn init_baseline(root: &Path, baseline: &Path) {
    tamperwatch_cmd()
        .arg("init")
        .arg("--path")
        .arg(root)
        .arg("--baseline")
        .arg(baseline)
        .assert()
        .success();
}

#[allow(dead_code)]
pub fn read_json(path: &Path) -> serde_json::Value {
    let content = fs::read_to_string(path).expect("file should exist");
    serde_json::from_str(&content).expect("file should hold valid JSON")
}
