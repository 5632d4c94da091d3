//! Shared test helpers for srcpack integration tests.
//!
//! All tests use temp directories and pass `--config` explicitly, so nothing
//! next to the test binary is ever read.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// A temp workspace with a source tree, a rule file and a config path.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write a file (creating parents) and return its absolute path.
    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn read(&self, rel: &str) -> Vec<u8> {
        std::fs::read(self.path(rel))
            .unwrap_or_else(|e| panic!("failed to read {rel}: {e}"))
    }

    pub fn config_path(&self) -> PathBuf {
        self.path("srcpack.toml")
    }

    /// Run srcpack with this fixture's config prepended.
    pub fn run(&self, args: &[&str]) -> Output {
        let config = self.config_path();
        let mut full = vec!["--config", config.to_str().unwrap()];
        full.extend_from_slice(args);
        srcpack_in(self.root(), &full)
    }

    pub fn ok(&self, args: &[&str]) -> String {
        let out = self.run(args);
        assert_success(&out, args);
        String::from_utf8_lossy(&out.stdout).to_string()
    }

    pub fn fails(&self, args: &[&str]) -> String {
        let out = self.run(args);
        assert_failure(&out, args);
        String::from_utf8_lossy(&out.stderr).to_string()
    }

    /// Run with `--format json` and parse stdout.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let mut full = vec!["--format", "json"];
        full.extend_from_slice(args);
        let stdout = self.ok(&full);
        serde_json::from_str(&stdout)
            .unwrap_or_else(|e| panic!("invalid JSON from srcpack {}: {e}\n{stdout}", args.join(" ")))
    }

    /// Pack `rules` (written to paths.txt) into archive.txt.
    pub fn pack(&self, rules: &str) -> serde_json::Value {
        let rules_file = self.write("paths.txt", rules);
        let archive = self.path("archive.txt");
        self.json(&[
            "pack",
            "--rules",
            rules_file.to_str().unwrap(),
            "--output",
            archive.to_str().unwrap(),
        ])
    }

    /// Unpack archive.txt into `restore` (relative to the fixture).
    pub fn unpack(&self, restore: &str, extra: &[&str]) -> serde_json::Value {
        let archive = self.path("archive.txt");
        let restore = self.path(restore);
        let mut args = vec![
            "unpack",
            archive.to_str().unwrap(),
            restore.to_str().unwrap(),
        ];
        args.extend_from_slice(extra);
        self.json(&args)
    }
}

/// Run srcpack in the given directory. Returns raw output.
pub fn srcpack_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_srcpack"))
        .args(args)
        .current_dir(dir)
        .env_remove("SRCPACK_CONFIG")
        .env_remove("SRCPACK_LOG_FORMAT")
        .output()
        .expect("failed to execute srcpack")
}

/// Run srcpack and assert it succeeds. Returns stdout as string.
pub fn srcpack_ok(dir: &Path, args: &[&str]) -> String {
    let out = srcpack_in(dir, args);
    assert_success(&out, args);
    String::from_utf8_lossy(&out.stdout).to_string()
}

/// Run srcpack and assert it fails. Returns stderr as string.
pub fn srcpack_fails(dir: &Path, args: &[&str]) -> String {
    let out = srcpack_in(dir, args);
    assert_failure(&out, args);
    String::from_utf8_lossy(&out.stderr).to_string()
}

fn assert_success(out: &Output, args: &[&str]) {
    assert!(
        out.status.success(),
        "srcpack {} failed:\nstdout: {}\nstderr: {}",
        args.join(" "),
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr),
    );
}

fn assert_failure(out: &Output, args: &[&str]) {
    assert!(
        !out.status.success(),
        "Expected srcpack {} to fail, but it succeeded.\nstdout: {}",
        args.join(" "),
        String::from_utf8_lossy(&out.stdout),
    );
}

/// TOML literal string for a path (no escape processing).
pub fn toml_path(path: &Path) -> String {
    format!("'{}'", path.display())
}
