//! CLI Integration Test Modules

pub mod commands;
pub mod failures;

use std::path::{Path, PathBuf};
use std::process::Output;

use tempfile::TempDir;

/// A temporary database and config file for one test
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("pagewatch.toml"),
            "[watch]\nrequest_timeout_ms = 2000\n\n[notify]\nbackend = \"log\"\nretry_attempts = 1\n",
        )
        .unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn database(&self) -> PathBuf {
        self.dir.path().join("items.db")
    }

    /// Run the binary with this workspace's config and database
    pub async fn run(&self, args: &[&str]) -> Output {
        let mut command = std::process::Command::new(env!("CARGO_BIN_EXE_pagewatch"));
        command
            .arg("--config-file")
            .arg(self.dir.path().join("pagewatch.toml"))
            .arg("--database")
            .arg(self.database())
            .arg("--log-level")
            .arg("off")
            .arg("--no-color")
            .args(args);
        tokio::task::spawn_blocking(move || command.output().unwrap())
            .await
            .unwrap()
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
