//! Common test utilities for Appdeck integration tests

use std::path::PathBuf;

use sha2::{Digest, Sha256};
use tempfile::TempDir;

/// A test workspace with its own catalog, cache and state file
#[allow(dead_code)]
pub struct TestWorkspace {
    /// Temporary directory
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

#[allow(dead_code)]
impl TestWorkspace {
    /// Create a new test workspace
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        std::fs::create_dir_all(path.join("cache")).expect("Failed to create cache directory");
        Self { temp, path }
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.path.join("catalog.json")
    }

    pub fn state_path(&self) -> PathBuf {
        self.path.join("state.json")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.path.join("cache")
    }

    /// Write the catalog file
    pub fn write_catalog(&self, json: &str) {
        std::fs::write(self.catalog_path(), json).expect("Failed to write catalog");
    }

    /// Write the state file
    pub fn write_state(&self, json: &str) {
        std::fs::write(self.state_path(), json).expect("Failed to write state");
    }

    /// Read the state file
    pub fn read_state(&self) -> String {
        std::fs::read_to_string(self.state_path()).expect("Failed to read state")
    }

    /// Seed an artifact into the content-addressed cache; returns its digest
    pub fn seed_artifact(&self, bytes: &[u8]) -> String {
        let digest = sha256_hex(bytes);
        let path = self.cache_dir().join(&digest);
        std::fs::write(&path, bytes).expect("Failed to seed artifact");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path)
                .expect("Failed to stat artifact")
                .permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&path, perms).expect("Failed to chmod artifact");
        }

        digest
    }

    /// Seed a shell-script artifact (for exe-kind installs on Unix)
    pub fn seed_script(&self, body: &str) -> String {
        self.seed_artifact(format!("#!/bin/sh\n{body}\n").as_bytes())
    }

    /// Build an appdeck command pointed at this workspace
    pub fn cmd(&self) -> assert_cmd::Command {
        let mut cmd =
            assert_cmd::Command::cargo_bin("appdeck").expect("Failed to find appdeck binary");
        cmd.arg("--catalog")
            .arg(self.catalog_path())
            .arg("--cache-dir")
            .arg(self.cache_dir())
            .arg("--state-file")
            .arg(self.state_path());
        cmd
    }
}

/// SHA-256 of a byte slice as lowercase hex
#[allow(dead_code)]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// A minimal catalog entry as a JSON object string
#[allow(dead_code)]
pub fn catalog_entry(app_id: &str, digest: &str, deps: &[&str]) -> String {
    let deps: Vec<String> = deps.iter().map(|d| format!("\"{d}\"")).collect();
    format!(
        r#"{{
            "app_id": "{app_id}",
            "name": "{app_id}",
            "version": "1.0.0",
            "uri": "https://unreachable.invalid/{app_id}",
            "sha256": "{digest}",
            "installer_type": "exe",
            "dependencies": [{}],
            "uninstall_command": "exit 0"
        }}"#,
        deps.join(", ")
    )
}

/// Wrap catalog entries into a catalog document
#[allow(dead_code)]
pub fn catalog_doc(entries: &[String]) -> String {
    format!(r#"{{ "applications": [{}] }}"#, entries.join(", "))
}
