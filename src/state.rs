//! Durable installation state
//!
//! The state store is a single JSON document holding one record per
//! application, in insertion order. Records are created on first successful
//! install, overwritten in place on reinstall, and flipped to
//! `installed: false` on uninstall, never deleted implicitly, so the
//! history stays auditable. An explicit `purge` is the only hard delete.
//!
//! Writes go through an atomic temp-file-then-rename so a crash mid-write
//! can never corrupt the existing document. A process-wide mutex serializes
//! mutations; reads reload the (small) document from disk and take no lock.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{AppdeckError, Result};

/// Default state file name under the data directory
pub const STATE_FILE: &str = "state.json";

/// Get the default state file path
///
/// Returns `~/.local/share/appdeck/state.json` on Unix or the platform
/// equivalent. Can be overridden with the `APPDECK_STATE_FILE` environment
/// variable.
pub fn default_state_file() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("APPDECK_STATE_FILE") {
        return Ok(PathBuf::from(path));
    }

    let base = dirs::data_dir().ok_or_else(|| AppdeckError::IoError {
        message: "Could not determine data directory".to_string(),
    })?;

    Ok(base.join("appdeck").join(STATE_FILE))
}

/// Per-application installation record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppStatus {
    pub app_id: String,

    /// Version recorded at install time
    pub version: String,

    /// False after uninstall; the record itself is retained
    pub installed: bool,

    /// Cache path of the artifact the install ran from
    pub installer_path: PathBuf,

    /// Dependency closure at install time
    pub dependencies: Vec<String>,

    pub installed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StateDocument {
    applications: Vec<AppStatus>,
}

/// Owner of the state file; all access goes through its methods
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl StateStore {
    /// Open a state store backed by the given file, creating parent
    /// directories as needed. A missing file reads as an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| AppdeckError::StateWriteFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Fetch the record for one application
    pub fn get(&self, app_id: &str) -> Result<Option<AppStatus>> {
        let doc = self.load()?;
        Ok(doc.applications.into_iter().find(|s| s.app_id == app_id))
    }

    /// All records, in insertion order
    pub fn list(&self) -> Result<Vec<AppStatus>> {
        Ok(self.load()?.applications)
    }

    /// Snapshot of all records keyed by id, for planning
    pub fn snapshot(&self) -> Result<HashMap<String, AppStatus>> {
        Ok(self
            .load()?
            .applications
            .into_iter()
            .map(|s| (s.app_id.clone(), s))
            .collect())
    }

    /// Record a successful install, overwriting any prior record in place
    pub fn mark_installed(
        &self,
        app_id: &str,
        version: &str,
        installer_path: &Path,
        dependencies: Vec<String>,
    ) -> Result<AppStatus> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let status = AppStatus {
            app_id: app_id.to_string(),
            version: version.to_string(),
            installed: true,
            installer_path: installer_path.to_path_buf(),
            dependencies,
            installed_at: Utc::now(),
        };

        let mut doc = self.load()?;
        match doc.applications.iter_mut().find(|s| s.app_id == app_id) {
            Some(existing) => *existing = status.clone(),
            None => doc.applications.push(status.clone()),
        }
        self.save(&doc)?;

        Ok(status)
    }

    /// Flip a record to uninstalled without deleting it
    pub fn mark_uninstalled(&self, app_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut doc = self.load()?;
        if let Some(existing) = doc.applications.iter_mut().find(|s| s.app_id == app_id) {
            existing.installed = false;
            self.save(&doc)?;
        }
        Ok(())
    }

    /// Hard-delete a record; returns whether one existed
    pub fn purge(&self, app_id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut doc = self.load()?;
        let before = doc.applications.len();
        doc.applications.retain(|s| s.app_id != app_id);
        let removed = doc.applications.len() != before;
        if removed {
            self.save(&doc)?;
        }
        Ok(removed)
    }

    fn load(&self) -> Result<StateDocument> {
        if !self.path.exists() {
            return Ok(StateDocument::default());
        }

        let content =
            fs::read_to_string(&self.path).map_err(|e| AppdeckError::StateReadFailed {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        serde_json::from_str(&content).map_err(|e| AppdeckError::StateParseFailed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Serialize to a uniquely named temp file in the same directory, then
    /// rename over the target so readers never observe a partial document.
    fn save(&self, doc: &StateDocument) -> Result<()> {
        let content =
            serde_json::to_string_pretty(doc).map_err(|e| AppdeckError::StateWriteFailed {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let tmp = NamedTempFile::new_in(dir).map_err(|e| AppdeckError::StateWriteFailed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        fs::write(tmp.path(), content).map_err(|e| AppdeckError::StateWriteFailed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        tmp.persist(&self.path)
            .map_err(|e| AppdeckError::StateWriteFailed {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        Ok(())
    }
}
