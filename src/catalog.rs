//! Application catalog loading and lookup
//!
//! The catalog is a declarative JSON document describing every installable
//! application: where its installer comes from, how to verify it, how to run
//! it silently, and what it depends on. It is loaded once and treated as
//! read-only for the lifetime of the process; re-loading constructs a fresh
//! instance.
//!
//! Dependency references to applications that are absent from the catalog
//! are NOT load-time errors: partial catalogs may be intentionally pruned,
//! so unresolvable references surface as planning warnings instead.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppdeckError, Result};
use crate::hash;

/// Installer technology for an application artifact
///
/// A closed set: adding a new kind is a compile-time-checked change in the
/// runner's dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallerKind {
    Msi,
    Exe,
    Appx,
}

impl InstallerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Msi => "msi",
            Self::Exe => "exe",
            Self::Appx => "appx",
        }
    }
}

/// Immutable catalog record for one installable application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppMetadata {
    /// Unique key across the catalog
    pub app_id: String,

    /// Human-readable name
    pub name: String,

    /// Semver-comparable version string
    pub version: String,

    /// Download location of the installer artifact
    #[serde(rename = "uri")]
    pub download_uri: String,

    /// Lowercase hex SHA-256 of the artifact
    #[serde(rename = "sha256")]
    pub content_hash: String,

    #[serde(rename = "installer_type")]
    pub installer_kind: InstallerKind,

    /// Hostname allow-list for the download URI; empty means unrestricted
    #[serde(default)]
    pub vetted_domains: Vec<String>,

    /// Optional HMAC-SHA256 signature over the artifact (hex)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,

    /// Hex key material for the HMAC signature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_key: Option<String>,

    /// Direct dependencies, by app_id, in declaration order
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Arguments for an unattended install
    #[serde(default)]
    pub silent_args: Vec<String>,

    /// Opaque command line that removes the application
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uninstall_command: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogDocument {
    applications: Vec<AppMetadata>,
}

/// The loaded, validated application catalog
#[derive(Debug)]
pub struct Catalog {
    apps: Vec<AppMetadata>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Load and validate a catalog from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| AppdeckError::CatalogReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::parse(&content, &path.display().to_string())
    }

    /// Parse and validate a catalog from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Self::parse(json, "<inline>")
    }

    fn parse(json: &str, origin: &str) -> Result<Self> {
        let doc: CatalogDocument =
            serde_json::from_str(json).map_err(|e| AppdeckError::CatalogParseFailed {
                path: origin.to_string(),
                reason: e.to_string(),
            })?;

        let mut index = HashMap::with_capacity(doc.applications.len());
        for (i, app) in doc.applications.iter().enumerate() {
            if app.app_id.is_empty() {
                return Err(AppdeckError::CatalogParseFailed {
                    path: origin.to_string(),
                    reason: format!("application at index {i} has an empty app_id"),
                });
            }
            if !hash::is_valid_digest(&app.content_hash) {
                return Err(AppdeckError::InvalidContentHash {
                    app_id: app.app_id.clone(),
                    hash: app.content_hash.clone(),
                });
            }
            if index.insert(app.app_id.clone(), i).is_some() {
                return Err(AppdeckError::DuplicateAppId {
                    app_id: app.app_id.clone(),
                });
            }
        }

        Ok(Self {
            apps: doc.applications,
            index,
        })
    }

    /// Look up an application by id
    pub fn lookup(&self, app_id: &str) -> Option<&AppMetadata> {
        self.index.get(app_id).map(|&i| &self.apps[i])
    }

    /// Whether the catalog contains an application
    pub fn contains(&self, app_id: &str) -> bool {
        self.index.contains_key(app_id)
    }

    /// Number of applications in the catalog
    pub fn len(&self) -> usize {
        self.apps.len()
    }
}
