//! Artifact downloads and the content-addressed cache
//!
//! Installer artifacts are cached under a single flat directory, keyed by
//! their SHA-256 digest:
//!
//! ```text
//! ~/.cache/appdeck/artifacts/
//! └── <sha256-hex>
//! ```
//!
//! A fetch first consults the cache and re-verifies the stored bytes; only
//! on a miss (or a corrupted entry, which is deleted) does it go to the
//! network. Downloads stream to a uniquely named temp file in the cache
//! directory and are verified BEFORE the atomic rename into place, so the
//! cache never publishes unverified bytes and concurrent fetches of the
//! same digest from separate processes cannot observe a partial entry.
//!
//! Eviction is manual: corrupted entries are replaced, everything else
//! lives until the user clears the cache.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use indicatif::ProgressBar;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::catalog::AppMetadata;
use crate::error::{AppdeckError, Result};
use crate::hash;

/// Connect timeout for artifact downloads
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Buffer size for streaming downloads (8 KB)
const STREAM_BUFFER_SIZE: usize = 8192;

/// Cache directory name under the user's cache directory
const CACHE_DIR: &str = "appdeck";

/// Artifacts subdirectory within the cache
const ARTIFACTS_DIR: &str = "artifacts";

/// Get the default artifact cache directory
///
/// Returns `~/.cache/appdeck/artifacts` on Unix or the platform
/// equivalent. Can be overridden with the `APPDECK_CACHE_DIR` environment
/// variable.
pub fn default_cache_dir() -> Result<PathBuf> {
    if let Ok(cache_dir) = std::env::var("APPDECK_CACHE_DIR") {
        return Ok(PathBuf::from(cache_dir));
    }

    let base = dirs::cache_dir().ok_or_else(|| AppdeckError::CacheOperationFailed {
        message: "Could not determine cache directory".to_string(),
    })?;

    Ok(base.join(CACHE_DIR).join(ARTIFACTS_DIR))
}

/// Independent OS code-signature check (e.g. Authenticode)
///
/// Runs in addition to the content hash and HMAC checks; a failure is a
/// warning unless the manager was configured to require signatures.
pub trait AuthenticodeVerifier: Send + Sync {
    /// Returns `Err(reason)` when the artifact's code signature is not valid
    fn verify(&self, artifact: &Path) -> std::result::Result<(), String>;
}

/// Authenticode verification through `Get-AuthenticodeSignature`
#[cfg(windows)]
pub struct PowershellAuthenticode;

#[cfg(windows)]
impl AuthenticodeVerifier for PowershellAuthenticode {
    fn verify(&self, artifact: &Path) -> std::result::Result<(), String> {
        let output = std::process::Command::new("powershell")
            .args([
                "-NoProfile",
                "-NonInteractive",
                "-Command",
                &format!(
                    "(Get-AuthenticodeSignature -FilePath \"{}\").Status",
                    artifact.display()
                ),
            ])
            .output()
            .map_err(|e| format!("failed to run Get-AuthenticodeSignature: {e}"))?;

        let status = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if status == "Valid" {
            Ok(())
        } else {
            Err(format!("signature status: {status}"))
        }
    }
}

/// Fetches installer artifacts and owns the content-addressed cache
pub struct DownloadManager {
    client: reqwest::blocking::Client,
    cache_dir: PathBuf,
    require_signatures: bool,
    authenticode: Option<Box<dyn AuthenticodeVerifier>>,
}

impl DownloadManager {
    /// Create a manager over the given cache directory
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| AppdeckError::HttpClientInit {
                reason: e.to_string(),
            })?;

        let cache_dir: PathBuf = cache_dir.into();
        Ok(Self {
            client,
            cache_dir: dunce::simplified(&cache_dir).to_path_buf(),
            require_signatures: false,
            authenticode: None,
        })
    }

    /// Treat a failing OS code-signature check as fatal instead of a warning
    pub fn with_require_signatures(mut self, require: bool) -> Self {
        self.require_signatures = require;
        self
    }

    /// Install an OS code-signature verifier
    pub fn with_authenticode(mut self, verifier: Box<dyn AuthenticodeVerifier>) -> Self {
        self.authenticode = Some(verifier);
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Cache location an application's artifact resolves to
    pub fn artifact_path(&self, metadata: &AppMetadata) -> PathBuf {
        self.cache_dir.join(&metadata.content_hash)
    }

    /// Fetch an application's installer artifact, reusing the cache when the
    /// stored bytes still match the catalog digest
    pub fn fetch(
        &self,
        metadata: &AppMetadata,
        cancel: &CancelToken,
        progress: Option<&ProgressBar>,
    ) -> Result<PathBuf> {
        cancel.check()?;

        let dest = self.artifact_path(metadata);
        if dest.exists() {
            match hash::verify_file(&dest, &metadata.content_hash, &metadata.app_id) {
                Ok(()) => {
                    info!(
                        app = %metadata.app_id,
                        path = %dest.display(),
                        "cache hit, skipping download"
                    );
                    return Ok(dest);
                }
                Err(_) => {
                    warn!(
                        app = %metadata.app_id,
                        path = %dest.display(),
                        "cached artifact is corrupted, discarding"
                    );
                    fs::remove_file(&dest)?;
                }
            }
        }

        self.check_vetted_domains(metadata)?;

        fs::create_dir_all(&self.cache_dir)?;
        let mut tmp =
            NamedTempFile::new_in(&self.cache_dir).map_err(|e| AppdeckError::CacheOperationFailed {
                message: format!("Failed to create temp file: {e}"),
            })?;

        debug!(app = %metadata.app_id, url = %metadata.download_uri, "downloading artifact");
        self.stream_to(&metadata.download_uri, tmp.as_file_mut(), cancel, progress)?;

        // Verify before the rename: a mismatch drops the temp file and
        // nothing appears at the cache path
        hash::verify_file(tmp.path(), &metadata.content_hash, &metadata.app_id)?;
        self.verify_signatures(metadata, tmp.path())?;

        tmp.persist(&dest)
            .map_err(|e| AppdeckError::CacheOperationFailed {
                message: format!("Failed to move artifact into cache: {e}"),
            })?;

        info!(app = %metadata.app_id, path = %dest.display(), "artifact downloaded and verified");
        Ok(dest)
    }

    /// Enforce the catalog entry's hostname allow-list before any network
    /// call is issued
    fn check_vetted_domains(&self, metadata: &AppMetadata) -> Result<()> {
        if metadata.vetted_domains.is_empty() {
            return Ok(());
        }

        let url = reqwest::Url::parse(&metadata.download_uri).map_err(|e| {
            AppdeckError::HttpFailed {
                url: metadata.download_uri.clone(),
                reason: e.to_string(),
            }
        })?;
        let host = url.host_str().unwrap_or_default().to_string();

        let trusted = metadata
            .vetted_domains
            .iter()
            .any(|domain| host.eq_ignore_ascii_case(domain));

        if trusted {
            Ok(())
        } else {
            Err(AppdeckError::UntrustedDomain {
                url: metadata.download_uri.clone(),
                host,
            })
        }
    }

    fn stream_to(
        &self,
        url: &str,
        file: &mut fs::File,
        cancel: &CancelToken,
        progress: Option<&ProgressBar>,
    ) -> Result<()> {
        let mut response =
            self.client
                .get(url)
                .send()
                .map_err(|e| AppdeckError::HttpFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

        if !response.status().is_success() {
            return Err(AppdeckError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        if let Some(pb) = progress {
            if let Some(total) = response.content_length() {
                pb.set_length(total);
            }
        }

        let mut downloaded: u64 = 0;
        let mut buffer = [0u8; STREAM_BUFFER_SIZE];

        loop {
            cancel.check()?;

            let bytes_read = response.read(&mut buffer).map_err(|e| AppdeckError::HttpFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

            if bytes_read == 0 {
                break;
            }

            file.write_all(&buffer[..bytes_read])?;
            downloaded += bytes_read as u64;

            if let Some(pb) = progress {
                pb.set_position(downloaded);
            }
        }

        file.flush()?;
        Ok(())
    }

    fn verify_signatures(&self, metadata: &AppMetadata, artifact: &Path) -> Result<()> {
        if let (Some(signature), Some(key)) = (&metadata.signature, &metadata.signature_key) {
            hash::verify_hmac(artifact, key, signature, &metadata.app_id)?;
            debug!(app = %metadata.app_id, "HMAC signature verified");
        }

        if let Some(verifier) = &self.authenticode {
            if let Err(reason) = verifier.verify(artifact) {
                if self.require_signatures {
                    return Err(AppdeckError::CodeSignatureRejected {
                        app_id: metadata.app_id.clone(),
                        reason,
                    });
                }
                warn!(app = %metadata.app_id, %reason, "code signature check failed");
            }
        }

        Ok(())
    }

    /// List cache entries, sorted by digest
    pub fn entries(&self) -> Result<Vec<CacheEntry>> {
        if !self.cache_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.cache_dir).map_err(|e| {
            AppdeckError::CacheOperationFailed {
                message: format!("Failed to read cache directory: {e}"),
            }
        })? {
            let entry = entry.map_err(|e| AppdeckError::CacheOperationFailed {
                message: format!("Failed to read entry: {e}"),
            })?;

            let name = entry.file_name().to_string_lossy().to_string();
            if !entry.path().is_file() || !hash::is_valid_digest(&name) {
                continue;
            }

            let metadata = entry
                .metadata()
                .map_err(|e| AppdeckError::CacheOperationFailed {
                    message: format!("Failed to get metadata: {e}"),
                })?;

            entries.push(CacheEntry {
                hash: name,
                size: metadata.len(),
                modified: metadata.modified().ok(),
            });
        }

        entries.sort_by(|a, b| a.hash.cmp(&b.hash));
        Ok(entries)
    }

    /// Aggregate cache statistics
    pub fn stats(&self) -> Result<CacheStats> {
        let entries = self.entries()?;
        Ok(CacheStats {
            entries: entries.len(),
            total_size: entries.iter().map(|e| e.size).sum(),
        })
    }

    /// Remove one cache entry by digest
    pub fn remove(&self, digest: &str) -> Result<()> {
        let path = self.cache_dir.join(digest);
        if !path.is_file() {
            return Err(AppdeckError::CacheOperationFailed {
                message: format!("Artifact not found in cache: {digest}"),
            });
        }

        fs::remove_file(&path).map_err(|e| AppdeckError::CacheOperationFailed {
            message: format!("Failed to remove cached artifact: {e}"),
        })
    }

    /// Remove every cache entry
    pub fn clear(&self) -> Result<()> {
        for entry in self.entries()? {
            self.remove(&entry.hash)?;
        }
        Ok(())
    }
}

/// One verified artifact in the cache
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// SHA-256 digest, which is also the file name
    pub hash: String,
    /// Size in bytes
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl CacheEntry {
    pub fn formatted_size(&self) -> String {
        format_size(self.size)
    }
}

/// Aggregate cache statistics
#[derive(Debug, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub total_size: u64,
}

impl CacheStats {
    pub fn formatted_size(&self) -> String {
        format_size(self.total_size)
    }
}

/// Format a byte count as a human-readable string
pub fn format_size(bytes: u64) -> String {
    let size = bytes as f64;
    if size < 1024.0 {
        format!("{bytes} B")
    } else if size < 1024.0 * 1024.0 {
        format!("{:.1} KB", size / 1024.0)
    } else if size < 1024.0 * 1024.0 * 1024.0 {
        format!("{:.1} MB", size / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", size / (1024.0 * 1024.0 * 1024.0))
    }
}
