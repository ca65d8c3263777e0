//! Error types and handling for Appdeck
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! The variants follow the operational taxonomy of the installer:
//! catalog errors are fatal and surfaced immediately; cycle and
//! missing-dependency conditions are normally carried as plan data and only
//! become errors when an install is actually attempted; download errors are
//! eligible for caller-directed retry; verification errors are always fatal
//! for the artifact in question; installer errors halt the remaining plan.

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for Appdeck operations
#[derive(Error, Diagnostic, Debug)]
pub enum AppdeckError {
    // Catalog errors
    #[error("Failed to read catalog: {path}")]
    #[diagnostic(code(appdeck::catalog::read_failed))]
    CatalogReadFailed { path: String, reason: String },

    #[error("Failed to parse catalog: {path}")]
    #[diagnostic(
        code(appdeck::catalog::parse_failed),
        help("The catalog must be a JSON object with an 'applications' array")
    )]
    CatalogParseFailed { path: String, reason: String },

    #[error("Duplicate application id in catalog: {app_id}")]
    #[diagnostic(
        code(appdeck::catalog::duplicate_app_id),
        help("Every application entry must have a unique 'app_id'")
    )]
    DuplicateAppId { app_id: String },

    #[error("Invalid content hash for '{app_id}': {hash}")]
    #[diagnostic(
        code(appdeck::catalog::invalid_content_hash),
        help("The 'sha256' field must be a 64-character hex digest")
    )]
    InvalidContentHash { app_id: String, hash: String },

    #[error("Application '{app_id}' not found in catalog")]
    #[diagnostic(
        code(appdeck::catalog::app_not_found),
        help("Run 'appdeck status' to see installed applications")
    )]
    AppNotFound { app_id: String },

    // Dependency errors
    #[error("Dependency cycle detected: {chain}")]
    #[diagnostic(
        code(appdeck::deps::cycle),
        help("Break the cycle in the catalog's dependency declarations")
    )]
    CyclicDependency { chain: String },

    #[error("Cannot install '{app_id}': {reason}")]
    #[diagnostic(
        code(appdeck::deps::blocked),
        help("A dependency is missing from the catalog; add it or prune the reference")
    )]
    DependencyBlocked { app_id: String, reason: String },

    #[error("'{app_id}' is still required by: {dependents}")]
    #[diagnostic(
        code(appdeck::deps::has_dependents),
        help("Uninstall the dependents first, or pass --force")
    )]
    HasDependents { app_id: String, dependents: String },

    // Download errors
    #[error("Failed to create HTTP client: {reason}")]
    #[diagnostic(code(appdeck::download::client_init))]
    HttpClientInit { reason: String },

    #[error("Download failed: {url}")]
    #[diagnostic(
        code(appdeck::download::http_failed),
        help("Check network connectivity and retry")
    )]
    HttpFailed { url: String, reason: String },

    #[error("Download failed: HTTP {status} from {url}")]
    #[diagnostic(code(appdeck::download::http_status))]
    HttpStatus { url: String, status: u16 },

    #[error("Refusing to download from untrusted host '{host}': {url}")]
    #[diagnostic(
        code(appdeck::download::untrusted_domain),
        help("The URI host must match one of the catalog entry's vetted_domains")
    )]
    UntrustedDomain { url: String, host: String },

    // Verification errors
    #[error("Content hash mismatch for '{app_id}'")]
    #[diagnostic(
        code(appdeck::verify::hash_mismatch),
        help("The artifact was corrupted or tampered with; the cached copy has been discarded")
    )]
    HashMismatch {
        app_id: String,
        expected: String,
        actual: String,
    },

    #[error("Signature verification failed for '{app_id}'")]
    #[diagnostic(
        code(appdeck::verify::signature_mismatch),
        help("The artifact does not match the catalog's HMAC signature")
    )]
    SignatureMismatch { app_id: String },

    #[error("Code signature rejected for '{app_id}': {reason}")]
    #[diagnostic(code(appdeck::verify::code_signature_rejected))]
    CodeSignatureRejected { app_id: String, reason: String },

    // Installer errors
    #[error("Installer for '{app_id}' exited with code {code}")]
    #[diagnostic(code(appdeck::install::installer_failed))]
    InstallerFailed {
        app_id: String,
        code: i32,
        output_tail: String,
    },

    #[error("Installer for '{app_id}' timed out after {secs} seconds")]
    #[diagnostic(
        code(appdeck::install::timed_out),
        help("Raise the limit with --timeout if the installer legitimately needs longer")
    )]
    InstallerTimedOut { app_id: String, secs: u64 },

    #[error("Failed to launch installer for '{app_id}': {reason}")]
    #[diagnostic(code(appdeck::install::spawn_failed))]
    InstallerSpawnFailed { app_id: String, reason: String },

    #[error("Uninstall of '{app_id}' failed: {reason}")]
    #[diagnostic(code(appdeck::install::uninstall_failed))]
    UninstallFailed { app_id: String, reason: String },

    #[error("'{app_id}' is not installed")]
    #[diagnostic(code(appdeck::install::not_installed))]
    NotInstalled { app_id: String },

    #[error("'{app_id}' is still installed; uninstall it before purging its record")]
    #[diagnostic(code(appdeck::state::still_installed))]
    StillInstalled { app_id: String },

    // State store errors
    #[error("Failed to read state file: {path}")]
    #[diagnostic(code(appdeck::state::read_failed))]
    StateReadFailed { path: String, reason: String },

    #[error("Failed to parse state file: {path}")]
    #[diagnostic(
        code(appdeck::state::parse_failed),
        help("The state file is corrupt; restore it from a backup or delete it to start fresh")
    )]
    StateParseFailed { path: String, reason: String },

    #[error("Failed to write state file: {path}")]
    #[diagnostic(code(appdeck::state::write_failed))]
    StateWriteFailed { path: String, reason: String },

    // Cache errors
    #[error("Cache operation failed: {message}")]
    #[diagnostic(code(appdeck::cache::operation_failed))]
    CacheOperationFailed { message: String },

    // Misc
    #[error("IO error: {message}")]
    #[diagnostic(code(appdeck::fs::io_error))]
    IoError { message: String },

    #[error("Operation cancelled")]
    #[diagnostic(code(appdeck::cancelled))]
    Cancelled,
}

impl From<std::io::Error> for AppdeckError {
    fn from(err: std::io::Error) -> Self {
        AppdeckError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<inquire::InquireError> for AppdeckError {
    fn from(err: inquire::InquireError) -> Self {
        AppdeckError::IoError {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, AppdeckError>;
