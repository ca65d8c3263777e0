//! SHA-256 hashing and HMAC signature verification for artifact integrity
//!
//! Catalog entries carry a lowercase hex SHA-256 digest of the installer
//! artifact; the download cache is keyed by that digest. Entries may also
//! carry an HMAC-SHA256 signature (hex signature + hex key) that is checked
//! over the artifact bytes after the content hash passes.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::{AppdeckError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Hex length of a SHA-256 digest
pub const DIGEST_HEX_LEN: usize = 64;

const READ_BUFFER_SIZE: usize = 8192;

/// Check whether a string is a well-formed SHA-256 hex digest
pub fn is_valid_digest(s: &str) -> bool {
    s.len() == DIGEST_HEX_LEN && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Compute the SHA-256 digest of a byte slice as a lowercase hex string
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Compute the SHA-256 digest of a file, streaming its contents
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| AppdeckError::IoError {
        message: format!("Failed to open {}: {}", path.display(), e),
    })?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; READ_BUFFER_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(|e| AppdeckError::IoError {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Verify a file's SHA-256 digest against an expected value
///
/// Comparison is case-insensitive on the expected side; computed digests
/// are always lowercase.
pub fn verify_file(path: &Path, expected: &str, app_id: &str) -> Result<()> {
    let actual = sha256_file(path)?;
    if actual == expected.to_lowercase() {
        Ok(())
    } else {
        Err(AppdeckError::HashMismatch {
            app_id: app_id.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Verify an HMAC-SHA256 signature over a file's contents
///
/// `key_hex` and `signature_hex` come from the catalog entry. The
/// comparison is constant-time via `Mac::verify_slice`.
pub fn verify_hmac(path: &Path, key_hex: &str, signature_hex: &str, app_id: &str) -> Result<()> {
    let key = hex::decode(key_hex).map_err(|_| AppdeckError::SignatureMismatch {
        app_id: app_id.to_string(),
    })?;
    let signature = hex::decode(signature_hex).map_err(|_| AppdeckError::SignatureMismatch {
        app_id: app_id.to_string(),
    })?;

    let file = File::open(path).map_err(|e| AppdeckError::IoError {
        message: format!("Failed to open {}: {}", path.display(), e),
    })?;

    let mut mac = HmacSha256::new_from_slice(&key).map_err(|_| AppdeckError::SignatureMismatch {
        app_id: app_id.to_string(),
    })?;

    let mut reader = BufReader::new(file);
    let mut buffer = [0u8; READ_BUFFER_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(|e| AppdeckError::IoError {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;

        if bytes_read == 0 {
            break;
        }

        mac.update(&buffer[..bytes_read]);
    }

    mac.verify_slice(&signature)
        .map_err(|_| AppdeckError::SignatureMismatch {
            app_id: app_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HELLO_WORLD_SHA256: &str =
        "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_sha256_bytes_known_value() {
        assert_eq!(sha256_bytes(b"hello world"), HELLO_WORLD_SHA256);
    }

    #[test]
    fn test_sha256_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("artifact.bin");
        std::fs::write(&path, b"hello world").unwrap();

        assert_eq!(sha256_file(&path).unwrap(), HELLO_WORLD_SHA256);
    }

    #[test]
    fn test_sha256_file_not_found() {
        let result = sha256_file(Path::new("/nonexistent/artifact.bin"));
        assert!(result.is_err());
    }

    #[test]
    fn test_verify_file_match() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("artifact.bin");
        std::fs::write(&path, b"hello world").unwrap();

        assert!(verify_file(&path, HELLO_WORLD_SHA256, "app").is_ok());
        // Expected side is case-insensitive
        assert!(verify_file(&path, &HELLO_WORLD_SHA256.to_uppercase(), "app").is_ok());
    }

    #[test]
    fn test_verify_file_mismatch_carries_both_digests() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("artifact.bin");
        std::fs::write(&path, b"tampered").unwrap();

        let err = verify_file(&path, HELLO_WORLD_SHA256, "app").unwrap_err();
        match err {
            AppdeckError::HashMismatch {
                app_id,
                expected,
                actual,
            } => {
                assert_eq!(app_id, "app");
                assert_eq!(expected, HELLO_WORLD_SHA256);
                assert_eq!(actual, sha256_bytes(b"tampered"));
            }
            other => panic!("Expected HashMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_is_valid_digest() {
        assert!(is_valid_digest(HELLO_WORLD_SHA256));
        assert!(is_valid_digest(&HELLO_WORLD_SHA256.to_uppercase()));
        assert!(!is_valid_digest("abc123"));
        assert!(!is_valid_digest(&"g".repeat(64)));
        assert!(!is_valid_digest(""));
    }

    #[test]
    fn test_verify_hmac_known_vector() {
        // RFC 2202-style vector: HMAC-SHA256("key", "The quick brown fox jumps over the lazy dog")
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("artifact.bin");
        std::fs::write(&path, b"The quick brown fox jumps over the lazy dog").unwrap();

        let key_hex = hex::encode(b"key");
        let sig_hex = "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8";

        assert!(verify_hmac(&path, &key_hex, sig_hex, "app").is_ok());
    }

    #[test]
    fn test_verify_hmac_wrong_signature() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("artifact.bin");
        std::fs::write(&path, b"payload").unwrap();

        let key_hex = hex::encode(b"key");
        let sig_hex = "00".repeat(32);

        let err = verify_hmac(&path, &key_hex, &sig_hex, "app").unwrap_err();
        assert!(matches!(err, AppdeckError::SignatureMismatch { .. }));
    }

    #[test]
    fn test_verify_hmac_bad_hex_material() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("artifact.bin");
        std::fs::write(&path, b"payload").unwrap();

        let err = verify_hmac(&path, "not-hex", "also-not-hex", "app").unwrap_err();
        assert!(matches!(err, AppdeckError::SignatureMismatch { .. }));
    }
}
