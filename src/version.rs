//! Lenient semantic-version comparison for "already satisfied" checks
//!
//! Catalog versions are semver-comparable strings but not always strict
//! semver ("7.2", "v1.4"). Parsing strips a leading `v` and pads missing
//! components; only when both sides still fail to parse does the ordering
//! fall back to a plain string comparison.

use std::cmp::Ordering;

use semver::Version;

/// Parse a version string leniently into a semver `Version`
pub fn parse_lenient(s: &str) -> Option<Version> {
    let s = s.trim().trim_start_matches(['v', 'V']);
    if s.is_empty() {
        return None;
    }

    if let Ok(v) = Version::parse(s) {
        return Some(v);
    }

    // Pad "1" or "1.2" out to three components before retrying
    let dots = s.chars().filter(|&c| c == '.').count();
    let padded = match dots {
        0 => format!("{s}.0.0"),
        1 => format!("{s}.0"),
        _ => return None,
    };
    Version::parse(&padded).ok()
}

/// Compare two version strings per semantic-version ordering
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse_lenient(a), parse_lenient(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb),
        _ => a.cmp(b),
    }
}

/// Whether an installed version satisfies a catalog version
/// (`installed >= required`)
pub fn satisfies(installed: &str, required: &str) -> bool {
    compare(installed, required) != Ordering::Less
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lenient_pads_components() {
        assert_eq!(parse_lenient("7").unwrap(), Version::new(7, 0, 0));
        assert_eq!(parse_lenient("7.2").unwrap(), Version::new(7, 2, 0));
        assert_eq!(parse_lenient("7.2.1").unwrap(), Version::new(7, 2, 1));
    }

    #[test]
    fn test_parse_lenient_strips_v_prefix() {
        assert_eq!(parse_lenient("v1.4").unwrap(), Version::new(1, 4, 0));
        assert_eq!(parse_lenient("V2.0.3").unwrap(), Version::new(2, 0, 3));
    }

    #[test]
    fn test_parse_lenient_rejects_garbage() {
        assert!(parse_lenient("").is_none());
        assert!(parse_lenient("not-a-version").is_none());
    }

    #[test]
    fn test_compare_is_numeric_not_lexical() {
        // Lexically "1.10.0" < "1.9.0"; semantically it is greater
        assert_eq!(compare("1.10.0", "1.9.0"), Ordering::Greater);
        assert_eq!(compare("2.0", "2.0.0"), Ordering::Equal);
        assert_eq!(compare("v3.1", "3.0.9"), Ordering::Greater);
    }

    #[test]
    fn test_compare_falls_back_to_lexical() {
        assert_eq!(compare("build-42", "build-41"), Ordering::Greater);
        assert_eq!(compare("build-42", "build-42"), Ordering::Equal);
    }

    #[test]
    fn test_satisfies() {
        assert!(satisfies("1.2.3", "1.2.3"));
        assert!(satisfies("1.3.0", "1.2.9"));
        assert!(satisfies("2.0", "1.99.99"));
        assert!(!satisfies("1.2.2", "1.2.3"));
        assert!(!satisfies("1.9.0", "1.10.0"));
    }
}
