//! Current-platform identification
//!
//! Variants in a tooth manifest can be scoped to a target platform. The
//! platform string has the form `{os}-{arch}`, e.g. "linux-x86_64" or
//! "windows-x86_64". An empty platform field in a variant matches every
//! platform.
//!
//! # Examples
//!
//! ```
//! let platform = toothpm::platform::identifier();
//! assert!(platform.contains('-'));
//! ```

use std::env;

/// Identifier of the platform this process is running on.
pub fn identifier() -> String {
    format!("{}-{}", env::consts::OS, env::consts::ARCH)
}

/// Whether a variant's platform field applies to the given platform.
///
/// Empty means universal.
pub fn matches(variant_platform: &str, platform: &str) -> bool {
    variant_platform.is_empty() || variant_platform == platform
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_shape() {
        let id = identifier();
        let parts: Vec<&str> = id.splitn(2, '-').collect();
        assert_eq!(parts.len(), 2);
        assert!(!parts[0].is_empty());
        assert!(!parts[1].is_empty());
    }

    #[test]
    fn test_empty_platform_is_universal() {
        assert!(matches("", "linux-x86_64"));
        assert!(matches("", "windows-x86_64"));
    }

    #[test]
    fn test_exact_platform_match() {
        assert!(matches("linux-x86_64", "linux-x86_64"));
        assert!(!matches("linux-x86_64", "macos-aarch64"));
    }
}
