//! Package identifiers and specifiers
//!
//! A package is addressed by its tooth path plus a variant label, and
//! optionally an exact version:
//!
//! - `example.com/pkg` is an identifier for the default variant
//! - `example.com/pkg#cli` selects the variant "cli"
//! - `example.com/pkg#cli@1.2.0` is a full specifier with version

use crate::{Error, Result};
use semver::Version;
use std::fmt;
use std::str::FromStr;

/// A package + variant reference without a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageIdentifier {
    pub tooth: String,
    pub variant_label: String,
}

impl PackageIdentifier {
    pub fn new(tooth: impl Into<String>, variant_label: impl Into<String>) -> Self {
        Self {
            tooth: tooth.into(),
            variant_label: variant_label.into(),
        }
    }
}

impl fmt::Display for PackageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.variant_label.is_empty() {
            write!(f, "{}", self.tooth)
        } else {
            write!(f, "{}#{}", self.tooth, self.variant_label)
        }
    }
}

impl FromStr for PackageIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || s.starts_with('#') {
            return Err(Error::InvalidSpecifier(s.to_string()));
        }

        match s.split_once('#') {
            Some((tooth, label)) => {
                if label.is_empty() || label.contains('#') || label.contains('@') {
                    return Err(Error::InvalidSpecifier(s.to_string()));
                }
                Ok(Self::new(tooth, label))
            }
            None => Ok(Self::new(s, "")),
        }
    }
}

/// A package + variant reference pinned to an exact version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpecifier {
    pub tooth: String,
    pub variant_label: String,
    pub version: Version,
}

impl PackageSpecifier {
    pub fn new(tooth: impl Into<String>, variant_label: impl Into<String>, version: Version) -> Self {
        Self {
            tooth: tooth.into(),
            variant_label: variant_label.into(),
            version,
        }
    }

    /// The identifier part, without the version.
    pub fn identifier(&self) -> PackageIdentifier {
        PackageIdentifier::new(self.tooth.clone(), self.variant_label.clone())
    }
}

impl fmt::Display for PackageSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.identifier(), self.version)
    }
}

impl FromStr for PackageSpecifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (ident_text, version_text) = s
            .rsplit_once('@')
            .ok_or_else(|| Error::InvalidSpecifier(s.to_string()))?;

        let identifier: PackageIdentifier = ident_text.parse()?;
        let version = Version::parse(version_text)
            .map_err(|_| Error::InvalidSpecifier(s.to_string()))?;

        Ok(Self {
            tooth: identifier.tooth,
            variant_label: identifier.variant_label,
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_parse_default_variant() {
        let ident: PackageIdentifier = "example.com/pkg".parse().unwrap();
        assert_eq!(ident.tooth, "example.com/pkg");
        assert_eq!(ident.variant_label, "");
        assert_eq!(ident.to_string(), "example.com/pkg");
    }

    #[test]
    fn test_identifier_parse_labeled_variant() {
        let ident: PackageIdentifier = "example.com/pkg#cli".parse().unwrap();
        assert_eq!(ident.tooth, "example.com/pkg");
        assert_eq!(ident.variant_label, "cli");
        assert_eq!(ident.to_string(), "example.com/pkg#cli");
    }

    #[test]
    fn test_identifier_parse_invalid() {
        assert!("".parse::<PackageIdentifier>().is_err());
        assert!("#cli".parse::<PackageIdentifier>().is_err());
        assert!("pkg#".parse::<PackageIdentifier>().is_err());
        assert!("pkg#a#b".parse::<PackageIdentifier>().is_err());
    }

    #[test]
    fn test_specifier_roundtrip() {
        let spec: PackageSpecifier = "example.com/pkg#cli@1.2.3".parse().unwrap();
        assert_eq!(spec.tooth, "example.com/pkg");
        assert_eq!(spec.variant_label, "cli");
        assert_eq!(spec.version, Version::new(1, 2, 3));
        assert_eq!(spec.to_string(), "example.com/pkg#cli@1.2.3");
    }

    #[test]
    fn test_specifier_requires_version() {
        assert!("example.com/pkg".parse::<PackageSpecifier>().is_err());
        assert!("example.com/pkg@not-a-version".parse::<PackageSpecifier>().is_err());
    }
}
