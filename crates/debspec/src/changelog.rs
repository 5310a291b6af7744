//! Installed package versions read from Debian changelogs

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::specifier::Result;
use crate::SpecifierSet;

const UNKNOWN: &str = "?";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChangelogError {
    #[error("Invalid changelog header: '{0}'")]
    InvalidHeader(String),
    #[error("Changelog is empty")]
    Empty,
}

lazy_static! {
    // e.g. "yunohost (3.5.0.2+201903211853) testing; urgency=medium"
    static ref HEADER_RE: Regex = Regex::new(
        r"^\s*(?P<package>[^\s(]+)\s+\(\s*(?P<version>[^)\s]+)\s*\)\s+(?P<distribution>[^;\s]+)"
    )
    .unwrap();
}

/// Version of an installed package and the distribution it was built for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageVersion {
    pub package: String,
    pub version: String,
    pub distribution: String,
}

impl PackageVersion {
    /// A package whose version could not be determined
    pub fn unknown(package: &str) -> Self {
        PackageVersion {
            package: package.to_string(),
            version: UNKNOWN.to_string(),
            distribution: UNKNOWN.to_string(),
        }
    }

    /// Parse the header line of a changelog entry
    pub fn from_changelog_header(line: &str) -> std::result::Result<Self, ChangelogError> {
        let caps = HEADER_RE
            .captures(line)
            .ok_or_else(|| ChangelogError::InvalidHeader(line.trim().to_string()))?;

        Ok(PackageVersion {
            package: caps["package"].to_string(),
            version: caps["version"].to_string(),
            distribution: caps["distribution"].to_string(),
        })
    }

    /// Parse the most recent entry of a changelog
    pub fn from_changelog(content: &str) -> std::result::Result<Self, ChangelogError> {
        let header = content
            .lines()
            .find(|line| !line.trim().is_empty())
            .ok_or(ChangelogError::Empty)?;
        Self::from_changelog_header(header)
    }

    pub fn is_known(&self) -> bool {
        self.version != UNKNOWN
    }

    /// Check whether the installed version meets `specifiers`.
    ///
    /// An unknown version only meets the empty set.
    pub fn satisfies(&self, specifiers: &SpecifierSet) -> bool {
        if !self.is_known() {
            return specifiers.is_empty();
        }
        specifiers.contains(&self.version)
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) {}", self.package, self.version, self.distribution)
    }
}

/// Check if an installed package meets a textual specifier
pub fn meets_version_specifier(installed: &PackageVersion, specifiers: &str) -> Result<bool> {
    let specifiers = SpecifierSet::parse(specifiers)?;
    Ok(installed.satisfies(&specifiers))
}
