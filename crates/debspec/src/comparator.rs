//! Version comparison utilities

use std::cmp::Ordering;

use debversion::Version;

/// A total order over version strings.
///
/// Specifiers never look inside a version themselves; every containment or
/// intersection decision goes through a comparator. Implementations must be
/// pure: the algebra assumes calling `compare` twice gives the same answer.
pub trait VersionComparator: Send + Sync {
    /// Compare version `a` to version `b`
    fn compare(&self, a: &str, b: &str) -> Ordering;

    /// Check if a > b
    fn greater_than(&self, a: &str, b: &str) -> bool {
        self.compare(a, b) == Ordering::Greater
    }
}

/// Comparator following the Debian Policy ordering of version numbers,
/// `[epoch:]upstream_version[-debian_revision]`, as implemented by `debversion`.
///
/// Strings that are not valid Debian versions (`1.0_1`, `2.0!`) sort before
/// every valid version and compare bytewise among themselves, which keeps the
/// order total.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebianComparator;

impl VersionComparator for DebianComparator {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        match (a.parse::<Version>(), b.parse::<Version>()) {
            (Ok(a), Ok(b)) => a.cmp(&b),
            (Ok(_), Err(_)) => Ordering::Greater,
            (Err(_), Ok(_)) => Ordering::Less,
            (Err(_), Err(_)) => a.cmp(b),
        }
    }
}

/// Compare two versions with the Debian ordering
pub fn version_compare(a: &str, b: &str) -> Ordering {
    DebianComparator.compare(a, b)
}
