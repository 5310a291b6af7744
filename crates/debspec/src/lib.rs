//! Debian package version specifiers
//!
//! This crate parses version constraints such as `>= 2.2, << 2.3`, checks
//! versions against them and combines several constraints into an
//! equivalent, reduced set. Versions are ordered following the Debian
//! Policy Manual.

mod changelog;
mod comparator;
mod relation;
mod specifier;
mod specifier_set;

pub use changelog::{meets_version_specifier, ChangelogError, PackageVersion};
pub use comparator::{version_compare, DebianComparator, VersionComparator};
pub use relation::{Direction, InvalidRelationError, Relation};
pub use specifier::{Result, Specifier, SpecifierError};
pub use specifier_set::{Reduction, SpecifierItem, SpecifierSet};
