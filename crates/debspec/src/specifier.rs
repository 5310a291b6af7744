//! Single version specifier implementation

use std::fmt;
use std::ops::{BitAnd, BitOr};
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::comparator::{DebianComparator, VersionComparator};
use crate::relation::{Direction, Relation};
use crate::specifier_set::SpecifierSet;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecifierError {
    #[error("Invalid specifier: '{0}'")]
    InvalidSpecifier(String),
}

pub type Result<T> = std::result::Result<T, SpecifierError>;

lazy_static! {
    static ref SPECIFIER_RE: Regex = Regex::new(
        r"(?ix)
        ^\s*
        (?P<relation><<|<=|=|>=|>>)
        \s*
        (?P<version>[^,;\s)]+)
        \s*$
        "
    )
    .unwrap();
}

/// A single package version specifier, e.g. `>= 2.2`.
///
/// The version is kept verbatim: `=2.2` and `=2.2.0` are different
/// specifiers even though they accept the same versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Specifier {
    // Field order matters: the derived Ord sorts like the display form.
    relation: Relation,
    version: String,
}

impl Specifier {
    /// Create a new specifier
    pub fn new(relation: Relation, version: impl Into<String>) -> Self {
        Specifier {
            relation,
            version: version.into(),
        }
    }

    /// Parse a specifier such as `>= 2.2` or `<<3.0-1`
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = || SpecifierError::InvalidSpecifier(spec.to_string());
        let caps = SPECIFIER_RE.captures(spec).ok_or_else(invalid)?;

        let relation: Relation = caps["relation"].parse().map_err(|_| invalid())?;
        let version = caps["version"].trim();

        Ok(Specifier::new(relation, version))
    }

    /// Get the relation
    pub fn relation(&self) -> Relation {
        self.relation
    }

    /// Get the version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Check whether `version` satisfies this specifier
    pub fn contains(&self, version: &str) -> bool {
        self.contains_with(version, &DebianComparator)
    }

    pub fn contains_with(&self, version: &str, comparator: &dyn VersionComparator) -> bool {
        self.relation.matches(comparator.compare(version, &self.version))
    }

    /// Make the intersection of two specifiers.
    ///
    /// Returns the specifier(s) both constraints reduce to. An empty set means
    /// no version satisfies both.
    ///
    /// ```
    /// use debspec::Specifier;
    ///
    /// let lower = Specifier::parse(">= 2.2").unwrap();
    /// assert_eq!(lower.intersect(&Specifier::parse(">> 2.2.1").unwrap()), ">>2.2.1");
    /// assert_eq!(lower.intersect(&Specifier::parse("<< 2.3").unwrap()), ">=2.2,<<2.3");
    /// ```
    pub fn intersect(&self, other: &Specifier) -> SpecifierSet {
        self.intersect_with(other, &DebianComparator)
    }

    pub fn intersect_with(&self, other: &Specifier, comparator: &dyn VersionComparator) -> SpecifierSet {
        let (rel1, v1) = (self.relation, self.version.as_str());
        let (rel2, v2) = (other.relation, other.version.as_str());

        if self == other {
            return SpecifierSet::from(self.clone());
        }

        if rel1 == Relation::Equal {
            return if other.contains_with(v1, comparator) {
                SpecifierSet::from(self.clone())
            } else {
                SpecifierSet::new()
            };
        }

        if rel2 == Relation::Equal {
            return if self.contains_with(v2, comparator) {
                SpecifierSet::from(other.clone())
            } else {
                SpecifierSet::new()
            };
        }

        // Same threshold: the strict bound wins over the inclusive one
        if v1 == v2 {
            return if rel1.is_inclusive() {
                SpecifierSet::from(other.clone())
            } else {
                SpecifierSet::from(self.clone())
            };
        }

        if other.contains_with(v1, comparator) || self.contains_with(v2, comparator) {
            let is_self_greater = comparator.greater_than(v1, v2);

            let kept = match (rel1.direction(), rel2.direction()) {
                // Keep the higher lower bound
                (Direction::Greater, Direction::Greater) if is_self_greater => self,
                (Direction::Greater, Direction::Greater) => other,
                // Keep the lower upper bound
                (Direction::Lower, Direction::Lower) if is_self_greater => other,
                (Direction::Lower, Direction::Lower) => self,
                _ => return self.union(other),
            };
            return SpecifierSet::from(kept.clone());
        }

        SpecifierSet::new()
    }

    /// Make the union of two specifiers, without any reduction
    pub fn union(&self, other: &Specifier) -> SpecifierSet {
        [self.clone(), other.clone()].into_iter().collect()
    }
}

impl FromStr for Specifier {
    type Err = SpecifierError;

    fn from_str(s: &str) -> Result<Self> {
        Specifier::parse(s)
    }
}

impl TryFrom<&str> for Specifier {
    type Error = SpecifierError;

    fn try_from(s: &str) -> Result<Self> {
        Specifier::parse(s)
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.relation, self.version)
    }
}

impl PartialEq<str> for Specifier {
    fn eq(&self, other: &str) -> bool {
        Specifier::parse(other).is_ok_and(|other| *self == other)
    }
}

impl PartialEq<&str> for Specifier {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl BitAnd for &Specifier {
    type Output = SpecifierSet;

    fn bitand(self, other: &Specifier) -> SpecifierSet {
        self.intersect(other)
    }
}

impl BitOr for &Specifier {
    type Output = SpecifierSet;

    fn bitor(self, other: &Specifier) -> SpecifierSet {
        self.union(other)
    }
}
