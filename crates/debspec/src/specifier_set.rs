//! SpecifierSet - a set of version specifiers that must all be met

use std::collections::btree_set;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::{BitAnd, BitOr};
use std::str::FromStr;

use crate::comparator::{DebianComparator, VersionComparator};
use crate::specifier::{Result, Specifier};

/// A set of package version specifiers.
///
/// Every specifier of the set must be met. An empty set is always met.
/// Members are kept in the order of their textual form, which only matters
/// for display: two sets are equal when they hold the same specifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SpecifierSet {
    specifiers: BTreeSet<Specifier>,
}

/// One element accepted when building a set from a list
#[derive(Debug, Clone)]
pub enum SpecifierItem {
    Parsed(Specifier),
    Text(String),
}

impl From<Specifier> for SpecifierItem {
    fn from(specifier: Specifier) -> Self {
        SpecifierItem::Parsed(specifier)
    }
}

impl From<&Specifier> for SpecifierItem {
    fn from(specifier: &Specifier) -> Self {
        SpecifierItem::Parsed(specifier.clone())
    }
}

impl From<&str> for SpecifierItem {
    fn from(text: &str) -> Self {
        SpecifierItem::Text(text.to_string())
    }
}

impl From<String> for SpecifierItem {
    fn from(text: String) -> Self {
        SpecifierItem::Text(text)
    }
}

impl SpecifierItem {
    fn into_specifier(self) -> Result<Specifier> {
        match self {
            SpecifierItem::Parsed(specifier) => Ok(specifier),
            SpecifierItem::Text(text) => Specifier::parse(&text),
        }
    }
}

/// Outcome of a conjunctive reduction.
///
/// [`SpecifierSet::intersection`] flattens this into a plain set, where both
/// `Unconstrained` and `Infeasible` become the empty set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reduction {
    /// Neither operand had any specifier
    Unconstrained,
    /// The reduced specifiers
    Constrained(SpecifierSet),
    /// Two specifiers contradict each other; no version can match
    Infeasible,
}

impl Reduction {
    pub fn is_infeasible(&self) -> bool {
        matches!(self, Reduction::Infeasible)
    }

    pub fn into_set(self) -> SpecifierSet {
        match self {
            Reduction::Constrained(set) => set,
            Reduction::Unconstrained | Reduction::Infeasible => SpecifierSet::new(),
        }
    }
}

impl SpecifierSet {
    /// Create an empty (unconstrained) set
    pub fn new() -> Self {
        SpecifierSet::default()
    }

    /// Parse comma separated specifiers, e.g. `>= 2.2, << 2.3`.
    ///
    /// Empty items are ignored, so `""` gives the empty set.
    pub fn parse(specifiers: &str) -> Result<Self> {
        specifiers
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Specifier::parse)
            .collect()
    }

    /// Build a set from a list of specifiers and/or specifier strings
    pub fn from_items<I, T>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<SpecifierItem>,
    {
        items
            .into_iter()
            .map(|item| item.into().into_specifier())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.specifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specifiers.is_empty()
    }

    /// Iterate over the specifiers in canonical order
    pub fn iter(&self) -> btree_set::Iter<'_, Specifier> {
        self.specifiers.iter()
    }

    /// Check whether `version` meets every specifier of the set
    pub fn contains(&self, version: &str) -> bool {
        self.contains_with(version, &DebianComparator)
    }

    pub fn contains_with(&self, version: &str, comparator: &dyn VersionComparator) -> bool {
        self.specifiers
            .iter()
            .all(|s| s.contains_with(version, comparator))
    }

    /// Make the intersection of two sets.
    ///
    /// The result is empty both when neither set constrains anything and
    /// when the constraints contradict each other; use [`SpecifierSet::reduce`]
    /// to tell these apart.
    ///
    /// ```
    /// use debspec::SpecifierSet;
    ///
    /// let set = SpecifierSet::parse(">= 2.2, << 2.4").unwrap();
    /// let other = SpecifierSet::parse("<< 2.3").unwrap();
    /// assert_eq!(set.intersection(&other), ">= 2.2, << 2.3");
    /// ```
    pub fn intersection(&self, other: &SpecifierSet) -> SpecifierSet {
        self.reduce(other).into_set()
    }

    pub fn intersection_with(&self, other: &SpecifierSet, comparator: &dyn VersionComparator) -> SpecifierSet {
        self.reduce_with(other, comparator).into_set()
    }

    /// Intersect two sets, keeping track of why the result may be empty
    pub fn reduce(&self, other: &SpecifierSet) -> Reduction {
        self.reduce_with(other, &DebianComparator)
    }

    pub fn reduce_with(&self, other: &SpecifierSet, comparator: &dyn VersionComparator) -> Reduction {
        // The union iterates in canonical order, which keeps the seed and
        // the merge order reproducible.
        let mut pool = self.specifiers.union(&other.specifiers);

        let Some(seed) = pool.next() else {
            return Reduction::Unconstrained;
        };
        let mut current = BTreeSet::from([seed.clone()]);

        for specifier in pool {
            let mut merged = BTreeSet::new();
            for member in &current {
                let inter = member.intersect_with(specifier, comparator);
                log::trace!("{} & {} -> [{}]", member, specifier, inter);

                // A single contradiction makes the whole set infeasible
                if inter.is_empty() {
                    log::debug!("'{}' and '{}' cannot both be met", member, specifier);
                    return Reduction::Infeasible;
                }
                merged.extend(inter.specifiers);
            }
            current = merged;
        }

        Reduction::Constrained(SpecifierSet { specifiers: current })
    }

    /// Make the union of two sets.
    ///
    /// No reduction happens: `>= 2.2` and `>= 2.3` are both kept.
    pub fn union(&self, other: &SpecifierSet) -> SpecifierSet {
        SpecifierSet {
            specifiers: &self.specifiers | &other.specifiers,
        }
    }
}

impl FromStr for SpecifierSet {
    type Err = crate::SpecifierError;

    fn from_str(s: &str) -> Result<Self> {
        SpecifierSet::parse(s)
    }
}

impl From<Specifier> for SpecifierSet {
    fn from(specifier: Specifier) -> Self {
        SpecifierSet {
            specifiers: BTreeSet::from([specifier]),
        }
    }
}

impl FromIterator<Specifier> for SpecifierSet {
    fn from_iter<I: IntoIterator<Item = Specifier>>(iter: I) -> Self {
        SpecifierSet {
            specifiers: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for SpecifierSet {
    type Item = Specifier;
    type IntoIter = btree_set::IntoIter<Specifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.specifiers.into_iter()
    }
}

impl<'a> IntoIterator for &'a SpecifierSet {
    type Item = &'a Specifier;
    type IntoIter = btree_set::Iter<'a, Specifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.specifiers.iter()
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.specifiers.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl PartialEq<str> for SpecifierSet {
    fn eq(&self, other: &str) -> bool {
        SpecifierSet::parse(other).is_ok_and(|other| *self == other)
    }
}

impl PartialEq<&str> for SpecifierSet {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl BitAnd for &SpecifierSet {
    type Output = SpecifierSet;

    fn bitand(self, other: &SpecifierSet) -> SpecifierSet {
        self.intersection(other)
    }
}

impl BitOr for &SpecifierSet {
    type Output = SpecifierSet;

    fn bitor(self, other: &SpecifierSet) -> SpecifierSet {
        self.union(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Relation, SpecifierError};

    fn set(s: &str) -> SpecifierSet {
        SpecifierSet::parse(s).unwrap()
    }

    #[test]
    fn test_parse() {
        let s = set(">= 2.2, << 2.3");
        assert_eq!(s.len(), 2);
        assert_eq!(s.to_string(), "<<2.3,>=2.2");
    }

    #[test]
    fn test_parse_skips_empty_items() {
        assert!(set("").is_empty());
        assert!(set(" , ,").is_empty());
        assert_eq!(set(">= 2.2,, ").len(), 1);
    }

    #[test]
    fn test_parse_deduplicates() {
        let s = set(">= 2.2, >=2.2,>=  2.2");
        assert_eq!(s.len(), 1);
        assert_eq!(s.to_string(), ">=2.2");
    }

    #[test]
    fn test_parse_invalid() {
        let err = SpecifierSet::parse(">= 2.2, ~~1.0").unwrap_err();
        assert_eq!(err, SpecifierError::InvalidSpecifier("~~1.0".to_string()));
    }

    #[test]
    fn test_from_items() {
        let items: Vec<SpecifierItem> = vec![
            Specifier::new(Relation::GreaterOrEqual, "2.2").into(),
            "<< 2.3".into(),
        ];
        assert_eq!(SpecifierSet::from_items(items).unwrap(), ">=2.2,<<2.3");

        assert!(SpecifierSet::from_items(["bogus"]).is_err());
        assert!(SpecifierSet::from_items(Vec::<&str>::new()).unwrap().is_empty());
    }

    #[test]
    fn test_display_is_sorted() {
        assert_eq!(set(">>1, =3, <=2, <<4, >=0").to_string(), "<<4,<=2,=3,>=0,>>1");
    }

    #[test]
    fn test_equality_ignores_order() {
        assert_eq!(set(">=2.2,<<2.3"), set("<<2.3, >=2.2"));
        assert_eq!(set(">=2.2,<<2.3"), "<< 2.3, >= 2.2");
        assert_ne!(set(">=2.2"), "garbage");
    }

    #[test]
    fn test_contains() {
        let s = set(">= 2.2, << 2.3");
        assert!(s.contains("2.2"));
        assert!(s.contains("2.2.5"));
        assert!(!s.contains("2.3"));
        assert!(!s.contains("2.4"));
        assert!(!s.contains("1.9"));
    }

    #[test]
    fn test_empty_contains_everything() {
        let s = SpecifierSet::new();
        assert!(s.contains("0"));
        assert!(s.contains("1:99.9-1"));
        assert!(s.contains("not even a version"));
    }

    #[test]
    fn test_intersection() {
        assert_eq!(set(">= 2.2").intersection(&set(">> 2.2.1")), ">>2.2.1");
        assert_eq!(set(">= 2.2, << 2.4").intersection(&set("<< 2.3")), ">=2.2,<<2.3");
        assert!(set(">= 2.2, << 2.3").intersection(&set(">= 2.4")).is_empty());
    }

    #[test]
    fn test_intersection_of_empty_sets() {
        assert!(SpecifierSet::new().intersection(&SpecifierSet::new()).is_empty());
        assert_eq!(SpecifierSet::new().intersection(&set(">=1")), ">=1");
    }

    #[test]
    fn test_reduce_distinguishes_empty_results() {
        assert_eq!(SpecifierSet::new().reduce(&SpecifierSet::new()), Reduction::Unconstrained);
        assert!(set(">= 2.2, << 2.3").reduce(&set(">= 2.4")).is_infeasible());
        assert_eq!(
            set(">= 2.2").reduce(&set("<< 2.3")),
            Reduction::Constrained(set(">=2.2,<<2.3"))
        );
    }

    #[test]
    fn test_union_keeps_everything() {
        let u = set(">= 2.2").union(&set(">= 2.3, >= 2.2"));
        assert_eq!(u, ">=2.2,>=2.3");
        assert_eq!(&set("<<1") | &set(">>2"), "<<1,>>2");
    }

    #[test]
    fn test_union_still_requires_all() {
        // A union is still met only when every member is met
        let u = set("<< 1.0").union(&set(">> 2.0"));
        assert!(!u.contains("0.5"));
        assert!(!u.contains("3.0"));
    }

    #[test]
    fn test_operators() {
        assert_eq!(&set(">=2.2,<<2.4") & &set("<<2.3"), ">=2.2,<<2.3");
    }

    #[test]
    fn test_iteration_order() {
        let s = set(">= 2.2, << 2.3");
        let items: Vec<String> = s.iter().map(|s| s.to_string()).collect();
        assert_eq!(items, vec!["<<2.3", ">=2.2"]);

        let owned: Vec<Specifier> = s.into_iter().collect();
        assert_eq!(owned.len(), 2);
    }
}
