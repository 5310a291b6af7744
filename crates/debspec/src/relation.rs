//! Relation types for version specifiers

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Relations between versions, as defined by the Debian Policy Manual.
///
/// The variant order matches the lexicographic order of the symbols, so
/// deriving `Ord` sorts specifiers the same way as their textual form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    /// Strictly lower (<<)
    LowerThan,
    /// Lower or equal (<=)
    LowerOrEqual,
    /// Exactly equal (=)
    Equal,
    /// Greater or equal (>=)
    GreaterOrEqual,
    /// Strictly greater (>>)
    GreaterThan,
}

/// Which side of the threshold a relation accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Lower,
    Equal,
    Greater,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid relation: {0}")]
pub struct InvalidRelationError(pub String);

impl Relation {
    /// Get the string representation of the relation
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::LowerThan => "<<",
            Relation::LowerOrEqual => "<=",
            Relation::Equal => "=",
            Relation::GreaterOrEqual => ">=",
            Relation::GreaterThan => ">>",
        }
    }

    /// Get all supported relations
    pub fn supported_relations() -> &'static [&'static str] {
        &["<<", "<=", "=", ">=", ">>"]
    }

    pub fn direction(&self) -> Direction {
        match self {
            Relation::LowerThan | Relation::LowerOrEqual => Direction::Lower,
            Relation::Equal => Direction::Equal,
            Relation::GreaterOrEqual | Relation::GreaterThan => Direction::Greater,
        }
    }

    /// `<<` and `>>` exclude their threshold
    pub fn is_strict(&self) -> bool {
        matches!(self, Relation::LowerThan | Relation::GreaterThan)
    }

    pub fn is_inclusive(&self) -> bool {
        !self.is_strict()
    }

    /// Interpret the result of comparing a candidate version to the threshold
    pub fn matches(&self, ordering: Ordering) -> bool {
        match self {
            Relation::LowerThan => ordering == Ordering::Less,
            Relation::LowerOrEqual => ordering != Ordering::Greater,
            Relation::Equal => ordering == Ordering::Equal,
            Relation::GreaterOrEqual => ordering != Ordering::Less,
            Relation::GreaterThan => ordering == Ordering::Greater,
        }
    }
}

impl FromStr for Relation {
    type Err = InvalidRelationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<<" => Ok(Relation::LowerThan),
            "<=" => Ok(Relation::LowerOrEqual),
            "=" => Ok(Relation::Equal),
            ">=" => Ok(Relation::GreaterOrEqual),
            ">>" => Ok(Relation::GreaterThan),
            _ => Err(InvalidRelationError(s.to_string())),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        for symbol in Relation::supported_relations() {
            let relation: Relation = symbol.parse().unwrap();
            assert_eq!(relation.as_str(), *symbol);
        }
    }

    #[test]
    fn test_from_str_rejects_other_operators() {
        // Debian uses << and >>, not the single-character forms
        assert!("<".parse::<Relation>().is_err());
        assert!(">".parse::<Relation>().is_err());
        assert!("==".parse::<Relation>().is_err());
        assert!("!=".parse::<Relation>().is_err());
        assert!("".parse::<Relation>().is_err());
    }

    #[test]
    fn test_order_matches_symbol_order() {
        let mut relations = vec![
            Relation::GreaterThan,
            Relation::Equal,
            Relation::LowerThan,
            Relation::GreaterOrEqual,
            Relation::LowerOrEqual,
        ];
        relations.sort();

        let mut symbols: Vec<&str> = relations.iter().map(|r| r.as_str()).collect();
        let sorted = symbols.clone();
        symbols.sort();
        assert_eq!(symbols, sorted);
    }

    #[test]
    fn test_matches() {
        use Ordering::*;

        assert!(Relation::LowerThan.matches(Less));
        assert!(!Relation::LowerThan.matches(Equal));
        assert!(Relation::LowerOrEqual.matches(Equal));
        assert!(!Relation::LowerOrEqual.matches(Greater));
        assert!(Relation::Equal.matches(Equal));
        assert!(!Relation::Equal.matches(Less));
        assert!(Relation::GreaterOrEqual.matches(Equal));
        assert!(!Relation::GreaterOrEqual.matches(Less));
        assert!(Relation::GreaterThan.matches(Greater));
        assert!(!Relation::GreaterThan.matches(Equal));
    }

    #[test]
    fn test_direction_and_strictness() {
        assert_eq!(Relation::LowerThan.direction(), Direction::Lower);
        assert_eq!(Relation::LowerOrEqual.direction(), Direction::Lower);
        assert_eq!(Relation::Equal.direction(), Direction::Equal);
        assert_eq!(Relation::GreaterOrEqual.direction(), Direction::Greater);
        assert_eq!(Relation::GreaterThan.direction(), Direction::Greater);

        assert!(Relation::LowerThan.is_strict());
        assert!(Relation::GreaterThan.is_strict());
        assert!(Relation::LowerOrEqual.is_inclusive());
        assert!(Relation::Equal.is_inclusive());
        assert!(Relation::GreaterOrEqual.is_inclusive());
    }
}
