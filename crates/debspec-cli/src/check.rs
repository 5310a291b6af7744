//! Commands working on specifiers alone: check, compare, intersect, union.

use anyhow::{Context, Result};
use clap::Args;
use debspec::{version_compare, Reduction, SpecifierSet};
use serde::Serialize;
use std::cmp::Ordering;

use crate::output::emit;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Version to check, e.g. 4.0.2+202006121502
    pub version: String,

    /// Comma separated specifiers, e.g. ">= 4.0, << 5.0"
    pub spec: String,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    pub first: String,
    pub second: String,
}

#[derive(Args, Debug)]
pub struct IntersectArgs {
    /// Specifier sets to intersect, from left to right
    #[arg(required = true)]
    pub specs: Vec<String>,

    /// Exit with status 1 when no version can meet the result
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct UnionArgs {
    /// Specifier sets to merge
    #[arg(required = true)]
    pub specs: Vec<String>,
}

#[derive(Serialize, Debug)]
struct CheckReport {
    version: String,
    spec: String,
    satisfied: bool,
}

#[derive(Serialize, Debug)]
struct CompareReport {
    first: String,
    second: String,
    result: i8,
}

#[derive(Serialize, Debug)]
struct SetReport {
    result: String,
    infeasible: bool,
}

pub fn parse_set(spec: &str) -> Result<SpecifierSet> {
    SpecifierSet::parse(spec).with_context(|| format!("Could not parse version specifier \"{}\"", spec))
}

pub fn check(args: CheckArgs, json: bool) -> Result<i32> {
    let set = parse_set(&args.spec)?;
    let satisfied = set.contains(&args.version);
    log::debug!("{} in [{}]: {}", args.version, set, satisfied);

    let report = CheckReport {
        version: args.version,
        spec: set.to_string(),
        satisfied,
    };
    emit(json, &report, |r| {
        let verdict = if r.satisfied { "satisfies" } else { "does not satisfy" };
        format!("{} {} \"{}\"", r.version, verdict, r.spec)
    })?;

    Ok(if satisfied { 0 } else { 1 })
}

impl CompareReport {
    fn new(first: String, second: String) -> Self {
        let result = match version_compare(&first, &second) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        };
        CompareReport { first, second, result }
    }
}

pub fn compare(args: CompareArgs, json: bool) -> Result<i32> {
    let report = CompareReport::new(args.first, args.second);
    emit(json, &report, |r| r.result.to_string())?;
    Ok(0)
}

/// Fold specifier sets with `intersection`, stopping at the first contradiction
pub fn intersect_all(specs: &[SpecifierSet]) -> Reduction {
    let mut current = Reduction::Unconstrained;
    for set in specs {
        let acc = match &current {
            Reduction::Constrained(acc) => acc.clone(),
            Reduction::Unconstrained => SpecifierSet::new(),
            Reduction::Infeasible => break,
        };
        current = acc.reduce(set);
    }
    current
}

pub fn intersect(args: IntersectArgs, json: bool) -> Result<i32> {
    let sets = args.specs.iter().map(|s| parse_set(s)).collect::<Result<Vec<_>>>()?;
    let reduction = intersect_all(&sets);
    let infeasible = reduction.is_infeasible();
    if infeasible {
        log::warn!("No version can meet all of {:?}", args.specs);
    }

    let report = SetReport {
        result: reduction.into_set().to_string(),
        infeasible,
    };
    emit(json, &report, |r| r.result.clone())?;

    Ok(if args.strict && infeasible { 1 } else { 0 })
}

pub fn union(args: UnionArgs, json: bool) -> Result<i32> {
    let merged = args
        .specs
        .iter()
        .map(|s| parse_set(s))
        .try_fold(SpecifierSet::new(), |acc, set| set.map(|set| acc.union(&set)))?;

    let report = SetReport {
        result: merged.to_string(),
        infeasible: false,
    };
    emit(json, &report, |r| r.result.clone())?;
    Ok(0)
}
