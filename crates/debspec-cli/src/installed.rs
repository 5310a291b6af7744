//! Commands checking installed packages: installed, verify.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use debspec::{PackageVersion, Reduction, SpecifierSet};
use flate2::read::GzDecoder;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::check::parse_set;
use crate::config::DebspecConfig;
use crate::output::emit;

#[derive(Args, Debug)]
pub struct InstalledArgs {
    /// Package name
    pub package: String,

    /// Changelog to read instead of <changelog_dir>/<package>/changelog.gz
    #[arg(long)]
    pub changelog: Option<PathBuf>,

    /// Also check the installed version against these specifiers
    #[arg(long)]
    pub spec: Option<String>,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Extra requirement, intersected with the configured one (PACKAGE=SPEC)
    #[arg(short = 'r', long = "require", value_name = "PACKAGE=SPEC")]
    pub requires: Vec<String>,
}

#[derive(Serialize, Debug)]
struct PackageReport {
    package: String,
    version: String,
    distribution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    spec: Option<String>,
    satisfied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl PackageReport {
    fn new(installed: PackageVersion, spec: Option<&SpecifierSet>) -> Self {
        let satisfied = spec.map_or(true, |spec| installed.satisfies(spec));
        PackageReport {
            package: installed.package,
            version: installed.version,
            distribution: installed.distribution,
            spec: spec.map(|s| s.to_string()),
            satisfied,
            error: None,
        }
    }

    /// Failed report for a package whose changelog could not be read
    fn unreadable(package: &str, spec: Option<&SpecifierSet>, error: &anyhow::Error) -> Self {
        PackageReport {
            satisfied: false,
            error: Some(format!("{:#}", error)),
            ..PackageReport::new(PackageVersion::unknown(package), spec)
        }
    }

    fn render(&self) -> String {
        let status = if self.satisfied { "ok".green() } else { "FAIL".red() };
        if let Some(error) = &self.error {
            return format!("{} {}: {}", status, self.package, error);
        }
        match &self.spec {
            Some(spec) => format!(
                "{} {} {} ({}) requires \"{}\"",
                status, self.package, self.version, self.distribution, spec
            ),
            None => format!("{} {} ({})", self.package, self.version, self.distribution),
        }
    }
}

/// Read the first non-blank line of a changelog, decompressing `.gz` files
fn read_header(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    for line in BufReader::new(reader).lines() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        if !line.trim().is_empty() {
            return Ok(line);
        }
    }
    bail!("{} is empty", path.display())
}

/// Installed version of `package`, or an unknown version when there is no changelog
pub fn read_installed(package: &str, changelog: &Path) -> Result<PackageVersion> {
    if !changelog.exists() {
        log::debug!("No changelog at {}, version of {} is unknown", changelog.display(), package);
        return Ok(PackageVersion::unknown(package));
    }

    log::debug!("Reading {}", changelog.display());
    let header = read_header(changelog)?;
    let installed = PackageVersion::from_changelog_header(&header)
        .with_context(|| format!("Failed to parse {}", changelog.display()))?;

    if installed.package != package {
        log::warn!(
            "{} describes package {}, not {}",
            changelog.display(),
            installed.package,
            package
        );
    }
    Ok(installed)
}

pub fn installed(args: InstalledArgs, config: &DebspecConfig, json: bool) -> Result<i32> {
    let changelog = args
        .changelog
        .clone()
        .unwrap_or_else(|| config.changelog_path(&args.package));
    let spec = args.spec.as_deref().map(parse_set).transpose()?;

    let installed = read_installed(&args.package, &changelog)?;
    let report = PackageReport::new(installed, spec.as_ref());
    emit(json, &report, PackageReport::render)?;

    Ok(if report.satisfied { 0 } else { 1 })
}

/// Split a `PACKAGE=SPEC` requirement
fn parse_requirement(requirement: &str) -> Result<(String, SpecifierSet)> {
    let Some((package, spec)) = requirement.split_once('=') else {
        bail!("Invalid requirement \"{}\", expected PACKAGE=SPEC", requirement);
    };
    let package = package.trim();
    if package.is_empty() {
        bail!("Invalid requirement \"{}\", missing package name", requirement);
    }
    Ok((package.to_string(), parse_set(spec)?))
}

/// Merge configured constraints with extra requirements for the same packages
pub fn merge_requirements(
    mut constraints: BTreeMap<String, SpecifierSet>,
    requires: &[String],
) -> Result<BTreeMap<String, SpecifierSet>> {
    for requirement in requires {
        let (package, extra) = parse_requirement(requirement)?;
        let current = constraints.remove(&package).unwrap_or_default();
        match current.reduce(&extra) {
            Reduction::Infeasible => {
                bail!("Requirements for {} cannot be met: \"{}\" and \"{}\"", package, current, extra)
            }
            reduction => {
                constraints.insert(package, reduction.into_set());
            }
        }
    }
    Ok(constraints)
}

/// One report per package; an unreadable changelog fails that package only
fn package_reports(constraints: &BTreeMap<String, SpecifierSet>, config: &DebspecConfig) -> Vec<PackageReport> {
    constraints
        .iter()
        .map(|(package, spec)| {
            let spec = Some(spec).filter(|spec| !spec.is_empty());
            match read_installed(package, &config.changelog_path(package)) {
                Ok(installed) => PackageReport::new(installed, spec),
                Err(err) => {
                    log::warn!("Could not read the version of {}: {:#}", package, err);
                    PackageReport::unreadable(package, spec, &err)
                }
            }
        })
        .collect()
}

pub fn verify(args: VerifyArgs, config: &DebspecConfig, json: bool) -> Result<i32> {
    let constraints = merge_requirements(config.constraints()?, &args.requires)?;
    if constraints.is_empty() {
        log::warn!("No packages to verify");
    }

    let reports = package_reports(&constraints, config);
    let failed = reports.iter().filter(|r| !r.satisfied).count();
    emit(json, &reports, |reports| {
        reports.iter().map(PackageReport::render).collect::<Vec<_>>().join("\n")
    })?;

    Ok(if failed > 0 { 1 } else { 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const HEADER: &str = "yunohost (4.0.2+202006121502) stable; urgency=low";

    fn write_gz(path: &Path, content: &str) {
        let file = File::create(path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        encoder.finish().unwrap();
    }

    #[test]
    fn test_read_plain_changelog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changelog");
        std::fs::write(&path, format!("\n{}\n\n  * change\n", HEADER)).unwrap();

        let installed = read_installed("yunohost", &path).unwrap();
        assert_eq!(installed.version, "4.0.2+202006121502");
        assert_eq!(installed.distribution, "stable");
    }

    #[test]
    fn test_read_gzip_changelog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changelog.gz");
        write_gz(&path, &format!("{}\n\n  * change\n", HEADER));

        let installed = read_installed("yunohost", &path).unwrap();
        assert_eq!(installed.version, "4.0.2+202006121502");
    }

    #[test]
    fn test_missing_changelog_is_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let installed = read_installed("ssowat", &dir.path().join("changelog.gz")).unwrap();
        assert!(!installed.is_known());
        assert_eq!(installed.package, "ssowat");
    }

    #[test]
    fn test_malformed_changelog_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changelog");
        std::fs::write(&path, "not a changelog\n").unwrap();
        assert!(read_installed("yunohost", &path).is_err());
    }

    #[test]
    fn test_parse_requirement() {
        let (package, spec) = parse_requirement("yunohost=>= 4.0, << 5.0").unwrap();
        assert_eq!(package, "yunohost");
        assert_eq!(spec, ">=4.0,<<5.0");

        assert!(parse_requirement(">= 4.0").is_err());
        assert!(parse_requirement("=>= 4.0").is_err());
    }

    #[test]
    fn test_merge_requirements() {
        let mut constraints = BTreeMap::new();
        constraints.insert("yunohost".to_string(), parse_set(">= 4.0, << 5.0").unwrap());

        let merged = merge_requirements(
            constraints.clone(),
            &["yunohost=<< 4.1".to_string(), "moulinette=>= 4.0".to_string()],
        )
        .unwrap();
        assert_eq!(merged["yunohost"], ">=4.0,<<4.1");
        assert_eq!(merged["moulinette"], ">=4.0");

        let err = merge_requirements(constraints, &["yunohost=>= 5.1".to_string()]).unwrap_err();
        assert!(err.to_string().contains("cannot be met"));
    }

    #[test]
    fn test_unreadable_changelog_fails_only_its_package() {
        let dir = tempfile::tempdir().unwrap();
        for package in ["yunohost", "moulinette"] {
            std::fs::create_dir(dir.path().join(package)).unwrap();
        }
        write_gz(&dir.path().join("yunohost").join("changelog.gz"), HEADER);
        write_gz(&dir.path().join("moulinette").join("changelog.gz"), "not a changelog\n");

        let config = DebspecConfig {
            changelog_dir: dir.path().to_path_buf(),
            packages: BTreeMap::new(),
        };
        let mut constraints = BTreeMap::new();
        constraints.insert("yunohost".to_string(), parse_set(">= 4.0").unwrap());
        constraints.insert("moulinette".to_string(), parse_set(">= 4.0").unwrap());
        constraints.insert("ssowat".to_string(), SpecifierSet::new());

        let reports = package_reports(&constraints, &config);
        assert_eq!(reports.len(), 3);

        let moulinette = &reports[0];
        assert_eq!(moulinette.package, "moulinette");
        assert!(!moulinette.satisfied);
        assert!(moulinette.error.as_deref().unwrap().contains("changelog.gz"));

        let ssowat = &reports[1];
        assert!(ssowat.satisfied);
        assert_eq!(ssowat.version, "?");
        assert_eq!(ssowat.spec, None);

        let yunohost = &reports[2];
        assert!(yunohost.satisfied);
        assert_eq!(yunohost.version, "4.0.2+202006121502");
        assert!(yunohost.error.is_none());
    }

    #[test]
    fn test_report() {
        let installed = PackageVersion::from_changelog_header(HEADER).unwrap();
        let spec = parse_set(">= 4.1").unwrap();
        let report = PackageReport::new(installed.clone(), Some(&spec));
        assert!(!report.satisfied);

        let report = PackageReport::new(installed, None);
        assert!(report.satisfied);
        assert_eq!(report.render(), "yunohost 4.0.2+202006121502 (stable)");
    }
}
