use anyhow::{Context, Result};
use debspec::SpecifierSet;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "debspec.toml";

/// Packages listed when the configuration has no `[packages]` table
pub const DEFAULT_PACKAGES: [&str; 4] = ["yunohost", "yunohost-admin", "moulinette", "ssowat"];

/// The debspec configuration file structure (debspec.toml)
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DebspecConfig {
    /// Directory holding `<package>/changelog.gz`
    pub changelog_dir: PathBuf,

    /// Version specifiers required for each package
    pub packages: BTreeMap<String, String>,
}

impl Default for DebspecConfig {
    fn default() -> Self {
        Self {
            changelog_dir: PathBuf::from("/usr/share/doc"),
            packages: DEFAULT_PACKAGES
                .iter()
                .map(|package| (package.to_string(), String::new()))
                .collect(),
        }
    }
}

impl DebspecConfig {
    /// Parse a configuration and check every declared specifier
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: DebspecConfig = toml::from_str(content)?;
        config.constraints()?;
        Ok(config)
    }

    /// Load the configuration at `path`
    pub fn from_path(path: &Path) -> Result<Self> {
        log::debug!("Reading {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Load configuration from debspec.toml, searching upward from the given directory
    pub fn load(start_dir: &Path) -> Result<Option<Self>> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE);

            if config_path.exists() {
                return Self::from_path(&config_path).map(Some);
            }

            if !current.pop() {
                return Ok(None);
            }
        }
    }

    /// Load configuration by searching upward from the current working directory
    pub fn load_from_cwd() -> Result<Option<Self>> {
        let cwd = std::env::current_dir()?;
        Self::load(&cwd)
    }

    /// Parsed specifiers, by package name
    pub fn constraints(&self) -> Result<BTreeMap<String, SpecifierSet>> {
        self.packages
            .iter()
            .map(|(package, spec)| {
                let set = SpecifierSet::parse(spec)
                    .with_context(|| format!("Invalid version specifier for package {}", package))?;
                Ok::<_, anyhow::Error>((package.clone(), set))
            })
            .collect()
    }

    /// Path of the compressed changelog of `package`
    pub fn changelog_path(&self, package: &str) -> PathBuf {
        self.changelog_dir.join(package).join("changelog.gz")
    }
}
