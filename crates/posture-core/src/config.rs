use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::scan::Severity;

pub const CONFIG_FILE: &str = ".posture.toml";

/// Top-level configuration from `.posture.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub ports: PortsConfig,
}

/// Where generated artifacts are written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("docs")
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            reports_dir: default_reports_dir(),
        }
    }
}

/// Action-item ledger settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Existing POA&M used when the input document is an SSP.
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,
    /// Findings below this severity never become action items.
    #[serde(default = "default_min_severity")]
    pub min_severity: Severity,
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("poam.json")
}

fn default_min_severity() -> Severity {
    Severity::Medium
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
            min_severity: default_min_severity(),
        }
    }
}

/// Monthly report inputs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub template: Option<PathBuf>,
    #[serde(default)]
    pub trends: Option<PathBuf>,
}

/// Port review settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortsConfig {
    /// Ports documented as approved; anything else observed is flagged.
    #[serde(default)]
    pub approved: Vec<u16>,
}

impl Config {
    /// Load configuration from a `.posture.toml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse '{}'", path.display()))?;
        Ok(config)
    }

    /// Load from `.posture.toml` in the given directory or any ancestor, or return defaults.
    pub fn load_or_default(dir: &Path) -> Self {
        let start = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let mut current = start.as_path();
        loop {
            let config_path = current.join(CONFIG_FILE);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => {
                        tracing::debug!("using config {}", config_path.display());
                        config
                    }
                    Err(e) => {
                        tracing::warn!(
                            "failed to load config from '{}': {e:#}. Using defaults.",
                            config_path.display()
                        );
                        Self::default()
                    }
                };
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        Self::default()
    }
}
