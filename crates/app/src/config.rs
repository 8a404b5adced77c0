use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use sift_classify::RULES_KEY;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite file holding persisted settings, including the rule set.
    pub database: PathBuf,
    /// Labeled CSV added to the training set of every categorize run.
    pub seed_csv: Option<PathBuf>,
    /// Used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub rules_key: String,
}

impl Default for Config {
    fn default() -> Self {
        let database = project_dirs()
            .map(|dirs| dirs.data_dir().join("sift.db"))
            .unwrap_or_else(|| PathBuf::from("sift.db"));
        Self {
            database,
            seed_csv: None,
            log_filter: "info".to_string(),
            rules_key: RULES_KEY.to_string(),
        }
    }
}

pub fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "sift", "Sift")
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Reads `explicit` if given (it must exist), otherwise the platform config
/// file if present, otherwise defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(p) if !p.exists() => bail!("config not found: {}", p.display()),
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(Config::default()),
        },
    };
    let s = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(s)?;
    if cfg.rules_key.trim().is_empty() {
        bail!("rules_key must not be empty");
    }
    Ok(cfg)
}
