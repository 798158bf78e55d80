use crate::rules::{Rule, RuleError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_path")]
    pub default_path: String,
    #[serde(default = "default_profile")]
    pub default_profile: String,
    #[serde(default = "default_echo_pattern")]
    pub echo_pattern: String,
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub write: WritePolicy,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    #[default]
    Always,
    OnChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Embedded,
    File(PathBuf),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("invalid config: {0}")]
    Rule(#[from] RuleError),
    #[error("unknown profile `{0}`")]
    UnknownProfile(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Yaml,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_path: default_path(),
            default_profile: default_profile(),
            echo_pattern: default_echo_pattern(),
            backup_suffix: default_backup_suffix(),
        }
    }
}

fn default_path() -> String {
    "src/App.jsx".to_string()
}

fn default_profile() -> String {
    "concat".to_string()
}

fn default_echo_pattern() -> String {
    "const hay".to_string()
}

fn default_backup_suffix() -> String {
    ".bak_".to_string()
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Format::Yaml,
            _ => Format::Toml,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settings.backup_suffix.is_empty() {
            return Err(ConfigError::Invalid(
                "backup_suffix must not be empty".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for profile in &self.profiles {
            if !seen.insert(profile.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate profile `{}`",
                    profile.id
                )));
            }
            for rule in &profile.rules {
                rule.validate()?;
            }
        }
        if !seen.contains(self.settings.default_profile.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "default_profile `{}` is not defined",
                self.settings.default_profile
            )));
        }
        Ok(())
    }

    pub fn profile(&self, id: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .iter()
            .find(|profile| profile.id == id)
            .ok_or_else(|| ConfigError::UnknownProfile(id.to_string()))
    }
}

pub fn config_path() -> PathBuf {
    let mut root = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    root.push(".config");
    root.push("linefix");
    root.push("config.toml");
    root
}

pub fn defaults() -> Result<Config, ConfigError> {
    parse_raw(DEFAULT_CONFIG, Format::Toml)
}

/// Loads `explicit` if given, else the user config if present, else the built-in defaults.
pub fn load(explicit: Option<&Path>) -> Result<(Config, ConfigSource), ConfigError> {
    if let Some(path) = explicit {
        return load_file(path).map(|cfg| (cfg, ConfigSource::File(path.to_path_buf())));
    }
    let path = config_path();
    if path.exists() {
        let cfg = load_file(&path)?;
        return Ok((cfg, ConfigSource::File(path)));
    }
    Ok((defaults()?, ConfigSource::Embedded))
}

pub fn load_file(path: &Path) -> Result<Config, ConfigError> {
    let raw = fs::read_to_string(path)?;
    parse_raw(&raw, Format::from_path(path))
}

pub fn parse_raw(raw: &str, format: Format) -> Result<Config, ConfigError> {
    let cfg: Config = match format {
        Format::Toml => toml::from_str(raw)?,
        Format::Yaml => serde_yaml::from_str(raw)?,
    };
    cfg.validate()?;
    Ok(cfg)
}
