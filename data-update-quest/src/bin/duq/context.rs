use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use data_update_quest::store::DEFAULT_INDEX_PREFIX;

/// Name of the optional configuration file
pub const CONFIG_FILE: &str = "duq.toml";

static ENV_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("environment reference pattern is valid"));

/// Configuration context for duq commands
pub struct CliContext {
    /// Config file in use, if one was found
    pub config_path: Option<PathBuf>,
    /// Loaded configuration (defaults when no file was found)
    pub config: DuqConfig,
}

/// Configuration stored in duq.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DuqConfig {
    #[serde(default)]
    pub generate: GenerateSettings,
    #[serde(default)]
    pub redis: RedisSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateSettings {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub detect_renames: bool,
}

impl Default for GenerateSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            detect_renames: false,
        }
    }
}

fn default_output_dir() -> String {
    ".".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedisSettings {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_index_prefix")]
    pub index_prefix: String,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            index_prefix: default_index_prefix(),
        }
    }
}

fn default_redis_url() -> String {
    "${REDIS_URL}".to_string()
}

fn default_index_prefix() -> String {
    DEFAULT_INDEX_PREFIX.to_string()
}

impl CliContext {
    /// Load an explicit config file, or search the current directory and its ancestors
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let current_dir = std::env::current_dir().context("Failed to get current directory")?;
                Self::find_from(&current_dir)
            }
        }
    }

    /// Find duq.toml starting from the given directory; defaults when there is none
    pub fn find_from(start: &Path) -> Result<Self> {
        let mut current = start.to_path_buf();

        loop {
            let candidate = current.join(CONFIG_FILE);
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }

            if !current.pop() {
                return Ok(Self {
                    config_path: None,
                    config: DuqConfig::default(),
                });
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let config: DuqConfig =
            toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(Self {
            config_path: Some(path.to_path_buf()),
            config,
        })
    }

    /// Relative output directories are taken from the config file's directory
    pub fn output_dir(&self) -> PathBuf {
        let configured = PathBuf::from(&self.config.generate.output_dir);
        match self.config_path.as_deref().and_then(Path::parent) {
            Some(base) if configured.is_relative() => base.join(configured),
            _ => configured,
        }
    }

    /// Get the Redis URL from the config, expanding environment variables
    pub fn redis_url(&self) -> Result<String> {
        expand_env(&self.config.redis.url)
    }
}

/// Replace every `${VAR}` with the value of the environment variable
pub fn expand_env(value: &str) -> Result<String> {
    let mut missing = None;
    let expanded = ENV_REFERENCE.replace_all(value, |caps: &Captures<'_>| {
        let name = &caps[1];
        std::env::var(name).unwrap_or_else(|_| {
            missing.get_or_insert_with(|| name.to_string());
            String::new()
        })
    });

    match missing {
        Some(var_name) => anyhow::bail!("Environment variable {var_name} not set"),
        None => Ok(expanded.into_owned()),
    }
}
