//! Project configuration.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. Built-in defaults
//! 2. `apistack.toml`, if present
//! 3. Environment variables (`APISTACK_*`, `CDK_DEFAULT_ACCOUNT`, `CDK_DEFAULT_REGION`)
//!
//! Command-line flags are applied on top by the CLI.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{CONFIG_FILENAME, DEFAULT_OUT_DIR, DEFAULT_STACK_NAME};
use crate::construct::Environment;

pub const STACK_NAME_ENV: &str = "APISTACK_STACK_NAME";
pub const WITH_STORE_ENV: &str = "APISTACK_WITH_STORE";
pub const OUT_DIR_ENV: &str = "APISTACK_OUT_DIR";
pub const ACCOUNT_ENV: &str = "CDK_DEFAULT_ACCOUNT";
pub const REGION_ENV: &str = "CDK_DEFAULT_REGION";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse {
    path: String,
    #[source]
    source: toml::de::Error,
  },

  #[error("{var} must be a boolean, got '{value}'")]
  InvalidBool { var: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
  pub stack_name: String,
  /// Declare the object store and the routes that use it.
  pub with_store: bool,
  pub out_dir: PathBuf,
  pub env: Environment,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      stack_name: DEFAULT_STACK_NAME.to_string(),
      with_store: true,
      out_dir: PathBuf::from(DEFAULT_OUT_DIR),
      env: Environment::default(),
    }
  }
}

impl Config {
  /// Load configuration and apply environment overrides.
  ///
  /// An explicit `path` must exist. Without one, `apistack.toml` in the
  /// current directory is used when present and defaults otherwise.
  pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
    let mut config = match path {
      Some(path) => Self::from_file(path)?,
      None => {
        let default_path = Path::new(CONFIG_FILENAME);
        if default_path.exists() {
          Self::from_file(default_path)?
        } else {
          Self::default()
        }
      }
    };
    config.apply_env_overrides()?;
    Ok(config)
  }

  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.display().to_string(),
      source,
    })?;
    let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.display().to_string(),
      source,
    })?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
  }

  pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
    if let Some(name) = non_empty_var(STACK_NAME_ENV) {
      self.stack_name = name;
    }
    if let Some(value) = non_empty_var(WITH_STORE_ENV) {
      self.with_store = parse_bool(WITH_STORE_ENV, &value)?;
    }
    if let Some(dir) = non_empty_var(OUT_DIR_ENV) {
      self.out_dir = PathBuf::from(dir);
    }
    if let Some(account) = non_empty_var(ACCOUNT_ENV) {
      self.env.account = Some(account);
    }
    if let Some(region) = non_empty_var(REGION_ENV) {
      self.env.region = Some(region);
    }
    Ok(())
  }
}

fn non_empty_var(name: &str) -> Option<String> {
  std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_bool(var: &str, value: &str) -> Result<bool, ConfigError> {
  match value.to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" | "on" => Ok(true),
    "0" | "false" | "no" | "off" => Ok(false),
    _ => Err(ConfigError::InvalidBool {
      var: var.to_string(),
      value: value.to_string(),
    }),
  }
}
