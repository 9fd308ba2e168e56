//! Application Configuration
//!
//! Centralized configuration for a pacta invocation: the map of deployment
//! environments to catalog endpoints, the retry policy, and the contract
//! document location. Loaded from a YAML file, inline YAML, or environment
//! variables, then validated before anything touches the catalog.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Unified application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Deployment environments selectable with `--env`
    pub environments: BTreeMap<String, EnvironmentConfig>,

    /// Retry policy for catalog calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Directory holding `<name>.yaml` contract documents
    pub contracts_dir: PathBuf,
}

impl AppConfig {
    /// Load configuration from environment and file.
    ///
    /// Precedence: `PACTA_CONFIG_PATH` (YAML file), then
    /// `PACTA_CONFIG_YAML` (inline YAML), then plain environment variables.
    pub fn load() -> Result<Self> {
        let config = match (
            std::env::var("PACTA_CONFIG_PATH").ok(),
            std::env::var("PACTA_CONFIG_YAML").ok(),
        ) {
            (Some(path), _) => {
                let path = PathBuf::from(path);
                if !path.exists() {
                    return Err(ConfigError::FileNotFound(path));
                }
                let content = std::fs::read_to_string(&path).map_err(ConfigError::FileRead)?;
                serde_yaml::from_str(&content).map_err(ConfigError::ParseYaml)?
            }
            (None, Some(yaml)) => serde_yaml::from_str(&yaml).map_err(ConfigError::ParseYaml)?,
            _ => Self::from_env()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables: one environment named
    /// by `PACTA_ENV_NAME` (default `dev`) pointing at `PACTA_CATALOG_URL`.
    pub fn from_env() -> Result<Self> {
        let name = std::env::var("PACTA_ENV_NAME").unwrap_or_else(|_| "dev".to_string());
        let catalog_url = std::env::var("PACTA_CATALOG_URL")
            .map_err(|_| ConfigError::MissingEnvVar("PACTA_CATALOG_URL".to_string()))?;
        let token_env = std::env::var("PACTA_CATALOG_TOKEN_ENV")
            .unwrap_or_else(|_| "PACTA_CATALOG_TOKEN".to_string());
        let contracts_dir = std::env::var("PACTA_CONTRACTS_DIR")
            .unwrap_or_else(|_| "data_contracts".to_string());

        let mut environments = BTreeMap::new();
        environments.insert(
            name,
            EnvironmentConfig {
                catalog_url,
                token_env,
                request_timeout_ms: default_request_timeout_ms(),
            },
        );

        Ok(Self {
            environments,
            retry: RetryConfig::default(),
            contracts_dir: PathBuf::from(contracts_dir),
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.environments.is_empty() {
            return Err(ConfigError::InvalidValue(
                "no environments configured".to_string(),
            ));
        }
        for (name, environment) in &self.environments {
            if environment.catalog_url.is_empty() {
                return Err(ConfigError::InvalidValue(format!(
                    "environment '{name}' has an empty catalog_url"
                )));
            }
            if environment.request_timeout_ms == 0 {
                return Err(ConfigError::InvalidValue(format!(
                    "environment '{name}' has a zero request timeout"
                )));
            }
        }
        Ok(())
    }

    /// Resolve the environment selected by `--env`. An unknown environment
    /// fails here, before any catalog call.
    pub fn environment(&self, name: &str) -> Result<&EnvironmentConfig> {
        self.environments
            .get(name)
            .ok_or_else(|| ConfigError::UnknownEnvironment(name.to_string()))
    }
}

/// One deployment target's catalog endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Catalog service base URL
    pub catalog_url: String,

    /// Name of the environment variable holding the access token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl EnvironmentConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_token_env() -> String {
    "PACTA_CATALOG_TOKEN".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

/// Retry policy for catalog operations
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Retries per operation after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds, doubled per attempt
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    /// Per-call timeout in milliseconds
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

impl RetryConfig {
    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_backoff_ms: default_base_backoff_ms(),
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_backoff_ms() -> u64 {
    100
}

fn default_operation_timeout_ms() -> u64 {
    30_000
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read configuration file: {0}")]
    FileRead(std::io::Error),

    #[error("failed to parse YAML configuration: {0}")]
    ParseYaml(serde_yaml::Error),

    #[error("invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
