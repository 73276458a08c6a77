//! Layered configuration for the evaluation hub.
//!
//! Configuration is assembled from several layers, each one overriding the
//! previous:
//!
//! 1. the base file `server.yaml` (required), searched in `config/` then `.`
//! 2. the deployment override `config.yaml` (optional), searched in `.` then `..`
//! 3. secrets read from files under `secrets.dir`, keyed by `secrets.mappings`
//! 4. environment variables named in `env.mappings`
//! 5. generic `EVAL_HUB__SECTION__KEY` environment variables
//!
//! ## Example base file
//!
//! ```yaml
//! service:
//!   port: 8080
//!   log_level: info
//!
//! database:
//!   host: localhost
//!   port: "5432"
//!
//! secrets:
//!   dir: /var/run/secrets/eval-hub
//!   mappings:
//!     database.password: db-password
//!
//! env:
//!   mappings:
//!     service.port: PORT
//!     database.url: DATABASE_URL,POSTGRES_URL
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while assembling the service configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file {name}.yaml not found in {dirs:?}")]
    MissingFile { name: String, dirs: Vec<PathBuf> },

    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: Option<ServiceConfig>,

    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

/// HTTP service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Listening port; `0` asks the OS for an ephemeral port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Default tracing filter, overridable through `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

/// Database connection settings. Consumed by storage backends only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub ssl_mode: Option<String>,
}

impl Config {
    /// Parse a single YAML document without any layering.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let cfg = config::Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }
}

/// Builds a [`Config`] from files, secrets and the environment.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    base_name: String,
    base_dirs: Vec<PathBuf>,
    override_name: String,
    override_dirs: Vec<PathBuf>,
    env_prefix: String,
    env: Option<HashMap<String, String>>,
    read_dotenv: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            base_name: "server".to_string(),
            base_dirs: vec![PathBuf::from("config"), PathBuf::from(".")],
            override_name: "config".to_string(),
            override_dirs: vec![PathBuf::from("."), PathBuf::from("..")],
            env_prefix: "EVAL_HUB".to_string(),
            env: None,
            read_dotenv: true,
        }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directories searched, in order, for the base `server.yaml`.
    pub fn with_base_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.base_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Directories searched, in order, for the optional `config.yaml`.
    pub fn with_override_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.override_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Replace the process environment with a fixed map. Disables `.env` loading.
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self.read_dotenv = false;
        self
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        if self.read_dotenv {
            // A missing .env file is the normal case outside local development.
            let _ = dotenvy::dotenv();
        }

        let base = find_file(&self.base_name, &self.base_dirs).ok_or_else(|| {
            tracing::error!(file = %self.base_name, dirs = ?self.base_dirs, "base configuration file not found");
            ConfigError::MissingFile {
                name: self.base_name.clone(),
                dirs: self.base_dirs.clone(),
            }
        })?;
        tracing::info!(file = %base.display(), "reading base configuration");

        let mut builder = config::Config::builder().add_source(File::from(base));
        match find_file(&self.override_name, &self.override_dirs) {
            Some(path) => {
                tracing::info!(file = %path.display(), "reading configuration override");
                builder = builder.add_source(File::from(path));
            }
            None => {
                tracing::debug!(file = %self.override_name, dirs = ?self.override_dirs, "no configuration override found");
            }
        }
        let layered = builder.build()?;

        let mut builder = config::Config::builder().add_source(layered.clone());
        for (key, value) in secret_overrides(&layered) {
            tracing::debug!(key = %key, "injecting secret");
            builder = builder.set_override(key, value)?;
        }

        let lookup = |name: &str| match &self.env {
            Some(env) => env.get(name).cloned(),
            None => std::env::var(name).ok(),
        };
        for (key, value) in env_overrides(&layered, lookup) {
            tracing::debug!(key = %key, "binding environment variable");
            builder = builder.set_override(key, value)?;
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("__")
                .separator("__")
                .source(self.env.clone()),
        );

        Ok(builder.build()?.try_deserialize()?)
    }
}

fn find_file(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| ["yaml", "yml"].map(|ext| dir.join(format!("{name}.{ext}"))))
        .find(|path| path.is_file())
}

/// `secrets.mappings` entries whose secret file exists and is non-empty.
fn secret_overrides(cfg: &config::Config) -> Vec<(String, String)> {
    let Ok(dir) = cfg.get_string("secrets.dir") else {
        return Vec::new();
    };
    if dir.is_empty() {
        return Vec::new();
    }
    let mappings: HashMap<String, String> = cfg.get("secrets.mappings").unwrap_or_default();

    mappings
        .into_iter()
        .filter_map(|(key, file)| read_secret(Path::new(&dir), &file).map(|secret| (key, secret)))
        .collect()
}

fn read_secret(dir: &Path, name: &str) -> Option<String> {
    let secret = fs::read_to_string(dir.join(name)).ok()?;
    let secret = secret.trim_end();
    (!secret.is_empty()).then(|| secret.to_string())
}

/// `env.mappings` entries resolved against the first set variable of each list.
fn env_overrides<F>(cfg: &config::Config, lookup: F) -> Vec<(String, String)>
where
    F: Fn(&str) -> Option<String>,
{
    let mappings: HashMap<String, String> = cfg.get("env.mappings").unwrap_or_default();

    mappings
        .into_iter()
        .filter_map(|(key, names)| {
            names
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .find_map(|name| lookup(name).filter(|value| !value.is_empty()))
                .map(|value| (key, value))
        })
        .collect()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}
