//! Settings for connecting to a store and tuning search.
//!
//! Loaded from a TOML file (explicit path, else the per-user config dir),
//! then overridden from the environment.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::db::query::{DEFAULT_FUZZY_THRESHOLD, DEFAULT_LIMIT};
use crate::error::{Error, Result};
use crate::version::APP_NAME;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Neo4j,
    Sqlite,
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "neo4j" => Ok(Backend::Neo4j),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(Error::Config(format!("unknown backend '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub backend: Backend,

    #[serde(default)]
    pub neo4j: Neo4jSettings,

    #[serde(default)]
    pub sqlite: SqliteSettings,

    #[serde(default)]
    pub search: SearchSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neo4jSettings {
    #[serde(default = "default_uri")]
    pub uri: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_password")]
    pub password: String,

    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: default_password(),
            database: default_database(),
        }
    }
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_password() -> String {
    "password".to_string()
}

fn default_database() -> String {
    "neo4j".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SqliteSettings {
    /// Database file; defaults to `<data dir>/memory-box/memory-box.db`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl SqliteSettings {
    pub fn resolved_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|mut path| {
                    path.push(APP_NAME);
                    path.push(format!("{}.db", APP_NAME));
                    path
                })
                .unwrap_or_else(|| PathBuf::from(format!("{}.db", APP_NAME)))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Minimum fuzzy score, 0-100
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,

    /// Rows fetched before fuzzy scoring
    #[serde(default = "default_candidate_pool")]
    pub fuzzy_candidate_pool: usize,

    #[serde(default = "default_redact")]
    pub redact_secrets: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            fuzzy_threshold: default_fuzzy_threshold(),
            fuzzy_candidate_pool: default_candidate_pool(),
            redact_secrets: default_redact(),
        }
    }
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_fuzzy_threshold() -> f64 {
    DEFAULT_FUZZY_THRESHOLD
}

fn default_candidate_pool() -> usize {
    500
}

fn default_redact() -> bool {
    true
}

impl Settings {
    /// Load settings from `path`, or from the default location when `None`.
    /// A missing default file yields defaults; a missing explicit file is an
    /// error. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::load_from(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from(&path)?,
                _ => Self::default(),
            },
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push(APP_NAME);
            path.push("config.toml");
            path
        })
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(uri) = lookup("NEO4J_URI") {
            self.neo4j.uri = uri;
        }
        if let Some(user) = lookup("NEO4J_USER") {
            self.neo4j.user = user;
        }
        if let Some(password) = lookup("NEO4J_PASSWORD") {
            self.neo4j.password = password;
        }
        if let Some(database) = lookup("NEO4J_DATABASE") {
            self.neo4j.database = database;
        }
        if let Some(backend) = lookup("MEMORY_BOX_BACKEND") {
            self.backend = backend.parse()?;
        }
        if let Some(path) = lookup("MEMORY_BOX_SQLITE_PATH") {
            self.sqlite.path = Some(PathBuf::from(path));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.search.fuzzy_threshold) {
            return Err(Error::Config(format!(
                "fuzzy_threshold must be between 0 and 100, got {}",
                self.search.fuzzy_threshold
            )));
        }
        if self.search.default_limit == 0 {
            return Err(Error::Config("default_limit must be greater than zero".to_string()));
        }
        Ok(())
    }
}
