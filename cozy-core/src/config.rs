//! Client configuration at ~/.config/cozy/config.toml
//!
//! Layering, lowest to highest precedence: built-in defaults, the config
//! file, then `COZY_*_URL` environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::{CozyError, CozyResult};

const DEFAULT_AUTH_URL: &str = "http://localhost:8080";
const DEFAULT_TASK_URL: &str = "http://localhost:8081";
const DEFAULT_CALENDAR_URL: &str = "http://localhost:8082";
const DEFAULT_EVENT_URL: &str = "http://localhost:8083";

/// Environment variables that override service URLs, and the config key each one sets.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("COZY_AUTH_URL", "services.auth"),
    ("COZY_TASK_URL", "services.tasks"),
    ("COZY_CALENDAR_URL", "services.calendars"),
    ("COZY_EVENT_URL", "services.events"),
];

/// Base URLs of the backend services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceUrls {
    pub auth: String,
    pub tasks: String,
    pub calendars: String,
    pub events: String,
}

impl Default for ServiceUrls {
    fn default() -> Self {
        ServiceUrls {
            auth: DEFAULT_AUTH_URL.to_string(),
            tasks: DEFAULT_TASK_URL.to_string(),
            calendars: DEFAULT_CALENDAR_URL.to_string(),
            events: DEFAULT_EVENT_URL.to_string(),
        }
    }
}

/// Query cache and request tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long fetched data counts as fresh.
    #[serde(with = "humantime_serde")]
    pub stale_time: Duration,

    /// Entries not read for this long are evicted.
    #[serde(with = "humantime_serde")]
    pub gc_time: Duration,

    /// Extra attempts for failed reads. Mutations are never retried.
    pub query_retries: u32,

    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,

    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            stale_time: Duration::from_secs(30),
            gc_time: Duration::from_secs(5 * 60),
            query_retries: 3,
            retry_delay: Duration::from_millis(500),
            request_timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CozyConfig {
    pub services: ServiceUrls,
    pub cache: CacheConfig,
}

impl CozyConfig {
    pub fn config_dir() -> CozyResult<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or_else(|| CozyError::Config("Could not determine config directory".into()))?
            .join("cozy"))
    }

    pub fn config_path() -> CozyResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load from the default location, creating a commented-out config on first run.
    pub fn load() -> CozyResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path, |var| std::env::var(var).ok())
    }

    /// Load from `path` (missing file is fine), applying overrides from `env`.
    pub fn load_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> CozyResult<Self> {
        let mut builder = Config::builder()
            .add_source(File::from(path.to_path_buf()).format(FileFormat::Toml).required(false));

        for (var, key) in ENV_OVERRIDES {
            if let Some(value) = env(var) {
                builder = builder
                    .set_override(*key, value)
                    .map_err(|e| CozyError::Config(e.to_string()))?;
            }
        }

        builder
            .build()
            .map_err(|e| CozyError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CozyError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CozyResult<()> {
        let contents = format!(
            "\
# cozy configuration

[services]
# auth = \"{DEFAULT_AUTH_URL}\"
# tasks = \"{DEFAULT_TASK_URL}\"
# calendars = \"{DEFAULT_CALENDAR_URL}\"
# events = \"{DEFAULT_EVENT_URL}\"

[cache]
# stale_time = \"30s\"
# gc_time = \"5m\"
# query_retries = 3
# retry_delay = \"500ms\"
# request_timeout = \"15s\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CozyError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CozyError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CozyConfig::load_from(&dir.path().join("config.toml"), no_env).unwrap();
        assert_eq!(config, CozyConfig::default());
    }

    #[test]
    fn commented_default_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cozy").join("config.toml");
        CozyConfig::create_default_config(&path).unwrap();

        let config = CozyConfig::load_from(&path, no_env).unwrap();
        assert_eq!(config.services, ServiceUrls::default());
        assert_eq!(config.cache.query_retries, 3);
    }

    #[test]
    fn file_values_and_env_overrides_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[services]\ntasks = \"http://tasks.internal\"\nauth = \"http://auth.internal\"\n\n[cache]\nstale_time = \"2m\"\n",
        )
        .unwrap();

        let config = CozyConfig::load_from(&path, |var| {
            (var == "COZY_AUTH_URL").then(|| "http://auth.override".to_string())
        })
        .unwrap();

        assert_eq!(config.services.tasks, "http://tasks.internal");
        assert_eq!(config.services.auth, "http://auth.override");
        assert_eq!(config.services.events, DEFAULT_EVENT_URL);
        assert_eq!(config.cache.stale_time, Duration::from_secs(120));
        assert_eq!(config.cache.gc_time, Duration::from_secs(300));
    }
}
