//! Configuration
//!
//! Layered, lowest priority first: built-in defaults, a TOML file, then
//! `TRIPWIRE__SECTION__KEY` environment variables. A `.env` file is read first.
//!
//! The file is `--config`, else `TRIPWIRE_CONFIG_PATH`, else `./tripwire.toml` if
//! it exists.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "TRIPWIRE_CONFIG_PATH";
const DEFAULT_CONFIG_FILE: &str = "tripwire.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Length of one host tick
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
    /// Items one walk may step through before it is aborted
    #[serde(default)]
    pub max_steps: Option<u64>,
}

impl EngineConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig { tick_millis: default_tick_millis(), max_steps: None }
    }
}

fn default_tick_millis() -> u64 {
    50
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: default_log_level() }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load using the default file search
    pub fn load() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Programmatic overrides, applied above every other layer
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    tick_millis: Option<u64>,
    max_steps: Option<u64>,
    log_level: Option<String>,
}

impl ConfigBuilder {
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn tick_millis(mut self, tick_millis: Option<u64>) -> Self {
        self.tick_millis = tick_millis;
        self
    }

    pub fn max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn log_level(mut self, level: Option<String>) -> Self {
        self.log_level = level;
        self
    }

    pub fn build(self) -> Result<Config> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder()
            .set_default("engine.tick_millis", default_tick_millis() as i64)?
            .set_default("logging.level", default_log_level())?;

        let explicit = self
            .config_path
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));
        match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                builder = builder.add_source(config::File::from(path));
            }
            None => {
                builder = builder.add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false));
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix("TRIPWIRE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(tick_millis) = self.tick_millis {
            builder = builder.set_override("engine.tick_millis", tick_millis as i64)?;
        }
        if let Some(max_steps) = self.max_steps {
            builder = builder.set_override("engine.max_steps", max_steps as i64)?;
        }
        if let Some(level) = self.log_level {
            builder = builder.set_override("logging.level", level)?;
        }

        let config: Config = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        if config.engine.tick_millis == 0 {
            anyhow::bail!("engine.tick_millis must be at least 1");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.engine.tick(), Duration::from_millis(50));
        assert_eq!(config.engine.max_steps, None);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_file_and_overrides() {
        let path = std::env::temp_dir().join(format!("tripwire-test-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).expect("create temp config");
        writeln!(file, "[engine]\ntick_millis = 20\nmax_steps = 1000\n\n[logging]\nlevel = \"debug\"").expect("write config");

        let config = Config::builder()
            .config_path(Some(path.clone()))
            .log_level(Some("warn".to_string()))
            .build()
            .expect("config loads");
        std::fs::remove_file(&path).ok();

        assert_eq!(config.engine.tick_millis, 20);
        assert_eq!(config.engine.max_steps, Some(1000));
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = Config::builder()
            .config_path(Some(PathBuf::from("/nonexistent/tripwire.toml")))
            .build();
        assert!(result.is_err());
    }
}
