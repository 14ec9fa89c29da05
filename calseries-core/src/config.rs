//! Global calseries configuration.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_OCCURRENCES, HARD_SAFETY_CAP};
use crate::error::{CalSeriesError, CalSeriesResult};
use crate::recurrence::{MonthOverflow, SequenceLimits};

static DEFAULT_STORE_PATH: &str = "~/.local/share/calseries/events.json";
static DEFAULT_LOG_LEVEL: &str = "warn";
static ENV_PREFIX: &str = "CALSERIES";

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_max_occurrences() -> usize {
    DEFAULT_MAX_OCCURRENCES
}

fn default_hard_safety_cap() -> usize {
    HARD_SAFETY_CAP
}

/// Configuration at ~/.config/calseries/config.toml, overridable through
/// `CALSERIES_*` environment variables (`CALSERIES_GENERATOR__MAX_OCCURRENCES`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalseriesConfig {
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// Bounds for rule expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_max_occurrences")]
    pub max_occurrences: usize,

    #[serde(default = "default_hard_safety_cap")]
    pub hard_safety_cap: usize,

    #[serde(default)]
    pub month_overflow: MonthOverflow,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
            hard_safety_cap: HARD_SAFETY_CAP,
            month_overflow: MonthOverflow::default(),
        }
    }
}

impl From<&GeneratorConfig> for SequenceLimits {
    fn from(config: &GeneratorConfig) -> Self {
        SequenceLimits {
            max_occurrences: config.max_occurrences,
            hard_safety_cap: config.hard_safety_cap,
            month_overflow: config.month_overflow,
        }
    }
}

impl Default for CalseriesConfig {
    fn default() -> Self {
        CalseriesConfig {
            store_path: default_store_path(),
            log_level: default_log_level(),
            generator: GeneratorConfig::default(),
        }
    }
}

impl CalseriesConfig {
    pub fn config_path() -> CalSeriesResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalSeriesError::Config("Could not determine config directory".into()))?
            .join("calseries");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file, creating a commented-out default on first run.
    pub fn load() -> CalSeriesResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load from an explicit file (which may be missing) plus the environment.
    pub fn load_from(path: &Path) -> CalSeriesResult<Self> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| CalSeriesError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalSeriesError::Config(e.to_string()))
    }

    /// Store path with `~` expanded.
    pub fn store_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.store_path.to_string_lossy()).into_owned();
        PathBuf::from(full_path_str)
    }

    pub fn sequence_limits(&self) -> SequenceLimits {
        SequenceLimits::from(&self.generator)
    }

    /// Write a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CalSeriesResult<()> {
        let contents = format!(
            "\
# calseries configuration

# Where events are stored:
# store_path = \"{}\"

# Log level (error, warn, info, debug, trace); RUST_LOG takes precedence:
# log_level = \"{}\"

# [generator]
# Occurrences generated for rules that never end:
# max_occurrences = {}
# Hard limit for any rule:
# hard_safety_cap = {}
# Day 31 in a 30-day month: \"clamp\" to the last day or \"roll_over\" into the next month:
# month_overflow = \"clamp\"
",
            DEFAULT_STORE_PATH, DEFAULT_LOG_LEVEL, DEFAULT_MAX_OCCURRENCES, HARD_SAFETY_CAP
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalSeriesError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalSeriesError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
