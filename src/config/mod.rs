//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::models::{PointStructure, ScoringSettings};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Scoring fallbacks for tournaments that carry no settings of their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_goal_differential_cap")]
    pub goal_differential_cap: i32,

    #[serde(default = "default_win_points")]
    pub win_points: i32,

    #[serde(default = "default_tie_points")]
    pub tie_points: i32,

    #[serde(default)]
    pub loss_points: i32,
}

fn default_goal_differential_cap() -> i32 {
    5
}

fn default_win_points() -> i32 {
    2
}

fn default_tie_points() -> i32 {
    1
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            goal_differential_cap: default_goal_differential_cap(),
            win_points: default_win_points(),
            tie_points: default_tie_points(),
            loss_points: 0,
        }
    }
}

impl From<&ScoringConfig> for ScoringSettings {
    fn from(config: &ScoringConfig) -> Self {
        Self {
            points: PointStructure {
                win_points: config.win_points,
                tie_points: config.tie_points,
                loss_points: config.loss_points,
            },
            goal_differential_cap: config.goal_differential_cap,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            server: ServerConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &PathBuf) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.scoring.goal_differential_cap < 0 {
            return Err(ConfigError::ValidationError(
                "Goal differential cap must not be negative".to_string(),
            ));
        }

        Ok(())
    }

    pub fn scoring_settings(&self) -> ScoringSettings {
        ScoringSettings::from(&self.scoring)
    }
}
