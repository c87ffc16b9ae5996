//! # Simulation Configuration
//!
//! Every section and field is optional; an empty file yields the canonical
//! three-node scenario run under both disciplines.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [simulation]
//! disciplines = ["simple", "lamport"]
//! log_mode = "channel"
//!
//! [topology]
//! node_count = 3
//! skew = [{ node = 0, clock = 10 }]
//! sends = [{ from = 0, to = 2 }, { from = 2, to = 1 }, { from = 1, to = 0 }]
//!
//! [logging]
//! level = "error"
//! ```
//!
//! Absolute ids are assigned 1..=N in `sends` order.

// src/config.rs - Single configuration file
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::ClockDiscipline;
use crate::event_log::LogMode;
use crate::message::NodeId;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Main configuration struct for a demonstration run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub topology: TopologyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which disciplines to run and how events are collected.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    #[serde(default = "default_disciplines")]
    pub disciplines: Vec<ClockDiscipline>,
    #[serde(default)]
    pub log_mode: LogMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            disciplines: default_disciplines(),
            log_mode: LogMode::default(),
        }
    }
}

/// A clock override applied before any send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClockSkew {
    pub node: NodeId,
    pub clock: u64,
}

/// One step of the causal chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct SendStep {
    pub from: NodeId,
    pub to: NodeId,
}

/// Nodes, skews and the ordered chain of sends.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TopologyConfig {
    #[serde(default = "default_node_count")]
    pub node_count: usize,
    #[serde(default = "default_skew")]
    pub skew: Vec<ClockSkew>,
    #[serde(default = "default_sends")]
    pub sends: Vec<SendStep>,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            node_count: default_node_count(),
            skew: default_skew(),
            sends: default_sends(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_level() }
    }
}

impl LoggingConfig {
    pub fn max_level(&self) -> Result<tracing::Level, ConfigError> {
        self.level
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("Unknown log level '{}'", self.level)))
    }
}

impl Config {
    /// Reject settings that make a run meaningless. Sends naming unknown
    /// nodes are left to the driver, which reports them as topology errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.disciplines.is_empty() {
            return Err(ConfigError::Invalid("At least one clock discipline is required".to_string()));
        }
        if self.topology.node_count == 0 {
            return Err(ConfigError::Invalid("node_count must be > 0".to_string()));
        }
        for skew in &self.topology.skew {
            if skew.node.0 >= self.topology.node_count {
                return Err(ConfigError::Invalid(format!(
                    "Clock skew targets node {} but only {} nodes exist",
                    skew.node, self.topology.node_count
                )));
            }
        }
        self.logging.max_level()?;
        Ok(())
    }
}

// Default value functions
fn default_disciplines() -> Vec<ClockDiscipline> { ClockDiscipline::ALL.to_vec() }
fn default_node_count() -> usize { 3 }
fn default_skew() -> Vec<ClockSkew> { vec![ClockSkew { node: NodeId(0), clock: 10 }] }
fn default_sends() -> Vec<SendStep> {
    vec![
        SendStep { from: NodeId(0), to: NodeId(2) },
        SendStep { from: NodeId(2), to: NodeId(1) },
        SendStep { from: NodeId(1), to: NodeId(0) },
    ]
}
fn default_level() -> String { "error".to_string() }

/// Load configuration from a TOML file at the given path.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let config: Config = match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to parse config TOML: {}", e);
                return Err(ConfigError::Toml(e));
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            return Err(ConfigError::Io(e));
        }
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.simulation.disciplines, vec![ClockDiscipline::Simple, ClockDiscipline::Lamport]);
        assert_eq!(config.simulation.log_mode, LogMode::Channel);
        assert_eq!(config.topology.node_count, 3);
        assert_eq!(config.topology.skew, vec![ClockSkew { node: NodeId(0), clock: 10 }]);
        assert_eq!(config.topology.sends.len(), 3);
        assert_eq!(config.logging.max_level().unwrap(), tracing::Level::ERROR);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.topology, TopologyConfig::default());
    }

    #[test]
    fn test_load_config_success() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "[simulation]\ndisciplines = ['lamport']\nlog_mode = 'direct'").unwrap();
        file.flush().unwrap();
        let config = load_config(file_path.to_str().unwrap()).unwrap();
        assert_eq!(config.simulation.disciplines, vec![ClockDiscipline::Lamport]);
        assert_eq!(config.simulation.log_mode, LogMode::Direct);
        // Defaults for missing sections
        assert_eq!(config.topology.node_count, 3);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent_file.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_unknown_discipline_rejected() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "[simulation]\ndisciplines = ['vector']").unwrap();
        file.flush().unwrap();
        let result = load_config(file_path.to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_validate_rejects_bad_topology() {
        let mut config = Config::default();
        config.topology.skew.push(ClockSkew { node: NodeId(7), clock: 1 });
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.topology.node_count = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.simulation.disciplines.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }
}
