// src/error.rs - Error taxonomy for simulation runs
use thiserror::Error;

use crate::config::ConfigError;
use crate::event_log::EventLogError;
use crate::message::NodeId;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Topology error: send from node {from} to node {to} (node count {node_count})")]
    Topology {
        from: NodeId,
        to: NodeId,
        node_count: usize,
    },
    #[error("Unknown clock discipline: '{0}'")]
    UnknownDiscipline(String),
    #[error("Clock overflow on node {node}")]
    ClockOverflow { node: NodeId },
    #[error("Invariant violated: {0}")]
    Invariant(String),
    #[error("Event log error: {0}")]
    EventLog(#[from] EventLogError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
