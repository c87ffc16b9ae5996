// src/message.rs - Messages exchanged between nodes and the delivery events they produce
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable node identity, assigned at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One unit of causal communication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Global send sequence number; used only to order the final report.
    pub absolute_id: u64,
    /// Sender's clock at the instant of send.
    pub clock: u64,
    pub sender_id: NodeId,
}

/// Record of one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Receiver's clock at the instant of delivery.
    pub clock: u64,
    pub message: Message,
    pub receiver_id: NodeId,
}

impl Event {
    pub fn absolute_id(&self) -> u64 {
        self.message.absolute_id
    }
}
