//! Scalar logical clocks and the two update disciplines.
//!
//! Both disciplines tick by one on every local operation. They differ only on
//! delivery: a [`ClockDiscipline::Lamport`] clock first catches up to the
//! sender's carried value, a [`ClockDiscipline::Simple`] clock ignores it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Clock-update rule applied by a node for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockDiscipline {
    Simple,
    Lamport,
}

impl ClockDiscipline {
    pub const ALL: [ClockDiscipline; 2] = [ClockDiscipline::Simple, ClockDiscipline::Lamport];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClockDiscipline::Simple => "simple",
            ClockDiscipline::Lamport => "lamport",
        }
    }
}

impl fmt::Display for ClockDiscipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClockDiscipline {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(ClockDiscipline::Simple),
            "lamport" => Ok(ClockDiscipline::Lamport),
            other => Err(SimError::UnknownDiscipline(other.to_string())),
        }
    }
}

/// A single scalar logical time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalClock {
    time: u64,
    discipline: ClockDiscipline,
}

impl LogicalClock {
    pub fn new(discipline: ClockDiscipline) -> Self {
        Self { time: 0, discipline }
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn discipline(&self) -> ClockDiscipline {
        self.discipline
    }

    /// Overwrite the current time. Only meaningful before any traffic.
    pub fn set(&mut self, time: u64) {
        self.time = time;
    }

    /// Advance by one for a local operation. Returns `None` on overflow.
    pub fn tick(&mut self) -> Option<u64> {
        self.time = self.time.checked_add(1)?;
        Some(self.time)
    }

    /// Apply the delivery rule for a message carrying `remote`.
    pub fn observe(&mut self, remote: u64) -> Option<u64> {
        if self.discipline == ClockDiscipline::Lamport {
            self.time = self.time.max(remote);
        }
        self.tick()
    }
}
