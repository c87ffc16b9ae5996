//! Final, ordered view of one simulation run.
//!
//! A [`Report`] is built from a frozen [`Snapshot`] by sorting on the
//! message's absolute id, which makes the output independent of how the
//! log happened to interleave appends.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::clock::ClockDiscipline;
use crate::error::SimError;
use crate::event_log::Snapshot;
use crate::message::Event;

const HEADERS: [&str; 5] = ["AbsoluteId", "SenderId", "ReceiverId", "SenderClock", "ReceiverClock"];

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub run_id: Uuid,
    pub discipline: ClockDiscipline,
    pub generated_at: DateTime<Utc>,
    pub events: Vec<Event>,
}

impl Report {
    pub fn new(run_id: Uuid, discipline: ClockDiscipline, snapshot: Snapshot) -> Self {
        let mut events = snapshot.into_events();
        sort_by_absolute_id(&mut events);
        Self {
            run_id,
            discipline,
            generated_at: Utc::now(),
            events,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// `(absolute_id, sender, sender clock, receiver clock)` per row.
    pub fn rows(&self) -> Vec<(u64, usize, u64, u64)> {
        self.events
            .iter()
            .map(|e| (e.message.absolute_id, e.message.sender_id.0, e.message.clock, e.clock))
            .collect()
    }

    /// Whether every delivery carries a receiver clock above the sender's.
    pub fn causally_consistent(&self) -> bool {
        self.events.iter().all(|e| e.clock > e.message.clock)
    }

    /// Check the run-level invariants against the number of receives issued.
    pub fn verify(&self, expected_receives: usize) -> Result<(), SimError> {
        if self.events.len() != expected_receives {
            return Err(SimError::Invariant(format!(
                "event log holds {} events, expected {}",
                self.events.len(),
                expected_receives
            )));
        }
        let mut seen = HashSet::with_capacity(self.events.len());
        for event in &self.events {
            if !seen.insert(event.message.absolute_id) {
                return Err(SimError::Invariant(format!(
                    "duplicate absolute id {}",
                    event.message.absolute_id
                )));
            }
        }
        if !self.events.windows(2).all(|w| w[0].message.absolute_id < w[1].message.absolute_id) {
            return Err(SimError::Invariant("report is not sorted by absolute id".to_string()));
        }
        if self.discipline == ClockDiscipline::Lamport && !self.causally_consistent() {
            return Err(SimError::Invariant(
                "lamport report has a receiver clock not above its sender clock".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Stable sort on absolute id; idempotent.
pub fn sort_by_absolute_id(events: &mut [Event]) {
    events.sort_by_key(Event::absolute_id);
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<[String; 5]> = self
            .events
            .iter()
            .map(|e| {
                [
                    e.message.absolute_id.to_string(),
                    e.message.sender_id.to_string(),
                    e.receiver_id.to_string(),
                    e.message.clock.to_string(),
                    e.clock.to_string(),
                ]
            })
            .collect();
        let mut widths = HEADERS.map(str::len);
        for row in &cells {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.len());
            }
        }
        write_row(f, &HEADERS, &widths)?;
        for row in &cells {
            write_row(f, row, &widths)?;
        }
        writeln!(f, "Discipline: {}", self.discipline)?;
        write!(f, "---")
    }
}

fn write_row<S: AsRef<str>>(f: &mut fmt::Formatter<'_>, cells: &[S], widths: &[usize]) -> fmt::Result {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell.as_ref(), width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(f, "{}", line.trim_end())
}
