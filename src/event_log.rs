//! Append-only collection of delivery events.
//!
//! Two implementations share the [`EventSink`] contract:
//!
//! - [`EventLog`]: producers hand events to an unbounded intake channel and a
//!   single consumer task appends them. Shutdown drains whatever is still
//!   queued before the consumer exits, and the [`Snapshot`] is only handed out
//!   once the consumer task has been joined.
//! - [`DirectLog`]: synchronous append under a mutex, for single-threaded
//!   drivers.
//!
//! In both cases append order is delivery-completion order.

use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::message::Event;

#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("event log is closed; submission after shutdown")]
    Closed,
    #[error("event log consumer failed: {0}")]
    ConsumerFailed(String),
    #[error("event log was already shut down")]
    AlreadyShutDown,
    #[error("event log lock poisoned")]
    Poisoned,
}

/// Anything a node can hand delivery events to.
pub trait EventSink: Send + Sync {
    /// Hand over one event. Must not block on persistence.
    fn submit(&self, event: Event) -> Result<(), EventLogError>;
}

/// Which concurrency model backs the log for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogMode {
    #[default]
    Channel,
    Direct,
}

impl fmt::Display for LogMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogMode::Channel => f.write_str("channel"),
            LogMode::Direct => f.write_str("direct"),
        }
    }
}

impl FromStr for LogMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "channel" => Ok(LogMode::Channel),
            "direct" => Ok(LogMode::Direct),
            other => Err(format!("Invalid log mode '{}': expected 'channel' or 'direct'", other)),
        }
    }
}

/// Frozen contents of a log, in append order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    events: Vec<Event>,
}

impl Snapshot {
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

/// Cloneable producer handle onto an [`EventLog`]'s intake channel.
#[derive(Debug, Clone)]
pub struct EventSubmitter {
    intake: UnboundedSender<Event>,
}

impl EventSink for EventSubmitter {
    fn submit(&self, event: Event) -> Result<(), EventLogError> {
        tracing::debug!(
            absolute_id = event.message.absolute_id,
            receiver = %event.receiver_id,
            "submitting event"
        );
        self.intake.send(event).map_err(|_| {
            tracing::error!(absolute_id = event.message.absolute_id, "submission after event log shutdown");
            EventLogError::Closed
        })
    }
}

/// Channel-fed event log with one dedicated consumer task.
pub struct EventLog {
    submitter: EventSubmitter,
    shutdown_tx: oneshot::Sender<()>,
    consumer: JoinHandle<Vec<Event>>,
}

impl EventLog {
    /// Create the intake channel and spawn the consumer task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start() -> Self {
        let (intake_tx, intake_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let consumer = tokio::spawn(consume(intake_rx, shutdown_rx));
        Self {
            submitter: EventSubmitter { intake: intake_tx },
            shutdown_tx,
            consumer,
        }
    }

    pub fn submitter(&self) -> EventSubmitter {
        self.submitter.clone()
    }

    /// Signal shutdown and wait for the consumer to drain and exit.
    ///
    /// Consumes the log, so the snapshot can never be read while the
    /// consumer is still appending.
    pub async fn shutdown(self) -> Result<Snapshot, EventLogError> {
        tracing::debug!("signalling event log shutdown");
        // The consumer may already have exited if every sender was dropped.
        let _ = self.shutdown_tx.send(());
        drop(self.submitter);
        let events = self
            .consumer
            .await
            .map_err(|e| EventLogError::ConsumerFailed(e.to_string()))?;
        Ok(Snapshot { events })
    }
}

/// Consumer loop: append until shutdown is observed, then drain the intake.
async fn consume(mut intake: UnboundedReceiver<Event>, mut shutdown_rx: oneshot::Receiver<()>) -> Vec<Event> {
    let mut events = Vec::new();
    tracing::debug!("event log consumer started");
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                break;
            }
            received = intake.recv() => match received {
                Some(event) => {
                    tracing::debug!(absolute_id = event.message.absolute_id, "received event");
                    events.push(event);
                }
                None => break,
            }
        }
    }
    // Reject further submissions, but keep everything already queued.
    intake.close();
    let mut drained = 0usize;
    while let Some(event) = intake.recv().await {
        events.push(event);
        drained += 1;
    }
    tracing::debug!(total = events.len(), drained, "event log consumer done");
    events
}

/// Synchronous log: append happens inside `submit`.
#[derive(Debug)]
pub struct DirectLog {
    events: Mutex<Option<Vec<Event>>>,
}

impl DirectLog {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Some(Vec::new())),
        }
    }

    /// Freeze the log and take its contents.
    pub fn shutdown(&self) -> Result<Snapshot, EventLogError> {
        let mut guard = self.events.lock().map_err(|_| EventLogError::Poisoned)?;
        let events = guard.take().ok_or(EventLogError::AlreadyShutDown)?;
        Ok(Snapshot { events })
    }
}

impl Default for DirectLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for DirectLog {
    fn submit(&self, event: Event) -> Result<(), EventLogError> {
        let mut guard = self.events.lock().map_err(|_| EventLogError::Poisoned)?;
        match guard.as_mut() {
            Some(events) => {
                tracing::debug!(absolute_id = event.message.absolute_id, "appending event");
                events.push(event);
                Ok(())
            }
            None => {
                tracing::error!(absolute_id = event.message.absolute_id, "submission after event log shutdown");
                Err(EventLogError::Closed)
            }
        }
    }
}
