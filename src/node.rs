// src/node.rs - Simulated actor with a scalar logical clock
use std::sync::Arc;

use crate::clock::{ClockDiscipline, LogicalClock};
use crate::error::SimError;
use crate::event_log::EventSink;
use crate::message::{Event, Message, NodeId};

/// One actor in the simulation.
///
/// A node's clock is only ever mutated by its own `send` and `receive`;
/// callers must not drive the same node from two places at once.
pub struct Node {
    id: NodeId,
    clock: LogicalClock,
    log: Arc<dyn EventSink>,
    history: Vec<u64>,
}

impl Node {
    pub fn new(id: NodeId, discipline: ClockDiscipline, log: Arc<dyn EventSink>) -> Self {
        Self {
            id,
            clock: LogicalClock::new(discipline),
            log,
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn clock(&self) -> u64 {
        self.clock.time()
    }

    pub fn discipline(&self) -> ClockDiscipline {
        self.clock.discipline()
    }

    /// Clock value after each send/receive this node has performed.
    pub fn history(&self) -> &[u64] {
        &self.history
    }

    /// Preset the clock before any traffic, e.g. to model a skewed node.
    pub fn set_clock(&mut self, time: u64) {
        tracing::debug!(node = %self.id, time, "clock override");
        self.clock.set(time);
    }

    /// Tick, stamp a message with the new time and deliver it to `destination`.
    pub fn send(&mut self, destination: &mut Node, absolute_id: u64) -> Result<(), SimError> {
        let clock = self.clock.tick().ok_or(SimError::ClockOverflow { node: self.id })?;
        self.history.push(clock);
        let message = Message {
            absolute_id,
            clock,
            sender_id: self.id,
        };
        destination.receive(message)?;
        tracing::debug!(node = %self.id, to = %destination.id, absolute_id, clock, "sent");
        Ok(())
    }

    /// Apply the delivery rule and hand the resulting event to the log.
    pub fn receive(&mut self, message: Message) -> Result<(), SimError> {
        let before = self.clock.time();
        let clock = self
            .clock
            .observe(message.clock)
            .ok_or(SimError::ClockOverflow { node: self.id })?;
        if clock <= before {
            return Err(SimError::Invariant(format!(
                "node {} clock did not advance on receive ({} -> {})",
                self.id, before, clock
            )));
        }
        if self.discipline() == ClockDiscipline::Lamport && clock <= message.clock {
            return Err(SimError::Invariant(format!(
                "node {} clock {} does not exceed sender clock {}",
                self.id, clock, message.clock
            )));
        }
        self.history.push(clock);
        tracing::debug!(node = %self.id, absolute_id = message.absolute_id, clock, "delivered");
        self.log.submit(Event {
            clock,
            message,
            receiver_id: self.id,
        })?;
        Ok(())
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("clock", &self.clock)
            .field("history", &self.history)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log::DirectLog;

    fn pair(discipline: ClockDiscipline) -> (Arc<DirectLog>, Node, Node) {
        let log = Arc::new(DirectLog::new());
        let a = Node::new(NodeId(0), discipline, log.clone());
        let b = Node::new(NodeId(1), discipline, log.clone());
        (log, a, b)
    }

    #[test]
    fn test_send_ticks_before_stamping() {
        let (log, mut a, mut b) = pair(ClockDiscipline::Simple);
        a.set_clock(10);
        a.send(&mut b, 1).unwrap();
        assert_eq!(a.clock(), 11);
        let snapshot = log.shutdown().unwrap();
        assert_eq!(snapshot.events()[0].message.clock, 11);
        assert_eq!(snapshot.events()[0].receiver_id, NodeId(1));
    }

    #[test]
    fn test_simple_receive_ignores_sender_clock() {
        let (_log, mut a, mut b) = pair(ClockDiscipline::Simple);
        a.set_clock(10);
        a.send(&mut b, 1).unwrap();
        assert_eq!(b.clock(), 1);
        assert_eq!(b.history(), &[1]);
    }

    #[test]
    fn test_lamport_receive_exceeds_both_clocks() {
        let (_log, mut a, mut b) = pair(ClockDiscipline::Lamport);
        a.set_clock(10);
        b.set_clock(4);
        a.send(&mut b, 1).unwrap();
        assert_eq!(b.clock(), 12);
        b.set_clock(20);
        b.send(&mut a, 2).unwrap();
        // a was at 11, b sent 21
        assert_eq!(a.clock(), 22);
    }

    #[test]
    fn test_receive_after_log_shutdown_fails() {
        let (log, mut a, mut b) = pair(ClockDiscipline::Lamport);
        log.shutdown().unwrap();
        match a.send(&mut b, 1) {
            Err(SimError::EventLog(_)) => {}
            other => panic!("expected EventLog error, got {:?}", other),
        }
    }

    #[test]
    fn test_clock_overflow_is_reported() {
        let (_log, mut a, mut b) = pair(ClockDiscipline::Lamport);
        a.set_clock(u64::MAX);
        match a.send(&mut b, 1) {
            Err(SimError::ClockOverflow { node }) => assert_eq!(node, NodeId(0)),
            other => panic!("expected ClockOverflow, got {:?}", other),
        }
    }
}
