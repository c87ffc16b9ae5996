// src/simulation.rs - Driver: builds the nodes, replays the causal chain, collects the report
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::Instrument;
use uuid::Uuid;

use crate::clock::ClockDiscipline;
use crate::config::{Config, ConfigError, TopologyConfig};
use crate::error::SimError;
use crate::event_log::{DirectLog, EventLog, EventLogError, EventSink, LogMode, Snapshot};
use crate::message::NodeId;
use crate::node::Node;
use crate::report::Report;

/// Result of one run under one discipline.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: Report,
    /// Final clock of each node, indexed by node id.
    pub node_clocks: Vec<u64>,
    /// Per-node clock after each operation, indexed by node id.
    pub node_histories: Vec<Vec<u64>>,
}

/// Event log backing a single run.
enum ActiveLog {
    Channel(EventLog),
    Direct(Arc<DirectLog>),
}

impl ActiveLog {
    fn start(mode: LogMode) -> Self {
        match mode {
            LogMode::Channel => ActiveLog::Channel(EventLog::start()),
            LogMode::Direct => ActiveLog::Direct(Arc::new(DirectLog::new())),
        }
    }

    fn sink(&self) -> Arc<dyn EventSink> {
        match self {
            ActiveLog::Channel(log) => Arc::new(log.submitter()) as Arc<dyn EventSink>,
            ActiveLog::Direct(log) => log.clone() as Arc<dyn EventSink>,
        }
    }

    async fn finish(self) -> Result<Snapshot, EventLogError> {
        match self {
            ActiveLog::Channel(log) => log.shutdown().await,
            ActiveLog::Direct(log) => log.shutdown(),
        }
    }
}

/// Replays a fixed topology and chain of sends under a chosen discipline.
#[derive(Debug, Clone)]
pub struct Simulation {
    topology: TopologyConfig,
    log_mode: LogMode,
}

impl Simulation {
    pub fn new(topology: TopologyConfig, log_mode: LogMode) -> Result<Self, SimError> {
        if topology.node_count == 0 {
            return Err(ConfigError::Invalid("node_count must be > 0".to_string()).into());
        }
        if let Some(skew) = topology.skew.iter().find(|s| s.node.0 >= topology.node_count) {
            return Err(ConfigError::Invalid(format!("Clock skew targets unknown node {}", skew.node)).into());
        }
        Ok(Self { topology, log_mode })
    }

    pub fn from_config(config: &Config) -> Result<Self, SimError> {
        Self::new(config.topology.clone(), config.simulation.log_mode)
    }

    /// Three nodes, node 0 skewed to 10, chain 0 -> 2 -> 1 -> 0.
    pub fn canonical(log_mode: LogMode) -> Self {
        Self {
            topology: TopologyConfig::default(),
            log_mode,
        }
    }

    pub fn topology(&self) -> &TopologyConfig {
        &self.topology
    }

    pub fn log_mode(&self) -> LogMode {
        self.log_mode
    }

    /// Execute one complete run. Must be called from within a Tokio runtime.
    pub async fn run(&self, discipline: ClockDiscipline) -> Result<RunOutcome, SimError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("simulation", %run_id, %discipline, log_mode = %self.log_mode);
        self.execute(run_id, discipline).instrument(span).await
    }

    /// Run each discipline concurrently, each with its own log. Outcomes
    /// come back in the order given.
    pub async fn run_all(&self, disciplines: &[ClockDiscipline]) -> Result<Vec<RunOutcome>, SimError> {
        try_join_all(disciplines.iter().map(|d| self.run(*d))).await
    }

    async fn execute(&self, run_id: Uuid, discipline: ClockDiscipline) -> Result<RunOutcome, SimError> {
        tracing::info!(nodes = self.topology.node_count, sends = self.topology.sends.len(), "run starting");
        let log = ActiveLog::start(self.log_mode);
        let sink = log.sink();
        let mut nodes: Vec<Node> = (0..self.topology.node_count)
            .map(|i| Node::new(NodeId(i), discipline, sink.clone()))
            .collect();
        drop(sink);

        let mut initial = vec![0u64; nodes.len()];
        for skew in &self.topology.skew {
            nodes[skew.node.0].set_clock(skew.clock);
            initial[skew.node.0] = skew.clock;
        }

        let driven = self.drive(&mut nodes);
        // The log is shut down even when the chain aborted, so the consumer
        // task never outlives the run.
        let snapshot = log.finish().await;
        driven?;
        let snapshot = snapshot?;

        verify_histories(&nodes, &initial, discipline)?;
        let report = Report::new(run_id, discipline, snapshot);
        report.verify(self.topology.sends.len())?;
        tracing::info!(events = report.len(), "run complete");

        Ok(RunOutcome {
            report,
            node_clocks: nodes.iter().map(Node::clock).collect(),
            node_histories: nodes.iter().map(|n| n.history().to_vec()).collect(),
        })
    }

    /// Issue every send in order; each completes before the next starts.
    fn drive(&self, nodes: &mut [Node]) -> Result<(), SimError> {
        for (index, step) in self.topology.sends.iter().enumerate() {
            let absolute_id = index as u64 + 1;
            let (sender, receiver) = pair_mut(nodes, step.from, step.to)?;
            sender.send(receiver, absolute_id)?;
        }
        Ok(())
    }
}

/// Borrow a sender and a distinct receiver from the node table.
fn pair_mut(nodes: &mut [Node], from: NodeId, to: NodeId) -> Result<(&mut Node, &mut Node), SimError> {
    let node_count = nodes.len();
    if from == to || from.0 >= node_count || to.0 >= node_count {
        tracing::error!(%from, %to, node_count, "send outside the topology");
        return Err(SimError::Topology { from, to, node_count });
    }
    if from.0 < to.0 {
        let (left, right) = nodes.split_at_mut(to.0);
        Ok((&mut left[from.0], &mut right[0]))
    } else {
        let (left, right) = nodes.split_at_mut(from.0);
        Ok((&mut right[0], &mut left[to.0]))
    }
}

/// Clocks never go backwards; under `Simple` every operation adds exactly one.
fn verify_histories(nodes: &[Node], initial: &[u64], discipline: ClockDiscipline) -> Result<(), SimError> {
    for (node, start) in nodes.iter().zip(initial) {
        let mut previous = *start;
        for &clock in node.history() {
            let ok = match discipline {
                ClockDiscipline::Simple => clock == previous + 1,
                ClockDiscipline::Lamport => clock > previous,
            };
            if !ok {
                return Err(SimError::Invariant(format!(
                    "node {} clock went from {} to {} under {}",
                    node.id(),
                    previous,
                    clock,
                    discipline
                )));
            }
            previous = clock;
        }
    }
    Ok(())
}
