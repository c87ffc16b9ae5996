// causal_clocks: simple and Lamport logical clocks over a simulated causal chain

pub mod clock;
pub mod config;
pub mod error;
pub mod event_log;
pub mod message;
pub mod node;
pub mod report;
pub mod simulation;

pub use clock::{ClockDiscipline, LogicalClock};
pub use config::{load_config, Config};
pub use error::SimError;
pub use event_log::{DirectLog, EventLog, EventLogError, EventSink, EventSubmitter, LogMode, Snapshot};
pub use message::{Event, Message, NodeId};
pub use node::Node;
pub use report::Report;
pub use simulation::{RunOutcome, Simulation};
