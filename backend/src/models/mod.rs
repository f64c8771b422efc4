//! Domain models for the scenario simulator

pub mod broadcast;
pub mod ledger;
pub mod log;
pub mod message;
pub mod module;
pub mod scenario;
pub mod state;

// Re-exports
pub use broadcast::{AlertSeverity, Broadcast, BroadcastManager, BroadcastType};
pub use ledger::{compute_signature, verify_chain, IntegrityError, LedgerEntry, LedgerWriter};
pub use log::{EventEmitter, LogEntry, LogType};
pub use message::{CompletionSummary, WsMessage};
pub use module::{default_pipeline, ModuleSpec, ModuleState, ModuleStatus};
pub use scenario::{ContractInfo, Scenario, ScenarioKind, ScriptedOutcome};
pub use state::{Metrics, RunStatus, SimulationState};
