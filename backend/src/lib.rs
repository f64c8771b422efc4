//! Scenario simulation engine for manufacturing test-station validation.
//!
//! The engine replays named scenarios through a fixed six-module validation
//! pipeline and exposes everything a monitoring frontend needs: ordered
//! progress logs, a hash-chained audit ledger, operator broadcasts and a
//! continuously folded run state, all delivered over per-subscriber message
//! streams.
//!
//! # Architecture
//!
//! - [`registry`]: static catalog of scenarios and their scripted outcomes
//! - [`orchestrator`]: drives one run through the pipeline, stepwise
//! - [`models`]: domain types - modules, logs, ledger, broadcasts, run state,
//!   wire messages
//! - [`aggregator`]: folds collaborator output into the per-run aggregate
//! - [`publisher`]: per-run fan-out with snapshot catch-up for late joiners
//! - [`server`]: multi-run arena, run handles and abort plumbing
//! - [`core`]: simulation clock
//!
//! # Example
//!
//! ```
//! use scenario_simulator_core_rs::{
//!     RunStatus, ScenarioRegistry, ServerConfig, SimulationServer,
//! };
//!
//! let server = SimulationServer::new(ScenarioRegistry::builtin(), ServerConfig::default());
//! let orchestrator = server.create_run("complete-success").unwrap();
//! let run_id = orchestrator.run_id().to_string();
//! let subscription = server.subscribe(&run_id).unwrap();
//!
//! assert_eq!(orchestrator.run(), RunStatus::Success);
//! let messages = subscription.drain();
//! assert_eq!(messages.last().unwrap().message_type(), "complete");
//! ```

pub mod aggregator;
pub mod core;
pub mod models;
pub mod orchestrator;
pub mod publisher;
pub mod registry;
pub mod server;

pub use aggregator::StateAggregator;
pub use crate::core::time::{SimClock, Timestamp};
pub use models::{
    compute_signature, default_pipeline, verify_chain, AlertSeverity, Broadcast, BroadcastManager,
    BroadcastType, CompletionSummary, ContractInfo, EventEmitter, IntegrityError, LedgerEntry,
    LedgerWriter, LogEntry, LogType, Metrics, ModuleSpec, ModuleState, ModuleStatus, RunStatus,
    Scenario, ScenarioKind, ScriptedOutcome, SimulationState, WsMessage,
};
pub use orchestrator::{validate_script, EngineError, Orchestrator, StepResult};
pub use publisher::{Publisher, Subscription};
pub use registry::ScenarioRegistry;
pub use server::{RunHandle, ServerConfig, SimulationServer};
