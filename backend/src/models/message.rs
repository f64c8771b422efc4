//! Real-time wire envelope.
//!
//! Each state mutation is published to subscribers as exactly one
//! [`WsMessage`]. The envelope is a tagged union: the `type` tag statically
//! determines the shape of `data`, so consumers never inspect payloads at
//! runtime. On the wire this serializes as
//! `{"type": "moduleUpdate", "data": { ... }}`.

use crate::models::broadcast::Broadcast;
use crate::models::ledger::LedgerEntry;
use crate::models::log::LogEntry;
use crate::models::module::ModuleState;
use crate::models::state::{Metrics, RunStatus, SimulationState};
use serde::{Deserialize, Serialize};

/// Final summary delivered as the last message of a run's stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSummary {
    pub run_id: String,
    pub scenario_id: String,
    pub status: RunStatus,
    pub metrics: Metrics,
}

/// Typed message envelope streamed to run subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum WsMessage {
    /// Full current snapshot; always the first message a subscriber sees.
    State(SimulationState),
    Log(LogEntry),
    Ledger(LedgerEntry),
    Broadcast(Broadcast),
    ModuleUpdate(ModuleState),
    /// Terminal message; the stream closes after it.
    Complete(CompletionSummary),
}

impl WsMessage {
    /// Wire tag of this message.
    pub fn message_type(&self) -> &'static str {
        match self {
            WsMessage::State(_) => "state",
            WsMessage::Log(_) => "log",
            WsMessage::Ledger(_) => "ledger",
            WsMessage::Broadcast(_) => "broadcast",
            WsMessage::ModuleUpdate(_) => "moduleUpdate",
            WsMessage::Complete(_) => "complete",
        }
    }
}
