//! Per-run aggregate state.
//!
//! One [`SimulationState`] exists per run, owned exclusively by that run's
//! State Aggregator and destroyed when the run is discarded. It is the
//! authoritative snapshot streamed to observers: module statuses, the three
//! append-only streams, derived metrics and the overall status.
//!
//! # Critical Invariants
//!
//! 1. At most one module has status `active` at any instant
//! 2. `metrics.ledger_count == ledger_entries.len()`
//! 3. `metrics.broadcast_count == broadcasts.len()`
//! 4. `metrics.alert_count == broadcasts with type == alert`

use crate::core::time::Timestamp;
use crate::models::broadcast::{Broadcast, BroadcastType};
use crate::models::ledger::LedgerEntry;
use crate::models::log::LogEntry;
use crate::models::module::{ModuleSpec, ModuleState};
use crate::models::scenario::ContractInfo;
use serde::{Deserialize, Serialize};

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Active,
    Success,
    Failed,
    /// Halted by a precondition outside the module sequence, before any
    /// module ran. Treated as "failed before start".
    Blocked,
}

impl RunStatus {
    /// No further module transitions occur after a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Success | RunStatus::Failed | RunStatus::Blocked)
    }
}

/// Derived counters, recomputed on every state fold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub ledger_count: usize,
    pub broadcast_count: usize,
    /// Broadcasts with `type == alert`, regardless of severity.
    pub alert_count: usize,
    /// Elapsed milliseconds since run start.
    pub duration: u64,
}

/// Complete aggregate state for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationState {
    pub run_id: String,
    pub scenario_id: String,
    pub status: RunStatus,
    pub current_module: Option<String>,
    pub modules: Vec<ModuleState>,
    pub logs: Vec<LogEntry>,
    pub ledger_entries: Vec<LedgerEntry>,
    pub broadcasts: Vec<Broadcast>,
    pub metrics: Metrics,
    pub contract_info: Option<ContractInfo>,
    pub started_at: Timestamp,
}

impl SimulationState {
    /// Fresh `pending` state with every pipeline module `pending`.
    pub fn new(
        run_id: String,
        scenario_id: String,
        pipeline: &[ModuleSpec],
        started_at: Timestamp,
    ) -> Self {
        Self {
            run_id,
            scenario_id,
            status: RunStatus::Pending,
            current_module: None,
            modules: pipeline.iter().map(ModuleState::new).collect(),
            logs: Vec::new(),
            ledger_entries: Vec::new(),
            broadcasts: Vec::new(),
            metrics: Metrics::default(),
            contract_info: None,
            started_at,
        }
    }

    /// Recompute the derived counters from the collections.
    pub fn recompute_metrics(&mut self, now: Timestamp) {
        self.metrics.ledger_count = self.ledger_entries.len();
        self.metrics.broadcast_count = self.broadcasts.len();
        self.metrics.alert_count = self
            .broadcasts
            .iter()
            .filter(|b| b.kind == BroadcastType::Alert)
            .count();
        self.metrics.duration = self.metrics.duration.max(now.saturating_sub(self.started_at));
    }

    /// Number of modules currently `active` (invariant: 0 or 1).
    pub fn active_module_count(&self) -> usize {
        self.modules
            .iter()
            .filter(|m| m.status == crate::models::module::ModuleStatus::Active)
            .count()
    }
}
