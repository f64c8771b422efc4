//! State Aggregator - the single owner of a run's mutable state.
//!
//! Every collaborator output (module transition, log, ledger or broadcast
//! entry) is folded into the run's [`SimulationState`] here, and each fold
//! returns the one [`WsMessage`] the publisher should deliver for it.
//! Metrics and elapsed duration are recomputed on every fold. The caller
//! (the run handle) serializes access; the aggregator itself is plain
//! single-threaded state.

use crate::core::time::Timestamp;
use crate::models::broadcast::Broadcast;
use crate::models::ledger::LedgerEntry;
use crate::models::log::LogEntry;
use crate::models::message::{CompletionSummary, WsMessage};
use crate::models::module::ModuleState;
use crate::models::scenario::ContractInfo;
use crate::models::state::{RunStatus, SimulationState};

/// Owns and folds the per-run aggregate.
#[derive(Debug)]
pub struct StateAggregator {
    state: SimulationState,
}

impl StateAggregator {
    pub fn new(state: SimulationState) -> Self {
        Self { state }
    }

    /// Append a log entry; returns the incremental message for it.
    pub fn fold_log(&mut self, entry: LogEntry) -> WsMessage {
        let ts = entry.timestamp;
        self.state.logs.push(entry.clone());
        self.state.recompute_metrics(ts);
        WsMessage::Log(entry)
    }

    /// Append a ledger entry; returns the incremental message for it.
    pub fn fold_ledger(&mut self, entry: LedgerEntry) -> WsMessage {
        let ts = entry.timestamp;
        self.state.ledger_entries.push(entry.clone());
        self.state.recompute_metrics(ts);
        WsMessage::Ledger(entry)
    }

    /// Append a broadcast; returns the incremental message for it.
    pub fn fold_broadcast(&mut self, broadcast: Broadcast) -> WsMessage {
        let ts = broadcast.timestamp;
        self.state.broadcasts.push(broadcast.clone());
        self.state.recompute_metrics(ts);
        WsMessage::Broadcast(broadcast)
    }

    /// Apply a transition to the named module and return the update message,
    /// or `None` if the module is not part of this run's pipeline.
    pub fn fold_module<F>(&mut self, name: &str, now: Timestamp, apply: F) -> Option<WsMessage>
    where
        F: FnOnce(&mut ModuleState),
    {
        let module = self.state.modules.iter_mut().find(|m| m.name == name)?;
        apply(module);
        let updated = module.clone();
        self.state.recompute_metrics(now);
        Some(WsMessage::ModuleUpdate(updated))
    }

    pub fn set_status(&mut self, status: RunStatus) {
        self.state.status = status;
    }

    pub fn status(&self) -> RunStatus {
        self.state.status
    }

    pub fn set_current_module(&mut self, name: Option<String>) {
        self.state.current_module = name;
    }

    pub fn set_contract_info(&mut self, info: ContractInfo) {
        self.state.contract_info = Some(info);
    }

    /// Read-only snapshot for the publisher and late joiners.
    pub fn snapshot(&self) -> SimulationState {
        self.state.clone()
    }

    /// Summary for the terminal `complete` message.
    pub fn completion(&self) -> CompletionSummary {
        CompletionSummary {
            run_id: self.state.run_id.clone(),
            scenario_id: self.state.scenario_id.clone(),
            status: self.state.status,
            metrics: self.state.metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::SimClock;
    use crate::models::broadcast::{AlertSeverity, BroadcastManager, BroadcastType};
    use crate::models::ledger::LedgerWriter;
    use crate::models::log::{EventEmitter, LogType};
    use crate::models::module::{default_pipeline, ModuleStatus};

    fn aggregator() -> StateAggregator {
        StateAggregator::new(SimulationState::new(
            "run_1".into(),
            "complete-success".into(),
            &default_pipeline(),
            0,
        ))
    }

    #[test]
    fn test_metrics_track_collection_sizes() {
        let mut agg = aggregator();
        let mut clock = SimClock::new();
        let mut emitter = EventEmitter::new();
        let mut ledger = LedgerWriter::new("run_1");
        let mut alerts = BroadcastManager::new();

        agg.fold_log(emitter.record(&mut clock, "orchestrator", "start".into(), LogType::Info, 0));
        agg.fold_ledger(ledger.append(&mut clock, "orchestrator", "run_started", "u", "c"));
        agg.fold_ledger(ledger.append(&mut clock, "safety_check", "validation_passed", "u", "c"));
        agg.fold_broadcast(alerts.emit(
            &mut clock,
            BroadcastType::Alert,
            AlertSeverity::High,
            "bad".into(),
        ));

        let snap = agg.snapshot();
        assert_eq!(snap.metrics.ledger_count, snap.ledger_entries.len());
        assert_eq!(snap.metrics.broadcast_count, snap.broadcasts.len());
        assert_eq!(snap.metrics.alert_count, 1);
        assert_eq!(snap.logs.len(), 1);
    }

    #[test]
    fn test_fold_module_returns_update_message() {
        let mut agg = aggregator();
        let msg = agg
            .fold_module("safety_check", 100, |m| {
                m.status = ModuleStatus::Active;
                m.start_time = Some(100);
            })
            .expect("known module");
        match msg {
            WsMessage::ModuleUpdate(m) => {
                assert_eq!(m.name, "safety_check");
                assert_eq!(m.status, ModuleStatus::Active);
                assert_eq!(m.start_time, Some(100));
            }
            other => panic!("expected moduleUpdate, got {}", other.message_type()),
        }
        assert_eq!(agg.snapshot().active_module_count(), 1);
    }

    #[test]
    fn test_fold_module_unknown_name_is_none() {
        let mut agg = aggregator();
        assert!(agg
            .fold_module("not_a_module", 0, |m| m.status = ModuleStatus::Active)
            .is_none());
    }

    #[test]
    fn test_snapshot_is_isolated_copy() {
        let mut agg = aggregator();
        let mut snap = agg.snapshot();
        snap.status = RunStatus::Failed;
        assert_eq!(agg.status(), RunStatus::Pending);
    }

    #[test]
    fn test_completion_reflects_state() {
        let mut agg = aggregator();
        agg.set_status(RunStatus::Success);
        let summary = agg.completion();
        assert_eq!(summary.status, RunStatus::Success);
        assert_eq!(summary.run_id, "run_1");
        assert_eq!(summary.scenario_id, "complete-success");
    }
}
