//! Multi-run arena and per-run handles.
//!
//! [`SimulationServer`] owns a table of concurrently active runs keyed by
//! run id; runs are fully isolated from one another. Each run's mutable
//! machinery lives inside a [`RunHandle`]: one mutex guards the clock, the
//! three entry writers, the state aggregator and the publisher, giving every
//! run a single serialized update path. Publishing is a non-blocking enqueue
//! performed inside that path; delivery happens on the subscribers' side.
//!
//! Aborting a run only raises a flag — the orchestrator notices it at its
//! next suspension point and winds the run down with a complete, verifiable
//! ledger.

use crate::aggregator::StateAggregator;
use crate::core::time::{SimClock, Timestamp};
use crate::models::broadcast::{AlertSeverity, BroadcastManager, BroadcastType};
use crate::models::ledger::LedgerWriter;
use crate::models::log::{EventEmitter, LogType};
use crate::models::message::WsMessage;
use crate::models::module::{default_pipeline, ModuleSpec, ModuleState};
use crate::models::scenario::ContractInfo;
use crate::models::state::{RunStatus, SimulationState};
use crate::orchestrator::{validate_script, EngineError, Orchestrator};
use crate::publisher::{Publisher, Subscription};
use crate::registry::ScenarioRegistry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use uuid::Uuid;

/// Everything behind a run's single update path.
#[derive(Debug)]
struct RunCore {
    clock: SimClock,
    emitter: EventEmitter,
    ledger: LedgerWriter,
    alerts: BroadcastManager,
    aggregator: StateAggregator,
    publisher: Publisher,
}

/// Shared handle to one run's state machinery.
#[derive(Debug)]
pub struct RunHandle {
    run_id: String,
    core: Mutex<RunCore>,
    abort: Mutex<Option<String>>,
}

impl RunHandle {
    /// Create the aggregate for a fresh run. The ledger chain is seeded with
    /// the run id.
    pub fn new(run_id: String, scenario_id: &str, pipeline: &[ModuleSpec]) -> Self {
        let mut clock = SimClock::new();
        let started_at = clock.now();
        let state = SimulationState::new(
            run_id.clone(),
            scenario_id.to_string(),
            pipeline,
            started_at,
        );
        Self {
            core: Mutex::new(RunCore {
                clock,
                emitter: EventEmitter::new(),
                ledger: LedgerWriter::new(&run_id),
                alerts: BroadcastManager::new(),
                aggregator: StateAggregator::new(state),
                publisher: Publisher::new(),
            }),
            run_id,
            abort: Mutex::new(None),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    // The operations behind the lock are infallible, so a poisoned mutex can
    // only hold consistent state; recover it instead of propagating panics.
    fn core(&self) -> MutexGuard<'_, RunCore> {
        match self.core.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Subscribe to the run's message stream. The catch-up snapshot (plus
    /// `complete` if the run already finished) is delivered before any
    /// future incremental message.
    pub fn subscribe(&self) -> Subscription {
        let mut core = self.core();
        let core = &mut *core;
        let snapshot = core.aggregator.snapshot();
        let mut catchup = vec![WsMessage::State(snapshot)];
        if core.aggregator.status().is_terminal() {
            catchup.push(WsMessage::Complete(core.aggregator.completion()));
        }
        core.publisher.attach(catchup)
    }

    /// Read-only copy of the current aggregate.
    pub fn snapshot(&self) -> SimulationState {
        self.core().aggregator.snapshot()
    }

    pub fn status(&self) -> RunStatus {
        self.core().aggregator.status()
    }

    /// Request the run stop at its next suspension point.
    pub fn request_abort(&self, reason: &str) {
        let mut abort = match self.abort.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        abort.get_or_insert_with(|| reason.to_string());
    }

    /// Pending abort reason, if any.
    pub fn abort_requested(&self) -> Option<String> {
        match self.abort.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub(crate) fn record_log(&self, module: &str, message: String, kind: LogType, indent: u8) {
        let mut core = self.core();
        let core = &mut *core;
        let entry = core
            .emitter
            .record(&mut core.clock, module, message, kind, indent);
        let msg = core.aggregator.fold_log(entry);
        core.publisher.publish(msg);
    }

    pub(crate) fn record_ledger(&self, module: &str, action: &str, smart_id: &str, contract_id: &str) {
        let mut core = self.core();
        let core = &mut *core;
        let entry = core
            .ledger
            .append(&mut core.clock, module, action, smart_id, contract_id);
        let msg = core.aggregator.fold_ledger(entry);
        core.publisher.publish(msg);
    }

    pub(crate) fn record_broadcast(
        &self,
        kind: BroadcastType,
        severity: AlertSeverity,
        message: String,
    ) {
        let mut core = self.core();
        let core = &mut *core;
        let broadcast = core.alerts.emit(&mut core.clock, kind, severity, message);
        let msg = core.aggregator.fold_broadcast(broadcast);
        core.publisher.publish(msg);
    }

    pub(crate) fn module_transition<F>(&self, name: &str, apply: F)
    where
        F: FnOnce(&mut ModuleState, Timestamp),
    {
        let mut core = self.core();
        let core = &mut *core;
        let now = core.clock.now();
        if let Some(msg) = core.aggregator.fold_module(name, now, |m| apply(m, now)) {
            core.publisher.publish(msg);
        }
    }

    pub(crate) fn set_status(&self, status: RunStatus) {
        self.core().aggregator.set_status(status);
    }

    pub(crate) fn set_current_module(&self, name: Option<String>) {
        self.core().aggregator.set_current_module(name);
    }

    pub(crate) fn set_contract_info(&self, info: ContractInfo) {
        self.core().aggregator.set_contract_info(info);
    }

    /// Publish the terminal `complete` message and close the stream.
    pub(crate) fn complete(&self) {
        let mut core = self.core();
        let core = &mut *core;
        let summary = core.aggregator.completion();
        core.publisher.publish(WsMessage::Complete(summary));
        core.publisher.close();
    }
}

/// Engine-wide configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Simulated per-module processing delay (the run's suspension point).
    /// Zero makes runs settle immediately, which tests rely on.
    pub step_delay: Duration,
}

/// Arena of concurrently active runs.
#[derive(Debug)]
pub struct SimulationServer {
    registry: Arc<ScenarioRegistry>,
    pipeline: Vec<ModuleSpec>,
    config: ServerConfig,
    runs: Mutex<HashMap<String, Arc<RunHandle>>>,
}

impl SimulationServer {
    /// Server over the fixed default pipeline.
    pub fn new(registry: ScenarioRegistry, config: ServerConfig) -> Self {
        Self::with_pipeline(registry, default_pipeline(), config)
    }

    /// Server over a custom pipeline (tests and property checks).
    pub fn with_pipeline(
        registry: ScenarioRegistry,
        pipeline: Vec<ModuleSpec>,
        config: ServerConfig,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            pipeline,
            config,
            runs: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &ScenarioRegistry {
        &self.registry
    }

    fn runs(&self) -> MutexGuard<'_, HashMap<String, Arc<RunHandle>>> {
        match self.runs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Validate a run request and create the run without executing it.
    /// Unknown scenarios and malformed scripts fail here, before any state
    /// exists.
    pub fn create_run(&self, scenario_id: &str) -> Result<Orchestrator, EngineError> {
        let scenario = self
            .registry
            .get(scenario_id)
            .ok_or_else(|| EngineError::UnknownScenario(scenario_id.to_string()))?;
        validate_script(scenario, &self.pipeline)?;

        let run_id = format!("run_{}", Uuid::new_v4().simple());
        let handle = Arc::new(RunHandle::new(run_id.clone(), scenario_id, &self.pipeline));
        self.runs().insert(run_id, Arc::clone(&handle));

        Ok(Orchestrator::new(
            scenario.clone(),
            self.pipeline.clone(),
            handle,
            self.config.step_delay,
        ))
    }

    /// Accept a run request and execute it on its own thread.
    pub fn start_run(&self, scenario_id: &str) -> Result<String, EngineError> {
        let orchestrator = self.create_run(scenario_id)?;
        let run_id = orchestrator.run_id().to_string();
        thread::spawn(move || {
            orchestrator.run();
        });
        Ok(run_id)
    }

    fn get(&self, run_id: &str) -> Result<Arc<RunHandle>, EngineError> {
        self.runs()
            .get(run_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownRun(run_id.to_string()))
    }

    /// Subscribe to a run's message stream.
    pub fn subscribe(&self, run_id: &str) -> Result<Subscription, EngineError> {
        Ok(self.get(run_id)?.subscribe())
    }

    /// Read-only snapshot of a run.
    pub fn snapshot(&self, run_id: &str) -> Result<SimulationState, EngineError> {
        Ok(self.get(run_id)?.snapshot())
    }

    /// Request a run abort; takes effect at the run's next suspension point.
    pub fn abort_run(&self, run_id: &str, reason: &str) -> Result<(), EngineError> {
        self.get(run_id)?.request_abort(reason);
        Ok(())
    }

    /// Destroy a run's aggregate. Subscribers keep whatever was already
    /// delivered; nothing further arrives.
    pub fn discard_run(&self, run_id: &str) -> Result<(), EngineError> {
        self.runs()
            .remove(run_id)
            .map(|_| ())
            .ok_or_else(|| EngineError::UnknownRun(run_id.to_string()))
    }

    /// Ids of runs currently held in the arena.
    pub fn run_ids(&self) -> Vec<String> {
        self.runs().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_scenario_creates_no_run() {
        let server = SimulationServer::new(ScenarioRegistry::builtin(), ServerConfig::default());
        let err = server.create_run("no-such-scenario").expect_err("must fail");
        assert_eq!(err, EngineError::UnknownScenario("no-such-scenario".into()));
        assert!(server.run_ids().is_empty());
    }

    #[test]
    fn test_runs_are_isolated() {
        let server = SimulationServer::new(ScenarioRegistry::builtin(), ServerConfig::default());
        let a = server.create_run("complete-success").expect("run a");
        let b = server.create_run("wrong-contract-type").expect("run b");
        let id_a = a.run_id().to_string();
        let id_b = b.run_id().to_string();
        assert_ne!(id_a, id_b);

        a.run();
        b.run();
        let snap_a = server.snapshot(&id_a).expect("snapshot a");
        let snap_b = server.snapshot(&id_b).expect("snapshot b");
        assert_eq!(snap_a.status, RunStatus::Success);
        assert_eq!(snap_b.status, RunStatus::Failed);
        assert_eq!(snap_a.scenario_id, "complete-success");
        assert_eq!(snap_b.scenario_id, "wrong-contract-type");
    }

    #[test]
    fn test_discard_destroys_the_aggregate() {
        let server = SimulationServer::new(ScenarioRegistry::builtin(), ServerConfig::default());
        let orchestrator = server.create_run("complete-success").expect("create");
        let run_id = orchestrator.run_id().to_string();
        orchestrator.run();

        server.discard_run(&run_id).expect("discard");
        assert_eq!(
            server.snapshot(&run_id),
            Err(EngineError::UnknownRun(run_id.clone()))
        );
        assert_eq!(
            server.discard_run(&run_id),
            Err(EngineError::UnknownRun(run_id))
        );
    }

    #[test]
    fn test_abort_unknown_run() {
        let server = SimulationServer::new(ScenarioRegistry::builtin(), ServerConfig::default());
        assert_eq!(
            server.abort_run("run_missing", "test"),
            Err(EngineError::UnknownRun("run_missing".into()))
        );
    }

    #[test]
    fn test_first_abort_reason_wins() {
        let handle = RunHandle::new("run_1".into(), "s", &default_pipeline());
        handle.request_abort("first");
        handle.request_abort("second");
        assert_eq!(handle.abort_requested().as_deref(), Some("first"));
    }
}
