//! Run execution: one orchestrator owns one run and walks it through the
//! fixed validation pipeline.
//!
//! Execution is stepwise. [`Orchestrator::step`] performs exactly one phase
//! (run start, or one module's full lifecycle) and returns, which lets tests
//! observe and interfere with a run between module boundaries; production
//! callers use [`Orchestrator::run`], which loops `step` to completion on a
//! dedicated thread.
//!
//! # Critical Invariants
//!
//! - Every run terminates with exactly one `complete` message, including
//!   blocked and aborted runs.
//! - Module statuses only move forward: `pending -> active -> success|failed`
//!   or `pending -> skipped`. At most one module is active at a time.
//! - Ledger entries for a run always form a verifiable hash chain seeded by
//!   the run id, whatever the outcome.
//! - Abort is only honored at suspension points (module boundaries and the
//!   per-module delay), never mid-update.

use crate::models::broadcast::{AlertSeverity, BroadcastType};
use crate::models::log::LogType;
use crate::models::module::{ModuleSpec, ModuleStatus};
use crate::models::scenario::{Scenario, ScenarioKind, ScriptedOutcome};
use crate::models::state::RunStatus;
use crate::server::RunHandle;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Run lifecycle errors surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("unknown run: {0}")]
    UnknownRun(String),

    #[error("scenario {scenario} scripts a failure in {module}, which is not in the pipeline")]
    ScriptModuleUnknown { scenario: String, module: String },

    #[error("scenario {0} has a script inconsistent with its kind")]
    ScriptKindMismatch(String),
}

/// Reject scripts that cannot play out on the given pipeline: a failure in a
/// module the pipeline does not contain, an error scenario that would pass
/// every module, or a success scenario that scripts a failure.
pub fn validate_script(scenario: &Scenario, pipeline: &[ModuleSpec]) -> Result<(), EngineError> {
    match (&scenario.kind, &scenario.script) {
        (ScenarioKind::Success, ScriptedOutcome::AllPass) => Ok(()),
        (ScenarioKind::Success, _) | (ScenarioKind::Error, ScriptedOutcome::AllPass) => {
            Err(EngineError::ScriptKindMismatch(scenario.id.clone()))
        }
        (ScenarioKind::Error, ScriptedOutcome::FailAt { module, .. }) => {
            if pipeline.iter().any(|spec| spec.name == *module) {
                Ok(())
            } else {
                Err(EngineError::ScriptModuleUnknown {
                    scenario: scenario.id.clone(),
                    module: module.clone(),
                })
            }
        }
        (ScenarioKind::Error, ScriptedOutcome::BlockedBefore { .. }) => Ok(()),
    }
}

/// Where the orchestrator is in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    NotStarted,
    Module(usize),
    Done,
}

/// Outcome of one [`Orchestrator::step`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub done: bool,
    pub status: RunStatus,
    pub current_module: Option<String>,
}

/// Drives one run to completion.
#[derive(Debug)]
pub struct Orchestrator {
    scenario: Scenario,
    pipeline: Vec<ModuleSpec>,
    handle: Arc<RunHandle>,
    step_delay: Duration,
    phase: Phase,
}

impl Orchestrator {
    pub(crate) fn new(
        scenario: Scenario,
        pipeline: Vec<ModuleSpec>,
        handle: Arc<RunHandle>,
        step_delay: Duration,
    ) -> Self {
        Self {
            scenario,
            pipeline,
            handle,
            step_delay,
            phase: Phase::NotStarted,
        }
    }

    pub fn run_id(&self) -> &str {
        self.handle.run_id()
    }

    pub fn scenario_id(&self) -> &str {
        &self.scenario.id
    }

    /// Shared handle to the run this orchestrator drives.
    pub fn handle(&self) -> Arc<RunHandle> {
        Arc::clone(&self.handle)
    }

    /// Execute one phase of the run: starting it, or taking the next module
    /// through its full lifecycle. Idempotent once the run has finished.
    pub fn step(&mut self) -> StepResult {
        match self.phase {
            Phase::NotStarted => self.begin(),
            Phase::Module(index) => self.advance(index),
            Phase::Done => {}
        }
        let snapshot = self.handle.snapshot();
        StepResult {
            done: self.phase == Phase::Done,
            status: snapshot.status,
            current_module: snapshot.current_module,
        }
    }

    /// Run to completion and return the terminal status.
    pub fn run(mut self) -> RunStatus {
        loop {
            let result = self.step();
            if result.done {
                return result.status;
            }
        }
    }

    fn begin(&mut self) {
        let s = &self.scenario;
        self.handle.set_contract_info(s.contract_info());
        self.handle.set_status(RunStatus::Active);
        self.handle.record_log(
            "orchestrator",
            format!("Run started: {} ({})", s.name, s.id),
            LogType::Info,
            0,
        );
        self.handle.record_log(
            "orchestrator",
            format!(
                "Contract {} for part {} at station {}",
                s.contract_id, s.part_id, s.station_id
            ),
            LogType::Info,
            1,
        );
        self.handle
            .record_ledger("orchestrator", "run_started", &s.operator_id, &s.contract_id);
        self.handle.record_broadcast(
            BroadcastType::Info,
            AlertSeverity::Low,
            format!("Test started on Part {} by {}", s.part_id, s.operator_name),
        );

        if let ScriptedOutcome::BlockedBefore {
            reason,
            alert,
            severity,
        } = s.script.clone()
        {
            self.block(reason, alert, severity);
        } else {
            self.phase = Phase::Module(0);
        }
    }

    /// Blocked runs never reach the pipeline: every module is skipped and the
    /// run terminates before any validation work.
    fn block(&mut self, reason: String, alert: String, severity: AlertSeverity) {
        self.handle
            .record_log("orchestrator", reason, LogType::Error, 0);
        self.handle.record_ledger(
            "orchestrator",
            "run_blocked",
            &self.scenario.operator_id,
            &self.scenario.contract_id,
        );
        self.handle
            .record_broadcast(BroadcastType::Alert, severity, alert);
        self.skip_from(0);
        self.finish_run(RunStatus::Blocked);
    }

    fn advance(&mut self, index: usize) {
        if let Some(reason) = self.handle.abort_requested() {
            self.abort_at_boundary(index, reason);
            return;
        }

        let spec = self.pipeline[index].clone();
        self.activate(&spec);

        if !self.step_delay.is_zero() {
            thread::sleep(self.step_delay);
        }

        // The delay is a suspension point; an abort raised during it fails
        // the active module.
        if let Some(reason) = self.handle.abort_requested() {
            self.abort_while_active(index, &spec, reason);
            return;
        }

        match self.scenario.script.clone() {
            ScriptedOutcome::FailAt {
                module,
                reason,
                alert,
                severity,
            } if module == spec.name => self.fail(index, &spec, reason, alert, severity),
            _ => self.pass(index, &spec),
        }
    }

    fn activate(&self, spec: &ModuleSpec) {
        self.handle.set_current_module(Some(spec.name.clone()));
        self.handle.module_transition(&spec.name, |m, now| {
            m.status = ModuleStatus::Active;
            m.start_time = Some(now);
        });
        self.handle.record_log(
            &spec.name,
            format!("{} started", spec.display_name),
            LogType::Info,
            0,
        );
        for line in detail_lines(&self.scenario, spec) {
            self.handle.record_log(&spec.name, line, LogType::Info, 1);
        }
        self.handle.record_ledger(
            &spec.name,
            "validation_started",
            &self.scenario.operator_id,
            &self.scenario.contract_id,
        );
    }

    fn pass(&mut self, index: usize, spec: &ModuleSpec) {
        self.handle.module_transition(&spec.name, |m, now| {
            m.status = ModuleStatus::Success;
            m.end_time = Some(now);
        });
        self.handle.record_log(
            &spec.name,
            format!("{} passed", spec.display_name),
            LogType::Success,
            0,
        );
        self.handle.record_ledger(
            &spec.name,
            "validation_passed",
            &self.scenario.operator_id,
            &self.scenario.contract_id,
        );

        if index + 1 == self.pipeline.len() {
            self.finish_success();
        } else {
            self.phase = Phase::Module(index + 1);
        }
    }

    fn fail(
        &mut self,
        index: usize,
        spec: &ModuleSpec,
        reason: String,
        alert: String,
        severity: AlertSeverity,
    ) {
        self.handle.module_transition(&spec.name, |m, now| {
            m.status = ModuleStatus::Failed;
            m.end_time = Some(now);
        });
        self.handle
            .record_log(&spec.name, reason, LogType::Error, 0);
        self.handle.record_ledger(
            &spec.name,
            "validation_failed",
            &self.scenario.operator_id,
            &self.scenario.contract_id,
        );
        self.handle
            .record_broadcast(BroadcastType::Alert, severity, alert);
        if index + 1 < self.pipeline.len() {
            self.skip_from(index + 1);
            self.handle.record_log(
                "orchestrator",
                "Remaining modules skipped".to_string(),
                LogType::Warning,
                0,
            );
        }
        self.finish_run(RunStatus::Failed);
    }

    fn abort_at_boundary(&mut self, index: usize, reason: String) {
        self.handle.record_log(
            "orchestrator",
            format!("Run aborted: {}", reason),
            LogType::Warning,
            0,
        );
        self.record_abort_ledger();
        self.skip_from(index);
        self.finish_run(RunStatus::Failed);
    }

    fn abort_while_active(&mut self, index: usize, spec: &ModuleSpec, reason: String) {
        self.handle.module_transition(&spec.name, |m, now| {
            m.status = ModuleStatus::Failed;
            m.end_time = Some(now);
        });
        self.handle.record_log(
            "orchestrator",
            format!("Run aborted: {}", reason),
            LogType::Warning,
            0,
        );
        self.record_abort_ledger();
        self.skip_from(index + 1);
        self.finish_run(RunStatus::Failed);
    }

    fn record_abort_ledger(&self) {
        self.handle.record_ledger(
            "orchestrator",
            "run_aborted",
            &self.scenario.operator_id,
            &self.scenario.contract_id,
        );
    }

    fn finish_success(&mut self) {
        self.handle.record_log(
            "orchestrator",
            "All validation modules completed successfully".to_string(),
            LogType::Success,
            0,
        );
        self.handle.record_ledger(
            "orchestrator",
            "run_completed",
            &self.scenario.operator_id,
            &self.scenario.contract_id,
        );
        self.handle.record_broadcast(
            BroadcastType::Info,
            AlertSeverity::Low,
            format!(
                "Test completed on Part {}. Results validated.",
                self.scenario.part_id
            ),
        );
        self.finish_run(RunStatus::Success);
    }

    /// Shared tail of every terminal path.
    fn finish_run(&mut self, status: RunStatus) {
        self.handle.set_current_module(None);
        self.handle.set_status(status);
        self.handle.complete();
        self.phase = Phase::Done;
    }

    fn skip_from(&self, start: usize) {
        for spec in &self.pipeline[start..] {
            self.handle.module_transition(&spec.name, |m, _now| {
                m.status = ModuleStatus::Skipped;
            });
        }
    }
}

/// Per-module progress narration, indented under the module's start line.
fn detail_lines(scenario: &Scenario, spec: &ModuleSpec) -> Vec<String> {
    match spec.name.as_str() {
        "contract_validation" => vec![
            format!(
                "Verifying contract {} designation for {}",
                scenario.contract_id, scenario.station_id
            ),
            format!(
                "Checking authorization for operator {} ({})",
                scenario.operator_name, scenario.operator_id
            ),
        ],
        "part_verification" => vec![
            format!("Scanning QR code for part {}", scenario.part_id),
            "Dual-signature verification: AI analysis plus operator inspection".to_string(),
        ],
        "safety_check" => vec![
            "Checking station PPE detection systems".to_string(),
            "Checking environmental monitoring and ventilation".to_string(),
        ],
        "compliance_check" => vec![
            "Verifying pre-test requirement completion".to_string(),
            "Confirming operator acknowledgements".to_string(),
        ],
        "standards_check" => vec![
            "Validating ASTM E165 liquid penetrant standard".to_string(),
            "Validating ISO 9001 quality management requirements".to_string(),
        ],
        "qa_validation" => vec![
            "Verifying test procedure adherence".to_string(),
            "Checking results against acceptance parameters".to_string(),
        ],
        _ => vec![format!("Executing {} checks", spec.display_name)],
    }
}
