//! Test scenario descriptors.
//!
//! A [`Scenario`] is an immutable description of one scripted test run:
//! which manufacturing contract, part, operator and station it exercises,
//! and the outcome the scenario is designed to demonstrate. Scenarios are
//! defined at process start and never mutated.

use crate::models::broadcast::AlertSeverity;
use serde::{Deserialize, Serialize};

/// Whether a scenario demonstrates a clean pass or an injected failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    Success,
    Error,
}

/// Contract/operator snapshot carried into the run state for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInfo {
    pub contract_id: String,
    pub part_id: String,
    pub operator_name: String,
    pub operator_id: String,
    pub station_id: String,
}

/// The predetermined outcome a scenario exercises.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedOutcome {
    /// Every module completes successfully.
    AllPass,
    /// The named module fails; all later modules are skipped.
    FailAt {
        module: String,
        /// Human-readable failure explanation, logged by the failing module.
        reason: String,
        /// Alert broadcast text.
        alert: String,
        severity: AlertSeverity,
    },
    /// A precondition outside the module sequence fails before any module
    /// can run; the run terminates `blocked` with every module skipped.
    BlockedBefore {
        reason: String,
        alert: String,
        severity: AlertSeverity,
    },
}

/// Immutable scenario descriptor. Identity is `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: ScenarioKind,
    pub contract_id: String,
    pub part_id: String,
    pub operator_name: String,
    pub operator_id: String,
    pub station_id: String,
    pub script: ScriptedOutcome,
}

impl Scenario {
    /// Snapshot of the contract fields for the run state.
    pub fn contract_info(&self) -> ContractInfo {
        ContractInfo {
            contract_id: self.contract_id.clone(),
            part_id: self.part_id.clone(),
            operator_name: self.operator_name.clone(),
            operator_id: self.operator_id.clone(),
            station_id: self.station_id.clone(),
        }
    }
}
