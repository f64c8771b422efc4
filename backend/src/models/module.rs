//! Validation module lifecycle.
//!
//! A run executes a fixed, ordered pipeline of validation modules. Each
//! module moves through a small status machine:
//!
//! ```text
//! pending → active → success   (advance to next module)
//! pending → active → failed    (halt; remaining modules become skipped)
//! pending → skipped            (only after an earlier failure or a block)
//! ```
//!
//! Transitions are monotonic: once a module leaves `pending` it never
//! returns, and a terminal status is never overwritten.

use crate::core::time::Timestamp;
use serde::{Deserialize, Serialize};

/// Status of one validation module within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    Pending,
    Active,
    Success,
    Failed,
    Skipped,
}

impl ModuleStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ModuleStatus::Success | ModuleStatus::Failed | ModuleStatus::Skipped
        )
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(&self, next: ModuleStatus) -> bool {
        match self {
            ModuleStatus::Pending => matches!(next, ModuleStatus::Active | ModuleStatus::Skipped),
            ModuleStatus::Active => matches!(next, ModuleStatus::Success | ModuleStatus::Failed),
            _ => false,
        }
    }
}

/// Static description of one pipeline slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    /// Machine name, unique within the pipeline (e.g. `contract_validation`).
    pub name: String,
    /// Human-readable name for display.
    pub display_name: String,
}

impl ModuleSpec {
    pub fn new(name: &str, display_name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
        }
    }
}

/// The fixed validation pipeline every scenario runs through, in order.
pub fn default_pipeline() -> Vec<ModuleSpec> {
    vec![
        ModuleSpec::new("contract_validation", "Contract Validation"),
        ModuleSpec::new("part_verification", "Part Verification"),
        ModuleSpec::new("safety_check", "Safety Systems"),
        ModuleSpec::new("compliance_check", "Compliance Procedures"),
        ModuleSpec::new("standards_check", "Industry Standards"),
        ModuleSpec::new("qa_validation", "QA Validation"),
    ]
}

/// Per-run state of one validation module.
///
/// `start_time` is set when the module enters `active`; `end_time` when it
/// leaves `active`. Skipped modules never receive either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleState {
    pub name: String,
    pub display_name: String,
    pub status: ModuleStatus,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
}

impl ModuleState {
    /// Fresh `pending` state for a pipeline slot.
    pub fn new(spec: &ModuleSpec) -> Self {
        Self {
            name: spec.name.clone(),
            display_name: spec.display_name.clone(),
            status: ModuleStatus::Pending,
            start_time: None,
            end_time: None,
        }
    }
}
