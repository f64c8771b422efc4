//! Module Orchestrator - drives a run through the validation pipeline.

pub mod engine;

pub use engine::{validate_script, EngineError, Orchestrator, StepResult};
