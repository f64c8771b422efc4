//! Ordered, human-readable progress log.
//!
//! The Event Emitter produces one [`LogEntry`] per recorded message. Entries
//! are append-only; creation order is authoritative even when timestamps
//! collide. `indent` encodes nesting depth so a display layer can group
//! detail lines under the module headline that produced them.
//!
//! Logging is part of the auditable record: the emitter has no retry path,
//! and a run that cannot log cannot proceed.

use crate::core::time::{SimClock, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification of a log entry, used for display styling only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Info,
    Success,
    Error,
    Warning,
}

/// One entry in a run's ordered progress log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub timestamp: Timestamp,
    /// Module that produced the entry (`orchestrator` for run-level lines).
    pub module: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: LogType,
    /// Nesting depth: 0 for headlines, 1+ for detail lines beneath them.
    pub indent: u8,
}

/// Produces log entries with unique ids and non-decreasing timestamps.
#[derive(Debug, Default)]
pub struct EventEmitter {
    produced: usize,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self { produced: 0 }
    }

    /// Record a message. The shared run clock guarantees the timestamp is no
    /// earlier than any previously issued one.
    pub fn record(
        &mut self,
        clock: &mut SimClock,
        module: &str,
        message: String,
        kind: LogType,
        indent: u8,
    ) -> LogEntry {
        self.produced += 1;
        LogEntry {
            id: Uuid::new_v4().to_string(),
            timestamp: clock.now(),
            module: module.to_string(),
            message,
            kind,
            indent,
        }
    }

    /// Number of entries produced so far.
    pub fn produced(&self) -> usize {
        self.produced
    }
}
