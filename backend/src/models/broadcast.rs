//! Severity-classified broadcast stream.
//!
//! Broadcasts are an independent append-only stream from the progress log:
//! routine `info` notices (test started, test completed) and `alert` messages
//! for safety or compliance events. Severity is informational routing data —
//! the `alertCount` metric counts entries with `type == alert` regardless of
//! severity.

use crate::core::time::{SimClock, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Broadcast classification. Only `alert` feeds the alert metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastType {
    Info,
    Alert,
}

/// Severity band for display and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
    Emergency,
}

/// One broadcast message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Broadcast {
    pub id: String,
    pub timestamp: Timestamp,
    #[serde(rename = "type")]
    pub kind: BroadcastType,
    pub severity: AlertSeverity,
    pub message: String,
}

/// Produces broadcasts with an id/timestamp space independent of the log.
#[derive(Debug, Default)]
pub struct BroadcastManager {
    produced: usize,
}

impl BroadcastManager {
    pub fn new() -> Self {
        Self { produced: 0 }
    }

    pub fn emit(
        &mut self,
        clock: &mut SimClock,
        kind: BroadcastType,
        severity: AlertSeverity,
        message: String,
    ) -> Broadcast {
        self.produced += 1;
        Broadcast {
            id: Uuid::new_v4().to_string(),
            timestamp: clock.now(),
            kind,
            severity,
            message,
        }
    }

    pub fn produced(&self) -> usize {
        self.produced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_assigns_unique_ids() {
        let mut clock = SimClock::new();
        let mut manager = BroadcastManager::new();
        let a = manager.emit(
            &mut clock,
            BroadcastType::Info,
            AlertSeverity::Low,
            "test started".into(),
        );
        let b = manager.emit(
            &mut clock,
            BroadcastType::Alert,
            AlertSeverity::High,
            "validation failed".into(),
        );
        assert_ne!(a.id, b.id);
        assert_eq!(manager.produced(), 2);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(AlertSeverity::Emergency > AlertSeverity::Critical);
        assert!(AlertSeverity::Critical > AlertSeverity::High);
        assert!(AlertSeverity::High > AlertSeverity::Medium);
        assert!(AlertSeverity::Medium > AlertSeverity::Low);
    }

    #[test]
    fn test_wire_format() {
        let mut clock = SimClock::new();
        let mut manager = BroadcastManager::new();
        let alert = manager.emit(
            &mut clock,
            BroadcastType::Alert,
            AlertSeverity::Emergency,
            "ventilation failure".into(),
        );
        let json = serde_json::to_value(&alert).expect("serialize");
        assert_eq!(json["type"], "alert");
        assert_eq!(json["severity"], "emergency");
    }
}
