//! Scenario Registry - static catalog of named test scenarios.
//!
//! Pure lookup, no mutation, no side effects. The registry is an explicit
//! dependency injected into the server rather than a process-wide singleton,
//! so tests can run against custom scenario sets.

use crate::models::broadcast::AlertSeverity;
use crate::models::scenario::{Scenario, ScenarioKind, ScriptedOutcome};
use std::collections::HashMap;

/// Immutable catalog of scenarios, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ScenarioRegistry {
    scenarios: HashMap<String, Scenario>,
}

impl ScenarioRegistry {
    /// Build a registry from an explicit scenario set. Later duplicates of
    /// an id replace earlier ones.
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        Self {
            scenarios: scenarios
                .into_iter()
                .map(|s| (s.id.clone(), s))
                .collect(),
        }
    }

    /// Look a scenario up by id.
    pub fn get(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.get(id)
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// All scenario ids, sorted for stable listings.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.scenarios.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate scenarios in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.values()
    }

    /// The built-in catalog: one clean pass and six scripted failures drawn
    /// from the station's validation playbook.
    pub fn builtin() -> Self {
        let station = "LP-Station-A2";
        Self::new(vec![
            Scenario {
                id: "complete-success".into(),
                name: "Complete Success".into(),
                description: "Liquid penetrant test passes every validation module".into(),
                kind: ScenarioKind::Success,
                contract_id: "SC-2025-001-LP".into(),
                part_id: "PART-ABC-12345".into(),
                operator_name: "John Technician".into(),
                operator_id: "USR-TECH-001".into(),
                station_id: station.into(),
                script: ScriptedOutcome::AllPass,
            },
            Scenario {
                id: "wrong-contract-type".into(),
                name: "Wrong Contract Type".into(),
                description: "RT contract presented to an LP-only station".into(),
                kind: ScenarioKind::Error,
                contract_id: "SC-2025-002-RT".into(),
                part_id: "PART-XYZ-67890".into(),
                operator_name: "Jane Technician".into(),
                operator_id: "USR-TECH-002".into(),
                station_id: station.into(),
                script: ScriptedOutcome::FailAt {
                    module: "contract_validation".into(),
                    reason: "Contract type RT is not supported at this LP station".into(),
                    alert: "Contract type mismatch: RT contract SC-2025-002-RT cannot be \
                            executed at LP-Station-A2"
                        .into(),
                    severity: AlertSeverity::High,
                },
            },
            Scenario {
                id: "missing-certifications".into(),
                name: "Missing Operator Certifications".into(),
                description: "Operator lacks the LP certification and Certified token".into(),
                kind: ScenarioKind::Error,
                contract_id: "SC-2025-003-LP".into(),
                part_id: "PART-DEF-11111".into(),
                operator_name: "Bob Novice".into(),
                operator_id: "USR-TECH-003".into(),
                station_id: station.into(),
                script: ScriptedOutcome::FailAt {
                    module: "contract_validation".into(),
                    reason: "Operator missing LP_Certified certification and Certified token"
                        .into(),
                    alert: "Access denied for SC-2025-003-LP: insufficient operator credentials"
                        .into(),
                    severity: AlertSeverity::High,
                },
            },
            Scenario {
                id: "wrong-part".into(),
                name: "Part Verification Failure".into(),
                description: "Physical part does not match the contract part id".into(),
                kind: ScenarioKind::Error,
                contract_id: "SC-2025-004-LP".into(),
                part_id: "PART-EXPECTED-99999".into(),
                operator_name: "Carol Expert".into(),
                operator_id: "USR-TECH-004".into(),
                station_id: station.into(),
                script: ScriptedOutcome::FailAt {
                    module: "part_verification".into(),
                    reason: "Dual-signature mismatch: expected PART-EXPECTED-99999, got \
                             PART-WRONG-88888"
                        .into(),
                    alert: "Part verification failed for PART-EXPECTED-99999: wrong part \
                            confirmed by AI analysis and human inspection"
                        .into(),
                    severity: AlertSeverity::Critical,
                },
            },
            Scenario {
                id: "missing-standards".into(),
                name: "Missing Standards Contracts".into(),
                description: "Required standards contracts are not loaded on the station".into(),
                kind: ScenarioKind::Error,
                contract_id: "SC-2025-005-LP".into(),
                part_id: "PART-GHI-22222".into(),
                operator_name: "Dave Qualified".into(),
                operator_id: "USR-TECH-005".into(),
                station_id: station.into(),
                script: ScriptedOutcome::BlockedBefore {
                    reason: "Required standards contracts ST-ASTM-E165 and ST-ISO-9001 are \
                             not loaded on the station"
                        .into(),
                    alert: "Station blocked: cannot validate ASTM_E165 / ISO_9001 requirements \
                            for SC-2025-005-LP"
                        .into(),
                    severity: AlertSeverity::Critical,
                },
            },
            Scenario {
                id: "safety-token-failure".into(),
                name: "Missing Safety Tokens".into(),
                description: "Operator lacks SafetyCertified and HazardClearance tokens".into(),
                kind: ScenarioKind::Error,
                contract_id: "SC-2025-007-LP".into(),
                part_id: "PART-MNO-44444".into(),
                operator_name: "Mike Uncertified".into(),
                operator_id: "USR-TECH-007".into(),
                station_id: station.into(),
                script: ScriptedOutcome::FailAt {
                    module: "safety_check".into(),
                    reason: "Operator missing required safety tokens: SafetyCertified, \
                             HazardClearance"
                        .into(),
                    alert: "Safety requirements not met for SC-2025-007-LP: missing safety \
                            tokens"
                        .into(),
                    severity: AlertSeverity::High,
                },
            },
            Scenario {
                id: "environmental-failure".into(),
                name: "Environmental Safety Failure".into(),
                description: "Station ventilation failure detected during safety checks".into(),
                kind: ScenarioKind::Error,
                contract_id: "SC-2025-008-LP".into(),
                part_id: "PART-PQR-55555".into(),
                operator_name: "Nancy Qualified".into(),
                operator_id: "USR-TECH-008".into(),
                station_id: station.into(),
                script: ScriptedOutcome::FailAt {
                    module: "safety_check".into(),
                    reason: "Ventilation system failure: insufficient air flow detected".into(),
                    alert: "Station environmental systems unsafe for SC-2025-008-LP: \
                            ventilation failure"
                        .into(),
                    severity: AlertSeverity::Emergency,
                },
            },
        ])
    }
}
