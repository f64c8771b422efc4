//! Scripted failures, the blocked scenario and mid-run aborts.

use scenario_simulator_core_rs::{
    verify_chain, AlertSeverity, BroadcastType, LogType, ModuleStatus, RunStatus,
    ScenarioKind, ScenarioRegistry, ScriptedOutcome, ServerConfig, SimulationServer,
};

fn server() -> SimulationServer {
    SimulationServer::new(ScenarioRegistry::builtin(), ServerConfig::default())
}

#[test]
fn test_failure_stops_the_pipeline_and_skips_the_rest() {
    let server = server();
    let orchestrator = server.create_run("wrong-contract-type").expect("create");
    let run_id = orchestrator.run_id().to_string();
    assert_eq!(orchestrator.run(), RunStatus::Failed);

    let state = server.snapshot(&run_id).expect("snapshot");
    assert_eq!(state.modules[0].name, "contract_validation");
    assert_eq!(state.modules[0].status, ModuleStatus::Failed);
    assert!(state.modules[0].end_time.is_some());
    for module in &state.modules[1..] {
        assert_eq!(module.status, ModuleStatus::Skipped, "{}", module.name);
        assert_eq!(module.start_time, None);
    }
    assert_eq!(state.current_module, None);
    assert!(state
        .logs
        .iter()
        .any(|l| l.kind == LogType::Warning && l.message.contains("skipped")));
}

#[test]
fn test_failure_raises_an_alert_with_scripted_severity() {
    let cases = [
        ("wrong-contract-type", AlertSeverity::High),
        ("wrong-part", AlertSeverity::Critical),
        ("environmental-failure", AlertSeverity::Emergency),
    ];
    for (scenario_id, severity) in cases {
        let server = server();
        let orchestrator = server.create_run(scenario_id).expect("create");
        let run_id = orchestrator.run_id().to_string();
        orchestrator.run();

        let state = server.snapshot(&run_id).expect("snapshot");
        let alerts: Vec<_> = state
            .broadcasts
            .iter()
            .filter(|b| b.kind == BroadcastType::Alert)
            .collect();
        assert_eq!(alerts.len(), 1, "{}", scenario_id);
        assert_eq!(alerts[0].severity, severity, "{}", scenario_id);
        assert_eq!(state.metrics.alert_count, 1, "{}", scenario_id);
    }
}

#[test]
fn test_blocked_run_never_reaches_the_pipeline() {
    let server = server();
    let orchestrator = server.create_run("missing-standards").expect("create");
    let run_id = orchestrator.run_id().to_string();
    assert_eq!(orchestrator.run(), RunStatus::Blocked);

    let state = server.snapshot(&run_id).expect("snapshot");
    for module in &state.modules {
        assert_eq!(module.status, ModuleStatus::Skipped, "{}", module.name);
        assert_eq!(module.start_time, None);
        assert_eq!(module.end_time, None);
    }
    let actions: Vec<&str> = state
        .ledger_entries
        .iter()
        .map(|e| e.action.as_str())
        .collect();
    assert_eq!(actions, vec!["run_started", "run_blocked"]);
    verify_chain(&state.ledger_entries, &run_id).expect("chain must verify");
}

#[test]
fn test_every_error_scenario_ends_failed_or_blocked() {
    let registry = ScenarioRegistry::builtin();
    for scenario in registry.iter().filter(|s| s.kind == ScenarioKind::Error) {
        let server = server();
        let orchestrator = server.create_run(&scenario.id).expect("create");
        let run_id = orchestrator.run_id().to_string();
        let status = orchestrator.run();

        let expected = match scenario.script {
            ScriptedOutcome::BlockedBefore { .. } => RunStatus::Blocked,
            _ => RunStatus::Failed,
        };
        assert_eq!(status, expected, "{}", scenario.id);
        let state = server.snapshot(&run_id).expect("snapshot");
        verify_chain(&state.ledger_entries, &run_id)
            .unwrap_or_else(|e| panic!("{}: {}", scenario.id, e));
    }
}

#[test]
fn test_abort_at_module_boundary_skips_remaining_modules() {
    let server = server();
    let mut orchestrator = server.create_run("complete-success").expect("create");
    let run_id = orchestrator.run_id().to_string();

    // Start the run and let the first module pass.
    orchestrator.step();
    orchestrator.step();
    server
        .abort_run(&run_id, "Operator requested stop")
        .expect("abort");
    let status = orchestrator.run();
    assert_eq!(status, RunStatus::Failed);

    let state = server.snapshot(&run_id).expect("snapshot");
    assert_eq!(state.modules[0].status, ModuleStatus::Success);
    for module in &state.modules[1..] {
        assert_eq!(module.status, ModuleStatus::Skipped, "{}", module.name);
    }
    assert!(state
        .logs
        .iter()
        .any(|l| l.message.contains("Operator requested stop")));
    assert!(state
        .ledger_entries
        .iter()
        .any(|e| e.action == "run_aborted"));
    verify_chain(&state.ledger_entries, &run_id).expect("chain must verify");
}

#[test]
fn test_abort_after_completion_changes_nothing() {
    let server = server();
    let orchestrator = server.create_run("complete-success").expect("create");
    let run_id = orchestrator.run_id().to_string();
    assert_eq!(orchestrator.run(), RunStatus::Success);

    server.abort_run(&run_id, "too late").expect("known run");
    let state = server.snapshot(&run_id).expect("snapshot");
    assert_eq!(state.status, RunStatus::Success);
    assert!(!state.ledger_entries.iter().any(|e| e.action == "run_aborted"));
}
