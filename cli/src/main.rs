//! Command-line front end: run a scenario and stream its messages as JSON
//! lines, one message per line, in delivery order.

use clap::Parser;
use scenario_simulator_core_rs::{
    RunStatus, ScenarioRegistry, ServerConfig, SimulationServer,
};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "scenario-sim")]
#[command(about = "Run a test-station scenario and stream its messages as JSON lines")]
struct Args {
    /// Scenario id to run (see --list)
    scenario_id: Option<String>,

    /// List available scenarios and exit
    #[arg(long)]
    list: bool,

    /// Simulated per-module delay in milliseconds
    #[arg(long = "delay-ms", default_value = "400")]
    delay_ms: u64,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let registry = ScenarioRegistry::builtin();
    if args.list {
        for id in registry.ids() {
            match registry.get(id) {
                Some(scenario) => println!("{:<26} {}", id, scenario.description),
                None => println!("{}", id),
            }
        }
        return ExitCode::SUCCESS;
    }

    let scenario_id = match args.scenario_id {
        Some(id) => id,
        None => {
            eprintln!("a scenario id is required unless --list is given");
            return ExitCode::from(2);
        }
    };

    let server = SimulationServer::new(
        registry,
        ServerConfig {
            step_delay: Duration::from_millis(args.delay_ms),
        },
    );
    let orchestrator = match server.create_run(&scenario_id) {
        Ok(orchestrator) => orchestrator,
        Err(error) => {
            eprintln!("{}", error);
            return ExitCode::from(2);
        }
    };
    let run_id = orchestrator.run_id().to_string();
    let subscription = match server.subscribe(&run_id) {
        Ok(subscription) => subscription,
        Err(error) => {
            eprintln!("{}", error);
            return ExitCode::FAILURE;
        }
    };

    let worker = thread::spawn(move || orchestrator.run());
    for message in subscription.iter() {
        match serde_json::to_string(&message) {
            Ok(line) => println!("{}", line),
            Err(error) => eprintln!("serialization error: {}", error),
        }
    }

    match worker.join() {
        Ok(RunStatus::Success) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(_) => {
            eprintln!("run thread panicked");
            ExitCode::FAILURE
        }
    }
}
