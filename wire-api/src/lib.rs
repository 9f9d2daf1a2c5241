//! Wire API - Build and simulation orchestration layer
//!
//! Provides unified execution interface, including:
//! - Pipeline orchestration (load → elaborate → levelize → optimize → simulate)
//! - Configuration abstraction (RunConfig)
//! - Unified error handling (WireError)
//!
//! For CLI convenience, this crate provides a global singleton API.
//! For library use, prefer the explicit `run(program, &request, &config)` API.

use std::collections::BTreeMap;
use tracing::{debug, info};

use wire_core::{LevelizedNetlist, Netlist, Program, Simulator};

// Re-export config
pub mod config;
pub use config::{config as get_config, init as init_config, is_initialized, RunConfig};

// Re-export config types from wire_config
pub use wire_config::{ElabConfig, KernelKind, LogLevel, OptimizerConfig, Phase, SimConfig};

// Re-export error and types
pub mod error;
pub mod types;
pub use error::{ErrorDetails, ErrorReport, WireError};
pub use types::{BuildOutput, OptimizeSummary, RunOutput, RunRequest, TraceRow};

// Re-export core crate
pub use wire_config;
pub use wire_core;

/// Parse a program from its JSON form
pub fn load_program(json: &str) -> Result<Program, WireError> {
    let program: Program = serde_json::from_str(json)?;
    debug!(modules = program.modules.len(), "Program loaded");
    Ok(program)
}

/// Elaborate `top` into a flat netlist
pub fn elaborate(program: &Program, top: &str, config: &RunConfig) -> Result<Netlist, WireError> {
    Ok(wire_core::elaborate_with_config(program, top, &config.elab)?)
}

/// Elaborate, levelize and (when enabled) optimize `top`
///
/// Combinational cycles are reported on the elaborated netlist, before any
/// optimization could hide them.
pub fn build(program: &Program, top: &str, config: &RunConfig) -> Result<BuildOutput, WireError> {
    info!(top, "Starting build");

    let netlist = elaborate(program, top, config)?;
    let mut levelized = wire_core::levelize(netlist)?;

    let optimization = if config.optimizer.enabled {
        let report = wire_core::optimize(&levelized.netlist, &config.optimizer);
        let summary = types::OptimizeSummary::from(&report);
        if report.applied {
            levelized = wire_core::levelize(report.netlist)?;
        }
        Some(summary)
    } else {
        None
    };

    let stats = levelized.netlist.stats();
    let depth = levelized.depth();
    info!(
        gates = stats.nand_gates,
        dffs = stats.dffs,
        depth,
        "Build completed"
    );
    Ok(BuildOutput {
        levelized,
        stats,
        depth,
        optimization,
    })
}

/// Simulator over a built netlist, using the configured kernel
pub fn simulator(levelized: LevelizedNetlist, config: &RunConfig) -> Simulator {
    Simulator::with_config(levelized, config.sim.clone())
}

/// Run with explicit configuration
///
/// This is the recommended API for library users. Inputs are applied and
/// settled before cycle 0 is sampled; every later row is taken after the
/// clock edge and a settling pass.
pub fn run(program: &Program, request: &RunRequest, config: &RunConfig) -> Result<RunOutput, WireError> {
    let built = build(program, &request.top, config)?;
    simulate(program, built, request, config)
}

/// Simulate an already built design
///
/// `program` only supplies the default watch list (the top module's outputs).
pub fn simulate(
    program: &Program,
    built: BuildOutput,
    request: &RunRequest,
    config: &RunConfig,
) -> Result<RunOutput, WireError> {
    info!(top = %request.top, cycles = request.cycles, "Starting run");

    let BuildOutput {
        levelized,
        stats,
        depth,
        optimization,
    } = built;
    let mut sim = simulator(levelized, config);

    for (name, value) in &request.inputs {
        sim.poke(name, *value)?;
    }
    sim.evaluate();

    if request.record_vcd {
        sim.start_recording_all();
    }

    let watch = watch_list(program, request);
    let mut trace = Vec::with_capacity(request.cycles as usize + 1);
    trace.push(sample(&sim, &watch)?);
    for _ in 0..request.cycles {
        sim.step();
        sim.evaluate();
        trace.push(sample(&sim, &watch)?);
    }

    let vcd = if request.record_vcd {
        Some(sim.export_vcd(None)?)
    } else {
        None
    };

    info!(cycle = sim.cycle(), "Run completed");
    Ok(RunOutput {
        top: request.top.clone(),
        stats,
        depth,
        optimization,
        trace,
        vcd,
    })
}

/// Load a JSON program and run it with explicit configuration
pub fn run_json(json: &str, request: &RunRequest, config: &RunConfig) -> Result<RunOutput, WireError> {
    let program = load_program(json)?;
    run(&program, request, config)
}

/// Requested signals, or every output of the top module
fn watch_list(program: &Program, request: &RunRequest) -> Vec<String> {
    if !request.watch.is_empty() {
        return request.watch.clone();
    }
    program
        .module(&request.top)
        .map(|m| m.outputs.iter().map(|o| o.name.clone()).collect())
        .unwrap_or_default()
}

fn sample(sim: &Simulator, watch: &[String]) -> Result<TraceRow, WireError> {
    let values = watch
        .iter()
        .map(|name| sim.peek(name).map(|v| (name.clone(), v)))
        .collect::<Result<BTreeMap<_, _>, _>>()?;
    Ok(TraceRow {
        cycle: sim.cycle(),
        values,
    })
}

// ==================== Legacy API (uses global config) ====================

/// Build using global config
///
/// # Panics
/// If config is not initialized
pub fn build_global(program: &Program, top: &str) -> Result<BuildOutput, WireError> {
    build(program, top, get_config())
}

/// Run using global config
///
/// # Panics
/// If config is not initialized
pub fn run_global(program: &Program, request: &RunRequest) -> Result<RunOutput, WireError> {
    run(program, request, get_config())
}

/// Quick run a JSON program (auto-initializes with default config if needed)
pub fn quick_run(json: &str, request: &RunRequest) -> Result<RunOutput, WireError> {
    run_json(json, request, config::config_or_default())
}
