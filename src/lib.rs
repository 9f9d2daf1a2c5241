//! Wire - A tiny hardware description toolchain
//!
//! Wire elaborates hierarchical module descriptions into a flat netlist of
//! NAND gates and D flip-flops, levelizes it and simulates it cycle by cycle.
//!
//! # Architecture
//!
//! ```text
//! wire-config/  - Pure configuration data
//! wire-core/    - Elaborator, levelizer, optimizer, store, kernels, simulator (no IO)
//! wire-api/     - Pipeline orchestration, RunConfig, WireError
//! wire-cli/     - `wire` binary (project file, logging, output)
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use wire_workspace::{load_program, run, RunConfig, RunRequest};
//!
//! let program = load_program(&std::fs::read_to_string("counter.json")?)?;
//! let output = run(&program, &RunRequest::new("counter", 8), &RunConfig::default())?;
//! println!("{:?}", output.final_values());
//! ```

// 重导出各层
pub use wire_api;
pub use wire_config;
pub use wire_core;

// 重导出常用类型
pub use wire_api::{
    build, elaborate, load_program, quick_run, run, run_json, simulate, simulator, BuildOutput, ErrorReport,
    RunConfig, RunOutput, RunRequest, TraceRow, WireError,
};
pub use wire_config::{ElabConfig, KernelKind, OptimizerConfig, SimConfig};
pub use wire_core::{
    levelize, optimize, LevelizedNetlist, Netlist, Program, SignalStore, Simulator, StopHandle,
    WaveSample,
};
