//! Wire Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Wire crates.

use serde::{Deserialize, Serialize};

/// Configuration for elaboration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElabConfig {
    /// Maximum nesting depth of module inlining
    pub max_inline_depth: usize,
}

/// Which evaluation engine drives the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
    /// Per-gate evaluation over the levelized netlist
    #[default]
    Object,
    /// Flat word/bit program over the raw store buffer
    Batch,
}

/// Configuration for the simulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Cycles per batch in `run_async`
    pub batch_size: u64,
    /// Evaluation engine
    pub kernel: KernelKind,
    /// `$timescale` written into VCD exports
    pub timescale: String,
    /// Whether VCD export keeps `nand_`/`dff_` bookkeeping signals by default
    pub include_internal: bool,
}

/// Configuration for the netlist optimizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Whether the optimizer runs at all
    pub enabled: bool,
    /// Minimum gate reduction (percent) for the optimized netlist to be used
    pub min_savings_percent: f64,
    /// Upper bound on rewrite passes
    pub max_passes: usize,
}

/// Log level as written in project files
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Pipeline phase, used for phase-specific log targets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Elaborator,
    Levelizer,
    Optimizer,
    Kernel,
    Simulator,
}

impl Phase {
    /// All phases, in pipeline order
    pub const ALL: [Phase; 5] = [
        Phase::Elaborator,
        Phase::Levelizer,
        Phase::Optimizer,
        Phase::Kernel,
        Phase::Simulator,
    ];

    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Elaborator => "elaborator",
            Phase::Levelizer => "levelizer",
            Phase::Optimizer => "optimizer",
            Phase::Kernel => "kernel",
            Phase::Simulator => "simulator",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> String {
        format!("wire::{}", self.as_str())
    }
}

impl LogLevel {
    /// Parse a level name; `silent` maps to `Error`
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "silent" | "error" => Some(LogLevel::Error),
            "warn" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

impl Default for ElabConfig {
    fn default() -> Self {
        Self {
            max_inline_depth: 64,
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            kernel: KernelKind::Object,
            timescale: "1ns".to_string(),
            include_internal: false,
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_savings_percent: 5.0,
            max_passes: 8,
        }
    }
}
