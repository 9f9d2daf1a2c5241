//! Wire Core - HDL elaboration and gate-level simulation (pure logic, no IO)
//!
//! Contains the elaborator, levelizer, optimizer, signal store, evaluation
//! kernels and the simulator that drives them.
//! Only operates on in-memory data structures, no file IO or terminal output.
//!
//! Configuration is passed explicitly via parameters, not via global state.

pub mod ast;
pub mod elaborator;
pub mod kernel;
pub mod levelizer;
pub mod netlist;
pub mod optimizer;
pub mod sim;
pub mod store;

// Re-export common types
pub use ast::{ExprKind, ModuleDecl, Program};
pub use elaborator::{elaborate, elaborate_with_config, ElabError};
pub use kernel::{BatchKernel, Evaluator, Kernel};
pub use levelizer::{levelize, LevelizeError};
pub use netlist::{LevelizedNetlist, Netlist, NetlistError, NetlistStats, SignalId};
pub use optimizer::{optimize, OptimizeReport};
pub use sim::{SimError, Simulator, StopHandle, WaveSample};
pub use store::{SignalStore, StoreError};

// Re-export config types from wire-config
pub use wire_config::{ElabConfig, KernelKind, OptimizerConfig, Phase, SimConfig};
