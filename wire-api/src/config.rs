//! API 层配置
//!
//! 包含运行配置 RunConfig 和全局单例（供 CLI 使用）

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use wire_config::{ElabConfig, OptimizerConfig, SimConfig};

/// Build and simulation configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Elaborator settings
    pub elab: ElabConfig,
    /// Simulator settings
    pub sim: SimConfig,
    /// Optimizer settings
    pub optimizer: OptimizerConfig,
}

impl RunConfig {
    /// Same configuration with the optimizer switched on or off
    pub fn with_optimizer(mut self, enabled: bool) -> Self {
        self.optimizer.enabled = enabled;
        self
    }
}

// Global config singleton for CLI convenience
static GLOBAL_CONFIG: OnceCell<RunConfig> = OnceCell::new();

/// Initialize global configuration (must be called once before any operation)
///
/// # Panics
/// If config is already initialized
pub fn init(config: RunConfig) {
    GLOBAL_CONFIG
        .set(config)
        .expect("Config already initialized");
}

/// Get global config reference
///
/// # Panics
/// If config is not initialized
pub fn config() -> &'static RunConfig {
    GLOBAL_CONFIG.get().expect("Config not initialized")
}

/// Check if config is initialized
pub fn is_initialized() -> bool {
    GLOBAL_CONFIG.get().is_some()
}

/// Global config, installing the default one when nothing was initialized
pub(crate) fn config_or_default() -> &'static RunConfig {
    GLOBAL_CONFIG.get_or_init(RunConfig::default)
}
