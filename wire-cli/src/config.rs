//! CLI 配置
//!
//! 包含 CLI 特有的配置：项目文件、日志配置和运行配置的组合

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::Level;
use wire_api::{LogLevel, OptimizerConfig, Phase, SimConfig};

/// wire.json 结构
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProjectFile {
    /// 程序 JSON 路径（相对于 wire.json 所在目录）
    pub entry: String,
    /// 顶层模块；缺省时取程序中最后声明的模块
    pub top: Option<String>,
    /// 运行周期数
    pub cycles: Option<u64>,
    /// 输入赋值
    pub inputs: BTreeMap<String, u64>,
    /// 每周期打印的信号
    pub watch: Vec<String>,
    /// VCD 输出路径
    pub vcd: Option<String>,
    /// 仿真器配置
    pub simulation: SimConfig,
    /// 优化器配置
    pub optimizer: OptimizerConfig,
    /// 日志级别: "silent", "error", "warn", "info", "debug", "trace"
    pub log_level: Option<String>,
}

/// Read and parse a project file
pub fn read_project(path: &Path) -> Result<ProjectFile, String> {
    if !path.exists() {
        return Err(format!(
            "未找到 '{}'\n\n当前目录不是一个 Wire 项目。\n提示: 创建 '{}' 文件并指定 'entry' 字段，或使用 --entry",
            path.display(),
            path.display()
        ));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("无法读取 '{}': {}", path.display(), e))?;

    serde_json::from_str(&content).map_err(|e| format!("解析 '{}' 失败: {}", path.display(), e))
}

/// Resolve entry file path relative to the project file directory
pub fn resolve_entry_path(project_path: &Path, entry: &str) -> PathBuf {
    let base_dir = project_path.parent().unwrap_or(Path::new("."));
    base_dir.join(entry)
}

/// Parse `name=value`; the value may be decimal, `0x` hex or `0b` binary
pub fn parse_assignment(s: &str) -> Result<(String, u64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing signal name in '{s}'"));
    }
    let value = parse_value(value.trim()).ok_or_else(|| format!("invalid value in '{s}'"))?;
    Ok((name.to_string(), value))
}

fn parse_value(s: &str) -> Option<u64> {
    let s = s.replace('_', "");
    if let Some(hex) = s.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = s.strip_prefix("0b") {
        u64::from_str_radix(bin, 2).ok()
    } else {
        s.parse().ok()
    }
}

/// Parse `phase=level`, e.g. `elaborator=debug`
pub fn parse_phase_level(s: &str) -> Result<(Phase, Level), String> {
    let (phase, level) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PHASE=LEVEL, got '{s}'"))?;
    let phase = Phase::ALL
        .into_iter()
        .find(|p| p.as_str() == phase.trim())
        .ok_or_else(|| format!("unknown phase '{phase}'"))?;
    let level = parse_level(level.trim()).ok_or_else(|| format!("unknown log level '{level}'"))?;
    Ok((phase, level))
}

/// Parse log level string
pub fn parse_level(s: &str) -> Option<Level> {
    LogLevel::parse(s).map(to_level)
}

pub fn to_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}

/// CLI 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    /// 按阶段覆盖的级别
    pub phases: HashMap<Phase, Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::WARN,
            phases: HashMap::new(),
        }
    }
}

impl LogConfig {
    /// Get log level for a specific phase
    pub fn level_for(&self, phase: Phase) -> Level {
        self.phases.get(&phase).copied().unwrap_or(self.global)
    }
}
