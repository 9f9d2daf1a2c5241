//! API 输出类型

use serde::Serialize;
use std::collections::BTreeMap;
use wire_core::{LevelizedNetlist, NetlistStats, OptimizeReport};

/// 优化结果摘要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizeSummary {
    pub gates_before: usize,
    pub gates_after: usize,
    pub passes: usize,
    /// 是否采用了优化后的网表
    pub applied: bool,
    pub savings_percent: f64,
}

impl From<&OptimizeReport> for OptimizeSummary {
    fn from(report: &OptimizeReport) -> Self {
        Self {
            gates_before: report.gates_before,
            gates_after: report.gates_after,
            passes: report.passes,
            applied: report.applied,
            savings_percent: report.savings_percent(),
        }
    }
}

/// 构建输出：分层后的网表及其统计
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// 分层网表（可直接交给 Simulator）
    pub levelized: LevelizedNetlist,
    /// 最终网表的规模
    pub stats: NetlistStats,
    /// 层数（关键路径上的门数）
    pub depth: usize,
    /// 优化摘要；优化器未启用时为 None
    pub optimization: Option<OptimizeSummary>,
}

/// 一次仿真运行的请求
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// 顶层模块名
    pub top: String,
    /// 运行的周期数
    pub cycles: u64,
    /// 输入赋值（总线按 u64 写入，LSB 为 bit 0）
    pub inputs: Vec<(String, u64)>,
    /// 每周期打印的信号；为空时使用顶层的全部输出
    pub watch: Vec<String>,
    /// 是否记录波形并导出 VCD
    pub record_vcd: bool,
}

impl RunRequest {
    pub fn new(top: &str, cycles: u64) -> Self {
        Self {
            top: top.to_string(),
            cycles,
            ..Self::default()
        }
    }

    pub fn input(mut self, name: &str, value: u64) -> Self {
        self.inputs.push((name.to_string(), value));
        self
    }

    pub fn watch(mut self, name: &str) -> Self {
        self.watch.push(name.to_string());
        self
    }

    pub fn with_vcd(mut self) -> Self {
        self.record_vcd = true;
        self
    }
}

/// 某一周期结束后被观察信号的值
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceRow {
    pub cycle: u32,
    pub values: BTreeMap<String, u64>,
}

/// 仿真运行输出
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutput {
    pub top: String,
    pub stats: NetlistStats,
    pub depth: usize,
    pub optimization: Option<OptimizeSummary>,
    /// 第 0 行是施加输入后的初始值，之后每周期一行
    pub trace: Vec<TraceRow>,
    /// 录制的波形（VCD 文本）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcd: Option<String>,
}

impl RunOutput {
    /// 最后一行的观察值
    pub fn final_values(&self) -> Option<&BTreeMap<String, u64>> {
        self.trace.last().map(|row| &row.values)
    }
}
