//! CLI 格式化输出
//!
//! 提供命令行友好的错误显示、波形表格和网表统计。

use std::fmt::Write;
use wire_api::{ErrorDetails, OptimizeSummary, TraceRow, WireError};
use wire_core::NetlistStats;

/// 打印错误；`json` 时输出结构化报告
pub fn print_error(e: &WireError, json: bool) {
    let report = e.to_report();
    if json {
        eprintln!("{}", report.to_json());
        return;
    }

    eprintln!("❌ {}", report);
    match &report.details {
        Some(ErrorDetails::Cycle { signals }) => {
            // 环路按信号流向打印，首尾相接
            let mut path = signals.join(" -> ");
            if let Some(first) = signals.first() {
                let _ = write!(path, " -> {first}");
            }
            eprintln!("   cycle: {path}");
        }
        Some(ErrorDetails::Arity { expected, found }) => {
            eprintln!("   expected {expected} argument(s), found {found}");
        }
        None => {}
    }
}

/// Render trace rows as an aligned table, one column per watched signal
pub fn format_trace(rows: &[TraceRow]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };
    let names: Vec<&str> = first.values.keys().map(String::as_str).collect();

    let cycle_width = rows
        .iter()
        .map(|r| r.cycle.to_string().len())
        .max()
        .unwrap_or(1)
        .max("cycle".len());
    let widths: Vec<usize> = names
        .iter()
        .map(|n| {
            rows.iter()
                .filter_map(|r| r.values.get(*n))
                .map(|v| v.to_string().len())
                .max()
                .unwrap_or(1)
                .max(n.len())
        })
        .collect();

    let mut out = String::new();
    let _ = write!(out, "{:>cycle_width$}", "cycle");
    for (name, w) in names.iter().zip(widths.iter().copied()) {
        let _ = write!(out, "  {name:>w$}");
    }
    out.push('\n');

    for row in rows {
        let _ = write!(out, "{:>cycle_width$}", row.cycle);
        for (name, w) in names.iter().zip(widths.iter().copied()) {
            let value = row.values.get(*name).copied().unwrap_or(0);
            let _ = write!(out, "  {value:>w$}");
        }
        out.push('\n');
    }
    out
}

/// Netlist size summary, plus the optimizer outcome when it ran
pub fn format_stats(stats: &NetlistStats, depth: usize, optimization: Option<&OptimizeSummary>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[Netlist]");
    let _ = writeln!(out, "Signals:   {}", stats.signals);
    let _ = writeln!(out, "NAND gates: {}", stats.nand_gates);
    let _ = writeln!(out, "DFFs:      {}", stats.dffs);
    let _ = writeln!(out, "Inputs:    {}", stats.primary_inputs);
    let _ = writeln!(out, "Outputs:   {}", stats.primary_outputs);
    let _ = writeln!(out, "Instances: {}", stats.instances);
    let _ = writeln!(out, "Depth:     {depth}");
    if let Some(opt) = optimization {
        let _ = writeln!(
            out,
            "Optimizer: {} -> {} gates ({:.1}%, {} pass(es), {})",
            opt.gates_before,
            opt.gates_after,
            opt.savings_percent,
            opt.passes,
            if opt.applied { "applied" } else { "discarded" }
        );
    }
    out
}
