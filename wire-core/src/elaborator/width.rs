//! Static width inference
//!
//! Widths are computed from the expression tree alone, without emitting any
//! gate, so every target can be declared with its final width before the
//! first statement of a body is wired. Targets may be read before the line
//! that defines them, so inference iterates to a fixed point.

use super::scope::Scope;
use crate::ast::{ExprKind, Program, Statement};
use std::collections::HashMap;

/// Reserved primitive callees
pub const NAND: &str = "nand";
pub const DFF: &str = "dff";

/// Number of bits needed to hold `value` (at least 1)
pub fn literal_width(value: u64) -> usize {
    (u64::BITS - value.leading_zeros()).max(1) as usize
}

/// Width of `expr` given the scope and the widths inferred so far
pub fn expr_width(
    expr: &ExprKind,
    scope: &Scope,
    program: &Program,
    pending: &HashMap<String, usize>,
) -> usize {
    let named = |name: &str| {
        pending
            .get(name)
            .copied()
            .unwrap_or_else(|| scope.width_of(name))
    };

    match expr {
        ExprKind::Number(n) => literal_width(n.value),
        ExprKind::Identifier(id) => named(&id.name),
        ExprKind::Index(_) => 1,
        ExprKind::Slice(s) => s.end.saturating_sub(s.start) + 1,
        ExprKind::Member(m) => match m.object.as_ref() {
            ExprKind::Identifier(obj) => named(&format!("{}.{}", obj.name, m.field)),
            _ => 1,
        },
        ExprKind::Concat(c) => c
            .parts
            .iter()
            .map(|p| expr_width(p, scope, program, pending))
            .sum(),
        ExprKind::Call(c) => match c.callee.as_str() {
            NAND | DFF => 1,
            callee => program
                .module(callee)
                .map(|m| m.outputs.first().map_or(0, |o| o.width))
                .unwrap_or(1),
        },
    }
}

/// Infer the width of every non-port target assigned in `statements`.
///
/// Also records the widths of member outputs (`target.field`) published by
/// module calls so later statements can size expressions that read them.
pub fn infer_widths(
    statements: &[Statement],
    scope: &Scope,
    program: &Program,
) -> HashMap<String, usize> {
    let mut pending: HashMap<String, usize> = HashMap::new();

    for _ in 0..=statements.len() {
        let mut changed = false;

        for stmt in statements {
            if let ExprKind::Call(c) = stmt.expr.as_ref() {
                if let Some(module) = program.module(&c.callee) {
                    for out in module.outputs.iter().skip(1) {
                        let key = format!("{}.{}", stmt.target, out.name);
                        if pending.insert(key, out.width).is_none() {
                            changed = true;
                        }
                    }
                }
            }

            if scope.ports.contains(&stmt.target) {
                continue;
            }
            // 整行字面量不构成总线，目标取其第 0 位
            let width = match stmt.expr.as_ref() {
                ExprKind::Number(_) => 1,
                expr => expr_width(expr, scope, program, &pending).max(1),
            };
            let entry = pending.entry(stmt.target.clone()).or_insert(0);
            if width > *entry {
                *entry = width;
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }

    pending
}
