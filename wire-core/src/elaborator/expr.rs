//! Expression evaluation during elaboration
//!
//! `eval_bits` produces every bit of an expression (LSB first) and emits the
//! gates it needs. `eval_bit` addresses a single bit; for call-free
//! expressions it resolves the bit without materializing the whole value.

use super::scope::bit_name;
use super::width::{self, DFF, NAND};
use super::{ElabError, Elaborator};
use crate::ast::{Call, ExprKind};
use crate::netlist::SignalId;
use std::collections::HashMap;

/// Locate bit `k` of a concatenation whose parts (MSB-first, as written) have
/// the given widths. Storage is LSB-first, so the walk starts at the rightmost
/// part. Returns `(part index, bit offset inside the part)`.
pub fn locate_concat_bit(widths: &[usize], k: usize) -> Option<(usize, usize)> {
    let mut acc = 0;
    for (idx, &w) in widths.iter().enumerate().rev() {
        if k < acc + w {
            return Some((idx, k - acc));
        }
        acc += w;
    }
    None
}

impl<'p> Elaborator<'p> {
    pub(crate) fn const_bit(&self, bit: bool) -> SignalId {
        if bit {
            self.const_1
        } else {
            self.const_0
        }
    }

    /// All bits of `expr`, LSB first
    pub(crate) fn eval_bits(&mut self, expr: &ExprKind) -> Result<Vec<SignalId>, ElabError> {
        match expr {
            ExprKind::Number(n) => {
                let w = width::literal_width(n.value);
                Ok((0..w).map(|k| self.const_bit((n.value >> k) & 1 == 1)).collect())
            }
            ExprKind::Identifier(id) => self
                .scope()
                .bits_of(&id.name)
                .ok_or_else(|| self.unknown_signal(&id.name)),
            ExprKind::Index(i) => Ok(vec![self.eval_bit(&i.object, i.index)?]),
            ExprKind::Slice(s) => {
                if s.end < s.start {
                    return Err(ElabError::MalformedExpr {
                        expr: expr.to_string(),
                        reason: "slice end is below its start".to_string(),
                    });
                }
                let base = self.eval_bits(&s.object)?;
                Ok((s.start..=s.end)
                    .map(|i| base.get(i).copied().unwrap_or(self.const_0))
                    .collect())
            }
            ExprKind::Member(m) => {
                let name = member_name(expr, &m.object, &m.field)?;
                self.scope()
                    .bits_of(&name)
                    .ok_or_else(|| self.unknown_signal(&name))
            }
            ExprKind::Concat(c) => {
                let parts = c
                    .parts
                    .iter()
                    .map(|p| self.eval_bits(p))
                    .collect::<Result<Vec<_>, _>>()?;
                let widths: Vec<usize> = parts.iter().map(Vec::len).collect();
                let total: usize = widths.iter().sum();
                Ok((0..total)
                    .filter_map(|k| locate_concat_bit(&widths, k))
                    .map(|(p, off)| parts[p][off])
                    .collect())
            }
            ExprKind::Call(call) => self.eval_call(call, None),
        }
    }

    /// Bit `k` of `expr`; bits past the expression's width read as `const_0`
    pub(crate) fn eval_bit(&mut self, expr: &ExprKind, k: usize) -> Result<SignalId, ElabError> {
        match expr {
            ExprKind::Number(n) => Ok(self.const_bit(k < 64 && (n.value >> k) & 1 == 1)),
            ExprKind::Identifier(id) => self.named_bit(&id.name, k),
            ExprKind::Index(i) => {
                if k == 0 {
                    self.eval_bit(&i.object, i.index)
                } else {
                    Ok(self.const_0)
                }
            }
            ExprKind::Slice(s) => {
                if s.end < s.start {
                    return Err(ElabError::MalformedExpr {
                        expr: expr.to_string(),
                        reason: "slice end is below its start".to_string(),
                    });
                }
                if k > s.end - s.start {
                    Ok(self.const_0)
                } else {
                    self.eval_bit(&s.object, s.start + k)
                }
            }
            ExprKind::Member(m) => {
                let name = member_name(expr, &m.object, &m.field)?;
                self.named_bit(&name, k)
            }
            ExprKind::Concat(c) => {
                let empty = HashMap::new();
                let widths: Vec<usize> = c
                    .parts
                    .iter()
                    .map(|p| width::expr_width(p, self.scope(), self.program, &empty))
                    .collect();
                match locate_concat_bit(&widths, k) {
                    Some((p, off)) => self.eval_bit(&c.parts[p], off),
                    None => Ok(self.const_0),
                }
            }
            ExprKind::Call(call) => {
                let bits = self.eval_call(call, None)?;
                Ok(bits.get(k).copied().unwrap_or(self.const_0))
            }
        }
    }

    /// Bus identifiers index their `[k]` signal; scalars zero-extend
    fn named_bit(&self, name: &str, k: usize) -> Result<SignalId, ElabError> {
        let scope = self.scope();
        if scope.is_bus(name) {
            if k >= scope.width_of(name) {
                return Ok(self.const_0);
            }
            return scope
                .lookup(&bit_name(name, k))
                .ok_or_else(|| self.unknown_signal(&bit_name(name, k)));
        }
        let id = scope
            .lookup(name)
            .ok_or_else(|| self.unknown_signal(name))?;
        Ok(if k == 0 { id } else { self.const_0 })
    }

    /// Evaluate a call. `target` names the statement target when the call is
    /// the whole right-hand side; nested calls get a temporary target.
    pub(crate) fn eval_call(
        &mut self,
        call: &Call,
        target: Option<&str>,
    ) -> Result<Vec<SignalId>, ElabError> {
        match call.callee.as_str() {
            NAND => {
                check_arity(call, 2)?;
                let a = self.eval_bit(&call.args[0], 0)?;
                let b = self.eval_bit(&call.args[1], 0)?;
                let out = self.new_gate_output();
                self.claim_driver(out)?;
                self.netlist.add_nand(a, b, out);
                Ok(vec![out])
            }
            DFF => {
                check_arity(call, 2)?;
                let d = self.eval_bit(&call.args[0], 0)?;
                let clk = self.eval_bit(&call.args[1], 0)?;
                let name = format!("dff_{}", self.netlist.dffs.len());
                let instance = self.scope().instance;
                let q = self.new_signal_global(&name, instance);
                self.claim_driver(q)?;
                self.netlist.add_dff(d, clk, q, false);
                Ok(vec![q])
            }
            callee => {
                let program = self.program;
                let module = program.module(callee).ok_or_else(|| ElabError::UnknownModule {
                    name: callee.to_string(),
                    caller: self.scope().module.clone(),
                })?;
                self.inline_module(module, &call.args, target)
            }
        }
    }
}

fn check_arity(call: &Call, expected: usize) -> Result<(), ElabError> {
    if call.args.len() != expected {
        return Err(ElabError::ArityMismatch {
            callee: call.callee.clone(),
            expected,
            found: call.args.len(),
        });
    }
    Ok(())
}

/// `inst.field`; only identifiers can be the object of a member access
fn member_name(expr: &ExprKind, object: &ExprKind, field: &str) -> Result<String, ElabError> {
    match object {
        ExprKind::Identifier(id) => Ok(format!("{}.{}", id.name, field)),
        _ => Err(ElabError::MalformedExpr {
            expr: expr.to_string(),
            reason: "member access needs an instance name on the left".to_string(),
        }),
    }
}
