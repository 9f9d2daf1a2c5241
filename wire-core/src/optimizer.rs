//! Netlist optimizer
//!
//! Works on the flat netlist and keeps the `SignalId` numbering intact: only
//! gates are rewritten or dropped, signals are never renumbered. Each pass
//!
//! 1. folds constants: `nand(const_0, x)` reads as `const_1`,
//!    `nand(const_1, const_1)` as `const_0`,
//! 2. bypasses identity buffers: readers of `nand(nand(s, s), nand(s, s))`
//!    read `s` directly,
//! 3. drops gates outside the fan-in cone of the primary outputs and the
//!    DFF inputs.
//!
//! Primary outputs keep their drivers, so their values are unchanged. Other
//! signals of an optimized netlist may stop being computed.

use crate::netlist::{Netlist, SignalId, CONST_0, CONST_1};
use serde::Serialize;
use tracing::{debug, info, instrument};
use wire_config::OptimizerConfig;

/// Outcome of [`optimize`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizeReport {
    /// The optimized netlist, or a copy of the input when not worth it
    pub netlist: Netlist,
    pub gates_before: usize,
    pub gates_after: usize,
    pub passes: usize,
    /// Whether the savings reached `min_savings_percent`
    pub applied: bool,
}

impl OptimizeReport {
    pub fn savings_percent(&self) -> f64 {
        savings(self.gates_before, self.gates_after)
    }
}

fn savings(before: usize, after: usize) -> f64 {
    if before == 0 {
        return 0.0;
    }
    (before.saturating_sub(after)) as f64 * 100.0 / before as f64
}

#[derive(Debug, Clone, Copy)]
struct Gate {
    in1: SignalId,
    in2: SignalId,
    out: SignalId,
}

struct Rewriter {
    gates: Vec<Gate>,
    /// Reader substitution; `subst[s] == s` when `s` is read as itself
    subst: Vec<SignalId>,
    driver: Vec<Option<usize>>,
    const_0: Option<SignalId>,
    const_1: Option<SignalId>,
}

impl Rewriter {
    fn new(netlist: &Netlist) -> Self {
        let gates = netlist
            .nand_gates
            .iter()
            .map(|g| Gate {
                in1: g.in1,
                in2: g.in2,
                out: g.out,
            })
            .collect();
        let mut rw = Self {
            gates,
            subst: (0..netlist.signals.len()).collect(),
            driver: Vec::new(),
            const_0: netlist.signal_id(CONST_0),
            const_1: netlist.signal_id(CONST_1),
        };
        rw.index_drivers();
        rw
    }

    fn index_drivers(&mut self) {
        self.driver = vec![None; self.subst.len()];
        for (i, g) in self.gates.iter().enumerate() {
            self.driver[g.out] = Some(i);
        }
    }

    fn resolve(&self, s: SignalId) -> SignalId {
        resolve_in(&self.subst, s)
    }

    /// Constant folding and buffer bypass; returns whether any reader changed
    fn substitute(&mut self) -> bool {
        let mut changed = false;
        for i in 0..self.gates.len() {
            let Gate { in1, in2, out } = self.gates[i];
            let (a, b) = (self.resolve(in1), self.resolve(in2));
            if self.subst[out] != out {
                continue;
            }

            let folded = match (self.const_0, self.const_1) {
                (Some(c0), Some(c1)) if a == c0 || b == c0 => Some(c1),
                (Some(c0), Some(c1)) if a == c1 && b == c1 => Some(c0),
                _ => None,
            };
            let bypass = if a == b {
                self.driver[a]
                    .map(|d| self.gates[d])
                    .filter(|inner| self.resolve(inner.in1) == self.resolve(inner.in2))
                    .map(|inner| self.resolve(inner.in1))
            } else {
                None
            };

            if let Some(target) = folded.or(bypass) {
                if target != out {
                    self.subst[out] = target;
                    changed = true;
                }
            }
        }

        for g in &mut self.gates {
            g.in1 = resolve_in(&self.subst, g.in1);
            g.in2 = resolve_in(&self.subst, g.in2);
        }
        changed
    }

    /// Keep only gates in the fan-in cone of `roots`
    fn sweep(&mut self, roots: &[SignalId]) -> usize {
        let mut live = vec![false; self.gates.len()];
        let mut stack: Vec<SignalId> = roots.to_vec();
        let mut seen = vec![false; self.subst.len()];
        while let Some(s) = stack.pop() {
            if std::mem::replace(&mut seen[s], true) {
                continue;
            }
            if let Some(g) = self.driver[s] {
                live[g] = true;
                stack.push(self.gates[g].in1);
                stack.push(self.gates[g].in2);
            }
        }
        let before = self.gates.len();
        let mut keep = live.into_iter();
        self.gates.retain(|_| keep.next().unwrap_or(false));
        self.index_drivers();
        before - self.gates.len()
    }
}

/// Follow a substitution chain; bounded so a combinational loop cannot spin
/// forever
fn resolve_in(subst: &[SignalId], mut s: SignalId) -> SignalId {
    for _ in 0..subst.len() {
        if subst[s] == s {
            break;
        }
        s = subst[s];
    }
    s
}

/// Shrink `netlist`; the result is used only when it saves at least
/// `min_savings_percent` of the gates
#[instrument(target = "wire::optimizer", skip_all, fields(gates = netlist.nand_gates.len()))]
pub fn optimize(netlist: &Netlist, config: &OptimizerConfig) -> OptimizeReport {
    let gates_before = netlist.nand_gates.len();
    let mut rw = Rewriter::new(netlist);
    let mut dffs = netlist.dffs.clone();

    let mut passes = 0;
    while passes < config.max_passes {
        passes += 1;
        let mut changed = rw.substitute();
        for dff in &mut dffs {
            dff.d = rw.resolve(dff.d);
            dff.clk = rw.resolve(dff.clk);
        }

        let mut roots: Vec<SignalId> = netlist.primary_outputs.clone();
        roots.extend(dffs.iter().flat_map(|d| [d.d, d.clk]));
        let removed = rw.sweep(&roots);
        changed |= removed > 0;

        debug!(target: "wire::optimizer", pass = passes, removed, gates = rw.gates.len(), "pass done");
        if !changed {
            break;
        }
    }

    let gates_after = rw.gates.len();
    let pct = savings(gates_before, gates_after);
    let applied = gates_before > 0 && pct >= config.min_savings_percent;

    let result = if applied {
        let mut out = netlist.clone();
        out.dffs = dffs;
        out.nand_gates.clear();
        for g in &rw.gates {
            out.add_nand(g.in1, g.in2, g.out);
        }
        out
    } else {
        netlist.clone()
    };

    info!(
        target: "wire::optimizer",
        gates_before,
        gates_after,
        savings_percent = pct,
        applied,
        "Optimization completed"
    );

    OptimizeReport {
        gates_after: result.nand_gates.len(),
        netlist: result,
        gates_before,
        passes,
        applied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use crate::elaborator::elaborate;
    use crate::levelizer::levelize;
    use crate::sim::Simulator;

    fn config(min: f64) -> OptimizerConfig {
        OptimizerConfig {
            enabled: true,
            min_savings_percent: min,
            max_passes: 8,
        }
    }

    /// and2 through two levels of plain assignment, plus an unused wire
    fn buffered_and() -> Program {
        let and2 = ModuleDecl::new("and2")
            .param("a", 1)
            .param("b", 1)
            .output("o", 1)
            .assign("n", call("nand", vec![ident("a"), ident("b")]))
            .assign("o", call("nand", vec![ident("n"), ident("n")]));
        let top = ModuleDecl::new("top")
            .param("x", 1)
            .param("y", 1)
            .output("z", 1)
            .assign("t", ident("x"))
            .assign("u", ident("t"))
            .assign("unused", call("nand", vec![ident("x"), num(0)]))
            .assign("z", call("and2", vec![ident("u"), ident("y")]));
        Program::new(vec![and2, top])
    }

    #[test]
    fn test_optimizer_shrinks_and_preserves_outputs() {
        let original = elaborate(&buffered_and(), "top").unwrap();
        let report = optimize(&original, &config(0.0));
        assert!(report.applied);
        assert!(report.gates_after < report.gates_before);
        assert_eq!(report.netlist.signals.len(), original.signals.len());

        let mut a = Simulator::new(levelize(original).unwrap());
        let mut b = Simulator::new(levelize(report.netlist).unwrap());
        for (x, y) in [(false, false), (false, true), (true, false), (true, true)] {
            for sim in [&mut a, &mut b] {
                sim.set("x", x).unwrap();
                sim.set("y", y).unwrap();
                sim.evaluate();
            }
            assert_eq!(a.get("z").unwrap(), x && y);
            assert_eq!(b.get("z").unwrap(), x && y);
        }
    }

    #[test]
    fn test_small_savings_are_discarded() {
        let original = elaborate(&buffered_and(), "top").unwrap();
        let report = optimize(&original, &config(101.0));
        assert!(!report.applied);
        assert_eq!(report.netlist, original);
        assert_eq!(report.gates_after, report.gates_before);
    }

    #[test]
    fn test_constant_input_folds_to_const_1() {
        let mut n = Netlist::new("t");
        let c0 = n.add_signal(CONST_0, 0);
        let c1 = n.add_signal(CONST_1, 0);
        let a = n.add_signal("a", 0);
        let k = n.add_signal("k", 0);
        let o = n.add_signal("o", 0);
        n.primary_outputs.push(o);
        n.add_nand(a, c0, k);
        n.add_nand(k, k, o);
        let report = optimize(&n, &config(0.0));
        // k reads as const_1, its gate becomes dead
        assert_eq!(report.netlist.nand_gates.len(), 1);
        assert_eq!(report.netlist.nand_gates[0].in1, c1);
        assert_eq!(report.netlist.nand_gates[0].out, o);
    }
}
