//! Evaluation kernels
//!
//! One clock cycle is `evaluate_combinational`, then `update_sequential`,
//! then the cycle counter increment. Every combinational output settles
//! before any flip-flop captures, and every D input is sampled before any Q
//! output is written.
//!
//! `Kernel` walks the levelized gate objects; `BatchKernel` runs the same
//! algorithm over flat index arrays and the store's raw words. The two are
//! interchangeable and must agree bit for bit.

mod batch;

pub use batch::{evaluate_batch, update_dffs_batch, BatchKernel};

use crate::netlist::{LevelizedNetlist, SignalId};
use crate::store::SignalStore;
#[cfg(feature = "trace_execution")]
use tracing::trace;

/// A clocked evaluation engine over a [`SignalStore`]
pub trait Evaluator: Send {
    /// Settle every NAND gate, level by level
    fn evaluate_combinational(&self, store: &mut SignalStore);

    /// Sample every DFF D input, then write every Q output
    fn update_sequential(&mut self, store: &mut SignalStore);

    /// One full clock cycle
    fn cycle(&mut self, store: &mut SignalStore) {
        self.evaluate_combinational(store);
        self.update_sequential(store);
        store.increment_cycle();
    }

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy)]
struct Gate {
    in1: SignalId,
    in2: SignalId,
    out: SignalId,
}

#[derive(Debug, Clone, Copy)]
struct Flop {
    d: SignalId,
    q: SignalId,
}

/// Gate-by-gate kernel over the levelized netlist
#[derive(Debug, Clone)]
pub struct Kernel {
    levels: Vec<Vec<Gate>>,
    dffs: Vec<Flop>,
    scratch: Vec<bool>,
}

impl Kernel {
    pub fn new(levelized: &LevelizedNetlist) -> Self {
        let gates = &levelized.netlist.nand_gates;
        let levels = levelized
            .levels
            .iter()
            .map(|level| {
                level
                    .iter()
                    .map(|&g| Gate {
                        in1: gates[g].in1,
                        in2: gates[g].in2,
                        out: gates[g].out,
                    })
                    .collect()
            })
            .collect();
        let dffs: Vec<Flop> = levelized
            .netlist
            .dffs
            .iter()
            .map(|d| Flop { d: d.d, q: d.q })
            .collect();
        Self {
            levels,
            scratch: vec![false; dffs.len()],
            dffs,
        }
    }
}

impl Evaluator for Kernel {
    fn evaluate_combinational(&self, store: &mut SignalStore) {
        for (_level, gates) in self.levels.iter().enumerate() {
            for gate in gates {
                let a = store.read(gate.in1);
                let b = store.read(gate.in2);
                let out = !(a & b);
                #[cfg(feature = "trace_execution")]
                trace!(target: "wire::kernel", level = _level, signal = gate.out, a, b, out, "nand");
                store.write(gate.out, out);
            }
        }
    }

    fn update_sequential(&mut self, store: &mut SignalStore) {
        for (slot, dff) in self.scratch.iter_mut().zip(&self.dffs) {
            *slot = store.read(dff.d);
        }
        for (&value, dff) in self.scratch.iter().zip(&self.dffs) {
            store.write(dff.q, value);
        }
    }

    fn name(&self) -> &'static str {
        "object"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levelizer::levelize;
    use crate::netlist::Netlist;

    fn swap_pair() -> (LevelizedNetlist, SignalId, SignalId) {
        let mut n = Netlist::new("swap");
        let clk = n.add_signal("clk", 0);
        let q1 = n.add_signal("q1", 0);
        let q2 = n.add_signal("q2", 0);
        n.add_dff(q2, clk, q1, true);
        n.add_dff(q1, clk, q2, false);
        (levelize(n).unwrap(), q1, q2)
    }

    #[test]
    fn test_nand_truth_table() {
        let mut n = Netlist::new("nand");
        let a = n.add_signal("a", 0);
        let b = n.add_signal("b", 0);
        let y = n.add_signal("y", 0);
        n.add_nand(a, b, y);
        let lv = levelize(n).unwrap();
        let kernel = Kernel::new(&lv);
        let mut store = SignalStore::for_netlist(&lv.netlist);
        for (va, vb, expect) in [(false, false, true), (false, true, true), (true, false, true), (true, true, false)] {
            store.write(a, va);
            store.write(b, vb);
            kernel.evaluate_combinational(&mut store);
            assert_eq!(store.read(y), expect, "nand({va}, {vb})");
        }
    }

    #[test]
    fn test_cross_coupled_dffs_swap_in_one_cycle() {
        let (lv, q1, q2) = swap_pair();
        let mut kernel = Kernel::new(&lv);
        let mut store = SignalStore::for_netlist(&lv.netlist);
        assert!(store.read(q1));
        assert!(!store.read(q2));

        kernel.cycle(&mut store);
        assert!(!store.read(q1));
        assert!(store.read(q2));
        assert_eq!(store.cycle(), 1);

        kernel.cycle(&mut store);
        assert!(store.read(q1));
        assert!(!store.read(q2));
    }
}
