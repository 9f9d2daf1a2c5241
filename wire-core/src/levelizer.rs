//! Levelizer: topological levels for NAND gates
//!
//! Primary inputs, constants, DFF outputs and undriven signals are level-0
//! sources. A gate sits one level above the highest gate that drives one of
//! its inputs, so a gate reading only sources is at level 1. A gate that
//! can never be placed belongs to (or hangs off) a combinational cycle.

use crate::netlist::{GateId, LevelizedNetlist, Netlist, NetlistError};
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Levelization failure; a design defect, not an elaboration error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LevelizeError {
    /// 组合环：环上各门的输出信号，按信号流向排列
    #[error("combinational cycle through {}", .signals.join(" -> "))]
    CombinationalCycle { signals: Vec<String> },

    #[error("invalid netlist: {0}")]
    InvalidNetlist(#[from] NetlistError),
}

/// Assign every gate its level and group gates by level
#[instrument(target = "wire::levelizer", skip_all, fields(gates = netlist.nand_gates.len()))]
pub fn levelize(mut netlist: Netlist) -> Result<LevelizedNetlist, LevelizeError> {
    netlist.validate()?;

    let gate_count = netlist.nand_gates.len();
    let mut driver: Vec<Option<GateId>> = vec![None; netlist.signals.len()];
    for gate in &netlist.nand_gates {
        driver[gate.out] = Some(gate.id);
    }

    // 依赖边：驱动门 -> 读取门
    let mut deps: Vec<Vec<GateId>> = Vec::with_capacity(gate_count);
    let mut readers: Vec<Vec<GateId>> = vec![Vec::new(); gate_count];
    for gate in &netlist.nand_gates {
        let mut d: Vec<GateId> = [gate.in1, gate.in2]
            .iter()
            .filter_map(|&s| driver[s])
            .collect();
        d.dedup();
        for &src in &d {
            readers[src].push(gate.id);
        }
        deps.push(d);
    }

    // Kahn
    let mut pending: Vec<usize> = deps.iter().map(Vec::len).collect();
    let mut level: Vec<Option<usize>> = vec![None; gate_count];
    let mut queue: Vec<GateId> = (0..gate_count).filter(|&g| pending[g] == 0).collect();
    let mut head = 0;
    while head < queue.len() {
        let g = queue[head];
        head += 1;
        let l = deps[g]
            .iter()
            .filter_map(|&d| level[d])
            .max()
            .map_or(1, |m| m + 1);
        level[g] = Some(l);
        for &r in &readers[g] {
            pending[r] -= 1;
            if pending[r] == 0 {
                queue.push(r);
            }
        }
    }

    if queue.len() < gate_count {
        let signals = find_cycle(&netlist, &deps, &level);
        debug!(
            target: "wire::levelizer",
            unplaced = gate_count - queue.len(),
            "combinational cycle detected"
        );
        return Err(LevelizeError::CombinationalCycle { signals });
    }

    let depth = level.iter().flatten().max().copied().unwrap_or(0);
    let mut levels: Vec<Vec<GateId>> = vec![Vec::new(); depth];
    for (gate, l) in netlist.nand_gates.iter_mut().zip(&level) {
        gate.level = *l;
        if let Some(l) = *l {
            levels[l - 1].push(gate.id);
        }
    }

    info!(target: "wire::levelizer", gates = gate_count, depth, "Levelization completed");
    Ok(LevelizedNetlist { netlist, levels })
}

/// Walk backwards from an unplaced gate through unplaced drivers until a gate
/// repeats; the repeated stretch is a cycle
fn find_cycle(netlist: &Netlist, deps: &[Vec<GateId>], level: &[Option<usize>]) -> Vec<String> {
    let Some(start) = level.iter().position(Option::is_none) else {
        return Vec::new();
    };

    let mut path: Vec<GateId> = Vec::new();
    let mut seen_at: Vec<Option<usize>> = vec![None; deps.len()];
    let mut current = start;
    loop {
        if let Some(pos) = seen_at[current] {
            let mut cycle: Vec<GateId> = path[pos..].to_vec();
            // 回溯得到的是逆信号流向
            cycle.reverse();
            return cycle
                .iter()
                .map(|&g| netlist.signals[netlist.nand_gates[g].out].name.clone())
                .collect();
        }
        seen_at[current] = Some(path.len());
        path.push(current);
        match deps[current].iter().find(|&&d| level[d].is_none()) {
            Some(&next) => current = next,
            None => return Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// a -> nand -> x -> nand -> y, and z = nand(a, y)
    fn chain() -> Netlist {
        let mut n = Netlist::new("chain");
        let a = n.add_signal("a", 0);
        let x = n.add_signal("x", 0);
        let y = n.add_signal("y", 0);
        let z = n.add_signal("z", 0);
        n.primary_inputs.push(a);
        n.add_nand(x, x, y);
        n.add_nand(a, a, x);
        n.add_nand(a, y, z);
        n
    }

    #[test]
    fn test_levels_follow_dependencies() {
        let lv = levelize(chain()).unwrap();
        let levels: Vec<_> = lv.netlist.nand_gates.iter().map(|g| g.level).collect();
        assert_eq!(levels, vec![Some(2), Some(1), Some(3)]);
        assert_eq!(lv.levels, vec![vec![1], vec![0], vec![2]]);
        assert_eq!(lv.depth(), 3);
    }

    #[test]
    fn test_every_input_is_resolved_by_an_earlier_level() {
        let lv = levelize(chain()).unwrap();
        let n = &lv.netlist;
        for gate in &n.nand_gates {
            for input in [gate.in1, gate.in2] {
                if let Some(src) = n.nand_gates.iter().find(|g| g.out == input) {
                    assert!(src.level < gate.level);
                }
            }
        }
    }

    #[test]
    fn test_dff_breaks_feedback() {
        let mut n = Netlist::new("toggle");
        let clk = n.add_signal("clk", 0);
        let q = n.add_signal("q", 0);
        let nq = n.add_signal("nq", 0);
        n.add_dff(nq, clk, q, false);
        n.add_nand(q, q, nq);
        let lv = levelize(n).unwrap();
        assert_eq!(lv.netlist.nand_gates[0].level, Some(1));
        assert_eq!(lv.levels, vec![vec![0]]);
    }

    #[test]
    fn test_cycle_is_rejected_with_its_signals() {
        let mut n = Netlist::new("latch");
        let s = n.add_signal("s", 0);
        let q = n.add_signal("q", 0);
        let nq = n.add_signal("nq", 0);
        n.add_nand(s, nq, q);
        n.add_nand(q, q, nq);
        match levelize(n) {
            Err(LevelizeError::CombinationalCycle { signals }) => {
                assert_eq!(signals.len(), 2);
                assert!(signals.contains(&"q".to_string()));
                assert!(signals.contains(&"nq".to_string()));
            }
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_cycle_is_found_from_a_downstream_gate() {
        let mut n = Netlist::new("t");
        let a = n.add_signal("a", 0);
        let b = n.add_signal("b", 0);
        let c = n.add_signal("c", 0);
        let d = n.add_signal("d", 0);
        n.add_nand(a, c, d);
        n.add_nand(b, b, a);
        n.add_nand(a, a, b);
        let err = levelize(n).unwrap_err();
        assert_eq!(
            err,
            LevelizeError::CombinationalCycle {
                signals: vec!["b".to_string(), "a".to_string()]
            }
        );
    }

    #[test]
    fn test_invalid_netlist_is_its_own_error() {
        let mut n = Netlist::new("t");
        let a = n.add_signal("a", 0);
        n.add_nand(a, 9, a);
        assert!(matches!(levelize(n), Err(LevelizeError::InvalidNetlist(_))));
    }
}
