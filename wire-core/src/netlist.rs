//! Flat netlist: signals, NAND gates and D flip-flops
//!
//! Produced by the elaborator, consumed by the levelizer, the optimizer and
//! the simulator. All of them share the `SignalId` numbering assigned here.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Dense index into `Netlist::signals`, never reused
pub type SignalId = usize;
/// Index into `Netlist::nand_gates`
pub type GateId = usize;
/// Index into `Netlist::instances`
pub type InstanceId = usize;

/// Name of the constant-0 signal
pub const CONST_0: &str = "const_0";
/// Name of the constant-1 signal, the only signal with a non-zero reset value
pub const CONST_1: &str = "const_1";

/// One bit of state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signal {
    pub id: SignalId,
    pub name: String,
    pub is_primary_input: bool,
    pub is_primary_output: bool,
    pub is_dff_output: bool,
    /// Module instance that created this signal (0 = top)
    pub instance: InstanceId,
}

/// `out = NOT(in1 AND in2)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NandGate {
    pub id: GateId,
    pub in1: SignalId,
    pub in2: SignalId,
    pub out: SignalId,
    /// Assigned by the levelizer
    pub level: Option<usize>,
}

/// Edge-triggered flip-flop; `q` is a state element, never a gate output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dff {
    pub id: usize,
    pub d: SignalId,
    pub clk: SignalId,
    pub q: SignalId,
    pub initial_value: bool,
}

/// Node of the instantiation tree recorded during inlining
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instance {
    pub id: InstanceId,
    pub module: String,
    pub parent: Option<InstanceId>,
    /// Name prefix given to signals created inside this instance
    pub prefix: String,
}

/// Flattened circuit with no remaining module hierarchy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Netlist {
    pub top: String,
    pub signals: Vec<Signal>,
    pub nand_gates: Vec<NandGate>,
    pub dffs: Vec<Dff>,
    pub signal_map: BTreeMap<String, SignalId>,
    pub primary_inputs: Vec<SignalId>,
    pub primary_outputs: Vec<SignalId>,
    pub clock_signal: Option<SignalId>,
    pub instances: Vec<Instance>,
}

/// Netlist with gates partitioned into dependency levels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelizedNetlist {
    pub netlist: Netlist,
    /// `levels[l - 1]` holds the ids of all gates at level `l` (level 0 is
    /// the sources, which have no gates)
    pub levels: Vec<Vec<GateId>>,
}

/// Size summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NetlistStats {
    pub signals: usize,
    pub nand_gates: usize,
    pub dffs: usize,
    pub primary_inputs: usize,
    pub primary_outputs: usize,
    pub instances: usize,
}

/// Structural defects found by `Netlist::validate`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetlistError {
    #[error("{owner} references signal {signal}, but the netlist has only {count} signals")]
    DanglingSignal {
        owner: String,
        signal: SignalId,
        count: usize,
    },

    #[error("signal '{name}' is a DFF output but is also driven by gate {gate}")]
    DffOutputDriven { name: String, gate: GateId },

    #[error("signal '{name}' has more than one driver")]
    MultipleDrivers { name: String },
}

impl Netlist {
    pub fn new(top: &str) -> Self {
        Self {
            top: top.to_string(),
            signals: Vec::new(),
            nand_gates: Vec::new(),
            dffs: Vec::new(),
            signal_map: BTreeMap::new(),
            primary_inputs: Vec::new(),
            primary_outputs: Vec::new(),
            clock_signal: None,
            instances: vec![Instance {
                id: 0,
                module: top.to_string(),
                parent: None,
                prefix: String::new(),
            }],
        }
    }

    /// Create a new one-bit signal; the first signal to claim a name owns it in `signal_map`
    pub fn add_signal(&mut self, name: &str, instance: InstanceId) -> SignalId {
        let id = self.signals.len();
        self.signals.push(Signal {
            id,
            name: name.to_string(),
            is_primary_input: false,
            is_primary_output: false,
            is_dff_output: false,
            instance,
        });
        self.signal_map.entry(name.to_string()).or_insert(id);
        id
    }

    /// Register an additional lookup name for an existing signal
    pub fn alias(&mut self, name: &str, id: SignalId) {
        self.signal_map.entry(name.to_string()).or_insert(id);
    }

    pub fn add_nand(&mut self, in1: SignalId, in2: SignalId, out: SignalId) -> GateId {
        let id = self.nand_gates.len();
        self.nand_gates.push(NandGate {
            id,
            in1,
            in2,
            out,
            level: None,
        });
        id
    }

    pub fn add_dff(&mut self, d: SignalId, clk: SignalId, q: SignalId, initial_value: bool) -> usize {
        let id = self.dffs.len();
        self.signals[q].is_dff_output = true;
        self.dffs.push(Dff {
            id,
            d,
            clk,
            q,
            initial_value,
        });
        id
    }

    pub fn add_instance(&mut self, module: &str, parent: InstanceId, prefix: &str) -> InstanceId {
        let id = self.instances.len();
        self.instances.push(Instance {
            id,
            module: module.to_string(),
            parent: Some(parent),
            prefix: prefix.to_string(),
        });
        id
    }

    pub fn signal(&self, id: SignalId) -> &Signal {
        &self.signals[id]
    }

    pub fn signal_id(&self, name: &str) -> Option<SignalId> {
        self.signal_map.get(name).copied()
    }

    /// Names of the module instances from the top down to `instance`
    pub fn instance_path(&self, instance: InstanceId) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self.instances.get(instance);
        while let Some(inst) = current {
            path.push(inst.module.as_str());
            current = inst.parent.and_then(|p| self.instances.get(p));
        }
        path.reverse();
        path
    }

    pub fn stats(&self) -> NetlistStats {
        NetlistStats {
            signals: self.signals.len(),
            nand_gates: self.nand_gates.len(),
            dffs: self.dffs.len(),
            primary_inputs: self.primary_inputs.len(),
            primary_outputs: self.primary_outputs.len(),
            instances: self.instances.len(),
        }
    }

    /// Check that every referenced `SignalId` exists and each signal has at most one driver
    pub fn validate(&self) -> Result<(), NetlistError> {
        let count = self.signals.len();
        let check = |owner: String, signal: SignalId| {
            if signal < count {
                Ok(())
            } else {
                Err(NetlistError::DanglingSignal {
                    owner,
                    signal,
                    count,
                })
            }
        };

        for gate in &self.nand_gates {
            for sig in [gate.in1, gate.in2, gate.out] {
                check(format!("nand gate {}", gate.id), sig)?;
            }
        }
        for dff in &self.dffs {
            for sig in [dff.d, dff.clk, dff.q] {
                check(format!("dff {}", dff.id), sig)?;
            }
        }
        for &sig in self.primary_inputs.iter().chain(&self.primary_outputs) {
            check("primary port list".to_string(), sig)?;
        }
        for (name, &sig) in &self.signal_map {
            check(format!("signal map entry '{name}'"), sig)?;
        }
        if let Some(clk) = self.clock_signal {
            check("clock signal".to_string(), clk)?;
        }

        let mut driven = vec![false; count];
        for dff in &self.dffs {
            if driven[dff.q] {
                return Err(NetlistError::MultipleDrivers {
                    name: self.signals[dff.q].name.clone(),
                });
            }
            driven[dff.q] = true;
        }
        for gate in &self.nand_gates {
            if self.signals[gate.out].is_dff_output {
                return Err(NetlistError::DffOutputDriven {
                    name: self.signals[gate.out].name.clone(),
                    gate: gate.id,
                });
            }
            if driven[gate.out] {
                return Err(NetlistError::MultipleDrivers {
                    name: self.signals[gate.out].name.clone(),
                });
            }
            driven[gate.out] = true;
        }
        Ok(())
    }
}

impl LevelizedNetlist {
    /// Number of levels (critical path length in gates)
    pub fn depth(&self) -> usize {
        self.levels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inverter() -> Netlist {
        let mut n = Netlist::new("inv");
        let a = n.add_signal("a", 0);
        let out = n.add_signal("out", 0);
        n.primary_inputs.push(a);
        n.primary_outputs.push(out);
        n.add_nand(a, a, out);
        n
    }

    #[test]
    fn test_add_signal_assigns_dense_ids() {
        let n = inverter();
        assert_eq!(n.signal_id("a"), Some(0));
        assert_eq!(n.signal_id("out"), Some(1));
        assert_eq!(n.stats().nand_gates, 1);
        assert!(n.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_dangling_reference() {
        let mut n = inverter();
        n.add_nand(0, 7, 1);
        assert!(matches!(
            n.validate(),
            Err(NetlistError::DanglingSignal { signal: 7, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_gate_driving_dff_output() {
        let mut n = inverter();
        let q = n.add_signal("q", 0);
        n.add_dff(0, 0, q, false);
        n.add_nand(0, 0, q);
        assert!(matches!(n.validate(), Err(NetlistError::DffOutputDriven { .. })));
    }

    #[test]
    fn test_first_name_wins() {
        let mut n = Netlist::new("t");
        let first = n.add_signal("x", 0);
        n.add_signal("x", 0);
        assert_eq!(n.signal_id("x"), Some(first));
    }

    #[test]
    fn test_instance_path() {
        let mut n = Netlist::new("top");
        let a = n.add_instance("adder", 0, "adder_1_");
        let b = n.add_instance("half", a, "adder_1_half_2_");
        assert_eq!(n.instance_path(b), vec!["top", "adder", "half"]);
    }
}
