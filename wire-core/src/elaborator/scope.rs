//! Elaboration scopes
//!
//! A scope maps local names to signals and records which names are buses.
//! Each inlined module gets its own scope, started as a copy of the caller's;
//! the caller only sees what is explicitly published back to it.

use crate::netlist::{InstanceId, SignalId};
use std::collections::{HashMap, HashSet};

/// Name → signal bookkeeping for one module body
#[derive(Debug, Clone, Default)]
pub struct Scope {
    /// Local name (`x`, `x[3]`, `inst.carry`) → signal
    pub signals: HashMap<String, SignalId>,
    /// Bus name → width (only widths > 1 are recorded)
    pub buses: HashMap<String, usize>,
    /// Prefix applied to the global names of signals created here
    pub prefix: String,
    /// Instance that owns signals created here
    pub instance: InstanceId,
    /// Module whose body is being elaborated
    pub module: String,
    /// Names bound from outside (parameters and outputs); never redeclared
    pub ports: HashSet<String>,
}

impl Scope {
    pub fn top(module: &str) -> Self {
        Self {
            module: module.to_string(),
            ..Default::default()
        }
    }

    /// Fresh scope for an inlined instance, seeded with a copy of this scope's maps
    pub fn child(&self, module: &str, prefix: String, instance: InstanceId) -> Self {
        Self {
            signals: self.signals.clone(),
            buses: self.buses.clone(),
            prefix,
            instance,
            module: module.to_string(),
            ports: HashSet::new(),
        }
    }

    pub fn is_bus(&self, name: &str) -> bool {
        self.buses.contains_key(name)
    }

    /// Width of `name` as currently known (1 for scalars)
    pub fn width_of(&self, name: &str) -> usize {
        self.buses.get(name).copied().unwrap_or(1)
    }

    /// Global name for a local name created in this scope
    pub fn global_name(&self, local: &str) -> String {
        format!("{}{}", self.prefix, local)
    }

    pub fn lookup(&self, name: &str) -> Option<SignalId> {
        self.signals.get(name).copied()
    }

    /// All bits of `name`, LSB first
    pub fn bits_of(&self, name: &str) -> Option<Vec<SignalId>> {
        match self.buses.get(name) {
            Some(&width) => (0..width)
                .map(|i| self.lookup(&bit_name(name, i)))
                .collect(),
            None => self.lookup(name).map(|id| vec![id]),
        }
    }

    /// Bind `name` to `bits`; more than one bit makes it a bus
    pub fn bind_bits(&mut self, name: &str, bits: &[SignalId]) {
        if bits.len() > 1 {
            self.buses.insert(name.to_string(), bits.len());
            for (i, &id) in bits.iter().enumerate() {
                self.signals.insert(bit_name(name, i), id);
            }
            self.signals.insert(name.to_string(), bits[0]);
        } else {
            self.buses.remove(name);
            if let Some(&id) = bits.first() {
                self.signals.insert(name.to_string(), id);
            }
        }
    }
}

/// `name[i]`
pub fn bit_name(name: &str, bit: usize) -> String {
    format!("{name}[{bit}]")
}
