//! Elaborator: module hierarchy → flat NAND/DFF netlist
//!
//! Every call to a user module is inlined (macro-expanded) into the caller;
//! only `nand` and `dff` emit primitives. Each module body is processed in
//! three steps:
//!
//! 1. width inference over all statements (handles forward references),
//! 2. declaration of every target with its final width,
//! 3. statement processing in source order, wiring each result into its
//!    pre-declared target.
//!
//! The active scope is held by value and the enclosing scopes sit on an
//! explicit stack; a child scope starts as a copy of its parent and is
//! discarded when the inlined body is done.

mod error;
mod expr;
mod inline;
pub mod scope;
pub mod width;

pub use error::ElabError;
pub use scope::Scope;

use crate::ast::{ExprKind, Program, Statement};
use crate::netlist::{InstanceId, Netlist, SignalId, CONST_0, CONST_1};
use scope::bit_name;
use std::collections::HashSet;
use tracing::{debug, info, instrument, trace};
use wire_config::ElabConfig;

/// Elaborate `top` with the default configuration
pub fn elaborate(program: &Program, top: &str) -> Result<Netlist, ElabError> {
    Elaborator::new(program, ElabConfig::default()).run(top)
}

/// Elaborate `top` with an explicit configuration
pub fn elaborate_with_config(
    program: &Program,
    top: &str,
    config: &ElabConfig,
) -> Result<Netlist, ElabError> {
    Elaborator::new(program, config.clone()).run(top)
}

/// Single-use elaboration context
pub struct Elaborator<'p> {
    pub(crate) program: &'p Program,
    pub(crate) config: ElabConfig,
    pub(crate) netlist: Netlist,
    /// Active scope
    pub(crate) scope: Scope,
    /// Enclosing scopes, innermost last
    pub(crate) parents: Vec<Scope>,
    /// `driven[id]` is set once something drives signal `id`
    pub(crate) driven: Vec<bool>,
    pub(crate) depth: usize,
    pub(crate) const_0: SignalId,
    pub(crate) const_1: SignalId,
}

impl<'p> Elaborator<'p> {
    pub fn new(program: &'p Program, config: ElabConfig) -> Self {
        Self {
            program,
            config,
            netlist: Netlist::new(""),
            scope: Scope::default(),
            parents: Vec::new(),
            driven: Vec::new(),
            depth: 0,
            const_0: 0,
            const_1: 0,
        }
    }

    #[instrument(target = "wire::elaborator", skip(self), fields(modules = self.program.modules.len()))]
    pub fn run(mut self, top: &str) -> Result<Netlist, ElabError> {
        let program = self.program;
        let module = program
            .module(top)
            .ok_or_else(|| ElabError::MissingTopModule(top.to_string()))?;

        info!(target: "wire::elaborator", "Starting elaboration of '{}'", top);

        self.netlist = Netlist::new(top);
        self.scope = Scope::top(top);

        // 常量信号：只创建一次，之后按名字复用
        self.const_0 = self.new_signal_global(CONST_0, 0);
        self.const_1 = self.new_signal_global(CONST_1, 0);
        self.driven[self.const_0] = true;
        self.driven[self.const_1] = true;
        let (c0, c1) = (self.const_0, self.const_1);
        self.scope_mut().bind_bits(CONST_0, &[c0]);
        self.scope_mut().bind_bits(CONST_1, &[c1]);

        for param in &module.params {
            let bits = self.declare(&param.name, param.width);
            for &id in &bits {
                self.netlist.signals[id].is_primary_input = true;
                self.netlist.primary_inputs.push(id);
                self.driven[id] = true;
            }
            if param.width == 1 && matches!(param.name.as_str(), "clk" | "clock") {
                self.netlist.clock_signal = Some(bits[0]);
            }
            self.scope_mut().ports.insert(param.name.clone());
        }

        for output in &module.outputs {
            let bits = self.declare(&output.name, output.width);
            for &id in &bits {
                self.netlist.signals[id].is_primary_output = true;
                self.netlist.primary_outputs.push(id);
            }
            self.scope_mut().ports.insert(output.name.clone());
        }

        self.process_body(&module.statements)?;

        self.netlist.validate()?;

        let stats = self.netlist.stats();
        info!(
            target: "wire::elaborator",
            signals = stats.signals,
            nand_gates = stats.nand_gates,
            dffs = stats.dffs,
            instances = stats.instances,
            "Elaboration completed"
        );
        Ok(self.netlist)
    }

    /// Width inference, declaration and processing of one module body
    pub(crate) fn process_body(&mut self, statements: &[Statement]) -> Result<(), ElabError> {
        let widths = width::infer_widths(statements, self.scope(), self.program);

        let mut declared: HashSet<&str> = HashSet::new();
        for stmt in statements {
            let target = stmt.target.as_str();
            if self.scope().ports.contains(target) || !declared.insert(target) {
                continue;
            }
            let w = widths.get(target).copied().unwrap_or(1);
            let bits = self.declare(target, w);
            trace!(target: "wire::elaborator", name = target, width = w, first = bits[0], "declared target");
        }

        for stmt in statements {
            self.process_statement(stmt)?;
        }
        Ok(())
    }

    fn process_statement(&mut self, stmt: &Statement) -> Result<(), ElabError> {
        debug!(target: "wire::elaborator", "{} = {}", stmt.target, stmt.expr);

        let src = match stmt.expr.as_ref() {
            ExprKind::Call(call) => self.eval_call(call, Some(&stmt.target))?,
            expr => self.eval_bits(expr)?,
        };
        let dst = self.target_bits(&stmt.target)?;
        self.wire_bits(&src, &dst)
    }

    fn target_bits(&self, target: &str) -> Result<Vec<SignalId>, ElabError> {
        self.scope()
            .bits_of(target)
            .ok_or_else(|| self.unknown_signal(target))
    }

    /// Wire `src` into `dst` bit by bit, zero-extending or truncating `src`
    pub(crate) fn wire_bits(&mut self, src: &[SignalId], dst: &[SignalId]) -> Result<(), ElabError> {
        if src.len() > dst.len() {
            debug!(
                target: "wire::elaborator",
                "truncating {}-bit value into {}-bit target",
                src.len(),
                dst.len()
            );
        }
        for (i, &d) in dst.iter().enumerate() {
            let s = src.get(i).copied().unwrap_or(self.const_0);
            self.wire_into(s, d)?;
        }
        Ok(())
    }

    /// Copy `src` into `dst`: nothing when they are the same signal, otherwise
    /// an identity buffer `t = nand(src, src); dst = nand(t, t)`
    pub(crate) fn wire_into(&mut self, src: SignalId, dst: SignalId) -> Result<(), ElabError> {
        if src == dst {
            return Ok(());
        }
        self.claim_driver(dst)?;
        let t = self.new_gate_output();
        self.netlist.add_nand(src, src, t);
        self.netlist.add_nand(t, t, dst);
        Ok(())
    }

    pub(crate) fn claim_driver(&mut self, id: SignalId) -> Result<(), ElabError> {
        if self.driven[id] {
            return Err(ElabError::MultipleDrivers {
                name: self.netlist.signals[id].name.clone(),
            });
        }
        self.driven[id] = true;
        Ok(())
    }

    /// Create signals for `local` in the active scope: `prefix+local` for one
    /// bit, `prefix+local[i]` for a bus
    pub(crate) fn declare(&mut self, local: &str, width: usize) -> Vec<SignalId> {
        let width = width.max(1);
        let instance = self.scope().instance;
        let bits: Vec<SignalId> = if width == 1 {
            let name = self.scope().global_name(local);
            vec![self.new_signal_global(&name, instance)]
        } else {
            (0..width)
                .map(|i| {
                    let name = self.scope().global_name(&bit_name(local, i));
                    self.new_signal_global(&name, instance)
                })
                .collect()
        };
        self.scope_mut().bind_bits(local, &bits);
        bits
    }

    /// Output signal for a fresh NAND gate, named after the gate that will drive it
    pub(crate) fn new_gate_output(&mut self) -> SignalId {
        let name = format!("nand_{}", self.netlist.nand_gates.len());
        let instance = self.scope().instance;
        self.new_signal_global(&name, instance)
    }

    pub(crate) fn new_signal_global(&mut self, name: &str, instance: InstanceId) -> SignalId {
        let id = self.netlist.add_signal(name, instance);
        self.driven.push(false);
        id
    }

    pub(crate) fn scope(&self) -> &Scope {
        &self.scope
    }

    pub(crate) fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }

    /// Make `child` the active scope
    pub(crate) fn enter_scope(&mut self, child: Scope) {
        let parent = std::mem::replace(&mut self.scope, child);
        self.parents.push(parent);
    }

    /// Discard the active scope and reactivate its parent
    pub(crate) fn exit_scope(&mut self) {
        if let Some(parent) = self.parents.pop() {
            self.scope = parent;
        }
    }

    pub(crate) fn unknown_signal(&self, name: &str) -> ElabError {
        ElabError::UnknownSignal {
            name: name.to_string(),
            module: self.scope().module.clone(),
        }
    }
}
