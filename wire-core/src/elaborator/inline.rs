//! Module inlining
//!
//! A call to a user module is macro-expanded into the caller: arguments are
//! evaluated in the caller's scope, the body is elaborated in a child scope,
//! and only the first output (aliased onto the call target) and the member
//! outputs (`target.field`) are visible afterwards.

use super::scope::bit_name;
use super::{ElabError, Elaborator};
use crate::ast::{Expr, ModuleDecl};
use crate::netlist::{InstanceId, SignalId};
use tracing::debug;

impl<'p> Elaborator<'p> {
    pub(crate) fn inline_module(
        &mut self,
        module: &'p ModuleDecl,
        args: &[Expr],
        target: Option<&str>,
    ) -> Result<Vec<SignalId>, ElabError> {
        if self.depth >= self.config.max_inline_depth {
            return Err(ElabError::RecursionLimit {
                module: module.name.clone(),
                limit: self.config.max_inline_depth,
            });
        }
        if args.len() != module.params.len() {
            return Err(ElabError::ArityMismatch {
                callee: module.name.clone(),
                expected: module.params.len(),
                found: args.len(),
            });
        }

        // 1. 参数在父作用域中求值
        let arg_bits = args
            .iter()
            .map(|arg| self.eval_bits(arg))
            .collect::<Result<Vec<_>, _>>()?;

        // 2. 实例编号与前缀
        let parent_instance = self.scope().instance;
        let parent_prefix = self.scope().prefix.clone();
        let instance = self.netlist.instances.len();
        let prefix = format!("{}{}_{}_", parent_prefix, module.name, instance);
        self.netlist
            .add_instance(&module.name, parent_instance, &prefix);

        debug!(
            target: "wire::elaborator",
            module = %module.name,
            instance,
            depth = self.depth,
            "inlining"
        );

        let first_width = module.outputs.first().map_or(0, |o| o.width.max(1));
        let target = match target {
            Some(t) => t.to_string(),
            None => {
                let tmp = format!("{}_{}", module.name, instance);
                self.declare(&tmp, first_width);
                tmp
            }
        };

        // 3. 第一个输出直接别名到目标上
        let first_bits = if module.outputs.is_empty() {
            Vec::new()
        } else {
            self.first_output_bits(&target, first_width, &prefix, instance)?
        };

        let mut child = self.scope().child(&module.name, prefix.clone(), instance);

        for (param, bits) in module.params.iter().zip(&arg_bits) {
            let bits = self.resize(bits, param.width.max(1));
            self.alias_bits(&prefix, &param.name, &bits);
            child.bind_bits(&param.name, &bits);
            child.ports.insert(param.name.clone());
        }

        if let Some(first) = module.outputs.first() {
            self.alias_bits(&prefix, &first.name, &first_bits);
            child.bind_bits(&first.name, &first_bits);
            child.ports.insert(first.name.clone());
        }

        // 4. 其余输出：子作用域中的新信号，同时以 target.field 发布给父作用域
        for output in module.outputs.iter().skip(1) {
            let global = format!("{}{}", prefix, output.name);
            let bits = self.fresh_bits(&global, output.width.max(1), instance);
            child.bind_bits(&output.name, &bits);
            child.ports.insert(output.name.clone());

            let published = format!("{}.{}", target, output.name);
            self.alias_bits(&parent_prefix, &published, &bits);
            self.scope_mut().bind_bits(&published, &bits);
        }

        // 5. 在子作用域中处理模块体，然后丢弃子作用域
        self.depth += 1;
        self.enter_scope(child);
        let result = self.process_body(&module.statements);
        self.exit_scope();
        self.depth -= 1;
        result?;

        Ok(first_bits)
    }

    /// Signals backing the first output. The target's existing bits are
    /// reused; when the output is wider, a non-port target is upgraded to a
    /// bus in the caller's scope, while a port keeps its width and the extra
    /// bits live only inside the instance.
    fn first_output_bits(
        &mut self,
        target: &str,
        width: usize,
        prefix: &str,
        instance: InstanceId,
    ) -> Result<Vec<SignalId>, ElabError> {
        let mut bits = self
            .scope()
            .bits_of(target)
            .ok_or_else(|| self.unknown_signal(target))?;

        if bits.len() >= width {
            bits.truncate(width);
            return Ok(bits);
        }

        if self.scope().ports.contains(target) {
            debug!(
                target: "wire::elaborator",
                "port '{}' is narrower than the {}-bit result; upper bits stay inside {}",
                target,
                width,
                prefix
            );
            for i in bits.len()..width {
                let name = format!("{}{}", prefix, bit_name(target, i));
                bits.push(self.new_signal_global(&name, instance));
            }
            return Ok(bits);
        }

        debug!(
            target: "wire::elaborator",
            "upgrading '{}' from {} to {} bits",
            target,
            bits.len(),
            width
        );
        let owner = self.scope().instance;
        let base = self.scope().global_name(target);
        if bits.len() == 1 {
            self.netlist.alias(&bit_name(&base, 0), bits[0]);
        }
        for i in bits.len()..width {
            let name = self.scope().global_name(&bit_name(target, i));
            bits.push(self.new_signal_global(&name, owner));
        }
        self.scope_mut().bind_bits(target, &bits);
        Ok(bits)
    }

    /// Zero-extend or truncate `bits` to `width`
    pub(crate) fn resize(&self, bits: &[SignalId], width: usize) -> Vec<SignalId> {
        (0..width)
            .map(|i| bits.get(i).copied().unwrap_or(self.const_0))
            .collect()
    }

    fn fresh_bits(&mut self, global: &str, width: usize, instance: InstanceId) -> Vec<SignalId> {
        if width == 1 {
            return vec![self.new_signal_global(global, instance)];
        }
        (0..width)
            .map(|i| self.new_signal_global(&bit_name(global, i), instance))
            .collect()
    }

    /// Make instance-local names resolvable through the netlist's name map
    fn alias_bits(&mut self, prefix: &str, local: &str, bits: &[SignalId]) {
        match bits {
            [] => {}
            [single] => self.netlist.alias(&format!("{prefix}{local}"), *single),
            _ => {
                for (i, &id) in bits.iter().enumerate() {
                    self.netlist
                        .alias(&format!("{}{}", prefix, bit_name(local, i)), id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{elaborate, elaborate_with_config};
    use super::*;
    use crate::ast::*;
    use wire_config::ElabConfig;

    fn not1() -> ModuleDecl {
        ModuleDecl::new("not1")
            .param("a", 1)
            .output("out", 1)
            .assign("out", call("nand", vec![ident("a"), ident("a")]))
    }

    #[test]
    fn test_inlined_output_aliases_target() {
        let top = ModuleDecl::new("top")
            .param("x", 1)
            .output("y", 1)
            .assign("y", call("not1", vec![ident("x")]));
        let netlist = elaborate(&Program::new(vec![not1(), top]), "top").unwrap();
        // 没有额外的缓冲：nand + 子模块内部 out 的缓冲
        assert_eq!(netlist.nand_gates.len(), 3);
        let y = netlist.signal_id("y").unwrap();
        assert_eq!(netlist.signal_id("not1_1_out"), Some(y));
        assert_eq!(netlist.signal_id("not1_1_a"), netlist.signal_id("x"));
        assert_eq!(netlist.instances.len(), 2);
        assert_eq!(netlist.instances[1].parent, Some(0));
    }

    #[test]
    fn test_two_instances_get_distinct_internals() {
        let top = ModuleDecl::new("top")
            .param("a", 1)
            .param("b", 1)
            .output("p", 1)
            .output("q", 1)
            .assign("p", call("not1", vec![ident("a")]))
            .assign("q", call("not1", vec![ident("b")]));
        let netlist = elaborate(&Program::new(vec![not1(), top]), "top").unwrap();
        let first: Vec<_> = netlist.signals.iter().filter(|s| s.instance == 1).collect();
        let second: Vec<_> = netlist.signals.iter().filter(|s| s.instance == 2).collect();
        assert!(!first.is_empty());
        assert_eq!(first.len(), second.len());
        assert!(first.iter().all(|s| second.iter().all(|t| t.id != s.id)));
    }

    #[test]
    fn test_member_outputs_are_published() {
        let half = ModuleDecl::new("half")
            .param("a", 1)
            .param("b", 1)
            .output("sum", 1)
            .output("carry", 1)
            .assign("n", call("nand", vec![ident("a"), ident("b")]))
            .assign("carry", call("nand", vec![ident("n"), ident("n")]))
            .assign("sum", num(0));
        let top = ModuleDecl::new("top")
            .param("a", 1)
            .param("b", 1)
            .output("c", 1)
            .assign("h", call("half", vec![ident("a"), ident("b")]))
            .assign("c", member(ident("h"), "carry"));
        let netlist = elaborate(&Program::new(vec![half, top]), "top").unwrap();
        assert_eq!(netlist.signal_id("h.carry"), netlist.signal_id("half_1_carry"));
    }

    #[test]
    fn test_arity_mismatch() {
        let top = ModuleDecl::new("top")
            .param("x", 1)
            .output("y", 1)
            .assign("y", call("not1", vec![ident("x"), ident("x")]));
        let err = elaborate(&Program::new(vec![not1(), top]), "top").unwrap_err();
        assert_eq!(
            err,
            ElabError::ArityMismatch {
                callee: "not1".into(),
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn test_unknown_module_names_caller() {
        let top = ModuleDecl::new("top")
            .output("y", 1)
            .assign("y", call("missing", vec![]));
        let err = elaborate(&Program::new(vec![top]), "top").unwrap_err();
        assert_eq!(
            err,
            ElabError::UnknownModule {
                name: "missing".into(),
                caller: "top".into()
            }
        );
    }

    #[test]
    fn test_self_instantiation_hits_depth_limit() {
        let m = ModuleDecl::new("loop")
            .param("a", 1)
            .output("o", 1)
            .assign("o", call("loop", vec![ident("a")]));
        let config = ElabConfig { max_inline_depth: 8 };
        let err = elaborate_with_config(&Program::new(vec![m]), "loop", &config).unwrap_err();
        assert_eq!(
            err,
            ElabError::RecursionLimit {
                module: "loop".into(),
                limit: 8
            }
        );
    }

    #[test]
    fn test_scalar_target_is_upgraded_to_bus() {
        let wide = ModuleDecl::new("wide")
            .param("a", 1)
            .output("o", 3)
            .assign("o", concat(vec![ident("a"), ident("a"), ident("a")]));
        let program = Program::new(vec![wide]);
        let mut elab = Elaborator::new(&program, ElabConfig::default());
        elab.const_0 = elab.new_signal_global("const_0", 0);
        elab.driven[elab.const_0] = true;
        let a = elab.declare("a", 1);
        elab.driven[a[0]] = true;
        let x = elab.declare("x", 1);

        let module = &program.modules[0];
        let bits = elab.inline_module(module, &[ident("a")], Some("x")).unwrap();
        assert_eq!(bits.len(), 3);
        assert_eq!(bits[0], x[0]);
        assert!(elab.scope().is_bus("x"));
        assert_eq!(elab.scope().bits_of("x"), Some(bits));
        assert!(elab.netlist.signal_id("x[2]").is_some());
    }

    #[test]
    fn test_narrow_port_keeps_its_width() {
        let wide = ModuleDecl::new("wide")
            .param("a", 1)
            .output("o", 2)
            .assign("o", concat(vec![ident("a"), ident("a")]));
        let top = ModuleDecl::new("top")
            .param("x", 1)
            .output("y", 1)
            .assign("y", call("wide", vec![ident("x")]));
        let netlist = elaborate(&Program::new(vec![wide, top]), "top").unwrap();
        assert_eq!(netlist.primary_outputs.len(), 1);
    }
}
