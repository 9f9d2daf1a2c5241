//! 测试辅助工具
//!
//! 常用电路模块、仿真器构建、测试日志和可复现的随机输入

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;
use wire_core::ast::*;
use wire_core::{elaborate, levelize, KernelKind, SimConfig, Simulator};

// ===== 测试日志 =====

/// Route `wire::*` logs into the test harness output (`RUST_LOG` filters)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ===== 模块库 =====

pub fn not1() -> ModuleDecl {
    ModuleDecl::new("not1")
        .param("a", 1)
        .output("out", 1)
        .assign("out", call("nand", vec![ident("a"), ident("a")]))
}

/// AND from two chained NANDs
pub fn and2() -> ModuleDecl {
    ModuleDecl::new("and2")
        .param("a", 1)
        .param("b", 1)
        .output("out", 1)
        .assign("n", call("nand", vec![ident("a"), ident("b")]))
        .assign("out", call("nand", vec![ident("n"), ident("n")]))
}

pub fn xor2() -> ModuleDecl {
    ModuleDecl::new("xor2")
        .param("a", 1)
        .param("b", 1)
        .output("out", 1)
        .assign("n", call("nand", vec![ident("a"), ident("b")]))
        .assign(
            "out",
            call(
                "nand",
                vec![
                    call("nand", vec![ident("a"), ident("n")]),
                    call("nand", vec![ident("b"), ident("n")]),
                ],
            ),
        )
}

pub fn half_adder() -> ModuleDecl {
    ModuleDecl::new("half_adder")
        .param("a", 1)
        .param("b", 1)
        .output("sum", 1)
        .output("carry", 1)
        .assign("sum", call("xor2", vec![ident("a"), ident("b")]))
        .assign("carry", call("and2", vec![ident("a"), ident("b")]))
}

/// `q = dff(in, clk)`
pub fn reg() -> ModuleDecl {
    ModuleDecl::new("reg")
        .param("in", 1)
        .param("clk", 1)
        .output("q", 1)
        .assign("q", call("dff", vec![ident("in"), ident("clk")]))
}

/// 2-bit counter; `n0` and `n1` are read before the lines that define them
pub fn counter() -> ModuleDecl {
    ModuleDecl::new("counter")
        .param("clk", 1)
        .output("count", 2)
        .assign("c0", call("dff", vec![ident("n0"), ident("clk")]))
        .assign("n0", call("not1", vec![ident("c0")]))
        .assign("c1", call("dff", vec![ident("n1"), ident("clk")]))
        .assign("n1", call("xor2", vec![ident("c1"), ident("c0")]))
        .assign("count", concat(vec![ident("c1"), ident("c0")]))
}

/// 4-bit ripple adder over half adders, with an enable-style DFF stage
pub fn adder4() -> ModuleDecl {
    ModuleDecl::new("adder4")
        .param("a", 4)
        .param("b", 4)
        .param("clk", 1)
        .output("s", 4)
        .output("r", 4)
        .assign("h0", call("half_adder", vec![index(ident("a"), 0), index(ident("b"), 0)]))
        .assign("f1", call("full_adder", vec![index(ident("a"), 1), index(ident("b"), 1), member(ident("h0"), "carry")]))
        .assign("f2", call("full_adder", vec![index(ident("a"), 2), index(ident("b"), 2), member(ident("f1"), "cout")]))
        .assign("f3", call("full_adder", vec![index(ident("a"), 3), index(ident("b"), 3), member(ident("f2"), "cout")]))
        .assign("s", concat(vec![ident("f3"), ident("f2"), ident("f1"), ident("h0")]))
        .assign("r0", call("dff", vec![index(ident("s"), 0), ident("clk")]))
        .assign("r1", call("dff", vec![index(ident("s"), 1), ident("clk")]))
        .assign("r2", call("dff", vec![index(ident("s"), 2), ident("clk")]))
        .assign("r3", call("dff", vec![index(ident("s"), 3), ident("clk")]))
        .assign("r", concat(vec![ident("r3"), ident("r2"), ident("r1"), ident("r0")]))
}

pub fn full_adder() -> ModuleDecl {
    ModuleDecl::new("full_adder")
        .param("a", 1)
        .param("b", 1)
        .param("cin", 1)
        .output("sum", 1)
        .output("cout", 1)
        .assign("h1", call("half_adder", vec![ident("a"), ident("b")]))
        .assign("h2", call("half_adder", vec![ident("h1"), ident("cin")]))
        .assign("sum", ident("h2"))
        .assign(
            "cout",
            call(
                "nand",
                vec![
                    call("not1", vec![member(ident("h1"), "carry")]),
                    call("not1", vec![member(ident("h2"), "carry")]),
                ],
            ),
        )
}

/// Every module above plus `top`
pub fn library(top: ModuleDecl) -> Program {
    Program::new(vec![
        not1(),
        and2(),
        xor2(),
        half_adder(),
        full_adder(),
        reg(),
        counter(),
        adder4(),
        top,
    ])
}

// ===== 仿真器构建 =====

pub fn simulator(program: &Program, top: &str) -> Simulator {
    simulator_with(program, top, KernelKind::Object)
}

pub fn simulator_with(program: &Program, top: &str, kernel: KernelKind) -> Simulator {
    init_tracing();
    let netlist = elaborate(program, top).expect("elaboration failed");
    let levelized = levelize(netlist).expect("levelization failed");
    let config = SimConfig {
        kernel,
        ..SimConfig::default()
    };
    Simulator::with_config(levelized, config)
}

// ===== 伪随机数 =====

/// Fixed seed so failures reproduce
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Uniform value of `width` bits (`width < 64`)
pub fn bits(rng: &mut StdRng, width: usize) -> u64 {
    rng.gen_range(0..1u64 << width)
}
