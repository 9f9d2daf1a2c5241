//! 测试辅助工具
//!
//! 提供端到端测试用的 JSON 程序

#![allow(dead_code)]

use wire_workspace::{load_program, Program};

/// not1 / xor2 / half_adder plus `pair`, which adds the two bits of `x`
pub const PAIR_JSON: &str = r#"{
  "modules": [
    {
      "name": "not1",
      "params": [{ "name": "a" }],
      "outputs": [{ "name": "out" }],
      "statements": [
        { "target": "out", "expr": { "type": "Call", "callee": "nand", "args": [
          { "type": "Identifier", "name": "a" }, { "type": "Identifier", "name": "a" } ] } }
      ]
    },
    {
      "name": "xor2",
      "params": [{ "name": "a" }, { "name": "b" }],
      "outputs": [{ "name": "out" }],
      "statements": [
        { "target": "n", "expr": { "type": "Call", "callee": "nand", "args": [
          { "type": "Identifier", "name": "a" }, { "type": "Identifier", "name": "b" } ] } },
        { "target": "out", "expr": { "type": "Call", "callee": "nand", "args": [
          { "type": "Call", "callee": "nand", "args": [
            { "type": "Identifier", "name": "a" }, { "type": "Identifier", "name": "n" } ] },
          { "type": "Call", "callee": "nand", "args": [
            { "type": "Identifier", "name": "b" }, { "type": "Identifier", "name": "n" } ] } ] } }
      ]
    },
    {
      "name": "half_adder",
      "params": [{ "name": "a" }, { "name": "b" }],
      "outputs": [{ "name": "sum" }, { "name": "carry" }],
      "statements": [
        { "target": "sum", "expr": { "type": "Call", "callee": "xor2", "args": [
          { "type": "Identifier", "name": "a" }, { "type": "Identifier", "name": "b" } ] } },
        { "target": "carry", "expr": { "type": "Call", "callee": "not1", "args": [
          { "type": "Call", "callee": "nand", "args": [
            { "type": "Identifier", "name": "a" }, { "type": "Identifier", "name": "b" } ] } ] } }
      ]
    },
    {
      "name": "pair",
      "params": [{ "name": "x", "width": 2 }],
      "outputs": [{ "name": "s" }, { "name": "c" }, { "name": "both", "width": 2 }],
      "statements": [
        { "target": "h", "expr": { "type": "Call", "callee": "half_adder", "args": [
          { "type": "Index", "object": { "type": "Identifier", "name": "x" }, "index": 0 },
          { "type": "Index", "object": { "type": "Identifier", "name": "x" }, "index": 1 } ] } },
        { "target": "s", "expr": { "type": "Identifier", "name": "h" } },
        { "target": "c", "expr": { "type": "Member", "object": { "type": "Identifier", "name": "h" }, "field": "carry" } },
        { "target": "both", "expr": { "type": "Concat", "parts": [
          { "type": "Member", "object": { "type": "Identifier", "name": "h" }, "field": "carry" },
          { "type": "Identifier", "name": "h" } ] } }
      ]
    }
  ]
}"#;

/// 2-bit counter; `n0` and `n1` are read before they are assigned
pub const COUNTER_JSON: &str = r#"{
  "modules": [
    {
      "name": "counter",
      "params": [{ "name": "clk" }],
      "outputs": [{ "name": "count", "width": 2 }],
      "statements": [
        { "target": "c0", "expr": { "type": "Call", "callee": "dff", "args": [
          { "type": "Identifier", "name": "n0" }, { "type": "Identifier", "name": "clk" } ] } },
        { "target": "c1", "expr": { "type": "Call", "callee": "dff", "args": [
          { "type": "Identifier", "name": "n1" }, { "type": "Identifier", "name": "clk" } ] } },
        { "target": "n0", "expr": { "type": "Call", "callee": "nand", "args": [
          { "type": "Identifier", "name": "c0" }, { "type": "Number", "value": 1 } ] } },
        { "target": "k", "expr": { "type": "Call", "callee": "nand", "args": [
          { "type": "Identifier", "name": "c1" }, { "type": "Identifier", "name": "c0" } ] } },
        { "target": "n1", "expr": { "type": "Call", "callee": "nand", "args": [
          { "type": "Call", "callee": "nand", "args": [
            { "type": "Identifier", "name": "c1" }, { "type": "Identifier", "name": "k" } ] },
          { "type": "Call", "callee": "nand", "args": [
            { "type": "Identifier", "name": "c0" }, { "type": "Identifier", "name": "k" } ] } ] } },
        { "target": "count", "expr": { "type": "Concat", "parts": [
          { "type": "Identifier", "name": "c1" }, { "type": "Identifier", "name": "c0" } ] } }
      ]
    }
  ]
}"#;

/// `y` feeds back into itself through two NANDs with no flip-flop
pub const LOOP_JSON: &str = r#"{
  "modules": [
    {
      "name": "ring",
      "params": [{ "name": "en" }],
      "outputs": [{ "name": "y" }],
      "statements": [
        { "target": "y", "expr": { "type": "Call", "callee": "nand", "args": [
          { "type": "Identifier", "name": "en" }, { "type": "Identifier", "name": "z" } ] } },
        { "target": "z", "expr": { "type": "Call", "callee": "nand", "args": [
          { "type": "Identifier", "name": "y" }, { "type": "Identifier", "name": "y" } ] } }
      ]
    }
  ]
}"#;

pub fn program(json: &str) -> Program {
    load_program(json).expect("fixture program should parse")
}
