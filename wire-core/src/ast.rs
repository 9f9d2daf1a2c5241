//! Circuit description AST
//!
//! This is the contract produced by the parser and consumed by the elaborator.
//! Every node is serde-(de)serializable so a program can be handed over as JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

// 表达式类型别名
pub type Expr = Box<ExprKind>;

/// Whole program: a flat list of module declarations
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub modules: Vec<ModuleDecl>,
}

/// `module name(params) -> (outputs) { statements }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub outputs: Vec<Output>,
    #[serde(default)]
    pub statements: Vec<Statement>,
}

/// Input port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default = "default_width")]
    pub width: usize,
}

/// Output port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub name: String,
    #[serde(default = "default_width")]
    pub width: usize,
}

/// `target = expr`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub target: String,
    pub expr: Expr,
}

fn default_width() -> usize {
    1
}

/// 表达式枚举
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExprKind {
    // 数字字面量
    Number(Number),
    // 标识符引用
    Identifier(Identifier),
    // 单比特索引 a[i]
    Index(Index),
    // 切片 a[start:end]
    Slice(Slice),
    // 成员访问 inst.field
    Member(Member),
    // 拼接 {a, b, c}
    Concat(Concat),
    // 调用 nand(a, b) / dff(d, clk) / Module(args)
    Call(Call),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Number {
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub object: Expr,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    pub object: Expr,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub object: Expr,
    pub field: String,
}

/// Parts are listed MSB-first, as written in source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concat {
    pub parts: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub callee: String,
    #[serde(default)]
    pub args: Vec<Expr>,
}

impl ModuleDecl {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            params: Vec::new(),
            outputs: Vec::new(),
            statements: Vec::new(),
        }
    }

    pub fn param(mut self, name: &str, width: usize) -> Self {
        self.params.push(Param {
            name: name.to_string(),
            width,
        });
        self
    }

    pub fn output(mut self, name: &str, width: usize) -> Self {
        self.outputs.push(Output {
            name: name.to_string(),
            width,
        });
        self
    }

    pub fn assign(mut self, target: &str, expr: Expr) -> Self {
        self.statements.push(Statement {
            target: target.to_string(),
            expr,
        });
        self
    }
}

impl Program {
    pub fn new(modules: Vec<ModuleDecl>) -> Self {
        Self { modules }
    }

    pub fn module(&self, name: &str) -> Option<&ModuleDecl> {
        self.modules.iter().find(|m| m.name == name)
    }
}

// ===== 构造辅助函数 =====

pub fn num(value: u64) -> Expr {
    Box::new(ExprKind::Number(Number { value }))
}

pub fn ident(name: &str) -> Expr {
    Box::new(ExprKind::Identifier(Identifier {
        name: name.to_string(),
    }))
}

pub fn index(object: Expr, index: usize) -> Expr {
    Box::new(ExprKind::Index(Index { object, index }))
}

pub fn slice(object: Expr, start: usize, end: usize) -> Expr {
    Box::new(ExprKind::Slice(Slice { object, start, end }))
}

pub fn member(object: Expr, field: &str) -> Expr {
    Box::new(ExprKind::Member(Member {
        object,
        field: field.to_string(),
    }))
}

pub fn concat(parts: Vec<Expr>) -> Expr {
    Box::new(ExprKind::Concat(Concat { parts }))
}

pub fn call(callee: &str, args: Vec<Expr>) -> Expr {
    Box::new(ExprKind::Call(Call {
        callee: callee.to_string(),
        args,
    }))
}

impl fmt::Display for ExprKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprKind::Number(n) => write!(f, "{}", n.value),
            ExprKind::Identifier(id) => write!(f, "{}", id.name),
            ExprKind::Index(i) => write!(f, "{}[{}]", i.object, i.index),
            ExprKind::Slice(s) => write!(f, "{}[{}:{}]", s.object, s.start, s.end),
            ExprKind::Member(m) => write!(f, "{}.{}", m.object, m.field),
            ExprKind::Concat(c) => {
                write!(f, "{{")?;
                for (i, part) in c.parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{part}")?;
                }
                write!(f, "}}")
            }
            ExprKind::Call(c) => {
                write!(f, "{}(", c.callee)?;
                for (i, arg) in c.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}
