use crate::netlist::NetlistError;
use thiserror::Error;

/// Elaboration failure; always fatal, no partial netlist is produced
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ElabError {
    /// 顶层模块不存在
    #[error("top module '{0}' not found")]
    MissingTopModule(String),

    /// 调用了未定义的模块
    #[error("unknown module '{name}' called from '{caller}'")]
    UnknownModule { name: String, caller: String },

    /// 无法解析的标识符
    #[error("unknown signal '{name}' in module '{module}'")]
    UnknownSignal { name: String, module: String },

    /// 参数个数不匹配
    #[error("'{callee}' expects {expected} argument(s), found {found}")]
    ArityMismatch {
        callee: String,
        expected: usize,
        found: usize,
    },

    /// 表达式结构非法
    #[error("malformed expression '{expr}': {reason}")]
    MalformedExpr { expr: String, reason: String },

    /// 模块内联嵌套过深（通常是递归实例化）
    #[error("module inlining exceeded depth {limit} while expanding '{module}'")]
    RecursionLimit { module: String, limit: usize },

    /// 同一信号被多次驱动
    #[error("signal '{name}' has more than one driver")]
    MultipleDrivers { name: String },

    #[error(transparent)]
    Netlist(#[from] NetlistError),
}

impl ElabError {
    /// Short machine-readable kind, used by error reports
    pub fn kind(&self) -> &'static str {
        match self {
            ElabError::MissingTopModule(_) => "MissingTopModule",
            ElabError::UnknownModule { .. } => "UnknownModule",
            ElabError::UnknownSignal { .. } => "UnknownSignal",
            ElabError::ArityMismatch { .. } => "ArityMismatch",
            ElabError::MalformedExpr { .. } => "MalformedExpr",
            ElabError::RecursionLimit { .. } => "RecursionLimit",
            ElabError::MultipleDrivers { .. } => "MultipleDrivers",
            ElabError::Netlist(_) => "InvalidNetlist",
        }
    }
}
