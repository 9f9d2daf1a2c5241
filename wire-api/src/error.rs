//! API 错误类型
//!
//! 提供统一的错误类型和结构化错误报告。

use serde::Serialize;
use thiserror::Error;
use wire_core::{ElabError, LevelizeError, SimError, StoreError};

/// Wire 错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WireError {
    /// 程序 JSON 无法解析
    #[error("invalid program: {0}")]
    Json(String),

    /// 文件读写错误
    #[error("io error: {0}")]
    Io(String),

    /// 展开错误（结构化）
    #[error("{0}")]
    Elab(#[from] ElabError),

    /// 分层错误，含组合环
    #[error("{0}")]
    Levelize(#[from] LevelizeError),

    /// 仿真器调用错误
    #[error("{0}")]
    Sim(#[from] SimError),

    /// 外部信号缓冲区不合法
    #[error("{0}")]
    Store(#[from] StoreError),
}

impl From<serde_json::Error> for WireError {
    fn from(e: serde_json::Error) -> Self {
        WireError::Json(e.to_string())
    }
}

impl From<std::io::Error> for WireError {
    fn from(e: std::io::Error) -> Self {
        WireError::Io(e.to_string())
    }
}

impl WireError {
    /// 获取错误阶段
    pub fn phase(&self) -> &'static str {
        match self {
            WireError::Json(_) => "input",
            WireError::Io(_) => "io",
            WireError::Elab(_) => "elaborator",
            WireError::Levelize(_) => "levelizer",
            WireError::Sim(_) => "simulator",
            WireError::Store(_) => "store",
        }
    }

    /// 错误类型名（可用于程序化处理）
    pub fn kind(&self) -> &'static str {
        match self {
            WireError::Json(_) => "InvalidJson",
            WireError::Io(_) => "Io",
            WireError::Elab(e) => e.kind(),
            WireError::Levelize(LevelizeError::CombinationalCycle { .. }) => "CombinationalCycle",
            WireError::Levelize(LevelizeError::InvalidNetlist(_)) => "InvalidNetlist",
            WireError::Sim(SimError::UnknownSignal(_)) => "UnknownSignal",
            WireError::Sim(SimError::NotRecorded(_)) => "NotRecorded",
            WireError::Sim(SimError::WidthOverflow { .. }) => "WidthOverflow",
            WireError::Sim(SimError::ValueOutOfRange { .. }) => "ValueOutOfRange",
            WireError::Store(StoreError::BadMagic(_)) => "BadMagic",
            WireError::Store(StoreError::BadVersion(_)) => "BadVersion",
            WireError::Store(StoreError::BadLength { .. }) => "BadLength",
        }
    }

    /// 转换为结构化错误报告
    pub fn to_report(&self) -> ErrorReport {
        let (module, details) = match self {
            WireError::Elab(ElabError::UnknownModule { caller, .. }) => (Some(caller.clone()), None),
            WireError::Elab(ElabError::UnknownSignal { module, .. }) => (Some(module.clone()), None),
            WireError::Elab(ElabError::RecursionLimit { module, .. }) => (Some(module.clone()), None),
            WireError::Elab(ElabError::ArityMismatch {
                callee,
                expected,
                found,
            }) => (
                Some(callee.clone()),
                Some(ErrorDetails::Arity {
                    expected: *expected,
                    found: *found,
                }),
            ),
            WireError::Levelize(LevelizeError::CombinationalCycle { signals }) => (
                None,
                Some(ErrorDetails::Cycle {
                    signals: signals.clone(),
                }),
            ),
            _ => (None, None),
        };

        ErrorReport {
            phase: self.phase(),
            module,
            error_kind: self.kind().to_string(),
            message: self.to_string(),
            details,
        }
    }
}

/// 结构化错误报告
///
/// 上层应用（CLI、Web）可以根据自己的需求格式化。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    /// 错误阶段: input, io, elaborator, levelizer, simulator, store
    pub phase: &'static str,
    /// 出错的模块（如果有）
    pub module: Option<String>,
    /// 错误类型（可用于程序化处理）
    pub error_kind: String,
    /// 人类可读的错误消息
    pub message: String,
    /// 额外详情
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

/// 错误额外详情
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorDetails {
    /// 组合环上的信号
    Cycle { signals: Vec<String> },
    /// 参数个数
    Arity { expected: usize, found: usize },
}

impl std::fmt::Display for ErrorReport {
    /// 默认的 CLI 友好格式
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.module {
            Some(module) => write!(f, "[{}] {} error: {}", module, self.phase, self.message),
            None => write!(f, "[{}] {} error: {}", self.phase, self.phase, self.message),
        }
    }
}

impl ErrorReport {
    /// 转换为 JSON 格式（Web / 工具链使用）
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// 简洁格式（适合终端）
    pub fn to_short(&self) -> String {
        format!("{}: {}", self.phase, self.message)
    }
}
