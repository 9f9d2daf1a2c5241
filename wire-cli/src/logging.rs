//! CLI 日志系统初始化
//!
//! 基于 `tracing-subscriber` 实现分阶段日志控制。

use crate::config::LogConfig;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};
use wire_api::Phase;

/// 日志输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// 彩色格式化（开发使用）
    Pretty,
    /// 紧凑格式
    Compact,
    /// JSON 格式（工具集成）
    Json,
}

/// Target filter: global level plus one entry per pipeline phase
pub fn targets(log_config: &LogConfig) -> Targets {
    Phase::ALL
        .into_iter()
        .fold(Targets::new().with_default(log_config.global), |t, phase| {
            t.with_target(phase.target(), log_config.level_for(phase))
        })
        .with_target("wire::cli", log_config.global)
}

/// 使用指定格式和日志配置初始化日志系统
///
/// Logs go to stderr so that simulation output on stdout stays clean. With
/// `file`, every event is also appended to it without ANSI colors.
pub fn init_with_file<P: AsRef<Path>>(
    log_config: &LogConfig,
    format: LogFormat,
    file: Option<P>,
) -> io::Result<()> {
    let targets = targets(log_config);
    let stderr_layer = create_format_layer(format, io::stderr).with_filter(targets.clone());

    // If file specified, output to both console and file
    if let Some(path) = file {
        let file_handle = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file_handle))
            .with_filter(targets);

        tracing_subscriber::registry()
            .with(stderr_layer)
            .with(file_layer)
            .try_init()
            .map_err(io::Error::other)
    } else {
        tracing_subscriber::registry()
            .with(stderr_layer)
            .try_init()
            .map_err(io::Error::other)
    }
}

/// Create formatter layer based on format
fn create_format_layer<W, F>(format: LogFormat, make_writer: F) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: io::Write + Send + Sync + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}
