//! 终端相关的输出

mod cli;

pub use cli::{format_stats, format_trace, print_error};
