//! Wire CLI - Command line interface
//!
//! Project-based execution - configuration from wire.json, overridable by flags

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info, Level};

mod config;
mod logging;
mod platform;

use crate::config::{parse_assignment, parse_level, parse_phase_level, read_project, resolve_entry_path, LogConfig, ProjectFile};
use crate::logging::LogFormat;
use crate::platform::{format_stats, format_trace, print_error};
use wire_api::{init_config, KernelKind, Phase, RunConfig, RunRequest, WireError};

/// 命令行可选的内核
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum KernelArg {
    Object,
    Batch,
}

impl From<KernelArg> for KernelKind {
    fn from(k: KernelArg) -> Self {
        match k {
            KernelArg::Object => KernelKind::Object,
            KernelArg::Batch => KernelKind::Batch,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "wire",
    about = "Wire HDL - elaborate and simulate NAND/DFF designs",
    version = "0.1.0"
)]
struct Cli {
    /// Project file path (default: ./wire.json)
    #[arg(value_name = "CONFIG", default_value = "wire.json")]
    config: PathBuf,

    /// Program JSON; replaces the project's `entry` (no project file needed)
    #[arg(long)]
    entry: Option<PathBuf>,

    /// Top-level module
    #[arg(long)]
    top: Option<String>,

    /// Number of clock cycles to run
    #[arg(long)]
    cycles: Option<u64>,

    /// Input assignment NAME=VALUE (repeatable, hex with 0x, binary with 0b)
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    inputs: Vec<(String, u64)>,

    /// Signal to print each cycle (repeatable; default: all top outputs)
    #[arg(long = "watch", value_name = "SIGNAL")]
    watch: Vec<String>,

    /// Write the recorded waveform as VCD
    #[arg(long, value_name = "FILE")]
    vcd: Option<PathBuf>,

    /// Write the final netlist as JSON ("-" for stdout)
    #[arg(long, value_name = "FILE")]
    dump_netlist: Option<PathBuf>,

    /// Print netlist statistics
    #[arg(long)]
    stats: bool,

    /// Run the netlist optimizer
    #[arg(long)]
    optimize: bool,

    /// Evaluation kernel
    #[arg(long, value_enum)]
    kernel: Option<KernelArg>,

    /// Print the run result and errors as JSON
    #[arg(long)]
    json: bool,

    /// Global log level: silent, error, warn, info, debug, trace
    #[arg(long)]
    log_level: Option<String>,

    /// Per-phase log level PHASE=LEVEL (repeatable)
    #[arg(long = "log-phase", value_name = "PHASE=LEVEL", value_parser = parse_phase_level)]
    log_phases: Vec<(Phase, Level)>,

    /// Log output format
    #[arg(long, value_enum, default_value = "compact")]
    log_format: LogFormat,

    /// Also append logs to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

/// 合并项目文件与命令行参数后的运行设置
struct Settings {
    entry: PathBuf,
    top: Option<String>,
    request: RunRequest,
    vcd: Option<PathBuf>,
    run_config: RunConfig,
    log_config: LogConfig,
}

fn main() {
    let cli = Cli::parse();

    let project = if cli.entry.is_some() && !cli.config.exists() {
        ProjectFile::default()
    } else {
        match read_project(&cli.config) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    };

    let settings = match build_settings(&cli, project) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = logging::init_with_file(&settings.log_config, cli.log_format, cli.log_file.as_ref()) {
        eprintln!("Error: cannot initialize logging: {}", e);
        process::exit(1);
    }

    // Initialize API config (global singleton for convenience)
    init_config(settings.run_config.clone());

    if let Err(e) = execute(&cli, settings) {
        print_error(&e, cli.json);
        process::exit(1);
    }
}

/// Merge the project file with command-line overrides
fn build_settings(cli: &Cli, project: ProjectFile) -> Result<Settings, String> {
    let entry = match &cli.entry {
        Some(path) => path.clone(),
        None if project.entry.is_empty() => {
            return Err(format!("'{}' 中的 'entry' 字段不能为空", cli.config.display()));
        }
        None => resolve_entry_path(&cli.config, &project.entry),
    };

    let mut run_config = RunConfig {
        sim: project.simulation,
        optimizer: project.optimizer,
        ..RunConfig::default()
    };
    if cli.optimize {
        run_config.optimizer.enabled = true;
    }
    if let Some(kernel) = cli.kernel {
        run_config.sim.kernel = kernel.into();
    }

    let global = match cli.log_level.as_deref().or(project.log_level.as_deref()) {
        Some(s) => parse_level(s).ok_or_else(|| format!("unknown log level '{s}'"))?,
        None => LogConfig::default().global,
    };
    let log_config = LogConfig {
        global,
        phases: cli.log_phases.iter().copied().collect(),
    };

    // 命令行赋值覆盖项目文件中的同名输入
    let mut inputs = project.inputs;
    inputs.extend(cli.inputs.iter().cloned());

    let request = RunRequest {
        top: String::new(),
        cycles: cli.cycles.or(project.cycles).unwrap_or(0),
        inputs: inputs.into_iter().collect(),
        watch: if cli.watch.is_empty() {
            project.watch
        } else {
            cli.watch.clone()
        },
        record_vcd: false,
    };
    let vcd = cli.vcd.clone().or_else(|| project.vcd.map(PathBuf::from));

    Ok(Settings {
        entry,
        top: cli.top.clone().or(project.top),
        request: RunRequest {
            record_vcd: vcd.is_some(),
            ..request
        },
        vcd,
        run_config,
        log_config,
    })
}

fn execute(cli: &Cli, settings: Settings) -> Result<(), WireError> {
    let Settings {
        entry,
        top,
        mut request,
        vcd,
        run_config,
        ..
    } = settings;

    let source = std::fs::read_to_string(&entry)
        .map_err(|e| WireError::Io(format!("cannot read '{}': {}", entry.display(), e)))?;
    let program = wire_api::load_program(&source)?;

    // 未指定顶层模块时取最后声明的模块
    request.top = match top {
        Some(top) => top,
        None => program
            .modules
            .last()
            .map(|m| m.name.clone())
            .unwrap_or_default(),
    };
    info!(target: "wire::cli", entry = %entry.display(), top = %request.top, "Loaded program");

    let built = wire_api::build(&program, &request.top, &run_config)?;
    if let Some(path) = &cli.dump_netlist {
        let text = serde_json::to_string_pretty(&built.levelized.netlist)?;
        write_output(path, &text)?;
        debug!(target: "wire::cli", path = %path.display(), "Netlist written");
    }

    let output = wire_api::simulate(&program, built, &request, &run_config)?;

    if let (Some(path), Some(text)) = (&vcd, &output.vcd) {
        write_output(path, text)?;
        info!(target: "wire::cli", path = %path.display(), "VCD written");
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if cli.stats {
        print!(
            "{}",
            format_stats(&output.stats, output.depth, output.optimization.as_ref())
        );
    }
    print!("{}", format_trace(&output.trace));
    Ok(())
}

/// Write `text` to `path`, or to stdout for "-"
fn write_output(path: &Path, text: &str) -> Result<(), WireError> {
    if path == Path::new("-") {
        println!("{text}");
        return Ok(());
    }
    std::fs::write(path, text)
        .map_err(|e| WireError::Io(format!("cannot write '{}': {}", path.display(), e)))
}
