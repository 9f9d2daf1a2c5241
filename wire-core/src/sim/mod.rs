//! Simulator: name resolution, clocking, waveforms
//!
//! Owns a [`SignalStore`] and an [`Evaluator`] built from a levelized
//! netlist. A cycle is atomic; nothing between its combinational and
//! sequential halves is observable from outside.

pub mod vcd;

use crate::kernel::{BatchKernel, Evaluator, Kernel};
use crate::netlist::{LevelizedNetlist, Netlist, SignalId};
use crate::store::SignalStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, trace};
use wire_config::{KernelKind, SimConfig};

/// Simulator errors; all of them are caller mistakes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("unknown signal '{0}'")]
    UnknownSignal(String),

    #[error("signal '{0}' is not being recorded")]
    NotRecorded(String),

    #[error("'{name}' is {width} bits wide, at most 64 fit in a u64")]
    WidthOverflow { name: String, width: usize },

    #[error("value {value} does not fit in the {width}-bit signal '{name}'")]
    ValueOutOfRange {
        name: String,
        width: usize,
        value: u64,
    },
}

/// Snapshot of the recorded signals after a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaveSample {
    pub cycle: u32,
    pub values: BTreeMap<String, bool>,
}

/// Cooperative stop request for [`Simulator::run_async`]
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Ask the running simulation to stop after its current batch
    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

pub struct Simulator {
    levelized: LevelizedNetlist,
    config: SimConfig,
    store: SignalStore,
    kernel: Box<dyn Evaluator>,
    watched: Option<Vec<(String, SignalId)>>,
    samples: Vec<WaveSample>,
    stop: StopHandle,
}

fn build_kernel(levelized: &LevelizedNetlist, kind: KernelKind) -> Box<dyn Evaluator> {
    match kind {
        KernelKind::Object => Box::new(Kernel::new(levelized)),
        KernelKind::Batch => Box::new(BatchKernel::new(levelized)),
    }
}

impl Simulator {
    pub fn new(levelized: LevelizedNetlist) -> Self {
        Self::with_config(levelized, SimConfig::default())
    }

    pub fn with_config(levelized: LevelizedNetlist, config: SimConfig) -> Self {
        let store = SignalStore::for_netlist(&levelized.netlist);
        let kernel = build_kernel(&levelized, config.kernel);
        debug!(
            target: "wire::simulator",
            kernel = kernel.name(),
            signals = store.signal_count(),
            "simulator ready"
        );
        Self {
            levelized,
            config,
            store,
            kernel,
            watched: None,
            samples: Vec::new(),
            stop: StopHandle::default(),
        }
    }

    // ===== 名字解析 =====

    /// Resolve `name` or `name[i]` to its signal
    pub fn resolve(&self, name: &str) -> Result<SignalId, SimError> {
        self.levelized
            .netlist
            .signal_id(name)
            .ok_or_else(|| SimError::UnknownSignal(name.to_string()))
    }

    /// Bits of `name`, LSB first: `name[0..]` for a bus, else the scalar itself
    pub fn resolve_bus(&self, name: &str) -> Result<Vec<SignalId>, SimError> {
        let netlist = &self.levelized.netlist;
        let bits: Vec<SignalId> = (0..)
            .map_while(|i| netlist.signal_id(&format!("{name}[{i}]")))
            .collect();
        if !bits.is_empty() {
            return Ok(bits);
        }
        self.resolve(name).map(|id| vec![id])
    }

    // ===== 信号读写 =====

    pub fn set(&mut self, name: &str, value: bool) -> Result<(), SimError> {
        let id = self.resolve(name)?;
        self.store.write(id, value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<bool, SimError> {
        Ok(self.store.read(self.resolve(name)?))
    }

    /// Drive a whole bus; bit 0 of `value` goes to `name[0]`
    pub fn poke(&mut self, name: &str, value: u64) -> Result<(), SimError> {
        let bits = self.checked_bus(name)?;
        if bits.len() < 64 && value >> bits.len() != 0 {
            return Err(SimError::ValueOutOfRange {
                name: name.to_string(),
                width: bits.len(),
                value,
            });
        }
        self.store.write_bits(&bits, value);
        Ok(())
    }

    /// Read a whole bus; `name[0]` is bit 0 of the result
    pub fn peek(&self, name: &str) -> Result<u64, SimError> {
        let bits = self.checked_bus(name)?;
        Ok(self.store.read_bits(&bits))
    }

    fn checked_bus(&self, name: &str) -> Result<Vec<SignalId>, SimError> {
        let bits = self.resolve_bus(name)?;
        if bits.len() > 64 {
            return Err(SimError::WidthOverflow {
                name: name.to_string(),
                width: bits.len(),
            });
        }
        Ok(bits)
    }

    // ===== 时钟推进 =====

    /// One combinational pass, no clock edge
    pub fn evaluate(&mut self) {
        self.kernel.evaluate_combinational(&mut self.store);
    }

    /// Exactly one clock cycle
    pub fn step(&mut self) {
        self.kernel.cycle(&mut self.store);
        trace!(target: "wire::simulator", cycle = self.store.cycle(), "step");
        self.snapshot();
    }

    #[instrument(target = "wire::simulator", skip(self), fields(kernel = self.kernel.name()))]
    pub fn run(&mut self, cycles: u64) {
        for _ in 0..cycles {
            self.step();
        }
        info!(target: "wire::simulator", cycle = self.store.cycle(), "run finished");
    }

    /// Run `total` cycles in batches of `batch` (0 = configured batch size),
    /// yielding to the runtime and reporting `(done, total)` after each
    /// batch. A stop request is honoured between batches only. Returns the
    /// number of cycles actually run.
    pub async fn run_async<F>(&mut self, total: u64, batch: u64, mut on_progress: F) -> u64
    where
        F: FnMut(u64, u64),
    {
        let batch = match batch {
            0 => self.config.batch_size.max(1),
            n => n,
        };
        let mut done = 0;
        while done < total {
            if self.stop.is_stopped() {
                self.stop.clear();
                info!(target: "wire::simulator", done, total, "run stopped");
                break;
            }
            let n = batch.min(total - done);
            for _ in 0..n {
                self.step();
            }
            done += n;
            on_progress(done, total);
            tokio::task::yield_now().await;
        }
        done
    }

    /// Handle that can stop a running `run_async` from elsewhere
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    // ===== 波形记录 =====

    /// Start recording `names`; the current values become the first sample
    pub fn start_recording(&mut self, names: &[&str]) -> Result<(), SimError> {
        let watched = names
            .iter()
            .map(|&n| self.resolve(n).map(|id| (n.to_string(), id)))
            .collect::<Result<Vec<_>, _>>()?;
        self.begin(watched);
        Ok(())
    }

    /// Start recording every named signal
    pub fn start_recording_all(&mut self) {
        let watched = self
            .levelized
            .netlist
            .signal_map
            .iter()
            .map(|(n, &id)| (n.clone(), id))
            .collect();
        self.begin(watched);
    }

    fn begin(&mut self, watched: Vec<(String, SignalId)>) {
        debug!(target: "wire::simulator", signals = watched.len(), "recording started");
        self.samples.clear();
        self.watched = Some(watched);
        self.snapshot();
    }

    /// Stop recording and return the samples; they stay available for export
    pub fn stop_recording(&mut self) -> Vec<WaveSample> {
        self.watched = None;
        self.samples.clone()
    }

    pub fn is_recording(&self) -> bool {
        self.watched.is_some()
    }

    pub fn samples(&self) -> &[WaveSample] {
        &self.samples
    }

    fn snapshot(&mut self) {
        let Some(watched) = &self.watched else {
            return;
        };
        let values = watched
            .iter()
            .map(|(name, id)| (name.clone(), self.store.read(*id)))
            .collect();
        self.samples.push(WaveSample {
            cycle: self.store.cycle(),
            values,
        });
    }

    /// Render the recorded samples as VCD. Without `names`, every recorded
    /// signal is exported except `nand_`/`dff_` bookkeeping signals (unless
    /// `include_internal` is configured).
    pub fn export_vcd(&self, names: Option<&[&str]>) -> Result<String, SimError> {
        let recorded: Vec<&str> = match self.samples.first() {
            Some(first) => first.values.keys().map(String::as_str).collect(),
            None => Vec::new(),
        };
        let selected: Vec<&str> = match names {
            Some(names) => {
                if let Some(missing) = names.iter().find(|n| !recorded.contains(*n)) {
                    return Err(SimError::NotRecorded(missing.to_string()));
                }
                names.to_vec()
            }
            None => recorded
                .into_iter()
                .filter(|n| self.config.include_internal || !vcd::is_internal(n))
                .collect(),
        };
        Ok(vcd::render(
            &self.levelized.netlist.top,
            &self.config.timescale,
            &selected,
            &self.samples,
        ))
    }

    // ===== 复位 =====

    /// Hard reset: rebuild store and kernel, cycle back to 0. Recorded samples
    /// and an active recording are left as they are.
    pub fn reset(&mut self) {
        self.store = SignalStore::for_netlist(&self.levelized.netlist);
        self.kernel = build_kernel(&self.levelized, self.config.kernel);
        debug!(target: "wire::simulator", "hard reset");
    }

    pub fn cycle(&self) -> u32 {
        self.store.cycle()
    }

    pub fn netlist(&self) -> &Netlist {
        &self.levelized.netlist
    }

    pub fn levelized(&self) -> &LevelizedNetlist {
        &self.levelized
    }

    pub fn store(&self) -> &SignalStore {
        &self.store
    }

    pub fn kernel_name(&self) -> &'static str {
        self.kernel.name()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levelizer::levelize;

    /// y = nand(a, a) with a 2-bit bus `b` passed straight through
    fn inverter() -> Simulator {
        let mut n = Netlist::new("inv");
        let a = n.add_signal("a", 0);
        let y = n.add_signal("y", 0);
        n.add_signal("b[0]", 0);
        n.add_signal("b[1]", 0);
        n.add_nand(a, a, y);
        Simulator::new(levelize(n).unwrap())
    }

    #[test]
    fn test_set_get_and_evaluate() {
        let mut sim = inverter();
        sim.set("a", false).unwrap();
        sim.evaluate();
        assert!(sim.get("y").unwrap());
        sim.set("a", true).unwrap();
        sim.evaluate();
        assert!(!sim.get("y").unwrap());
        assert_eq!(sim.cycle(), 0);
    }

    #[test]
    fn test_unknown_name_is_an_error() {
        let mut sim = inverter();
        assert_eq!(sim.get("nope"), Err(SimError::UnknownSignal("nope".into())));
        assert!(sim.set("nope", true).is_err());
        assert!(sim.start_recording(&["a", "nope"]).is_err());
    }

    #[test]
    fn test_poke_peek_bus() {
        let mut sim = inverter();
        sim.poke("b", 0b10).unwrap();
        assert!(!sim.get("b[0]").unwrap());
        assert!(sim.get("b[1]").unwrap());
        assert_eq!(sim.peek("b").unwrap(), 2);
        assert_eq!(sim.peek("a").unwrap(), 0);
        assert!(matches!(
            sim.poke("b", 4),
            Err(SimError::ValueOutOfRange { width: 2, .. })
        ));
    }

    #[test]
    fn test_recording_snapshots_start_and_each_step() {
        let mut sim = inverter();
        sim.start_recording(&["a", "y"]).unwrap();
        sim.step();
        sim.step();
        let samples = sim.stop_recording();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].cycle, 0);
        assert_eq!(samples[2].cycle, 2);
        assert!(samples[1].values["y"]);
        sim.step();
        assert_eq!(sim.samples().len(), 3);
    }

    #[test]
    fn test_export_rejects_unrecorded_names() {
        let mut sim = inverter();
        sim.start_recording(&["a"]).unwrap();
        assert_eq!(
            sim.export_vcd(Some(&["y"][..])),
            Err(SimError::NotRecorded("y".into()))
        );
    }

    #[test]
    fn test_reset_rebuilds_state() {
        let mut sim = inverter();
        sim.set("a", true).unwrap();
        sim.run(3);
        assert_eq!(sim.cycle(), 3);
        sim.reset();
        assert_eq!(sim.cycle(), 0);
        assert!(!sim.get("a").unwrap());
        assert!(!sim.get("y").unwrap());
    }
}
