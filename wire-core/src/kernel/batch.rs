//! Flat batch kernel
//!
//! Gates are compiled to `[in1, in2, out]` triples in level order and DFFs to
//! `[d, q]` pairs. Evaluation works directly on the store's `u32` words with
//! shift/mask arithmetic, so any engine that follows the store layout can run
//! the same program over the same buffer.

use super::Evaluator;
use crate::netlist::LevelizedNetlist;
use crate::store::{SignalStore, HEADER_WORDS};

#[inline(always)]
fn get(words: &[u32], id: u32) -> u32 {
    (words[HEADER_WORDS + (id >> 5) as usize] >> (id & 31)) & 1
}

#[inline(always)]
fn put(words: &mut [u32], id: u32, bit: u32) {
    let word = &mut words[HEADER_WORDS + (id >> 5) as usize];
    let shift = id & 31;
    *word = (*word & !(1 << shift)) | (bit << shift);
}

/// Evaluate `gates` (flat `[in1, in2, out]` triples, level order) over `words`
pub fn evaluate_batch(words: &mut [u32], gates: &[u32]) {
    for g in gates.chunks_exact(3) {
        let out = (get(words, g[0]) & get(words, g[1])) ^ 1;
        put(words, g[2], out);
    }
}

/// Sample every D of `dffs` (flat `[d, q]` pairs) into `scratch`, then write
/// every Q. `scratch` holds one bit per DFF.
pub fn update_dffs_batch(words: &mut [u32], dffs: &[u32], scratch: &mut [u32]) {
    for (i, p) in dffs.chunks_exact(2).enumerate() {
        let slot = &mut scratch[i >> 5];
        let shift = i & 31;
        *slot = (*slot & !(1 << shift)) | (get(words, p[0]) << shift);
    }
    for (i, p) in dffs.chunks_exact(2).enumerate() {
        let bit = (scratch[i >> 5] >> (i & 31)) & 1;
        put(words, p[1], bit);
    }
}

/// Kernel running a compiled flat program over the raw store words
#[derive(Debug, Clone)]
pub struct BatchKernel {
    gates: Vec<u32>,
    dffs: Vec<u32>,
    scratch: Vec<u32>,
}

impl BatchKernel {
    pub fn new(levelized: &LevelizedNetlist) -> Self {
        let nand = &levelized.netlist.nand_gates;
        let gates = levelized
            .levels
            .iter()
            .flatten()
            .flat_map(|&g| [nand[g].in1 as u32, nand[g].in2 as u32, nand[g].out as u32])
            .collect();
        let dffs: Vec<u32> = levelized
            .netlist
            .dffs
            .iter()
            .flat_map(|d| [d.d as u32, d.q as u32])
            .collect();
        let scratch = vec![0u32; (dffs.len() / 2).div_ceil(32)];
        Self {
            gates,
            dffs,
            scratch,
        }
    }

    /// Compiled gate program
    pub fn gates(&self) -> &[u32] {
        &self.gates
    }

    /// Compiled DFF table
    pub fn dffs(&self) -> &[u32] {
        &self.dffs
    }
}

impl Evaluator for BatchKernel {
    fn evaluate_combinational(&self, store: &mut SignalStore) {
        evaluate_batch(store.as_words_mut(), &self.gates);
    }

    fn update_sequential(&mut self, store: &mut SignalStore) {
        update_dffs_batch(store.as_words_mut(), &self.dffs, &mut self.scratch);
    }

    fn name(&self) -> &'static str {
        "batch"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_batch_on_raw_words() {
        // signals 0 and 1 are inputs, 40 is the output (second data word)
        let mut store = SignalStore::new(41);
        store.write(0, true);
        store.write(1, true);
        evaluate_batch(store.as_words_mut(), &[0, 1, 40]);
        assert!(!store.read(40));
        store.write(1, false);
        evaluate_batch(store.as_words_mut(), &[0, 1, 40]);
        assert!(store.read(40));
    }

    #[test]
    fn test_update_dffs_batch_samples_before_writing() {
        let mut store = SignalStore::new(2);
        store.write(0, true);
        let mut scratch = [0u32; 1];
        // q0 <- d=1, q1 <- d=0: a swap
        update_dffs_batch(store.as_words_mut(), &[1, 0, 0, 1], &mut scratch);
        assert!(!store.read(0));
        assert!(store.read(1));
    }
}
