//! Packed signal storage
//!
//! Layout (little-endian `u32` words):
//!
//! ```text
//! word 0        magic 0x57495245 ("WIRE")
//! word 1        format version (1)
//! word 2        signal count
//! word 3        current cycle (low 32 bits)
//! words 4..15   reserved, zero
//! words 16..    one bit per signal: word 16 + id / 32, bit id % 32
//! ```
//!
//! The layout is the interop contract for any evaluation engine that works on
//! the raw words instead of going through `read`/`write`.

use crate::netlist::{Netlist, SignalId, CONST_1};
use thiserror::Error;

pub const MAGIC: u32 = 0x5749_5245;
pub const VERSION: u32 = 1;
pub const HEADER_WORDS: usize = 16;

const WORD_MAGIC: usize = 0;
const WORD_VERSION: usize = 1;
const WORD_COUNT: usize = 2;
const WORD_CYCLE: usize = 3;

/// Rejected external buffer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("bad magic 0x{0:08x}, expected 0x{MAGIC:08x}")]
    BadMagic(u32),

    #[error("unsupported store version {0}, expected {VERSION}")]
    BadVersion(u32),

    #[error("buffer holds {actual} words, {expected} needed")]
    BadLength { expected: usize, actual: usize },
}

/// One bit of state per signal behind a fixed 16-word header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalStore {
    words: Vec<u32>,
}

/// Number of words needed for `signal_count` signals, header included
pub fn words_for(signal_count: usize) -> usize {
    HEADER_WORDS + signal_count.div_ceil(32)
}

impl SignalStore {
    /// All-zero store for `signal_count` signals
    pub fn new(signal_count: usize) -> Self {
        let mut words = vec![0u32; words_for(signal_count)];
        words[WORD_MAGIC] = MAGIC;
        words[WORD_VERSION] = VERSION;
        words[WORD_COUNT] = signal_count as u32;
        Self { words }
    }

    /// Store sized for `netlist`, with `const_1` forced to 1 and every DFF
    /// output at its initial value
    pub fn for_netlist(netlist: &Netlist) -> Self {
        let mut store = Self::new(netlist.signals.len());
        for signal in netlist.signals.iter().filter(|s| s.name == CONST_1) {
            store.write(signal.id, true);
        }
        for dff in netlist.dffs.iter().filter(|d| d.initial_value) {
            store.write(dff.q, true);
        }
        store
    }

    /// Adopt an existing word buffer after checking its header
    pub fn from_words(words: Vec<u32>) -> Result<Self, StoreError> {
        if words.len() < HEADER_WORDS {
            return Err(StoreError::BadLength {
                expected: HEADER_WORDS,
                actual: words.len(),
            });
        }
        if words[WORD_MAGIC] != MAGIC {
            return Err(StoreError::BadMagic(words[WORD_MAGIC]));
        }
        if words[WORD_VERSION] != VERSION {
            return Err(StoreError::BadVersion(words[WORD_VERSION]));
        }
        let expected = words_for(words[WORD_COUNT] as usize);
        if words.len() != expected {
            return Err(StoreError::BadLength {
                expected,
                actual: words.len(),
            });
        }
        Ok(Self { words })
    }

    /// Decode little-endian bytes produced by [`SignalStore::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        if bytes.len() % 4 != 0 {
            return Err(StoreError::BadLength {
                expected: bytes.len().div_ceil(4),
                actual: bytes.len() / 4,
            });
        }
        let words = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Self::from_words(words)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[inline]
    pub fn read(&self, id: SignalId) -> bool {
        (self.words[HEADER_WORDS + id / 32] >> (id % 32)) & 1 == 1
    }

    #[inline]
    pub fn write(&mut self, id: SignalId, value: bool) {
        let word = &mut self.words[HEADER_WORDS + id / 32];
        let mask = 1u32 << (id % 32);
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    /// Bit `i` of the result is the value of `ids[i]`; at most 64 ids
    pub fn read_bits(&self, ids: &[SignalId]) -> u64 {
        ids.iter()
            .take(64)
            .enumerate()
            .fold(0u64, |acc, (i, &id)| acc | (u64::from(self.read(id)) << i))
    }

    /// Write bit `i` of `value` to `ids[i]`; ids past bit 63 receive 0
    pub fn write_bits(&mut self, ids: &[SignalId], value: u64) {
        for (i, &id) in ids.iter().enumerate() {
            let bit = i < 64 && (value >> i) & 1 == 1;
            self.write(id, bit);
        }
    }

    pub fn cycle(&self) -> u32 {
        self.words[WORD_CYCLE]
    }

    /// Advance the cycle counter, wrapping at `u32::MAX`
    pub fn increment_cycle(&mut self) {
        self.words[WORD_CYCLE] = self.words[WORD_CYCLE].wrapping_add(1);
    }

    pub fn signal_count(&self) -> usize {
        self.words[WORD_COUNT] as usize
    }

    pub fn as_words(&self) -> &[u32] {
        &self.words
    }

    /// Raw word view for engines that evaluate directly on the buffer
    pub fn as_words_mut(&mut self) -> &mut [u32] {
        &mut self.words
    }

    pub fn into_words(self) -> Vec<u32> {
        self.words
    }
}
