//! VCD (Value Change Dump) writer for recorded waveforms

use super::WaveSample;
use std::fmt::Write;

/// Prefixes of bookkeeping signals created by the elaborator
pub const INTERNAL_PREFIXES: [&str; 2] = ["nand_", "dff_"];

pub fn is_internal(name: &str) -> bool {
    INTERNAL_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// Identifier code for the `idx`-th variable: printable ASCII from `'!'`,
/// growing to several characters past 94 variables
pub fn vcd_id(idx: usize) -> String {
    const BASE: usize = 94;
    const OFFSET: u8 = b'!';

    let mut id = Vec::new();
    let mut n = idx;
    loop {
        id.push(OFFSET + (n % BASE) as u8);
        n /= BASE;
        if n == 0 {
            break;
        }
        n -= 1;
    }
    id.reverse();
    String::from_utf8_lossy(&id).into_owned()
}

/// Render `samples` for the signals in `names`.
///
/// The first sample becomes the `$dumpvars` block at time 0; every later
/// sample opens a `#cycle*10` block listing only the signals that changed.
pub fn render(module: &str, timescale: &str, names: &[&str], samples: &[WaveSample]) -> String {
    let ids: Vec<String> = (0..names.len()).map(vcd_id).collect();
    let mut out = String::new();

    let _ = writeln!(out, "$timescale {timescale} $end");
    let _ = writeln!(out, "$scope module {module} $end");
    for (name, id) in names.iter().zip(&ids) {
        let _ = writeln!(out, "$var wire 1 {id} {name} $end");
    }
    out.push_str("$upscope $end\n");
    out.push_str("$enddefinitions $end\n");

    let Some((first, rest)) = samples.split_first() else {
        return out;
    };

    let value = |sample: &WaveSample, name: &str| sample.values.get(name).copied().unwrap_or(false);

    out.push_str("#0\n$dumpvars\n");
    for (name, id) in names.iter().zip(&ids) {
        let _ = writeln!(out, "{}{}", u8::from(value(first, name)), id);
    }
    out.push_str("$end\n");

    let mut previous = first;
    for sample in rest {
        let _ = writeln!(out, "#{}", u64::from(sample.cycle) * 10);
        for (name, id) in names.iter().zip(&ids) {
            let v = value(sample, name);
            if v != value(previous, name) {
                let _ = writeln!(out, "{}{}", u8::from(v), id);
            }
        }
        previous = sample;
    }
    out
}
