//! Pre-flight statistical self-test applied to a PRNG's first output sample.
//!
//! The gate looks at a single 64-bit sample and thresholds four independent statistics.
//! All four must hold for the sample to pass. It is run once per PRNG initialization,
//! never per output block -- a PRNG that fails the gate must not be used for a wipe pass.

fn bit(sample: u64, index: u32) -> bool {
    (sample >> index) & 1 == 1
}

fn shannon_entropy(ones_fraction: f64) -> f64 {
    let p = ones_fraction;
    let term = |x: f64| if x <= 0.0 { 0.0 } else { -x * x.log2() };
    term(p) + term(1.0 - p)
}

/// Count maximal runs of identical consecutive bits (NIST SP800-22 style run count).
fn run_count(sample: u64) -> u32 {
    let mut runs = 1u32;
    let mut prev = bit(sample, 0);
    for i in 1..64 {
        let b = bit(sample, i);
        if b != prev {
            runs += 1;
            prev = b;
        }
    }
    runs
}

/// Lag-1 autocorrelation of adjacent bits, mapped to {-1, +1} before averaging.
fn adjacent_autocorrelation(sample: u64) -> f64 {
    let mut sum = 0.0;
    for i in 0..63 {
        let a = if bit(sample, i) { 1.0 } else { -1.0 };
        let b = if bit(sample, i + 1) { 1.0 } else { -1.0 };
        sum += a * b;
    }
    sum / 63.0
}

/// Statistics computed by the entropy gate, exposed for logging/diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntropyStats {
    pub shannon: f64,
    pub ones_fraction: f64,
    pub runs: u32,
    pub autocorrelation: f64,
}

pub fn entropy_stats(sample: u64) -> EntropyStats {
    let ones = sample.count_ones();
    let ones_fraction = ones as f64 / 64.0;
    EntropyStats {
        shannon: shannon_entropy(ones_fraction),
        ones_fraction,
        runs: run_count(sample),
        autocorrelation: adjacent_autocorrelation(sample),
    }
}

/// Accepts a 64-bit sample, returns pass/fail per §4.8. All four statistics must clear
/// their threshold; any one failure rejects the sample.
pub fn entropy_gate(sample: u64) -> bool {
    let stats = entropy_stats(sample);
    stats.shannon > 0.9
        && stats.ones_fraction > 0.4
        && stats.ones_fraction < 0.6
        && stats.runs > 20
        && stats.runs < 44
        && stats.autocorrelation < 0.5
}
