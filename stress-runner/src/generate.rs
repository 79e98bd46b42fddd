//! Seeded random input generation.
//!
//! Run `n` of seed `s` is generated from `StdRng::seed_from_u64(s + n)`, so a
//! single failing run can be regenerated without replaying the ones before it.

use std::path::PathBuf;

use clap::Args;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Operation codes understood by the driver; anything else is ignored.
const OPERATION_CODES: u8 = 6;

/// Arguments for the generate subcommand
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Random seed for reproducible inputs
    #[arg(long, env = "PERSISTENT_ARRAY_SEED", default_value_t = 0)]
    pub seed: u64,

    /// Number of inputs to generate and run
    #[arg(long, env = "PERSISTENT_ARRAY_RUNS", default_value_t = 1000)]
    pub runs: u64,

    /// Length of each generated input in bytes
    #[arg(long, default_value_t = 4096)]
    pub input_length: usize,

    /// Directory failing inputs are written to
    #[arg(long, default_value = "stress-failures")]
    pub failure_dir: PathBuf,
}

/// Yields `(run, input)` pairs for every requested run.
pub fn inputs(args: &GenerateArgs, slot_count: usize) -> impl Iterator<Item = (u64, Vec<u8>)> {
    let seed = args.seed;
    let input_length = args.input_length;
    (0..args.runs).map(move |run| {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(run));
        (run, input(&mut rng, input_length, slot_count))
    })
}

/// Builds one input out of step-shaped chunks.
///
/// Slot bytes stay in range and most operation codes are known ones, so few
/// bytes are spent on rejected arguments.
fn input(rng: &mut StdRng, length: usize, slot_count: usize) -> Vec<u8> {
    let last_slot = u8::try_from(slot_count.saturating_sub(1)).unwrap_or(u8::MAX);
    let mut bytes = Vec::with_capacity(length + 4);
    while bytes.len() < length {
        bytes.push(rng.random_range(0..=last_slot));
        bytes.push(rng.random_range(0..=last_slot));
        if rng.random_bool(0.02) {
            bytes.push(rng.random_range(OPERATION_CODES..=u8::MAX));
        } else {
            let code = rng.random_range(0..OPERATION_CODES);
            bytes.push(code);
            if code % 3 != 0 {
                bytes.push(rng.random_range(0..=u8::MAX));
            }
        }
    }
    bytes.truncate(length);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn args(seed: u64, runs: u64) -> GenerateArgs {
        GenerateArgs {
            seed,
            runs,
            input_length: 64,
            failure_dir: PathBuf::from("unused"),
        }
    }

    #[rstest]
    fn test_inputs_are_reproducible() {
        let first: Vec<_> = inputs(&args(7, 3), 4).collect();
        let second: Vec<_> = inputs(&args(7, 3), 4).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[rstest]
    fn test_run_can_be_regenerated_from_offset_seed() {
        let (_, third) = inputs(&args(7, 3), 4).nth(2).unwrap();
        let (_, regenerated) = inputs(&args(9, 1), 4).next().unwrap();
        assert_eq!(third, regenerated);
    }

    #[rstest]
    #[case(1)]
    #[case(4)]
    #[case(256)]
    fn test_inputs_have_requested_length(#[case] slot_count: usize) {
        for (_, bytes) in inputs(&args(1, 5), slot_count) {
            assert_eq!(bytes.len(), 64);
        }
    }
}
