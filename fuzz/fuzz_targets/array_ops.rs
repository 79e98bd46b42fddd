#![no_main]

use libfuzzer_sys::fuzz_target;
use persistent_array::stress::{StressConfig, run_input};

fuzz_target!(|data: &[u8]| {
    // Arguments are validated while decoding, so any error is a defect in the array
    if let Err(error) = run_input(data, &StressConfig::default()) {
        panic!("{error}");
    }
});
