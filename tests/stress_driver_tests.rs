//! Integration tests for the byte-driven stress driver.

use persistent_array::stress::{
    ByteInput, DriverError, Operation, RunSummary, Step, StressConfig, StressDriver, run_input,
};
use rstest::rstest;

const PUSH: u8 = 0;
const UPDATE: u8 = 1;
const TAKE: u8 = 2;
const PUSH_MOVE: u8 = 3;
const UPDATE_MOVE: u8 = 4;
const TAKE_MOVE: u8 = 5;

fn contents(driver: &StressDriver, slot: usize) -> Vec<i32> {
    driver.slots()[slot].iter().copied().collect()
}

#[rstest]
fn test_empty_input_succeeds() {
    assert_eq!(
        run_input(&[], &StressConfig::default()).unwrap(),
        RunSummary::default()
    );
}

#[rstest]
#[case(&[0])]
#[case(&[0, 1])]
#[case(&[0, 1, UPDATE])]
#[case(&[0, 1, TAKE, 200, 9])]
fn test_truncated_step_ends_run(#[case] bytes: &[u8]) {
    let summary = run_input(bytes, &StressConfig::default()).unwrap();
    assert_eq!(summary.steps, 0);
}

#[rstest]
fn test_six_pushes_take_and_update() {
    let mut driver = StressDriver::new(StressConfig::default());
    let mut bytes = Vec::new();
    for _ in 0..6 {
        bytes.extend([0, 0, PUSH]);
    }
    bytes.extend([0, 1, TAKE, 3]);
    bytes.extend([0, 2, UPDATE, 0]);

    let summary = driver.run(&bytes).unwrap();

    assert_eq!(summary.pushes, 6);
    assert_eq!(summary.max_size, 6);
    assert_eq!(contents(&driver, 0), vec![42; 6]);
    assert_eq!(contents(&driver, 1), vec![42, 42, 42]);
    assert_eq!(contents(&driver, 2), vec![43, 42, 42, 42, 42, 42]);
}

#[rstest]
fn test_transfer_chain_moves_array_between_slots() {
    let mut driver = StressDriver::new(StressConfig::default());
    let bytes = [
        0, 0, PUSH, //
        0, 1, PUSH_MOVE, //
        1, 2, UPDATE_MOVE, 1, //
        2, 3, TAKE_MOVE, 1,
    ];

    let summary = driver.run(&bytes).unwrap();

    assert_eq!(summary.transfers, 3);
    assert!(driver.slots()[0].is_empty());
    assert!(driver.slots()[1].is_empty());
    assert!(driver.slots()[2].is_empty());
    assert_eq!(contents(&driver, 3), vec![42]);
}

#[rstest]
fn test_transfer_into_same_slot() {
    let mut driver = StressDriver::new(StressConfig::default());
    driver
        .run(&[0, 0, PUSH, 0, 0, PUSH_MOVE, 0, 0, UPDATE_MOVE, 1])
        .unwrap();
    assert_eq!(contents(&driver, 0), vec![42, 13]);
}

#[rstest]
fn test_rejected_operand_bytes_are_skipped() {
    let mut driver = StressDriver::new(StressConfig::default());
    // the update operand skips 7 and 200 before accepting 0
    let summary = driver.run(&[0, 0, PUSH, 9, 0, 1, UPDATE, 7, 200, 0]).unwrap();
    assert_eq!(summary.updates, 1);
    assert_eq!(contents(&driver, 1), vec![43]);
}

#[rstest]
fn test_custom_push_values_and_slot_count() {
    let config = StressConfig::new(2, 16).unwrap().with_push_values(7, 8);
    let mut driver = StressDriver::new(config);
    // slot byte 2 is out of range for two slots and is skipped
    driver.run(&[2, 1, 1, PUSH, 1, 1, PUSH_MOVE]).unwrap();
    assert_eq!(driver.slots().len(), 2);
    assert_eq!(contents(&driver, 1), vec![7, 8]);
}

#[rstest]
fn test_pushes_stop_growing_past_max_size() {
    let config = StressConfig::new(1, 10).unwrap();
    let bytes: Vec<u8> = std::iter::repeat_n([0, 0, PUSH_MOVE], 50).flatten().collect();

    let summary = run_input(&bytes, &config).unwrap();

    assert_eq!(summary.pushes, 11);
    assert_eq!(summary.skipped_pushes, 39);
    assert_eq!(summary.max_size, 11);
}

#[rstest]
fn test_decode_step_reports_operation() {
    let driver = StressDriver::new(StressConfig::default());
    let mut input = ByteInput::new(&[3, 2, 250]);
    assert_eq!(
        driver.decode_step(&mut input),
        Some(Step {
            source: 3,
            destination: 2,
            operation: Operation::Ignored { code: 250 },
        })
    );
}

#[rstest]
fn test_apply_reports_out_of_range_take() {
    let mut driver = StressDriver::new(StressConfig::default());
    let error = driver
        .apply(Step {
            source: 0,
            destination: 0,
            operation: Operation::Take { count: 1 },
        })
        .unwrap_err();
    assert!(matches!(error, DriverError::Array { step: 0, .. }));
    assert_eq!(
        error.to_string(),
        "step 0: count out of range: the size is 0 but the count is 1"
    );
}

#[rstest]
fn test_long_pseudo_random_input_without_verification_matches_verified_run() {
    let bytes: Vec<u8> = (0u32..20_000)
        .map(|index| (index.wrapping_mul(2_654_435_761) >> 13) as u8 % 8)
        .collect();

    let verified = run_input(&bytes, &StressConfig::default()).unwrap();
    let unverified = run_input(
        &bytes,
        &StressConfig::default().with_model_verification(false),
    )
    .unwrap();

    assert_eq!(verified, unverified);
    assert!(verified.steps > 0);
}
