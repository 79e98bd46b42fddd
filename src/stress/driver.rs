//! Byte-driven operation sequences over a fixed set of array slots.
//!
//! Each step is decoded from the input as
//!
//! ```text
//! source-slot  destination-slot  operation-code  [operand]
//! ```
//!
//! Slot bytes and operands that are out of range are skipped until a valid
//! one turns up, so every argument handed to the array is in range. Running
//! out of input ends the run successfully.

use std::fmt;

use tracing::{debug, trace};

use super::config::StressConfig;
use super::input::ByteInput;
use crate::array::{ArrayError, InvariantViolation, PersistentArray, TransferError};

const OP_PUSH_BACK: u8 = 0;
const OP_UPDATE: u8 = 1;
const OP_TAKE: u8 = 2;
const OP_PUSH_BACK_MOVE: u8 = 3;
const OP_UPDATE_MOVE: u8 = 4;
const OP_TAKE_MOVE: u8 = 5;

/// Array type held in every slot.
pub type SlotArray = PersistentArray<i32>;

/// One decoded operation.
///
/// The `*Move` variants consume the source slot, leaving it empty, and may
/// reuse its nodes in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Append the configured push value, sharing the source.
    PushBack,
    /// Increment the element at `index`, sharing the source.
    Update {
        /// Element to increment.
        index: usize,
    },
    /// Keep the first `count` elements, sharing the source.
    Take {
        /// Number of elements kept.
        count: usize,
    },
    /// Append the configured move push value, consuming the source.
    PushBackMove,
    /// Increment the element at `index`, consuming the source.
    UpdateMove {
        /// Element to increment.
        index: usize,
    },
    /// Keep the first `count` elements, consuming the source.
    TakeMove {
        /// Number of elements kept.
        count: usize,
    },
    /// Unknown operation code; the step does nothing.
    Ignored {
        /// The code that was read.
        code: u8,
    },
}

impl Operation {
    /// Returns `true` for the ownership-transfer variants.
    #[must_use]
    pub const fn is_transfer(&self) -> bool {
        matches!(
            self,
            Self::PushBackMove | Self::UpdateMove { .. } | Self::TakeMove { .. }
        )
    }
}

/// A decoded step: which slot to read, which slot to overwrite, and what to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Slot the operation reads.
    pub source: usize,
    /// Slot the result is stored into.
    pub destination: usize,
    /// The operation applied to the source array.
    pub operation: Operation,
}

/// Counters collected over a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Steps decoded, including ignored and skipped ones.
    pub steps: usize,
    /// Appends applied.
    pub pushes: usize,
    /// Updates applied.
    pub updates: usize,
    /// Truncations applied.
    pub takes: usize,
    /// Applied operations that consumed their source.
    pub transfers: usize,
    /// Appends skipped because the source exceeded the size bound.
    pub skipped_pushes: usize,
    /// Steps with an unknown operation code.
    pub ignored: usize,
    /// Largest array size produced.
    pub max_size: usize,
}

/// Failure raised while running a stress sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// The array rejected an operation.
    Array {
        /// Index of the failing step.
        step: usize,
        /// The rejection reported by the array.
        error: ArrayError,
    },
    /// A slot holds a structurally broken tree.
    Invariant {
        /// Index of the failing step.
        step: usize,
        /// Slot holding the broken array.
        slot: usize,
        /// The broken invariant.
        violation: InvariantViolation,
    },
    /// A slot disagrees with its `Vec` mirror.
    ModelMismatch {
        /// Index of the failing step.
        step: usize,
        /// Slot holding the diverging array.
        slot: usize,
        /// Mirror length.
        expected_len: usize,
        /// Array length.
        actual_len: usize,
    },
}

impl fmt::Display for DriverError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array { step, error } => write!(formatter, "step {step}: {error}"),
            Self::Invariant {
                step,
                slot,
                violation,
            } => write!(formatter, "step {step}: slot {slot}: {violation}"),
            Self::ModelMismatch {
                step,
                slot,
                expected_len,
                actual_len,
            } => write!(
                formatter,
                "step {step}: slot {slot} diverged from its model \
                 (model has {expected_len} elements, array has {actual_len})"
            ),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Array { error, .. } => Some(error),
            Self::Invariant { violation, .. } => Some(violation),
            Self::ModelMismatch { .. } => None,
        }
    }
}

/// Applies decoded steps to a fixed set of array slots.
///
/// # Examples
///
/// ```rust
/// use persistent_array::stress::{StressConfig, StressDriver};
///
/// let mut driver = StressDriver::new(StressConfig::default());
/// // slot 0 -> slot 0: push_back, twice; then slot 0 -> slot 1: take 1
/// let summary = driver.run(&[0, 0, 0, 0, 0, 0, 0, 1, 2, 1]).unwrap();
///
/// assert_eq!(summary.pushes, 2);
/// assert_eq!(summary.takes, 1);
/// assert_eq!(driver.slots()[0].len(), 2);
/// assert_eq!(driver.slots()[1].len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct StressDriver {
    config: StressConfig,
    slots: Vec<SlotArray>,
    models: Vec<Vec<i32>>,
    summary: RunSummary,
}

impl StressDriver {
    /// Creates a driver whose slots all hold the empty array.
    #[must_use]
    pub fn new(config: StressConfig) -> Self {
        let slot_count = config.slot_count();
        Self {
            config,
            slots: vec![SlotArray::new(); slot_count],
            models: vec![Vec::new(); slot_count],
            summary: RunSummary::default(),
        }
    }

    /// The current slot contents.
    #[must_use]
    pub fn slots(&self) -> &[SlotArray] {
        &self.slots
    }

    /// Counters collected so far.
    #[must_use]
    pub const fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Decodes the next step, validating operands against the current size
    /// of the source slot. Returns `None` once the input runs out.
    pub fn decode_step(&self, input: &mut ByteInput<'_>) -> Option<Step> {
        let slot_count = self.config.slot_count();
        let is_slot = |byte: u8| usize::from(byte) < slot_count;
        let source = usize::from(input.read_where(is_slot)?);
        let destination = usize::from(input.read_where(is_slot)?);
        let size = self.slots[source].len();
        let operation = match input.read()? {
            OP_PUSH_BACK => Operation::PushBack,
            OP_UPDATE => Operation::Update {
                index: read_index(input, size)?,
            },
            OP_TAKE => Operation::Take {
                count: read_count(input, size)?,
            },
            OP_PUSH_BACK_MOVE => Operation::PushBackMove,
            OP_UPDATE_MOVE => Operation::UpdateMove {
                index: read_index(input, size)?,
            },
            OP_TAKE_MOVE => Operation::TakeMove {
                count: read_count(input, size)?,
            },
            code => Operation::Ignored { code },
        };
        Some(Step {
            source,
            destination,
            operation,
        })
    }

    /// Applies one step and, when enabled, checks the touched slots against
    /// their mirrors.
    ///
    /// # Errors
    ///
    /// Returns a [`DriverError`] if the array rejects the operation, a slot
    /// fails validation, or a slot diverges from its mirror.
    pub fn apply(&mut self, step: Step) -> Result<(), DriverError> {
        let step_number = self.summary.steps;
        self.summary.steps += 1;
        let Step {
            source,
            destination,
            operation,
        } = step;

        if matches!(operation, Operation::PushBack | Operation::PushBackMove)
            && self.slots[source].len() > self.config.max_size()
        {
            debug!(
                step = step_number,
                source,
                size = self.slots[source].len(),
                max_size = self.config.max_size(),
                "skipping push onto oversized array"
            );
            self.summary.skipped_pushes += 1;
            return Ok(());
        }

        let result = match operation {
            Operation::Ignored { .. } => {
                self.summary.ignored += 1;
                return Ok(());
            }
            Operation::PushBack => self.slots[source].push_back(self.config.push_value()),
            Operation::Update { index } => self.slots[source]
                .update(index, increment)
                .map_err(|error| DriverError::Array {
                    step: step_number,
                    error,
                })?,
            Operation::Take { count } => {
                self.slots[source]
                    .take(count)
                    .map_err(|error| DriverError::Array {
                        step: step_number,
                        error,
                    })?
            }
            Operation::PushBackMove => {
                let value = self.config.move_push_value();
                self.take_slot(source).into_push_back(value)
            }
            Operation::UpdateMove { index } => {
                let transferred = self.take_slot(source).into_update(index, increment);
                self.restore_on_rejection(step_number, source, transferred)?
            }
            Operation::TakeMove { count } => {
                let transferred = self.take_slot(source).into_take(count);
                self.restore_on_rejection(step_number, source, transferred)?
            }
        };

        match operation {
            Operation::PushBack | Operation::PushBackMove => self.summary.pushes += 1,
            Operation::Update { .. } | Operation::UpdateMove { .. } => self.summary.updates += 1,
            _ => self.summary.takes += 1,
        }
        if operation.is_transfer() {
            self.summary.transfers += 1;
        }
        let size = result.len();
        self.summary.max_size = self.summary.max_size.max(size);
        self.slots[destination] = result;

        trace!(
            step = step_number,
            source,
            destination,
            operation = ?operation,
            size,
            "applied step"
        );

        if self.config.verify_model() {
            self.apply_to_model(step);
            self.verify_slot(step_number, source)?;
            self.verify_slot(step_number, destination)?;
        }
        Ok(())
    }

    /// Decodes and applies steps until the input runs out.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step and returns its [`DriverError`].
    pub fn run(&mut self, bytes: &[u8]) -> Result<RunSummary, DriverError> {
        let mut input = ByteInput::new(bytes);
        while let Some(step) = self.decode_step(&mut input) {
            self.apply(step)?;
        }
        debug!(
            steps = self.summary.steps,
            consumed = input.position(),
            max_size = self.summary.max_size,
            "stress run finished"
        );
        Ok(self.summary.clone())
    }

    fn take_slot(&mut self, slot: usize) -> SlotArray {
        std::mem::take(&mut self.slots[slot])
    }

    fn restore_on_rejection(
        &mut self,
        step: usize,
        slot: usize,
        transferred: Result<SlotArray, TransferError<SlotArray>>,
    ) -> Result<SlotArray, DriverError> {
        transferred.map_err(|rejected| {
            let (error, array) = rejected.into_parts();
            self.slots[slot] = array;
            DriverError::Array { step, error }
        })
    }

    fn apply_to_model(&mut self, step: Step) {
        let Step {
            source,
            destination,
            operation,
        } = step;
        let model = match operation {
            Operation::PushBack => {
                let mut model = self.models[source].clone();
                model.push(self.config.push_value());
                model
            }
            Operation::Update { index } => {
                let mut model = self.models[source].clone();
                model[index] = increment(&model[index]);
                model
            }
            Operation::Take { count } => self.models[source][..count].to_vec(),
            Operation::PushBackMove => {
                let mut model = std::mem::take(&mut self.models[source]);
                model.push(self.config.move_push_value());
                model
            }
            Operation::UpdateMove { index } => {
                let mut model = std::mem::take(&mut self.models[source]);
                model[index] = increment(&model[index]);
                model
            }
            Operation::TakeMove { count } => {
                let mut model = std::mem::take(&mut self.models[source]);
                model.truncate(count);
                model
            }
            Operation::Ignored { .. } => return,
        };
        self.models[destination] = model;
    }

    fn verify_slot(&self, step: usize, slot: usize) -> Result<(), DriverError> {
        let array = &self.slots[slot];
        let model = &self.models[slot];
        array.validate().map_err(|violation| DriverError::Invariant {
            step,
            slot,
            violation,
        })?;
        if array.len() == model.len() && array.iter().eq(model.iter()) {
            Ok(())
        } else {
            Err(DriverError::ModelMismatch {
                step,
                slot,
                expected_len: model.len(),
                actual_len: array.len(),
            })
        }
    }
}

fn read_index(input: &mut ByteInput<'_>, size: usize) -> Option<usize> {
    input
        .read_where(|byte| usize::from(byte) < size)
        .map(usize::from)
}

fn read_count(input: &mut ByteInput<'_>, size: usize) -> Option<usize> {
    input
        .read_where(|byte| usize::from(byte) <= size)
        .map(usize::from)
}

const fn increment(element: &i32) -> i32 {
    element.wrapping_add(1)
}

/// Runs `bytes` through a fresh [`StressDriver`].
///
/// # Errors
///
/// Returns the first [`DriverError`] raised by the run.
///
/// # Examples
///
/// ```rust
/// use persistent_array::stress::{run_input, StressConfig};
///
/// let summary = run_input(&[0, 1, 3, 1, 1, 4, 0], &StressConfig::default()).unwrap();
/// assert_eq!(summary.steps, 2);
/// assert_eq!(summary.transfers, 2);
/// ```
pub fn run_input(bytes: &[u8], config: &StressConfig) -> Result<RunSummary, DriverError> {
    StressDriver::new(config.clone()).run(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn contents(driver: &StressDriver, slot: usize) -> Vec<i32> {
        driver.slots()[slot].iter().copied().collect()
    }

    #[rstest]
    fn test_decode_rejects_out_of_range_slots() {
        let driver = StressDriver::new(StressConfig::default());
        let mut input = ByteInput::new(&[9, 2, 200, 3, 0]);
        assert_eq!(
            driver.decode_step(&mut input),
            Some(Step {
                source: 2,
                destination: 3,
                operation: Operation::PushBack,
            })
        );
    }

    #[rstest]
    fn test_decode_update_on_empty_source_exhausts_input() {
        let driver = StressDriver::new(StressConfig::default());
        let mut input = ByteInput::new(&[0, 0, OP_UPDATE, 0, 1, 2]);
        assert_eq!(driver.decode_step(&mut input), None);
        assert!(input.is_exhausted());
    }

    #[rstest]
    fn test_decode_take_accepts_full_size() {
        let mut driver = StressDriver::new(StressConfig::default());
        driver.run(&[0, 0, OP_PUSH_BACK]).unwrap();
        let mut input = ByteInput::new(&[0, 1, OP_TAKE, 2, 1]);
        assert_eq!(
            driver.decode_step(&mut input).map(|step| step.operation),
            Some(Operation::Take { count: 1 })
        );
    }

    #[rstest]
    fn test_unknown_code_is_ignored() {
        let mut driver = StressDriver::new(StressConfig::default());
        let summary = driver.run(&[0, 0, 77]).unwrap();
        assert_eq!(summary.steps, 1);
        assert_eq!(summary.ignored, 1);
        assert!(driver.slots()[0].is_empty());
    }

    #[rstest]
    fn test_move_push_empties_source_slot() {
        let mut driver = StressDriver::new(StressConfig::default());
        driver
            .run(&[0, 0, OP_PUSH_BACK, 0, 1, OP_PUSH_BACK_MOVE])
            .unwrap();
        assert!(driver.slots()[0].is_empty());
        assert_eq!(contents(&driver, 1), vec![42, 12]);
    }

    #[rstest]
    fn test_shared_update_keeps_source() {
        let mut driver = StressDriver::new(StressConfig::default());
        driver
            .run(&[0, 0, OP_PUSH_BACK, 0, 1, OP_UPDATE, 0])
            .unwrap();
        assert_eq!(contents(&driver, 0), vec![42]);
        assert_eq!(contents(&driver, 1), vec![43]);
    }

    #[rstest]
    fn test_push_skipped_above_max_size() {
        let config = StressConfig::new(4, 1).unwrap();
        let mut driver = StressDriver::new(config);
        let summary = driver
            .run(&[0, 0, OP_PUSH_BACK, 0, 0, OP_PUSH_BACK, 0, 0, OP_PUSH_BACK])
            .unwrap();
        assert_eq!(summary.pushes, 2);
        assert_eq!(summary.skipped_pushes, 1);
        assert_eq!(driver.slots()[0].len(), 2);
    }

    #[rstest]
    fn test_apply_rejects_invalid_update_and_restores_source() {
        let mut driver = StressDriver::new(StressConfig::default());
        driver.run(&[0, 0, OP_PUSH_BACK]).unwrap();
        let error = driver
            .apply(Step {
                source: 0,
                destination: 1,
                operation: Operation::UpdateMove { index: 5 },
            })
            .unwrap_err();
        assert_eq!(
            error,
            DriverError::Array {
                step: 1,
                error: ArrayError::IndexOutOfRange { index: 5, size: 1 },
            }
        );
        assert_eq!(contents(&driver, 0), vec![42]);
    }

    #[rstest]
    fn test_driver_error_display() {
        let error = DriverError::ModelMismatch {
            step: 3,
            slot: 1,
            expected_len: 2,
            actual_len: 1,
        };
        assert_eq!(
            format!("{error}"),
            "step 3: slot 1 diverged from its model (model has 2 elements, array has 1)"
        );
    }
}
