//! Byte-driven stress testing of [`PersistentArray`](crate::array::PersistentArray).
//!
//! An input blob is decoded into a sequence of steps, each applying one
//! sharing or ownership-transfer operation to a small set of array slots.
//! Every argument handed to the array is validated during decoding, so any
//! [`DriverError`] indicates a defect in the array itself.
//!
//! # Examples
//!
//! ```rust
//! use persistent_array::stress::{run_input, StressConfig};
//!
//! let summary = run_input(b"\x00\x00\x00\x00\x01\x02\x01", &StressConfig::default()).unwrap();
//! assert_eq!(summary.pushes, 1);
//! assert_eq!(summary.takes, 1);
//! ```

mod config;
mod driver;
mod input;

pub use config::ConfigError;
pub use config::StressConfig;
pub use driver::DriverError;
pub use driver::Operation;
pub use driver::RunSummary;
pub use driver::SlotArray;
pub use driver::Step;
pub use driver::StressDriver;
pub use driver::run_input;
pub use input::ByteInput;
