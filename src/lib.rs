//! # persistent-array
//!
//! A persistent (immutable) array for Rust built on a relaxed radix-balanced
//! tree with structural sharing.
//!
//! ## Overview
//!
//! Every operation returns a new version of the array and leaves the old
//! version unchanged. Versions share all untouched subtrees, so an
//! `update` or a `push_back` only copies the nodes on one root-to-leaf path.
//! Each operation also comes in an ownership-transfer form (`into_*`) that
//! reuses nodes in place when nothing else refers to them.
//!
//! - **Array**: [`PersistentArray`] with `push_back`, `update` and `take`
//! - **Stress Driver**: byte-driven operation sequences checked against a
//!   `Vec` mirror
//!
//! ## Feature Flags
//!
//! - `arc`: share nodes through `Arc` instead of `Rc`, making arrays `Send`
//!   and `Sync`
//! - `stress`: the byte-driven stress driver (enabled by default)
//!
//! ## Example
//!
//! ```rust
//! use persistent_array::prelude::*;
//!
//! let array: PersistentArray<i32> = (1..=3).collect();
//! let updated = array.update(1, |x| x * 10).unwrap();
//!
//! assert_eq!(array.to_string(), "[1, 2, 3]");
//! assert_eq!(updated.to_string(), "[1, 20, 3]");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use persistent_array::prelude::*;
/// ```
pub mod prelude {
    pub use crate::array::{ArrayError, PersistentArray, TransferError};

    #[cfg(feature = "stress")]
    pub use crate::stress::{StressConfig, StressDriver, run_input};
}

pub mod array;

#[cfg(feature = "stress")]
pub mod stress;

pub use array::{ArrayError, InvariantViolation, PersistentArray, TransferError};
