//! Persistent (immutable) array.
//!
//! This module provides [`PersistentArray`], an immutable array that uses
//! structural sharing so that every version stays valid after it has been
//! "modified":
//!
//! - `push_back` appends at the end, growing the tree by one level when
//!   every leaf is full
//! - `update` replaces one element by a function of its old value
//! - `take` keeps a prefix, dropping the subtrees after it
//!
//! # Structural Sharing
//!
//! The array is a tree of reference-counted nodes. An operation copies only
//! the nodes on the path it touches and re-links every other subtree by
//! incrementing its reference count. When the receiver is passed by value
//! and owns a node exclusively, that node is reused in place instead.
//!
//! # Examples
//!
//! ```rust
//! use persistent_array::array::PersistentArray;
//!
//! let mut array: PersistentArray<i32, 4> = PersistentArray::new();
//! for _ in 0..6 {
//!     array = array.push_back(42);
//! }
//! assert_eq!(array.height(), 2);
//!
//! let taken = array.take(3).unwrap();
//! assert_eq!(taken.iter().copied().collect::<Vec<_>>(), vec![42, 42, 42]);
//!
//! let updated = array.update(0, |x| x + 1).unwrap();
//! assert_eq!(
//!     updated.iter().copied().collect::<Vec<_>>(),
//!     vec![43, 42, 42, 42, 42, 42]
//! );
//! assert_eq!(array.iter().copied().collect::<Vec<_>>(), vec![42; 6]);
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod error;
mod node;
mod persistent_array;

pub use error::ArrayError;
pub use error::InvariantViolation;
pub use error::TransferError;
pub use persistent_array::DEFAULT_BRANCHING_FACTOR;
pub use persistent_array::PersistentArray;
pub use persistent_array::PersistentArrayIntoIterator;
pub use persistent_array::PersistentArrayIterator;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod reference_counter_tests {
    use super::ReferenceCounter;
    use rstest::rstest;

    #[rstest]
    fn test_reference_counter_get_mut_requires_unique_owner() {
        let mut reference_counter: ReferenceCounter<i32> = ReferenceCounter::new(42);
        assert!(ReferenceCounter::get_mut(&mut reference_counter).is_some());
        let reference_counter_clone = reference_counter.clone();
        assert!(ReferenceCounter::get_mut(&mut reference_counter).is_none());
        drop(reference_counter_clone);
        assert!(ReferenceCounter::get_mut(&mut reference_counter).is_some());
    }

    #[rstest]
    fn test_reference_counter_strong_count() {
        let reference_counter: ReferenceCounter<i32> = ReferenceCounter::new(42);
        assert_eq!(ReferenceCounter::strong_count(&reference_counter), 1);
        let reference_counter_clone = reference_counter.clone();
        assert_eq!(ReferenceCounter::strong_count(&reference_counter), 2);
        drop(reference_counter_clone);
        assert_eq!(ReferenceCounter::strong_count(&reference_counter), 1);
    }
}
