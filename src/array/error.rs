//! Error types for persistent array operations.
//!
//! Out-of-range arguments are reported as [`ArrayError`] and never clamped.
//! The ownership-transfer operations hand the untouched source array back
//! inside a [`TransferError`] so that a rejected call loses nothing.

use std::fmt;

/// Represents an out-of-range argument passed to a persistent array operation.
///
/// # Examples
///
/// ```rust
/// use persistent_array::array::{ArrayError, PersistentArray};
///
/// let array: PersistentArray<i32> = (0..3).collect();
/// assert_eq!(
///     array.take(4).unwrap_err(),
///     ArrayError::CountOutOfRange { count: 4, size: 3 }
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayError {
    /// `update` was asked for an index that is not below the array size.
    IndexOutOfRange {
        /// The rejected index.
        index: usize,
        /// The size of the array at the time of the call.
        size: usize,
    },
    /// `take` was asked for more elements than the array holds.
    CountOutOfRange {
        /// The rejected element count.
        count: usize,
        /// The size of the array at the time of the call.
        size: usize,
    },
}

impl fmt::Display for ArrayError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfRange { index, size } => write!(
                formatter,
                "index out of range: the size is {size} but the index is {index}"
            ),
            Self::CountOutOfRange { count, size } => write!(
                formatter,
                "count out of range: the size is {size} but the count is {count}"
            ),
        }
    }
}

impl std::error::Error for ArrayError {}

/// A rejected ownership-transfer operation.
///
/// Carries the [`ArrayError`] describing the rejection together with the
/// source array, which is returned exactly as it was passed in.
///
/// # Examples
///
/// ```rust
/// use persistent_array::array::{ArrayError, PersistentArray};
///
/// let array: PersistentArray<i32> = (0..3).collect();
/// let rejected = array.into_update(3, |x| x + 1).unwrap_err();
///
/// assert_eq!(rejected.error(), ArrayError::IndexOutOfRange { index: 3, size: 3 });
/// let array = rejected.into_array();
/// assert_eq!(array.len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct TransferError<A> {
    error: ArrayError,
    array: A,
}

impl<A> TransferError<A> {
    pub(crate) const fn new(error: ArrayError, array: A) -> Self {
        Self { error, array }
    }

    /// Returns the reason the operation was rejected.
    #[inline]
    #[must_use]
    pub const fn error(&self) -> ArrayError {
        self.error
    }

    /// Returns the source array, unchanged.
    #[inline]
    #[must_use]
    pub fn into_array(self) -> A {
        self.array
    }

    /// Splits the error into the rejection reason and the source array.
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (ArrayError, A) {
        (self.error, self.array)
    }
}

impl<A> fmt::Display for TransferError<A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.error)
    }
}

impl<A: fmt::Debug> std::error::Error for TransferError<A> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<A> From<TransferError<A>> for ArrayError {
    fn from(error: TransferError<A>) -> Self {
        error.error
    }
}

/// A broken structural invariant found by
/// [`PersistentArray::validate`](super::PersistentArray::validate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Distance from the root of the node where the violation was found.
    pub depth: usize,
    /// The invariant that does not hold.
    pub reason: &'static str,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "invariant violated at depth {}: {}",
            self.depth, self.reason
        )
    }
}

impl std::error::Error for InvariantViolation {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_index_out_of_range_display() {
        let error = ArrayError::IndexOutOfRange { index: 7, size: 3 };
        assert_eq!(
            format!("{error}"),
            "index out of range: the size is 3 but the index is 7"
        );
    }

    #[rstest]
    fn test_count_out_of_range_display() {
        let error = ArrayError::CountOutOfRange { count: 4, size: 3 };
        assert_eq!(
            format!("{error}"),
            "count out of range: the size is 3 but the count is 4"
        );
    }

    #[rstest]
    fn test_transfer_error_returns_array_and_reason() {
        let error = TransferError::new(ArrayError::IndexOutOfRange { index: 1, size: 0 }, "array");
        assert_eq!(format!("{error}"), "index out of range: the size is 0 but the index is 1");
        let (reason, array) = error.into_parts();
        assert_eq!(reason, ArrayError::IndexOutOfRange { index: 1, size: 0 });
        assert_eq!(array, "array");
    }

    #[rstest]
    fn test_transfer_error_source_is_reason() {
        use std::error::Error;

        let error = TransferError::new(ArrayError::CountOutOfRange { count: 2, size: 1 }, 0_u8);
        let source = error.source().map(ToString::to_string);
        assert_eq!(
            source.as_deref(),
            Some("count out of range: the size is 1 but the count is 2")
        );
    }

    #[rstest]
    fn test_invariant_violation_display() {
        let violation = InvariantViolation {
            depth: 2,
            reason: "internal node has no children",
        };
        assert_eq!(
            format!("{violation}"),
            "invariant violated at depth 2: internal node has no children"
        );
    }
}
