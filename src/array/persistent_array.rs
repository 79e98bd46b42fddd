//! Persistent (immutable) array with structural sharing.
//!
//! This module provides [`PersistentArray`], an immutable array backed by a
//! `B`-way tree whose internal nodes carry relaxed size tables.
//!
//! # Overview
//!
//! Every operation that changes the contents returns a new array and leaves
//! the receiver untouched. Two invocation modes exist for each of them:
//!
//! - **by sharing** (`push_back`, `update`, `take`): the receiver is
//!   borrowed; only the affected root-to-leaf path is copied and every other
//!   subtree is shared with the receiver.
//! - **by ownership transfer** (`into_push_back`, `into_update`,
//!   `into_take`): the receiver is consumed; nodes it owns exclusively are
//!   reused in place, and shared nodes are copied as above.
//!
//! Both modes produce element-wise identical arrays.
//!
//! # Examples
//!
//! ```rust
//! use persistent_array::array::PersistentArray;
//!
//! let array: PersistentArray<i32> = PersistentArray::new()
//!     .push_back(1)
//!     .push_back(2)
//!     .push_back(3);
//!
//! let updated = array.update(1, |x| x * 10).unwrap();
//! assert_eq!(array.get(1), Some(&2));    // Original unchanged
//! assert_eq!(updated.get(1), Some(&20)); // New version
//!
//! // Consuming the array lets unshared nodes be reused in place
//! let truncated = updated.into_take(2).unwrap();
//! assert_eq!(truncated.iter().copied().collect::<Vec<_>>(), vec![1, 20]);
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Index;

use smallvec::SmallVec;

use super::ReferenceCounter;
use super::error::{ArrayError, InvariantViolation, TransferError};
use super::node::{Node, NodeRef};

/// Default number of children per internal node and elements per leaf.
pub const DEFAULT_BRANCHING_FACTOR: usize = 32;

// =============================================================================
// PersistentArray Definition
// =============================================================================

/// A persistent (immutable) array based on a size-annotated `B`-way tree.
///
/// `B` is the branching factor: the maximum number of elements per leaf
/// and of children per internal node. It must be at least 2.
///
/// # Time Complexity
///
/// | Operation                        | Complexity          |
/// |----------------------------------|---------------------|
/// | `new`                            | O(1)                |
/// | `get`                            | O(logB N · log B)   |
/// | `push_back` / `into_push_back`   | O(B logB N)         |
/// | `update` / `into_update`         | O(B logB N)         |
/// | `take` / `into_take`             | O(B logB N)         |
/// | `len`                            | O(1)                |
/// | `iter`                           | O(1) to create, O(N) to iterate |
///
/// # Examples
///
/// ```rust
/// use persistent_array::array::PersistentArray;
///
/// let array: PersistentArray<i32, 4> = (0..10).collect();
/// assert_eq!(array.len(), 10);
/// assert_eq!(array.height(), 2);
/// assert_eq!(array.get(7), Some(&7));
/// ```
pub struct PersistentArray<T, const B: usize = DEFAULT_BRANCHING_FACTOR> {
    /// Total number of elements
    size: usize,
    /// Number of tree levels; 0 for the empty array, 1 for a single leaf
    height: usize,
    /// Root of the tree; `None` exactly when `size == 0`
    root: Option<NodeRef<T, B>>,
}

impl<T, const B: usize> PersistentArray<T, B> {
    const BRANCHING_FACTOR_IS_VALID: () = assert!(B >= 2, "branching factor must be at least 2");

    /// Creates a new empty array.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_array::array::PersistentArray;
    ///
    /// let array: PersistentArray<i32> = PersistentArray::new();
    /// assert!(array.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        let () = Self::BRANCHING_FACTOR_IS_VALID;
        Self {
            size: 0,
            height: 0,
            root: None,
        }
    }

    #[inline]
    fn from_root(root: Option<(NodeRef<T, B>, usize)>, size: usize) -> Self {
        match root {
            Some((root, height)) => Self {
                size,
                height,
                root: Some(root),
            },
            None => Self::new(),
        }
    }

    /// Returns the number of elements in the array.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the array contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the number of tree levels: 0 when empty, 1 while every
    /// element fits in a single leaf.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_array::array::PersistentArray;
    ///
    /// let small: PersistentArray<i32, 4> = (0..4).collect();
    /// let grown = small.push_back(4);
    /// assert_eq!(small.height(), 1);
    /// assert_eq!(grown.height(), 2);
    /// ```
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Returns a reference to the element at the given index, or `None` if
    /// the index is out of bounds.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_array::array::PersistentArray;
    ///
    /// let array: PersistentArray<i32> = (1..=5).collect();
    /// assert_eq!(array.get(0), Some(&1));
    /// assert_eq!(array.get(5), None);
    /// ```
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        match &self.root {
            Some(root) if index < self.size => Some(root.get(self.height, index)),
            _ => None,
        }
    }

    /// Returns a reference to the first element, or `None` if empty.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.get(0)
    }

    /// Returns a reference to the last element, or `None` if empty.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.size.checked_sub(1).and_then(|index| self.get(index))
    }

    /// Returns an iterator over references to the elements, front to back.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_array::array::PersistentArray;
    ///
    /// let array: PersistentArray<i32, 2> = (1..=5).collect();
    /// let collected: Vec<&i32> = array.iter().collect();
    /// assert_eq!(collected, vec![&1, &2, &3, &4, &5]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> PersistentArrayIterator<'_, T, B> {
        PersistentArrayIterator::new(self)
    }

    /// Returns `true` if both arrays share the same root node.
    ///
    /// Two empty arrays are always considered to share their (absent) root.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_array::array::PersistentArray;
    ///
    /// let array: PersistentArray<i32> = (0..10).collect();
    /// let whole = array.take(10).unwrap();
    /// assert!(array.ptr_eq(&whole));
    /// ```
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(left), Some(right)) => ReferenceCounter::ptr_eq(left, right),
            (None, None) => true,
            _ => false,
        }
    }

    /// Walks the whole tree and checks its structural invariants: uniform
    /// leaf depth, non-empty nodes, and size tables that match the subtrees
    /// they describe.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        let root_violation = |reason| InvariantViolation { depth: 0, reason };
        match &self.root {
            None if self.size == 0 && self.height == 0 => Ok(()),
            None => Err(root_violation("empty root with non-zero shape")),
            Some(root) => {
                let counted = root.validate(self.height, 0)?;
                if counted == self.size {
                    Ok(())
                } else {
                    Err(root_violation("array size disagrees with the tree"))
                }
            }
        }
    }
}

impl<T: Clone, const B: usize> PersistentArray<T, B> {
    /// Creates an array holding clones of the slice elements.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_array::array::PersistentArray;
    ///
    /// let array: PersistentArray<i32> = PersistentArray::from_slice(&[1, 2, 3]);
    /// assert_eq!(array.len(), 3);
    /// ```
    #[must_use]
    pub fn from_slice(slice: &[T]) -> Self {
        slice.iter().cloned().collect()
    }

    // -------------------------------------------------------------------------
    // By sharing
    // -------------------------------------------------------------------------

    /// Returns a new array with `element` appended at the end.
    ///
    /// Only the right-most path is copied; when every leaf is full the new
    /// array is one level taller and shares the whole old tree.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_array::array::PersistentArray;
    ///
    /// let array: PersistentArray<i32> = PersistentArray::new().push_back(1);
    /// let extended = array.push_back(2);
    /// assert_eq!(array.len(), 1);
    /// assert_eq!(extended.get(1), Some(&2));
    /// ```
    #[must_use]
    pub fn push_back(&self, element: T) -> Self {
        match &self.root {
            None => Self::singleton(element),
            Some(root) => {
                let (root, height) = Node::append_leafwise(root, self.height, self.size, element);
                Self {
                    size: self.size + 1,
                    height,
                    root: Some(root),
                }
            }
        }
    }

    /// Returns a new array whose element at `index` is `function(&old)`.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::IndexOutOfRange`] if `index >= self.len()`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_array::array::{ArrayError, PersistentArray};
    ///
    /// let array: PersistentArray<i32> = (1..=3).collect();
    /// let updated = array.update(0, |x| x + 100).unwrap();
    /// assert_eq!(updated.get(0), Some(&101));
    /// assert_eq!(array.get(0), Some(&1));
    ///
    /// assert_eq!(
    ///     array.update(3, |x| x + 1).unwrap_err(),
    ///     ArrayError::IndexOutOfRange { index: 3, size: 3 }
    /// );
    /// ```
    pub fn update<F>(&self, index: usize, function: F) -> Result<Self, ArrayError>
    where
        F: FnOnce(&T) -> T,
    {
        match &self.root {
            Some(root) if index < self.size => {
                let root = root.path_copy(self.height, index, |element| *element = function(&*element));
                Ok(Self {
                    size: self.size,
                    height: self.height,
                    root: Some(ReferenceCounter::new(root)),
                })
            }
            _ => Err(ArrayError::IndexOutOfRange {
                index,
                size: self.size,
            }),
        }
    }

    /// Returns a new array whose element at `index` is `element`.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::IndexOutOfRange`] if `index >= self.len()`.
    pub fn set(&self, index: usize, element: T) -> Result<Self, ArrayError> {
        self.update(index, |_| element)
    }

    /// Returns a new array holding the first `count` elements.
    ///
    /// `take(len())` shares the whole tree, and `take(0)` is the empty array.
    /// The result is as short as possible: roots left with a single child
    /// are collapsed.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::CountOutOfRange`] if `count > self.len()`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_array::array::PersistentArray;
    ///
    /// let array: PersistentArray<i32> = (1..=5).collect();
    /// let taken = array.take(3).unwrap();
    /// assert_eq!(taken.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    /// assert!(array.take(6).is_err());
    /// ```
    pub fn take(&self, count: usize) -> Result<Self, ArrayError> {
        if count > self.size {
            return Err(ArrayError::CountOutOfRange {
                count,
                size: self.size,
            });
        }
        let root = self
            .root
            .as_ref()
            .and_then(|root| Node::truncate(root, self.height, self.size, count));
        Ok(Self::from_root(root, count))
    }

    // -------------------------------------------------------------------------
    // By ownership transfer
    // -------------------------------------------------------------------------

    /// Consuming variant of [`push_back`](Self::push_back).
    ///
    /// Nodes on the right-most path that no other array shares are extended
    /// in place.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_array::array::PersistentArray;
    ///
    /// let array = (0..100).fold(PersistentArray::<i32>::new(), PersistentArray::into_push_back);
    /// assert_eq!(array.len(), 100);
    /// assert_eq!(array.last(), Some(&99));
    /// ```
    #[must_use]
    pub fn into_push_back(mut self, element: T) -> Self {
        match self.root.as_mut() {
            None => Self::singleton(element),
            Some(root) => {
                self.height = Node::append_leafwise_in_place(root, self.height, self.size, element);
                self.size += 1;
                self
            }
        }
    }

    /// Consuming variant of [`update`](Self::update).
    ///
    /// # Errors
    ///
    /// Returns a [`TransferError`] holding [`ArrayError::IndexOutOfRange`]
    /// and the untouched array if `index >= self.len()`.
    pub fn into_update<F>(mut self, index: usize, function: F) -> Result<Self, TransferError<Self>>
    where
        F: FnOnce(&T) -> T,
    {
        if index >= self.size {
            let error = ArrayError::IndexOutOfRange {
                index,
                size: self.size,
            };
            return Err(TransferError::new(error, self));
        }
        if let Some(root) = self.root.as_mut() {
            Node::path_move(root, self.height, index, |element| *element = function(&*element));
        }
        Ok(self)
    }

    /// Consuming variant of [`take`](Self::take).
    ///
    /// # Errors
    ///
    /// Returns a [`TransferError`] holding [`ArrayError::CountOutOfRange`]
    /// and the untouched array if `count > self.len()`.
    pub fn into_take(mut self, count: usize) -> Result<Self, TransferError<Self>> {
        if count > self.size {
            let error = ArrayError::CountOutOfRange {
                count,
                size: self.size,
            };
            return Err(TransferError::new(error, self));
        }
        let root = self
            .root
            .take()
            .and_then(|root| Node::truncate_in_place(root, self.height, self.size, count));
        Ok(Self::from_root(root, count))
    }

    // -------------------------------------------------------------------------
    // In-place conveniences
    // -------------------------------------------------------------------------

    /// Appends `element` to this array in place.
    ///
    /// Other arrays sharing structure with this one are not affected.
    pub fn push_back_mut(&mut self, element: T) {
        *self = std::mem::take(self).into_push_back(element);
    }

    /// Replaces the element at `index` with `function(&old)` in place.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::IndexOutOfRange`] if `index >= self.len()`;
    /// the array is left unchanged.
    pub fn update_mut<F>(&mut self, index: usize, function: F) -> Result<(), ArrayError>
    where
        F: FnOnce(&T) -> T,
    {
        match std::mem::take(self).into_update(index, function) {
            Ok(updated) => {
                *self = updated;
                Ok(())
            }
            Err(rejected) => {
                let (error, array) = rejected.into_parts();
                *self = array;
                Err(error)
            }
        }
    }

    /// Keeps only the first `count` elements, in place.
    ///
    /// # Errors
    ///
    /// Returns [`ArrayError::CountOutOfRange`] if `count > self.len()`;
    /// the array is left unchanged.
    pub fn take_mut(&mut self, count: usize) -> Result<(), ArrayError> {
        match std::mem::take(self).into_take(count) {
            Ok(taken) => {
                *self = taken;
                Ok(())
            }
            Err(rejected) => {
                let (error, array) = rejected.into_parts();
                *self = array;
                Err(error)
            }
        }
    }

    fn singleton(element: T) -> Self {
        Self {
            size: 1,
            height: 1,
            root: Some(ReferenceCounter::new(Node::new_path(1, element))),
        }
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// Maximum tree height kept inline by the iterators before spilling to the
/// heap.
const INLINE_DEPTH: usize = 8;

/// A stack entry for borrowed tree traversal: the children of an internal
/// node and the index of the next child to visit.
struct TraversalFrame<'a, T, const B: usize> {
    children: &'a [NodeRef<T, B>],
    next_child: usize,
}

/// An iterator over references to elements of a [`PersistentArray`].
///
/// Visits every node once, so a full traversal is O(N).
pub struct PersistentArrayIterator<'a, T, const B: usize = DEFAULT_BRANCHING_FACTOR> {
    stack: SmallVec<[TraversalFrame<'a, T, B>; INLINE_DEPTH]>,
    leaf: &'a [T],
    leaf_index: usize,
    remaining: usize,
}

impl<'a, T, const B: usize> PersistentArrayIterator<'a, T, B> {
    fn new(array: &'a PersistentArray<T, B>) -> Self {
        let mut iterator = Self {
            stack: SmallVec::new(),
            leaf: &[],
            leaf_index: 0,
            remaining: array.size,
        };
        if let Some(root) = &array.root {
            iterator.descend_to_first_leaf(root);
        }
        iterator
    }

    /// Pushes the left-most path below `node` and caches its leaf.
    fn descend_to_first_leaf(&mut self, node: &'a Node<T, B>) {
        let mut node = node;
        loop {
            match node {
                Node::Leaf(elements) => {
                    self.leaf = elements.as_slice();
                    self.leaf_index = 0;
                    return;
                }
                Node::Internal(internal) => {
                    let children = internal.children();
                    self.stack.push(TraversalFrame {
                        children,
                        next_child: 1,
                    });
                    node = &children[0];
                }
            }
        }
    }

    /// Moves to the next leaf in order. Returns `false` when none is left.
    fn advance_to_next_leaf(&mut self) -> bool {
        while let Some(frame) = self.stack.last_mut() {
            let siblings = frame.children;
            if frame.next_child < siblings.len() {
                let child = &siblings[frame.next_child];
                frame.next_child += 1;
                self.descend_to_first_leaf(child);
                return true;
            }
            self.stack.pop();
        }
        false
    }
}

impl<'a, T, const B: usize> Iterator for PersistentArrayIterator<'a, T, B> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.remaining == 0 {
                return None;
            }
            if let Some(element) = self.leaf.get(self.leaf_index) {
                self.leaf_index += 1;
                self.remaining -= 1;
                return Some(element);
            }
            if !self.advance_to_next_leaf() {
                self.remaining = 0;
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, const B: usize> ExactSizeIterator for PersistentArrayIterator<'_, T, B> {}

/// An owning iterator over elements of a [`PersistentArray`].
///
/// Holds shares of the nodes it still has to visit; elements are cloned
/// out of the leaves.
pub struct PersistentArrayIntoIterator<T, const B: usize = DEFAULT_BRANCHING_FACTOR> {
    stack: SmallVec<[(NodeRef<T, B>, usize); INLINE_DEPTH]>,
    leaf: Option<NodeRef<T, B>>,
    leaf_index: usize,
    remaining: usize,
}

impl<T, const B: usize> PersistentArrayIntoIterator<T, B> {
    fn new(array: PersistentArray<T, B>) -> Self {
        let mut iterator = Self {
            stack: SmallVec::new(),
            leaf: None,
            leaf_index: 0,
            remaining: array.size,
        };
        if let Some(root) = array.root {
            iterator.descend_to_first_leaf(root);
        }
        iterator
    }

    fn descend_to_first_leaf(&mut self, node: NodeRef<T, B>) {
        let mut node = node;
        loop {
            let first_child = match node.as_ref() {
                Node::Leaf(_) => break,
                Node::Internal(internal) => internal.children()[0].clone(),
            };
            self.stack.push((node, 1));
            node = first_child;
        }
        self.leaf = Some(node);
        self.leaf_index = 0;
    }

    fn advance_to_next_leaf(&mut self) -> bool {
        while let Some((parent, next_child)) = self.stack.last_mut() {
            let child = match parent.as_ref() {
                Node::Internal(internal) => internal.children().get(*next_child).cloned(),
                Node::Leaf(_) => None,
            };
            if let Some(child) = child {
                *next_child += 1;
                self.descend_to_first_leaf(child);
                return true;
            }
            self.stack.pop();
        }
        self.leaf = None;
        false
    }
}

impl<T: Clone, const B: usize> Iterator for PersistentArrayIntoIterator<T, B> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.remaining == 0 {
                return None;
            }
            if let Some(Node::Leaf(elements)) = self.leaf.as_deref()
                && let Some(element) = elements.get(self.leaf_index)
            {
                self.leaf_index += 1;
                self.remaining -= 1;
                return Some(element.clone());
            }
            if !self.advance_to_next_leaf() {
                self.remaining = 0;
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Clone, const B: usize> ExactSizeIterator for PersistentArrayIntoIterator<T, B> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T, const B: usize> Clone for PersistentArray<T, B> {
    /// Shares the root with `self`; no element is cloned.
    #[inline]
    fn clone(&self) -> Self {
        Self {
            size: self.size,
            height: self.height,
            root: self.root.clone(),
        }
    }
}

impl<T, const B: usize> Default for PersistentArray<T, B> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const B: usize> Index<usize> for PersistentArray<T, B> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        match self.get(index) {
            Some(element) => element,
            None => panic!(
                "index out of bounds: the len is {} but the index is {index}",
                self.size
            ),
        }
    }
}

impl<T: Clone, const B: usize> FromIterator<T> for PersistentArray<T, B> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::into_push_back)
    }
}

impl<T: Clone, const B: usize> Extend<T> for PersistentArray<T, B> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for element in iter {
            self.push_back_mut(element);
        }
    }
}

impl<T: Clone, const B: usize> IntoIterator for PersistentArray<T, B> {
    type Item = T;
    type IntoIter = PersistentArrayIntoIterator<T, B>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        PersistentArrayIntoIterator::new(self)
    }
}

impl<'a, T, const B: usize> IntoIterator for &'a PersistentArray<T, B> {
    type Item = &'a T;
    type IntoIter = PersistentArrayIterator<'a, T, B>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq, const B: usize> PartialEq for PersistentArray<T, B> {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && (self.ptr_eq(other) || self.iter().eq(other.iter()))
    }
}

impl<T: Eq, const B: usize> Eq for PersistentArray<T, B> {}

impl<T: Hash, const B: usize> Hash for PersistentArray<T, B> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.size.hash(state);
        for element in self {
            element.hash(state);
        }
    }
}

impl<T: fmt::Debug, const B: usize> fmt::Debug for PersistentArray<T, B> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display, const B: usize> fmt::Display for PersistentArray<T, B> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "[")?;
        for (position, element) in self.iter().enumerate() {
            if position > 0 {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{element}")?;
        }
        write!(formatter, "]")
    }
}

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentArray<i32>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================
