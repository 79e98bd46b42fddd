//! Tree nodes shared between persistent array versions.
//!
//! A tree of height 1 is a single leaf. A tree of height `h > 1` is an
//! internal node whose children are all trees of height `h - 1`. Every
//! internal node keeps a cumulative size table next to its children, so
//! lookups never rely on radix arithmetic and stay correct for the
//! irregular subtrees that truncation leaves behind.
//!
//! Each structural operation comes in two flavours:
//!
//! - a copying flavour taking `&self` / `&NodeRef`, which allocates the
//!   affected root-to-leaf path and shares every other subtree;
//! - an in-place flavour taking `&mut NodeRef` / `NodeRef`, which mutates
//!   nodes whose reference count is 1 and falls back to the copying flavour
//!   at the first shared node it meets.
//!
//! Both flavours produce element-wise identical trees.

use arrayvec::ArrayVec;

use super::ReferenceCounter;
use super::error::InvariantViolation;

/// Shared-ownership handle to a node.
pub(crate) type NodeRef<T, const B: usize> = ReferenceCounter<Node<T, B>>;

/// A node of the tree: either a run of elements or a list of subtrees.
pub(crate) enum Node<T, const B: usize> {
    /// Contiguous run of `1..=B` elements.
    Leaf(ArrayVec<T, B>),
    /// `1..=B` subtrees of equal height.
    Internal(Internal<T, B>),
}

/// Children of an internal node and their cumulative sizes.
///
/// `sizes[i]` is the number of elements held by `children[..=i]`.
pub(crate) struct Internal<T, const B: usize> {
    children: ArrayVec<NodeRef<T, B>, B>,
    sizes: ArrayVec<usize, B>,
}

impl<T, const B: usize> Clone for Internal<T, B> {
    fn clone(&self) -> Self {
        Self {
            children: self.children.clone(),
            sizes: self.sizes.clone(),
        }
    }
}

impl<T: Clone, const B: usize> Clone for Node<T, B> {
    fn clone(&self) -> Self {
        match self {
            Self::Leaf(elements) => Self::Leaf(elements.clone()),
            Self::Internal(internal) => Self::Internal(internal.clone()),
        }
    }
}

impl<T, const B: usize> Internal<T, B> {
    fn empty() -> Self {
        Self {
            children: ArrayVec::new(),
            sizes: ArrayVec::new(),
        }
    }

    /// Total number of elements below this node.
    #[inline]
    fn len(&self) -> usize {
        self.sizes.last().copied().unwrap_or(0)
    }

    /// The child handles, left to right.
    #[inline]
    pub(crate) fn children(&self) -> &[NodeRef<T, B>] {
        &self.children
    }

    /// Number of elements held by the children before `slot`.
    #[inline]
    fn offset_of(&self, slot: usize) -> usize {
        if slot == 0 { 0 } else { self.sizes[slot - 1] }
    }

    /// Finds the child holding `index` and the index relative to that child.
    #[inline]
    fn locate(&self, index: usize) -> (usize, usize) {
        let slot = self.sizes.partition_point(|&size| size <= index);
        debug_assert!(slot < self.children.len(), "index {index} beyond node");
        (slot, index - self.offset_of(slot))
    }

    fn push_child(&mut self, child: NodeRef<T, B>, child_len: usize) {
        let total = self.len() + child_len;
        self.children.push(child);
        self.sizes.push(total);
    }
}

impl<T, const B: usize> Node<T, B> {
    /// Number of elements below this node.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Leaf(elements) => elements.len(),
            Self::Internal(internal) => internal.len(),
        }
    }

    /// Builds the left-most path of a tree of the given height holding only
    /// `element`.
    pub(crate) fn new_path(height: usize, element: T) -> Self {
        debug_assert!(height >= 1);
        if height == 1 {
            let mut elements = ArrayVec::new();
            elements.push(element);
            Self::Leaf(elements)
        } else {
            let mut internal = Internal::empty();
            internal.push_child(ReferenceCounter::new(Self::new_path(height - 1, element)), 1);
            Self::Internal(internal)
        }
    }

    /// Locates the leaf holding `index` and the offset inside it.
    ///
    /// `self` must be the root of a subtree of the stated height, and
    /// `index` must be below its element count.
    pub(crate) fn descend(&self, height: usize, index: usize) -> (&[T], usize) {
        debug_assert!(index < self.len(), "index {index} out of range");
        let mut node = self;
        let mut index = index;
        let mut height = height;
        loop {
            match node {
                Self::Leaf(elements) => {
                    debug_assert_eq!(height, 1, "leaf found above the bottom level");
                    return (elements.as_slice(), index);
                }
                Self::Internal(internal) => {
                    let (slot, relative) = internal.locate(index);
                    node = &internal.children[slot];
                    index = relative;
                    height -= 1;
                }
            }
        }
    }

    /// Returns the element at `index`. Same preconditions as [`Self::descend`].
    #[inline]
    pub(crate) fn get(&self, height: usize, index: usize) -> &T {
        let (leaf, offset) = self.descend(height, index);
        &leaf[offset]
    }

    /// Repeatedly replaces an internal root having a single child by that
    /// child, lowering the height by one each time.
    pub(crate) fn collapse(root: NodeRef<T, B>, height: usize) -> (NodeRef<T, B>, usize) {
        let mut root = root;
        let mut height = height;
        while height > 1 {
            let only_child = match root.as_ref() {
                Self::Internal(internal) if internal.children.len() == 1 => {
                    internal.children[0].clone()
                }
                _ => break,
            };
            root = only_child;
            height -= 1;
        }
        (root, height)
    }

    /// Checks every structural invariant of the subtree and returns its
    /// element count.
    pub(crate) fn validate(&self, height: usize, depth: usize) -> Result<usize, InvariantViolation> {
        let violation = |reason| InvariantViolation { depth, reason };
        match self {
            Self::Leaf(elements) => {
                if height != 1 {
                    return Err(violation("leaf found above the bottom level"));
                }
                if elements.is_empty() {
                    return Err(violation("leaf has no elements"));
                }
                Ok(elements.len())
            }
            Self::Internal(internal) => {
                if height <= 1 {
                    return Err(violation("internal node found at the bottom level"));
                }
                if internal.children.is_empty() {
                    return Err(violation("internal node has no children"));
                }
                if internal.children.len() != internal.sizes.len() {
                    return Err(violation("size table does not match the children"));
                }
                let mut total = 0;
                for (child, &size) in internal.children.iter().zip(&internal.sizes) {
                    let child_len = child.validate(height - 1, depth + 1)?;
                    total += child_len;
                    if size != total {
                        return Err(violation("size table entry disagrees with the subtree"));
                    }
                }
                Ok(total)
            }
        }
    }
}

impl<T: Clone, const B: usize> Node<T, B> {
    /// Creates a leaf holding a copy of `elements` (at most `B` of them).
    pub(crate) fn leaf_with(elements: &[T]) -> Self {
        debug_assert!(!elements.is_empty() && elements.len() <= B);
        Self::Leaf(elements.iter().cloned().collect())
    }

    // -------------------------------------------------------------------------
    // Update
    // -------------------------------------------------------------------------

    /// Returns a copy of this subtree with the element at `index` passed
    /// through `mutator`. Only the root-to-leaf path is allocated.
    pub(crate) fn path_copy<F>(&self, height: usize, index: usize, mutator: F) -> Self
    where
        F: FnOnce(&mut T),
    {
        match self {
            Self::Leaf(elements) => {
                debug_assert_eq!(height, 1, "leaf found above the bottom level");
                let mut elements = elements.clone();
                mutator(&mut elements[index]);
                Self::Leaf(elements)
            }
            Self::Internal(internal) => {
                let (slot, relative) = internal.locate(index);
                let child = internal.children[slot].path_copy(height - 1, relative, mutator);
                let mut copy = internal.clone();
                copy.children[slot] = ReferenceCounter::new(child);
                Self::Internal(copy)
            }
        }
    }

    /// Applies `mutator` to the element at `index`, mutating uniquely owned
    /// nodes in place and copying from the first shared node downwards.
    pub(crate) fn path_move<F>(node: &mut NodeRef<T, B>, height: usize, index: usize, mutator: F)
    where
        F: FnOnce(&mut T),
    {
        match ReferenceCounter::get_mut(node) {
            Some(Self::Leaf(elements)) => mutator(&mut elements[index]),
            Some(Self::Internal(internal)) => {
                let (slot, relative) = internal.locate(index);
                Self::path_move(&mut internal.children[slot], height - 1, relative, mutator);
            }
            None => {
                let copy = node.path_copy(height, index, mutator);
                *node = ReferenceCounter::new(copy);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Append
    // -------------------------------------------------------------------------

    /// Appends `element` to the right-most leaf with room, copying the
    /// right-most path. Gives the element back when the subtree is full.
    fn push_copy(&self, height: usize, element: T) -> Result<Self, T> {
        match self {
            Self::Leaf(elements) => {
                if elements.is_full() {
                    return Err(element);
                }
                let mut elements = elements.clone();
                elements.push(element);
                Ok(Self::Leaf(elements))
            }
            Self::Internal(internal) => {
                let last = internal.children.len() - 1;
                match internal.children[last].push_copy(height - 1, element) {
                    Ok(child) => {
                        let mut copy = internal.clone();
                        copy.children[last] = ReferenceCounter::new(child);
                        copy.sizes[last] += 1;
                        Ok(Self::Internal(copy))
                    }
                    Err(element) => {
                        if internal.children.is_full() {
                            return Err(element);
                        }
                        let mut copy = internal.clone();
                        copy.push_child(ReferenceCounter::new(Self::new_path(height - 1, element)), 1);
                        Ok(Self::Internal(copy))
                    }
                }
            }
        }
    }

    /// In-place counterpart of [`Self::push_copy`]. On `Err` the subtree is
    /// left untouched.
    fn push_move(node: &mut NodeRef<T, B>, height: usize, element: T) -> Result<(), T> {
        match ReferenceCounter::get_mut(node) {
            Some(Self::Leaf(elements)) => elements.try_push(element).map_err(|error| error.element()),
            Some(Self::Internal(internal)) => {
                let last = internal.children.len() - 1;
                match Self::push_move(&mut internal.children[last], height - 1, element) {
                    Ok(()) => {
                        internal.sizes[last] += 1;
                        Ok(())
                    }
                    Err(element) => {
                        if internal.children.is_full() {
                            return Err(element);
                        }
                        internal.push_child(ReferenceCounter::new(Self::new_path(height - 1, element)), 1);
                        Ok(())
                    }
                }
            }
            None => {
                let copy = node.push_copy(height, element)?;
                *node = ReferenceCounter::new(copy);
                Ok(())
            }
        }
    }

    /// Root of a tree one level taller than `root`, holding `root` and a
    /// fresh path to `element`.
    fn grow(root: NodeRef<T, B>, height: usize, size: usize, element: T) -> Self {
        let mut internal = Internal::empty();
        internal.push_child(root, size);
        internal.push_child(ReferenceCounter::new(Self::new_path(height, element)), 1);
        Self::Internal(internal)
    }

    /// Appends `element` to the tree rooted at `root` (height `height`,
    /// `size` elements) without touching it, returning the new root and
    /// height. The height grows by one when every leaf is full.
    pub(crate) fn append_leafwise(
        root: &NodeRef<T, B>,
        height: usize,
        size: usize,
        element: T,
    ) -> (NodeRef<T, B>, usize) {
        debug_assert_eq!(root.len(), size);
        match root.push_copy(height, element) {
            Ok(new_root) => (ReferenceCounter::new(new_root), height),
            Err(element) => (
                ReferenceCounter::new(Self::grow(root.clone(), height, size, element)),
                height + 1,
            ),
        }
    }

    /// In-place counterpart of [`Self::append_leafwise`]; returns the new
    /// height.
    pub(crate) fn append_leafwise_in_place(
        root: &mut NodeRef<T, B>,
        height: usize,
        size: usize,
        element: T,
    ) -> usize {
        debug_assert_eq!(root.len(), size);
        match Self::push_move(root, height, element) {
            Ok(()) => height,
            Err(element) => {
                let old_root = root.clone();
                *root = ReferenceCounter::new(Self::grow(old_root, height, size, element));
                height + 1
            }
        }
    }

    // -------------------------------------------------------------------------
    // Truncation
    // -------------------------------------------------------------------------

    /// Copy of the first `new_len` elements of this subtree,
    /// `0 < new_len <= len`. Children entirely inside the prefix are shared.
    fn truncate_copy(&self, height: usize, new_len: usize) -> Self {
        match self {
            Self::Leaf(elements) => {
                debug_assert_eq!(height, 1, "leaf found above the bottom level");
                Self::leaf_with(&elements[..new_len])
            }
            Self::Internal(internal) => {
                let (slot, relative) = internal.locate(new_len - 1);
                let kept = relative + 1;
                let boundary = &internal.children[slot];
                let boundary = if kept == boundary.len() {
                    boundary.clone()
                } else {
                    ReferenceCounter::new(boundary.truncate_copy(height - 1, kept))
                };
                let mut copy = Internal {
                    children: internal.children[..slot].iter().cloned().collect(),
                    sizes: internal.sizes[..slot].iter().copied().collect(),
                };
                copy.children.push(boundary);
                copy.sizes.push(new_len);
                Self::Internal(copy)
            }
        }
    }

    /// In-place counterpart of [`Self::truncate_copy`]. Dropped children
    /// release their share.
    fn truncate_move(node: &mut NodeRef<T, B>, height: usize, new_len: usize) {
        match ReferenceCounter::get_mut(node) {
            Some(Self::Leaf(elements)) => elements.truncate(new_len),
            Some(Self::Internal(internal)) => {
                let (slot, relative) = internal.locate(new_len - 1);
                internal.children.truncate(slot + 1);
                internal.sizes.truncate(slot + 1);
                internal.sizes[slot] = new_len;
                let kept = relative + 1;
                if kept < internal.children[slot].len() {
                    Self::truncate_move(&mut internal.children[slot], height - 1, kept);
                }
            }
            None => {
                let copy = node.truncate_copy(height, new_len);
                *node = ReferenceCounter::new(copy);
            }
        }
    }

    /// Tree holding the first `new_size` of the `size` elements below
    /// `root`, with its height. `None` stands for the empty tree.
    pub(crate) fn truncate(
        root: &NodeRef<T, B>,
        height: usize,
        size: usize,
        new_size: usize,
    ) -> Option<(NodeRef<T, B>, usize)> {
        debug_assert!(new_size <= size);
        if new_size == 0 {
            return None;
        }
        if new_size == size {
            return Some((root.clone(), height));
        }
        let truncated = ReferenceCounter::new(root.truncate_copy(height, new_size));
        Some(Self::collapse(truncated, height))
    }

    /// In-place counterpart of [`Self::truncate`].
    pub(crate) fn truncate_in_place(
        root: NodeRef<T, B>,
        height: usize,
        size: usize,
        new_size: usize,
    ) -> Option<(NodeRef<T, B>, usize)> {
        debug_assert!(new_size <= size);
        if new_size == 0 {
            return None;
        }
        let mut root = root;
        if new_size < size {
            Self::truncate_move(&mut root, height, new_size);
        }
        Some(Self::collapse(root, height))
    }
}
