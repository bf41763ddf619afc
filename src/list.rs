//! Singly-linked forward list with external node storage.
//!
//! Nodes are stored in external storage, with the list managing the
//! successor links internally. Every position in the list is addressed
//! as "the place after X", where X is either a node or the head of the
//! list itself, a [`Cursor`]. This gives front insertion/removal and
//! mid-list insertion/removal one shared code path, with no sentinel
//! node allocated.
//!
//! # Storage Invariant
//!
//! A list instance must always be used with the same storage instance.
//! Passing a different storage is undefined behavior. This is the
//! caller's responsibility to enforce (same discipline as the `slab`
//! crate).
//!
//! # Bounded vs Unbounded Storage
//!
//! Insert operations have different APIs depending on storage type:
//!
//! ```
//! use forward_collections::{BoxedForwardStorage, Cursor, ForwardList};
//!
//! // Bounded storage - fallible insertion
//! let mut storage: BoxedForwardStorage<u64> = BoxedForwardStorage::with_capacity(16);
//! let mut list: ForwardList<u64, BoxedForwardStorage<u64>> = ForwardList::new();
//!
//! let key = list.try_push_front(&mut storage, 42).unwrap();
//! assert_eq!(list.front(&storage), Some(&42));
//! # let _ = key;
//! ```
//!
//! # Example
//!
//! ```
//! use forward_collections::{BoxedForwardStorage, Cursor, ForwardList};
//!
//! let mut storage: BoxedForwardStorage<u64> = BoxedForwardStorage::with_capacity(16);
//! let mut list: ForwardList<u64, BoxedForwardStorage<u64>> = ForwardList::new();
//!
//! let a = list.try_push_front(&mut storage, 1).unwrap();
//! list.try_insert_after(&mut storage, Cursor::Node(a), 2).unwrap();
//!
//! let values: Vec<_> = list.iter(&storage).copied().collect();
//! assert_eq!(values, vec![1, 2]);
//!
//! list.reverse(&mut storage);
//! assert_eq!(list.pop_front(&mut storage), Some(2));
//! ```
//!
//! # Moving Nodes Between Lists
//!
//! Two lists sharing one storage can exchange whole node ranges without
//! touching the payloads; only successor links are rewritten:
//!
//! ```
//! use forward_collections::{BoxedForwardStorage, Cursor, ForwardList};
//!
//! let mut storage: BoxedForwardStorage<u64> = BoxedForwardStorage::with_capacity(16);
//! let mut a: ForwardList<u64, BoxedForwardStorage<u64>> = ForwardList::new();
//! let mut b: ForwardList<u64, BoxedForwardStorage<u64>> = ForwardList::new();
//!
//! a.try_push_front(&mut storage, 1).unwrap();
//! b.try_push_front(&mut storage, 2).unwrap();
//!
//! a.splice_after(&mut storage, Cursor::Head, &mut b);
//! assert!(b.is_empty());
//! assert_eq!(a.count(&storage), 2);
//! ```

use core::cmp::Ordering;
use std::marker::PhantomData;

use crate::{BoundedStorage, BoxedStorage, Full, Key, Storage, UnboundedStorage};

/// Type alias for bounded forward-list storage backed by a boxed allocation.
pub type BoxedForwardStorage<T, K = u32> = BoxedStorage<ForwardNode<T, K>, K>;

/// Type alias for unbounded forward-list storage backed by `slab::Slab`.
#[cfg(feature = "slab")]
pub type SlabForwardStorage<T> = slab::Slab<ForwardNode<T, usize>>;

/// A node in the forward list.
///
/// This wraps user data with a successor link. Users interact with `&T`
/// and `&mut T` through the list's accessor methods; the node structure
/// is an implementation detail.
#[derive(Debug)]
pub struct ForwardNode<T, K: Key = u32> {
    pub(crate) data: T,
    pub(crate) next: K,
}

/// A position in a forward list that supports "insert/erase after".
///
/// Because the list is singly linked there is no O(1) way to find a
/// predecessor, so every mutating operation is phrased as "after
/// position P". `Cursor::Head` is the position before the first
/// element; `Cursor::Node(k)` is the position at a live node.
///
/// A cursor stays valid until the node it refers to is erased (or the
/// list is cleared); erasing a node does not invalidate cursors to its
/// neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor<K: Key> {
    /// The position before the first element.
    Head,
    /// The position at the node with this key.
    Node(K),
}

/// A singly-linked list over external storage.
///
/// The list tracks only the key of its first node. There is no cached
/// length; [`count`](ForwardList::count) walks the chain in O(n).
///
/// # Type Parameters
///
/// - `T`: Element type
/// - `S`: Storage type (e.g., [`BoxedForwardStorage<T>`])
/// - `K`: Key type (default `u32`)
///
/// # Example
///
/// ```
/// use forward_collections::{BoxedForwardStorage, ForwardList};
///
/// let mut storage: BoxedForwardStorage<String> = BoxedForwardStorage::with_capacity(100);
/// let mut list: ForwardList<String, BoxedForwardStorage<String>> = ForwardList::new();
///
/// let key = list.try_push_front(&mut storage, "hello".into()).unwrap();
/// assert_eq!(list.get(&storage, key), Some(&"hello".into()));
/// ```
#[derive(Debug)]
pub struct ForwardList<T, S, K: Key = u32>
where
    S: Storage<ForwardNode<T, K>, Key = K>,
{
    head: K,
    _marker: PhantomData<(T, S)>,
}

impl<T, S, K: Key> Default for ForwardList<T, S, K>
where
    S: Storage<ForwardNode<T, K>, Key = K>,
{
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Base impl - works with any Storage (read/link/erase/reorder operations)
// =============================================================================

impl<T, S, K: Key> ForwardList<T, S, K>
where
    S: Storage<ForwardNode<T, K>, Key = K>,
{
    /// Creates an empty list.
    #[inline]
    pub const fn new() -> Self {
        Self {
            head: K::NONE,
            _marker: PhantomData,
        }
    }

    /// Returns `true` if the list is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Returns the number of elements by walking the chain.
    ///
    /// The list does not cache its length, so this is O(n).
    #[inline]
    pub fn count(&self, storage: &S) -> usize {
        self.iter(storage).count()
    }

    /// Returns the first node's key, or `None` if empty.
    #[inline]
    pub fn front_key(&self) -> Option<K> {
        if self.head.is_none() {
            None
        } else {
            Some(self.head)
        }
    }

    /// Returns the cursor before the first element.
    #[inline]
    pub const fn before_begin(&self) -> Cursor<K> {
        Cursor::Head
    }

    /// Returns the key of the node after the given position.
    ///
    /// Returns `None` if the position is the last element (or the list
    /// is empty and `at` is [`Cursor::Head`]).
    ///
    /// # Panics
    ///
    /// Panics if `at` refers to an erased node.
    #[inline]
    pub fn next_key(&self, storage: &S, at: Cursor<K>) -> Option<K> {
        let next = self.next_at(storage, at);
        if next.is_none() { None } else { Some(next) }
    }

    /// Advances a cursor by one node.
    ///
    /// Returns `None` when there is no node after `at`.
    ///
    /// # Panics
    ///
    /// Panics if `at` refers to an erased node.
    #[inline]
    pub fn advance(&self, storage: &S, at: Cursor<K>) -> Option<Cursor<K>> {
        self.next_key(storage, at).map(Cursor::Node)
    }

    /// Reads the successor link guarded by a position.
    ///
    /// This and [`set_next_at`](Self::set_next_at) are the only two ways
    /// any algorithm in this module touches the chain.
    #[inline]
    pub(crate) fn next_at(&self, storage: &S, at: Cursor<K>) -> K {
        match at {
            Cursor::Head => self.head,
            Cursor::Node(key) => storage.get(key).expect("stale cursor").next,
        }
    }

    /// Writes the successor link guarded by a position.
    #[inline]
    pub(crate) fn set_next_at(&mut self, storage: &mut S, at: Cursor<K>, to: K) {
        match at {
            Cursor::Head => self.head = to,
            Cursor::Node(key) => storage.get_mut(key).expect("stale cursor").next = to,
        }
    }

    // ========================================================================
    // Access
    // ========================================================================

    /// Returns a reference to the element at the given key.
    #[inline]
    pub fn get<'a>(&'a self, storage: &'a S, key: K) -> Option<&'a T> {
        storage.get(key).map(|node| &node.data)
    }

    /// Returns a mutable reference to the element at the given key.
    #[inline]
    pub fn get_mut<'a>(&'a mut self, storage: &'a mut S, key: K) -> Option<&'a mut T> {
        storage.get_mut(key).map(|node| &mut node.data)
    }

    /// Returns a reference to the front element.
    #[inline]
    pub fn front<'a>(&'a self, storage: &'a S) -> Option<&'a T> {
        if self.head.is_none() {
            None
        } else {
            // Safety: head is valid when is_some()
            Some(unsafe { &storage.get_unchecked(self.head).data })
        }
    }

    /// Returns a mutable reference to the front element.
    #[inline]
    pub fn front_mut<'a>(&'a mut self, storage: &'a mut S) -> Option<&'a mut T> {
        if self.head.is_none() {
            None
        } else {
            // Safety: head is valid when is_some()
            Some(unsafe { &mut storage.get_unchecked_mut(self.head).data })
        }
    }

    // ========================================================================
    // Link operations (just relink, no alloc/dealloc)
    // ========================================================================

    /// Links an existing node after the given position.
    ///
    /// The node must already exist in storage but not be in any list.
    /// Use this with `unlink_after` to move nodes between lists sharing
    /// one storage.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not valid in storage, or `at` is stale.
    #[inline]
    pub fn link_after(&mut self, storage: &mut S, at: Cursor<K>, key: K) {
        let next = self.next_at(storage, at);
        storage.get_mut(key).expect("invalid key").next = next;
        self.set_next_at(storage, at, key);
    }

    /// Links an existing node at the front of the list.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not valid in storage.
    #[inline]
    pub fn link_front(&mut self, storage: &mut S, key: K) {
        self.link_after(storage, Cursor::Head, key);
    }

    /// Unlinks the node after the given position without deallocating.
    ///
    /// The node remains in storage and can be linked into another list.
    /// Returns the unlinked node's key, or `None` if nothing follows
    /// `at`.
    ///
    /// # Panics
    ///
    /// Panics if `at` refers to an erased node.
    #[inline]
    pub fn unlink_after(&mut self, storage: &mut S, at: Cursor<K>) -> Option<K> {
        let key = self.next_at(storage, at);
        if key.is_none() {
            return None;
        }

        // Safety: chain keys are occupied (list invariant)
        let next = unsafe { storage.get_unchecked(key) }.next;
        self.set_next_at(storage, at, next);

        // Safety: key validated above
        unsafe { storage.get_unchecked_mut(key) }.next = K::NONE;
        Some(key)
    }

    // ========================================================================
    // Erase operations (unlink + deallocate)
    // ========================================================================

    /// Removes and returns the front element.
    ///
    /// Returns `None` if the list is empty.
    #[inline]
    pub fn pop_front(&mut self, storage: &mut S) -> Option<T> {
        self.erase_after(storage, Cursor::Head)
    }

    /// Removes the single node after the given position.
    ///
    /// Returns the removed value, or `None` if nothing follows `at`.
    ///
    /// # Panics
    ///
    /// Panics if `at` refers to an erased node.
    #[inline]
    pub fn erase_after(&mut self, storage: &mut S, at: Cursor<K>) -> Option<T> {
        let key = self.unlink_after(storage, at)?;
        storage.remove(key).map(|node| node.data)
    }

    /// Removes every node strictly between `first` and `last`.
    ///
    /// `last` is a key (not a cursor) so the end of the list can be
    /// named as `K::NONE`. Returns the number of nodes removed. If
    /// `last` is not reachable from `first`, everything after `first`
    /// is removed.
    ///
    /// # Panics
    ///
    /// Panics if `first` refers to an erased node.
    pub fn erase_between(&mut self, storage: &mut S, first: Cursor<K>, last: K) -> usize {
        let mut count = 0;
        loop {
            let next = self.next_at(storage, first);
            if next == last || next.is_none() {
                return count;
            }
            self.erase_after(storage, first);
            count += 1;
        }
    }

    /// Clears the list, removing all elements.
    ///
    /// This unlinks and deallocates every node.
    #[inline]
    pub fn clear(&mut self, storage: &mut S) {
        self.erase_between(storage, Cursor::Head, K::NONE);
    }

    // ========================================================================
    // Splice operations (ownership transfer between lists, no alloc)
    // ========================================================================

    /// Moves all of `other`'s nodes to immediately after `at`.
    ///
    /// `other` is left empty. No payloads are copied and nothing is
    /// allocated; this walks `other` once to find its tail, so it is
    /// O(len of `other`).
    ///
    /// Both lists must use the same `storage`.
    ///
    /// # Panics
    ///
    /// Panics if `at` refers to an erased node.
    pub fn splice_after(&mut self, storage: &mut S, at: Cursor<K>, other: &mut Self) {
        if other.head.is_none() {
            return;
        }

        let mut tail = other.head;
        loop {
            // Safety: chain keys are occupied (list invariant)
            let next = unsafe { storage.get_unchecked(tail) }.next;
            if next.is_none() {
                break;
            }
            tail = next;
        }

        let rest = self.next_at(storage, at);
        // Safety: tail found by chain traversal
        unsafe { storage.get_unchecked_mut(tail) }.next = rest;

        let first = other.head;
        other.head = K::NONE;
        self.set_next_at(storage, at, first);
    }

    /// Moves the single node after `from` in `other` to after `at`.
    ///
    /// No-op if nothing follows `from`. Both lists must use the same
    /// `storage`.
    ///
    /// # Panics
    ///
    /// Panics if `at` or `from` refers to an erased node.
    pub fn splice_next_after(
        &mut self,
        storage: &mut S,
        at: Cursor<K>,
        other: &mut Self,
        from: Cursor<K>,
    ) {
        let Some(key) = other.unlink_after(storage, from) else {
            return;
        };
        self.link_after(storage, at, key);
    }

    /// Moves the open range `(first, last)` from `other` to after `at`.
    ///
    /// `last` is a key so the end of `other` can be named as `K::NONE`.
    /// Walks the moved range once to find its tail, so it is O(k) in the
    /// range length. Both lists must use the same `storage`.
    ///
    /// # Panics
    ///
    /// Panics if `at` or `first` refers to an erased node, or if `last`
    /// is not reachable from `first`.
    pub fn splice_between_after(
        &mut self,
        storage: &mut S,
        at: Cursor<K>,
        other: &mut Self,
        first: Cursor<K>,
        last: K,
    ) {
        let start = other.next_at(storage, first);
        if start == last || start.is_none() {
            return;
        }

        // Find the last node of the moved range: the one linking to `last`.
        let mut tail = start;
        loop {
            // Safety: chain keys are occupied (list invariant)
            let next = unsafe { storage.get_unchecked(tail) }.next;
            if next == last {
                break;
            }
            assert!(next.is_some(), "`last` not reachable from `first`");
            tail = next;
        }

        other.set_next_at(storage, first, last);

        let rest = self.next_at(storage, at);
        // Safety: tail found by chain traversal
        unsafe { storage.get_unchecked_mut(tail) }.next = rest;
        self.set_next_at(storage, at, start);
    }

    // ========================================================================
    // Merge and sort
    // ========================================================================

    /// Merges `other` into `self` with a comparator.
    ///
    /// Both lists must already be sorted under `compare` (unchecked).
    /// The result is sorted and stable: on ties, elements from `self`
    /// precede elements from `other`. `other` is left empty. O(n+m),
    /// allocation free. Both lists must use the same `storage`.
    pub fn merge_by<F>(&mut self, storage: &mut S, other: &mut Self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.head = Self::merge_chains(storage, self.head, other.head, &mut compare);
        other.head = K::NONE;
    }

    /// Merges `other` into `self` by the element ordering.
    ///
    /// See [`merge_by`](Self::merge_by).
    #[inline]
    pub fn merge(&mut self, storage: &mut S, other: &mut Self)
    where
        T: Ord,
    {
        self.merge_by(storage, other, T::cmp);
    }

    /// Sorts the list with a comparator.
    ///
    /// Recursive merge sort: split the chain at its midpoint (found by
    /// walking, since there is no random access), sort each half, merge.
    /// O(n log n) time, O(log n) recursion depth, stable.
    pub fn sort_by<F>(&mut self, storage: &mut S, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let len = self.count(storage);
        self.head = Self::sort_chain(storage, self.head, len, &mut compare);
    }

    /// Sorts the list by the element ordering.
    ///
    /// See [`sort_by`](Self::sort_by).
    #[inline]
    pub fn sort(&mut self, storage: &mut S)
    where
        T: Ord,
    {
        self.sort_by(storage, T::cmp);
    }

    /// Merges two sorted chains, returning the merged head.
    ///
    /// Stable: ties are resolved in favor of chain `a`.
    fn merge_chains<F>(storage: &mut S, mut a: K, mut b: K, compare: &mut F) -> K
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut head = K::NONE;
        let mut tail = K::NONE;

        while a.is_some() && b.is_some() {
            let (take, next) = {
                // Safety: chain keys are occupied (list invariant)
                let a_node = unsafe { storage.get_unchecked(a) };
                let b_node = unsafe { storage.get_unchecked(b) };
                if compare(&b_node.data, &a_node.data) == Ordering::Less {
                    (b, b_node.next)
                } else {
                    (a, a_node.next)
                }
            };

            if take == b {
                b = next;
            } else {
                a = next;
            }

            if tail.is_none() {
                head = take;
            } else {
                // Safety: tail was taken from a live chain
                unsafe { storage.get_unchecked_mut(tail) }.next = take;
            }
            tail = take;
        }

        let rest = if a.is_some() { a } else { b };
        if tail.is_none() {
            head = rest;
        } else {
            // Safety: tail was taken from a live chain
            unsafe { storage.get_unchecked_mut(tail) }.next = rest;
        }

        head
    }

    /// Merge-sorts a chain of known length, returning the new head.
    fn sort_chain<F>(storage: &mut S, head: K, len: usize, compare: &mut F) -> K
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        if len <= 1 {
            return head;
        }

        let mid = len / 2;

        // Walk to the last node of the left half and cut the chain there.
        let mut cut = head;
        for _ in 1..mid {
            // Safety: chain has at least `len` nodes
            cut = unsafe { storage.get_unchecked(cut) }.next;
        }
        // Safety: cut is a live chain key
        let right = unsafe { storage.get_unchecked(cut) }.next;
        unsafe { storage.get_unchecked_mut(cut) }.next = K::NONE;

        let left = Self::sort_chain(storage, head, mid, compare);
        let right = Self::sort_chain(storage, right, len - mid, compare);
        Self::merge_chains(storage, left, right, compare)
    }

    // ========================================================================
    // Reordering and filtering
    // ========================================================================

    /// Reverses the list in place.
    ///
    /// Iterative pointer reversal: O(n) time, O(1) space.
    pub fn reverse(&mut self, storage: &mut S) {
        let mut prev = K::NONE;
        let mut curr = self.head;

        while curr.is_some() {
            // Safety: chain keys are occupied (list invariant)
            let next = unsafe { storage.get_unchecked(curr) }.next;
            unsafe { storage.get_unchecked_mut(curr) }.next = prev;
            prev = curr;
            curr = next;
        }

        self.head = prev;
    }

    /// Removes consecutive duplicates, judged by `pred`.
    ///
    /// Only runs of adjacent elements collapse; the first element of
    /// each run survives. Returns the number of elements removed.
    pub fn unique_by<F>(&mut self, storage: &mut S, mut pred: F) -> usize
    where
        F: FnMut(&T, &T) -> bool,
    {
        if self.head.is_none() {
            return 0;
        }

        let mut prev = self.head;
        let mut count = 0;

        loop {
            // Safety: chain keys are occupied (list invariant)
            let next = unsafe { storage.get_unchecked(prev) }.next;
            if next.is_none() {
                return count;
            }

            let duplicate = {
                // Safety: prev and next are live chain keys
                let prev_node = unsafe { storage.get_unchecked(prev) };
                let next_node = unsafe { storage.get_unchecked(next) };
                pred(&prev_node.data, &next_node.data)
            };

            if duplicate {
                self.erase_after(storage, Cursor::Node(prev));
                count += 1;
            } else {
                prev = next;
            }
        }
    }

    /// Removes consecutive equal elements.
    ///
    /// See [`unique_by`](Self::unique_by).
    #[inline]
    pub fn unique(&mut self, storage: &mut S) -> usize
    where
        T: PartialEq,
    {
        self.unique_by(storage, T::eq)
    }

    /// Removes every element satisfying `pred`.
    ///
    /// Survivors keep their relative order. Returns the number of
    /// elements removed. O(n).
    pub fn remove_if<F>(&mut self, storage: &mut S, mut pred: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let mut at = Cursor::Head;
        let mut count = 0;

        loop {
            let key = self.next_at(storage, at);
            if key.is_none() {
                return count;
            }

            // Safety: key is a live chain key
            let hit = pred(&unsafe { storage.get_unchecked(key) }.data);
            if hit {
                self.erase_after(storage, at);
                count += 1;
            } else {
                at = Cursor::Node(key);
            }
        }
    }

    /// Removes every element equal to `value`.
    ///
    /// Returns the number of elements removed.
    #[inline]
    pub fn remove(&mut self, storage: &mut S, value: &T) -> usize
    where
        T: PartialEq,
    {
        self.remove_if(storage, |element| element == value)
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Returns an iterator over references to elements, front to back.
    #[inline]
    pub fn iter<'a>(&self, storage: &'a S) -> Iter<'a, T, S, K> {
        Iter {
            storage,
            curr: self.head,
            _marker: PhantomData,
        }
    }

    /// Returns an iterator over mutable references to elements.
    #[inline]
    pub fn iter_mut<'a>(&self, storage: &'a mut S) -> IterMut<'a, T, S, K> {
        IterMut {
            storage,
            curr: self.head,
            _marker: PhantomData,
        }
    }

    /// Clears the list, returning an iterator over removed elements.
    ///
    /// The list is empty after this call. Nodes are deallocated from
    /// storage as the iterator is consumed; dropping the iterator
    /// deallocates the rest.
    #[inline]
    pub fn drain<'a>(&mut self, storage: &'a mut S) -> Drain<'a, T, S, K> {
        let head = self.head;
        self.head = K::NONE;

        Drain {
            storage,
            curr: head,
            _marker: PhantomData,
        }
    }
}

// =============================================================================
// Bounded storage impl - fallible insertion
// =============================================================================

impl<T, S, K: Key> ForwardList<T, S, K>
where
    S: BoundedStorage<ForwardNode<T, K>, Key = K>,
{
    /// Pushes a value to the front of the list.
    ///
    /// Returns the key of the inserted element.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if storage is full.
    #[inline]
    pub fn try_push_front(&mut self, storage: &mut S, value: T) -> Result<K, Full<T>> {
        self.try_insert_after(storage, Cursor::Head, value)
    }

    /// Inserts a value after the given position.
    ///
    /// Returns the key of the inserted element.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if storage is full.
    ///
    /// # Panics
    ///
    /// Panics if `at` refers to an erased node.
    #[inline]
    pub fn try_insert_after(
        &mut self,
        storage: &mut S,
        at: Cursor<K>,
        value: T,
    ) -> Result<K, Full<T>> {
        let next = self.next_at(storage, at);
        let key = storage
            .try_insert(ForwardNode { data: value, next })
            .map_err(|full| full.map(|node| node.data))?;
        self.set_next_at(storage, at, key);
        Ok(key)
    }

    /// Inserts every element of `iter` after the given position,
    /// preserving iteration order.
    ///
    /// Returns the position of the last inserted node, or `at` itself
    /// if the iterator was empty.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` with the first value that did not fit.
    /// Elements inserted before the failure stay linked; the operation
    /// is not rolled back.
    ///
    /// # Panics
    ///
    /// Panics if `at` refers to an erased node.
    pub fn try_insert_iter_after<I>(
        &mut self,
        storage: &mut S,
        at: Cursor<K>,
        iter: I,
    ) -> Result<Cursor<K>, Full<T>>
    where
        I: IntoIterator<Item = T>,
    {
        let mut at = at;
        for value in iter {
            let key = self.try_insert_after(storage, at, value)?;
            at = Cursor::Node(key);
        }
        Ok(at)
    }

    /// Resizes the list to exactly `count` elements.
    ///
    /// Truncates if the list is longer; appends clones of `value` if
    /// shorter. Finding the current length costs O(n).
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if storage fills up while appending;
    /// elements appended before the failure stay linked.
    pub fn try_resize(&mut self, storage: &mut S, count: usize, value: T) -> Result<(), Full<T>>
    where
        T: Clone,
    {
        self.try_resize_with(storage, count, || value.clone())
    }

    /// Resizes the list to exactly `count` elements, filling with `f`.
    ///
    /// See [`try_resize`](Self::try_resize).
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if storage fills up while appending.
    pub fn try_resize_with<F>(
        &mut self,
        storage: &mut S,
        count: usize,
        mut f: F,
    ) -> Result<(), Full<T>>
    where
        F: FnMut() -> T,
    {
        let mut at = Cursor::Head;
        let mut len = 0;

        while len < count {
            let key = self.next_at(storage, at);
            if key.is_none() {
                break;
            }
            at = Cursor::Node(key);
            len += 1;
        }

        if len == count {
            self.erase_between(storage, at, K::NONE);
            return Ok(());
        }

        for _ in len..count {
            let key = self.try_insert_after(storage, at, f())?;
            at = Cursor::Node(key);
        }
        Ok(())
    }

    /// Replaces the list's contents with the elements of `iter`.
    ///
    /// Existing nodes are reused in place: payloads of the common
    /// prefix are overwritten, then either new nodes are appended
    /// (source longer) or the surplus tail is erased (source shorter).
    /// Replacing with a same-length sequence allocates nothing.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if storage fills up while appending;
    /// the list is left holding the prefix written so far.
    pub fn try_assign<I>(&mut self, storage: &mut S, iter: I) -> Result<(), Full<T>>
    where
        I: IntoIterator<Item = T>,
    {
        let mut at = Cursor::Head;

        for value in iter {
            let next = self.next_at(storage, at);
            if next.is_some() {
                // Safety: next is a live chain key
                unsafe { storage.get_unchecked_mut(next) }.data = value;
                at = Cursor::Node(next);
            } else {
                let key = self.try_insert_after(storage, at, value)?;
                at = Cursor::Node(key);
            }
        }

        self.erase_between(storage, at, K::NONE);
        Ok(())
    }
}

// =============================================================================
// Unbounded storage impl - infallible insertion
// =============================================================================

impl<T, S, K: Key> ForwardList<T, S, K>
where
    S: UnboundedStorage<ForwardNode<T, K>, Key = K>,
{
    /// Pushes a value to the front of the list.
    ///
    /// Returns the key of the inserted element.
    #[inline]
    pub fn push_front(&mut self, storage: &mut S, value: T) -> K {
        self.insert_after(storage, Cursor::Head, value)
    }

    /// Inserts a value after the given position.
    ///
    /// Returns the key of the inserted element.
    ///
    /// # Panics
    ///
    /// Panics if `at` refers to an erased node.
    #[inline]
    pub fn insert_after(&mut self, storage: &mut S, at: Cursor<K>, value: T) -> K {
        let next = self.next_at(storage, at);
        let key = storage.insert(ForwardNode { data: value, next });
        self.set_next_at(storage, at, key);
        key
    }

    /// Inserts every element of `iter` after the given position,
    /// preserving iteration order.
    ///
    /// Returns the position of the last inserted node, or `at` itself
    /// if the iterator was empty.
    ///
    /// # Panics
    ///
    /// Panics if `at` refers to an erased node.
    pub fn insert_iter_after<I>(&mut self, storage: &mut S, at: Cursor<K>, iter: I) -> Cursor<K>
    where
        I: IntoIterator<Item = T>,
    {
        let mut at = at;
        for value in iter {
            at = Cursor::Node(self.insert_after(storage, at, value));
        }
        at
    }

    /// Resizes the list to exactly `count` elements.
    ///
    /// Truncates if the list is longer; appends clones of `value` if
    /// shorter.
    pub fn resize(&mut self, storage: &mut S, count: usize, value: T)
    where
        T: Clone,
    {
        self.resize_with(storage, count, || value.clone());
    }

    /// Resizes the list to exactly `count` elements, filling with `f`.
    pub fn resize_with<F>(&mut self, storage: &mut S, count: usize, mut f: F)
    where
        F: FnMut() -> T,
    {
        let mut at = Cursor::Head;
        let mut len = 0;

        while len < count {
            let key = self.next_at(storage, at);
            if key.is_none() {
                break;
            }
            at = Cursor::Node(key);
            len += 1;
        }

        if len == count {
            self.erase_between(storage, at, K::NONE);
            return;
        }

        for _ in len..count {
            at = Cursor::Node(self.insert_after(storage, at, f()));
        }
    }

    /// Replaces the list's contents with the elements of `iter`,
    /// reusing existing nodes in place.
    ///
    /// See [`try_assign`](Self::try_assign) for the reuse contract.
    pub fn assign<I>(&mut self, storage: &mut S, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        let mut at = Cursor::Head;

        for value in iter {
            let next = self.next_at(storage, at);
            if next.is_some() {
                // Safety: next is a live chain key
                unsafe { storage.get_unchecked_mut(next) }.data = value;
                at = Cursor::Node(next);
            } else {
                at = Cursor::Node(self.insert_after(storage, at, value));
            }
        }

        self.erase_between(storage, at, K::NONE);
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// Iterator over references to list elements.
pub struct Iter<'a, T, S, K: Key> {
    storage: &'a S,
    curr: K,
    _marker: PhantomData<T>,
}

impl<'a, T: 'a, S, K: Key + 'a> Iterator for Iter<'a, T, S, K>
where
    S: Storage<ForwardNode<T, K>, Key = K>,
{
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.curr.is_none() {
            return None;
        }

        // Safety: list invariants guarantee chain keys are occupied
        let node = unsafe { self.storage.get_unchecked(self.curr) };
        self.curr = node.next;
        Some(&node.data)
    }
}

/// Iterator over mutable references to list elements.
pub struct IterMut<'a, T, S, K: Key> {
    storage: &'a mut S,
    curr: K,
    _marker: PhantomData<T>,
}

impl<'a, T: 'a, S, K: Key + 'a> Iterator for IterMut<'a, T, S, K>
where
    S: Storage<ForwardNode<T, K>, Key = K>,
{
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.curr.is_none() {
            return None;
        }

        // Safety: list invariants guarantee chain keys are occupied
        let node = unsafe { self.storage.get_unchecked_mut(self.curr) };
        self.curr = node.next;

        // Extend lifetime - safe because we visit each node exactly once
        Some(unsafe { &mut *((&mut node.data) as *mut T) })
    }
}

/// Iterator that removes and returns elements from a list.
pub struct Drain<'a, T, S, K: Key>
where
    S: Storage<ForwardNode<T, K>, Key = K>,
{
    storage: &'a mut S,
    curr: K,
    _marker: PhantomData<T>,
}

impl<'a, T, S, K: Key> Iterator for Drain<'a, T, S, K>
where
    S: Storage<ForwardNode<T, K>, Key = K>,
{
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.curr.is_none() {
            return None;
        }

        let key = self.curr;
        // Safety: key came from chain traversal, must be occupied
        self.curr = unsafe { self.storage.get_unchecked(key) }.next;
        self.storage.remove(key).map(|node| node.data)
    }
}

impl<T, S, K: Key> Drop for Drain<'_, T, S, K>
where
    S: Storage<ForwardNode<T, K>, Key = K>,
{
    fn drop(&mut self) {
        // Exhaust remaining elements to ensure cleanup
        for _ in self.by_ref() {}
    }
}
