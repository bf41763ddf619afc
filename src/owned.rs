//! Owned forward list with embedded storage.
//!
//! [`OwnedForwardList`] bundles a [`ForwardList`] with its own
//! [`BoxedStorage`], giving a self-contained container with the
//! familiar owned-collection API (`Clone`, `PartialEq`, `Debug`) while
//! keeping the fixed-capacity, single-allocation storage model.
//!
//! Because each owned list has a private arena, cross-list operations
//! (`try_merge_by`, `try_splice_after`, `try_append`) move *values*
//! between arenas rather than relinking nodes, and are therefore
//! fallible: the destination arena may fill up.
//!
//! # Example
//!
//! ```
//! use forward_collections::OwnedForwardList;
//!
//! let mut list: OwnedForwardList<u64> = OwnedForwardList::with_capacity(8);
//!
//! list.try_push_front(3).unwrap();
//! list.try_push_front(1).unwrap();
//! list.try_push_front(2).unwrap();
//!
//! list.sort();
//! let values: Vec<_> = list.iter().copied().collect();
//! assert_eq!(values, vec![1, 2, 3]);
//! ```

use core::cmp::Ordering;
use core::fmt;

use crate::list::BoxedForwardStorage;
use crate::{BoundedStorage, Cursor, Drain, ForwardList, Full, Iter, IterMut, Key};

/// A forward list that owns its storage.
///
/// Capacity is fixed at construction. All positional operations take
/// and return the same [`Cursor`] values as the raw [`ForwardList`];
/// the storage argument is simply supplied internally.
///
/// # Example
///
/// ```
/// use forward_collections::{Cursor, OwnedForwardList};
///
/// let mut list: OwnedForwardList<&str> = OwnedForwardList::with_capacity(4);
/// let key = list.try_push_front("world").unwrap();
/// list.try_push_front("hello").unwrap();
///
/// assert_eq!(list.get(key), Some(&"world"));
/// assert_eq!(list.count(), 2);
/// ```
pub struct OwnedForwardList<T, K: Key = u32> {
    storage: BoxedForwardStorage<T, K>,
    list: ForwardList<T, BoxedForwardStorage<T, K>, K>,
}

impl<T, K: Key> OwnedForwardList<T, K> {
    /// Creates an empty list with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0 or exceeds the key type's maximum.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: BoxedForwardStorage::with_capacity(capacity),
            list: ForwardList::new(),
        }
    }

    /// Creates a list holding the elements of `iter`, in order.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` with the first value that did not fit
    /// in `capacity`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0 or exceeds the key type's maximum.
    pub fn try_from_iter<I>(capacity: usize, iter: I) -> Result<Self, Full<T>>
    where
        I: IntoIterator<Item = T>,
    {
        let mut list = Self::with_capacity(capacity);
        list.try_insert_iter_after(Cursor::Head, iter)?;
        Ok(list)
    }

    /// Returns the maximum number of elements the list can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Returns `true` if the list is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Returns `true` if the list is at capacity.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.storage.is_full()
    }

    /// Returns the number of elements by walking the chain. O(n).
    #[inline]
    pub fn count(&self) -> usize {
        self.list.count(&self.storage)
    }

    /// Returns the first node's key, or `None` if empty.
    #[inline]
    pub fn front_key(&self) -> Option<K> {
        self.list.front_key()
    }

    /// Returns the cursor before the first element.
    #[inline]
    pub const fn before_begin(&self) -> Cursor<K> {
        Cursor::Head
    }

    /// Returns the key of the node after the given position.
    ///
    /// # Panics
    ///
    /// Panics if `at` refers to an erased node.
    #[inline]
    pub fn next_key(&self, at: Cursor<K>) -> Option<K> {
        self.list.next_key(&self.storage, at)
    }

    /// Advances a cursor by one node.
    ///
    /// # Panics
    ///
    /// Panics if `at` refers to an erased node.
    #[inline]
    pub fn advance(&self, at: Cursor<K>) -> Option<Cursor<K>> {
        self.list.advance(&self.storage, at)
    }

    /// Returns a reference to the element at the given key.
    #[inline]
    pub fn get(&self, key: K) -> Option<&T> {
        self.list.get(&self.storage, key)
    }

    /// Returns a mutable reference to the element at the given key.
    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut T> {
        self.list.get_mut(&mut self.storage, key)
    }

    /// Returns a reference to the front element.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.list.front(&self.storage)
    }

    /// Returns a mutable reference to the front element.
    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.list.front_mut(&mut self.storage)
    }

    /// Pushes a value to the front of the list.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if the list is at capacity.
    #[inline]
    pub fn try_push_front(&mut self, value: T) -> Result<K, Full<T>> {
        self.list.try_push_front(&mut self.storage, value)
    }

    /// Inserts a value after the given position.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if the list is at capacity.
    ///
    /// # Panics
    ///
    /// Panics if `at` refers to an erased node.
    #[inline]
    pub fn try_insert_after(&mut self, at: Cursor<K>, value: T) -> Result<K, Full<T>> {
        self.list.try_insert_after(&mut self.storage, at, value)
    }

    /// Inserts every element of `iter` after the given position.
    ///
    /// Returns the position of the last inserted node.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` with the first value that did not
    /// fit; earlier insertions stay linked.
    ///
    /// # Panics
    ///
    /// Panics if `at` refers to an erased node.
    #[inline]
    pub fn try_insert_iter_after<I>(&mut self, at: Cursor<K>, iter: I) -> Result<Cursor<K>, Full<T>>
    where
        I: IntoIterator<Item = T>,
    {
        self.list.try_insert_iter_after(&mut self.storage, at, iter)
    }

    /// Removes and returns the front element.
    #[inline]
    pub fn pop_front(&mut self) -> Option<T> {
        self.list.pop_front(&mut self.storage)
    }

    /// Removes the single node after the given position.
    ///
    /// # Panics
    ///
    /// Panics if `at` refers to an erased node.
    #[inline]
    pub fn erase_after(&mut self, at: Cursor<K>) -> Option<T> {
        self.list.erase_after(&mut self.storage, at)
    }

    /// Removes every node strictly between `first` and `last`.
    ///
    /// Returns the number of nodes removed. Pass `K::NONE` as `last`
    /// to erase through the end.
    ///
    /// # Panics
    ///
    /// Panics if `first` refers to an erased node.
    #[inline]
    pub fn erase_between(&mut self, first: Cursor<K>, last: K) -> usize {
        self.list.erase_between(&mut self.storage, first, last)
    }

    /// Clears the list, removing all elements.
    #[inline]
    pub fn clear(&mut self) {
        self.list.clear(&mut self.storage);
    }

    /// Replaces the list's contents with the elements of `iter`,
    /// reusing existing nodes in place.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if the arena fills up while
    /// appending; the list is left holding the prefix written so far.
    #[inline]
    pub fn try_assign<I>(&mut self, iter: I) -> Result<(), Full<T>>
    where
        I: IntoIterator<Item = T>,
    {
        self.list.try_assign(&mut self.storage, iter)
    }

    /// Resizes the list to exactly `count` elements.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if the arena fills up while
    /// appending.
    #[inline]
    pub fn try_resize(&mut self, count: usize, value: T) -> Result<(), Full<T>>
    where
        T: Clone,
    {
        self.list.try_resize(&mut self.storage, count, value)
    }

    /// Resizes the list to exactly `count` elements, filling with `f`.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if the arena fills up while
    /// appending.
    #[inline]
    pub fn try_resize_with<F>(&mut self, count: usize, f: F) -> Result<(), Full<T>>
    where
        F: FnMut() -> T,
    {
        self.list.try_resize_with(&mut self.storage, count, f)
    }

    /// Reverses the list in place.
    #[inline]
    pub fn reverse(&mut self) {
        self.list.reverse(&mut self.storage);
    }

    /// Sorts the list with a comparator. Stable, O(n log n).
    #[inline]
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.list.sort_by(&mut self.storage, compare);
    }

    /// Sorts the list by the element ordering. Stable, O(n log n).
    #[inline]
    pub fn sort(&mut self)
    where
        T: Ord,
    {
        self.list.sort(&mut self.storage);
    }

    /// Removes consecutive duplicates, judged by `pred`.
    ///
    /// Returns the number of elements removed.
    #[inline]
    pub fn unique_by<F>(&mut self, pred: F) -> usize
    where
        F: FnMut(&T, &T) -> bool,
    {
        self.list.unique_by(&mut self.storage, pred)
    }

    /// Removes consecutive equal elements.
    ///
    /// Returns the number of elements removed.
    #[inline]
    pub fn unique(&mut self) -> usize
    where
        T: PartialEq,
    {
        self.list.unique(&mut self.storage)
    }

    /// Removes every element satisfying `pred`.
    ///
    /// Returns the number of elements removed.
    #[inline]
    pub fn remove_if<F>(&mut self, pred: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        self.list.remove_if(&mut self.storage, pred)
    }

    /// Removes every element equal to `value`.
    ///
    /// Returns the number of elements removed.
    #[inline]
    pub fn remove(&mut self, value: &T) -> usize
    where
        T: PartialEq,
    {
        self.list.remove(&mut self.storage, value)
    }

    /// Merges `other` into `self` with a comparator.
    ///
    /// Both lists must already be sorted under `compare` (unchecked).
    /// Stable: on ties, elements already in `self` come first. `other`
    /// is drained front to back; each arena is private, so values move
    /// between arenas rather than nodes relinking.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if `self`'s arena fills up. The value
    /// in the error has already left `other`; elements merged before
    /// the failure stay in `self`.
    pub fn try_merge_by<F>(&mut self, other: &mut Self, mut compare: F) -> Result<(), Full<T>>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut at = Cursor::Head;

        loop {
            let take = {
                let Some(incoming) = other.front() else {
                    return Ok(());
                };
                match self.list.next_key(&self.storage, at) {
                    None => true,
                    Some(key) => {
                        let current = self.get(key).expect("live chain key");
                        compare(incoming, current) == Ordering::Less
                    }
                }
            };

            if take {
                let Some(value) = other.pop_front() else {
                    return Ok(());
                };
                let key = self.list.try_insert_after(&mut self.storage, at, value)?;
                at = Cursor::Node(key);
            } else if let Some(next) = self.list.advance(&self.storage, at) {
                at = next;
            }
        }
    }

    /// Merges `other` into `self` by the element ordering.
    ///
    /// See [`try_merge_by`](Self::try_merge_by).
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if `self`'s arena fills up.
    #[inline]
    pub fn try_merge(&mut self, other: &mut Self) -> Result<(), Full<T>>
    where
        T: Ord,
    {
        self.try_merge_by(other, T::cmp)
    }

    /// Moves all of `other`'s elements to immediately after `at`,
    /// preserving their order. `other` is left empty on success.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if `self`'s arena fills up. The value
    /// in the error has already left `other`; elements moved before the
    /// failure stay in `self`.
    ///
    /// # Panics
    ///
    /// Panics if `at` refers to an erased node.
    pub fn try_splice_after(&mut self, at: Cursor<K>, other: &mut Self) -> Result<(), Full<T>> {
        let mut at = at;
        while let Some(value) = other.pop_front() {
            let key = self.list.try_insert_after(&mut self.storage, at, value)?;
            at = Cursor::Node(key);
        }
        Ok(())
    }

    /// Moves all of `other`'s elements to the end of `self`.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if `self`'s arena fills up; see
    /// [`try_splice_after`](Self::try_splice_after).
    pub fn try_append(&mut self, other: &mut Self) -> Result<(), Full<T>> {
        let at = self.tail_cursor();
        self.try_splice_after(at, other)
    }

    /// Walks to the position after the last element. O(n).
    fn tail_cursor(&self) -> Cursor<K> {
        let mut at = Cursor::Head;
        while let Some(next) = self.list.advance(&self.storage, at) {
            at = next;
        }
        at
    }

    /// Returns an iterator over references to elements, front to back.
    #[inline]
    pub fn iter(&self) -> Iter<'_, T, BoxedForwardStorage<T, K>, K> {
        self.list.iter(&self.storage)
    }

    /// Returns an iterator over mutable references to elements.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, T, BoxedForwardStorage<T, K>, K> {
        self.list.iter_mut(&mut self.storage)
    }

    /// Clears the list, returning an iterator over removed elements.
    #[inline]
    pub fn drain(&mut self) -> Drain<'_, T, BoxedForwardStorage<T, K>, K> {
        self.list.drain(&mut self.storage)
    }
}

impl<T, K: Key> Default for OwnedForwardList<T, K> {
    /// Creates an empty list with capacity 16.
    fn default() -> Self {
        Self::with_capacity(16)
    }
}

impl<T: Clone, K: Key> Clone for OwnedForwardList<T, K> {
    fn clone(&self) -> Self {
        let mut clone = Self::with_capacity(self.capacity());
        let mut at = Cursor::Head;
        for value in self.iter() {
            match clone.list.try_insert_after(&mut clone.storage, at, value.clone()) {
                Ok(key) => at = Cursor::Node(key),
                Err(_) => unreachable!("clone capacity matches source"),
            }
        }
        clone
    }

    fn clone_from(&mut self, source: &Self) {
        // Reuse our arena when it is large enough; assign overwrites
        // the common prefix in place.
        if source.count() > self.capacity() {
            *self = source.clone();
            return;
        }
        match self.list.try_assign(&mut self.storage, source.iter().cloned()) {
            Ok(()) => {}
            Err(_) => unreachable!("capacity checked above"),
        }
    }
}

impl<T: fmt::Debug, K: Key> fmt::Debug for OwnedForwardList<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq, K: Key> PartialEq for OwnedForwardList<T, K> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<T: Eq, K: Key> Eq for OwnedForwardList<T, K> {}

impl<T: PartialOrd, K: Key> PartialOrd for OwnedForwardList<T, K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T: Ord, K: Key> Ord for OwnedForwardList<T, K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_values(values: &[u64]) -> OwnedForwardList<u64> {
        OwnedForwardList::try_from_iter(16, values.iter().copied()).unwrap()
    }

    fn contents(list: &OwnedForwardList<u64>) -> Vec<u64> {
        list.iter().copied().collect()
    }

    #[test]
    fn with_capacity_starts_empty() {
        let list: OwnedForwardList<u64> = OwnedForwardList::with_capacity(8);
        assert!(list.is_empty());
        assert!(!list.is_full());
        assert_eq!(list.capacity(), 8);
        assert_eq!(list.count(), 0);
    }

    #[test]
    fn default_has_capacity_16() {
        let list: OwnedForwardList<u64> = OwnedForwardList::default();
        assert_eq!(list.capacity(), 16);
    }

    #[test]
    fn try_from_iter_preserves_order() {
        let list = from_values(&[1, 2, 3]);
        assert_eq!(contents(&list), vec![1, 2, 3]);
    }

    #[test]
    fn try_from_iter_overflow_reports_value() {
        let err = OwnedForwardList::<u64>::try_from_iter(2, [1, 2, 3]).unwrap_err();
        assert_eq!(err.into_inner(), 3);
    }

    #[test]
    fn push_until_full() {
        let mut list: OwnedForwardList<u64> = OwnedForwardList::with_capacity(2);

        list.try_push_front(1).unwrap();
        list.try_push_front(2).unwrap();
        assert!(list.is_full());

        let err = list.try_push_front(3).unwrap_err();
        assert_eq!(err.into_inner(), 3);
        assert_eq!(contents(&list), vec![2, 1]);
    }

    #[test]
    fn insert_and_erase_by_cursor() {
        let mut list = from_values(&[1, 3]);

        let a = list.front_key().unwrap();
        list.try_insert_after(Cursor::Node(a), 2).unwrap();
        assert_eq!(contents(&list), vec![1, 2, 3]);

        assert_eq!(list.erase_after(Cursor::Node(a)), Some(2));
        assert_eq!(contents(&list), vec![1, 3]);
    }

    #[test]
    fn capacity_freed_on_erase() {
        let mut list: OwnedForwardList<u64> = OwnedForwardList::with_capacity(1);

        list.try_push_front(1).unwrap();
        assert!(list.try_push_front(2).is_err());

        assert_eq!(list.pop_front(), Some(1));
        list.try_push_front(2).unwrap();
        assert_eq!(contents(&list), vec![2]);
    }

    #[test]
    fn clone_is_deep() {
        let original = from_values(&[1, 2, 3]);
        let mut copy = original.clone();

        assert_eq!(copy, original);
        assert_eq!(copy.capacity(), original.capacity());

        copy.pop_front();
        assert_ne!(copy, original);
        assert_eq!(contents(&original), vec![1, 2, 3]);
    }

    #[test]
    fn clone_from_reuses_arena() {
        let source = from_values(&[4, 5, 6]);
        let mut target = from_values(&[1, 2, 3]);

        target.clone_from(&source);

        assert_eq!(target, source);
        assert_eq!(target.capacity(), 16);
    }

    #[test]
    fn clone_from_grows_when_needed() {
        let source = from_values(&[1, 2, 3, 4]);
        let mut target: OwnedForwardList<u64> = OwnedForwardList::with_capacity(2);
        target.try_push_front(9).unwrap();

        target.clone_from(&source);

        assert_eq!(target, source);
    }

    #[test]
    fn equality_and_ordering() {
        let a = from_values(&[1, 2, 3]);
        let b = from_values(&[1, 2, 3]);
        let c = from_values(&[1, 2, 4]);
        let shorter = from_values(&[1, 2]);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a < c);
        assert!(shorter < a);
    }

    #[test]
    fn debug_formats_as_list() {
        let list = from_values(&[1, 2]);
        assert_eq!(format!("{list:?}"), "[1, 2]");
    }

    #[test]
    fn try_merge_across_arenas() {
        let mut a = from_values(&[1, 3, 5]);
        let mut b = from_values(&[2, 4, 6]);

        a.try_merge(&mut b).unwrap();

        assert_eq!(contents(&a), vec![1, 2, 3, 4, 5, 6]);
        assert!(b.is_empty());
    }

    #[test]
    fn try_merge_is_stable() {
        let mut a =
            OwnedForwardList::<(u64, char)>::try_from_iter(8, [(1, 'a'), (2, 'a')]).unwrap();
        let mut b =
            OwnedForwardList::<(u64, char)>::try_from_iter(8, [(1, 'b'), (2, 'b')]).unwrap();

        a.try_merge_by(&mut b, |x, y| x.0.cmp(&y.0)).unwrap();

        let merged: Vec<_> = a.iter().copied().collect();
        assert_eq!(merged, vec![(1, 'a'), (1, 'b'), (2, 'a'), (2, 'b')]);
    }

    #[test]
    fn try_merge_overflow() {
        // Arena full at its exact capacity (4 stays 4, no rounding).
        let mut a = OwnedForwardList::try_from_iter(4, [0u64, 1, 3, 5]).unwrap();
        let mut b = from_values(&[2, 4]);
        assert!(a.is_full());

        let err = a.try_merge(&mut b).unwrap_err();

        // 2 did not fit; it left b and is handed back in the error.
        assert_eq!(err.into_inner(), 2);
        assert_eq!(contents(&a), vec![0, 1, 3, 5]);
        assert_eq!(contents(&b), vec![4]);
    }

    #[test]
    fn try_splice_after_moves_values() {
        let mut a = from_values(&[1, 2]);
        let mut b = from_values(&[10, 20]);

        let first = a.front_key().unwrap();
        a.try_splice_after(Cursor::Node(first), &mut b).unwrap();

        assert_eq!(contents(&a), vec![1, 10, 20, 2]);
        assert!(b.is_empty());
    }

    #[test]
    fn try_append_at_tail() {
        let mut a = from_values(&[1, 2]);
        let mut b = from_values(&[3, 4]);

        a.try_append(&mut b).unwrap();

        assert_eq!(contents(&a), vec![1, 2, 3, 4]);
        assert!(b.is_empty());
    }

    #[test]
    fn assign_resize_and_clear() {
        let mut list = from_values(&[1, 2, 3]);

        list.try_assign([7, 8]).unwrap();
        assert_eq!(contents(&list), vec![7, 8]);

        list.try_resize(4, 0).unwrap();
        assert_eq!(contents(&list), vec![7, 8, 0, 0]);

        list.clear();
        assert!(list.is_empty());
    }

    #[test]
    fn drain_empties_the_list() {
        let mut list = from_values(&[1, 2, 3]);

        let drained: Vec<_> = list.drain().collect();

        assert_eq!(drained, vec![1, 2, 3]);
        assert!(list.is_empty());
        // Capacity is fully available again
        for i in 0..16 {
            list.try_push_front(i).unwrap();
        }
    }

    #[test]
    fn iter_mut_through_wrapper() {
        let mut list = from_values(&[1, 2, 3]);

        for value in list.iter_mut() {
            *value += 100;
        }

        assert_eq!(contents(&list), vec![101, 102, 103]);
    }

    #[test]
    fn end_to_end_pipeline() {
        let mut list = from_values(&[5, 3, 1, 4, 2]);

        list.sort();
        assert_eq!(contents(&list), vec![1, 2, 3, 4, 5]);

        assert_eq!(list.remove(&3), 1);
        assert_eq!(contents(&list), vec![1, 2, 4, 5]);

        assert_eq!(list.unique(), 0);
        assert_eq!(contents(&list), vec![1, 2, 4, 5]);

        list.reverse();
        assert_eq!(contents(&list), vec![5, 4, 2, 1]);
    }

    #[test]
    fn erase_between_through_wrapper() {
        let mut list = from_values(&[1, 2, 3, 4]);

        let first = list.front_key().unwrap();
        let removed = list.erase_between(Cursor::Node(first), u32::NONE);

        assert_eq!(removed, 3);
        assert_eq!(contents(&list), vec![1]);
    }
}
