//! Arena-backed recency list with O(1) relocation.
//!
//! Entries live in a `Vec<Slot>` with index-based doubly-linked links instead
//! of raw pointers. Head is the most-recently used entry, tail the
//! least-recently used one.
//!
//! A [`Handle`] names a slot together with the slot's generation. Freeing a
//! slot bumps its generation and pushes it onto a free list, so a handle that
//! outlives its entry resolves to `None` rather than to whatever entry reuses
//! the slot. The concurrent backend relies on this: it can load a handle from
//! its key index, lose a race with a removal, and still detect the miss once
//! it holds the list lock.

/// Sentinel value for null links in the doubly-linked list.
const SENTINEL: usize = usize::MAX;

/// Stable reference to an entry's position in a [`RecencyList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    slot: usize,
    generation: u64,
}

#[derive(Debug)]
struct Slot<K, V> {
    entry: Option<(K, V)>,
    generation: u64,
    prev: usize,
    next: usize,
}

/// Doubly-linked list of `(key, value)` entries ordered by recency.
pub struct RecencyList<K, V> {
    slots: Vec<Slot<K, V>>,
    /// Most-recently used slot.
    head: usize,
    /// Least-recently used slot.
    tail: usize,
    /// Free-list head; freed slots chain through `next`.
    free_head: usize,
    len: usize,
}

impl<K, V> std::fmt::Debug for RecencyList<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecencyList")
            .field("len", &self.len)
            .field("slots", &self.slots.len())
            .finish()
    }
}

impl<K, V> Default for RecencyList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> RecencyList<K, V> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty list with room for `capacity` entries before the arena
    /// reallocates.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            head: SENTINEL,
            tail: SENTINEL,
            free_head: SENTINEL,
            len: 0,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of allocated arena slots (live + free).
    pub fn arena_len(&self) -> usize {
        self.slots.len()
    }

    /// Whether `handle` still refers to a live entry.
    pub fn contains(&self, handle: Handle) -> bool {
        self.resolve(handle).is_some()
    }

    /// Insert a new entry at the head and return its handle.
    pub fn push_front(&mut self, key: K, value: V) -> Handle {
        let idx = self.alloc_slot(key, value);
        self.link_front(idx);
        self.len += 1;
        Handle {
            slot: idx,
            generation: self.slots[idx].generation,
        }
    }

    /// Move the entry for `handle` to the head.
    ///
    /// Returns `false` if the handle is stale. Already-head entries are left
    /// in place.
    pub fn move_to_front(&mut self, handle: Handle) -> bool {
        let Some(idx) = self.resolve(handle) else {
            return false;
        };
        if self.head != idx {
            self.unlink(idx);
            self.link_front(idx);
        }
        true
    }

    /// Remove and return the tail (least-recently used) entry.
    pub fn remove_back(&mut self) -> Option<(K, V)> {
        if self.tail == SENTINEL {
            return None;
        }
        self.release(self.tail)
    }

    /// Remove the entry for `handle`, wherever it sits in the list.
    pub fn remove(&mut self, handle: Handle) -> Option<(K, V)> {
        let idx = self.resolve(handle)?;
        self.release(idx)
    }

    /// Value for `handle`, without touching recency.
    pub fn get(&self, handle: Handle) -> Option<&V> {
        let idx = self.resolve(handle)?;
        self.slots[idx].entry.as_ref().map(|(_, v)| v)
    }

    /// Mutable value for `handle`, without touching recency.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut V> {
        let idx = self.resolve(handle)?;
        self.slots[idx].entry.as_mut().map(|(_, v)| v)
    }

    /// Head entry (most-recently used).
    pub fn front(&self) -> Option<(&K, &V)> {
        self.entry_at(self.head)
    }

    /// Tail entry (least-recently used).
    pub fn back(&self) -> Option<(&K, &V)> {
        self.entry_at(self.tail)
    }

    /// Drop every entry.
    ///
    /// Slots stay allocated with bumped generations so that handles issued
    /// before the clear can never resolve again.
    pub fn clear(&mut self) {
        self.free_head = SENTINEL;
        for idx in (0..self.slots.len()).rev() {
            let slot = &mut self.slots[idx];
            if slot.entry.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            slot.prev = SENTINEL;
            slot.next = self.free_head;
            self.free_head = idx;
        }
        self.head = SENTINEL;
        self.tail = SENTINEL;
        self.len = 0;
    }

    /// Iterate from head (most-recent) to tail (least-recent).
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            current: self.head,
            remaining: self.len,
            reverse: false,
        }
    }

    /// Iterate from tail (least-recent) to head (most-recent).
    pub fn iter_rev(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            current: self.tail,
            remaining: self.len,
            reverse: true,
        }
    }

    // --- Internal linked-list operations ---

    fn resolve(&self, handle: Handle) -> Option<usize> {
        let slot = self.slots.get(handle.slot)?;
        (slot.generation == handle.generation && slot.entry.is_some()).then_some(handle.slot)
    }

    fn entry_at(&self, idx: usize) -> Option<(&K, &V)> {
        if idx == SENTINEL {
            return None;
        }
        self.slots[idx].entry.as_ref().map(|(k, v)| (k, v))
    }

    /// Allocate a slot, reusing a free one if available.
    fn alloc_slot(&mut self, key: K, value: V) -> usize {
        if self.free_head != SENTINEL {
            let idx = self.free_head;
            let slot = &mut self.slots[idx];
            self.free_head = slot.next;
            slot.entry = Some((key, value));
            slot.prev = SENTINEL;
            slot.next = SENTINEL;
            idx
        } else {
            let idx = self.slots.len();
            self.slots.push(Slot {
                entry: Some((key, value)),
                generation: 0,
                prev: SENTINEL,
                next: SENTINEL,
            });
            idx
        }
    }

    /// Unlink a live slot, retire its generation and push it on the free list.
    fn release(&mut self, idx: usize) -> Option<(K, V)> {
        self.unlink(idx);
        let slot = &mut self.slots[idx];
        let entry = slot.entry.take();
        slot.generation = slot.generation.wrapping_add(1);
        slot.next = self.free_head;
        self.free_head = idx;
        if entry.is_some() {
            self.len -= 1;
        }
        entry
    }

    /// Remove node at `idx` from the linked list (does NOT free the slot).
    fn unlink(&mut self, idx: usize) {
        let prev = self.slots[idx].prev;
        let next = self.slots[idx].next;

        if prev != SENTINEL {
            self.slots[prev].next = next;
        } else {
            self.head = next;
        }

        if next != SENTINEL {
            self.slots[next].prev = prev;
        } else {
            self.tail = prev;
        }

        self.slots[idx].prev = SENTINEL;
        self.slots[idx].next = SENTINEL;
    }

    fn link_front(&mut self, idx: usize) {
        self.slots[idx].prev = SENTINEL;
        self.slots[idx].next = self.head;

        if self.head != SENTINEL {
            self.slots[self.head].prev = idx;
        }
        self.head = idx;

        if self.tail == SENTINEL {
            self.tail = idx;
        }
    }
}

/// Borrowing iterator over a [`RecencyList`] in either direction.
pub struct Iter<'a, K, V> {
    slots: &'a [Slot<K, V>],
    current: usize,
    remaining: usize,
    reverse: bool,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == SENTINEL || self.remaining == 0 {
            return None;
        }
        let slot = &self.slots[self.current];
        self.current = if self.reverse { slot.prev } else { slot.next };
        self.remaining -= 1;
        slot.entry.as_ref().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys<K: Copy, V>(list: &RecencyList<K, V>) -> Vec<K> {
        list.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn push_front_orders_newest_first() {
        let mut list = RecencyList::new();
        list.push_front(1, "one");
        list.push_front(2, "two");
        list.push_front(3, "three");

        assert_eq!(keys(&list), vec![3, 2, 1]);
        assert_eq!(list.front(), Some((&3, &"three")));
        assert_eq!(list.back(), Some((&1, &"one")));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn move_to_front_relocates() {
        let mut list = RecencyList::new();
        let a = list.push_front('a', 1);
        list.push_front('b', 2);
        list.push_front('c', 3);

        assert!(list.move_to_front(a));
        assert_eq!(keys(&list), vec!['a', 'c', 'b']);
        assert_eq!(list.back(), Some((&'b', &2)));
    }

    #[test]
    fn move_to_front_of_head_is_noop() {
        let mut list = RecencyList::new();
        list.push_front(1, ());
        let head = list.push_front(2, ());

        assert!(list.move_to_front(head));
        assert_eq!(keys(&list), vec![2, 1]);
    }

    #[test]
    fn move_tail_to_front_updates_tail() {
        let mut list = RecencyList::new();
        let tail = list.push_front(1, ());
        list.push_front(2, ());
        list.push_front(3, ());

        list.move_to_front(tail);
        assert_eq!(list.back(), Some((&2, &())));
        assert_eq!(list.iter_rev().map(|(k, _)| *k).collect::<Vec<_>>(), vec![2, 3, 1]);
    }

    #[test]
    fn remove_back_pops_lru() {
        let mut list = RecencyList::new();
        list.push_front(1, "one");
        list.push_front(2, "two");

        assert_eq!(list.remove_back(), Some((1, "one")));
        assert_eq!(list.remove_back(), Some((2, "two")));
        assert_eq!(list.remove_back(), None);
        assert!(list.is_empty());
    }

    #[test]
    fn remove_middle_relinks_neighbors() {
        let mut list = RecencyList::new();
        list.push_front(1, ());
        let mid = list.push_front(2, ());
        list.push_front(3, ());

        assert_eq!(list.remove(mid), Some((2, ())));
        assert_eq!(keys(&list), vec![3, 1]);
        assert_eq!(list.iter_rev().map(|(k, _)| *k).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn stale_handle_does_not_resolve() {
        let mut list = RecencyList::new();
        let old = list.push_front("old", 1);
        list.remove(old);

        // The new entry reuses the slot, but under a new generation.
        let new = list.push_front("new", 2);
        assert_eq!(new.slot, old.slot);
        assert_ne!(new.generation, old.generation);

        assert!(!list.contains(old));
        assert_eq!(list.get(old), None);
        assert!(!list.move_to_front(old));
        assert_eq!(list.remove(old), None);
        assert_eq!(list.get(new), Some(&2));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn clear_invalidates_outstanding_handles() {
        let mut list = RecencyList::new();
        let a = list.push_front(1, "a");
        let b = list.push_front(2, "b");
        list.clear();

        assert!(list.is_empty());
        assert_eq!(list.front(), None);
        assert_eq!(list.back(), None);
        assert_eq!(list.iter().count(), 0);

        let c = list.push_front(3, "c");
        assert!(!list.contains(a));
        assert!(!list.contains(b));
        assert_eq!(list.get(c), Some(&"c"));
        // Slots are recycled rather than reallocated.
        assert_eq!(list.arena_len(), 2);
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut list = RecencyList::new();
        let h = list.push_front("k", vec![1]);
        list.push_front("other", vec![]);

        if let Some(v) = list.get_mut(h) {
            v.push(2);
        }
        assert_eq!(list.get(h), Some(&vec![1, 2]));
        assert_eq!(list.back(), Some((&"k", &vec![1, 2])));
        // get_mut never reorders.
        assert_eq!(list.front(), Some((&"other", &vec![])));
    }

    #[test]
    fn arena_stays_bounded_through_churn() {
        let mut list = RecencyList::with_capacity(4);
        for i in 0..1_000 {
            list.push_front(i, i);
            if list.len() > 4 {
                list.remove_back();
            }
        }
        assert_eq!(list.len(), 4);
        assert!(list.arena_len() <= 5);
        assert_eq!(keys(&list), vec![999, 998, 997, 996]);
    }

    #[test]
    fn iterator_size_hint_is_exact() {
        let mut list = RecencyList::new();
        for i in 0..3 {
            list.push_front(i, ());
        }
        let iter = list.iter();
        assert_eq!(iter.size_hint(), (3, Some(3)));
        assert_eq!(iter.len(), 3);
    }
}
