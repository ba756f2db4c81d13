use crate::entry::Entry;
use std::collections::VecDeque;
use std::ops::{Bound, RangeBounds};

/// FIFO of recorded entries: appended at the tail, consumed from the head.
///
/// Entries are never reordered, so consumption order is recording order.
#[derive(Debug, Clone, PartialEq)]
pub struct Trail<K> {
    entries: VecDeque<Entry<K>>,
}

impl<K> Default for Trail<K> {
    fn default() -> Self {
        Trail {
            entries: VecDeque::new(),
        }
    }
}

impl<K> Trail<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: Entry<K>) {
        self.entries.push_back(entry);
    }

    /// Remove up to `n` entries from the head, oldest first.
    pub fn pop_front_n(&mut self, n: usize) -> Vec<Entry<K>> {
        let n = n.min(self.entries.len());
        self.entries.drain(..n).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry<K>> + '_ {
        self.entries.iter()
    }

    /// Entry at `index`; negative indices count back from the tail.
    pub fn get(&self, index: isize) -> Option<&Entry<K>> {
        let len = self.entries.len() as isize;
        let index = if index < 0 { index + len } else { index };
        if (0..len).contains(&index) {
            self.entries.get(index as usize)
        } else {
            None
        }
    }

    /// Entries in `range`, with sequence-slice semantics: negative bounds
    /// count back from the tail and out-of-range bounds are clamped, so an
    /// inverted or empty range yields nothing rather than failing.
    pub fn slice<R: RangeBounds<isize>>(&self, range: R) -> Vec<&Entry<K>> {
        let len = self.entries.len() as isize;
        let resolve = |i: isize| if i < 0 { i + len } else { i };
        let start = match range.start_bound() {
            Bound::Included(&i) => resolve(i),
            Bound::Excluded(&i) => resolve(i).saturating_add(1),
            Bound::Unbounded => 0,
        }
        .clamp(0, len);
        let end = match range.end_bound() {
            Bound::Included(&i) => resolve(i).saturating_add(1),
            Bound::Excluded(&i) => resolve(i),
            Bound::Unbounded => len,
        }
        .clamp(0, len);
        if start >= end {
            return Vec::new();
        }
        self.entries
            .range(start as usize..end as usize)
            .collect()
    }
}

impl<K> FromIterator<Entry<K>> for Trail<K> {
    fn from_iter<I: IntoIterator<Item = Entry<K>>>(iter: I) -> Self {
        Trail {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<K> Extend<Entry<K>> for Trail<K> {
    fn extend<I: IntoIterator<Item = Entry<K>>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}
