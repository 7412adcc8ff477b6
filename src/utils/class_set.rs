//! A dense set of [`ClassId`]s backed by a bit vector.
//!
//! Compaction needs to answer "is this class still live?" for every weak class reference
//! it filters (subclass lists, signature references, Kotlin name lists). Class ids are
//! dense arena indices, so a bit vector sized to the pool answers that in constant time
//! without hashing.
//!
//! # Example
//!
//! ```rust
//! use classhrink::utils::ClassSet;
//! use classhrink::model::ClassId;
//!
//! let mut set = ClassSet::new(100);
//! set.insert(ClassId::new(0));
//! set.insert(ClassId::new(50));
//!
//! assert!(set.contains(ClassId::new(50)));
//! assert_eq!(set.count(), 2);
//! ```

use crate::model::ClassId;

/// A fixed-capacity set of class ids.
///
/// Ids at or beyond the capacity are never members; querying them returns `false`
/// rather than panicking, since a weak reference to a class outside the pool simply
/// does not resolve to a live class.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ClassSet {
    words: Vec<u64>,
    len: usize,
}

impl ClassSet {
    /// Creates an empty set able to hold ids `0..capacity`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(64)],
            len: capacity,
        }
    }

    /// Returns the capacity of the set.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.len
    }

    /// Returns `true` if no id is in the set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Adds an id to the set. Ids outside the capacity are ignored.
    pub fn insert(&mut self, id: ClassId) {
        let index = id.index();
        if index < self.len {
            self.words[index / 64] |= 1u64 << (index % 64);
        }
    }

    /// Removes an id from the set.
    pub fn remove(&mut self, id: ClassId) {
        let index = id.index();
        if index < self.len {
            self.words[index / 64] &= !(1u64 << (index % 64));
        }
    }

    /// Returns `true` if the id is in the set.
    #[must_use]
    pub fn contains(&self, id: ClassId) -> bool {
        let index = id.index();
        index < self.len && (self.words[index / 64] & (1u64 << (index % 64))) != 0
    }

    /// Returns the number of ids in the set.
    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterates over the ids in ascending order.
    pub fn iter(&self) -> ClassSetIter<'_> {
        ClassSetIter {
            set: self,
            word_idx: 0,
            bit_idx: 0,
        }
    }
}

impl std::fmt::Debug for ClassSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<ClassId> for ClassSet {
    /// Collects ids into a set sized to the largest id seen.
    fn from_iter<I: IntoIterator<Item = ClassId>>(iter: I) -> Self {
        let ids: Vec<ClassId> = iter.into_iter().collect();
        let capacity = ids.iter().map(|id| id.index() + 1).max().unwrap_or(0);
        let mut set = ClassSet::new(capacity);
        for id in ids {
            set.insert(id);
        }
        set
    }
}

/// Iterator over the ids of a [`ClassSet`].
pub struct ClassSetIter<'a> {
    set: &'a ClassSet,
    word_idx: usize,
    bit_idx: usize,
}

impl Iterator for ClassSetIter<'_> {
    type Item = ClassId;

    fn next(&mut self) -> Option<Self::Item> {
        while self.word_idx < self.set.words.len() {
            let word = self.set.words[self.word_idx];
            while self.bit_idx < 64 {
                let idx = self.word_idx * 64 + self.bit_idx;
                if idx >= self.set.len {
                    return None;
                }
                self.bit_idx += 1;
                if (word & (1u64 << (self.bit_idx - 1))) != 0 {
                    return Some(ClassId::new(idx as u32));
                }
            }
            self.word_idx += 1;
            self.bit_idx = 0;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_set_basic() {
        let mut set = ClassSet::new(100);
        assert!(set.is_empty());

        set.insert(ClassId::new(0));
        set.insert(ClassId::new(64));
        set.insert(ClassId::new(99));

        assert_eq!(set.count(), 3);
        assert!(set.contains(ClassId::new(64)));
        assert!(!set.contains(ClassId::new(1)));

        set.remove(ClassId::new(64));
        assert!(!set.contains(ClassId::new(64)));
    }

    #[test]
    fn test_class_set_out_of_range() {
        let mut set = ClassSet::new(10);
        set.insert(ClassId::new(200));
        assert!(set.is_empty());
        assert!(!set.contains(ClassId::new(200)));
    }

    #[test]
    fn test_class_set_iter_and_collect() {
        let set: ClassSet = [3, 70, 5].into_iter().map(ClassId::new).collect();
        let ids: Vec<usize> = set.iter().map(ClassId::index).collect();
        assert_eq!(ids, vec![3, 5, 70]);
        assert_eq!(set.capacity(), 71);
    }
}
