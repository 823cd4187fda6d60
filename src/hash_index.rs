//! Fixed-capacity open-addressed hash index with linear probing.
//!
//! The index maps a town name to the [`RecordId`] of its record in the
//! [`OrderedIndex`](crate::OrderedIndex); it never owns or reads the record itself.
//! Capacity is chosen at construction and never grows.

use std::fmt;

use crate::avl::RecordId;
use crate::error::{CatalogError, Result};

/// Slot count used when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 10;

/// Number of leading key bytes that feed the hash.
const HASHED_PREFIX_LEN: usize = 5;
const HASH_BASE: u64 = 31;

/// Start slot for `key` in a table of `capacity` slots.
///
/// Polynomial hash (base 31) over at most the first 5 bytes, accumulated with wrapping `u64`
/// arithmetic, reduced modulo `capacity`. Keys that agree on their first 5 bytes always share a
/// start slot.
pub fn hash_key(key: &str, capacity: usize) -> usize {
    let hash = key
        .bytes()
        .take(HASHED_PREFIX_LEN)
        .fold(0u64, |acc, b| acc.wrapping_mul(HASH_BASE).wrapping_add(u64::from(b)));
    (hash % capacity as u64) as usize
}

/// An occupied slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub town: String,
    pub record: RecordId,
}

/// Result of a successful [`HashIndex::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub slot: usize,
    pub record: RecordId,
    /// Occupied, non-matching slots visited before the match.
    pub collisions: usize,
}

/// Occupancy snapshot from [`HashIndex::stats`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HashStats {
    pub capacity: usize,
    pub occupied: usize,
    pub load_factor: f64,
}

impl fmt::Display for HashStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Size of hash table: {}\nLoad factor: {:.2}",
            self.capacity, self.load_factor
        )
    }
}

#[derive(Debug, Clone)]
pub struct HashIndex {
    slots: Box<[Option<Entry>]>,
}

impl HashIndex {
    pub fn new() -> Self {
        Self {
            slots: vec![None; DEFAULT_CAPACITY].into_boxed_slice(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CatalogError::InvalidCapacity);
        }
        Ok(Self {
            slots: vec![None; capacity].into_boxed_slice(),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Occupied slot count (full scan).
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }

    /// Slot indices in probe order for `key`: the start slot, then each following slot once.
    fn probe_sequence(&self, key: &str) -> impl Iterator<Item = usize> {
        let capacity = self.capacity();
        let start = hash_key(key, capacity);
        (0..capacity).map(move |step| (start + step) % capacity)
    }

    /// Place `key` in the first empty slot of its probe sequence and return that slot.
    ///
    /// Duplicate keys are not detected here; a second insert of the same key takes another slot.
    pub fn insert(&mut self, key: &str, record: RecordId) -> Result<usize> {
        let slot = self
            .probe_sequence(key)
            .find(|&slot| self.slots[slot].is_none())
            .ok_or(CatalogError::TableFull {
                capacity: self.capacity(),
            })?;
        self.slots[slot] = Some(Entry {
            town: key.to_owned(),
            record,
        });
        Ok(slot)
    }

    /// Locate `key`, counting the occupied slots skipped on the way.
    ///
    /// The whole cycle is probed; empty slots are passed over rather than ending the search.
    pub fn find(&self, key: &str) -> Result<Probe> {
        let mut collisions = 0;
        for slot in self.probe_sequence(key) {
            match &self.slots[slot] {
                Some(entry) if entry.town == key => {
                    return Ok(Probe {
                        slot,
                        record: entry.record,
                        collisions,
                    })
                }
                Some(_) => collisions += 1,
                None => {}
            }
        }
        Err(CatalogError::NotFound(key.to_owned()))
    }

    /// Clear the first slot holding `key` and return its record id.
    pub fn remove(&mut self, key: &str) -> Result<RecordId> {
        let probe = self.find(key)?;
        self.slots[probe.slot] = None;
        Ok(probe.record)
    }

    /// Every slot in index order.
    pub fn slots(&self) -> impl Iterator<Item = (usize, Option<&Entry>)> + '_ {
        self.slots.iter().enumerate().map(|(i, s)| (i, s.as_ref()))
    }

    pub fn stats(&self) -> HashStats {
        let occupied = self.len();
        HashStats {
            capacity: self.capacity(),
            occupied,
            load_factor: occupied as f64 / self.capacity() as f64,
        }
    }
}

impl Default for HashIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HashIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.slots() {
            match entry {
                Some(entry) => writeln!(f, "Index {i}: {}", entry.town)?,
                None => writeln!(f, "Index {i}: Empty")?,
            }
        }
        Ok(())
    }
}
