//! AVL-balanced ordered index keyed by town name.
//!
//! Records are stored in a slot arena and addressed by [`RecordId`]. Tree nodes carry only the key
//! and the id of their record, so restructuring the tree (rotations, or moving the in-order
//! successor into a deleted node) never changes which id a record is reachable under.

use std::cmp::Ordering;
use std::fmt;
use std::io;

use crate::error::{CatalogError, Result};
use crate::persist;
use crate::record::{Town, TownUpdate};

/// Stable handle to a record stored in an [`OrderedIndex`].
///
/// Ids stay valid until the record is removed; a removed id may be handed out again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(u32);

impl RecordId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Id for arena slot `index`; an index has at most `u32::MAX + 1` slots.
    fn from_index(index: usize) -> Result<Self> {
        u32::try_from(index)
            .map(RecordId)
            .map_err(|_| CatalogError::ArenaExhausted)
    }
}

type Link = Option<Box<Node>>;

#[derive(Clone)]
struct Node {
    key: String,
    id: RecordId,
    /// Subtree height; a leaf is 1.
    height: u32,
    left: Link,
    right: Link,
}

impl Node {
    fn leaf(key: String, id: RecordId) -> Box<Self> {
        Box::new(Self {
            key,
            id,
            height: 1,
            left: None,
            right: None,
        })
    }

    #[inline]
    fn update_height(&mut self) {
        self.height = 1 + height(&self.left).max(height(&self.right));
    }

    #[inline]
    fn balance(&self) -> i64 {
        i64::from(height(&self.left)) - i64::from(height(&self.right))
    }
}

#[inline]
fn height(link: &Link) -> u32 {
    link.as_ref().map_or(0, |n| n.height)
}

#[inline]
fn balance_of(link: &Link) -> i64 {
    link.as_ref().map_or(0, |n| n.balance())
}

// =============================================================================
// Rotations
// =============================================================================

fn rotate_right(mut y: Box<Node>) -> Box<Node> {
    let Some(mut x) = y.left.take() else {
        return y;
    };
    y.left = x.right.take();
    y.update_height();
    x.right = Some(y);
    x.update_height();
    x
}

fn rotate_left(mut x: Box<Node>) -> Box<Node> {
    let Some(mut y) = x.right.take() else {
        return x;
    };
    x.right = y.left.take();
    x.update_height();
    y.left = Some(x);
    y.update_height();
    y
}

/// Restore balance on the path of a freshly inserted `key`.
///
/// The case is chosen by comparing the new key with the heavy child's key.
fn rebalance_insert(mut node: Box<Node>, key: &str) -> Box<Node> {
    node.update_height();
    let balance = node.balance();

    if balance > 1 {
        if node.left.as_ref().is_some_and(|l| key > l.key.as_str()) {
            node.left = node.left.take().map(rotate_left);
        }
        return rotate_right(node);
    }
    if balance < -1 {
        if node.right.as_ref().is_some_and(|r| key < r.key.as_str()) {
            node.right = node.right.take().map(rotate_right);
        }
        return rotate_left(node);
    }
    node
}

/// Restore balance after a removal below `node`.
///
/// The case is chosen by the heavy child's own balance factor.
fn rebalance_remove(mut node: Box<Node>) -> Box<Node> {
    node.update_height();
    let balance = node.balance();

    if balance > 1 {
        if balance_of(&node.left) < 0 {
            node.left = node.left.take().map(rotate_left);
        }
        return rotate_right(node);
    }
    if balance < -1 {
        if balance_of(&node.right) > 0 {
            node.right = node.right.take().map(rotate_right);
        }
        return rotate_left(node);
    }
    node
}

// =============================================================================
// Recursive insert/remove
// =============================================================================

fn insert_at(link: &mut Link, key: &str, id: RecordId) -> bool {
    let Some(mut node) = link.take() else {
        *link = Some(Node::leaf(key.to_owned(), id));
        return true;
    };

    let inserted = match key.cmp(node.key.as_str()) {
        Ordering::Less => insert_at(&mut node.left, key, id),
        Ordering::Greater => insert_at(&mut node.right, key, id),
        Ordering::Equal => false,
    };

    *link = Some(if inserted {
        rebalance_insert(node, key)
    } else {
        node
    });
    inserted
}

fn leftmost(mut node: &Node) -> &Node {
    while let Some(left) = node.left.as_deref() {
        node = left;
    }
    node
}

/// Remove `key` from the subtree at `link`, returning the id of its record.
fn remove_at(link: &mut Link, key: &str) -> Option<RecordId> {
    let mut node = link.take()?;

    let removed = match key.cmp(node.key.as_str()) {
        Ordering::Less => remove_at(&mut node.left, key),
        Ordering::Greater => remove_at(&mut node.right, key),
        Ordering::Equal => {
            let id = node.id;
            if node.left.is_none() || node.right.is_none() {
                // Zero or one child: splice the node out.
                *link = node.left.take().or_else(|| node.right.take());
                return Some(id);
            }

            // Two children: take over the in-order successor's payload, then drop the successor.
            let successor = node.right.as_deref().map(|right| {
                let s = leftmost(right);
                (s.key.clone(), s.id)
            });
            if let Some((succ_key, succ_id)) = successor {
                remove_at(&mut node.right, &succ_key);
                node.key = succ_key;
                node.id = succ_id;
            }
            Some(id)
        }
    };

    *link = Some(if removed.is_some() {
        rebalance_remove(node)
    } else {
        node
    });
    removed
}

// =============================================================================
// OrderedIndex
// =============================================================================

/// Alphabetically ordered index owning every [`Town`] in the catalog.
///
/// - O(log n) insert, find and remove, kept by the AVL height-balance invariant
/// - in-order iteration yields records in ascending key order
/// - records are stored in an arena so ids survive tree restructuring
#[derive(Clone, Default)]
pub struct OrderedIndex {
    root: Link,
    /// Record arena; `None` marks a free slot.
    records: Vec<Option<Town>>,
    /// Free arena slots, reused before the arena grows.
    free: Vec<RecordId>,
    count: usize,
}

impl OrderedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Height of the tree; 0 when empty.
    pub fn height(&self) -> usize {
        height(&self.root) as usize
    }

    pub fn clear(&mut self) {
        self.root = None;
        self.records.clear();
        self.free.clear();
        self.count = 0;
    }

    /// Insert `town` under its own name.
    ///
    /// An existing key leaves the index untouched and reports [`CatalogError::DuplicateKey`].
    pub fn insert(&mut self, town: Town) -> Result<RecordId> {
        if self.contains_key(&town.town) {
            return Err(CatalogError::DuplicateKey(town.town));
        }

        let key = town.town.clone();
        let id = self.alloc(town)?;
        let inserted = insert_at(&mut self.root, &key, id);
        debug_assert!(inserted, "key presence was checked before descending");
        self.count += 1;
        Ok(id)
    }

    pub fn find(&self, key: &str) -> Option<&Town> {
        self.id_of(key).and_then(|id| self.get(id))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.id_of(key).is_some()
    }

    /// Id of the record stored under `key`.
    pub fn id_of(&self, key: &str) -> Option<RecordId> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match key.cmp(node.key.as_str()) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(node.id),
            };
        }
        None
    }

    /// Resolve an id handed out by [`insert`](Self::insert).
    pub fn get(&self, id: RecordId) -> Option<&Town> {
        self.records.get(id.index()).and_then(Option::as_ref)
    }

    /// Overwrite the population, elevation and municipality of `key` in place.
    pub fn update(&mut self, key: &str, update: TownUpdate) -> Result<&Town> {
        let id = self
            .id_of(key)
            .ok_or_else(|| CatalogError::NotFound(key.to_owned()))?;
        match self.records.get_mut(id.index()).and_then(Option::as_mut) {
            Some(town) => {
                town.apply(update);
                Ok(town)
            }
            None => Err(CatalogError::NotFound(key.to_owned())),
        }
    }

    /// Swap in `town` for the record stored under the same name, returning the old record.
    ///
    /// The record keeps its id and its place in the tree.
    pub fn replace(&mut self, town: Town) -> Result<Town> {
        let Some(id) = self.id_of(&town.town) else {
            return Err(CatalogError::NotFound(town.town));
        };
        match self.records.get_mut(id.index()).and_then(Option::as_mut) {
            Some(slot) => Ok(std::mem::replace(slot, town)),
            None => Err(CatalogError::NotFound(town.town)),
        }
    }

    /// Remove `key`, returning its record.
    pub fn remove(&mut self, key: &str) -> Result<Town> {
        let id = remove_at(&mut self.root, key)
            .ok_or_else(|| CatalogError::NotFound(key.to_owned()))?;
        self.count -= 1;
        self.free.push(id);
        self.records
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or_else(|| CatalogError::NotFound(key.to_owned()))
    }

    /// Records in ascending key order.
    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter {
            index: self,
            stack: Vec::with_capacity(self.height()),
        };
        iter.push_left(self.root.as_deref());
        iter
    }

    /// Records matching `predicate`, in ascending key order.
    pub fn filter<'a, P>(&'a self, mut predicate: P) -> impl Iterator<Item = &'a Town> + 'a
    where
        P: FnMut(&Town) -> bool + 'a,
    {
        self.iter().filter(move |town| predicate(*town))
    }

    /// Records with a population strictly greater than `threshold`.
    pub fn above_population(&self, threshold: u32) -> impl Iterator<Item = &Town> + '_ {
        self.filter(move |town| town.population > threshold)
    }

    /// Records whose municipality flag equals `flag` exactly (case-sensitive).
    pub fn with_municipality<'a>(&'a self, flag: &'a str) -> impl Iterator<Item = &'a Town> + 'a {
        self.filter(move |town| town.municipality == flag)
    }

    /// Write every record in the persisted line format, in ascending key order.
    pub fn serialize<W: io::Write>(&self, sink: W) -> io::Result<()> {
        persist::write_records(self.iter(), sink)
    }

    fn alloc(&mut self, town: Town) -> Result<RecordId> {
        if let Some(id) = self.free.pop() {
            self.records[id.index()] = Some(town);
            return Ok(id);
        }
        let id = RecordId::from_index(self.records.len())?;
        self.records.push(Some(town));
        Ok(id)
    }
}

#[cfg(test)]
impl OrderedIndex {
    /// Walk the whole tree checking order, heights, balance and arena consistency.
    pub(crate) fn check_invariants(&self) {
        fn walk<'a>(
            link: &'a Link,
            index: &OrderedIndex,
            lower: Option<&'a str>,
            upper: Option<&'a str>,
            seen: &mut usize,
        ) -> u32 {
            let Some(node) = link.as_deref() else {
                return 0;
            };
            if let Some(lower) = lower {
                assert!(node.key.as_str() > lower, "key {:?} not above {lower:?}", node.key);
            }
            if let Some(upper) = upper {
                assert!(node.key.as_str() < upper, "key {:?} not below {upper:?}", node.key);
            }
            let town = index.get(node.id).expect("node must reference a live record");
            assert_eq!(town.town, node.key, "record key must match node key");

            *seen += 1;
            let lh = walk(&node.left, index, lower, Some(node.key.as_str()), seen);
            let rh = walk(&node.right, index, Some(node.key.as_str()), upper, seen);
            assert!(
                (i64::from(lh) - i64::from(rh)).abs() <= 1,
                "node {:?} unbalanced: left {lh}, right {rh}",
                node.key
            );
            assert_eq!(node.height, 1 + lh.max(rh), "stale height at {:?}", node.key);
            node.height
        }

        let mut seen = 0;
        walk(&self.root, self, None, None, &mut seen);
        assert_eq!(seen, self.count, "reachable nodes must match len");
        let live = self.records.iter().filter(|r| r.is_some()).count();
        assert_eq!(live, self.count, "live arena slots must match len");
        assert_eq!(live + self.free.len(), self.records.len());
    }
}

impl fmt::Debug for OrderedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|t| (&t.town, t)))
            .finish()
    }
}

impl<'a> IntoIterator for &'a OrderedIndex {
    type Item = &'a Town;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over an [`OrderedIndex`].
pub struct Iter<'a> {
    index: &'a OrderedIndex,
    /// Nodes whose left subtree has been visited but which are not yet yielded.
    stack: Vec<&'a Node>,
}

impl<'a> Iter<'a> {
    fn push_left(&mut self, mut link: Option<&'a Node>) {
        while let Some(node) = link {
            self.stack.push(node);
            link = node.left.as_deref();
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Town;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            self.push_left(node.right.as_deref());
            if let Some(town) = self.index.get(node.id) {
                return Some(town);
            }
        }
        None
    }
}
