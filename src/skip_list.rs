//! Span-indexed skip list ordered by `(score, key)`.
//!
//! Every level of every node stores a forward link and a `span`: the number
//! of level-0 positions that link jumps over. Summing spans along a search
//! path gives the 1-based rank of where the search stopped, so rank lookups
//! and rank-addressed access are O(log n) on average instead of a level-0
//! scan.
//!
//! # Structure
//!
//! ```text
//! Level 2: HEAD --------------(3)-------------> C -----(2)-----> NULL
//! Level 1: HEAD ----(2)----> B -------(1)-----> C --(1)--> D --(1)--> NULL
//! Level 0: HEAD -(1)-> A -(1)-> B -(1)-> C -(1)-> D -(1)-> E -(0)-> NULL
//!                      ^---------back--------back-------back
//! ```
//!
//! A link to `NULL` carries the number of nodes remaining after its owner,
//! which keeps the insert and delete arithmetic uniform.
//!
//! # Storage
//!
//! Nodes live in an arena and refer to each other by `u32` index. Removed
//! slots go on a free list and are reused by later inserts. Index 0 is the
//! header sentinel, which always has `MAX_LEVEL` levels.
//!
//! # Operations
//!
//! - `insert(score, key)`: O(log n) - pair must not already be present
//! - `delete(score, key)`: O(log n)
//! - `rank(score, key)`: O(log n) - 1-based, 0 when absent
//! - `element_by_rank(rank)`: O(log n)
//! - `first_in_range(spec)` / `last_in_range(spec)`: O(log n)
//! - `delete_range_by_score(spec)` / `delete_range_by_rank(start, end)`:
//!   O(log n + removed)

use std::fmt;

use rand_core::{RngCore, SeedableRng};
use smallvec::{smallvec, SmallVec};
use tracing::trace;

use crate::range::RangeSpec;
use crate::rng::XorShift64;

/// Maximum number of levels. Enough for 2^64 elements at p = 1/4.
pub const MAX_LEVEL: usize = 32;

/// Default promotion probability.
pub const DEFAULT_PROBABILITY: f64 = 0.25;

/// Arena index type.
type Idx = u32;

/// Null index marker.
const NULL: Idx = Idx::MAX;

/// Arena slot of the header sentinel.
const HEAD: Idx = 0;

/// Opaque handle to a node.
///
/// Only valid until the next mutation of the list it came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(Idx);

#[derive(Clone, Copy, Debug)]
struct Level {
    forward: Idx,
    span: usize,
}

const UNLINKED: Level = Level {
    forward: NULL,
    span: 0,
};

struct Node {
    score: i64,
    key: i64,
    /// Level-0 predecessor, `NULL` for the first node.
    backward: Idx,
    levels: SmallVec<[Level; 4]>,
}

impl Node {
    fn new(level: usize, score: i64, key: i64) -> Node {
        return Node {
            score,
            key,
            backward: NULL,
            levels: smallvec![UNLINKED; level],
        };
    }

    /// `(self.score, self.key) < (score, key)`
    fn precedes(&self, score: i64, key: i64) -> bool {
        return self.score < score || (self.score == score && self.key < key);
    }

    /// `(self.score, self.key) <= (score, key)`
    fn precedes_or_eq(&self, score: i64, key: i64) -> bool {
        return self.score < score || (self.score == score && self.key <= key);
    }
}

pub struct SkipList {
    /// Arena of nodes, header at `HEAD`.
    nodes: Vec<Node>,
    /// Last node at level 0.
    tail: Idx,
    /// Number of nodes, not counting the header.
    length: usize,
    /// Number of levels in use, at least 1.
    level: usize,
    /// Removed slots available for reuse.
    free_list: Vec<Idx>,
    /// Cap on drawn levels.
    max_level: usize,
    /// Promotion threshold against the low 16 bits of a draw.
    threshold: u32,
    rng: Box<dyn RngCore + Send>,
}

impl SkipList {
    /// Create an empty list whose levels are drawn from an entropy-seeded
    /// generator.
    pub fn new() -> SkipList {
        return SkipList::with_rng(Box::new(XorShift64::from_entropy()));
    }

    /// Create an empty list drawing levels from `rng`.
    pub fn with_rng(rng: Box<dyn RngCore + Send>) -> SkipList {
        return SkipList::with_params(MAX_LEVEL, DEFAULT_PROBABILITY, rng);
    }

    /// `max_level` is clamped to `1..=MAX_LEVEL` and `probability` should lie
    /// in `(0, 1)`; see [`Config::validate`](crate::config::Config::validate).
    pub fn with_params(
        max_level: usize,
        probability: f64,
        rng: Box<dyn RngCore + Send>,
    ) -> SkipList {
        let mut nodes = Vec::new();
        nodes.push(Node::new(MAX_LEVEL, 0, 0));
        return SkipList {
            nodes,
            tail: NULL,
            length: 0,
            level: 1,
            free_list: Vec::new(),
            max_level: max_level.clamp(1, MAX_LEVEL),
            threshold: (probability * 0xFFFF as f64) as u32,
            rng,
        };
    }

    /// Drop every node and return to the freshly created state. Parameters
    /// and the random source are kept.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(Node::new(MAX_LEVEL, 0, 0));
        self.free_list.clear();
        self.tail = NULL;
        self.length = 0;
        self.level = 1;
    }

    pub fn len(&self) -> usize {
        return self.length;
    }

    pub fn is_empty(&self) -> bool {
        return self.length == 0;
    }

    /// Number of levels currently in use.
    pub fn level(&self) -> usize {
        return self.level;
    }

    // --- Node access helpers ---

    fn node(&self, idx: Idx) -> &Node {
        return &self.nodes[idx as usize];
    }

    fn node_mut(&mut self, idx: Idx) -> &mut Node {
        return &mut self.nodes[idx as usize];
    }

    fn forward(&self, idx: Idx, level: usize) -> Idx {
        return self.node(idx).levels[level].forward;
    }

    fn alloc_node(&mut self, level: usize, score: i64, key: i64) -> Idx {
        if let Some(idx) = self.free_list.pop() {
            *self.node_mut(idx) = Node::new(level, score, key);
            return idx;
        }
        let idx = self.nodes.len() as Idx;
        self.nodes.push(Node::new(level, score, key));
        return idx;
    }

    /// Draw a level in `1..=max_level`, promoting with the configured
    /// probability.
    fn random_level(&mut self) -> usize {
        let mut level = 1;
        while level < self.max_level && (self.rng.next_u32() & 0xFFFF) < self.threshold {
            level += 1;
        }
        return level;
    }

    // --- Handles ---

    pub fn score(&self, id: NodeId) -> i64 {
        return self.node(id.0).score;
    }

    pub fn key(&self, id: NodeId) -> i64 {
        return self.node(id.0).key;
    }

    /// `(score, key)` of a node.
    pub fn entry(&self, id: NodeId) -> (i64, i64) {
        let node = self.node(id.0);
        return (node.score, node.key);
    }

    /// Number of levels the node participates in.
    pub fn height(&self, id: NodeId) -> usize {
        return self.node(id.0).levels.len();
    }

    pub fn first(&self) -> Option<NodeId> {
        return self.handle(self.forward(HEAD, 0));
    }

    pub fn last(&self) -> Option<NodeId> {
        return self.handle(self.tail);
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        return self.handle(self.forward(id.0, 0));
    }

    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        return self.handle(self.node(id.0).backward);
    }

    fn handle(&self, idx: Idx) -> Option<NodeId> {
        if idx == NULL || idx == HEAD {
            return None;
        }
        return Some(NodeId(idx));
    }

    // --- Core operations ---

    /// Insert `(score, key)`. The pair must not already be present.
    pub fn insert(&mut self, score: i64, key: i64) -> NodeId {
        let mut update = [HEAD; MAX_LEVEL];
        let mut rank = [0usize; MAX_LEVEL];

        let mut x = HEAD;
        for i in (0..self.level).rev() {
            rank[i] = if i == self.level - 1 { 0 } else { rank[i + 1] };
            loop {
                let next = self.forward(x, i);
                if next == NULL || !self.node(next).precedes(score, key) {
                    break;
                }
                rank[i] += self.node(x).levels[i].span;
                x = next;
            }
            update[i] = x;
        }

        let level = self.random_level();
        if level > self.level {
            for i in self.level..level {
                rank[i] = 0;
                update[i] = HEAD;
                self.node_mut(HEAD).levels[i].span = self.length;
            }
            trace!(from = self.level, to = level, "skip list level raised");
            self.level = level;
        }

        let x = self.alloc_node(level, score, key);
        for i in 0..level {
            let prev = update[i];
            let old = self.node(prev).levels[i];
            // Positions between `prev` and the new node at this level.
            let covered = rank[0] - rank[i];
            self.node_mut(x).levels[i] = Level {
                forward: old.forward,
                span: old.span - covered,
            };
            self.node_mut(prev).levels[i] = Level {
                forward: x,
                span: covered + 1,
            };
        }

        // Levels above the new node now jump over one more position.
        for i in level..self.level {
            self.node_mut(update[i]).levels[i].span += 1;
        }

        self.node_mut(x).backward = if update[0] == HEAD { NULL } else { update[0] };
        let next = self.forward(x, 0);
        if next != NULL {
            self.node_mut(next).backward = x;
        } else {
            self.tail = x;
        }

        self.length += 1;
        return NodeId(x);
    }

    /// Unlink `x`, given the last node before it at every active level.
    fn delete_node(&mut self, x: Idx, update: &[Idx; MAX_LEVEL]) {
        for i in 0..self.level {
            let prev = update[i];
            if self.forward(prev, i) == x {
                let removed = self.node(x).levels[i];
                let link = &mut self.node_mut(prev).levels[i];
                link.span = link.span + removed.span - 1;
                link.forward = removed.forward;
            } else {
                self.node_mut(prev).levels[i].span -= 1;
            }
        }

        let next = self.forward(x, 0);
        let backward = self.node(x).backward;
        if next != NULL {
            self.node_mut(next).backward = backward;
        } else {
            self.tail = backward;
        }

        while self.level > 1 && self.forward(HEAD, self.level - 1) == NULL {
            self.level -= 1;
        }

        self.length -= 1;
        self.free_list.push(x);
    }

    /// Remove `(score, key)`. Returns whether it was present.
    pub fn delete(&mut self, score: i64, key: i64) -> bool {
        let mut update = [HEAD; MAX_LEVEL];

        let mut x = HEAD;
        for i in (0..self.level).rev() {
            loop {
                let next = self.forward(x, i);
                if next == NULL || !self.node(next).precedes(score, key) {
                    break;
                }
                x = next;
            }
            update[i] = x;
        }

        // Several keys may share a score, so both must match.
        let x = self.forward(x, 0);
        if x != NULL && self.node(x).score == score && self.node(x).key == key {
            self.delete_node(x, &update);
            return true;
        }
        return false;
    }

    /// 1-based rank of `(score, key)`, or 0 if absent.
    pub fn rank(&self, score: i64, key: i64) -> usize {
        let mut rank = 0;
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            // `<=` so the target itself is counted.
            loop {
                let next = self.forward(x, i);
                if next == NULL || !self.node(next).precedes_or_eq(score, key) {
                    break;
                }
                rank += self.node(x).levels[i].span;
                x = next;
            }
            if x != HEAD && self.node(x).key == key && self.node(x).score == score {
                return rank;
            }
        }
        return 0;
    }

    /// Node at the 1-based `rank`.
    pub fn element_by_rank(&self, rank: usize) -> Option<NodeId> {
        if rank == 0 || rank > self.length {
            return None;
        }
        let mut traversed = 0;
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            loop {
                let link = self.node(x).levels[i];
                if link.forward == NULL || traversed + link.span > rank {
                    break;
                }
                traversed += link.span;
                x = link.forward;
            }
            if traversed == rank {
                return self.handle(x);
            }
        }
        return None;
    }

    /// Whether any node could fall inside `spec`. O(1).
    fn is_in_range(&self, spec: &RangeSpec) -> bool {
        if spec.is_empty() {
            return false;
        }
        if self.tail == NULL || !spec.gte_min(self.node(self.tail).score) {
            return false;
        }
        let first = self.forward(HEAD, 0);
        if first == NULL || !spec.lte_max(self.node(first).score) {
            return false;
        }
        return true;
    }

    /// Lowest-ordered node whose score is inside `spec`.
    pub fn first_in_range(&self, spec: &RangeSpec) -> Option<NodeId> {
        if !self.is_in_range(spec) {
            return None;
        }

        let mut x = HEAD;
        for i in (0..self.level).rev() {
            loop {
                let next = self.forward(x, i);
                if next == NULL || spec.gte_min(self.node(next).score) {
                    break;
                }
                x = next;
            }
        }

        // Not null: the tail passed the lower bound.
        let x = self.forward(x, 0);
        if !spec.lte_max(self.node(x).score) {
            return None;
        }
        return self.handle(x);
    }

    /// Highest-ordered node whose score is inside `spec`.
    pub fn last_in_range(&self, spec: &RangeSpec) -> Option<NodeId> {
        if !self.is_in_range(spec) {
            return None;
        }

        let mut x = HEAD;
        for i in (0..self.level).rev() {
            loop {
                let next = self.forward(x, i);
                if next == NULL || !spec.lte_max(self.node(next).score) {
                    break;
                }
                x = next;
            }
        }

        // Not the header: the first node passed the upper bound.
        if !spec.gte_min(self.node(x).score) {
            return None;
        }
        return self.handle(x);
    }

    /// Remove every node whose score is inside `spec`, reporting each
    /// `(score, key)` to `on_removed`. Returns the number removed.
    pub fn delete_range_by_score(
        &mut self,
        spec: &RangeSpec,
        mut on_removed: impl FnMut(i64, i64),
    ) -> usize {
        if spec.is_empty() {
            return 0;
        }

        let mut update = [HEAD; MAX_LEVEL];
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            loop {
                let next = self.forward(x, i);
                if next == NULL || spec.gte_min(self.node(next).score) {
                    break;
                }
                x = next;
            }
            update[i] = x;
        }

        let mut removed = 0;
        let mut x = self.forward(x, 0);
        while x != NULL && spec.lte_max(self.node(x).score) {
            let next = self.forward(x, 0);
            let (score, key) = (self.node(x).score, self.node(x).key);
            self.delete_node(x, &update);
            on_removed(score, key);
            removed += 1;
            x = next;
        }
        return removed;
    }

    /// Remove nodes ranked `start..=end` (1-based), reporting each
    /// `(score, key)` to `on_removed`. Returns the number removed.
    pub fn delete_range_by_rank(
        &mut self,
        start: usize,
        end: usize,
        mut on_removed: impl FnMut(i64, i64),
    ) -> usize {
        let start = start.max(1);
        if start > end {
            return 0;
        }

        let mut update = [HEAD; MAX_LEVEL];
        let mut traversed = 0;
        let mut x = HEAD;
        for i in (0..self.level).rev() {
            loop {
                let link = self.node(x).levels[i];
                if link.forward == NULL || traversed + link.span >= start {
                    break;
                }
                traversed += link.span;
                x = link.forward;
            }
            update[i] = x;
        }

        // Count the start node itself.
        traversed += 1;
        let mut removed = 0;
        let mut x = self.forward(x, 0);
        while x != NULL && traversed <= end {
            let next = self.forward(x, 0);
            let (score, key) = (self.node(x).score, self.node(x).key);
            self.delete_node(x, &update);
            on_removed(score, key);
            removed += 1;
            traversed += 1;
            x = next;
        }
        return removed;
    }

    // --- Iteration ---

    /// Level-0 iterator over `(score, key)` in ascending order.
    pub fn iter(&self) -> Iter<'_> {
        return Iter {
            list: self,
            front: self.forward(HEAD, 0),
            back: self.tail,
        };
    }

    /// Iterate from `id` (inclusive) to the tail.
    pub fn iter_from(&self, id: NodeId) -> Iter<'_> {
        return Iter {
            list: self,
            front: id.0,
            back: self.tail,
        };
    }

    /// Iterate from the first node to `id` (inclusive). Reverse it to walk
    /// backwards from `id`.
    pub fn iter_until(&self, id: NodeId) -> Iter<'_> {
        return Iter {
            list: self,
            front: self.forward(HEAD, 0),
            back: id.0,
        };
    }

    // --- Invariant checking ---

    /// Panic if the structure is inconsistent: ordering, back links, tail,
    /// length, active level count, or any span.
    pub fn check_invariants(&self) {
        // Level 0: order, back links, tail, length.
        let mut position = vec![0usize; self.nodes.len()];
        let mut count = 0usize;
        let mut prev = NULL;
        let mut idx = self.forward(HEAD, 0);
        while idx != NULL {
            let node = self.node(idx);
            count += 1;
            position[idx as usize] = count;
            assert!(
                !node.levels.is_empty() && node.levels.len() <= self.max_level,
                "INVARIANT VIOLATED: node {} has {} levels",
                idx,
                node.levels.len()
            );
            assert_eq!(
                node.backward, prev,
                "INVARIANT VIOLATED: back link of node {} is {}, expected {}",
                idx, node.backward, prev
            );
            if prev != NULL {
                let p = self.node(prev);
                assert!(
                    p.precedes(node.score, node.key),
                    "INVARIANT VIOLATED: ({}, {}) not before ({}, {})",
                    p.score,
                    p.key,
                    node.score,
                    node.key
                );
            }
            prev = idx;
            idx = node.levels[0].forward;
        }
        assert_eq!(
            count, self.length,
            "INVARIANT VIOLATED: level 0 has {} nodes, length={}",
            count, self.length
        );
        assert_eq!(self.tail, prev, "INVARIANT VIOLATED: tail is stale");

        // Active levels.
        assert!(self.level >= 1 && self.level <= MAX_LEVEL);
        if self.level > 1 {
            assert_ne!(
                self.forward(HEAD, self.level - 1),
                NULL,
                "INVARIANT VIOLATED: top level {} is empty",
                self.level
            );
        }
        for i in self.level..MAX_LEVEL {
            assert_eq!(
                self.forward(HEAD, i),
                NULL,
                "INVARIANT VIOLATED: header links at unused level {}",
                i
            );
        }

        // Spans: each hop advances by exactly its span, and a hop to NULL
        // carries the count of remaining nodes.
        for i in 0..self.level {
            let mut x = HEAD;
            let mut pos = 0usize;
            loop {
                let link = self.node(x).levels[i];
                if link.forward == NULL {
                    assert_eq!(
                        link.span,
                        self.length - pos,
                        "INVARIANT VIOLATED: tail span at level {} from position {}",
                        i,
                        pos
                    );
                    break;
                }
                let next_pos = position[link.forward as usize];
                assert_eq!(
                    pos + link.span,
                    next_pos,
                    "INVARIANT VIOLATED: span at level {} from position {}",
                    i,
                    pos
                );
                x = link.forward;
                pos = next_pos;
            }
        }
    }
}

impl Default for SkipList {
    fn default() -> Self {
        return SkipList::new();
    }
}

impl fmt::Debug for SkipList {
    /// One line per active level, top first, listing `key:score` per node.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.level).rev() {
            write!(f, "level {}:", i)?;
            let mut x = self.forward(HEAD, i);
            while x != NULL {
                let node = self.node(x);
                write!(f, " [{}:{}]", node.key, node.score)?;
                x = node.levels[i].forward;
            }
            writeln!(f)?;
        }
        return Ok(());
    }
}

/// Double-ended level-0 iterator yielding `(score, key)`.
pub struct Iter<'a> {
    list: &'a SkipList,
    front: Idx,
    back: Idx,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (i64, i64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == NULL {
            return None;
        }
        let node = self.list.node(self.front);
        if self.front == self.back {
            self.front = NULL;
            self.back = NULL;
        } else {
            self.front = node.levels[0].forward;
        }
        return Some((node.score, node.key));
    }
}

impl<'a> DoubleEndedIterator for Iter<'a> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.back == NULL {
            return None;
        }
        let node = self.list.node(self.back);
        if self.front == self.back {
            self.front = NULL;
            self.back = NULL;
        } else {
            self.back = node.backward;
        }
        return Some((node.score, node.key));
    }
}
