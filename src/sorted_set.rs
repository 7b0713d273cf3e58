//! Thread-safe ordered key-score set.
//!
//! A [`SortedSet`] pairs a [`SkipList`] ordered by `(score, key)` with a hash
//! index from key to score. The index answers membership and score lookups in
//! O(1) and supplies the current score needed to locate a key's node before
//! it is moved or removed. Both structures sit behind one mutex, so no caller
//! ever sees them disagree.
//!
//! Ranks are 1-based. Every rank-taking operation accepts a `reverse` flag;
//! reverse rank `r` is forward rank `len + 1 - r`, i.e. rank 1 is the highest
//! `(score, key)`.
//!
//! # Example
//!
//! ```
//! use ranked::SortedSet;
//!
//! let board = SortedSet::with_seed(1);
//! board.add(10, 100);
//! board.add(20, 200);
//! board.add(10, 50);
//!
//! assert_eq!(board.len(), 3);
//! assert_eq!(board.rank(100, false), Some(2));
//! assert_eq!(board.by_rank(1, true).map(|r| r.key), Some(200));
//! ```

use std::fmt;

use parking_lot::Mutex;
use rand_core::{RngCore, SeedableRng};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::range::{RangeSpec, Record};
use crate::rng::XorShift64;
use crate::skip_list::SkipList;

/// The skip list and its membership index, always mutated together.
struct Inner {
    list: SkipList,
    /// key -> score
    index: FxHashMap<i64, i64>,
}

impl Inner {
    fn new(list: SkipList) -> Inner {
        return Inner {
            list,
            index: FxHashMap::default(),
        };
    }

    fn add(&mut self, score: i64, key: i64) {
        if let Some(old) = self.index.insert(key, score) {
            if old == score {
                return;
            }
            self.list.delete(old, key);
        }
        self.list.insert(score, key);
    }

    fn remove(&mut self, key: i64) -> bool {
        let Some(score) = self.index.remove(&key) else {
            return false;
        };
        self.list.delete(score, key);
        return true;
    }

    fn forward_rank(&self, key: i64) -> Option<usize> {
        let score = *self.index.get(&key)?;
        return Some(self.list.rank(score, key));
    }
}

/// Convert between forward and reverse ranks. The mapping is its own inverse.
fn flip(rank: usize, len: usize, reverse: bool) -> usize {
    if reverse {
        return len + 1 - rank;
    }
    return rank;
}

/// An ordered set of unique `i64` keys, each with an `i64` score.
///
/// All operations take `&self` and serialize on an internal lock, so a set
/// can be shared between threads behind an `Arc`.
pub struct SortedSet {
    inner: Mutex<Inner>,
}

impl SortedSet {
    /// Create an empty set with default parameters, seeding level draws from
    /// OS entropy.
    pub fn new() -> SortedSet {
        return SortedSet::from_list(SkipList::new());
    }

    /// Create an empty set whose level draws are reproducible.
    pub fn with_seed(seed: u64) -> SortedSet {
        return SortedSet::with_rng(XorShift64::new(seed));
    }

    /// Create an empty set drawing levels from `rng`.
    pub fn with_rng(rng: impl RngCore + Send + 'static) -> SortedSet {
        return SortedSet::from_list(SkipList::with_rng(Box::new(rng)));
    }

    pub fn with_config(config: &Config) -> Result<SortedSet> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => XorShift64::new(seed),
            None => XorShift64::from_entropy(),
        };
        let list = SkipList::with_params(config.max_level, config.probability, Box::new(rng));
        return Ok(SortedSet::from_list(list));
    }

    fn from_list(list: SkipList) -> SortedSet {
        return SortedSet {
            inner: Mutex::new(Inner::new(list)),
        };
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        return self.inner.lock().index.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.len() == 0;
    }

    pub fn contains(&self, key: i64) -> bool {
        return self.inner.lock().index.contains_key(&key);
    }

    /// Current score of `key`.
    pub fn score(&self, key: i64) -> Option<i64> {
        return self.inner.lock().index.get(&key).copied();
    }

    /// Insert `key` with `score`, moving it if it is already a member.
    pub fn add(&self, score: i64, key: i64) {
        self.inner.lock().add(score, key);
    }

    /// Apply [`add`](Self::add) to each `(score, key)` in order under a
    /// single lock acquisition. Later pairs win for repeated keys.
    pub fn add_all<I>(&self, records: I)
    where
        I: IntoIterator<Item = (i64, i64)>,
    {
        let mut inner = self.inner.lock();
        let mut count = 0usize;
        for (score, key) in records {
            inner.add(score, key);
            count += 1;
        }
        debug!(count, len = inner.index.len(), "batch add");
    }

    /// Remove `key`. Returns whether it was a member.
    pub fn remove(&self, key: i64) -> bool {
        return self.inner.lock().remove(key);
    }

    /// Remove every member whose score lies in `spec`. Returns the number
    /// removed.
    pub fn remove_by_score(&self, spec: &RangeSpec) -> usize {
        let mut guard = self.inner.lock();
        let Inner { list, index } = &mut *guard;
        let removed = list.delete_range_by_score(spec, |_, key| {
            index.remove(&key);
        });
        debug!(?spec, removed, "remove by score");
        return removed;
    }

    /// Remove members ranked `start..=end` (1-based, inclusive), counted from
    /// the top when `reverse`. Ranks are clamped to the set; an inverted
    /// interval removes nothing. Returns the number removed.
    pub fn remove_by_rank(&self, start: usize, end: usize, reverse: bool) -> usize {
        let mut guard = self.inner.lock();
        let len = guard.list.len();
        let start = start.max(1);
        let end = end.min(len);
        if start > end {
            return 0;
        }
        let (from, to) = if reverse {
            (len + 1 - end, len + 1 - start)
        } else {
            (start, end)
        };
        let Inner { list, index } = &mut *guard;
        let removed = list.delete_range_by_rank(from, to, |_, key| {
            index.remove(&key);
        });
        debug!(from, to, removed, "remove by rank");
        return removed;
    }

    /// 1-based rank of `key`, or `None` if it is not a member.
    pub fn rank(&self, key: i64, reverse: bool) -> Option<usize> {
        let inner = self.inner.lock();
        let rank = inner.forward_rank(key)?;
        return Some(flip(rank, inner.list.len(), reverse));
    }

    /// Member at `rank`. The record carries `rank` as given.
    pub fn by_rank(&self, rank: usize, reverse: bool) -> Option<Record> {
        let inner = self.inner.lock();
        let len = inner.list.len();
        if rank == 0 || rank > len {
            return None;
        }
        let id = inner.list.element_by_rank(flip(rank, len, reverse))?;
        let (score, key) = inner.list.entry(id);
        return Some(Record::new(score, key, rank));
    }

    /// Members ranked `begin..=end`, in rank order for the chosen direction.
    ///
    /// `begin` is raised to 1 and `end` lowered to `len()`. Returns an empty
    /// vec when `begin > end`, before or after clamping.
    pub fn range_by_rank(&self, begin: usize, end: usize, reverse: bool) -> Vec<Record> {
        if begin > end {
            return Vec::new();
        }

        let inner = self.inner.lock();
        let len = inner.list.len();
        let begin = begin.max(1);
        let end = end.min(len);
        if begin > end {
            return Vec::new();
        }

        // Always walk forward from the lowest forward rank in the window.
        let start = if reverse { len + 1 - end } else { begin };
        let Some(first) = inner.list.element_by_rank(start) else {
            return Vec::new();
        };
        let mut records: Vec<Record> = inner
            .list
            .iter_from(first)
            .take(end - begin + 1)
            .enumerate()
            .map(|(offset, (score, key))| Record::new(score, key, flip(start + offset, len, reverse)))
            .collect();
        drop(inner);

        if reverse {
            records.reverse();
        }
        return records;
    }

    /// Members with `begin <= score <= end`, ascending, or descending when
    /// `reverse`. Returns an empty vec when `begin > end`.
    pub fn range_by_score(&self, begin: i64, end: i64, reverse: bool) -> Vec<Record> {
        if begin > end {
            return Vec::new();
        }
        return self.range_by_spec(&RangeSpec::closed(begin, end), reverse);
    }

    /// Members whose score lies in `spec`, ascending, or descending when
    /// `reverse`.
    ///
    /// Ranks are derived from one rank lookup on the boundary node and then
    /// stepped by one per record.
    pub fn range_by_spec(&self, spec: &RangeSpec, reverse: bool) -> Vec<Record> {
        let inner = self.inner.lock();
        let list = &inner.list;
        let len = list.len();

        if reverse {
            let Some(last) = list.last_in_range(spec) else {
                return Vec::new();
            };
            let (score, key) = list.entry(last);
            let top = list.rank(score, key);
            return list
                .iter_until(last)
                .rev()
                .take_while(|(score, _)| spec.gte_min(*score))
                .enumerate()
                .map(|(offset, (score, key))| Record::new(score, key, flip(top - offset, len, true)))
                .collect();
        }

        let Some(first) = list.first_in_range(spec) else {
            return Vec::new();
        };
        let (score, key) = list.entry(first);
        let bottom = list.rank(score, key);
        return list
            .iter_from(first)
            .take_while(|(score, _)| spec.lte_max(*score))
            .enumerate()
            .map(|(offset, (score, key))| Record::new(score, key, bottom + offset))
            .collect();
    }

    /// Number of members whose score lies in `spec`. O(log n).
    pub fn count_by_score(&self, spec: &RangeSpec) -> usize {
        let inner = self.inner.lock();
        let list = &inner.list;
        let (Some(first), Some(last)) = (list.first_in_range(spec), list.last_in_range(spec))
        else {
            return 0;
        };
        let (first_score, first_key) = list.entry(first);
        let (last_score, last_key) = list.entry(last);
        return list.rank(last_score, last_key) - list.rank(first_score, first_key) + 1;
    }

    /// Lowest-ordered member, with forward rank 1.
    pub fn first(&self) -> Option<Record> {
        let inner = self.inner.lock();
        let (score, key) = inner.list.entry(inner.list.first()?);
        return Some(Record::new(score, key, 1));
    }

    /// Highest-ordered member, with forward rank `len()`.
    pub fn last(&self) -> Option<Record> {
        let inner = self.inner.lock();
        let (score, key) = inner.list.entry(inner.list.last()?);
        return Some(Record::new(score, key, inner.list.len()));
    }

    /// Snapshot of every member in ascending order.
    pub fn to_vec(&self) -> Vec<Record> {
        let inner = self.inner.lock();
        return inner
            .list
            .iter()
            .enumerate()
            .map(|(i, (score, key))| Record::new(score, key, i + 1))
            .collect();
    }

    /// Remove every member. The level source carries over.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        let dropped = inner.index.len();
        inner.list.clear();
        inner.index.clear();
        debug!(dropped, "cleared");
    }

    /// Panic if the skip list is malformed or disagrees with the index.
    pub fn check_invariants(&self) {
        let inner = self.inner.lock();
        inner.list.check_invariants();
        assert_eq!(
            inner.index.len(),
            inner.list.len(),
            "INVARIANT VIOLATED: index has {} keys, list has {}",
            inner.index.len(),
            inner.list.len()
        );
        for (score, key) in inner.list.iter() {
            assert_eq!(
                inner.index.get(&key),
                Some(&score),
                "INVARIANT VIOLATED: index disagrees on key {}",
                key
            );
        }
    }
}

impl Default for SortedSet {
    fn default() -> Self {
        return SortedSet::new();
    }
}

impl fmt::Debug for SortedSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        return f
            .debug_struct("SortedSet")
            .field("len", &inner.list.len())
            .field("level", &inner.list.level())
            .finish();
    }
}
