//! Score intervals and query records.

use serde::{Deserialize, Serialize};

/// An interval over scores with independently open or closed endpoints.
///
/// A spec whose `min` exceeds `max`, or whose endpoints coincide while either
/// side is exclusive, denotes the empty interval. Empty specs are not errors;
/// every query over them simply matches nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeSpec {
    pub min: i64,
    pub max: i64,
    pub min_exclusive: bool,
    pub max_exclusive: bool,
}

impl RangeSpec {
    pub fn new(min: i64, max: i64, min_exclusive: bool, max_exclusive: bool) -> RangeSpec {
        return RangeSpec {
            min,
            max,
            min_exclusive,
            max_exclusive,
        };
    }

    /// `[min, max]`
    pub fn closed(min: i64, max: i64) -> RangeSpec {
        return RangeSpec::new(min, max, false, false);
    }

    /// `(min, max)`
    pub fn open(min: i64, max: i64) -> RangeSpec {
        return RangeSpec::new(min, max, true, true);
    }

    pub fn is_empty(&self) -> bool {
        return self.min > self.max
            || (self.min == self.max && (self.min_exclusive || self.max_exclusive));
    }

    /// Whether `score` satisfies the lower bound.
    pub fn gte_min(&self, score: i64) -> bool {
        if self.min_exclusive {
            return score > self.min;
        }
        return score >= self.min;
    }

    /// Whether `score` satisfies the upper bound.
    pub fn lte_max(&self, score: i64) -> bool {
        if self.max_exclusive {
            return score < self.max;
        }
        return score <= self.max;
    }

    pub fn contains(&self, score: i64) -> bool {
        return self.gte_min(score) && self.lte_max(score);
    }
}

/// A member as returned by a query, with the rank the query computed for it.
///
/// Ranks are 1-based. For reverse queries the rank counts from the highest
/// `(score, key)` downwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub score: i64,
    pub key: i64,
    pub rank: usize,
}

impl Record {
    pub fn new(score: i64, key: i64, rank: usize) -> Record {
        return Record { score, key, rank };
    }
}
