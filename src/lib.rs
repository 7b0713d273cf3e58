//! Ranked - an in-memory ordered key-score set.
//!
//! Keys are unique `i64`s, each carrying an `i64` score. Members are kept in
//! `(score, key)` order by a skip list whose links record how many positions
//! they jump, which makes rank queries logarithmic. A hash index maps each key
//! to its score. This is the engine behind leaderboard-style sorted sets.
//!
//! # Quick Start
//!
//! ```
//! use ranked::{RangeSpec, SortedSet};
//!
//! let board = SortedSet::new();
//! board.add_all([(300, 1), (150, 2), (450, 3)]);
//!
//! // Highest score first.
//! let top: Vec<i64> = board.range_by_rank(1, 2, true).iter().map(|r| r.key).collect();
//! assert_eq!(top, vec![3, 1]);
//!
//! assert_eq!(board.count_by_score(&RangeSpec::closed(100, 400)), 2);
//! board.remove_by_score(&RangeSpec::closed(100, 200));
//! assert_eq!(board.score(2), None);
//! ```

pub mod config;
pub mod error;
pub mod range;
pub mod rng;
pub mod skip_list;
pub mod sorted_set;

pub use config::Config;
pub use error::{Error, Result};
pub use range::{RangeSpec, Record};
pub use sorted_set::SortedSet;
