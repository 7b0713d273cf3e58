//! AFL fuzz harness for the sorted set.
//!
//! Decodes the input into a sequence of operations, applies them to a
//! `SortedSet` and to a `BTreeSet` model, and checks after every step that
//! the structure is intact and both agree.

use std::collections::{BTreeSet, HashMap};

use afl::fuzz;
use ranked::{RangeSpec, SortedSet};

/// Operation types the fuzzer can generate
#[derive(Debug, Clone, Copy)]
enum FuzzOp {
    Add { score: i8, key: u8 },
    Remove { key: u8 },
    RemoveByScore { min: i8, max: i8, flags: u8 },
    RemoveByRank { start: u8, end: u8, reverse: bool },
    Clear,
}

impl FuzzOp {
    fn from_bytes(bytes: &[u8]) -> Option<(FuzzOp, &[u8])> {
        if bytes.is_empty() {
            return None;
        }

        let op_type = bytes[0] % 5;
        let rest = &bytes[1..];

        match op_type {
            0 if rest.len() >= 2 => {
                let op = FuzzOp::Add {
                    score: rest[0] as i8,
                    key: rest[1],
                };
                Some((op, &rest[2..]))
            }
            1 if !rest.is_empty() => Some((FuzzOp::Remove { key: rest[0] }, &rest[1..])),
            2 if rest.len() >= 3 => {
                let op = FuzzOp::RemoveByScore {
                    min: rest[0] as i8,
                    max: rest[1] as i8,
                    flags: rest[2],
                };
                Some((op, &rest[3..]))
            }
            3 if rest.len() >= 3 => {
                let op = FuzzOp::RemoveByRank {
                    start: rest[0],
                    end: rest[1],
                    reverse: rest[2] & 1 == 1,
                };
                Some((op, &rest[3..]))
            }
            4 => Some((FuzzOp::Clear, rest)),
            _ => None,
        }
    }
}

fn main() {
    fuzz!(|data: &[u8]| {
        let set = SortedSet::with_seed(0x5eed);
        let mut ordered: BTreeSet<(i64, i64)> = BTreeSet::new();
        let mut scores: HashMap<i64, i64> = HashMap::new();
        let mut remaining = data;

        while let Some((op, rest)) = FuzzOp::from_bytes(remaining) {
            remaining = rest;
            match op {
                FuzzOp::Add { score, key } => {
                    let (score, key) = (score as i64, key as i64);
                    set.add(score, key);
                    if let Some(old) = scores.insert(key, score) {
                        ordered.remove(&(old, key));
                    }
                    ordered.insert((score, key));
                }
                FuzzOp::Remove { key } => {
                    let key = key as i64;
                    set.remove(key);
                    if let Some(old) = scores.remove(&key) {
                        ordered.remove(&(old, key));
                    }
                }
                FuzzOp::RemoveByScore { min, max, flags } => {
                    let spec = RangeSpec::new(min as i64, max as i64, flags & 1 == 1, flags & 2 == 2);
                    let removed = set.remove_by_score(&spec);
                    let doomed: Vec<_> = ordered.iter().filter(|(s, _)| spec.contains(*s)).cloned().collect();
                    assert_eq!(removed, doomed.len());
                    for pair in doomed {
                        ordered.remove(&pair);
                        scores.remove(&pair.1);
                    }
                }
                FuzzOp::RemoveByRank { start, end, reverse } => {
                    let len = ordered.len();
                    let (start, end) = (start as usize, end as usize);
                    set.remove_by_rank(start, end, reverse);
                    let doomed: Vec<_> = ordered
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| {
                            let rank = if reverse { len - i } else { i + 1 };
                            rank >= start && rank <= end
                        })
                        .map(|(_, pair)| *pair)
                        .collect();
                    for pair in doomed {
                        ordered.remove(&pair);
                        scores.remove(&pair.1);
                    }
                }
                FuzzOp::Clear => {
                    set.clear();
                    ordered.clear();
                    scores.clear();
                }
            }

            set.check_invariants();
            let actual: Vec<(i64, i64)> = set.to_vec().iter().map(|r| (r.score, r.key)).collect();
            let expected: Vec<(i64, i64)> = ordered.iter().cloned().collect();
            assert_eq!(actual, expected, "diverged after {:?}", op);
        }
    });
}
