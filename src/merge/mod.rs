//! Multiway priority-queue merge with a fuzzy frontier test.
//!
//! One min-heap per relation tracks the smallest unread normalized key
//! across that side's run cursors. Each iteration inspects the two
//! frontier minima: a similarity score at or above the threshold opens a
//! match event, anything below advances the lexicographically smaller
//! side by one record.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use log::debug;

use crate::error::{JoinError, SinkError, StorageError};
use crate::models::Record;
use crate::runs::{Run, RunCursor};
use crate::similarity::similarity;

/// Heap entry tying a normalized key to the arena slot of the cursor
/// currently holding it. Entries with equal keys may pop in any slot
/// order.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct HeapEntry {
    key: String,
    slot: usize,
}

/// One relation's open cursors plus the min-heap over their current keys.
///
/// Invariant: the heap's minimum entry always carries the smallest
/// current key over all non-exhausted cursors; exhausted cursors have no
/// entry.
struct Side {
    cursors: Vec<RunCursor>,
    heap: BinaryHeap<Reverse<HeapEntry>>,
}

impl Side {
    fn open(runs: &[Run]) -> Result<Self, StorageError> {
        let mut cursors = Vec::with_capacity(runs.len());
        for run in runs {
            cursors.push(run.open_cursor()?);
        }
        let mut heap = BinaryHeap::with_capacity(cursors.len());
        for (slot, cursor) in cursors.iter().enumerate() {
            if !cursor.is_exhausted() {
                heap.push(Reverse(HeapEntry {
                    key: cursor.key().to_owned(),
                    slot,
                }));
            }
        }
        Ok(Self { cursors, heap })
    }

    fn min_key(&self) -> Option<&str> {
        self.heap.peek().map(|Reverse(e)| e.key.as_str())
    }

    /// Pops the smallest entry, takes its cursor's record, and requeues
    /// the cursor if it still has unread records.
    fn advance_min(&mut self) -> Result<Option<Record>, StorageError> {
        let Some(Reverse(entry)) = self.heap.pop() else {
            return Ok(None);
        };
        let cursor = &mut self.cursors[entry.slot];
        let record = cursor.advance()?;
        if !cursor.is_exhausted() {
            self.heap.push(Reverse(HeapEntry {
                key: cursor.key().to_owned(),
                slot: entry.slot,
            }));
        }
        Ok(record)
    }

    /// Drains every record whose normalized key is string-equal to `key`.
    /// Similarity never widens a group; only exact equality does.
    fn drain_equal(&mut self, key: &str) -> Result<Vec<Record>, StorageError> {
        let mut group = Vec::new();
        while self.min_key() == Some(key) {
            if let Some(record) = self.advance_min()? {
                group.push(record);
            }
        }
        Ok(group)
    }
}

/// Case-insensitive equality test on the right record's filter field,
/// applied before a pair is emitted.
pub struct FilterPredicate {
    expected: String,
}

impl FilterPredicate {
    pub fn new(expected: &str) -> Self {
        Self {
            expected: expected.to_lowercase(),
        }
    }

    fn accepts(&self, record: &Record) -> bool {
        record
            .filter_field()
            .map_or(false, |v| v.to_lowercase() == self.expected)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MergeStats {
    pub match_groups: u64,
    pub pairs_emitted: u64,
    pub pairs_filtered: u64,
    pub advanced_left: u64,
    pub advanced_right: u64,
}

pub struct MergeJoin {
    left: Side,
    right: Side,
    threshold: f64,
    filter: FilterPredicate,
}

impl MergeJoin {
    pub fn new(
        left_runs: &[Run],
        right_runs: &[Run],
        threshold: f64,
        filter: FilterPredicate,
    ) -> Result<Self, StorageError> {
        Ok(Self {
            left: Side::open(left_runs)?,
            right: Side::open(right_runs)?,
            threshold,
            filter,
        })
    }

    /// Runs the merge to completion, handing each qualifying (left,
    /// right) pair to `on_match` in group-discovery order, left-major
    /// then right-minor within a group.
    ///
    /// Terminates as soon as either side empties; unread records on the
    /// other side are never visited.
    pub fn for_each<F>(mut self, mut on_match: F) -> Result<MergeStats, JoinError>
    where
        F: FnMut(&Record, &Record) -> Result<(), SinkError>,
    {
        let mut stats = MergeStats::default();
        loop {
            let (Some(left_key), Some(right_key)) = (self.left.min_key(), self.right.min_key())
            else {
                break;
            };
            let score = similarity(left_key, right_key);
            if score >= self.threshold {
                // Group membership is exact string equality on the
                // normalized key; the score only opens the frontier.
                let left_key = left_key.to_owned();
                let right_key = right_key.to_owned();
                let left_group = self.left.drain_equal(&left_key)?;
                let right_group = self.right.drain_equal(&right_key)?;
                debug!(
                    "match group {:?} x {:?}: {} x {} rows",
                    left_key,
                    right_key,
                    left_group.len(),
                    right_group.len()
                );
                stats.match_groups += 1;
                for left in &left_group {
                    for right in &right_group {
                        if self.filter.accepts(right) {
                            on_match(left, right)?;
                            stats.pairs_emitted += 1;
                        } else {
                            stats.pairs_filtered += 1;
                        }
                    }
                }
            } else if left_key < right_key {
                self.left.advance_min()?;
                stats.advanced_left += 1;
            } else {
                self.right.advance_min()?;
                stats.advanced_right += 1;
            }
        }
        Ok(stats)
    }
}
