// ==============================================================================
// index.rs - Variant Key Index and Join Pass
// ==============================================================================
// Description: Maps variant keys to output rows and applies one source's
//              values to those rows with uniform-width placeholder fill
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Invariant: after JoinPass::finish every row has grown by exactly `width`
// fields, whether it matched a source line or was filled with MISSING_VALUE.
// ==============================================================================

use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::models::{VariantKey, MISSING_VALUE};

/// Variant rows of one input file plus the key index over them
#[derive(Debug, Default)]
pub struct VariantIndex {
    buckets: HashMap<VariantKey, Vec<usize>>,
    records: Vec<Vec<String>>,
    chromosomes: BTreeSet<String>,
}

impl VariantIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record for `key`; returns its row position
    pub fn insert(&mut self, key: VariantKey) -> usize {
        let position = self.records.len();
        self.records.push(key.to_record());
        self.chromosomes.insert(key.chromosome.clone());
        self.buckets.entry(key).or_default().push(position);
        position
    }

    /// Row positions sharing `key`, in input order
    pub fn positions(&self, key: &VariantKey) -> Option<&[usize]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    /// Distinct normalized chromosomes, sorted
    pub fn chromosomes(&self) -> &BTreeSet<String> {
        &self.chromosomes
    }

    pub fn records(&self) -> &[Vec<String>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct keys
    pub fn key_count(&self) -> usize {
        self.buckets.len()
    }

    /// True when every record has exactly `width` fields
    pub fn has_uniform_width(&self, width: usize) -> bool {
        self.records.iter().all(|r| r.len() == width)
    }

    /// Start a join pass that appends `width` fields to every row
    pub fn begin_pass(&mut self, width: usize) -> JoinPass<'_> {
        let not_found = NotFoundSet::full(self.records.len());
        JoinPass {
            index: self,
            not_found,
            width,
        }
    }
}

/// Rows not yet matched by the current source
#[derive(Debug, Clone)]
pub struct NotFoundSet {
    pending: Vec<bool>,
    remaining: usize,
}

impl NotFoundSet {
    /// Every position in `0..len` starts out pending
    pub fn full(len: usize) -> Self {
        Self {
            pending: vec![true; len],
            remaining: len,
        }
    }

    /// Remove `position`; returns false if it was already matched
    pub fn remove(&mut self, position: usize) -> bool {
        match self.pending.get_mut(position) {
            Some(slot) if *slot => {
                *slot = false;
                self.remaining -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.pending
            .iter()
            .enumerate()
            .filter_map(|(pos, pending)| pending.then_some(pos))
    }
}

/// Counts reported when a pass completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassSummary {
    /// Rows that received values from the source
    pub matched: usize,
    /// Rows padded with placeholders
    pub filled: usize,
    /// Fields appended to every row
    pub width: usize,
}

/// One source applied to a VariantIndex
///
/// First matching line wins per row; rows left over at `finish` are padded.
pub struct JoinPass<'a> {
    index: &'a mut VariantIndex,
    not_found: NotFoundSet,
    width: usize,
}

impl<'a> JoinPass<'a> {
    /// True when no row is still waiting for a value
    pub fn is_complete(&self) -> bool {
        self.not_found.is_empty()
    }

    /// Apply one source line's values to every pending row under `key`
    ///
    /// Values are cut or padded to the pass width. Returns the number of rows
    /// that took the values.
    pub fn apply<S: AsRef<str>>(&mut self, key: &VariantKey, values: &[S]) -> usize {
        let Some(positions) = self.index.buckets.get(key) else {
            return 0;
        };

        if values.len() != self.width {
            debug!(
                "{}:{} {}>{} carries {} values, pass width is {}",
                key.chromosome,
                key.position,
                key.ref_allele,
                key.alt_allele,
                values.len(),
                self.width
            );
        }

        let mut applied = 0;
        for &position in positions {
            if !self.not_found.remove(position) {
                continue;
            }
            let record = &mut self.index.records[position];
            record.extend(
                values
                    .iter()
                    .take(self.width)
                    .map(|v| v.as_ref().to_string()),
            );
            for _ in values.len()..self.width {
                record.push(MISSING_VALUE.to_string());
            }
            applied += 1;
        }
        applied
    }

    /// Pad every unmatched row and report the pass counts
    pub fn finish(self) -> PassSummary {
        let filled = self.not_found.len();
        let matched = self.index.records.len() - filled;
        for position in self.not_found.iter() {
            let record = &mut self.index.records[position];
            record.extend(std::iter::repeat(MISSING_VALUE.to_string()).take(self.width));
        }
        PassSummary {
            matched,
            filled,
            width: self.width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(chr: &str, pos: &str, r: &str, a: &str) -> VariantKey {
        VariantKey::new(chr, pos, r, a)
    }

    fn sample_index() -> VariantIndex {
        let mut index = VariantIndex::new();
        index.insert(key("chr1", "100", "A", "T"));
        index.insert(key("chr1", "200", "G", "C"));
        index.insert(key("CHR1", "100", "A", "T")); // duplicate of row 0
        index.insert(key("2", "300", "C", "G"));
        index
    }

    #[test]
    fn test_insert_buckets_duplicates() {
        let index = sample_index();
        assert_eq!(index.len(), 4);
        assert_eq!(index.key_count(), 3);
        assert_eq!(index.positions(&key("1", "100", "A", "T")), Some(&[0, 2][..]));
        assert_eq!(
            index.chromosomes().iter().collect::<Vec<_>>(),
            vec!["1", "2"]
        );
        assert_eq!(index.records()[2], vec!["1", "100", "A", "T"]);
    }

    #[test]
    fn test_not_found_set_removes_once() {
        let mut set = NotFoundSet::full(3);
        assert_eq!(set.len(), 3);
        assert!(set.remove(1));
        assert!(!set.remove(1));
        assert!(!set.remove(7));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_pass_duplicates_share_values() {
        let mut index = sample_index();
        let mut pass = index.begin_pass(2);
        assert_eq!(pass.apply(&key("1", "100", "A", "T"), &["0.9", "0.1"]), 2);
        let summary = pass.finish();

        assert_eq!(summary, PassSummary { matched: 2, filled: 2, width: 2 });
        assert_eq!(index.records()[0][4..], ["0.9", "0.1"]);
        assert_eq!(index.records()[2][4..], ["0.9", "0.1"]);
        assert_eq!(index.records()[1][4..], [".", "."]);
        assert!(index.has_uniform_width(6));
    }

    #[test]
    fn test_first_matching_line_wins() {
        let mut index = sample_index();
        let mut pass = index.begin_pass(1);
        assert_eq!(pass.apply(&key("2", "300", "C", "G"), &["rs1"]), 1);
        assert_eq!(pass.apply(&key("2", "300", "C", "G"), &["rs2"]), 0);
        pass.finish();
        assert_eq!(index.records()[3][4], "rs1");
    }

    #[test]
    fn test_ragged_values_are_normalized_to_width() {
        let mut index = sample_index();
        let mut pass = index.begin_pass(2);
        pass.apply(&key("1", "200", "G", "C"), &["0.5"]);
        pass.apply(&key("2", "300", "C", "G"), &["0.1", "0.2", "extra"]);
        pass.finish();

        assert_eq!(index.records()[1][4..], ["0.5", "."]);
        assert_eq!(index.records()[3][4..], ["0.1", "0.2"]);
        assert!(index.has_uniform_width(6));
    }

    #[test]
    fn test_empty_pass_fills_everything() {
        let mut index = sample_index();
        let summary = index.begin_pass(3).finish();
        assert_eq!(summary.filled, 4);
        assert_eq!(summary.matched, 0);
        for record in index.records() {
            assert_eq!(record[4..], [".", ".", "."]);
        }
    }

    #[test]
    fn test_zero_width_pass_leaves_records_unchanged() {
        let mut index = sample_index();
        let mut pass = index.begin_pass(0);
        pass.apply(&key("1", "100", "A", "T"), &["ignored"]);
        pass.finish();
        assert!(index.has_uniform_width(4));
    }
}
