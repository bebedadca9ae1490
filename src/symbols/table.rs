//! The symbol table: append-only deduplication of operator sequences.

use super::{SymbolExpression, UniqueSequence};
use crate::context::Context;
use crate::fingerprint::{Fingerprint, FingerprintDomain};
use crate::operators::OperatorSequence;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Index;
use tracing::debug;

/// Result of looking a hash up in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SymbolLookup {
    pub id: usize,
    /// The hash matched the symbol's conjugate sequence.
    pub conjugated: bool,
}

/// Every symbol seen so far, with stable ids.
///
/// # Invariants
/// - Slot 0 is zero and slot 1 is the identity.
/// - Forward hashes are pairwise distinct; `hash_table` maps each forward hash
///   (and each non-Hermitian conjugate hash) to its symbol.
/// - Entries are never renumbered, and only removed when a failed matrix
///   construction is undone.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    unique_sequences: Vec<UniqueSequence>,
    hash_table: BTreeMap<u64, SymbolLookup>,
    real_symbols: Vec<usize>,
    imaginary_symbols: Vec<usize>,
}

/// Identity-relevant fields of one entry, as fingerprinted.
#[derive(Serialize)]
struct FingerprintEntry {
    id: usize,
    hash: u64,
    conjugate_hash: u64,
    hermitian: bool,
    real_index: Option<usize>,
    imaginary_index: Option<usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut hash_table = BTreeMap::new();
        hash_table.insert(0, SymbolLookup { id: 0, conjugated: false });
        hash_table.insert(1, SymbolLookup { id: 1, conjugated: false });
        Self {
            unique_sequences: vec![UniqueSequence::zero(), UniqueSequence::identity()],
            hash_table,
            real_symbols: vec![1],
            imaginary_symbols: Vec::new(),
        }
    }

    /// Merges candidates keyed by forward hash. Returns the id of every symbol
    /// a candidate resolved to, old or new.
    ///
    /// Candidates already present (by forward hash, or for non-Hermitian
    /// candidates by conjugate hash) are dropped. The rest are appended in
    /// ascending hash order, so repeated runs number symbols identically.
    pub fn merge_in(&mut self, mut candidates: BTreeMap<u64, UniqueSequence>) -> BTreeSet<usize> {
        let mut touched = self.remove_duplicates(&mut candidates);
        let before = self.unique_sequences.len();

        for (hash, mut unique) in candidates {
            let id = self.unique_sequences.len();
            unique.id = id;
            unique.real_index = Some(self.real_symbols.len());
            self.real_symbols.push(id);
            self.hash_table.insert(hash, SymbolLookup { id, conjugated: false });
            if !unique.is_hermitian() {
                unique.imaginary_index = Some(self.imaginary_symbols.len());
                self.imaginary_symbols.push(id);
                self.hash_table.insert(
                    unique.conjugate_hash(),
                    SymbolLookup { id, conjugated: true },
                );
            }
            self.unique_sequences.push(unique);
            touched.insert(id);
        }

        debug!(
            added = self.unique_sequences.len() - before,
            total = self.unique_sequences.len(),
            "merged symbols"
        );
        touched
    }

    /// Drops candidates already in the table, recording the symbols they hit.
    fn remove_duplicates(&self, candidates: &mut BTreeMap<u64, UniqueSequence>) -> BTreeSet<usize> {
        let mut found = BTreeSet::new();
        candidates.retain(|hash, unique| {
            let existing = self.hash_table.get(hash).or_else(|| {
                (!unique.is_hermitian())
                    .then(|| self.hash_table.get(&unique.conjugate_hash()))
                    .flatten()
            });
            match existing {
                Some(lookup) => {
                    found.insert(lookup.id);
                    false
                }
                None => true,
            }
        });
        found
    }

    /// Looks `sequence` up, merging it in if absent.
    pub fn merge_in_sequence(&mut self, context: &dyn Context, sequence: OperatorSequence) -> SymbolLookup {
        let hash = context.hash(&sequence);
        if let Some(lookup) = self.hash_to_index(hash) {
            return lookup;
        }
        let unique = UniqueSequence::from_sequence(context, sequence);
        let forward = unique.hash();
        self.merge_in(BTreeMap::from([(forward, unique)]));
        // Present by construction: the entry was just appended under both hashes.
        self.hash_table[&hash]
    }

    /// Drops every symbol with id `len` or above. Zero and the identity stay.
    ///
    /// Only for undoing a failed matrix construction: ids handed out after
    /// `len` must not have escaped.
    pub(crate) fn truncate(&mut self, len: usize) {
        let len = len.max(2);
        if len >= self.unique_sequences.len() {
            return;
        }
        self.unique_sequences.truncate(len);
        self.hash_table.retain(|_, lookup| lookup.id < len);
        self.real_symbols.retain(|&id| id < len);
        self.imaginary_symbols.retain(|&id| id < len);
        debug!(total = len, "symbols rolled back");
    }

    /// Symbol with the given sequence hash.
    #[inline]
    pub fn hash_to_index(&self, hash: u64) -> Option<SymbolLookup> {
        self.hash_table.get(&hash).copied()
    }

    /// Entry for `sequence`, and whether it matched the conjugate.
    pub fn find(&self, context: &dyn Context, sequence: &OperatorSequence) -> Option<(&UniqueSequence, bool)> {
        let lookup = self.hash_to_index(context.hash(sequence))?;
        Some((&self.unique_sequences[lookup.id], lookup.conjugated))
    }

    /// Symbol expression for `sequence`.
    pub fn to_symbol(&self, context: &dyn Context, sequence: &OperatorSequence) -> Option<SymbolExpression> {
        let lookup = self.hash_to_index(context.hash(sequence))?;
        let hermitian = self.unique_sequences[lookup.id].is_hermitian();
        Some(SymbolExpression::new(lookup.id, lookup.conjugated && !hermitian))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.unique_sequences.len()
    }

    /// Never true: zero and the identity are always present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.unique_sequences.is_empty()
    }

    #[inline]
    pub fn get(&self, id: usize) -> Option<&UniqueSequence> {
        self.unique_sequences.get(id)
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, UniqueSequence> {
        self.unique_sequences.iter()
    }

    /// Symbol ids in real-basis order.
    #[inline]
    pub fn real_symbols(&self) -> &[usize] {
        &self.real_symbols
    }

    /// Symbol ids in imaginary-basis order.
    #[inline]
    pub fn imaginary_symbols(&self) -> &[usize] {
        &self.imaginary_symbols
    }

    /// Deterministic fingerprint of the numbering: equal tables hash equal.
    pub fn fingerprint(&self) -> Fingerprint {
        let entries: Vec<FingerprintEntry> = self
            .unique_sequences
            .iter()
            .map(|unique| FingerprintEntry {
                id: unique.id,
                hash: unique.hash(),
                conjugate_hash: unique.conjugate_hash(),
                hermitian: unique.is_hermitian(),
                real_index: unique.real_index,
                imaginary_index: unique.imaginary_index,
            })
            .collect();
        Fingerprint::of(FingerprintDomain::SymbolTable, &entries)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<usize> for SymbolTable {
    type Output = UniqueSequence;

    fn index(&self, id: usize) -> &Self::Output {
        &self.unique_sequences[id]
    }
}

impl<'a> IntoIterator for &'a SymbolTable {
    type Item = &'a UniqueSequence;
    type IntoIter = std::slice::Iter<'a, UniqueSequence>;

    fn into_iter(self) -> Self::IntoIter {
        self.unique_sequences.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::GenericContext;

    fn word(ctx: &GenericContext, globals: &[usize]) -> OperatorSequence {
        OperatorSequence::new(globals.iter().map(|&g| ctx.operator(g)).collect(), ctx)
    }

    #[test]
    fn fixed_slots() {
        let table = SymbolTable::new();
        assert_eq!(table.len(), 2);
        assert!(table[0].sequence().is_zero());
        assert!(table[1].sequence().is_identity());
        assert_eq!(table.hash_to_index(0).unwrap().id, 0);
        assert_eq!(table.hash_to_index(1).unwrap().id, 1);
        assert_eq!(table.hash_to_index(2), None);
        assert_eq!(table.real_symbols(), &[1]);
    }

    #[test]
    fn conjugates_share_a_symbol() {
        let ctx = GenericContext::new(2);
        let mut table = SymbolTable::new();
        let xy = table.merge_in_sequence(&ctx, word(&ctx, &[0, 1]));
        let yx = table.merge_in_sequence(&ctx, word(&ctx, &[1, 0]));
        assert_eq!(xy.id, yx.id);
        assert!(!xy.conjugated);
        assert!(yx.conjugated);
        assert_eq!(table.len(), 3);
        assert_eq!(table.imaginary_symbols(), &[2]);
        assert_eq!(table.to_symbol(&ctx, &word(&ctx, &[1, 0])), Some(SymbolExpression::new(2, true)));
    }

    #[test]
    fn merge_assigns_ids_in_hash_order() {
        let ctx = GenericContext::new(3);
        let mut table = SymbolTable::new();
        let mut batch = BTreeMap::new();
        let words: [&[usize]; 4] = [&[2], &[0], &[1, 1], &[1]];
        for globals in words {
            let unique = UniqueSequence::from_sequence(&ctx, word(&ctx, globals));
            batch.insert(unique.hash(), unique);
        }
        let touched = table.merge_in(batch);
        assert_eq!(touched, BTreeSet::from([2, 3, 4, 5]));
        assert_eq!(table[2].sequence(), &word(&ctx, &[0]));
        assert_eq!(table[4].sequence(), &word(&ctx, &[2]));
        assert_eq!(table[5].sequence(), &word(&ctx, &[1, 1]));

        // Re-merging reports the existing ids and adds nothing.
        let again = UniqueSequence::from_sequence(&ctx, word(&ctx, &[1]));
        let touched = table.merge_in(BTreeMap::from([(again.hash(), again)]));
        assert_eq!(touched, BTreeSet::from([3]));
        assert_eq!(table.len(), 6);
    }

    #[test]
    fn find_reports_conjugation() {
        let ctx = GenericContext::new(2);
        let mut table = SymbolTable::new();
        table.merge_in_sequence(&ctx, word(&ctx, &[0, 1]));
        let (unique, conjugated) = table.find(&ctx, &word(&ctx, &[1, 0])).unwrap();
        assert_eq!(unique.id(), 2);
        assert!(conjugated);
        assert!(table.find(&ctx, &word(&ctx, &[1, 1])).is_none());
    }

    #[test]
    fn truncate_restores_an_earlier_table() {
        let ctx = GenericContext::new(2);
        let mut table = SymbolTable::new();
        table.merge_in_sequence(&ctx, word(&ctx, &[0]));
        let snapshot = table.fingerprint();
        table.merge_in_sequence(&ctx, word(&ctx, &[0, 1]));
        table.merge_in_sequence(&ctx, word(&ctx, &[1]));
        table.truncate(3);
        assert_eq!(table.len(), 3);
        assert_eq!(table.fingerprint(), snapshot);
        assert!(table.find(&ctx, &word(&ctx, &[1, 0])).is_none());
        assert!(table.imaginary_symbols().is_empty());
        table.truncate(0);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn fingerprint_tracks_numbering() {
        let ctx = GenericContext::new(2);
        let mut a = SymbolTable::new();
        let mut b = SymbolTable::new();
        assert_eq!(a.fingerprint(), b.fingerprint());
        a.merge_in_sequence(&ctx, word(&ctx, &[0]));
        a.merge_in_sequence(&ctx, word(&ctx, &[1]));
        b.merge_in_sequence(&ctx, word(&ctx, &[1]));
        b.merge_in_sequence(&ctx, word(&ctx, &[0]));
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
