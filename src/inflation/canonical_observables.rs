//! Canonical observable-variant tuples.
//!
//! A tuple of distinct variants stands for the joint distribution of those
//! copies. Relabeling source copies maps tuples to tuples with the same
//! distribution, so each tuple is represented by its lexicographically
//! smallest image.

use super::context::InflationContext;
use crate::context::sequence_hash;
use crate::indices::CombinationIndexIterator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Representative of a class of variant tuples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalObservable {
    /// Position in the canonical list.
    pub index: usize,
    /// Global variant indices, ascending.
    pub variants: Vec<usize>,
    pub hash: u64,
    /// Product of the variants' outcome counts.
    pub outcomes: usize,
    /// The variants mutually commute, so a joint distribution exists.
    pub compatible: bool,
}

impl CanonicalObservable {
    #[inline]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

/// Canonical variant tuples of every length up to a high-water mark.
///
/// Raw and canonical tuples are hashed in one mixed-radix space (base
/// `1 + variant_count`) and both map to the canonical entry.
#[derive(Debug, Clone)]
pub struct CanonicalObservables {
    max_level: usize,
    variant_count: usize,
    canonical: Vec<CanonicalObservable>,
    hash_aliases: BTreeMap<u64, usize>,
}

impl CanonicalObservables {
    /// Table holding only the empty tuple.
    pub fn new(context: &InflationContext) -> Self {
        let variant_count = context.variant_count();
        let empty = CanonicalObservable {
            index: 0,
            variants: Vec::new(),
            hash: 1,
            outcomes: 1,
            compatible: true,
        };
        Self {
            max_level: 0,
            variant_count,
            canonical: vec![empty],
            hash_aliases: BTreeMap::from([(1, 0)]),
        }
    }

    /// Extends the table to tuples of length `level`. Returns `false` if
    /// already there.
    pub fn generate_up_to_level(&mut self, context: &InflationContext, level: usize) -> bool {
        if level <= self.max_level {
            return false;
        }
        let before = self.canonical.len();
        let upper = level.min(self.variant_count);
        for length in (self.max_level + 1)..=upper {
            for raw in CombinationIndexIterator::new(self.variant_count, length) {
                let raw_hash = self.tuple_hash(&raw);
                if self.hash_aliases.contains_key(&raw_hash) {
                    continue;
                }
                let variants = context.canonical_variants_of(&raw);
                let hash = self.tuple_hash(&variants);
                let index = match self.hash_aliases.get(&hash) {
                    Some(&index) => index,
                    None => {
                        let index = self.canonical.len();
                        let outcomes = variants
                            .iter()
                            .map(|&v| context.observables()[context.variant_at(v).observable].outcomes)
                            .product();
                        self.canonical.push(CanonicalObservable {
                            index,
                            compatible: context.variants_commute_of(&variants),
                            variants,
                            hash,
                            outcomes,
                        });
                        self.hash_aliases.insert(hash, index);
                        index
                    }
                };
                self.hash_aliases.insert(raw_hash, index);
            }
        }
        self.max_level = level;
        debug!(
            level,
            new_canonical = self.canonical.len() - before,
            aliases = self.hash_aliases.len(),
            "canonical observables extended"
        );
        true
    }

    fn tuple_hash(&self, variants: &[usize]) -> u64 {
        sequence_hash(variants.iter().copied(), self.variant_count)
    }

    /// Canonical entry for a tuple of distinct variants, in any order.
    pub fn canonical(&self, variants: &[usize]) -> Option<&CanonicalObservable> {
        let mut sorted = variants.to_vec();
        sorted.sort_unstable();
        if sorted.windows(2).any(|pair| pair[0] == pair[1])
            || sorted.last().is_some_and(|&v| v >= self.variant_count)
        {
            return None;
        }
        let index = *self.hash_aliases.get(&self.tuple_hash(&sorted))?;
        Some(&self.canonical[index])
    }

    #[inline]
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CanonicalObservable> {
        self.canonical.iter()
    }
}
