//! Enumeration of distinct canonical words.

use super::sequence::OperatorSequence;
use crate::context::Context;
use std::collections::BTreeMap;
use std::ops::Index;

/// Every distinct non-zero canonical sequence with length in
/// `min_length..=max_length`, ordered by hash (shorter first, then
/// lexicographically by global index).
///
/// Canonical forms are prefix-closed, so words of length `ℓ` are reached by
/// extending the words of length `ℓ - 1` by one operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorSequenceGenerator {
    min_length: usize,
    max_length: usize,
    sequences: Vec<OperatorSequence>,
}

impl OperatorSequenceGenerator {
    pub fn new(context: &dyn Context, min_length: usize, max_length: usize) -> Self {
        let mut found: BTreeMap<u64, OperatorSequence> = BTreeMap::new();
        found.insert(1, OperatorSequence::identity());

        let mut frontier = vec![OperatorSequence::identity()];
        for length in 1..=max_length {
            let mut next = Vec::new();
            for word in &frontier {
                for op in context.operators() {
                    let mut ops = word.operators().to_vec();
                    ops.push(*op);
                    let candidate = OperatorSequence::new(ops, context);
                    if candidate.is_zero() {
                        continue;
                    }
                    let hash = context.hash(&candidate);
                    if found.contains_key(&hash) {
                        continue;
                    }
                    if candidate.len() == length {
                        next.push(candidate.clone());
                    }
                    found.insert(hash, candidate);
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        let sequences = found
            .into_values()
            .filter(|seq| seq.len() >= min_length)
            .collect();
        Self {
            min_length,
            max_length,
            sequences,
        }
    }

    /// Conjugates of every sequence, in the same order.
    pub fn conjugate(&self, context: &dyn Context) -> Self {
        Self {
            min_length: self.min_length,
            max_length: self.max_length,
            sequences: self.sequences.iter().map(|seq| seq.conjugate(context)).collect(),
        }
    }

    #[inline]
    pub fn min_length(&self) -> usize {
        self.min_length
    }

    #[inline]
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    #[inline]
    pub fn sequences(&self) -> &[OperatorSequence] {
        &self.sequences
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, OperatorSequence> {
        self.sequences.iter()
    }
}

impl Index<usize> for OperatorSequenceGenerator {
    type Output = OperatorSequence;

    fn index(&self, index: usize) -> &Self::Output {
        &self.sequences[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{GenericContext, LocalityContext};

    #[test]
    fn words_over_two_letters() {
        let ctx = GenericContext::new(2);
        let generator = OperatorSequenceGenerator::new(&ctx, 0, 2);
        // 1, x, y, xx, xy, yx, yy
        assert_eq!(generator.len(), 7);
        assert!(generator[0].is_identity());
        let hashes: Vec<u64> = generator.iter().map(|seq| ctx.hash(seq)).collect();
        assert!(hashes.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn minimum_length_filters() {
        let ctx = GenericContext::new(2);
        let generator = OperatorSequenceGenerator::new(&ctx, 2, 2);
        assert_eq!(generator.len(), 4);
        assert!(generator.iter().all(|seq| seq.len() == 2));
    }

    #[test]
    fn chsh_level_one_and_two() {
        let ctx = LocalityContext::uniform(2, 2, 2).unwrap();
        assert_eq!(OperatorSequenceGenerator::new(&ctx, 0, 1).len(), 5);
        // 1 + 4 + (a0a1, a1a0, b0b1, b1b0, and 4 cross products)
        assert_eq!(OperatorSequenceGenerator::new(&ctx, 0, 2).len(), 13);
    }

    #[test]
    fn conjugate_keeps_order() {
        let ctx = GenericContext::new(2);
        let generator = OperatorSequenceGenerator::new(&ctx, 0, 2);
        let conj = generator.conjugate(&ctx);
        assert_eq!(conj.len(), generator.len());
        for (seq, c) in generator.iter().zip(conj.iter()) {
            assert_eq!(&seq.conjugate(&ctx), c);
        }
    }

    #[test]
    fn projectors_saturate() {
        // One party, one measurement: words never grow past one operator.
        let ctx = LocalityContext::uniform(1, 1, 3).unwrap();
        assert_eq!(OperatorSequenceGenerator::new(&ctx, 0, 4).len(), 3);
    }
}
