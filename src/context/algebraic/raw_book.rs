//! Raw (unsimplified) words over a fixed alphabet.

use crate::context::sequence_hash;
use crate::operators::Operator;
use itertools::Itertools;

/// A raw word and its hash over the book's alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSequence {
    pub operators: Vec<Operator>,
    pub raw_hash: u64,
}

/// Every word of length `1..=max_length()` over an alphabet, grouped by length.
///
/// Hashes use the alphabet position as the global index, so for a
/// single-party context they coincide with [`crate::context::Context::hash_operators`].
#[derive(Debug, Clone, Default)]
pub struct RawSequenceBook {
    alphabet: Vec<Operator>,
    sequences: Vec<RawSequence>,
    /// `length_offsets[ℓ]` is the index of the first word of length `ℓ + 1`.
    length_offsets: Vec<usize>,
}

impl RawSequenceBook {
    pub fn new(alphabet: Vec<Operator>) -> Self {
        Self {
            alphabet,
            sequences: Vec::new(),
            length_offsets: Vec::new(),
        }
    }

    /// Longest word generated so far.
    #[inline]
    pub fn max_length(&self) -> usize {
        self.length_offsets.len()
    }

    /// Number of words of every length up to and including `length`.
    pub fn count_up_to(&self, length: usize) -> Option<usize> {
        let n = self.alphabet.len();
        let mut total = 0usize;
        let mut block = 1usize;
        for _ in 0..length {
            block = block.checked_mul(n)?;
            total = total.checked_add(block)?;
        }
        Some(total)
    }

    /// Extends the book to every word of length up to `length`.
    ///
    /// Returns `false` if the book already reaches `length`.
    pub fn generate(&mut self, length: usize) -> bool {
        if length <= self.max_length() {
            return false;
        }
        let n = self.alphabet.len();
        for word_length in self.max_length() + 1..=length {
            self.length_offsets.push(self.sequences.len());
            for word in (0..word_length).map(|_| 0..n).multi_cartesian_product() {
                let raw_hash = sequence_hash(word.iter().copied(), n);
                let operators = word.into_iter().map(|i| self.alphabet[i]).collect();
                self.sequences.push(RawSequence {
                    operators,
                    raw_hash,
                });
            }
        }
        true
    }

    /// Words of exactly `length`, in ascending hash order.
    pub fn of_length(&self, length: usize) -> &[RawSequence] {
        if length == 0 || length > self.max_length() {
            return &[];
        }
        let start = self.length_offsets[length - 1];
        let end = self
            .length_offsets
            .get(length)
            .copied()
            .unwrap_or(self.sequences.len());
        &self.sequences[start..end]
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
    pub fn iter(&self) -> std::slice::Iter<'_, RawSequence> {
        self.sequences.iter()
    }
}
