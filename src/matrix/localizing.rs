use super::operator_matrix::{MatrixKind, OperatorMatrix};
use super::square::SquareMatrix;
use crate::context::Context;
use crate::operators::{OperatorSequence, OperatorSequenceGenerator};
use crate::symbols::SymbolTable;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Address of a localizing matrix: hierarchy level plus localizing word.
///
/// Ordered by `(level, hash(word))`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalizingMatrixIndex {
    level: usize,
    word: OperatorSequence,
    word_hash: u64,
}

impl LocalizingMatrixIndex {
    pub fn new(context: &dyn Context, level: usize, word: OperatorSequence) -> Self {
        let word_hash = context.hash(&word);
        Self {
            level,
            word,
            word_hash,
        }
    }

    #[inline]
    pub fn level(&self) -> usize {
        self.level
    }

    #[inline]
    pub fn word(&self) -> &OperatorSequence {
        &self.word
    }

    #[inline]
    pub fn word_hash(&self) -> u64 {
        self.word_hash
    }
}

impl PartialEq for LocalizingMatrixIndex {
    fn eq(&self, other: &Self) -> bool {
        self.level == other.level && self.word_hash == other.word_hash
    }
}

impl Eq for LocalizingMatrixIndex {}

impl Ord for LocalizingMatrixIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.level, self.word_hash).cmp(&(other.level, other.word_hash))
    }
}

impl PartialOrd for LocalizingMatrixIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl OperatorMatrix {
    /// Localizing matrix `M[i][j] = g_i* w g_j` over words `g` of length at
    /// most `index.level()`.
    pub fn localizing_matrix(
        context: &dyn Context,
        symbols: &mut SymbolTable,
        index: LocalizingMatrixIndex,
    ) -> Self {
        let columns = OperatorSequenceGenerator::new(context, 0, index.level);
        let rows = columns.conjugate(context);
        let sequences = SquareMatrix::from_fn(columns.len(), |row, col| {
            rows[row]
                .multiply(&index.word, context)
                .multiply(&columns[col], context)
        });
        Self::build(context, symbols, MatrixKind::Localizing(index), sequences)
    }
}
