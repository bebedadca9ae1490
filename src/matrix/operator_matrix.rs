//! Square matrices of operator sequences and their symbol images.

use super::localizing::LocalizingMatrixIndex;
use super::properties::SymbolMatrixProperties;
use super::square::SquareMatrix;
use crate::context::Context;
use crate::operators::OperatorSequence;
use crate::symbols::{SymbolExpression, SymbolTable, UniqueSequence};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What a matrix was built as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatrixKind {
    Moment { level: usize },
    Localizing(LocalizingMatrixIndex),
}

impl MatrixKind {
    /// Hierarchy level.
    pub fn level(&self) -> usize {
        match self {
            MatrixKind::Moment { level } => *level,
            MatrixKind::Localizing(index) => index.level(),
        }
    }
}

/// An operator matrix: sequences, their hashes, and the symbols they map to.
///
/// # Invariants
/// - `hashes[i][j] == context.hash(sequences[i][j])`.
/// - If Hermitian, `sequences[i][j] == sequences[j][i].conjugate()`.
/// - Immutable once built.
#[derive(Debug, Clone)]
pub struct OperatorMatrix {
    kind: MatrixKind,
    sequences: SquareMatrix<OperatorSequence>,
    hashes: SquareMatrix<u64>,
    symbols: SquareMatrix<SymbolExpression>,
    hermitian: bool,
    nonhermitian_element: Option<(usize, usize)>,
    properties: SymbolMatrixProperties,
}

impl OperatorMatrix {
    /// Runs the construction pipeline over a matrix of canonical sequences.
    ///
    /// Order matters: Hermiticity, hashes, unique-sequence identification,
    /// merging into `symbols`, symbol matrix, properties.
    ///
    /// # Panics
    /// If a cell's hash is missing from `symbols` after the merge.
    pub(crate) fn build(
        context: &dyn Context,
        symbols: &mut SymbolTable,
        kind: MatrixKind,
        sequences: SquareMatrix<OperatorSequence>,
    ) -> Self {
        let dimension = sequences.dimension();

        let nonhermitian_element = sequences.upper_triangle().find_map(|(row, col, seq)| {
            (*seq != sequences[col][row].conjugate(context)).then_some((row, col))
        });
        let hermitian = nonhermitian_element.is_none();

        let hashes = SquareMatrix::from_fn(dimension, |row, col| context.hash(&sequences[row][col]));

        let candidates = Self::identify_unique_sequences(context, &sequences, &hashes, hermitian);
        symbols.merge_in(candidates);

        let lookup = |row: usize, col: usize| -> SymbolExpression {
            let hash = hashes[row][col];
            let Some(found) = symbols.hash_to_index(hash) else {
                panic!(
                    "symbol for {} (hash {hash}) missing after merge",
                    context.format_sequence(&sequences[row][col])
                );
            };
            SymbolExpression::new(found.id, found.conjugated && !symbols[found.id].is_hermitian())
        };
        let symbol_matrix = SquareMatrix::from_fn(dimension, |row, col| {
            if !hermitian || row <= col {
                return lookup(row, col);
            }
            let upper = lookup(col, row);
            if symbols[upper.id].is_hermitian() {
                upper
            } else {
                upper.conjugate()
            }
        });

        let included: BTreeSet<usize> = symbol_matrix.iter().map(|expr| expr.id).collect();
        let properties = SymbolMatrixProperties::new(symbols, included, hermitian);

        Self {
            kind,
            sequences,
            hashes,
            symbols: symbol_matrix,
            hermitian,
            nonhermitian_element,
            properties,
        }
    }

    /// Candidate symbols for every cell whose sequence (or conjugate) was not
    /// already covered. Only the upper triangle is scanned when Hermitian.
    fn identify_unique_sequences(
        context: &dyn Context,
        sequences: &SquareMatrix<OperatorSequence>,
        hashes: &SquareMatrix<u64>,
        hermitian: bool,
    ) -> BTreeMap<u64, UniqueSequence> {
        let dimension = sequences.dimension();
        let mut seen = BTreeSet::new();
        let mut candidates = BTreeMap::new();
        for row in 0..dimension {
            let first_col = if hermitian { row } else { 0 };
            for col in first_col..dimension {
                if seen.contains(&hashes[row][col]) {
                    continue;
                }
                let unique = UniqueSequence::from_sequence(context, sequences[row][col].clone());
                seen.insert(unique.hash());
                seen.insert(unique.conjugate_hash());
                candidates.insert(unique.hash(), unique);
            }
        }
        candidates
    }

    #[inline]
    pub fn kind(&self) -> &MatrixKind {
        &self.kind
    }

    #[inline]
    pub fn level(&self) -> usize {
        self.kind.level()
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.sequences.dimension()
    }

    /// Operator sequence in each cell.
    #[inline]
    pub fn sequence_matrix(&self) -> &SquareMatrix<OperatorSequence> {
        &self.sequences
    }

    /// Hash of each cell's sequence.
    #[inline]
    pub fn hash_matrix(&self) -> &SquareMatrix<u64> {
        &self.hashes
    }

    /// Symbol expression in each cell.
    #[inline]
    pub fn symbol_matrix(&self) -> &SquareMatrix<SymbolExpression> {
        &self.symbols
    }

    #[inline]
    pub fn is_hermitian(&self) -> bool {
        self.hermitian
    }

    /// First `(row, col)` with `M[row][col] ≠ M[col][row]*`, if any.
    #[inline]
    pub fn nonhermitian_element(&self) -> Option<(usize, usize)> {
        self.nonhermitian_element
    }

    #[inline]
    pub fn properties(&self) -> &SymbolMatrixProperties {
        &self.properties
    }
}
