use crate::symbols::SymbolTable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Structural class of a symbol matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatrixType {
    /// Hermitian with only real symbols.
    Symmetric,
    /// Hermitian with at least one symbol carrying an imaginary part.
    Hermitian,
    /// Not Hermitian; only real symbols.
    Real,
    /// Not Hermitian; some symbol carries an imaginary part.
    Complex,
}

/// Which symbols a matrix uses and where they sit in the real/imaginary bases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMatrixProperties {
    included: BTreeSet<usize>,
    real_basis: Vec<usize>,
    imaginary_basis: Vec<usize>,
    basis_key: BTreeMap<usize, (Option<usize>, Option<usize>)>,
    matrix_type: MatrixType,
}

impl SymbolMatrixProperties {
    pub fn new(symbols: &SymbolTable, included: BTreeSet<usize>, hermitian: bool) -> Self {
        let mut real_basis = Vec::new();
        let mut imaginary_basis = Vec::new();
        let mut basis_key = BTreeMap::new();
        for &id in &included {
            let unique = &symbols[id];
            if let Some(real) = unique.real_index() {
                real_basis.push(real);
            }
            if let Some(imaginary) = unique.imaginary_index() {
                imaginary_basis.push(imaginary);
            }
            basis_key.insert(id, (unique.real_index(), unique.imaginary_index()));
        }
        real_basis.sort_unstable();
        imaginary_basis.sort_unstable();

        let matrix_type = match (hermitian, imaginary_basis.is_empty()) {
            (true, true) => MatrixType::Symmetric,
            (true, false) => MatrixType::Hermitian,
            (false, true) => MatrixType::Real,
            (false, false) => MatrixType::Complex,
        };
        Self {
            included,
            real_basis,
            imaginary_basis,
            basis_key,
            matrix_type,
        }
    }

    /// Symbol ids appearing in the matrix (including zero, if present).
    #[inline]
    pub fn included(&self) -> &BTreeSet<usize> {
        &self.included
    }

    /// Real-basis indices used, ascending.
    #[inline]
    pub fn real_basis(&self) -> &[usize] {
        &self.real_basis
    }

    /// Imaginary-basis indices used, ascending.
    #[inline]
    pub fn imaginary_basis(&self) -> &[usize] {
        &self.imaginary_basis
    }

    /// `(real_index, imaginary_index)` of an included symbol.
    #[inline]
    pub fn basis_key(&self, id: usize) -> Option<(Option<usize>, Option<usize>)> {
        self.basis_key.get(&id).copied()
    }

    #[inline]
    pub fn matrix_type(&self) -> MatrixType {
        self.matrix_type
    }
}
