//! Symbols: operator sequences that are distinct up to Hermitian conjugation.
//!
//! Every symbol stands for one equivalence class `{s, s*}` of canonical
//! sequences. Its real part always gets a basis index; its imaginary part
//! gets one only when `s ≠ s*`.

mod expression;
mod table;

pub use expression::SymbolExpression;
pub use table::{SymbolLookup, SymbolTable};

use crate::context::Context;
use crate::operators::OperatorSequence;
use serde::{Deserialize, Serialize};

/// One entry of the symbol table.
///
/// The forward sequence is the member of `{s, s*}` with the lower hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueSequence {
    pub(crate) id: usize,
    sequence: OperatorSequence,
    hash: u64,
    conjugate: Option<OperatorSequence>,
    conjugate_hash: u64,
    hermitian: bool,
    pub(crate) real_index: Option<usize>,
    pub(crate) imaginary_index: Option<usize>,
}

impl UniqueSequence {
    /// Slot 0.
    pub fn zero() -> Self {
        Self {
            id: 0,
            sequence: OperatorSequence::zero(),
            hash: 0,
            conjugate: None,
            conjugate_hash: 0,
            hermitian: true,
            real_index: None,
            imaginary_index: None,
        }
    }

    /// Slot 1.
    pub fn identity() -> Self {
        Self {
            id: 1,
            sequence: OperatorSequence::identity(),
            hash: 1,
            conjugate: None,
            conjugate_hash: 1,
            hermitian: true,
            real_index: Some(0),
            imaginary_index: None,
        }
    }

    /// Candidate entry for `sequence`; ids and basis indices are assigned on merge.
    pub fn from_sequence(context: &dyn Context, sequence: OperatorSequence) -> Self {
        let hash = context.hash(&sequence);
        if !context.can_be_nonhermitian() {
            return Self::hermitian(sequence, hash);
        }
        let conjugate = sequence.conjugate(context);
        let conjugate_hash = context.hash(&conjugate);
        if conjugate_hash == hash {
            return Self::hermitian(sequence, hash);
        }
        let (sequence, hash, conjugate, conjugate_hash) = if conjugate_hash < hash {
            (conjugate, conjugate_hash, sequence, hash)
        } else {
            (sequence, hash, conjugate, conjugate_hash)
        };
        Self {
            id: usize::MAX,
            sequence,
            hash,
            conjugate: Some(conjugate),
            conjugate_hash,
            hermitian: false,
            real_index: None,
            imaginary_index: None,
        }
    }

    fn hermitian(sequence: OperatorSequence, hash: u64) -> Self {
        Self {
            id: usize::MAX,
            sequence,
            hash,
            conjugate: None,
            conjugate_hash: hash,
            hermitian: true,
            real_index: None,
            imaginary_index: None,
        }
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    #[inline]
    pub fn sequence(&self) -> &OperatorSequence {
        &self.sequence
    }

    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// The conjugate sequence; the forward sequence itself when Hermitian.
    #[inline]
    pub fn conjugate(&self) -> &OperatorSequence {
        self.conjugate.as_ref().unwrap_or(&self.sequence)
    }

    #[inline]
    pub fn conjugate_hash(&self) -> u64 {
        self.conjugate_hash
    }

    #[inline]
    pub fn is_hermitian(&self) -> bool {
        self.hermitian
    }

    /// Index of the real part in the real basis; `None` only for zero.
    #[inline]
    pub fn real_index(&self) -> Option<usize> {
        self.real_index
    }

    /// Index of the imaginary part; `None` for Hermitian symbols.
    #[inline]
    pub fn imaginary_index(&self) -> Option<usize> {
        self.imaginary_index
    }
}
