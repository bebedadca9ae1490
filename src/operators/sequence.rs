//! Canonical operator sequences.

use super::operator::Operator;
use crate::context::{canonicalize, Context};
use serde::{Deserialize, Serialize};

/// A product of operators, always held in the canonical form of some context.
///
/// Zero and the identity both have no constituents; they differ by the
/// `is_zero` flag. Test [`OperatorSequence::is_zero`] before treating an empty
/// sequence as the identity.
///
/// A sequence does not hold on to its context. Every operation that can change
/// the operators takes the context explicitly and re-canonicalizes; mixing
/// contexts is a logic error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperatorSequence {
    constituents: Vec<Operator>,
    is_zero: bool,
}

impl OperatorSequence {
    /// Canonical form of the product `ops` in `context`.
    pub fn new(ops: Vec<Operator>, context: &dyn Context) -> Self {
        let mut constituents = ops;
        let is_zero = canonicalize(&mut constituents, context);
        Self {
            constituents,
            is_zero,
        }
    }

    /// The empty product.
    #[inline]
    pub fn identity() -> Self {
        Self::default()
    }

    /// The zero operator.
    #[inline]
    pub fn zero() -> Self {
        Self {
            constituents: Vec::new(),
            is_zero: true,
        }
    }

    /// Hermitian conjugate: reversed, then re-canonicalized.
    pub fn conjugate(&self, context: &dyn Context) -> Self {
        if self.is_zero {
            return Self::zero();
        }
        let mut reversed = self.constituents.clone();
        reversed.reverse();
        Self::new(reversed, context)
    }

    /// Product `self · rhs`.
    pub fn multiply(&self, rhs: &Self, context: &dyn Context) -> Self {
        if self.is_zero || rhs.is_zero {
            return Self::zero();
        }
        let mut ops = Vec::with_capacity(self.len() + rhs.len());
        ops.extend_from_slice(&self.constituents);
        ops.extend_from_slice(&rhs.constituents);
        Self::new(ops, context)
    }

    /// Right-multiplies by `ops` in place.
    pub fn append(&mut self, ops: &[Operator], context: &dyn Context) {
        if self.is_zero {
            return;
        }
        self.constituents.extend_from_slice(ops);
        self.is_zero = canonicalize(&mut self.constituents, context);
    }

    /// Number of operators; zero for both zero and the identity.
    #[inline]
    pub fn len(&self) -> usize {
        self.constituents.len()
    }

    /// Whether there are no operators (zero or the identity).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.constituents.is_empty()
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.is_zero
    }

    /// Whether this is the identity.
    #[inline]
    pub fn is_identity(&self) -> bool {
        !self.is_zero && self.constituents.is_empty()
    }

    #[inline]
    pub fn operators(&self) -> &[Operator] {
        &self.constituents
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Operator> {
        self.constituents.iter()
    }

    /// Hash of this sequence in `context`.
    #[inline]
    pub fn hash(&self, context: &dyn Context) -> u64 {
        context.hash(self)
    }
}

impl<'a> IntoIterator for &'a OperatorSequence {
    type Item = &'a Operator;
    type IntoIter = std::slice::Iter<'a, Operator>;

    fn into_iter(self) -> Self::IntoIter {
        self.constituents.iter()
    }
}
