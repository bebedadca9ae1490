//! The atomic operator.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Algebraic flags carried by an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OperatorFlags {
    /// Generic Hermitian operator: `X X` does not simplify.
    #[default]
    None,
    /// Projector: `X X = X`.
    Idempotent,
    /// The identity: dropped from every canonical sequence.
    Identity,
}

/// A Hermitian operator, identified by its party and its party-local id.
///
/// # Invariant
/// - Equality, ordering and hashing use `(party, id)` only; flags are ignored.
/// - The global index of an operator is owned by its context
///   (party offset + local id), not by the operator itself.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Operator {
    /// Party-local identifier.
    pub id: u32,
    /// Owning party.
    pub party: u32,
    /// Algebraic flags.
    pub flags: OperatorFlags,
}

impl Operator {
    /// Creates an operator.
    #[inline]
    pub const fn new(id: u32, party: u32, flags: OperatorFlags) -> Self {
        Self { id, party, flags }
    }

    /// Creates a generic (non-idempotent) operator.
    #[inline]
    pub const fn generic(id: u32, party: u32) -> Self {
        Self::new(id, party, OperatorFlags::None)
    }

    /// Creates a projector.
    #[inline]
    pub const fn projector(id: u32, party: u32) -> Self {
        Self::new(id, party, OperatorFlags::Idempotent)
    }

    #[inline]
    pub fn is_idempotent(&self) -> bool {
        matches!(self.flags, OperatorFlags::Idempotent | OperatorFlags::Identity)
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        self.flags == OperatorFlags::Identity
    }
}

impl PartialEq for Operator {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.party == other.party
    }
}

impl Eq for Operator {}

impl Hash for Operator {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.party.hash(state);
        self.id.hash(state);
    }
}

impl Ord for Operator {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.party, self.id).cmp(&(other.party, other.id))
    }
}

impl PartialOrd for Operator {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.party, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_flags() {
        let a = Operator::generic(3, 1);
        let b = Operator::projector(3, 1);
        assert_eq!(a, b);
        assert_ne!(a, Operator::generic(3, 0));
    }

    #[test]
    fn ordering_is_party_major() {
        let mut ops = vec![
            Operator::generic(0, 1),
            Operator::generic(2, 0),
            Operator::generic(1, 0),
        ];
        ops.sort();
        assert_eq!(
            ops,
            vec![
                Operator::generic(1, 0),
                Operator::generic(2, 0),
                Operator::generic(0, 1)
            ]
        );
    }

    #[test]
    fn identity_counts_as_idempotent() {
        let id = Operator::new(0, 0, OperatorFlags::Identity);
        assert!(id.is_identity());
        assert!(id.is_idempotent());
        assert!(!Operator::generic(0, 0).is_idempotent());
    }
}
