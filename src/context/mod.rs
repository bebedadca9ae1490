//! Operator contexts: the algebra that canonical operator sequences live in.
//!
//! A [`Context`] owns the universe of operators (grouped into parties) and
//! decides how a raw product of operators reduces. Canonicalization is a free
//! function, [`canonicalize`], parameterized over the capabilities a context
//! exposes; variants plug in through [`Context::additional_simplification`].
//!
//! | Variant                         | Algebra                                              |
//! |---------------------------------|------------------------------------------------------|
//! | [`GenericContext`]              | raw operators, parties commute, declared exclusions  |
//! | [`LocalityContext`]             | parties of projective measurements                   |
//! | [`algebraic::AlgebraicContext`] | one party, monomial substitution rules               |
//! | [`crate::inflation::InflationContext`] | source-copy commutation, orthogonal projectors |
//!
//! # Hashing
//!
//! Every canonical sequence has a `u64` hash: `0` for zero, `1` for the
//! identity, and otherwise `1 + Σ (g_k + 1) · base^p_k` where `g_k` is the
//! global index of the k-th operator, `base = 1 + size()`, and the place value
//! `p_k` counts from the *end* of the sequence. Longer sequences hash higher
//! and equal-length sequences compare lexicographically, first operator most
//! significant.
//!
//! # Citations
//! - Navascués, Pironio, Acín, "A convergent hierarchy of semidefinite programs
//!   characterizing the set of quantum correlations", New J. Phys. 10 (2008)
//! - Knuth, "The Art of Computer Programming, Vol. 2", §4.1 (1997) – mixed-radix numbers

pub mod algebraic;
mod generic;
mod locality;

pub use generic::GenericContext;
pub use locality::{LocalityContext, MeasurementIndex};

use crate::operators::{Operator, OperatorSequence, Party};
use std::fmt;
use thiserror::Error;

/// Errors raised while setting up a context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("measurement '{name}' of party {party} has no outcomes")]
    EmptyMeasurement { party: usize, name: String },

    #[error("operator {operator} out of range for party {party} ({count} operators)")]
    OperatorOutOfRange {
        party: usize,
        operator: usize,
        count: usize,
    },

    #[error("party {party} out of range ({count} parties)")]
    PartyOutOfRange { party: usize, count: usize },

    #[error("context has no operators")]
    NoOperators,

    #[error("rule {rule} has an empty left-hand side")]
    EmptyRule { rule: usize },

    #[error("rule {rule} is trivial: both sides reduce to {sequence}")]
    TrivialRule { rule: usize, sequence: String },
}

/// Capability interface of an operator algebra.
///
/// Implementors must be logically immutable once the first sequence over them
/// exists; setup methods that renumber operators are only valid before that.
pub trait Context: fmt::Debug + Send + Sync {
    /// Parties, in id order. `parties()[p].id() == p`.
    fn parties(&self) -> &[Party];

    /// Every operator, in global order.
    fn operators(&self) -> &[Operator];

    /// Total number of operators.
    #[inline]
    fn size(&self) -> usize {
        self.operators().len()
    }

    /// Global index of `op`: its party's offset plus its local id.
    #[inline]
    fn global_index(&self, op: &Operator) -> usize {
        self.parties()[op.party as usize].global_offset() + op.id as usize
    }

    /// Operator with global index `index`.
    #[inline]
    fn operator(&self, index: usize) -> Operator {
        self.operators()[index]
    }

    /// Whether operators of different parties commute.
    fn commutes_across_parties(&self) -> bool {
        true
    }

    /// Variant-specific reduction, run after sorting and idempotent collapse.
    ///
    /// Returns `true` if the product is zero. The default zeroes any product
    /// holding two adjacent mutually exclusive operators of the same party.
    fn additional_simplification(&self, ops: &mut Vec<Operator>) -> bool {
        ops.windows(2).any(|pair| {
            pair[0].party == pair[1].party
                && self.parties()[pair[0].party as usize].exclusive(pair[0].id, pair[1].id)
        })
    }

    /// Whether any sequence in this context can differ from its conjugate.
    fn can_be_nonhermitian(&self) -> bool {
        true
    }

    /// Hash of an already-canonical, non-zero operator string.
    fn hash_operators(&self, ops: &[Operator]) -> u64 {
        sequence_hash(ops.iter().map(|op| self.global_index(op)), self.size())
    }

    /// Hash of a canonical sequence.
    fn hash(&self, seq: &OperatorSequence) -> u64 {
        if seq.is_zero() {
            0
        } else {
            self.hash_operators(seq.operators())
        }
    }

    /// Human-readable name of an operator.
    fn format_operator(&self, op: &Operator) -> String {
        self.parties()[op.party as usize].format_operator(op)
    }

    /// Human-readable form of a sequence: `0`, `1`, or operators joined by `;`.
    fn format_sequence(&self, seq: &OperatorSequence) -> String {
        if seq.is_zero() {
            return "0".to_string();
        }
        if seq.is_empty() {
            return "1".to_string();
        }
        seq.iter()
            .map(|op| self.format_operator(op))
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Reduces `ops` to canonical form in place. Returns `true` if the product is zero.
///
/// Steps, in order: adopt the context's flags for each operator, drop
/// identities, stable-sort by party (when parties commute), collapse adjacent
/// repeats of idempotent operators, apply the context's own simplification,
/// and drop any identity it left behind. A zero product leaves `ops` empty.
///
/// # Panics
/// If an operator does not belong to `context`.
pub fn canonicalize(ops: &mut Vec<Operator>, context: &dyn Context) -> bool {
    let parties = context.parties();
    for op in ops.iter_mut() {
        let party = parties.get(op.party as usize).unwrap_or_else(|| {
            panic!("operator {op} refers to party {} of {}", op.party, parties.len())
        });
        *op = *party.operators().get(op.id as usize).unwrap_or_else(|| {
            panic!("operator {op} out of range for party {}", party.name())
        });
    }
    ops.retain(|op| !op.is_identity());

    if context.commutes_across_parties() {
        ops.sort_by_key(|op| op.party);
    }

    ops.dedup_by(|later, earlier| later == earlier && earlier.is_idempotent());

    if context.additional_simplification(ops) {
        ops.clear();
        return true;
    }
    ops.retain(|op| !op.is_identity());
    false
}

/// Mixed-radix hash of a non-empty string of global indices.
///
/// The last index takes the smallest place value.
///
/// # Panics
/// If the hash does not fit in a `u64`.
pub fn sequence_hash<I>(globals: I, operator_count: usize) -> u64
where
    I: IntoIterator<Item = usize>,
    I::IntoIter: DoubleEndedIterator,
{
    let base = 1 + operator_count as u64;
    let mut hash = 1u64;
    let mut multiplier = 1u64;
    let mut length = 0usize;
    let mut iter = globals.into_iter().rev().peekable();
    while let Some(global) = iter.next() {
        length += 1;
        hash = (global as u64 + 1)
            .checked_mul(multiplier)
            .and_then(|term| hash.checked_add(term))
            .unwrap_or_else(|| {
                panic!("sequence hash overflow: length {length} over {operator_count} operators")
            });
        if iter.peek().is_some() {
            multiplier = multiplier.checked_mul(base).unwrap_or_else(|| {
                panic!("sequence hash overflow: length {length} over {operator_count} operators")
            });
        }
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::algebraic::{AlgebraicContext, MonomialSubstitutionRule};
    use crate::operators::{Measurement, OperatorFlags};
    use proptest::prelude::*;

    fn two_parties() -> LocalityContext {
        LocalityContext::uniform(2, 1, 3).unwrap()
    }

    #[test]
    fn hash_places_last_operator_lowest() {
        // base 3: [0, 1] -> 1 + 1*3 + 2*1 = 6 ; [1, 0] -> 1 + 2*3 + 1*1 = 8
        assert_eq!(sequence_hash([0usize, 1], 2), 6);
        assert_eq!(sequence_hash([1usize, 0], 2), 8);
        assert_eq!(sequence_hash([0usize], 2), 2);
    }

    #[test]
    #[should_panic(expected = "sequence hash overflow")]
    fn hash_overflow_is_fatal() {
        let long = vec![7usize; 40];
        sequence_hash(long, 1000);
    }

    #[test]
    fn canonical_form_sorts_parties_stably() {
        let ctx = GenericContext::with_parties(vec![
            Party::new(0, "X", 2, OperatorFlags::None),
            Party::new(1, "Y", 1, OperatorFlags::None),
        ])
        .unwrap();
        let mut ops = vec![
            Operator::generic(0, 1),
            Operator::generic(1, 0),
            Operator::generic(0, 0),
        ];
        assert!(!canonicalize(&mut ops, &ctx));
        assert_eq!(
            ops,
            vec![
                Operator::generic(1, 0),
                Operator::generic(0, 0),
                Operator::generic(0, 1)
            ]
        );
    }

    #[test]
    fn only_idempotent_repeats_collapse() {
        let ctx = GenericContext::with_parties(vec![
            Party::new(0, "P", 1, OperatorFlags::Idempotent),
            Party::new(1, "X", 1, OperatorFlags::None),
        ])
        .unwrap();
        let mut ops = vec![
            Operator::generic(0, 0),
            Operator::generic(0, 0),
            Operator::generic(0, 1),
            Operator::generic(0, 1),
        ];
        assert!(!canonicalize(&mut ops, &ctx));
        // The projector collapses; the generic operator does not.
        assert_eq!(ops.len(), 3);
        assert!(ops[0].is_idempotent());
    }

    #[test]
    fn exclusive_outcomes_vanish() {
        let ctx = two_parties();
        let a0 = ctx.measurement_operator(0, 0, 0).unwrap();
        let a1 = ctx.measurement_operator(0, 0, 1).unwrap();
        let b0 = ctx.measurement_operator(1, 0, 0).unwrap();
        // a0 b0 a1 -> a0 a1 b0 -> 0
        let mut ops = vec![a0, b0, a1];
        assert!(canonicalize(&mut ops, &ctx));
        assert!(ops.is_empty());
    }

    #[test]
    fn formatting_reserves_zero_and_one() {
        let ctx = two_parties();
        assert_eq!(ctx.format_sequence(&OperatorSequence::zero()), "0");
        assert_eq!(ctx.format_sequence(&OperatorSequence::identity()), "1");
        let a0 = ctx.measurement_operator(0, 0, 0).unwrap();
        let b1 = ctx.measurement_operator(1, 0, 1).unwrap();
        let seq = OperatorSequence::new(vec![b1, a0], &ctx);
        assert_eq!(ctx.format_sequence(&seq), "A.a0;B.a1");
    }

    #[test]
    #[should_panic(expected = "refers to party")]
    fn foreign_party_panics() {
        let ctx = GenericContext::new(2);
        let mut ops = vec![Operator::generic(0, 3)];
        canonicalize(&mut ops, &ctx);
    }

    #[test]
    fn measurement_parties_get_offsets() {
        let ctx = LocalityContext::new(vec![
            Party::with_measurements(0, [Measurement::new("a", 2)]).unwrap(),
            Party::with_measurements(1, [Measurement::new("a", 3)]).unwrap(),
        ])
        .unwrap();
        assert_eq!(ctx.size(), 3);
        let b1 = ctx.measurement_operator(1, 0, 1).unwrap();
        assert_eq!(ctx.global_index(&b1), 2);
        assert_eq!(ctx.operator(2), b1);
    }

    fn ops_of(context: &dyn Context, globals: &[usize]) -> Vec<Operator> {
        globals.iter().map(|&g| context.operator(g)).collect()
    }

    /// X0 and X1 idempotent, X0 X1 = 0.
    fn rewritten_pair() -> AlgebraicContext {
        let x0 = Operator::generic(0, 0);
        let x1 = Operator::generic(1, 0);
        AlgebraicContext::new(
            2,
            false,
            vec![
                MonomialSubstitutionRule::new(vec![x0, x0], Some(vec![x0])),
                MonomialSubstitutionRule::new(vec![x1, x1], Some(vec![x1])),
                MonomialSubstitutionRule::to_zero(vec![x0, x1]),
            ],
        )
        .unwrap()
    }

    /// Idempotence, plus the reserved hashes of zero and the identity.
    fn check_canonical_form(context: &dyn Context, globals: &[usize]) -> Result<Vec<Operator>, TestCaseError> {
        let mut once = ops_of(context, globals);
        let zero = canonicalize(&mut once, context);
        let hash = context.hash_operators(&once);
        if zero {
            prop_assert!(once.is_empty());
            return Ok(once);
        }
        let mut twice = once.clone();
        prop_assert!(!canonicalize(&mut twice, context));
        prop_assert_eq!(&twice, &once);
        prop_assert_eq!(hash == 1, once.is_empty());
        prop_assert!(hash >= 1);
        Ok(once)
    }

    proptest! {
        #[test]
        fn locality_canonical_forms(raw in prop::collection::vec(0usize..8, 0..7)) {
            let ctx = LocalityContext::uniform(2, 2, 3).unwrap();
            let canonical = check_canonical_form(&ctx, &raw)?;
            // Parties commute; projectors are idempotent.
            for pair in canonical.windows(2) {
                prop_assert!(pair[0].party <= pair[1].party);
                prop_assert_ne!(pair[0], pair[1]);
            }
        }

        #[test]
        fn locality_outcomes_are_exclusive(
            prefix in prop::collection::vec(0usize..8, 0..3),
            middle in prop::collection::vec(4usize..8, 0..3),
            first in 0usize..2,
            measurement in 0usize..2,
        ) {
            // Two distinct outcomes of one measurement of A, separated only
            // by operators of B, multiply to zero.
            let ctx = LocalityContext::uniform(2, 2, 3).unwrap();
            let a = |outcome| ctx.measurement_operator(0, measurement, outcome).unwrap();
            let mut ops = ops_of(&ctx, &prefix);
            ops.push(a(first));
            ops.extend(ops_of(&ctx, &middle));
            ops.push(a(1 - first));
            prop_assert!(canonicalize(&mut ops, &ctx));
        }

        #[test]
        fn algebraic_canonical_forms(raw in prop::collection::vec(0usize..2, 0..7)) {
            let direct = rewritten_pair();
            let canonical = check_canonical_form(&direct, &raw)?;
            // Only 1, X0, X1 and X1 X0 survive.
            for pair in canonical.windows(2) {
                prop_assert_ne!(pair[0], pair[1]);
                prop_assert!(!(pair[0].id == 0 && pair[1].id == 1));
            }

            let mut aliased = rewritten_pair();
            aliased.generate_aliases(4, 1 << 10);
            let through_aliases = check_canonical_form(&aliased, &raw)?;
            prop_assert_eq!(through_aliases, canonical);
        }

        #[test]
        fn commutative_algebraic_forms_are_sorted(raw in prop::collection::vec(0usize..3, 0..6)) {
            let ctx = AlgebraicContext::new(3, true, vec![]).unwrap();
            let canonical = check_canonical_form(&ctx, &raw)?;
            prop_assert_eq!(canonical.len(), raw.len());
            prop_assert!(canonical.windows(2).all(|pair| pair[0] <= pair[1]));
        }
    }
}
