//! Algebraic contexts: one party of Hermitian operators subject to monomial
//! substitution rules.
//!
//! Reduction consults a table of pre-computed aliases (raw word hash → reduced
//! word) for short words, and falls back to applying the [`RuleBook`] directly.
//! Aliases are generated on demand by the algebraic matrix system before each
//! new matrix, up to the longest word that matrix can contain.

mod raw_book;
mod rules;

pub use raw_book::{RawSequence, RawSequenceBook};
pub use rules::{MonomialSubstitutionRule, RuleBook};

use super::{Context, ContextError};
use crate::operators::{Operator, OperatorFlags, Party};
use std::collections::BTreeMap;
use tracing::debug;

/// A single party of generic operators with substitution rules.
#[derive(Debug, Clone)]
pub struct AlgebraicContext {
    parties: Vec<Party>,
    operators: Vec<Operator>,
    commutative: bool,
    rules: RuleBook,
    raw_book: RawSequenceBook,
    /// Raw word hash → reduced word (`None` for zero).
    aliases: BTreeMap<u64, Option<Vec<Operator>>>,
    alias_length: usize,
}

impl AlgebraicContext {
    /// `operator_count` operators `X0, X1, ...` with the given rules.
    ///
    /// A `commutative` context additionally treats every pair of operators as
    /// commuting.
    pub fn new(
        operator_count: usize,
        commutative: bool,
        rules: Vec<MonomialSubstitutionRule>,
    ) -> Result<Self, ContextError> {
        if operator_count == 0 {
            return Err(ContextError::NoOperators);
        }
        let party = Party::new(0, "X", operator_count, OperatorFlags::None);
        let operators = party.operators().to_vec();
        let rules = RuleBook::new(rules, operator_count, commutative)?;
        Ok(Self {
            parties: vec![party],
            raw_book: RawSequenceBook::new(operators.clone()),
            operators,
            commutative,
            rules,
            aliases: BTreeMap::new(),
            alias_length: 0,
        })
    }

    #[inline]
    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    #[inline]
    pub fn is_commutative(&self) -> bool {
        self.commutative
    }

    /// Longest raw word with a pre-computed alias.
    #[inline]
    pub fn alias_length(&self) -> usize {
        self.alias_length
    }

    /// Pre-computes aliases for every raw word up to `length`.
    ///
    /// Skipped (returning `false`) when already generated, or when the number
    /// of raw words would exceed `budget`.
    pub fn generate_aliases(&mut self, length: usize, budget: usize) -> bool {
        if length <= self.alias_length {
            return false;
        }
        match self.raw_book.count_up_to(length) {
            Some(count) if count <= budget => {}
            count => {
                debug!(length, ?count, budget, "skipping alias generation");
                return false;
            }
        }
        self.raw_book.generate(length);
        for word_length in self.alias_length + 1..=length {
            for raw in self.raw_book.of_length(word_length) {
                let mut word = raw.operators.clone();
                if self.commutative {
                    word.sort();
                }
                let reduced = (!self.rules.reduce(&mut word)).then_some(word);
                self.aliases.insert(raw.raw_hash, reduced);
            }
        }
        debug!(from = self.alias_length, to = length, aliases = self.aliases.len(), "generated aliases");
        self.alias_length = length;
        true
    }
}

impl Context for AlgebraicContext {
    fn parties(&self) -> &[Party] {
        &self.parties
    }

    fn operators(&self) -> &[Operator] {
        &self.operators
    }

    fn additional_simplification(&self, ops: &mut Vec<Operator>) -> bool {
        if ops.is_empty() {
            return false;
        }
        if ops.len() <= self.alias_length {
            if let Some(alias) = self.aliases.get(&self.hash_operators(ops)) {
                return match alias {
                    Some(reduced) => {
                        ops.clone_from(reduced);
                        false
                    }
                    None => true,
                };
            }
        }
        if self.commutative {
            ops.sort();
        }
        self.rules.reduce(ops)
    }

    fn can_be_nonhermitian(&self) -> bool {
        !self.commutative
    }
}
