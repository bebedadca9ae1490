//! Monomial substitution rules.
//!
//! A rule rewrites a word `lhs` to `rhs` (or to zero). Rules are oriented so
//! the left-hand side has the larger hash; since the sequence hash is a
//! shortlex order compatible with concatenation, every rewrite strictly
//! decreases the word and reduction terminates. The book is closed under
//! conjugation: for every rule `l → r` it also holds `l* → r*`.
//!
//! No completion is attempted. Reduction applies the rules as given, so
//! normal forms are unique only when the rule set happens to be confluent.
//!
//! # Citations
//! - Book & Otto, "String-Rewriting Systems" (1993), §2.2 – length-lexicographic orderings

use crate::context::{sequence_hash, ContextError};
use crate::operators::Operator;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// `lhs → rhs`, with `rhs == None` meaning `lhs → 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonomialSubstitutionRule {
    lhs: Vec<Operator>,
    rhs: Option<Vec<Operator>>,
    lhs_hash: u64,
    rhs_hash: u64,
}

impl MonomialSubstitutionRule {
    /// Unoriented rule; [`RuleBook::new`] validates and orients it.
    pub fn new(lhs: Vec<Operator>, rhs: Option<Vec<Operator>>) -> Self {
        Self {
            lhs,
            rhs,
            lhs_hash: 0,
            rhs_hash: 0,
        }
    }

    /// `lhs → 0`.
    pub fn to_zero(lhs: Vec<Operator>) -> Self {
        Self::new(lhs, None)
    }

    #[inline]
    pub fn lhs(&self) -> &[Operator] {
        &self.lhs
    }

    #[inline]
    pub fn rhs(&self) -> Option<&[Operator]> {
        self.rhs.as_deref()
    }

    #[inline]
    pub fn lhs_hash(&self) -> u64 {
        self.lhs_hash
    }

    #[inline]
    pub fn rhs_hash(&self) -> u64 {
        self.rhs_hash
    }

    fn word_hash(word: &[Operator], operator_count: usize) -> u64 {
        if word.is_empty() {
            1
        } else {
            sequence_hash(word.iter().map(|op| op.id as usize), operator_count)
        }
    }

    /// Orients by hash; `None` if both sides are the same word.
    fn oriented(mut self, operator_count: usize) -> Option<Self> {
        self.lhs_hash = Self::word_hash(&self.lhs, operator_count);
        self.rhs_hash = match &self.rhs {
            Some(rhs) => Self::word_hash(rhs, operator_count),
            None => 0,
        };
        if self.lhs_hash == self.rhs_hash {
            return None;
        }
        if self.lhs_hash < self.rhs_hash {
            // Only possible when both sides are words.
            if let Some(rhs) = self.rhs.take() {
                self.rhs = Some(std::mem::replace(&mut self.lhs, rhs));
                std::mem::swap(&mut self.lhs_hash, &mut self.rhs_hash);
            }
        }
        Some(self)
    }

    fn conjugate(&self) -> Self {
        let reverse = |word: &[Operator]| word.iter().rev().copied().collect::<Vec<_>>();
        Self::new(reverse(&self.lhs), self.rhs.as_deref().map(reverse))
    }

    fn sorted(mut self) -> Self {
        self.lhs.sort();
        if let Some(rhs) = self.rhs.as_mut() {
            rhs.sort();
        }
        self
    }
}

/// An oriented, conjugation-closed set of substitution rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleBook {
    rules: Vec<MonomialSubstitutionRule>,
    commutative: bool,
}

impl RuleBook {
    /// Validates and orients `rules` over a single party of `operator_count`
    /// operators, adding the conjugate of every rule.
    ///
    /// When `commutative`, both sides are sorted first and rules that become
    /// trivial are dropped.
    pub fn new(
        rules: Vec<MonomialSubstitutionRule>,
        operator_count: usize,
        commutative: bool,
    ) -> Result<Self, ContextError> {
        let mut oriented: Vec<MonomialSubstitutionRule> = Vec::new();
        for (index, rule) in rules.into_iter().enumerate() {
            if rule.lhs.is_empty() {
                return Err(ContextError::EmptyRule { rule: index });
            }
            for op in rule.lhs.iter().chain(rule.rhs.iter().flatten()) {
                if op.party != 0 {
                    return Err(ContextError::PartyOutOfRange {
                        party: op.party as usize,
                        count: 1,
                    });
                }
                if op.id as usize >= operator_count {
                    return Err(ContextError::OperatorOutOfRange {
                        party: 0,
                        operator: op.id as usize,
                        count: operator_count,
                    });
                }
            }

            let rule = if commutative { rule.sorted() } else { rule };
            let described = rule.lhs.iter().join(" ");
            let conjugate = rule.conjugate();
            let Some(rule) = rule.oriented(operator_count) else {
                if commutative {
                    debug!(rule = index, "dropping rule made trivial by commutation");
                    continue;
                }
                return Err(ContextError::TrivialRule {
                    rule: index,
                    sequence: described,
                });
            };
            let conjugate = if commutative { None } else { conjugate.oriented(operator_count) };

            for candidate in std::iter::once(rule).chain(conjugate) {
                let duplicate = oriented.iter().any(|existing| {
                    existing.lhs_hash == candidate.lhs_hash && existing.rhs_hash == candidate.rhs_hash
                });
                if !duplicate {
                    oriented.push(candidate);
                }
            }
        }
        oriented.sort_by_key(|rule| (rule.lhs_hash, rule.rhs_hash));
        debug!(rules = oriented.len(), commutative, "built rule book");
        Ok(Self {
            rules: oriented,
            commutative,
        })
    }

    #[inline]
    pub fn rules(&self) -> &[MonomialSubstitutionRule] {
        &self.rules
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[inline]
    pub fn is_commutative(&self) -> bool {
        self.commutative
    }

    /// Rewrites `word` until no rule applies. Returns `true` if it reduced to zero.
    ///
    /// A commutative book expects (and leaves) `word` sorted.
    pub fn reduce(&self, word: &mut Vec<Operator>) -> bool {
        'rewrite: loop {
            for rule in &self.rules {
                if self.commutative {
                    if let Some(rest) = remove_submultiset(word, &rule.lhs) {
                        let Some(rhs) = &rule.rhs else {
                            return true;
                        };
                        *word = rest;
                        word.extend_from_slice(rhs);
                        word.sort();
                        continue 'rewrite;
                    }
                } else if let Some(position) = find_subword(word, &rule.lhs) {
                    let Some(rhs) = &rule.rhs else {
                        return true;
                    };
                    word.splice(position..position + rule.lhs.len(), rhs.iter().copied());
                    continue 'rewrite;
                }
            }
            return false;
        }
    }
}

/// Leftmost occurrence of `needle` in `haystack`.
fn find_subword(haystack: &[Operator], needle: &[Operator]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// `haystack` minus the multiset `needle`, if `needle` is contained. Both sorted.
fn remove_submultiset(haystack: &[Operator], needle: &[Operator]) -> Option<Vec<Operator>> {
    let mut rest = Vec::with_capacity(haystack.len());
    let mut wanted = needle.iter().peekable();
    for op in haystack {
        if wanted.peek() == Some(&op) {
            wanted.next();
        } else {
            rest.push(*op);
        }
    }
    wanted.peek().is_none().then_some(rest)
}
