//! Factorization of inflation moments.
//!
//! Operators on disjoint source copies are statistically independent, so a
//! moment over them is the product of the moments of its factors. The table
//! records, for every symbol, its factors and their canonical forms, adding
//! any factor the symbol table has not seen yet.

use super::context::InflationContext;
use crate::context::Context;
use crate::operators::OperatorSequence;
use crate::symbols::SymbolTable;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Range;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactorTableError {
    #[error("factor table did not reach a fixed point after {iterations} passes ({pending} symbols pending)")]
    NoFixedPoint { iterations: usize, pending: usize },
}

/// Factors of one moment, with their symbol ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FactorSequences {
    pub sequences: Vec<OperatorSequence>,
    pub symbols: Vec<usize>,
}

/// Factorization of one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactorEntry {
    pub id: usize,
    /// Factors as they appear, ordered by hash.
    pub raw: FactorSequences,
    /// Canonical form of each factor; symbols ascending.
    pub canonical: FactorSequences,
}

impl FactorEntry {
    /// Number of independent factors.
    #[inline]
    pub fn factor_count(&self) -> usize {
        self.raw.sequences.len()
    }
}

/// Factorization of every symbol in a symbol table, kept in step with it.
///
/// # Invariants
/// - `entries[i].id == i`.
/// - After a successful `on_new_symbols_added`, every symbol has an entry and
///   every factor (raw or canonical) is itself a symbol.
#[derive(Debug, Clone, Default)]
pub struct FactorTable {
    entries: Vec<FactorEntry>,
    by_canonical_factors: BTreeMap<Vec<usize>, usize>,
}

impl FactorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings the table level with `symbols`, which may grow as factors are
    /// merged in. Returns the number of entries added.
    ///
    /// Each pass factorizes the pending symbols and links their canonical
    /// factors; passes repeat until no new symbols appear, at most
    /// `iteration_limit` times.
    pub fn on_new_symbols_added(
        &mut self,
        context: &InflationContext,
        symbols: &mut SymbolTable,
        iteration_limit: usize,
    ) -> Result<usize, FactorTableError> {
        let initial = self.entries.len();
        let mut iterations = 0;
        while self.entries.len() < symbols.len() {
            if iterations == iteration_limit {
                return Err(FactorTableError::NoFixedPoint {
                    iterations,
                    pending: symbols.len() - self.entries.len(),
                });
            }
            iterations += 1;
            let range = self.entries.len()..symbols.len();
            self.check_for_new_factors(context, symbols, range.clone());
            self.check_and_link_canonical_moments(context, symbols, range);
        }
        debug!(
            added = self.entries.len() - initial,
            iterations,
            symbols = symbols.len(),
            "factor table updated"
        );
        Ok(self.entries.len() - initial)
    }

    fn check_for_new_factors(&mut self, context: &InflationContext, symbols: &mut SymbolTable, range: Range<usize>) {
        for id in range {
            let sequences = context.factorize(symbols[id].sequence());
            let factor_symbols = sequences
                .iter()
                .map(|factor| symbols.merge_in_sequence(context, factor.clone()).id)
                .collect();
            self.entries.push(FactorEntry {
                id,
                raw: FactorSequences {
                    sequences,
                    symbols: factor_symbols,
                },
                canonical: FactorSequences::default(),
            });
        }
    }

    fn check_and_link_canonical_moments(
        &mut self,
        context: &InflationContext,
        symbols: &mut SymbolTable,
        range: Range<usize>,
    ) {
        for id in range {
            let mut canonical: Vec<(usize, OperatorSequence)> = self.entries[id]
                .raw
                .sequences
                .iter()
                .map(|factor| {
                    let moment = context.canonical_moment(factor);
                    (symbols.merge_in_sequence(context, moment.clone()).id, moment)
                })
                .collect();
            canonical.sort_by_key(|(symbol, _)| *symbol);
            let (ids, sequences): (Vec<usize>, Vec<OperatorSequence>) = canonical.into_iter().unzip();
            self.by_canonical_factors.entry(ids.clone()).or_insert(id);
            self.entries[id].canonical = FactorSequences { sequences, symbols: ids };
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<&FactorEntry> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FactorEntry> {
        self.entries.iter()
    }

    /// First symbol whose canonical factors are `factors` (ascending).
    pub fn find_by_canonical_factors(&self, factors: &[usize]) -> Option<usize> {
        self.by_canonical_factors.get(factors).copied()
    }

    /// Symbol with the same canonical factorization as `sequence`, if any.
    pub fn canonical_symbol(&self, context: &InflationContext, symbols: &SymbolTable, sequence: &OperatorSequence) -> Option<usize> {
        let mut ids = context
            .factorize(sequence)
            .iter()
            .map(|factor| symbols.hash_to_index(context.hash(&context.canonical_moment(factor))).map(|lookup| lookup.id))
            .collect::<Option<Vec<usize>>>()?;
        ids.sort_unstable();
        self.find_by_canonical_factors(&ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inflation::CausalNetwork;
    use crate::matrix::OperatorMatrix;
    use crate::operators::Operator;
    use std::collections::BTreeSet;

    fn triangle() -> InflationContext {
        let network = CausalNetwork::new(
            vec![2, 2, 2],
            vec![
                BTreeSet::from([0, 1]),
                BTreeSet::from([1, 2]),
                BTreeSet::from([0, 2]),
            ],
        )
        .unwrap();
        InflationContext::new(network, 2).unwrap()
    }

    fn op(ctx: &InflationContext, observable: usize, indices: &[usize]) -> Operator {
        let variant = ctx.observables()[observable].variant_index(indices);
        ctx.operator_for(observable, variant, 0).unwrap()
    }

    fn symbol_of(ctx: &InflationContext, symbols: &SymbolTable, ops: Vec<Operator>) -> usize {
        symbols.find(ctx, &OperatorSequence::new(ops, ctx)).unwrap().0.id()
    }

    #[test]
    fn factors_reach_a_fixed_point() {
        let ctx = triangle();
        let mut symbols = SymbolTable::new();
        OperatorMatrix::moment_matrix(&ctx, &mut symbols, 1);
        let mut table = FactorTable::new();
        let added = table.on_new_symbols_added(&ctx, &mut symbols, 8).unwrap();
        assert_eq!(added, symbols.len());
        assert_eq!(table.len(), symbols.len());
        assert_eq!(table.on_new_symbols_added(&ctx, &mut symbols, 8).unwrap(), 0);

        assert_eq!(table.get(0).unwrap().raw.symbols, vec![0]);
        assert!(table.get(1).unwrap().raw.symbols.is_empty());
        assert_eq!(table.find_by_canonical_factors(&[]), Some(1));
    }

    #[test]
    fn independent_operators_split() {
        let ctx = triangle();
        let mut symbols = SymbolTable::new();
        OperatorMatrix::moment_matrix(&ctx, &mut symbols, 1);
        let mut table = FactorTable::new();
        table.on_new_symbols_added(&ctx, &mut symbols, 8).unwrap();

        let a = op(&ctx, 0, &[0, 0]);
        let b_far = op(&ctx, 1, &[1, 1]);
        let b_near = op(&ctx, 1, &[0, 0]);
        let joint = symbol_of(&ctx, &symbols, vec![a, b_far]);
        let entry = table.get(joint).unwrap();
        assert_eq!(entry.factor_count(), 2);

        let mut expected = vec![
            symbol_of(&ctx, &symbols, vec![a]),
            symbol_of(&ctx, &symbols, vec![b_near]),
        ];
        expected.sort_unstable();
        assert_eq!(entry.canonical.symbols, expected);

        // A[0,0] B[0,0] shares a source copy and does not split.
        let linked = symbol_of(&ctx, &symbols, vec![a, b_near]);
        assert_eq!(table.get(linked).unwrap().factor_count(), 1);
        assert_eq!(
            table.canonical_symbol(&ctx, &symbols, &OperatorSequence::new(vec![b_far, a], &ctx)),
            table.find_by_canonical_factors(&expected)
        );
    }

    #[test]
    fn iteration_limit_is_enforced() {
        let ctx = triangle();
        let mut symbols = SymbolTable::new();
        OperatorMatrix::moment_matrix(&ctx, &mut symbols, 1);
        let pending = symbols.len();
        let mut table = FactorTable::new();
        assert_eq!(
            table.on_new_symbols_added(&ctx, &mut symbols, 0),
            Err(FactorTableError::NoFixedPoint { iterations: 0, pending })
        );
    }
}
