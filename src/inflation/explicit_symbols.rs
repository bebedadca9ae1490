use super::canonical_observables::CanonicalObservables;
use super::context::InflationContext;
use crate::context::Context;
use crate::indices::{IndexError, MultiDimensionalIndexIterator};
use crate::operators::OperatorSequence;
use crate::symbols::SymbolTable;
use std::collections::BTreeMap;
use std::ops::Range;

/// Symbols of the explicit outcomes of every compatible canonical observable
/// tuple, up to a maximum tuple length.
///
/// Within a span, the last variant's outcome varies fastest.
#[derive(Debug, Clone, Default)]
pub struct InflationExplicitSymbols {
    level: usize,
    spans: BTreeMap<usize, Range<usize>>,
    data: Vec<usize>,
}

impl InflationExplicitSymbols {
    /// Index over canonical tuples of length at most `level`.
    ///
    /// # Errors
    /// `MissingSymbol` if an outcome product has no symbol yet.
    pub fn new(
        context: &InflationContext,
        symbols: &SymbolTable,
        canonical: &CanonicalObservables,
        level: usize,
    ) -> Result<Self, IndexError> {
        let mut spans = BTreeMap::new();
        let mut data = Vec::new();
        for observable in canonical.iter().filter(|o| o.compatible && o.len() <= level) {
            let start = data.len();
            let variants: Vec<_> = observable.variants.iter().map(|&v| context.variant_at(v)).collect();
            let dims = variants
                .iter()
                .map(|v| context.observables()[v.observable].operators_per_variant)
                .collect();
            for outcomes in MultiDimensionalIndexIterator::new(dims) {
                let ops = variants
                    .iter()
                    .zip(&outcomes)
                    .map(|(variant, &outcome)| context.operators()[variant.operator_offset + outcome])
                    .collect();
                let sequence = OperatorSequence::new(ops, context);
                let (entry, _) = symbols.find(context, &sequence).ok_or_else(|| IndexError::MissingSymbol {
                    sequence: context.format_sequence(&sequence),
                })?;
                data.push(entry.id());
            }
            spans.insert(observable.index, start..data.len());
        }
        Ok(Self { level, spans, data })
    }

    #[inline]
    pub fn level(&self) -> usize {
        self.level
    }

    /// Symbols for the variants' explicit outcomes, via their canonical tuple.
    pub fn get(&self, canonical: &CanonicalObservables, variants: &[usize]) -> Option<&[usize]> {
        let entry = canonical.canonical(variants)?;
        let span = self.spans.get(&entry.index)?;
        Some(&self.data[span.clone()])
    }

    /// Number of indexed tuples.
    #[inline]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}
