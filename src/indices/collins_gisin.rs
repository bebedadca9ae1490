use super::combination::{CombinationIndexIterator, MultiDimensionalIndexIterator};
use super::IndexError;
use crate::context::{Context, LocalityContext};
use crate::operators::OperatorSequence;
use crate::symbols::SymbolTable;
use std::collections::BTreeMap;
use std::ops::Range;
use tracing::debug;

/// Collins–Gisin index of a locality scenario.
///
/// Keys are tuples of global measurement indices on strictly increasing
/// parties; values are symbol ids of every explicit outcome combination, the
/// last measurement's outcome varying fastest. The empty tuple maps to the
/// identity.
#[derive(Debug, Clone)]
pub struct CollinsGisinForm {
    max_parties: usize,
    measurement_parties: Vec<usize>,
    explicit_outcomes: Vec<usize>,
    spans: BTreeMap<Vec<usize>, Range<usize>>,
    data: Vec<usize>,
}

impl CollinsGisinForm {
    /// Index over joint measurements of at most `max_parties` parties.
    ///
    /// # Errors
    /// `MissingSymbol` if a product of explicit outcomes has no symbol, i.e.
    /// `max_parties` exceeds what the built moment matrices reach.
    pub fn new(context: &LocalityContext, symbols: &SymbolTable, max_parties: usize) -> Result<Self, IndexError> {
        let party_count = context.parties().len();
        let max_parties = max_parties.min(party_count);
        let mut measurement_parties = Vec::with_capacity(context.measurement_count());
        let mut explicit_outcomes = Vec::with_capacity(context.measurement_count());
        for index in 0..context.measurement_count() {
            if let (Some(address), Some(mmt)) = (context.measurement_index(index), context.global_measurement(index)) {
                measurement_parties.push(address.party);
                explicit_outcomes.push(mmt.num_operators());
            }
        }

        let mut spans = BTreeMap::new();
        let mut data = Vec::new();
        for width in 0..=max_parties {
            for party_tuple in CombinationIndexIterator::new(party_count, width) {
                let per_party: Vec<usize> = party_tuple
                    .iter()
                    .map(|&p| context.parties()[p].measurements().len())
                    .collect();
                for local in MultiDimensionalIndexIterator::new(per_party) {
                    let mut key = Vec::with_capacity(width);
                    let mut dims = Vec::with_capacity(width);
                    for (&party, &measurement) in party_tuple.iter().zip(&local) {
                        let global = context
                            .global_measurement_index(party, measurement)
                            .ok_or(IndexError::BadMeasurementIndex {
                                index: measurement,
                                count: context.measurement_count(),
                            })?;
                        key.push(global);
                        dims.push(explicit_outcomes[global]);
                    }

                    let start = data.len();
                    for outcomes in MultiDimensionalIndexIterator::new(dims) {
                        let ops = party_tuple
                            .iter()
                            .zip(&local)
                            .zip(&outcomes)
                            .filter_map(|((&party, &measurement), &outcome)| {
                                context.measurement_operator(party, measurement, outcome)
                            })
                            .collect();
                        let sequence = OperatorSequence::new(ops, context);
                        let (entry, _) = symbols.find(context, &sequence).ok_or_else(|| {
                            IndexError::MissingSymbol {
                                sequence: context.format_sequence(&sequence),
                            }
                        })?;
                        data.push(entry.id());
                    }
                    spans.insert(key, start..data.len());
                }
            }
        }
        debug!(max_parties, tuples = spans.len(), symbols = data.len(), "Collins-Gisin form built");
        Ok(Self {
            max_parties,
            measurement_parties,
            explicit_outcomes,
            spans,
            data,
        })
    }

    #[inline]
    pub fn max_parties(&self) -> usize {
        self.max_parties
    }

    /// Explicit outcomes of global measurement `index`.
    #[inline]
    pub fn explicit_outcomes(&self, index: usize) -> Option<usize> {
        self.explicit_outcomes.get(index).copied()
    }

    fn validate(&self, measurements: &[usize]) -> Result<(), IndexError> {
        if measurements.len() > self.max_parties {
            return Err(IndexError::TooManyParties {
                requested: measurements.len(),
                max: self.max_parties,
            });
        }
        let mut previous: Option<usize> = None;
        for &index in measurements {
            let party = *self.measurement_parties.get(index).ok_or(IndexError::BadMeasurementIndex {
                index,
                count: self.measurement_parties.len(),
            })?;
            if let Some(previous) = previous.filter(|&previous| previous >= party) {
                return Err(IndexError::UnorderedMeasurements { party, previous });
            }
            previous = Some(party);
        }
        Ok(())
    }

    /// Symbol ids for every explicit outcome of a joint measurement.
    pub fn get(&self, measurements: &[usize]) -> Result<&[usize], IndexError> {
        self.validate(measurements)?;
        let span = self.spans[measurements].clone();
        Ok(&self.data[span])
    }

    /// Symbol ids of a joint measurement with some outcomes fixed.
    ///
    /// `outcomes[i] == None` leaves measurement `i` free.
    ///
    /// # Panics
    /// If `outcomes` and `measurements` differ in length.
    pub fn get_with_outcomes(&self, measurements: &[usize], outcomes: &[Option<usize>]) -> Result<Vec<usize>, IndexError> {
        assert_eq!(
            measurements.len(),
            outcomes.len(),
            "one outcome slot per measurement"
        );
        let span = self.get(measurements)?;
        let dims: Vec<usize> = measurements.iter().map(|&m| self.explicit_outcomes[m]).collect();
        for ((&measurement, &outcome), &count) in measurements.iter().zip(outcomes).zip(&dims) {
            if let Some(outcome) = outcome.filter(|&outcome| outcome >= count) {
                return Err(IndexError::BadOutcome {
                    measurement,
                    outcome,
                    count,
                });
            }
        }
        Ok(MultiDimensionalIndexIterator::new(dims)
            .zip(span)
            .filter(|(combination, _)| {
                combination
                    .iter()
                    .zip(outcomes)
                    .all(|(actual, wanted)| wanted.map_or(true, |w| w == *actual))
            })
            .map(|(_, &id)| id)
            .collect())
    }

    /// Every indexed measurement tuple with its span into the symbol data.
    pub(crate) fn spans(&self) -> &BTreeMap<Vec<usize>, Range<usize>> {
        &self.spans
    }

    /// Number of indexed measurement tuples.
    #[inline]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::OperatorMatrix;

    fn chsh() -> (LocalityContext, SymbolTable) {
        let ctx = LocalityContext::uniform(2, 2, 2).unwrap();
        let mut symbols = SymbolTable::new();
        OperatorMatrix::moment_matrix(&ctx, &mut symbols, 1);
        (ctx, symbols)
    }

    #[test]
    fn chsh_tuples() {
        let (ctx, symbols) = chsh();
        let cg = CollinsGisinForm::new(&ctx, &symbols, 2).unwrap();
        // (), 4 singles, 4 pairs
        assert_eq!(cg.len(), 9);
        assert_eq!(cg.get(&[]).unwrap(), &[1]);

        let a0 = ctx.measurement_operator(0, 0, 0).unwrap();
        let b1 = ctx.measurement_operator(1, 1, 0).unwrap();
        let joint = symbols
            .find(&ctx, &OperatorSequence::new(vec![a0, b1], &ctx))
            .unwrap()
            .0
            .id();
        assert_eq!(cg.get(&[0, 3]).unwrap(), &[joint]);
    }

    #[test]
    fn lookups_are_validated() {
        let (ctx, symbols) = chsh();
        let cg = CollinsGisinForm::new(&ctx, &symbols, 2).unwrap();
        assert_eq!(
            cg.get(&[4]),
            Err(IndexError::BadMeasurementIndex { index: 4, count: 4 })
        );
        assert_eq!(
            cg.get(&[2, 0]),
            Err(IndexError::UnorderedMeasurements { party: 0, previous: 1 })
        );
        assert_eq!(
            cg.get(&[0, 1]),
            Err(IndexError::UnorderedMeasurements { party: 0, previous: 0 })
        );
        assert_eq!(
            cg.get(&[0, 2, 3]),
            Err(IndexError::TooManyParties { requested: 3, max: 2 })
        );
    }

    #[test]
    fn fixed_outcomes_filter_the_span() {
        let ctx = LocalityContext::uniform(2, 1, 3).unwrap();
        let mut symbols = SymbolTable::new();
        OperatorMatrix::moment_matrix(&ctx, &mut symbols, 1);
        let cg = CollinsGisinForm::new(&ctx, &symbols, 2).unwrap();
        let full = cg.get(&[0, 1]).unwrap().to_vec();
        assert_eq!(full.len(), 4);
        assert_eq!(cg.get_with_outcomes(&[0, 1], &[Some(1), None]).unwrap(), full[2..].to_vec());
        assert_eq!(cg.get_with_outcomes(&[0, 1], &[None, Some(0)]).unwrap(), vec![full[0], full[2]]);
        assert_eq!(
            cg.get_with_outcomes(&[0, 1], &[Some(2), None]),
            Err(IndexError::BadOutcome { measurement: 0, outcome: 2, count: 2 })
        );
    }

    #[test]
    fn unreachable_products_are_missing() {
        let ctx = LocalityContext::uniform(3, 1, 2).unwrap();
        let mut symbols = SymbolTable::new();
        OperatorMatrix::moment_matrix(&ctx, &mut symbols, 1);
        assert!(matches!(
            CollinsGisinForm::new(&ctx, &symbols, 3),
            Err(IndexError::MissingSymbol { .. })
        ));
        assert!(CollinsGisinForm::new(&ctx, &symbols, 2).is_ok());
    }
}
