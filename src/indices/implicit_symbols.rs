use super::combination::MultiDimensionalIndexIterator;
use super::{CollinsGisinForm, IndexError};
use crate::context::{Context, LocalityContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;
use tracing::debug;

/// A joint outcome as a linear combination of symbols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PMODefinition {
    /// Symbol of the outcome, when every outcome in it is explicit.
    pub symbol_id: Option<usize>,
    /// `(symbol id, coefficient)` pairs, ascending by id.
    pub expression: Vec<(usize, f64)>,
}

/// Every joint outcome of every Collins–Gisin tuple, explicit or not.
///
/// An implicit last outcome is replaced by `1 - Σ explicit`, and the product
/// expanded by inclusion–exclusion over the implicit positions.
#[derive(Debug, Clone)]
pub struct ImplicitSymbols {
    max_parties: usize,
    spans: BTreeMap<Vec<usize>, Range<usize>>,
    data: Vec<PMODefinition>,
}

impl ImplicitSymbols {
    /// # Errors
    /// `IncompleteMeasurement` if a measurement does not sum to the identity.
    pub fn new(context: &LocalityContext, cg: &CollinsGisinForm) -> Result<Self, IndexError> {
        for party in context.parties() {
            if let Some(mmt) = party.measurements().iter().find(|mmt| !mmt.complete) {
                return Err(IndexError::IncompleteMeasurement {
                    party: party.id() as usize,
                    measurement: mmt.index(),
                });
            }
        }

        let mut spans = BTreeMap::new();
        let mut data = Vec::new();
        for (measurements, _) in cg.spans() {
            let dims: Vec<usize> = measurements
                .iter()
                .filter_map(|&m| context.global_measurement(m).map(|mmt| mmt.num_outcomes))
                .collect();
            let start = data.len();
            for outcomes in MultiDimensionalIndexIterator::new(dims) {
                data.push(Self::definition(context, cg, measurements, &outcomes)?);
            }
            spans.insert(measurements.clone(), start..data.len());
        }
        debug!(tuples = spans.len(), outcomes = data.len(), "implicit symbols built");
        Ok(Self {
            max_parties: cg.max_parties(),
            spans,
            data,
        })
    }

    fn definition(
        context: &LocalityContext,
        cg: &CollinsGisinForm,
        measurements: &[usize],
        outcomes: &[usize],
    ) -> Result<PMODefinition, IndexError> {
        let implicit: Vec<usize> = (0..measurements.len())
            .filter(|&i| {
                context
                    .global_measurement(measurements[i])
                    .is_some_and(|mmt| mmt.is_implicit_outcome(outcomes[i]))
            })
            .collect();

        if implicit.is_empty() {
            let fixed: Vec<Option<usize>> = outcomes.iter().copied().map(Some).collect();
            let ids = cg.get_with_outcomes(measurements, &fixed)?;
            return Ok(PMODefinition {
                symbol_id: ids.first().copied(),
                expression: ids.into_iter().map(|id| (id, 1.0)).collect(),
            });
        }

        // Subsets J of the implicit positions: keep J summed, drop the rest.
        let mut expression: BTreeMap<usize, f64> = BTreeMap::new();
        for mask in 0u64..(1u64 << implicit.len()) {
            let mut sub_measurements = Vec::with_capacity(measurements.len());
            let mut sub_outcomes = Vec::with_capacity(measurements.len());
            for (i, (&measurement, &outcome)) in measurements.iter().zip(outcomes).enumerate() {
                match implicit.iter().position(|&p| p == i) {
                    None => {
                        sub_measurements.push(measurement);
                        sub_outcomes.push(Some(outcome));
                    }
                    Some(bit) if mask & (1 << bit) != 0 => {
                        sub_measurements.push(measurement);
                        sub_outcomes.push(None);
                    }
                    Some(_) => {}
                }
            }
            let sign = if mask.count_ones() % 2 == 0 { 1.0 } else { -1.0 };
            for id in cg.get_with_outcomes(&sub_measurements, &sub_outcomes)? {
                *expression.entry(id).or_insert(0.0) += sign;
            }
        }
        expression.retain(|_, coefficient| *coefficient != 0.0);
        Ok(PMODefinition {
            symbol_id: None,
            expression: expression.into_iter().collect(),
        })
    }

    /// Definitions for every joint outcome of `measurements`, last
    /// measurement's outcome fastest.
    pub fn get(&self, measurements: &[usize]) -> Result<&[PMODefinition], IndexError> {
        if measurements.len() > self.max_parties {
            return Err(IndexError::TooManyParties {
                requested: measurements.len(),
                max: self.max_parties,
            });
        }
        let span = self
            .spans
            .get(measurements)
            .ok_or_else(|| IndexError::UnknownMeasurements {
                measurements: measurements.to_vec(),
            })?;
        Ok(&self.data[span.clone()])
    }

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
    use crate::operators::{Measurement, OperatorSequence, Party};
    use crate::symbols::SymbolTable;

    fn scenario(parties: usize, outcomes: usize) -> (LocalityContext, SymbolTable, CollinsGisinForm) {
        let ctx = LocalityContext::uniform(parties, 1, outcomes).unwrap();
        let mut symbols = SymbolTable::new();
        OperatorMatrix::moment_matrix(&ctx, &mut symbols, 1);
        let cg = CollinsGisinForm::new(&ctx, &symbols, parties).unwrap();
        (ctx, symbols, cg)
    }

    #[test]
    fn single_measurement_last_outcome() {
        let (ctx, _, cg) = scenario(1, 3);
        let implicit = ImplicitSymbols::new(&ctx, &cg).unwrap();
        let explicit = cg.get(&[0]).unwrap().to_vec();
        let table = implicit.get(&[0]).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table[0].symbol_id, Some(explicit[0]));
        assert_eq!(table[1].expression, vec![(explicit[1], 1.0)]);
        assert_eq!(table[2].symbol_id, None);
        assert_eq!(
            table[2].expression,
            vec![(1, 1.0), (explicit[0], -1.0), (explicit[1], -1.0)]
        );
        assert_eq!(implicit.get(&[]).unwrap()[0].expression, vec![(1, 1.0)]);
    }

    #[test]
    fn joint_last_outcomes_expand() {
        let (ctx, symbols, cg) = scenario(2, 2);
        let implicit = ImplicitSymbols::new(&ctx, &cg).unwrap();
        let a = cg.get(&[0]).unwrap()[0];
        let b = cg.get(&[1]).unwrap()[0];
        let ab = cg.get(&[0, 1]).unwrap()[0];
        assert_eq!(
            ab,
            symbols
                .find(
                    &ctx,
                    &OperatorSequence::new(
                        vec![
                            ctx.measurement_operator(0, 0, 0).unwrap(),
                            ctx.measurement_operator(1, 0, 0).unwrap()
                        ],
                        &ctx
                    )
                )
                .unwrap()
                .0
                .id()
        );
        let table = implicit.get(&[0, 1]).unwrap();
        // P(0,1) = P_A(0) - P(0,0)
        assert_eq!(table[1].expression, vec![(a, 1.0), (ab, -1.0)]);
        // P(1,1) = 1 - P_A(0) - P_B(0) + P(0,0)
        let mut expected = vec![(1, 1.0), (a, -1.0), (b, -1.0), (ab, 1.0)];
        expected.sort_by_key(|(id, _)| *id);
        assert_eq!(table[3].expression, expected);
    }

    #[test]
    fn lookups_name_the_failure() {
        let (ctx, _, cg) = scenario(2, 2);
        let implicit = ImplicitSymbols::new(&ctx, &cg).unwrap();
        assert_eq!(
            implicit.get(&[1, 0]).unwrap_err(),
            IndexError::UnknownMeasurements { measurements: vec![1, 0] }
        );
        assert_eq!(
            implicit.get(&[0, 0]).unwrap_err(),
            IndexError::UnknownMeasurements { measurements: vec![0, 0] }
        );
        assert_eq!(
            implicit.get(&[0, 1, 0]).unwrap_err(),
            IndexError::TooManyParties { requested: 3, max: 2 }
        );
        assert!(implicit.get(&[0, 1]).is_ok());
    }

    #[test]
    fn incomplete_measurements_are_rejected() {
        let party = Party::with_measurements(0, [Measurement::with_flags("a", 2, true, false)]).unwrap();
        let ctx = LocalityContext::new(vec![party]).unwrap();
        let mut symbols = SymbolTable::new();
        OperatorMatrix::moment_matrix(&ctx, &mut symbols, 1);
        let cg = CollinsGisinForm::new(&ctx, &symbols, 1).unwrap();
        assert_eq!(
            ImplicitSymbols::new(&ctx, &cg).unwrap_err(),
            IndexError::IncompleteMeasurement { party: 0, measurement: 0 }
        );
    }
}
