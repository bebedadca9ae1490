//! Locality: parties performing projective measurements.
//!
//! Measurements are numbered globally, party-major: party 0's measurements
//! first, then party 1's, and so on. Collins–Gisin and implicit-symbol indices
//! address measurements by this global number.

use super::{Context, ContextError};
use crate::namer::AlphabeticNamer;
use crate::operators::{Measurement, Operator, Party};
use serde::{Deserialize, Serialize};

/// Global address of a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeasurementIndex {
    pub party: usize,
    pub measurement: usize,
}

/// Parties of measurements; operators of different parties commute.
#[derive(Debug, Clone)]
pub struct LocalityContext {
    parties: Vec<Party>,
    operators: Vec<Operator>,
    measurements: Vec<MeasurementIndex>,
    nonhermitian: bool,
}

impl LocalityContext {
    /// Context over the given parties, renumbered in order.
    pub fn new(mut parties: Vec<Party>) -> Result<Self, ContextError> {
        let mut offset = 0;
        let mut measurements = Vec::new();
        for (id, party) in parties.iter_mut().enumerate() {
            party.reenumerate(id as u32, offset);
            offset += party.len();
            measurements.extend((0..party.measurements().len()).map(|measurement| {
                MeasurementIndex {
                    party: id,
                    measurement,
                }
            }));
        }
        if offset == 0 {
            return Err(ContextError::NoOperators);
        }
        let operators = parties
            .iter()
            .flat_map(|party| party.operators().iter().copied())
            .collect();

        // A product is self-adjoint when every party contributes commuting
        // projectors: one projective measurement and no loose operators.
        let nonhermitian = parties.iter().any(|party| {
            let loose = party.len()
                != party
                    .measurements()
                    .iter()
                    .map(Measurement::num_operators)
                    .sum::<usize>();
            loose
                || party.measurements().len() > 1
                || party.measurements().iter().any(|mmt| !mmt.projective)
        });

        Ok(Self {
            parties,
            operators,
            measurements,
            nonhermitian,
        })
    }

    /// `parties` parties, each with `measurements` complete projective
    /// measurements of `outcomes` outcomes, named `A`, `B`, ... and `a`, `b`, ...
    pub fn uniform(parties: usize, measurements: usize, outcomes: usize) -> Result<Self, ContextError> {
        let names = AlphabeticNamer::lower();
        let parties = (0..parties)
            .map(|id| {
                Party::with_measurements(
                    id as u32,
                    (0..measurements).map(|m| Measurement::new(names.index_to_name(m), outcomes)),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(parties)
    }

    /// Number of measurements across all parties.
    #[inline]
    pub fn measurement_count(&self) -> usize {
        self.measurements.len()
    }

    /// Party-local address of global measurement `index`.
    #[inline]
    pub fn measurement_index(&self, index: usize) -> Option<MeasurementIndex> {
        self.measurements.get(index).copied()
    }

    /// Global measurement `index`.
    pub fn global_measurement(&self, index: usize) -> Option<&Measurement> {
        let address = self.measurements.get(index)?;
        self.parties[address.party].measurements().get(address.measurement)
    }

    /// Global number of `party`'s measurement `measurement`.
    pub fn global_measurement_index(&self, party: usize, measurement: usize) -> Option<usize> {
        self.measurements
            .binary_search(&MeasurementIndex { party, measurement })
            .ok()
    }

    /// Outcome operator of a party-local measurement.
    pub fn measurement_operator(&self, party: usize, measurement: usize, outcome: usize) -> Option<Operator> {
        self.parties.get(party)?.measurement_operator(measurement, outcome)
    }

    /// Whether every measurement sums to the identity.
    pub fn all_measurements_complete(&self) -> bool {
        self.parties
            .iter()
            .flat_map(|party| party.measurements())
            .all(|mmt| mmt.complete)
    }
}

impl Context for LocalityContext {
    fn parties(&self) -> &[Party] {
        &self.parties
    }

    fn operators(&self) -> &[Operator] {
        &self.operators
    }

    fn can_be_nonhermitian(&self) -> bool {
        self.nonhermitian
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chsh_layout() {
        let ctx = LocalityContext::uniform(2, 2, 2).unwrap();
        assert_eq!(ctx.size(), 4);
        assert_eq!(ctx.measurement_count(), 4);
        assert_eq!(ctx.global_measurement_index(1, 0), Some(2));
        assert_eq!(
            ctx.measurement_index(3),
            Some(MeasurementIndex { party: 1, measurement: 1 })
        );
        assert_eq!(ctx.global_measurement(1).unwrap().name, "b");
        assert!(ctx.can_be_nonhermitian());
        assert!(ctx.all_measurements_complete());
    }

    #[test]
    fn single_measurement_parties_are_hermitian() {
        let ctx = LocalityContext::uniform(3, 1, 4).unwrap();
        assert!(!ctx.can_be_nonhermitian());
    }

    #[test]
    fn incomplete_measurements_detected() {
        let party = Party::with_measurements(0, [Measurement::with_flags("a", 2, true, false)]).unwrap();
        let ctx = LocalityContext::new(vec![party]).unwrap();
        assert!(!ctx.all_measurements_complete());
        assert_eq!(ctx.size(), 2);
    }

    #[test]
    fn one_outcome_measurements_have_no_operators() {
        assert_eq!(
            LocalityContext::uniform(2, 1, 1).unwrap_err(),
            ContextError::NoOperators
        );
    }
}
