//! The base context: parties of raw operators.

use super::{Context, ContextError};
use crate::operators::{Operator, OperatorFlags, Party};

/// Parties of raw operators with optional declared exclusions.
///
/// Operators of different parties commute; operators of one party do not,
/// unless the party declared them idempotent or mutually exclusive.
#[derive(Debug, Clone)]
pub struct GenericContext {
    parties: Vec<Party>,
    operators: Vec<Operator>,
}

impl GenericContext {
    /// One party `X` of `operator_count` generic Hermitian operators.
    pub fn new(operator_count: usize) -> Self {
        let party = Party::new(0, "X", operator_count, OperatorFlags::None);
        let operators = party.operators().to_vec();
        Self {
            parties: vec![party],
            operators,
        }
    }

    /// Context over the given parties, renumbered in order.
    pub fn with_parties(mut parties: Vec<Party>) -> Result<Self, ContextError> {
        let mut offset = 0;
        for (id, party) in parties.iter_mut().enumerate() {
            party.reenumerate(id as u32, offset);
            offset += party.len();
        }
        if offset == 0 {
            return Err(ContextError::NoOperators);
        }
        let operators = parties
            .iter()
            .flat_map(|party| party.operators().iter().copied())
            .collect();
        Ok(Self { parties, operators })
    }
}

impl Context for GenericContext {
    fn parties(&self) -> &[Party] {
        &self.parties
    }

    fn operators(&self) -> &[Operator] {
        &self.operators
    }
}
