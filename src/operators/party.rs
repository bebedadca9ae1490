//! Parties and the measurements they perform.
//!
//! A party owns a contiguous block of operators. Operators may be declared
//! raw (`Party::new`) or generated from measurements (`Party::add_measurement`),
//! in which case each measurement with `n` outcomes contributes `n - 1`
//! operators when complete (the last outcome is implied by `Σ E_a = 1`) and `n`
//! otherwise.
//!
//! # Citations
//! - Navascués, Pironio, Acín, "A convergent hierarchy of semidefinite programs
//!   characterizing the set of quantum correlations", New J. Phys. 10 (2008)
//! - Collins & Gisin, "A relevant two qubit Bell inequality", J. Phys. A 37 (2004)

use super::operator::{Operator, OperatorFlags};
use crate::context::ContextError;
use crate::namer::AlphabeticNamer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A measurement performed by a party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    /// Display name (`a`, `b`, ... by default).
    pub name: String,
    /// Number of outcomes, including any implicit one.
    pub num_outcomes: usize,
    /// Outcome operators are orthogonal projectors.
    pub projective: bool,
    /// Outcome operators sum to the identity, so the last outcome is implicit.
    pub complete: bool,
    party: u32,
    index: usize,
    offset: u32,
}

impl Measurement {
    /// A complete, projective measurement.
    pub fn new(name: impl Into<String>, num_outcomes: usize) -> Self {
        Self::with_flags(name, num_outcomes, true, true)
    }

    /// A measurement with explicit projectivity / completeness.
    pub fn with_flags(
        name: impl Into<String>,
        num_outcomes: usize,
        projective: bool,
        complete: bool,
    ) -> Self {
        Self {
            name: name.into(),
            num_outcomes,
            projective,
            complete,
            party: 0,
            index: 0,
            offset: 0,
        }
    }

    /// Number of operators this measurement contributes.
    #[inline]
    pub fn num_operators(&self) -> usize {
        self.num_outcomes.saturating_sub(usize::from(self.complete))
    }

    /// Whether outcome `outcome` has no operator of its own.
    #[inline]
    pub fn is_implicit_outcome(&self, outcome: usize) -> bool {
        self.complete && outcome + 1 == self.num_outcomes
    }

    /// Owning party.
    #[inline]
    pub fn party(&self) -> u32 {
        self.party
    }

    /// Index of this measurement within its party.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Party-local id of the first outcome operator.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }
}

/// A party: a named block of operators with optional measurement structure.
///
/// # Invariants
/// - `operators[i].id == i` and `operators[i].party == id`.
/// - The exclusivity table only grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    id: u32,
    name: String,
    global_offset: usize,
    operators: Vec<Operator>,
    measurements: Vec<Measurement>,
    operator_to_measurement: Vec<Option<usize>>,
    mutex: BTreeSet<(u32, u32)>,
}

impl Party {
    /// Creates a party with `operator_count` raw operators sharing `flags`.
    pub fn new(id: u32, name: impl Into<String>, operator_count: usize, flags: OperatorFlags) -> Self {
        let operators = (0..operator_count as u32)
            .map(|local| Operator::new(local, id, flags))
            .collect();
        Self {
            id,
            name: name.into(),
            global_offset: 0,
            operators,
            measurements: Vec::new(),
            operator_to_measurement: vec![None; operator_count],
            mutex: BTreeSet::new(),
        }
    }

    /// Creates a party named by its index (`A`, `B`, ...) holding the given measurements.
    pub fn with_measurements(
        id: u32,
        measurements: impl IntoIterator<Item = Measurement>,
    ) -> Result<Self, ContextError> {
        let mut party = Self::new(id, AlphabeticNamer::upper().index_to_name(id as usize), 0, OperatorFlags::None);
        for mmt in measurements {
            party.add_measurement(mmt)?;
        }
        Ok(party)
    }

    /// Appends a measurement, allocating its outcome operators.
    ///
    /// Projective measurements register every pair of their outcome operators
    /// as mutually exclusive.
    pub fn add_measurement(&mut self, mut mmt: Measurement) -> Result<(), ContextError> {
        if mmt.num_outcomes == 0 {
            return Err(ContextError::EmptyMeasurement {
                party: self.id as usize,
                name: mmt.name,
            });
        }
        let index = self.measurements.len();
        let first = self.operators.len() as u32;
        let count = mmt.num_operators() as u32;
        let flags = if mmt.projective {
            OperatorFlags::Idempotent
        } else {
            OperatorFlags::None
        };
        for local in first..first + count {
            self.operators.push(Operator::new(local, self.id, flags));
            self.operator_to_measurement.push(Some(index));
        }
        if mmt.projective {
            for a in first..first + count {
                for b in (a + 1)..first + count {
                    self.mutex.insert((a, b));
                }
            }
        }
        mmt.party = self.id;
        mmt.index = index;
        mmt.offset = first;
        self.measurements.push(mmt);
        Ok(())
    }

    /// Declares two operators of this party mutually exclusive (`ab = ba = 0`).
    pub fn add_exclusion(&mut self, a: u32, b: u32) -> Result<(), ContextError> {
        for op in [a, b] {
            if op as usize >= self.operators.len() {
                return Err(ContextError::OperatorOutOfRange {
                    party: self.id as usize,
                    operator: op as usize,
                    count: self.operators.len(),
                });
            }
        }
        self.mutex.insert((a.min(b), a.max(b)));
        Ok(())
    }

    /// Whether `a` and `b` (party-local ids) are mutually exclusive.
    #[inline]
    pub fn exclusive(&self, a: u32, b: u32) -> bool {
        a != b && self.mutex.contains(&(a.min(b), a.max(b)))
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of operators.
    #[inline]
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    #[inline]
    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    #[inline]
    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// Measurement that owns operator `local`, if any.
    pub fn measurement_of(&self, local: u32) -> Option<&Measurement> {
        self.operator_to_measurement
            .get(local as usize)
            .copied()
            .flatten()
            .map(|index| &self.measurements[index])
    }

    /// Outcome operator `outcome` of measurement `mmt`, if it has one.
    pub fn measurement_operator(&self, mmt: usize, outcome: usize) -> Option<Operator> {
        let measurement = self.measurements.get(mmt)?;
        if outcome >= measurement.num_operators() {
            return None;
        }
        self.operators.get(measurement.offset as usize + outcome).copied()
    }

    /// Global index of this party's first operator.
    #[inline]
    pub fn global_offset(&self) -> usize {
        self.global_offset
    }

    /// Renumbers the party and places it at `global_offset`.
    ///
    /// Only valid before any sequence over the owning context exists.
    pub(crate) fn reenumerate(&mut self, id: u32, global_offset: usize) {
        self.id = id;
        self.global_offset = global_offset;
        for op in &mut self.operators {
            op.party = id;
        }
        for mmt in &mut self.measurements {
            mmt.party = id;
        }
    }

    /// Human-readable name of one of this party's operators.
    pub fn format_operator(&self, op: &Operator) -> String {
        match self.measurement_of(op.id) {
            Some(mmt) => format!("{}.{}{}", self.name, mmt.name, op.id - mmt.offset),
            None => format!("{}{}", self.name, op.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_party() {
        let party = Party::new(0, "X", 3, OperatorFlags::None);
        assert_eq!(party.len(), 3);
        assert!(party.operators().iter().all(|op| !op.is_idempotent()));
        assert!(!party.exclusive(0, 1));
        assert_eq!(party.format_operator(&party.operators()[2]), "X2");
    }

    #[test]
    fn complete_projective_measurement() {
        let mut party = Party::new(0, "A", 0, OperatorFlags::None);
        party.add_measurement(Measurement::new("a", 3)).unwrap();
        party.add_measurement(Measurement::new("b", 2)).unwrap();
        assert_eq!(party.len(), 3);
        assert!(party.exclusive(0, 1));
        assert!(party.exclusive(1, 0));
        // Different measurements are not exclusive.
        assert!(!party.exclusive(1, 2));
        assert_eq!(party.measurement_of(2).unwrap().name, "b");
        assert_eq!(party.measurement_operator(0, 1), Some(Operator::projector(1, 0)));
        assert_eq!(party.measurement_operator(0, 2), None);
        assert!(party.measurements()[0].is_implicit_outcome(2));
        assert_eq!(party.format_operator(&party.operators()[2]), "A.b0");
    }

    #[test]
    fn incomplete_measurement_keeps_every_outcome() {
        let mut party = Party::new(0, "A", 0, OperatorFlags::None);
        party
            .add_measurement(Measurement::with_flags("a", 2, false, false))
            .unwrap();
        assert_eq!(party.len(), 2);
        assert!(!party.exclusive(0, 1));
        assert!(!party.operators()[0].is_idempotent());
    }

    #[test]
    fn empty_measurement_is_rejected() {
        let mut party = Party::new(0, "A", 0, OperatorFlags::None);
        let err = party.add_measurement(Measurement::new("a", 0)).unwrap_err();
        assert!(matches!(err, ContextError::EmptyMeasurement { party: 0, .. }));
    }

    #[test]
    fn exclusion_bounds_checked() {
        let mut party = Party::new(1, "B", 2, OperatorFlags::Idempotent);
        assert!(party.add_exclusion(0, 1).is_ok());
        assert!(party.exclusive(1, 0));
        assert!(party.add_exclusion(0, 5).is_err());
    }

    #[test]
    fn reenumeration_moves_operators() {
        let mut party = Party::with_measurements(0, [Measurement::new("a", 2)]).unwrap();
        party.reenumerate(4, 10);
        assert_eq!(party.id(), 4);
        assert_eq!(party.global_offset(), 10);
        assert_eq!(party.operators()[0].party, 4);
        assert_eq!(party.measurements()[0].party(), 4);
    }
}
