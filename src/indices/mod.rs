//! Indices from measurement outcomes to symbols.
//!
//! The Collins–Gisin form lists, for every tuple of measurements on distinct
//! parties, the symbols of all explicit outcome combinations (every outcome
//! but the last of each measurement). Probabilities that involve a last
//! outcome are then recovered as linear combinations of those symbols.
//!
//! # Citations
//! - Collins & Gisin, "A relevant two qubit Bell inequality inequivalent to the
//!   CHSH inequality", J. Phys. A 37 (2004)

mod collins_gisin;
mod combination;
mod implicit_symbols;

pub use collins_gisin::CollinsGisinForm;
pub use combination::{CombinationIndexIterator, MultiDimensionalIndexIterator};
pub use implicit_symbols::{ImplicitSymbols, PMODefinition};

use thiserror::Error;

/// Out-of-range or malformed index lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("measurement index {index} out of range ({count} measurements)")]
    BadMeasurementIndex { index: usize, count: usize },

    #[error("measurements must be on strictly increasing parties (party {party} after {previous})")]
    UnorderedMeasurements { party: usize, previous: usize },

    #[error("{requested} measurements requested, but the index covers at most {max}")]
    TooManyParties { requested: usize, max: usize },

    #[error("outcome {outcome} out of range for measurement {measurement} ({count} outcomes)")]
    BadOutcome {
        measurement: usize,
        outcome: usize,
        count: usize,
    },

    #[error("measurement {measurement} of party {party} is incomplete, so its last outcome cannot be inferred")]
    IncompleteMeasurement { party: usize, measurement: usize },

    #[error("no joint measurement {measurements:?} in the index; measurements must be on distinct parties in increasing order")]
    UnknownMeasurements { measurements: Vec<usize> },

    #[error("no symbol for {sequence}; the moment matrix does not reach it")]
    MissingSymbol { sequence: String },
}
