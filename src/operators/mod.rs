//! Operators, parties, measurements and canonical operator sequences.

mod generator;
mod operator;
mod party;
mod sequence;

pub use generator::OperatorSequenceGenerator;
pub use operator::{Operator, OperatorFlags};
pub use party::{Measurement, Party};
pub use sequence::OperatorSequence;
