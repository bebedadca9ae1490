//! Moment and localizing matrices.
//!
//! # Citations
//! - Navascués, Pironio, Acín, "A convergent hierarchy of semidefinite programs
//!   characterizing the set of quantum correlations", New J. Phys. 10 (2008)
//! - Pironio, Navascués, Acín, "Convergent relaxations of polynomial
//!   optimization problems with noncommuting variables", SIAM J. Optim. 20 (2010)

mod localizing;
mod moment;
mod operator_matrix;
mod properties;
mod square;

pub use localizing::LocalizingMatrixIndex;
pub use operator_matrix::{MatrixKind, OperatorMatrix};
pub use properties::{MatrixType, SymbolMatrixProperties};
pub use square::SquareMatrix;
