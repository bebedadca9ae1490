//! npa-moment: moment and localizing matrices for the NPA hierarchy and its
//! causal-inflation extension.
//!
//! This crate provides:
//! - operator algebras (contexts) with a canonical form for every product of
//!   operators: generic, locality (parties of projective measurements),
//!   algebraic (monomial rewrite rules) and causal inflation;
//! - a symbol table that numbers every distinct moment, up to conjugation;
//! - moment and localizing matrices over those symbols;
//! - matrix systems that build matrices on demand behind one reader-writer
//!   lock, with Collins–Gisin, implicit-symbol and factorization indices.
//!
//! # Mathematical Foundations
//!
//! A moment matrix at level `L` has one row and one column per canonical
//! operator word of length at most `L`; entry `(i, j)` is the moment of
//! `g_i* g_j`. Positive semidefiniteness of such matrices, for every level,
//! characterizes quantum correlations. Inflation replaces a causal network by
//! copies of its sources and asks the same of the inflated scenario.
//!
//! # References
//!
//! - Navascués, Pironio, Acín. "A convergent hierarchy of semidefinite programs
//!   characterizing the set of quantum correlations", New J. Phys. 10 (2008)
//! - Pironio, Navascués, Acín. "Convergent relaxations of polynomial optimization
//!   problems with noncommuting variables", SIAM J. Optim. 20 (2010)
//! - Wolfe, Spekkens, Fritz. "The Inflation Technique for Causal Inference with
//!   Latent Variables", J. Causal Inference 7 (2019)
//! - Wolfe et al. "Quantum Inflation: A General Approach to Quantum Causal
//!   Compatibility", Phys. Rev. X 11 (2021)
//!
//! # Example
//!
//! ```
//! use npa_moment::prelude::*;
//!
//! let system = LocalityMatrixSystem::new(LocalityContext::uniform(2, 2, 2).unwrap());
//! let (_, mm) = system.create_moment_matrix(1).unwrap();
//! assert_eq!(mm.dimension(), 5);
//! let state = system.read();
//! let cg = state.extension().collins_gisin().unwrap();
//! assert_eq!(cg.get(&[0, 2]).unwrap().len(), 1);
//! ```

pub mod config;
pub mod context;
pub mod fingerprint;
pub mod indices;
pub mod inflation;
pub mod matrix;
pub mod namer;
pub mod operators;
pub mod symbols;
pub mod system;

pub use config::SystemConfig;
pub use context::{Context, ContextError};
pub use matrix::OperatorMatrix;
pub use operators::{Operator, OperatorSequence};
pub use symbols::SymbolTable;
pub use system::{MatrixSystem, SystemError};

/// Prelude for convenient usage.
pub mod prelude {
    pub use crate::config::SystemConfig;
    pub use crate::context::algebraic::{AlgebraicContext, MonomialSubstitutionRule};
    pub use crate::context::{Context, ContextError, GenericContext, LocalityContext};
    pub use crate::fingerprint::{Fingerprint, FingerprintDomain};
    pub use crate::indices::{CollinsGisinForm, ImplicitSymbols, IndexError, PMODefinition};
    pub use crate::inflation::{CausalNetwork, FactorTable, InflationContext, NetworkError};
    pub use crate::matrix::{LocalizingMatrixIndex, MatrixType, OperatorMatrix};
    pub use crate::namer::AlphabeticNamer;
    pub use crate::operators::{Measurement, Operator, OperatorSequence, Party};
    pub use crate::symbols::{SymbolExpression, SymbolTable};
    pub use crate::system::{
        AlgebraicMatrixSystem, InflationMatrixSystem, LocalityMatrixSystem, MatrixSystem, SystemError,
    };
}
