//! Causal-network inflation.
//!
//! A causal network of observables and hidden sources is inflated by copying
//! every source `k` times. Each observable is copied once per assignment of
//! source copies, and operators on disjoint copies commute and factorize.
//! Moments equal under a relabeling of source copies are identified through
//! their canonical forms.
//!
//! # Citations
//! - Wolfe, Spekkens, Fritz, "The Inflation Technique for Causal Inference with
//!   Latent Variables", J. Causal Inference 7 (2019)
//! - Wolfe, Pozas-Kerstjens, et al., "Quantum Inflation: A General Approach to
//!   Quantum Causal Compatibility", Phys. Rev. X 11 (2021)

mod canonical_observables;
mod context;
mod explicit_symbols;
mod factor_table;
mod network;
mod source_set;

pub use canonical_observables::{CanonicalObservable, CanonicalObservables};
pub use context::{ICObservable, ICVariant, InflationContext, OperatorInfo};
pub use explicit_symbols::InflationExplicitSymbols;
pub use factor_table::{FactorEntry, FactorSequences, FactorTable, FactorTableError};
pub use network::{CausalNetwork, NetworkError, Observable, Source};
pub use source_set::SourceSet;
