//! Tunables of a matrix system.

use serde::{Deserialize, Serialize};

/// Settings a [`crate::system::MatrixSystem`] is created with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Most raw words an algebraic context pre-computes aliases for. Longer
    /// alias books are skipped and rules are applied directly.
    pub alias_sequence_budget: usize,
    /// Passes the inflation factor table may take to reach a fixed point.
    pub factor_iteration_limit: usize,
    /// Whether locality systems build implicit-symbol tables when every
    /// measurement is complete.
    pub implicit_symbols: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            alias_sequence_budget: 1 << 16,
            factor_iteration_limit: 8,
            implicit_symbols: true,
        }
    }
}
