use super::{MatrixSystem, SystemError, SystemExtension};
use crate::config::SystemConfig;
use crate::inflation::{CanonicalObservables, FactorTable, InflationContext, InflationExplicitSymbols};
use crate::matrix::{LocalizingMatrixIndex, OperatorMatrix};
use crate::symbols::SymbolTable;
use tracing::debug;

/// Factor table, canonical observables and explicit-symbol index of an
/// inflation system.
#[derive(Debug, Clone, Default)]
pub struct InflationExtension {
    factors: FactorTable,
    canonical_observables: Option<CanonicalObservables>,
    explicit_symbols: Option<InflationExplicitSymbols>,
}

impl InflationExtension {
    #[inline]
    pub fn factors(&self) -> &FactorTable {
        &self.factors
    }

    pub fn canonical_observables(&self) -> Option<&CanonicalObservables> {
        self.canonical_observables.as_ref()
    }

    pub fn explicit_symbols(&self) -> Option<&InflationExplicitSymbols> {
        self.explicit_symbols.as_ref()
    }

    /// Symbols of the explicit outcomes of `variants`, via their canonical tuple.
    pub fn explicit_symbols_for(&self, variants: &[usize]) -> Option<&[usize]> {
        self.explicit_symbols
            .as_ref()?
            .get(self.canonical_observables.as_ref()?, variants)
    }
}

impl SystemExtension<InflationContext> for InflationExtension {
    fn on_new_moment_matrix(
        &mut self,
        context: &InflationContext,
        symbols: &mut SymbolTable,
        config: &SystemConfig,
        level: usize,
        _matrix: &OperatorMatrix,
    ) -> Result<(), SystemError> {
        let length = 2 * level;
        let canonical = self
            .canonical_observables
            .get_or_insert_with(|| CanonicalObservables::new(context));
        canonical.generate_up_to_level(context, length);
        if self.explicit_symbols.as_ref().map_or(true, |index| index.level() < length) {
            self.explicit_symbols = Some(InflationExplicitSymbols::new(context, symbols, canonical, length)?);
        }
        let added = self
            .factors
            .on_new_symbols_added(context, symbols, config.factor_iteration_limit)?;
        debug!(level, added, "inflation indices updated");
        Ok(())
    }

    fn on_new_localizing_matrix(
        &mut self,
        context: &InflationContext,
        symbols: &mut SymbolTable,
        config: &SystemConfig,
        _index: &LocalizingMatrixIndex,
        _matrix: &OperatorMatrix,
    ) -> Result<(), SystemError> {
        self.factors
            .on_new_symbols_added(context, symbols, config.factor_iteration_limit)?;
        Ok(())
    }
}

/// Matrix system over an inflated causal network.
pub type InflationMatrixSystem = MatrixSystem<InflationContext, InflationExtension>;
