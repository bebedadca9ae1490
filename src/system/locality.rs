use super::{MatrixSystem, SystemError, SystemExtension};
use crate::config::SystemConfig;
use crate::context::{Context, LocalityContext};
use crate::indices::{CollinsGisinForm, ImplicitSymbols};
use crate::matrix::OperatorMatrix;
use crate::symbols::SymbolTable;
use tracing::debug;

/// Collins–Gisin and implicit-symbol indices, rebuilt as moment matrices grow.
#[derive(Debug, Clone, Default)]
pub struct LocalityExtension {
    collins_gisin: Option<CollinsGisinForm>,
    implicit: Option<ImplicitSymbols>,
}

impl LocalityExtension {
    /// Index over the highest moment matrix built so far.
    pub fn collins_gisin(&self) -> Option<&CollinsGisinForm> {
        self.collins_gisin.as_ref()
    }

    /// Present when every measurement is complete and the config asks for it.
    pub fn implicit_symbols(&self) -> Option<&ImplicitSymbols> {
        self.implicit.as_ref()
    }
}

impl SystemExtension<LocalityContext> for LocalityExtension {
    fn on_new_moment_matrix(
        &mut self,
        context: &LocalityContext,
        symbols: &mut SymbolTable,
        config: &SystemConfig,
        level: usize,
        _matrix: &OperatorMatrix,
    ) -> Result<(), SystemError> {
        let max_parties = context.parties().len().min(2 * level);
        if self
            .collins_gisin
            .as_ref()
            .is_some_and(|cg| cg.max_parties() >= max_parties)
        {
            return Ok(());
        }
        let cg = CollinsGisinForm::new(context, symbols, max_parties)?;
        self.implicit = if config.implicit_symbols && context.all_measurements_complete() {
            Some(ImplicitSymbols::new(context, &cg)?)
        } else {
            None
        };
        debug!(level, max_parties, implicit = self.implicit.is_some(), "locality indices rebuilt");
        self.collins_gisin = Some(cg);
        Ok(())
    }
}

/// Matrix system over a locality context.
pub type LocalityMatrixSystem = MatrixSystem<LocalityContext, LocalityExtension>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SystemConfig;
    use crate::operators::{Measurement, Party};

    #[test]
    fn indices_follow_the_highest_level() {
        let system = LocalityMatrixSystem::new(LocalityContext::uniform(3, 2, 2).unwrap());
        system.create_moment_matrix(1).unwrap();
        {
            let state = system.read();
            let cg = state.extension().collins_gisin().unwrap();
            assert_eq!(cg.max_parties(), 2);
            assert!(state.extension().implicit_symbols().is_some());
        }
        system.create_moment_matrix(2).unwrap();
        let state = system.read();
        let cg = state.extension().collins_gisin().unwrap();
        assert_eq!(cg.max_parties(), 3);
        assert_eq!(cg.get(&[0, 2, 4]).unwrap().len(), 1);
    }

    #[test]
    fn implicit_symbols_respect_config_and_completeness() {
        let config = SystemConfig {
            implicit_symbols: false,
            ..SystemConfig::default()
        };
        let system = LocalityMatrixSystem::with_config(LocalityContext::uniform(2, 1, 2).unwrap(), config);
        system.create_moment_matrix(1).unwrap();
        assert!(system.read().extension().implicit_symbols().is_none());

        let party = Party::with_measurements(0, [Measurement::with_flags("a", 2, true, false)]).unwrap();
        let system = LocalityMatrixSystem::new(LocalityContext::new(vec![party]).unwrap());
        system.create_moment_matrix(1).unwrap();
        let state = system.read();
        assert!(state.extension().collins_gisin().is_some());
        assert!(state.extension().implicit_symbols().is_none());
    }
}
