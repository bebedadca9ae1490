use super::{MatrixSystem, SystemError, SystemExtension};
use crate::config::SystemConfig;
use crate::context::algebraic::AlgebraicContext;
use crate::matrix::LocalizingMatrixIndex;
use crate::symbols::SymbolTable;

/// Pre-computes rule aliases for every raw word a new matrix can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlgebraicExtension;

impl SystemExtension<AlgebraicContext> for AlgebraicExtension {
    fn before_new_moment_matrix(
        &mut self,
        context: &mut AlgebraicContext,
        _symbols: &mut SymbolTable,
        config: &SystemConfig,
        level: usize,
    ) -> Result<(), SystemError> {
        context.generate_aliases(2 * level, config.alias_sequence_budget);
        Ok(())
    }

    fn before_new_localizing_matrix(
        &mut self,
        context: &mut AlgebraicContext,
        _symbols: &mut SymbolTable,
        config: &SystemConfig,
        index: &LocalizingMatrixIndex,
    ) -> Result<(), SystemError> {
        context.generate_aliases(2 * index.level() + index.word().len(), config.alias_sequence_budget);
        Ok(())
    }
}

/// Matrix system over an algebraic context.
pub type AlgebraicMatrixSystem = MatrixSystem<AlgebraicContext, AlgebraicExtension>;
