//! Matrix systems: one context, one symbol table, and every matrix built
//! over them.
//!
//! A system hands out moment and localizing matrices by index, building each
//! one at most once. Construction takes the system's write lock for its whole
//! duration, because building a matrix grows the shared symbol table.
//! Context-specific bookkeeping runs in [`SystemExtension`] hooks around each
//! construction.
//!
//! # Citations
//! - Navascués, Pironio, Acín, "A convergent hierarchy of semidefinite programs
//!   characterizing the set of quantum correlations", New J. Phys. 10 (2008)
//! - Schmidt, "Double-checked locking", PLoP (1996)

mod algebraic;
mod inflation;
mod locality;

pub use algebraic::{AlgebraicExtension, AlgebraicMatrixSystem};
pub use inflation::{InflationExtension, InflationMatrixSystem};
pub use locality::{LocalityExtension, LocalityMatrixSystem};

use crate::config::SystemConfig;
use crate::context::{Context, ContextError};
use crate::fingerprint::{Fingerprint, FingerprintDomain};
use crate::indices::IndexError;
use crate::inflation::{FactorTableError, NetworkError};
use crate::matrix::{LocalizingMatrixIndex, MatrixKind, OperatorMatrix};
use crate::operators::{Operator, OperatorSequence};
use crate::symbols::{SymbolExpression, SymbolTable};
use parking_lot::{RwLock, RwLockReadGuard};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Failures of matrix-system operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SystemError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    FactorTable(#[from] FactorTableError),
}

/// Context-specific work around matrix construction.
///
/// Hooks run under the system's write lock. `before_*` hooks may prepare the
/// context (e.g. pre-compute aliases); `on_*` hooks see the finished,
/// registered matrix and may grow the symbol table. If any hook fails, the
/// matrix is unregistered and the symbol table and extension are restored to
/// their state before the call. Context caches are kept.
pub trait SystemExtension<C: Context>: Default + Clone + Send + Sync {
    fn before_new_moment_matrix(
        &mut self,
        _context: &mut C,
        _symbols: &mut SymbolTable,
        _config: &SystemConfig,
        _level: usize,
    ) -> Result<(), SystemError> {
        Ok(())
    }

    fn on_new_moment_matrix(
        &mut self,
        _context: &C,
        _symbols: &mut SymbolTable,
        _config: &SystemConfig,
        _level: usize,
        _matrix: &OperatorMatrix,
    ) -> Result<(), SystemError> {
        Ok(())
    }

    fn before_new_localizing_matrix(
        &mut self,
        _context: &mut C,
        _symbols: &mut SymbolTable,
        _config: &SystemConfig,
        _index: &LocalizingMatrixIndex,
    ) -> Result<(), SystemError> {
        Ok(())
    }

    fn on_new_localizing_matrix(
        &mut self,
        _context: &C,
        _symbols: &mut SymbolTable,
        _config: &SystemConfig,
        _index: &LocalizingMatrixIndex,
        _matrix: &OperatorMatrix,
    ) -> Result<(), SystemError> {
        Ok(())
    }
}

/// Extension that does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoExtension;

impl<C: Context> SystemExtension<C> for NoExtension {}

/// Everything guarded by a system's lock.
#[derive(Debug)]
pub struct SystemState<C, X> {
    context: C,
    symbols: SymbolTable,
    extension: X,
    config: SystemConfig,
    matrices: Vec<Arc<OperatorMatrix>>,
    moment_indices: BTreeMap<usize, usize>,
    localizing_indices: BTreeMap<LocalizingMatrixIndex, usize>,
}

impl<C, X> SystemState<C, X> {
    #[inline]
    pub fn context(&self) -> &C {
        &self.context
    }

    #[inline]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    #[inline]
    pub fn extension(&self) -> &X {
        &self.extension
    }

    #[inline]
    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Every matrix, in creation order.
    #[inline]
    pub fn matrices(&self) -> &[Arc<OperatorMatrix>] {
        &self.matrices
    }

    pub fn matrix(&self, index: usize) -> Option<&Arc<OperatorMatrix>> {
        self.matrices.get(index)
    }

    /// Moment matrix at `level`, with its index.
    pub fn moment_matrix(&self, level: usize) -> Option<(usize, Arc<OperatorMatrix>)> {
        let &index = self.moment_indices.get(&level)?;
        Some((index, Arc::clone(&self.matrices[index])))
    }

    pub fn localizing_matrix(&self, index: &LocalizingMatrixIndex) -> Option<(usize, Arc<OperatorMatrix>)> {
        let &position = self.localizing_indices.get(index)?;
        Some((position, Arc::clone(&self.matrices[position])))
    }

    /// Highest moment-matrix level built so far.
    pub fn highest_moment_level(&self) -> Option<usize> {
        self.moment_indices.keys().next_back().copied()
    }

    fn register(&mut self, matrix: Arc<OperatorMatrix>) -> usize {
        self.matrices.push(matrix);
        self.matrices.len() - 1
    }
}

/// What a failed construction must put back.
struct Checkpoint<X> {
    symbols: usize,
    matrices: usize,
    extension: X,
}

impl<C, X: Clone> SystemState<C, X> {
    fn checkpoint(&self) -> Checkpoint<X> {
        Checkpoint {
            symbols: self.symbols.len(),
            matrices: self.matrices.len(),
            extension: self.extension.clone(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint<X>) {
        let Checkpoint {
            symbols,
            matrices,
            extension,
        } = checkpoint;
        self.matrices.truncate(matrices);
        self.moment_indices.retain(|_, index| *index < matrices);
        self.localizing_indices.retain(|_, index| *index < matrices);
        self.symbols.truncate(symbols);
        self.extension = extension;
    }
}

/// Fingerprinted view of one matrix.
#[derive(Serialize)]
struct MatrixFingerprint<'a> {
    kind: &'a MatrixKind,
    dimension: usize,
    symbols: Vec<SymbolExpression>,
}

/// A context with its symbol table and matrices, behind one reader-writer lock.
///
/// # Invariants
/// - Matrix indices follow creation order; an index once returned is never reused.
/// - Each moment level and each localizing index is built at most once.
/// - Matrices are immutable once registered.
#[derive(Debug)]
pub struct MatrixSystem<C: Context, X: SystemExtension<C> = NoExtension> {
    state: RwLock<SystemState<C, X>>,
}

impl<C: Context, X: SystemExtension<C>> MatrixSystem<C, X> {
    pub fn new(context: C) -> Self {
        Self::with_config(context, SystemConfig::default())
    }

    pub fn with_config(context: C, config: SystemConfig) -> Self {
        Self {
            state: RwLock::new(SystemState {
                context,
                symbols: SymbolTable::new(),
                extension: X::default(),
                config,
                matrices: Vec::new(),
                moment_indices: BTreeMap::new(),
                localizing_indices: BTreeMap::new(),
            }),
        }
    }

    /// Shared view of the system. Hold it while reading several related
    /// values, so no writer interleaves.
    pub fn read(&self) -> RwLockReadGuard<'_, SystemState<C, X>> {
        self.state.read()
    }

    /// Moment matrix at `level`, building it if needed.
    pub fn create_moment_matrix(&self, level: usize) -> Result<(usize, Arc<OperatorMatrix>), SystemError> {
        if let Some(found) = self.state.read().moment_matrix(level) {
            return Ok(found);
        }
        let mut guard = self.state.write();
        if let Some(found) = guard.moment_matrix(level) {
            return Ok(found);
        }
        let state = &mut *guard;
        let checkpoint = state.checkpoint();
        let symbols_before = checkpoint.symbols;
        match Self::build_moment_matrix(state, level) {
            Ok((index, matrix)) => {
                info!(
                    index,
                    level,
                    dimension = matrix.dimension(),
                    new_symbols = state.symbols.len() - symbols_before,
                    "moment matrix created"
                );
                Ok((index, matrix))
            }
            Err(error) => {
                warn!(level, %error, "moment matrix construction failed");
                state.restore(checkpoint);
                Err(error)
            }
        }
    }

    /// Constructs, registers, then notifies the extension.
    fn build_moment_matrix(
        state: &mut SystemState<C, X>,
        level: usize,
    ) -> Result<(usize, Arc<OperatorMatrix>), SystemError> {
        state
            .extension
            .before_new_moment_matrix(&mut state.context, &mut state.symbols, &state.config, level)?;
        let matrix = Arc::new(OperatorMatrix::moment_matrix(&state.context, &mut state.symbols, level));
        let index = state.register(Arc::clone(&matrix));
        state.moment_indices.insert(level, index);
        state
            .extension
            .on_new_moment_matrix(&state.context, &mut state.symbols, &state.config, level, &matrix)?;
        Ok((index, matrix))
    }

    /// Localizing matrix of `word` at `level`, building it if needed.
    pub fn create_localizing_matrix(
        &self,
        level: usize,
        word: &[Operator],
    ) -> Result<(usize, Arc<OperatorMatrix>), SystemError> {
        {
            let state = self.state.read();
            let index = Self::localizing_index(&state.context, level, word)?;
            if let Some(found) = state.localizing_matrix(&index) {
                return Ok(found);
            }
        }
        let mut guard = self.state.write();
        let index = Self::localizing_index(&guard.context, level, word)?;
        if let Some(found) = guard.localizing_matrix(&index) {
            return Ok(found);
        }
        let state = &mut *guard;
        let word = state.context.format_sequence(index.word());
        let checkpoint = state.checkpoint();
        let symbols_before = checkpoint.symbols;
        match Self::build_localizing_matrix(state, index) {
            Ok((position, matrix)) => {
                info!(
                    index = position,
                    level,
                    %word,
                    dimension = matrix.dimension(),
                    new_symbols = state.symbols.len() - symbols_before,
                    "localizing matrix created"
                );
                Ok((position, matrix))
            }
            Err(error) => {
                warn!(level, %word, %error, "localizing matrix construction failed");
                state.restore(checkpoint);
                Err(error)
            }
        }
    }

    fn build_localizing_matrix(
        state: &mut SystemState<C, X>,
        index: LocalizingMatrixIndex,
    ) -> Result<(usize, Arc<OperatorMatrix>), SystemError> {
        state
            .extension
            .before_new_localizing_matrix(&mut state.context, &mut state.symbols, &state.config, &index)?;
        let matrix = Arc::new(OperatorMatrix::localizing_matrix(
            &state.context,
            &mut state.symbols,
            index.clone(),
        ));
        let position = state.register(Arc::clone(&matrix));
        state.localizing_indices.insert(index.clone(), position);
        state
            .extension
            .on_new_localizing_matrix(&state.context, &mut state.symbols, &state.config, &index, &matrix)?;
        Ok((position, matrix))
    }

    /// Canonical index of a localizing word, rejecting foreign operators.
    fn localizing_index(context: &C, level: usize, word: &[Operator]) -> Result<LocalizingMatrixIndex, ContextError> {
        let parties = context.parties();
        for op in word {
            let party = parties.get(op.party as usize).ok_or(ContextError::PartyOutOfRange {
                party: op.party as usize,
                count: parties.len(),
            })?;
            if op.id as usize >= party.len() {
                return Err(ContextError::OperatorOutOfRange {
                    party: op.party as usize,
                    operator: op.id as usize,
                    count: party.len(),
                });
            }
        }
        let sequence = OperatorSequence::new(word.to_vec(), context);
        Ok(LocalizingMatrixIndex::new(context, level, sequence))
    }

    /// Fingerprint of the symbol table and every matrix's symbols.
    ///
    /// Equal for two systems built by the same calls on the same context.
    pub fn fingerprint(&self) -> Fingerprint {
        let state = self.state.read();
        let matrices: Vec<MatrixFingerprint<'_>> = state
            .matrices
            .iter()
            .map(|matrix| MatrixFingerprint {
                kind: matrix.kind(),
                dimension: matrix.dimension(),
                symbols: matrix.symbol_matrix().iter().copied().collect(),
            })
            .collect();
        Fingerprint::of(FingerprintDomain::MatrixSystem, &(state.symbols.fingerprint(), matrices))
    }
}
