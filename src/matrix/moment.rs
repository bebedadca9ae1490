use super::operator_matrix::{MatrixKind, OperatorMatrix};
use super::square::SquareMatrix;
use crate::context::Context;
use crate::operators::OperatorSequenceGenerator;
use crate::symbols::SymbolTable;

impl OperatorMatrix {
    /// Moment matrix at hierarchy `level`: `M[i][j] = g_i* g_j` over every
    /// canonical word `g` of length at most `level`.
    pub fn moment_matrix(context: &dyn Context, symbols: &mut SymbolTable, level: usize) -> Self {
        let columns = OperatorSequenceGenerator::new(context, 0, level);
        let rows = columns.conjugate(context);
        let sequences = SquareMatrix::from_fn(columns.len(), |row, col| {
            rows[row].multiply(&columns[col], context)
        });
        Self::build(context, symbols, MatrixKind::Moment { level }, sequences)
    }
}
