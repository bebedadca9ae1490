use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Dense row-major square matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquareMatrix<T> {
    dimension: usize,
    data: Vec<T>,
}

impl<T> SquareMatrix<T> {
    /// Builds a matrix by evaluating `f(row, col)` in row-major order.
    pub fn from_fn(dimension: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(dimension * dimension);
        for row in 0..dimension {
            for col in 0..dimension {
                data.push(f(row, col));
            }
        }
        Self { dimension, data }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        (row < self.dimension && col < self.dimension).then(|| &self.data[row * self.dimension + col])
    }

    /// Elements in row-major order.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Upper-triangle cells `(row, col, value)` with `row <= col`.
    pub fn upper_triangle(&self) -> impl Iterator<Item = (usize, usize, &T)> + '_ {
        (0..self.dimension).flat_map(move |row| {
            (row..self.dimension).map(move |col| (row, col, &self.data[row * self.dimension + col]))
        })
    }
}

/// `matrix[row]` is a row slice, so `matrix[row][col]` reads one cell.
impl<T> Index<usize> for SquareMatrix<T> {
    type Output = [T];

    fn index(&self, row: usize) -> &[T] {
        &self.data[row * self.dimension..(row + 1) * self.dimension]
    }
}

impl<T> Index<(usize, usize)> for SquareMatrix<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(col < self.dimension, "column {col} out of range ({})", self.dimension);
        &self.data[row * self.dimension + col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexing() {
        let m = SquareMatrix::from_fn(3, |r, c| r * 10 + c);
        assert_eq!(m.dimension(), 3);
        assert_eq!(m[1][2], 12);
        assert_eq!(m[(2, 0)], 20);
        assert_eq!(m.get(3, 0), None);
        assert_eq!(m.upper_triangle().count(), 6);
    }
}
