//! Index-tuple iterators.

/// Strictly increasing `k`-tuples drawn from `0..n`, in lexicographic order.
///
/// `k == 0` yields one empty tuple; `k > n` yields nothing.
#[derive(Debug, Clone)]
pub struct CombinationIndexIterator {
    n: usize,
    current: Vec<usize>,
    done: bool,
}

impl CombinationIndexIterator {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            current: (0..k).collect(),
            done: k > n,
        }
    }
}

impl Iterator for CombinationIndexIterator {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.current.clone();

        // Advance the rightmost slot that still has room.
        let k = self.current.len();
        let mut slot = k;
        while slot > 0 {
            slot -= 1;
            if self.current[slot] < self.n - k + slot {
                self.current[slot] += 1;
                for later in slot + 1..k {
                    self.current[later] = self.current[later - 1] + 1;
                }
                return Some(item);
            }
        }
        self.done = true;
        Some(item)
    }
}

/// Every tuple in `0..dims[0] × 0..dims[1] × ...`, last index fastest.
///
/// Empty `dims` yields one empty tuple; any zero dimension yields nothing.
#[derive(Debug, Clone)]
pub struct MultiDimensionalIndexIterator {
    dims: Vec<usize>,
    current: Vec<usize>,
    done: bool,
}

impl MultiDimensionalIndexIterator {
    pub fn new(dims: Vec<usize>) -> Self {
        let done = dims.contains(&0);
        Self {
            current: vec![0; dims.len()],
            dims,
            done,
        }
    }

    /// Number of tuples this iterator yields in total.
    pub fn count_total(dims: &[usize]) -> usize {
        dims.iter().product()
    }
}

impl Iterator for MultiDimensionalIndexIterator {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.current.clone();
        let mut slot = self.dims.len();
        loop {
            if slot == 0 {
                self.done = true;
                break;
            }
            slot -= 1;
            self.current[slot] += 1;
            if self.current[slot] < self.dims[slot] {
                break;
            }
            self.current[slot] = 0;
        }
        Some(item)
    }
}
