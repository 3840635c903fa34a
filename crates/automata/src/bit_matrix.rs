#![forbid(unsafe_code)]

use bitvec::slice::BitSlice;
use bitvec::vec::BitVec;

/// A sparse boolean matrix in compressed row storage with a forced identity
/// diagonal, the adjacency operator of the reachability kernel.
///
/// # Details
///
/// The identity diagonal turns repeated multiplication into a monotone
/// closure: a reached set can only grow under `y = M · x`, so a single stable
/// population count suffices as the fixed-point test regardless of the cycle
/// structure of the graph.
pub(crate) struct BitMatrix {
    /// Start offset per row into `columns`, with a sentinel for the last row.
    row_starts: Vec<usize>,
    columns: Vec<usize>,
}

impl BitMatrix {
    /// Builds the matrix from an edge list, forcing `true` on the diagonal.
    /// Duplicate edges are merged.
    pub fn with_identity(size: usize, edges: impl Iterator<Item = (usize, usize)>) -> Self {
        let mut triplets: Vec<(usize, usize)> = (0..size).map(|state| (state, state)).collect();
        triplets.extend(edges);
        Self::from_triplets(size, triplets)
    }

    fn from_triplets(size: usize, mut triplets: Vec<(usize, usize)>) -> Self {
        triplets.sort_unstable();
        triplets.dedup();

        let mut row_starts = Vec::with_capacity(size + 1);
        let mut columns = Vec::with_capacity(triplets.len());

        row_starts.push(0);
        let mut row = 0;
        for (from, to) in triplets {
            debug_assert!(from < size && to < size, "Entry ({from}, {to}) out of bounds {size}");

            while row < from {
                row += 1;
                row_starts.push(columns.len());
            }
            columns.push(to);
        }

        while row_starts.len() <= size {
            row_starts.push(columns.len());
        }

        Self { row_starts, columns }
    }

    /// The number of rows (and columns) of the matrix.
    pub fn size(&self) -> usize {
        self.row_starts.len() - 1
    }

    /// Returns the transposed matrix; the diagonal is preserved.
    pub fn transpose(&self) -> BitMatrix {
        let mut triplets = Vec::with_capacity(self.columns.len());
        for row in 0..self.size() {
            for &column in self.row(row) {
                triplets.push((column, row));
            }
        }

        Self::from_triplets(self.size(), triplets)
    }

    /// Computes `y = M · x` over the boolean semiring.
    pub fn multiply(&self, x: &BitSlice, y: &mut BitVec) {
        debug_assert_eq!(x.len(), self.size(), "Vector length must match the matrix size");

        y.clear();
        y.resize(self.size(), false);
        for row in 0..self.size() {
            if self.row(row).iter().any(|&column| x[column]) {
                y.set(row, true);
            }
        }
    }

    fn row(&self, row: usize) -> &[usize] {
        &self.columns[self.row_starts[row]..self.row_starts[row + 1]]
    }
}
