//! Sparse matrix in CSR format.
//!
//! Built from coordinate triplets through `sprs::TriMat`, which sums duplicate
//! coordinates when converting to CSR. Only stored entries take part in
//! elementwise operations and products; missing entries are implicit zeros.
//!
//! ```text
//! y = A ⊕.⊗ x
//!
//! where:
//!   y[i] = ⊕_j ( A[i,j] ⊗ x[j] )   over stored A[i,j] with stored x[j]
//!   y[i] = identity(⊕)            when row i contributes nothing
//! ```

use crate::error::{SparseError, SparseResult};
use crate::ops::{BinaryOp, Monoid, Semiring, UnaryOp};
use crate::vector::Vector;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use sprs::{CsMat, TriMat};

/// Sparse `f64` matrix, row-major (CSR).
#[derive(Debug, Clone)]
pub struct SparseMatrix {
    matrix: CsMat<f64>,
}

impl SparseMatrix {
    /// Build from `(row, col, value)` triplets.
    ///
    /// Duplicate coordinates are summed. Without an explicit `shape` the
    /// matrix is `(max row + 1) x (max col + 1)`; with one, coordinates
    /// outside it are rejected.
    pub fn from_triplets(
        entries: &[(usize, usize, f64)],
        shape: Option<(usize, usize)>,
    ) -> SparseResult<Self> {
        let (rows, cols) = match shape {
            Some((rows, cols)) => {
                if let Some(&(row, col, _)) = entries
                    .iter()
                    .find(|(row, col, _)| *row >= rows || *col >= cols)
                {
                    return Err(SparseError::IndexOutOfBounds {
                        row,
                        col,
                        rows,
                        cols,
                    });
                }
                (rows, cols)
            }
            None => entries.iter().fold((0, 0), |(rows, cols), &(row, col, _)| {
                (rows.max(row + 1), cols.max(col + 1))
            }),
        };

        let mut triplets = TriMat::new((rows, cols));
        for &(row, col, value) in entries {
            triplets.add_triplet(row, col, value);
        }

        Ok(Self {
            matrix: triplets.to_csr(),
        })
    }

    pub fn rows(&self) -> usize {
        self.matrix.rows()
    }

    pub fn cols(&self) -> usize {
        self.matrix.cols()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    pub fn is_square(&self) -> bool {
        self.rows() == self.cols()
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.matrix.nnz()
    }

    /// Matrix density (nnz / (rows × cols)).
    pub fn density(&self) -> f64 {
        let cells = self.rows() * self.cols();
        if cells == 0 {
            return 0.0;
        }
        self.nnz() as f64 / cells as f64
    }

    /// Stored value at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows() || col >= self.cols() {
            return None;
        }
        self.matrix.get(row, col).copied()
    }

    /// Stored entries as `(row, col, value)` in row-major order.
    pub fn triplets(&self) -> Vec<(usize, usize, f64)> {
        let mut out = Vec::with_capacity(self.nnz());
        for (row, vec) in self.matrix.outer_iterator().enumerate() {
            out.extend(vec.iter().map(|(col, &value)| (row, col, value)));
        }
        out
    }

    /// Rebuild with the same pattern and values produced by `f(row, col, value)`.
    fn map_entries<F>(&self, mut f: F) -> SparseResult<Self>
    where
        F: FnMut(usize, usize, f64) -> SparseResult<f64>,
    {
        let mut triplets = TriMat::with_capacity(self.shape(), self.nnz());
        for (row, col, value) in self.triplets() {
            triplets.add_triplet(row, col, f(row, col, value)?);
        }
        Ok(Self {
            matrix: triplets.to_csr(),
        })
    }

    /// `op(a)` at every stored entry, restricted to entries stored in `mask` when given.
    ///
    /// Entries outside the mask keep their value.
    pub fn apply(&self, op: UnaryOp, mask: Option<&SparseMatrix>) -> SparseResult<Self> {
        if let Some(mask) = mask {
            if mask.shape() != self.shape() {
                return Err(SparseError::ShapeMismatch {
                    context: "matrix apply mask",
                    expected: self.rows() * self.cols(),
                    found: mask.rows() * mask.cols(),
                });
            }
        }
        self.map_entries(|row, col, value| {
            let selected = match mask {
                Some(mask) => mask.get(row, col).map_or(false, |m| m != 0.0),
                None => true,
            };
            Ok(if selected { op.apply(value) } else { value })
        })
    }

    /// `op(A[i,j], x[j])` at every stored entry. Absent `x[j]` reads as `0.0`.
    pub fn apply_by_column(&self, op: BinaryOp, x: &Vector) -> SparseResult<Self> {
        if x.len() != self.cols() {
            return Err(SparseError::ShapeMismatch {
                context: "apply_by_column",
                expected: self.cols(),
                found: x.len(),
            });
        }
        self.map_entries(|_, col, value| op.apply(value, x.get(col).unwrap_or(0.0)))
    }

    /// Fold each row; empty rows yield the identity.
    pub fn reduce_rows(&self, monoid: Monoid) -> Vector {
        let values = self
            .matrix
            .outer_iterator()
            .map(|row| monoid.fold(row.iter().map(|(_, &v)| v)))
            .collect();
        Vector::dense(values)
    }

    /// Fold each column; empty columns yield the identity.
    pub fn reduce_cols(&self, monoid: Monoid) -> Vector {
        let mut acc = vec![monoid.identity(); self.cols()];
        for row in self.matrix.outer_iterator() {
            for (col, &value) in row.iter() {
                acc[col] = monoid.combine(acc[col], value);
            }
        }
        Vector::dense(acc)
    }

    /// Fold every stored entry in row-major order.
    pub fn reduce_all(&self, monoid: Monoid) -> f64 {
        monoid.fold(self.matrix.data().iter().copied())
    }

    fn row_product(&self, row: usize, x: &Vector, semiring: Semiring) -> SparseResult<f64> {
        let add = semiring.add();
        let multiply = semiring.multiply();
        let mut acc = add.identity();
        if let Some(view) = self.matrix.outer_view(row) {
            for (col, &a) in view.iter() {
                if let Some(xj) = x.get(col) {
                    acc = add.combine(acc, multiply.apply(a, xj)?);
                }
            }
        }
        Ok(acc)
    }

    /// Sparse matrix-vector product over `semiring`.
    ///
    /// Each row folds its entries in column order, so the result does not
    /// depend on how rows are scheduled across threads.
    pub fn mat_vec(&self, x: &Vector, semiring: &Semiring) -> SparseResult<Vector> {
        if x.len() != self.cols() {
            return Err(SparseError::ShapeMismatch {
                context: "mat_vec",
                expected: self.cols(),
                found: x.len(),
            });
        }
        let semiring = *semiring;

        #[cfg(feature = "parallel")]
        let values = (0..self.rows())
            .into_par_iter()
            .map(|row| self.row_product(row, x, semiring))
            .collect::<SparseResult<Vec<f64>>>()?;

        #[cfg(not(feature = "parallel"))]
        let values = (0..self.rows())
            .map(|row| self.row_product(row, x, semiring))
            .collect::<SparseResult<Vec<f64>>>()?;

        Ok(Vector::dense(values))
    }
}
