//! Types and small helpers for doing generalized-coordinate math with `nalgebra`.
//!
//! The driver works in arbitrary dimension (`nq`, `nv`, `nu`, `na` are
//! runtime values, not compile-time constants), so fixed-size vector types
//! don't fit here the way they do for 2D/3D graphics math. Everything below
//! is dynamically sized.

use nalgebra as na;

/// A dense column vector of runtime-determined length, e.g. `qpos` or `qvel`.
pub type Vector = na::DVector<f64>;
/// A dense matrix of runtime-determined shape, e.g. the actuator moment arm.
pub type Matrix = na::DMatrix<f64>;

/// A matrix that may be stored densely or in a row-compressed sparse layout,
/// mirroring `isSparse(M)` selecting between the two at a single point.
///
/// Backs both `ten_J` and `efc_AR` in the data model: either representation
/// may be the logical matrix, and callers that only need matrix-vector
/// products don't need to know which.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub enum RowMatrix {
    Dense(Matrix),
    Sparse(SparseRowMatrix),
}

/// Row-compressed sparse matrix: row `i`'s `rownnz[i]` nonzero entries start
/// at `data[rowadr[i]..]` with column indices `colind[rowadr[i]..]`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde-types", derive(serde::Serialize, serde::Deserialize))]
pub struct SparseRowMatrix {
    pub nrows: usize,
    pub ncols: usize,
    pub rownnz: Vec<usize>,
    pub rowadr: Vec<usize>,
    pub colind: Vec<usize>,
    pub data: Vec<f64>,
}

impl SparseRowMatrix {
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        SparseRowMatrix {
            nrows,
            ncols,
            rownnz: vec![0; nrows],
            rowadr: vec![0; nrows],
            colind: Vec::new(),
            data: Vec::new(),
        }
    }

    pub fn mul_vec(&self, v: &Vector) -> Vector {
        let mut out = Vector::zeros(self.nrows);
        for row in 0..self.nrows {
            let start = self.rowadr[row];
            let end = start + self.rownnz[row];
            let mut acc = 0.0;
            for k in start..end {
                acc += self.data[k] * v[self.colind[k]];
            }
            out[row] = acc;
        }
        out
    }
}

impl RowMatrix {
    pub fn dense_zeros(nrows: usize, ncols: usize) -> Self {
        RowMatrix::Dense(Matrix::zeros(nrows, ncols))
    }

    pub fn nrows(&self) -> usize {
        match self {
            RowMatrix::Dense(m) => m.nrows(),
            RowMatrix::Sparse(s) => s.nrows,
        }
    }

    /// `self * v`, branching on representation exactly once.
    pub fn mul_vec(&self, v: &Vector) -> Vector {
        match self {
            RowMatrix::Dense(m) => m * v,
            RowMatrix::Sparse(s) => s.mul_vec(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_matches_dense() {
        let dense = Matrix::from_row_slice(2, 3, &[1.0, 0.0, 2.0, 0.0, 3.0, 0.0]);
        let sparse = SparseRowMatrix {
            nrows: 2,
            ncols: 3,
            rownnz: vec![2, 1],
            rowadr: vec![0, 2],
            colind: vec![0, 2, 1],
            data: vec![1.0, 2.0, 3.0],
        };
        let v = Vector::from_vec(vec![1.0, 2.0, 3.0]);
        assert_eq!(dense * &v, sparse.mul_vec(&v));
    }
}
