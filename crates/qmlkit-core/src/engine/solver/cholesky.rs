use crate::core::matrix::Matrix;
use crate::core::utils::vector;
use crate::engine::error::EngineError;
use tracing::instrument;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Columns per panel of the blocked factorization.
const BLOCK_SIZE: usize = 64;

/// Lower-triangular Cholesky factor `L` with `A = L Lᵀ`.
#[derive(Debug, Clone, PartialEq)]
pub struct CholeskyFactor {
    n: usize,
    /// Row-major, upper triangle zeroed.
    lower: Vec<f64>,
}

impl CholeskyFactor {
    pub fn new(matrix: &Matrix) -> Result<Self, EngineError> {
        Self::with_shift(matrix, 0.0)
    }

    /// Factorizes `matrix + shift * I` without modifying `matrix`.
    ///
    /// Only the lower triangle of `matrix` is read.
    #[instrument(skip_all, name = "cholesky_factorization", fields(n = matrix.rows()))]
    pub fn with_shift(matrix: &Matrix, shift: f64) -> Result<Self, EngineError> {
        if !matrix.is_square() {
            return Err(EngineError::invalid(
                "matrix",
                format!("must be square, got {}x{}", matrix.rows(), matrix.cols()),
            ));
        }
        let n = matrix.rows();
        let mut lower = matrix.as_slice().to_vec();
        for i in 0..n {
            lower[i * n + i] += shift;
            lower[i * n + i + 1..(i + 1) * n].fill(0.0);
        }

        for k0 in (0..n).step_by(BLOCK_SIZE) {
            let k1 = (k0 + BLOCK_SIZE).min(n);
            factor_diagonal_block(&mut lower, n, k0, k1)?;
            if k1 < n {
                solve_panel(&mut lower, n, k0, k1);
                update_trailing(&mut lower, n, k0, k1);
            }
        }

        Ok(Self { n, lower })
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    /// The factor `L` as a dense matrix.
    pub fn lower(&self) -> Matrix {
        Matrix::from_parts(self.n, self.n, self.lower.clone())
    }

    #[inline]
    fn l(&self, i: usize, j: usize) -> f64 {
        self.lower[i * self.n + j]
    }

    /// Solves `A x = b` in place by forward then back substitution.
    pub fn solve_in_place(&self, b: &mut [f64]) -> Result<(), EngineError> {
        EngineError::check_dimension("right-hand side length", self.n, b.len())?;
        self.substitute(b);
        Ok(())
    }

    /// Forward then back substitution; `b.len()` must equal `n`.
    fn substitute(&self, b: &mut [f64]) {
        let n = self.n;
        for i in 0..n {
            let row = &self.lower[i * n..i * n + i];
            b[i] = (b[i] - vector::dot(row, &b[..i])) / self.l(i, i);
        }
        for i in (0..n).rev() {
            let mut sum = b[i];
            for p in (i + 1)..n {
                sum -= self.l(p, i) * b[p];
            }
            b[i] = sum / self.l(i, i);
        }
    }

    /// Solves `A X = B` for every column of `rhs`.
    pub fn solve(&self, rhs: &Matrix) -> Result<Matrix, EngineError> {
        EngineError::check_dimension("right-hand side rows", self.n, rhs.rows())?;
        let mut columns = rhs.transpose();
        let n = self.n;
        if n > 0 {
            #[cfg(not(feature = "parallel"))]
            let iterator = columns.as_mut_slice().chunks_mut(n);

            #[cfg(feature = "parallel")]
            let iterator = columns.as_mut_slice().par_chunks_mut(n);

            iterator.for_each(|column| self.substitute(column));
        }
        Ok(columns.transpose())
    }

    /// `A⁻¹`, obtained by solving against the identity.
    pub fn inverse(&self) -> Matrix {
        let mut inverse = Matrix::identity(self.n);
        if self.n > 0 {
            #[cfg(not(feature = "parallel"))]
            let iterator = inverse.as_mut_slice().chunks_mut(self.n);

            #[cfg(feature = "parallel")]
            let iterator = inverse.as_mut_slice().par_chunks_mut(self.n);

            // Row k of the identity is column k; A⁻¹ is symmetric so the
            // solved columns can stay in place as rows.
            iterator.for_each(|column| self.substitute(column));
        }
        inverse
    }

    /// `ln det A = 2 Σ ln L_ii`.
    pub fn log_determinant(&self) -> f64 {
        2.0 * (0..self.n).map(|i| self.l(i, i).ln()).sum::<f64>()
    }
}

/// Unblocked factorization of the diagonal block `[k0, k1)`, whose entries
/// already carry the updates from all earlier panels.
fn factor_diagonal_block(
    lower: &mut [f64],
    n: usize,
    k0: usize,
    k1: usize,
) -> Result<(), EngineError> {
    for j in k0..k1 {
        let row_j = j * n;
        let pivot = lower[row_j + j] - vector::dot(&lower[row_j + k0..row_j + j], &lower[row_j + k0..row_j + j]);
        if !(pivot.is_finite() && pivot > 0.0) {
            return Err(EngineError::SingularMatrix { row: j, pivot });
        }
        let diagonal = pivot.sqrt();
        lower[row_j + j] = diagonal;
        for i in (j + 1)..k1 {
            let row_i = i * n;
            let dot = vector::dot(&lower[row_i + k0..row_i + j], &lower[row_j + k0..row_j + j]);
            lower[row_i + j] = (lower[row_i + j] - dot) / diagonal;
        }
    }
    Ok(())
}

/// Computes `L[k1.., k0..k1]` by triangular solves against the freshly
/// factored diagonal block. Rows are independent.
fn solve_panel(lower: &mut [f64], n: usize, k0: usize, k1: usize) {
    let width = k1 - k0;
    let diagonal: Vec<f64> = (k0..k1)
        .flat_map(|j| lower[j * n + k0..j * n + k1].iter().copied())
        .collect();

    let rows = &mut lower[k1 * n..];

    #[cfg(not(feature = "parallel"))]
    let iterator = rows.chunks_mut(n);

    #[cfg(feature = "parallel")]
    let iterator = rows.par_chunks_mut(n);

    iterator.for_each(|row| {
        let panel = &mut row[k0..k1];
        for j in 0..width {
            let d = &diagonal[j * width..j * width + j];
            panel[j] = (panel[j] - vector::dot(&panel[..j], d)) / diagonal[j * width + j];
        }
    });
}

/// Subtracts the panel's contribution from the lower triangle of the
/// trailing matrix: `A[i][j] -= Σ_p L[i][p] L[j][p]` for `k1 <= j <= i`.
fn update_trailing(lower: &mut [f64], n: usize, k0: usize, k1: usize) {
    let width = k1 - k0;
    let panel: Vec<f64> = (k1..n)
        .flat_map(|i| lower[i * n + k0..i * n + k1].iter().copied())
        .collect();

    let rows = &mut lower[k1 * n..];

    #[cfg(not(feature = "parallel"))]
    let iterator = rows.chunks_mut(n).enumerate();

    #[cfg(feature = "parallel")]
    let iterator = rows.par_chunks_mut(n).enumerate();

    iterator.for_each(|(offset, row)| {
        let p_i = &panel[offset * width..(offset + 1) * width];
        for (t, value) in row[k1..=k1 + offset].iter_mut().enumerate() {
            *value -= vector::dot(p_i, &panel[t * width..(t + 1) * width]);
        }
    });
}

/// Solves `matrix · X = rhs` for symmetric positive definite `matrix`.
pub fn cholesky_solve(matrix: &Matrix, rhs: &Matrix) -> Result<Matrix, EngineError> {
    CholeskyFactor::new(matrix)?.solve(rhs)
}

/// Inverse of a symmetric positive definite matrix.
pub fn cholesky_invert(matrix: &Matrix) -> Result<Matrix, EngineError> {
    Ok(CholeskyFactor::new(matrix)?.inverse())
}
