//! Row-block filling of dense output matrices.
//!
//! Every pairwise computation in the engine reduces to "evaluate entry
//! `(i, j)`". The helpers here split the output buffer into disjoint blocks of
//! whole rows, hand each block to one worker, and never share a row between
//! workers.

use crate::core::matrix::Matrix;
use crate::core::utils::vector;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Rows per work unit.
pub(crate) const ROW_BLOCK: usize = 16;

/// Evaluates `entry(i, j, out)` for every output cell and returns `depth`
/// matrices of shape `rows x cols`; `out[s]` lands in matrix `s`.
///
/// With `symmetric` set (which requires `rows == cols`) only `j >= i` is
/// evaluated and the upper triangle is mirrored afterwards.
pub(crate) fn fill_matrices<F>(
    rows: usize,
    cols: usize,
    depth: usize,
    symmetric: bool,
    entry: F,
) -> Vec<Matrix>
where
    F: Fn(usize, usize, &mut [f64]) + Sync,
{
    debug_assert!(!symmetric || rows == cols);
    let stride = cols * depth;
    let mut buffer = vec![0.0; rows * stride];

    if stride > 0 {
        #[cfg(not(feature = "parallel"))]
        let iterator = buffer.chunks_mut(stride * ROW_BLOCK).enumerate();

        #[cfg(feature = "parallel")]
        let iterator = buffer.par_chunks_mut(stride * ROW_BLOCK).enumerate();

        iterator.for_each(|(block, chunk)| {
            for (offset, row) in chunk.chunks_mut(stride).enumerate() {
                let i = block * ROW_BLOCK + offset;
                let first = if symmetric { i } else { 0 };
                for j in first..cols {
                    entry(i, j, &mut row[j * depth..(j + 1) * depth]);
                }
            }
        });
    }

    let split = |data: Vec<f64>| {
        let mut matrix = Matrix::from_parts(rows, cols, data);
        if symmetric {
            matrix.mirror_upper_to_lower();
        }
        matrix
    };

    if depth == 1 {
        return vec![split(buffer)];
    }
    (0..depth)
        .map(|s| split(buffer.iter().skip(s).step_by(depth).copied().collect()))
        .collect()
}

/// Single-output form of [`fill_matrices`].
pub(crate) fn fill_matrix<F>(rows: usize, cols: usize, symmetric: bool, entry: F) -> Matrix
where
    F: Fn(usize, usize) -> f64 + Sync,
{
    fill_matrices(rows, cols, 1, symmetric, |i, j, out| out[0] = entry(i, j))
        .pop()
        .unwrap_or_else(|| Matrix::zeros(rows, cols))
}

/// `a * b`, where `b_transposed` holds the columns of `b` as rows.
pub(crate) fn multiply_transposed(a: &Matrix, b_transposed: &Matrix) -> Matrix {
    debug_assert_eq!(a.cols(), b_transposed.cols());
    fill_matrix(a.rows(), b_transposed.rows(), false, |i, j| {
        vector::dot(a.row(i), b_transposed.row(j))
    })
}
