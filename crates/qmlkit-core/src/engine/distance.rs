use super::error::EngineError;
use super::parallel::fill_matrix;
use crate::core::matrix::Matrix;
use crate::core::utils::vector;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Vector distance used by [`pairwise_distance`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    /// Manhattan distance.
    L1,
    /// Euclidean distance.
    L2,
    /// Minkowski distance of order `p >= 1`.
    Lp(f64),
}

impl Metric {
    pub fn validate(&self) -> Result<(), EngineError> {
        if let Self::Lp(p) = *self {
            if !(p.is_finite() && p >= 1.0) {
                return Err(EngineError::invalid(
                    "metric",
                    format!("p-norm order must be finite and >= 1, got {p}"),
                ));
            }
        }
        Ok(())
    }

    #[inline]
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        match *self {
            Self::L1 => vector::manhattan(a, b),
            Self::L2 => vector::euclidean(a, b),
            Self::Lp(p) => vector::minkowski(a, b, p),
        }
    }
}

/// Width shared by every vector of both sets, or a dimension error naming
/// the first offending vector. Empty sets accept any width.
pub(crate) fn common_width<R: AsRef<[f64]>>(a: &[R], b: &[R]) -> Result<usize, EngineError> {
    let Some(width) = a.iter().chain(b).map(|v| v.as_ref().len()).next() else {
        return Ok(0);
    };
    for v in a.iter().chain(b) {
        EngineError::check_dimension("vector width", width, v.as_ref().len())?;
    }
    Ok(width)
}

/// Dense `|a| x |b|` distance matrix.
///
/// When `a` and `b` are the same slice the symmetric path is taken.
#[instrument(skip_all, name = "pairwise_distance")]
pub fn pairwise_distance<R>(a: &[R], b: &[R], metric: Metric) -> Result<Matrix, EngineError>
where
    R: AsRef<[f64]> + Sync,
{
    if std::ptr::eq(a, b) {
        return symmetric_distance_matrix(a, metric);
    }
    metric.validate()?;
    let width = common_width(a, b)?;
    debug!(rows = a.len(), cols = b.len(), width, "Computing distance matrix.");

    Ok(fill_matrix(a.len(), b.len(), false, |i, j| {
        metric.distance(a[i].as_ref(), b[j].as_ref())
    }))
}

/// Distances within one set. Only the upper triangle is computed; the
/// diagonal is zero.
#[instrument(skip_all, name = "symmetric_distance_matrix")]
pub fn symmetric_distance_matrix<R>(reps: &[R], metric: Metric) -> Result<Matrix, EngineError>
where
    R: AsRef<[f64]> + Sync,
{
    metric.validate()?;
    let width = common_width(reps, reps)?;
    debug!(n = reps.len(), width, "Computing symmetric distance matrix.");

    Ok(fill_matrix(reps.len(), reps.len(), true, |i, j| {
        if i == j {
            0.0
        } else {
            metric.distance(reps[i].as_ref(), reps[j].as_ref())
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use approx::assert_relative_eq;

    fn points() -> Vec<Vec<f64>> {
        vec![vec![0.0, 0.0], vec![3.0, 4.0], vec![-1.0, 2.0]]
    }

    #[test]
    fn l1_and_l2_distances() {
        let a = points();
        let b = vec![vec![0.0, 0.0]];
        let l1 = pairwise_distance(&a, &b, Metric::L1).unwrap();
        let l2 = pairwise_distance(&a, &b, Metric::L2).unwrap();
        assert_eq!(l1.shape(), (3, 1));
        assert_eq!(l1.column(0), vec![0.0, 7.0, 3.0]);
        assert_relative_eq!(l2[(1, 0)], 5.0, epsilon = 1e-12);
        assert_relative_eq!(l2[(2, 0)], 5f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn lp_interpolates_between_norms() {
        let a = vec![vec![0.0, 0.0]];
        let b = vec![vec![3.0, 4.0]];
        let p1 = pairwise_distance(&a, &b, Metric::Lp(1.0)).unwrap();
        let p2 = pairwise_distance(&a, &b, Metric::Lp(2.0)).unwrap();
        let p3 = pairwise_distance(&a, &b, Metric::Lp(3.0)).unwrap();
        assert_relative_eq!(p1[(0, 0)], 7.0, epsilon = 1e-12);
        assert_relative_eq!(p2[(0, 0)], 5.0, epsilon = 1e-12);
        assert!(p3[(0, 0)] < 5.0 && p3[(0, 0)] > 4.0);
    }

    #[test]
    fn same_slice_gives_symmetric_matrix_with_zero_diagonal() {
        let a = points();
        let d = pairwise_distance(&a, &a, Metric::L2).unwrap();
        assert!(d.is_symmetric(0.0));
        assert_eq!(d.diagonal(), vec![0.0; 3]);
        assert_eq!(d, symmetric_distance_matrix(&a, Metric::L2).unwrap());
    }

    #[test]
    fn equal_contents_in_different_slices_match_symmetric_result() {
        let a = points();
        let b = points();
        let general = pairwise_distance(&a, &b, Metric::L1).unwrap();
        let symmetric = symmetric_distance_matrix(&a, Metric::L1).unwrap();
        assert_eq!(general, symmetric);
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let a = vec![vec![0.0, 0.0]];
        let b = vec![vec![0.0, 0.0, 1.0]];
        let err = pairwise_distance(&a, &b, Metric::L2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn invalid_p_norm_is_rejected() {
        let a = points();
        for p in [0.5, 0.0, f64::NAN, f64::INFINITY] {
            assert!(pairwise_distance(&a, &a, Metric::Lp(p)).is_err());
        }
    }

    #[test]
    fn empty_sets_give_empty_matrices() {
        let empty: Vec<Vec<f64>> = Vec::new();
        let d = pairwise_distance(&empty, &points(), Metric::L2).unwrap();
        assert_eq!(d.shape(), (0, 3));
    }
}
