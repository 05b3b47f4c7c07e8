use super::cholesky::CholeskyFactor;
use crate::core::matrix::Matrix;
use crate::engine::error::EngineError;
use crate::engine::parallel::multiply_transposed;
use tracing::{debug, info, instrument, warn};

/// Outcome of fitting one regularization strength.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaFit {
    pub lambda: f64,
    /// `n_train x n_targets` coefficients, or the factorization failure.
    pub outcome: Result<Matrix, EngineError>,
}

impl LambdaFit {
    pub fn coefficients(&self) -> Option<&Matrix> {
        self.outcome.as_ref().ok()
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Kernel ridge regression coefficients for one or more λ.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionModel {
    n_train: usize,
    n_targets: usize,
    fits: Vec<LambdaFit>,
}

impl RegressionModel {
    pub fn n_train(&self) -> usize {
        self.n_train
    }

    pub fn n_targets(&self) -> usize {
        self.n_targets
    }

    /// Per-λ outcomes in the order the λ values were given.
    pub fn fits(&self) -> &[LambdaFit] {
        &self.fits
    }

    pub fn lambdas(&self) -> impl Iterator<Item = f64> + '_ {
        self.fits.iter().map(|f| f.lambda)
    }

    /// Coefficients of the first successful fit with exactly this λ.
    pub fn coefficients(&self, lambda: f64) -> Option<&Matrix> {
        self.fits
            .iter()
            .filter(|f| f.lambda == lambda)
            .find_map(LambdaFit::coefficients)
    }

    pub fn successful(&self) -> impl Iterator<Item = (f64, &Matrix)> + '_ {
        self.fits
            .iter()
            .filter_map(|f| f.coefficients().map(|c| (f.lambda, c)))
    }

    pub fn predict(&self, test_kernel: &Matrix) -> Result<Vec<Prediction>, EngineError> {
        predict(self, test_kernel)
    }
}

/// Predictions of one fitted λ, `n_test x n_targets`.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub lambda: f64,
    pub values: Matrix,
}

fn validate_lambdas(lambdas: &[f64]) -> Result<(), EngineError> {
    if lambdas.is_empty() {
        return Err(EngineError::invalid("lambdas", "at least one value is required"));
    }
    if let Some(bad) = lambdas.iter().find(|l| !(l.is_finite() && **l >= 0.0)) {
        return Err(EngineError::invalid(
            "lambdas",
            format!("values must be finite and non-negative, got {bad}"),
        ));
    }
    Ok(())
}

fn validate_training(kernel: &Matrix, targets: &Matrix) -> Result<(), EngineError> {
    if !kernel.is_square() {
        return Err(EngineError::invalid(
            "kernel",
            format!("must be square, got {}x{}", kernel.rows(), kernel.cols()),
        ));
    }
    if kernel.rows() == 0 {
        return Err(EngineError::invalid("kernel", "at least one training row is required"));
    }
    if !kernel.all_finite() {
        return Err(EngineError::invalid("kernel", "contains non-finite values"));
    }
    EngineError::check_dimension("target rows", kernel.rows(), targets.rows())?;
    if targets.cols() == 0 {
        return Err(EngineError::invalid("targets", "at least one target column is required"));
    }
    if !targets.all_finite() {
        return Err(EngineError::invalid("targets", "contains non-finite values"));
    }
    Ok(())
}

/// Fits `(K + λI) α = Y` for every λ.
///
/// Input problems fail the whole call. A factorization failure only marks
/// its own λ as failed; the remaining λ are still fitted. Each λ is
/// factorized once and the factor is reused for every target column.
#[instrument(skip_all, name = "ridge_fit", fields(n = kernel.rows(), lambdas = lambdas.len()))]
pub fn fit(kernel: &Matrix, targets: &Matrix, lambdas: &[f64]) -> Result<RegressionModel, EngineError> {
    validate_training(kernel, targets)?;
    validate_lambdas(lambdas)?;
    info!(
        targets = targets.cols(),
        "Fitting kernel ridge regression for {} regularization strengths.",
        lambdas.len()
    );

    let fits: Vec<LambdaFit> = lambdas
        .iter()
        .map(|&lambda| {
            let outcome =
                CholeskyFactor::with_shift(kernel, lambda).and_then(|factor| factor.solve(targets));
            match &outcome {
                Ok(_) => debug!(lambda, "Solved regularized system."),
                Err(e) => warn!(lambda, error = %e, "Factorization failed; skipping this lambda."),
            }
            LambdaFit { lambda, outcome }
        })
        .collect();

    let succeeded = fits.iter().filter(|f| f.is_success()).count();
    info!(succeeded, failed = fits.len() - succeeded, "Fit complete.");

    Ok(RegressionModel {
        n_train: kernel.rows(),
        n_targets: targets.cols(),
        fits,
    })
}

/// [`fit`] for a single target column.
pub fn fit_single(
    kernel: &Matrix,
    targets: &[f64],
    lambdas: &[f64],
) -> Result<RegressionModel, EngineError> {
    fit(kernel, &Matrix::column_vector(targets), lambdas)
}

/// Applies every successfully fitted λ to a `n_test x n_train` kernel.
///
/// λ values whose fit failed produce no prediction.
#[instrument(skip_all, name = "ridge_predict", fields(n_test = test_kernel.rows()))]
pub fn predict(model: &RegressionModel, test_kernel: &Matrix) -> Result<Vec<Prediction>, EngineError> {
    EngineError::check_dimension("test kernel columns", model.n_train, test_kernel.cols())?;
    if !test_kernel.all_finite() {
        return Err(EngineError::invalid("test_kernel", "contains non-finite values"));
    }

    Ok(model
        .successful()
        .map(|(lambda, alpha)| Prediction {
            lambda,
            values: multiply_transposed(test_kernel, &alpha.transpose()),
        })
        .collect())
}
