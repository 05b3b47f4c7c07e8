//! # Linear Solver
//!
//! Cholesky factorization of symmetric positive definite systems and the
//! kernel ridge regression built on it: `fit` solves `(K + λI) α = Y` for a
//! list of λ, `predict` evaluates `K_test α` for every fitted λ.

pub mod cholesky;
pub mod regression;

pub use cholesky::{CholeskyFactor, cholesky_invert, cholesky_solve};
pub use regression::{LambdaFit, Prediction, RegressionModel, fit, fit_single, predict};
