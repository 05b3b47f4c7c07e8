//! # QMLKit Core Library
//!
//! Kernel ridge regression for molecular properties: encode molecules into
//! fixed-length representations, compare them through kernel functions, and
//! solve regularized linear systems to train and apply property models.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Molecule`, `Matrix`)
//!   and the representation encoders that map a molecule to a feature vector
//!   (global) or a set of per-atom feature vectors (local).
//!
//! - **[`engine`]: The Numerical Core.** Pairwise distances, kernel matrices
//!   for global and local representations, the Cholesky based linear solver,
//!   and ridge regression fitting over several regularization strengths.
//!
//! - **[`workflows`]: The Public API.** Ties `core` and `engine` together into
//!   a train/predict procedure driven by a single `RegressionConfig`.
//!
//! Parallel execution through `rayon` is enabled by the default `parallel`
//! feature; results are identical with or without it.

pub mod core;
pub mod engine;
pub mod workflows;
