//! # Engine Module
//!
//! The numerical core: everything between encoded representations and
//! predicted properties.
//!
//! ## Architecture
//!
//! - **Distances** ([`distance`]) - Dense pairwise L1, L2 and p-norm distance matrices
//! - **Kernels** ([`kernels`]) - Gaussian, Laplacian and linear kernel matrices in
//!   global and local (atom-pair aggregated) mode
//! - **Solver** ([`solver`]) - Blocked Cholesky factorization and kernel ridge regression
//! - **Configuration** ([`config`]) - TOML-loadable regression settings and their builder
//! - **Progress Monitoring** ([`progress`]) - Optional callback for workflow events
//! - **Error Handling** ([`error`]) - Engine error type and its classification
//!
//! Every pairwise computation writes disjoint row blocks of its output in
//! parallel when the `parallel` feature is enabled. No state is kept between
//! calls.

pub mod config;
pub mod distance;
pub mod error;
pub mod kernels;
pub(crate) mod parallel;
pub mod progress;
pub mod solver;
