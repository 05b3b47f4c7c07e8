//! # Workflows Module
//!
//! End-to-end procedures built from the `core` encoders and the `engine`
//! kernels and solver.
//!
//! - **Regression Workflow** ([`regression`]) - Encode training molecules, build the
//!   training kernel, fit every configured regularization strength, then
//!   predict properties of new molecules with the fitted model.

pub mod regression;
