//! # Core Module
//!
//! Stateless building blocks for molecular machine learning: molecules and
//! their atoms, interatomic geometry, dense matrices, and the fixed-length
//! representations that turn a molecule into numeric feature vectors.
//!
//! ## Architecture
//!
//! - **Molecular Description** ([`models`]) - Atoms, elements and validated molecules
//! - **Representations** ([`representations`]) - Coulomb matrix, eigenvalue spectrum,
//!   bag of bonds, atom-centred Coulomb matrices and symmetry functions
//! - **Dense Storage** ([`matrix`]) - Row-major `f64` matrices shared by the engine
//! - **Geometry** ([`utils`]) - Interatomic distances, neighbour lists, cutoffs
//! - **Error Classification** ([`error`]) - Coarse error kinds shared by all layers

pub mod error;
pub mod matrix;
pub mod models;
pub mod representations;
pub mod utils;
