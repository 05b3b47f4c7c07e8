//! # Molecular Models
//!
//! Stateless data structures describing the molecules fed to the encoders.
//!
//! - [`atom`] - A single atom: nuclear charge and Cartesian position
//! - [`molecule`] - An ordered, validated, immutable list of atoms
//! - [`element`] - Static periodic-table lookups: symbol to nuclear charge, period and group

pub mod atom;
pub mod element;
pub mod molecule;
