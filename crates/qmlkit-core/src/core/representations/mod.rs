//! # Representations
//!
//! Encoders that turn a [`Molecule`] into the numeric input of the kernel
//! engine.
//!
//! Two families exist:
//!
//! - **Global** representations produce one fixed-length vector per molecule
//!   ([`coulomb_matrix`], [`bag_of_bonds`], [`slatm`]).
//! - **Local** representations produce one fixed-length vector per atom
//!   ([`atomic_coulomb_matrix`], [`acsf`], [`arad`]).
//!
//! ARAD vectors are slot lists rather than plain feature vectors and are
//! meant for the ARAD kernel mode of the engine.
//!
//! The width of every vector is a pure function of the configuration, so all
//! representations encoded with the same [`RepresentationConfig`] can be
//! stacked into kernel matrices without further checks. Inputs that do not
//! fit the configured sizes are rejected with a configuration error; nothing
//! is silently truncated.

pub mod acsf;
pub mod arad;
pub mod atomic_coulomb_matrix;
pub mod bag_of_bonds;
pub mod coulomb_matrix;
pub mod slatm;

use crate::core::error::ErrorKind;
use crate::core::models::element::is_valid_nuclear_charge;
use crate::core::models::molecule::Molecule;
use crate::core::utils::geometry::CoincidentAtoms;
use itertools::Itertools;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub use acsf::AcsfParams;
pub use arad::{ARAD_SLOT_FEATURES, AradParams};
pub use atomic_coulomb_matrix::AtomicCoulombMatrixParams;
pub use bag_of_bonds::{BagCapacity, BagOfBondsParams};
pub use coulomb_matrix::{CoulombMatrixParams, CoulombSorting, EigenvalueCoulombMatrixParams};
pub use slatm::SlatmParams;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepresentationError {
    #[error("Molecule has {atoms} atoms but the representation is sized for at most {max_atoms}")]
    TooManyAtoms { atoms: usize, max_atoms: usize },

    #[error(
        "Atom {atom} has {neighbors} neighbours within the cutoff but only {slots} neighbour slots are configured"
    )]
    TooManyNeighbors {
        atom: usize,
        neighbors: usize,
        slots: usize,
    },

    #[error("Molecule contains {count} atoms of element Z={element} but its bag holds {capacity}")]
    BagOverflow {
        element: u8,
        count: usize,
        capacity: usize,
    },

    #[error("Element Z={element} of atom {atom} is not part of the configured element set")]
    UnsupportedElement { atom: usize, element: u8 },

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(#[from] CoincidentAtoms),

    #[error("Invalid representation parameter '{parameter}': {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },
}

impl RepresentationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TooManyAtoms { .. }
            | Self::TooManyNeighbors { .. }
            | Self::BagOverflow { .. }
            | Self::UnsupportedElement { .. } => ErrorKind::Configuration,
            Self::DegenerateGeometry(_) => ErrorKind::DegenerateGeometry,
            Self::InvalidParameter { .. } => ErrorKind::InvalidParameter,
        }
    }

    pub(crate) fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepresentationKind {
    Global,
    Local,
}

/// Per-atom feature vectors of one molecule, stored contiguously.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalRepresentation {
    n_atoms: usize,
    width: usize,
    values: Vec<f64>,
}

impl LocalRepresentation {
    pub(crate) fn with_capacity(n_atoms: usize, width: usize) -> Self {
        Self {
            n_atoms,
            width,
            values: vec![0.0; n_atoms * width],
        }
    }

    /// Builds a local representation from explicit per-atom rows, for
    /// callers that compute atomic features elsewhere.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, RepresentationError> {
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        let mut values = Vec::with_capacity(rows.len() * width);
        for (atom, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(RepresentationError::invalid(
                    "rows",
                    format!("atom {atom} has {} features, expected {width}", row.len()),
                ));
            }
            values.extend_from_slice(row);
        }
        Ok(Self {
            n_atoms: rows.len(),
            width,
            values,
        })
    }

    #[inline]
    pub fn n_atoms(&self) -> usize {
        self.n_atoms
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn atom(&self, i: usize) -> &[f64] {
        &self.values[i * self.width..(i + 1) * self.width]
    }

    pub(crate) fn atom_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.values[i * self.width..(i + 1) * self.width]
    }

    pub fn atoms(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        (0..self.n_atoms).map(move |i| self.atom(i))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// The output of an encoder.
#[derive(Debug, Clone, PartialEq)]
pub enum Representation {
    Global(Vec<f64>),
    Local(LocalRepresentation),
}

impl Representation {
    pub fn kind(&self) -> RepresentationKind {
        match self {
            Self::Global(_) => RepresentationKind::Global,
            Self::Local(_) => RepresentationKind::Local,
        }
    }

    /// Length of one feature vector (the whole vector for global
    /// representations, one atom's vector for local ones).
    pub fn width(&self) -> usize {
        match self {
            Self::Global(v) => v.len(),
            Self::Local(l) => l.width(),
        }
    }

    pub fn as_global(&self) -> Option<&[f64]> {
        match self {
            Self::Global(v) => Some(v),
            Self::Local(_) => None,
        }
    }

    pub fn as_local(&self) -> Option<&LocalRepresentation> {
        match self {
            Self::Local(l) => Some(l),
            Self::Global(_) => None,
        }
    }
}

/// Selects a representation scheme and its sizing parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum RepresentationConfig {
    CoulombMatrix(CoulombMatrixParams),
    EigenvalueCoulombMatrix(EigenvalueCoulombMatrixParams),
    BagOfBonds(BagOfBondsParams),
    Slatm(SlatmParams),
    AtomicCoulombMatrix(AtomicCoulombMatrixParams),
    Acsf(AcsfParams),
    Arad(AradParams),
}

impl RepresentationConfig {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CoulombMatrix(_) => "coulomb-matrix",
            Self::EigenvalueCoulombMatrix(_) => "eigenvalue-coulomb-matrix",
            Self::BagOfBonds(_) => "bag-of-bonds",
            Self::Slatm(_) => "slatm",
            Self::AtomicCoulombMatrix(_) => "atomic-coulomb-matrix",
            Self::Acsf(_) => "acsf",
            Self::Arad(_) => "arad",
        }
    }

    pub fn kind(&self) -> RepresentationKind {
        match self {
            Self::CoulombMatrix(_)
            | Self::EigenvalueCoulombMatrix(_)
            | Self::BagOfBonds(_)
            | Self::Slatm(_) => RepresentationKind::Global,
            Self::AtomicCoulombMatrix(_) | Self::Acsf(_) | Self::Arad(_) => RepresentationKind::Local,
        }
    }

    /// Length of each produced feature vector.
    pub fn width(&self) -> usize {
        match self {
            Self::CoulombMatrix(p) => p.width(),
            Self::EigenvalueCoulombMatrix(p) => p.width(),
            Self::BagOfBonds(p) => p.width(),
            Self::Slatm(p) => p.width(),
            Self::AtomicCoulombMatrix(p) => p.width(),
            Self::Acsf(p) => p.width(),
            Self::Arad(p) => p.width(),
        }
    }

    pub fn validate(&self) -> Result<(), RepresentationError> {
        match self {
            Self::CoulombMatrix(p) => p.validate(),
            Self::EigenvalueCoulombMatrix(p) => p.validate(),
            Self::BagOfBonds(p) => p.validate(),
            Self::Slatm(p) => p.validate(),
            Self::AtomicCoulombMatrix(p) => p.validate(),
            Self::Acsf(p) => p.validate(),
            Self::Arad(p) => p.validate(),
        }
    }

    pub fn encode(&self, molecule: &Molecule) -> Result<Representation, RepresentationError> {
        self.validate()?;
        self.encode_validated(molecule)
    }

    fn encode_validated(&self, molecule: &Molecule) -> Result<Representation, RepresentationError> {
        match self {
            Self::CoulombMatrix(p) => coulomb_matrix::encode(molecule, p).map(Representation::Global),
            Self::EigenvalueCoulombMatrix(p) => {
                coulomb_matrix::encode_eigenvalues(molecule, p).map(Representation::Global)
            }
            Self::BagOfBonds(p) => bag_of_bonds::encode(molecule, p).map(Representation::Global),
            Self::Slatm(p) => slatm::encode(molecule, p).map(Representation::Global),
            Self::AtomicCoulombMatrix(p) => {
                atomic_coulomb_matrix::encode(molecule, p).map(Representation::Local)
            }
            Self::Acsf(p) => acsf::encode(molecule, p).map(Representation::Local),
            Self::Arad(p) => arad::encode(molecule, p).map(Representation::Local),
        }
    }
}

/// Encodes one molecule.
pub fn encode(
    molecule: &Molecule,
    config: &RepresentationConfig,
) -> Result<Representation, RepresentationError> {
    config.encode(molecule)
}

/// Encodes many molecules, in parallel when the `parallel` feature is on.
///
/// The configuration is validated once. On failure the error of the first
/// failing molecule in input order is returned, independent of scheduling.
#[instrument(skip_all, name = "encode_batch", fields(scheme = config.name(), n = molecules.len()))]
pub fn encode_batch(
    molecules: &[Molecule],
    config: &RepresentationConfig,
) -> Result<Vec<Representation>, RepresentationError> {
    config.validate()?;

    #[cfg(not(feature = "parallel"))]
    let iterator = molecules.iter();

    #[cfg(feature = "parallel")]
    let iterator = molecules.par_iter();

    let results: Vec<Result<Representation, RepresentationError>> = iterator
        .map(|molecule| config.encode_validated(molecule))
        .collect();

    let representations = results.into_iter().collect::<Result<Vec<_>, _>>()?;
    debug!(width = config.width(), "Encoded {} molecules.", representations.len());
    Ok(representations)
}

/// Diagonal Coulomb term `0.5 Z^2.4`, the fitted potential energy of a free atom.
#[inline]
pub(crate) fn self_interaction(charge: f64) -> f64 {
    0.5 * charge.powf(2.4)
}

/// Index of `(i, j)` with `j <= i` in a packed lower triangle.
#[inline]
pub(crate) fn packed_index(i: usize, j: usize) -> usize {
    debug_assert!(j <= i);
    i * (i + 1) / 2 + j
}

#[inline]
pub(crate) fn packed_len(n: usize) -> usize {
    n * (n + 1) / 2
}

/// Offset of the unordered pair of element slots `(a, b)` among all
/// `n_elements (n_elements + 1) / 2` pairs, enumerated `(0,0), (0,1), ..`.
#[inline]
pub(crate) fn pair_offset(a: usize, b: usize, n_elements: usize) -> usize {
    let (a, b) = if a <= b { (a, b) } else { (b, a) };
    a * n_elements - a * a.saturating_sub(1) / 2 + (b - a)
}

/// Checks an element universe: non-empty, valid charges, no duplicates.
pub(crate) fn validate_elements(elements: &[u8]) -> Result<(), RepresentationError> {
    if elements.is_empty() {
        return Err(RepresentationError::invalid("elements", "must not be empty"));
    }
    if let Some(&bad) = elements.iter().find(|&&z| !is_valid_nuclear_charge(z)) {
        return Err(RepresentationError::invalid(
            "elements",
            format!("invalid nuclear charge {bad}"),
        ));
    }
    if elements.iter().duplicates().next().is_some() {
        return Err(RepresentationError::invalid("elements", "contains duplicates"));
    }
    Ok(())
}

/// Slot of every atom's element in the ascending element list `sorted`.
pub(crate) fn element_slots(
    molecule: &Molecule,
    sorted: &[u8],
) -> Result<Vec<usize>, RepresentationError> {
    molecule
        .nuclear_charges()
        .enumerate()
        .map(|(atom, z)| {
            sorted
                .binary_search(&z)
                .map_err(|_| RepresentationError::UnsupportedElement { atom, element: z })
        })
        .collect()
}
