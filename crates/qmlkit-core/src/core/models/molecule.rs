use super::atom::Atom;
use super::element::{is_valid_nuclear_charge, nuclear_charge};
use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MoleculeError {
    #[error("Got {charges} nuclear charges but {coordinates} coordinates")]
    LengthMismatch { charges: usize, coordinates: usize },
    #[error("Invalid nuclear charge {charge} for atom {index}")]
    InvalidNuclearCharge { index: usize, charge: u8 },
    #[error("Unknown element symbol '{symbol}' for atom {index}")]
    UnknownElement { index: usize, symbol: String },
    #[error("Atom {index} has a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },
}

/// An ordered, immutable sequence of atoms.
///
/// Atom order is significant: representations that need a tie-breaker
/// (row sorting, neighbour ordering) fall back to the atom index.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    atoms: Vec<Atom>,
}

impl Molecule {
    /// Builds a molecule from parallel sequences of nuclear charges and
    /// Cartesian coordinates (Angstrom).
    ///
    /// # Errors
    ///
    /// Returns a [`MoleculeError`] if the sequences differ in length, a charge
    /// lies outside `1..=118`, or a coordinate is NaN or infinite.
    pub fn new(nuclear_charges: &[u8], coordinates: &[[f64; 3]]) -> Result<Self, MoleculeError> {
        if nuclear_charges.len() != coordinates.len() {
            return Err(MoleculeError::LengthMismatch {
                charges: nuclear_charges.len(),
                coordinates: coordinates.len(),
            });
        }

        let atoms = nuclear_charges
            .iter()
            .zip(coordinates)
            .enumerate()
            .map(|(index, (&charge, xyz))| {
                if !is_valid_nuclear_charge(charge) {
                    return Err(MoleculeError::InvalidNuclearCharge { index, charge });
                }
                if xyz.iter().any(|c| !c.is_finite()) {
                    return Err(MoleculeError::NonFiniteCoordinate { index });
                }
                Ok(Atom::new(charge, Point3::new(xyz[0], xyz[1], xyz[2])))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { atoms })
    }

    /// Builds a molecule from element symbols instead of nuclear charges.
    pub fn from_symbols<S: AsRef<str>>(
        symbols: &[S],
        coordinates: &[[f64; 3]],
    ) -> Result<Self, MoleculeError> {
        let charges = symbols
            .iter()
            .enumerate()
            .map(|(index, symbol)| {
                nuclear_charge(symbol.as_ref()).ok_or_else(|| MoleculeError::UnknownElement {
                    index,
                    symbol: symbol.as_ref().to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(&charges, coordinates)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn nuclear_charges(&self) -> impl Iterator<Item = u8> + '_ {
        self.atoms.iter().map(|a| a.nuclear_charge)
    }

    /// Number of atoms carrying the given nuclear charge.
    pub fn count_element(&self, charge: u8) -> usize {
        self.atoms
            .iter()
            .filter(|a| a.nuclear_charge == charge)
            .count()
    }
}
