use super::{RepresentationError, packed_index, packed_len, self_interaction};
use crate::core::models::molecule::Molecule;
use crate::core::utils::geometry::InteratomicDistances;
use crate::core::utils::vector;
use nalgebra::{DMatrix, SymmetricEigen};
use serde::Deserialize;
use std::cmp::Ordering;

/// Atom ordering applied before the Coulomb matrix is flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoulombSorting {
    /// Rows ordered by descending Euclidean norm; equal norms keep input order.
    /// Makes the representation invariant to atom permutations.
    #[default]
    RowNorm,
    /// Rows kept in input atom order.
    Unsorted,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CoulombMatrixParams {
    /// Largest molecule the representation is sized for.
    pub max_atoms: usize,
    #[serde(default)]
    pub sorting: CoulombSorting,
}

impl CoulombMatrixParams {
    /// Length of the packed lower triangle of a `max_atoms x max_atoms` matrix.
    pub fn width(&self) -> usize {
        packed_len(self.max_atoms)
    }

    pub fn validate(&self) -> Result<(), RepresentationError> {
        validate_max_atoms(self.max_atoms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct EigenvalueCoulombMatrixParams {
    pub max_atoms: usize,
}

impl EigenvalueCoulombMatrixParams {
    pub fn width(&self) -> usize {
        self.max_atoms
    }

    pub fn validate(&self) -> Result<(), RepresentationError> {
        validate_max_atoms(self.max_atoms)
    }
}

fn validate_max_atoms(max_atoms: usize) -> Result<(), RepresentationError> {
    if max_atoms == 0 {
        return Err(RepresentationError::invalid("max_atoms", "must be at least 1"));
    }
    Ok(())
}

fn check_size(molecule: &Molecule, max_atoms: usize) -> Result<(), RepresentationError> {
    if molecule.len() > max_atoms {
        return Err(RepresentationError::TooManyAtoms {
            atoms: molecule.len(),
            max_atoms,
        });
    }
    Ok(())
}

/// Full `n x n` Coulomb matrix, row-major:
/// `M_ii = 0.5 Z_i^2.4`, `M_ij = Z_i Z_j / |r_i - r_j|`.
pub(crate) fn full_coulomb_matrix(
    molecule: &Molecule,
    distances: &InteratomicDistances,
) -> Vec<f64> {
    let atoms = molecule.atoms();
    let n = atoms.len();
    let mut m = vec![0.0; n * n];
    for i in 0..n {
        let zi = atoms[i].charge();
        m[i * n + i] = self_interaction(zi);
        for j in (i + 1)..n {
            let value = zi * atoms[j].charge() / distances.get(i, j);
            m[i * n + j] = value;
            m[j * n + i] = value;
        }
    }
    m
}

/// Atom permutation applied to rows and columns before flattening.
fn row_order(matrix: &[f64], n: usize, sorting: CoulombSorting) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n).collect();
    if sorting == CoulombSorting::RowNorm {
        let norms: Vec<f64> = (0..n)
            .map(|i| vector::norm(&matrix[i * n..(i + 1) * n]))
            .collect();
        order.sort_by(|&a, &b| {
            norms[b]
                .partial_cmp(&norms[a])
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.cmp(&b))
        });
    }
    order
}

/// Encodes the (optionally sorted) Coulomb matrix as a packed lower triangle
/// of size `max_atoms (max_atoms + 1) / 2`. Slots beyond the molecule's own
/// atoms are exactly zero.
pub fn encode(
    molecule: &Molecule,
    params: &CoulombMatrixParams,
) -> Result<Vec<f64>, RepresentationError> {
    check_size(molecule, params.max_atoms)?;
    let distances = InteratomicDistances::compute(molecule.atoms())?;

    let n = molecule.len();
    let matrix = full_coulomb_matrix(molecule, &distances);
    let order = row_order(&matrix, n, params.sorting);

    let mut packed = vec![0.0; params.width()];
    for (i, &row) in order.iter().enumerate() {
        for (j, &col) in order.iter().enumerate().take(i + 1) {
            packed[packed_index(i, j)] = matrix[row * n + col];
        }
    }
    Ok(packed)
}

/// Encodes the eigenvalue spectrum of the Coulomb matrix, sorted descending
/// and zero-padded to `max_atoms`.
pub fn encode_eigenvalues(
    molecule: &Molecule,
    params: &EigenvalueCoulombMatrixParams,
) -> Result<Vec<f64>, RepresentationError> {
    check_size(molecule, params.max_atoms)?;
    let distances = InteratomicDistances::compute(molecule.atoms())?;

    let mut spectrum = vec![0.0; params.width()];
    let n = molecule.len();
    if n == 0 {
        return Ok(spectrum);
    }

    let matrix = DMatrix::from_row_slice(n, n, &full_coulomb_matrix(molecule, &distances));
    let mut eigenvalues: Vec<f64> = SymmetricEigen::new(matrix).eigenvalues.iter().copied().collect();
    eigenvalues.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));

    spectrum[..n].copy_from_slice(&eigenvalues);
    Ok(spectrum)
}
