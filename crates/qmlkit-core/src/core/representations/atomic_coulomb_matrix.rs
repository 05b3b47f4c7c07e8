use super::{LocalRepresentation, RepresentationError, packed_index, packed_len, self_interaction};
use crate::core::models::molecule::Molecule;
use crate::core::utils::geometry::InteratomicDistances;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AtomicCoulombMatrixParams {
    /// Largest molecule the representation is sized for.
    pub max_atoms: usize,
    /// Number of neighbour slots next to the central atom.
    pub max_neighbors: usize,
    /// Neighbours farther than this (Angstrom) are left out.
    pub cutoff_radius: f64,
}

impl AtomicCoulombMatrixParams {
    /// Side length of each atom-centred matrix: the central atom plus its
    /// neighbour slots.
    fn slots(&self) -> usize {
        self.max_neighbors + 1
    }

    pub fn width(&self) -> usize {
        packed_len(self.slots())
    }

    pub fn validate(&self) -> Result<(), RepresentationError> {
        if self.max_atoms == 0 {
            return Err(RepresentationError::invalid("max_atoms", "must be at least 1"));
        }
        if !(self.cutoff_radius.is_finite() && self.cutoff_radius > 0.0) {
            return Err(RepresentationError::invalid(
                "cutoff_radius",
                format!("must be positive and finite, got {}", self.cutoff_radius),
            ));
        }
        Ok(())
    }
}

/// Encodes one Coulomb matrix per atom, centred on that atom.
///
/// Slot 0 is the central atom; neighbours within the cutoff fill the
/// following slots sorted by distance, ties broken by atom index. Each
/// matrix is stored as a packed lower triangle and unused slots are zero.
pub fn encode(
    molecule: &Molecule,
    params: &AtomicCoulombMatrixParams,
) -> Result<LocalRepresentation, RepresentationError> {
    if molecule.len() > params.max_atoms {
        return Err(RepresentationError::TooManyAtoms {
            atoms: molecule.len(),
            max_atoms: params.max_atoms,
        });
    }

    let distances = InteratomicDistances::compute(molecule.atoms())?;
    let atoms = molecule.atoms();
    let mut rep = LocalRepresentation::with_capacity(atoms.len(), params.width());

    for center in 0..atoms.len() {
        let neighbors = distances.sorted_neighbors(center, params.cutoff_radius);
        if neighbors.len() > params.max_neighbors {
            return Err(RepresentationError::TooManyNeighbors {
                atom: center,
                neighbors: neighbors.len(),
                slots: params.max_neighbors,
            });
        }

        let order: Vec<usize> = std::iter::once(center)
            .chain(neighbors.iter().map(|n| n.index))
            .collect();

        let row = rep.atom_mut(center);
        for (i, &a) in order.iter().enumerate() {
            let za = atoms[a].charge();
            row[packed_index(i, i)] = self_interaction(za);
            for (j, &b) in order.iter().enumerate().take(i) {
                row[packed_index(i, j)] = za * atoms[b].charge() / distances.get(a, b);
            }
        }
    }

    Ok(rep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use approx::assert_relative_eq;

    fn params(max_neighbors: usize, cutoff_radius: f64) -> AtomicCoulombMatrixParams {
        AtomicCoulombMatrixParams {
            max_atoms: 10,
            max_neighbors,
            cutoff_radius,
        }
    }

    fn chain() -> Molecule {
        // C at origin, O at 1.2, H at -1.0, H far away at 8.0
        Molecule::new(
            &[6, 8, 1, 1],
            &[
                [0.0, 0.0, 0.0],
                [1.2, 0.0, 0.0],
                [-1.0, 0.0, 0.0],
                [8.0, 0.0, 0.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn central_atom_occupies_first_slot() {
        let rep = encode(&chain(), &params(3, 3.0)).unwrap();
        assert_eq!(rep.n_atoms(), 4);
        assert_eq!(rep.width(), 10);
        for (i, z) in [6.0f64, 8.0, 1.0, 1.0].iter().enumerate() {
            assert_relative_eq!(rep.atom(i)[0], 0.5 * z.powf(2.4), epsilon = 1e-9);
        }
    }

    #[test]
    fn neighbours_are_ordered_by_distance() {
        let rep = encode(&chain(), &params(3, 3.0)).unwrap();
        let carbon = rep.atom(0);
        // Nearest neighbour of C is H at 1.0, then O at 1.2.
        assert_relative_eq!(carbon[packed_index(1, 0)], 6.0 * 1.0 / 1.0, epsilon = 1e-12);
        assert_relative_eq!(carbon[packed_index(2, 0)], 6.0 * 8.0 / 1.2, epsilon = 1e-12);
        assert_relative_eq!(carbon[packed_index(2, 1)], 8.0 * 1.0 / 2.2, epsilon = 1e-12);
    }

    #[test]
    fn atoms_outside_cutoff_leave_zero_padding() {
        let rep = encode(&chain(), &params(3, 3.0)).unwrap();
        let isolated = rep.atom(3);
        assert!(isolated[0] > 0.0);
        assert!(isolated[1..].iter().all(|&v| v == 0.0));

        let carbon = rep.atom(0);
        for j in 0..=3 {
            assert_eq!(carbon[packed_index(3, j)], 0.0);
        }
    }

    #[test]
    fn equidistant_neighbours_are_ordered_by_index() {
        let molecule = Molecule::new(
            &[6, 1, 9],
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]],
        )
        .unwrap();
        let rep = encode(&molecule, &params(2, 2.0)).unwrap();
        let carbon = rep.atom(0);
        assert_relative_eq!(carbon[packed_index(1, 1)], 0.5, epsilon = 1e-12);
        assert_relative_eq!(carbon[packed_index(2, 2)], 0.5 * 9f64.powf(2.4), epsilon = 1e-9);
    }

    #[test]
    fn too_many_neighbours_is_a_configuration_error() {
        let err = encode(&chain(), &params(1, 3.0)).unwrap_err();
        assert_eq!(
            err,
            RepresentationError::TooManyNeighbors {
                atom: 0,
                neighbors: 2,
                slots: 1
            }
        );
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn too_many_atoms_is_a_configuration_error() {
        let p = AtomicCoulombMatrixParams {
            max_atoms: 2,
            max_neighbors: 4,
            cutoff_radius: 3.0,
        };
        assert!(matches!(
            encode(&chain(), &p),
            Err(RepresentationError::TooManyAtoms { atoms: 4, max_atoms: 2 })
        ));
    }

    #[test]
    fn non_positive_cutoff_is_invalid() {
        assert!(params(3, 0.0).validate().is_err());
        assert!(params(3, -1.0).validate().is_err());
        assert!(params(3, f64::NAN).validate().is_err());
        assert!(params(3, 2.0).validate().is_ok());
    }
}
