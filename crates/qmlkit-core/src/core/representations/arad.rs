use super::{LocalRepresentation, RepresentationError};
use crate::core::models::element::period_and_group;
use crate::core::models::molecule::Molecule;
use crate::core::utils::geometry::{InteratomicDistances, bond_angle, cosine_cutoff};
use serde::Deserialize;

/// Features stored per neighbour slot.
pub const ARAD_SLOT_FEATURES: usize = 5;

/// Position of each feature inside a slot.
pub mod slot {
    pub const DISTANCE: usize = 0;
    pub const PERIOD: usize = 1;
    pub const GROUP: usize = 2;
    pub const ANGULAR_COS: usize = 3;
    pub const ANGULAR_SIN: usize = 4;
}

const DEFAULT_CUTOFF_RADIUS: f64 = 5.0;

fn default_cutoff_radius() -> f64 {
    DEFAULT_CUTOFF_RADIUS
}

/// Alchemical and radial distribution of each atomic environment.
///
/// Every atom gets `max_neighbors + 1` slots of
/// [`ARAD_SLOT_FEATURES`] values each. Slot 0 describes the atom itself.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AradParams {
    pub max_neighbors: usize,
    #[serde(default = "default_cutoff_radius")]
    pub cutoff_radius: f64,
}

impl AradParams {
    pub fn new(max_neighbors: usize) -> Self {
        Self {
            max_neighbors,
            cutoff_radius: DEFAULT_CUTOFF_RADIUS,
        }
    }

    fn slots(&self) -> usize {
        self.max_neighbors + 1
    }

    pub fn width(&self) -> usize {
        ARAD_SLOT_FEATURES * self.slots()
    }

    pub fn validate(&self) -> Result<(), RepresentationError> {
        if !(self.cutoff_radius.is_finite() && self.cutoff_radius > 0.0) {
            return Err(RepresentationError::invalid(
                "cutoff_radius",
                format!("must be positive and finite, got {}", self.cutoff_radius),
            ));
        }
        Ok(())
    }
}

/// Encodes one slot list per atom.
///
/// A slot holds `[r, period, group, Σ cos θ f_c, Σ sin θ f_c]`: the distance
/// to the central atom, the periodic-table position of the slot's atom, and
/// the first Fourier terms of the angles `θ` it spans at the centre with
/// every other neighbour, weighted by that neighbour's cosine cutoff.
/// Neighbours follow the centre in (distance, index) order. Unused slots are
/// zero; every real slot has a period of at least 1.
pub fn encode(
    molecule: &Molecule,
    params: &AradParams,
) -> Result<LocalRepresentation, RepresentationError> {
    let table: Vec<(f64, f64)> = molecule
        .nuclear_charges()
        .enumerate()
        .map(|(atom, z)| {
            period_and_group(z)
                .map(|(p, g)| (f64::from(p), f64::from(g)))
                .ok_or(RepresentationError::UnsupportedElement { atom, element: z })
        })
        .collect::<Result<_, _>>()?;

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

        let row = rep.atom_mut(center);
        let (period, group) = table[center];
        row[slot::PERIOD] = period;
        row[slot::GROUP] = group;

        let pc = &atoms[center].position;
        for (s, nb) in neighbors.iter().enumerate() {
            let (cos_sum, sin_sum) = neighbors
                .iter()
                .filter(|other| other.index != nb.index)
                .fold((0.0, 0.0), |(cos_acc, sin_acc), other| {
                    let theta = bond_angle(pc, &atoms[nb.index].position, &atoms[other.index].position);
                    let weight = cosine_cutoff(other.distance, params.cutoff_radius);
                    (cos_acc + theta.cos() * weight, sin_acc + theta.sin() * weight)
                });

            let (period, group) = table[nb.index];
            let out = &mut row[(s + 1) * ARAD_SLOT_FEATURES..(s + 2) * ARAD_SLOT_FEATURES];
            out[slot::DISTANCE] = nb.distance;
            out[slot::PERIOD] = period;
            out[slot::GROUP] = group;
            out[slot::ANGULAR_COS] = cos_sum;
            out[slot::ANGULAR_SIN] = sin_sum;
        }
    }

    Ok(rep)
}
