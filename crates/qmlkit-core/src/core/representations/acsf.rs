use super::{LocalRepresentation, RepresentationError, element_slots, pair_offset, validate_elements};
use crate::core::models::molecule::Molecule;
use crate::core::utils::geometry::{InteratomicDistances, bond_angle, cosine_cutoff};
use itertools::Itertools;
use serde::Deserialize;
use std::f64::consts::PI;

const DEFAULT_RADIAL_CENTERS: usize = 20;
const DEFAULT_RADIAL_WIDTH: f64 = 4.0;
const DEFAULT_ANGULAR_CENTERS: usize = 8;
const DEFAULT_ANGULAR_WIDTH: f64 = 8.0;

fn default_radial_centers() -> usize {
    DEFAULT_RADIAL_CENTERS
}
fn default_radial_width() -> f64 {
    DEFAULT_RADIAL_WIDTH
}
fn default_angular_centers() -> usize {
    DEFAULT_ANGULAR_CENTERS
}
fn default_angular_width() -> f64 {
    DEFAULT_ANGULAR_WIDTH
}

/// Atom-centred symmetry functions binned by neighbour element.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AcsfParams {
    /// Element universe; every atom of an encoded molecule must be listed.
    pub elements: Vec<u8>,
    pub cutoff_radius: f64,
    /// Number of Gaussian shells spread evenly over `[0, cutoff_radius]`.
    #[serde(default = "default_radial_centers")]
    pub radial_centers: usize,
    /// Radial Gaussian exponent `η` (1/Å²).
    #[serde(default = "default_radial_width")]
    pub radial_width: f64,
    /// Number of angle centres spread evenly over `[0, π]`.
    #[serde(default = "default_angular_centers")]
    pub angular_centers: usize,
    /// Angular Gaussian exponent `ζ` (1/rad²).
    #[serde(default = "default_angular_width")]
    pub angular_width: f64,
}

impl AcsfParams {
    pub fn new(elements: Vec<u8>, cutoff_radius: f64) -> Self {
        Self {
            elements,
            cutoff_radius,
            radial_centers: DEFAULT_RADIAL_CENTERS,
            radial_width: DEFAULT_RADIAL_WIDTH,
            angular_centers: DEFAULT_ANGULAR_CENTERS,
            angular_width: DEFAULT_ANGULAR_WIDTH,
        }
    }

    fn sorted_elements(&self) -> Vec<u8> {
        self.elements.iter().copied().sorted().collect()
    }

    fn n_pairs(&self) -> usize {
        let e = self.elements.len();
        e * (e + 1) / 2
    }

    pub fn width(&self) -> usize {
        self.elements.len() * self.radial_centers + self.n_pairs() * self.angular_centers
    }

    pub fn validate(&self) -> Result<(), RepresentationError> {
        validate_elements(&self.elements)?;
        if !(self.cutoff_radius.is_finite() && self.cutoff_radius > 0.0) {
            return Err(RepresentationError::invalid(
                "cutoff_radius",
                format!("must be positive and finite, got {}", self.cutoff_radius),
            ));
        }
        if self.radial_centers == 0 || self.angular_centers == 0 {
            return Err(RepresentationError::invalid(
                "radial_centers/angular_centers",
                "grids need at least one centre",
            ));
        }
        for (name, value) in [
            ("radial_width", self.radial_width),
            ("angular_width", self.angular_width),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(RepresentationError::invalid(
                    name,
                    format!("must be positive and finite, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// Evenly spaced centres on `[0, upper]`; a single centre sits at zero.
fn linspace(upper: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![0.0];
    }
    (0..n).map(|k| upper * k as f64 / (n - 1) as f64).collect()
}

/// Encodes radial and angular symmetry functions for every atom.
///
/// Per atom `i` the vector holds, for each element `e` and radial centre
/// `μ_k`, `Σ_j exp(-η (r_ij - μ_k)²) f_c(r_ij)` over neighbours `j` of element
/// `e`; followed, for each unordered element pair and angle centre `θ_s`, by
/// `Σ_{j<k} exp(-ζ (θ_jik - θ_s)²) f_c(r_ij) f_c(r_ik)`.
pub fn encode(
    molecule: &Molecule,
    params: &AcsfParams,
) -> Result<LocalRepresentation, RepresentationError> {
    let elements = params.sorted_elements();
    let element_slot = element_slots(molecule, &elements)?;
    let distances = InteratomicDistances::compute(molecule.atoms())?;
    let atoms = molecule.atoms();
    let n_elements = elements.len();
    let radial_grid = linspace(params.cutoff_radius, params.radial_centers);
    let angular_grid = linspace(PI, params.angular_centers);
    let angular_start = n_elements * params.radial_centers;
    let mut rep = LocalRepresentation::with_capacity(atoms.len(), params.width());

    for center in 0..atoms.len() {
        let neighbors = distances.sorted_neighbors(center, params.cutoff_radius);
        let cutoffs: Vec<f64> = neighbors
            .iter()
            .map(|n| cosine_cutoff(n.distance, params.cutoff_radius))
            .collect();
        let row = rep.atom_mut(center);

        for (nb, &fc) in neighbors.iter().zip(&cutoffs) {
            let base = element_slot[nb.index] * params.radial_centers;
            for (k, &mu) in radial_grid.iter().enumerate() {
                let shift = nb.distance - mu;
                row[base + k] += (-params.radial_width * shift * shift).exp() * fc;
            }
        }

        for ((j, nb_j), (k, nb_k)) in neighbors.iter().enumerate().tuple_combinations() {
            let weight = cutoffs[j] * cutoffs[k];
            if weight == 0.0 {
                continue;
            }
            let theta = bond_angle(
                &atoms[center].position,
                &atoms[nb_j.index].position,
                &atoms[nb_k.index].position,
            );
            let pair = pair_offset(
                element_slot[nb_j.index],
                element_slot[nb_k.index],
                n_elements,
            );
            let base = angular_start + pair * params.angular_centers;
            for (s, &theta_s) in angular_grid.iter().enumerate() {
                let shift = theta - theta_s;
                row[base + s] += (-params.angular_width * shift * shift).exp() * weight;
            }
        }
    }

    Ok(rep)
}
