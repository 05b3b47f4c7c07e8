use super::{RepresentationError, element_slots, packed_len, pair_offset, validate_elements};
use crate::core::models::molecule::Molecule;
use crate::core::utils::geometry::{InteratomicDistances, bond_angle};
use itertools::Itertools;
use serde::Deserialize;
use std::f64::consts::PI;

/// First point of the radial grid (Angstrom). The `1/r^n` weight makes the
/// grid meaningless much closer to zero.
pub const RADIAL_GRID_START: f64 = 0.1;

const DEFAULT_CUTOFF_RADIUS: f64 = 4.8;
const DEFAULT_SIGMA: f64 = 0.05;
const DEFAULT_SPACING: f64 = 0.03;
const DEFAULT_RADIAL_POWER: i32 = 6;
const DEFAULT_ANGULAR_POWER: i32 = 3;

fn default_cutoff_radius() -> f64 {
    DEFAULT_CUTOFF_RADIUS
}
fn default_sigma() -> f64 {
    DEFAULT_SIGMA
}
fn default_spacing() -> f64 {
    DEFAULT_SPACING
}
fn default_radial_power() -> i32 {
    DEFAULT_RADIAL_POWER
}
fn default_angular_power() -> i32 {
    DEFAULT_ANGULAR_POWER
}

/// Spectrum of London and Axilrod-Teller-Muto potentials.
///
/// One-, two- and three-body terms are binned by element, element pair and
/// (centre element, unordered end pair) respectively. Two- and three-body
/// terms are smeared onto fixed grids with normalized Gaussians.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SlatmParams {
    /// Element universe; every atom of an encoded molecule must be listed.
    pub elements: Vec<u8>,
    #[serde(default = "default_cutoff_radius")]
    pub cutoff_radius: f64,
    /// Gaussian width on the distance grid (Angstrom).
    #[serde(default = "default_sigma")]
    pub radial_sigma: f64,
    #[serde(default = "default_spacing")]
    pub radial_spacing: f64,
    /// Exponent `n` of the `1/r^n` two-body weight.
    #[serde(default = "default_radial_power")]
    pub radial_power: i32,
    /// Gaussian width on the angle grid (radians).
    #[serde(default = "default_sigma")]
    pub angular_sigma: f64,
    #[serde(default = "default_spacing")]
    pub angular_spacing: f64,
    /// Exponent of the `1/(r_ij r_ik r_jk)^n` three-body weight.
    #[serde(default = "default_angular_power")]
    pub angular_power: i32,
}

impl SlatmParams {
    pub fn new(elements: Vec<u8>) -> Self {
        Self {
            elements,
            cutoff_radius: DEFAULT_CUTOFF_RADIUS,
            radial_sigma: DEFAULT_SIGMA,
            radial_spacing: DEFAULT_SPACING,
            radial_power: DEFAULT_RADIAL_POWER,
            angular_sigma: DEFAULT_SIGMA,
            angular_spacing: DEFAULT_SPACING,
            angular_power: DEFAULT_ANGULAR_POWER,
        }
    }

    /// Points on `[RADIAL_GRID_START, cutoff_radius]`.
    pub fn radial_points(&self) -> usize {
        ((self.cutoff_radius - RADIAL_GRID_START) / self.radial_spacing).floor() as usize + 1
    }

    /// Points on `[0, π]`.
    pub fn angular_points(&self) -> usize {
        (PI / self.angular_spacing).floor() as usize + 1
    }

    fn n_pairs(&self) -> usize {
        packed_len(self.elements.len())
    }

    pub fn width(&self) -> usize {
        let e = self.elements.len();
        e + self.n_pairs() * self.radial_points() + e * self.n_pairs() * self.angular_points()
    }

    pub fn validate(&self) -> Result<(), RepresentationError> {
        validate_elements(&self.elements)?;
        if !(self.cutoff_radius.is_finite() && self.cutoff_radius > RADIAL_GRID_START) {
            return Err(RepresentationError::invalid(
                "cutoff_radius",
                format!(
                    "must be finite and larger than {RADIAL_GRID_START}, got {}",
                    self.cutoff_radius
                ),
            ));
        }
        for (name, value) in [
            ("radial_sigma", self.radial_sigma),
            ("radial_spacing", self.radial_spacing),
            ("angular_sigma", self.angular_sigma),
            ("angular_spacing", self.angular_spacing),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(RepresentationError::invalid(
                    name,
                    format!("must be positive and finite, got {value}"),
                ));
            }
        }
        if self.radial_power < 0 || self.angular_power < 0 {
            return Err(RepresentationError::invalid(
                "radial_power/angular_power",
                "exponents must be non-negative",
            ));
        }
        Ok(())
    }
}

#[inline]
fn normal_density(offset: f64, sigma: f64) -> f64 {
    (-offset * offset / (2.0 * sigma * sigma)).exp() / (sigma * (2.0 * PI).sqrt())
}

/// Encodes the molecular SLATM vector.
///
/// Layout: `Σ Z` per element; then per element pair the distance spectrum
/// `Σ Z_i Z_j N(x; r_ij, σ_r) / x^n` over pairs within the cutoff; then per
/// centre element and end pair the angle spectrum
/// `Σ Z_i Z_j Z_k N(θ; θ_jik, σ_θ) (1 + cos θ_i cos θ_j cos θ_k) / (r_ij r_ik r_jk)^m`
/// over neighbour pairs of each centre.
pub fn encode(molecule: &Molecule, params: &SlatmParams) -> Result<Vec<f64>, RepresentationError> {
    let elements: Vec<u8> = params.elements.iter().copied().sorted().collect();
    let slot = element_slots(molecule, &elements)?;
    let distances = InteratomicDistances::compute(molecule.atoms())?;
    let atoms = molecule.atoms();
    let n_elements = elements.len();
    let n_pairs = params.n_pairs();
    let n_radial = params.radial_points();
    let n_angular = params.angular_points();
    let mut rep = vec![0.0; params.width()];

    for (atom, &s) in atoms.iter().zip(&slot) {
        rep[s] += atom.charge();
    }

    let radial_grid: Vec<f64> = (0..n_radial)
        .map(|k| RADIAL_GRID_START + k as f64 * params.radial_spacing)
        .collect();
    let radial_start = n_elements;
    for (i, j) in (0..atoms.len()).tuple_combinations() {
        let r = distances.get(i, j);
        if r > params.cutoff_radius {
            continue;
        }
        let prefactor = atoms[i].charge() * atoms[j].charge();
        let base = radial_start + pair_offset(slot[i], slot[j], n_elements) * n_radial;
        for (k, &x) in radial_grid.iter().enumerate() {
            rep[base + k] +=
                prefactor * normal_density(x - r, params.radial_sigma) / x.powi(params.radial_power);
        }
    }

    let angular_grid: Vec<f64> = (0..n_angular)
        .map(|s| s as f64 * params.angular_spacing)
        .collect();
    let angular_start = radial_start + n_pairs * n_radial;
    for center in 0..atoms.len() {
        let neighbors = distances.sorted_neighbors(center, params.cutoff_radius);
        let pc = &atoms[center].position;
        for (a, b) in neighbors.iter().tuple_combinations() {
            let (j, k) = (a.index, b.index);
            let (pj, pk) = (&atoms[j].position, &atoms[k].position);
            let theta = bond_angle(pc, pj, pk);
            let angle_cosines = theta.cos() * bond_angle(pj, pc, pk).cos() * bond_angle(pk, pc, pj).cos();
            let weight = atoms[center].charge() * atoms[j].charge() * atoms[k].charge()
                * (1.0 + angle_cosines)
                / (a.distance * b.distance * distances.get(j, k)).powi(params.angular_power);

            let triple = slot[center] * n_pairs + pair_offset(slot[j], slot[k], n_elements);
            let base = angular_start + triple * n_angular;
            for (s, &x) in angular_grid.iter().enumerate() {
                rep[base + s] += weight * normal_density(x - theta, params.angular_sigma);
            }
        }
    }

    Ok(rep)
}
