use super::KernelKind;
use super::local::{AtomRef, flatten_atoms};
use crate::core::representations::LocalRepresentation;
use crate::core::representations::arad::{ARAD_SLOT_FEATURES, slot};
use crate::engine::error::EngineError;
use serde::Deserialize;
use std::borrow::Borrow;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const DEFAULT_WIDTH: f64 = 0.2;
const DEFAULT_PERIOD_WIDTH: f64 = 1.0;
const DEFAULT_GROUP_WIDTH: f64 = 0.5;

fn default_width() -> f64 {
    DEFAULT_WIDTH
}
fn default_period_width() -> f64 {
    DEFAULT_PERIOD_WIDTH
}
fn default_group_width() -> f64 {
    DEFAULT_GROUP_WIDTH
}

/// Widths of the ARAD atom similarity.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AradKernelParams {
    /// Radial smearing `w` (Angstrom).
    #[serde(default = "default_width")]
    pub width: f64,
    /// Tolerance between periodic-table rows.
    #[serde(default = "default_period_width")]
    pub period_width: f64,
    /// Tolerance between periodic-table groups.
    #[serde(default = "default_group_width")]
    pub group_width: f64,
}

impl Default for AradKernelParams {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            period_width: DEFAULT_PERIOD_WIDTH,
            group_width: DEFAULT_GROUP_WIDTH,
        }
    }
}

impl AradKernelParams {
    pub fn validate(&self) -> Result<(), EngineError> {
        for (name, value) in [
            ("arad.width", self.width),
            ("arad.period_width", self.period_width),
            ("arad.group_width", self.group_width),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(EngineError::invalid(
                    name,
                    format!("must be positive and finite, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// Exponent coefficients of the slot-to-slot weight.
#[derive(Debug, Clone, Copy)]
struct SlotWeights {
    inv_four_width_sq: f64,
    inv_two_period_sq: f64,
    inv_two_group_sq: f64,
}

impl SlotWeights {
    fn new(params: &AradKernelParams) -> Self {
        Self {
            inv_four_width_sq: 1.0 / (4.0 * params.width * params.width),
            inv_two_period_sq: 1.0 / (2.0 * params.period_width * params.period_width),
            inv_two_group_sq: 1.0 / (2.0 * params.group_width * params.group_width),
        }
    }

    /// `s(a, b) = Σ_p Σ_q exp(-Δr²/4w² - ΔP²/2σ_P² - ΔG²/2σ_G²) (1 + c_p c_q + s_p s_q)`
    /// over the occupied slots of both atoms.
    fn similarity(&self, a: &[f64], b: &[f64]) -> f64 {
        let mut total = 0.0;
        for p in occupied_slots(a) {
            for q in occupied_slots(b) {
                let dr = p[slot::DISTANCE] - q[slot::DISTANCE];
                let dp = p[slot::PERIOD] - q[slot::PERIOD];
                let dg = p[slot::GROUP] - q[slot::GROUP];
                let exponent = dr * dr * self.inv_four_width_sq
                    + dp * dp * self.inv_two_period_sq
                    + dg * dg * self.inv_two_group_sq;
                let angular = 1.0
                    + p[slot::ANGULAR_COS] * q[slot::ANGULAR_COS]
                    + p[slot::ANGULAR_SIN] * q[slot::ANGULAR_SIN];
                total += (-exponent).exp() * angular;
            }
        }
        total
    }
}

fn occupied_slots(atom: &[f64]) -> impl Iterator<Item = &[f64]> {
    atom.chunks_exact(ARAD_SLOT_FEATURES)
        .take_while(|s| s[slot::PERIOD] > 0.0)
}

/// ARAD comparison of the atoms of two sets.
///
/// Self-similarities are computed once per atom; the distance between two
/// atoms is `d² = s(a,a) + s(b,b) - 2 s(a,b)`.
pub(crate) struct AradMeasure {
    weights: SlotWeights,
    self_a: Vec<f64>,
    self_b: Vec<f64>,
}

impl AradMeasure {
    pub(crate) fn new<L>(
        params: &AradKernelParams,
        a: &[L],
        b: &[L],
        symmetric: bool,
    ) -> Result<Self, EngineError>
    where
        L: Borrow<LocalRepresentation> + Sync,
    {
        params.validate()?;
        let atoms_a = flatten_atoms(a);
        let atoms_b = if symmetric { Vec::new() } else { flatten_atoms(b) };
        if let Some(width) = atoms_a.iter().chain(&atoms_b).map(|x| x.len()).next() {
            if width == 0 || width % ARAD_SLOT_FEATURES != 0 {
                return Err(EngineError::invalid(
                    "representation",
                    format!("ARAD atoms hold slots of {ARAD_SLOT_FEATURES} values, got width {width}"),
                ));
            }
        }

        let weights = SlotWeights::new(params);
        let self_a = self_similarities(&weights, &atoms_a);
        let self_b = if symmetric {
            self_a.clone()
        } else {
            self_similarities(&weights, &atoms_b)
        };
        Ok(Self {
            weights,
            self_a,
            self_b,
        })
    }

    /// Bandwidth-free input of `kind`: the similarity itself for the linear
    /// kernel, `d²` for the Gaussian and `d` for the Laplacian.
    #[inline]
    pub(crate) fn measure(&self, kind: KernelKind, x: AtomRef<'_>, y: AtomRef<'_>) -> f64 {
        let s = self.weights.similarity(x.features, y.features);
        let squared = || (self.self_a[x.index] + self.self_b[y.index] - 2.0 * s).max(0.0);
        match kind {
            KernelKind::Linear => s,
            KernelKind::Gaussian => squared(),
            KernelKind::Laplacian => squared().sqrt(),
        }
    }
}

fn self_similarities(weights: &SlotWeights, atoms: &[&[f64]]) -> Vec<f64> {
    #[cfg(not(feature = "parallel"))]
    let iterator = atoms.iter();

    #[cfg(feature = "parallel")]
    let iterator = atoms.par_iter();

    iterator.map(|atom| weights.similarity(atom, atom)).collect()
}
