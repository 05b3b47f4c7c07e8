use crate::core::models::atom::Atom;
use nalgebra::{Point3, Vector3};
use std::cmp::Ordering;
use std::f64::consts::PI;
use thiserror::Error;

/// Separations below this value (Angstrom) are treated as coincident atoms.
pub const MIN_SEPARATION: f64 = 1e-8;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("Atoms {first} and {second} are coincident (separation {separation:e} Å)")]
pub struct CoincidentAtoms {
    pub first: usize,
    pub second: usize,
    pub separation: f64,
}

/// Dense, symmetric table of interatomic distances for one molecule.
///
/// Built once per encoding call so that every representation reads the same
/// distance for `(i, j)` and `(j, i)`.
#[derive(Debug, Clone)]
pub struct InteratomicDistances {
    n: usize,
    values: Vec<f64>,
}

impl InteratomicDistances {
    pub fn compute(atoms: &[Atom]) -> Result<Self, CoincidentAtoms> {
        let n = atoms.len();
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let separation = atoms[i].distance_to(&atoms[j]);
                if separation < MIN_SEPARATION {
                    return Err(CoincidentAtoms {
                        first: i,
                        second: j,
                        separation,
                    });
                }
                values[i * n + j] = separation;
                values[j * n + i] = separation;
            }
        }
        Ok(Self { n, values })
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Neighbours of `center` within `cutoff` (inclusive), sorted by distance
    /// ascending and then by atom index ascending. The center itself is
    /// excluded.
    pub fn sorted_neighbors(&self, center: usize, cutoff: f64) -> Vec<Neighbor> {
        let mut neighbors: Vec<Neighbor> = (0..self.n)
            .filter(|&j| j != center)
            .map(|j| Neighbor {
                index: j,
                distance: self.get(center, j),
            })
            .filter(|nb| nb.distance <= cutoff)
            .collect();
        neighbors.sort_by(Neighbor::cmp_by_distance);
        neighbors
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f64,
}

impl Neighbor {
    pub fn cmp_by_distance(a: &Neighbor, b: &Neighbor) -> Ordering {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.index.cmp(&b.index))
    }
}

/// Smooth cosine cutoff: `0.5 (cos(π r / r_c) + 1)` inside the cutoff, zero outside.
#[inline]
pub fn cosine_cutoff(distance: f64, cutoff: f64) -> f64 {
    if distance > cutoff {
        0.0
    } else {
        0.5 * ((PI * distance / cutoff).cos() + 1.0)
    }
}

/// Angle `a–center–b` in radians. The cosine is clamped to `[-1, 1]` so
/// rounding on (anti)collinear triples never produces NaN.
pub fn bond_angle(center: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    let u: Vector3<f64> = a - center;
    let v: Vector3<f64> = b - center;
    let cosine = u.dot(&v) / (u.norm() * v.norm());
    cosine.clamp(-1.0, 1.0).acos()
}
