use super::{RepresentationError, self_interaction};
use crate::core::models::element::is_valid_nuclear_charge;
use crate::core::models::molecule::Molecule;
use crate::core::utils::geometry::InteratomicDistances;
use itertools::Itertools;
use serde::Deserialize;
use std::cmp::Ordering;

/// Maximum number of atoms of one element a molecule may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BagCapacity {
    pub element: u8,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BagOfBondsParams {
    pub bags: Vec<BagCapacity>,
}

impl BagOfBondsParams {
    /// Capacities ordered by nuclear charge, which fixes the bag layout.
    fn ordered_bags(&self) -> Vec<BagCapacity> {
        self.bags
            .iter()
            .copied()
            .sorted_by_key(|b| b.element)
            .collect()
    }

    pub fn width(&self) -> usize {
        let bags = self.ordered_bags();
        let atom_bags: usize = bags.iter().map(|b| b.count).sum();
        let pair_bags: usize = bags
            .iter()
            .enumerate()
            .flat_map(|(i, a)| bags[i..].iter().map(move |b| pair_bag_size(a, b)))
            .sum();
        atom_bags + pair_bags
    }

    pub fn validate(&self) -> Result<(), RepresentationError> {
        if self.bags.is_empty() {
            return Err(RepresentationError::invalid("bags", "at least one bag is required"));
        }
        for bag in &self.bags {
            if !is_valid_nuclear_charge(bag.element) {
                return Err(RepresentationError::invalid(
                    "bags",
                    format!("invalid nuclear charge {}", bag.element),
                ));
            }
        }
        if let Some(dup) = self.bags.iter().map(|b| b.element).duplicates().next() {
            return Err(RepresentationError::invalid(
                "bags",
                format!("element {dup} is listed more than once"),
            ));
        }
        Ok(())
    }
}

fn pair_bag_size(a: &BagCapacity, b: &BagCapacity) -> usize {
    if a.element == b.element {
        a.count * a.count.saturating_sub(1) / 2
    } else {
        a.count * b.count
    }
}

/// Writes `values` sorted descending into `slot`, leaving the tail at zero.
fn fill_bag(slot: &mut [f64], mut values: Vec<f64>) {
    values.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    slot[..values.len()].copy_from_slice(&values);
}

/// Encodes the bag-of-bonds vector.
///
/// Layout: one bag per configured element holding `0.5 Z^2.4` for each of
/// its atoms, followed by one bag per element pair `(Z_a <= Z_b)` holding
/// `Z_a Z_b / r` for each atom pair. Bags appear in ascending nuclear charge
/// order, values are sorted descending and padded with zeros.
pub fn encode(
    molecule: &Molecule,
    params: &BagOfBondsParams,
) -> Result<Vec<f64>, RepresentationError> {
    let bags = params.ordered_bags();

    for (atom, charge) in molecule.nuclear_charges().enumerate() {
        if !bags.iter().any(|b| b.element == charge) {
            return Err(RepresentationError::UnsupportedElement {
                atom,
                element: charge,
            });
        }
    }
    for bag in &bags {
        let count = molecule.count_element(bag.element);
        if count > bag.count {
            return Err(RepresentationError::BagOverflow {
                element: bag.element,
                count,
                capacity: bag.count,
            });
        }
    }

    let distances = InteratomicDistances::compute(molecule.atoms())?;
    let atoms = molecule.atoms();
    let mut rep = vec![0.0; params.width()];
    let mut offset = 0;

    for bag in &bags {
        let values: Vec<f64> = atoms
            .iter()
            .filter(|a| a.nuclear_charge == bag.element)
            .map(|a| self_interaction(a.charge()))
            .collect();
        fill_bag(&mut rep[offset..offset + bag.count], values);
        offset += bag.count;
    }

    for (i, a) in bags.iter().enumerate() {
        for b in &bags[i..] {
            let size = pair_bag_size(a, b);
            let mut values = Vec::with_capacity(size);
            for (p, q) in (0..atoms.len()).tuple_combinations() {
                let (zp, zq) = (atoms[p].nuclear_charge, atoms[q].nuclear_charge);
                let matches = (zp == a.element && zq == b.element)
                    || (zp == b.element && zq == a.element);
                if matches {
                    values.push(atoms[p].charge() * atoms[q].charge() / distances.get(p, q));
                }
            }
            fill_bag(&mut rep[offset..offset + size], values);
            offset += size;
        }
    }

    Ok(rep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use approx::assert_relative_eq;

    fn params() -> BagOfBondsParams {
        BagOfBondsParams {
            bags: vec![
                BagCapacity { element: 8, count: 1 },
                BagCapacity { element: 1, count: 3 },
            ],
        }
    }

    fn water() -> Molecule {
        Molecule::new(
            &[8, 1, 1],
            &[
                [0.0, 0.0, 0.1173],
                [0.0, 0.7572, -0.4692],
                [0.0, -0.7572, -0.4692],
            ],
        )
        .unwrap()
    }

    #[test]
    fn width_counts_atom_and_pair_bags() {
        // H atoms 3 + O atoms 1 + HH 3 + HO 3 + OO 0
        assert_eq!(params().width(), 10);
    }

    #[test]
    fn layout_is_ordered_by_nuclear_charge() {
        let rep = encode(&water(), &params()).unwrap();
        assert_eq!(rep.len(), 10);

        // H atom bag: two hydrogens then padding.
        assert_eq!(&rep[0..3], &[0.5, 0.5, 0.0]);
        // O atom bag.
        assert_relative_eq!(rep[3], 0.5 * 8f64.powf(2.4), epsilon = 1e-9);
        // H-H bag: one pair then padding.
        let hh = 1.0 / (2.0 * 0.7572);
        assert_relative_eq!(rep[4], hh, epsilon = 1e-12);
        assert_eq!(&rep[5..7], &[0.0, 0.0]);
        // H-O bag: two equal bonds, one padding slot.
        assert!(rep[7] > 0.0 && rep[8] > 0.0);
        assert_relative_eq!(rep[7], rep[8], epsilon = 1e-12);
        assert_eq!(rep[9], 0.0);
    }

    #[test]
    fn bag_values_are_sorted_descending() {
        let molecule = Molecule::new(
            &[1, 1, 1],
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [3.0, 0.0, 0.0]],
        )
        .unwrap();
        let p = BagOfBondsParams {
            bags: vec![BagCapacity { element: 1, count: 3 }],
        };
        let rep = encode(&molecule, &p).unwrap();
        let hh = &rep[3..6];
        assert!(hh[0] >= hh[1] && hh[1] >= hh[2]);
        assert_relative_eq!(hh[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn overflowing_bag_is_a_configuration_error() {
        let p = BagOfBondsParams {
            bags: vec![
                BagCapacity { element: 1, count: 1 },
                BagCapacity { element: 8, count: 1 },
            ],
        };
        let err = encode(&water(), &p).unwrap_err();
        assert_eq!(
            err,
            RepresentationError::BagOverflow {
                element: 1,
                count: 2,
                capacity: 1
            }
        );
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn unlisted_element_is_a_configuration_error() {
        let p = BagOfBondsParams {
            bags: vec![BagCapacity { element: 1, count: 4 }],
        };
        let err = encode(&water(), &p).unwrap_err();
        assert_eq!(err, RepresentationError::UnsupportedElement { atom: 0, element: 8 });
    }

    #[test]
    fn validate_rejects_empty_and_duplicate_bags() {
        assert!(BagOfBondsParams { bags: vec![] }.validate().is_err());
        let dup = BagOfBondsParams {
            bags: vec![
                BagCapacity { element: 6, count: 2 },
                BagCapacity { element: 6, count: 3 },
            ],
        };
        assert_eq!(dup.validate().unwrap_err().kind(), ErrorKind::InvalidParameter);
    }
}
