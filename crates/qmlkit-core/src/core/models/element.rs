use phf::{Map, phf_map};

/// Largest nuclear charge accepted by the models.
pub const MAX_NUCLEAR_CHARGE: u8 = 118;

#[rustfmt::skip]
static NUCLEAR_CHARGES: Map<&'static str, u8> = phf_map! {
    // --- Period 1-2 ---
    "H" => 1, "He" => 2,
    "Li" => 3, "Be" => 4, "B" => 5, "C" => 6, "N" => 7, "O" => 8, "F" => 9, "Ne" => 10,

    // --- Period 3-4 ---
    "Na" => 11, "Mg" => 12, "Al" => 13, "Si" => 14, "P" => 15, "S" => 16, "Cl" => 17, "Ar" => 18,
    "K" => 19, "Ca" => 20, "Sc" => 21, "Ti" => 22, "V" => 23, "Cr" => 24, "Mn" => 25, "Fe" => 26,
    "Co" => 27, "Ni" => 28, "Cu" => 29, "Zn" => 30, "Ga" => 31, "Ge" => 32, "As" => 33, "Se" => 34,
    "Br" => 35, "Kr" => 36,

    // --- Period 5 ---
    "Rb" => 37, "Sr" => 38, "Y" => 39, "Zr" => 40, "Nb" => 41, "Mo" => 42, "Tc" => 43, "Ru" => 44,
    "Rh" => 45, "Pd" => 46, "Ag" => 47, "Cd" => 48, "In" => 49, "Sn" => 50, "Sb" => 51, "Te" => 52,
    "I" => 53, "Xe" => 54,

    // --- Period 6 ---
    "Cs" => 55, "Ba" => 56, "La" => 57, "Ce" => 58, "Pr" => 59, "Nd" => 60, "Pm" => 61, "Sm" => 62,
    "Eu" => 63, "Gd" => 64, "Tb" => 65, "Dy" => 66, "Ho" => 67, "Er" => 68, "Tm" => 69, "Yb" => 70,
    "Lu" => 71, "Hf" => 72, "Ta" => 73, "W" => 74, "Re" => 75, "Os" => 76, "Ir" => 77, "Pt" => 78,
    "Au" => 79, "Hg" => 80, "Tl" => 81, "Pb" => 82, "Bi" => 83, "Po" => 84, "At" => 85, "Rn" => 86,

    // --- Period 7 ---
    "Fr" => 87, "Ra" => 88, "Ac" => 89, "Th" => 90, "Pa" => 91, "U" => 92, "Np" => 93, "Pu" => 94,
    "Am" => 95, "Cm" => 96, "Bk" => 97, "Cf" => 98, "Es" => 99, "Fm" => 100, "Md" => 101, "No" => 102,
    "Lr" => 103, "Rf" => 104, "Db" => 105, "Sg" => 106, "Bh" => 107, "Hs" => 108, "Mt" => 109,
    "Ds" => 110, "Rg" => 111, "Cn" => 112, "Nh" => 113, "Fl" => 114, "Mc" => 115, "Lv" => 116,
    "Ts" => 117, "Og" => 118,
};

/// Looks up the nuclear charge of an element symbol.
///
/// The lookup tolerates surrounding whitespace and any letter case
/// (`"cl"`, `"CL"` and `" Cl "` all resolve to chlorine).
pub fn nuclear_charge(symbol: &str) -> Option<u8> {
    let trimmed = symbol.trim();
    let mut chars = trimmed.chars();
    let first = chars.next()?;
    let canonical: String = std::iter::once(first.to_ascii_uppercase())
        .chain(chars.map(|c| c.to_ascii_lowercase()))
        .collect();
    NUCLEAR_CHARGES.get(canonical.as_str()).copied()
}

#[inline]
pub fn is_valid_nuclear_charge(charge: u8) -> bool {
    (1..=MAX_NUCLEAR_CHARGE).contains(&charge)
}

/// Last nuclear charge of each period.
const PERIOD_ENDS: [u8; 7] = [2, 10, 18, 36, 54, 86, 118];

/// Period (row) and group (column, 1-18) of an element.
///
/// Lanthanides and actinides are placed in group 3.
pub fn period_and_group(charge: u8) -> Option<(u8, u8)> {
    if !is_valid_nuclear_charge(charge) {
        return None;
    }
    let period = PERIOD_ENDS.iter().position(|&end| charge <= end)?;
    let start = if period == 0 { 1 } else { PERIOD_ENDS[period - 1] + 1 };
    let position = charge - start + 1;
    let group = match PERIOD_ENDS[period] - start + 1 {
        2 => {
            if position == 1 {
                1
            } else {
                18
            }
        }
        8 => {
            if position <= 2 {
                position
            } else {
                position + 10
            }
        }
        18 => position,
        _ => match position {
            1 | 2 => position,
            3..=17 => 3,
            _ => position - 14,
        },
    };
    Some((period as u8 + 1, group))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_organic_elements_resolve() {
        assert_eq!(nuclear_charge("H"), Some(1));
        assert_eq!(nuclear_charge("C"), Some(6));
        assert_eq!(nuclear_charge("N"), Some(7));
        assert_eq!(nuclear_charge("O"), Some(8));
        assert_eq!(nuclear_charge("S"), Some(16));
    }

    #[test]
    fn lookup_is_case_and_whitespace_insensitive() {
        assert_eq!(nuclear_charge("cl"), Some(17));
        assert_eq!(nuclear_charge("CL"), Some(17));
        assert_eq!(nuclear_charge(" Cl "), Some(17));
    }

    #[test]
    fn unknown_or_empty_symbols_return_none() {
        assert_eq!(nuclear_charge("Xx"), None);
        assert_eq!(nuclear_charge(""), None);
        assert_eq!(nuclear_charge("   "), None);
    }

    #[test]
    fn table_covers_every_charge_exactly_once() {
        let mut seen = vec![false; MAX_NUCLEAR_CHARGE as usize + 1];
        for charge in NUCLEAR_CHARGES.values() {
            assert!(!seen[*charge as usize], "duplicate charge {charge}");
            seen[*charge as usize] = true;
        }
        assert!(seen[1..].iter().all(|&s| s));
    }

    #[test]
    fn periodic_table_positions() {
        assert_eq!(period_and_group(1), Some((1, 1)));
        assert_eq!(period_and_group(2), Some((1, 18)));
        assert_eq!(period_and_group(6), Some((2, 14)));
        assert_eq!(period_and_group(8), Some((2, 16)));
        assert_eq!(period_and_group(12), Some((3, 2)));
        assert_eq!(period_and_group(17), Some((3, 17)));
        assert_eq!(period_and_group(26), Some((4, 8)));
        assert_eq!(period_and_group(53), Some((5, 17)));
        assert_eq!(period_and_group(57), Some((6, 3)));
        assert_eq!(period_and_group(71), Some((6, 3)));
        assert_eq!(period_and_group(72), Some((6, 4)));
        assert_eq!(period_and_group(86), Some((6, 18)));
        assert_eq!(period_and_group(104), Some((7, 4)));
        assert_eq!(period_and_group(118), Some((7, 18)));
        assert_eq!(period_and_group(0), None);
        assert_eq!(period_and_group(119), None);
    }

    #[test]
    fn charge_validity_bounds() {
        assert!(!is_valid_nuclear_charge(0));
        assert!(is_valid_nuclear_charge(1));
        assert!(is_valid_nuclear_charge(118));
        assert!(!is_valid_nuclear_charge(119));
    }
}
