use nalgebra::Point3;

/// An atom of a molecule: its element and its position.
///
/// The element is stored as the nuclear charge `Z`, which is what every
/// representation in this crate consumes (Coulomb terms scale with `Z`,
/// local descriptors bin neighbours by `Z`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atom {
    /// The nuclear charge (atomic number) of the atom.
    pub nuclear_charge: u8,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
}

impl Atom {
    /// Creates a new `Atom` from a nuclear charge and a position.
    ///
    /// No validation happens here; [`Molecule::new`](super::molecule::Molecule::new)
    /// validates atoms when they are assembled into a molecule.
    pub fn new(nuclear_charge: u8, position: Point3<f64>) -> Self {
        Self {
            nuclear_charge,
            position,
        }
    }

    #[inline]
    pub fn charge(&self) -> f64 {
        self.nuclear_charge as f64
    }

    #[inline]
    pub fn distance_to(&self, other: &Atom) -> f64 {
        (self.position - other.position).norm()
    }
}
