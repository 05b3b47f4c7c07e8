use super::KernelKind;
use super::function::{KernelFunction, measure};
use crate::core::matrix::Matrix;
use crate::core::representations::LocalRepresentation;
use crate::engine::error::EngineError;
use crate::engine::parallel::{fill_matrices, fill_matrix};
use std::borrow::Borrow;

/// One atom of a set, with its position in the flattened atom numbering.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AtomRef<'a> {
    pub(crate) features: &'a [f64],
    pub(crate) index: usize,
}

#[inline]
fn view<L: Borrow<LocalRepresentation>>(l: &L) -> &LocalRepresentation {
    l.borrow()
}

pub(crate) fn flatten_atoms<L: Borrow<LocalRepresentation>>(set: &[L]) -> Vec<&[f64]> {
    set.iter().flat_map(|l| view(l).atoms()).collect()
}

/// Index of the first atom of each molecule in the flattened numbering.
fn atom_offsets<L: Borrow<LocalRepresentation>>(set: &[L]) -> Vec<usize> {
    set.iter()
        .scan(0, |next, l| {
            let first = *next;
            *next += view(l).n_atoms();
            Some(first)
        })
        .collect()
}

fn atom_refs(molecule: &LocalRepresentation, first: usize) -> impl Iterator<Item = AtomRef<'_>> {
    molecule
        .atoms()
        .enumerate()
        .map(move |(k, features)| AtomRef {
            features,
            index: first + k,
        })
}

fn check_atom_widths<L: Borrow<LocalRepresentation>>(a: &[L], b: &[L]) -> Result<(), EngineError> {
    let mut widths = a
        .iter()
        .chain(b)
        .map(view)
        .filter(|l| l.n_atoms() > 0)
        .map(LocalRepresentation::width);
    if let Some(width) = widths.next() {
        for w in widths {
            EngineError::check_dimension("atomic feature width", width, w)?;
        }
    }
    Ok(())
}

/// Plain feature-vector comparison of two atoms under `kind`.
pub(crate) fn vector_measure(kind: KernelKind) -> impl Fn(AtomRef<'_>, AtomRef<'_>) -> f64 + Sync {
    move |x, y| measure(kind, x.features, y.features)
}

/// Molecule-level kernels aggregated over atom pairs:
/// `K[i][j] = Σ_{a∈i} Σ_{b∈j} k(a, b)`, divided by `n_i n_j` when
/// `normalize` is set. A molecule without atoms has zero similarity to
/// everything.
///
/// `atom_measure` supplies the bandwidth-free part of `k` and must match the
/// kind of `functions`.
pub(crate) fn kernel_blocks<L, M>(
    a: &[L],
    b: &[L],
    symmetric: bool,
    functions: &[KernelFunction],
    normalize: bool,
    atom_measure: M,
) -> Result<Vec<Matrix>, EngineError>
where
    L: Borrow<LocalRepresentation> + Sync,
    M: Fn(AtomRef<'_>, AtomRef<'_>) -> f64 + Sync,
{
    check_atom_widths(a, b)?;
    if functions.is_empty() {
        return Ok(Vec::new());
    }
    let offsets_a = atom_offsets(a);
    let offsets_b = if symmetric {
        offsets_a.clone()
    } else {
        atom_offsets(b)
    };

    Ok(fill_matrices(a.len(), b.len(), functions.len(), symmetric, |i, j, out| {
        let (mi, mj) = (view(&a[i]), view(&b[j]));
        for x in atom_refs(mi, offsets_a[i]) {
            for y in atom_refs(mj, offsets_b[j]) {
                let m = atom_measure(x, y);
                for (slot, f) in out.iter_mut().zip(functions) {
                    *slot += f.apply(m);
                }
            }
        }
        let pairs = mi.n_atoms() * mj.n_atoms();
        if normalize && pairs > 0 {
            let scale = 1.0 / pairs as f64;
            out.iter_mut().for_each(|v| *v *= scale);
        }
    }))
}

/// Atom-by-atom kernel over every atom of `a` against every atom of `b`,
/// atoms numbered molecule by molecule in input order.
pub(crate) fn atomic_kernel<L, M>(
    a: &[L],
    b: &[L],
    symmetric: bool,
    function: KernelFunction,
    atom_measure: M,
) -> Result<Matrix, EngineError>
where
    L: Borrow<LocalRepresentation> + Sync,
    M: Fn(AtomRef<'_>, AtomRef<'_>) -> f64 + Sync,
{
    check_atom_widths(a, b)?;
    let atoms_a = flatten_atoms(a);
    let atoms_b = if symmetric {
        atoms_a.clone()
    } else {
        flatten_atoms(b)
    };

    Ok(fill_matrix(atoms_a.len(), atoms_b.len(), symmetric, |i, j| {
        let x = AtomRef {
            features: atoms_a[i],
            index: i,
        };
        let y = AtomRef {
            features: atoms_b[j],
            index: j,
        };
        function.apply(atom_measure(x, y))
    }))
}
