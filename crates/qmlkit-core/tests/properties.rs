use approx::assert_relative_eq;
use proptest::prelude::*;
use qmlkit::core::matrix::Matrix;
use qmlkit::core::models::molecule::Molecule;
use qmlkit::core::representations::{
    AcsfParams, CoulombMatrixParams, CoulombSorting, LocalRepresentation, Representation,
    RepresentationConfig, SlatmParams, encode, encode_batch,
};
use qmlkit::engine::kernels::{KernelKind, KernelParams, kernel_matrix};
use qmlkit::engine::solver::{cholesky_solve, fit_single};

const ELEMENTS: [u8; 4] = [1, 6, 7, 8];

/// Molecules whose atoms sit near distinct points of a 1.5 Å chain, so no
/// two atoms are closer than 0.9 Å.
fn molecule_strategy(max_atoms: usize) -> impl Strategy<Value = Molecule> {
    prop::collection::vec(
        (prop::sample::select(ELEMENTS.to_vec()), prop::array::uniform3(-0.3f64..0.3)),
        1..=max_atoms,
    )
    .prop_map(|atoms| {
        let charges: Vec<u8> = atoms.iter().map(|(z, _)| *z).collect();
        let coords: Vec<[f64; 3]> = atoms
            .iter()
            .enumerate()
            .map(|(k, (_, jitter))| [1.5 * k as f64 + jitter[0], jitter[1], jitter[2]])
            .collect();
        Molecule::new(&charges, &coords).unwrap()
    })
}

fn vectors_strategy(n: usize, width: usize) -> impl Strategy<Value = Vec<Vec<f64>>> {
    prop::collection::vec(prop::collection::vec(-2.0f64..2.0, width), 1..=n)
}

fn as_global(vectors: Vec<Vec<f64>>) -> Vec<Representation> {
    vectors.into_iter().map(Representation::Global).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn self_kernels_are_symmetric_and_bounded(
        vectors in vectors_strategy(12, 6),
        bandwidth in 1.0f64..5.0,
        laplacian in any::<bool>(),
    ) {
        let kind = if laplacian { KernelKind::Laplacian } else { KernelKind::Gaussian };
        let reps = as_global(vectors);
        let k = kernel_matrix(&reps, &reps, &KernelParams::new(kind, bandwidth)).unwrap();

        prop_assert!(k.is_symmetric(0.0));
        for i in 0..k.rows() {
            prop_assert_eq!(k[(i, i)], 1.0);
            for j in 0..k.cols() {
                prop_assert!(k[(i, j)] > 0.0 && k[(i, j)] <= 1.0);
            }
        }
    }

    #[test]
    fn encoding_is_deterministic_and_padded(molecule in molecule_strategy(6)) {
        let config = RepresentationConfig::CoulombMatrix(CoulombMatrixParams {
            max_atoms: 8,
            sorting: CoulombSorting::RowNorm,
        });
        let first = encode(&molecule, &config).unwrap();
        let second = encode(&molecule, &config).unwrap();
        prop_assert_eq!(&first, &second);

        let values = first.as_global().unwrap();
        let n = molecule.len();
        // Packed rows at or beyond the atom count are padding.
        prop_assert!(values[n * (n + 1) / 2..].iter().all(|&v| v == 0.0));
        prop_assert!(values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn batch_encoding_matches_single_encoding(
        molecules in prop::collection::vec(molecule_strategy(5), 1..6),
    ) {
        let config = RepresentationConfig::Acsf(AcsfParams::new(ELEMENTS.to_vec(), 4.0));
        let batch = encode_batch(&molecules, &config).unwrap();
        for (molecule, rep) in molecules.iter().zip(&batch) {
            prop_assert_eq!(rep, &encode(molecule, &config).unwrap());
        }
    }

    #[test]
    fn slatm_ignores_atom_order(molecule in molecule_strategy(5)) {
        let config = RepresentationConfig::Slatm(SlatmParams::new(ELEMENTS.to_vec()));
        let charges: Vec<u8> = molecule.atoms().iter().rev().map(|a| a.nuclear_charge).collect();
        let coords: Vec<[f64; 3]> = molecule
            .atoms()
            .iter()
            .rev()
            .map(|a| [a.position.x, a.position.y, a.position.z])
            .collect();
        let reversed = Molecule::new(&charges, &coords).unwrap();

        let forward = encode(&molecule, &config).unwrap();
        let backward = encode(&reversed, &config).unwrap();
        for (a, b) in forward.as_global().unwrap().iter().zip(backward.as_global().unwrap()) {
            prop_assert!((a - b).abs() <= 1e-9 * (1.0 + a.abs()));
        }
    }

    #[test]
    fn fit_then_predict_recovers_targets(
        vectors in vectors_strategy(10, 4),
        targets in prop::collection::vec(-10.0f64..10.0, 10),
    ) {
        let reps = as_global(vectors);
        let n = reps.len();
        let gram = kernel_matrix(&reps, &reps, &KernelParams::new(KernelKind::Gaussian, 1.0)).unwrap();
        // Adding the identity keeps the system well conditioned for any input.
        let mut k = gram.clone();
        for i in 0..n {
            k[(i, i)] += 1.0;
        }

        let model = fit_single(&k, &targets[..n], &[1e-12]).unwrap();
        let predictions = model.predict(&k).unwrap();
        for i in 0..n {
            assert_relative_eq!(predictions[0].values[(i, 0)], targets[i], epsilon = 1e-6);
        }
    }

    #[test]
    fn cholesky_solve_has_small_residual(
        vectors in vectors_strategy(80, 3),
        rhs in prop::collection::vec(-1.0f64..1.0, 80),
    ) {
        let reps = as_global(vectors);
        let n = reps.len();
        let mut a = kernel_matrix(&reps, &reps, &KernelParams::new(KernelKind::Laplacian, 1.0)).unwrap();
        for i in 0..n {
            a[(i, i)] += 0.5;
        }
        let b = Matrix::column_vector(&rhs[..n]);
        let x = cholesky_solve(&a, &b).unwrap();
        for i in 0..n {
            let ax: f64 = (0..n).map(|j| a[(i, j)] * x[(j, 0)]).sum();
            assert_relative_eq!(ax, b[(i, 0)], epsilon = 1e-9);
        }
    }

    #[test]
    fn normalized_local_kernel_ignores_duplicated_atoms(
        atoms in prop::collection::vec(prop::collection::vec(-1.0f64..1.0, 3), 1..5),
        others in prop::collection::vec(prop::collection::vec(-1.0f64..1.0, 3), 1..5),
    ) {
        let params = KernelParams::new(KernelKind::Gaussian, 1.0).local(true);
        let local = |rows: &[Vec<f64>]| Representation::Local(LocalRepresentation::from_rows(rows).unwrap());

        let doubled: Vec<Vec<f64>> = atoms.iter().chain(&atoms).cloned().collect();
        let a = vec![local(atoms.as_slice()), local(others.as_slice())];
        let b = vec![local(doubled.as_slice()), local(others.as_slice())];

        let ka = kernel_matrix(&a, &a, &params).unwrap();
        let kb = kernel_matrix(&b, &b, &params).unwrap();
        for (x, y) in ka.as_slice().iter().zip(kb.as_slice()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-12);
        }
    }
}
