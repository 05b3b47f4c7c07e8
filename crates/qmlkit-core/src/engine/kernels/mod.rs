//! # Kernel Matrices
//!
//! Similarity matrices between two sets of representations.
//!
//! - **Global mode** compares one vector per molecule.
//! - **Local mode** sums the kernel over all atom pairs of two molecules,
//!   optionally divided by the product of their atom counts.
//! - **ARAD mode** aggregates like local mode, but compares two atoms through
//!   the ARAD slot similarity instead of a distance between feature vectors.
//!
//! Kernel kind and mode are resolved once per call; the inner loops only see
//! a concrete [`function::KernelFunction`]. Requests where both sides are the
//! same slice take the symmetric path, which evaluates the upper triangle and
//! mirrors it.

mod arad;
mod function;
mod global;
mod local;

pub use self::arad::AradKernelParams;

use self::arad::AradMeasure;
use self::function::KernelFunction;
use super::error::EngineError;
use crate::core::matrix::Matrix;
use crate::core::representations::{LocalRepresentation, Representation, RepresentationKind};
use serde::Deserialize;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KernelKind {
    /// `exp(-|a - b|₂² / (2σ²))`
    Gaussian,
    /// `exp(-|a - b|₁ / σ)`
    Laplacian,
    /// `a · b`; the bandwidth is validated but unused.
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KernelMode {
    #[default]
    Global,
    Local,
    /// Local aggregation over ARAD atom similarities.
    Arad(AradKernelParams),
}

impl KernelMode {
    pub fn representation_kind(&self) -> RepresentationKind {
        match self {
            Self::Global => RepresentationKind::Global,
            Self::Local | Self::Arad(_) => RepresentationKind::Local,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct KernelParams {
    pub kernel: KernelKind,
    pub bandwidth: f64,
    #[serde(default)]
    pub mode: KernelMode,
    #[serde(default)]
    pub normalize_by_atom_count: bool,
}

impl KernelParams {
    /// Global-mode parameters.
    pub fn new(kernel: KernelKind, bandwidth: f64) -> Self {
        Self {
            kernel,
            bandwidth,
            mode: KernelMode::Global,
            normalize_by_atom_count: false,
        }
    }

    /// Switches to local mode.
    pub fn local(mut self, normalize_by_atom_count: bool) -> Self {
        self.mode = KernelMode::Local;
        self.normalize_by_atom_count = normalize_by_atom_count;
        self
    }

    /// Switches to ARAD mode.
    pub fn arad(mut self, params: AradKernelParams, normalize_by_atom_count: bool) -> Self {
        self.mode = KernelMode::Arad(params);
        self.normalize_by_atom_count = normalize_by_atom_count;
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        function::validate_bandwidth(self.bandwidth)?;
        if let KernelMode::Arad(arad) = &self.mode {
            arad.validate()?;
        }
        Ok(())
    }
}

fn local_pair<'a>(
    a: &'a [Representation],
    b: &'a [Representation],
    symmetric: bool,
) -> Result<(Vec<&'a LocalRepresentation>, Vec<&'a LocalRepresentation>), EngineError> {
    let views_a = local_views(a)?;
    let views_b = if symmetric {
        views_a.clone()
    } else {
        local_views(b)?
    };
    Ok((views_a, views_b))
}

fn global_views(reps: &[Representation]) -> Result<Vec<&[f64]>, EngineError> {
    reps.iter()
        .enumerate()
        .map(|(index, rep)| {
            rep.as_global()
                .ok_or(EngineError::RepresentationKindMismatch {
                    index,
                    expected: RepresentationKind::Global,
                    actual: rep.kind(),
                })
        })
        .collect()
}

fn local_views(reps: &[Representation]) -> Result<Vec<&LocalRepresentation>, EngineError> {
    reps.iter()
        .enumerate()
        .map(|(index, rep)| {
            rep.as_local()
                .ok_or(EngineError::RepresentationKindMismatch {
                    index,
                    expected: RepresentationKind::Local,
                    actual: rep.kind(),
                })
        })
        .collect()
}

fn compute_blocks(
    a: &[Representation],
    b: &[Representation],
    symmetric: bool,
    params: &KernelParams,
    bandwidths: &[f64],
) -> Result<Vec<Matrix>, EngineError> {
    let functions = KernelFunction::for_bandwidths(params.kernel, bandwidths)?;
    debug!(
        rows = a.len(),
        cols = b.len(),
        kernel = ?params.kernel,
        mode = ?params.mode,
        bandwidths = bandwidths.len(),
        symmetric,
        "Computing kernel matrices."
    );

    match params.mode {
        KernelMode::Global => {
            let views_a = global_views(a)?;
            let views_b = if symmetric {
                views_a.clone()
            } else {
                global_views(b)?
            };
            global::kernel_blocks(&views_a, &views_b, symmetric, &functions)
        }
        KernelMode::Local => {
            let (views_a, views_b) = local_pair(a, b, symmetric)?;
            local::kernel_blocks(
                &views_a,
                &views_b,
                symmetric,
                &functions,
                params.normalize_by_atom_count,
                local::vector_measure(params.kernel),
            )
        }
        KernelMode::Arad(arad) => {
            let (views_a, views_b) = local_pair(a, b, symmetric)?;
            let arad = AradMeasure::new(&arad, &views_a, &views_b, symmetric)?;
            local::kernel_blocks(
                &views_a,
                &views_b,
                symmetric,
                &functions,
                params.normalize_by_atom_count,
                |x, y| arad.measure(params.kernel, x, y),
            )
        }
    }
}

fn single(blocks: Vec<Matrix>, rows: usize, cols: usize) -> Matrix {
    blocks
        .into_iter()
        .next()
        .unwrap_or_else(|| Matrix::zeros(rows, cols))
}

/// Kernel matrix `K[i][j] = k(a_i, b_j)` under `params`.
///
/// Passing the same slice for `a` and `b` is equivalent to
/// [`symmetric_kernel_matrix`].
#[instrument(skip_all, name = "kernel_matrix")]
pub fn kernel_matrix(
    a: &[Representation],
    b: &[Representation],
    params: &KernelParams,
) -> Result<Matrix, EngineError> {
    let symmetric = std::ptr::eq(a, b);
    let blocks = compute_blocks(a, b, symmetric, params, &[params.bandwidth])?;
    Ok(single(blocks, a.len(), b.len()))
}

/// Kernel matrix of a set against itself. Exactly symmetric.
#[instrument(skip_all, name = "symmetric_kernel_matrix")]
pub fn symmetric_kernel_matrix(
    reps: &[Representation],
    params: &KernelParams,
) -> Result<Matrix, EngineError> {
    let blocks = compute_blocks(reps, reps, true, params, &[params.bandwidth])?;
    Ok(single(blocks, reps.len(), reps.len()))
}

/// One kernel matrix per entry of `bandwidths`, in the same order.
///
/// `params.bandwidth` is ignored. Pair distances are computed once and
/// reused for every bandwidth.
#[instrument(skip_all, name = "kernel_matrices")]
pub fn kernel_matrices(
    a: &[Representation],
    b: &[Representation],
    params: &KernelParams,
    bandwidths: &[f64],
) -> Result<Vec<Matrix>, EngineError> {
    compute_blocks(a, b, std::ptr::eq(a, b), params, bandwidths)
}

/// Atom-by-atom kernel between all atoms of two sets of local
/// representations. Rows enumerate the atoms of `a` molecule by molecule,
/// columns those of `b`.
///
/// In ARAD mode atoms are compared through the ARAD similarity; any other
/// mode compares feature vectors. Normalization is ignored.
#[instrument(skip_all, name = "atomic_kernel_matrix")]
pub fn atomic_kernel_matrix(
    a: &[Representation],
    b: &[Representation],
    params: &KernelParams,
) -> Result<Matrix, EngineError> {
    let function = KernelFunction::new(params.kernel, params.bandwidth)?;
    let symmetric = std::ptr::eq(a, b);
    let (views_a, views_b) = local_pair(a, b, symmetric)?;
    match params.mode {
        KernelMode::Arad(arad) => {
            let arad = AradMeasure::new(&arad, &views_a, &views_b, symmetric)?;
            local::atomic_kernel(&views_a, &views_b, symmetric, function, |x, y| {
                arad.measure(params.kernel, x, y)
            })
        }
        KernelMode::Global | KernelMode::Local => local::atomic_kernel(
            &views_a,
            &views_b,
            symmetric,
            function,
            local::vector_measure(params.kernel),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::core::models::molecule::Molecule;
    use crate::core::representations::{AradParams, RepresentationConfig};
    use approx::assert_relative_eq;

    fn global_set() -> Vec<Representation> {
        vec![
            Representation::Global(vec![0.0, 1.0, 2.0]),
            Representation::Global(vec![1.0, 1.0, 0.0]),
            Representation::Global(vec![-2.0, 0.5, 1.0]),
            Representation::Global(vec![0.1, 0.9, 2.1]),
        ]
    }

    fn local_set() -> Vec<Representation> {
        vec![
            Representation::Local(LocalRepresentation::from_rows(&[[0.0, 1.0], [1.0, 0.0]]).unwrap()),
            Representation::Local(LocalRepresentation::from_rows(&[[0.5, 0.5]]).unwrap()),
            Representation::Local(
                LocalRepresentation::from_rows(&[[2.0, 0.0], [0.0, 2.0], [1.0, 1.0]]).unwrap(),
            ),
        ]
    }

    #[test]
    fn self_kernel_is_symmetric_with_unit_diagonal() {
        let reps = global_set();
        for kind in [KernelKind::Gaussian, KernelKind::Laplacian] {
            let k = kernel_matrix(&reps, &reps, &KernelParams::new(kind, 1.3)).unwrap();
            assert!(k.is_symmetric(0.0));
            assert_eq!(k.diagonal(), vec![1.0; 4]);
            assert!(k.as_slice().iter().all(|&v| v > 0.0 && v <= 1.0));
        }
    }

    #[test]
    fn general_and_symmetric_paths_agree() {
        let a = global_set();
        let b = global_set();
        let params = KernelParams::new(KernelKind::Gaussian, 0.7);
        let general = kernel_matrix(&a, &b, &params).unwrap();
        let symmetric = symmetric_kernel_matrix(&a, &params).unwrap();
        assert_eq!(general, symmetric);
    }

    #[test]
    fn linear_kernel_is_a_gram_matrix() {
        let reps = global_set();
        let k = kernel_matrix(&reps, &reps, &KernelParams::new(KernelKind::Linear, 1.0)).unwrap();
        assert_eq!(k[(0, 0)], 5.0);
        assert_eq!(k[(0, 1)], 1.0);
    }

    #[test]
    fn rectangular_kernel_has_test_by_train_shape() {
        let train = global_set();
        let test = &train[..2];
        let k = kernel_matrix(test, &train, &KernelParams::new(KernelKind::Laplacian, 2.0)).unwrap();
        assert_eq!(k.shape(), (2, 4));
        assert_eq!(k[(1, 1)], 1.0);
    }

    #[test]
    fn zero_bandwidth_is_rejected() {
        let reps = global_set();
        let err = kernel_matrix(&reps, &reps, &KernelParams::new(KernelKind::Gaussian, 0.0))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn mismatched_widths_are_rejected() {
        let a = vec![Representation::Global(vec![0.0, 1.0])];
        let b = vec![Representation::Global(vec![0.0, 1.0, 2.0])];
        let err = kernel_matrix(&a, &b, &KernelParams::new(KernelKind::Gaussian, 1.0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn mode_must_match_representation_kind() {
        let global = global_set();
        let local = local_set();
        let err = kernel_matrix(&local, &local, &KernelParams::new(KernelKind::Gaussian, 1.0))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::RepresentationKindMismatch {
                index: 0,
                expected: RepresentationKind::Global,
                actual: RepresentationKind::Local
            }
        ));
        let local_params = KernelParams::new(KernelKind::Gaussian, 1.0).local(true);
        assert!(kernel_matrix(&global, &global, &local_params).is_err());
    }

    #[test]
    fn normalized_local_kernel_is_invariant_to_duplicated_atoms() {
        let reps = local_set();
        let params = KernelParams::new(KernelKind::Gaussian, 0.8).local(true);
        let k = kernel_matrix(&reps, &reps, &params).unwrap();

        let mut doubled = reps.clone();
        let first = reps[0].as_local().unwrap();
        let rows: Vec<&[f64]> = first.atoms().chain(first.atoms()).collect();
        doubled[0] = Representation::Local(LocalRepresentation::from_rows(&rows).unwrap());
        let k2 = kernel_matrix(&doubled, &doubled, &params).unwrap();

        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(k[(i, j)], k2[(i, j)], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn unnormalized_local_self_kernel_counts_atom_pairs() {
        let reps = local_set();
        let params = KernelParams::new(KernelKind::Laplacian, 1.0).local(false);
        let k = symmetric_kernel_matrix(&reps, &params).unwrap();
        assert!(k.is_symmetric(0.0));
        // One atom: only the self pair.
        assert_eq!(k[(1, 1)], 1.0);
        // Two atoms at L1 distance 2: 2 self pairs + 2 cross pairs.
        assert_relative_eq!(k[(0, 0)], 2.0 + 2.0 * (-2.0f64).exp(), epsilon = 1e-14);
    }

    #[test]
    fn multi_bandwidth_matches_single_calls() {
        let reps = local_set();
        let params = KernelParams::new(KernelKind::Gaussian, 1.0).local(true);
        let bandwidths = [0.3, 1.0, 3.0];
        let blocks = kernel_matrices(&reps, &reps, &params, &bandwidths).unwrap();
        assert_eq!(blocks.len(), 3);
        for (block, &sigma) in blocks.iter().zip(&bandwidths) {
            let single = kernel_matrix(&reps, &reps, &KernelParams { bandwidth: sigma, ..params })
                .unwrap();
            assert_eq!(block, &single);
        }
    }

    #[test]
    fn atomic_kernel_counts_all_atoms() {
        let reps = local_set();
        let params = KernelParams::new(KernelKind::Gaussian, 1.0);
        let k = atomic_kernel_matrix(&reps, &reps, &params).unwrap();
        assert_eq!(k.shape(), (6, 6));
        assert_eq!(k.diagonal(), vec![1.0; 6]);
        let cross = atomic_kernel_matrix(&reps[..1], &reps, &params).unwrap();
        assert_eq!(cross.shape(), (2, 6));
        assert!(atomic_kernel_matrix(&global_set(), &global_set(), &params).is_err());
    }

    fn arad_set() -> Vec<Representation> {
        let config = RepresentationConfig::Arad(AradParams::new(4));
        [
            Molecule::new(
                &[8, 1, 1],
                &[[0.0, 0.0, 0.1173], [0.0, 0.7572, -0.4692], [0.0, -0.7572, -0.4692]],
            ),
            Molecule::new(&[1, 9], &[[0.0; 3], [0.92, 0.0, 0.0]]),
            Molecule::new(
                &[7, 1, 1, 1],
                &[
                    [0.0, 0.0, 0.0],
                    [0.0, -0.9377, -0.3816],
                    [0.8121, 0.4689, -0.3816],
                    [-0.8121, 0.4689, -0.3816],
                ],
            ),
        ]
        .iter()
        .map(|m| config.encode(m.as_ref().unwrap()).unwrap())
        .collect()
    }

    #[test]
    fn arad_mode_builds_symmetric_kernels() {
        let reps = arad_set();
        let params = KernelParams::new(KernelKind::Gaussian, 1.0).arad(AradKernelParams::default(), true);
        let k = symmetric_kernel_matrix(&reps, &params).unwrap();
        assert!(k.is_symmetric(0.0));
        assert!(k.as_slice().iter().all(|&v| v > 0.0 && v <= 1.0));

        let general = kernel_matrix(&reps, &reps[..], &params).unwrap();
        let b = reps.clone();
        let cross = kernel_matrix(&reps, &b, &params).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(general[(i, j)], cross[(i, j)], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn arad_atomic_kernel_has_unit_diagonal() {
        let reps = arad_set();
        let params = KernelParams::new(KernelKind::Laplacian, 0.5).arad(AradKernelParams::default(), false);
        let k = atomic_kernel_matrix(&reps, &reps, &params).unwrap();
        assert_eq!(k.shape(), (9, 9));
        assert_eq!(k.diagonal(), vec![1.0; 9]);
        // The two hydrogens of water share an environment.
        assert_relative_eq!(k[(1, 2)], 1.0, epsilon = 1e-6);
        assert!(k[(0, 1)] < 0.01);
    }

    #[test]
    fn arad_mode_rejects_plain_local_features() {
        let params = KernelParams::new(KernelKind::Gaussian, 1.0).arad(AradKernelParams::default(), true);
        let err = symmetric_kernel_matrix(&local_set(), &params).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert!(symmetric_kernel_matrix(&global_set(), &params).is_err());

        let bad = KernelParams::new(KernelKind::Gaussian, 1.0).arad(
            AradKernelParams {
                group_width: -1.0,
                ..AradKernelParams::default()
            },
            true,
        );
        assert!(bad.validate().is_err());
    }

    #[test]
    fn arad_mode_deserializes_with_default_widths() {
        let params: KernelParams = toml::from_str(
            r#"
            kernel = "gaussian"
            bandwidth = 0.5
            mode = { arad = { width = 0.3 } }
            "#,
        )
        .unwrap();
        let expected = AradKernelParams {
            width: 0.3,
            ..AradKernelParams::default()
        };
        assert_eq!(params.mode, KernelMode::Arad(expected));
        assert_eq!(params.mode.representation_kind(), RepresentationKind::Local);

        let unknown: Result<KernelParams, _> = toml::from_str(
            r#"
            kernel = "gaussian"
            bandwidth = 0.5
            mode = { arad = { widht = 0.3 } }
            "#,
        );
        assert!(unknown.is_err());
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let params: KernelParams = toml::from_str(
            r#"
            kernel = "laplacian"
            bandwidth = 1000.0
            "#,
        )
        .unwrap();
        assert_eq!(params, KernelParams::new(KernelKind::Laplacian, 1000.0));

        let unknown: Result<KernelParams, _> = toml::from_str(
            r#"
            kernel = "gaussian"
            bandwidth = 1.0
            sigma = 2.0
            "#,
        );
        assert!(unknown.is_err());
    }
}
