use super::function::{KernelFunction, measure};
use crate::core::matrix::Matrix;
use crate::engine::distance::common_width;
use crate::engine::error::EngineError;
use crate::engine::parallel::fill_matrices;

/// Molecule-level kernel matrices, one per function in `functions`.
///
/// All functions must share a kernel kind; the measure of each pair is
/// computed once and fed to every function.
pub(crate) fn kernel_blocks<R>(
    a: &[R],
    b: &[R],
    symmetric: bool,
    functions: &[KernelFunction],
) -> Result<Vec<Matrix>, EngineError>
where
    R: AsRef<[f64]> + Sync,
{
    common_width(a, b)?;
    let Some(kind) = functions.first().map(KernelFunction::kind) else {
        return Ok(Vec::new());
    };
    debug_assert!(functions.iter().all(|f| f.kind() == kind));

    Ok(fill_matrices(a.len(), b.len(), functions.len(), symmetric, |i, j, out| {
        let m = measure(kind, a[i].as_ref(), b[j].as_ref());
        for (slot, f) in out.iter_mut().zip(functions) {
            *slot = f.apply(m);
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::kernels::KernelKind;
    use approx::assert_relative_eq;

    #[test]
    fn several_bandwidths_match_separate_evaluations() {
        let a = vec![vec![0.0, 1.0], vec![2.0, 0.5]];
        let b = vec![vec![1.0, 1.0], vec![-1.0, 0.0], vec![0.0, 0.0]];
        let functions =
            KernelFunction::for_bandwidths(KernelKind::Gaussian, &[0.5, 1.0, 4.0]).unwrap();
        let blocks = kernel_blocks(&a, &b, false, &functions).unwrap();
        assert_eq!(blocks.len(), 3);
        for (block, f) in blocks.iter().zip(&functions) {
            assert_eq!(block.shape(), (2, 3));
            for i in 0..2 {
                for j in 0..3 {
                    assert_relative_eq!(block[(i, j)], f.evaluate(&a[i], &b[j]));
                }
            }
        }
    }

    #[test]
    fn symmetric_blocks_have_unit_diagonal() {
        let a = vec![vec![0.0, 1.0], vec![2.0, 0.5], vec![-3.0, 1.0]];
        let functions = KernelFunction::for_bandwidths(KernelKind::Laplacian, &[1.0]).unwrap();
        let k = &kernel_blocks(&a, &a, true, &functions).unwrap()[0];
        assert!(k.is_symmetric(0.0));
        assert_eq!(k.diagonal(), vec![1.0; 3]);
    }
}
