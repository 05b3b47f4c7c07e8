use super::KernelKind;
use crate::engine::error::EngineError;
use crate::core::utils::vector;

/// A kernel function with its bandwidth folded into a single coefficient.
///
/// Each kernel is split into a bandwidth-free `measure` (squared Euclidean
/// distance, Manhattan distance, or dot product) and a cheap `apply` step,
/// so one measure can feed several bandwidths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum KernelFunction {
    /// `exp(-d² / (2σ²))`, stores `1 / (2σ²)`.
    Gaussian { inv_two_sigma_sq: f64 },
    /// `exp(-d / σ)`, stores `1 / σ`.
    Laplacian { inv_sigma: f64 },
    Linear,
}

pub(crate) fn validate_bandwidth(bandwidth: f64) -> Result<(), EngineError> {
    if !(bandwidth.is_finite() && bandwidth > 0.0) {
        return Err(EngineError::invalid(
            "bandwidth",
            format!("must be positive and finite, got {bandwidth}"),
        ));
    }
    Ok(())
}

impl KernelFunction {
    pub(crate) fn new(kind: KernelKind, bandwidth: f64) -> Result<Self, EngineError> {
        validate_bandwidth(bandwidth)?;
        Ok(match kind {
            KernelKind::Gaussian => Self::Gaussian {
                inv_two_sigma_sq: 1.0 / (2.0 * bandwidth * bandwidth),
            },
            KernelKind::Laplacian => Self::Laplacian {
                inv_sigma: 1.0 / bandwidth,
            },
            KernelKind::Linear => Self::Linear,
        })
    }

    /// One function per bandwidth, all sharing the same measure.
    pub(crate) fn for_bandwidths(
        kind: KernelKind,
        bandwidths: &[f64],
    ) -> Result<Vec<Self>, EngineError> {
        if bandwidths.is_empty() {
            return Err(EngineError::invalid("bandwidths", "at least one bandwidth is required"));
        }
        bandwidths.iter().map(|&b| Self::new(kind, b)).collect()
    }

    #[inline]
    pub(crate) fn apply(&self, measure: f64) -> f64 {
        match *self {
            Self::Gaussian { inv_two_sigma_sq } => (-measure * inv_two_sigma_sq).exp(),
            Self::Laplacian { inv_sigma } => (-measure * inv_sigma).exp(),
            Self::Linear => measure,
        }
    }

    #[cfg(test)]
    pub(crate) fn evaluate(&self, a: &[f64], b: &[f64]) -> f64 {
        self.apply(measure(self.kind(), a, b))
    }

    pub(crate) fn kind(&self) -> KernelKind {
        match self {
            Self::Gaussian { .. } => KernelKind::Gaussian,
            Self::Laplacian { .. } => KernelKind::Laplacian,
            Self::Linear => KernelKind::Linear,
        }
    }
}

/// Bandwidth-independent part of a kernel evaluation.
#[inline]
pub(crate) fn measure(kind: KernelKind, a: &[f64], b: &[f64]) -> f64 {
    match kind {
        KernelKind::Gaussian => vector::squared_euclidean(a, b),
        KernelKind::Laplacian => vector::manhattan(a, b),
        KernelKind::Linear => vector::dot(a, b),
    }
}
