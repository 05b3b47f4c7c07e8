/// Coarse classification shared by every error type in the crate.
///
/// Callers that implement retry policies (for example retrying a fit with a
/// larger regularization strength) match on the kind instead of on the
/// concrete error variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input exceeds a size bound fixed by the configuration.
    Configuration,
    /// Coincident atoms make a geometric term undefined.
    DegenerateGeometry,
    /// A parameter is out of range or array shapes disagree.
    InvalidParameter,
    /// Cholesky factorization met a non-positive pivot.
    SingularMatrix,
}
