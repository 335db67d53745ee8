use thiserror::Error;

/// Result type for all detector and fitting operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the primitive detectors. All of them are recoverable:
/// the caller can retry with looser thresholds, more iterations or a
/// different projection.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("point set contains {actual} points but at least {needed} are required")]
    InsufficientPoints { needed: usize, actual: usize },

    #[error("cannot normalize a zero-length vector")]
    DegenerateVector,

    #[error("the sampled points are collinear and do not determine the primitive")]
    CollinearPoints,

    #[error("the input points do not span a two-dimensional region")]
    DegenerateGeometry,

    #[error("no model reached {min_points} inliers within {iterations} iterations")]
    DetectionFailed {
        min_points: usize,
        iterations: usize,
    },

    #[error("plane is too close to perpendicular to the projection axis")]
    UnsupportedOrientation,

    #[error("requested cluster {requested} but only {available} clusters were found")]
    ClusterIndexOutOfRange { requested: usize, available: usize },

    #[error("plane model has a zero-length normal")]
    InvalidPlane,
}
