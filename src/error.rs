use crate::oracle::OracleError;

pub type Result<T> = std::result::Result<T, StitchError>;

/// Everything that can stop a crop, a comparison or a sweep.
#[derive(Debug, thiserror::Error)]
pub enum StitchError {
    /// Two volumes (or a matrix and its headers) that must agree in shape do not.
    #[error("shape mismatch in {what}: {left:?} vs {right:?}")]
    ShapeMismatch {
        what: &'static str,
        left: (usize, usize, usize),
        right: (usize, usize, usize),
    },

    /// The segmentation oracle failed or returned a volume of the wrong shape.
    /// Fatal for the whole sweep.
    #[error("segmentation failed on slab {slab} at overlap {overlap}, threshold {threshold}: {source}")]
    OracleFailure {
        overlap: usize,
        threshold: f64,
        slab: Slab,
        source: OracleError,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "vol-io")]
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which of the two overlapping slabs a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slab {
    A,
    B,
}

impl std::fmt::Display for Slab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slab::A => f.write_str("A"),
            Slab::B => f.write_str("B"),
        }
    }
}

impl StitchError {
    pub(crate) fn shape_mismatch(
        what: &'static str,
        left: (usize, usize, usize),
        right: (usize, usize, usize),
    ) -> Self {
        StitchError::ShapeMismatch { what, left, right }
    }
}
