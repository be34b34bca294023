use std::fmt;

use thiserror::Error;

/// Which input of a comparison an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSide {
    Baseline,
    Candidate,
}

impl fmt::Display for ImageSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSide::Baseline => write!(f, "baseline"),
            ImageSide::Candidate => write!(f, "candidate"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DiffError {
    /// The buffer is not a well-formed PNG image.
    #[error("failed to decode {side} image: {source}")]
    Decode {
        side: ImageSide,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode diff image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("threshold must be within 0.0..=1.0, got {0}")]
    InvalidThreshold(f64),
}

impl DiffError {
    pub fn is_decode(&self) -> bool {
        matches!(self, DiffError::Decode { .. })
    }
}
