use image::Rgba;
use serde::Serialize;

use crate::common::{DiffError, ImageDimensions};

#[derive(Debug, Clone, PartialEq)]
pub struct DiffOptions {
    /// Matching threshold in `0.0..=1.0`; 0 requires exact equality.
    pub threshold: f64,
    /// Skip pixels that look like anti-aliasing noise instead of counting them.
    pub detect_anti_aliasing: bool,
    /// Opacity of the unchanged content drawn under the markers.
    pub alpha: f64,
    pub diff_color: Rgba<u8>,
    /// Marker for pixels where the candidate is lighter than the baseline.
    pub diff_color_alt: Option<Rgba<u8>>,
    pub aa_color: Rgba<u8>,
    /// Leave unchanged pixels transparent instead of drawing them dimmed.
    pub diff_mask: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            detect_anti_aliasing: false,
            alpha: 0.1,
            diff_color: Rgba([255, 0, 0, 255]),
            diff_color_alt: None,
            aa_color: Rgba([255, 255, 0, 255]),
            diff_mask: false,
        }
    }
}

impl DiffOptions {
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            ..Default::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), DiffError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(DiffError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }

    /// Largest YIQ delta still treated as "same".
    pub(crate) fn max_delta(&self) -> f64 {
        35215.0 * self.threshold * self.threshold
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    pixel_count: u64,
    width: u32,
    height: u32,
    dimensions: ImageDimensions,
    #[serde(skip)]
    buffer: Vec<u8>,
}

impl DiffResult {
    pub(crate) fn new(pixel_count: u64, dimensions: ImageDimensions, buffer: Vec<u8>) -> Self {
        let (width, height) = dimensions.canvas();
        Self {
            pixel_count,
            width,
            height,
            dimensions,
            buffer,
        }
    }

    pub fn pixel_count(&self) -> u64 {
        self.pixel_count
    }

    /// PNG-encoded diff image.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_buffer(self) -> Vec<u8> {
        self.buffer
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> &ImageDimensions {
        &self.dimensions
    }

    pub fn has_differences(&self) -> bool {
        self.pixel_count > 0
    }
}
