pub mod common;
pub mod diff;
pub mod image_utils;
pub mod review;

pub use common::{DiffError, ImageDimensions, ImageSide};
pub use diff::{compare, compare_with_options, compare_with_threshold, DiffOptions, DiffResult};
