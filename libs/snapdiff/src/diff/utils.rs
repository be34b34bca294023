use image::{Rgba, RgbaImage};

use super::anti_aliasing::is_anti_aliased;
use super::{DiffOptions, DiffResult};
use crate::common::{DiffError, ImageDimensions, ImageSide};
use crate::image_utils::{align_to_common_canvas, decode_png, encode_png};

pub fn compare(baseline: &[u8], candidate: &[u8]) -> Result<DiffResult, DiffError> {
    compare_with_options(baseline, candidate, &DiffOptions::default())
}

pub fn compare_with_threshold(baseline: &[u8], candidate: &[u8], threshold: f64) -> Result<DiffResult, DiffError> {
    compare_with_options(baseline, candidate, &DiffOptions::with_threshold(threshold))
}

/// Decodes two PNG buffers, reconciles their sizes and returns the number of
/// differing pixels together with a PNG visualising them.
pub fn compare_with_options(
    baseline: &[u8],
    candidate: &[u8],
    options: &DiffOptions,
) -> Result<DiffResult, DiffError> {
    options.validate()?;

    let baseline = decode_png(baseline).map_err(|source| DiffError::Decode {
        side: ImageSide::Baseline,
        source,
    })?;
    let candidate = decode_png(candidate).map_err(|source| DiffError::Decode {
        side: ImageSide::Candidate,
        source,
    })?;

    let dimensions = ImageDimensions {
        baseline_width: baseline.width(),
        baseline_height: baseline.height(),
        candidate_width: candidate.width(),
        candidate_height: candidate.height(),
    };

    let (candidate, baseline) = if dimensions.has_size_mismatch() {
        align_to_common_canvas(candidate, baseline)
    } else {
        (candidate, baseline)
    };

    let (output, pixel_count) = diff_images(&candidate, &baseline, options);
    let buffer = encode_png(&output).map_err(DiffError::Encode)?;

    log::debug!(
        "Compared {}x{} canvas: {} differing pixels",
        output.width(),
        output.height(),
        pixel_count
    );

    Ok(DiffResult::new(pixel_count, dimensions, buffer))
}

/// Pixel-by-pixel comparison of two images of equal size. Unchanged pixels
/// are drawn from `first`.
pub(crate) fn diff_images(first: &RgbaImage, second: &RgbaImage, options: &DiffOptions) -> (RgbaImage, u64) {
    debug_assert_eq!(first.dimensions(), second.dimensions());

    let (width, height) = first.dimensions();
    let img1 = first.as_raw();
    let img2 = second.as_raw();
    let mut output = RgbaImage::new(width, height);

    if img1 == img2 {
        if !options.diff_mask {
            for (x, y, pixel) in output.enumerate_pixels_mut() {
                *pixel = gray_pixel(img1, pixel_offset(x, y, width), options.alpha);
            }
        }
        return (output, 0);
    }

    let max_delta = options.max_delta();
    let mut pixel_count = 0u64;

    for y in 0..height {
        for x in 0..width {
            let pos = pixel_offset(x, y, width);
            let delta = color_delta(img1, img2, pos, pos, false);

            // at threshold 0 any byte difference counts, even between pixels
            // that blend to the same colour
            let differs = delta.abs() > max_delta
                || (max_delta == 0.0 && img1[pos..pos + 4] != img2[pos..pos + 4]);

            if !differs {
                if !options.diff_mask {
                    output.put_pixel(x, y, gray_pixel(img1, pos, options.alpha));
                }
                continue;
            }

            if options.detect_anti_aliasing
                && (is_anti_aliased(img1, x, y, width, height, img2)
                    || is_anti_aliased(img2, x, y, width, height, img1))
            {
                if !options.diff_mask {
                    output.put_pixel(x, y, options.aa_color);
                }
                continue;
            }

            let color = match options.diff_color_alt {
                Some(alt) if delta < 0.0 => alt,
                _ => options.diff_color,
            };
            output.put_pixel(x, y, color);
            pixel_count += 1;
        }
    }

    (output, pixel_count)
}

fn pixel_offset(x: u32, y: u32, width: u32) -> usize {
    (y as usize * width as usize + x as usize) * 4
}

fn rgb2y(r: f64, g: f64, b: f64) -> f64 {
    r * 0.29889531 + g * 0.58662247 + b * 0.11448223
}

fn rgb2i(r: f64, g: f64, b: f64) -> f64 {
    r * 0.59597799 - g * 0.27417610 - b * 0.32180189
}

fn rgb2q(r: f64, g: f64, b: f64) -> f64 {
    r * 0.21147017 - g * 0.52261711 + b * 0.31114694
}

fn blend(c: f64, a: f64) -> f64 {
    255.0 + (c - 255.0) * a
}

/// Colour of a pixel composited over a white background.
fn composited(pixel: &[u8]) -> (f64, f64, f64) {
    let (r, g, b) = (pixel[0] as f64, pixel[1] as f64, pixel[2] as f64);
    if pixel[3] == 255 {
        return (r, g, b);
    }
    let a = pixel[3] as f64 / 255.0;
    (blend(r, a), blend(g, a), blend(b, a))
}

/// Squared YIQ distance between the pixels at byte offsets `k` and `m`
/// (Kotsarenko & Ramos, 2010). Negative when the first pixel is the lighter
/// one. With `y_only` only the signed brightness difference is returned.
pub(crate) fn color_delta(img1: &[u8], img2: &[u8], k: usize, m: usize, y_only: bool) -> f64 {
    let p1 = &img1[k..k + 4];
    let p2 = &img2[m..m + 4];

    if p1 == p2 {
        return 0.0;
    }

    let (r1, g1, b1) = composited(p1);
    let (r2, g2, b2) = composited(p2);

    let y1 = rgb2y(r1, g1, b1);
    let y2 = rgb2y(r2, g2, b2);
    let y = y1 - y2;

    if y_only {
        return y;
    }

    let i = rgb2i(r1, g1, b1) - rgb2i(r2, g2, b2);
    let q = rgb2q(r1, g1, b1) - rgb2q(r2, g2, b2);
    let delta = 0.5053 * y * y + 0.299 * i * i + 0.1957 * q * q;

    if y1 > y2 {
        -delta
    } else {
        delta
    }
}

fn gray_pixel(image: &[u8], pos: usize, alpha: f64) -> Rgba<u8> {
    let (r, g, b, a) = (
        image[pos] as f64,
        image[pos + 1] as f64,
        image[pos + 2] as f64,
        image[pos + 3] as f64,
    );
    let value = blend(rgb2y(r, g, b), alpha * a / 255.0) as u8;
    Rgba([value, value, value, 255])
}
