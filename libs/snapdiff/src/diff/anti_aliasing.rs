//! Anti-aliasing detection after "Anti-aliased Pixel and Intensity Slope
//! Detector" (Vysniauskas, 2009).

use super::utils::color_delta;

fn neighbourhood(x: u32, y: u32, width: u32, height: u32) -> (u32, u32, u32, u32) {
    (
        x.saturating_sub(1),
        y.saturating_sub(1),
        (x + 1).min(width - 1),
        (y + 1).min(height - 1),
    )
}

fn offset(x: u32, y: u32, width: u32) -> usize {
    (y as usize * width as usize + x as usize) * 4
}

/// Whether the pixel at (`x`, `y`) of `image` sits on an anti-aliased edge,
/// with `other` being the image it is compared against.
pub(crate) fn is_anti_aliased(image: &[u8], x: u32, y: u32, width: u32, height: u32, other: &[u8]) -> bool {
    let (x0, y0, x2, y2) = neighbourhood(x, y, width, height);
    let pos = offset(x, y, width);

    let mut zeroes = if x == x0 || x == x2 || y == y0 || y == y2 { 1 } else { 0 };
    let mut min = 0.0;
    let mut max = 0.0;
    let mut brightest = None;
    let mut darkest = None;

    for nx in x0..=x2 {
        for ny in y0..=y2 {
            if nx == x && ny == y {
                continue;
            }

            let delta = color_delta(image, image, pos, offset(nx, ny, width), true);
            if delta == 0.0 {
                zeroes += 1;
                // more than two equal siblings means a flat area, not an edge
                if zeroes > 2 {
                    return false;
                }
            } else if delta < min {
                min = delta;
                brightest = Some((nx, ny));
            } else if delta > max {
                max = delta;
                darkest = Some((nx, ny));
            }
        }
    }

    let (Some(brightest), Some(darkest)) = (brightest, darkest) else {
        return false;
    };

    let is_plateau = |(px, py): (u32, u32)| {
        has_many_siblings(image, px, py, width, height) && has_many_siblings(other, px, py, width, height)
    };

    is_plateau(brightest) || is_plateau(darkest)
}

fn has_many_siblings(image: &[u8], x: u32, y: u32, width: u32, height: u32) -> bool {
    let (x0, y0, x2, y2) = neighbourhood(x, y, width, height);
    let pos = offset(x, y, width);
    let pixel = &image[pos..pos + 4];

    let mut zeroes = if x == x0 || x == x2 || y == y0 || y == y2 { 1 } else { 0 };

    for nx in x0..=x2 {
        for ny in y0..=y2 {
            if nx == x && ny == y {
                continue;
            }

            let other = offset(nx, ny, width);
            if pixel == &image[other..other + 4] {
                zeroes += 1;
            }
            if zeroes > 2 {
                return true;
            }
        }
    }

    false
}
