use std::io::Cursor;

use image::{imageops, ImageFormat, ImageReader, ImageResult, Rgba, RgbaImage};

/// Fill for canvas area that lies outside an image's original extent.
pub const SENTINEL: Rgba<u8> = Rgba([0, 0, 0, 64]);

pub fn decode_png(bytes: &[u8]) -> ImageResult<RgbaImage> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)?;
    Ok(image.into_rgba8())
}

/// Reads only the PNG header, without decoding any pixels.
pub fn png_dimensions(bytes: &[u8]) -> ImageResult<(u32, u32)> {
    ImageReader::with_format(Cursor::new(bytes), ImageFormat::Png).into_dimensions()
}

pub fn encode_png(image: &RgbaImage) -> ImageResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Grows `image` to `width` x `height`, keeping its pixels in the top-left
/// corner and painting everything outside its original extent with
/// [`SENTINEL`]. Images already at the target size are returned untouched.
pub fn extend_canvas(image: RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image;
    }

    let mut canvas = RgbaImage::from_pixel(width, height, SENTINEL);
    imageops::replace(&mut canvas, &image, 0, 0);
    canvas
}

/// Extends both images to the smallest canvas that holds either of them.
pub fn align_to_common_canvas(first: RgbaImage, second: RgbaImage) -> (RgbaImage, RgbaImage) {
    let width = first.width().max(second.width());
    let height = first.height().max(second.height());

    log::debug!(
        "Aligning {}x{} and {}x{} to {}x{}",
        first.width(),
        first.height(),
        second.width(),
        second.height(),
        width,
        height
    );

    (
        extend_canvas(first, width, height),
        extend_canvas(second, width, height),
    )
}
