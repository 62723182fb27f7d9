use image::RgbaImage;

use crate::geometry::Region;
use crate::raster::{MaskBuffer, RasterError, RasterResult};

/// Copies `result` into `clean` at `region`, but only where `mask` is marked.
///
/// `result` must already be `region`-sized. Unmarked pixels keep their clean
/// value, so backend drift outside the stencil never reaches the image.
pub fn apply_stencil(
    clean: &mut RgbaImage,
    mask: &MaskBuffer,
    result: &RgbaImage,
    region: Region,
) -> RasterResult<()> {
    if result.dimensions() != (region.width, region.height) {
        return Err(RasterError::SizeMismatch {
            expected_width: region.width,
            expected_height: region.height,
            actual_width: result.width(),
            actual_height: result.height(),
        });
    }
    let canvas = mask.size();
    if region.is_empty()
        || !region.fits_within(canvas)
        || clean.dimensions() != (canvas.width, canvas.height)
    {
        return Err(RasterError::RegionOutOfBounds {
            region,
            canvas_width: clean.width(),
            canvas_height: clean.height(),
        });
    }

    let mut replaced = 0usize;
    for (dx, dy, pixel) in result.enumerate_pixels() {
        let (x, y) = (region.x + dx, region.y + dy);
        if mask.is_marked(x, y) {
            clean.put_pixel(x, y, *pixel);
            replaced += 1;
        }
    }
    tracing::debug!(?region, replaced, "composited result through mask");
    Ok(())
}
