//! Region selector: the square crop of the canvas worth sending to the backend.

use crate::geometry::Region;
use crate::raster::MaskBuffer;

pub const DEFAULT_CROP_PADDING: u32 = 64;
pub const DEFAULT_MIN_CROP_SIZE: u32 = 512;
pub const DEFAULT_FULL_IMAGE_FRACTION: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionPolicy {
    /// Context pixels added around the marked bounding box on every side.
    pub padding: u32,
    pub min_size: u32,
    /// Crops at least this share of the shorter canvas side fall back to the full canvas.
    pub full_image_fraction: f32,
}

impl Default for RegionPolicy {
    fn default() -> Self {
        Self {
            padding: DEFAULT_CROP_PADDING,
            min_size: DEFAULT_MIN_CROP_SIZE,
            full_image_fraction: DEFAULT_FULL_IMAGE_FRACTION,
        }
    }
}

/// Returns `None` when the mask is empty or the crop would cover most of the canvas.
pub fn select_region(mask: &MaskBuffer, policy: &RegionPolicy) -> Option<Region> {
    let bounds = mask.bounds()?;
    let canvas = mask.size();

    let min_x = bounds.min_x.saturating_sub(policy.padding);
    let min_y = bounds.min_y.saturating_sub(policy.padding);
    let max_x = bounds
        .max_x
        .saturating_add(policy.padding)
        .min(canvas.width - 1);
    let max_y = bounds
        .max_y
        .saturating_add(policy.padding)
        .min(canvas.height - 1);

    let padded_width = max_x - min_x + 1;
    let padded_height = max_y - min_y + 1;
    let side = padded_width.max(padded_height).max(policy.min_size);

    let shorter = canvas.shorter_side();
    if side as f32 >= policy.full_image_fraction * shorter as f32 || side > shorter {
        tracing::debug!(side, shorter, "crop covers most of the canvas; using full image");
        return None;
    }

    let x = centered_origin(min_x, max_x, side, canvas.width);
    let y = centered_origin(min_y, max_y, side, canvas.height);
    let region = Region::new(x, y, side, side);
    tracing::debug!(?region, ?bounds, "selected crop region");
    Some(region)
}

/// Centers `side` on `min..=max`, then clamps so the span stays inside `0..limit`.
fn centered_origin(min: u32, max: u32, side: u32, limit: u32) -> u32 {
    let center = (min + max) as f32 / 2.0;
    let origin = (center - side as f32 / 2.0).round();
    let max_origin = (limit - side) as f32;
    origin.clamp(0.0, max_origin) as u32
}
