use image::{imageops, Rgba, RgbaImage};

use crate::geometry::{CanvasSize, Region};

/// Red-channel level above which a mask pixel counts as marked.
pub const MARK_THRESHOLD: u8 = 200;
pub const MARKED: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const UNMARKED: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Inclusive bounding box of marked pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskBounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl MaskBounds {
    pub const fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub const fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

/// Binary keep/replace stencil stored as opaque black/white RGBA.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskBuffer {
    image: RgbaImage,
}

impl MaskBuffer {
    pub fn new(size: CanvasSize) -> Self {
        Self {
            image: RgbaImage::from_pixel(size.width, size.height, UNMARKED),
        }
    }

    pub fn size(&self) -> CanvasSize {
        CanvasSize::new(self.image.width(), self.image.height())
    }

    pub fn is_marked(&self, x: u32, y: u32) -> bool {
        self.image
            .get_pixel_checked(x, y)
            .is_some_and(|pixel| pixel.0[0] > MARK_THRESHOLD)
    }

    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = UNMARKED;
        }
    }

    pub fn is_clear(&self) -> bool {
        self.image.pixels().all(|pixel| pixel.0[0] <= MARK_THRESHOLD)
    }

    pub fn marked_count(&self) -> usize {
        self.image
            .pixels()
            .filter(|pixel| pixel.0[0] > MARK_THRESHOLD)
            .count()
    }

    pub fn bounds(&self) -> Option<MaskBounds> {
        let mut bounds: Option<MaskBounds> = None;
        for (x, y, pixel) in self.image.enumerate_pixels() {
            if pixel.0[0] <= MARK_THRESHOLD {
                continue;
            }
            bounds = Some(match bounds {
                None => MaskBounds {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                },
                Some(current) => MaskBounds {
                    min_x: current.min_x.min(x),
                    min_y: current.min_y.min(y),
                    max_x: current.max_x.max(x),
                    max_y: current.max_y.max(y),
                },
            });
        }
        bounds
    }

    pub fn crop(&self, region: Region) -> RgbaImage {
        imageops::crop_imm(&self.image, region.x, region.y, region.width, region.height)
            .to_image()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    pub(crate) fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_mask_is_clear_and_has_no_bounds() {
        let mask = MaskBuffer::new(CanvasSize::square(16));
        assert!(mask.is_clear());
        assert_eq!(mask.bounds(), None);
    }

    #[test]
    fn bounds_cover_every_marked_pixel() {
        let mut mask = MaskBuffer::new(CanvasSize::new(20, 10));
        mask.image_mut().put_pixel(3, 7, MARKED);
        mask.image_mut().put_pixel(15, 2, MARKED);
        let bounds = mask.bounds().expect("marked pixels should produce bounds");
        assert_eq!(
            bounds,
            MaskBounds {
                min_x: 3,
                min_y: 2,
                max_x: 15,
                max_y: 7
            }
        );
        assert_eq!((bounds.width(), bounds.height()), (13, 6));
    }

    #[test]
    fn mid_gray_pixels_stay_below_threshold() {
        let mut mask = MaskBuffer::new(CanvasSize::square(4));
        mask.image_mut().put_pixel(1, 1, Rgba([180, 180, 180, 255]));
        mask.image_mut().put_pixel(2, 2, Rgba([230, 230, 230, 255]));
        assert!(!mask.is_marked(1, 1));
        assert!(mask.is_marked(2, 2));
        assert!(!mask.is_marked(99, 99));
        assert_eq!(mask.marked_count(), 1);
    }

    #[test]
    fn clear_unmarks_everything() {
        let mut mask = MaskBuffer::new(CanvasSize::square(4));
        mask.image_mut().put_pixel(0, 0, MARKED);
        mask.clear();
        assert!(mask.is_clear());
    }
}
