//! Raster store: the clean image, the mask stencil and the display surface.

pub mod codec;
pub mod draw;
pub mod mask;

use image::{imageops, DynamicImage, Rgba, RgbaImage};
use thiserror::Error;

use crate::geometry::{CanvasSize, Region};

pub use mask::{MaskBounds, MaskBuffer, MARKED, MARK_THRESHOLD, UNMARKED};

pub const BLANK_PIXEL: Rgba<u8> = Rgba([0, 0, 0, 255]);

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("failed to encode png: {source}")]
    Encode {
        #[source]
        source: image::ImageError,
    },
    #[error("failed to decode image: {source}")]
    Decode {
        #[source]
        source: image::ImageError,
    },
    #[error("image has no pixels")]
    EmptyImage,
    #[error("buffer is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}")]
    SizeMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },
    #[error("region {region:?} exceeds canvas {canvas_width}x{canvas_height}")]
    RegionOutOfBounds {
        region: Region,
        canvas_width: u32,
        canvas_height: u32,
    },
}

pub type RasterResult<T> = std::result::Result<T, RasterError>;

/// Three same-sized buffers sharing the canvas coordinate system.
#[derive(Debug, Clone)]
pub struct RasterStore {
    size: CanvasSize,
    clean: RgbaImage,
    mask: MaskBuffer,
    display: RgbaImage,
}

impl RasterStore {
    pub fn new(size: CanvasSize) -> Self {
        Self {
            size,
            clean: blank_image(size),
            mask: MaskBuffer::new(size),
            display: blank_image(size),
        }
    }

    pub fn size(&self) -> CanvasSize {
        self.size
    }

    pub fn clean(&self) -> &RgbaImage {
        &self.clean
    }

    pub fn mask(&self) -> &MaskBuffer {
        &self.mask
    }

    pub fn mask_mut(&mut self) -> &mut MaskBuffer {
        &mut self.mask
    }

    pub fn display(&self) -> &RgbaImage {
        &self.display
    }

    /// Letterboxes a decoded bitmap into the clean buffer and clears the mask.
    pub fn load(&mut self, source: &DynamicImage) -> RasterResult<()> {
        self.clean = codec::letterbox(source, self.size)?;
        self.mask.clear();
        Ok(())
    }

    pub fn replace_clean(&mut self, image: RgbaImage) -> RasterResult<()> {
        self.check_size(&image)?;
        self.clean = image;
        Ok(())
    }

    pub fn blank(&mut self) {
        self.clean = blank_image(self.size);
        self.display = blank_image(self.size);
        self.mask.clear();
    }

    pub fn crop_clean(&self, region: Region) -> RasterResult<RgbaImage> {
        self.check_region(region)?;
        Ok(imageops::crop_imm(&self.clean, region.x, region.y, region.width, region.height)
            .to_image())
    }

    pub fn crop_mask(&self, region: Region) -> RasterResult<RgbaImage> {
        self.check_region(region)?;
        Ok(self.mask.crop(region))
    }

    pub fn check_region(&self, region: Region) -> RasterResult<()> {
        if region.is_empty() || !region.fits_within(self.size) {
            return Err(RasterError::RegionOutOfBounds {
                region,
                canvas_width: self.size.width,
                canvas_height: self.size.height,
            });
        }
        Ok(())
    }

    fn check_size(&self, image: &RgbaImage) -> RasterResult<()> {
        if image.dimensions() != (self.size.width, self.size.height) {
            return Err(RasterError::SizeMismatch {
                expected_width: self.size.width,
                expected_height: self.size.height,
                actual_width: image.width(),
                actual_height: image.height(),
            });
        }
        Ok(())
    }

    /// Split borrow used by compositing: clean buffer mutably, mask read-only.
    pub(crate) fn clean_and_mask_mut(&mut self) -> (&mut RgbaImage, &MaskBuffer) {
        (&mut self.clean, &self.mask)
    }

    /// Split borrow used by the presentation layer.
    pub(crate) fn sources_and_display_mut(
        &mut self,
    ) -> (&RgbaImage, &MaskBuffer, &mut RgbaImage) {
        (&self.clean, &self.mask, &mut self.display)
    }
}

pub fn blank_image(size: CanvasSize) -> RgbaImage {
    RgbaImage::from_pixel(size.width, size.height, BLANK_PIXEL)
}
