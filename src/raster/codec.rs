use std::io::Cursor;

use image::{imageops, DynamicImage, ImageFormat, Rgba, RgbaImage};

use super::{RasterError, RasterResult};
use crate::geometry::CanvasSize;

const LETTERBOX_BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

pub fn encode_png(image: &RgbaImage) -> RasterResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|source| RasterError::Encode { source })?;
    Ok(bytes)
}

/// Decodes any format the `image` crate recognises into RGBA.
pub fn decode_image(bytes: &[u8]) -> RasterResult<RgbaImage> {
    if bytes.is_empty() {
        return Err(RasterError::EmptyImage);
    }
    let decoded = image::load_from_memory(bytes).map_err(|source| RasterError::Decode { source })?;
    Ok(decoded.to_rgba8())
}

/// Scales `source` to fit inside `size` preserving aspect ratio, centered on black.
pub fn letterbox(source: &DynamicImage, size: CanvasSize) -> RasterResult<RgbaImage> {
    let (src_width, src_height) = (source.width(), source.height());
    if src_width == 0 || src_height == 0 {
        return Err(RasterError::EmptyImage);
    }

    let scale = (size.width as f32 / src_width as f32).min(size.height as f32 / src_height as f32);
    let fit_width = ((src_width as f32 * scale).round() as u32).clamp(1, size.width);
    let fit_height = ((src_height as f32 * scale).round() as u32).clamp(1, size.height);
    let scaled = imageops::resize(
        &source.to_rgba8(),
        fit_width,
        fit_height,
        imageops::FilterType::Triangle,
    );

    let mut canvas = RgbaImage::from_pixel(size.width, size.height, LETTERBOX_BACKGROUND);
    let offset_x = (size.width - fit_width) / 2;
    let offset_y = (size.height - fit_height) / 2;
    imageops::replace(
        &mut canvas,
        &scaled,
        i64::from(offset_x),
        i64::from(offset_y),
    );
    Ok(canvas)
}

/// Resizes to exactly `width`×`height` when the dimensions differ.
pub fn fit_to(image: RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image;
    }
    tracing::debug!(
        from_width = image.width(),
        from_height = image.height(),
        width,
        height,
        "rescaling image to requested dimensions"
    );
    imageops::resize(&image, width, height, imageops::FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letterbox_centers_wide_image_between_black_bars() {
        let source = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            200,
            100,
            Rgba([10, 200, 30, 255]),
        ));
        let canvas = letterbox(&source, CanvasSize::square(64)).expect("letterbox should succeed");

        assert_eq!(canvas.dimensions(), (64, 64));
        assert_eq!(canvas.get_pixel(32, 5), &LETTERBOX_BACKGROUND);
        assert_eq!(canvas.get_pixel(32, 60), &LETTERBOX_BACKGROUND);
        assert_eq!(canvas.get_pixel(32, 32), &Rgba([10, 200, 30, 255]));
        assert_eq!(canvas.get_pixel(0, 32), &Rgba([10, 200, 30, 255]));
    }

    #[test]
    fn letterbox_upscales_small_images() {
        let source =
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255])));
        let canvas = letterbox(&source, CanvasSize::square(32)).expect("letterbox should succeed");
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
        assert_eq!(canvas.get_pixel(31, 31), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn encoded_png_decodes_to_same_pixels() {
        let mut image = RgbaImage::from_pixel(5, 3, Rgba([1, 2, 3, 255]));
        image.put_pixel(4, 2, Rgba([250, 0, 9, 128]));
        let bytes = encode_png(&image).expect("encode should succeed");
        assert_eq!(&bytes[1..4], b"PNG");
        let decoded = decode_image(&bytes).expect("decode should succeed");
        assert_eq!(decoded, image);
    }

    #[test]
    fn decode_rejects_garbage_and_empty_input() {
        assert!(matches!(decode_image(&[]), Err(RasterError::EmptyImage)));
        assert!(matches!(
            decode_image(b"definitely not an image"),
            Err(RasterError::Decode { .. })
        ));
    }

    #[test]
    fn fit_to_rescales_only_when_needed() {
        let image = RgbaImage::new(10, 10);
        assert_eq!(fit_to(image.clone(), 10, 10).dimensions(), (10, 10));
        assert_eq!(fit_to(image, 20, 5).dimensions(), (20, 5));
    }
}
