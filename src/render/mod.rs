//! Presentation layer: composes the visible frame from the clean image and
//! transient overlays. Reads the source buffers and writes only the output.

use image::{Rgba, RgbaImage};

use crate::geometry::CanvasPoint;
use crate::raster::draw;
use crate::raster::MaskBuffer;

pub const MASK_TINT: Rgba<u8> = Rgba([255, 0, 0, 102]);
pub const CURSOR_RING: Rgba<u8> = Rgba([255, 255, 255, 204]);
pub const CURSOR_DOT: Rgba<u8> = Rgba([255, 255, 255, 153]);
pub const PREVIEW_STROKE: Rgba<u8> = Rgba([255, 255, 255, 230]);

const CURSOR_RING_WIDTH: f32 = 2.0;
const CURSOR_DOT_RADIUS: f32 = 2.0;
const CROSSHAIR_ARM: f32 = 8.0;
const PREVIEW_STROKE_WIDTH: f32 = 1.5;

/// Outline of the shape the active gesture would commit.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolPreview {
    Lasso(Vec<CanvasPoint>),
    Rectangle { anchor: CanvasPoint, current: CanvasPoint },
    Ellipse { anchor: CanvasPoint, current: CanvasPoint },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CursorMark {
    Brush { center: CanvasPoint, diameter: f32 },
    Crosshair { center: CanvasPoint },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOverlays {
    pub tint_mask: bool,
    pub preview: Option<ToolPreview>,
    pub cursor: Option<CursorMark>,
}

pub fn render_frame(
    clean: &RgbaImage,
    mask: &MaskBuffer,
    overlays: &FrameOverlays,
    out: &mut RgbaImage,
) {
    out.clone_from(clean);

    if overlays.tint_mask {
        tint_marked_pixels(mask, out);
    }
    if let Some(preview) = &overlays.preview {
        draw_preview(out, preview);
    }
    if let Some(cursor) = overlays.cursor {
        draw_cursor(out, cursor);
    }
}

fn tint_marked_pixels(mask: &MaskBuffer, out: &mut RgbaImage) {
    let Some(bounds) = mask.bounds() else {
        return;
    };
    for y in bounds.min_y..=bounds.max_y {
        for x in bounds.min_x..=bounds.max_x {
            if mask.is_marked(x, y) {
                draw::blend_pixel(out, i64::from(x), i64::from(y), MASK_TINT);
            }
        }
    }
}

fn draw_preview(out: &mut RgbaImage, preview: &ToolPreview) {
    match preview {
        ToolPreview::Lasso(path) => {
            draw::stroke_polyline(out, path, false, PREVIEW_STROKE_WIDTH, PREVIEW_STROKE);
        }
        ToolPreview::Rectangle { anchor, current } => {
            draw::stroke_rect(out, *anchor, *current, PREVIEW_STROKE_WIDTH, PREVIEW_STROKE);
        }
        ToolPreview::Ellipse { anchor, current } => {
            draw::stroke_ellipse(
                out,
                anchor.midpoint(*current),
                (current.x - anchor.x).abs() / 2.0,
                (current.y - anchor.y).abs() / 2.0,
                PREVIEW_STROKE_WIDTH,
                PREVIEW_STROKE,
            );
        }
    }
}

fn draw_cursor(out: &mut RgbaImage, cursor: CursorMark) {
    match cursor {
        CursorMark::Brush { center, diameter } => {
            draw::stroke_circle(out, center, diameter / 2.0, CURSOR_RING_WIDTH, CURSOR_RING);
            draw::fill_disc(out, center, CURSOR_DOT_RADIUS, CURSOR_DOT);
        }
        CursorMark::Crosshair { center } => {
            let horizontal = (
                CanvasPoint::new(center.x - CROSSHAIR_ARM, center.y),
                CanvasPoint::new(center.x + CROSSHAIR_ARM, center.y),
            );
            let vertical = (
                CanvasPoint::new(center.x, center.y - CROSSHAIR_ARM),
                CanvasPoint::new(center.x, center.y + CROSSHAIR_ARM),
            );
            draw::stroke_line(out, horizontal.0, horizontal.1, 1.0, CURSOR_RING);
            draw::stroke_line(out, vertical.0, vertical.1, 1.0, CURSOR_RING);
        }
    }
}
