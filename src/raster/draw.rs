//! Small software rasterizer used for mask stencils and preview overlays.
//!
//! Coverage is decided by sampling pixel centers, so a shape either owns a
//! pixel or it does not. Opaque colors replace, translucent colors blend
//! src-over.

use image::{Rgba, RgbaImage};

use crate::geometry::CanvasPoint;

const ELLIPSE_OUTLINE_SEGMENTS: usize = 72;

pub fn blend_pixel(image: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x < 0 || y < 0 || x >= i64::from(image.width()) || y >= i64::from(image.height()) {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    match color.0[3] {
        0 => {}
        255 => image.put_pixel(x, y, color),
        src_alpha => {
            let dst = *image.get_pixel(x, y);
            image.put_pixel(x, y, src_over(dst, color, src_alpha));
        }
    }
}

fn src_over(dst: Rgba<u8>, src: Rgba<u8>, src_alpha: u8) -> Rgba<u8> {
    let sa = f32::from(src_alpha) / 255.0;
    let da = f32::from(dst.0[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= f32::EPSILON {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |s: u8, d: u8| {
        let value = (f32::from(s) * sa + f32::from(d) * da * (1.0 - sa)) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(src.0[0], dst.0[0]),
        channel(src.0[1], dst.0[1]),
        channel(src.0[2], dst.0[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Inclusive pixel range whose centers fall inside `[min, max]`, clipped to `limit`.
fn covered_range(min: f32, max: f32, limit: u32) -> Option<(u32, u32)> {
    if limit == 0 || !min.is_finite() || !max.is_finite() || max < min {
        return None;
    }
    let first = (min - 0.5).ceil().max(0.0);
    let last = (max - 0.5).floor().min(limit as f32 - 1.0);
    if last < first {
        return None;
    }
    Some((first as u32, last as u32))
}

/// Inclusive pixel range whose centers fall inside the half-open `[min, max)`.
fn half_open_range(min: f32, max: f32, limit: u32) -> Option<(u32, u32)> {
    if limit == 0 || !min.is_finite() || !max.is_finite() || max <= min {
        return None;
    }
    let first = (min - 0.5).ceil().max(0.0);
    let last = ((max - 0.5).ceil() - 1.0).min(limit as f32 - 1.0);
    if last < first {
        return None;
    }
    Some((first as u32, last as u32))
}

fn fill_span(image: &mut RgbaImage, y: u32, x0: u32, x1: u32, color: Rgba<u8>) {
    for x in x0..=x1 {
        blend_pixel(image, i64::from(x), i64::from(y), color);
    }
}

/// Fills the axis-aligned rectangle spanned by two corners.
pub fn fill_rect(image: &mut RgbaImage, a: CanvasPoint, b: CanvasPoint, color: Rgba<u8>) {
    let Some((x0, x1)) = half_open_range(a.x.min(b.x), a.x.max(b.x), image.width()) else {
        return;
    };
    let Some((y0, y1)) = half_open_range(a.y.min(b.y), a.y.max(b.y), image.height()) else {
        return;
    };
    for y in y0..=y1 {
        fill_span(image, y, x0, x1, color);
    }
}

pub fn fill_disc(image: &mut RgbaImage, center: CanvasPoint, radius: f32, color: Rgba<u8>) {
    fill_ellipse(image, center, radius, radius, color);
}

pub fn fill_ellipse(
    image: &mut RgbaImage,
    center: CanvasPoint,
    radius_x: f32,
    radius_y: f32,
    color: Rgba<u8>,
) {
    if radius_x <= 0.0 || radius_y <= 0.0 {
        return;
    }
    let Some((y0, y1)) = covered_range(center.y - radius_y, center.y + radius_y, image.height())
    else {
        return;
    };
    for y in y0..=y1 {
        let dy = (y as f32 + 0.5 - center.y) / radius_y;
        let remaining = 1.0 - dy * dy;
        if remaining < 0.0 {
            continue;
        }
        let half_width = radius_x * remaining.sqrt();
        if let Some((x0, x1)) =
            covered_range(center.x - half_width, center.x + half_width, image.width())
        {
            fill_span(image, y, x0, x1, color);
        }
    }
}

/// Fills a closed polygon using the nonzero winding rule.
pub fn fill_polygon(image: &mut RgbaImage, points: &[CanvasPoint], color: Rgba<u8>) {
    if points.len() < 3 {
        return;
    }
    let (min_y, max_y) = points
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        });
    let Some((y0, y1)) = covered_range(min_y, max_y, image.height()) else {
        return;
    };

    let mut crossings: Vec<(f32, i32)> = Vec::with_capacity(points.len());
    for y in y0..=y1 {
        let sample_y = y as f32 + 0.5;
        crossings.clear();
        for (index, start) in points.iter().enumerate() {
            let end = points[(index + 1) % points.len()];
            if start.y == end.y {
                continue;
            }
            let (top, bottom, direction) = if start.y < end.y {
                (*start, end, 1)
            } else {
                (end, *start, -1)
            };
            if sample_y < top.y || sample_y >= bottom.y {
                continue;
            }
            let t = (sample_y - top.y) / (bottom.y - top.y);
            crossings.push((top.x + t * (bottom.x - top.x), direction));
        }
        crossings.sort_by(|left, right| left.0.total_cmp(&right.0));

        let mut winding = 0;
        for pair in crossings.windows(2) {
            winding += pair[0].1;
            if winding == 0 {
                continue;
            }
            if let Some((x0, x1)) = half_open_range(pair[0].0, pair[1].0, image.width()) {
                fill_span(image, y, x0, x1, color);
            }
        }
    }
}

/// Strokes a segment of the given width; each covered pixel is painted once.
pub fn stroke_line(
    image: &mut RgbaImage,
    a: CanvasPoint,
    b: CanvasPoint,
    width: f32,
    color: Rgba<u8>,
) {
    let half = (width / 2.0).max(0.5);
    let Some((x0, x1)) = covered_range(a.x.min(b.x) - half, a.x.max(b.x) + half, image.width())
    else {
        return;
    };
    let Some((y0, y1)) = covered_range(a.y.min(b.y) - half, a.y.max(b.y) + half, image.height())
    else {
        return;
    };
    for y in y0..=y1 {
        for x in x0..=x1 {
            let sample = CanvasPoint::new(x as f32 + 0.5, y as f32 + 0.5);
            if distance_to_segment(sample, a, b) <= half {
                blend_pixel(image, i64::from(x), i64::from(y), color);
            }
        }
    }
}

fn distance_to_segment(point: CanvasPoint, a: CanvasPoint, b: CanvasPoint) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let length_sq = dx * dx + dy * dy;
    let t = if length_sq <= f32::EPSILON {
        0.0
    } else {
        (((point.x - a.x) * dx + (point.y - a.y) * dy) / length_sq).clamp(0.0, 1.0)
    };
    let (px, py) = (a.x + t * dx - point.x, a.y + t * dy - point.y);
    (px * px + py * py).sqrt()
}

pub fn stroke_polyline(
    image: &mut RgbaImage,
    points: &[CanvasPoint],
    closed: bool,
    width: f32,
    color: Rgba<u8>,
) {
    for pair in points.windows(2) {
        stroke_line(image, pair[0], pair[1], width, color);
    }
    if closed && points.len() > 2 {
        stroke_line(image, points[points.len() - 1], points[0], width, color);
    }
}

pub fn stroke_rect(
    image: &mut RgbaImage,
    a: CanvasPoint,
    b: CanvasPoint,
    width: f32,
    color: Rgba<u8>,
) {
    let corners = [
        CanvasPoint::new(a.x, a.y),
        CanvasPoint::new(b.x, a.y),
        CanvasPoint::new(b.x, b.y),
        CanvasPoint::new(a.x, b.y),
    ];
    stroke_polyline(image, &corners, true, width, color);
}

/// Strokes a ring of `radius` around `center`, `width` pixels thick.
pub fn stroke_circle(
    image: &mut RgbaImage,
    center: CanvasPoint,
    radius: f32,
    width: f32,
    color: Rgba<u8>,
) {
    let half = (width / 2.0).max(0.5);
    let outer = radius + half;
    let Some((x0, x1)) = covered_range(center.x - outer, center.x + outer, image.width()) else {
        return;
    };
    let Some((y0, y1)) = covered_range(center.y - outer, center.y + outer, image.height()) else {
        return;
    };
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f32 + 0.5 - center.x;
            let dy = y as f32 + 0.5 - center.y;
            let distance = (dx * dx + dy * dy).sqrt();
            if (distance - radius).abs() <= half {
                blend_pixel(image, i64::from(x), i64::from(y), color);
            }
        }
    }
}

pub fn stroke_ellipse(
    image: &mut RgbaImage,
    center: CanvasPoint,
    radius_x: f32,
    radius_y: f32,
    width: f32,
    color: Rgba<u8>,
) {
    let outline = (0..ELLIPSE_OUTLINE_SEGMENTS)
        .map(|step| {
            let angle = step as f32 / ELLIPSE_OUTLINE_SEGMENTS as f32 * std::f32::consts::TAU;
            CanvasPoint::new(
                center.x + radius_x * angle.cos(),
                center.y + radius_y * angle.sin(),
            )
        })
        .collect::<Vec<_>>();
    stroke_polyline(image, &outline, true, width, color);
}
