//! Mask shape engine: turns finished or in-progress gestures into marked pixels.
//!
//! Every operation only ever writes [`MARKED`], so repeated calls accumulate and
//! never clear a pixel that was already marked.

use thiserror::Error;

use super::CanvasPoint;
use crate::raster::draw;
use crate::raster::{MaskBuffer, MARKED};

/// Rectangles and ellipses narrower or shorter than this are ignored.
pub const MIN_SHAPE_SIZE: f32 = 2.0;
pub const LASSO_MIN_POINTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ShapeError {
    #[error("lasso needs at least 3 points, got {points}")]
    TooFewLassoPoints { points: usize },
    #[error("shape {width}x{height} is below the minimum size")]
    DegenerateShape { width: f32, height: f32 },
}

pub type ShapeResult = std::result::Result<(), ShapeError>;

/// Marks a filled disc of `diameter` centered at `point`.
pub fn paint_stroke(mask: &mut MaskBuffer, point: CanvasPoint, diameter: f32) {
    draw::fill_disc(mask.image_mut(), point, diameter / 2.0, MARKED);
}

/// Stamps discs along `from`..`to` so fast pointer motion leaves no gaps.
pub fn paint_segment(mask: &mut MaskBuffer, from: CanvasPoint, to: CanvasPoint, diameter: f32) {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let distance = (dx * dx + dy * dy).sqrt();
    let spacing = (diameter / 4.0).max(1.0);
    let steps = (distance / spacing).ceil().max(1.0) as usize;
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        paint_stroke(
            mask,
            CanvasPoint::new(from.x + dx * t, from.y + dy * t),
            diameter,
        );
    }
}

/// Marks the interior of the polygon closed from `path`'s last point back to its first.
pub fn commit_lasso(mask: &mut MaskBuffer, path: &[CanvasPoint]) -> ShapeResult {
    if path.len() < LASSO_MIN_POINTS {
        return Err(ShapeError::TooFewLassoPoints { points: path.len() });
    }
    draw::fill_polygon(mask.image_mut(), path, MARKED);
    Ok(())
}

pub fn commit_rect(mask: &mut MaskBuffer, a: CanvasPoint, b: CanvasPoint) -> ShapeResult {
    check_shape_size(a, b)?;
    draw::fill_rect(mask.image_mut(), a, b, MARKED);
    Ok(())
}

/// Marks the ellipse inscribed in the box spanned by `a` and `b`.
pub fn commit_ellipse(mask: &mut MaskBuffer, a: CanvasPoint, b: CanvasPoint) -> ShapeResult {
    let (width, height) = check_shape_size(a, b)?;
    draw::fill_ellipse(
        mask.image_mut(),
        a.midpoint(b),
        width / 2.0,
        height / 2.0,
        MARKED,
    );
    Ok(())
}

fn check_shape_size(a: CanvasPoint, b: CanvasPoint) -> Result<(f32, f32), ShapeError> {
    let width = (b.x - a.x).abs();
    let height = (b.y - a.y).abs();
    if width < MIN_SHAPE_SIZE || height < MIN_SHAPE_SIZE {
        return Err(ShapeError::DegenerateShape { width, height });
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::CanvasSize;

    fn mask(side: u32) -> MaskBuffer {
        MaskBuffer::new(CanvasSize::square(side))
    }

    fn marked_pixels(mask: &MaskBuffer) -> Vec<(u32, u32)> {
        let size = mask.size();
        (0..size.height)
            .flat_map(|y| (0..size.width).map(move |x| (x, y)))
            .filter(|&(x, y)| mask.is_marked(x, y))
            .collect()
    }

    #[test]
    fn operations_within_a_gesture_never_unmark_pixels() {
        let mut mask = mask(128);
        paint_stroke(&mut mask, CanvasPoint::new(30.0, 30.0), 20.0);
        let after_stroke = marked_pixels(&mask);

        paint_segment(
            &mut mask,
            CanvasPoint::new(30.0, 30.0),
            CanvasPoint::new(90.0, 40.0),
            10.0,
        );
        commit_rect(
            &mut mask,
            CanvasPoint::new(25.0, 25.0),
            CanvasPoint::new(60.0, 70.0),
        )
        .expect("rectangle is large enough");
        commit_ellipse(
            &mut mask,
            CanvasPoint::new(0.0, 0.0),
            CanvasPoint::new(40.0, 20.0),
        )
        .expect("ellipse is large enough");

        for (x, y) in after_stroke {
            assert!(mask.is_marked(x, y), "({x}, {y}) was unmarked");
        }
    }

    #[test]
    fn remarking_is_idempotent() {
        let mut mask = mask(64);
        commit_rect(
            &mut mask,
            CanvasPoint::new(4.0, 4.0),
            CanvasPoint::new(20.0, 20.0),
        )
        .expect("rectangle is large enough");
        let once = mask.clone();
        commit_rect(
            &mut mask,
            CanvasPoint::new(4.0, 4.0),
            CanvasPoint::new(20.0, 20.0),
        )
        .expect("rectangle is large enough");
        assert_eq!(mask, once);
    }

    #[test]
    fn lasso_with_two_points_is_a_noop() {
        let mut mask = mask(32);
        let err = commit_lasso(
            &mut mask,
            &[CanvasPoint::new(1.0, 1.0), CanvasPoint::new(20.0, 20.0)],
        )
        .expect_err("two points cannot enclose an area");
        assert_eq!(err, ShapeError::TooFewLassoPoints { points: 2 });
        assert!(mask.is_clear());
    }

    #[test]
    fn lasso_closes_path_back_to_first_point() {
        let mut mask = mask(32);
        let path = [
            CanvasPoint::new(4.0, 4.0),
            CanvasPoint::new(28.0, 4.0),
            CanvasPoint::new(28.0, 28.0),
            CanvasPoint::new(4.0, 28.0),
        ];
        commit_lasso(&mut mask, &path).expect("square lasso is valid");
        assert!(mask.is_marked(5, 27));
        assert!(mask.is_marked(16, 16));
        assert!(!mask.is_marked(2, 16));
        assert_eq!(mask.marked_count(), 24 * 24);
    }

    #[test]
    fn degenerate_rectangles_and_ellipses_are_noops() {
        let mut mask = mask(32);
        let thin = commit_rect(
            &mut mask,
            CanvasPoint::new(4.0, 4.0),
            CanvasPoint::new(5.5, 30.0),
        );
        assert!(matches!(thin, Err(ShapeError::DegenerateShape { .. })));
        let flat = commit_ellipse(
            &mut mask,
            CanvasPoint::new(4.0, 4.0),
            CanvasPoint::new(30.0, 4.0),
        );
        assert!(matches!(flat, Err(ShapeError::DegenerateShape { .. })));
        assert!(mask.is_clear());
    }

    #[test]
    fn ellipse_is_inscribed_in_drag_box() {
        let mut mask = mask(64);
        commit_ellipse(
            &mut mask,
            CanvasPoint::new(60.0, 40.0),
            CanvasPoint::new(10.0, 10.0),
        )
        .expect("ellipse is large enough");
        let bounds = mask.bounds().expect("ellipse marks pixels");
        assert!(bounds.min_x >= 10 && bounds.max_x < 60);
        assert!(bounds.min_y >= 10 && bounds.max_y < 40);
        assert!(mask.is_marked(35, 25));
        assert!(!mask.is_marked(11, 11));
    }

    #[test]
    fn brush_stroke_marks_disc_of_configured_diameter() {
        let mut mask = mask(1024);
        paint_stroke(&mut mask, CanvasPoint::new(500.0, 500.0), 40.0);
        let bounds = mask.bounds().expect("stroke marks pixels");
        assert_eq!((bounds.min_x, bounds.max_x), (480, 519));
        assert_eq!((bounds.min_y, bounds.max_y), (480, 519));
    }
}
