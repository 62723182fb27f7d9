//! Shared geometric primitives used across raster, editor and inpaint modules.
//!
//! Every buffer lives in canvas space. Pointer input arrives in view space and
//! is mapped back through [`ViewTransform`] before it touches a buffer.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasPoint {
    pub x: f32,
    pub y: f32,
}

impl CanvasPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    pub const fn full_region(self) -> Region {
        Region::new(0, 0, self.width, self.height)
    }

    pub const fn shorter_side(self) -> u32 {
        if self.width < self.height {
            self.width
        } else {
            self.height
        }
    }

    pub fn contains(self, point: CanvasPoint) -> bool {
        point.x >= 0.0
            && point.y >= 0.0
            && point.x < self.width as f32
            && point.y < self.height as f32
    }
}

/// Axis-aligned pixel rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub const fn fits_within(&self, size: CanvasSize) -> bool {
        self.right() <= size.width && self.bottom() <= size.height
    }

    pub fn size_label(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    zoom: f32,
    pan_x: f32,
    pan_y: f32,
}

const VIEW_ZOOM_MIN: f32 = 0.05;
const VIEW_ZOOM_MAX: f32 = 16.0;

impl Default for ViewTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ViewTransform {
    pub const fn identity() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }

    pub fn new(zoom: f32, pan_x: f32, pan_y: f32) -> Self {
        Self {
            zoom: zoom.clamp(VIEW_ZOOM_MIN, VIEW_ZOOM_MAX),
            pan_x,
            pan_y,
        }
    }

    /// Fits `canvas` inside a `view_width`×`view_height` widget, centered.
    pub fn fit(canvas: CanvasSize, view_width: f32, view_height: f32) -> Self {
        if canvas.width == 0 || canvas.height == 0 || view_width <= 0.0 || view_height <= 0.0 {
            return Self::identity();
        }
        let zoom = (view_width / canvas.width as f32).min(view_height / canvas.height as f32);
        let zoom = zoom.clamp(VIEW_ZOOM_MIN, VIEW_ZOOM_MAX);
        let pan_x = (view_width - canvas.width as f32 * zoom) / 2.0;
        let pan_y = (view_height - canvas.height as f32 * zoom) / 2.0;
        Self { zoom, pan_x, pan_y }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn to_canvas(&self, view_x: f32, view_y: f32) -> CanvasPoint {
        CanvasPoint::new(
            (view_x - self.pan_x) / self.zoom,
            (view_y - self.pan_y) / self.zoom,
        )
    }

    pub fn to_view(&self, point: CanvasPoint) -> (f32, f32) {
        (
            point.x * self.zoom + self.pan_x,
            point.y * self.zoom + self.pan_y,
        )
    }
}
