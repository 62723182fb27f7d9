pub const BRUSH_SIZE_MIN: u32 = 5;
pub const BRUSH_SIZE_MAX: u32 = 150;
pub const BRUSH_SIZE_STEP: u32 = 5;
const DEFAULT_BRUSH_SIZE: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrushOptions {
    /// Brush diameter in canvas pixels.
    pub size: u32,
}

impl Default for BrushOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl BrushOptions {
    pub const fn new() -> Self {
        Self {
            size: DEFAULT_BRUSH_SIZE,
        }
    }

    pub fn set_size(&mut self, size: u32) {
        self.size = snap_to_step(clamp_u32_range(size, BRUSH_SIZE_MIN, BRUSH_SIZE_MAX));
    }

    pub fn diameter(&self) -> f32 {
        self.size as f32
    }
}

const fn clamp_u32_range(value: u32, min: u32, max: u32) -> u32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

const fn snap_to_step(value: u32) -> u32 {
    let snapped = (value + BRUSH_SIZE_STEP / 2) / BRUSH_SIZE_STEP * BRUSH_SIZE_STEP;
    clamp_u32_range(snapped, BRUSH_SIZE_MIN, BRUSH_SIZE_MAX)
}
