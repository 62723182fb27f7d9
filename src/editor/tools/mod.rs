mod brush;
mod shapes;

pub use crate::geometry::CanvasPoint;
pub use brush::{BrushOptions, BRUSH_SIZE_MAX, BRUSH_SIZE_MIN, BRUSH_SIZE_STEP};
pub use shapes::{
    commit_ellipse, commit_lasso, commit_rect, paint_segment, paint_stroke, ShapeError,
    ShapeResult, LASSO_MIN_POINTS, MIN_SHAPE_SIZE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStyle {
    BrushCircle,
    Crosshair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Brush,
    Lasso,
    Rectangle,
    Ellipse,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [Self::Brush, Self::Lasso, Self::Rectangle, Self::Ellipse];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Brush => "Brush",
            Self::Lasso => "Lasso",
            Self::Rectangle => "Rectangle",
            Self::Ellipse => "Ellipse",
        }
    }

    /// Drag tools that commit a bounding-box shape on release.
    pub const fn is_drag_shape(self) -> bool {
        matches!(self, Self::Rectangle | Self::Ellipse)
    }

    pub const fn cursor_style(self) -> CursorStyle {
        match self {
            Self::Brush => CursorStyle::BrushCircle,
            Self::Lasso | Self::Rectangle | Self::Ellipse => CursorStyle::Crosshair,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorTools {
    active_tool: ToolKind,
    brush_options: BrushOptions,
}

impl Default for EditorTools {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorTools {
    pub const fn new() -> Self {
        Self {
            active_tool: ToolKind::Brush,
            brush_options: BrushOptions::new(),
        }
    }

    pub fn with_brush_size(size: u32) -> Self {
        let mut tools = Self::new();
        tools.set_brush_size(size);
        tools
    }

    pub fn active_tool(&self) -> ToolKind {
        self.active_tool
    }

    pub fn select_tool(&mut self, tool: ToolKind) {
        self.active_tool = tool;
    }

    pub fn brush_options(&self) -> BrushOptions {
        self.brush_options
    }

    pub fn set_brush_size(&mut self, size: u32) {
        self.brush_options.set_size(size);
    }
}
