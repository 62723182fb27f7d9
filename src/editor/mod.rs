//! Editor state: the single owner of the canvas buffers, undo history, tool
//! selection and the pointer gesture in progress.

pub mod gesture;
pub mod history;
pub mod tools;

use image::{DynamicImage, RgbaImage};

use crate::geometry::{CanvasPoint, CanvasSize, Region};
use crate::inpaint::composite;
use crate::raster::{codec, RasterResult, RasterStore};
use crate::render::{self, CursorMark, FrameOverlays, ToolPreview};
use crate::status::{StatusLine, STATUS_READY, STATUS_RESET};

pub use gesture::{Gesture, GestureError, GestureMachine, GestureResult, GestureState};
pub use history::{EditHistory, UndoOutcome, DEFAULT_HISTORY_CAPACITY};
pub use tools::{EditorTools, ShapeError, ToolKind};

pub const DEFAULT_CANVAS_SIDE: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorSettings {
    pub canvas: CanvasSize,
    pub history_capacity: usize,
    pub brush_size: u32,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::square(DEFAULT_CANVAS_SIDE),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            brush_size: tools::BrushOptions::new().size,
        }
    }
}

/// What a pointer event did to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Nothing happened: no image, outside the canvas, or no gesture active.
    Ignored,
    InProgress,
    /// The mask changed; an inpaint cycle should be scheduled.
    Completed,
    /// The gesture ended without touching the mask and its snapshot was rolled back.
    Discarded,
}

impl GestureOutcome {
    pub const fn should_schedule_inpaint(self) -> bool {
        matches!(self, Self::Completed)
    }
}

#[derive(Debug)]
pub struct EditorState {
    raster: RasterStore,
    history: EditHistory,
    tools: EditorTools,
    gestures: GestureMachine,
    cursor: Option<CanvasPoint>,
    image_loaded: bool,
    unsaved_changes: bool,
    generation: u64,
    status: StatusLine,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}

impl EditorState {
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            raster: RasterStore::new(settings.canvas),
            history: EditHistory::with_capacity(settings.history_capacity),
            tools: EditorTools::with_brush_size(settings.brush_size),
            gestures: GestureMachine::new(),
            cursor: None,
            image_loaded: false,
            unsaved_changes: false,
            generation: 0,
            status: StatusLine::default(),
        }
    }

    pub fn raster(&self) -> &RasterStore {
        &self.raster
    }

    pub fn canvas_size(&self) -> CanvasSize {
        self.raster.size()
    }

    pub fn image_loaded(&self) -> bool {
        self.image_loaded
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved_changes
    }

    pub fn mark_saved(&mut self) {
        self.unsaved_changes = false;
    }

    /// Increments whenever the clean image is replaced by something other than a composite.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut StatusLine {
        &mut self.status
    }

    pub fn active_tool(&self) -> ToolKind {
        self.tools.active_tool()
    }

    pub fn brush_size(&self) -> u32 {
        self.tools.brush_options().size
    }

    pub fn gesture_state(&self) -> GestureState {
        self.gestures.state()
    }

    pub fn is_drawing(&self) -> bool {
        self.gestures.is_active()
    }

    pub fn cursor(&self) -> Option<CanvasPoint> {
        self.cursor
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn history_depth(&self) -> usize {
        self.history.depth()
    }

    pub fn load_image(&mut self, source: &DynamicImage) -> RasterResult<()> {
        self.gestures.reset();
        self.raster.load(source)?;
        self.history.clear();
        self.image_loaded = true;
        self.unsaved_changes = false;
        self.bump_generation();
        self.status.set(STATUS_READY);
        tracing::info!(
            source_width = source.width(),
            source_height = source.height(),
            generation = self.generation,
            "image loaded"
        );
        Ok(())
    }

    pub fn reset(&mut self) {
        self.gestures.reset();
        self.raster.blank();
        self.history.clear();
        self.cursor = None;
        self.image_loaded = false;
        self.unsaved_changes = false;
        self.bump_generation();
        self.status.set(STATUS_RESET);
        tracing::info!(generation = self.generation, "editor reset");
    }

    /// Switches tools; a gesture in progress ends the same way a pointer leave would.
    pub fn select_tool(&mut self, tool: ToolKind) -> GestureOutcome {
        let outcome = if self.gestures.is_active() {
            self.end_gesture_on_leave()
        } else {
            GestureOutcome::Ignored
        };
        self.tools.select_tool(tool);
        tracing::debug!(tool = tool.label(), "tool selected");
        outcome
    }

    pub fn set_brush_size(&mut self, size: u32) {
        self.tools.set_brush_size(size);
    }

    pub fn pointer_down(&mut self, point: CanvasPoint) -> GestureOutcome {
        if !self.image_loaded || !self.canvas_size().contains(point) {
            return GestureOutcome::Ignored;
        }
        let tool = self.tools.active_tool();
        self.history.snapshot(self.raster.clean());
        if let Err(err) = self.gestures.begin(tool, point) {
            self.history.discard_last();
            tracing::debug!(error = %err, "pointer down ignored");
            return GestureOutcome::Ignored;
        }
        self.cursor = Some(point);
        if tool == ToolKind::Brush {
            let diameter = self.tools.brush_options().diameter();
            tools::paint_stroke(self.raster.mask_mut(), point, diameter);
        }
        GestureOutcome::InProgress
    }

    pub fn pointer_move(&mut self, point: CanvasPoint) -> GestureOutcome {
        self.cursor = Some(point);
        if !self.gestures.is_active() {
            return GestureOutcome::Ignored;
        }
        self.feed_gesture(point);
        GestureOutcome::InProgress
    }

    pub fn pointer_up(&mut self, point: CanvasPoint) -> GestureOutcome {
        if !self.gestures.is_active() {
            return GestureOutcome::Ignored;
        }
        self.feed_gesture(point);
        match self.gestures.commit() {
            Ok(gesture) => self.apply_finished_gesture(gesture),
            Err(err) => {
                tracing::warn!(error = %err, "pointer up without gesture");
                GestureOutcome::Ignored
            }
        }
    }

    pub fn pointer_leave(&mut self) -> GestureOutcome {
        self.cursor = None;
        if !self.gestures.is_active() {
            return GestureOutcome::Ignored;
        }
        self.end_gesture_on_leave()
    }

    pub fn undo(&mut self) -> RasterResult<UndoOutcome> {
        if self.gestures.is_active() {
            self.abandon_gesture();
        }
        let Some(snapshot) = self.history.pop() else {
            self.status.set(UndoOutcome::NothingToUndo.message());
            return Ok(UndoOutcome::NothingToUndo);
        };
        self.raster.replace_clean(snapshot)?;
        self.raster.mask_mut().clear();
        self.unsaved_changes = true;
        self.bump_generation();
        self.status.set(UndoOutcome::Applied.message());
        tracing::debug!(remaining = self.history.depth(), "undo applied");
        Ok(UndoOutcome::Applied)
    }

    /// Writes backend output into the clean image through the current mask, then clears the mask.
    pub fn apply_inpaint_result(&mut self, region: Region, result: &RgbaImage) -> RasterResult<()> {
        self.raster.check_region(region)?;
        let (clean, mask) = self.raster.clean_and_mask_mut();
        composite::apply_stencil(clean, mask, result, region)?;
        self.raster.mask_mut().clear();
        self.unsaved_changes = true;
        Ok(())
    }

    pub fn export_png(&self) -> RasterResult<Vec<u8>> {
        codec::encode_png(self.raster.clean())
    }

    /// Recomposes the display surface from the clean image and current overlays.
    pub fn redraw(&mut self, inpaint_in_flight: bool) {
        let overlays = FrameOverlays {
            tint_mask: self.gestures.is_active() || inpaint_in_flight,
            preview: self.tool_preview(),
            cursor: self.cursor_mark(),
        };
        let (clean, mask, display) = self.raster.sources_and_display_mut();
        render::render_frame(clean, mask, &overlays, display);
    }

    fn feed_gesture(&mut self, point: CanvasPoint) {
        if let Some(previous) = self.gestures.update(point) {
            let diameter = self.tools.brush_options().diameter();
            tools::paint_segment(self.raster.mask_mut(), previous, point, diameter);
        }
    }

    fn end_gesture_on_leave(&mut self) -> GestureOutcome {
        match self.gestures.state() {
            GestureState::Idle => GestureOutcome::Ignored,
            GestureState::DrawingBrush | GestureState::DrawingLasso => {
                match self.gestures.commit() {
                    Ok(gesture) => self.apply_finished_gesture(gesture),
                    Err(_) => GestureOutcome::Ignored,
                }
            }
            GestureState::DraggingShape => self.abandon_gesture(),
        }
    }

    fn abandon_gesture(&mut self) -> GestureOutcome {
        match self.gestures.cancel() {
            Ok(_) => {
                self.history.discard_last();
                tracing::debug!(depth = self.history.depth(), "gesture cancelled");
                GestureOutcome::Discarded
            }
            Err(_) => GestureOutcome::Ignored,
        }
    }

    fn apply_finished_gesture(&mut self, gesture: Gesture) -> GestureOutcome {
        let committed = match gesture {
            Gesture::Idle => return GestureOutcome::Ignored,
            Gesture::Brush { .. } => Ok(()),
            Gesture::Lasso { path } => tools::commit_lasso(self.raster.mask_mut(), &path),
            Gesture::Shape {
                tool: ToolKind::Ellipse,
                anchor,
                current,
            } => tools::commit_ellipse(self.raster.mask_mut(), anchor, current),
            Gesture::Shape {
                anchor, current, ..
            } => tools::commit_rect(self.raster.mask_mut(), anchor, current),
        };
        match committed {
            Ok(()) => {
                self.history.evict_overflow();
                GestureOutcome::Completed
            }
            Err(err) => {
                self.history.discard_last();
                tracing::debug!(reason = %err, "gesture produced no mask change");
                GestureOutcome::Discarded
            }
        }
    }

    fn tool_preview(&self) -> Option<ToolPreview> {
        match self.gestures.gesture() {
            Gesture::Idle | Gesture::Brush { .. } => None,
            Gesture::Lasso { path } => Some(ToolPreview::Lasso(path.clone())),
            Gesture::Shape {
                tool: ToolKind::Ellipse,
                anchor,
                current,
            } => Some(ToolPreview::Ellipse {
                anchor: *anchor,
                current: *current,
            }),
            Gesture::Shape {
                anchor, current, ..
            } => Some(ToolPreview::Rectangle {
                anchor: *anchor,
                current: *current,
            }),
        }
    }

    fn cursor_mark(&self) -> Option<CursorMark> {
        if !self.image_loaded {
            return None;
        }
        let center = self.cursor?;
        Some(match self.tools.active_tool().cursor_style() {
            tools::CursorStyle::BrushCircle => CursorMark::Brush {
                center,
                diameter: self.tools.brush_options().diameter(),
            },
            tools::CursorStyle::Crosshair => CursorMark::Crosshair { center },
        })
    }

    fn bump_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}
