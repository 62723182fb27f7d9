//! Application controller: the one object a UI shell or the CLI drives.
//!
//! Pointer input arrives in view coordinates and is mapped into canvas space
//! here. Every state change redraws the display buffer.

use std::sync::Arc;

use image::{DynamicImage, RgbaImage};

use crate::config::Settings;
use crate::editor::{EditorState, GestureOutcome, ToolKind, UndoOutcome};
use crate::error::AppResult;
use crate::geometry::{CanvasPoint, ViewTransform};
use crate::inpaint::{
    Clock, CycleEvent, HttpBackend, InpaintBackend, InpaintOrchestrator, SystemClock,
};
use crate::raster::codec;
use crate::status::StatusLine;

pub struct App<B: InpaintBackend, C: Clock = SystemClock> {
    editor: EditorState,
    inpaint: InpaintOrchestrator<B, C>,
    view: ViewTransform,
}

impl App<HttpBackend, SystemClock> {
    pub fn from_settings(settings: &Settings) -> Self {
        let backend = Arc::new(HttpBackend::new(
            settings.endpoint.clone(),
            settings.request_timeout,
        ));
        tracing::info!(
            endpoint = %settings.endpoint,
            timeout_secs = settings.request_timeout.as_secs(),
            canvas = settings.editor.canvas.width,
            "initialising editor"
        );
        Self::with_parts(
            EditorState::new(settings.editor),
            InpaintOrchestrator::new(backend, settings.orchestrator.clone()),
        )
    }
}

impl<B: InpaintBackend, C: Clock> App<B, C> {
    pub fn with_parts(editor: EditorState, inpaint: InpaintOrchestrator<B, C>) -> Self {
        Self {
            editor,
            inpaint,
            view: ViewTransform::identity(),
        }
    }

    pub fn editor(&self) -> &EditorState {
        &self.editor
    }

    pub fn inpaint(&self) -> &InpaintOrchestrator<B, C> {
        &self.inpaint
    }

    pub fn status(&self) -> &StatusLine {
        self.editor.status()
    }

    pub fn display(&self) -> &RgbaImage {
        self.editor.raster().display()
    }

    pub fn set_view(&mut self, view: ViewTransform) {
        self.view = view;
    }

    pub fn fit_view(&mut self, view_width: f32, view_height: f32) {
        self.view = ViewTransform::fit(self.editor.canvas_size(), view_width, view_height);
    }

    pub fn view_to_canvas(&self, view_x: f32, view_y: f32) -> CanvasPoint {
        self.view.to_canvas(view_x, view_y)
    }

    pub fn open_image(&mut self, source: &DynamicImage) -> AppResult<()> {
        self.inpaint.cancel_scheduled();
        self.editor.load_image(source)?;
        self.redraw();
        Ok(())
    }

    /// Decodes encoded image bytes handed over by a file picker or drop target.
    pub fn open_image_bytes(&mut self, bytes: &[u8]) -> AppResult<()> {
        let decoded = codec::decode_image(bytes)?;
        self.open_image(&DynamicImage::ImageRgba8(decoded))
    }

    pub fn pointer_down(&mut self, view_x: f32, view_y: f32) -> GestureOutcome {
        let point = self.view_to_canvas(view_x, view_y);
        let outcome = self.editor.pointer_down(point);
        self.after_gesture(outcome)
    }

    pub fn pointer_move(&mut self, view_x: f32, view_y: f32) -> GestureOutcome {
        let point = self.view_to_canvas(view_x, view_y);
        let outcome = self.editor.pointer_move(point);
        self.after_gesture(outcome)
    }

    pub fn pointer_up(&mut self, view_x: f32, view_y: f32) -> GestureOutcome {
        let point = self.view_to_canvas(view_x, view_y);
        let outcome = self.editor.pointer_up(point);
        self.after_gesture(outcome)
    }

    pub fn pointer_leave(&mut self) -> GestureOutcome {
        let outcome = self.editor.pointer_leave();
        self.after_gesture(outcome)
    }

    pub fn select_tool(&mut self, tool: ToolKind) -> GestureOutcome {
        let outcome = self.editor.select_tool(tool);
        self.after_gesture(outcome)
    }

    pub fn set_brush_size(&mut self, size: u32) {
        self.editor.set_brush_size(size);
        self.redraw();
    }

    pub fn undo(&mut self) -> AppResult<UndoOutcome> {
        let outcome = self.editor.undo()?;
        if outcome == UndoOutcome::Applied {
            self.inpaint.cancel_scheduled();
        }
        self.redraw();
        Ok(outcome)
    }

    pub fn reset(&mut self) {
        self.inpaint.cancel_scheduled();
        self.editor.reset();
        self.redraw();
    }

    pub fn export_png(&mut self) -> AppResult<Vec<u8>> {
        let bytes = self.editor.export_png()?;
        self.editor.mark_saved();
        Ok(bytes)
    }

    pub fn set_backend_ready(&mut self, ready: bool) {
        self.inpaint.set_backend_ready(ready, &mut self.editor);
    }

    /// Drives timers and request completion; call from the UI loop.
    pub fn tick(&mut self) -> Vec<CycleEvent> {
        let events = self.inpaint.tick(&mut self.editor);
        if !events.is_empty() {
            self.redraw();
        }
        events
    }

    pub fn is_idle(&self) -> bool {
        self.inpaint.is_idle() && !self.editor.is_drawing()
    }

    fn after_gesture(&mut self, outcome: GestureOutcome) -> GestureOutcome {
        if outcome.should_schedule_inpaint() {
            self.inpaint.schedule();
        }
        self.redraw();
        outcome
    }

    fn redraw(&mut self) {
        let in_flight = self.inpaint.in_flight();
        self.editor.redraw(in_flight);
    }
}
