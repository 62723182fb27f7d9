//! Inpaint orchestrator: one debounced, single-flight backend request cycle
//! at a time, composited back into the editor through the mask.

pub mod backend;
pub mod composite;
pub mod scheduler;
pub mod worker;

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;
use thiserror::Error;

use crate::editor::EditorState;
use crate::geometry::Region;
use crate::raster::{codec, RasterError, RasterResult};
use crate::region::{self, RegionPolicy};
use crate::status::{STATUS_INPAINTING, STATUS_READY, STATUS_WAITING_FOR_BACKEND};

pub use backend::{
    BackendError, BackendResult, EditParams, EditRequest, HttpBackend, InpaintBackend,
};
pub use scheduler::{
    Clock, DebouncedSingleFlight, FirePoll, FlightPermit, SystemClock, DEFAULT_DEBOUNCE,
};
pub use worker::{spawn_worker, WorkerHandle, WorkerPoll, RESULT_POLL_INTERVAL};

const STATUS_STALE_RESULT: &str = "Discarded result for a previous image";

#[derive(Debug, Error)]
pub enum InpaintError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("could not decode result image: {0}")]
    Decode(#[from] RasterError),
    #[error("inpaint worker stopped without a result")]
    WorkerLost,
}

impl InpaintError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Backend(err) if err.is_connectivity())
    }
}

pub type InpaintResult<T> = std::result::Result<T, InpaintError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InpaintPhase {
    Idle,
    Debouncing,
    Requesting,
    Compositing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    NoImage,
    BackendDown,
    EmptyMask,
}

/// Something observable that happened during a [`InpaintOrchestrator::tick`].
#[derive(Debug, Clone, PartialEq)]
pub enum CycleEvent {
    /// A request left for the backend; `None` means the full canvas was sent.
    Dispatched { region: Option<Region> },
    Applied { region: Region, latency: Duration },
    Failed { connectivity: bool },
    /// The debounce expired while a request was still in flight.
    DroppedInFlight,
    Suppressed(SuppressReason),
    /// The document changed underneath the request; its result was thrown away.
    StaleDiscarded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub debounce: Duration,
    pub policy: RegionPolicy,
    pub params: EditParams,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            policy: RegionPolicy::default(),
            params: EditParams::default(),
        }
    }
}

struct PendingRequest {
    handle: WorkerHandle<InpaintResult<RgbaImage>>,
    // Held until the request is finished; dropping it reopens the single flight.
    _permit: FlightPermit,
    region: Region,
    generation: u64,
    started: Instant,
}

pub struct InpaintOrchestrator<B: InpaintBackend, C: Clock = SystemClock> {
    backend: Arc<B>,
    executor: DebouncedSingleFlight<C>,
    policy: RegionPolicy,
    params: EditParams,
    backend_ready: bool,
    phase: InpaintPhase,
    pending: Option<PendingRequest>,
}

impl<B: InpaintBackend> InpaintOrchestrator<B, SystemClock> {
    pub fn new(backend: Arc<B>, settings: OrchestratorSettings) -> Self {
        Self::with_clock(backend, settings, SystemClock)
    }
}

impl<B: InpaintBackend, C: Clock> InpaintOrchestrator<B, C> {
    pub fn with_clock(backend: Arc<B>, settings: OrchestratorSettings, clock: C) -> Self {
        Self {
            backend,
            executor: DebouncedSingleFlight::with_clock(clock, settings.debounce),
            policy: settings.policy,
            params: settings.params,
            backend_ready: true,
            phase: InpaintPhase::Idle,
            pending: None,
        }
    }

    pub fn phase(&self) -> InpaintPhase {
        self.phase
    }

    pub fn in_flight(&self) -> bool {
        self.executor.in_flight()
    }

    /// True when nothing is pending or in flight.
    pub fn is_idle(&self) -> bool {
        self.pending.is_none() && !self.executor.is_pending()
    }

    pub fn backend_ready(&self) -> bool {
        self.backend_ready
    }

    pub fn params(&self) -> &EditParams {
        &self.params
    }

    pub fn set_params(&mut self, params: EditParams) {
        self.params = params;
    }

    /// Starts or restarts the debounce window after a completed gesture.
    pub fn schedule(&mut self) {
        self.executor.trigger();
        if self.pending.is_none() {
            self.transition(InpaintPhase::Debouncing);
        }
        tracing::debug!(delay_ms = self.executor.delay().as_millis() as u64, "inpaint scheduled");
    }

    pub fn cancel_scheduled(&mut self) {
        self.executor.cancel();
        if self.pending.is_none() {
            self.transition(InpaintPhase::Idle);
        }
    }

    /// Readiness notification from an external health probe.
    pub fn set_backend_ready(&mut self, ready: bool, editor: &mut EditorState) {
        if self.backend_ready == ready {
            return;
        }
        self.backend_ready = ready;
        tracing::info!(ready, "inpaint backend readiness changed");
        if self.pending.is_some() {
            return;
        }
        if !ready {
            editor.status_mut().set(STATUS_WAITING_FOR_BACKEND);
        } else if editor.status().text() == STATUS_WAITING_FOR_BACKEND {
            editor.status_mut().set(STATUS_READY);
        }
    }

    /// Advances the cycle: collects a finished request first, then fires an expired debounce.
    pub fn tick(&mut self, editor: &mut EditorState) -> Vec<CycleEvent> {
        let mut events = Vec::new();

        let polled = self.pending.as_ref().map(|pending| pending.handle.try_take());
        match polled {
            None | Some(WorkerPoll::Pending) => {}
            Some(WorkerPoll::Ready(result)) => {
                if let Some(pending) = self.pending.take() {
                    events.push(self.finish(editor, pending, result));
                }
            }
            Some(WorkerPoll::Lost) => {
                if let Some(pending) = self.pending.take() {
                    events.push(self.finish(editor, pending, Err(InpaintError::WorkerLost)));
                }
            }
        }

        match self.executor.poll() {
            FirePoll::Quiet | FirePoll::Waiting(_) => {}
            FirePoll::Dropped => {
                tracing::warn!("inpaint trigger dropped; a request is already in flight");
                events.push(CycleEvent::DroppedInFlight);
            }
            FirePoll::Fire(permit) => events.push(self.dispatch(editor, permit)),
        }

        events
    }

    fn dispatch(&mut self, editor: &mut EditorState, permit: FlightPermit) -> CycleEvent {
        let suppressed = if !editor.image_loaded() {
            Some(SuppressReason::NoImage)
        } else if !self.backend_ready {
            editor.status_mut().set(STATUS_WAITING_FOR_BACKEND);
            Some(SuppressReason::BackendDown)
        } else if editor.raster().mask().is_clear() {
            Some(SuppressReason::EmptyMask)
        } else {
            None
        };
        if let Some(reason) = suppressed {
            tracing::debug!(?reason, "inpaint fire suppressed");
            self.transition(InpaintPhase::Idle);
            return CycleEvent::Suppressed(reason);
        }

        let selected = region::select_region(editor.raster().mask(), &self.policy);
        let region = selected.unwrap_or_else(|| editor.canvas_size().full_region());
        let request = match self.build_request(editor, region) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(error = %err, ?region, "failed to prepare inpaint request");
                editor.status_mut().set(format!("Error: {err}"));
                self.transition(InpaintPhase::Idle);
                return CycleEvent::Failed {
                    connectivity: false,
                };
            }
        };

        let backend = Arc::clone(&self.backend);
        let handle = spawn_worker(move || -> InpaintResult<RgbaImage> {
            let bytes = backend.edit(&request)?;
            Ok(codec::decode_image(&bytes)?)
        });

        tracing::info!(
            ?region,
            full_canvas = selected.is_none(),
            generation = editor.generation(),
            "inpaint request dispatched"
        );
        editor.status_mut().set_busy(STATUS_INPAINTING);
        self.pending = Some(PendingRequest {
            handle,
            _permit: permit,
            region,
            generation: editor.generation(),
            started: self.executor.clock().now(),
        });
        self.transition(InpaintPhase::Requesting);
        CycleEvent::Dispatched { region: selected }
    }

    fn build_request(&self, editor: &EditorState, region: Region) -> RasterResult<EditRequest> {
        let raster = editor.raster();
        let image = raster.crop_clean(region)?;
        let mask = raster.crop_mask(region)?;
        Ok(EditRequest {
            image_png: codec::encode_png(&image)?,
            mask_png: codec::encode_png(&mask)?,
            width: region.width,
            height: region.height,
            params: self.params.clone(),
        })
    }

    fn finish(
        &mut self,
        editor: &mut EditorState,
        pending: PendingRequest,
        result: InpaintResult<RgbaImage>,
    ) -> CycleEvent {
        let latency = self
            .executor
            .clock()
            .now()
            .saturating_duration_since(pending.started);
        let region = pending.region;

        let event = if pending.generation != editor.generation() {
            tracing::info!(
                requested = pending.generation,
                current = editor.generation(),
                "discarding inpaint result for a previous document"
            );
            if editor.image_loaded() {
                editor.status_mut().set(STATUS_STALE_RESULT);
            }
            CycleEvent::StaleDiscarded
        } else {
            match result {
                Ok(image) => self.composite(editor, region, image, latency),
                Err(err) => {
                    let connectivity = err.is_connectivity();
                    tracing::warn!(
                        error = %err,
                        connectivity,
                        elapsed_ms = latency.as_millis() as u64,
                        "inpaint request failed"
                    );
                    editor.status_mut().set(failure_status(&err));
                    CycleEvent::Failed { connectivity }
                }
            }
        };

        drop(pending);
        let next = if self.executor.is_pending() {
            InpaintPhase::Debouncing
        } else {
            InpaintPhase::Idle
        };
        self.transition(next);
        event
    }

    fn composite(
        &mut self,
        editor: &mut EditorState,
        region: Region,
        image: RgbaImage,
        latency: Duration,
    ) -> CycleEvent {
        self.transition(InpaintPhase::Compositing);
        let fitted = codec::fit_to(image, region.width, region.height);
        match editor.apply_inpaint_result(region, &fitted) {
            Ok(()) => {
                tracing::info!(
                    ?region,
                    elapsed_ms = latency.as_millis() as u64,
                    "inpaint result applied"
                );
                editor.status_mut().set_with_latency(STATUS_READY, latency);
                CycleEvent::Applied { region, latency }
            }
            Err(err) => {
                tracing::warn!(error = %err, ?region, "failed to composite inpaint result");
                editor.status_mut().set(format!("Error: {err}"));
                CycleEvent::Failed {
                    connectivity: false,
                }
            }
        }
    }

    fn transition(&mut self, next: InpaintPhase) {
        if self.phase != next {
            tracing::debug!(from = ?self.phase, to = ?next, "inpaint phase transition");
            self.phase = next;
        }
    }
}

fn failure_status(err: &InpaintError) -> String {
    match err {
        InpaintError::Backend(BackendError::Connectivity { endpoint, .. }) => {
            format!("Connection error: is the inpaint server running? ({endpoint})")
        }
        other => format!("Error: {other}"),
    }
}
