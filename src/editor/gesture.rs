//! Pointer gesture state machine.
//!
//! The active gesture owns its in-progress data, so the state and the
//! collected points can never disagree.

use thiserror::Error;

use super::tools::{CanvasPoint, ToolKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    DrawingBrush,
    DrawingLasso,
    DraggingShape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    BeginBrush,
    BeginLasso,
    BeginShape,
    Commit,
    Cancel,
}

impl GestureEvent {
    const fn begin_for(tool: ToolKind) -> Self {
        match tool {
            ToolKind::Brush => Self::BeginBrush,
            ToolKind::Lasso => Self::BeginLasso,
            ToolKind::Rectangle | ToolKind::Ellipse => Self::BeginShape,
        }
    }
}

#[derive(Debug, Error)]
pub enum GestureError {
    #[error("invalid gesture transition: from {from:?} using event {event:?}")]
    InvalidTransition {
        from: GestureState,
        event: GestureEvent,
    },
}

pub type GestureResult<T> = std::result::Result<T, GestureError>;

/// In-progress gesture data.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Idle,
    Brush {
        last: CanvasPoint,
    },
    Lasso {
        path: Vec<CanvasPoint>,
    },
    Shape {
        tool: ToolKind,
        anchor: CanvasPoint,
        current: CanvasPoint,
    },
}

impl Gesture {
    pub const fn state(&self) -> GestureState {
        match self {
            Self::Idle => GestureState::Idle,
            Self::Brush { .. } => GestureState::DrawingBrush,
            Self::Lasso { .. } => GestureState::DrawingLasso,
            Self::Shape { .. } => GestureState::DraggingShape,
        }
    }
}

#[derive(Debug)]
pub struct GestureMachine {
    gesture: Gesture,
}

impl Default for GestureMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureMachine {
    pub const fn new() -> Self {
        Self {
            gesture: Gesture::Idle,
        }
    }

    pub fn state(&self) -> GestureState {
        self.gesture.state()
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn is_active(&self) -> bool {
        self.state() != GestureState::Idle
    }

    pub fn can_transition(&self, event: GestureEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: GestureEvent) -> Option<GestureState> {
        use GestureEvent::*;
        match (self.state(), event) {
            (GestureState::Idle, BeginBrush) => Some(GestureState::DrawingBrush),
            (GestureState::Idle, BeginLasso) => Some(GestureState::DrawingLasso),
            (GestureState::Idle, BeginShape) => Some(GestureState::DraggingShape),
            (
                GestureState::DrawingBrush
                | GestureState::DrawingLasso
                | GestureState::DraggingShape,
                Commit | Cancel,
            ) => Some(GestureState::Idle),
            _ => None,
        }
    }

    fn check(&self, event: GestureEvent) -> GestureResult<GestureState> {
        tracing::debug!(from = ?self.state(), event = ?event, "request gesture transition");
        self.next_state(event).ok_or_else(|| {
            let from = self.state();
            tracing::warn!(from = ?from, event = ?event, "invalid gesture transition requested");
            GestureError::InvalidTransition { from, event }
        })
    }

    pub fn begin(&mut self, tool: ToolKind, at: CanvasPoint) -> GestureResult<GestureState> {
        self.check(GestureEvent::begin_for(tool))?;
        self.gesture = match tool {
            ToolKind::Brush => Gesture::Brush { last: at },
            ToolKind::Lasso => Gesture::Lasso { path: vec![at] },
            ToolKind::Rectangle | ToolKind::Ellipse => Gesture::Shape {
                tool,
                anchor: at,
                current: at,
            },
        };
        Ok(self.state())
    }

    /// Feeds a pointer sample; returns the previous brush position for brush gestures.
    pub fn update(&mut self, at: CanvasPoint) -> Option<CanvasPoint> {
        match &mut self.gesture {
            Gesture::Idle => None,
            Gesture::Brush { last } => Some(std::mem::replace(last, at)),
            Gesture::Lasso { path } => {
                if path.last() != Some(&at) {
                    path.push(at);
                }
                None
            }
            Gesture::Shape { current, .. } => {
                *current = at;
                None
            }
        }
    }

    /// Ends the gesture, handing back its collected data.
    pub fn commit(&mut self) -> GestureResult<Gesture> {
        self.check(GestureEvent::Commit)?;
        Ok(std::mem::replace(&mut self.gesture, Gesture::Idle))
    }

    pub fn cancel(&mut self) -> GestureResult<Gesture> {
        self.check(GestureEvent::Cancel)?;
        Ok(std::mem::replace(&mut self.gesture, Gesture::Idle))
    }

    pub fn reset(&mut self) {
        self.gesture = Gesture::Idle;
    }
}
