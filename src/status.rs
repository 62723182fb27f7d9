use std::time::Duration;

pub const STATUS_READY: &str = "Ready";
pub const STATUS_INPAINTING: &str = "Inpainting...";
pub const STATUS_RESET: &str = "Reset";
pub const STATUS_WAITING_FOR_BACKEND: &str = "Waiting for inpaint server...";
pub const STATUS_NO_IMAGE: &str = "Open an image to start";

/// User-facing status bar: message, busy spinner and last request latency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    text: String,
    busy: bool,
    latency: Option<Duration>,
}

impl Default for StatusLine {
    fn default() -> Self {
        Self {
            text: STATUS_NO_IMAGE.to_string(),
            busy: false,
            latency: None,
        }
    }
}

impl StatusLine {
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.busy = false;
        self.latency = None;
    }

    pub fn set_busy(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.busy = true;
        self.latency = None;
    }

    pub fn set_with_latency(&mut self, text: impl Into<String>, latency: Duration) {
        self.text = text.into();
        self.busy = false;
        self.latency = Some(latency);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn latency(&self) -> Option<Duration> {
        self.latency
    }

    pub fn latency_label(&self) -> Option<String> {
        self.latency
            .map(|latency| format!("{:.2}s", latency.as_secs_f64()))
    }
}

impl std::fmt::Display for StatusLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.latency_label() {
            Some(latency) => write!(f, "{} ({latency})", self.text),
            None => f.write_str(&self.text),
        }
    }
}
