//! Headless driver: load an image, mark the mask from command-line gestures,
//! run one inpaint cycle and write the composited result.
//!
//!   turbo-eraser --image photo.png --rect 400,380,620,700 --output clean.png
//!   turbo-eraser -i photo.png --lasso "10,10 200,20 120,240" --brush 512,512 -o out.png

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;

use crate::app::App;
use crate::config::Settings;
use crate::editor::{GestureOutcome, ToolKind};
use crate::geometry::CanvasPoint;
use crate::inpaint::backend::{REQUEST_TIMEOUT_MAX, STEPS_MAX};
use crate::inpaint::{Clock, CycleEvent, InpaintBackend, RESULT_POLL_INTERVAL};

const SETTLE_SLACK: Duration = Duration::from_secs(5);

/// Turbo Eraser headless inpainting.
///
/// Gesture coordinates are canvas pixels (the image is letterboxed into a
/// square canvas, 1024 px by default).
#[derive(Parser, Debug)]
#[command(name = "turbo-eraser", version, about = "Mask-driven generative inpainting")]
pub struct CliArgs {
    /// Source image (any format the image crate can decode).
    #[arg(short, long, value_name = "FILE")]
    pub image: PathBuf,

    /// Where to write the composited PNG.
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Filled rectangle between two corners. Repeatable.
    #[arg(long, value_name = "X1,Y1,X2,Y2", value_parser = parse_box)]
    pub rect: Vec<DragBox>,

    /// Filled ellipse inscribed in the box between two corners. Repeatable.
    #[arg(long, value_name = "X1,Y1,X2,Y2", value_parser = parse_box)]
    pub ellipse: Vec<DragBox>,

    /// Closed polygon through space-separated points. Repeatable.
    #[arg(long, value_name = "\"X,Y X,Y X,Y ...\"", value_parser = parse_path)]
    pub lasso: Vec<LassoPath>,

    /// Single brush dab. Repeatable.
    #[arg(long, value_name = "X,Y", value_parser = parse_point)]
    pub brush: Vec<CanvasPoint>,

    /// Brush diameter in canvas pixels (5-150, snapped to steps of 5).
    #[arg(long, value_name = "PX")]
    pub brush_size: Option<u32>,

    #[arg(long)]
    pub prompt: Option<String>,

    /// Denoising strength, 0.0-1.0.
    #[arg(long)]
    pub strength: Option<f32>,

    #[arg(long)]
    pub steps: Option<u32>,

    /// Edit endpoint URL.
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Client-side request timeout.
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragBox {
    pub from: CanvasPoint,
    pub to: CanvasPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LassoPath(pub Vec<CanvasPoint>);

#[derive(Debug, Clone, PartialEq)]
pub enum MaskGesture {
    Brush(CanvasPoint),
    Rectangle(DragBox),
    Ellipse(DragBox),
    Lasso(Vec<CanvasPoint>),
}

impl CliArgs {
    /// Command-line values win over `config.json`.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(endpoint) = &self.endpoint {
            settings.endpoint = endpoint.clone();
        }
        if let Some(secs) = self.timeout_secs.filter(|secs| *secs > 0) {
            settings.request_timeout = Duration::from_secs(secs).min(REQUEST_TIMEOUT_MAX);
        }
        if let Some(size) = self.brush_size {
            settings.editor.brush_size = size;
        }
        let params = &mut settings.orchestrator.params;
        if let Some(prompt) = &self.prompt {
            params.prompt = prompt.clone();
        }
        if let Some(strength) = self.strength.filter(|value| value.is_finite()) {
            params.strength = strength.clamp(0.0, 1.0);
        }
        if let Some(steps) = self.steps {
            params.steps = steps.clamp(1, STEPS_MAX);
        }
    }

    pub fn gestures(&self) -> Vec<MaskGesture> {
        let rects = self.rect.iter().copied().map(MaskGesture::Rectangle);
        let ellipses = self.ellipse.iter().copied().map(MaskGesture::Ellipse);
        let lassos = self
            .lasso
            .iter()
            .map(|path| MaskGesture::Lasso(path.0.clone()));
        let dabs = self.brush.iter().copied().map(MaskGesture::Brush);
        rects.chain(ellipses).chain(lassos).chain(dabs).collect()
    }
}

fn parse_number(raw: &str) -> Result<f32, String> {
    let value = raw
        .trim()
        .parse::<f32>()
        .map_err(|err| format!("invalid coordinate {raw:?}: {err}"))?;
    if !value.is_finite() {
        return Err(format!("coordinate {raw:?} is not finite"));
    }
    Ok(value)
}

fn parse_point(raw: &str) -> Result<CanvasPoint, String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got {raw:?}"))?;
    Ok(CanvasPoint::new(parse_number(x)?, parse_number(y)?))
}

fn parse_box(raw: &str) -> Result<DragBox, String> {
    let values = raw
        .split(',')
        .map(parse_number)
        .collect::<Result<Vec<_>, _>>()?;
    match values.as_slice() {
        [x1, y1, x2, y2] => Ok(DragBox {
            from: CanvasPoint::new(*x1, *y1),
            to: CanvasPoint::new(*x2, *y2),
        }),
        _ => Err(format!("expected X1,Y1,X2,Y2 but got {raw:?}")),
    }
}

fn parse_path(raw: &str) -> Result<LassoPath, String> {
    let points = raw
        .split_whitespace()
        .map(parse_point)
        .collect::<Result<Vec<_>, _>>()?;
    if points.is_empty() {
        return Err("lasso path has no points".to_string());
    }
    Ok(LassoPath(points))
}

/// Replays gestures through the controller; returns how many marked the mask.
pub fn apply_gestures<B: InpaintBackend, C: Clock>(
    app: &mut App<B, C>,
    gestures: &[MaskGesture],
) -> usize {
    let mut completed = 0;
    for gesture in gestures {
        let outcome = match gesture {
            MaskGesture::Brush(point) => {
                app.select_tool(ToolKind::Brush);
                app.pointer_down(point.x, point.y);
                app.pointer_up(point.x, point.y)
            }
            MaskGesture::Rectangle(drag) | MaskGesture::Ellipse(drag) => {
                let tool = if matches!(gesture, MaskGesture::Ellipse(_)) {
                    ToolKind::Ellipse
                } else {
                    ToolKind::Rectangle
                };
                app.select_tool(tool);
                app.pointer_down(drag.from.x, drag.from.y);
                app.pointer_move(drag.to.x, drag.to.y);
                app.pointer_up(drag.to.x, drag.to.y)
            }
            MaskGesture::Lasso(path) => {
                app.select_tool(ToolKind::Lasso);
                let Some((first, rest)) = path.split_first() else {
                    continue;
                };
                app.pointer_down(first.x, first.y);
                for point in rest {
                    app.pointer_move(point.x, point.y);
                }
                let last = rest.last().unwrap_or(first);
                app.pointer_up(last.x, last.y)
            }
        };
        if outcome == GestureOutcome::Completed {
            completed += 1;
        } else {
            tracing::warn!(?gesture, ?outcome, "gesture did not mark the mask");
        }
    }
    app.pointer_leave();
    completed
}

/// How long to wait for one debounced cycle: debounce, request timeout and slack.
pub fn settle_budget(settings: &Settings) -> Duration {
    settings
        .orchestrator
        .debounce
        .saturating_add(settings.request_timeout)
        .saturating_add(SETTLE_SLACK)
}

/// Ticks the controller until no request is pending or `timeout` elapses.
pub fn wait_until_idle<B: InpaintBackend, C: Clock>(
    app: &mut App<B, C>,
    timeout: Duration,
) -> Vec<CycleEvent> {
    let started = Instant::now();
    let mut events = Vec::new();
    loop {
        events.extend(app.tick());
        if app.is_idle() {
            break;
        }
        if started.elapsed() >= timeout {
            tracing::warn!(timeout_secs = timeout.as_secs(), "gave up waiting for inpaint");
            break;
        }
        std::thread::sleep(RESULT_POLL_INTERVAL);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gesture_flags_in_canvas_coordinates() {
        let args = CliArgs::try_parse_from([
            "turbo-eraser",
            "--image",
            "in.png",
            "-o",
            "out.png",
            "--rect",
            "10,20,30,40",
            "--lasso",
            "1,1 50,1 25,40",
            "--brush",
            "512.5,600",
            "--brush",
            "8,8",
        ])
        .expect("arguments should parse");

        assert_eq!(
            args.gestures(),
            vec![
                MaskGesture::Rectangle(DragBox {
                    from: CanvasPoint::new(10.0, 20.0),
                    to: CanvasPoint::new(30.0, 40.0),
                }),
                MaskGesture::Lasso(vec![
                    CanvasPoint::new(1.0, 1.0),
                    CanvasPoint::new(50.0, 1.0),
                    CanvasPoint::new(25.0, 40.0),
                ]),
                MaskGesture::Brush(CanvasPoint::new(512.5, 600.0)),
                MaskGesture::Brush(CanvasPoint::new(8.0, 8.0)),
            ]
        );
    }

    #[test]
    fn malformed_coordinates_are_rejected() {
        assert!(parse_box("1,2,3").is_err());
        assert!(parse_point("7").is_err());
        assert!(parse_point("a,b").is_err());
        assert!(parse_path("   ").is_err());
        assert!(parse_number("inf").is_err());
    }

    #[test]
    fn flags_override_config_values() {
        let args = CliArgs::try_parse_from([
            "turbo-eraser",
            "-i",
            "in.png",
            "-o",
            "out.png",
            "--prompt",
            "empty street",
            "--strength",
            "1.7",
            "--steps",
            "8",
            "--endpoint",
            "http://10.0.0.2:9000/edits",
        ])
        .expect("arguments should parse");
        let mut settings = Settings::default();

        args.apply_overrides(&mut settings);

        assert_eq!(settings.endpoint, "http://10.0.0.2:9000/edits");
        assert_eq!(settings.orchestrator.params.prompt, "empty street");
        assert_eq!(settings.orchestrator.params.strength, 1.0);
        assert_eq!(settings.orchestrator.params.steps, 8);
        assert_eq!(settings.orchestrator.params.model, "Flux-2-Klein-4B");
    }

    #[test]
    fn oversized_steps_and_timeout_flags_are_capped() {
        let args = CliArgs::try_parse_from([
            "turbo-eraser",
            "-i",
            "in.png",
            "-o",
            "out.png",
            "--steps",
            "900",
            "--timeout-secs",
            "18446744073709551615",
        ])
        .expect("arguments should parse");
        let mut settings = Settings::default();

        args.apply_overrides(&mut settings);

        assert_eq!(settings.orchestrator.params.steps, STEPS_MAX);
        assert_eq!(settings.request_timeout, REQUEST_TIMEOUT_MAX);
    }

    #[test]
    fn settle_budget_saturates_instead_of_overflowing() {
        let mut settings = Settings::default();
        assert_eq!(
            settle_budget(&settings),
            Duration::from_millis(400) + Duration::from_secs(120) + SETTLE_SLACK
        );

        settings.request_timeout = Duration::MAX;
        assert_eq!(settle_budget(&settings), Duration::MAX);
    }
}
