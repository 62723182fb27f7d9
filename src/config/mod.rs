use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::editor::tools::{BRUSH_SIZE_MAX, BRUSH_SIZE_MIN};
use crate::editor::{EditorSettings, DEFAULT_CANVAS_SIDE, DEFAULT_HISTORY_CAPACITY};
use crate::geometry::CanvasSize;
use crate::inpaint::backend::{
    DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_PROMPT, DEFAULT_REQUEST_TIMEOUT, DEFAULT_STEPS,
    DEFAULT_STRENGTH, REQUEST_TIMEOUT_MAX, STEPS_MAX,
};
use crate::inpaint::{EditParams, OrchestratorSettings, DEFAULT_DEBOUNCE};
use crate::region::{
    RegionPolicy, DEFAULT_CROP_PADDING, DEFAULT_FULL_IMAGE_FRACTION, DEFAULT_MIN_CROP_SIZE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigPathError {
    #[error("neither XDG_CONFIG_HOME nor HOME is set")]
    MissingHomeDirectory,
}

const APP_DIR: &str = "turbo-eraser";
const APP_CONFIG_FILE: &str = "config.json";

const CANVAS_SIDE_MIN: u32 = 64;
const CANVAS_SIDE_MAX: u32 = 4096;
const HISTORY_CAPACITY_MAX: usize = 100;
const DEBOUNCE_MAX: Duration = Duration::from_secs(60);

/// Application-level settings from `config.json`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub prompt: Option<String>,
    pub strength: Option<f32>,
    pub steps: Option<u32>,
    pub request_timeout_secs: Option<u64>,
    pub debounce_ms: Option<u64>,
    pub brush_size: Option<u32>,
    pub canvas_size: Option<u32>,
    pub history_capacity: Option<usize>,
    pub crop_padding: Option<u32>,
    pub min_crop_size: Option<u32>,
    pub full_image_fraction: Option<f32>,
}

/// Fully resolved runtime settings with defaults applied and ranges clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub endpoint: String,
    pub request_timeout: Duration,
    pub editor: EditorSettings,
    pub orchestrator: OrchestratorSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl Settings {
    pub fn from_config(config: &AppConfig) -> Self {
        let canvas_side = config
            .canvas_size
            .unwrap_or(DEFAULT_CANVAS_SIDE)
            .clamp(CANVAS_SIDE_MIN, CANVAS_SIDE_MAX);
        let strength = config
            .strength
            .filter(|value| value.is_finite())
            .unwrap_or(DEFAULT_STRENGTH)
            .clamp(0.0, 1.0);
        let fraction = config
            .full_image_fraction
            .filter(|value| value.is_finite() && *value > 0.0)
            .unwrap_or(DEFAULT_FULL_IMAGE_FRACTION)
            .min(1.0);

        Self {
            endpoint: non_empty(config.endpoint.as_deref()).unwrap_or(DEFAULT_ENDPOINT).to_string(),
            request_timeout: config
                .request_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT)
                .min(REQUEST_TIMEOUT_MAX),
            editor: EditorSettings {
                canvas: CanvasSize::square(canvas_side),
                history_capacity: config
                    .history_capacity
                    .unwrap_or(DEFAULT_HISTORY_CAPACITY)
                    .clamp(1, HISTORY_CAPACITY_MAX),
                brush_size: config
                    .brush_size
                    .unwrap_or(EditorSettings::default().brush_size)
                    .clamp(BRUSH_SIZE_MIN, BRUSH_SIZE_MAX),
            },
            orchestrator: OrchestratorSettings {
                debounce: config
                    .debounce_ms
                    .map(Duration::from_millis)
                    .unwrap_or(DEFAULT_DEBOUNCE)
                    .min(DEBOUNCE_MAX),
                policy: RegionPolicy {
                    padding: config.crop_padding.unwrap_or(DEFAULT_CROP_PADDING),
                    min_size: config
                        .min_crop_size
                        .unwrap_or(DEFAULT_MIN_CROP_SIZE)
                        .max(1),
                    full_image_fraction: fraction,
                },
                params: EditParams {
                    model: non_empty(config.model.as_deref())
                        .unwrap_or(DEFAULT_MODEL)
                        .to_string(),
                    prompt: non_empty(config.prompt.as_deref())
                        .unwrap_or(DEFAULT_PROMPT)
                        .to_string(),
                    strength,
                    steps: config.steps.unwrap_or(DEFAULT_STEPS).clamp(1, STEPS_MAX),
                },
            },
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_app_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::EditorState;

    fn scratch_config_home(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!(
            "turbo-eraser-config-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(root.join(APP_DIR)).expect("scratch dir should be creatable");
        root
    }

    #[test]
    fn app_config_path_prefers_xdg_config_home() {
        let path = app_config_path(
            "turbo-eraser",
            "config.json",
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(
            path,
            PathBuf::from("/tmp/config-root/turbo-eraser/config.json")
        );
    }

    #[test]
    fn app_config_path_falls_back_to_home_dot_config() {
        let path = app_config_path(
            "turbo-eraser",
            "config.json",
            Some(Path::new("")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(
            path,
            PathBuf::from("/tmp/home/.config/turbo-eraser/config.json")
        );
    }

    #[test]
    fn app_config_path_errors_when_home_missing_and_xdg_unset() {
        let error = app_config_path("turbo-eraser", "config.json", None, None).unwrap_err();
        assert_eq!(error, ConfigPathError::MissingHomeDirectory);
    }

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.endpoint, "http://localhost:8000/api/v1/images/edits");
        assert_eq!(settings.request_timeout, Duration::from_secs(120));
        assert_eq!(settings.editor.canvas, CanvasSize::square(1024));
        assert_eq!(settings.editor.brush_size, 30);
        assert_eq!(settings.editor.history_capacity, 20);
        assert_eq!(settings.orchestrator.debounce, Duration::from_millis(400));
        assert_eq!(settings.orchestrator.policy, RegionPolicy::default());
        assert_eq!(settings.orchestrator.params.model, "Flux-2-Klein-4B");
        assert_eq!(settings.orchestrator.params.steps, 4);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config = AppConfig {
            strength: Some(3.5),
            steps: Some(0),
            brush_size: Some(1000),
            full_image_fraction: Some(-1.0),
            prompt: Some("   ".to_string()),
            ..AppConfig::default()
        };
        let settings = Settings::from_config(&config);
        assert_eq!(settings.orchestrator.params.strength, 1.0);
        assert_eq!(settings.orchestrator.params.steps, 1);
        assert_eq!(settings.editor.brush_size, 150);
        assert_eq!(settings.orchestrator.policy.full_image_fraction, 0.75);
        assert_eq!(settings.orchestrator.params.prompt, "seamless background fill");
    }

    #[test]
    fn oversized_capacity_and_timeouts_are_bounded() {
        let config = AppConfig {
            history_capacity: Some(usize::MAX),
            request_timeout_secs: Some(u64::MAX),
            debounce_ms: Some(u64::MAX),
            ..AppConfig::default()
        };
        let settings = Settings::from_config(&config);

        assert_eq!(settings.editor.history_capacity, HISTORY_CAPACITY_MAX);
        assert_eq!(settings.request_timeout, REQUEST_TIMEOUT_MAX);
        assert_eq!(settings.orchestrator.debounce, DEBOUNCE_MAX);
        let editor = EditorState::new(settings.editor);
        assert_eq!(editor.history_depth(), 0);
    }

    #[test]
    fn load_reads_partial_config_file() {
        let root = scratch_config_home("partial");
        std::fs::write(
            root.join(APP_DIR).join(APP_CONFIG_FILE),
            r#"{ "prompt": "remove the person", "debounce_ms": 150 }"#,
        )
        .expect("config should be writable");

        let config = load_app_config_with(Some(&root), None);

        assert_eq!(config.prompt.as_deref(), Some("remove the person"));
        assert_eq!(config.debounce_ms, Some(150));
        assert_eq!(config.endpoint, None);
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn unparsable_config_falls_back_to_defaults() {
        let root = scratch_config_home("broken");
        std::fs::write(root.join(APP_DIR).join(APP_CONFIG_FILE), "{ not json")
            .expect("config should be writable");

        assert_eq!(load_app_config_with(Some(&root), None), AppConfig::default());
        let _ = std::fs::remove_dir_all(root);
    }
}
