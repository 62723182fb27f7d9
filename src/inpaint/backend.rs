use std::io::Read;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Region;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/v1/images/edits";
pub const DEFAULT_MODEL: &str = "Flux-2-Klein-4B";
pub const DEFAULT_PROMPT: &str = "seamless background fill";
pub const DEFAULT_STRENGTH: f32 = 0.75;
pub const DEFAULT_STEPS: u32 = 4;
pub const STEPS_MAX: u32 = 200;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
pub const REQUEST_TIMEOUT_MAX: Duration = Duration::from_secs(3600);

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("cannot reach {endpoint}: {message}")]
    Connectivity { endpoint: String, message: String },
    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },
    #[error("request failed: {message}")]
    Request { message: String },
    #[error("malformed response: {message}")]
    MalformedResponse { message: String },
}

impl BackendError {
    pub const fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Generation parameters sent with every edit.
#[derive(Debug, Clone, PartialEq)]
pub struct EditParams {
    pub model: String,
    pub prompt: String,
    pub strength: f32,
    pub steps: u32,
}

impl Default for EditParams {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            prompt: DEFAULT_PROMPT.to_string(),
            strength: DEFAULT_STRENGTH,
            steps: DEFAULT_STEPS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EditRequest {
    pub image_png: Vec<u8>,
    pub mask_png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub params: EditParams,
}

impl EditRequest {
    pub fn size_label(&self) -> String {
        Region::new(0, 0, self.width, self.height).size_label()
    }
}

/// A generative image-edit service. Returns the encoded result image.
pub trait InpaintBackend: Send + Sync + 'static {
    fn edit(&self, request: &EditRequest) -> BackendResult<Vec<u8>>;
}

#[derive(Debug, Serialize)]
struct EditPayload<'a> {
    model: &'a str,
    prompt: &'a str,
    image: String,
    mask: String,
    size: String,
    strength: f32,
    steps: u32,
    response_format: &'static str,
}

impl<'a> EditPayload<'a> {
    fn from_request(request: &'a EditRequest) -> Self {
        Self {
            model: &request.params.model,
            prompt: &request.params.prompt,
            image: png_data_url(&request.image_png),
            mask: png_data_url(&request.mask_png),
            size: request.size_label(),
            strength: request.params.strength,
            steps: request.params.steps,
            response_format: "b64_json",
        }
    }
}

#[derive(Debug, Deserialize)]
struct EditResponse {
    data: Vec<EditDatum>,
}

#[derive(Debug, Deserialize)]
struct EditDatum {
    b64_json: String,
}

fn png_data_url(bytes: &[u8]) -> String {
    format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(bytes))
}

/// Extracts and decodes `data[0].b64_json`, accepting bare base64 or a data URL.
fn decode_response(body: &str) -> BackendResult<Vec<u8>> {
    let response: EditResponse =
        serde_json::from_str(body).map_err(|err| BackendError::MalformedResponse {
            message: err.to_string(),
        })?;
    let first = response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::MalformedResponse {
            message: "response contains no images".to_string(),
        })?;
    let encoded = match first.b64_json.split_once(";base64,") {
        Some((prefix, payload)) if prefix.starts_with("data:") => payload,
        _ => first.b64_json.as_str(),
    };
    STANDARD
        .decode(encoded.trim())
        .map_err(|err| BackendError::MalformedResponse {
            message: format!("invalid base64 image: {err}"),
        })
}

/// JSON-over-HTTP client for an OpenAI-style `images/edits` endpoint.
#[derive(Debug)]
pub struct HttpBackend {
    endpoint: String,
    agent: ureq::Agent,
}

impl HttpBackend {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            endpoint: endpoint.into(),
            agent,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn classify(&self, err: ureq::Error) -> BackendError {
        match err {
            ureq::Error::Status(code, response) => {
                let mut body = response.into_string().unwrap_or_default();
                if body.len() > ERROR_BODY_LIMIT {
                    let cut = (0..=ERROR_BODY_LIMIT)
                        .rev()
                        .find(|index| body.is_char_boundary(*index))
                        .unwrap_or(0);
                    body.truncate(cut);
                }
                BackendError::Status { code, body }
            }
            ureq::Error::Transport(transport) => match transport.kind() {
                ureq::ErrorKind::Dns
                | ureq::ErrorKind::ConnectionFailed
                | ureq::ErrorKind::Io
                | ureq::ErrorKind::ProxyConnect => BackendError::Connectivity {
                    endpoint: self.endpoint.clone(),
                    message: transport.to_string(),
                },
                _ => BackendError::Request {
                    message: transport.to_string(),
                },
            },
        }
    }
}

impl InpaintBackend for HttpBackend {
    fn edit(&self, request: &EditRequest) -> BackendResult<Vec<u8>> {
        let payload = EditPayload::from_request(request);
        tracing::debug!(
            endpoint = %self.endpoint,
            size = %payload.size,
            model = payload.model,
            "sending edit request"
        );
        let response = self
            .agent
            .post(&self.endpoint)
            .send_json(&payload)
            .map_err(|err| self.classify(err))?;
        // into_string caps bodies at 10 MB; base64 PNGs of large canvases can exceed that.
        let mut body = String::new();
        response
            .into_reader()
            .read_to_string(&mut body)
            .map_err(|err| BackendError::Connectivity {
                endpoint: self.endpoint.clone(),
                message: format!("failed to read response body: {err}"),
            })?;
        decode_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> EditRequest {
        EditRequest {
            image_png: vec![1, 2, 3],
            mask_png: vec![4, 5],
            width: 512,
            height: 512,
            params: EditParams::default(),
        }
    }

    #[test]
    fn payload_carries_data_urls_size_and_parameters() {
        let request = request();
        let value = serde_json::to_value(EditPayload::from_request(&request))
            .expect("payload should serialize");

        assert_eq!(value["model"], "Flux-2-Klein-4B");
        assert_eq!(value["prompt"], "seamless background fill");
        assert_eq!(value["size"], "512x512");
        assert_eq!(value["steps"], 4);
        assert_eq!(value["response_format"], "b64_json");
        assert_eq!(value["image"], "data:image/png;base64,AQID");
        assert_eq!(value["mask"], "data:image/png;base64,BAU=");
        let strength = value["strength"].as_f64().expect("strength is a number");
        assert!((strength - 0.75).abs() < 1e-6);
    }

    #[test]
    fn response_accepts_bare_and_data_url_base64() {
        let bare = decode_response(r#"{"data":[{"b64_json":"AQID"}]}"#)
            .expect("bare base64 should decode");
        assert_eq!(bare, vec![1, 2, 3]);

        let url = decode_response(r#"{"data":[{"b64_json":"data:image/png;base64,AQID"}]}"#)
            .expect("data url should decode");
        assert_eq!(url, vec![1, 2, 3]);
    }

    #[test]
    fn response_shape_errors_are_malformed() {
        for body in [
            r#"{"data":[]}"#,
            r#"{"error":"nope"}"#,
            r#"{"data":[{"b64_json":"***"}]}"#,
            "not json",
        ] {
            let err = decode_response(body).expect_err("body should be rejected");
            assert!(
                matches!(err, BackendError::MalformedResponse { .. }),
                "{body}: {err:?}"
            );
        }
    }

    #[test]
    fn refused_connection_is_classified_as_connectivity() {
        let backend = HttpBackend::new("http://127.0.0.1:1/edits", Duration::from_secs(2));
        let err = backend
            .edit(&request())
            .expect_err("nothing listens on port 1");
        assert!(err.is_connectivity(), "{err:?}");
    }
}
