use retouch_contracts::errors::ErrorKind;
use retouch_contracts::request::MIN_COLLAGE_IMAGES;
use retouch_contracts::tasks::{find_task, TaskKind};
use retouch_contracts::EditorError;
use serde_json::Value;
use tracing::{info, warn};

use crate::clients::wire::{data_url, WireError, WireRequest, WireSuccess};
use crate::clients::{WireBackend, MISSING_KEY_MESSAGE};

pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed";

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointResponse {
    pub status: u16,
    pub body: Value,
}

impl EndpointResponse {
    fn success(image_url: String) -> Self {
        Self {
            status: 200,
            body: serde_json::to_value(WireSuccess { image_url }).unwrap_or(Value::Null),
        }
    }

    fn failure(status: u16, kind: ErrorKind, message: impl Into<String>) -> Self {
        let body = WireError {
            error: message.into(),
            error_kind: Some(kind.as_str().to_string()),
        };
        Self {
            status,
            body: serde_json::to_value(body).unwrap_or(Value::Null),
        }
    }

    fn from_error(err: &EditorError) -> Self {
        let status = match err.kind() {
            ErrorKind::Validation | ErrorKind::FileRead => 400,
            ErrorKind::Backend => 502,
            ErrorKind::Configuration | ErrorKind::Unknown => 500,
        };
        let message = match err {
            EditorError::Backend(message)
            | EditorError::Configuration(message)
            | EditorError::Unknown(message) => message.clone(),
            other => other.to_string(),
        };
        Self::failure(status, err.kind(), message)
    }
}

/// `POST /api/generate`, independent of any HTTP framework.
pub struct GenerateEndpoint {
    backend: Box<dyn WireBackend>,
}

impl GenerateEndpoint {
    pub fn new(backend: Box<dyn WireBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn handle(&self, method: &str, body: &[u8]) -> EndpointResponse {
        if !method.eq_ignore_ascii_case("POST") {
            return EndpointResponse::failure(405, ErrorKind::Validation, METHOD_NOT_ALLOWED_MESSAGE);
        }
        if !self.backend.is_configured() {
            warn!(backend = self.backend.name(), "generate called without a configured API key");
            return EndpointResponse::failure(500, ErrorKind::Configuration, MISSING_KEY_MESSAGE);
        }

        let request = match parse_body(body) {
            Ok(request) => request,
            Err(message) => return EndpointResponse::failure(400, ErrorKind::Validation, message),
        };

        match self.backend.generate_wire(&request) {
            Ok(image) => {
                info!(
                    task_id = %request.task_id,
                    mime_type = image.mime_type(),
                    bytes = image.len(),
                    "generate succeeded"
                );
                EndpointResponse::success(data_url(&image))
            }
            Err(err) => {
                warn!(task_id = %request.task_id, error_kind = err.kind().as_str(), error = %err, "generate failed");
                EndpointResponse::from_error(&err)
            }
        }
    }
}

fn parse_body(body: &[u8]) -> Result<WireRequest, String> {
    let request: WireRequest =
        serde_json::from_slice(body).map_err(|err| format!("Invalid request body: {err}"))?;
    if request.task_id.trim().is_empty() || request.prompt.trim().is_empty() {
        return Err("Missing task_id or prompt.".to_string());
    }
    if request.parts.is_empty() {
        return Err("Request has no content parts.".to_string());
    }
    let images = request.image_count();
    match find_task(&request.task_id).map(|task| task.kind()) {
        Some(TaskKind::FaceSwap) if images < 2 => {
            Err("Face swap requires source and target images.".to_string())
        }
        Some(TaskKind::Collage) if images < MIN_COLLAGE_IMAGES => {
            Err(format!("Collage requires at least {MIN_COLLAGE_IMAGES} images."))
        }
        Some(TaskKind::Single) if images == 0 => {
            Err("An image is required for this task.".to_string())
        }
        Some(_) => Ok(request),
        None => Err(format!("Unknown task '{}'.", request.task_id.trim())),
    }
}
