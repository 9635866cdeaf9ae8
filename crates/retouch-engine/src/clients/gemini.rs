use std::time::Duration;

use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use retouch_contracts::clients::GenerationClient;
use retouch_contracts::models::{ModelSelector, CAPABILITY_IMAGE};
use retouch_contracts::request::GenerationRequest;
use retouch_contracts::{EditorError, EditorResult, ImageData};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::wire::{WirePart, WireRequest};
use super::{truncate_text, WireBackend};
use crate::config::EngineConfig;

pub const NO_IMAGE_MESSAGE: &str = "The model did not return an image.";
pub const MISSING_KEY_MESSAGE: &str = "API key is not configured on the server.";
const ERROR_BODY_LIMIT: usize = 512;

/// Direct `generateContent` client. One request per call, no retries.
pub struct GeminiClient {
    api_key: Option<String>,
    api_base: String,
    model: String,
    timeout: Duration,
    http: HttpClient,
}

impl GeminiClient {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.resolved_model(),
            timeout: config.request_timeout,
            http: HttpClient::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    /// Model for a caller-supplied name. Only registered Gemini image models
    /// reach the URL path; anything else uses the configured model.
    fn model_for_request<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        let Some(requested) = requested.map(str::trim).filter(|value| !value.is_empty()) else {
            return &self.model;
        };
        let name = requested.strip_prefix("models/").unwrap_or(requested);
        match ModelSelector::default().select(Some(name), CAPABILITY_IMAGE) {
            Ok(selection)
                if selection.fallback_reason.is_none() && selection.model.provider == "gemini" =>
            {
                name
            }
            _ => {
                warn!(requested, using = %self.model, "not a registered Gemini image model");
                &self.model
            }
        }
    }

    fn post(&self, model: &str, parts: &[WirePart]) -> EditorResult<ImageData> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(EditorError::Configuration(MISSING_KEY_MESSAGE.to_string()));
        };
        let endpoint = self.endpoint_for_model(model);
        let payload = build_payload(parts);
        debug!(%endpoint, parts = parts.len(), "gemini request");

        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", api_key)])
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .map_err(|raw| {
                let err = anyhow::Error::new(raw.without_url())
                    .context(format!("Gemini request failed ({model})"));
                EditorError::from_anyhow(&err)
            })?;
        let response_payload = response_json_or_error("Gemini", response)?;
        let image = extract_first_image(&response_payload)?;
        info!(model, mime_type = image.mime_type(), bytes = image.len(), "gemini returned image");
        Ok(image)
    }
}

impl GenerationClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate(&self, request: &GenerationRequest) -> EditorResult<ImageData> {
        let wire = WireRequest::from_request(request, None);
        self.post(&self.model, &wire.parts)
    }
}

impl WireBackend for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn generate_wire(&self, request: &WireRequest) -> EditorResult<ImageData> {
        let model = self.model_for_request(request.model.as_deref());
        self.post(model, &request.parts)
    }
}

pub(crate) fn build_payload(parts: &[WirePart]) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": parts,
        }],
        "generationConfig": {
            "responseModalities": ["IMAGE", "TEXT"],
        },
    })
}

fn response_json_or_error(provider: &str, response: HttpResponse) -> EditorResult<Value> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .map_err(|err| EditorError::Unknown(format!("{provider} response body read failed: {err}")))?;
    if !status.is_success() {
        return Err(EditorError::Backend(format!(
            "{provider} request failed ({code}): {}",
            truncate_text(&body, ERROR_BODY_LIMIT)
        )));
    }
    serde_json::from_str(&body)
        .map_err(|err| EditorError::Backend(format!("{provider} returned invalid JSON payload: {err}")))
}

/// First inline image across all candidates. Without one, the model's own
/// text becomes the error message.
pub(crate) fn extract_first_image(response_payload: &Value) -> EditorResult<ImageData> {
    let candidates = response_payload
        .get("candidates")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let mut texts = Vec::new();

    for candidate in candidates {
        let parts = candidate
            .get("content")
            .and_then(|content| content.get("parts"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for part in parts {
            if let Some(text) = part.get("text").and_then(Value::as_str) {
                texts.push(text.trim().to_string());
                continue;
            }
            let Ok(wire) = serde_json::from_value::<WirePart>(part.clone()) else {
                continue;
            };
            let Some(image) = wire.decode_image()? else {
                continue;
            };
            if !image.is_empty() {
                return Ok(image);
            }
        }
    }

    let text = texts.join("\n");
    let text = text.trim();
    if text.is_empty() {
        return Err(EditorError::Backend(NO_IMAGE_MESSAGE.to_string()));
    }
    Err(EditorError::Backend(text.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::EngineConfig;

    fn offline_config() -> EngineConfig {
        EngineConfig::from_lookup(|_| None)
    }

    #[test]
    fn payload_requests_image_and_text() {
        let payload = build_payload(&[WirePart::Text {
            text: "hello".to_string(),
        }]);
        assert_eq!(payload["contents"][0]["role"], json!("user"));
        assert_eq!(payload["contents"][0]["parts"][0]["text"], json!("hello"));
        assert_eq!(
            payload["generationConfig"]["responseModalities"],
            json!(["IMAGE", "TEXT"])
        );
    }

    #[test]
    fn extracts_first_inline_image_in_either_spelling() -> anyhow::Result<()> {
        let response = json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "here you go"},
                    {"inline_data": {"mime_type": "image/png", "data": "aGk="}},
                    {"inlineData": {"mimeType": "image/jpeg", "data": "bm8="}}
                ]}
            }]
        });
        let image = extract_first_image(&response)?;
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(image.bytes(), b"hi");
        Ok(())
    }

    #[test]
    fn text_only_response_becomes_backend_error() {
        let response = json!({
            "candidates": [{"content": {"parts": [{"text": "  I can't edit this photo. "}]}}]
        });
        assert_eq!(
            extract_first_image(&response).err(),
            Some(EditorError::Backend("I can't edit this photo.".to_string()))
        );
        assert_eq!(
            extract_first_image(&json!({})).err(),
            Some(EditorError::Backend(NO_IMAGE_MESSAGE.to_string()))
        );
    }

    #[test]
    fn missing_key_is_a_configuration_error() {
        let client = GeminiClient::new(&offline_config());
        assert!(!client.is_configured());
        let result = client.post("gemini-2.5-flash-image-preview", &[]);
        assert_eq!(
            result.err(),
            Some(EditorError::Configuration(MISSING_KEY_MESSAGE.to_string()))
        );
    }

    #[test]
    fn endpoint_accepts_prefixed_model_names() {
        let client = GeminiClient::new(&offline_config());
        assert_eq!(
            client.endpoint_for_model("models/gemini-2.5-flash-image"),
            format!("{}/models/gemini-2.5-flash-image:generateContent", crate::config::DEFAULT_API_BASE)
        );
        assert_eq!(client.model(), "gemini-2.5-flash-image-preview");
    }

    #[test]
    fn request_model_must_be_a_registered_gemini_image_model() {
        let client = GeminiClient::new(&offline_config());
        assert_eq!(
            client.model_for_request(Some("gemini-3-pro-image-preview")),
            "gemini-3-pro-image-preview"
        );
        assert_eq!(
            client.model_for_request(Some("models/gemini-2.5-flash-image")),
            "gemini-2.5-flash-image"
        );
        assert_eq!(client.model_for_request(Some(" ")), client.model());
        assert_eq!(client.model_for_request(None), client.model());
        for rejected in ["imagen-4", "../../upload/evil", "gemini-2.5-flash", "dryrun-image-1"] {
            assert_eq!(client.model_for_request(Some(rejected)), client.model(), "{rejected}");
        }
    }
}
