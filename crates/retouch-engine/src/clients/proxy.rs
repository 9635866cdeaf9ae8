use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use retouch_contracts::clients::GenerationClient;
use retouch_contracts::errors::ErrorKind;
use retouch_contracts::request::GenerationRequest;
use retouch_contracts::{EditorError, EditorResult, ImageData};
use tracing::debug;

use super::wire::{parse_data_url, WireError, WireRequest, WireSuccess};
use super::truncate_text;
use crate::config::EngineConfig;

pub const GENERATE_PATH: &str = "/api/generate";

/// Forwards requests to a `serve` instance, which holds the credential.
pub struct ProxyClient {
    base_url: Option<String>,
    model: Option<String>,
    timeout: Duration,
    http: HttpClient,
}

impl ProxyClient {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            base_url: config.proxy_url.clone(),
            model: Some(config.resolved_model()),
            timeout: config.request_timeout,
            http: HttpClient::new(),
        }
    }

    fn endpoint(&self) -> EditorResult<String> {
        let base = self.base_url.as_deref().ok_or_else(|| {
            EditorError::Configuration("RETOUCH_PROXY_URL is not set for the proxy backend.".to_string())
        })?;
        Ok(format!("{}{GENERATE_PATH}", base.trim_end_matches('/')))
    }
}

impl GenerationClient for ProxyClient {
    fn name(&self) -> &str {
        "proxy"
    }

    fn generate(&self, request: &GenerationRequest) -> EditorResult<ImageData> {
        let endpoint = self.endpoint()?;
        let body = WireRequest::from_request(request, self.model.as_deref());
        debug!(%endpoint, task_id = %body.task_id, images = body.image_count(), "proxy request");

        let response = self
            .http
            .post(&endpoint)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .map_err(|raw| {
                let err = anyhow::Error::new(raw).context(format!("proxy request failed ({endpoint})"));
                EditorError::from_anyhow(&err)
            })?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|err| EditorError::Unknown(format!("proxy response body read failed: {err}")))?;
        decode_response(status.as_u16(), &text)
    }
}

/// Maps a proxy reply back onto the error taxonomy.
pub(crate) fn decode_response(status: u16, body: &str) -> EditorResult<ImageData> {
    if (200..300).contains(&status) {
        let success: WireSuccess = serde_json::from_str(body)
            .map_err(|err| EditorError::Backend(format!("proxy returned invalid JSON payload: {err}")))?;
        return parse_data_url(&success.image_url);
    }
    match serde_json::from_str::<WireError>(body) {
        Ok(wire) => {
            let kind = wire
                .error_kind
                .as_deref()
                .and_then(ErrorKind::parse)
                .unwrap_or(ErrorKind::Backend);
            Err(EditorError::from_wire(kind, wire.error))
        }
        Err(_) => Err(EditorError::Backend(format!(
            "proxy request failed ({status}): {}",
            truncate_text(body, 512)
        ))),
    }
}
