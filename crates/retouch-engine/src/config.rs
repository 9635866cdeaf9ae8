use std::env;
use std::fmt;
use std::time::Duration;

use retouch_contracts::models::{ModelSelector, CAPABILITY_IMAGE, DEFAULT_IMAGE_MODEL};
use tracing::warn;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";
pub const DEFAULT_TIMEOUT_SECS: f64 = 90.0;
const MIN_TIMEOUT_SECS: f64 = 15.0;
const MAX_TIMEOUT_SECS: f64 = 300.0;

/// Credential variables in lookup order.
pub const API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY", "API_KEY"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Gemini,
    Proxy,
    Dryrun,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Proxy => "proxy",
            Self::Dryrun => "dryrun",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "gemini" => Some(Self::Gemini),
            "proxy" => Some(Self::Proxy),
            "dryrun" | "dry-run" | "offline" => Some(Self::Dryrun),
            _ => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-level settings for clients and the endpoint.
#[derive(Clone, PartialEq)]
pub struct EngineConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub proxy_url: Option<String>,
    pub request_timeout: Duration,
    pub backend: BackendKind,
    pub bind: String,
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("proxy_url", &self.proxy_url)
            .field("request_timeout", &self.request_timeout)
            .field("backend", &self.backend)
            .field("bind", &self.bind)
            .finish()
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = API_KEY_VARS.iter().copied().find_map(&get);
        let backend = match get("RETOUCH_BACKEND") {
            Some(raw) => BackendKind::parse(&raw).unwrap_or_else(|| {
                let fallback = default_backend(api_key.is_some());
                warn!(value = %raw, fallback = %fallback, "unknown RETOUCH_BACKEND");
                fallback
            }),
            None => default_backend(api_key.is_some()),
        };

        Self {
            api_key,
            api_base: get("GEMINI_API_BASE")
                .map(|value| value.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: get("RETOUCH_MODEL").unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            proxy_url: get("RETOUCH_PROXY_URL").map(|value| value.trim_end_matches('/').to_string()),
            request_timeout: timeout_from(get("RETOUCH_REQUEST_TIMEOUT").as_deref()),
            backend,
            bind: get("RETOUCH_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
        }
    }

    pub fn with_backend(mut self, backend: Option<BackendKind>) -> Self {
        if let Some(backend) = backend {
            self.backend = backend;
        }
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        if let Some(model) = model.filter(|value| !value.trim().is_empty()) {
            self.model = model.trim().to_string();
        }
        self
    }

    pub fn with_proxy_url(mut self, proxy_url: Option<String>) -> Self {
        if let Some(url) = proxy_url.filter(|value| !value.trim().is_empty()) {
            self.proxy_url = Some(url.trim().trim_end_matches('/').to_string());
        }
        self
    }

    pub fn with_bind(mut self, bind: Option<String>) -> Self {
        if let Some(bind) = bind.filter(|value| !value.trim().is_empty()) {
            self.bind = bind.trim().to_string();
        }
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// The registered image model to call, falling back to the default.
    pub fn resolved_model(&self) -> String {
        let selector = ModelSelector::default();
        match selector.select(Some(&self.model), CAPABILITY_IMAGE) {
            Ok(selection) => {
                if let Some(reason) = selection.fallback_reason.as_deref() {
                    warn!(requested = %self.model, using = %selection.model.name, "{reason}");
                }
                selection.model.name
            }
            Err(reason) => {
                warn!(requested = %self.model, "{reason}");
                DEFAULT_IMAGE_MODEL.to_string()
            }
        }
    }
}

fn default_backend(has_key: bool) -> BackendKind {
    if has_key {
        BackendKind::Gemini
    } else {
        BackendKind::Dryrun
    }
}

fn timeout_from(raw: Option<&str>) -> Duration {
    let seconds = raw
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
        .clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS);
    Duration::from_secs_f64(seconds)
}
