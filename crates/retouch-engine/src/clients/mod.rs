mod dryrun;
mod gemini;
mod proxy;
pub mod wire;

use retouch_contracts::clients::{ClientRegistry, GenerationClient};
use retouch_contracts::{EditorResult, ImageData};

use crate::config::{BackendKind, EngineConfig};

pub use dryrun::DryrunClient;
pub use gemini::{GeminiClient, MISSING_KEY_MESSAGE, NO_IMAGE_MESSAGE};
pub use proxy::{ProxyClient, GENERATE_PATH};
use wire::WireRequest;

/// A backend the generate endpoint can forward pre-encoded parts to.
pub trait WireBackend: Send + Sync {
    fn name(&self) -> &str;

    /// False when a call would certainly fail for lack of credentials.
    fn is_configured(&self) -> bool {
        true
    }

    fn generate_wire(&self, request: &WireRequest) -> EditorResult<ImageData>;
}

/// Every client, registered under its backend name.
pub fn default_client_registry(config: &EngineConfig) -> ClientRegistry {
    ClientRegistry::new(vec![
        Box::new(DryrunClient),
        Box::new(GeminiClient::new(config)),
        Box::new(ProxyClient::new(config)),
    ])
}

/// The registered client for the configured backend.
pub fn build_client(config: &EngineConfig) -> Box<dyn GenerationClient> {
    default_client_registry(config)
        .take(config.backend.as_str())
        .unwrap_or_else(|| Box::new(DryrunClient))
}

/// Server-side backend for the endpoint; the proxy never proxies itself.
pub fn build_wire_backend(config: &EngineConfig) -> Box<dyn WireBackend> {
    match config.backend {
        BackendKind::Dryrun => Box::new(DryrunClient),
        BackendKind::Gemini | BackendKind::Proxy => Box::new(GeminiClient::new(config)),
    }
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
