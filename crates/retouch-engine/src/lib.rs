//! Side-effecting half of retouch: decoding, manual edits, generation
//! clients, the generate endpoint and the session driver.

pub mod clients;
mod codec;
pub mod config;
pub mod decoder;
pub mod editor;
pub mod edits;
pub mod endpoint;

pub use clients::{build_client, build_wire_backend, default_client_registry, WireBackend};
pub use codec::MAX_DIMENSION;
pub use config::{BackendKind, EngineConfig};
pub use decoder::UploadDecoder;
pub use editor::NativeEditor;
pub use endpoint::{EndpointResponse, GenerateEndpoint};
