//! Editing-session state core: palette, selection, history and request
//! building. Nothing in this crate performs network I/O.

pub mod clients;
pub mod commands;
pub mod errors;
pub mod events;
pub mod export;
pub mod history;
pub mod image_data;
pub mod models;
pub mod palette;
pub mod request;
pub mod selection;
pub mod session;
pub mod tasks;

pub use errors::{EditorError, EditorResult, ErrorKind, ValidationError};
pub use image_data::ImageData;
pub use session::EditorSession;
