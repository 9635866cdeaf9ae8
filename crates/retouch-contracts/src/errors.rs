use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire-level classification of an [`EditorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    FileRead,
    Validation,
    Configuration,
    Backend,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FileRead => "file_read",
            Self::Validation => "validation",
            Self::Configuration => "configuration",
            Self::Backend => "backend",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "file_read" => Some(Self::FileRead),
            "validation" => Some(Self::Validation),
            "configuration" => Some(Self::Configuration),
            "backend" => Some(Self::Backend),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// A precondition that blocked a request before any bytes were read or sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no editing task is selected")]
    NoTask,
    #[error("unknown editing task '{0}'")]
    UnknownTask(String),
    #[error("prompt text is empty")]
    EmptyPrompt,
    #[error("face swap requires a source image")]
    MissingFaceSwapSource,
    #[error("face swap requires a target image")]
    MissingFaceSwapTarget,
    #[error("collage requires at least {required} images, {available} available")]
    InsufficientImages { required: usize, available: usize },
    #[error("no current image to edit")]
    NoCurrentImage,
    #[error("image '{0}' is not in the palette")]
    UnknownImage(String),
    #[error("a generation request is already in flight")]
    GenerationInFlight,
    #[error("{0}")]
    InvalidEdit(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("failed to read file '{file_name}': {message}")]
    FileRead { file_name: String, message: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("{0}")]
    Unknown(String),
}

impl EditorError {
    pub fn file_read(file_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileRead {
            file_name: file_name.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileRead { .. } => ErrorKind::FileRead,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Backend(_) => ErrorKind::Backend,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Rebuilds an error from its wire form (`error` + `error_kind`).
    pub fn from_wire(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::FileRead => Self::FileRead {
                file_name: String::new(),
                message,
            },
            ErrorKind::Validation => Self::Validation(ValidationError::InvalidEdit(message)),
            ErrorKind::Configuration => Self::Configuration(message),
            ErrorKind::Backend => Self::Backend(message),
            ErrorKind::Unknown => Self::Unknown(message),
        }
    }

    /// Collapses an `anyhow` chain into `Unknown`, keeping every cause.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let mut parts: Vec<String> = Vec::new();
        for cause in err.chain() {
            let text = cause.to_string();
            let trimmed = text.trim();
            if trimmed.is_empty() || parts.last().map(String::as_str) == Some(trimmed) {
                continue;
            }
            parts.push(trimmed.to_string());
        }
        Self::Unknown(parts.join(" | caused by: "))
    }
}

pub type EditorResult<T> = Result<T, EditorError>;
