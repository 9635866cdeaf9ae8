use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use retouch_contracts::request::{ContentPart, GenerationRequest};
use retouch_contracts::{EditorError, EditorResult, ImageData};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineData {
    #[serde(rename = "mimeType", alias = "mime_type")]
    pub mime_type: String,
    pub data: String,
}

/// One content part as Gemini and the generate endpoint spell it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WirePart {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData", alias = "inline_data")]
        inline_data: InlineData,
    },
}

impl WirePart {
    pub fn from_image(image: &ImageData) -> Self {
        Self::Inline {
            inline_data: InlineData {
                mime_type: image.mime_type().to_string(),
                data: BASE64.encode(image.bytes()),
            },
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Inline { .. })
    }

    pub fn decode_image(&self) -> EditorResult<Option<ImageData>> {
        let Self::Inline { inline_data } = self else {
            return Ok(None);
        };
        let bytes = BASE64
            .decode(inline_data.data.trim().as_bytes())
            .map_err(|err| EditorError::Backend(format!("invalid base64 image data: {err}")))?;
        Ok(Some(ImageData::new(inline_data.mime_type.clone(), bytes)))
    }
}

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRequest {
    #[serde(default)]
    pub task_id: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub parts: Vec<WirePart>,
}

impl WireRequest {
    /// Encodes the built request; part order is preserved exactly.
    pub fn from_request(request: &GenerationRequest, model: Option<&str>) -> Self {
        let parts = request
            .parts()
            .iter()
            .map(|part| match part {
                ContentPart::Text(text) => WirePart::Text { text: text.clone() },
                ContentPart::Image { image, .. } => WirePart::from_image(image),
            })
            .collect();
        Self {
            task_id: request.task_id().to_string(),
            prompt: request.prompt_text().to_string(),
            model: model.map(str::to_string),
            parts,
        }
    }

    pub fn image_count(&self) -> usize {
        self.parts.iter().filter(|part| part.is_image()).count()
    }

    pub fn images(&self) -> EditorResult<Vec<ImageData>> {
        let mut images = Vec::new();
        for part in &self.parts {
            if let Some(image) = part.decode_image()? {
                images.push(image);
            }
        }
        Ok(images)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireSuccess {
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

pub fn data_url(image: &ImageData) -> String {
    format!("data:{};base64,{}", image.mime_type(), BASE64.encode(image.bytes()))
}

pub fn parse_data_url(url: &str) -> EditorResult<ImageData> {
    let invalid = || EditorError::Backend("response did not contain a base64 data URL".to_string());
    let rest = url.trim().strip_prefix("data:").ok_or_else(invalid)?;
    let (header, data) = rest.split_once(',').ok_or_else(invalid)?;
    let mime_type = header.strip_suffix(";base64").ok_or_else(invalid)?;
    let bytes = BASE64
        .decode(data.as_bytes())
        .map_err(|err| EditorError::Backend(format!("invalid base64 image data: {err}")))?;
    Ok(ImageData::new(mime_type, bytes))
}
