use image::imageops::FilterType;
use image::GenericImageView;
use retouch_contracts::palette::{ImageDecoder, RawFile};
use retouch_contracts::{EditorError, EditorResult, ImageData};
use tracing::debug;

use crate::codec::{self, MAX_DIMENSION};

/// Upload decoder backed by the `image` crate.
///
/// The mime type comes from the sniffed bytes, never from the file name.
/// Images whose longest side exceeds `max_dimension` are downscaled with
/// aspect preserved and re-encoded.
#[derive(Debug, Clone, Copy)]
pub struct UploadDecoder {
    max_dimension: u32,
}

impl Default for UploadDecoder {
    fn default() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
        }
    }
}

impl UploadDecoder {
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }
}

impl ImageDecoder for UploadDecoder {
    fn decode(&self, file: &RawFile) -> EditorResult<ImageData> {
        let format = codec::sniff(&file.bytes)
            .map_err(|err| EditorError::file_read(&file.name, format!("unrecognized image data ({err})")))?;
        let decoded = image::load_from_memory_with_format(&file.bytes, format)
            .map_err(|err| EditorError::file_read(&file.name, err.to_string()))?;
        let mime_type = format.to_mime_type();

        let (width, height) = decoded.dimensions();
        if width.max(height) <= self.max_dimension {
            return Ok(ImageData::new(mime_type, file.bytes.clone()));
        }

        let resized = decoded.resize(self.max_dimension, self.max_dimension, FilterType::Lanczos3);
        debug!(
            file = %file.name,
            from_width = width,
            from_height = height,
            to_width = resized.width(),
            to_height = resized.height(),
            "downscaled upload"
        );
        codec::encode_like(&resized, mime_type)
            .map_err(|err| EditorError::file_read(&file.name, format!("re-encode failed: {err}")))
    }
}
