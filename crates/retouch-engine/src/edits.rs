use image::GenericImageView;
use retouch_contracts::commands::{CropRect, FlipAxis};
use retouch_contracts::{EditorError, EditorResult, ImageData, ValidationError};

use crate::codec;

pub const FLIP_HORIZONTAL_LABEL: &str = "Flip horizontal";
pub const FLIP_VERTICAL_LABEL: &str = "Flip vertical";
pub const CROP_LABEL: &str = "Crop";

/// Output of a manual-edit producer, ready for `apply_manual_edit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualEdit {
    pub image: ImageData,
    pub label: &'static str,
}

pub fn flip(image: &ImageData, axis: FlipAxis) -> EditorResult<ManualEdit> {
    let decoded = decode_input(image)?;
    let (flipped, label) = match axis {
        FlipAxis::Horizontal => (decoded.fliph(), FLIP_HORIZONTAL_LABEL),
        FlipAxis::Vertical => (decoded.flipv(), FLIP_VERTICAL_LABEL),
    };
    Ok(ManualEdit {
        image: encode_output(&flipped, image.mime_type())?,
        label,
    })
}

/// Crops to `rect` clamped to the image bounds. A rectangle with no
/// overlap is rejected.
pub fn crop(image: &ImageData, rect: CropRect) -> EditorResult<ManualEdit> {
    let decoded = decode_input(image)?;
    let (width, height) = decoded.dimensions();
    let x = rect.x.min(width);
    let y = rect.y.min(height);
    let crop_width = rect.width.min(width - x);
    let crop_height = rect.height.min(height - y);
    if crop_width == 0 || crop_height == 0 {
        return Err(ValidationError::InvalidEdit(format!(
            "crop {}x{} at ({}, {}) is outside the {width}x{height} image",
            rect.width, rect.height, rect.x, rect.y
        ))
        .into());
    }
    let cropped = decoded.crop_imm(x, y, crop_width, crop_height);
    Ok(ManualEdit {
        image: encode_output(&cropped, image.mime_type())?,
        label: CROP_LABEL,
    })
}

fn decode_input(image: &ImageData) -> EditorResult<image::DynamicImage> {
    codec::decode(image).map_err(|err| EditorError::Unknown(format!("could not decode current image: {err}")))
}

fn encode_output(image: &image::DynamicImage, mime_type: &str) -> EditorResult<ImageData> {
    codec::encode_like(image, mime_type)
        .map_err(|err| EditorError::Unknown(format!("could not encode edited image: {err}")))
}
