use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use retouch_contracts::ImageData;

/// Longest side an uploaded image may keep.
pub const MAX_DIMENSION: u32 = 4096;

pub const PNG_MIME: &str = "image/png";
pub const JPEG_MIME: &str = "image/jpeg";

pub(crate) fn sniff(bytes: &[u8]) -> image::ImageResult<ImageFormat> {
    image::guess_format(bytes)
}

pub(crate) fn decode(image: &ImageData) -> image::ImageResult<DynamicImage> {
    image::load_from_memory(image.bytes())
}

pub(crate) fn encode_png(image: &DynamicImage) -> image::ImageResult<ImageData> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(ImageData::new(PNG_MIME, buffer.into_inner()))
}

pub(crate) fn encode_jpeg(image: &DynamicImage, quality: u8) -> image::ImageResult<ImageData> {
    let mut buffer = Vec::new();
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality))?;
    Ok(ImageData::new(JPEG_MIME, buffer))
}

/// PNG stays lossless; everything else is written as maximum-quality JPEG.
pub(crate) fn encode_like(image: &DynamicImage, mime_type: &str) -> image::ImageResult<ImageData> {
    if mime_type.eq_ignore_ascii_case(PNG_MIME) {
        encode_png(image)
    } else {
        encode_jpeg(image, 100)
    }
}
