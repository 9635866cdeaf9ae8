use image::{DynamicImage, GenericImage, GenericImageView, Rgb, RgbImage, Rgba};
use retouch_contracts::clients::GenerationClient;
use retouch_contracts::request::GenerationRequest;
use retouch_contracts::tasks::{find_task, TaskKind};
use retouch_contracts::{EditorError, EditorResult, ImageData};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::wire::WireRequest;
use super::WireBackend;
use crate::codec;

const PLACEHOLDER_SIZE: u32 = 64;

/// Offline backend: tints the input with a color derived from the prompt.
/// Same request, same bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryrunClient;

impl GenerationClient for DryrunClient {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate(&self, request: &GenerationRequest) -> EditorResult<ImageData> {
        self.generate_wire(&WireRequest::from_request(request, None))
    }
}

impl WireBackend for DryrunClient {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate_wire(&self, request: &WireRequest) -> EditorResult<ImageData> {
        let inputs = request
            .images()?
            .iter()
            .map(|image| {
                codec::decode(image).map_err(|err| {
                    EditorError::Backend(format!("dry-run could not decode input image: {err}"))
                })
            })
            .collect::<EditorResult<Vec<DynamicImage>>>()?;

        let collage = find_task(&request.task_id).map(|task| task.kind()) == Some(TaskKind::Collage);
        let base = match inputs.as_slice() {
            [] => DynamicImage::ImageRgb8(RgbImage::new(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE)),
            [first, ..] if !collage => first.clone(),
            all => tile_horizontally(all)?,
        };
        let tint = color_from_prompt(&request.prompt);
        debug!(task_id = %request.task_id, inputs = inputs.len(), ?tint, "dry-run generate");

        let tinted = apply_tint(&base, tint);
        codec::encode_png(&tinted)
            .map_err(|err| EditorError::Unknown(format!("dry-run encode failed: {err}")))
    }
}

pub(crate) fn color_from_prompt(prompt: &str) -> [u8; 3] {
    let digest = Sha256::digest(prompt.as_bytes());
    [digest[0], digest[1], digest[2]]
}

fn tile_horizontally(images: &[DynamicImage]) -> EditorResult<DynamicImage> {
    let width = images.iter().map(|image| image.width()).sum::<u32>().max(1);
    let height = images.iter().map(|image| image.height()).max().unwrap_or(1).max(1);
    let mut canvas = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
        width,
        height,
        Rgba([255, 255, 255, 255]),
    ));
    let mut offset = 0;
    for image in images {
        canvas
            .copy_from(image, offset, 0)
            .map_err(|err| EditorError::Unknown(format!("dry-run collage failed: {err}")))?;
        offset += image.width();
    }
    Ok(canvas)
}

fn apply_tint(image: &DynamicImage, tint: [u8; 3]) -> DynamicImage {
    let mut out = RgbImage::new(image.width(), image.height());
    for (x, y, pixel) in image.pixels() {
        let [r, g, b, _] = pixel.0;
        out.put_pixel(
            x,
            y,
            Rgb([blend(r, tint[0]), blend(g, tint[1]), blend(b, tint[2])]),
        );
    }
    DynamicImage::ImageRgb8(out)
}

fn blend(channel: u8, tint: u8) -> u8 {
    ((u16::from(channel) * 3 + u16::from(tint)) / 4) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::wire::WirePart;
    use crate::codec::tests::solid_png;
    use retouch_contracts::tasks::COLLAGE_TASK_ID;

    fn wire(task_id: &str, prompt: &str, images: &[ImageData]) -> WireRequest {
        let mut parts = vec![WirePart::Text {
            text: prompt.to_string(),
        }];
        parts.extend(images.iter().map(WirePart::from_image));
        WireRequest {
            task_id: task_id.to_string(),
            prompt: prompt.to_string(),
            model: None,
            parts,
        }
    }

    #[test]
    fn output_is_deterministic_png() -> anyhow::Result<()> {
        let input = solid_png(6, 4, [100, 100, 100]);
        let first = DryrunClient.generate_wire(&wire("REMOVE_OBJECT", "boat", &[input.clone()]))?;
        let second = DryrunClient.generate_wire(&wire("REMOVE_OBJECT", "boat", &[input.clone()]))?;
        assert_eq!(first, second);
        assert_eq!(first.mime_type(), "image/png");
        assert_eq!(codec::decode(&first)?.dimensions(), (6, 4));

        let other = DryrunClient.generate_wire(&wire("REMOVE_OBJECT", "car", &[input]))?;
        assert_ne!(first, other);
        Ok(())
    }

    #[test]
    fn collage_tiles_every_image() -> anyhow::Result<()> {
        let images = [solid_png(3, 2, [0, 0, 0]), solid_png(5, 4, [255, 255, 255])];
        let output = DryrunClient.generate_wire(&wire(COLLAGE_TASK_ID, "grid", &images))?;
        assert_eq!(codec::decode(&output)?.dimensions(), (8, 4));
        Ok(())
    }

    #[test]
    fn tiles_sit_side_by_side_on_white() -> anyhow::Result<()> {
        let left = codec::decode(&solid_png(3, 2, [0, 0, 0]))?;
        let right = codec::decode(&solid_png(5, 4, [10, 20, 30]))?;
        let canvas = tile_horizontally(&[left, right])?;
        assert_eq!(canvas.dimensions(), (8, 4));
        assert_eq!(canvas.get_pixel(2, 1).0, [0, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(2, 3).0, [255, 255, 255, 255]);
        assert_eq!(canvas.get_pixel(3, 3).0, [10, 20, 30, 255]);
        Ok(())
    }

    #[test]
    fn undecodable_input_is_a_backend_error() {
        let bogus = ImageData::new("image/png", b"nope".to_vec());
        assert!(matches!(
            DryrunClient.generate_wire(&wire("REMOVE_OBJECT", "x", &[bogus])),
            Err(EditorError::Backend(_))
        ));
    }

    #[test]
    fn tint_pulls_channels_toward_the_prompt_color() {
        assert_eq!(blend(0, 255), 63);
        assert_eq!(blend(255, 255), 255);
        assert_eq!(color_from_prompt("boat"), color_from_prompt("boat"));
    }
}
