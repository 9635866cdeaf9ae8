use serde::Serialize;

use crate::errors::ValidationError;
use crate::history::EditHistory;
use crate::image_data::ImageData;
use crate::palette::PaletteStore;
use crate::selection::SelectionState;
use crate::tasks::{freeform_instruction, TaskKind, TaskSpec};

pub const MIN_COLLAGE_IMAGES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageRole {
    /// The image being edited by a single-image task.
    Subject,
    /// Face swap: scene and body, sent first.
    Target,
    /// Face swap: face donor, sent second.
    Source,
    CollageMember,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    Image { image: ImageData, role: ImageRole },
}

/// A fully validated backend request. Built fresh per generate call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    task_id: String,
    task_name: String,
    kind: TaskKind,
    prompt_text: String,
    parts: Vec<ContentPart>,
}

impl GenerationRequest {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// The text part as sent, after any free-form wrapping.
    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    pub fn parts(&self) -> &[ContentPart] {
        &self.parts
    }

    pub fn ordered_images(&self) -> impl Iterator<Item = (&ImageData, ImageRole)> {
        self.parts.iter().filter_map(|part| match part {
            ContentPart::Image { image, role } => Some((image, *role)),
            ContentPart::Text(_) => None,
        })
    }

    pub fn image_count(&self) -> usize {
        self.ordered_images().count()
    }
}

/// Snapshot of session state the builder reads at build time.
#[derive(Debug, Clone, Copy)]
pub struct BuildInput<'a> {
    pub task: Option<&'a TaskSpec>,
    pub prompt: &'a str,
    pub palette: &'a PaletteStore,
    pub selection: &'a SelectionState,
    pub history: &'a EditHistory,
}

/// Validates the task's preconditions, then assembles the ordered parts.
///
/// Nothing touches image bytes until every check has passed.
pub fn build_request(input: &BuildInput<'_>) -> Result<GenerationRequest, ValidationError> {
    let task = input.task.ok_or(ValidationError::NoTask)?;
    if input.prompt.trim().is_empty() {
        return Err(ValidationError::EmptyPrompt);
    }
    let kind = task.kind();
    let text = if task.is_freeform() {
        freeform_instruction(input.prompt)
    } else {
        input.prompt.to_string()
    };

    let parts = match kind {
        TaskKind::Collage => collage_parts(input.palette, text)?,
        TaskKind::FaceSwap => face_swap_parts(input.palette, input.selection, text)?,
        TaskKind::Single => single_parts(input, text)?,
    };

    let prompt_text = parts
        .iter()
        .find_map(|part| match part {
            ContentPart::Text(text) => Some(text.clone()),
            ContentPart::Image { .. } => None,
        })
        .unwrap_or_default();

    Ok(GenerationRequest {
        task_id: task.id.to_string(),
        task_name: task.name.to_string(),
        kind,
        prompt_text,
        parts,
    })
}

fn collage_parts(palette: &PaletteStore, text: String) -> Result<Vec<ContentPart>, ValidationError> {
    if palette.len() < MIN_COLLAGE_IMAGES {
        return Err(ValidationError::InsufficientImages {
            required: MIN_COLLAGE_IMAGES,
            available: palette.len(),
        });
    }
    let mut parts = Vec::with_capacity(palette.len() + 1);
    parts.push(ContentPart::Text(text));
    parts.extend(palette.images().iter().map(|entry| ContentPart::Image {
        image: entry.image.clone(),
        role: ImageRole::CollageMember,
    }));
    Ok(parts)
}

// The backend template calls the first image the scene and the second the
// face donor, so target must precede source.
fn face_swap_parts(
    palette: &PaletteStore,
    selection: &SelectionState,
    text: String,
) -> Result<Vec<ContentPart>, ValidationError> {
    let source = selection
        .source_id
        .as_deref()
        .and_then(|id| palette.get(id))
        .ok_or(ValidationError::MissingFaceSwapSource)?;
    let target = selection
        .target_id
        .as_deref()
        .and_then(|id| palette.get(id))
        .ok_or(ValidationError::MissingFaceSwapTarget)?;
    Ok(vec![
        ContentPart::Image {
            image: target.image.clone(),
            role: ImageRole::Target,
        },
        ContentPart::Image {
            image: source.image.clone(),
            role: ImageRole::Source,
        },
        ContentPart::Text(text),
    ])
}

fn single_parts(input: &BuildInput<'_>, text: String) -> Result<Vec<ContentPart>, ValidationError> {
    let selected = input
        .selection
        .active_image_id
        .as_deref()
        .and_then(|id| input.palette.get(id));
    // Edits keep the declared type of the image the subject started from.
    let original_mime = selected
        .map(|entry| entry.mime_type())
        .or_else(|| input.history.original().map(|entry| entry.image.mime_type()))
        .ok_or(ValidationError::NoCurrentImage)?;
    let current = input
        .history
        .current()
        .map(|entry| &entry.image)
        .or_else(|| selected.map(|entry| &entry.image))
        .ok_or(ValidationError::NoCurrentImage)?;
    Ok(vec![
        ContentPart::Image {
            image: current.with_mime_type(original_mime),
            role: ImageRole::Subject,
        },
        ContentPart::Text(text),
    ])
}
