use crate::errors::{EditorError, EditorResult, ValidationError};
use crate::history::{EditHistory, HistoryEntry};
use crate::image_data::ImageData;
use crate::palette::{ImageDecoder, PaletteStore, RawFile};
use crate::request::{build_request, BuildInput, ContentPart, GenerationRequest, ImageRole};
use crate::selection::{SelectionState, SubjectChange, Transition};
use crate::tasks::{default_task, find_task, resolve_prompt, TaskKind, TaskSpec};

pub const AI_LABEL_PREFIX: &str = "AI: ";
pub const MANUAL_LABEL_PREFIX: &str = "Manual: ";

#[derive(Debug, Default)]
pub struct UploadReport {
    pub added: Vec<String>,
    pub rejected: Vec<EditorError>,
    /// Files beyond the palette's remaining capacity, dropped unread.
    pub dropped: usize,
    pub first_upload: bool,
}

/// The whole editing state, owned by one event loop.
///
/// Every operation reads the current palette and selection when it runs;
/// nothing is captured across a suspended generation call.
#[derive(Debug, Default)]
pub struct EditorSession {
    palette: PaletteStore,
    selection: SelectionState,
    history: EditHistory,
    task: Option<&'static TaskSpec>,
    prompt: String,
    baseline: Option<ImageData>,
    loading: bool,
    last_error: Option<String>,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn palette(&self) -> &PaletteStore {
        &self.palette
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn task(&self) -> Option<&'static TaskSpec> {
        self.task
    }

    pub fn task_kind(&self) -> Option<TaskKind> {
        self.task.map(TaskSpec::kind)
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Comparison image shown next to the current result.
    pub fn baseline(&self) -> Option<&ImageData> {
        self.baseline.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn current_image(&self) -> Option<&ImageData> {
        self.history.current().map(|entry| &entry.image).or_else(|| {
            self.selection
                .active_image_id
                .as_deref()
                .and_then(|id| self.palette.get(id))
                .map(|entry| &entry.image)
        })
    }

    /// Whether the generate control should be enabled.
    pub fn can_generate(&self) -> bool {
        if self.loading {
            return false;
        }
        match self.task_kind() {
            None => false,
            Some(TaskKind::Collage) => self.palette.len() >= 2,
            Some(TaskKind::FaceSwap) => {
                self.selection.source_id.is_some() && self.selection.target_id.is_some()
            }
            Some(TaskKind::Single) => self.current_image().is_some(),
        }
    }

    pub fn upload(&mut self, files: Vec<RawFile>, decoder: &dyn ImageDecoder) -> UploadReport {
        self.last_error = None;
        let offered = files.len();
        let admitted = self.palette.admit(files);
        let dropped = offered - admitted.len();
        let was_empty = self.palette.is_empty();

        let outcome = self.palette.add(admitted, decoder);
        if let Some(err) = outcome.rejected.first() {
            self.last_error = Some(err.to_string());
        }
        let mut report = UploadReport {
            added: outcome.added.iter().map(|entry| entry.id.clone()).collect(),
            rejected: outcome.rejected,
            dropped,
            first_upload: false,
        };
        let Some(first_new) = report.added.first().cloned() else {
            return report;
        };

        if was_empty && self.task.is_none() {
            report.first_upload = true;
            self.start_with_default_task(&first_new);
        } else if self.task_kind() == Some(TaskKind::FaceSwap) {
            self.selection = std::mem::take(&mut self.selection).assign_face_swap_defaults(&self.palette);
        } else if self.selection.active_image_id.is_none()
            && self.task_kind() != Some(TaskKind::Collage)
        {
            let transition = std::mem::take(&mut self.selection).select_image(&first_new);
            self.apply(transition);
        }
        report
    }

    /// A camera capture is a one-file batch admitted only while there is room.
    pub fn capture(&mut self, file: RawFile, decoder: &dyn ImageDecoder) -> UploadReport {
        if self.palette.is_full() {
            return UploadReport {
                dropped: 1,
                ..UploadReport::default()
            };
        }
        self.upload(vec![file], decoder)
    }

    pub fn remove_image(&mut self, id: &str) -> bool {
        if self.palette.remove(id).is_none() {
            return false;
        }
        let transition = std::mem::take(&mut self.selection).on_image_removed(id, &self.palette);
        self.apply(transition);
        true
    }

    /// Empties the palette and tears the history down. The task and prompt
    /// stay, so the next upload follows that task's selection rules.
    pub fn reset_palette(&mut self) -> Vec<String> {
        let removed = self
            .palette
            .images()
            .iter()
            .map(|image| image.id.clone())
            .collect();
        self.palette.clear();
        self.apply(Transition {
            selection: SelectionState::default(),
            subject: SubjectChange::Cleared,
        });
        self.last_error = None;
        removed
    }

    pub fn select_task(&mut self, task_id: &str) -> EditorResult<&'static TaskSpec> {
        let task = find_task(task_id)
            .ok_or_else(|| ValidationError::UnknownTask(task_id.trim().to_string()))?;
        self.task = Some(task);
        let transition = std::mem::take(&mut self.selection).select_task(task.kind(), &self.palette);
        self.apply(transition);
        self.prompt = resolve_prompt(Some(task.id));
        Ok(task)
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Palette click. Routed to the face-swap rules while face swap is active.
    pub fn select_image(&mut self, id: &str) -> EditorResult<()> {
        if !self.palette.contains(id) {
            return Err(ValidationError::UnknownImage(id.to_string()).into());
        }
        if self.task_kind() == Some(TaskKind::FaceSwap) {
            self.selection = std::mem::take(&mut self.selection).select_face_swap_image(id);
            return Ok(());
        }
        let transition = std::mem::take(&mut self.selection).select_image(id);
        self.apply(transition);
        Ok(())
    }

    pub fn select_face_swap_image(&mut self, id: &str) -> EditorResult<()> {
        if !self.palette.contains(id) {
            return Err(ValidationError::UnknownImage(id.to_string()).into());
        }
        self.selection = std::mem::take(&mut self.selection).select_face_swap_image(id);
        Ok(())
    }

    pub fn apply_manual_edit(
        &mut self,
        image: ImageData,
        label: &str,
    ) -> EditorResult<&HistoryEntry> {
        if self.current_image().is_none() {
            return Err(ValidationError::NoCurrentImage.into());
        }
        Ok(self.history.push(image, format!("{MANUAL_LABEL_PREFIX}{label}")))
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo()
    }

    pub fn revert_to(&mut self, index: usize) -> bool {
        self.history.revert_to(index)
    }

    pub fn clear_history(&mut self) {
        self.history.clear_to_original();
    }

    /// Validates and builds the request, then enters the loading state.
    ///
    /// Palette and selection are read here, not when the user clicked.
    pub fn begin_generation(&mut self) -> EditorResult<GenerationRequest> {
        if self.loading {
            return Err(ValidationError::GenerationInFlight.into());
        }
        let built = build_request(&BuildInput {
            task: self.task,
            prompt: &self.prompt,
            palette: &self.palette,
            selection: &self.selection,
            history: &self.history,
        });
        match built {
            Ok(request) => {
                self.loading = true;
                self.last_error = None;
                Ok(request)
            }
            Err(err) => {
                let err = EditorError::from(err);
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Leaves the loading state. Failures never touch the history.
    pub fn complete_generation(
        &mut self,
        request: &GenerationRequest,
        outcome: EditorResult<ImageData>,
    ) -> EditorResult<&HistoryEntry> {
        self.loading = false;
        let image = match outcome {
            Ok(image) => image,
            Err(err) => {
                self.last_error = Some(err.to_string());
                return Err(err);
            }
        };
        self.last_error = None;
        if let Some(baseline) = reconciled_baseline(request) {
            self.baseline = Some(baseline);
        }
        // A task picked before any upload never ran `initialize`; the first
        // result still lands above an original.
        if self.history.is_empty() {
            if let Some(baseline) = self.baseline.clone() {
                self.history.initialize(baseline);
            }
        }
        let label = format!("{AI_LABEL_PREFIX}{}", request.task_name());
        Ok(self.history.push(image, label))
    }

    /// Runs a full generate cycle against a synchronous backend call.
    pub fn generate_with<F>(&mut self, call: F) -> EditorResult<&HistoryEntry>
    where
        F: FnOnce(&GenerationRequest) -> EditorResult<ImageData>,
    {
        let request = self.begin_generation()?;
        let outcome = call(&request);
        self.complete_generation(&request, outcome)
    }

    fn start_with_default_task(&mut self, first_new: &str) {
        let task = default_task();
        self.task = Some(task);
        self.prompt = resolve_prompt(Some(task.id));
        let transition = std::mem::take(&mut self.selection).select_task(task.kind(), &self.palette);
        let on_first = matches!(&transition.subject, SubjectChange::Reset(id) if id == first_new);
        if on_first {
            self.apply(transition);
        } else {
            self.apply(transition.selection.select_image(first_new));
        }
    }

    fn apply(&mut self, transition: Transition) {
        self.selection = transition.selection;
        match transition.subject {
            SubjectChange::Unchanged => {}
            SubjectChange::Reset(id) => {
                if let Some(entry) = self.palette.get(&id) {
                    let image = entry.image.clone();
                    self.history.initialize(image.clone());
                    self.baseline = Some(image);
                    self.last_error = None;
                }
            }
            SubjectChange::Cleared => {
                self.history.teardown();
                self.baseline = None;
            }
        }
    }
}

/// Face swap compares against the target it was sent, collage against the
/// first member; single-image tasks keep their baseline.
fn reconciled_baseline(request: &GenerationRequest) -> Option<ImageData> {
    let wanted = match request.kind() {
        TaskKind::FaceSwap => ImageRole::Target,
        TaskKind::Collage => ImageRole::CollageMember,
        TaskKind::Single => return None,
    };
    request.parts().iter().find_map(|part| match part {
        ContentPart::Image { image, role } if *role == wanted => Some(image.clone()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::history::ORIGINAL_LABEL;
    use crate::palette::tests::{files, StubDecoder};
    use crate::tasks::{COLLAGE_TASK_ID, FACE_SWAP_TASK_ID};

    fn labels(session: &EditorSession) -> Vec<String> {
        session
            .history()
            .entries()
            .iter()
            .map(|entry| entry.label.clone())
            .collect()
    }

    fn ok_image(tag: &str) -> EditorResult<ImageData> {
        Ok(ImageData::new("image/png", tag.as_bytes().to_vec()))
    }

    #[test]
    fn first_upload_selects_default_task_and_first_image() {
        let mut session = EditorSession::new();
        let report = session.upload(files(&["a.png"]), &StubDecoder);
        assert!(report.first_upload);
        assert_eq!(session.task().map(|task| task.id), Some(default_task().id));
        assert_eq!(session.prompt(), resolve_prompt(Some(default_task().id)));
        assert_eq!(session.selection().active_image_id.as_deref(), Some("img-1"));
        assert_eq!(labels(&session), vec![ORIGINAL_LABEL.to_string()]);
        assert_eq!(session.history().cursor(), Some(0));
        assert_eq!(session.baseline().map(|image| image.bytes()), Some(&b"a.png"[..]));
    }

    #[test]
    fn single_edit_flow() -> anyhow::Result<()> {
        let mut session = EditorSession::new();
        session.upload(files(&["a.png"]), &StubDecoder);

        session.apply_manual_edit(ImageData::new("image/png", b"flipped".to_vec()), "Flip horizontal")?;
        assert_eq!(labels(&session), vec![ORIGINAL_LABEL, "Manual: Flip horizontal"]);
        assert_eq!(session.history().cursor(), Some(1));

        assert!(session.undo());
        assert_eq!(session.history().cursor(), Some(0));
        assert_eq!(session.current_image().map(|image| image.bytes()), Some(&b"a.png"[..]));

        let sent = std::cell::RefCell::new(Vec::new());
        session.generate_with(|request| {
            sent.borrow_mut().extend(request.ordered_images().map(|(image, _)| image.bytes().to_vec()));
            ok_image("generated")
        })?;
        assert_eq!(sent.into_inner(), vec![b"a.png".to_vec()]);
        let expected_ai = format!("AI: {}", default_task().name);
        assert_eq!(labels(&session), vec![ORIGINAL_LABEL.to_string(), expected_ai]);
        assert_eq!(session.history().cursor(), Some(1));
        assert!(!session.is_loading());
        Ok(())
    }

    #[test]
    fn failed_generation_leaves_history_untouched() {
        let mut session = EditorSession::new();
        session.upload(files(&["a.png"]), &StubDecoder);
        let result = session
            .generate_with(|_| Err(EditorError::Backend("quota exceeded".to_string())))
            .map(|entry| entry.id.clone());
        assert_eq!(result, Err(EditorError::Backend("quota exceeded".to_string())));
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.last_error(), Some("backend error: quota exceeded"));
        assert!(!session.is_loading());
    }

    #[test]
    fn reentrant_generation_is_rejected_while_loading() -> anyhow::Result<()> {
        let mut session = EditorSession::new();
        session.upload(files(&["a.png"]), &StubDecoder);
        let request = session.begin_generation()?;
        assert!(session.is_loading());
        assert!(!session.can_generate());
        assert_eq!(
            session.begin_generation().err(),
            Some(EditorError::Validation(ValidationError::GenerationInFlight))
        );
        session.complete_generation(&request, ok_image("done"))?;
        assert!(session.can_generate());
        Ok(())
    }

    #[test]
    fn edits_during_loading_are_not_blocked() -> anyhow::Result<()> {
        let mut session = EditorSession::new();
        session.upload(files(&["a.png"]), &StubDecoder);
        let request = session.begin_generation()?;
        session.upload(files(&["b.png"]), &StubDecoder);
        assert_eq!(session.palette().len(), 2);
        session.complete_generation(&request, ok_image("done"))?;
        assert_eq!(session.history().len(), 2);
        Ok(())
    }

    #[test]
    fn validation_failure_surfaces_message_and_skips_backend() {
        let mut session = EditorSession::new();
        session.upload(files(&["a.png"]), &StubDecoder);
        session.set_prompt("");
        let mut called = false;
        let result = session
            .generate_with(|_| {
                called = true;
                ok_image("never")
            })
            .map(|entry| entry.id.clone());
        assert!(!called);
        assert_eq!(result, Err(EditorError::Validation(ValidationError::EmptyPrompt)));
        assert_eq!(session.last_error(), Some("prompt text is empty"));
        assert!(!session.is_loading());
    }

    #[test]
    fn collage_minimum_scenario() -> anyhow::Result<()> {
        let mut session = EditorSession::new();
        session.upload(files(&["a.png", "b.png"]), &StubDecoder);
        session.select_task(COLLAGE_TASK_ID)?;
        assert!(!session.prompt().is_empty());
        let request = session.begin_generation()?;
        assert_eq!(request.parts().len(), 3);
        assert!(matches!(request.parts()[0], ContentPart::Text(_)));
        session.complete_generation(&request, ok_image("collage"))?;
        assert_eq!(session.baseline().map(|image| image.bytes()), Some(&b"a.png"[..]));
        Ok(())
    }

    #[test]
    fn face_swap_baseline_becomes_target() -> anyhow::Result<()> {
        let mut session = EditorSession::new();
        session.upload(files(&["a.png", "b.png"]), &StubDecoder);
        session.select_task(FACE_SWAP_TASK_ID)?;
        assert_eq!(session.selection().active_image_id, None);
        session.select_image("img-2")?;
        session.select_image("img-1")?;
        assert_eq!(session.selection().source_id.as_deref(), Some("img-2"));
        assert_eq!(session.selection().target_id.as_deref(), Some("img-1"));

        session.generate_with(|_| ok_image("swapped"))?;
        assert_eq!(session.baseline().map(|image| image.bytes()), Some(&b"a.png"[..]));
        assert_eq!(
            session.history().current().map(|entry| entry.label.clone()),
            Some("AI: Face swap".to_string())
        );
        Ok(())
    }

    #[test]
    fn removal_during_face_swap_keeps_target() -> anyhow::Result<()> {
        let mut session = EditorSession::new();
        session.upload(files(&["a.png", "b.png"]), &StubDecoder);
        session.select_task(FACE_SWAP_TASK_ID)?;
        session.select_face_swap_image("img-1")?;
        session.select_face_swap_image("img-2")?;
        assert!(session.remove_image("img-1"));
        assert_eq!(session.selection().source_id, None);
        assert_eq!(session.selection().target_id.as_deref(), Some("img-2"));
        Ok(())
    }

    #[test]
    fn upload_in_face_swap_mode_auto_assigns() -> anyhow::Result<()> {
        let mut session = EditorSession::new();
        session.upload(files(&["a.png"]), &StubDecoder);
        session.select_task(FACE_SWAP_TASK_ID)?;
        session.upload(files(&["b.png", "c.png"]), &StubDecoder);
        assert_eq!(session.selection().source_id.as_deref(), Some("img-1"));
        assert_eq!(session.selection().target_id.as_deref(), Some("img-2"));
        assert!(session.can_generate());
        Ok(())
    }

    #[test]
    fn removing_last_image_tears_down_history() {
        let mut session = EditorSession::new();
        session.upload(files(&["a.png"]), &StubDecoder);
        assert!(session.remove_image("img-1"));
        assert!(session.history().is_empty());
        assert_eq!(session.history().cursor(), None);
        assert!(session.baseline().is_none());
        assert!(session.current_image().is_none());
        assert!(!session.remove_image("img-1"));
    }

    #[test]
    fn selecting_new_image_resets_history() -> anyhow::Result<()> {
        let mut session = EditorSession::new();
        session.upload(files(&["a.png", "b.png"]), &StubDecoder);
        session.apply_manual_edit(ImageData::new("image/png", b"x".to_vec()), "Crop")?;
        session.select_image("img-2")?;
        assert_eq!(labels(&session), vec![ORIGINAL_LABEL]);
        assert_eq!(session.current_image().map(|image| image.bytes()), Some(&b"b.png"[..]));
        Ok(())
    }

    #[test]
    fn unknown_ids_are_validation_errors() {
        let mut session = EditorSession::new();
        assert!(matches!(
            session.select_task("NOPE"),
            Err(EditorError::Validation(ValidationError::UnknownTask(_)))
        ));
        assert!(matches!(
            session.select_image("img-7"),
            Err(EditorError::Validation(ValidationError::UnknownImage(_)))
        ));
    }

    #[test]
    fn decode_failures_are_reported_per_file() {
        let mut session = EditorSession::new();
        let report = session.upload(files(&["bad.png", "b.png"]), &StubDecoder);
        assert_eq!(report.added, vec!["img-1".to_string()]);
        assert_eq!(report.rejected.len(), 1);
        assert!(session.last_error().is_some_and(|msg| msg.contains("bad.png")));
        assert_eq!(session.selection().active_image_id.as_deref(), Some("img-1"));
    }

    #[test]
    fn capture_is_dropped_when_palette_is_full() {
        let mut session = EditorSession::new();
        let report = session.upload(files(&["a.png", "b.png", "c.png", "d.png", "e.png"]), &StubDecoder);
        assert_eq!(report.dropped, 1);
        let report = session.capture(files(&["cam.png"]).remove(0), &StubDecoder);
        assert_eq!(report.dropped, 1);
        assert!(report.added.is_empty());
        assert_eq!(session.palette().len(), 4);
    }

    #[test]
    fn clear_history_returns_to_original() -> anyhow::Result<()> {
        let mut session = EditorSession::new();
        session.upload(files(&["a.png"]), &StubDecoder);
        session.apply_manual_edit(ImageData::new("image/png", b"x".to_vec()), "Crop")?;
        session.apply_manual_edit(ImageData::new("image/png", b"y".to_vec()), "Crop")?;
        session.clear_history();
        assert_eq!(labels(&session), vec![ORIGINAL_LABEL]);
        assert!(!session.redo());
        Ok(())
    }

    #[test]
    fn task_chosen_before_upload_still_records_an_original() -> anyhow::Result<()> {
        let mut session = EditorSession::new();
        session.select_task(FACE_SWAP_TASK_ID)?;
        let report = session.upload(files(&["a.png", "b.png"]), &StubDecoder);
        assert!(!report.first_upload);
        assert!(session.history().is_empty());

        session.generate_with(|_| ok_image("swapped"))?;
        assert_eq!(labels(&session), vec![ORIGINAL_LABEL, "AI: Face swap"]);
        let original = session.history().original().map(|entry| entry.image.bytes().to_vec());
        assert_eq!(original, Some(b"b.png".to_vec()));

        session.clear_history();
        assert_eq!(session.current_image().map(|image| image.bytes()), Some(&b"b.png"[..]));
        Ok(())
    }

    #[test]
    fn collage_before_upload_uses_first_member_as_original() -> anyhow::Result<()> {
        let mut session = EditorSession::new();
        session.select_task(COLLAGE_TASK_ID)?;
        session.upload(files(&["a.png", "b.png"]), &StubDecoder);
        session.generate_with(|_| ok_image("collage"))?;
        assert_eq!(labels(&session), vec![ORIGINAL_LABEL, "AI: Photo collage"]);
        assert_eq!(session.history().cursor(), Some(1));
        Ok(())
    }

    #[test]
    fn reset_palette_clears_images_and_history_but_keeps_task() -> anyhow::Result<()> {
        let mut session = EditorSession::new();
        session.upload(files(&["a.png", "b.png"]), &StubDecoder);
        session.apply_manual_edit(ImageData::new("image/png", b"x".to_vec()), "Crop")?;

        let removed = session.reset_palette();
        assert_eq!(removed, vec!["img-1", "img-2"]);
        assert!(session.palette().is_empty());
        assert!(session.history().is_empty());
        assert_eq!(session.baseline(), None);
        assert_eq!(session.selection(), &SelectionState::default());
        assert_eq!(session.task().map(|task| task.id), Some(default_task().id));
        assert!(!session.can_generate());

        let report = session.upload(files(&["c.png"]), &StubDecoder);
        assert!(!report.first_upload);
        assert_eq!(session.selection().active_image_id.as_deref(), Some("img-3"));
        assert_eq!(labels(&session), vec![ORIGINAL_LABEL]);
        Ok(())
    }
}
