use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use retouch_contracts::clients::GenerationClient;
use retouch_contracts::commands::{CropRect, FlipAxis};
use retouch_contracts::events::{self, payload, EventPayload, SessionEventLog};
use retouch_contracts::export::{self, HistoryManifest};
use retouch_contracts::history::HistoryEntry;
use retouch_contracts::palette::RawFile;
use retouch_contracts::session::{EditorSession, UploadReport};
use retouch_contracts::tasks::TaskSpec;
use retouch_contracts::{EditorError, EditorResult, ValidationError};
use serde_json::Value;
use tracing::{info, warn};

use crate::decoder::UploadDecoder;
use crate::edits::{self, ManualEdit};

/// Drives one `EditorSession` against a generation client, logging every
/// state change to the session event log.
pub struct NativeEditor {
    session: EditorSession,
    client: Box<dyn GenerationClient>,
    decoder: UploadDecoder,
    events: SessionEventLog,
}

impl NativeEditor {
    pub fn new(client: Box<dyn GenerationClient>, events: SessionEventLog) -> Self {
        let editor = Self {
            session: EditorSession::new(),
            client,
            decoder: UploadDecoder::default(),
            events,
        };
        editor.record(
            events::SESSION_STARTED,
            payload([("backend", editor.client.name())]),
        );
        info!(session_id = editor.session_id(), backend = editor.client.name(), "session started");
        editor
    }

    pub fn with_decoder(mut self, decoder: UploadDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn session_id(&self) -> &str {
        self.events.session_id()
    }

    pub fn backend_name(&self) -> &str {
        self.client.name()
    }

    pub fn events_path(&self) -> Option<&Path> {
        self.events.path()
    }

    /// Reads and adds files. Unreadable paths are reported like undecodable ones.
    pub fn upload_paths(&mut self, paths: &[PathBuf]) -> UploadReport {
        let mut unreadable = Vec::new();
        let mut files = Vec::new();
        for path in paths {
            match read_raw_file(path) {
                Ok(file) => files.push(file),
                Err(err) => unreadable.push(err),
            }
        }
        for err in &unreadable {
            self.record_rejection(err);
        }
        let mut report = self.upload(files);
        unreadable.extend(report.rejected);
        report.rejected = unreadable;
        report
    }

    pub fn upload(&mut self, files: Vec<RawFile>) -> UploadReport {
        let report = self.session.upload(files, &self.decoder);
        self.record_upload(&report);
        report
    }

    pub fn capture_path(&mut self, path: &Path) -> UploadReport {
        match read_raw_file(path) {
            Ok(file) => self.capture(file),
            Err(err) => {
                self.record_rejection(&err);
                UploadReport {
                    rejected: vec![err],
                    ..UploadReport::default()
                }
            }
        }
    }

    pub fn capture(&mut self, file: RawFile) -> UploadReport {
        let report = self.session.capture(file, &self.decoder);
        self.record_upload(&report);
        report
    }

    pub fn remove_image(&mut self, id: &str) -> bool {
        let removed = self.session.remove_image(id);
        if removed {
            self.record(
                events::IMAGE_REMOVED,
                payload([
                    ("image_id", Value::from(id)),
                    ("palette_size", Value::from(self.session.palette().len())),
                ]),
            );
        }
        removed
    }

    /// Drops every image and the history; returns the removed ids.
    pub fn reset_palette(&mut self) -> Vec<String> {
        let removed = self.session.reset_palette();
        self.record(
            events::PALETTE_RESET,
            payload([("image_ids", Value::from(removed.clone()))]),
        );
        removed
    }

    pub fn select_task(&mut self, task_id: &str) -> EditorResult<&'static TaskSpec> {
        let task = self.session.select_task(task_id)?;
        self.record(
            events::TASK_SELECTED,
            payload([("task_id", task.id), ("task_name", task.name)]),
        );
        Ok(task)
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.session.set_prompt(prompt);
    }

    pub fn select_image(&mut self, id: &str) -> EditorResult<()> {
        self.session.select_image(id)
    }

    pub fn flip(&mut self, axis: FlipAxis) -> EditorResult<HistoryEntry> {
        let edit = edits::flip(self.require_current()?, axis)?;
        self.apply_manual(edit)
    }

    pub fn crop(&mut self, rect: CropRect) -> EditorResult<HistoryEntry> {
        let edit = edits::crop(self.require_current()?, rect)?;
        self.apply_manual(edit)
    }

    pub fn undo(&mut self) -> bool {
        let moved = self.session.undo();
        self.record_move("undo", moved);
        moved
    }

    pub fn redo(&mut self) -> bool {
        let moved = self.session.redo();
        self.record_move("redo", moved);
        moved
    }

    pub fn revert_to(&mut self, index: usize) -> bool {
        let moved = self.session.revert_to(index);
        self.record_move("revert", moved);
        moved
    }

    pub fn clear_history(&mut self) {
        self.session.clear_history();
        self.record(events::HISTORY_CLEARED, EventPayload::new());
    }

    /// One full generate cycle. Validation failures never reach the client.
    pub fn generate(&mut self) -> EditorResult<HistoryEntry> {
        let request = match self.session.begin_generation() {
            Ok(request) => request,
            Err(err) => {
                self.record_failure(None, &err);
                return Err(err);
            }
        };
        self.record(
            events::GENERATION_STARTED,
            payload([
                ("task_id", Value::from(request.task_id())),
                ("images", Value::from(request.image_count())),
                ("backend", Value::from(self.client.name())),
            ]),
        );
        info!(task_id = request.task_id(), images = request.image_count(), "generation started");

        let outcome = self.client.generate(&request);
        match self.session.complete_generation(&request, outcome) {
            Ok(entry) => {
                let entry = entry.clone();
                self.record(
                    events::GENERATION_SUCCEEDED,
                    payload([
                        ("task_id", Value::from(request.task_id())),
                        ("mime_type", Value::from(entry.image.mime_type())),
                        ("bytes", Value::from(entry.image.len())),
                    ]),
                );
                self.record_push(&entry);
                Ok(entry)
            }
            Err(err) => {
                self.record_failure(Some(request.task_id()), &err);
                Err(err)
            }
        }
    }

    pub fn export_history(&self, dir: &Path) -> Result<HistoryManifest> {
        let manifest = export::export_history(self.session.history(), self.session_id(), dir)?;
        info!(dir = %dir.display(), entries = manifest.entries.len(), "history exported");
        Ok(manifest)
    }

    pub fn save_current(&self, path: &Path) -> Result<PathBuf> {
        let image = self
            .session
            .current_image()
            .context("there is no current image to save")?;
        export::save_image(image, path)
    }

    fn require_current(&self) -> EditorResult<&retouch_contracts::ImageData> {
        self.session
            .current_image()
            .ok_or(EditorError::Validation(ValidationError::NoCurrentImage))
    }

    fn apply_manual(&mut self, edit: ManualEdit) -> EditorResult<HistoryEntry> {
        let entry = self.session.apply_manual_edit(edit.image, edit.label)?.clone();
        self.record_push(&entry);
        Ok(entry)
    }

    fn record_upload(&self, report: &UploadReport) {
        for err in &report.rejected {
            self.record_rejection(err);
        }
        if report.added.is_empty() && report.dropped == 0 {
            return;
        }
        self.record(
            events::IMAGES_ADDED,
            payload([
                ("image_ids", Value::from(report.added.clone())),
                ("dropped", Value::from(report.dropped)),
                ("palette_size", Value::from(self.session.palette().len())),
                ("first_upload", Value::from(report.first_upload)),
            ]),
        );
        if report.dropped > 0 {
            warn!(dropped = report.dropped, "palette full; extra files ignored");
        }
    }

    fn record_rejection(&self, err: &EditorError) {
        warn!(error = %err, "upload rejected");
        let file_name = match err {
            EditorError::FileRead { file_name, .. } => file_name.clone(),
            _ => String::new(),
        };
        self.record(
            events::IMAGE_REJECTED,
            payload([("file_name", file_name), ("error", err.to_string())]),
        );
    }

    fn record_push(&self, entry: &HistoryEntry) {
        let history = self.session.history();
        self.record(
            events::HISTORY_PUSHED,
            payload([
                ("entry_id", Value::from(entry.id.as_str())),
                ("label", Value::from(entry.label.as_str())),
                ("cursor", Value::from(history.cursor())),
                ("length", Value::from(history.len())),
            ]),
        );
    }

    fn record_move(&self, action: &str, moved: bool) {
        if !moved {
            return;
        }
        self.record(
            events::HISTORY_MOVED,
            payload([
                ("action", Value::from(action)),
                ("cursor", Value::from(self.session.history().cursor())),
            ]),
        );
    }

    fn record_failure(&self, task_id: Option<&str>, err: &EditorError) {
        warn!(task_id, error_kind = err.kind().as_str(), error = %err, "generation failed");
        self.record(
            events::GENERATION_FAILED,
            payload([
                ("task_id", Value::from(task_id)),
                ("error_kind", Value::from(err.kind().as_str())),
                ("error", Value::from(err.to_string())),
            ]),
        );
    }

    fn record(&self, event_type: &str, payload: EventPayload) {
        if let Err(err) = self.events.emit(event_type, payload) {
            warn!(event_type, error = %err, "failed to write session event");
        }
    }
}

fn read_raw_file(path: &Path) -> EditorResult<RawFile> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let bytes = std::fs::read(path).map_err(|err| EditorError::file_read(&name, err.to_string()))?;
    Ok(RawFile::new(name, bytes))
}
