use crate::image_data::ImageData;

pub const ORIGINAL_LABEL: &str = "original";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: String,
    pub image: ImageData,
    pub label: String,
}

/// Linear undo/redo history of one editing subject.
///
/// `entries[0]` is the subject's original. The cursor marks the displayed
/// entry and is `None` only while the history is empty. Undo and redo move
/// the cursor and never drop entries; only `push` discards the redo tail.
#[derive(Debug, Clone, Default)]
pub struct EditHistory {
    entries: Vec<HistoryEntry>,
    cursor: Option<usize>,
    next_seq: u64,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the session with a single `original` entry.
    pub fn initialize(&mut self, base: ImageData) {
        self.entries.clear();
        let entry = self.entry(base, ORIGINAL_LABEL.to_string());
        self.entries.push(entry);
        self.cursor = Some(0);
    }

    /// Full teardown; the only operation that drops `entries[0]`.
    pub fn teardown(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    /// Drops the redo tail, appends, and moves the cursor onto the new entry.
    pub fn push(&mut self, image: ImageData, label: impl Into<String>) -> &HistoryEntry {
        let keep = self.cursor.map(|cursor| cursor + 1).unwrap_or(0);
        self.entries.truncate(keep);
        let entry = self.entry(image, label.into());
        self.entries.push(entry);
        let last = self.entries.len() - 1;
        self.cursor = Some(last);
        &self.entries[last]
    }

    /// Moves the cursor; out-of-range indices are ignored.
    pub fn revert_to(&mut self, index: usize) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        self.cursor = Some(index);
        true
    }

    pub fn undo(&mut self) -> bool {
        match self.cursor {
            Some(cursor) if cursor > 0 => self.revert_to(cursor - 1),
            _ => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.cursor {
            Some(cursor) if self.can_redo() => self.revert_to(cursor + 1),
            _ => false,
        }
    }

    pub fn clear_to_original(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.entries.truncate(1);
        self.cursor = Some(0);
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|cursor| cursor > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor
            .is_some_and(|cursor| cursor + 1 < self.entries.len())
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.cursor.and_then(|cursor| self.entries.get(cursor))
    }

    pub fn original(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }

    fn entry(&mut self, image: ImageData, label: String) -> HistoryEntry {
        self.next_seq += 1;
        HistoryEntry {
            id: format!("h{}", self.next_seq),
            image,
            label,
        }
    }
}
