use crate::palette::PaletteStore;
use crate::tasks::TaskKind;

/// Which palette images are picked, per task kind.
///
/// `active_image_id` drives single-image tasks; `source_id`/`target_id`
/// drive face swap. Collage reads the whole palette and owns no field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub active_image_id: Option<String>,
    pub source_id: Option<String>,
    pub target_id: Option<String>,
}

/// Effect a transition has on the editing subject's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectChange {
    Unchanged,
    /// Start a fresh history from this palette image.
    Reset(String),
    /// Nothing left to edit: tear the history down.
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub selection: SelectionState,
    pub subject: SubjectChange,
}

impl Transition {
    fn unchanged(selection: SelectionState) -> Self {
        Self {
            selection,
            subject: SubjectChange::Unchanged,
        }
    }
}

impl SelectionState {
    pub fn select_task(mut self, kind: TaskKind, palette: &PaletteStore) -> Transition {
        if kind == TaskKind::FaceSwap {
            self.active_image_id = None;
            return Transition::unchanged(self);
        }
        self.source_id = None;
        self.target_id = None;
        if kind == TaskKind::Collage || self.active_image_id.is_some() {
            return Transition::unchanged(self);
        }
        match palette.first() {
            Some(first) => {
                let id = first.id.clone();
                self.select_image(&id)
            }
            None => Transition::unchanged(self),
        }
    }

    pub fn select_image(mut self, id: &str) -> Transition {
        self.active_image_id = Some(id.to_string());
        Transition {
            selection: self,
            subject: SubjectChange::Reset(id.to_string()),
        }
    }

    /// Click handling in face-swap mode. Branch order matters.
    pub fn select_face_swap_image(mut self, id: &str) -> SelectionState {
        if self.source_id.as_deref() == Some(id) {
            self.source_id = None;
            self.target_id = None;
        } else if self.target_id.as_deref() == Some(id) {
            self.target_id = None;
        } else if self.source_id.is_none() {
            self.source_id = Some(id.to_string());
        } else {
            // Empty target or a third image: either way the target takes it.
            self.target_id = Some(id.to_string());
        }
        self
    }

    /// Fills empty face-swap slots from the (already updated) palette.
    pub fn assign_face_swap_defaults(mut self, palette: &PaletteStore) -> SelectionState {
        if self.source_id.is_none() {
            self.source_id = palette.first().map(|image| image.id.clone());
        }
        if self.target_id.is_none() {
            let source = self.source_id.as_deref();
            self.target_id = palette
                .images()
                .iter()
                .find(|image| Some(image.id.as_str()) != source)
                .map(|image| image.id.clone());
        }
        self
    }

    /// `palette` is the palette after `id` was removed.
    pub fn on_image_removed(mut self, id: &str, palette: &PaletteStore) -> Transition {
        if self.source_id.as_deref() == Some(id) {
            self.source_id = None;
        }
        if self.target_id.as_deref() == Some(id) {
            self.target_id = None;
        }
        if self.active_image_id.as_deref() != Some(id) {
            return Transition::unchanged(self);
        }
        self.active_image_id = None;
        match palette.first() {
            Some(first) => {
                let next = first.id.clone();
                self.select_image(&next)
            }
            None => Transition {
                selection: self,
                subject: SubjectChange::Cleared,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::palette::tests::{files, StubDecoder};

    fn palette_of(names: &[&str]) -> PaletteStore {
        let mut palette = PaletteStore::new();
        palette.add(files(names), &StubDecoder);
        palette
    }

    fn swap(source: Option<&str>, target: Option<&str>) -> SelectionState {
        SelectionState {
            active_image_id: None,
            source_id: source.map(str::to_string),
            target_id: target.map(str::to_string),
        }
    }

    #[test]
    fn face_swap_click_cycle_deselects_on_source() {
        let state = SelectionState::default()
            .select_face_swap_image("A")
            .select_face_swap_image("B")
            .select_face_swap_image("A");
        assert_eq!(state, swap(None, None));
    }

    #[test]
    fn face_swap_third_image_replaces_target_only() {
        let state = SelectionState::default()
            .select_face_swap_image("A")
            .select_face_swap_image("B")
            .select_face_swap_image("C");
        assert_eq!(state, swap(Some("A"), Some("C")));
    }

    #[test]
    fn face_swap_click_on_target_clears_target() {
        let state = swap(Some("A"), Some("B")).select_face_swap_image("B");
        assert_eq!(state, swap(Some("A"), None));
        let state = state.select_face_swap_image("C");
        assert_eq!(state, swap(Some("A"), Some("C")));
    }

    #[test]
    fn face_swap_fills_source_before_target() {
        let state = swap(None, Some("B")).select_face_swap_image("C");
        assert_eq!(state, swap(Some("C"), Some("B")));
    }

    #[test]
    fn selecting_face_swap_task_drops_active_image() {
        let palette = palette_of(&["a.png", "b.png"]);
        let start = SelectionState {
            active_image_id: Some("img-1".to_string()),
            ..SelectionState::default()
        };
        let transition = start.select_task(TaskKind::FaceSwap, &palette);
        assert_eq!(transition.selection, SelectionState::default());
        assert_eq!(transition.subject, SubjectChange::Unchanged);
    }

    #[test]
    fn selecting_single_task_auto_selects_first_image() {
        let palette = palette_of(&["a.png", "b.png"]);
        let transition = swap(Some("img-2"), Some("img-1")).select_task(TaskKind::Single, &palette);
        assert_eq!(
            transition.selection,
            SelectionState {
                active_image_id: Some("img-1".to_string()),
                ..SelectionState::default()
            }
        );
        assert_eq!(transition.subject, SubjectChange::Reset("img-1".to_string()));
    }

    #[test]
    fn selecting_single_task_keeps_existing_active_image() {
        let palette = palette_of(&["a.png", "b.png"]);
        let start = SelectionState {
            active_image_id: Some("img-2".to_string()),
            ..SelectionState::default()
        };
        let transition = start.clone().select_task(TaskKind::Single, &palette);
        assert_eq!(transition.selection, start);
        assert_eq!(transition.subject, SubjectChange::Unchanged);
    }

    #[test]
    fn collage_never_auto_selects() {
        let palette = palette_of(&["a.png", "b.png"]);
        let transition = swap(Some("img-1"), None).select_task(TaskKind::Collage, &palette);
        assert_eq!(transition.selection, SelectionState::default());
        assert_eq!(transition.subject, SubjectChange::Unchanged);
    }

    #[test]
    fn single_task_on_empty_palette_selects_nothing() {
        let transition = SelectionState::default().select_task(TaskKind::Single, &PaletteStore::new());
        assert_eq!(transition.selection, SelectionState::default());
        assert_eq!(transition.subject, SubjectChange::Unchanged);
    }

    #[test]
    fn batch_upload_assigns_distinct_source_and_target() {
        let palette = palette_of(&["a.png", "b.png", "c.png"]);
        let state = SelectionState::default().assign_face_swap_defaults(&palette);
        assert_eq!(state, swap(Some("img-1"), Some("img-2")));

        let state = swap(Some("img-2"), None).assign_face_swap_defaults(&palette);
        assert_eq!(state, swap(Some("img-2"), Some("img-1")));
    }

    #[test]
    fn batch_upload_with_single_image_leaves_target_empty() {
        let palette = palette_of(&["a.png"]);
        let state = SelectionState::default().assign_face_swap_defaults(&palette);
        assert_eq!(state, swap(Some("img-1"), None));
    }

    #[test]
    fn removing_source_keeps_target() {
        let mut palette = palette_of(&["a.png", "b.png"]);
        palette.remove("img-1");
        let transition = swap(Some("img-1"), Some("img-2")).on_image_removed("img-1", &palette);
        assert_eq!(transition.selection, swap(None, Some("img-2")));
        assert_eq!(transition.subject, SubjectChange::Unchanged);
    }

    #[test]
    fn removing_active_image_reselects_first_remaining() {
        let mut palette = palette_of(&["a.png", "b.png"]);
        palette.remove("img-1");
        let start = SelectionState {
            active_image_id: Some("img-1".to_string()),
            ..SelectionState::default()
        };
        let transition = start.on_image_removed("img-1", &palette);
        assert_eq!(transition.selection.active_image_id.as_deref(), Some("img-2"));
        assert_eq!(transition.subject, SubjectChange::Reset("img-2".to_string()));
    }

    #[test]
    fn removing_last_image_clears_subject() {
        let mut palette = palette_of(&["a.png"]);
        palette.remove("img-1");
        let start = SelectionState {
            active_image_id: Some("img-1".to_string()),
            ..SelectionState::default()
        };
        let transition = start.on_image_removed("img-1", &palette);
        assert_eq!(transition.selection, SelectionState::default());
        assert_eq!(transition.subject, SubjectChange::Cleared);
    }
}
