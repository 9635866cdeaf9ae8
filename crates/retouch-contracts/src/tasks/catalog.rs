use serde::Serialize;

pub const FACE_SWAP_TASK_ID: &str = "TREND_FACE_SWAP_MV";
pub const COLLAGE_TASK_ID: &str = "IMAGE_COLLAGE";
/// The one task whose prompt starts empty and is wrapped in a system instruction.
pub const FREEFORM_TASK_ID: &str = "EDIT_NANO_BANANA";

/// Request shape and selection rules follow from the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Single,
    FaceSwap,
    Collage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub category_id: &'static str,
}

impl TaskSpec {
    pub fn kind(&self) -> TaskKind {
        match self.id {
            FACE_SWAP_TASK_ID => TaskKind::FaceSwap,
            COLLAGE_TASK_ID => TaskKind::Collage,
            _ => TaskKind::Single,
        }
    }

    pub fn is_freeform(&self) -> bool {
        self.id == FREEFORM_TASK_ID
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CategorySpec {
    pub id: &'static str,
    pub name: &'static str,
    pub tasks: &'static [TaskSpec],
}

const fn task(id: &'static str, name: &'static str, category_id: &'static str) -> TaskSpec {
    TaskSpec {
        id,
        name,
        category_id,
    }
}

pub const EDITING_CATEGORIES: &[CategorySpec] = &[
    CategorySpec {
        id: "creative",
        name: "Creative AI",
        tasks: &[
            task("STYLE_TRANSFER_ANIME", "Anime / Ghibli style", "creative"),
            task(COLLAGE_TASK_ID, "Photo collage", "creative"),
            task("FACE_SWAP_POSTER", "Movie poster face swap", "creative"),
            task("OUTFIT_TRYON_AODAI", "Outfit try-on (Ao dai)", "creative"),
            task("REPLACE_BG_ADD_PROP", "New background & prop", "creative"),
            task("CHANGE_SCENE_DAY_NIGHT", "Day to night", "creative"),
            task("ADD_OBJECT_PET", "Add a pet", "creative"),
            task(FREEFORM_TASK_ID, "Free-form edit (Nano Banana)", "creative"),
        ],
    },
    CategorySpec {
        id: "ai_edit",
        name: "AI edit",
        tasks: &[
            task("REMOVE_OBJECT", "Remove object", "ai_edit"),
            task("REPLACE_BG", "Replace background", "ai_edit"),
            task("UPSCALE_4X", "Super-resolution x4", "ai_edit"),
            task("BEAUTIFY_PORTRAIT", "Portrait retouch", "ai_edit"),
            task("RESTORE_COLORIZE", "Restore & colorize", "ai_edit"),
            task("SHARPEN_IMAGE", "Sharpen", "ai_edit"),
        ],
    },
    CategorySpec {
        id: "filters",
        name: "Filters",
        tasks: &[
            task("FILTER_BW_NOIR", "Noir (B&W)", "filters"),
            task("FILTER_BW_HIGH_CONTRAST", "High contrast B&W", "filters"),
            task("FILTER_VINTAGE_SEPIA", "Vintage sepia", "filters"),
            task("FILTER_VINTAGE_FADED", "Vintage faded", "filters"),
            task("FILTER_FILM_KODAK", "Kodak film", "filters"),
            task("FILTER_FILM_FUJI", "Fuji film", "filters"),
            task("FILTER_CINEMATIC_TEAL_ORANGE", "Cinematic teal & orange", "filters"),
            task("FILTER_CINEMATIC_MOODY", "Cinematic moody", "filters"),
            task("FILTER_NATURAL_VIBRANT", "Natural vibrant", "filters"),
            task("FILTER_NATURAL_SOFT", "Natural soft", "filters"),
            task("FILTER_NOSTALGIC_80S", "Nostalgic 80s", "filters"),
            task("FILTER_NOSTALGIC_90S", "Nostalgic 90s", "filters"),
            task("FILTER_FOOD_FRESH", "Food (fresh)", "filters"),
            task("FILTER_FOOD_WARM", "Food (warm)", "filters"),
        ],
    },
    CategorySpec {
        id: "trends",
        name: "Trend hub",
        tasks: &[
            task("TREND_AI_AVATAR", "AI avatar / yearbook", "trends"),
            task("TREND_CINEMATIC_STILLS", "Cinematic stills", "trends"),
            task("TREND_3D_PARALLAX", "3D parallax", "trends"),
            task(FACE_SWAP_TASK_ID, "Face swap", "trends"),
            task("TREND_NEON_GLITCH", "Neon / glitch", "trends"),
        ],
    },
];

pub fn all_tasks() -> impl Iterator<Item = &'static TaskSpec> {
    EDITING_CATEGORIES
        .iter()
        .flat_map(|category| category.tasks.iter())
}

pub fn find_task(id: &str) -> Option<&'static TaskSpec> {
    let wanted = id.trim();
    all_tasks().find(|task| task.id.eq_ignore_ascii_case(wanted))
}

/// First task of the first category.
pub fn default_task() -> &'static TaskSpec {
    &EDITING_CATEGORIES[0].tasks[0]
}

pub fn category(id: &str) -> Option<&'static CategorySpec> {
    EDITING_CATEGORIES.iter().find(|category| category.id == id)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn task_ids_are_unique() {
        let mut seen = HashSet::new();
        for task in all_tasks() {
            assert!(seen.insert(task.id), "duplicate task id {}", task.id);
        }
        assert_eq!(seen.len(), 33);
    }

    #[test]
    fn every_task_points_at_its_category() {
        for category in EDITING_CATEGORIES {
            for task in category.tasks {
                assert_eq!(task.category_id, category.id);
            }
        }
    }

    #[test]
    fn kinds_follow_identity() {
        assert_eq!(find_task(FACE_SWAP_TASK_ID).map(TaskSpec::kind), Some(TaskKind::FaceSwap));
        assert_eq!(find_task(COLLAGE_TASK_ID).map(TaskSpec::kind), Some(TaskKind::Collage));
        assert_eq!(find_task("FACE_SWAP_POSTER").map(TaskSpec::kind), Some(TaskKind::Single));
        assert!(find_task(FREEFORM_TASK_ID).is_some_and(TaskSpec::is_freeform));
    }

    #[test]
    fn lookup_is_case_insensitive_and_trims() {
        assert_eq!(find_task("  filter_bw_noir ").map(|task| task.id), Some("FILTER_BW_NOIR"));
        assert!(find_task("NOT_A_TASK").is_none());
    }

    #[test]
    fn default_task_is_first_catalog_entry() {
        assert_eq!(default_task().id, "STYLE_TRANSFER_ANIME");
        assert_eq!(default_task().kind(), TaskKind::Single);
        assert_eq!(category("filters").map(|c| c.tasks.len()), Some(14));
    }
}
