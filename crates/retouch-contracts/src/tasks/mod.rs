mod catalog;
mod prompts;

pub use catalog::{
    all_tasks, category, default_task, find_task, CategorySpec, TaskKind, TaskSpec,
    COLLAGE_TASK_ID, EDITING_CATEGORIES, FACE_SWAP_TASK_ID, FREEFORM_TASK_ID,
};
pub use prompts::{
    freeform_instruction, resolve_prompt, template_for, DEFAULT_TEMPLATE, FREEFORM_SEPARATOR,
};
