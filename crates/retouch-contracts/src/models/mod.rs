mod registry;
mod selectors;

pub use registry::{
    ModelRegistry, ModelSpec, CAPABILITY_EDIT, CAPABILITY_IMAGE, DEFAULT_IMAGE_MODEL,
};
pub use selectors::{ModelSelection, ModelSelector};
