pub mod parser;
pub mod registry;

pub use parser::{parse_command, CropRect, FlipAxis, SessionCommand};
pub use registry::SESSION_HELP_COMMANDS;
