#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

const fn spec(command: &'static str, action: &'static str) -> CommandSpec {
    CommandSpec { command, action }
}

/// Commands whose whole remainder is taken verbatim.
pub(crate) const RAW_ARG_COMMANDS: &[CommandSpec] = &[spec("prompt", "set_prompt")];

pub(crate) const SINGLE_ARG_COMMANDS: &[CommandSpec] = &[
    spec("capture", "capture"),
    spec("remove", "remove_image"),
    spec("task", "select_task"),
    spec("select", "select_image"),
    spec("save", "save_current"),
    spec("export", "export_history"),
    spec("revert", "revert"),
    spec("flip", "flip"),
];

pub(crate) const MULTI_ARG_COMMANDS: &[CommandSpec] =
    &[spec("upload", "upload"), spec("crop", "crop")];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    spec("tasks", "list_tasks"),
    spec("generate", "generate"),
    spec("undo", "undo"),
    spec("redo", "redo"),
    spec("clear", "clear_history"),
    spec("reset", "reset_palette"),
    spec("history", "show_history"),
    spec("palette", "show_palette"),
    spec("help", "help"),
    spec("quit", "quit"),
];

pub const SESSION_HELP_COMMANDS: &[&str] = &[
    "/upload <paths...>",
    "/capture <path>",
    "/remove <image-id>",
    "/tasks",
    "/task <task-id>",
    "/select <image-id>",
    "/prompt <text>",
    "/generate",
    "/undo",
    "/redo",
    "/revert <index>",
    "/clear",
    "/reset",
    "/flip h|v",
    "/crop <x> <y> <width> <height>",
    "/history",
    "/palette",
    "/save <path>",
    "/export <dir>",
    "/help",
    "/quit",
];

pub(crate) fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}
