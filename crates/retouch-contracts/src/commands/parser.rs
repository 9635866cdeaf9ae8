use super::registry::{
    find_action, MULTI_ARG_COMMANDS, NO_ARG_COMMANDS, RAW_ARG_COMMANDS, SINGLE_ARG_COMMANDS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis {
    Horizontal,
    Vertical,
}

impl FlipAxis {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "h" | "horizontal" => Some(Self::Horizontal),
            "v" | "vertical" => Some(Self::Vertical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One parsed line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Noop,
    Upload(Vec<String>),
    Capture(String),
    RemoveImage(String),
    ListTasks,
    SelectTask(String),
    SelectImage(String),
    SetPrompt(String),
    Generate,
    Undo,
    Redo,
    Revert(usize),
    ClearHistory,
    ResetPalette,
    Flip(FlipAxis),
    Crop(CropRect),
    ShowHistory,
    ShowPalette,
    SaveCurrent(String),
    ExportHistory(String),
    Help,
    Quit,
    /// Known command with unusable arguments.
    Invalid { command: String, reason: String },
    Unknown { command: String, arg: String },
}

fn split_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg.split_whitespace().map(str::to_string).collect(),
    }
}

fn single_arg(arg: &str) -> String {
    split_args(arg).join(" ")
}

fn invalid(command: &str, reason: impl Into<String>) -> SessionCommand {
    SessionCommand::Invalid {
        command: command.to_string(),
        reason: reason.into(),
    }
}

fn parse_single(command: &str, action: &str, arg: &str) -> SessionCommand {
    let value = single_arg(arg);
    if value.is_empty() {
        return invalid(command, "missing argument");
    }
    match action {
        "capture" => SessionCommand::Capture(value),
        "remove_image" => SessionCommand::RemoveImage(value),
        "select_task" => SessionCommand::SelectTask(value),
        "select_image" => SessionCommand::SelectImage(value),
        "save_current" => SessionCommand::SaveCurrent(value),
        "export_history" => SessionCommand::ExportHistory(value),
        "revert" => match value.parse::<usize>() {
            Ok(index) => SessionCommand::Revert(index),
            Err(_) => invalid(command, format!("'{value}' is not a history index")),
        },
        "flip" => match FlipAxis::parse(&value) {
            Some(axis) => SessionCommand::Flip(axis),
            None => invalid(command, "expected h or v"),
        },
        _ => invalid(command, "unsupported command"),
    }
}

fn parse_multi(command: &str, action: &str, arg: &str) -> SessionCommand {
    let values = split_args(arg);
    match action {
        "upload" if values.is_empty() => invalid(command, "expected at least one path"),
        "upload" => SessionCommand::Upload(values),
        "crop" => parse_crop(command, &values),
        _ => invalid(command, "unsupported command"),
    }
}

fn parse_crop(command: &str, values: &[String]) -> SessionCommand {
    let numbers: Result<Vec<u32>, _> = values.iter().map(|value| value.parse::<u32>()).collect();
    match numbers.as_deref() {
        Ok([x, y, width, height]) => SessionCommand::Crop(CropRect {
            x: *x,
            y: *y,
            width: *width,
            height: *height,
        }),
        _ => invalid(command, "expected four non-negative integers: x y width height"),
    }
}

fn no_arg(action: &str) -> SessionCommand {
    match action {
        "list_tasks" => SessionCommand::ListTasks,
        "generate" => SessionCommand::Generate,
        "undo" => SessionCommand::Undo,
        "redo" => SessionCommand::Redo,
        "clear_history" => SessionCommand::ClearHistory,
        "reset_palette" => SessionCommand::ResetPalette,
        "show_history" => SessionCommand::ShowHistory,
        "show_palette" => SessionCommand::ShowPalette,
        "quit" => SessionCommand::Quit,
        _ => SessionCommand::Help,
    }
}

/// Parses a REPL line. Anything that is not a slash command sets the prompt.
pub fn parse_command(text: &str) -> SessionCommand {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return SessionCommand::Noop;
    }

    if let Some(slash_tail) = trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let arg = slash_tail[command_len..].trim();

            if find_action(&command, RAW_ARG_COMMANDS).is_some() {
                return SessionCommand::SetPrompt(arg.to_string());
            }
            if let Some(action) = find_action(&command, SINGLE_ARG_COMMANDS) {
                return parse_single(&command, action, arg);
            }
            if let Some(action) = find_action(&command, MULTI_ARG_COMMANDS) {
                return parse_multi(&command, action, arg);
            }
            if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
                return no_arg(action);
            }
            return SessionCommand::Unknown {
                command,
                arg: arg.to_string(),
            };
        }
    }

    SessionCommand::SetPrompt(trimmed.to_string())
}
