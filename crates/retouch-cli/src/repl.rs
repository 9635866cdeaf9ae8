use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use retouch_contracts::commands::{parse_command, SessionCommand, SESSION_HELP_COMMANDS};
use retouch_contracts::session::UploadReport;
use retouch_contracts::tasks::{TaskKind, EDITING_CATEGORIES};
use retouch_engine::NativeEditor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn run_repl(editor: &mut NativeEditor, out_dir: &Path) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();

    writeln!(
        stdout,
        "Retouch session {} ({} backend). Type /help for commands.",
        editor.session_id(),
        editor.backend_name()
    )?;

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let command = parse_command(line.trim_end_matches(['\n', '\r']));
        if dispatch(editor, command, out_dir, &mut stdout)? == Flow::Quit {
            break;
        }
    }
    Ok(())
}

/// Runs one command. Editing failures are printed, only I/O on `out` errors.
pub fn dispatch(
    editor: &mut NativeEditor,
    command: SessionCommand,
    out_dir: &Path,
    out: &mut dyn Write,
) -> Result<Flow> {
    match command {
        SessionCommand::Noop => {}
        SessionCommand::Help => {
            writeln!(out, "Commands: {}", SESSION_HELP_COMMANDS.join(" "))?;
            writeln!(out, "Text without a leading '/' sets the prompt.")?;
        }
        SessionCommand::Quit => return Ok(Flow::Quit),
        SessionCommand::Upload(paths) => {
            let paths: Vec<PathBuf> = paths.iter().map(PathBuf::from).collect();
            let report = editor.upload_paths(&paths);
            print_upload(out, &report)?;
        }
        SessionCommand::Capture(path) => {
            let report = editor.capture_path(Path::new(&path));
            if report.added.is_empty() && report.rejected.is_empty() {
                writeln!(out, "Palette is full; capture ignored.")?;
            }
            print_upload(out, &report)?;
        }
        SessionCommand::RemoveImage(id) => {
            if editor.remove_image(&id) {
                writeln!(out, "Removed {id}.")?;
            } else {
                writeln!(out, "No image '{id}' in the palette.")?;
            }
        }
        SessionCommand::ListTasks => {
            for category in EDITING_CATEGORIES {
                writeln!(out, "{}:", category.name)?;
                for task in category.tasks {
                    writeln!(out, "  {:<24} {}", task.id, task.name)?;
                }
            }
        }
        SessionCommand::SelectTask(id) => match editor.select_task(&id) {
            Ok(task) => {
                writeln!(out, "Task: {} ({})", task.name, task.id)?;
                if task.is_freeform() {
                    writeln!(out, "Type what you want changed, then /generate.")?;
                }
            }
            Err(err) => writeln!(out, "{err}")?,
        },
        SessionCommand::SelectImage(id) => match editor.select_image(&id) {
            Ok(()) => print_selection(out, editor)?,
            Err(err) => writeln!(out, "{err}")?,
        },
        SessionCommand::SetPrompt(prompt) => {
            editor.set_prompt(prompt);
            writeln!(out, "Prompt set.")?;
        }
        SessionCommand::Generate => match editor.generate() {
            Ok(entry) => writeln!(out, "{} (history {})", entry.label, history_position(editor))?,
            Err(err) => writeln!(out, "Generate failed: {err}")?,
        },
        SessionCommand::Undo => {
            if editor.undo() {
                writeln!(out, "Undone (history {}).", history_position(editor))?;
            } else {
                writeln!(out, "Nothing to undo.")?;
            }
        }
        SessionCommand::Redo => {
            if editor.redo() {
                writeln!(out, "Redone (history {}).", history_position(editor))?;
            } else {
                writeln!(out, "Nothing to redo.")?;
            }
        }
        SessionCommand::Revert(index) => {
            if editor.revert_to(index) {
                writeln!(out, "Reverted to {index}.")?;
            } else {
                writeln!(out, "No history entry {index}.")?;
            }
        }
        SessionCommand::ClearHistory => {
            editor.clear_history();
            writeln!(out, "History cleared back to the original.")?;
        }
        SessionCommand::ResetPalette => {
            let removed = editor.reset_palette();
            writeln!(out, "Removed {} image(s); palette and history are empty.", removed.len())?;
        }
        SessionCommand::Flip(axis) => match editor.flip(axis) {
            Ok(entry) => writeln!(out, "{}", entry.label)?,
            Err(err) => writeln!(out, "{err}")?,
        },
        SessionCommand::Crop(rect) => match editor.crop(rect) {
            Ok(entry) => writeln!(out, "{}", entry.label)?,
            Err(err) => writeln!(out, "{err}")?,
        },
        SessionCommand::ShowHistory => print_history(out, editor)?,
        SessionCommand::ShowPalette => print_palette(out, editor)?,
        SessionCommand::SaveCurrent(path) => {
            match editor.save_current(&resolve_output(out_dir, &path)) {
                Ok(saved) => writeln!(out, "Saved {}", saved.display())?,
                Err(err) => writeln!(out, "Save failed: {err:#}")?,
            }
        }
        SessionCommand::ExportHistory(dir) => {
            let dir = resolve_output(out_dir, &dir);
            match editor.export_history(&dir) {
                Ok(manifest) => writeln!(
                    out,
                    "Exported {} entries to {}",
                    manifest.entries.len(),
                    dir.display()
                )?,
                Err(err) => writeln!(out, "Export failed: {err:#}")?,
            }
        }
        SessionCommand::Invalid { command, reason } => writeln!(out, "/{command}: {reason}")?,
        SessionCommand::Unknown { command, .. } => {
            writeln!(out, "Unknown command /{command}. Type /help for commands.")?
        }
    }
    Ok(Flow::Continue)
}

fn resolve_output(out_dir: &Path, raw: &str) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        path
    } else {
        out_dir.join(path)
    }
}

fn history_position(editor: &NativeEditor) -> String {
    let history = editor.session().history();
    match history.cursor() {
        Some(cursor) => format!("{}/{}", cursor + 1, history.len()),
        None => "empty".to_string(),
    }
}

fn print_upload(out: &mut dyn Write, report: &UploadReport) -> Result<()> {
    if !report.added.is_empty() {
        writeln!(out, "Added {}.", report.added.join(", "))?;
    }
    for err in &report.rejected {
        writeln!(out, "Skipped: {err}")?;
    }
    if report.dropped > 0 {
        writeln!(out, "Palette full; {} file(s) ignored.", report.dropped)?;
    }
    Ok(())
}

fn print_selection(out: &mut dyn Write, editor: &NativeEditor) -> Result<()> {
    let session = editor.session();
    let selection = session.selection();
    if session.task_kind() == Some(TaskKind::FaceSwap) {
        writeln!(
            out,
            "Source: {}  Target: {}",
            selection.source_id.as_deref().unwrap_or("-"),
            selection.target_id.as_deref().unwrap_or("-")
        )?;
    } else {
        writeln!(
            out,
            "Active: {}",
            selection.active_image_id.as_deref().unwrap_or("-")
        )?;
    }
    Ok(())
}

fn print_palette(out: &mut dyn Write, editor: &NativeEditor) -> Result<()> {
    let session = editor.session();
    if session.palette().is_empty() {
        writeln!(out, "Palette is empty.")?;
        return Ok(());
    }
    let selection = session.selection();
    for image in session.palette().images() {
        let mut tags = Vec::new();
        if selection.active_image_id.as_deref() == Some(image.id.as_str()) {
            tags.push("active");
        }
        if selection.source_id.as_deref() == Some(image.id.as_str()) {
            tags.push("source");
        }
        if selection.target_id.as_deref() == Some(image.id.as_str()) {
            tags.push("target");
        }
        writeln!(
            out,
            "{:<6} {:<24} {:<11} {}",
            image.id,
            image.file_name,
            image.mime_type(),
            tags.join(",")
        )?;
    }
    if let Some(task) = session.task() {
        let ready = if session.can_generate() { "ready" } else { "not ready" };
        writeln!(out, "Task: {} ({ready})", task.name)?;
    }
    Ok(())
}

fn print_history(out: &mut dyn Write, editor: &NativeEditor) -> Result<()> {
    let history = editor.session().history();
    if history.is_empty() {
        writeln!(out, "History is empty.")?;
        return Ok(());
    }
    for (index, entry) in history.entries().iter().enumerate() {
        let marker = if history.cursor() == Some(index) { "*" } else { " " };
        writeln!(out, "{marker} {index:>2} {}", entry.label)?;
    }
    Ok(())
}
