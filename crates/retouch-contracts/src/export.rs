use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::history::EditHistory;
use crate::image_data::ImageData;

pub const MANIFEST_FILE_NAME: &str = "history.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedEntry {
    pub index: usize,
    pub id: String,
    pub label: String,
    pub mime_type: String,
    pub file: String,
    pub sha256: String,
}

/// `history.json` written next to the exported images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryManifest {
    pub schema_version: u64,
    pub session_id: String,
    pub exported_at: String,
    pub cursor: Option<usize>,
    pub entries: Vec<ExportedEntry>,
}

impl HistoryManifest {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("invalid manifest {}", path.display()))
    }
}

/// Writes every entry as `NN-<slug>.<ext>` plus the manifest into `dir`.
pub fn export_history(
    history: &EditHistory,
    session_id: &str,
    dir: &Path,
) -> anyhow::Result<HistoryManifest> {
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let mut entries = Vec::with_capacity(history.len());
    for (index, entry) in history.entries().iter().enumerate() {
        let file = format!(
            "{index:02}-{}.{}",
            slugify(&entry.label),
            entry.image.extension()
        );
        save_image(&entry.image, &dir.join(&file))?;
        entries.push(ExportedEntry {
            index,
            id: entry.id.clone(),
            label: entry.label.clone(),
            mime_type: entry.image.mime_type().to_string(),
            file,
            sha256: entry.image.sha256_hex(),
        });
    }

    let manifest = HistoryManifest {
        schema_version: 1,
        session_id: session_id.to_string(),
        exported_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        cursor: history.cursor(),
        entries,
    };
    write_json(&dir.join(MANIFEST_FILE_NAME), &manifest)?;
    Ok(manifest)
}

pub fn save_image(image: &ImageData, path: &Path) -> anyhow::Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, image.bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path.to_path_buf())
}

fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for ch in label.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "image".to_string()
    } else {
        slug.to_string()
    }
}

fn write_json<T: Serialize>(path: &Path, payload: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(payload)?)?;
    Ok(())
}
