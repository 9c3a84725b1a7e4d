//! Clipboard operations

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const FALLBACK_FILE_NAME: &str = "sherwood-clipboard.txt";

pub enum CopyOutcome {
    Clipboard,
    /// Clipboard unavailable; text written here instead
    File(PathBuf),
}

pub fn copy_text(text: &str) -> Result<CopyOutcome> {
    if let Ok(mut clipboard) = arboard::Clipboard::new() {
        if clipboard.set_text(text.to_string()).is_ok() {
            return Ok(CopyOutcome::Clipboard);
        }
    }
    write_fallback(&std::env::temp_dir(), text).map(CopyOutcome::File)
}

fn write_fallback(dir: &Path, text: &str) -> Result<PathBuf> {
    let path = dir.join(FALLBACK_FILE_NAME);
    std::fs::write(&path, text)
        .with_context(|| format!("Clipboard unavailable and failed to write {}", path.display()))?;
    Ok(path)
}
