use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::models::LocalFile;
use crate::normalizer::is_video_file;

/// Video files directly inside `directory`, sorted by name.
pub fn scan_folder(directory: &Path) -> Result<Vec<LocalFile>> {
    if !directory.is_dir() {
        return Err(anyhow::anyhow!("Directory does not exist: {:?}", directory));
    }

    let mut files: Vec<LocalFile> = fs::read_dir(directory)
        .with_context(|| format!("Failed to read directory {}", directory.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .filter(|entry| is_video_file(&entry.file_name().to_string_lossy()))
        .map(|entry| LocalFile::new(entry.path()))
        .collect();

    files.sort_by(|a, b| a.name().cmp(b.name()));
    debug!(directory = %directory.display(), count = files.len(), "scanned source folder");
    Ok(files)
}

/// Names of the videos already in the library folder, case-insensitively sorted.
///
/// A missing folder yields an empty list.
pub fn list_library_files(directory: &Path) -> Result<Vec<String>> {
    if !directory.is_dir() {
        return Ok(Vec::new());
    }

    let mut names: Vec<String> = fs::read_dir(directory)
        .with_context(|| format!("Failed to read directory {}", directory.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| is_video_file(name))
        .collect();

    names.sort_by_key(|name| name.to_lowercase());
    Ok(names)
}
