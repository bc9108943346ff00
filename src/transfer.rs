use std::collections::HashSet;
use std::fs::{self, File, FileTimes, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Copy,
    /// Remove the original after a successful transfer.
    Move,
}

impl TransferMode {
    pub fn from_remove_original(remove_original: bool) -> Self {
        if remove_original {
            TransferMode::Move
        } else {
            TransferMode::Copy
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            TransferMode::Copy => "copied",
            TransferMode::Move => "moved",
        }
    }
}

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("{name}: source file not found")]
    SourceMissing { name: String },
    #[error("{name}: already exists in the library folder")]
    DestinationExists { name: String },
    #[error("{name}: another file in this batch already uses this name")]
    DuplicateInBatch { name: String },
    #[error("{name}: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("library folder is not a directory: {0}")]
    InvalidTarget(PathBuf),
}

/// A file the user marked for transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub source: PathBuf,
    /// Suggested destination name, or `None` to keep the original name.
    pub destination_name: Option<String>,
}

impl TransferRequest {
    fn source_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    fn resolved_name(&self) -> String {
        self.destination_name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.source_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transferred {
    pub source: PathBuf,
    pub destination: PathBuf,
}

#[derive(Debug)]
pub struct TransferReport {
    pub mode: TransferMode,
    pub requested: usize,
    pub transferred: Vec<Transferred>,
    pub errors: Vec<TransferError>,
}

impl TransferReport {
    pub fn summary(&self) -> String {
        if self.requested == 0 {
            return "No files marked for transfer".to_string();
        }
        let mut text = format!(
            "{} of {} file(s) {} to the library folder",
            self.transferred.len(),
            self.requested,
            self.mode.past_tense()
        );
        if !self.errors.is_empty() {
            text.push_str(&format!(", {} error(s)", self.errors.len()));
        }
        text
    }
}

/// Copy or move every request into `target_folder`.
///
/// All preconditions are checked before anything is written: the source must
/// exist, the destination must not, and no two requests may share a
/// destination. Failing files are skipped and reported, the rest proceed.
pub fn transfer_batch(
    requests: &[TransferRequest],
    target_folder: &Path,
    mode: TransferMode,
) -> Result<TransferReport, TransferError> {
    if !target_folder.is_dir() {
        return Err(TransferError::InvalidTarget(target_folder.to_path_buf()));
    }

    let mut report = TransferReport {
        mode,
        requested: requests.len(),
        transferred: Vec::new(),
        errors: Vec::new(),
    };

    let mut claimed = HashSet::new();
    let mut approved = Vec::new();

    for request in requests {
        let name = request.resolved_name();
        let destination = target_folder.join(&name);

        if !request.source.is_file() {
            report.errors.push(TransferError::SourceMissing {
                name: request.source_name(),
            });
            continue;
        }
        if destination.exists() {
            report.errors.push(TransferError::DestinationExists { name });
            continue;
        }
        if !claimed.insert(destination.clone()) {
            report.errors.push(TransferError::DuplicateInBatch { name });
            continue;
        }

        approved.push(Transferred {
            source: request.source.clone(),
            destination,
        });
    }

    for item in approved {
        let result = match mode {
            TransferMode::Copy => copy_preserving(&item.source, &item.destination),
            TransferMode::Move => move_file(&item.source, &item.destination),
        };

        match result {
            Ok(()) => {
                debug!(
                    source = %item.source.display(),
                    destination = %item.destination.display(),
                    "transferred"
                );
                report.transferred.push(item);
            }
            Err(source) => {
                warn!(source_path = %item.source.display(), error = %source, "transfer failed");
                report.errors.push(TransferError::Io {
                    name: item
                        .source
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default(),
                    source,
                });
            }
        }
    }

    info!(
        mode = ?mode,
        requested = report.requested,
        transferred = report.transferred.len(),
        errors = report.errors.len(),
        "transfer batch done"
    );
    Ok(report)
}

/// Copy contents, permissions and timestamps. Never replaces an existing file.
fn copy_preserving(source: &Path, destination: &Path) -> io::Result<()> {
    let mut reader = File::open(source)?;
    let metadata = reader.metadata()?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)?;

    let copied = io::copy(&mut reader, &mut writer).and_then(|_| {
        let mut times = FileTimes::new();
        if let Ok(modified) = metadata.modified() {
            times = times.set_modified(modified);
        }
        if let Ok(accessed) = metadata.accessed() {
            times = times.set_accessed(accessed);
        }
        writer.set_times(times)?;
        writer.set_permissions(metadata.permissions())
    });

    if copied.is_err() {
        drop(writer);
        let _ = fs::remove_file(destination);
    }
    copied
}

fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    // rename() replaces an existing target on Unix, so check right before
    if destination.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "destination already exists",
        ));
    }

    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            copy_preserving(source, destination)?;
            fs::remove_file(source)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_wording() {
        let report = TransferReport {
            mode: TransferMode::Copy,
            requested: 0,
            transferred: Vec::new(),
            errors: Vec::new(),
        };
        assert_eq!(report.summary(), "No files marked for transfer");

        let report = TransferReport {
            mode: TransferMode::Move,
            requested: 2,
            transferred: vec![Transferred {
                source: PathBuf::from("a.mkv"),
                destination: PathBuf::from("lib/A (2000).mkv"),
            }],
            errors: vec![TransferError::SourceMissing {
                name: "b.mkv".to_string(),
            }],
        };
        assert_eq!(
            report.summary(),
            "1 of 2 file(s) moved to the library folder, 1 error(s)"
        );
    }

    #[test]
    fn test_resolved_name_falls_back_to_source() {
        let request = TransferRequest {
            source: PathBuf::from("/in/movie.mkv"),
            destination_name: None,
        };
        assert_eq!(request.resolved_name(), "movie.mkv");
    }
}
