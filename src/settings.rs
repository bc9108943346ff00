use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use thiserror::Error;
use tracing::debug;

const PROJECT_NAME: &str = env!("CARGO_PKG_NAME");

pub const KEY_API_KEY: &str = "TMDB_API_KEY";
pub const KEY_LANGUAGE: &str = "APP_LANGUAGE";
pub const KEY_SOURCE_FOLDER: &str = "MOVIES_FOLDER";
pub const KEY_LIBRARY_FOLDER: &str = "KODI_FOLDER";
pub const KEY_REMOVE_ORIGINAL: &str = "REMOVE_ORIGINAL_AFTER_SEND";

pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Languages offered by the settings dialog, in cycling order.
pub const LANGUAGE_OPTIONS: [&str; 3] = ["pt-BR", "en-US", "es-ES"];

/// Application directory: `<config dir>/kodi-rename`.
///
/// `None` if the platform has no config directory.
pub static CONFIG_DIR: LazyLock<Option<PathBuf>> =
    LazyLock::new(|| dirs::config_dir().map(|dir| dir.join(PROJECT_NAME)));

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("no config directory available on this platform")]
    NoConfigDir,
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn default_settings_path() -> Result<PathBuf, SettingsError> {
    CONFIG_DIR
        .as_ref()
        .map(|dir| dir.join("settings.txt"))
        .ok_or(SettingsError::NoConfigDir)
}

pub fn default_log_path() -> Result<PathBuf, SettingsError> {
    CONFIG_DIR
        .as_ref()
        .map(|dir| dir.join(format!("{PROJECT_NAME}.log")))
        .ok_or(SettingsError::NoConfigDir)
}

/// `1`, `true`, `yes`, `on` and `sim`, case-insensitive.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "sim"
    )
}

/// Flat `KEY=value` settings file.
///
/// Blank lines, `#` comments and lines without `=` are ignored on read.
/// Writes rewrite the whole file with keys in sorted order.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open_default() -> Result<Self, SettingsError> {
        default_settings_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries. A missing file reads as empty.
    pub fn read(&self) -> Result<BTreeMap<String, String>, SettingsError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|source| SettingsError::Read {
            path: self.path.clone(),
            source,
        })?;
        Ok(parse_settings(&content))
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        Ok(self.read()?.remove(key))
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.set_many(&[(key, value)])
    }

    /// Update several keys in one write, keeping the others.
    pub fn set_many(&self, pairs: &[(&str, &str)]) -> Result<(), SettingsError> {
        let mut entries = self.read()?;
        for (key, value) in pairs {
            entries.insert((*key).to_string(), value.trim().to_string());
        }
        self.write(&entries)
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), SettingsError> {
        let write_err = |source| SettingsError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let content: String = entries
            .iter()
            .map(|(key, value)| format!("{key}={value}\n"))
            .collect();
        fs::write(&self.path, content).map_err(write_err)?;
        debug!(path = %self.path.display(), keys = entries.len(), "settings saved");
        Ok(())
    }
}

fn parse_settings(content: &str) -> BTreeMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// Everything the provider, matcher and transfer step need, loaded once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_key: String,
    pub language: String,
    pub source_folder: Option<PathBuf>,
    pub library_folder: Option<PathBuf>,
    pub remove_original: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            source_folder: None,
            library_folder: None,
            remove_original: false,
        }
    }
}

impl AppConfig {
    pub fn from_store(store: &SettingsStore) -> Result<Self, SettingsError> {
        let mut entries = store.read()?;
        let mut take = |key: &str| entries.remove(key).filter(|v| !v.is_empty());

        Ok(Self {
            api_key: take(KEY_API_KEY).unwrap_or_default(),
            language: take(KEY_LANGUAGE).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            source_folder: take(KEY_SOURCE_FOLDER).map(PathBuf::from),
            library_folder: take(KEY_LIBRARY_FOLDER).map(PathBuf::from),
            remove_original: take(KEY_REMOVE_ORIGINAL)
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
        })
    }

    pub fn save(&self, store: &SettingsStore) -> Result<(), SettingsError> {
        let source = path_value(self.source_folder.as_deref());
        let library = path_value(self.library_folder.as_deref());
        let remove = if self.remove_original { "1" } else { "0" };
        store.set_many(&[
            (KEY_API_KEY, self.api_key.as_str()),
            (KEY_LANGUAGE, self.language.as_str()),
            (KEY_SOURCE_FOLDER, source.as_str()),
            (KEY_LIBRARY_FOLDER, library.as_str()),
            (KEY_REMOVE_ORIGINAL, remove),
        ])
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Advance to the next entry of [`LANGUAGE_OPTIONS`].
    pub fn cycle_language(&mut self) {
        let next = LANGUAGE_OPTIONS
            .iter()
            .position(|l| *l == self.language)
            .map(|i| (i + 1) % LANGUAGE_OPTIONS.len())
            .unwrap_or(0);
        self.language = LANGUAGE_OPTIONS[next].to_string();
    }
}

fn path_value(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}
