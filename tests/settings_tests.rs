// Integration tests for the settings file

use std::fs;
use std::path::PathBuf;

use kodi_rename::settings::{AppConfig, SettingsStore, KEY_API_KEY, KEY_REMOVE_ORIGINAL};
use tempfile::tempdir;

#[test]
fn test_missing_file_gives_defaults() {
    let dir = tempdir().unwrap();
    let store = SettingsStore::new(dir.path().join("settings.txt"));

    let config = AppConfig::from_store(&store).unwrap();
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.language, "en-US");
    assert!(!config.has_api_key());
}

#[test]
fn test_reads_hand_written_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.txt");
    fs::write(
        &path,
        "# kodi-rename\nTMDB_API_KEY=abc123\nAPP_LANGUAGE=pt-BR\nMOVIES_FOLDER=/downloads\n\
         KODI_FOLDER=/kodi/movies\nREMOVE_ORIGINAL_AFTER_SEND=sim\nnot a setting\n",
    )
    .unwrap();

    let config = AppConfig::from_store(&SettingsStore::new(&path)).unwrap();
    assert_eq!(config.api_key, "abc123");
    assert_eq!(config.language, "pt-BR");
    assert_eq!(config.source_folder, Some(PathBuf::from("/downloads")));
    assert_eq!(config.library_folder, Some(PathBuf::from("/kodi/movies")));
    assert!(config.remove_original);
}

#[test]
fn test_save_creates_parent_and_round_trips() {
    let dir = tempdir().unwrap();
    let store = SettingsStore::new(dir.path().join("nested").join("settings.txt"));

    let config = AppConfig {
        api_key: "key".to_string(),
        language: "es-ES".to_string(),
        source_folder: Some(PathBuf::from("/in")),
        library_folder: None,
        remove_original: true,
    };
    config.save(&store).unwrap();

    assert_eq!(AppConfig::from_store(&store).unwrap(), config);
    assert_eq!(store.get(KEY_REMOVE_ORIGINAL).unwrap().as_deref(), Some("1"));
}

#[test]
fn test_set_keeps_unknown_keys() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.txt");
    fs::write(&path, "CUSTOM=value\n").unwrap();
    let store = SettingsStore::new(&path);

    store.set(KEY_API_KEY, "  spaced  ").unwrap();

    assert_eq!(store.get("CUSTOM").unwrap().as_deref(), Some("value"));
    assert_eq!(store.get(KEY_API_KEY).unwrap().as_deref(), Some("spaced"));
}
