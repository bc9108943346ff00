// Integration tests for filename normalization, naming and folder scanning

use std::fs;

use kodi_rename::formatter::{format_name, sanitize_filename, suggest_movie_filename};
use kodi_rename::normalizer::{extract_episode_info, is_video_file, normalize, EpisodeMarker};
use kodi_rename::scanner::{list_library_files, scan_folder};
use tempfile::tempdir;

#[test]
fn test_sanitize_filename() {
    assert_eq!(sanitize_filename("Test: File/Name"), "Test_ File_Name");
    assert_eq!(sanitize_filename("Normal_File.Name"), "Normal_File.Name");
}

#[test]
fn test_typical_release_names() {
    let cases = [
        ("Movie.Name.2014.1080p.BluRay.x264.mkv", "movie name", Some(2014)),
        ("The_Matrix.1999.REMUX.x265.mkv", "the matrix", Some(1999)),
        ("Cidade.de.Deus.2002.DUBLADO.720p.mp4", "cidade de deus", Some(2002)),
        ("Heat (1995) [UNRATED] HDRip.avi", "heat", Some(1995)),
    ];
    for (file, query, year) in cases {
        let normalized = normalize(file);
        assert_eq!(normalized.query, query, "{file}");
        assert_eq!(normalized.year, year, "{file}");
    }
}

#[test]
fn test_episode_markers() {
    assert_eq!(
        extract_episode_info("show.2x05.mkv"),
        Some(EpisodeMarker { season: 2, episode: 5 })
    );
    assert_eq!(
        extract_episode_info("Show.s1e100.mkv"),
        Some(EpisodeMarker { season: 1, episode: 100 })
    );
    assert_eq!(extract_episode_info("Movie.1080p.mkv"), None);
}

#[test]
fn test_name_formatting() {
    assert_eq!(format_name("Inception", Some(2010)), "Inception (2010)");
    assert_eq!(
        suggest_movie_filename("inception.2010.MKV", "Inception", Some(2010)),
        "Inception (2010).MKV"
    );
}

#[test]
fn test_scan_only_returns_videos_sorted() {
    let dir = tempdir().unwrap();
    for name in ["b.mkv", "a.MP4", "notes.txt", "c.srt"] {
        fs::write(dir.path().join(name), "").unwrap();
    }
    fs::create_dir(dir.path().join("folder.mkv")).unwrap();

    let names: Vec<String> = scan_folder(dir.path())
        .unwrap()
        .iter()
        .map(|f| f.name().to_string())
        .collect();
    assert_eq!(names, vec!["a.MP4", "b.mkv"]);
    assert!(is_video_file("x.M4V"));
}

#[test]
fn test_scan_missing_folder_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(scan_folder(&dir.path().join("missing")).is_err());
    assert!(list_library_files(&dir.path().join("missing")).unwrap().is_empty());
}

#[test]
fn test_library_listing_is_case_insensitive() {
    let dir = tempdir().unwrap();
    for name in ["beta (2001).mkv", "Alpha (2000).mkv", "Zeta (2003).avi", "readme.md"] {
        fs::write(dir.path().join(name), "").unwrap();
    }
    assert_eq!(
        list_library_files(dir.path()).unwrap(),
        vec!["Alpha (2000).mkv", "beta (2001).mkv", "Zeta (2003).avi"]
    );
}
