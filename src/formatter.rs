use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static ILLEGAL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("illegal char regex should compile"));

// Helper function to sanitize filenames
pub fn sanitize_filename(filename: &str) -> String {
    ILLEGAL_CHARS.replace_all(filename, "_").to_string()
}

/// Extension of `filename` including the leading dot, or an empty string.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

/// Kodi movie name: `Title (Year)`. Without a year the suffix is left out.
pub fn format_name(title: &str, year: Option<u16>) -> String {
    let title = sanitize_filename(title.trim());
    match year {
        Some(year) => format!("{title} ({year})"),
        None => title,
    }
}

/// Kodi episode name: `Series - S01E02 - Episode Title`.
pub fn format_episode_name(
    series_title: &str,
    season: u32,
    episode: u32,
    episode_title: Option<&str>,
) -> String {
    let series = sanitize_filename(series_title.trim());
    let base = format!("{series} - S{season:02}E{episode:02}");
    match episode_title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) => format!("{base} - {}", sanitize_filename(title)),
        None => base,
    }
}

/// Destination file name for a movie, keeping the original extension.
pub fn suggest_movie_filename(original_filename: &str, title: &str, year: Option<u16>) -> String {
    format!("{}{}", format_name(title, year), extension_of(original_filename))
}

/// Destination file name for an episode, keeping the original extension.
pub fn suggest_episode_filename(
    original_filename: &str,
    series_title: &str,
    season: u32,
    episode: u32,
    episode_title: Option<&str>,
) -> String {
    format!(
        "{}{}",
        format_episode_name(series_title, season, episode, episode_title),
        extension_of(original_filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_name() {
        assert_eq!(format_name("Inception", Some(2010)), "Inception (2010)");
        assert_eq!(format_name("  Heat ", Some(1995)), "Heat (1995)");
        assert_eq!(format_name("Untitled", None), "Untitled");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Test: File/Name"), "Test_ File_Name");
        assert_eq!(sanitize_filename("Normal_File.Name"), "Normal_File.Name");
    }

    #[test]
    fn test_format_episode_name() {
        assert_eq!(
            format_episode_name("The Office", 2, 5, Some("Halloween")),
            "The Office - S02E05 - Halloween"
        );
        assert_eq!(format_episode_name("Lost", 1, 12, None), "Lost - S01E12");
        assert_eq!(format_episode_name("Lost", 1, 12, Some("  ")), "Lost - S01E12");
    }

    #[test]
    fn test_suggestions_keep_extension() {
        assert_eq!(
            suggest_movie_filename("inception.2010.1080p.MKV", "Inception", Some(2010)),
            "Inception (2010).MKV"
        );
        assert_eq!(
            suggest_episode_filename("office.s02e05.mp4", "The Office", 2, 5, Some("Halloween")),
            "The Office - S02E05 - Halloween.mp4"
        );
        assert_eq!(suggest_movie_filename("noext", "Heat", Some(1995)), "Heat (1995)");
    }
}
