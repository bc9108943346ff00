use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Video extensions accepted when scanning a folder (compared lower-case).
pub const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "mov", "flv", "wmv", "m4v"];

static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").expect("year regex should compile"));

// S02E05, s1e3, S01E100
static SXXEXX_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bs(?P<season>\d{1,2})e(?P<episode>\d{1,3})\b")
        .expect("SxxExx regex should compile")
});

// 2x05
static NXNN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?P<season>\d{1,2})x(?P<episode>\d{2,3})\b")
        .expect("NxNN regex should compile")
});

// Longer alternatives come first so "dual audio" is removed as one token.
static RELEASE_TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(",
        r"\d{3,4}p|\d{3,4}i|4k|uhd|hdr|10bit",
        r"|dublado|dual\s*audio|dual\s*5\.1|dual|5\.1",
        r"|camrip|webrip|web[-\s]?dl|web\s*rip|web|hdrip|brrip|blu\s*ray|bluray",
        r"|remux|proper|repack|extended|unrated|dc|ltd",
        r"|xvid|x264|x265|h264|h265",
        r"|dvdrip|dvd|subs|hdcam|cam|ts|tc|r5",
        r")\b",
    ))
    .expect("release tag regex should compile")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex should compile"));

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("punctuation regex should compile"));

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digit regex should compile"));

/// Season/episode pair read from a filename marker such as `S02E05`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeMarker {
    pub season: u32,
    pub episode: u32,
}

/// Search query and hints derived from a raw filename.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedName {
    /// Lower-case query with tags, punctuation and digits removed. May be empty.
    pub query: String,
    pub year: Option<u16>,
    pub episode: Option<EpisodeMarker>,
}

impl NormalizedName {
    /// An empty query means the remote lookup must be skipped.
    pub fn is_searchable(&self) -> bool {
        !self.query.is_empty()
    }
}

/// Check if a file name carries one of the accepted video extensions.
pub fn is_video_file(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// File name without its final extension. Dot-files keep their full name.
pub fn file_stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(filename)
}

/// First `19xx`/`20xx` whole-word token in the name, left to right.
pub fn extract_year(name: &str) -> Option<u16> {
    YEAR_PATTERN
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Season/episode marker (`S02E05` or `2x05`) found in a filename.
pub fn extract_episode_info(filename: &str) -> Option<EpisodeMarker> {
    let stem = file_stem(filename);
    [&*SXXEXX_PATTERN, &*NXNN_PATTERN].iter().find_map(|pattern| {
        let caps = pattern.captures(stem)?;
        Some(EpisodeMarker {
            season: caps.name("season")?.as_str().parse().ok()?,
            episode: caps.name("episode")?.as_str().parse().ok()?,
        })
    })
}

/// Derive a search query plus optional year and episode marker from a filename.
///
/// The year is read from the untouched stem because digit stripping would
/// otherwise destroy it. An episode marker is cut out of the query so that
/// what remains names the series.
pub fn normalize(filename: &str) -> NormalizedName {
    let stem = file_stem(filename);
    let year = extract_year(stem);
    let episode = extract_episode_info(filename);

    let mut name = stem.to_string();
    if episode.is_some() {
        for pattern in [&*SXXEXX_PATTERN, &*NXNN_PATTERN] {
            name = pattern.replace_all(&name, " ").into_owned();
        }
    }

    let name = name.replace(['.', '-', '_'], " ").to_lowercase();
    let name = RELEASE_TAGS.replace_all(&name, " ");
    let name = WHITESPACE.replace_all(&name, " ");
    let name = PUNCTUATION.replace_all(&name, "");
    let name = DIGITS.replace_all(&name, " ");
    let query = WHITESPACE.replace_all(&name, " ").trim().to_string();

    NormalizedName {
        query,
        year,
        episode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_next_to_resolution_tags() {
        let normalized = normalize("Movie.Name.2014.1080p.BluRay.x264.mkv");
        assert_eq!(normalized.query, "movie name");
        assert_eq!(normalized.year, Some(2014));
        assert_eq!(normalized.episode, None);
    }

    #[test]
    fn test_first_year_wins() {
        assert_eq!(extract_year("Blade.Runner.2049.1982.cut"), Some(2049));
        assert_eq!(extract_year("2001.A.Space.Odyssey.1968"), Some(2001));
        assert_eq!(extract_year("Movie.2160p.x265"), None);
        assert_eq!(extract_year("Movie.1850"), None);
    }

    #[test]
    fn test_no_digits_left_in_query() {
        let normalized = normalize("Some.Movie.Part2.CD1.720p.mkv");
        assert_eq!(normalized.query, "some movie part cd");
        assert!(!normalized.query.chars().any(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_tags_are_whole_words() {
        // "tsunami" and "webster" contain tag prefixes but are not tags
        let normalized = normalize("Tsunami.Webster.WEB-DL.DUAL.5.1.mp4");
        assert_eq!(normalized.query, "tsunami webster");
    }

    #[test]
    fn test_dual_audio_removed_as_one_tag() {
        let normalized = normalize("Filme [Dual Audio] 2019 WEBRip.avi");
        assert_eq!(normalized.query, "filme");
        assert_eq!(normalized.year, Some(2019));
    }

    #[test]
    fn test_numeric_only_name_is_not_searchable() {
        let normalized = normalize("1080p.2012.x264.mkv");
        assert_eq!(normalized.query, "");
        assert_eq!(normalized.year, Some(2012));
        assert!(!normalized.is_searchable());
    }

    #[test]
    fn test_episode_marker_is_cut_from_query() {
        let normalized = normalize("The.Office.S02E05.720p.HDTV.mkv");
        assert_eq!(normalized.query, "the office hdtv");
        assert_eq!(
            normalized.episode,
            Some(EpisodeMarker {
                season: 2,
                episode: 5
            })
        );
    }

    #[test]
    fn test_extract_episode_info_patterns() {
        assert_eq!(
            extract_episode_info("show.s1e03.mkv"),
            Some(EpisodeMarker {
                season: 1,
                episode: 3
            })
        );
        assert_eq!(
            extract_episode_info("Show 3x12 Title.mp4"),
            Some(EpisodeMarker {
                season: 3,
                episode: 12
            })
        );
        assert_eq!(extract_episode_info("Movie.2014.1080p.mkv"), None);
        assert_eq!(extract_episode_info("Movie.1920x1080.mkv"), None);
    }

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file("movie.MKV"));
        assert!(is_video_file("a.b.m4v"));
        assert!(!is_video_file("movie.srt"));
        assert!(!is_video_file("mkv"));
    }
}
