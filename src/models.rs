use std::path::{Path, PathBuf};

use crate::formatter::{suggest_episode_filename, suggest_movie_filename};
use crate::normalizer::{normalize, NormalizedName};
use crate::provider::{EpisodeCandidate, MediaType, SearchCandidate};
use crate::tmdb::{image_url, POSTER_SIZE, STILL_SIZE};

/// A video discovered by a folder scan. Never mutated after discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    Title(SearchCandidate),
    Episode(EpisodeCandidate),
}

impl Candidate {
    pub fn label(&self) -> String {
        match self {
            Candidate::Title(c) => c.label(),
            Candidate::Episode(e) => e.label(),
        }
    }

    pub fn artwork_url(&self) -> Option<String> {
        match self {
            Candidate::Title(c) => c.poster_path.as_deref().map(|p| image_url(POSTER_SIZE, p)),
            Candidate::Episode(e) => e.still_path.as_deref().map(|p| image_url(STILL_SIZE, p)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    /// Not searched yet.
    Waiting,
    Searching,
    /// Query was empty, no lookup made.
    Skipped,
    Matched,
    NoResults,
    /// Lookup failed; treated as zero results.
    Failed,
    /// Episode list applied but no episode picked automatically.
    NeedsManual,
}

/// One line of the match table: a file, its candidates and the chosen one.
///
/// The selection is `None` whenever `candidates` is empty and otherwise never
/// points past the end of the list.
#[derive(Debug, Clone)]
pub struct MatchRow {
    file: LocalFile,
    normalized: NormalizedName,
    candidates: Vec<Candidate>,
    selected: Option<usize>,
    /// Error text of the last failed lookup.
    failure: Option<String>,
    pub media_type: MediaType,
    pub status: RowStatus,
    /// Marked by the user for transfer.
    pub marked: bool,
}

impl MatchRow {
    pub fn new(file: LocalFile, media_type: MediaType) -> Self {
        let normalized = normalize(file.name());
        Self {
            file,
            normalized,
            candidates: Vec::new(),
            selected: None,
            failure: None,
            media_type,
            status: RowStatus::Waiting,
            marked: false,
        }
    }

    pub fn file(&self) -> &LocalFile {
        &self.file
    }

    pub fn normalized(&self) -> &NormalizedName {
        &self.normalized
    }

    pub fn detected_year(&self) -> Option<u16> {
        self.normalized.year
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Selection as the legacy `-1`-for-none index.
    pub fn selected_index(&self) -> isize {
        self.selected.map(|i| i as isize).unwrap_or(-1)
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn selected_candidate(&self) -> Option<&Candidate> {
        self.selected.and_then(|i| self.candidates.get(i))
    }

    /// Store search results and default the selection to the first one.
    pub fn set_search_results(&mut self, media_type: MediaType, results: Vec<SearchCandidate>) {
        self.media_type = media_type;
        self.failure = None;
        self.candidates = results.into_iter().map(Candidate::Title).collect();
        self.selected = if self.candidates.is_empty() { None } else { Some(0) };
        self.status = if self.candidates.is_empty() {
            RowStatus::NoResults
        } else {
            RowStatus::Matched
        };
    }

    /// Store a season listing with an explicit (possibly absent) selection.
    pub fn set_episodes(&mut self, episodes: Vec<EpisodeCandidate>, selected: Option<usize>) {
        self.media_type = MediaType::Series;
        self.failure = None;
        self.candidates = episodes.into_iter().map(Candidate::Episode).collect();
        self.selected = selected.filter(|&i| i < self.candidates.len());
        self.status = if self.selected.is_some() {
            RowStatus::Matched
        } else {
            RowStatus::NeedsManual
        };
    }

    pub fn clear_candidates(&mut self, status: RowStatus) {
        self.candidates.clear();
        self.selected = None;
        self.failure = None;
        self.status = status;
    }

    /// A failed lookup leaves the row without candidates and keeps the error.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.clear_candidates(RowStatus::Failed);
        self.failure = Some(error.into());
    }

    /// Returns false and leaves the selection untouched when `index` is out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.candidates.len() {
            return false;
        }
        self.selected = Some(index);
        if self.status == RowStatus::NeedsManual {
            self.status = RowStatus::Matched;
        }
        true
    }

    /// Step the selection forward, wrapping around. Starts at 0 with no selection.
    pub fn select_next(&mut self) {
        if self.candidates.is_empty() {
            return;
        }
        let next = match self.selected {
            Some(i) if i + 1 < self.candidates.len() => i + 1,
            Some(_) => 0,
            None => 0,
        };
        self.select(next);
    }

    pub fn select_previous(&mut self) {
        if self.candidates.is_empty() {
            return;
        }
        let last = self.candidates.len() - 1;
        let prev = match self.selected {
            Some(0) | None => last,
            Some(i) => i - 1,
        };
        self.select(prev);
    }

    /// Destination file name derived from the current selection.
    pub fn suggested_name(&self) -> Option<String> {
        let original = self.file.name();
        match self.selected_candidate()? {
            Candidate::Title(c) => Some(suggest_movie_filename(original, &c.title, c.year())),
            Candidate::Episode(e) => Some(suggest_episode_filename(
                original,
                &e.series_title,
                e.season_number,
                e.episode_number,
                e.name.as_deref(),
            )),
        }
    }

    /// Suggested name, or the original file name when nothing is selected.
    pub fn destination_name(&self) -> String {
        self.suggested_name()
            .unwrap_or_else(|| self.file.name().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(title: &str, date: &str) -> SearchCandidate {
        SearchCandidate {
            id: 7,
            title: title.to_string(),
            release_date: Some(date.to_string()),
            poster_path: Some("/p.jpg".to_string()),
            vote_average: None,
            vote_count: None,
            overview: None,
        }
    }

    #[test]
    fn test_selection_follows_results() {
        let mut row = MatchRow::new(LocalFile::new("/in/inception.2010.mkv"), MediaType::Movie);
        assert_eq!(row.selected_index(), -1);

        row.set_search_results(MediaType::Movie, vec![candidate("Inception", "2010-07-15")]);
        assert_eq!(row.selected(), Some(0));
        assert_eq!(row.suggested_name().as_deref(), Some("Inception (2010).mkv"));

        row.set_search_results(MediaType::Movie, Vec::new());
        assert_eq!(row.selected_index(), -1);
        assert_eq!(row.status, RowStatus::NoResults);
        assert_eq!(row.destination_name(), "inception.2010.mkv");
    }

    #[test]
    fn test_select_rejects_out_of_range() {
        let mut row = MatchRow::new(LocalFile::new("a.mkv"), MediaType::Movie);
        row.set_search_results(
            MediaType::Movie,
            vec![candidate("A", "2001-01-01"), candidate("B", "2000-01-01")],
        );
        assert!(!row.select(2));
        assert_eq!(row.selected(), Some(0));
        row.select_previous();
        assert_eq!(row.selected(), Some(1));
        row.select_next();
        assert_eq!(row.selected(), Some(0));
    }

    #[test]
    fn test_failure_kept_until_next_result() {
        let mut row = MatchRow::new(LocalFile::new("a.mkv"), MediaType::Movie);
        row.mark_failed("HTTP status 503");
        assert_eq!(row.status, RowStatus::Failed);
        assert_eq!(row.failure(), Some("HTTP status 503"));
        assert!(row.selected().is_none());

        row.set_search_results(MediaType::Movie, vec![candidate("A", "2001-01-01")]);
        assert!(row.failure().is_none());
    }

    #[test]
    fn test_artwork_url() {
        let c = Candidate::Title(candidate("A", "2001-01-01"));
        assert_eq!(
            c.artwork_url().as_deref(),
            Some("https://image.tmdb.org/t/p/w342/p.jpg")
        );
    }
}
