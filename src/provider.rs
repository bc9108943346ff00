use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("TMDB API key is not configured")]
    MissingCredential,
    #[error("network error: {0}")]
    Network(String),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("not found")]
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MediaType {
    #[default]
    Movie,
    Series,
}

impl MediaType {
    pub fn label(&self) -> &'static str {
        match self {
            MediaType::Movie => "Movies",
            MediaType::Series => "Series",
        }
    }
}

/// A movie or series returned by a search query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    pub id: u64,
    pub title: String,
    /// `YYYY-MM-DD` as sent by the provider.
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
    pub overview: Option<String>,
}

impl SearchCandidate {
    pub fn year(&self) -> Option<u16> {
        year_of(self.release_date.as_deref())
    }

    /// Combo label: `Title (Year)`, or the bare title when undated.
    pub fn label(&self) -> String {
        match self.year() {
            Some(year) => format!("{} ({year})", self.title),
            None => self.title.clone(),
        }
    }
}

/// One entry of a season listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeCandidate {
    pub series_title: String,
    pub season_number: u32,
    pub episode_number: u32,
    pub name: Option<String>,
    pub air_date: Option<String>,
    pub still_path: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
    pub overview: Option<String>,
}

impl EpisodeCandidate {
    pub fn label(&self) -> String {
        match self.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => format!("E{:02} - {name}", self.episode_number),
            None => format!("E{:02}", self.episode_number),
        }
    }
}

/// Season summary from the series details endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub season_number: u32,
    pub name: String,
    pub episode_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesDetails {
    pub id: u64,
    pub name: String,
    pub seasons: Vec<SeasonSummary>,
}

/// Leading four-digit year of a provider date string.
pub fn year_of(date: Option<&str>) -> Option<u16> {
    date.and_then(|d| d.get(..4)).and_then(|y| y.parse().ok())
}

/// Most recent release first. Undated entries sort last.
pub fn sort_by_release_desc(candidates: &mut [SearchCandidate]) {
    candidates.sort_by(|a, b| {
        let a = a.release_date.as_deref().unwrap_or("");
        let b = b.release_date.as_deref().unwrap_or("");
        b.cmp(a)
    });
}

/// A metadata provider that can search titles and list season episodes.
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Search for a movie by title and optional year.
    async fn search_movie(
        &self,
        query: &str,
        year: Option<u16>,
    ) -> Result<Vec<SearchCandidate>, ProviderError>;

    /// Search for a TV series by name and optional first-air year.
    async fn search_series(
        &self,
        query: &str,
        year: Option<u16>,
    ) -> Result<Vec<SearchCandidate>, ProviderError>;

    async fn get_series_details(&self, series_id: u64) -> Result<SeriesDetails, ProviderError>;

    /// Episodes of one season. `series_title` is copied into every entry.
    async fn get_season_details(
        &self,
        series_id: u64,
        series_title: &str,
        season_number: u32,
    ) -> Result<Vec<EpisodeCandidate>, ProviderError>;

    /// Raw bytes of a poster or still image.
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ProviderError>;
}
