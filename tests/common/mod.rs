#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use kodi_rename::provider::{
    EpisodeCandidate, MetadataProvider, ProviderError, SearchCandidate, SeasonSummary,
    SeriesDetails,
};

/// In-memory provider that records every call and how many overlapped.
#[derive(Default)]
pub struct MockProvider {
    pub results: HashMap<String, Vec<SearchCandidate>>,
    pub failing: Vec<String>,
    pub episodes: Vec<EpisodeCandidate>,
    pub seasons: Vec<SeasonSummary>,
    pub images: HashMap<String, Vec<u8>>,
    pub delay: Option<Duration>,
    pub calls: Mutex<Vec<String>>,
    pub image_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(mut self, query: &str, results: Vec<SearchCandidate>) -> Self {
        self.results.insert(query.to_string(), results);
        self
    }

    pub fn failing_on(mut self, query: &str) -> Self {
        self.failing.push(query.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn search(&self, kind: &str, query: &str) -> Result<Vec<SearchCandidate>, ProviderError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(format!("{kind}:{query}"));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.iter().any(|q| q == query) {
            return Err(ProviderError::Network("connection reset".to_string()));
        }
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl MetadataProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search_movie(
        &self,
        query: &str,
        _year: Option<u16>,
    ) -> Result<Vec<SearchCandidate>, ProviderError> {
        self.search("movie", query).await
    }

    async fn search_series(
        &self,
        query: &str,
        _year: Option<u16>,
    ) -> Result<Vec<SearchCandidate>, ProviderError> {
        self.search("tv", query).await
    }

    async fn get_series_details(&self, series_id: u64) -> Result<SeriesDetails, ProviderError> {
        Ok(SeriesDetails {
            id: series_id,
            name: "Mock Show".to_string(),
            seasons: self.seasons.clone(),
        })
    }

    async fn get_season_details(
        &self,
        _series_id: u64,
        _series_title: &str,
        _season_number: u32,
    ) -> Result<Vec<EpisodeCandidate>, ProviderError> {
        Ok(self.episodes.clone())
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        self.images.get(url).cloned().ok_or(ProviderError::NotFound)
    }
}

pub fn candidate(id: u64, title: &str, date: Option<&str>) -> SearchCandidate {
    SearchCandidate {
        id,
        title: title.to_string(),
        release_date: date.map(str::to_string),
        poster_path: Some(format!("/poster{id}.jpg")),
        vote_average: Some(7.5),
        vote_count: Some(100),
        overview: None,
    }
}

pub fn episode(season: u32, number: u32, name: &str) -> EpisodeCandidate {
    EpisodeCandidate {
        series_title: "Mock Show".to_string(),
        season_number: season,
        episode_number: number,
        name: Some(name.to_string()),
        air_date: None,
        still_path: None,
        vote_average: None,
        vote_count: None,
        overview: None,
    }
}
