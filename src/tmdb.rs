//! TMDB (The Movie Database) provider client.
//!
//! Uses TMDB API v3: https://developer.themoviedb.org/docs

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::provider::{
    EpisodeCandidate, MetadataProvider, ProviderError, SearchCandidate, SeasonSummary,
    SeriesDetails,
};

const BASE_URL: &str = "https://api.themoviedb.org/3";
const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const POSTER_SIZE: &str = "w342";
pub const STILL_SIZE: &str = "w300";

/// Full image URL for a poster/still path returned by the API.
pub fn image_url(size: &str, path: &str) -> String {
    format!("{IMAGE_BASE}/{size}{path}")
}

#[derive(Debug, Deserialize)]
struct SearchResponse<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct MovieResult {
    id: u64,
    title: Option<String>,
    release_date: Option<String>,
    poster_path: Option<String>,
    vote_average: Option<f64>,
    vote_count: Option<u64>,
    overview: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TvResult {
    id: u64,
    name: Option<String>,
    first_air_date: Option<String>,
    poster_path: Option<String>,
    vote_average: Option<f64>,
    vote_count: Option<u64>,
    overview: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TvDetailsResponse {
    id: u64,
    name: Option<String>,
    #[serde(default)]
    seasons: Vec<SeasonResult>,
}

#[derive(Debug, Deserialize)]
struct SeasonResult {
    season_number: Option<u32>,
    name: Option<String>,
    episode_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SeasonDetailsResponse {
    #[serde(default)]
    episodes: Vec<EpisodeResult>,
}

#[derive(Debug, Deserialize)]
struct EpisodeResult {
    season_number: Option<u32>,
    episode_number: u32,
    name: Option<String>,
    air_date: Option<String>,
    still_path: Option<String>,
    vote_average: Option<f64>,
    vote_count: Option<u64>,
    overview: Option<String>,
}

impl From<MovieResult> for SearchCandidate {
    fn from(r: MovieResult) -> Self {
        SearchCandidate {
            id: r.id,
            title: r.title.unwrap_or_else(|| "N/A".to_string()),
            release_date: r.release_date.filter(|d| !d.is_empty()),
            poster_path: r.poster_path,
            vote_average: r.vote_average,
            vote_count: r.vote_count,
            overview: r.overview.filter(|o| !o.is_empty()),
        }
    }
}

impl From<TvResult> for SearchCandidate {
    fn from(r: TvResult) -> Self {
        SearchCandidate {
            id: r.id,
            title: r.name.unwrap_or_else(|| "N/A".to_string()),
            release_date: r.first_air_date.filter(|d| !d.is_empty()),
            poster_path: r.poster_path,
            vote_average: r.vote_average,
            vote_count: r.vote_count,
            overview: r.overview.filter(|o| !o.is_empty()),
        }
    }
}

fn parse_movie_results(data: serde_json::Value) -> Result<Vec<SearchCandidate>, ProviderError> {
    let response: SearchResponse<MovieResult> = serde_json::from_value(data)
        .map_err(|e| ProviderError::Provider(format!("parse JSON: {e}")))?;
    Ok(response.results.into_iter().map(Into::into).collect())
}

fn parse_tv_results(data: serde_json::Value) -> Result<Vec<SearchCandidate>, ProviderError> {
    let response: SearchResponse<TvResult> = serde_json::from_value(data)
        .map_err(|e| ProviderError::Provider(format!("parse JSON: {e}")))?;
    Ok(response.results.into_iter().map(Into::into).collect())
}

fn parse_series_details(data: serde_json::Value) -> Result<SeriesDetails, ProviderError> {
    let response: TvDetailsResponse = serde_json::from_value(data)
        .map_err(|e| ProviderError::Provider(format!("parse JSON: {e}")))?;

    // Seasons without a number cannot be queried, skip them
    let seasons = response
        .seasons
        .into_iter()
        .filter_map(|s| {
            let season_number = s.season_number?;
            Some(SeasonSummary {
                season_number,
                name: s
                    .name
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| format!("Season {season_number}")),
                episode_count: s.episode_count,
            })
        })
        .collect();

    Ok(SeriesDetails {
        id: response.id,
        name: response.name.unwrap_or_default(),
        seasons,
    })
}

fn parse_season_details(
    data: serde_json::Value,
    series_title: &str,
    season_number: u32,
) -> Result<Vec<EpisodeCandidate>, ProviderError> {
    let response: SeasonDetailsResponse = serde_json::from_value(data)
        .map_err(|e| ProviderError::Provider(format!("parse JSON: {e}")))?;

    Ok(response
        .episodes
        .into_iter()
        .map(|ep| EpisodeCandidate {
            series_title: series_title.to_string(),
            season_number: ep.season_number.unwrap_or(season_number),
            episode_number: ep.episode_number,
            name: ep.name.filter(|n| !n.is_empty()),
            air_date: ep.air_date,
            still_path: ep.still_path,
            vote_average: ep.vote_average,
            vote_count: ep.vote_count,
            overview: ep.overview.filter(|o| !o.is_empty()),
        })
        .collect())
}

pub struct TmdbClient {
    api_key: String,
    language: String,
    client: reqwest::Client,
}

impl TmdbClient {
    /// Fails with `MissingCredential` when the key is blank, before any request is made.
    pub fn new(api_key: &str, language: &str) -> Result<Self, ProviderError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ProviderError::MissingCredential);
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            api_key: api_key.to_string(),
            language: language.to_string(),
            client,
        })
    }

    async fn get_json(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value, ProviderError> {
        let mut all_params = vec![
            ("api_key", self.api_key.as_str()),
            ("language", self.language.as_str()),
        ];
        all_params.extend_from_slice(params);

        let url = format!("{BASE_URL}{path}");
        debug!(url = %url, "TMDB request");

        let resp = self
            .client
            .get(&url)
            .query(&all_params)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound);
        }

        if !resp.status().is_success() {
            return Err(ProviderError::Provider(format!(
                "TMDB returned {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| ProviderError::Provider(format!("parse JSON: {e}")))
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbClient {
    fn name(&self) -> &str {
        "tmdb"
    }

    async fn search_movie(
        &self,
        query: &str,
        year: Option<u16>,
    ) -> Result<Vec<SearchCandidate>, ProviderError> {
        let mut params = vec![("query", query)];
        let year_str = year.map(|y| y.to_string());
        if let Some(ref y) = year_str {
            params.push(("year", y.as_str()));
        }

        let data = self.get_json("/search/movie", &params).await?;
        parse_movie_results(data)
    }

    async fn search_series(
        &self,
        query: &str,
        year: Option<u16>,
    ) -> Result<Vec<SearchCandidate>, ProviderError> {
        let mut params = vec![("query", query)];
        let year_str = year.map(|y| y.to_string());
        if let Some(ref y) = year_str {
            params.push(("first_air_date_year", y.as_str()));
        }

        let data = self.get_json("/search/tv", &params).await?;
        parse_tv_results(data)
    }

    async fn get_series_details(&self, series_id: u64) -> Result<SeriesDetails, ProviderError> {
        let data = self.get_json(&format!("/tv/{series_id}"), &[]).await?;
        parse_series_details(data)
    }

    async fn get_season_details(
        &self,
        series_id: u64,
        series_title: &str,
        season_number: u32,
    ) -> Result<Vec<EpisodeCandidate>, ProviderError> {
        let data = self
            .get_json(&format!("/tv/{series_id}/season/{season_number}"), &[])
            .await?;
        parse_season_details(data, series_title, season_number)
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        debug!(url = %url, "TMDB image request");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ProviderError::Provider(format!(
                "image request returned {}",
                resp.status()
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_key_is_a_configuration_error() {
        assert!(matches!(
            TmdbClient::new("  ", "en-US"),
            Err(ProviderError::MissingCredential)
        ));
    }

    #[test]
    fn test_parse_movie_results() {
        let data = json!({
            "page": 1,
            "results": [
                {
                    "id": 27205,
                    "title": "Inception",
                    "release_date": "2010-07-15",
                    "poster_path": "/inception.jpg",
                    "vote_average": 8.4,
                    "vote_count": 35000,
                    "overview": "Cobb steals secrets."
                },
                { "id": 1, "release_date": "", "overview": "" }
            ]
        });

        let results = parse_movie_results(data).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Inception");
        assert_eq!(results[0].year(), Some(2010));
        assert_eq!(results[0].vote_count, Some(35000));
        assert_eq!(results[1].title, "N/A");
        assert_eq!(results[1].release_date, None);
        assert_eq!(results[1].overview, None);
    }

    #[test]
    fn test_parse_tv_results_uses_name_and_first_air_date() {
        let data = json!({
            "results": [
                { "id": 2316, "name": "The Office", "first_air_date": "2005-03-24" }
            ]
        });

        let results = parse_tv_results(data).unwrap();
        assert_eq!(results[0].title, "The Office");
        assert_eq!(results[0].label(), "The Office (2005)");
    }

    #[test]
    fn test_parse_series_details_skips_unnumbered_seasons() {
        let data = json!({
            "id": 2316,
            "name": "The Office",
            "seasons": [
                { "season_number": 0, "name": "Specials", "episode_count": 3 },
                { "season_number": 1, "name": "", "episode_count": 6 },
                { "name": "Broken" }
            ]
        });

        let details = parse_series_details(data).unwrap();
        assert_eq!(details.seasons.len(), 2);
        assert_eq!(details.seasons[0].name, "Specials");
        assert_eq!(details.seasons[1].name, "Season 1");
    }

    #[test]
    fn test_parse_season_details() {
        let data = json!({
            "episodes": [
                { "episode_number": 1, "season_number": 2, "name": "The Dundies", "still_path": "/a.jpg" },
                { "episode_number": 2, "name": "" }
            ]
        });

        let episodes = parse_season_details(data, "The Office", 2).unwrap();
        assert_eq!(episodes.len(), 2);
        assert_eq!(episodes[0].series_title, "The Office");
        assert_eq!(episodes[0].label(), "E01 - The Dundies");
        assert_eq!(episodes[1].season_number, 2);
        assert_eq!(episodes[1].name, None);
    }

    #[test]
    fn test_image_url() {
        assert_eq!(
            image_url(POSTER_SIZE, "/abc.jpg"),
            "https://image.tmdb.org/t/p/w342/abc.jpg"
        );
    }
}
