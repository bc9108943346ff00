use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use ratatui::widgets::{ListState, ScrollbarState};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::artwork::ArtworkCache;
use crate::matcher::{apply_event, apply_season, plan_jobs, MatchHandle};
use crate::models::{Candidate, LocalFile, MatchRow};
use crate::provider::{
    sort_by_release_desc, EpisodeCandidate, MediaType, MetadataProvider, ProviderError,
    SearchCandidate, SeasonSummary, SeriesDetails,
};
use crate::scanner::{list_library_files, scan_folder};
use crate::settings::{AppConfig, SettingsStore};
use crate::tmdb::TmdbClient;
use crate::transfer::{transfer_batch, TransferMode, TransferRequest};

use super::models::{
    ArtworkLoaded, ArtworkState, ConfigInputMode, ProcessingStats, SettingsField, SetupLoaded,
};
use super::utils::step_index;

pub struct App {
    pub config: AppConfig,
    store: Option<SettingsStore>,
    provider: Option<Arc<dyn MetadataProvider>>,
    pub media_type: MediaType,
    pub rows: Vec<MatchRow>,
    pub library_files: Vec<String>,
    pub list_state: ListState,
    pub scroll_state: ScrollbarState,
    pub show_help: bool,
    pub show_preview: bool,
    pub show_config: bool,
    pub show_settings: bool,
    pub settings_field: SettingsField,
    pub config_input_mode: ConfigInputMode,
    pub source_input: String,
    pub library_input: String,
    pub series_query_input: String,
    pub series_results: Vec<SearchCandidate>,
    pub series_choice: Option<usize>,
    pub seasons: Vec<SeasonSummary>,
    pub season_choice: Option<usize>,
    /// Episode listing applied in series mode, kept for refreshes.
    season_episodes: Vec<EpisodeCandidate>,
    /// Text typed into the credential prompt, `Some` while it is open.
    pub api_key_input: Option<String>,
    pub transfer_report: Option<Vec<String>>,
    matcher: Option<MatchHandle>,
    /// Set while a configuration-screen request is outstanding.
    setup_pending: bool,
    setup_tx: mpsc::UnboundedSender<SetupLoaded>,
    setup_rx: mpsc::UnboundedReceiver<SetupLoaded>,
    pub stats: ProcessingStats,
    artwork: ArtworkCache,
    pub artwork_states: HashMap<String, ArtworkState>,
    artwork_tx: mpsc::UnboundedSender<ArtworkLoaded>,
    artwork_rx: mpsc::UnboundedReceiver<ArtworkLoaded>,
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,
}

impl App {
    pub fn new(config: AppConfig, store: Option<SettingsStore>, media_type: MediaType) -> Self {
        let (artwork_tx, artwork_rx) = mpsc::unbounded_channel();
        let (setup_tx, setup_rx) = mpsc::unbounded_channel();
        let source_input = path_input(config.source_folder.as_ref());
        let library_input = path_input(config.library_folder.as_ref());

        Self {
            config,
            store,
            provider: None,
            media_type,
            rows: Vec::new(),
            library_files: Vec::new(),
            list_state: ListState::default(),
            scroll_state: ScrollbarState::default(),
            show_help: false,
            show_preview: true,
            show_config: true,
            show_settings: false,
            settings_field: SettingsField::ApiKey,
            config_input_mode: ConfigInputMode::MediaType,
            source_input,
            library_input,
            series_query_input: String::new(),
            series_results: Vec::new(),
            series_choice: None,
            seasons: Vec::new(),
            season_choice: None,
            season_episodes: Vec::new(),
            api_key_input: None,
            transfer_report: None,
            matcher: None,
            setup_pending: false,
            setup_tx,
            setup_rx,
            stats: ProcessingStats::default(),
            artwork: ArtworkCache::new(),
            artwork_states: HashMap::new(),
            artwork_tx,
            artwork_rx,
            status_message: None,
            status_message_time: None,
        }
    }

    /// Use an already built provider instead of constructing one from the config.
    pub fn with_provider(mut self, provider: Arc<dyn MetadataProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn is_matching(&self) -> bool {
        self.matcher.is_some()
    }

    /// A series, season or episode request from the configuration screen is running.
    pub fn is_loading(&self) -> bool {
        self.setup_pending
    }

    fn is_busy(&self) -> bool {
        self.is_matching() || self.is_loading()
    }

    pub fn selected_row(&self) -> Option<&MatchRow> {
        self.list_state.selected().and_then(|i| self.rows.get(i))
    }

    pub fn selected_series(&self) -> Option<&SearchCandidate> {
        self.series_choice.and_then(|i| self.series_results.get(i))
    }

    pub fn selected_season(&self) -> Option<&SeasonSummary> {
        self.season_choice.and_then(|i| self.seasons.get(i))
    }

    pub fn marked_count(&self) -> usize {
        self.rows.iter().filter(|r| r.marked).count()
    }

    // Provider and credentials

    /// The provider, building it from the config on first use.
    ///
    /// A missing key opens the credential prompt and yields `None`.
    fn ensure_provider(&mut self) -> Option<Arc<dyn MetadataProvider>> {
        if let Some(provider) = &self.provider {
            return Some(Arc::clone(provider));
        }

        match TmdbClient::new(&self.config.api_key, &self.config.language) {
            Ok(client) => {
                let provider: Arc<dyn MetadataProvider> = Arc::new(client);
                self.provider = Some(Arc::clone(&provider));
                Some(provider)
            }
            Err(ProviderError::MissingCredential) => {
                self.api_key_input = Some(String::new());
                self.set_status_message("A TMDB API key is required".to_string());
                None
            }
            Err(e) => {
                warn!(error = %e, "failed to build TMDB client");
                self.set_status_message(format!("Provider error: {e}"));
                None
            }
        }
    }

    pub fn handle_api_key_input(&mut self, c: char) {
        if let Some(input) = self.api_key_input.as_mut() {
            if c == '\x08' {
                input.pop();
            } else if !c.is_control() {
                input.push(c);
            }
        }
    }

    pub fn cancel_api_key_prompt(&mut self) {
        self.api_key_input = None;
    }

    pub fn submit_api_key(&mut self) -> Result<()> {
        let Some(input) = self.api_key_input.take() else {
            return Ok(());
        };
        let key = input.trim().to_string();
        if key.is_empty() {
            self.api_key_input = Some(String::new());
            return Ok(());
        }

        self.config.api_key = key;
        self.provider = None;
        self.persist_config()?;
        self.set_status_message("API key saved, press Enter to continue".to_string());
        Ok(())
    }

    fn persist_config(&self) -> Result<()> {
        if let Some(store) = &self.store {
            self.config
                .save(store)
                .with_context(|| format!("Failed to save settings to {}", store.path().display()))?;
        }
        Ok(())
    }

    // Configuration screen

    pub fn handle_config_input(&mut self, c: char) {
        match self.config_input_mode {
            ConfigInputMode::MediaType => {
                if c == 'm' || c == 'M' {
                    self.media_type = MediaType::Movie;
                    self.advance_config_step();
                } else if c == 's' || c == 'S' {
                    self.media_type = MediaType::Series;
                    self.advance_config_step();
                }
            }
            ConfigInputMode::SourceFolder => edit_text(&mut self.source_input, c),
            ConfigInputMode::LibraryFolder => edit_text(&mut self.library_input, c),
            ConfigInputMode::SeriesQuery => edit_text(&mut self.series_query_input, c),
            _ => {}
        }
    }

    /// Enter on the configuration screen.
    ///
    /// Steps that talk to the provider only start the request; the answer is
    /// applied by [`App::poll_setup`].
    pub fn confirm_config_step(&mut self) -> Result<()> {
        if self.is_loading() {
            self.set_status_message("Still waiting for TMDB".to_string());
            return Ok(());
        }
        match self.config_input_mode {
            ConfigInputMode::SourceFolder => {
                let path = PathBuf::from(self.source_input.trim());
                if !path.is_dir() {
                    self.set_status_message(format!("Folder not found: {}", path.display()));
                    return Ok(());
                }
                self.config.source_folder = Some(path);
                self.advance_config_step();
            }
            ConfigInputMode::LibraryFolder => {
                let path = PathBuf::from(self.library_input.trim());
                if !path.is_dir() {
                    self.set_status_message(format!("Folder not found: {}", path.display()));
                    return Ok(());
                }
                self.config.library_folder = Some(path);
                self.persist_config()?;
                self.advance_config_step();
            }
            ConfigInputMode::SeriesQuery => {
                if self.series_query_input.trim().is_empty() {
                    self.series_results.clear();
                    self.series_choice = None;
                    self.seasons.clear();
                    self.season_choice = None;
                    self.config_input_mode = ConfigInputMode::Confirm;
                    return Ok(());
                }
                self.search_series();
            }
            ConfigInputMode::SeriesChoice => self.load_seasons(),
            ConfigInputMode::SeasonChoice => {
                if self.season_choice.is_some() {
                    self.advance_config_step();
                }
            }
            ConfigInputMode::Confirm => self.start()?,
            ConfigInputMode::MediaType => {}
        }
        Ok(())
    }

    pub fn advance_config_step(&mut self) {
        self.config_input_mode = match self.config_input_mode {
            ConfigInputMode::MediaType => ConfigInputMode::SourceFolder,
            ConfigInputMode::SourceFolder => ConfigInputMode::LibraryFolder,
            ConfigInputMode::LibraryFolder => match self.media_type {
                MediaType::Movie => ConfigInputMode::Confirm,
                MediaType::Series => ConfigInputMode::SeriesQuery,
            },
            ConfigInputMode::SeriesQuery => ConfigInputMode::SeriesChoice,
            ConfigInputMode::SeriesChoice => ConfigInputMode::SeasonChoice,
            ConfigInputMode::SeasonChoice => ConfigInputMode::Confirm,
            ConfigInputMode::Confirm => ConfigInputMode::Confirm,
        };
    }

    pub fn go_back_config_step(&mut self) {
        self.config_input_mode = match self.config_input_mode {
            ConfigInputMode::MediaType => ConfigInputMode::MediaType,
            ConfigInputMode::SourceFolder => ConfigInputMode::MediaType,
            ConfigInputMode::LibraryFolder => ConfigInputMode::SourceFolder,
            ConfigInputMode::SeriesQuery => ConfigInputMode::LibraryFolder,
            ConfigInputMode::SeriesChoice => ConfigInputMode::SeriesQuery,
            ConfigInputMode::SeasonChoice => ConfigInputMode::SeriesChoice,
            ConfigInputMode::Confirm => match (self.media_type, self.season_choice) {
                (MediaType::Movie, _) => ConfigInputMode::LibraryFolder,
                (MediaType::Series, Some(_)) => ConfigInputMode::SeasonChoice,
                (MediaType::Series, None) => ConfigInputMode::SeriesQuery,
            },
        };
    }

    pub fn handle_config_navigation(&mut self, key: KeyCode) {
        match key {
            KeyCode::Left | KeyCode::Backspace => self.go_back_config_step(),
            KeyCode::Up | KeyCode::Down => {
                let forward = key == KeyCode::Down;
                match self.config_input_mode {
                    ConfigInputMode::SeriesChoice => {
                        self.series_choice =
                            step_index(self.series_choice, self.series_results.len(), forward);
                    }
                    ConfigInputMode::SeasonChoice => {
                        self.season_choice =
                            step_index(self.season_choice, self.seasons.len(), forward);
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    fn spawn_setup<F>(&mut self, request: F)
    where
        F: Future<Output = SetupLoaded> + Send + 'static,
    {
        self.setup_pending = true;
        let tx = self.setup_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(request.await);
        });
    }

    fn search_series(&mut self) {
        let Some(provider) = self.ensure_provider() else {
            return;
        };
        let query = self.series_query_input.trim().to_string();

        self.spawn_setup(async move {
            let result = provider
                .search_series(&query, None)
                .await
                .map_err(|e| e.to_string());
            SetupLoaded::SeriesResults { query, result }
        });
    }

    fn load_seasons(&mut self) {
        let Some(series_id) = self.selected_series().map(|s| s.id) else {
            return;
        };
        let Some(provider) = self.ensure_provider() else {
            return;
        };

        self.spawn_setup(async move {
            let result = provider
                .get_series_details(series_id)
                .await
                .map_err(|e| e.to_string());
            SetupLoaded::SeriesDetails { series_id, result }
        });
    }

    fn load_episodes(&mut self, series: SearchCandidate, season_number: u32) {
        let Some(provider) = self.ensure_provider() else {
            return;
        };

        self.spawn_setup(async move {
            let result = provider
                .get_season_details(series.id, &series.title, season_number)
                .await
                .map_err(|e| e.to_string());
            SetupLoaded::SeasonEpisodes {
                season_number,
                result,
            }
        });
    }

    /// Apply finished configuration-screen requests. Called on every tick.
    ///
    /// An answer that arrives after the user left the step that asked for it
    /// is dropped.
    pub fn poll_setup(&mut self) -> Result<()> {
        while let Ok(loaded) = self.setup_rx.try_recv() {
            self.setup_pending = false;
            match loaded {
                SetupLoaded::SeriesResults { query, result } => {
                    self.apply_series_results(query, result)
                }
                SetupLoaded::SeriesDetails { series_id, result } => {
                    self.apply_series_details(series_id, result)
                }
                SetupLoaded::SeasonEpisodes {
                    season_number,
                    result,
                } => self.apply_season_episodes(season_number, result)?,
            }
        }
        Ok(())
    }

    fn apply_series_results(&mut self, query: String, result: Result<Vec<SearchCandidate>, String>) {
        if !self.show_config || self.config_input_mode != ConfigInputMode::SeriesQuery {
            debug!(query = %query, "series results arrived after leaving the step");
            return;
        }
        match result {
            Ok(results) if results.is_empty() => {
                self.set_status_message(format!("No series found for \"{query}\""));
            }
            Ok(mut results) => {
                sort_by_release_desc(&mut results);
                info!(query = %query, results = results.len(), "series search");
                self.series_results = results;
                self.series_choice = Some(0);
                self.seasons.clear();
                self.season_choice = None;
                self.advance_config_step();
            }
            Err(e) => {
                warn!(query = %query, error = %e, "series search failed");
                self.set_status_message(format!("Series search failed: {e}"));
            }
        }
    }

    fn apply_series_details(&mut self, series_id: u64, result: Result<SeriesDetails, String>) {
        if !self.show_config || self.config_input_mode != ConfigInputMode::SeriesChoice {
            debug!(series_id, "series details arrived after leaving the step");
            return;
        }
        match result {
            Ok(details) if details.seasons.is_empty() => {
                self.set_status_message(format!("{} has no seasons listed", details.name));
            }
            Ok(details) => {
                let wanted = self.detected_season().unwrap_or(1);
                self.season_choice = details
                    .seasons
                    .iter()
                    .position(|s| s.season_number == wanted)
                    .or(Some(0));
                self.seasons = details.seasons;
                self.advance_config_step();
            }
            Err(e) => {
                warn!(series_id, error = %e, "series details failed");
                self.set_status_message(format!("Could not load seasons: {e}"));
            }
        }
    }

    fn apply_season_episodes(
        &mut self,
        season_number: u32,
        result: Result<Vec<EpisodeCandidate>, String>,
    ) -> Result<()> {
        if !self.show_config || self.config_input_mode != ConfigInputMode::Confirm {
            debug!(season_number, "episode list arrived after leaving the step");
            return Ok(());
        }
        match result {
            Ok(episodes) if episodes.is_empty() => {
                self.set_status_message(format!("Season {season_number} has no episodes"));
            }
            Ok(episodes) => {
                self.season_episodes = episodes;
                self.enter_main_screen()?;
            }
            Err(e) => {
                warn!(season_number, error = %e, "season details failed");
                self.set_status_message(format!("Could not load episodes: {e}"));
            }
        }
        Ok(())
    }

    /// Season marker of the first source file that has one.
    fn detected_season(&self) -> Option<u32> {
        let folder = self.config.source_folder.as_ref()?;
        let files = scan_folder(folder).ok()?;
        files
            .iter()
            .find_map(|f| crate::normalizer::extract_episode_info(f.name()))
            .map(|marker| marker.season)
    }

    // Matching

    /// Scan the folders and start matching. Leaves the configuration screen.
    ///
    /// With a series and season chosen, the episode list is fetched first and
    /// the screen changes once it arrives.
    pub fn start(&mut self) -> Result<()> {
        if self.is_busy() {
            self.set_status_message("Search already running".to_string());
            return Ok(());
        }
        if self.ensure_provider().is_none() {
            return Ok(());
        }
        self.persist_config()?;
        self.season_episodes.clear();

        if self.media_type == MediaType::Series {
            if let (Some(series), Some(season)) =
                (self.selected_series().cloned(), self.selected_season().cloned())
            {
                self.load_episodes(series, season.season_number);
                return Ok(());
            }
        }

        self.enter_main_screen()
    }

    fn enter_main_screen(&mut self) -> Result<()> {
        self.load_rows()?;
        self.show_config = false;
        self.start_matching();
        Ok(())
    }

    /// Rescan both folders. Existing matches are discarded.
    fn load_rows(&mut self) -> Result<()> {
        let source = self
            .config
            .source_folder
            .clone()
            .context("No source folder configured")?;
        let files = scan_folder(&source)?;
        self.rows = files
            .into_iter()
            .map(|file: LocalFile| MatchRow::new(file, self.media_type))
            .collect();
        self.refresh_library();

        self.list_state
            .select(if self.rows.is_empty() { None } else { Some(0) });
        self.scroll_state = ScrollbarState::new(self.rows.len());
        Ok(())
    }

    fn refresh_library(&mut self) {
        self.library_files = match self.config.library_folder.as_deref() {
            Some(folder) => list_library_files(folder).unwrap_or_else(|e| {
                warn!(error = %e, "failed to list library folder");
                Vec::new()
            }),
            None => Vec::new(),
        };
    }

    /// Never runs next to another search: one lookup in flight at a time.
    fn start_matching(&mut self) {
        if self.is_matching() {
            warn!("search requested while one is running");
            return;
        }

        if self.rows.is_empty() {
            self.stats = ProcessingStats::default();
            self.set_status_message("No video files found in the source folder".to_string());
            return;
        }

        if self.media_type == MediaType::Series && !self.season_episodes.is_empty() {
            let season = self
                .selected_season()
                .map(|s| s.season_number)
                .unwrap_or(1);
            let summary = apply_season(&mut self.rows, season, &self.season_episodes);
            self.stats = ProcessingStats::new(self.rows.len());
            self.stats.processed = self.rows.len();
            self.stats.matched = summary.matched;
            self.set_status_message(format!(
                "{} matched, {} need manual selection",
                summary.matched,
                summary.unmatched + summary.season_mismatch
            ));
            return;
        }

        let Some(provider) = self.ensure_provider() else {
            return;
        };
        let jobs = plan_jobs(&self.rows);
        self.stats = ProcessingStats::new(jobs.len());
        self.matcher = Some(MatchHandle::spawn(provider, self.media_type, jobs));
    }

    /// Search every file again.
    pub fn restart_search(&mut self) {
        if self.is_matching() {
            self.set_status_message("Search already running".to_string());
            return;
        }
        self.season_episodes.clear();
        self.start_matching();
    }

    /// Drain pending matcher events into the table. Called on every tick.
    pub fn poll_matcher(&mut self) {
        let Some(handle) = self.matcher.as_mut() else {
            return;
        };

        let mut finished = false;
        while let Some(event) = handle.try_next() {
            self.stats.record(&event);
            if apply_event(&mut self.rows, event) {
                finished = true;
                break;
            }
        }

        if finished || (handle.is_finished() && self.stats.processed >= self.stats.total) {
            self.matcher = None;
            let stats = self.stats.clone();
            self.set_status_message(format!(
                "Search done: {} matched, {} without results, {} failed",
                stats.matched, stats.no_results, stats.failed
            ));
        }
    }

    // Artwork

    /// Start a download for the selected candidate's artwork if it is unknown.
    pub fn request_artwork(&mut self) {
        if !self.show_preview {
            return;
        }
        let Some(url) = self
            .selected_row()
            .and_then(|row| row.selected_candidate())
            .and_then(Candidate::artwork_url)
        else {
            return;
        };
        if self.artwork_states.contains_key(&url) {
            return;
        }
        if let Some(bytes) = self.artwork.get(&url) {
            self.artwork_states
                .insert(url, ArtworkState::Ready { bytes: bytes.len() });
            return;
        }
        let Some(provider) = self.provider.clone() else {
            return;
        };

        self.artwork_states.insert(url.clone(), ArtworkState::Loading);
        let cache = self.artwork.clone();
        let tx = self.artwork_tx.clone();
        tokio::spawn(async move {
            let result = cache
                .fetch(provider.as_ref(), &url)
                .await
                .map(|bytes| bytes.len())
                .map_err(|e| e.to_string());
            let _ = tx.send(ArtworkLoaded { url, result });
        });
    }

    pub fn poll_artwork(&mut self) {
        while let Ok(loaded) = self.artwork_rx.try_recv() {
            let state = match loaded.result {
                Ok(bytes) => ArtworkState::Ready { bytes },
                Err(e) => ArtworkState::Failed(e),
            };
            self.artwork_states.insert(loaded.url, state);
        }
    }

    pub fn artwork_state(&self, url: &str) -> Option<&ArtworkState> {
        self.artwork_states.get(url)
    }

    // Main screen

    pub fn next(&mut self) {
        if let Some(i) = step_index(self.list_state.selected(), self.rows.len(), true) {
            self.list_state.select(Some(i));
            self.scroll_state = self.scroll_state.position(i);
        }
    }

    pub fn previous(&mut self) {
        if let Some(i) = step_index(self.list_state.selected(), self.rows.len(), false) {
            self.list_state.select(Some(i));
            self.scroll_state = self.scroll_state.position(i);
        }
    }

    pub fn next_candidate(&mut self) {
        if let Some(row) = self.list_state.selected().and_then(|i| self.rows.get_mut(i)) {
            row.select_next();
        }
    }

    pub fn previous_candidate(&mut self) {
        if let Some(row) = self.list_state.selected().and_then(|i| self.rows.get_mut(i)) {
            row.select_previous();
        }
    }

    pub fn toggle_mark(&mut self) {
        if let Some(row) = self.list_state.selected().and_then(|i| self.rows.get_mut(i)) {
            row.marked = !row.marked;
        }
    }

    /// Mark every row, or clear all marks when everything is already marked.
    pub fn toggle_mark_all(&mut self) {
        let mark = !self.rows.iter().all(|r| r.marked);
        for row in &mut self.rows {
            row.marked = mark;
        }
    }

    /// Transfer the marked rows into the library folder.
    pub fn send_marked(&mut self) -> Result<()> {
        if self.is_matching() {
            self.set_status_message("Wait for the search to finish".to_string());
            return Ok(());
        }
        let requests: Vec<TransferRequest> = self
            .rows
            .iter()
            .filter(|r| r.marked)
            .map(|r| TransferRequest {
                source: r.file().path().to_path_buf(),
                destination_name: r.suggested_name(),
            })
            .collect();

        if requests.is_empty() {
            self.set_status_message("No files marked for transfer".to_string());
            return Ok(());
        }

        let library = self
            .config
            .library_folder
            .clone()
            .context("No library folder configured")?;
        let mode = TransferMode::from_remove_original(self.config.remove_original);
        let report = match transfer_batch(&requests, &library, mode) {
            Ok(report) => report,
            Err(e) => {
                self.set_status_message(e.to_string());
                return Ok(());
            }
        };

        for done in &report.transferred {
            match mode {
                TransferMode::Move => self.rows.retain(|r| r.file().path() != done.source),
                TransferMode::Copy => {
                    if let Some(row) = self.rows.iter_mut().find(|r| r.file().path() == done.source) {
                        row.marked = false;
                    }
                }
            }
        }
        self.clamp_selection();
        self.refresh_library();

        let mut lines = vec![report.summary()];
        lines.extend(report.errors.iter().map(|e| format!("  {e}")));
        self.set_status_message(report.summary());
        self.transfer_report = Some(lines);
        Ok(())
    }

    /// Rescan both folders and search again.
    pub fn refresh(&mut self) -> Result<()> {
        if self.is_matching() {
            self.set_status_message("Search already running".to_string());
            return Ok(());
        }
        self.load_rows()?;
        self.start_matching();
        Ok(())
    }

    fn clamp_selection(&mut self) {
        let selected = match self.list_state.selected() {
            _ if self.rows.is_empty() => None,
            Some(i) => Some(i.min(self.rows.len() - 1)),
            None => Some(0),
        };
        self.list_state.select(selected);
        self.scroll_state = ScrollbarState::new(self.rows.len()).position(selected.unwrap_or(0));
    }

    /// Searches run to completion, so this waits until the current one is done.
    pub fn back_to_config(&mut self) {
        if self.is_matching() {
            self.set_status_message("Wait for the search to finish".to_string());
            return;
        }
        self.show_config = true;
        self.config_input_mode = ConfigInputMode::MediaType;
    }

    // Settings popup

    pub fn toggle_settings(&mut self) {
        self.show_settings = !self.show_settings;
        self.settings_field = SettingsField::ApiKey;
    }

    pub fn handle_settings_key(&mut self, key: KeyCode) -> Result<()> {
        match key {
            KeyCode::Up => self.settings_field = self.settings_field.previous(),
            KeyCode::Down | KeyCode::Tab => self.settings_field = self.settings_field.next(),
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
                if self.settings_field != SettingsField::ApiKey =>
            {
                match self.settings_field {
                    SettingsField::Language => {
                        self.config.cycle_language();
                        self.provider = None;
                        self.artwork_states.clear();
                    }
                    SettingsField::RemoveOriginal => {
                        self.config.remove_original = !self.config.remove_original;
                    }
                    SettingsField::ApiKey => {}
                }
                self.persist_config()?;
            }
            KeyCode::Backspace if self.settings_field == SettingsField::ApiKey => {
                self.config.api_key.pop();
                self.provider = None;
            }
            KeyCode::Char(c) if self.settings_field == SettingsField::ApiKey => {
                self.config.api_key.push(c);
                self.provider = None;
            }
            KeyCode::Enter | KeyCode::Esc => {
                self.config.api_key = self.config.api_key.trim().to_string();
                self.persist_config()?;
                self.show_settings = false;
            }
            _ => {}
        }
        Ok(())
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn toggle_preview(&mut self) {
        self.show_preview = !self.show_preview;
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some(message);
        self.status_message_time = Some(Instant::now());
    }

    pub fn clear_status_message_if_expired(&mut self) {
        if let (Some(_), Some(time)) = (&self.status_message, self.status_message_time) {
            if time.elapsed() > Duration::from_secs(3) {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }
}

fn path_input(path: Option<&PathBuf>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}

fn edit_text(buffer: &mut String, c: char) {
    if c == '\x08' {
        buffer.pop();
    } else if !c.is_control() {
        buffer.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new(AppConfig::default(), None, MediaType::Movie)
    }

    #[test]
    fn test_config_steps_follow_media_type() {
        let mut app = app();
        app.handle_config_input('s');
        assert_eq!(app.media_type, MediaType::Series);
        assert_eq!(app.config_input_mode, ConfigInputMode::SourceFolder);

        app.advance_config_step();
        app.advance_config_step();
        assert_eq!(app.config_input_mode, ConfigInputMode::SeriesQuery);

        app.go_back_config_step();
        assert_eq!(app.config_input_mode, ConfigInputMode::LibraryFolder);
    }

    #[test]
    fn test_text_input_backspace() {
        let mut app = app();
        app.config_input_mode = ConfigInputMode::SourceFolder;
        for c in "/tmx".chars() {
            app.handle_config_input(c);
        }
        app.handle_config_input('\x08');
        app.handle_config_input('p');
        assert_eq!(app.source_input, "/tmp");
    }

    #[test]
    fn test_missing_key_opens_prompt() {
        let mut app = app();
        assert!(app.ensure_provider().is_none());
        assert_eq!(app.api_key_input.as_deref(), Some(""));

        app.handle_api_key_input('k');
        app.submit_api_key().unwrap();
        assert_eq!(app.config.api_key, "k");
        assert!(app.api_key_input.is_none());
    }

    #[test]
    fn test_status_message_expires() {
        let mut app = app();
        app.set_status_message("hello".to_string());
        app.clear_status_message_if_expired();
        assert!(app.status_message.is_some());

        app.status_message_time = Some(Instant::now() - Duration::from_secs(5));
        app.clear_status_message_if_expired();
        assert!(app.status_message.is_none());
    }
}
