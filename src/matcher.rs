//! Sequential matching of local files against the metadata provider.
//!
//! A single worker task drains a queue of pending files and emits one
//! [`MatchEvent`] per file. It never starts the next query before the previous
//! one has returned, so at most one request is in flight.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::models::{MatchRow, RowStatus};
use crate::provider::{
    sort_by_release_desc, EpisodeCandidate, MediaType, MetadataProvider, SearchCandidate,
};

/// A file waiting for its remote lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchJob {
    /// Row index in the match table.
    pub index: usize,
    pub file_name: String,
    pub query: String,
    pub year: Option<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchEvent {
    Searching {
        index: usize,
        query: String,
    },
    /// Empty query, no lookup was made.
    Skipped {
        index: usize,
    },
    /// Results already sorted newest first.
    Matched {
        index: usize,
        media_type: MediaType,
        candidates: Vec<SearchCandidate>,
    },
    Failed {
        index: usize,
        error: String,
    },
    Finished(MatchSummary),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchSummary {
    pub searched: usize,
    pub skipped: usize,
    pub failed: usize,
    pub without_results: usize,
}

/// One job per row, in table order.
pub fn plan_jobs(rows: &[MatchRow]) -> Vec<MatchJob> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| MatchJob {
            index,
            file_name: row.file().name().to_string(),
            query: row.normalized().query.clone(),
            year: row.normalized().year,
        })
        .collect()
}

pub struct MatchWorker {
    provider: Arc<dyn MetadataProvider>,
    media_type: MediaType,
    pending: VecDeque<MatchJob>,
    events: mpsc::UnboundedSender<MatchEvent>,
}

impl MatchWorker {
    pub fn new(
        provider: Arc<dyn MetadataProvider>,
        media_type: MediaType,
        jobs: Vec<MatchJob>,
        events: mpsc::UnboundedSender<MatchEvent>,
    ) -> Self {
        Self {
            provider,
            media_type,
            pending: jobs.into(),
            events,
        }
    }

    /// Run the queue to completion. Stops early only if the receiver is gone.
    pub async fn run(mut self) {
        info!(
            provider = self.provider.name(),
            files = self.pending.len(),
            mode = ?self.media_type,
            "match worker started"
        );
        let mut summary = MatchSummary::default();

        while let Some(job) = self.pending.pop_front() {
            let sent = match self.process(job, &mut summary).await {
                Some(event) => self.events.send(event).is_ok(),
                None => false,
            };
            if !sent {
                debug!("match event receiver dropped");
                return;
            }
        }

        info!(?summary, "match worker finished");
        let _ = self.events.send(MatchEvent::Finished(summary));
    }

    /// `None` when the receiver went away before the lookup started.
    async fn process(&self, job: MatchJob, summary: &mut MatchSummary) -> Option<MatchEvent> {
        if job.query.is_empty() {
            debug!(file = %job.file_name, "empty query, skipping lookup");
            summary.skipped += 1;
            return Some(MatchEvent::Skipped { index: job.index });
        }

        let searching = MatchEvent::Searching {
            index: job.index,
            query: job.query.clone(),
        };
        if self.events.send(searching).is_err() {
            return None;
        }

        summary.searched += 1;
        let result = match self.media_type {
            MediaType::Movie => self.provider.search_movie(&job.query, job.year).await,
            MediaType::Series => self.provider.search_series(&job.query, job.year).await,
        };

        match result {
            Ok(mut candidates) => {
                sort_by_release_desc(&mut candidates);
                if candidates.is_empty() {
                    summary.without_results += 1;
                }
                debug!(file = %job.file_name, query = %job.query, results = candidates.len(), "lookup done");
                Some(MatchEvent::Matched {
                    index: job.index,
                    media_type: self.media_type,
                    candidates,
                })
            }
            Err(e) => {
                warn!(file = %job.file_name, query = %job.query, error = %e, "lookup failed");
                summary.failed += 1;
                Some(MatchEvent::Failed {
                    index: job.index,
                    error: e.to_string(),
                })
            }
        }
    }
}

/// Receiving side of a running match worker.
pub struct MatchHandle {
    events: mpsc::UnboundedReceiver<MatchEvent>,
    task: JoinHandle<()>,
}

impl MatchHandle {
    pub fn spawn(
        provider: Arc<dyn MetadataProvider>,
        media_type: MediaType,
        jobs: Vec<MatchJob>,
    ) -> Self {
        let (sender, events) = mpsc::unbounded_channel();
        let worker = MatchWorker::new(provider, media_type, jobs, sender);
        let task = tokio::spawn(worker.run());
        Self { events, task }
    }

    /// Next event without waiting, for the UI tick.
    pub fn try_next(&mut self) -> Option<MatchEvent> {
        self.events.try_recv().ok()
    }

    /// Wait for the next event. `None` once the worker is done.
    pub async fn next(&mut self) -> Option<MatchEvent> {
        self.events.recv().await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Fold a worker event into the table. Returns true once the run is finished.
pub fn apply_event(rows: &mut [MatchRow], event: MatchEvent) -> bool {
    match event {
        MatchEvent::Searching { index, .. } => {
            if let Some(row) = rows.get_mut(index) {
                row.status = RowStatus::Searching;
            }
        }
        MatchEvent::Skipped { index } => {
            if let Some(row) = rows.get_mut(index) {
                row.clear_candidates(RowStatus::Skipped);
            }
        }
        MatchEvent::Matched {
            index,
            media_type,
            candidates,
        } => {
            if let Some(row) = rows.get_mut(index) {
                row.set_search_results(media_type, candidates);
            }
        }
        MatchEvent::Failed { index, error } => {
            if let Some(row) = rows.get_mut(index) {
                row.mark_failed(error);
            }
        }
        MatchEvent::Finished(_) => return true,
    }
    false
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeasonSummary {
    pub matched: usize,
    pub season_mismatch: usize,
    pub unmatched: usize,
}

/// Apply one fetched season listing to every row without further lookups.
///
/// A file without a season marker is assumed to belong to `selected_season`.
/// Files from another season or with an episode number missing from the list
/// keep the listing but get no selection.
pub fn apply_season(
    rows: &mut [MatchRow],
    selected_season: u32,
    episodes: &[EpisodeCandidate],
) -> SeasonSummary {
    let mut summary = SeasonSummary::default();
    if episodes.is_empty() {
        return summary;
    }

    for row in rows.iter_mut() {
        let marker = row.normalized().episode;
        let season = marker.map(|m| m.season).unwrap_or(selected_season);

        if season != selected_season {
            debug!(file = %row.file().name(), season, selected_season, "season mismatch");
            row.set_episodes(episodes.to_vec(), None);
            summary.season_mismatch += 1;
            continue;
        }

        let position = marker.and_then(|m| {
            episodes
                .iter()
                .position(|ep| ep.episode_number == m.episode)
        });

        row.set_episodes(episodes.to_vec(), position);
        if position.is_some() {
            summary.matched += 1;
        } else {
            summary.unmatched += 1;
        }
    }

    info!(?summary, season = selected_season, "season applied");
    summary
}
