use crate::matcher::MatchEvent;
use crate::models::RowStatus;
use crate::provider::{EpisodeCandidate, SearchCandidate, SeriesDetails};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigInputMode {
    MediaType,
    SourceFolder,
    LibraryFolder,
    SeriesQuery,
    SeriesChoice,
    SeasonChoice,
    Confirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    ApiKey,
    Language,
    RemoveOriginal,
}

impl SettingsField {
    pub fn next(self) -> Self {
        match self {
            SettingsField::ApiKey => SettingsField::Language,
            SettingsField::Language => SettingsField::RemoveOriginal,
            SettingsField::RemoveOriginal => SettingsField::ApiKey,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            SettingsField::ApiKey => SettingsField::RemoveOriginal,
            SettingsField::Language => SettingsField::ApiKey,
            SettingsField::RemoveOriginal => SettingsField::Language,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtworkState {
    Loading,
    Ready { bytes: usize },
    Failed(String),
}

/// Result of a background artwork download.
#[derive(Debug)]
pub struct ArtworkLoaded {
    pub url: String,
    pub result: Result<usize, String>,
}

/// Result of a provider request made from the configuration screen.
#[derive(Debug)]
pub enum SetupLoaded {
    SeriesResults {
        query: String,
        result: Result<Vec<SearchCandidate>, String>,
    },
    SeriesDetails {
        series_id: u64,
        result: Result<SeriesDetails, String>,
    },
    SeasonEpisodes {
        season_number: u32,
        result: Result<Vec<EpisodeCandidate>, String>,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total: usize,
    pub processed: usize,
    pub matched: usize,
    pub no_results: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ProcessingStats {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record(&mut self, event: &MatchEvent) {
        match event {
            MatchEvent::Searching { .. } | MatchEvent::Finished(_) => return,
            MatchEvent::Skipped { .. } => self.skipped += 1,
            MatchEvent::Matched { candidates, .. } if candidates.is_empty() => {
                self.no_results += 1
            }
            MatchEvent::Matched { .. } => self.matched += 1,
            MatchEvent::Failed { .. } => self.failed += 1,
        }
        self.processed += 1;
    }

    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.processed as f64 / self.total as f64).min(1.0)
    }
}

pub fn status_tag(status: RowStatus) -> &'static str {
    match status {
        RowStatus::Waiting => "[WAITING]",
        RowStatus::Searching => "[SEARCHING]",
        RowStatus::Skipped => "[SKIPPED]",
        RowStatus::Matched => "[MATCHED]",
        RowStatus::NoResults => "[NO MATCH]",
        RowStatus::Failed => "[ERROR]",
        RowStatus::NeedsManual => "[MANUAL]",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_progress() {
        let mut stats = ProcessingStats::new(2);
        stats.record(&MatchEvent::Searching {
            index: 0,
            query: "x".to_string(),
        });
        assert_eq!(stats.processed, 0);

        stats.record(&MatchEvent::Skipped { index: 0 });
        assert_eq!(stats.progress(), 0.5);
        stats.record(&MatchEvent::Failed {
            index: 1,
            error: "boom".to_string(),
        });
        assert_eq!(stats.progress(), 1.0);
        assert_eq!(stats.failed, 1);
    }
}
