use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use kodi_rename::logging::{init_file_logging, init_stderr_logging};
use kodi_rename::matcher::{apply_event, apply_season, plan_jobs, MatchEvent, MatchHandle};
use kodi_rename::models::MatchRow;
use kodi_rename::provider::{MediaType, MetadataProvider};
use kodi_rename::scanner::scan_folder;
use kodi_rename::settings::{default_log_path, AppConfig, SettingsStore};
use kodi_rename::tmdb::TmdbClient;
use kodi_rename::transfer::{transfer_batch, TransferMode, TransferRequest};
use kodi_rename::tui::{run_tui, App};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Movie,
    Series,
}

impl From<Mode> for MediaType {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Movie => MediaType::Movie,
            Mode::Series => MediaType::Series,
        }
    }
}

/// Match downloaded videos against TMDB and send them to a Kodi library.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Folder containing the downloaded videos
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Kodi library folder files are sent to
    #[arg(short, long)]
    library: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = Mode::Movie)]
    mode: Mode,

    /// Metadata language, e.g. pt-BR
    #[arg(long)]
    language: Option<String>,

    /// TMDB API key (overrides the settings file)
    #[arg(long)]
    api_key: Option<String>,

    /// Remove the original after sending
    #[arg(long = "move")]
    move_files: bool,

    /// Settings file to use instead of the default location
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Run without the terminal UI and print the suggestions
    #[arg(long)]
    no_tui: bool,

    /// With --no-tui, send every matched file to the library
    #[arg(long)]
    send: bool,

    /// With --no-tui in series mode, apply this TMDB series instead of searching
    #[arg(long)]
    series_id: Option<u64>,

    #[arg(long, default_value_t = 1)]
    season: u32,
}

fn load_config(args: &Args, store: Option<&SettingsStore>) -> Result<AppConfig> {
    let mut config = match store {
        Some(store) => AppConfig::from_store(store)
            .with_context(|| format!("Failed to load settings from {}", store.path().display()))?,
        None => AppConfig::default(),
    };

    if let Some(source) = &args.source {
        config.source_folder = Some(source.clone());
    }
    if let Some(library) = &args.library {
        config.library_folder = Some(library.clone());
    }
    if let Some(language) = &args.language {
        config.language = language.clone();
    }
    if let Some(api_key) = &args.api_key {
        config.api_key = api_key.trim().to_string();
    }
    if args.move_files {
        config.remove_original = true;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let store = match &args.settings {
        Some(path) => Some(SettingsStore::new(path)),
        None => SettingsStore::open_default().ok(),
    };
    let config = load_config(&args, store.as_ref())?;
    let media_type = MediaType::from(args.mode);

    if args.no_tui {
        init_stderr_logging()?;
        return run_headless(config, media_type, &args).await;
    }

    match default_log_path() {
        Ok(path) => init_file_logging(&path)?,
        Err(e) => eprintln!("Logging disabled: {e}"),
    }
    info!(mode = ?media_type, "starting terminal UI");

    let app = App::new(config, store, media_type);
    run_tui(app).await
}

async fn run_headless(config: AppConfig, media_type: MediaType, args: &Args) -> Result<()> {
    let client = TmdbClient::new(&config.api_key, &config.language)
        .context("Pass --api-key or set TMDB_API_KEY in the settings file")?;
    let provider: Arc<dyn MetadataProvider> = Arc::new(client);

    let source = config
        .source_folder
        .clone()
        .context("No source folder: pass --source")?;
    let files = scan_folder(&source)?;

    println!("Kodi Rename");
    println!("===========");
    println!("Processing {} file(s) from {}...\n", files.len(), source.display());

    let mut rows: Vec<MatchRow> = files
        .into_iter()
        .map(|file| MatchRow::new(file, media_type))
        .collect();

    match (media_type, args.series_id) {
        (MediaType::Series, Some(series_id)) => {
            let details = provider
                .get_series_details(series_id)
                .await
                .with_context(|| format!("Failed to load series {series_id}"))?;
            let episodes = provider
                .get_season_details(series_id, &details.name, args.season)
                .await
                .with_context(|| format!("Failed to load season {}", args.season))?;
            let summary = apply_season(&mut rows, args.season, &episodes);
            println!(
                "{} season {}: {} matched, {} other season, {} unmatched\n",
                details.name, args.season, summary.matched, summary.season_mismatch, summary.unmatched
            );
        }
        _ => {
            let total = rows.len();
            let mut handle = MatchHandle::spawn(Arc::clone(&provider), media_type, plan_jobs(&rows));
            while let Some(event) = handle.next().await {
                if let MatchEvent::Searching { index, query } = &event {
                    println!("--- Searching {} of {}: \"{}\" ---", index + 1, total, query);
                }
                if apply_event(&mut rows, event) {
                    break;
                }
            }
            println!();
        }
    }

    for row in &rows {
        match (row.suggested_name(), row.failure()) {
            (Some(name), _) => println!("✓ {} -> {}", row.file().name(), name),
            (None, Some(error)) => println!("✗ {} (lookup failed: {})", row.file().name(), error),
            (None, None) => println!("✗ {} (no match, query \"{}\")", row.file().name(), row.normalized().query),
        }
    }

    if !args.send {
        return Ok(());
    }

    let library = config
        .library_folder
        .clone()
        .context("No library folder: pass --library")?;
    let requests: Vec<TransferRequest> = rows
        .iter()
        .filter(|row| row.selected().is_some())
        .map(|row| TransferRequest {
            source: row.file().path().to_path_buf(),
            destination_name: row.suggested_name(),
        })
        .collect();

    let mode = TransferMode::from_remove_original(config.remove_original);
    let report = transfer_batch(&requests, &library, mode)?;

    println!("\n===========");
    println!("Summary: {}", report.summary());
    for error in &report.errors {
        warn!(error = %error, "transfer error");
        println!("✗ {error}");
    }
    Ok(())
}
