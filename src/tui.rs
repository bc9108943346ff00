//! Terminal interface: configuration screen, match table and popups.

mod app;
mod events;
mod models;
mod rendering;
mod utils;

pub use app::App;
pub use events::run_tui;
pub use models::ConfigInputMode;
