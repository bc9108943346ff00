pub mod artwork;
pub mod formatter;
pub mod logging;
pub mod matcher;
pub mod models;
pub mod normalizer;
pub mod provider;
pub mod scanner;
pub mod settings;
pub mod tmdb;
pub mod transfer;
pub mod tui;
