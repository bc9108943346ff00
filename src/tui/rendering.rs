use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Scrollbar,
        ScrollbarOrientation, Wrap,
    },
    Frame,
};

use crate::models::{Candidate, MatchRow, RowStatus};
use crate::provider::MediaType;
use crate::transfer::TransferMode;

use super::app::App;
use super::models::{status_tag, ArtworkState, ConfigInputMode, SettingsField};
use super::utils::centered_rect;

const TITLE: &str = "Kodi Rename";

pub fn ui(f: &mut Frame, app: &App) {
    let size = f.area();

    if app.show_config {
        render_config_screen(f, size, app);
    } else {
        render_main_screen(f, size, app);
    }

    if app.show_help {
        render_help_popup(f, app);
    }
    if app.show_settings {
        render_settings_popup(f, app);
    }
    if let Some(lines) = &app.transfer_report {
        render_report_popup(f, lines);
    }
    if let Some(input) = &app.api_key_input {
        render_api_key_prompt(f, input);
    }
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    }
}

fn border_style(focused: bool, done: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else if done {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Gray)
    }
}

fn text_field<'a>(title: &'a str, value: &'a str, placeholder: &'a str, focused: bool) -> Paragraph<'a> {
    let display = if value.is_empty() { placeholder } else { value };
    Paragraph::new(display).style(focus_style(focused)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border_style(focused, !value.is_empty())),
    )
}

pub fn render_config_screen(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(5),
        ])
        .split(area);

    let header_text = if app.is_loading() {
        format!("{TITLE} - Configuration (waiting for TMDB...)")
    } else {
        format!("{TITLE} - Configuration")
    };
    let header = Paragraph::new(header_text)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::White))
                .border_style(Style::default().fg(Color::Cyan)),
        );
    f.render_widget(header, chunks[0]);

    let is_series = app.media_type == MediaType::Series;
    let mode = app.config_input_mode;

    let mut form_constraints = vec![
        Constraint::Length(3), // media type
        Constraint::Length(3), // source
        Constraint::Length(3), // library
    ];
    if is_series {
        form_constraints.push(Constraint::Length(3)); // series query
        form_constraints.push(Constraint::Length(7)); // series results
        form_constraints.push(Constraint::Length(7)); // seasons
    }
    form_constraints.push(Constraint::Length(3)); // confirm
    form_constraints.push(Constraint::Min(1));

    let form_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(form_constraints)
        .split(chunks[1]);
    let mut current_chunk_index = 0;

    let media_text = if mode == ConfigInputMode::MediaType {
        "Press M for Movies, S for Series"
    } else {
        app.media_type.label()
    };
    let media_input = Paragraph::new(media_text)
        .style(focus_style(mode == ConfigInputMode::MediaType))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Media Type")
                .border_style(border_style(mode == ConfigInputMode::MediaType, true)),
        );
    f.render_widget(media_input, form_chunks[current_chunk_index]);
    current_chunk_index += 1;

    f.render_widget(
        text_field(
            "Source Folder",
            &app.source_input,
            "[Folder with downloaded videos]",
            mode == ConfigInputMode::SourceFolder,
        ),
        form_chunks[current_chunk_index],
    );
    current_chunk_index += 1;

    f.render_widget(
        text_field(
            "Library Folder",
            &app.library_input,
            "[Kodi library folder]",
            mode == ConfigInputMode::LibraryFolder,
        ),
        form_chunks[current_chunk_index],
    );
    current_chunk_index += 1;

    if is_series {
        f.render_widget(
            text_field(
                "Series Search (leave empty to search each file)",
                &app.series_query_input,
                "[Series name]",
                mode == ConfigInputMode::SeriesQuery,
            ),
            form_chunks[current_chunk_index],
        );
        current_chunk_index += 1;

        let series: Vec<ListItem> = app
            .series_results
            .iter()
            .map(|s| ListItem::new(s.label()))
            .collect();
        render_choice_list(
            f,
            form_chunks[current_chunk_index],
            "Series",
            series,
            app.series_choice,
            mode == ConfigInputMode::SeriesChoice,
        );
        current_chunk_index += 1;

        let seasons: Vec<ListItem> = app
            .seasons
            .iter()
            .map(|s| {
                let count = s
                    .episode_count
                    .map(|c| format!(" ({c} episodes)"))
                    .unwrap_or_default();
                ListItem::new(format!("{}{count}", s.name))
            })
            .collect();
        render_choice_list(
            f,
            form_chunks[current_chunk_index],
            "Season",
            seasons,
            app.season_choice,
            mode == ConfigInputMode::SeasonChoice,
        );
        current_chunk_index += 1;
    }

    if mode == ConfigInputMode::Confirm {
        let confirm_text = match (app.selected_series(), app.selected_season()) {
            (Some(series), Some(season)) if is_series => format!(
                "Press ENTER to apply {} - {} to the source folder",
                series.title, season.name
            ),
            _ => format!("Press ENTER to scan and search {}", app.media_type.label()),
        };
        let confirm = Paragraph::new(confirm_text)
            .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Ready")
                    .border_style(Style::default().fg(Color::Green)),
            );
        f.render_widget(confirm, form_chunks[current_chunk_index]);
    }

    let instructions = match mode {
        ConfigInputMode::MediaType => "Choose what the source folder contains: M for Movies, S for Series",
        ConfigInputMode::SourceFolder => "Enter the folder containing your video files (← Back)",
        ConfigInputMode::LibraryFolder => "Enter the Kodi library folder files are sent to (← Back)",
        ConfigInputMode::SeriesQuery => "Type a series name and press Enter, or leave empty (← Back)",
        ConfigInputMode::SeriesChoice => "Pick the series with ↑/↓ and press Enter (← Back)",
        ConfigInputMode::SeasonChoice => "Pick the season with ↑/↓ and press Enter (← Back)",
        ConfigInputMode::Confirm => "Review your settings and press Enter to start (← Back)",
    };

    let status = app
        .status_message
        .clone()
        .unwrap_or_else(|| "Navigation: ← Back | Enter: Next/Confirm | F2: Settings | Esc: Quit".to_string());
    let help_lines = vec![Line::from(instructions), Line::from(""), Line::from(status)];

    let help_text = Paragraph::new(help_lines)
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Instructions"));
    f.render_widget(help_text, chunks[2]);
}

fn render_choice_list(
    f: &mut Frame,
    area: Rect,
    title: &str,
    items: Vec<ListItem>,
    selected: Option<usize>,
    focused: bool,
) {
    let done = selected.is_some();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.to_string())
                .border_style(border_style(focused, done)),
        )
        .highlight_style(
            Style::default()
                .bg(if focused { Color::Blue } else { Color::DarkGray })
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(selected);
    f.render_stateful_widget(list, area, &mut state);
}

pub fn render_main_screen(f: &mut Frame, area: Rect, app: &App) {
    let chunks = if app.show_preview {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
            .split(area)
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100)].as_ref())
            .split(area)
    };

    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    render_header(f, left_chunks[0], app);
    render_file_list(f, left_chunks[1], app);
    render_status_bar(f, left_chunks[2], app);

    if app.show_preview && chunks.len() > 1 {
        render_preview_panel(f, chunks[1], app);
    }
}

pub fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let title = if app.is_matching() {
        format!("{TITLE} - Searching {}...", app.media_type.label())
    } else {
        format!("{TITLE} - {}", app.media_type.label())
    };

    let header = Paragraph::new(title)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::White))
                .border_style(Style::default().fg(Color::Cyan)),
        );
    f.render_widget(header, area);
}

fn status_color(status: RowStatus) -> Color {
    match status {
        RowStatus::Waiting => Color::Yellow,
        RowStatus::Searching => Color::Blue,
        RowStatus::Skipped => Color::Gray,
        RowStatus::Matched => Color::Green,
        RowStatus::NoResults | RowStatus::NeedsManual => Color::Magenta,
        RowStatus::Failed => Color::Red,
    }
}

fn row_line(row: &MatchRow) -> Line<'_> {
    let mark = if row.marked { "[x] " } else { "[ ] " };
    let year = row
        .detected_year()
        .map(|y| format!(" ({y})"))
        .unwrap_or_default();
    let choice = match row.selected_candidate() {
        Some(candidate) => format!(
            "  -> {} [{}/{}]",
            candidate.label(),
            row.selected().map(|i| i + 1).unwrap_or(0),
            row.candidates().len()
        ),
        None if !row.candidates().is_empty() => {
            format!("  -> (choose 1 of {})", row.candidates().len())
        }
        None => String::new(),
    };

    Line::from(vec![
        Span::styled(mark, Style::default().fg(Color::Cyan)),
        Span::styled(
            format!("{} ", status_tag(row.status)),
            Style::default().fg(status_color(row.status)),
        ),
        Span::styled(row.file().name().to_string(), Style::default().fg(Color::White)),
        Span::styled(year, Style::default().fg(Color::Gray)),
        Span::styled(choice, Style::default().fg(Color::Green)),
    ])
}

pub fn render_file_list(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app.rows.iter().map(|row| ListItem::new(row_line(row))).collect();

    let title = format!(
        "Source Files ({} marked of {})",
        app.marked_count(),
        app.rows.len()
    );
    let files_list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::White))
                .border_style(Style::default().fg(Color::Blue)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    f.render_stateful_widget(files_list, area, &mut app.list_state.clone());

    if app.rows.len() > (area.height as usize).saturating_sub(2) {
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        f.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut app.scroll_state.clone(),
        );
    }
}

pub fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)].as_ref())
        .split(area);

    let progress_label = if let Some(status_msg) = &app.status_message {
        status_msg.clone()
    } else if app.is_matching() {
        format!("Searching... {}/{}", app.stats.processed, app.stats.total)
    } else {
        format!(
            "{} files, {} matched | {}",
            app.rows.len(),
            app.rows.iter().filter(|r| r.selected().is_some()).count(),
            match TransferMode::from_remove_original(app.config.remove_original) {
                TransferMode::Copy => "copy to library",
                TransferMode::Move => "move to library",
            }
        )
    };

    let progress_style = if app.status_message.is_some() {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Green)
    };

    let progress = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(progress_style)
        .percent((app.stats.progress() * 100.0) as u16)
        .label(progress_label);
    f.render_widget(progress, chunks[0]);

    let controls = Paragraph::new("Space mark, Enter send, h help, q quit")
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Controls"));
    f.render_widget(controls, chunks[1]);
}

fn candidate_lines<'a>(candidate: &'a Candidate, app: &App) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    let (rating, votes, overview) = match candidate {
        Candidate::Title(c) => {
            lines.push(Line::from(Span::styled(
                c.title.clone(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            let year = c.year().map(|y| y.to_string()).unwrap_or_else(|| "-".to_string());
            lines.push(Line::from(format!("Year: {year}")));
            (c.vote_average, c.vote_count, c.overview.clone())
        }
        Candidate::Episode(e) => {
            lines.push(Line::from(Span::styled(
                format!("{} - S{:02}E{:02}", e.series_title, e.season_number, e.episode_number),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            let aired = e.air_date.clone().unwrap_or_else(|| "-".to_string());
            lines.push(Line::from(format!("Aired: {aired}")));
            let overview = match (e.name.as_deref(), e.overview.as_deref()) {
                (Some(name), Some(text)) => Some(format!("{name}: {text}")),
                (Some(name), None) => Some(name.to_string()),
                (None, text) => text.map(str::to_string),
            };
            (e.vote_average, e.vote_count, overview)
        }
    };

    let rating = rating.map(|r| format!("{r:.1}")).unwrap_or_else(|| "-".to_string());
    let votes = votes.map(|v| v.to_string()).unwrap_or_else(|| "0".to_string());
    lines.push(Line::from(format!("Rating: {rating} ({votes} votes)")));

    let artwork = match candidate.artwork_url() {
        None => "none".to_string(),
        Some(url) => match app.artwork_state(&url) {
            Some(ArtworkState::Ready { bytes }) => format!("{:.1} KB (cached)", *bytes as f64 / 1024.0),
            Some(ArtworkState::Failed(e)) => format!("failed: {e}"),
            Some(ArtworkState::Loading) | None => "loading...".to_string(),
        },
    };
    lines.push(Line::from(format!("Artwork: {artwork}")));
    lines.push(Line::from(""));
    lines.push(Line::from(overview.unwrap_or_else(|| "No overview available".to_string())));
    lines
}

pub fn render_preview_panel(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
        .split(area);

    let mut lines = Vec::new();
    if let Some(row) = app.selected_row() {
        lines.push(Line::from("Original:"));
        lines.push(Line::from(Span::styled(
            row.file().name().to_string(),
            Style::default().fg(Color::Red),
        )));
        lines.push(Line::from("New:"));
        let new_style = if row.selected().is_some() {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Yellow)
        };
        lines.push(Line::from(Span::styled(row.destination_name(), new_style)));
        lines.push(Line::from(""));

        match (row.selected_candidate(), row.failure()) {
            (Some(candidate), _) => lines.extend(candidate_lines(candidate, app)),
            (None, Some(error)) => lines.push(Line::from(Span::styled(
                format!("Lookup failed: {error}"),
                Style::default().fg(Color::Red),
            ))),
            (None, None) => lines.push(Line::from(format!(
                "No match selected (query: \"{}\")",
                row.normalized().query
            ))),
        }
    }

    let preview = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .title("Preview")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(preview, chunks[0]);

    let library: Vec<ListItem> = app
        .library_files
        .iter()
        .map(|name| ListItem::new(name.as_str()))
        .collect();
    let library_list = List::new(library).block(
        Block::default()
            .title(format!("Library ({})", app.library_files.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    );
    f.render_widget(library_list, chunks[1]);
}

pub fn render_help_popup(f: &mut Frame, _app: &App) {
    let popup_area = centered_rect(60, 60, f.area());

    let help_text = vec![
        Line::from(vec![Span::styled(
            format!("{TITLE} - Help"),
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  Up/k    - Previous file"),
        Line::from("  Down/j  - Next file"),
        Line::from("  Left    - Previous candidate"),
        Line::from("  Right/l - Next candidate"),
        Line::from(""),
        Line::from("Actions:"),
        Line::from("  Space   - Mark file for sending"),
        Line::from("  a       - Mark / unmark all"),
        Line::from("  Enter   - Send marked files to the library"),
        Line::from("  s       - Search all files again"),
        Line::from("  r       - Rescan folders"),
        Line::from("  c       - Back to configuration"),
        Line::from("  o       - Settings"),
        Line::from("  p       - Toggle preview panel"),
        Line::from("  h/F1    - Toggle this help"),
        Line::from("  q/Esc   - Quit application"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press Esc or h to close",
            Style::default().fg(Color::Gray),
        )]),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(Clear, popup_area);
    f.render_widget(paragraph, popup_area);
}

fn render_settings_popup(f: &mut Frame, app: &App) {
    let popup_area = centered_rect(50, 40, f.area());
    let field = |which: SettingsField, label: &str, value: String| {
        let focused = app.settings_field == which;
        Line::from(vec![
            Span::styled(if focused { "> " } else { "  " }, Style::default().fg(Color::Yellow)),
            Span::raw(format!("{label}: ")),
            Span::styled(value, focus_style(focused)),
        ])
    };

    let masked = if app.config.api_key.is_empty() {
        "[not set]".to_string()
    } else {
        "*".repeat(app.config.api_key.chars().count().min(32))
    };
    let lines = vec![
        field(SettingsField::ApiKey, "TMDB API key", masked),
        field(SettingsField::Language, "Language", app.config.language.clone()),
        field(
            SettingsField::RemoveOriginal,
            "Remove original after sending",
            if app.config.remove_original { "yes" } else { "no" }.to_string(),
        ),
        Line::from(""),
        Line::from(Span::styled(
            "↑/↓ select, ←/→ change, type to edit the key, Enter/Esc close",
            Style::default().fg(Color::Gray),
        )),
    ];

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title("Settings")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    f.render_widget(Clear, popup_area);
    f.render_widget(paragraph, popup_area);
}

fn render_report_popup(f: &mut Frame, lines: &[String]) {
    let popup_area = centered_rect(70, 50, f.area());
    let mut text: Vec<Line> = lines.iter().map(|l| Line::from(l.as_str())).collect();
    text.push(Line::from(""));
    text.push(Line::from(Span::styled(
        "Press any key to close",
        Style::default().fg(Color::Gray),
    )));

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .title("Transfer")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(Clear, popup_area);
    f.render_widget(paragraph, popup_area);
}

fn render_api_key_prompt(f: &mut Frame, input: &str) {
    let popup_area = centered_rect(50, 20, f.area());
    let lines = vec![
        Line::from("Enter your TMDB API key:"),
        Line::from(Span::styled(
            input.to_string(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Enter to save, Esc to cancel",
            Style::default().fg(Color::Gray),
        )),
    ];
    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title("API Key Required")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    );
    f.render_widget(Clear, popup_area);
    f.render_widget(paragraph, popup_area);
}
