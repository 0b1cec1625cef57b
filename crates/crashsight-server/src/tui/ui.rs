use crate::state::AppState;
use crate::tui::app::{Outcome, Overlay, Screen, TuiApp};
use crate::tui::keys::key_to_action;
use crate::tui::snapshot::{DetailSnapshot, UiSnapshot};
use crate::tui::widgets;
use anyhow::Context;
use chrono::Local;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;
use std::io;
use std::time::{Duration, Instant};
use tokio::time::interval;

pub async fn run_tui(mut app: TuiApp, state: AppState) -> anyhow::Result<()> {
    if !atty::is(atty::Stream::Stdout) {
        return Err(anyhow::anyhow!("TUI requires an interactive terminal"));
    }

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend).context("Failed to create terminal")?;

    let result = event_loop(&mut app, &state, &mut terminal).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    result
}

async fn event_loop(
    app: &mut TuiApp,
    state: &AppState,
    terminal: &mut ratatui::Terminal<CrosstermBackend<io::Stdout>>,
) -> anyhow::Result<()> {
    let mut redraw = interval(Duration::from_millis(150));

    loop {
        let now = Local::now();
        let snapshot = {
            let dashboard = state.dashboard.read().await;
            UiSnapshot::capture(app, &dashboard, &now, state.uptime_seconds())
        };

        terminal.draw(|f| render_ui(f, app, &snapshot))?;

        app.expire(Instant::now());

        if crossterm::event::poll(Duration::from_millis(33))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = key_to_action(key.code, app.input_mode()) {
                        let outcome = {
                            let mut dashboard = state.dashboard.write().await;
                            app.handle_action(action, &mut dashboard, now, Instant::now())
                        };
                        match outcome {
                            Outcome::Quit => break,
                            Outcome::Export(id) => handle_export(app, state, &id).await,
                            Outcome::Continue => {}
                        }
                    }
                }
            }
        }

        redraw.tick().await;
    }

    Ok(())
}

async fn handle_export(app: &mut TuiApp, state: &AppState, id: &str) {
    match state.export_issue(id).await {
        Ok(Some(path)) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            app.notify(format!("Exported: {}", name), true);
        }
        Ok(None) => app.notify(format!("Issue {} not found", id), false),
        Err(e) => {
            tracing::error!("Export failed: {:#}", e);
            let message = format!("{}", e);
            let short = if message.chars().count() > 40 {
                format!("{}...", message.chars().take(40).collect::<String>())
            } else {
                message
            };
            app.notify(format!("Export failed: {}", short), false);
        }
    }
}

fn render_ui(f: &mut Frame, app: &TuiApp, snapshot: &UiSnapshot) {
    let size = f.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main
            Constraint::Length(3), // Footer
        ])
        .split(size);

    render_header(f, chunks[0], app, snapshot);

    match (&app.screen, &snapshot.detail) {
        (Screen::Detail, Some(detail)) => render_detail_screen(f, chunks[1], app, detail),
        _ => widgets::render_issue_table(f, chunks[1], &snapshot.rows, app.selected_row),
    }

    render_footer(f, chunks[2], app);

    match &app.overlay {
        Overlay::None => {}
        Overlay::Help => {
            let area = centered_rect(60, 70, size);
            f.render_widget(Clear, area);
            widgets::render_help_panel(f, area);
        }
        Overlay::Versions(picker) => {
            let area = centered_rect(70, 60, size);
            f.render_widget(Clear, area);
            widgets::render_version_picker(f, area, picker, &snapshot.versions);
        }
        Overlay::Time(picker) => {
            let area = centered_rect(60, 60, size);
            f.render_widget(Clear, area);
            widgets::render_time_picker(f, area, picker);
        }
        Overlay::Note(modal) => {
            let area = centered_rect(50, 25, size);
            f.render_widget(Clear, area);
            widgets::render_note_modal(f, area, modal);
        }
    }

    if let Some(n) = &app.notification {
        if n.at.elapsed() < crate::tui::app::NOTIFICATION_TTL {
            let area = centered_rect(50, 10, size);
            f.render_widget(Clear, area);
            widgets::render_notification(f, area, &n.message, n.success);
        }
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn render_header(f: &mut Frame, area: Rect, app: &TuiApp, snapshot: &UiSnapshot) {
    let search_style = if app.searching {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let search = if snapshot.search.is_empty() && !app.searching {
        "(none)".to_string()
    } else if app.searching {
        format!("{}▏", snapshot.search)
    } else {
        snapshot.search.clone()
    };

    let line = Line::from(vec![
        Span::styled("CrashSight", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" │ "),
        Span::styled(snapshot.version_label.clone(), Style::default().fg(Color::Cyan)),
        Span::raw(" │ "),
        Span::styled(snapshot.time_label.clone(), Style::default().fg(Color::Cyan)),
        Span::raw(" │ Search: "),
        Span::styled(search, search_style),
        Span::raw(format!(
            " │ {} of {} issues ({} open) │ Up {}",
            snapshot.rows.len(),
            snapshot.total_issues,
            snapshot.open_issues,
            widgets::format_duration(snapshot.uptime_seconds)
        )),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::Black));
    let paragraph = Paragraph::new(vec![line]).block(block).alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

fn render_detail_screen(f: &mut Frame, area: Rect, app: &TuiApp, detail: &DetailSnapshot) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);
    widgets::render_issue_header(f, rows[0], &detail.issue);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rows[1]);
    widgets::render_variant_panel(f, columns[0], &detail.issue, &detail.page);
    widgets::render_event_panel(f, columns[1], &detail.page);

    if app.notes_visible(Instant::now()) {
        let notes_area = Rect {
            x: columns[1].x + columns[1].width / 3,
            y: columns[1].y,
            width: columns[1].width - columns[1].width / 3,
            height: columns[1].height,
        };
        f.render_widget(Clear, notes_area);
        widgets::render_notes_panel(f, notes_area, &detail.issue.notes);
    }
}

fn render_footer(f: &mut Frame, area: Rect, app: &TuiApp) {
    let hints = if app.searching {
        "type to search · Enter/Esc done"
    } else {
        match app.screen {
            Screen::List => "[↑↓]Select [Enter]Open [/]Search [V]ersions [T]ime [X]Clear [E]xport [?]Help [Q]uit",
            Screen::Detail => "[↑↓]Exception [←→]Event [C]lose [N]ote [O]Notes [E]xport [Esc]Back [?]Help [Q]uit",
        }
    };
    let block = Block::default().borders(Borders::ALL);
    let paragraph = Paragraph::new(vec![Line::from(Span::styled(hints, Style::default().fg(Color::DarkGray)))])
        .block(block)
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}
