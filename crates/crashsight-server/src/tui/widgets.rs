use crate::tui::app::{NoteKind, NoteModal, PickerColumn, TimeFocus, TimePicker, VersionPicker};
use crate::view::{EventsPage, IssueRow};
use chrono::{Datelike, Local};
use crashsight_core::detail::VariantFocus;
use crashsight_core::time_range::{CalendarMonth, Preset};
use crashsight_core::types::{CrashGroup, IssueNote, IssueStatus, NoteAction};
use crashsight_core::version_tree::{SelectionState, VersionTree};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub fn status_color(status: IssueStatus) -> Color {
    match status {
        IssueStatus::New => Color::Blue,
        IssueStatus::Open => Color::Red,
        IssueStatus::Regression => Color::Yellow,
        IssueStatus::Closed => Color::Green,
    }
}

/// Daily counts scaled to block characters, one per day.
pub fn spark_line(history: &[u64]) -> String {
    let max = history.iter().copied().max().unwrap_or(0);
    history
        .iter()
        .map(|&c| {
            if max == 0 {
                SPARK_LEVELS[0]
            } else {
                let level = (c * (SPARK_LEVELS.len() as u64 - 1) + max / 2) / max;
                SPARK_LEVELS[level as usize]
            }
        })
        .collect()
}

/// `12345` -> `12,345`
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    }
}

fn section(title: &str) -> Line<'static> {
    Line::from(vec![Span::styled(
        title.to_string(),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )])
}

pub fn render_issue_table(f: &mut Frame, area: Rect, rows: &[IssueRow], selected_index: usize) {
    let table_rows: Vec<Row> = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let bg = if idx == selected_index { Color::Blue } else { Color::Reset };
            let base = Style::default().bg(bg);
            Row::new(vec![
                Cell::from(row.status.as_str()).style(base.fg(status_color(row.status))),
                Cell::from(Line::from(vec![
                    Span::styled(row.site.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::styled(format!("  {}", row.top_message), Style::default().fg(Color::DarkGray)),
                ]))
                .style(base),
                Cell::from(format!("{} - {}", row.first_seen_version, row.last_seen_version)).style(base),
                Cell::from(spark_line(&row.history)).style(base.fg(Color::Cyan)),
                Cell::from(format_count(row.total_events)).style(base),
                Cell::from(format_count(row.affected_users)).style(base),
            ])
        })
        .collect();

    let table = Table::new(
        table_rows,
        [
            Constraint::Length(11),
            Constraint::Min(30),
            Constraint::Length(20),
            Constraint::Length(16),
            Constraint::Length(9),
            Constraint::Length(9),
        ],
    )
    .header(
        Row::new(vec!["Status", "Issue", "Versions", "Trend", "Events", "Users"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title("Issues"));

    f.render_widget(table, area);

    if rows.is_empty() {
        let inner = Rect {
            x: area.x + 1,
            y: area.y + 2,
            width: area.width.saturating_sub(2),
            height: 1,
        };
        let empty = Paragraph::new("No issues match the current filter")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(empty, inner);
    }
}

fn checkbox(state: SelectionState) -> &'static str {
    match state {
        SelectionState::All => "[x]",
        SelectionState::Some => "[-]",
        SelectionState::None => "[ ]",
    }
}

pub fn render_version_picker(f: &mut Frame, area: Rect, picker: &VersionPicker, tree: &VersionTree) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Versions (space toggle, x clear, enter apply, esc cancel)")
        .border_style(Style::default().fg(Color::Cyan))
        .style(Style::default().bg(Color::Black));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);

    let active = |col: PickerColumn| {
        if picker.column == col {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        }
    };

    let version_lines: Vec<Line> = tree
        .versions()
        .iter()
        .enumerate()
        .map(|(idx, v)| {
            let style = if idx == picker.version_index {
                active(PickerColumn::Versions)
            } else {
                Style::default()
            };
            let prefix = if idx == picker.version_index { "▶ " } else { "  " };
            Line::from(Span::styled(
                format!(
                    "{}{} {} ({})",
                    prefix,
                    checkbox(picker.draft.state_of(tree, &v.version_name)),
                    v.version_name,
                    format_count(tree.event_total(&v.version_name))
                ),
                style,
            ))
        })
        .collect();

    let current = tree.versions().get(picker.version_index);
    let build_lines: Vec<Line> = current
        .map(|v| {
            v.builds
                .iter()
                .enumerate()
                .map(|(idx, b)| {
                    let focused = picker.column == PickerColumn::Builds && idx == picker.build_index;
                    let style = if focused {
                        active(PickerColumn::Builds)
                    } else {
                        Style::default()
                    };
                    let mark = if picker.draft.is_selected(&b.build_number) { "[x]" } else { "[ ]" };
                    Line::from(Span::styled(
                        format!(
                            "{}{} {} ({})",
                            if focused { "▶ " } else { "  " },
                            mark,
                            b.build_number,
                            format_count(b.event_count)
                        ),
                        style,
                    ))
                })
                .collect()
        })
        .unwrap_or_default();

    let title = current
        .map(|v| format!("Builds of {}", v.version_name))
        .unwrap_or_else(|| "Builds".to_string());
    f.render_widget(
        Paragraph::new(version_lines).block(Block::default().borders(Borders::RIGHT).title("Versions")),
        columns[0],
    );
    f.render_widget(Paragraph::new(build_lines).block(Block::default().title(title)), columns[1]);
}

pub fn render_time_picker(f: &mut Frame, area: Rect, picker: &TimePicker) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Time range (tab calendar, [ ] set bounds, enter apply)")
        .border_style(Style::default().fg(Color::Cyan))
        .style(Style::default().bg(Color::Black));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(22), Constraint::Min(24)])
        .split(inner);

    let chosen = picker.draft.selected_preset();
    let mut presets: Vec<Line> = Preset::ALL
        .iter()
        .map(|p| (p.label(), chosen == Some(*p)))
        .chain(std::iter::once(("Custom", chosen.is_none())))
        .enumerate()
        .map(|(idx, (label, on))| {
            let focused = picker.focus == TimeFocus::Presets && idx == picker.preset_index;
            let style = if focused {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else if on {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            let marker = if on { "(•)" } else { "( )" };
            Line::from(Span::styled(format!("{} {}", marker, label), style))
        })
        .collect();

    let bound = |ts: Option<chrono::DateTime<chrono::Utc>>| {
        ts.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "--".to_string())
    };
    presets.push(Line::from(""));
    presets.push(Line::from(format!("From {}", bound(picker.draft.start()))));
    presets.push(Line::from(format!("To   {}", bound(picker.draft.end()))));
    f.render_widget(Paragraph::new(presets), columns[0]);

    let month = CalendarMonth::containing(picker.day);
    let mut lines = vec![
        Line::from(Span::styled(
            format!("{}-{:02}", month.year, month.month),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(" Su Mo Tu We Th Fr Sa", Style::default().fg(Color::DarkGray))),
    ];
    let mut week: Vec<Span> = (0..month.leading_blanks).map(|_| Span::raw("   ")).collect();
    for day in 1..=month.days {
        let Some(date) = month.date(day) else { continue };
        let mut style = Style::default();
        if picker.draft.covers_day(date, &Local) {
            style = style.bg(Color::Blue);
        }
        if date == picker.day {
            style = style.add_modifier(Modifier::REVERSED);
            if picker.focus == TimeFocus::Calendar {
                style = style.fg(Color::Cyan);
            }
        }
        week.push(Span::styled(format!("{:>3}", date.day()), style));
        if week.len() == 7 {
            lines.push(Line::from(std::mem::take(&mut week)));
        }
    }
    if !week.is_empty() {
        lines.push(Line::from(week));
    }
    f.render_widget(Paragraph::new(lines), columns[1]);
}

pub fn render_issue_header(f: &mut Frame, area: Rect, issue: &CrashGroup) {
    let lines = vec![
        Line::from(vec![
            Span::styled(
                issue.status.as_str(),
                Style::default().fg(status_color(issue.status)).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(issue.site_label(), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(format!("  {}", issue.package_name()), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(format!(
            "Events {} · Users {} · Seen {} - {} · First {} · Last {}",
            format_count(issue.total_events),
            format_count(issue.affected_users),
            issue.first_seen_version,
            issue.last_seen_version,
            issue.first_seen_date.with_timezone(&Local).format("%Y-%m-%d"),
            issue.last_seen_date.with_timezone(&Local).format("%Y-%m-%d"),
        )),
    ];
    let block = Block::default().borders(Borders::ALL).title(format!("Issue {}", issue.id));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

pub fn render_variant_panel(f: &mut Frame, area: Rect, issue: &CrashGroup, page: &EventsPage) {
    let width = area.width.saturating_sub(4).max(10) as usize;
    let selected = |focus: VariantFocus| {
        if page.focus == focus {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    };

    let mut lines = vec![Line::from(Span::styled(
        format!("All events ({})", format_count(issue.total_events)),
        selected(VariantFocus::All),
    ))];
    for (idx, bar) in page.variants.iter().enumerate() {
        let style = selected(VariantFocus::Variant(idx));
        lines.push(Line::from(Span::styled(
            format!("#{} {}: {} ({})", idx + 1, bar.exception_type, bar.message, format_count(bar.count)),
            style,
        )));
        let filled = ((bar.share / 100.0) * width as f64).round() as usize;
        lines.push(Line::from(Span::styled(
            "█".repeat(filled.max(1)),
            Style::default().fg(Color::Blue),
        )));
    }

    let block = Block::default().borders(Borders::ALL).title("Exceptions (↑↓)");
    f.render_widget(Paragraph::new(lines).block(block), area);
}

pub fn render_event_panel(f: &mut Frame, area: Rect, page: &EventsPage) {
    let mut lines = vec![Line::from(vec![
        Span::styled(page.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            " · {} users · event {} (←→)",
            format_count(page.affected_users),
            page.position
        )),
    ])];

    match &page.event {
        Some(event) => {
            lines.push(Line::from(Span::styled(
                format!(
                    "{} · {} · {} ({}) · {}",
                    event.device_model,
                    event.os_version,
                    event.app_version,
                    event.build_number,
                    event.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
                ),
                Style::default().fg(Color::DarkGray),
            )));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("{}: {}", event.exception_type, event.message),
                Style::default().fg(Color::Red),
            )));
            for frame in &event.stack_trace {
                let style = if frame.is_app_code {
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                lines.push(Line::from(Span::styled(
                    format!("  at {}.{}({}:{})", frame.library, frame.method, frame.file, frame.line),
                    style,
                )));
            }
        }
        None => lines.push(Line::from("  (no events)")),
    }

    let block = Block::default().borders(Borders::ALL).title("Stack trace");
    f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

pub fn render_notes_panel(f: &mut Frame, area: Rect, notes: &[IssueNote]) {
    let mut lines = Vec::new();
    for note in notes {
        let tag = match note.action {
            NoteAction::Closed => Span::styled(" closed", Style::default().fg(Color::Green)),
            NoteAction::Note => Span::raw(""),
        };
        lines.push(Line::from(vec![
            Span::styled(note.author.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                format!(" {}", note.date.with_timezone(&Local).format("%Y-%m-%d %H:%M")),
                Style::default().fg(Color::DarkGray),
            ),
            tag,
        ]));
        lines.push(Line::from(format!("  {}", note.content)));
        lines.push(Line::from(""));
    }
    if notes.is_empty() {
        lines.push(Line::from("  (no notes)"));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Notes ({})", notes.len()))
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));
    f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

pub fn render_note_modal(f: &mut Frame, area: Rect, modal: &NoteModal) {
    let title = match modal.kind {
        NoteKind::Close => format!("Close issue {}", modal.issue_id),
        NoteKind::Note => format!("Add note to issue {}", modal.issue_id),
    };
    let lines = vec![
        Line::from(Span::styled("Note (required):", Style::default().fg(Color::Yellow))),
        Line::from(format!("{}▏", modal.text)),
        Line::from(""),
        Line::from(Span::styled("enter confirm · esc cancel", Style::default().fg(Color::DarkGray))),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Cyan))
        .style(Style::default().bg(Color::Black));
    f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

pub fn render_help_panel(f: &mut Frame, area: Rect) {
    let lines = vec![
        section("Issue list:"),
        Line::from("  ↑↓/jk  Select issue"),
        Line::from("  Enter  Open detail"),
        Line::from("  /      Search class or message"),
        Line::from("  V      Version picker"),
        Line::from("  T      Time range picker"),
        Line::from("  X      Clear search and versions"),
        Line::from("  E      Export issue bundle"),
        Line::from(""),
        section("Issue detail:"),
        Line::from("  ↑↓/Tab Focus exception"),
        Line::from("  ←→     Previous / next event"),
        Line::from("  C      Close issue with note"),
        Line::from("  N      Add note"),
        Line::from("  O      Show / hide notes"),
        Line::from("  Esc    Back to list"),
        Line::from(""),
        section("Pickers:"),
        Line::from("  Space  Toggle"),
        Line::from("  Enter  Apply · Esc cancel"),
        Line::from(""),
        Line::from("  ?      Toggle this help · Q quit"),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Help")
        .border_style(Style::default().fg(Color::Cyan))
        .style(Style::default().bg(Color::Black));
    f.render_widget(Paragraph::new(lines).block(block).alignment(Alignment::Left), area);
}

pub fn render_notification(f: &mut Frame, area: Rect, message: &str, is_success: bool) {
    let color = if is_success { Color::Green } else { Color::Red };
    let icon = if is_success { "✓" } else { "✗" };

    let lines = vec![Line::from(vec![
        Span::styled(icon, Style::default().fg(color)),
        Span::raw(" "),
        Span::styled(message, Style::default().fg(color)),
    ])];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .style(Style::default().bg(Color::Black));
    f.render_widget(Paragraph::new(lines).block(block).alignment(Alignment::Center), area);
}
