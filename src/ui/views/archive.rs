use chrono::DateTime;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;

use crate::ui::app::{App, Pane};

pub fn render_archive(f: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .split(f.area());

    let header = Paragraph::new(Line::from(vec![
        Span::styled("Tab Archive", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            "  {} recent / {} archived{}",
            app.recent_tabs.len(),
            app.archived.len(),
            if app.has_more { "+" } else { "" }
        )),
    ]));
    f.render_widget(header, chunks[0]);

    let panes = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    render_recent(f, app, panes[0]);
    render_archived(f, app, panes[1]);

    let help = match app.status_message.as_deref() {
        Some(msg) => Line::from(Span::styled(msg, Style::default().fg(Color::Red))),
        None => Line::from(Span::styled(
            " j/k move  tab pane  space select  a archive  f forget  A/F batch  m more  q quit",
            Style::default().fg(Color::DarkGray),
        )),
    };
    f.render_widget(Paragraph::new(help), chunks[2]);
}

fn pane_block(title: &str, focused: bool) -> Block<'_> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(style)
}

fn render_recent(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.pane == Pane::Recent;
    let items: Vec<ListItem> = app
        .recent_tabs
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            let marker = selection_marker(app, focused, &tab.url);
            let count = if tab.count > 1 {
                format!(" x{}", tab.count)
            } else {
                String::new()
            };
            let title_line = Line::from(vec![
                Span::raw(marker),
                styled_title(&tab.title, focused && i == app.cursor),
                Span::styled(count, Style::default().fg(Color::Yellow)),
            ]);
            let url_line = Line::from(Span::styled(
                format!("    {}", tab.url),
                Style::default().fg(Color::DarkGray),
            ));
            ListItem::new(vec![title_line, url_line])
        })
        .collect();

    let list = List::new(items).block(pane_block("Recent", focused));
    f.render_widget(list, area);
}

fn render_archived(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.pane == Pane::Archived;
    let mut items: Vec<ListItem> = app
        .archived
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            let marker = selection_marker(app, focused, &rec.url);
            let title_line = Line::from(vec![
                Span::raw(marker),
                styled_title(&rec.title, focused && i == app.cursor),
                Span::styled(
                    format!(" ({} visits, {})", rec.count, format_visit(rec.last_visit)),
                    Style::default().fg(Color::Yellow),
                ),
            ]);
            let url_line = Line::from(Span::styled(
                format!("    {}", rec.url),
                Style::default().fg(Color::DarkGray),
            ));
            ListItem::new(vec![title_line, url_line])
        })
        .collect();
    if app.has_more {
        items.push(ListItem::new(Line::from(Span::styled(
            "    … press m for more",
            Style::default().fg(Color::DarkGray),
        ))));
    }

    let list = List::new(items).block(pane_block("Archived", focused));
    f.render_widget(list, area);
}

fn selection_marker(app: &App, focused: bool, url: &str) -> String {
    if focused && app.selection.contains(url) {
        "[x] ".to_string()
    } else {
        "[ ] ".to_string()
    }
}

fn styled_title(title: &str, under_cursor: bool) -> Span<'_> {
    if under_cursor {
        Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::raw(title)
    }
}

fn format_visit(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
