//! Main UI renderer

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap};

use crate::api::{Category, Priority, Ticket, TicketStats};
use crate::tui::app::{
    App, FormPhase, Screen, FORM_FIELD_CATEGORY, FORM_FIELD_DESCRIPTION, FORM_FIELD_PRIORITY,
    FORM_FIELD_SUBMIT, FORM_FIELD_TITLE,
};
use crate::tui::theme::Theme;

/// Collapsed tickets show at most this many description characters
const DESCRIPTION_PREVIEW_CHARS: usize = 120;

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Status bar
        ])
        .split(frame.area());

    render_header(frame, chunks[0], app);
    render_content(frame, chunks[1], app);
    render_status_bar(frame, chunks[2], app);

    if app.status_picker_open {
        render_status_picker(frame, app);
    }

    if app.show_help {
        render_help_overlay(frame);
    }

    if let Some(popup) = &app.error_popup {
        render_error_popup(frame, &popup.title, &popup.message);
    }
}

/// Render the header
fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let screen_name = match app.current_screen {
        Screen::TicketList => "Tickets",
        Screen::TicketForm => "New Ticket",
        Screen::Dashboard => "Dashboard",
    };

    let title = format!(" ticketdesk │ {} ", screen_name);

    let header = Paragraph::new(title)
        .style(Theme::header())
        .block(Block::default().borders(Borders::BOTTOM));

    frame.render_widget(header, area);
}

/// Render the main content area based on current screen
fn render_content(frame: &mut Frame, area: Rect, app: &App) {
    // One loading indicator until the initial list+stats load has resolved
    if app.initial_loading() {
        let loading = Paragraph::new("\n  Loading tickets and stats...")
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(loading, area);
        return;
    }

    match app.current_screen {
        Screen::TicketList => render_ticket_list(frame, area, app),
        Screen::TicketForm => render_ticket_form(frame, area, app),
        Screen::Dashboard => render_dashboard(frame, area, app),
    }
}

/// Render the status bar
fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let message = app.status_message.as_deref().unwrap_or("");

    let status = Paragraph::new(format!(" {}", message))
        .style(Theme::muted())
        .block(Block::default().borders(Borders::TOP));

    frame.render_widget(status, area);
}

// ─────────────────────────────────────────────────────────────────────────────
// Ticket list screen
// ─────────────────────────────────────────────────────────────────────────────

fn render_ticket_list(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Filter bar
            Constraint::Min(0),    // Tickets
            Constraint::Length(1), // Help line
        ])
        .split(area);

    render_filter_bar(frame, chunks[0], app);

    let items: Vec<ListItem> = if app.tickets_loading && app.tickets.is_empty() {
        vec![ListItem::new("  Fetching tickets...")]
    } else if app.tickets.is_empty() {
        vec![
            ListItem::new("  No tickets found."),
            ListItem::new(""),
            ListItem::new("  Press [n] to submit a new ticket, [x] to clear filters."),
        ]
    } else {
        app.tickets
            .iter()
            .enumerate()
            .flat_map(|(i, ticket)| {
                ticket_list_items(ticket, i == app.list_selection.selected, app.expanded_id)
            })
            .collect()
    };

    let list = List::new(items).block(
        Block::default()
            .title(format!(" All Tickets ({}) ", app.tickets.len()))
            .borders(Borders::ALL)
            .border_style(Theme::normal()),
    );

    frame.render_widget(list, chunks[1]);

    let help = Paragraph::new(
        " [j/k] Navigate  [Enter] Expand  [s] Status  [/] Search  [c/p/f] Filters  [n] New  [d] Dashboard  [q] Quit",
    )
    .style(Theme::muted());
    frame.render_widget(help, chunks[2]);
}

/// Build the rows for a single ticket entry
fn ticket_list_items(
    ticket: &Ticket,
    selected: bool,
    expanded_id: Option<u64>,
) -> Vec<ListItem<'static>> {
    let expanded = expanded_id == Some(ticket.id);

    let header = Line::from(vec![
        Span::raw(if expanded { "▾ " } else { "▸ " }),
        Span::styled(
            format!("#{} ", ticket.id),
            Style::default().fg(Theme::MUTED),
        ),
        Span::raw(truncate_chars(&ticket.title, 48)),
        Span::raw("  "),
        Span::styled(
            format!("[{}]", ticket.priority.display_name()),
            Style::default().fg(Theme::priority_color(ticket.priority)),
        ),
        Span::raw(" "),
        Span::styled(
            format!("[{}]", ticket.category.display_name()),
            Style::default().fg(Color::Gray),
        ),
        Span::raw(" "),
        Span::styled(
            format!("[{}]", ticket.status.display_name()),
            Style::default().fg(Theme::status_color(ticket.status)),
        ),
    ]);

    let body = if expanded {
        ticket.description.clone()
    } else {
        description_preview(&ticket.description)
    };

    let timestamp = ticket
        .created_at
        .with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M")
        .to_string();

    let mut lines = vec![header];
    for text_line in body.lines() {
        lines.push(Line::from(Span::styled(
            format!("    {}", text_line),
            Style::default().fg(Color::Gray),
        )));
    }
    lines.push(Line::from(Span::styled(
        format!("    {}", timestamp),
        Theme::muted(),
    )));

    let item = ListItem::new(Text::from(lines));
    if selected {
        vec![item.style(Theme::selected())]
    } else {
        vec![item]
    }
}

/// Render the active filter set above the list
fn render_filter_bar(frame: &mut Frame, area: Rect, app: &App) {
    let filters = &app.filters;

    let search_display = match (&filters.search, app.search_input_mode) {
        (Some(text), true) => format!("{}▌", text),
        (Some(text), false) => text.clone(),
        (None, true) => "▌".to_string(),
        (None, false) => "(all)".to_string(),
    };

    let field = |label: &str, value: String, active: bool| -> Vec<Span<'static>> {
        vec![
            Span::styled(format!(" {}: ", label), Theme::muted()),
            Span::styled(
                value,
                if active {
                    Style::default().fg(Theme::PRIMARY)
                } else {
                    Theme::normal()
                },
            ),
        ]
    };

    let mut spans = Vec::new();
    spans.extend(field("search", search_display, app.search_input_mode));
    spans.extend(field(
        "category",
        filters
            .category
            .map(|c| c.display_name().to_string())
            .unwrap_or_else(|| "all".to_string()),
        filters.category.is_some(),
    ));
    spans.extend(field(
        "priority",
        filters
            .priority
            .map(|p| p.display_name().to_string())
            .unwrap_or_else(|| "all".to_string()),
        filters.priority.is_some(),
    ));
    spans.extend(field(
        "status",
        filters
            .status
            .map(|s| s.display_name().to_string())
            .unwrap_or_else(|| "all".to_string()),
        filters.status.is_some(),
    ));

    let bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .title(" Filters ")
            .borders(Borders::ALL)
            .border_style(if app.search_input_mode {
                Style::default().fg(Theme::PRIMARY)
            } else {
                Theme::normal()
            }),
    );

    frame.render_widget(bar, area);
}

// ─────────────────────────────────────────────────────────────────────────────
// Ticket form screen
// ─────────────────────────────────────────────────────────────────────────────

fn render_ticket_form(frame: &mut Frame, area: Rect, app: &App) {
    let form = &app.form;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(6), // Description
            Constraint::Length(3), // Category + Priority
            Constraint::Length(3), // Submit
            Constraint::Length(2), // Error line
            Constraint::Min(0),
        ])
        .split(area);

    let field_block = |label: String, active: bool| {
        Block::default()
            .title(label)
            .borders(Borders::ALL)
            .border_style(if active {
                Style::default().fg(Theme::PRIMARY)
            } else {
                Theme::normal()
            })
    };

    // Title input
    let title_value = if form.field == FORM_FIELD_TITLE {
        format!("{}▌", form.title)
    } else {
        form.title.clone()
    };
    frame.render_widget(
        Paragraph::new(title_value).block(field_block(
            " Title ".to_string(),
            form.field == FORM_FIELD_TITLE,
        )),
        chunks[0],
    );

    // Description input, with the classification indicator in the label
    let description_label = match (form.phase, &form.suggestion) {
        (FormPhase::Classifying, _) => " Description │ AI classifying... ".to_string(),
        (_, Some(_)) => " Description │ AI suggestion applied ✓ ".to_string(),
        _ => " Description ".to_string(),
    };
    let description_value = if form.field == FORM_FIELD_DESCRIPTION {
        format!("{}▌", form.description)
    } else {
        form.description.clone()
    };
    frame.render_widget(
        Paragraph::new(description_value)
            .wrap(Wrap { trim: false })
            .block(field_block(
                description_label,
                form.field == FORM_FIELD_DESCRIPTION,
            )),
        chunks[1],
    );

    // Category and priority selectors side by side
    let selector_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);

    let category_label = match &form.suggestion {
        Some(s) => format!(" Category (AI: {}) ", s.suggested_category),
        None => " Category ".to_string(),
    };
    let category_value = form
        .category
        .map(|c| c.display_name().to_string())
        .unwrap_or_else(|| "Select category".to_string());
    frame.render_widget(
        Paragraph::new(category_value).block(field_block(
            category_label,
            form.field == FORM_FIELD_CATEGORY,
        )),
        selector_chunks[0],
    );

    let priority_label = match &form.suggestion {
        Some(s) => format!(" Priority (AI: {}) ", s.suggested_priority),
        None => " Priority ".to_string(),
    };
    let priority_value = form
        .priority
        .map(|p| p.display_name().to_string())
        .unwrap_or_else(|| "Select priority".to_string());
    frame.render_widget(
        Paragraph::new(priority_value).block(field_block(
            priority_label,
            form.field == FORM_FIELD_PRIORITY,
        )),
        selector_chunks[1],
    );

    // Submit button
    let submit_text = if form.phase == FormPhase::Submitting {
        "  Submitting...  "
    } else {
        "  Submit Ticket  "
    };
    frame.render_widget(
        Paragraph::new(submit_text)
            .alignment(Alignment::Center)
            .style(if form.field == FORM_FIELD_SUBMIT {
                Theme::selected()
            } else {
                Theme::normal()
            })
            .block(Block::default().borders(Borders::ALL)),
        chunks[3],
    );

    // Inline error (local validation or server rejection)
    if let Some(error) = &form.error {
        frame.render_widget(
            Paragraph::new(format!(" {}", error)).style(Style::default().fg(Theme::ERROR)),
            chunks[4],
        );
    } else {
        frame.render_widget(
            Paragraph::new(" [Tab] Next field  [Space] Cycle selection  [Enter] Submit  [Esc] Back")
                .style(Theme::muted()),
            chunks[4],
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dashboard screen
// ─────────────────────────────────────────────────────────────────────────────

fn render_dashboard(frame: &mut Frame, area: Rect, app: &App) {
    let Some(stats) = &app.stats else {
        let placeholder = Paragraph::new("\n  No stats yet. Press [r] to refresh.")
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(placeholder, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Metric cards
            Constraint::Min(0),    // Breakdowns
            Constraint::Length(1), // Help line
        ])
        .split(area);

    render_metric_cards(frame, chunks[0], stats);

    let breakdown_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    render_priority_breakdown(frame, breakdown_chunks[0], stats);
    render_category_breakdown(frame, breakdown_chunks[1], stats);

    let help = Paragraph::new(" [r] Refresh  [n] New Ticket  [Esc] Back").style(Theme::muted());
    frame.render_widget(help, chunks[2]);
}

fn render_metric_cards(frame: &mut Frame, area: Rect, stats: &TicketStats) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(area);

    let card = |label: &'static str, value: String, color: Color| {
        Paragraph::new(vec![
            Line::from(Span::styled(
                value,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(label, Theme::muted())),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
    };

    frame.render_widget(
        card(
            "Total Tickets",
            stats.total_tickets.to_string(),
            Theme::PRIMARY,
        ),
        cards[0],
    );
    frame.render_widget(
        card("Open Tickets", stats.open_tickets.to_string(), Color::Blue),
        cards[1],
    );
    frame.render_widget(
        card(
            "Avg / Day",
            format!("{:.1}", stats.avg_tickets_per_day),
            Theme::SUCCESS,
        ),
        cards[2],
    );
}

fn render_priority_breakdown(frame: &mut Frame, area: Rect, stats: &TicketStats) {
    let block = Block::default()
        .title(" Priority Breakdown ")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let total: u64 = stats.priority_breakdown.values().sum();
    let rows: Vec<(String, u64, Color)> = Priority::all()
        .iter()
        .filter_map(|p| {
            stats.priority_breakdown.get(p).map(|count| {
                (
                    p.display_name().to_string(),
                    *count,
                    Theme::priority_color(*p),
                )
            })
        })
        .collect();

    render_breakdown_bars(frame, inner, total, &rows);
}

fn render_category_breakdown(frame: &mut Frame, area: Rect, stats: &TicketStats) {
    let block = Block::default()
        .title(" Category Breakdown ")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let colors = [Color::Magenta, Color::Cyan, Color::Green, Color::Yellow];
    let total: u64 = stats.category_breakdown.values().sum();
    let rows: Vec<(String, u64, Color)> = Category::all()
        .iter()
        .zip(colors)
        .filter_map(|(c, color)| {
            stats
                .category_breakdown
                .get(c)
                .map(|count| (c.display_name().to_string(), *count, color))
        })
        .collect();

    render_breakdown_bars(frame, inner, total, &rows);
}

/// Render one gauge per breakdown key, proportional to its share
fn render_breakdown_bars(frame: &mut Frame, area: Rect, total: u64, rows: &[(String, u64, Color)]) {
    for (i, (label, count, color)) in rows.iter().enumerate() {
        let y = area.y + (i as u16) * 2;
        if y + 1 > area.y + area.height {
            break;
        }
        let row_area = Rect::new(area.x + 1, y, area.width.saturating_sub(2), 1);

        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(*color).bg(Color::DarkGray))
            .ratio(bar_ratio(*count, total))
            .label(format!("{} ({})", label, count));
        frame.render_widget(gauge, row_area);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Overlays
// ─────────────────────────────────────────────────────────────────────────────

/// Render the status picker popup over the list
fn render_status_picker(frame: &mut Frame, app: &App) {
    use crate::api::Status;

    let area = centered_rect(30, 8, frame.area());
    frame.render_widget(Clear, area);

    let items: Vec<ListItem> = Status::all()
        .iter()
        .enumerate()
        .map(|(i, status)| {
            let item = ListItem::new(format!("  {}", status.display_name()));
            if i == app.status_picker_selection.selected {
                item.style(Theme::selected())
            } else {
                item
            }
        })
        .collect();

    let title = if app.ticket_updating {
        " Set Status (updating...) "
    } else {
        " Set Status "
    };

    let list = List::new(items).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Theme::PRIMARY)),
    );

    frame.render_widget(list, area);
}

/// Render the help overlay
fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect(56, 16, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from("  Tickets"),
        Line::from("    j/k      Move selection"),
        Line::from("    Enter    Expand/collapse description"),
        Line::from("    s        Change ticket status"),
        Line::from("    /        Search title and description"),
        Line::from("    c/p/f    Cycle category/priority/status filter"),
        Line::from("    x        Clear all filters"),
        Line::from("    r        Refresh"),
        Line::from(""),
        Line::from("  Screens"),
        Line::from("    n        New ticket form"),
        Line::from("    d        Stats dashboard"),
        Line::from("    Esc      Back    q  Quit"),
    ];

    let help = Paragraph::new(lines).block(
        Block::default()
            .title(" Help (any key to close) ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Theme::PRIMARY)),
    );

    frame.render_widget(help, area);
}

/// Render a blocking error popup
fn render_error_popup(frame: &mut Frame, title: &str, message: &str) {
    let area = centered_rect(60, 10, frame.area());
    frame.render_widget(Clear, area);

    let text = format!("\n{}\n\n[Enter/Esc] Dismiss", message);
    let popup = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .title(format!(" {} ", title))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Theme::ERROR)),
        );

    frame.render_widget(popup, area);
}

/// Build a centered rect of fixed size within `area`
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

// ─────────────────────────────────────────────────────────────────────────────
// Text helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Truncate to at most `max` characters, appending an ellipsis if shortened
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max).collect();
        out.push_str("...");
        out
    }
}

/// Collapsed description preview
fn description_preview(description: &str) -> String {
    truncate_chars(description, DESCRIPTION_PREVIEW_CHARS)
}

/// Share of a breakdown bar; the denominator floor avoids division by zero
/// for an empty breakdown
fn bar_ratio(count: u64, total: u64) -> f64 {
    count as f64 / total.max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_descriptions_are_untouched() {
        assert_eq!(description_preview("brief"), "brief");

        let exactly_120: String = "a".repeat(120);
        assert_eq!(description_preview(&exactly_120), exactly_120);
    }

    #[test]
    fn test_long_descriptions_are_truncated_with_ellipsis() {
        let long: String = "x".repeat(200);
        let preview = description_preview(&long);
        assert_eq!(preview.chars().count(), 123);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let text = "é".repeat(130);
        let preview = description_preview(&text);
        assert!(preview.starts_with('é'));
        assert_eq!(preview.chars().count(), 123);
    }

    #[test]
    fn test_bar_ratio_is_proportional() {
        // {low: 3, high: 1} -> 75% and 25%
        assert_eq!(bar_ratio(3, 4), 0.75);
        assert_eq!(bar_ratio(1, 4), 0.25);
    }

    #[test]
    fn test_bar_ratio_handles_empty_breakdown() {
        assert_eq!(bar_ratio(0, 0), 0.0);
    }
}
