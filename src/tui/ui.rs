//! Layout and rendering for the interactive dashboard.
//!
//! Sidebar on the left (controls and market filter), main area on the
//! right laid out top to bottom: metric cards, issue breakdown, market
//! chart and table, drill-down actions, DMF history.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Bar, BarChart, BarGroup, Block, Borders, List, ListItem, Paragraph, Row, Table as TableWidget,
        Wrap,
    },
    Frame,
};

use super::app::{ActionResult, App, Focus, LoadState};
use crate::core::catalog::Action;
use crate::core::view::{DashboardView, ErrorPanel, IssueBreakdown, MarketSection, MetricCard, NO_HISTORY_NOTICE};
use crate::domain::model::{ScoreBand, Table};
use crate::domain::ports::Warehouse;

const SIDEBAR_WIDTH: u16 = 30;

pub fn draw<W: Warehouse>(f: &mut Frame, app: &mut App<W>) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
        .split(f.area());

    draw_sidebar(f, app, columns[0]);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(columns[1]);

    draw_header(f, app, rows[0]);
    match &app.state {
        LoadState::Loading => {
            f.render_widget(Paragraph::new("Loading data quality metrics..."), rows[1]);
        }
        LoadState::Ready(view) => draw_dashboard(f, view, app.action_result.as_ref(), rows[1]),
        LoadState::Failed(panel) => draw_error(f, panel, rows[1]),
    }
    draw_status_bar(f, app, rows[2]);
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

// ── Sidebar ─────────────────────────────────────────────────────────────────

fn draw_sidebar<W: Warehouse>(f: &mut Frame, app: &mut App<W>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Refresh control
            Constraint::Min(3),    // Market filter
            Constraint::Length(3), // Caption
        ])
        .split(area);

    let refresh = Paragraph::new(Line::from(vec![
        Span::styled("[r] ", Style::default().fg(Color::Yellow)),
        Span::raw("Refresh Data"),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Dashboard Controls "),
    );
    f.render_widget(refresh, chunks[0]);

    let items: Vec<ListItem> = app
        .markets
        .iter()
        .map(|market| {
            let checked = app.selected.contains(market);
            let marker = if checked { "[x] " } else { "[ ] " };
            let style = if checked {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(marker, style),
                Span::raw(market.as_str()),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focus_style(app.focus == Focus::Sidebar))
                .title(" Filters: Market Areas "),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, chunks[1], &mut app.market_state);

    let caption = Paragraph::new(vec![
        Line::from(Span::styled(
            "Data Quality Metrics Demo",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            "Dynamic Tables + DMFs",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(Block::default().borders(Borders::TOP));
    f.render_widget(caption, chunks[2]);
}

// ── Header / Status ─────────────────────────────────────────────────────────

fn draw_header<W: Warehouse>(f: &mut Frame, app: &App<W>, area: Rect) {
    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            app.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("Demo: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(app.subtitle.as_str()),
        ]),
    ])
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn draw_status_bar<W: Warehouse>(f: &mut Frame, app: &App<W>, area: Rect) {
    let loaded = app
        .last_loaded
        .map(|t| format!(" loaded {} ", t.format("%H:%M:%S")))
        .unwrap_or_else(|| " not loaded ".to_string());
    let filter = if app.selected.is_empty() {
        "all markets".to_string()
    } else {
        format!("{} market(s)", app.selected.len())
    };

    let status = Line::from(vec![
        Span::styled(
            loaded,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {} ", filter)),
        Span::styled(
            " q:quit  Tab:focus  Space:toggle  r:refresh  n/b/d:actions  c:clear ",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(status), area);
}

// ── Dashboard ───────────────────────────────────────────────────────────────

fn draw_dashboard(f: &mut Frame, view: &DashboardView, action: Option<&ActionResult>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),      // Metric cards
            Constraint::Length(7),      // Issue breakdown
            Constraint::Min(8),         // Markets
            Constraint::Length(9),      // Remediation
            Constraint::Percentage(25), // History
        ])
        .split(area);

    draw_cards(f, &view.cards, chunks[0]);
    draw_breakdown(f, view.breakdown.as_ref(), chunks[1]);
    draw_markets(f, view.markets.as_ref(), chunks[2]);
    draw_actions(f, action, chunks[3]);

    match &view.history {
        Some(history) => f.render_widget(data_table(" Recent DMF Executions ", history), chunks[4]),
        None => f.render_widget(
            Paragraph::new(NO_HISTORY_NOTICE)
                .style(Style::default().fg(Color::Blue))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(" Recent DMF Executions "),
                ),
            chunks[4],
        ),
    }
}

fn band_color(band: ScoreBand) -> Color {
    match band {
        ScoreBand::Good => Color::Green,
        ScoreBand::Warning => Color::Yellow,
        ScoreBand::NeedsAttention => Color::Red,
    }
}

fn draw_cards(f: &mut Frame, cards: &[MetricCard], area: Rect) {
    if cards.is_empty() {
        return;
    }
    let constraints = vec![Constraint::Ratio(1, cards.len() as u32); cards.len()];
    let slots = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (card, slot) in cards.iter().zip(slots.iter()) {
        let delta_color = card.band.map(band_color).unwrap_or(Color::Gray);
        let mut lines = vec![Line::from(Span::styled(
            card.value.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        if let Some(delta) = &card.delta {
            lines.push(Line::from(Span::styled(
                delta.as_str(),
                Style::default().fg(delta_color),
            )));
        }
        let widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", card.label)),
        );
        f.render_widget(widget, *slot);
    }
}

fn draw_breakdown(f: &mut Frame, breakdown: Option<&IssueBreakdown>, area: Rect) {
    let Some(breakdown) = breakdown else {
        return;
    };
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Percentage(35),
            Constraint::Percentage(30),
        ])
        .split(area);

    f.render_widget(data_table(" NULL Values ", &breakdown.nulls), halves[0]);
    f.render_widget(data_table(" Blank/Empty Values ", &breakdown.blanks), halves[1]);
    f.render_widget(
        Paragraph::new(breakdown.duplicate_notice())
            .style(Style::default().fg(Color::Blue))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Duplicate Records "),
            ),
        halves[2],
    );
}

fn draw_markets(f: &mut Frame, markets: Option<&MarketSection>, area: Rect) {
    let Some(markets) = markets else {
        return;
    };
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let bars: Vec<Bar> = markets
        .bars
        .iter()
        .map(|(market, score)| {
            Bar::default()
                .label(Line::from(market.as_str()))
                .value(score.max(0.0).round() as u64)
                .text_value(format!("{:.1}", score))
                .style(Style::default().fg(band_color(ScoreBand::classify(*score))))
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Quality by Market Area "),
        )
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .max(100)
        .data(BarGroup::default().bars(&bars));
    f.render_widget(chart, halves[0]);

    f.render_widget(data_table(" Market Detail ", &markets.table), halves[1]);
}

fn draw_actions(f: &mut Frame, result: Option<&ActionResult>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let mut spans = Vec::new();
    for (action, key) in Action::all().iter().zip(['n', 'b', 'd']) {
        let active = result.map(|r| r.action == *action).unwrap_or(false);
        let style = if active {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::Cyan)
        };
        spans.push(Span::styled(format!("[{}] {}", key, action.button_label()), style));
        spans.push(Span::raw("   "));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Quick Remediation Actions "),
        ),
        chunks[0],
    );

    if let Some(ActionResult { action, table }) = result {
        let title = format!(" {} ({} rows) ", action.heading(), table.len());
        f.render_widget(data_table(&title, table), chunks[1]);
    }
}

fn data_table<'a>(title: &str, table: &'a Table) -> TableWidget<'a> {
    let header = Row::new(table.columns.iter().map(String::as_str))
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = table
        .rows
        .iter()
        .map(|row| Row::new(row.iter().map(|cell| cell.to_string())));
    let widths = vec![Constraint::Fill(1); table.columns.len().max(1)];

    TableWidget::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.to_string()),
        )
}

// ── Error ───────────────────────────────────────────────────────────────────

fn draw_error(f: &mut Frame, panel: &ErrorPanel, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled(
            panel.message.as_str(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Troubleshooting Steps:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
    ];
    for (i, step) in panel.steps.iter().enumerate() {
        lines.push(Line::from(format!("{}. {}", i + 1, step)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        panel.suggestion.as_str(),
        Style::default().fg(Color::DarkGray),
    )));

    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" Error "));
    f.render_widget(widget, area);
}
