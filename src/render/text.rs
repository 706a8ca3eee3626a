//! Plain-text rendering for the non-interactive commands.

use crate::core::view::{DashboardView, ErrorPanel, MetricCard, NO_HISTORY_NOTICE};
use crate::domain::model::Table;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table as TextTable};
use std::fmt::Write;

const BAR_WIDTH: usize = 40;
const RULE: &str = "────────────────────────────────────────────────────────────";

pub fn render_table(table: &Table) -> String {
    let mut out = TextTable::new();
    out.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(table.columns.iter().map(String::as_str));
    for row in &table.rows {
        out.add_row(row.iter().map(|cell| cell.to_string()));
    }
    out.to_string()
}

fn render_cards(cards: &[MetricCard]) -> String {
    let mut out = TextTable::new();
    out.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(cards.iter().map(|c| c.label));
    out.add_row(cards.iter().map(|c| match &c.delta {
        Some(delta) => format!("{}\n{}", c.value, delta),
        None => c.value.clone(),
    }));
    out.to_string()
}

/// Horizontal bars scaled to the largest value (scores are percentages, so
/// that is normally 100).
pub fn render_bar_chart(bars: &[(String, f64)]) -> String {
    let label_width = bars.iter().map(|(m, _)| m.chars().count()).max().unwrap_or(0);
    let max = bars
        .iter()
        .map(|(_, v)| *v)
        .fold(100.0_f64, f64::max);

    let mut out = String::new();
    for (market, value) in bars {
        let filled = ((value.max(0.0) / max) * BAR_WIDTH as f64).round() as usize;
        let _ = writeln!(
            out,
            "{:<width$} │{:<bar$}│ {:.1}",
            market,
            "█".repeat(filled),
            value,
            width = label_width,
            bar = BAR_WIDTH
        );
    }
    out
}

pub fn render_dashboard(title: &str, subtitle: &str, view: &DashboardView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "Demo: {}", subtitle);
    let _ = writeln!(out, "{}", RULE);

    if !view.cards.is_empty() {
        let _ = writeln!(out, "{}", render_cards(&view.cards));
    }
    let _ = writeln!(out, "{}", RULE);

    let _ = writeln!(out, "Issue Breakdown");
    if let Some(breakdown) = &view.breakdown {
        let _ = writeln!(out, "\nNULL Values\n{}", render_table(&breakdown.nulls));
        let _ = writeln!(out, "\nBlank/Empty Values\n{}", render_table(&breakdown.blanks));
        let _ = writeln!(out, "\nDuplicate Records\n{}", breakdown.duplicate_notice());
    }
    let _ = writeln!(out, "{}", RULE);

    let _ = writeln!(out, "Quality by Market Area");
    if let Some(markets) = &view.markets {
        let _ = writeln!(out, "{}", render_bar_chart(&markets.bars));
        let _ = writeln!(out, "{}", render_table(&markets.table));
    }
    let _ = writeln!(out, "{}", RULE);

    let _ = writeln!(out, "Recent DMF Executions");
    match &view.history {
        Some(history) => {
            let _ = writeln!(out, "{}", render_table(history));
        }
        None => {
            let _ = writeln!(out, "{}", NO_HISTORY_NOTICE);
        }
    }
    out
}

pub fn render_error(panel: &ErrorPanel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", panel.message);
    let _ = writeln!(out, "Hint: {}", panel.suggestion);
    let _ = writeln!(out, "\nTroubleshooting Steps:");
    for (i, step) in panel.steps.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, step);
    }
    out
}

pub fn render_list(title: &str, items: &[String]) -> String {
    let mut out = format!("{} ({})\n", title, items.len());
    for item in items {
        out.push_str("  ");
        out.push_str(item);
        out.push('\n');
    }
    out
}
