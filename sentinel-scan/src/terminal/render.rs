//! Text rendering for the command line

use crate::engine::result::{RiskLevel, ScanHistoryItem, ScanResult};
use chrono::{DateTime, Local};
use colored::{ColoredString, Colorize};
use std::fmt::Write;

const TARGET_WIDTH: usize = 60;

/// Risk level as a coloured badge
pub fn risk_badge(level: RiskLevel) -> ColoredString {
    let label = format!(" {} ", level);
    match level {
        RiskLevel::Low => label.black().on_green(),
        RiskLevel::Medium => label.black().on_yellow(),
        RiskLevel::High => label.black().on_truecolor(255, 140, 0),
        RiskLevel::Critical => label.white().on_red().bold(),
    }
}

/// Local date and time for an epoch-millisecond timestamp
pub fn format_timestamp(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn format_date(timestamp_ms: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}

fn section(out: &mut String, title: &str, items: &[String], bullet: &str) {
    let _ = writeln!(out, "\n{}", title.bold());
    if items.is_empty() {
        let _ = writeln!(out, "  {}", "(none)".dimmed());
    }
    for item in items {
        let _ = writeln!(out, "  {} {}", bullet, item);
    }
}

/// Full report for one scan
pub fn render_report(result: &ScanResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", "Security Report".bold().underline());
    let _ = writeln!(out, "Target:   {} ({})", result.target.cyan(), result.scan_type);
    let _ = writeln!(
        out,
        "Risk:     {}/100 {}",
        result.risk_score.to_string().bold(),
        risk_badge(result.risk_level)
    );
    let _ = writeln!(out, "Scanned:  {}", format_timestamp(result.timestamp));

    let _ = writeln!(out, "\n{}", "Analysis".bold());
    let _ = writeln!(out, "  {}", result.analysis);

    section(&mut out, "Findings", &result.findings, "•");
    section(&mut out, "Recommendations", &result.recommendations, "→");

    let sources = result.sources();
    if !sources.is_empty() {
        let _ = writeln!(out, "\n{}", "Sources".bold());
        for (n, source) in sources.iter().enumerate() {
            match &source.title {
                Some(title) => {
                    let _ = writeln!(out, "  [{}] {} <{}>", n + 1, title, source.uri.dimmed());
                }
                None => {
                    let _ = writeln!(out, "  [{}] {}", n + 1, source.uri);
                }
            }
        }
    }

    out
}

/// Recent scans preview
pub fn render_history(items: &[ScanHistoryItem]) -> String {
    if items.is_empty() {
        return format!("{}\n", "No scans yet.".dimmed());
    }

    let mut out = String::new();
    let _ = writeln!(out, "{}", "Recent Scans".bold());
    for item in items {
        let _ = writeln!(
            out,
            "  {:<12} {}  {}",
            risk_badge(item.risk_level).to_string(),
            format_date(item.timestamp).dimmed(),
            truncate(&item.target, TARGET_WIDTH)
        );
    }
    out
}

/// Error banner
pub fn render_error(message: &str) -> String {
    format!("{} {}", "✗ Error:".red().bold(), message.red())
}
