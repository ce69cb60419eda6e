//! CLI display utilities for formatting output
//!
//! Formatters return strings so the command layer decides where they go.

use chrono::{DateTime, Utc};
use colored::Colorize;

use crate::core::error_handling::{display_message, ContextualError};
use crate::core::strings::truncate_preview;
use crate::store::api::{ItemId, TrackedItem};
use crate::watcher::api::{SweepReport, WatchError};

const ADD_PREVIEW_CHARS: usize = 200;
const STATUS_PREVIEW_CHARS: usize = 150;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

fn heading(text: &str, use_color: bool) -> String {
    if use_color {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

fn timestamp_or_never(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.format(TIMESTAMP_FORMAT).to_string(),
        None => "Never".to_string(),
    }
}

/// Confirmation after a successful `add`
pub fn format_created(item: &TrackedItem, use_color: bool) -> String {
    let content = item.last_content.as_deref().unwrap_or_default();
    format!(
        "{}\n\nURL: {}\nXPath: {}\nLabel: {}\nID: {}\n\nCurrent content:\n{}",
        heading("✅ Now tracking!", use_color),
        item.url,
        item.selector,
        item.label.as_deref().unwrap_or("No label"),
        item.id,
        truncate_preview(content, ADD_PREVIEW_CHARS)
    )
}

pub fn format_list(items: &[TrackedItem], use_color: bool) -> String {
    if items.is_empty() {
        return "📭 You are not tracking any websites yet.".to_string();
    }

    let mut out = heading("📋 Your tracked websites:", use_color);
    out.push('\n');
    for (index, item) in items.iter().enumerate() {
        out.push_str(&format!(
            "\n{}. {}\n   URL: {}\n   XPath: {}\n   Last checked: {}\n   ID: {}\n",
            index + 1,
            item.display_label(),
            item.url,
            item.selector,
            timestamp_or_never(item.last_checked_at),
            item.id
        ));
    }
    out
}

pub fn format_status(items: &[TrackedItem], use_color: bool) -> String {
    if items.is_empty() {
        return "📭 You are not tracking any websites yet.".to_string();
    }

    let mut out = heading("📊 Tracking status:", use_color);
    out.push('\n');
    for item in items {
        let content = match item.last_content.as_deref() {
            Some(content) => truncate_preview(content, STATUS_PREVIEW_CHARS),
            None => "No content yet".to_string(),
        };
        out.push_str(&format!(
            "\n{}\n   URL: {}\n   Last checked: {}\n   Last updated: {}\n   Content: {}\n",
            item.display_label(),
            item.url,
            timestamp_or_never(item.last_checked_at),
            timestamp_or_never(item.last_changed_at),
            content
        ));
    }
    out
}

pub fn format_removed(id: ItemId, removed: bool) -> String {
    if removed {
        format!("✅ Stopped tracking item {}.", id)
    } else {
        format!("❌ No active item with id {} was found.", id)
    }
}

pub fn format_sweep(report: &SweepReport) -> String {
    format!("Sweep complete: {}", report)
}

/// Message printed when `add` fails
///
/// The limit message names the cap; system failures get a generic line.
pub fn creation_failure_message(error: &WatchError) -> String {
    match error {
        WatchError::LimitExceeded { limit, .. } => format!(
            "❌ Limit reached! You can track at most {} items. Please remove some tracked items first.",
            limit
        ),
        other if other.is_user_actionable() => display_message(other, "Adding tracked item"),
        _ => "❌ Error adding tracking item. Please try again.".to_string(),
    }
}
