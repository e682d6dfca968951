//! Output formatting module
//!
//! Handles:
//! - Human-readable listing
//! - JSON output of the `ListingOutput` envelope
//! - Timestamped headers for watch mode refreshes

use anyhow::Result;
use time::format_description::well_known::Iso8601;
use time::OffsetDateTime;

use crate::models::{ListingEntry, ListingOutput};

/// Format output in human-readable form
pub fn format_human(output: &ListingOutput) -> String {
    let mut text = String::new();

    if output.results.is_empty() {
        text.push_str("No applications match.\n");
    } else {
        for entry in &output.results {
            text.push_str(&format_entry(entry));
        }
    }

    let summary = &output.summary;
    let filters = if summary.filters.is_empty() {
        "(none)".to_string()
    } else {
        summary.filters.join(", ")
    };
    text.push_str(&format!(
        "\nShowing {} of {} applications (filters: {}; sort: {}",
        summary.shown, summary.total, filters, summary.sort
    ));
    if let Some(search) = &summary.search {
        text.push_str(&format!("; search: \"{}\"", search));
    }
    text.push_str(")\n");
    text
}

fn format_entry(entry: &ListingEntry) -> String {
    let title = match &entry.label {
        Some(label) => format!("{} ({})", label, entry.package_id),
        None => entry.package_id.clone(),
    };
    let tags = if entry.tags.is_empty() {
        String::new()
    } else {
        let list: Vec<String> = entry
            .tags
            .iter()
            .map(|tag| format!("{}[{}]", tag.kind.as_str(), tag.tint.as_str()))
            .collect();
        format!("  Tags: {}", list.join(" "))
    };

    format!(
        "{}\n  {}\n  Internet: {}{}\n",
        title, entry.summary, entry.internet_access, tags
    )
}

/// Format output as pretty JSON
pub fn format_json(output: &ListingOutput) -> Result<String> {
    Ok(serde_json::to_string_pretty(output)?)
}

/// Header printed before each refresh in watch mode
pub fn watch_header(generation: u64) -> Result<String> {
    let timestamp = OffsetDateTime::now_utc().format(&Iso8601::DEFAULT)?;
    Ok(format!("[{}] Listing update #{}", timestamp, generation))
}
