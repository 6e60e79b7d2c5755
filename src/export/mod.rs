//! Exporters
//!
//! Serializes a page's annotation list either as a structured JSON dump or
//! as a narrative Markdown document: a header naming the page, a generation
//! timestamp, then one section per annotation in stored order with the
//! quoted selected text, the note when present, and the creation time,
//! separated by a horizontal rule.

use chrono::{DateTime, Utc};
use std::fmt::Write as _;

use crate::annotations::Annotation;
use crate::error::ExportError;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
        }
    }
}

/// Pretty-printed JSON dump of the annotation list, fields as-is.
pub fn to_json(annotations: &[Annotation]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(annotations)?)
}

/// Narrative Markdown document for a page's annotations.
pub fn to_markdown(
    page_url: &str,
    annotations: &[Annotation],
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Annotations for {page_url}\n");
    let _ = writeln!(out, "Generated: {}\n", format_time(generated_at));

    for (i, annotation) in annotations.iter().enumerate() {
        let _ = writeln!(out, "## Annotation {}\n", i + 1);
        let _ = writeln!(out, "**Selected Text:**\n> {}\n", annotation.selected_text);
        if !annotation.note.is_empty() {
            let _ = writeln!(out, "**Note:**\n{}\n", annotation.note);
        }
        let _ = writeln!(out, "**Date:** {}\n", format_time(annotation.timestamp));
        let _ = writeln!(out, "---\n");
    }

    out
}

/// Filename for a downloaded export, namespaced by page key and stamped so
/// repeated exports never collide.
pub fn suggested_filename(page_key: &str, format: ExportFormat, now: DateTime<Utc>) -> String {
    let safe: String = page_key
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    format!(
        "annotations-{safe}-{}.{}",
        now.timestamp_millis(),
        format.extension()
    )
}

fn format_time(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M UTC").to_string()
}
