// ABOUTME: This module handles output formatting for the partlens CLI
// ABOUTME: It renders image summaries as tables or JSON and formats model replies

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::images::ImageSummary;

pub trait OutputFormat {
    fn format_images(&self, images: &[ImageSummary]) -> Result<String>;
}

pub struct TableFormatter {
    use_color: bool,
}

impl TableFormatter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn format_budget(&self, over_budget: bool) -> String {
        let text = if over_budget { "over" } else { "ok" };
        match (self.use_color, over_budget) {
            (true, true) => text.yellow().to_string(),
            (true, false) => text.green().to_string(),
            (false, _) => text.to_string(),
        }
    }
}

#[derive(Tabled)]
struct TableRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    mime_type: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Budget")]
    budget: String,
}

impl OutputFormat for TableFormatter {
    fn format_images(&self, images: &[ImageSummary]) -> Result<String> {
        let rows: Vec<TableRow> = images
            .iter()
            .map(|image| TableRow {
                index: image.index,
                name: image.name.clone(),
                mime_type: image.mime_type.clone(),
                size: format_bytes(image.byte_size),
                budget: self.format_budget(image.over_budget),
            })
            .collect();

        let mut table = Table::new(rows);
        table.with(Style::psql());
        Ok(table.to_string())
    }
}

pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn format_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

impl OutputFormat for JsonFormatter {
    fn format_images(&self, images: &[ImageSummary]) -> Result<String> {
        self.format_value(images)
    }
}

/// Reply as emitted by `ask --json`.
#[derive(Debug, Serialize)]
pub struct ReplyRecord<'a> {
    pub model: &'a str,
    pub content: &'a str,
}

/// Human-readable byte count, e.g. `1.4 MB`.
pub fn format_bytes(bytes: usize) -> String {
    const KB: f64 = 1_000.0;
    const MB: f64 = 1_000_000.0;

    let value = bytes as f64;
    if value >= MB {
        format!("{:.1} MB", value / MB)
    } else if value >= KB {
        format!("{:.1} KB", value / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Heading printed above an assistant reply in terminal mode.
pub fn reply_heading(model: &str, use_color: bool) -> String {
    let heading = format!("── {} ──", model);
    if use_color {
        heading.cyan().bold().to_string()
    } else {
        heading
    }
}
