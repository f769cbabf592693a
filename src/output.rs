//! Result renderers for the command line.
//!
//! Every renderer takes a [`QueryResult`] and produces a string for stdout.
//! Failed results render their error in the shape of the chosen format.

use std::fmt;
use std::str::FromStr;

use crate::db::Value;
use crate::query::QueryResult;

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned plain-text table.
    #[default]
    Table,
    /// CSV with a header row.
    Csv,
    /// Pretty-printed JSON array with one object per row.
    Json,
    /// Markdown pipe table.
    Markdown,
}

impl OutputFormat {
    /// Name accepted by `--format`.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "markdown",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            _ => Err(format!(
                "Unknown output format: '{}'. Expected one of: table, csv, json, markdown",
                s
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Renders `result` in the requested format.
pub fn render(result: &QueryResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => render_table(result),
        OutputFormat::Csv => render_csv(result),
        OutputFormat::Json => render_json(result),
        OutputFormat::Markdown => render_markdown(result),
    }
}

fn display_rows(result: &QueryResult) -> Vec<Vec<String>> {
    result
        .rows
        .iter()
        .map(|row| row.iter().map(Value::to_display_string).collect())
        .collect()
}

fn render_table(result: &QueryResult) -> String {
    if let Some(error) = &result.error {
        return format!("Error: {}", error);
    }
    if result.is_empty() {
        return "No results found.".to_string();
    }

    let rows = display_rows(result);
    let mut output = format_table(&result.columns, &rows);
    output.push_str(&format!("\n\n{} row(s) returned", result.row_count));
    output
}

/// Lays out headers and cells in width-aligned columns.
fn format_table(headers: &[String], rows: &[Vec<String>]) -> String {
    if headers.is_empty() {
        return String::new();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let mut output = String::new();

    let header_line: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    output.push_str(header_line.join(" │ ").trim_end());
    output.push('\n');

    let separator: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    output.push_str(&separator.join("─┼─"));
    output.push('\n');

    for row in rows {
        let row_line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let width = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = width)
            })
            .collect();
        output.push_str(row_line.join(" │ ").trim_end());
        output.push('\n');
    }

    output.trim_end().to_string()
}

fn render_csv(result: &QueryResult) -> String {
    if let Some(error) = &result.error {
        return format!("Error: {}", error);
    }
    if result.columns.is_empty() {
        return String::new();
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    let written = writer.write_record(&result.columns).and_then(|_| {
        display_rows(result)
            .iter()
            .try_for_each(|row| writer.write_record(row))
    });
    if let Err(e) = written {
        return format!("Error: Failed to write CSV: {}", e);
    }

    match writer.into_inner() {
        Ok(bytes) => String::from_utf8_lossy(&bytes).trim_end().to_string(),
        Err(e) => format!("Error: Failed to write CSV: {}", e),
    }
}

fn render_json(result: &QueryResult) -> String {
    let value = match &result.error {
        Some(error) => serde_json::json!({ "error": error }),
        None => serde_json::Value::Array(
            result
                .rows
                .iter()
                .map(|row| {
                    let object = result
                        .columns
                        .iter()
                        .cloned()
                        .zip(row.iter().map(Value::to_json))
                        .collect();
                    serde_json::Value::Object(object)
                })
                .collect(),
        ),
    };

    serde_json::to_string_pretty(&value).unwrap_or_else(|e| format!("Error: {}", e))
}

fn render_markdown(result: &QueryResult) -> String {
    if let Some(error) = &result.error {
        return format!("**Error:** {}", error);
    }
    if result.is_empty() {
        return "*No results found.*".to_string();
    }

    let mut lines = Vec::with_capacity(result.rows.len() + 2);
    lines.push(format!("| {} |", result.columns.join(" | ")));
    lines.push(format!(
        "| {} |",
        vec!["---"; result.columns.len()].join(" | ")
    ));
    for row in display_rows(result) {
        let cells: Vec<String> = row.iter().map(|cell| cell.replace('|', "\\|")).collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }
    lines.join("\n")
}
