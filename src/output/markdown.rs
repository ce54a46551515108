//! Markdown report generation
//!
//! This module writes a human-readable markdown report of a finished
//! session, including every failed page so a later run can target them.

use crate::output::summary::SessionSummary;
use crate::output::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown report for `summary` to `output_path`
///
/// # Arguments
///
/// * `summary` - The finished session
/// * `config_hash` - Hash of the configuration file, if one was used
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_summary(
    summary: &SessionSummary,
    config_hash: Option<&str>,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary, config_hash);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a session summary as markdown
pub fn format_markdown_summary(summary: &SessionSummary, config_hash: Option<&str>) -> String {
    let mut md = String::new();

    md.push_str("# Shelf-Harvest Scrape Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds\n",
        summary.duration().as_secs_f64()
    ));
    if let Some(hash) = config_hash {
        md.push_str(&format!("- **Config Hash**: `{}`\n", hash));
    }
    md.push('\n');

    md.push_str("## Results\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Pages | {} |\n", summary.total_pages));
    md.push_str(&format!("| Succeeded | {} |\n", summary.succeeded));
    md.push_str(&format!("| Failed | {} |\n", summary.failed));
    md.push_str(&format!("| Records written | {} |\n", summary.records_written));
    md.push_str(&format!(
        "| Peak concurrency | {} of {} |\n",
        summary.peak_concurrency, summary.max_concurrency
    ));
    md.push_str(&format!("| Success rate | {:.1}% |\n", summary.success_rate()));
    md.push('\n');

    md.push_str("## Failed Pages\n\n");
    if summary.failed_pages.is_empty() {
        md.push_str("_None._\n");
    } else {
        md.push_str("| Page | Attempts | Reason |\n");
        md.push_str("|------|----------|--------|\n");
        for failed in &summary.failed_pages {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                failed.page,
                failed.attempts,
                failed.reason.replace('|', "\\|")
            ));
        }
    }

    md
}
