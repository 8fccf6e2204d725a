pub mod html;
pub mod json;
pub mod junit;

use crate::runner::state::RunnerResult;
use crate::utils::config::ResolvedPaths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Output format of the report file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Html,
    Json,
    Junit,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(ReportFormat::Html),
            "json" => Ok(ReportFormat::Json),
            "junit" | "xml" => Ok(ReportFormat::Junit),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportFormat::Html => "html",
            ReportFormat::Json => "json",
            ReportFormat::Junit => "junit",
        };
        f.write_str(name)
    }
}

/// Render results in the requested format without writing anything
pub fn render_report(
    results: &[RunnerResult],
    format: ReportFormat,
    paths: &ResolvedPaths,
) -> Result<String> {
    match format {
        ReportFormat::Html => Ok(html::HtmlRenderer::new(&paths.base_path)
            .with_screenshot_dir(&paths.screenshot_dir)
            .render(results)),
        ReportFormat::Json => json::render_json(results, chrono::Utc::now()),
        ReportFormat::Junit => junit::generate_junit_xml(results),
    }
}

/// Render the report and write it once to the configured output file
pub fn generate_report(
    results: &[RunnerResult],
    format: ReportFormat,
    paths: &ResolvedPaths,
) -> Result<()> {
    let content = render_report(results, format, paths)?;
    write_report(&paths.out_file, &content)?;
    log::info!("Wrote {} report to {}", format, paths.out_file.display());
    Ok(())
}

fn write_report(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create report directory {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
