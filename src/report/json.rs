use crate::runner::state::{RunnerResult, TestsNumber};
use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// JSON report document
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonReport<'a> {
    pub generated_at: String,
    pub summary: TestsNumber,
    pub runners: &'a [RunnerResult],
}

/// Render runner results as pretty-printed JSON
pub fn render_json(results: &[RunnerResult], generated_at: DateTime<Utc>) -> Result<String> {
    let report = JsonReport {
        generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        summary: results.iter().map(|r| r.runner_tests_number).sum(),
        runners: results,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
