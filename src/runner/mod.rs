pub mod events;
pub mod state;
pub mod stats;

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

pub use events::*;
pub use state::*;
pub use stats::*;

const HANDLED_EVENTS: [&str; 5] = [
    "runner:start",
    "runner:end",
    "test:pass",
    "test:fail",
    "test:pending",
];

/// Parse a JSON-lines event log recorded from the host.
///
/// Blank lines and events this reporter does not handle (suite and hook
/// events, commands, ...) are skipped.
pub fn parse_event_log(content: &str) -> Result<Vec<ReporterEvent>> {
    let mut events = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let raw: Value = serde_json::from_str(line)
            .with_context(|| format!("Invalid JSON on line {}", line_no + 1))?;
        let name = raw
            .get("event")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if !HANDLED_EVENTS.contains(&name.as_str()) {
            log::debug!("Skipping '{}' event on line {}", name, line_no + 1);
            continue;
        }

        let event = serde_json::from_value(raw)
            .with_context(|| format!("Malformed '{}' event on line {}", name, line_no + 1))?;
        events.push(event);
    }
    Ok(events)
}

/// Replay a recorded run: read the event log and the stats snapshot, then
/// feed every event through a single listener.
pub async fn replay_run(events_path: &Path, stats_path: &Path) -> Result<ResultAggregator> {
    let content = std::fs::read_to_string(events_path)
        .with_context(|| format!("Failed to read event log {}", events_path.display()))?;
    let events = parse_event_log(&content)?;
    let stats = ReporterStats::load(stats_path)?;

    log::info!(
        "Replaying {} event(s) from {}",
        events.len(),
        events_path.display()
    );

    let (emitter, receiver) = EventEmitter::new();
    for event in events {
        emitter.emit(event);
    }
    drop(emitter);

    let mut aggregator = ResultAggregator::new();
    ResultListener::listen(receiver, &mut aggregator, &stats).await?;
    Ok(aggregator)
}
