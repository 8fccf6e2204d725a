//! Suite and test statistics recorded by the host test runner.
//!
//! The host keeps these in a store keyed by runner cid and spec hash. The
//! aggregator reads a runner's entry exactly once, when the runner ends.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Read-only view over the host's stats store.
pub trait StatsStore {
    /// Suite tree recorded for one runner and spec batch
    fn spec_stats(&self, cid: &str, spec_hash: &str) -> Option<&SpecStats>;
}

/// Snapshot of the host's stats store, as serialized to disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReporterStats {
    #[serde(default)]
    pub runners: HashMap<String, RunnerStats>,
}

impl ReporterStats {
    /// Load a stats snapshot from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read stats file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse stats file {}", path.display()))
    }
}

impl StatsStore for ReporterStats {
    fn spec_stats(&self, cid: &str, spec_hash: &str) -> Option<&SpecStats> {
        self.runners.get(cid)?.specs.get(spec_hash)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerStats {
    #[serde(default)]
    pub specs: HashMap<String, SpecStats>,
}

/// Suites of one spec batch, in the order the host recorded them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecStats {
    #[serde(default, with = "keyed")]
    pub suites: Vec<(String, SuiteStats)>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteStats {
    #[serde(default)]
    pub uid: String,

    pub title: String,

    /// JSON date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    /// JSON date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,

    #[serde(default, with = "keyed")]
    pub tests: Vec<(String, TestStats)>,
}

impl SuiteStats {
    pub fn has_tests(&self) -> bool {
        !self.tests.is_empty()
    }

    /// Tests in the order fixed when the suite was recorded
    pub fn tests(&self) -> impl Iterator<Item = &TestStats> {
        self.tests.iter().map(|(_, test)| test)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStats {
    #[serde(default)]
    pub uid: String,

    pub title: String,

    pub state: TestState,

    /// Milliseconds
    #[serde(alias = "_duration")]
    pub duration: u64,

    #[serde(default, deserialize_with = "Output::deserialize_log")]
    pub output: Vec<Output>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TestError>,

    #[serde(
        default,
        alias = "consoleMassage",
        skip_serializing_if = "Option::is_none"
    )]
    pub console_messages: Option<Vec<ConsoleMessage>>,
}

impl TestStats {
    /// Browser console messages captured for this test.
    ///
    /// Looks for the `/log` command result in the output log, then for
    /// messages the host attached to the test directly. A `/log` record with
    /// an unexpected shape means there is no output.
    pub fn console_output(&self) -> Option<Vec<ConsoleMessage>> {
        match self.output.iter().find(|output| output.is_console_log()) {
            Some(record) => {
                let value = record.payload.pointer("/body/value")?;
                serde_json::from_value(value.clone()).ok()
            }
            None => self.console_messages.clone(),
        }
    }

    /// Screenshot paths recorded in the output log, in order
    pub fn screenshots(&self) -> impl Iterator<Item = &str> {
        self.output.iter().filter_map(Output::screenshot_path)
    }
}

/// Outcome of a single test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TestState {
    Pass,
    Fail,
    Pending,
    Other(String),
}

impl TestState {
    pub fn as_str(&self) -> &str {
        match self {
            TestState::Pass => "pass",
            TestState::Fail => "fail",
            TestState::Pending => "pending",
            TestState::Other(state) => state,
        }
    }
}

impl From<String> for TestState {
    fn from(state: String) -> Self {
        match state.as_str() {
            "pass" => TestState::Pass,
            "fail" => TestState::Fail,
            "pending" => TestState::Pending,
            _ => TestState::Other(state),
        }
    }
}

impl From<TestState> for String {
    fn from(state: TestState) -> Self {
        state.as_str().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestError {
    #[serde(rename = "type", default)]
    pub error_type: String,

    #[serde(default)]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,

    #[serde(default)]
    pub stack: String,
}

/// One entry of a test's execution log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    #[serde(rename = "type")]
    pub kind: OutputKind,

    #[serde(default)]
    pub payload: Value,
}

impl Output {
    /// Reads an output log entry by entry. Entries without a string `type`
    /// become `Other` records and non-object entries are skipped, so a stray
    /// entry never rejects the whole store.
    fn deserialize_log<'de, D>(deserializer: D) -> std::result::Result<Vec<Output>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries: Option<Vec<Value>> = Option::deserialize(deserializer)?;
        Ok(entries
            .unwrap_or_default()
            .iter()
            .filter_map(Output::from_entry)
            .collect())
    }

    fn from_entry(entry: &Value) -> Option<Output> {
        let fields = entry.as_object()?;
        let kind = match fields.get("type").and_then(Value::as_str) {
            Some(kind) => OutputKind::from(kind.to_string()),
            None => OutputKind::Other(String::new()),
        };
        Some(Output {
            kind,
            payload: fields.get("payload").cloned().unwrap_or_default(),
        })
    }

    /// Whether this is the result of a browser log request
    pub fn is_console_log(&self) -> bool {
        self.kind == OutputKind::Result
            && self
                .payload
                .pointer("/requestOptions/uri/pathname")
                .and_then(Value::as_str)
                .is_some_and(|pathname| pathname.ends_with("/log"))
    }

    /// Path of the captured image, for screenshot entries
    pub fn screenshot_path(&self) -> Option<&str> {
        if self.kind != OutputKind::Screenshot {
            return None;
        }
        self.payload
            .get("absolutePath")
            .or_else(|| self.payload.get("filename"))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OutputKind {
    BeforeCommand,
    Command,
    Result,
    AfterCommand,
    Screenshot,
    Other(String),
}

impl From<String> for OutputKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "beforecommand" => OutputKind::BeforeCommand,
            "command" => OutputKind::Command,
            "result" => OutputKind::Result,
            "aftercommand" => OutputKind::AfterCommand,
            "screenshot" => OutputKind::Screenshot,
            _ => OutputKind::Other(kind),
        }
    }
}

impl From<OutputKind> for String {
    fn from(kind: OutputKind) -> Self {
        match kind {
            OutputKind::BeforeCommand => "beforecommand".to_string(),
            OutputKind::Command => "command".to_string(),
            OutputKind::Result => "result".to_string(),
            OutputKind::AfterCommand => "aftercommand".to_string(),
            OutputKind::Screenshot => "screenshot".to_string(),
            OutputKind::Other(kind) => kind,
        }
    }
}

/// A message captured from the browser console
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    pub message: String,
    #[serde(default)]
    pub source: String,
    /// Unix epoch timestamp
    #[serde(default)]
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConsoleLevel {
    Warning,
    Severe,
    Info,
    Other(String),
}

impl ConsoleLevel {
    pub fn as_str(&self) -> &str {
        match self {
            ConsoleLevel::Warning => "WARNING",
            ConsoleLevel::Severe => "SEVERE",
            ConsoleLevel::Info => "INFO",
            ConsoleLevel::Other(level) => level,
        }
    }
}

impl From<String> for ConsoleLevel {
    fn from(level: String) -> Self {
        match level.as_str() {
            "WARNING" => ConsoleLevel::Warning,
            "SEVERE" => ConsoleLevel::Severe,
            "INFO" => ConsoleLevel::Info,
            _ => ConsoleLevel::Other(level),
        }
    }
}

impl From<ConsoleLevel> for String {
    fn from(level: ConsoleLevel) -> Self {
        level.as_str().to_string()
    }
}

/// (De)serializes a JSON object as an ordered list of entries, keeping the
/// order in which the host wrote them.
mod keyed {
    use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
    use serde::ser::{Serialize, SerializeMap, Serializer};
    use std::fmt;
    use std::marker::PhantomData;

    pub fn serialize<S, T>(entries: &[(String, T)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        struct KeyedVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for KeyedVisitor<T> {
            type Value = Vec<(String, T)>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of named entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry()? {
                    entries.push((key, value));
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(KeyedVisitor(PhantomData))
    }
}
