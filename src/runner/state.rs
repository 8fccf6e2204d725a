use super::events::ReporterEvent;
use super::stats::{StatsStore, SuiteStats};
use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::iter::Sum;
use std::ops::Add;

/// Test outcome notified by the host for a single runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
    Passing,
    Failing,
    Pending,
}

/// Running outcome counters for one runner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestsNumber {
    pub passing: u32,
    pub pending: u32,
    pub failing: u32,
}

impl TestsNumber {
    fn record(&mut self, outcome: TestOutcome) {
        match outcome {
            TestOutcome::Passing => self.passing += 1,
            TestOutcome::Failing => self.failing += 1,
            TestOutcome::Pending => self.pending += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.passing + self.pending + self.failing
    }
}

impl Add for TestsNumber {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            passing: self.passing + other.passing,
            pending: self.pending + other.pending,
            failing: self.failing + other.failing,
        }
    }
}

impl Sum for TestsNumber {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Accumulated results of one runner, keyed by its correlation id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerResult {
    pub cid: String,
    pub capabilities: Value,
    pub spec_file_path: Vec<String>,
    pub spec_file_hash: String,
    pub runner_tests_number: TestsNumber,
    pub suites: Vec<SuiteStats>,
}

impl RunnerResult {
    pub fn new(cid: &str, specs: Vec<String>, capabilities: Value, spec_hash: &str) -> Self {
        Self {
            cid: cid.to_string(),
            capabilities,
            spec_file_path: specs,
            spec_file_hash: spec_hash.to_string(),
            runner_tests_number: TestsNumber::default(),
            suites: Vec::new(),
        }
    }

    pub fn is_failing(&self) -> bool {
        self.runner_tests_number.failing > 0
    }
}

/// Reduces runner lifecycle events into per-runner results.
///
/// Results are kept in the order their runners started; that order is the
/// top-to-bottom order of the final report.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    results: Vec<RunnerResult>,
    index: HashMap<String, usize>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a runner with zeroed counters and no suites
    pub fn on_runner_start(
        &mut self,
        cid: &str,
        specs: Vec<String>,
        capabilities: Value,
        spec_hash: &str,
    ) -> Result<(), ReportError> {
        if self.index.contains_key(cid) {
            log::warn!("Ignoring second start for runner {}", cid);
            return Err(ReportError::DuplicateRunner {
                cid: cid.to_string(),
            });
        }

        log::debug!("Runner {} started with {} spec(s)", cid, specs.len());
        self.index.insert(cid.to_string(), self.results.len());
        self.results
            .push(RunnerResult::new(cid, specs, capabilities, spec_hash));
        Ok(())
    }

    pub fn on_test_outcome(&mut self, cid: &str, outcome: TestOutcome) -> Result<(), ReportError> {
        self.runner_mut(cid)?.runner_tests_number.record(outcome);
        Ok(())
    }

    /// Freeze the runner's suite tree, dropping suites without tests.
    ///
    /// A second call for the same runner replaces the suites set by the first.
    pub fn on_runner_end(
        &mut self,
        cid: &str,
        spec_hash: &str,
        stats: &dyn StatsStore,
    ) -> Result<(), ReportError> {
        let runner = self.runner_mut(cid)?;
        let spec = stats
            .spec_stats(cid, spec_hash)
            .ok_or_else(|| ReportError::StatsNotFound {
                cid: cid.to_string(),
                spec_hash: spec_hash.to_string(),
            })?;

        runner.suites = spec
            .suites
            .iter()
            .map(|(_, suite)| suite)
            .filter(|suite| suite.has_tests())
            .cloned()
            .collect();

        log::debug!(
            "Runner {} ended with {} suite(s) ({} passing, {} pending, {} failing)",
            cid,
            runner.suites.len(),
            runner.runner_tests_number.passing,
            runner.runner_tests_number.pending,
            runner.runner_tests_number.failing
        );
        Ok(())
    }

    /// Dispatch one host event to its handler
    pub fn apply(&mut self, event: ReporterEvent, stats: &dyn StatsStore) -> Result<(), ReportError> {
        match event {
            ReporterEvent::RunnerStart {
                cid,
                specs,
                capabilities,
                spec_hash,
            } => self.on_runner_start(&cid, specs, capabilities, &spec_hash),
            ReporterEvent::RunnerEnd { cid, spec_hash } => {
                self.on_runner_end(&cid, &spec_hash, stats)
            }
            ReporterEvent::TestPass { cid } => self.on_test_outcome(&cid, TestOutcome::Passing),
            ReporterEvent::TestFail { cid } => self.on_test_outcome(&cid, TestOutcome::Failing),
            ReporterEvent::TestPending { cid } => self.on_test_outcome(&cid, TestOutcome::Pending),
        }
    }

    /// All runner results, in start order
    pub fn results(&self) -> &[RunnerResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<RunnerResult> {
        self.results
    }

    pub fn runner(&self, cid: &str) -> Option<&RunnerResult> {
        self.index.get(cid).map(|&i| &self.results[i])
    }

    /// Counters summed over every runner
    pub fn totals(&self) -> TestsNumber {
        self.results.iter().map(|r| r.runner_tests_number).sum()
    }

    fn runner_mut(&mut self, cid: &str) -> Result<&mut RunnerResult, ReportError> {
        let index = *self
            .index
            .get(cid)
            .ok_or_else(|| ReportError::RunnerNotFound {
                cid: cid.to_string(),
            })?;
        Ok(&mut self.results[index])
    }
}
