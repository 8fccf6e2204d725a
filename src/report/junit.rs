use crate::runner::state::RunnerResult;
use crate::runner::stats::{SuiteStats, TestState, TestStats};
use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

/// Generate JUnit XML report string from runner results
pub fn generate_junit_xml(results: &[RunnerResult]) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let totals = results
        .iter()
        .flat_map(|r| &r.suites)
        .map(count_tests)
        .fold(Counts::default(), Counts::merge);

    // <testsuites>
    let mut suites_start = BytesStart::new("testsuites");
    suites_start.push_attribute(("name", "lumi-html-reporter"));
    push_counts(&mut suites_start, &totals);
    writer.write_event(Event::Start(suites_start))?;

    for result in results {
        for suite in &result.suites {
            write_test_suite(&mut writer, result, suite)?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    let xml = String::from_utf8(writer.into_inner().into_inner())?;
    Ok(xml)
}

#[derive(Default)]
struct Counts {
    tests: usize,
    failures: usize,
    skipped: usize,
    duration_ms: u64,
}

impl Counts {
    fn merge(self, other: Counts) -> Counts {
        Counts {
            tests: self.tests + other.tests,
            failures: self.failures + other.failures,
            skipped: self.skipped + other.skipped,
            duration_ms: self.duration_ms + other.duration_ms,
        }
    }
}

fn count_tests(suite: &SuiteStats) -> Counts {
    suite.tests().fold(Counts::default(), |mut counts, test| {
        counts.tests += 1;
        counts.duration_ms += test.duration;
        match test.state {
            TestState::Fail => counts.failures += 1,
            TestState::Pending => counts.skipped += 1,
            _ => {}
        }
        counts
    })
}

fn push_counts(start: &mut BytesStart, counts: &Counts) {
    start.push_attribute(("tests", counts.tests.to_string().as_str()));
    start.push_attribute(("failures", counts.failures.to_string().as_str()));
    start.push_attribute(("skipped", counts.skipped.to_string().as_str()));
    start.push_attribute(("time", seconds(counts.duration_ms).as_str()));
}

fn seconds(ms: u64) -> String {
    (ms as f64 / 1000.0).to_string()
}

fn write_test_suite<W: std::io::Write>(
    writer: &mut Writer<W>,
    result: &RunnerResult,
    suite: &SuiteStats,
) -> Result<()> {
    let mut suite_start = BytesStart::new("testsuite");
    suite_start.push_attribute(("name", suite.title.as_str()));
    suite_start.push_attribute(("package", result.cid.as_str()));
    push_counts(&mut suite_start, &count_tests(suite));
    if let Some(start) = &suite.start {
        suite_start.push_attribute(("timestamp", start.as_str()));
    }
    writer.write_event(Event::Start(suite_start))?;

    // Classname is cid + suite title so runners on different browsers stay apart
    let classname = format!("{}.{}", result.cid, suite.title);
    for test in suite.tests() {
        write_test_case(writer, &classname, test)?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    Ok(())
}

fn write_test_case<W: std::io::Write>(
    writer: &mut Writer<W>,
    classname: &str,
    test: &TestStats,
) -> Result<()> {
    let mut case_start = BytesStart::new("testcase");
    case_start.push_attribute(("name", test.title.as_str()));
    case_start.push_attribute(("classname", classname));
    case_start.push_attribute(("time", seconds(test.duration).as_str()));
    writer.write_event(Event::Start(case_start))?;

    match test.state {
        TestState::Fail => {
            let error = test.error.clone().unwrap_or_default();
            let mut fail_start = BytesStart::new("failure");
            fail_start.push_attribute(("message", error.message.as_str()));
            fail_start.push_attribute(("type", error.error_type.as_str()));
            writer.write_event(Event::Start(fail_start))?;
            writer.write_event(Event::Text(BytesText::new(&error.stack)))?;
            writer.write_event(Event::End(BytesEnd::new("failure")))?;
        }
        TestState::Pending => {
            writer.write_event(Event::Empty(BytesStart::new("skipped")))?;
        }
        _ => {}
    }

    if let Some(messages) = test.console_output().filter(|m| !m.is_empty()) {
        let lines: Vec<String> = messages
            .iter()
            .map(|m| format!("[{}] {}", m.level.as_str(), m.message))
            .collect();
        writer.write_event(Event::Start(BytesStart::new("system-out")))?;
        writer.write_event(Event::Text(BytesText::new(&lines.join("\n"))))?;
        writer.write_event(Event::End(BytesEnd::new("system-out")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    Ok(())
}
