use crate::runner::state::RunnerResult;
use crate::runner::stats::{ConsoleLevel, ConsoleMessage, SuiteStats, TestError, TestState, TestStats};
use crate::utils::paths::relative_path;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

const STYLE: &str = r#"
        html, body {
            font-family: sans-serif;
        }

        main {
            margin: 1rem;
        }

        .fail {
            background: #f08080;
        }

        .fade {
            opacity: 0.5;
        }

        .mono {
            font-family: monospace;
        }

        td {
            padding: 0.25rem;
            vertical-align: top;
        }

        p {
            margin: 0;
        }

        img {
            display: block;
            max-width: 100%;
        }
"#;

/// Render runner results as a single static HTML page.
///
/// `base_path` is the directory the page will be written to; screenshot
/// links are made relative to it.
pub fn render_html(results: &[RunnerResult], base_path: &Path) -> String {
    HtmlRenderer::new(base_path).render(results)
}

/// Deterministic HTML renderer for finalized runner results
pub struct HtmlRenderer<'a> {
    base_path: &'a Path,
    screenshot_dir: Option<&'a Path>,
}

impl<'a> HtmlRenderer<'a> {
    pub fn new(base_path: &'a Path) -> Self {
        Self {
            base_path,
            screenshot_dir: None,
        }
    }

    /// Directory that relative screenshot filenames are recorded against
    pub fn with_screenshot_dir(mut self, dir: &'a Path) -> Self {
        self.screenshot_dir = Some(dir);
        self
    }

    pub fn render(&self, results: &[RunnerResult]) -> String {
        let mut results_html = String::new();
        for result in results {
            results_html.push_str(&self.render_result(result));
        }

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width">
    <title>HTML Report</title>
    <style>{STYLE}</style>
</head>
<body>
    <main>
{results_html}
    </main>
</body>
</html>
"#
        )
    }

    fn render_result(&self, result: &RunnerResult) -> String {
        let counts = &result.runner_tests_number;
        let class = if result.is_failing() {
            "result failing-result"
        } else {
            "result"
        };

        let mut suites_html = String::new();
        for suite in &result.suites {
            suites_html.push_str(&self.render_suite(suite));
        }

        format!(
            r#"        <div class="{class}">
            <h1><code>{cid}</code></h1>
            <span>{passing} Passing </span>
            <span>{pending} Pending </span>
            <span>{failing} Failing </span>
            <p>Capabilities</p>
            <div><pre>{capabilities}</pre></div>
{suites_html}        </div>
"#,
            cid = html_escape(&result.cid),
            passing = counts.passing,
            pending = counts.pending,
            failing = counts.failing,
            capabilities = html_escape(&pretty_json(&result.capabilities)),
        )
    }

    fn render_suite(&self, suite: &SuiteStats) -> String {
        let mut rows_html = String::new();
        for test in suite.tests() {
            rows_html.push_str(&self.render_test(test));
        }

        format!(
            r#"            <div class="suite">
                <h2>{title}</h2>
                <table>
                    <tbody>
{rows_html}                    </tbody>
                </table>
            </div>
"#,
            title = html_escape(&suite.title),
        )
    }

    fn render_test(&self, test: &TestStats) -> String {
        let mut details = String::new();
        if let Some(error) = &test.error {
            details.push_str(&render_error(error));
        }
        if let Some(messages) = test.console_output() {
            details.push_str(&render_console(&messages));
        }
        for screenshot in test.screenshots() {
            details.push_str(&format!(
                r#"<img src="{}">"#,
                html_escape(&self.screenshot_src(screenshot))
            ));
        }

        format!(
            r#"                        <tr class="{state}">
                            <td>{icon}</td>
                            <td><p><b>{title}</b></p><p class="fade">{duration}ms</p></td>
                            <td>{details}</td>
                        </tr>
"#,
            state = html_escape(test.state.as_str()),
            icon = state_icon(&test.state),
            title = html_escape(&test.title),
            duration = test.duration,
        )
    }

    fn screenshot_src(&self, recorded: &str) -> String {
        let path = Path::new(recorded);
        match self.screenshot_dir {
            Some(dir) if path.is_relative() => relative_path(self.base_path, &dir.join(path)),
            _ => relative_path(self.base_path, path),
        }
    }
}

fn render_error(error: &TestError) -> String {
    format!(
        r#"<div class="error"><p><b>{}</b></p><p>{}</p><p>Expected <code>{}</code></p><p>Actual <code>{}</code></p><pre>{}</pre></div>"#,
        html_escape(&error.error_type),
        html_escape(&error.message),
        html_escape(error.expected.as_deref().unwrap_or_default()),
        html_escape(error.actual.as_deref().unwrap_or_default()),
        html_escape(&error.stack),
    )
}

fn render_console(messages: &[ConsoleMessage]) -> String {
    if messages.is_empty() {
        return String::new();
    }

    let mut rows = String::new();
    for message in messages {
        rows.push_str(&format!(
            r#"<tr class="{}"><td>{}</td><td>{}</td></tr>"#,
            html_escape(message.level.as_str()),
            level_icon(&message.level),
            html_escape(&message.message)
        ));
    }

    format!(
        r#"<p><b>Browser console output</b></p><table class="mono"><tbody>{rows}</tbody></table>"#
    )
}

fn state_icon(state: &TestState) -> &'static str {
    match state {
        TestState::Pass => "✅",
        TestState::Fail => "❌",
        TestState::Pending => "⏸",
        TestState::Other(_) => "",
    }
}

fn level_icon(level: &ConsoleLevel) -> &'static str {
    match level {
        ConsoleLevel::Warning => "⚠️",
        ConsoleLevel::Severe => "❌",
        ConsoleLevel::Info => "ℹ️",
        ConsoleLevel::Other(_) => "",
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// JSON with four-space indentation
fn pretty_json(value: &Value) -> String {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    if value.serialize(&mut serializer).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
