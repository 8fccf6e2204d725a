use super::state::ResultAggregator;
use super::stats::StatsStore;
use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

/// Runner lifecycle events, named as the host test runner emits them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ReporterEvent {
    #[serde(rename = "runner:start", rename_all = "camelCase")]
    RunnerStart {
        cid: String,
        #[serde(default)]
        specs: Vec<String>,
        #[serde(default)]
        capabilities: Value,
        spec_hash: String,
    },

    #[serde(rename = "runner:end", rename_all = "camelCase")]
    RunnerEnd { cid: String, spec_hash: String },

    #[serde(rename = "test:pass")]
    TestPass { cid: String },

    #[serde(rename = "test:fail")]
    TestFail { cid: String },

    #[serde(rename = "test:pending")]
    TestPending { cid: String },
}

impl ReporterEvent {
    pub fn cid(&self) -> &str {
        match self {
            ReporterEvent::RunnerStart { cid, .. }
            | ReporterEvent::RunnerEnd { cid, .. }
            | ReporterEvent::TestPass { cid }
            | ReporterEvent::TestFail { cid }
            | ReporterEvent::TestPending { cid } => cid,
        }
    }
}

/// Event emitter shared by all workers.
///
/// Every clone feeds the same queue, so a single listener sees each
/// worker's events in the order that worker sent them.
#[derive(Clone)]
pub struct EventEmitter {
    sender: mpsc::UnboundedSender<ReporterEvent>,
}

impl EventEmitter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ReporterEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Queue an event. Returns false when the listener has already stopped
    /// and the event was dropped.
    pub fn emit(&self, event: ReporterEvent) -> bool {
        match self.sender.send(event) {
            Ok(()) => true,
            Err(mpsc::error::SendError(event)) => {
                log::debug!(
                    "Listener closed, dropping event for runner {}",
                    event.cid()
                );
                false
            }
        }
    }
}

/// Applies queued events to an aggregator
pub struct ResultListener;

impl ResultListener {
    /// Drain the queue until every emitter is dropped.
    ///
    /// Stops at the first event that violates the runner ordering contract.
    pub async fn listen(
        mut receiver: mpsc::UnboundedReceiver<ReporterEvent>,
        aggregator: &mut ResultAggregator,
        stats: &dyn StatsStore,
    ) -> Result<(), ReportError> {
        while let Some(event) = receiver.recv().await {
            if let Err(err) = aggregator.apply(event, stats) {
                log::warn!("Rejected runner event: {}", err);
                return Err(err);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::stats::ReporterStats;
    use serde_json::json;

    fn stats() -> ReporterStats {
        serde_json::from_value(json!({
            "runners": {
                "0-0": { "specs": { "h0": { "suites": {
                    "s": { "title": "S", "tests": { "t": { "title": "x", "state": "pass", "duration": 1 } } }
                } } } },
                "0-1": { "specs": { "h1": { "suites": {} } } }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_host_events() {
        let start: ReporterEvent = serde_json::from_str(
            r#"{"event":"runner:start","cid":"0-0","specs":["/a.js"],"capabilities":{"browserName":"chrome"},"specHash":"h0","uid":"ignored"}"#,
        )
        .unwrap();
        assert_eq!(
            start,
            ReporterEvent::RunnerStart {
                cid: "0-0".to_string(),
                specs: vec!["/a.js".to_string()],
                capabilities: json!({ "browserName": "chrome" }),
                spec_hash: "h0".to_string(),
            }
        );

        let end: ReporterEvent =
            serde_json::from_str(r#"{"event":"runner:end","cid":"0-0","specHash":"h0","failures":1}"#)
                .unwrap();
        assert_eq!(end.cid(), "0-0");

        let fail: ReporterEvent =
            serde_json::from_str(r#"{"event":"test:fail","cid":"0-3","title":"x"}"#).unwrap();
        assert_eq!(
            fail,
            ReporterEvent::TestFail {
                cid: "0-3".to_string()
            }
        );

        assert!(serde_json::from_str::<ReporterEvent>(r#"{"event":"suite:start","cid":"0-0"}"#).is_err());
    }

    #[tokio::test]
    async fn test_listener_applies_interleaved_workers() {
        let (emitter, receiver) = EventEmitter::new();
        let worker_a = emitter.clone();
        let worker_b = emitter.clone();
        drop(emitter);

        let a = tokio::spawn(async move {
            worker_a.emit(ReporterEvent::RunnerStart {
                cid: "0-0".to_string(),
                specs: vec![],
                capabilities: json!({}),
                spec_hash: "h0".to_string(),
            });
            tokio::task::yield_now().await;
            worker_a.emit(ReporterEvent::TestPass {
                cid: "0-0".to_string(),
            });
            worker_a.emit(ReporterEvent::RunnerEnd {
                cid: "0-0".to_string(),
                spec_hash: "h0".to_string(),
            });
        });
        let b = tokio::spawn(async move {
            worker_b.emit(ReporterEvent::RunnerStart {
                cid: "0-1".to_string(),
                specs: vec![],
                capabilities: json!({}),
                spec_hash: "h1".to_string(),
            });
            tokio::task::yield_now().await;
            worker_b.emit(ReporterEvent::TestPending {
                cid: "0-1".to_string(),
            });
            worker_b.emit(ReporterEvent::TestFail {
                cid: "0-1".to_string(),
            });
            worker_b.emit(ReporterEvent::RunnerEnd {
                cid: "0-1".to_string(),
                spec_hash: "h1".to_string(),
            });
        });
        a.await.unwrap();
        b.await.unwrap();

        let stats = stats();
        let mut aggregator = ResultAggregator::new();
        ResultListener::listen(receiver, &mut aggregator, &stats)
            .await
            .unwrap();

        let first = aggregator.runner("0-0").unwrap();
        assert_eq!(first.runner_tests_number.passing, 1);
        assert_eq!(first.suites.len(), 1);

        let second = aggregator.runner("0-1").unwrap();
        assert_eq!(second.runner_tests_number.pending, 1);
        assert_eq!(second.runner_tests_number.failing, 1);
        assert!(second.suites.is_empty());
    }

    #[test]
    fn test_emit_after_listener_closed() {
        let (emitter, receiver) = EventEmitter::new();
        assert!(emitter.emit(ReporterEvent::TestPass {
            cid: "0-0".to_string(),
        }));

        drop(receiver);
        assert!(!emitter.emit(ReporterEvent::TestFail {
            cid: "0-0".to_string(),
        }));
    }

    #[tokio::test]
    async fn test_listener_stops_on_unknown_runner() {
        let (emitter, receiver) = EventEmitter::new();
        emitter.emit(ReporterEvent::TestPass {
            cid: "7-7".to_string(),
        });
        drop(emitter);

        let mut aggregator = ResultAggregator::new();
        let err = ResultListener::listen(receiver, &mut aggregator, &stats())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ReportError::RunnerNotFound {
                cid: "7-7".to_string()
            }
        );
    }
}
