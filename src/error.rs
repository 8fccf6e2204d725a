use thiserror::Error;

/// Contract violations raised while aggregating runner events.
///
/// These indicate the host broke its ordering guarantees (start before any
/// other event for the same cid) or handed over an incomplete stats store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("Results with runner CID {cid} not found")]
    RunnerNotFound { cid: String },

    #[error("Runner CID {cid} was already started")]
    DuplicateRunner { cid: String },

    #[error("No stats recorded for runner CID {cid} with spec hash {spec_hash}")]
    StatsNotFound { cid: String, spec_hash: String },
}
