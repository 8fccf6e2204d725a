pub mod error;
pub mod report;
pub mod runner;
pub mod utils;

// Re-export common items
pub use error::ReportError;
pub use report::{generate_report, ReportFormat};
pub use runner::{ResultAggregator, RunnerResult};
