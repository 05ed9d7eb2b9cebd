//! Run orchestration: pattern selection through header output, plus
//! dependency discovery and the missing-source report.

pub mod discovery;
pub mod orchestrator;
pub mod types;

pub use discovery::{fixed_point, Discovery};
pub use orchestrator::{header_path_for, run, write_missing_log, RunContext};
pub use types::{GeneratedHeader, RunStatus, RunSummary, ScriptOutcome};

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
