//! Result reporting
//!
//! The engine emits each finished [`TestResult`] to a sink exactly
//! once, in plan order, and makes no assumption about where it goes:
//! console, log file, or a display driver all fit behind the same
//! trait.

use crate::verifier::TestResult;
use crate::{log_error, log_info, log_warn};

/// Consumer of finished test results
pub trait ReportSink {
    /// Called once per completed test, in sequence order
    fn emit(&mut self, result: &TestResult);
}

/// Sink that renders results through the crate's log macros
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    /// Create a log-backed sink
    pub fn new() -> Self {
        Self
    }
}

impl ReportSink for LogSink {
    fn emit(&mut self, result: &TestResult) {
        match result.detail() {
            None => {
                log_info!(
                    "{}: {} ({} attempt(s))",
                    result.name(),
                    result.verdict().as_str(),
                    result.attempt_count()
                );
            }
            Some(_) => {
                // Fail gets the loud channel; Inconclusive is a
                // missing-hardware situation more often than a defect
                match result.verdict() {
                    crate::verifier::Verdict::Fail => {
                        log_error!(
                            "{}: {} after {} attempt(s)",
                            result.name(),
                            result.verdict().as_str(),
                            result.attempt_count()
                        );
                    }
                    _ => {
                        log_warn!(
                            "{}: {}",
                            result.name(),
                            result.verdict().as_str()
                        );
                    }
                }
            }
        }
    }
}

/// Bounded in-memory sink for host tests
#[cfg(any(test, feature = "mock"))]
#[derive(Debug, Default)]
pub struct MemorySink {
    results: heapless::Vec<TestResult, { crate::sequencer::MAX_PLAN_TESTS }>,
}

#[cfg(any(test, feature = "mock"))]
impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self {
            results: heapless::Vec::new(),
        }
    }

    /// Everything emitted so far, in emission order
    pub fn results(&self) -> &[TestResult] {
        &self.results
    }
}

#[cfg(any(test, feature = "mock"))]
impl ReportSink for MemorySink {
    fn emit(&mut self, result: &TestResult) {
        let _ = self.results.push(result.clone());
    }
}
