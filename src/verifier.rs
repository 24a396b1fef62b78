//! Loopback verification
//!
//! Drives one channel adapter with a deterministic stimulus under a
//! retry budget and classifies the outcome. The verifier absorbs every
//! transient failure (mismatch, timeout, bus fault) into its retry
//! loop and only ever returns a finished [`TestResult`]; nothing
//! escapes its boundary.
//!
//! Retries reuse the same stimulus: a retry probes transient bus
//! behavior, not new data. An unavailable channel is never retried,
//! because hardware absence is not a transient condition.

use crate::cancel::CancelFlag;
use crate::channel::{ChannelAdapter, ChannelConfig, TransferUnit};
use crate::error::{BusFault, ChannelError};
use crate::stimulus::{Pattern, PatternSpec, MAX_PATTERN_LEN};
use crate::{log_debug, log_info};
use core::fmt;
use heapless::Vec;

/// How many attempt records a result retains
///
/// The attempt counter is exact even when a pathological retry budget
/// overflows this log.
pub const MAX_ATTEMPT_LOG: usize = 8;

/// How many received units each attempt record keeps for diagnostics
pub const RECEIVED_PREFIX_LEN: usize = 32;

/// Final classification of a test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verdict {
    /// At least one attempt matched within the retry budget
    Pass,
    /// Every attempt in the budget ended in mismatch/timeout/bus fault
    Fail,
    /// The channel could not be acquired, the setup was invalid, or
    /// the operator aborted; data integrity was never established
    Inconclusive,
}

impl Verdict {
    /// Operator-facing verdict string
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
            Verdict::Inconclusive => "INCONCLUSIVE",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified outcome of one stimulus/response cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Response matched the stimulus unit-for-unit
    Match,
    /// Response diverged; index of the first differing unit
    Mismatch {
        /// First unit where sent and received differ (equals the
        /// received length when a short response matched up to its end)
        first_divergence: usize,
    },
    /// No response arrived within the timeout budget
    Timeout,
    /// The adapter reported an error from the declared taxonomy
    ChannelError(ChannelError),
}

/// One stimulus/response cycle
#[derive(Debug, Clone)]
pub struct Attempt {
    outcome: AttemptOutcome,
    elapsed_us: u64,
    received_len: usize,
    received_prefix: Vec<u8, RECEIVED_PREFIX_LEN>,
}

impl Attempt {
    fn new(outcome: AttemptOutcome, elapsed_us: u64, received: &[u8]) -> Self {
        let mut prefix = Vec::new();
        let take = received.len().min(RECEIVED_PREFIX_LEN);
        let _ = prefix.extend_from_slice(&received[..take]);
        Self {
            outcome,
            elapsed_us,
            received_len: received.len(),
            received_prefix: prefix,
        }
    }

    /// Classified outcome
    pub fn outcome(&self) -> AttemptOutcome {
        self.outcome
    }

    /// Wall time this attempt took
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us
    }

    /// Total units received (possibly more than the stored prefix)
    pub fn received_len(&self) -> usize {
        self.received_len
    }

    /// Leading units of the response, for diagnostics
    pub fn received_prefix(&self) -> &[u8] {
        &self.received_prefix
    }
}

/// Diagnostic detail attached to a Fail or Inconclusive verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailDetail {
    /// Data round-tripped but diverged at this unit index (from the
    /// final attempt)
    Divergence {
        /// Index of the first differing unit
        index: usize,
    },
    /// No response within the timeout budget
    Timeout,
    /// Hardware-signaled bus fault
    Bus(BusFault),
    /// Channel could not be opened or configured
    Unavailable {
        /// Why acquisition failed
        reason: &'static str,
    },
    /// Operator aborted between attempts
    Cancelled,
    /// Test setup was invalid (bad length or configuration)
    Setup {
        /// What was wrong
        reason: &'static str,
    },
}

impl fmt::Display for FailDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailDetail::Divergence { index } => {
                write!(f, "data diverged at unit {}", index)
            }
            FailDetail::Timeout => write!(f, "no response within budget"),
            FailDetail::Bus(fault) => write!(f, "bus fault: {:?}", fault),
            FailDetail::Unavailable { reason } => {
                write!(f, "channel unavailable: {}", reason)
            }
            FailDetail::Cancelled => write!(f, "aborted by operator"),
            FailDetail::Setup { reason } => write!(f, "setup error: {}", reason),
        }
    }
}

/// Aggregated result of one test under the retry policy
///
/// Immutable once the verifier finalizes it; the sequencer and report
/// sinks only ever read it.
#[derive(Debug, Clone)]
pub struct TestResult {
    name: &'static str,
    verdict: Verdict,
    attempt_count: u8,
    attempts: Vec<Attempt, MAX_ATTEMPT_LOG>,
    detail: Option<FailDetail>,
    pattern: Option<Pattern>,
}

impl TestResult {
    pub(crate) fn inconclusive(name: &'static str, detail: FailDetail) -> Self {
        Self {
            name,
            verdict: Verdict::Inconclusive,
            attempt_count: 0,
            attempts: Vec::new(),
            detail: Some(detail),
            pattern: None,
        }
    }

    /// Test name from the plan
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Final verdict
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// How many attempts ran (a failed acquisition counts as one)
    pub fn attempt_count(&self) -> u8 {
        self.attempt_count
    }

    /// Recorded attempts, oldest first
    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    /// Diagnostic detail; present on Fail and Inconclusive
    pub fn detail(&self) -> Option<FailDetail> {
        self.detail
    }

    /// The stimulus pattern used, if setup got that far
    pub fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }

    /// Sum of attempt wall times
    pub fn total_elapsed_us(&self) -> u64 {
        self.attempts.iter().map(|a| a.elapsed_us).sum()
    }

    /// Slowest recorded attempt
    pub fn max_elapsed_us(&self) -> Option<u64> {
        self.attempts.iter().map(|a| a.elapsed_us).max()
    }
}

/// Index of the first unit where `received` diverges from `sent`
///
/// A short response diverges at its own length (never padded or
/// assumed equal); extra trailing data diverges at the sent length.
/// `Levels` channels compare the LSB of each unit.
pub fn first_divergence(sent: &[u8], received: &[u8], unit: TransferUnit) -> Option<usize> {
    let common = sent.len().min(received.len());
    for i in 0..common {
        let equal = match unit {
            TransferUnit::Bytes => sent[i] == received[i],
            TransferUnit::Levels => (sent[i] & 1) == (received[i] & 1),
        };
        if !equal {
            return Some(i);
        }
    }
    if received.len() != sent.len() {
        Some(common)
    } else {
        None
    }
}

/// Run one loopback test: acquire, stimulate, compare, retry, release.
///
/// Never returns an error; every path ends in a finished [`TestResult`]
/// and the channel released. See the module docs for the retry policy.
pub fn verify(
    adapter: &mut dyn ChannelAdapter,
    name: &'static str,
    config: &ChannelConfig,
    pattern_spec: &PatternSpec,
    timeout_us: u64,
    max_attempts: u8,
    cancel: &CancelFlag,
) -> TestResult {
    let mut attempts: Vec<Attempt, MAX_ATTEMPT_LOG> = Vec::new();
    let mut attempt_count: u8 = 0;
    let mut verdict = Verdict::Fail;
    let mut detail: Option<FailDetail> = None;

    if max_attempts == 0 {
        return TestResult::inconclusive(
            name,
            FailDetail::Setup {
                reason: "max_attempts must be nonzero",
            },
        );
    }

    let pattern = match pattern_spec.generate() {
        Ok(pattern) => pattern,
        Err(_) => {
            return TestResult::inconclusive(
                name,
                FailDetail::Setup {
                    reason: "pattern length out of range",
                },
            );
        }
    };

    let mut rx = [0u8; MAX_PATTERN_LEN];
    let mut held = None;
    let mut unit = TransferUnit::Bytes;

    for _ in 0..max_attempts {
        // Operator abort honored at every attempt boundary
        if cancel.is_cancelled() {
            log_info!("{}: aborted by operator", name);
            verdict = Verdict::Inconclusive;
            detail = Some(FailDetail::Cancelled);
            break;
        }

        // Acquire on the first attempt, and again if a previous attempt
        // lost the channel; a failed (re-)acquire ends the test
        if held.is_none() {
            match adapter.acquire(config) {
                Ok(channel) => {
                    if pattern.len() > channel.caps().max_transfer_len {
                        adapter.release(channel);
                        attempt_count = attempt_count.saturating_add(1);
                        verdict = Verdict::Inconclusive;
                        detail = Some(FailDetail::Setup {
                            reason: "pattern exceeds channel capability",
                        });
                        break;
                    }
                    unit = channel.caps().unit;
                    held = Some(channel);
                }
                Err(ChannelError::InvalidConfig { reason }) => {
                    attempt_count = attempt_count.saturating_add(1);
                    verdict = Verdict::Inconclusive;
                    detail = Some(FailDetail::Setup { reason });
                    break;
                }
                Err(ChannelError::Unavailable { reason }) => {
                    attempt_count = attempt_count.saturating_add(1);
                    verdict = Verdict::Inconclusive;
                    detail = Some(FailDetail::Unavailable { reason });
                    break;
                }
                Err(_) => {
                    attempt_count = attempt_count.saturating_add(1);
                    verdict = Verdict::Inconclusive;
                    detail = Some(FailDetail::Unavailable {
                        reason: "bus fault during acquisition",
                    });
                    break;
                }
            }
        }
        let Some(channel) = held.as_mut() else {
            break;
        };

        attempt_count = attempt_count.saturating_add(1);
        let tx = pattern.data();
        match adapter.transact(channel, tx, &mut rx[..tx.len()], timeout_us) {
            Ok(transfer) => {
                let received = &rx[..transfer.len.min(tx.len())];
                match first_divergence(tx, received, unit) {
                    None => {
                        let _ = attempts.push(Attempt::new(
                            AttemptOutcome::Match,
                            transfer.elapsed_us,
                            received,
                        ));
                        verdict = Verdict::Pass;
                        detail = None;
                        break;
                    }
                    Some(index) => {
                        log_debug!(
                            "{}: mismatch at unit {} (attempt {})",
                            name,
                            index,
                            attempt_count
                        );
                        let _ = attempts.push(Attempt::new(
                            AttemptOutcome::Mismatch {
                                first_divergence: index,
                            },
                            transfer.elapsed_us,
                            received,
                        ));
                        detail = Some(FailDetail::Divergence { index });
                    }
                }
            }
            Err(ChannelError::Timeout) => {
                log_debug!("{}: timeout (attempt {})", name, attempt_count);
                let _ = attempts.push(Attempt::new(AttemptOutcome::Timeout, timeout_us, &[]));
                detail = Some(FailDetail::Timeout);
            }
            Err(ChannelError::Bus(fault)) => {
                let _ = attempts.push(Attempt::new(
                    AttemptOutcome::ChannelError(ChannelError::Bus(fault)),
                    0,
                    &[],
                ));
                detail = Some(FailDetail::Bus(fault));
            }
            Err(error @ ChannelError::Unavailable { reason }) => {
                // Link dropped mid-transfer: give the channel back and
                // re-acquire on the next attempt
                let _ = attempts.push(Attempt::new(
                    AttemptOutcome::ChannelError(error),
                    0,
                    &[],
                ));
                detail = Some(FailDetail::Unavailable { reason });
                if let Some(channel) = held.take() {
                    adapter.release(channel);
                }
            }
            Err(ChannelError::InvalidConfig { reason }) => {
                let _ = attempts.push(Attempt::new(
                    AttemptOutcome::ChannelError(ChannelError::InvalidConfig { reason }),
                    0,
                    &[],
                ));
                verdict = Verdict::Inconclusive;
                detail = Some(FailDetail::Setup { reason });
                break;
            }
        }
    }

    // Release runs on every exit path of the loop above
    if let Some(channel) = held.take() {
        adapter.release(channel);
    }

    TestResult {
        name,
        verdict,
        attempt_count,
        attempts,
        detail,
        pattern: Some(pattern),
    }
}
