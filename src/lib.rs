#![cfg_attr(not(test), no_std)]

//! boardtest - loopback/echo verification engine for dev-board bring-up
//!
//! This library provides the shared protocol used by every factory
//! diagnostic that proves data integrity across a round trip: GPIO
//! pin-pair toggling, UART echo, CAN controller self-loopback, and BLE
//! echo-back. It generates deterministic stimulus patterns, drives a
//! channel adapter under a timing budget, classifies transient vs.
//! persistent failures, and aggregates per-test verdicts into a report.
//!
//! Low-level driver bindings plug in underneath via the traits in
//! [`transport::traits`]; everything above them is hardware-independent
//! and runs unmodified against the simulated transports in
//! [`transport::mock`].

// Error taxonomy shared by transports, adapters, and the verifier
pub mod error;

// Logging macros (defmt on target, println in host tests)
pub mod logging;

// Deterministic stimulus pattern generation
pub mod stimulus;

// Operator abort flag
pub mod cancel;

// Low-level transport seams and their simulated counterparts
pub mod transport;

// Channel adapters: the uniform acquire/transact/release contract
pub mod channel;

// Loopback verification: attempts, retry policy, verdicts
pub mod verifier;

// Test plan execution
pub mod sequencer;

// Result reporting
pub mod report;

// Re-export commonly used types
pub use cancel::CancelFlag;
pub use channel::{Channel, ChannelAdapter, ChannelCaps, ChannelConfig, Transfer};
pub use error::{BusFault, ChannelError, Result};
pub use report::ReportSink;
pub use sequencer::{run_plan, AdapterBank, TestSpec};
pub use stimulus::{Pattern, PatternKind, PatternSpec};
pub use verifier::{verify, Attempt, AttemptOutcome, TestResult, Verdict};
