//! Test plan execution
//!
//! The sequencer walks an ordered plan, runs each test through the
//! verifier, and emits one result per completed test in plan order.
//! Execution is strictly sequential: the peripherals under test share
//! electrical resources, so interleaving risks false failures. One
//! test's fault never aborts the run; a test whose adapter is missing
//! or whose setup is broken is recorded Inconclusive and the plan
//! moves on.

use crate::cancel::CancelFlag;
use crate::channel::{AdapterVariant, ChannelAdapter, ChannelConfig};
use crate::report::ReportSink;
use crate::stimulus::PatternSpec;
use crate::verifier::{verify, FailDetail, TestResult};
use crate::{log_info, log_warn};
use heapless::Vec;

/// Upper bound on plan length
pub const MAX_PLAN_TESTS: usize = 16;

/// One entry of a test plan
///
/// All fields are primitive-typed or plain enums, so a plan
/// round-trips losslessly through any human-readable serialization.
/// This is the only shape the engine expects from the outside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestSpec {
    /// Operator-facing test name
    pub name: &'static str,
    /// Channel configuration; its variant selects the adapter
    pub config: ChannelConfig,
    /// Stimulus to generate for every attempt
    pub pattern: PatternSpec,
    /// Per-attempt timeout budget
    pub timeout_us: u64,
    /// Retry budget
    pub max_attempts: u8,
}

/// Provides the adapter wired to each variant on this board
///
/// The host assembles one bank per board revision; returning `None`
/// for a variant marks that peripheral as absent, which the sequencer
/// records as Inconclusive rather than a fault.
pub trait AdapterBank {
    /// The adapter for a variant, if this board has one
    fn adapter_for(&mut self, variant: AdapterVariant) -> Option<&mut dyn ChannelAdapter>;
}

/// Run a test plan to completion
///
/// Results come back in plan order, one per executed spec, and each is
/// emitted to `sink` as soon as it is final. An operator abort stops
/// the run at the next test boundary (the in-flight test finalizes
/// first, via the verifier's own cancellation point).
pub fn run_plan(
    plan: &[TestSpec],
    bank: &mut dyn AdapterBank,
    sink: &mut dyn ReportSink,
    cancel: &CancelFlag,
) -> Vec<TestResult, MAX_PLAN_TESTS> {
    let mut results: Vec<TestResult, MAX_PLAN_TESTS> = Vec::new();

    for spec in plan {
        if cancel.is_cancelled() {
            log_warn!(
                "run aborted by operator; {} test(s) not run",
                plan.len() - results.len()
            );
            break;
        }
        if results.is_full() {
            log_warn!("plan exceeds {} tests; remainder skipped", MAX_PLAN_TESTS);
            break;
        }

        log_info!("running {}", spec.name);
        let result = match bank.adapter_for(spec.config.variant()) {
            Some(adapter) => verify(
                adapter,
                spec.name,
                &spec.config,
                &spec.pattern,
                spec.timeout_us,
                spec.max_attempts,
                cancel,
            ),
            None => TestResult::inconclusive(
                spec.name,
                FailDetail::Unavailable {
                    reason: "no adapter registered for this variant",
                },
            ),
        };

        log_info!("{}: {}", spec.name, result.verdict().as_str());
        sink.emit(&result);
        let _ = results.push(result);
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{
        GpioPairAdapter, GpioPairConfig, UartEchoAdapter, UartEchoConfig,
    };
    use crate::report::MemorySink;
    use crate::stimulus::PatternKind;
    use crate::transport::mock::{MockClock, MockPinPair, MockSerial, SerialBehavior};
    use crate::verifier::Verdict;

    struct TestBank {
        gpio: GpioPairAdapter<MockPinPair, MockClock>,
        uart: UartEchoAdapter<MockSerial, MockClock>,
        have_uart: bool,
    }

    impl TestBank {
        fn new() -> Self {
            Self {
                gpio: GpioPairAdapter::new(MockPinPair::wired(), MockClock::new()),
                uart: UartEchoAdapter::new(
                    MockSerial::new(SerialBehavior::Echo),
                    MockClock::new(),
                ),
                have_uart: true,
            }
        }
    }

    impl AdapterBank for TestBank {
        fn adapter_for(&mut self, variant: AdapterVariant) -> Option<&mut dyn ChannelAdapter> {
            match variant {
                AdapterVariant::GpioPair => Some(&mut self.gpio),
                AdapterVariant::Uart if self.have_uart => Some(&mut self.uart),
                _ => None,
            }
        }
    }

    fn gpio_spec(name: &'static str) -> TestSpec {
        TestSpec {
            name,
            config: ChannelConfig::GpioPair(GpioPairConfig {
                settle_us: 10,
                ..Default::default()
            }),
            pattern: PatternSpec {
                kind: PatternKind::Alternating,
                len: 8,
            },
            timeout_us: 50_000,
            max_attempts: 3,
        }
    }

    fn uart_spec(name: &'static str) -> TestSpec {
        TestSpec {
            name,
            config: ChannelConfig::Uart(UartEchoConfig::default()),
            pattern: PatternSpec {
                kind: PatternKind::PseudoRandom(3),
                len: 16,
            },
            timeout_us: 50_000,
            max_attempts: 3,
        }
    }

    #[test]
    fn test_results_in_plan_order() {
        let mut bank = TestBank::new();
        let mut sink = MemorySink::new();
        let cancel = CancelFlag::new();

        let plan = [uart_spec("uart echo"), gpio_spec("gpio pair")];
        let results = run_plan(&plan, &mut bank, &mut sink, &cancel);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name(), "uart echo");
        assert_eq!(results[1].name(), "gpio pair");
        assert_eq!(results[0].verdict(), Verdict::Pass);
        assert_eq!(results[1].verdict(), Verdict::Pass);
        assert_eq!(sink.results().len(), 2);
    }

    #[test]
    fn test_missing_adapter_does_not_abort_run() {
        let mut bank = TestBank::new();
        bank.have_uart = false;
        let mut sink = MemorySink::new();
        let cancel = CancelFlag::new();

        let plan = [uart_spec("uart echo"), gpio_spec("gpio pair")];
        let results = run_plan(&plan, &mut bank, &mut sink, &cancel);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].verdict(), Verdict::Inconclusive);
        // The faulty first test did not stop the second
        assert_eq!(results[1].verdict(), Verdict::Pass);
    }

    #[test]
    fn test_one_failing_test_does_not_stop_the_rest() {
        let mut bank = TestBank::new();
        bank.uart = UartEchoAdapter::new(
            MockSerial::new(SerialBehavior::DropLast),
            MockClock::new(),
        );
        let mut sink = MemorySink::new();
        let cancel = CancelFlag::new();

        let plan = [uart_spec("bad uart"), gpio_spec("gpio pair")];
        let results = run_plan(&plan, &mut bank, &mut sink, &cancel);

        assert_eq!(results[0].verdict(), Verdict::Fail);
        assert_eq!(results[0].attempt_count(), 3);
        assert_eq!(results[1].verdict(), Verdict::Pass);
    }

    #[test]
    fn test_cancel_stops_at_test_boundary() {
        let mut bank = TestBank::new();
        let mut sink = MemorySink::new();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let plan = [uart_spec("uart echo"), gpio_spec("gpio pair")];
        let results = run_plan(&plan, &mut bank, &mut sink, &cancel);

        assert!(results.is_empty());
        assert!(sink.results().is_empty());
    }

    #[test]
    fn test_empty_plan_is_empty_run() {
        let mut bank = TestBank::new();
        let mut sink = MemorySink::new();
        let cancel = CancelFlag::new();

        let results = run_plan(&[], &mut bank, &mut sink, &cancel);
        assert!(results.is_empty());
    }
}
