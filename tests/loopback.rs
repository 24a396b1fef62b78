//! End-to-end loopback scenarios against the simulated transports
//!
//! These mirror the bench setups the harness is built for: a healthy
//! board with tie wires in place, a board with a marginal connection
//! dropping data, and a board with a peripheral missing outright.

use boardtest::cancel::CancelFlag;
use boardtest::channel::{
    AdapterVariant, BleEchoAdapter, BleEchoConfig, CanLoopbackAdapter, CanLoopbackConfig,
    ChannelAdapter, ChannelConfig, GpioPairAdapter, GpioPairConfig, UartEchoAdapter,
    UartEchoConfig,
};
use boardtest::report::MemorySink;
use boardtest::sequencer::{run_plan, AdapterBank, TestSpec};
use boardtest::stimulus::{PatternKind, PatternSpec};
use boardtest::transport::mock::{
    MockBle, MockCan, MockClock, MockPinPair, MockSerial, SerialBehavior,
};
use boardtest::transport::traits::PairDirection;
use boardtest::verifier::{FailDetail, Verdict};

/// A full board's worth of simulated adapters
struct SimBoard {
    gpio: GpioPairAdapter<MockPinPair, MockClock>,
    uart: UartEchoAdapter<MockSerial, MockClock>,
    can: CanLoopbackAdapter<MockCan, MockClock>,
    ble: BleEchoAdapter<MockBle, MockClock>,
}

impl SimBoard {
    fn healthy() -> Self {
        Self {
            gpio: GpioPairAdapter::new(MockPinPair::wired(), MockClock::new()),
            uart: UartEchoAdapter::new(MockSerial::new(SerialBehavior::Echo), MockClock::new()),
            can: CanLoopbackAdapter::new(MockCan::new(), MockClock::new()),
            ble: BleEchoAdapter::new(MockBle::new(), MockClock::new()),
        }
    }
}

impl AdapterBank for SimBoard {
    fn adapter_for(&mut self, variant: AdapterVariant) -> Option<&mut dyn ChannelAdapter> {
        match variant {
            AdapterVariant::GpioPair => Some(&mut self.gpio),
            AdapterVariant::Uart => Some(&mut self.uart),
            AdapterVariant::Can => Some(&mut self.can),
            AdapterVariant::Ble => Some(&mut self.ble),
        }
    }
}

fn gpio_spec() -> TestSpec {
    TestSpec {
        name: "gpio pair a->b",
        config: ChannelConfig::GpioPair(GpioPairConfig {
            settle_us: 100,
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

#[test]
fn healthy_gpio_pair_passes_on_first_attempt() {
    let mut board = SimBoard::healthy();
    let mut sink = MemorySink::new();
    let cancel = CancelFlag::new();

    let results = run_plan(&[gpio_spec()], &mut board, &mut sink, &cancel);

    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.verdict(), Verdict::Pass);
    assert_eq!(result.attempt_count(), 1);
    assert!(result.detail().is_none());
}

#[test]
fn uart_dropping_last_byte_fails_with_divergence_seven() {
    let mut board = SimBoard::healthy();
    board.uart =
        UartEchoAdapter::new(MockSerial::new(SerialBehavior::DropLast), MockClock::new());
    let mut sink = MemorySink::new();
    let cancel = CancelFlag::new();

    let plan = [TestSpec {
        name: "uart echo",
        config: ChannelConfig::Uart(UartEchoConfig::default()),
        pattern: PatternSpec {
            kind: PatternKind::Alternating,
            len: 8,
        },
        timeout_us: 50_000,
        max_attempts: 3,
    }];
    let results = run_plan(&plan, &mut board, &mut sink, &cancel);

    let result = &results[0];
    assert_eq!(result.verdict(), Verdict::Fail);
    assert_eq!(result.attempt_count(), 3);
    assert_eq!(result.detail(), Some(FailDetail::Divergence { index: 7 }));
    // Every recorded attempt saw the same 7-unit short echo
    for attempt in result.attempts() {
        assert_eq!(attempt.received_len(), 7);
    }
}

#[test]
fn cut_tie_wire_fails_alternating_pattern() {
    let mut board = SimBoard::healthy();
    board.gpio.pair_mut().set_wired(false);
    let mut sink = MemorySink::new();
    let cancel = CancelFlag::new();

    let results = run_plan(&[gpio_spec()], &mut board, &mut sink, &cancel);

    let result = &results[0];
    assert_eq!(result.verdict(), Verdict::Fail);
    assert_eq!(result.attempt_count(), 3);
    // Alternating starts with a high level; a floating input reads low,
    // so the very first unit diverges
    assert_eq!(result.detail(), Some(FailDetail::Divergence { index: 0 }));
}

#[test]
fn full_board_plan_all_pass() {
    let mut board = SimBoard::healthy();
    let mut sink = MemorySink::new();
    let cancel = CancelFlag::new();

    let plan = [
        gpio_spec(),
        TestSpec {
            name: "gpio pair b->a",
            config: ChannelConfig::GpioPair(GpioPairConfig {
                direction: PairDirection::BToA,
                settle_us: 100,
                ..Default::default()
            }),
            pattern: PatternSpec {
                kind: PatternKind::Alternating,
                len: 8,
            },
            timeout_us: 50_000,
            max_attempts: 3,
        },
        TestSpec {
            name: "uart echo",
            config: ChannelConfig::Uart(UartEchoConfig::default()),
            pattern: PatternSpec {
                kind: PatternKind::PseudoRandom(0xC0FF_EE00),
                len: 64,
            },
            timeout_us: 100_000,
            max_attempts: 3,
        },
        TestSpec {
            name: "can loopback",
            config: ChannelConfig::Can(CanLoopbackConfig::default()),
            pattern: PatternSpec {
                kind: PatternKind::PseudoRandom(0x5EED),
                len: 24,
            },
            timeout_us: 100_000,
            max_attempts: 3,
        },
        TestSpec {
            name: "ble echo",
            config: ChannelConfig::Ble(BleEchoConfig::default()),
            pattern: PatternSpec {
                kind: PatternKind::AllOnes,
                len: 32,
            },
            timeout_us: 200_000,
            max_attempts: 3,
        },
    ];

    let results = run_plan(&plan, &mut board, &mut sink, &cancel);

    assert_eq!(results.len(), 5);
    for result in results.iter() {
        assert_eq!(
            result.verdict(),
            Verdict::Pass,
            "{} did not pass",
            result.name()
        );
        assert_eq!(result.attempt_count(), 1);
    }
    // Sink saw the same results in the same order
    let names: Vec<&str> = sink.results().iter().map(|r| r.name()).collect();
    assert_eq!(
        names,
        [
            "gpio pair a->b",
            "gpio pair b->a",
            "uart echo",
            "can loopback",
            "ble echo"
        ]
    );
}

#[test]
fn missing_ble_module_is_inconclusive_and_run_continues() {
    let mut board = SimBoard::healthy();
    board.ble.link_mut().set_connectable(false);
    let mut sink = MemorySink::new();
    let cancel = CancelFlag::new();

    let plan = [
        TestSpec {
            name: "ble echo",
            config: ChannelConfig::Ble(BleEchoConfig {
                connect_timeout_us: 10_000,
                ..Default::default()
            }),
            pattern: PatternSpec {
                kind: PatternKind::AllZeros,
                len: 8,
            },
            timeout_us: 50_000,
            max_attempts: 5,
        },
        gpio_spec(),
    ];
    let results = run_plan(&plan, &mut board, &mut sink, &cancel);

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].verdict(), Verdict::Inconclusive);
    // Hardware absence is not retried
    assert_eq!(results[0].attempt_count(), 1);
    assert_eq!(results[1].verdict(), Verdict::Pass);
}

#[test]
fn can_normal_mode_falls_back_to_loopback_and_passes() {
    let mut board = SimBoard::healthy();
    let mut sink = MemorySink::new();
    let cancel = CancelFlag::new();

    let plan = [TestSpec {
        name: "can bus",
        config: ChannelConfig::Can(CanLoopbackConfig {
            loopback: false,
            auto_fallback: true,
            ..Default::default()
        }),
        pattern: PatternSpec {
            kind: PatternKind::PseudoRandom(1),
            len: 16,
        },
        timeout_us: 50_000,
        max_attempts: 3,
    }];
    let results = run_plan(&plan, &mut board, &mut sink, &cancel);

    assert_eq!(results[0].verdict(), Verdict::Pass);
    // Initial normal-mode bring-up plus the fallback reconfigure;
    // release then shuts the controller down again
    assert_eq!(board.can.controller().configure_count(), 2);
    assert!(board.can.controller().is_shutdown());
}

#[test]
fn release_runs_exactly_once_per_acquire_on_every_outcome() {
    fn run_and_check(behavior: SerialBehavior) {
        let mut adapter = UartEchoAdapter::new(MockSerial::new(behavior), MockClock::new());
        let cancel = CancelFlag::new();
        let _ = boardtest::verifier::verify(
            &mut adapter,
            "probe",
            &ChannelConfig::Uart(UartEchoConfig::default()),
            &PatternSpec {
                kind: PatternKind::Alternating,
                len: 8,
            },
            20_000,
            3,
            &cancel,
        );
        assert_eq!(adapter.port().open_count(), adapter.port().close_count());
        assert!(adapter.port().open_count() >= 1);
        assert!(!adapter.port().is_open());
    }

    run_and_check(SerialBehavior::Echo);
    run_and_check(SerialBehavior::CorruptAt(2));
    run_and_check(SerialBehavior::Silent);
    run_and_check(SerialBehavior::WriteFault(boardtest::error::BusFault::Framing));
    run_and_check(SerialBehavior::DropLast);
}

#[test]
fn cancellation_between_attempts_releases_held_channel() {
    // The abort lands while attempt 1's channel is still held: the
    // verifier must notice it at the next attempt boundary and release
    // on the way out
    struct AbortingUart<'a> {
        inner: UartEchoAdapter<MockSerial, MockClock>,
        flag: &'a CancelFlag,
    }

    impl ChannelAdapter for AbortingUart<'_> {
        fn variant(&self) -> boardtest::channel::AdapterVariant {
            self.inner.variant()
        }

        fn acquire(
            &mut self,
            config: &ChannelConfig,
        ) -> boardtest::error::Result<boardtest::channel::Channel> {
            self.inner.acquire(config)
        }

        fn transact(
            &mut self,
            channel: &mut boardtest::channel::Channel,
            tx: &[u8],
            rx: &mut [u8],
            timeout_us: u64,
        ) -> boardtest::error::Result<boardtest::channel::Transfer> {
            // Operator hits abort while the transaction is in flight
            self.flag.cancel();
            self.inner.transact(channel, tx, rx, timeout_us)
        }

        fn release(&mut self, channel: boardtest::channel::Channel) {
            self.inner.release(channel);
        }
    }

    let cancel = CancelFlag::new();
    let mut adapter = AbortingUart {
        inner: UartEchoAdapter::new(
            MockSerial::new(SerialBehavior::CorruptAt(0)),
            MockClock::new(),
        ),
        flag: &cancel,
    };

    let result = boardtest::verifier::verify(
        &mut adapter,
        "aborted uart",
        &ChannelConfig::Uart(UartEchoConfig::default()),
        &PatternSpec {
            kind: PatternKind::Alternating,
            len: 8,
        },
        20_000,
        3,
        &cancel,
    );

    assert_eq!(result.verdict(), Verdict::Inconclusive);
    assert_eq!(result.detail(), Some(FailDetail::Cancelled));
    // Attempt 1 ran; attempt 2 was stopped by the flag
    assert_eq!(result.attempt_count(), 1);
    // The held channel was still released exactly once
    assert_eq!(adapter.inner.port().open_count(), 1);
    assert_eq!(adapter.inner.port().close_count(), 1);
    assert!(!adapter.inner.port().is_open());
}

#[test]
fn cancellation_mid_run_releases_the_bus() {
    // Cancel after the first test completes: the second test never
    // starts and no transport is left configured
    let mut board = SimBoard::healthy();
    let mut sink = CancellingSink::new(&CANCEL);
    CANCEL.reset();

    let plan = [gpio_spec(), gpio_spec()];
    let results = run_plan(&plan, &mut board, &mut sink, &CANCEL);

    assert_eq!(results.len(), 1);
    assert_eq!(sink.seen, 1);
    assert!(board.gpio.pair().is_inert());
    assert_eq!(
        board.gpio.pair().configure_count(),
        board.gpio.pair().inert_count()
    );
}

static CANCEL: CancelFlag = CancelFlag::new();

/// Sink that aborts the run as soon as the first result lands
struct CancellingSink {
    flag: &'static CancelFlag,
    seen: usize,
}

impl CancellingSink {
    fn new(flag: &'static CancelFlag) -> Self {
        Self { flag, seen: 0 }
    }
}

impl boardtest::report::ReportSink for CancellingSink {
    fn emit(&mut self, _result: &boardtest::verifier::TestResult) {
        self.seen += 1;
        self.flag.cancel();
    }
}
