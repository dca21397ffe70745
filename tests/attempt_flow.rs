//! Full calibration-cycle tests over mock hardware.
//!
//! Every scenario drives the real sequencer, channel, codec and model with
//! a scripted serial transport and recording GPIO/indicator/sink mocks, so
//! the whole attempt runs exactly as it would on the fixture minus the
//! wires.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use tempcal::channel::BoundedSerialChannel;
use tempcal::config::FixtureConfig;
use tempcal::ports::{
    AttemptSink, FixtureGpio, IndicatorPanel, SerialTransport, TemperatureProbe, TransmitLine,
};
use tempcal::sequencer::{AttemptRecord, AttemptResult, Sequencer, StateId};
use tempcal::CalibrationFault;

// ---------------------------------------------------------------------------
// Mock hardware
// ---------------------------------------------------------------------------

/// Scripted transport: each entry is one `read_byte` outcome; an exhausted
/// script reads as silence. Writes accumulate in a shared buffer the test
/// can inspect after the channel takes ownership.
struct ScriptedTransport {
    reads: VecDeque<io::Result<Option<u8>>>,
    written: Rc<RefCell<Vec<u8>>>,
}

impl SerialTransport for ScriptedTransport {
    fn read_byte(&mut self, _timeout: Duration) -> io::Result<Option<u8>> {
        self.reads.pop_front().unwrap_or(Ok(None))
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.written.borrow_mut().push(byte);
        Ok(())
    }
}

struct TxRecorder {
    active: Rc<RefCell<bool>>,
}

impl TransmitLine for TxRecorder {
    fn set_active(&mut self, active: bool) {
        *self.active.borrow_mut() = active;
    }
}

#[derive(Default)]
struct MockGpio {
    power_on: bool,
    programming_active: bool,
}

impl FixtureGpio for MockGpio {
    fn set_device_power(&mut self, on: bool) {
        self.power_on = on;
    }

    fn set_programming_enable(&mut self, active: bool) {
        self.programming_active = active;
    }

    fn start_level(&mut self) -> bool {
        false
    }

    fn exit_level(&mut self) -> bool {
        false
    }
}

struct TestProbe {
    reading: Option<f64>,
}

impl TemperatureProbe for TestProbe {
    fn read_celsius(&mut self) -> Option<f64> {
        self.reading
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Indication {
    Busy,
    Idle,
    Pass,
    Error,
}

#[derive(Default)]
struct MockPanel {
    events: Vec<Indication>,
}

impl IndicatorPanel for MockPanel {
    fn indicate_busy(&mut self) {
        self.events.push(Indication::Busy);
    }
    fn indicate_idle(&mut self) {
        self.events.push(Indication::Idle);
    }
    fn indicate_pass(&mut self) {
        self.events.push(Indication::Pass);
    }
    fn indicate_error(&mut self) {
        self.events.push(Indication::Error);
    }
}

#[derive(Default)]
struct VecSink {
    records: Vec<AttemptRecord>,
}

impl AttemptSink for VecSink {
    fn record(&mut self, record: &AttemptRecord) {
        self.records.push(record.clone());
    }

    fn record_exit(&mut self) {}
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

fn no_sleep(_d: Duration) {}

/// Short deadlines so the silent-device scenarios spin for milliseconds,
/// not the production five seconds.
fn test_config() -> FixtureConfig {
    let mut config = FixtureConfig::default();
    config.timing.inbound_deadline_ms = 20;
    config.timing.ack_deadline_ms = 20;
    config
}

struct Fixture {
    channel: BoundedSerialChannel<ScriptedTransport, TxRecorder>,
    gpio: MockGpio,
    probe: TestProbe,
    panel: MockPanel,
    sink: VecSink,
    sequencer: Sequencer,
    written: Rc<RefCell<Vec<u8>>>,
    tx_active: Rc<RefCell<bool>>,
}

impl Fixture {
    /// `script` is what the device sends, in order.
    fn with_script(script: &[u8]) -> Self {
        let written = Rc::new(RefCell::new(Vec::new()));
        let tx_active = Rc::new(RefCell::new(false));
        let transport = ScriptedTransport {
            reads: script.iter().map(|&b| Ok(Some(b))).collect(),
            written: Rc::clone(&written),
        };
        let tx_line = TxRecorder {
            active: Rc::clone(&tx_active),
        };
        let channel = BoundedSerialChannel::new(
            transport,
            tx_line,
            Duration::from_millis(1),
            Duration::from_millis(1),
        )
        .with_sleeper(no_sleep);

        Self {
            channel,
            gpio: MockGpio::default(),
            probe: TestProbe {
                reading: Some(25.0),
            },
            panel: MockPanel::default(),
            sink: VecSink::default(),
            sequencer: Sequencer::new(test_config()).with_sleeper(no_sleep),
            written,
            tx_active,
        }
    }

    fn run(&mut self) -> AttemptResult {
        self.sequencer.run_attempt(
            &mut self.channel,
            &mut self.gpio,
            &mut self.probe,
            &mut self.panel,
            &mut self.sink,
        )
    }

    fn written(&self) -> Vec<u8> {
        self.written.borrow().clone()
    }

    fn assert_safe_state(&self) {
        assert!(!self.gpio.power_on, "device left powered");
        assert!(
            !self.gpio.programming_active,
            "programming enable left asserted"
        );
        assert!(!*self.tx_active.borrow(), "transmit line left driven");
        assert_eq!(self.sequencer.state(), StateId::Idle);
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn passing_attempt_end_to_end() {
    // Reading 0x0262 = 610 at 25 degC maps to set-point 651 = 0x28B.
    let mut fx = Fixture::with_script(b"G0262AY");
    let result = fx.run();

    assert_eq!(result, AttemptResult::Passed);
    assert_eq!(fx.written(), b"AAH0028B5".to_vec());
    assert_eq!(
        fx.panel.events,
        vec![Indication::Busy, Indication::Pass, Indication::Idle]
    );
    fx.assert_safe_state();

    assert_eq!(fx.sink.records.len(), 1);
    let record = &fx.sink.records[0];
    assert_eq!(record.inbound.iter().collect::<String>(), "G0262A");
    assert_eq!(record.reading, Some(610));
    assert_eq!(record.reference_c, Some(25.0));
    assert_eq!(record.set_point(), Some(651));
    assert!(record.result.passed());
}

#[test]
fn silent_device_fails_incomplete() {
    let mut fx = Fixture::with_script(b"");
    let result = fx.run();

    assert_eq!(result, AttemptResult::Failed(CalibrationFault::Incomplete));
    assert!(fx.written().is_empty(), "nothing should be transmitted");
    assert_eq!(
        fx.panel.events,
        vec![Indication::Busy, Indication::Error, Indication::Idle]
    );
    fx.assert_safe_state();

    let record = &fx.sink.records[0];
    assert!(record.inbound.is_empty());
    assert_eq!(record.reading, None);
    assert_eq!(record.set_point(), None);
}

#[test]
fn partial_frame_fails_incomplete() {
    let mut fx = Fixture::with_script(b"G02");
    assert_eq!(fx.run(), AttemptResult::Failed(CalibrationFault::Incomplete));
    assert!(fx.written().is_empty());
    fx.assert_safe_state();
}

#[test]
fn wrong_sentinel_rejected() {
    // 'H' is on the wire whitelist but is not the reading sentinel.
    let mut fx = Fixture::with_script(b"H0262A");
    assert_eq!(
        fx.run(),
        AttemptResult::Failed(CalibrationFault::BadSentinel)
    );
    assert!(fx.written().is_empty());
    fx.assert_safe_state();
}

#[test]
fn corrupted_checksum_rejected() {
    let mut fx = Fixture::with_script(b"G02629");
    assert_eq!(
        fx.run(),
        AttemptResult::Failed(CalibrationFault::ChecksumMismatch)
    );
    assert!(fx.written().is_empty());
    fx.assert_safe_state();
}

#[test]
fn zero_reading_never_transmitted() {
    // Checksum-valid frame carrying the degenerate all-zero reading.
    let mut fx = Fixture::with_script(b"G00000");
    assert_eq!(
        fx.run(),
        AttemptResult::Failed(CalibrationFault::InvalidReading)
    );
    assert!(fx.written().is_empty());
    fx.assert_safe_state();
}

#[test]
fn line_noise_does_not_corrupt_frame() {
    let mut fx = Fixture::with_script(b"\x00G0\n262%AY");
    assert_eq!(fx.run(), AttemptResult::Passed);
    assert_eq!(fx.written(), b"AAH0028B5".to_vec());
}

#[test]
fn wrong_ack_is_unverified() {
    let mut fx = Fixture::with_script(b"G0262A0");
    let result = fx.run();

    assert_eq!(result, AttemptResult::Failed(CalibrationFault::Unverified));
    // The set-point was transmitted; only verification failed.
    assert_eq!(fx.written(), b"AAH0028B5".to_vec());
    fx.assert_safe_state();
}

#[test]
fn missing_ack_is_unverified() {
    let mut fx = Fixture::with_script(b"G0262A");
    assert_eq!(
        fx.run(),
        AttemptResult::Failed(CalibrationFault::Unverified)
    );
    assert_eq!(fx.written(), b"AAH0028B5".to_vec());
    fx.assert_safe_state();
}

#[test]
fn transport_fault_surfaces_and_powers_down() {
    let written = Rc::new(RefCell::new(Vec::new()));
    let tx_active = Rc::new(RefCell::new(false));
    let transport = ScriptedTransport {
        reads: VecDeque::from([Err(io::Error::new(
            io::ErrorKind::BrokenPipe,
            "line fault",
        ))]),
        written: Rc::clone(&written),
    };
    let channel = BoundedSerialChannel::new(
        transport,
        TxRecorder {
            active: Rc::clone(&tx_active),
        },
        Duration::from_millis(1),
        Duration::from_millis(1),
    )
    .with_sleeper(no_sleep);

    let mut fx = Fixture::with_script(b"");
    fx.channel = channel;
    fx.written = written;
    fx.tx_active = tx_active;

    assert_eq!(
        fx.run(),
        AttemptResult::Failed(CalibrationFault::TransportError)
    );
    fx.assert_safe_state();
}

#[test]
fn probe_outage_falls_back_to_configured_reference() {
    let mut fx = Fixture::with_script(b"G0262AY");
    fx.probe.reading = None;
    assert_eq!(fx.run(), AttemptResult::Passed);

    // Fallback reference is also 25 degC, so the frame is unchanged.
    assert_eq!(fx.written(), b"AAH0028B5".to_vec());
    assert_eq!(fx.sink.records[0].reference_c, Some(25.0));
}

#[test]
fn probe_reading_shifts_set_point() {
    // At 35 degC: trunc(610 * 743 / 706) = 641 = 0x281, csum 0+2+8+1 = 'B'.
    let mut fx = Fixture::with_script(b"G0262AY");
    fx.probe.reading = Some(35.0);
    assert_eq!(fx.run(), AttemptResult::Passed);
    assert_eq!(fx.written(), b"AAH00281B".to_vec());
}

#[test]
fn back_to_back_attempts_from_one_sequencer() {
    let mut fx = Fixture::with_script(b"G0262AY");
    assert_eq!(fx.run(), AttemptResult::Passed);

    // Second attempt on the same sequencer with a fresh line script.
    let written = Rc::new(RefCell::new(Vec::new()));
    let tx_active = Rc::new(RefCell::new(false));
    fx.channel = BoundedSerialChannel::new(
        ScriptedTransport {
            reads: b"G0262AY".iter().map(|&b| Ok(Some(b))).collect(),
            written: Rc::clone(&written),
        },
        TxRecorder {
            active: Rc::clone(&tx_active),
        },
        Duration::from_millis(1),
        Duration::from_millis(1),
    )
    .with_sleeper(no_sleep);
    fx.written = written;
    fx.tx_active = tx_active;

    assert_eq!(fx.run(), AttemptResult::Passed);
    assert_eq!(fx.sink.records.len(), 2);
    fx.assert_safe_state();
}

#[test]
fn shutdown_parks_sequencer_and_powers_down() {
    let mut fx = Fixture::with_script(b"");
    // Pretend an attempt left things asserted.
    fx.gpio.set_device_power(true);
    fx.gpio.set_programming_enable(true);

    fx.sequencer
        .shutdown(&mut fx.channel, &mut fx.gpio, &mut fx.panel);

    assert_eq!(fx.sequencer.state(), StateId::Shutdown);
    assert!(!fx.gpio.power_on);
    assert!(!fx.gpio.programming_active);
    assert!(!*fx.tx_active.borrow());
    assert_eq!(fx.panel.events, vec![Indication::Idle]);
}
