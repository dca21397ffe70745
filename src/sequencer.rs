//! Calibration attempt sequencer.
//!
//! One attempt is a strictly sequential pass through a fixed state machine:
//!
//! ```text
//! Idle ─▶ PowerUp ─▶ AwaitInbound ─▶ Validate ─▶ Compute ─▶ Transmit
//!                                                               │
//!           Idle ◀─ PowerDown ◀─ {Pass | Fail} ◀─ AwaitAck ◀────┘
//! ```
//!
//! Every failure routes through `Fail`, and `PowerDown` runs on every exit
//! path so the device is never left powered or the transmit line left
//! driven after an attempt. No state is re-entered except via a fresh
//! `Idle → PowerUp` trigger; an exit signal ends in the terminal
//! `Shutdown` state.

use std::time::Duration;

use log::{info, warn};

use crate::channel::BoundedSerialChannel;
use crate::codec::{self, OutboundFrame, ACK, INBOUND_LEN};
use crate::config::FixtureConfig;
use crate::error::CalibrationFault;
use crate::model::CalibrationModel;
use crate::ports::{
    AttemptSink, FixtureGpio, IndicatorPanel, SerialTransport, TemperatureProbe, TransmitLine,
};

/// Hold after asserting power/VPP before the PIC starts talking.
/// A hardware requirement of the driver board — deliberately not in
/// [`FixtureConfig`].
pub const POWER_SETTLE: Duration = Duration::from_millis(530);

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all sequencer states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateId {
    Idle,
    PowerUp,
    AwaitInbound,
    Validate,
    Compute,
    Transmit,
    AwaitAck,
    Pass,
    Fail,
    PowerDown,
    Shutdown,
}

// ---------------------------------------------------------------------------
// Attempt outcome
// ---------------------------------------------------------------------------

/// Tagged outcome of one calibration cycle. Created at sequencer start,
/// finalized at exit, never persisted beyond the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptResult {
    Passed,
    Failed(CalibrationFault),
}

impl AttemptResult {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Everything one attempt produced, handed to the [`AttemptSink`].
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    /// Accepted characters captured for the inbound frame (possibly short).
    pub inbound: Vec<char>,
    /// Decoded raw reading, once past validation.
    pub reading: Option<u16>,
    /// Reference temperature fed to the model (°C).
    pub reference_c: Option<f64>,
    /// Encoded outbound frame, once computed.
    pub outbound: Option<OutboundFrame>,
    pub result: AttemptResult,
}

impl AttemptRecord {
    /// Decoded set-point, when an outbound frame was produced.
    pub fn set_point(&self) -> Option<u16> {
        self.outbound.as_ref().map(OutboundFrame::set_point)
    }
}

// Working state accumulated while the machine runs.
#[derive(Default)]
struct Attempt {
    inbound: Vec<char>,
    frame: Option<codec::InboundReading>,
    reading: Option<u16>,
    reference_c: Option<f64>,
    set_point: Option<i64>,
    outbound: Option<OutboundFrame>,
    fault: Option<CalibrationFault>,
}

impl Attempt {
    fn fail(&mut self, fault: CalibrationFault) -> StateId {
        self.fault = Some(fault);
        StateId::Fail
    }

    fn result(&self) -> AttemptResult {
        match self.fault {
            Some(fault) => AttemptResult::Failed(fault),
            None => AttemptResult::Passed,
        }
    }

    fn record(&self) -> AttemptRecord {
        AttemptRecord {
            inbound: self.inbound.clone(),
            reading: self.reading,
            reference_c: self.reference_c,
            outbound: self.outbound.clone(),
            result: self.result(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

/// Drives one calibration attempt at a time over injected ports.
///
/// Owns no hardware: the channel, GPIO, probe, indicator and sink are
/// passed in per call, so the whole cycle runs under test with mocks.
pub struct Sequencer {
    config: FixtureConfig,
    model: CalibrationModel,
    state: StateId,
    sleep: fn(Duration),
}

impl Sequencer {
    pub fn new(config: FixtureConfig) -> Self {
        let model = CalibrationModel::new(
            config.model.average_offset,
            config.model.trigger_temperature_c,
        );
        Self {
            config,
            model,
            state: StateId::Idle,
            sleep: std::thread::sleep,
        }
    }

    /// Replace the settle/pacing sleeper (tests run with a no-op).
    pub fn with_sleeper(mut self, sleep: fn(Duration)) -> Self {
        self.sleep = sleep;
        self
    }

    /// Current state — `Idle` between attempts, `Shutdown` after exit.
    pub fn state(&self) -> StateId {
        self.state
    }

    /// Run one full calibration attempt.
    ///
    /// Blocks for the duration of the cycle (power settle, bounded reads,
    /// paced write, indicator choreography). Always leaves the device
    /// powered down and the transmit line idle.
    pub fn run_attempt<T, L, G, P, I, S>(
        &mut self,
        channel: &mut BoundedSerialChannel<T, L>,
        gpio: &mut G,
        probe: &mut P,
        panel: &mut I,
        sink: &mut S,
    ) -> AttemptResult
    where
        T: SerialTransport,
        L: TransmitLine,
        G: FixtureGpio,
        P: TemperatureProbe,
        I: IndicatorPanel,
        S: AttemptSink,
    {
        debug_assert_eq!(self.state, StateId::Idle, "attempts must not overlap");

        let mut attempt = Attempt::default();
        self.transition(StateId::PowerUp);

        loop {
            let next = match self.state {
                StateId::PowerUp => self.power_up(channel, gpio, panel),
                StateId::AwaitInbound => self.await_inbound(channel, &mut attempt),
                StateId::Validate => Self::validate(&mut attempt),
                StateId::Compute => self.compute(probe, &mut attempt),
                StateId::Transmit => self.transmit(channel, &mut attempt),
                StateId::AwaitAck => self.await_ack(channel, &mut attempt),
                StateId::Pass => {
                    sink.record(&attempt.record());
                    panel.indicate_pass();
                    StateId::PowerDown
                }
                StateId::Fail => {
                    sink.record(&attempt.record());
                    panel.indicate_error();
                    StateId::PowerDown
                }
                StateId::PowerDown => {
                    self.power_down(channel, gpio, panel);
                    StateId::Idle
                }
                StateId::Idle | StateId::Shutdown => break,
            };
            self.transition(next);
            if next == StateId::Idle {
                break;
            }
        }

        attempt.result()
    }

    /// Operator exit: run the power-down actions (harmless when already
    /// idle) and park the machine in the terminal `Shutdown` state.
    pub fn shutdown<T, L, G, I>(
        &mut self,
        channel: &mut BoundedSerialChannel<T, L>,
        gpio: &mut G,
        panel: &mut I,
    ) where
        T: SerialTransport,
        L: TransmitLine,
        G: FixtureGpio,
        I: IndicatorPanel,
    {
        self.power_down(channel, gpio, panel);
        self.transition(StateId::Shutdown);
    }

    // -----------------------------------------------------------------------
    // State bodies
    // -----------------------------------------------------------------------

    fn power_up<T, L, G, I>(
        &self,
        channel: &mut BoundedSerialChannel<T, L>,
        gpio: &mut G,
        panel: &mut I,
    ) -> StateId
    where
        T: SerialTransport,
        L: TransmitLine,
        G: FixtureGpio,
        I: IndicatorPanel,
    {
        panel.indicate_busy();
        gpio.set_programming_enable(true);
        gpio.set_device_power(true);
        channel.set_transmit_active(true);
        (self.sleep)(POWER_SETTLE);
        StateId::AwaitInbound
    }

    fn await_inbound<T, L>(
        &self,
        channel: &mut BoundedSerialChannel<T, L>,
        attempt: &mut Attempt,
    ) -> StateId
    where
        T: SerialTransport,
        L: TransmitLine,
    {
        let deadline = Duration::from_millis(self.config.timing.inbound_deadline_ms);
        match channel.read_frame(INBOUND_LEN, deadline) {
            Ok(chars) => {
                attempt.inbound = chars;
                match codec::decode_inbound(&attempt.inbound) {
                    Ok(frame) => {
                        attempt.frame = Some(frame);
                        StateId::Validate
                    }
                    Err(fault) => attempt.fail(fault),
                }
            }
            Err(fault) => attempt.fail(fault),
        }
    }

    fn validate(attempt: &mut Attempt) -> StateId {
        // decode_inbound ran before Validate can be reached.
        let Some(frame) = attempt.frame else {
            return attempt.fail(CalibrationFault::Incomplete);
        };
        if frame.verify_checksum() {
            StateId::Compute
        } else {
            attempt.fail(CalibrationFault::ChecksumMismatch)
        }
    }

    fn compute<P: TemperatureProbe>(&self, probe: &mut P, attempt: &mut Attempt) -> StateId {
        let Some(raw) = attempt.frame.and_then(|f| f.reading()) else {
            return attempt.fail(CalibrationFault::InvalidReading);
        };
        attempt.reading = Some(raw);

        let reference_c = probe.read_celsius().unwrap_or_else(|| {
            warn!(
                "temperature probe unavailable, using fallback {} degC",
                self.config.model.fallback_reference_c
            );
            self.config.model.fallback_reference_c
        });
        attempt.reference_c = Some(reference_c);

        match self.model.compute_set_point(raw, reference_c) {
            Ok(set_point) => {
                info!("raw reading {raw} at {reference_c:.2} degC -> set-point {set_point}");
                attempt.set_point = Some(set_point);
                StateId::Transmit
            }
            Err(fault) => attempt.fail(fault),
        }
    }

    fn transmit<T, L>(
        &self,
        channel: &mut BoundedSerialChannel<T, L>,
        attempt: &mut Attempt,
    ) -> StateId
    where
        T: SerialTransport,
        L: TransmitLine,
    {
        let Some(set_point) = attempt.set_point else {
            return attempt.fail(CalibrationFault::ValueOutOfRange);
        };
        let frame = match codec::encode_outbound(set_point, self.config.framing.address_prefix_len)
        {
            Ok(frame) => frame,
            Err(fault) => return attempt.fail(fault),
        };

        channel.set_transmit_active(true);
        let written = channel.write_frame(frame.chars());
        (self.sleep)(Duration::from_millis(
            self.config.framing.post_write_settle_ms,
        ));
        // Line back to idle whether or not the write succeeded.
        channel.set_transmit_active(false);

        attempt.outbound = Some(frame);
        match written {
            Ok(()) => StateId::AwaitAck,
            Err(fault) => attempt.fail(fault),
        }
    }

    fn await_ack<T, L>(
        &self,
        channel: &mut BoundedSerialChannel<T, L>,
        attempt: &mut Attempt,
    ) -> StateId
    where
        T: SerialTransport,
        L: TransmitLine,
    {
        let deadline = Duration::from_millis(self.config.timing.ack_deadline_ms);
        match channel.read_frame(1, deadline) {
            Ok(reply) if reply == [ACK] => StateId::Pass,
            Ok(reply) => {
                info!("expected '{ACK}' acknowledgement, got {reply:?}");
                attempt.fail(CalibrationFault::Unverified)
            }
            Err(fault) => attempt.fail(fault),
        }
    }

    fn power_down<T, L, G, I>(
        &self,
        channel: &mut BoundedSerialChannel<T, L>,
        gpio: &mut G,
        panel: &mut I,
    ) where
        T: SerialTransport,
        L: TransmitLine,
        G: FixtureGpio,
        I: IndicatorPanel,
    {
        channel.set_transmit_active(false);
        gpio.set_programming_enable(false);
        gpio.set_device_power(false);
        panel.indicate_idle();
    }

    fn transition(&mut self, next: StateId) {
        if next != self.state {
            info!("sequencer: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}
