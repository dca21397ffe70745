//! Fixture control binary.
//!
//! Wires the calibration engine to the Pi hardware: binds GPIO and the
//! UART, discovers the reference probe, then polls the two operator
//! buttons. Start runs one attempt; exit powers everything down and ends
//! the process.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{info, warn};
use rppal::gpio::Gpio;

use tempcal::adapters::gpio::{RpiFixtureGpio, RpiLedLines, RpiTransmitLine};
use tempcal::adapters::log_sink::DailyLogSink;
use tempcal::adapters::probe::{Ds18b20Probe, FixedProbe};
use tempcal::adapters::serial::SerialPortTransport;
use tempcal::channel::BoundedSerialChannel;
use tempcal::config::FixtureConfig;
use tempcal::drivers::button::TriggerButton;
use tempcal::drivers::indicator::Indicator;
use tempcal::ports::{AttemptSink, FixtureGpio, TemperatureProbe};
use tempcal::sequencer::{AttemptResult, Sequencer};

const CONFIG_PATH: &str = "tempcal.json";
const LOG_DIR: &str = "Temp_Cal_Logs";

/// Reference source for the attempt: a discovered DS18B20, or the
/// configured constant when no sensor is fitted.
enum ReferenceProbe {
    Sensor(Ds18b20Probe),
    Fixed(FixedProbe),
}

impl TemperatureProbe for ReferenceProbe {
    fn read_celsius(&mut self) -> Option<f64> {
        match self {
            Self::Sensor(p) => p.read_celsius(),
            Self::Fixed(p) => p.read_celsius(),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("tempcal v{}", env!("CARGO_PKG_VERSION"));

    let config =
        FixtureConfig::load_or_default(Path::new(CONFIG_PATH)).context("loading configuration")?;

    let gpio = Gpio::new().context("opening GPIO")?;
    let mut fixture_gpio =
        RpiFixtureGpio::bind(&gpio, &config.pins).context("binding sequencing pins")?;
    let tx_line = RpiTransmitLine::bind(&gpio, &config.pins).context("binding transmit pin")?;
    let leds = RpiLedLines::bind(&gpio, &config.pins).context("binding indicator pins")?;
    let transport =
        SerialPortTransport::open(&config.serial).context("opening serial device")?;

    let mut channel = BoundedSerialChannel::new(
        transport,
        tx_line,
        Duration::from_millis(config.framing.inter_char_delay_ms),
        Duration::from_millis(config.timing.byte_timeout_ms),
    );
    let mut panel = Indicator::new(leds);
    let mut probe = match Ds18b20Probe::discover() {
        Some(sensor) => ReferenceProbe::Sensor(sensor),
        None => {
            warn!(
                "no DS18B20 on the 1-Wire bus, assuming {} degC reference",
                config.model.fallback_reference_c
            );
            ReferenceProbe::Fixed(FixedProbe(config.model.fallback_reference_c))
        }
    };
    let mut sink = DailyLogSink::new(LOG_DIR);

    let debounce = Duration::from_millis(config.timing.button_debounce_ms);
    let mut start_button = TriggerButton::new(debounce);
    let mut exit_button = TriggerButton::new(debounce);
    let poll_interval = Duration::from_micros(config.timing.poll_interval_us);
    let startup_hold = Duration::from_millis(config.timing.startup_hold_ms);

    let mut sequencer = Sequencer::new(config);

    // Lamp test, then hold until the board rails have settled.
    panel.startup();
    std::thread::sleep(startup_hold);
    panel.ready();
    channel.set_transmit_active(false);
    info!("fixture ready");

    loop {
        let now = Instant::now();

        if exit_button.poll(fixture_gpio.exit_level(), now) {
            info!("exit trigger, shutting down");
            sequencer.shutdown(&mut channel, &mut fixture_gpio, &mut panel);
            panel.exit_chase();
            sink.record_exit();
            break;
        }

        if start_button.poll(fixture_gpio.start_level(), now) {
            match sequencer.run_attempt(
                &mut channel,
                &mut fixture_gpio,
                &mut probe,
                &mut panel,
                &mut sink,
            ) {
                AttemptResult::Passed => info!("calibration attempt passed"),
                AttemptResult::Failed(fault) => warn!("calibration attempt failed: {fault}"),
            }
        }

        std::thread::sleep(poll_interval);
    }

    Ok(())
}
