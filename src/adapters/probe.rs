//! DS18B20 reference-temperature probe over the 1-Wire sysfs interface.
//!
//! The kernel's `w1-gpio`/`w1-therm` drivers expose each sensor as
//! `/sys/bus/w1/devices/28-*/w1_slave` with a two-line payload:
//!
//! ```text
//! 6b 01 4b 46 7f ff 05 10 d8 : crc=d8 YES
//! 6b 01 4b 46 7f ff 05 10 d8 t=22687
//! ```
//!
//! The first line ends in `YES` when the on-wire CRC checked out; the
//! second carries the reading in milli-degrees after `t=`. Reads with a
//! bad CRC are retried a bounded number of times (the old fixture
//! software spun forever on a flaky sensor).

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;

use crate::ports::TemperatureProbe;

const W1_DEVICES_DIR: &str = "/sys/bus/w1/devices";
const CRC_RETRIES: u32 = 5;
const CRC_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Parse a `w1_slave` payload into degrees Celsius.
///
/// `None` when the CRC line does not end in `YES` or the `t=` field is
/// missing/malformed.
pub fn parse_w1_payload(text: &str) -> Option<f64> {
    let mut lines = text.lines();
    let crc_line = lines.next()?;
    if !crc_line.trim_end().ends_with("YES") {
        return None;
    }
    let data_line = lines.next()?;
    let t_pos = data_line.find("t=")?;
    let milli: f64 = data_line[t_pos + 2..].trim().parse().ok()?;
    Some(milli / 1000.0)
}

pub struct Ds18b20Probe {
    device_file: PathBuf,
}

impl Ds18b20Probe {
    pub fn new(device_file: PathBuf) -> Self {
        Self { device_file }
    }

    /// Find the first DS18B20 on the bus (family code 28).
    pub fn discover() -> Option<Self> {
        Self::discover_in(Path::new(W1_DEVICES_DIR))
    }

    fn discover_in(dir: &Path) -> Option<Self> {
        let entries = std::fs::read_dir(dir).ok()?;
        for entry in entries.flatten() {
            let name = entry.file_name();
            if name.to_string_lossy().starts_with("28") {
                return Some(Self::new(entry.path().join("w1_slave")));
            }
        }
        None
    }
}

impl TemperatureProbe for Ds18b20Probe {
    fn read_celsius(&mut self) -> Option<f64> {
        for _ in 0..CRC_RETRIES {
            match std::fs::read_to_string(&self.device_file) {
                Ok(text) => {
                    if let Some(celsius) = parse_w1_payload(&text) {
                        return Some(celsius);
                    }
                    // Bad CRC — let the sensor settle and try again.
                    std::thread::sleep(CRC_RETRY_DELAY);
                }
                Err(e) => {
                    warn!("probe read failed ({}): {e}", self.device_file.display());
                    return None;
                }
            }
        }
        warn!("probe CRC did not settle after {CRC_RETRIES} reads");
        None
    }
}

/// Probe standing in for fixtures without a fitted sensor: always reports
/// a fixed reference temperature.
pub struct FixedProbe(pub f64);

impl TemperatureProbe for FixedProbe {
    fn read_celsius(&mut self) -> Option<f64> {
        Some(self.0)
    }
}
