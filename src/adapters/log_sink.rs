//! Per-day attempt log file.
//!
//! One text file per calendar day under the log directory
//! (`Temp_Cal_<MM-DD-YY>.txt`), created with a header line on first use.
//! Each attempt appends one line: inbound frame, decoded reading, outbound
//! frame, decoded set-point, and the verification outcome.
//!
//! Logging failures are reported through the process log but never fail
//! the attempt — a full SD card must not brick the fixture.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::warn;

use crate::ports::AttemptSink;
use crate::sequencer::{AttemptRecord, AttemptResult};

const FILE_PREFIX: &str = "Temp_Cal_";

/// Render one attempt as a log line.
pub fn format_record(record: &AttemptRecord) -> String {
    let inbound: String = if record.inbound.is_empty() {
        "(none)".to_owned()
    } else {
        record.inbound.iter().collect()
    };
    let reading = record
        .reading
        .map_or_else(|| "-".to_owned(), |r| r.to_string());
    let outbound = record.outbound.as_ref().map_or_else(
        || "-".to_owned(),
        |f| f.chars().iter().collect::<String>(),
    );
    let set_point = record
        .set_point()
        .map_or_else(|| "-".to_owned(), |sp| sp.to_string());
    let outcome = match record.result {
        AttemptResult::Passed => "Verified".to_owned(),
        AttemptResult::Failed(fault) => format!("Failed: {fault}"),
    };
    format!("{inbound}    {reading}    {outbound}    {set_point}    {outcome}")
}

pub struct DailyLogSink {
    dir: PathBuf,
}

impl DailyLogSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn append_line(&self, line: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let stamp = Local::now().format("%m-%d-%y").to_string();
        let path = self.dir.join(format!("{FILE_PREFIX}{stamp}.txt"));
        let fresh = !path.exists();

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if fresh {
            writeln!(file, "Temperature Calibration Log {stamp}")?;
        }
        writeln!(file, "{line}")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl AttemptSink for DailyLogSink {
    fn record(&mut self, record: &AttemptRecord) {
        if let Err(e) = self.append_line(&format_record(record)) {
            warn!("attempt log write failed: {e}");
        }
    }

    fn record_exit(&mut self) {
        if let Err(e) = self.append_line("Program Exited") {
            warn!("attempt log write failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_outbound;
    use crate::error::CalibrationFault;

    #[test]
    fn formats_passed_attempt() {
        let record = AttemptRecord {
            inbound: "G0262A".chars().collect(),
            reading: Some(610),
            reference_c: Some(25.0),
            outbound: Some(encode_outbound(651, 2).unwrap()),
            result: AttemptResult::Passed,
        };
        assert_eq!(
            format_record(&record),
            "G0262A    610    AAH0028B5    651    Verified"
        );
    }

    #[test]
    fn formats_incomplete_attempt() {
        let record = AttemptRecord {
            inbound: vec![],
            reading: None,
            reference_c: None,
            outbound: None,
            result: AttemptResult::Failed(CalibrationFault::Incomplete),
        };
        assert_eq!(
            format_record(&record),
            "(none)    -    -    -    Failed: inbound frame incomplete"
        );
    }
}
