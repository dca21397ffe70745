//! serialport-rs transport adapter.
//!
//! Opens the fixture UART with the device's line parameters (9600-8-N,
//! 1 or 2 stop bits depending on firmware revision) and exposes it as the
//! byte-at-a-time [`SerialTransport`] port.

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::config::SerialConfig;
use crate::error::Error;
use crate::ports::SerialTransport;

pub struct SerialPortTransport {
    port: Box<dyn SerialPort>,
}

impl SerialPortTransport {
    /// Open and configure the serial device. Failure here is fatal — the
    /// fixture cannot run without its UART.
    pub fn open(config: &SerialConfig) -> Result<Self, Error> {
        let stop_bits = match config.stop_bits {
            1 => StopBits::One,
            _ => StopBits::Two,
        };
        let port = serialport::new(config.device.clone(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(stop_bits)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(200))
            .open()
            .map_err(|e| Error::Serial(format!("{}: {e}", config.device)))?;
        Ok(Self { port })
    }
}

impl SerialTransport for SerialPortTransport {
    fn read_byte(&mut self, timeout: Duration) -> io::Result<Option<u8>> {
        // Some platforms reject a zero timeout.
        let timeout = timeout.max(Duration::from_millis(1));
        self.port.set_timeout(timeout).map_err(io::Error::from)?;

        let mut buf = [0u8; 1];
        match self.port.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.port.write_all(&[byte])?;
        self.port.flush()
    }
}
