use std::{
    io::{self, Read, Write},
    time::{Duration, Instant},
};

use log::debug;
use serialport::{ClearBuffer, SerialPort};

use super::Channel;
use crate::error::ChannelError;

/// A serial port opened for line-based exchanges. The port is closed when
/// the channel is dropped.
pub struct SerialChannel {
    path: String,
    port: Box<dyn SerialPort>,
    timeout: Duration,
}

impl SerialChannel {
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self, ChannelError> {
        let port = serialport::new(path, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|e| ChannelError::Unavailable {
                path: path.to_string(),
                source: e.into(),
            })?;

        debug!("Opened {} at {} baud", path, baud_rate);

        Ok(SerialChannel::with_port(path, port, timeout))
    }

    /// Wrap a port that is already open
    pub fn with_port(path: &str, port: Box<dyn SerialPort>, timeout: Duration) -> Self {
        SerialChannel {
            path: path.to_string(),
            port,
            timeout,
        }
    }

    fn read_error(&self, source: io::Error) -> ChannelError {
        ChannelError::Read {
            path: self.path.clone(),
            source,
        }
    }
}

impl Channel for SerialChannel {
    fn name(&self) -> &str {
        &self.path
    }

    fn clear_input(&mut self) -> Result<(), ChannelError> {
        self.port
            .clear(ClearBuffer::Input)
            .map_err(|e| ChannelError::Clear {
                path: self.path.clone(),
                source: e.into(),
            })
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        self.port
            .write_all(bytes)
            .and_then(|_| self.port.flush())
            .map_err(|source| ChannelError::Write {
                path: self.path.clone(),
                source,
            })
    }

    fn read_line(&mut self) -> Result<Option<String>, ChannelError> {
        // The whole line shares one timeout, not each byte
        let deadline = Instant::now() + self.timeout;
        let mut line = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            self.port
                .set_timeout(remaining)
                .map_err(|e| self.read_error(e.into()))?;

            match self.port.read(&mut byte) {
                Ok(0) => break,
                Ok(_) if byte[0] == b'\n' => {
                    return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
                }
                Ok(_) => line.push(byte[0]),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => return Err(self.read_error(source)),
            }
        }

        if line.is_empty() {
            Ok(None)
        } else {
            Ok(Some(String::from_utf8_lossy(&line).into_owned()))
        }
    }
}

impl Drop for SerialChannel {
    fn drop(&mut self) {
        debug!("Closing {}", self.path);
    }
}
