use std::collections::VecDeque;

use log::error;

use super::Controller;
use crate::channel::Channel;
use crate::error::ChannelError;

/// Longest command the terminal buffers; extra characters are dropped
const LINE_DEPTH: usize = 40;

/// A [`Channel`] wired straight into a [`Controller`], with the same line
/// discipline as the board's serial terminal.
///
/// In quiet mode each reply is a single JSON line followed by an empty line.
/// Noisy mode behaves like the real board: typed characters are echoed, a
/// log line comes before the reply, the reply is wrapped in log text, and no
/// empty line follows, so the reader only stops on timeout.
pub struct EmulatedChannel {
    controller: Controller,
    line: Vec<u8>,
    rx: VecDeque<u8>,
    noisy: bool,
}

impl EmulatedChannel {
    pub fn new(controller: Controller) -> Self {
        EmulatedChannel {
            controller,
            line: Vec::new(),
            rx: VecDeque::new(),
            noisy: false,
        }
    }

    pub fn noisy(controller: Controller) -> Self {
        EmulatedChannel {
            noisy: true,
            ..EmulatedChannel::new(controller)
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut Controller {
        &mut self.controller
    }

    /// Put bytes in the receive buffer as if the board had sent them
    pub fn inject(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    fn echo(&mut self, bytes: &[u8]) {
        if self.noisy {
            self.rx.extend(bytes);
        }
    }

    fn emit_line(&mut self, text: &str) {
        self.rx.extend(text.as_bytes());
        self.rx.push_back(b'\n');
    }

    fn feed(&mut self, byte: u8) {
        match byte {
            b'\r' => self.echo(b"\r"),
            // Backspace
            0x08 => {
                if self.line.pop().is_some() {
                    self.echo(b"\x08 \x08");
                }
            }
            b'\n' => {
                let command = String::from_utf8_lossy(&self.line).into_owned();
                self.line.clear();
                self.respond(&command);
            }
            other => {
                if self.line.len() <= LINE_DEPTH {
                    self.line.push(other);
                    self.echo(&[other]);
                }
            }
        }
    }

    fn respond(&mut self, command: &str) {
        let reply = match self.controller.handle_api_call(command).to_line() {
            Ok(line) => line,
            Err(e) => {
                error!("Could not encode reply to {:?}: {}", command, e);
                return;
            }
        };

        if self.noisy {
            self.emit_line(&format!("[D] Analyzing subpath: {}", command));
            self.emit_line(&format!("[V] Op result: {}", reply));
        } else {
            self.emit_line(&reply);
            self.emit_line("");
        }
    }
}

impl Channel for EmulatedChannel {
    fn name(&self) -> &str {
        "emulated"
    }

    fn clear_input(&mut self) -> Result<(), ChannelError> {
        self.rx.clear();
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        for &byte in bytes {
            self.feed(byte);
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>, ChannelError> {
        if self.rx.is_empty() {
            return Ok(None);
        }

        let mut line = Vec::new();
        while let Some(byte) = self.rx.pop_front() {
            if byte == b'\n' {
                break;
            }
            line.push(byte);
        }

        Ok(Some(String::from_utf8_lossy(&line).into_owned()))
    }
}
