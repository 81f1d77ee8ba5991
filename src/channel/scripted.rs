use std::collections::VecDeque;

use super::Channel;
use crate::error::ChannelError;

type Responder = Box<dyn FnMut(&str) -> Vec<String>>;

/// In-memory channel that answers each written line through a closure.
/// Reading past the queued lines behaves like a timeout.
pub struct ScriptedChannel {
    responder: Responder,
    pending: Vec<u8>,
    rx: VecDeque<String>,
    pub sent: Vec<String>,
}

impl ScriptedChannel {
    pub fn new(responder: impl FnMut(&str) -> Vec<String> + 'static) -> Self {
        ScriptedChannel {
            responder: Box::new(responder),
            pending: Vec::new(),
            rx: VecDeque::new(),
            sent: Vec::new(),
        }
    }

    /// Answers every command with the same lines
    pub fn replying(lines: &[&str]) -> Self {
        let lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        ScriptedChannel::new(move |_| lines.clone())
    }

    /// Lines sitting in the receive buffer before any command goes out
    pub fn queue(&mut self, line: &str) {
        self.rx.push_back(line.to_string());
    }
}

impl Channel for ScriptedChannel {
    fn name(&self) -> &str {
        "scripted"
    }

    fn clear_input(&mut self) -> Result<(), ChannelError> {
        self.rx.clear();
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        for &b in bytes {
            if b == b'\n' {
                let line = String::from_utf8_lossy(&self.pending).into_owned();
                self.pending.clear();
                self.rx.extend((self.responder)(&line));
                self.sent.push(line);
            } else {
                self.pending.push(b);
            }
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>, ChannelError> {
        Ok(self.rx.pop_front())
    }
}
