use log::{debug, trace};

use crate::channel::{Channel, SerialChannel};
use crate::config::PortConfig;
use crate::error::ChannelError;

/// Drives one-line-request / multi-line-response exchanges over a channel.
///
/// The client owns its channel. Dropping the client (or calling
/// [`CommandClient::close`]) releases it, whichever way the caller exits.
pub struct CommandClient<C: Channel> {
    channel: C,
}

impl CommandClient<SerialChannel> {
    pub fn open(
        path: &str,
        baud_rate: u32,
        read_timeout: std::time::Duration,
    ) -> Result<Self, ChannelError> {
        Ok(CommandClient::new(SerialChannel::open(
            path,
            baud_rate,
            read_timeout,
        )?))
    }

    pub fn open_port(port: &PortConfig) -> Result<Self, ChannelError> {
        CommandClient::open(&port.path, port.baud_rate, port.timeout())
    }
}

impl<C: Channel> CommandClient<C> {
    pub fn new(channel: C) -> Self {
        CommandClient { channel }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Throw away anything received before now, so a stale reply can't end up
    /// in the next response
    pub fn clear_input_buffer(&mut self) -> Result<(), ChannelError> {
        self.channel.clear_input()
    }

    pub fn send_command(&mut self, text: &str) -> Result<(), ChannelError> {
        trace!("-> {}", text);

        let mut line = String::with_capacity(text.len() + 1);
        line.push_str(text);
        line.push('\n');

        self.channel.write_all(line.as_bytes())
    }

    /// Collect reply lines until an empty line or a read that times out with
    /// nothing. Every kept line is trimmed and ends with `\n`.
    pub fn read_response(&mut self) -> Result<String, ChannelError> {
        let mut response = String::new();

        while let Some(line) = self.channel.read_line()? {
            let line = line.trim();
            if line.is_empty() {
                break;
            }

            trace!("<- {}", line);
            response.push_str(line);
            response.push('\n');
        }

        Ok(response)
    }

    /// Clear, send, then read the whole response
    pub fn exchange(&mut self, command: &str) -> Result<String, ChannelError> {
        self.clear_input_buffer()?;
        self.send_command(command)?;
        let response = self.read_response()?;

        debug!(
            "{}: {} bytes of response to {:?}",
            self.channel.name(),
            response.len(),
            command
        );

        Ok(response)
    }

    pub fn close(self) {
        debug!("Releasing {}", self.channel.name());
    }
}
