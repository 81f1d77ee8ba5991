use crate::error::ChannelError;

mod serial;
#[cfg(test)]
pub(crate) mod scripted;

pub use serial::SerialChannel;

/// A byte-oriented, line-based link to a device. Reads are bounded by the
/// channel's own timeout, so nothing here blocks forever.
pub trait Channel {
    /// Human readable name of the link, used in error reports
    fn name(&self) -> &str;

    /// Drop everything received but not read yet
    fn clear_input(&mut self) -> Result<(), ChannelError>;

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), ChannelError>;

    /// Read one line without its `\n` terminator.
    ///
    /// Returns `Ok(None)` when the timeout passes with no data at all. A line
    /// cut short by the timeout is returned as-is.
    fn read_line(&mut self) -> Result<Option<String>, ChannelError>;
}
