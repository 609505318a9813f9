//! Wire codec traits for the newline-delimited GPSD JSON protocol
//!
//! Commands are single lines of the form `?COMMAND={json};` or `?COMMAND;`,
//! terminated by a newline. Responses are one JSON object per line with a
//! `class` discriminator; line decoding lives with the protocol version
//! (see [`v3::decode_line`]).

use crate::{Result, error::GpsdClientError};

#[cfg(feature = "proto-v3")]
pub mod v3;

/// A client command that can be rendered into its wire form
pub trait GpsdRequest {
    /// Renders the command string, without the trailing newline
    fn to_command(&self) -> String;
}

/// Extension trait writing commands onto any byte sink
pub trait GpsdEncode: std::io::Write {
    /// Writes one command line and flushes it
    ///
    /// The daemon parses commands on the terminating newline, so the write
    /// is flushed before returning.
    fn write_request(&mut self, request: &impl GpsdRequest) -> Result<()> {
        let mut cmd = request.to_command();
        cmd.push('\n');
        self.write_all(cmd.as_bytes()).map_err(GpsdClientError::Io)?;
        self.flush().map_err(GpsdClientError::Io)
    }
}

impl<W: std::io::Write + ?Sized> GpsdEncode for W {}
