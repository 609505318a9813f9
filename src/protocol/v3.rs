//! GPSD JSON protocol version 3
//!
//! Version 3 is the line-oriented JSON protocol spoken by GPSD 3.x:
//!
//! - Commands start with '?' and end with ';'
//! - Responses are JSON objects with a "class" field naming the message type
//! - Reports stream continuously while watch mode is enabled, or on demand
//!   via `?POLL;`
//!
//! # References
//!
//! - [GPSD Protocol Documentation](https://gpsd.io/gpsd_json.html)

use serde_json::Value;

use crate::{Result, error::GpsdClientError};

/// Request message types and command rendering
pub mod request;
/// Response message types and the decoded union
pub mod response;
/// Common data types used in protocol messages
pub mod types;

/// Type alias for version 3 response messages
pub type ResponseMessage = response::Message;

/// Type alias for version 3 request messages
pub type RequestMessage = request::Message;

/// Decodes one wire line into a typed response message
///
/// The line must be a JSON object carrying a string `class` discriminator.
/// Unknown discriminators are rejected with the raw line preserved, so a
/// newer daemon never crashes the client or yields a half-built message.
///
/// Empty lines are the caller's concern; the reader loop filters them
/// before decoding.
pub fn decode_line(line: &str) -> Result<ResponseMessage> {
    let value: Value = serde_json::from_str(line)?;
    let Some(class) = value.get("class").and_then(Value::as_str) else {
        return Err(GpsdClientError::MissingClass(line.to_string()));
    };
    if !response::KNOWN_CLASSES.contains(&class) {
        return Err(GpsdClientError::UnknownKind {
            class: class.to_string(),
            line: line.to_string(),
        });
    }
    serde_json::from_value(value).map_err(GpsdClientError::Serde)
}
