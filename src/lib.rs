//! # gpsd-client
//!
//! A threaded Rust client engine for GPSD (GPS Service Daemon) and its
//! JSON protocol.
//!
//! ## Overview
//!
//! GPSD monitors one or more GPS receivers attached to a host and makes
//! their reports available over TCP port 2947 as newline-delimited JSON.
//! This crate implements the client side of that protocol as a
//! thread-per-session engine:
//!
//! - a background reader decodes each line into a typed message,
//! - unsolicited reports fan out to registered observers,
//! - synchronous commands are correlated with their replies by message
//!   kind (the protocol carries no request identifiers),
//! - a lost connection is re-established automatically and the previous
//!   watch mode replayed, so callers observe an outage only as latency.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gpsd_client::client::{GpsdEndpoint, GpsdObserver};
//! use gpsd_client::protocol::v3::response::Tpv;
//!
//! struct Printer;
//!
//! impl GpsdObserver for Printer {
//!     fn on_tpv(&self, tpv: &Tpv) {
//!         println!("position: {:?} {:?}", tpv.lat, tpv.lon);
//!     }
//! }
//!
//! # fn main() -> gpsd_client::Result<()> {
//! let endpoint = GpsdEndpoint::new("127.0.0.1", 2947);
//! endpoint.add_observer(Arc::new(Printer));
//! endpoint.start()?;
//! endpoint.watch(true, true);
//! # Ok(())
//! # }
//! ```

use crate::error::GpsdClientError;

/// Client endpoint: connection lifecycle, command correlation, fan-out
#[cfg(feature = "proto-v3")]
pub mod client;

/// Error types used throughout the library
pub mod error;

/// Protocol definitions and message parsing for the GPSD JSON protocol
pub mod protocol;

/// Convenience type alias for Results with GpsdClientError
pub type Result<T> = core::result::Result<T, GpsdClientError>;
