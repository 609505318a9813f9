//! Threaded GPSD client endpoint
//!
//! [`GpsdEndpoint`] is the public surface of the client engine. It owns the
//! socket, a background reader thread, the reply hand-off slot, and the
//! observer registry, and serializes command issuance against all of them.
//!
//! The daemon protocol carries no request identifiers, so correlating a
//! synchronous command with its reply is done purely by message kind: the
//! six unsolicited report kinds always fan out to observers, and every
//! other message is offered to whichever synchronous caller is waiting.
//! A reply to someone else's command can therefore satisfy the wrong
//! waiter; the bounded-retry contract of [`GpsdEndpoint::issue_sync`] is
//! best-effort, not a guarantee.
//!
//! Connection loss is handled transparently: the reader thread reconnects
//! with a configurable backoff and replays the last watch command, so
//! observers see the outage only as a gap in reports.
//!
//! # Example
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
//!         println!("lat={:?} lon={:?} alt={:?}", tpv.lat, tpv.lon, tpv.alt);
//!     }
//! }
//!
//! # fn main() -> gpsd_client::Result<()> {
//! let endpoint = GpsdEndpoint::new("127.0.0.1", 2947);
//! endpoint.add_observer(Arc::new(Printer));
//! endpoint.start()?;
//! endpoint.watch(true, true);
//! // reports now stream to the observer until stop()
//! # Ok(())
//! # }
//! ```

/// Observer trait and event fan-out
pub mod dispatch;
mod position;
mod slot;
mod worker;

use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, warn};

pub use dispatch::GpsdObserver;

use crate::protocol::GpsdEncode;
use crate::protocol::v3::request;
use crate::protocol::v3::response::{self, MessageKind, Poll, Tpv, Version};
use crate::protocol::v3::types::{Device, Watch};
use crate::{Result, error::GpsdClientError};
use dispatch::Dispatcher;
use position::SharedPosition;
use slot::{ResponseSlot, ShutdownGate, lock};

/// Default wait window for one synchronous reply attempt
pub const DEFAULT_SYNC_WINDOW: Duration = Duration::from_secs(1);

/// Default number of reply attempts per synchronous command
pub const DEFAULT_SYNC_ATTEMPTS: u32 = 5;

/// Default pause between reconnection attempts
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(1000);

/// Live connection state, guarded by the command mutex
///
/// Only the thread holding the mutex may touch the stream or the
/// remembered watch command; the reconnect path acquires the same mutex
/// before swapping streams, so a writer never sees a half-replaced
/// session.
struct SessionState {
    stream: Option<TcpStream>,
    reader: Option<JoinHandle<()>>,
    /// Last applied watch command, replayed after a reconnect
    last_watch: Option<request::Message>,
}

pub(crate) struct Inner {
    host: String,
    port: u16,
    session: Mutex<SessionState>,
    slot: ResponseSlot,
    dispatcher: Dispatcher,
    position: SharedPosition,
    pub(crate) gate: ShutdownGate,
    retry_interval_ms: AtomicU64,
    sync_window_ms: AtomicU64,
    sync_attempts: AtomicU32,
}

impl Inner {
    pub(crate) fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms.load(Ordering::Relaxed))
    }

    fn sync_window(&self) -> Duration {
        Duration::from_millis(self.sync_window_ms.load(Ordering::Relaxed))
    }

    /// Routes one decoded message from the reader thread
    ///
    /// Event kinds fan out to observers (a TPV additionally refreshes the
    /// position snapshot); everything else is offered to the synchronous
    /// caller waiting on the slot, or dropped if nobody claims it.
    pub(crate) fn route(&self, msg: response::Message) {
        if msg.kind().is_event() {
            if let response::Message::Tpv(tpv) = &msg {
                self.position.update(tpv.clone());
            }
            self.dispatcher.dispatch(&msg);
        } else {
            self.slot.put(msg);
        }
    }

    /// Writes a command and waits for a reply of the expected kind
    ///
    /// The caller holds the session lock, so the write and the waits are
    /// totally ordered against every other command and against stream
    /// swaps. A watch command is remembered for replay before waiting.
    ///
    /// Each wait window that yields a non-matching reply is retried (the
    /// write is not), up to the attempt budget; an empty window means the
    /// connection is closed or the daemon is silent, and gives up at once.
    fn issue_sync_locked(
        &self,
        session: &mut SessionState,
        request: &request::Message,
        expected: MessageKind,
    ) -> Option<response::Message> {
        let Some(stream) = session.stream.as_mut() else {
            debug!("synchronous command issued while disconnected");
            return None;
        };
        if let Err(e) = stream.write_request(request) {
            warn!("command write failed: {e}");
            return None;
        }
        if let request::Message::Watch(_) = request {
            session.last_watch = Some(request.clone());
        }

        let window = self.sync_window();
        for _ in 0..self.sync_attempts.load(Ordering::Relaxed) {
            match self.slot.take(window) {
                None => return None,
                Some(msg) if msg.kind() == expected => return Some(msg),
                Some(other) => debug!(
                    "discarding {:?} reply while waiting for {:?}",
                    other.kind(),
                    expected
                ),
            }
        }
        None
    }

    /// Rebuilds the session after the reader lost the connection
    ///
    /// Connects outside the session lock so commands and `stop` are not
    /// held up by a slow connect, swaps streams and spawns the replacement
    /// reader under the lock, then replays the last watch command so the
    /// daemon resumes event emission exactly as before the outage.
    pub(crate) fn reestablish(self: &Arc<Self>) -> Result<()> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .map_err(GpsdClientError::Io)?;
        let reader_stream = stream.try_clone().map_err(GpsdClientError::Io)?;

        let mut session = lock(&self.session);
        if !self.gate.is_running() {
            // raced with stop; drop the fresh connection
            return Ok(());
        }
        session.stream = Some(stream);
        session.reader = Some(
            worker::spawn_reader(Arc::clone(self), reader_stream).map_err(GpsdClientError::Io)?,
        );
        if let Some(watch) = session.last_watch.clone() {
            if self
                .issue_sync_locked(&mut session, &watch, MessageKind::Watch)
                .is_none()
            {
                warn!("watch replay after reconnect got no confirmation");
            }
        }
        Ok(())
    }
}

/// GPSD client endpoint
///
/// Cheap to clone; all clones share one session. Construct with
/// [`GpsdEndpoint::new`], connect with [`GpsdEndpoint::start`], subscribe
/// observers, and enable watch mode to start the report stream.
#[derive(Clone)]
pub struct GpsdEndpoint {
    inner: Arc<Inner>,
}

impl GpsdEndpoint {
    /// Creates an endpoint for the daemon at `host:port`, not yet connected
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        GpsdEndpoint {
            inner: Arc::new(Inner {
                host: host.into(),
                port,
                session: Mutex::new(SessionState {
                    stream: None,
                    reader: None,
                    last_watch: None,
                }),
                slot: ResponseSlot::new(),
                dispatcher: Dispatcher::new(),
                position: SharedPosition::new(),
                gate: ShutdownGate::new(),
                retry_interval_ms: AtomicU64::new(DEFAULT_RETRY_INTERVAL.as_millis() as u64),
                sync_window_ms: AtomicU64::new(DEFAULT_SYNC_WINDOW.as_millis() as u64),
                sync_attempts: AtomicU32::new(DEFAULT_SYNC_ATTEMPTS),
            }),
        }
    }

    /// Opens the initial connection and spawns the reader thread
    ///
    /// Fails with [`GpsdClientError::Connection`] if the daemon is
    /// unreachable; the first connection is never retried implicitly.
    /// Failures after this call succeeds are handled by the automatic
    /// reconnection loop.
    pub fn start(&self) -> Result<()> {
        let mut session = lock(&self.inner.session);
        if session.reader.is_some() {
            return Err(GpsdClientError::AlreadyRunning);
        }
        let stream = TcpStream::connect((self.inner.host.as_str(), self.inner.port))
            .map_err(GpsdClientError::Connection)?;
        let reader_stream = stream.try_clone().map_err(GpsdClientError::Connection)?;

        self.inner.gate.arm();
        session.stream = Some(stream);
        session.reader = Some(
            worker::spawn_reader(Arc::clone(&self.inner), reader_stream)
                .map_err(GpsdClientError::Io)?,
        );
        Ok(())
    }

    /// Stops the endpoint: shuts the socket, halts the reader and any
    /// in-progress reconnect wait, and clears the observer registry
    ///
    /// Safe to call more than once. Shutting the socket unblocks a reader
    /// parked in a blocking read, and the gate unblocks a reconnect wait,
    /// so the reader thread exits promptly. Called from inside an observer
    /// callback (i.e. on the reader thread itself), the join is skipped.
    pub fn stop(&self) {
        self.inner.gate.shut();
        let reader = {
            let mut session = lock(&self.inner.session);
            if let Some(stream) = session.stream.take() {
                if let Err(e) = stream.shutdown(Shutdown::Both) {
                    debug!("socket close forced: {e}");
                }
            }
            session.reader.take()
        };
        self.inner.dispatcher.clear();

        if let Some(handle) = reader {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }

    /// Sends a command and waits for a reply of the expected kind
    ///
    /// Serialized against every other in-flight command. Returns `None`
    /// when no matching reply arrives within the bounded retry budget
    /// (see [`GpsdEndpoint::set_sync_window`] and
    /// [`GpsdEndpoint::set_sync_attempts`]), when the connection is down,
    /// or when the write fails; the caller treats `None` as an expected
    /// outcome, not a fault.
    pub fn issue_sync(
        &self,
        request: &request::Message,
        expected: MessageKind,
    ) -> Option<response::Message> {
        let mut session = lock(&self.inner.session);
        self.inner.issue_sync_locked(&mut session, request, expected)
    }

    /// Sends a command without waiting for any reply
    pub fn issue_async(&self, request: &request::Message) -> Result<()> {
        let mut session = lock(&self.inner.session);
        let stream = session
            .stream
            .as_mut()
            .ok_or(GpsdClientError::NotConnected)?;
        stream.write_request(request)
    }

    /// Sets watch mode for all devices
    ///
    /// In watch mode the daemon streams reports (TPV, SKY, ...) to this
    /// client; with `json` enabled they arrive as JSON objects. The
    /// command is remembered and replayed after a reconnect. Returns the
    /// daemon's policy echo, or `None` on timeout.
    pub fn watch(&self, enable: bool, json: bool) -> Option<Watch> {
        self.watch_device(enable, json, None)
    }

    /// Sets watch mode, optionally restricted to a single device path
    pub fn watch_device(&self, enable: bool, json: bool, device: Option<&str>) -> Option<Watch> {
        let policy = Watch {
            enable: Some(enable),
            json: Some(json),
            device: device.map(str::to_string),
            ..Default::default()
        };
        match self.issue_sync(&request::Message::Watch(Some(policy)), MessageKind::Watch) {
            Some(response::Message::Watch(watch)) => Some(watch),
            _ => None,
        }
    }

    /// Requests a snapshot of the current fix data
    ///
    /// The daemon answers `?POLL;` only for clients already in watch mode.
    pub fn poll(&self) -> Option<Poll> {
        match self.issue_sync(&request::Message::Poll, MessageKind::Poll) {
            Some(response::Message::Poll(poll)) => Some(poll),
            _ => None,
        }
    }

    /// Requests daemon version information
    pub fn version(&self) -> Option<Version> {
        match self.issue_sync(&request::Message::Version, MessageKind::Version) {
            Some(response::Message::Version(version)) => Some(version),
            _ => None,
        }
    }

    /// Asks the daemon to emit its device list
    ///
    /// Fire-and-forget: the DEVICES response is an event kind and arrives
    /// through [`GpsdObserver::on_devices`], not as a synchronous reply.
    pub fn request_devices(&self) -> Result<()> {
        self.issue_async(&request::Message::Devices)
    }

    /// Nudges a stalled device back to life, fire-and-forget
    ///
    /// See <https://lists.gnu.org/archive/html/gpsd-dev/2015-06/msg00001.html>
    pub fn kick_device(&self, path: &str) -> Result<()> {
        let device = Device {
            path: Some(path.to_string()),
            ..Default::default()
        };
        self.issue_async(&request::Message::Device(Some(device)))
    }

    /// Registers an observer for unsolicited reports
    pub fn add_observer(&self, observer: Arc<dyn GpsdObserver>) {
        self.inner.dispatcher.add(observer);
    }

    /// Removes an observer by identity
    pub fn remove_observer(&self, observer: &Arc<dyn GpsdObserver>) {
        self.inner.dispatcher.remove(observer);
    }

    /// Sets the pause between reconnection attempts
    ///
    /// Advisory, last-write-wins; read fresh on each retry iteration, so
    /// a change takes effect on the next attempt, not the current one.
    pub fn set_retry_interval(&self, interval: Duration) {
        self.inner
            .retry_interval_ms
            .store(interval.as_millis() as u64, Ordering::Relaxed);
    }

    /// Returns the pause between reconnection attempts
    pub fn retry_interval(&self) -> Duration {
        self.inner.retry_interval()
    }

    /// Sets the wait window for one synchronous reply attempt
    pub fn set_sync_window(&self, window: Duration) {
        self.inner
            .sync_window_ms
            .store(window.as_millis() as u64, Ordering::Relaxed);
    }

    /// Returns the wait window for one synchronous reply attempt
    pub fn sync_window(&self) -> Duration {
        self.inner.sync_window()
    }

    /// Sets how many reply attempts a synchronous command makes
    pub fn set_sync_attempts(&self, attempts: u32) {
        self.inner.sync_attempts.store(attempts, Ordering::Relaxed);
    }

    /// Returns how many reply attempts a synchronous command makes
    pub fn sync_attempts(&self) -> u32 {
        self.inner.sync_attempts.load(Ordering::Relaxed)
    }

    /// Returns the most recent position report, if any has arrived
    ///
    /// Refreshed by the reader thread on every TPV; collaborators that
    /// only need "where are we now" read this instead of observing the
    /// stream.
    pub fn last_position(&self) -> Option<Tpv> {
        self.inner.position.get()
    }
}
