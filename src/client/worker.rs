//! Background reader thread and reconnection loop
//!
//! One reader thread is alive per connection, at most one at a time. The
//! loop pulls newline-framed JSON off the socket, decodes each line, and
//! hands the typed message to the endpoint for routing. When the stream
//! dies while the endpoint is still running, the same thread turns into
//! the reconnection controller: it backs off, rebuilds the session, and
//! retires once a replacement reader has been spawned.

use std::io::{BufRead, BufReader};
use std::net::TcpStream;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, warn};

use crate::client::Inner;
use crate::protocol::v3;

pub(crate) fn spawn_reader(
    inner: Arc<Inner>,
    stream: TcpStream,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("gpsd-reader".into())
        .spawn(move || run(inner, stream))
}

fn run(inner: Arc<Inner>, stream: TcpStream) {
    read_loop(&inner, stream);
    if inner.gate.is_running() {
        warn!("lost connection to gpsd, entering reconnect loop");
        reconnect(&inner);
    }
}

/// Reads and routes lines until EOF, a transport error, or shutdown
///
/// A line that fails to decode is logged and dropped; a single bad line
/// never terminates the loop.
fn read_loop(inner: &Arc<Inner>, stream: TcpStream) {
    let mut reader = BufReader::new(stream);
    let mut buf = String::new();
    while inner.gate.is_running() {
        buf.clear();
        match reader.read_line(&mut buf) {
            Ok(0) => break, // EOF
            Ok(_) => {
                let line = buf.trim();
                if line.is_empty() {
                    continue;
                }
                match v3::decode_line(line) {
                    Ok(msg) => inner.route(msg),
                    Err(e) => warn!("dropping undecodable line: {e}"),
                }
            }
            Err(e) => {
                debug!("socket read failed: {e}");
                break;
            }
        }
    }
}

/// Backs off and retries until the session is rebuilt or the gate shuts
///
/// The retry interval is read fresh each iteration, so a policy change
/// takes effect on the next attempt. The backoff parks on the shutdown
/// gate, so `stop` aborts the wait immediately.
fn reconnect(inner: &Arc<Inner>) {
    loop {
        if !inner.gate.sleep_while_running(inner.retry_interval()) {
            return; // stopped
        }
        match inner.reestablish() {
            Ok(()) => {
                debug!("reconnected to gpsd");
                return;
            }
            Err(e) => debug!("still disconnected from gpsd: {e}"),
        }
    }
}
