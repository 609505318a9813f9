//! Thread-safe hand-off primitives for the reader loop
//!
//! [`ResponseSlot`] is the rendezvous point between the background reader
//! and a caller blocked in a synchronous command: a single-item cell with
//! notify-on-put and timed take. [`ShutdownGate`] is a waitable running
//! flag that makes the reconnect backoff interruptible by `stop`.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::protocol::v3::response::Message;

/// Locks a mutex, recovering the guard if a panicking holder poisoned it
///
/// Observer callbacks run caught-panic, so poisoning is already unlikely;
/// recovering keeps the protocol engine alive either way.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Single-item reply cell
///
/// Holds at most one pending message. A value is claimed by at most one
/// taker (consume-on-read); a value nobody claims is replaced by the next
/// put. There is no queue: the endpoint's command mutex guarantees at most
/// one taker at a time, and replies the daemon volunteers between commands
/// are intentionally dropped.
pub(crate) struct ResponseSlot {
    value: Mutex<Option<Message>>,
    available: Condvar,
}

impl ResponseSlot {
    pub(crate) fn new() -> Self {
        ResponseSlot {
            value: Mutex::new(None),
            available: Condvar::new(),
        }
    }

    /// Stores a message, replacing any unclaimed one, and wakes takers
    pub(crate) fn put(&self, msg: Message) {
        let mut value = lock(&self.value);
        *value = Some(msg);
        self.available.notify_all();
    }

    /// Waits up to `window` for a message and claims it
    ///
    /// The predicate is re-checked under the slot lock, so a put racing
    /// this call is never lost; spurious wakeups re-enter the wait with
    /// the remaining time.
    pub(crate) fn take(&self, window: Duration) -> Option<Message> {
        let deadline = Instant::now() + window;
        let mut value = lock(&self.value);
        while value.is_none() {
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            value = self
                .available
                .wait_timeout(value, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        value.take()
    }
}

/// Waitable running flag
///
/// Armed at `start`, shut at `stop`. The reconnect loop parks on
/// [`ShutdownGate::sleep_while_running`] between attempts so a shutdown
/// aborts the wait immediately instead of after the full retry interval.
pub(crate) struct ShutdownGate {
    running: Mutex<bool>,
    changed: Condvar,
}

impl ShutdownGate {
    pub(crate) fn new() -> Self {
        ShutdownGate {
            running: Mutex::new(false),
            changed: Condvar::new(),
        }
    }

    /// Marks the endpoint as running
    pub(crate) fn arm(&self) {
        *lock(&self.running) = true;
    }

    /// Marks the endpoint as stopped and wakes every parked waiter
    pub(crate) fn shut(&self) {
        *lock(&self.running) = false;
        self.changed.notify_all();
    }

    pub(crate) fn is_running(&self) -> bool {
        *lock(&self.running)
    }

    /// Sleeps for `interval` unless the gate is shut first
    ///
    /// Returns whether the endpoint is still running afterwards. A zero
    /// interval returns immediately, so a zero retry policy reconnects
    /// without any minimum wait.
    pub(crate) fn sleep_while_running(&self, interval: Duration) -> bool {
        let deadline = Instant::now() + interval;
        let mut running = lock(&self.running);
        while *running {
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            running = self
                .changed
                .wait_timeout(running, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::v3::response::{Error, MessageKind};
    use std::sync::Arc;
    use std::thread;

    fn error_msg(text: &str) -> Message {
        Message::Error(Error {
            message: text.to_string(),
        })
    }

    #[test]
    fn put_then_take_claims_the_value() {
        let slot = ResponseSlot::new();
        slot.put(error_msg("a"));
        let msg = slot.take(Duration::from_millis(10)).unwrap();
        assert_eq!(msg.kind(), MessageKind::Error);
        // consume-on-read: the slot is empty again
        assert!(slot.take(Duration::from_millis(1)).is_none());
    }

    #[test]
    fn take_times_out_on_empty_slot() {
        let slot = ResponseSlot::new();
        let started = Instant::now();
        assert!(slot.take(Duration::from_millis(50)).is_none());
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn put_wakes_a_parked_taker() {
        let slot = Arc::new(ResponseSlot::new());
        let writer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                slot.put(error_msg("late"));
            })
        };
        assert!(slot.take(Duration::from_secs(2)).is_some());
        writer.join().unwrap();
    }

    #[test]
    fn unclaimed_value_is_replaced_by_the_next_put() {
        let slot = ResponseSlot::new();
        slot.put(error_msg("first"));
        slot.put(error_msg("second"));
        let Some(Message::Error(err)) = slot.take(Duration::from_millis(10)) else {
            panic!("expected a value");
        };
        assert_eq!(err.message, "second");
    }

    #[test]
    fn gate_sleep_reports_shutdown() {
        let gate = Arc::new(ShutdownGate::new());
        gate.arm();
        let sleeper = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.sleep_while_running(Duration::from_secs(30)))
        };
        thread::sleep(Duration::from_millis(30));
        gate.shut();
        let started = Instant::now();
        assert!(!sleeper.join().unwrap());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn gate_zero_interval_returns_immediately() {
        let gate = ShutdownGate::new();
        gate.arm();
        assert!(gate.sleep_while_running(Duration::ZERO));
        gate.shut();
        assert!(!gate.sleep_while_running(Duration::ZERO));
    }
}
