//! Last-known-position snapshot
//!
//! Collaborators outside the protocol engine (indicator drivers, track
//! writers) read the most recent position on their own schedule instead
//! of subscribing to the event stream. The reader loop refreshes this
//! cell on every TPV report; no history is kept.

use std::sync::Mutex;

use crate::client::slot::lock;
use crate::protocol::v3::response::Tpv;

pub(crate) struct SharedPosition {
    current: Mutex<Option<Tpv>>,
}

impl SharedPosition {
    pub(crate) fn new() -> Self {
        SharedPosition {
            current: Mutex::new(None),
        }
    }

    pub(crate) fn update(&self, tpv: Tpv) {
        *lock(&self.current) = Some(tpv);
    }

    pub(crate) fn get(&self) -> Option<Tpv> {
        lock(&self.current).clone()
    }
}
