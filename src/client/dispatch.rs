//! Observer registry and event fan-out
//!
//! Unsolicited reports are pushed to registered observers in registration
//! order. An observer opts into the kinds it cares about by overriding the
//! matching handler; everything else defaults to a no-op, so a track-point
//! writer implements `on_tpv` and nothing more.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use log::error;

use crate::client::slot::lock;
use crate::protocol::v3::response::{Attitude, DeviceList, Message, Sky, Subframe, Tpv};
use crate::protocol::v3::types::Device;

/// Receiver of unsolicited daemon reports
///
/// All handlers default to no-ops. Handlers run on the reader thread, so
/// long-running work belongs on the observer's own thread; the registry
/// lock is not held during delivery, so an observer may add or remove
/// observers (itself included) from inside a handler.
pub trait GpsdObserver: Send + Sync {
    /// Time-position-velocity report
    fn on_tpv(&self, _tpv: &Tpv) {}
    /// Satellite sky view report
    fn on_sky(&self, _sky: &Sky) {}
    /// Attitude/orientation report
    fn on_att(&self, _att: &Attitude) {}
    /// GPS navigation subframe report
    fn on_subframe(&self, _subframe: &Subframe) {}
    /// Device list report
    fn on_devices(&self, _devices: &DeviceList) {}
    /// Single device descriptor report
    fn on_device(&self, _device: &Device) {}
}

/// Insertion-ordered observer registry with panic-isolated fan-out
pub(crate) struct Dispatcher {
    observers: Mutex<Vec<Arc<dyn GpsdObserver>>>,
}

impl Dispatcher {
    pub(crate) fn new() -> Self {
        Dispatcher {
            observers: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn add(&self, observer: Arc<dyn GpsdObserver>) {
        lock(&self.observers).push(observer);
    }

    /// Removes an observer by identity
    pub(crate) fn remove(&self, observer: &Arc<dyn GpsdObserver>) {
        lock(&self.observers).retain(|o| !Arc::ptr_eq(o, observer));
    }

    pub(crate) fn clear(&self) {
        lock(&self.observers).clear();
    }

    /// Fans one event message out to every observer in registration order
    ///
    /// The registry is snapshotted first: concurrent add/remove cannot
    /// disturb an in-flight pass, and the lock is released before any
    /// handler runs. A panicking handler is caught and logged; delivery
    /// to the remaining observers continues.
    pub(crate) fn dispatch(&self, msg: &Message) {
        let snapshot: Vec<Arc<dyn GpsdObserver>> = lock(&self.observers).clone();
        for observer in snapshot {
            let delivery = panic::catch_unwind(AssertUnwindSafe(|| match msg {
                Message::Tpv(tpv) => observer.on_tpv(tpv),
                Message::Sky(sky) => observer.on_sky(sky),
                Message::Att(att) => observer.on_att(att),
                Message::Subframe(subframe) => observer.on_subframe(subframe),
                Message::Devices(devices) => observer.on_devices(devices),
                Message::Device(device) => observer.on_device(device),
                // reply kinds never reach the dispatcher
                _ => {}
            }));
            if delivery.is_err() {
                error!(
                    "observer panicked while handling {:?}; continuing fan-out",
                    msg.kind()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::v3::types::FixMode;
    use std::sync::Mutex as StdMutex;

    fn tpv_msg(lat: f64) -> Message {
        let line = format!(r#"{{"class":"TPV","mode":3,"lat":{},"lon":2.0}}"#, lat);
        crate::protocol::v3::decode_line(&line).unwrap()
    }

    struct Recorder {
        name: &'static str,
        seen: Arc<StdMutex<Vec<&'static str>>>,
    }

    impl GpsdObserver for Recorder {
        fn on_tpv(&self, _tpv: &Tpv) {
            self.seen.lock().unwrap().push(self.name);
        }
    }

    struct Panicker;

    impl GpsdObserver for Panicker {
        fn on_tpv(&self, _tpv: &Tpv) {
            panic!("observer bug");
        }
    }

    #[test]
    fn fan_out_follows_registration_order() {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let dispatcher = Dispatcher::new();
        dispatcher.add(Arc::new(Recorder {
            name: "first",
            seen: Arc::clone(&seen),
        }));
        dispatcher.add(Arc::new(Recorder {
            name: "second",
            seen: Arc::clone(&seen),
        }));

        dispatcher.dispatch(&tpv_msg(1.0));
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn dispatch_with_no_observers_is_a_noop() {
        let dispatcher = Dispatcher::new();
        dispatcher.dispatch(&tpv_msg(1.0));
    }

    #[test]
    fn removed_observer_no_longer_receives() {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let dispatcher = Dispatcher::new();
        let observer: Arc<dyn GpsdObserver> = Arc::new(Recorder {
            name: "only",
            seen: Arc::clone(&seen),
        });
        dispatcher.add(Arc::clone(&observer));
        dispatcher.remove(&observer);

        dispatcher.dispatch(&tpv_msg(1.0));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn panicking_observer_does_not_stop_fan_out() {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let dispatcher = Dispatcher::new();
        dispatcher.add(Arc::new(Panicker));
        dispatcher.add(Arc::new(Recorder {
            name: "survivor",
            seen: Arc::clone(&seen),
        }));

        dispatcher.dispatch(&tpv_msg(1.0));
        assert_eq!(*seen.lock().unwrap(), vec!["survivor"]);
    }

    #[test]
    fn default_handlers_ignore_other_kinds() {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let dispatcher = Dispatcher::new();
        dispatcher.add(Arc::new(Recorder {
            name: "tpv-only",
            seen: Arc::clone(&seen),
        }));

        let sky = crate::protocol::v3::decode_line(r#"{"class":"SKY","satellites":[]}"#).unwrap();
        dispatcher.dispatch(&sky);
        assert!(seen.lock().unwrap().is_empty());
    }
}
