//! Apple platform (iOS/macOS) location provider using swift-bridge.
//!
//! `LocationHelper.swift` owns a `CLLocationManager` and reports back through
//! `EventRelay` as JSON events, one per delegate callback.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use log::error;
use serde::Deserialize;

use crate::{
    AppleFix, CancellationToken, CurrentFixResponder, FixSink, LocationError, LocationProvider,
    LocationResult, PlatformFix, Release, UpdateConfig,
};

#[swift_bridge::bridge]
mod ffi {
    extern "Rust" {
        type EventRelay;

        fn dispatch_event(self: &EventRelay, json_event: &str);
    }

    extern "Swift" {
        type AppleLocationManager;

        #[swift_bridge(init)]
        fn new(relay: EventRelay) -> AppleLocationManager;

        fn request_current(self: &AppleLocationManager);
        fn start_updates(self: &AppleLocationManager, distance_filter: f64);
        fn stop_updates(self: &AppleLocationManager);
        fn services_enabled(self: &AppleLocationManager) -> bool;
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ManagerEvent {
    Current { fix: Option<AppleFix> },
    CurrentFailed { message: String },
    Update { fix: AppleFix },
}

#[derive(Default)]
struct RelayState {
    next_waiter: AtomicU64,
    waiting: Mutex<Vec<(u64, CurrentFixResponder)>>,
    sink: Mutex<Option<FixSink>>,
}

impl RelayState {
    fn take_waiting(&self) -> Vec<(u64, CurrentFixResponder)> {
        std::mem::take(&mut *self.waiting.lock().expect("poisoned waiter list"))
    }
}

struct EventRelay {
    state: Arc<RelayState>,
}

impl EventRelay {
    fn dispatch_event(&self, json_event: &str) {
        let event = match serde_json::from_str::<ManagerEvent>(json_event) {
            Ok(event) => event,
            Err(err) => {
                error!("undecodable CoreLocation event: {err}");
                return;
            }
        };

        match event {
            ManagerEvent::Current { fix } => {
                for (_, responder) in self.state.take_waiting() {
                    responder.deliver(fix.clone().map(PlatformFix::Apple));
                }
            }
            ManagerEvent::CurrentFailed { message } => {
                for (_, responder) in self.state.take_waiting() {
                    responder.fail(LocationError::Platform {
                        message: message.clone(),
                    });
                }
            }
            ManagerEvent::Update { fix } => {
                let sink = self.state.sink.lock().expect("poisoned sink").clone();
                if let Some(sink) = sink {
                    sink.deliver(PlatformFix::Apple(fix));
                }
            }
        }
    }
}

/// A queued waiter, dropped from the list when its request ends.
struct Waiter {
    id: u64,
    state: Weak<RelayState>,
}

impl Release for Waiter {
    fn release(self: Box<Self>) {
        if let Some(state) = self.state.upgrade() {
            state
                .waiting
                .lock()
                .expect("poisoned waiter list")
                .retain(|(waiter, _)| *waiter != self.id);
        }
    }
}

impl fmt::Debug for EventRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRelay").finish()
    }
}

/// Provider backed by `CLLocationManager`.
///
/// Concurrent single requests share the next fix the manager reports.
pub struct AppleLocationProvider {
    manager: Mutex<ffi::AppleLocationManager>,
    state: Arc<RelayState>,
}

// Safety: AppleLocationManager is protected by a Mutex. The Swift side hops to
// the main queue before touching CLLocationManager.
#[allow(clippy::non_send_fields_in_send_ty)]
unsafe impl Send for AppleLocationProvider {}
unsafe impl Sync for AppleLocationProvider {}

impl fmt::Debug for AppleLocationProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppleLocationProvider").finish()
    }
}

impl Default for AppleLocationProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl AppleLocationProvider {
    /// Creates the provider and its `CLLocationManager`.
    #[must_use]
    pub fn new() -> Self {
        let state = Arc::new(RelayState::default());
        let relay = EventRelay {
            state: state.clone(),
        };
        Self {
            manager: Mutex::new(ffi::AppleLocationManager::new(relay)),
            state,
        }
    }

    fn with_manager<T>(&self, action: impl FnOnce(&ffi::AppleLocationManager) -> T) -> T {
        let guard = self.manager.lock().expect("poisoned manager mutex");
        action(&guard)
    }
}

impl LocationProvider for AppleLocationProvider {
    fn request_current(
        &self,
        _token: CancellationToken,
        responder: CurrentFixResponder,
    ) -> Box<dyn Release> {
        let id = self.state.next_waiter.fetch_add(1, Ordering::Relaxed);
        self.state
            .waiting
            .lock()
            .expect("poisoned waiter list")
            .push((id, responder));

        self.with_manager(|manager| manager.request_current());
        Box::new(Waiter {
            id,
            state: Arc::downgrade(&self.state),
        })
    }

    fn start_updates(&self, config: &UpdateConfig, sink: FixSink) -> LocationResult<()> {
        *self.state.sink.lock().expect("poisoned sink") = Some(sink);
        let distance = config.distance_filter_meters();
        self.with_manager(|manager| manager.start_updates(distance));
        Ok(())
    }

    fn stop_updates(&self) {
        if self.state.sink.lock().expect("poisoned sink").take().is_some() {
            self.with_manager(|manager| manager.stop_updates());
        }
    }

    fn is_service_enabled(&self) -> LocationResult<bool> {
        Ok(self.with_manager(|manager| manager.services_enabled()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_manager_events() {
        let event: ManagerEvent = serde_json::from_str(r#"{"type":"current","fix":null}"#).unwrap();
        assert!(matches!(event, ManagerEvent::Current { fix: None }));

        let event: ManagerEvent = serde_json::from_str(
            r#"{"type":"update","fix":{"latitude":1.0,"longitude":2.0,"altitude":3.0,
                "horizontal_accuracy":4.0,"course":-1.0,"speed":-1.0,"timestamp":5.0}}"#,
        )
        .unwrap();
        assert!(matches!(event, ManagerEvent::Update { .. }));
    }
}
