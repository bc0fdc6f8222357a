use std::fmt;
use std::sync::{Arc, Mutex};

use async_channel::{Receiver, Sender};
use futures::channel::oneshot;
use serde::Deserialize;

use crate::{CancellationToken, LocationError, LocationFix, LocationResult, PlatformFix, Release};

/// Arguments of `start_location_service`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct UpdateConfig {
    /// Minimum distance in meters between updates. `None` means every update.
    #[serde(default)]
    pub distance_filter: Option<f64>,
}

impl UpdateConfig {
    /// Distance filter in meters, 0 when unset or negative.
    #[must_use]
    pub fn distance_filter_meters(&self) -> f64 {
        self.distance_filter
            .filter(|meters| meters.is_finite() && *meters > 0.0)
            .unwrap_or(0.0)
    }
}

/// How a single request ended on the platform side.
#[derive(Debug, Clone, PartialEq)]
pub enum CurrentOutcome {
    /// The platform answered, possibly without a fix.
    Delivered(Option<PlatformFix>),
    /// The platform canceled the request.
    Canceled,
    /// The request could not be issued or failed.
    Failed(LocationError),
}

/// Receiving half of a single request.
pub type CurrentFixReceiver = oneshot::Receiver<CurrentOutcome>;

/// Completion handle for a single request.
///
/// Consumed by the first answer, so a request completes at most once.
/// Dropping it unanswered reads as [`CurrentOutcome::Canceled`].
#[derive(Debug)]
pub struct CurrentFixResponder {
    sender: oneshot::Sender<CurrentOutcome>,
}

impl CurrentFixResponder {
    /// Creates a responder and the receiver it completes.
    #[must_use]
    pub fn channel() -> (Self, CurrentFixReceiver) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, receiver)
    }

    /// Answers with the platform result.
    pub fn deliver(self, fix: Option<PlatformFix>) {
        self.complete(CurrentOutcome::Delivered(fix));
    }

    /// Reports that the platform canceled the request.
    pub fn cancel(self) {
        self.complete(CurrentOutcome::Canceled);
    }

    /// Reports a failure.
    pub fn fail(self, error: LocationError) {
        self.complete(CurrentOutcome::Failed(error));
    }

    fn complete(self, outcome: CurrentOutcome) {
        if self.sender.send(outcome).is_err() {
            log::debug!("location request abandoned before the platform answered");
        }
    }
}

/// A replaceable update listener that outlives individual subscriptions.
///
/// At most one listener is attached. Attaching a new one closes the previous
/// channel, and updates arriving while nothing is attached are dropped.
#[derive(Clone, Default)]
pub struct ListenerSlot {
    current: Arc<Mutex<Option<Sender<LocationFix>>>>,
}

impl ListenerSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a fresh listener, replacing the previous one.
    ///
    /// The previous receiver yields what was already queued, then ends.
    #[must_use]
    pub fn attach(&self) -> Receiver<LocationFix> {
        let (sender, receiver) = async_channel::unbounded();
        let previous = self
            .current
            .lock()
            .expect("listener slot mutex poisoned")
            .replace(sender);
        if previous.is_some() {
            log::debug!("replacing location event listener");
        }
        receiver
    }

    /// Whether a live listener is attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.current
            .lock()
            .expect("listener slot mutex poisoned")
            .as_ref()
            .is_some_and(|sender| !sender.is_closed())
    }

    fn send(&self, fix: LocationFix) -> bool {
        let mut current = self.current.lock().expect("listener slot mutex poisoned");
        let Some(sender) = current.as_ref() else {
            log::debug!("no location event listener, dropping update");
            return false;
        };
        if sender.try_send(fix).is_ok() {
            return true;
        }
        log::debug!("location event listener went away, dropping update");
        current.take();
        false
    }
}

impl fmt::Debug for ListenerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSlot")
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[derive(Clone)]
enum Target {
    Channel(Sender<LocationFix>),
    Listener(ListenerSlot),
}

/// Push side of an update stream.
///
/// Each delivered platform fix is normalized and queued as exactly one
/// [`LocationFix`], in call order.
#[derive(Clone)]
pub struct FixSink {
    target: Target,
}

impl FixSink {
    /// Wraps the sending half of an update channel.
    #[must_use]
    pub const fn new(sender: Sender<LocationFix>) -> Self {
        Self {
            target: Target::Channel(sender),
        }
    }

    /// Forwards to whichever listener is attached to `slot` at delivery time.
    #[must_use]
    pub const fn forwarding(slot: ListenerSlot) -> Self {
        Self {
            target: Target::Listener(slot),
        }
    }

    /// Normalizes and queues one update.
    ///
    /// Returns `false` if nobody is listening, in which case the update is
    /// dropped.
    pub fn deliver(&self, fix: PlatformFix) -> bool {
        match &self.target {
            Target::Channel(sender) => match sender.try_send(fix.into()) {
                Ok(()) => true,
                Err(err) => {
                    log::warn!("dropping location update: {err}");
                    false
                }
            },
            Target::Listener(slot) => slot.send(fix.into()),
        }
    }

    /// Whether the receiving side is gone for good.
    ///
    /// A forwarding sink never closes, since a listener can attach later.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match &self.target {
            Target::Channel(sender) => sender.is_closed(),
            Target::Listener(_) => false,
        }
    }
}

impl fmt::Debug for FixSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixSink")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A platform location stack.
///
/// Implementations forward to the OS and call back from OS threads. They keep
/// no state about earlier requests beyond the active update subscription.
pub trait LocationProvider: Send + Sync + fmt::Debug {
    /// Issues a single request at the highest accuracy.
    ///
    /// The provider must answer `responder` at most once and should not
    /// answer once `token` is cancelled. The returned hook is released
    /// exactly once, as soon as the request is answered or abandoned.
    fn request_current(
        &self,
        token: CancellationToken,
        responder: CurrentFixResponder,
    ) -> Box<dyn Release>;

    /// Starts delivering updates to `sink`, replacing any previous sink.
    ///
    /// # Errors
    /// Returns a [`LocationError`] if the platform refuses to start.
    fn start_updates(&self, config: &UpdateConfig, sink: FixSink) -> LocationResult<()>;

    /// Stops updates and drops the sink. Does nothing if not started.
    fn stop_updates(&self);

    /// Whether the device's location services are switched on.
    ///
    /// # Errors
    /// Returns a [`LocationError`] if the platform query fails.
    fn is_service_enabled(&self) -> LocationResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_filter_defaults_to_zero() {
        let parsed: UpdateConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.distance_filter_meters(), 0.0);

        let parsed: UpdateConfig = serde_json::from_str(r#"{"distance_filter": null}"#).unwrap();
        assert_eq!(parsed.distance_filter_meters(), 0.0);

        let parsed: UpdateConfig = serde_json::from_str(r#"{"distance_filter": 25.5}"#).unwrap();
        assert_eq!(parsed.distance_filter_meters(), 25.5);

        let negative = UpdateConfig {
            distance_filter: Some(-3.0),
        };
        assert_eq!(negative.distance_filter_meters(), 0.0);
    }

    #[test]
    fn dropped_responder_reads_as_canceled() {
        let (responder, mut receiver) = CurrentFixResponder::channel();
        drop(responder);
        assert!(matches!(receiver.try_recv(), Err(oneshot::Canceled)));
    }

    fn at(latitude: f64) -> PlatformFix {
        PlatformFix::Apple(crate::AppleFix {
            latitude,
            longitude: 0.0,
            altitude: 0.0,
            horizontal_accuracy: 0.0,
            course: 0.0,
            speed: 0.0,
            timestamp: 0.0,
        })
    }

    #[test]
    fn sink_reports_closed_receiver() {
        let (sender, receiver) = async_channel::unbounded();
        let sink = FixSink::new(sender);
        drop(receiver);

        assert!(sink.is_closed());
        assert!(!sink.deliver(at(0.0)));
    }

    #[test]
    fn unattached_slot_drops_updates() {
        let slot = ListenerSlot::new();
        let sink = FixSink::forwarding(slot.clone());

        assert!(!sink.deliver(at(1.0)));
        assert!(!sink.is_closed());

        let receiver = slot.attach();
        assert!(receiver.is_empty());
        assert!(sink.deliver(at(2.0)));
        assert_eq!(receiver.try_recv().map(|fix| fix.latitude), Ok(2.0));
    }

    #[test]
    fn attaching_closes_the_previous_listener() {
        let slot = ListenerSlot::new();
        let sink = FixSink::forwarding(slot.clone());

        let first = slot.attach();
        assert!(sink.deliver(at(1.0)));
        let second = slot.attach();
        assert!(sink.deliver(at(2.0)));

        assert_eq!(first.try_recv().map(|fix| fix.latitude), Ok(1.0));
        assert!(first.is_closed());
        assert_eq!(second.try_recv().map(|fix| fix.latitude), Ok(2.0));
        assert!(second.is_empty());
    }

    #[test]
    fn dropped_listener_detaches() {
        let slot = ListenerSlot::new();
        let sink = FixSink::forwarding(slot.clone());

        drop(slot.attach());
        assert!(!slot.is_attached());
        assert!(!sink.deliver(at(1.0)));
    }
}
