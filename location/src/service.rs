use std::pin::Pin;
use std::sync::{Arc, Mutex};

use futures::Stream;
use tokio_util::sync::CancellationToken;

use crate::{
    CurrentFixResponder, CurrentOutcome, FixSink, LocationError, LocationFix, LocationProvider,
    LocationResult, RequestGuard, UpdateConfig,
};

/// A boxed stream of normalized updates.
pub type LocationStream = Pin<Box<dyn Stream<Item = LocationFix> + Send>>;

/// Single requests and update subscriptions over a [`LocationProvider`].
#[derive(Debug)]
pub struct LocationService {
    provider: Arc<dyn LocationProvider>,
    subscription: Mutex<Option<FixSink>>,
}

impl LocationService {
    /// Creates a service over `provider`.
    pub fn new(provider: Arc<dyn LocationProvider>) -> Self {
        Self {
            provider,
            subscription: Mutex::new(None),
        }
    }

    /// Creates a service over this platform's provider.
    #[must_use]
    pub fn platform() -> Self {
        Self::new(Arc::new(crate::sys::PlatformProvider::new()))
    }

    /// Requests one fix at the highest accuracy.
    ///
    /// The request's token is cancelled and the provider's release hook runs
    /// as soon as the platform answers, or when the returned future is dropped.
    ///
    /// # Errors
    /// - [`LocationError::Empty`] if the platform answered without a fix.
    /// - [`LocationError::Canceled`] if the platform canceled the request.
    /// - Any failure the provider reports.
    pub async fn current_location(&self) -> LocationResult<LocationFix> {
        let token = CancellationToken::new();
        let (responder, receiver) = CurrentFixResponder::channel();
        let release = self.provider.request_current(token.clone(), responder);
        let request = RequestGuard::new(token, release);

        let outcome = receiver.await.unwrap_or(CurrentOutcome::Canceled);
        drop(request);

        match outcome {
            CurrentOutcome::Delivered(Some(fix)) => Ok(fix.into()),
            CurrentOutcome::Delivered(None) => Err(LocationError::Empty),
            CurrentOutcome::Canceled => Err(LocationError::Canceled),
            CurrentOutcome::Failed(err) => Err(err),
        }
    }

    /// Starts a fresh update subscription and returns its stream.
    ///
    /// Any active subscription is stopped first, which ends its stream.
    ///
    /// # Errors
    /// Returns a [`LocationError`] if the platform refuses to start.
    pub fn start_updates(&self, config: &UpdateConfig) -> LocationResult<LocationStream> {
        let (sender, receiver) = async_channel::unbounded();
        self.start_with_sink(config, FixSink::new(sender))?;
        Ok(Box::pin(receiver))
    }

    /// Starts an update subscription that feeds an existing sink.
    ///
    /// # Errors
    /// Returns a [`LocationError`] if the platform refuses to start.
    pub fn start_with_sink(&self, config: &UpdateConfig, sink: FixSink) -> LocationResult<()> {
        let mut subscription = self
            .subscription
            .lock()
            .expect("subscription mutex poisoned");

        if subscription.take().is_some() {
            log::debug!("replacing active location subscription");
            self.provider.stop_updates();
        }

        self.provider.start_updates(config, sink.clone())?;
        log::debug!(
            "location updates started, distance filter {} m",
            config.distance_filter_meters()
        );
        *subscription = Some(sink);
        Ok(())
    }

    /// Stops the active subscription. Does nothing if none is active.
    pub fn stop_updates(&self) {
        let previous = self
            .subscription
            .lock()
            .expect("subscription mutex poisoned")
            .take();

        if previous.is_some() {
            self.provider.stop_updates();
            log::debug!("location updates stopped");
        }
    }

    /// Whether a subscription is active.
    pub fn is_updating(&self) -> bool {
        self.subscription
            .lock()
            .expect("subscription mutex poisoned")
            .is_some()
    }

    /// Whether the device's location services are switched on.
    ///
    /// # Errors
    /// Returns a [`LocationError`] if the platform query fails.
    pub fn is_service_enabled(&self) -> LocationResult<bool> {
        self.provider.is_service_enabled()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::{FutureExt, StreamExt};

    use super::*;
    use crate::{AndroidFix, PlatformFix, Release};

    #[derive(Debug, Clone, Copy)]
    enum Script {
        Fix,
        Empty,
        Cancel,
        Silent,
    }

    #[derive(Debug)]
    struct ScriptedProvider {
        script: Script,
        releases: Arc<AtomicUsize>,
        token: Mutex<Option<CancellationToken>>,
        responder: Mutex<Option<CurrentFixResponder>>,
        sink: Mutex<Option<FixSink>>,
        stops: AtomicUsize,
    }

    struct CountRelease(Arc<AtomicUsize>);

    impl Release for CountRelease {
        fn release(self: Box<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl ScriptedProvider {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                script,
                releases: Arc::new(AtomicUsize::new(0)),
                token: Mutex::new(None),
                responder: Mutex::new(None),
                sink: Mutex::new(None),
                stops: AtomicUsize::new(0),
            })
        }

        fn push(&self, fix: AndroidFix) {
            let sink = self.sink.lock().unwrap().clone().expect("not started");
            sink.deliver(PlatformFix::Android(fix));
        }
    }

    impl LocationProvider for ScriptedProvider {
        fn request_current(
            &self,
            token: CancellationToken,
            responder: CurrentFixResponder,
        ) -> Box<dyn Release> {
            *self.token.lock().unwrap() = Some(token);

            match self.script {
                Script::Fix => responder.deliver(Some(sample(1_000).into())),
                Script::Empty => responder.deliver(None),
                Script::Cancel => responder.cancel(),
                Script::Silent => *self.responder.lock().unwrap() = Some(responder),
            }
            Box::new(CountRelease(self.releases.clone()))
        }

        fn start_updates(&self, _config: &UpdateConfig, sink: FixSink) -> LocationResult<()> {
            *self.sink.lock().unwrap() = Some(sink);
            Ok(())
        }

        fn stop_updates(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.sink.lock().unwrap().take();
        }

        fn is_service_enabled(&self) -> LocationResult<bool> {
            Ok(true)
        }
    }

    fn sample(time: i64) -> AndroidFix {
        AndroidFix {
            latitude: 48.8566,
            longitude: 2.3522,
            altitude: 35.0,
            accuracy: 8.0,
            bearing: 90.0,
            speed: 2.0,
            time,
            is_from_mock_provider: false,
        }
    }

    #[tokio::test]
    async fn delivered_fix_is_normalized_and_handle_released_once() {
        let provider = ScriptedProvider::new(Script::Fix);
        let service = LocationService::new(provider.clone());

        let fix = service.current_location().await.unwrap();

        assert_eq!(fix.latitude, 48.8566);
        assert_eq!(fix.longitude, 2.3522);
        assert_eq!(fix.time, 1_000.0);
        assert_eq!(provider.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_result_is_an_error_not_a_zero_fix() {
        let provider = ScriptedProvider::new(Script::Empty);
        let service = LocationService::new(provider.clone());

        assert_eq!(service.current_location().await, Err(LocationError::Empty));
        assert_eq!(provider.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn platform_cancel_is_reported() {
        let provider = ScriptedProvider::new(Script::Cancel);
        let service = LocationService::new(provider.clone());

        assert_eq!(
            service.current_location().await,
            Err(LocationError::Canceled)
        );
        assert_eq!(provider.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn abandoned_request_releases_handle() {
        let provider = ScriptedProvider::new(Script::Silent);
        let service = LocationService::new(provider.clone());

        assert!(service.current_location().now_or_never().is_none());

        let token = provider.token.lock().unwrap().clone().unwrap();
        assert!(token.is_cancelled());
        assert_eq!(provider.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn updates_arrive_in_order_without_coalescing() {
        let provider = ScriptedProvider::new(Script::Fix);
        let service = LocationService::new(provider.clone());

        let mut stream = service.start_updates(&UpdateConfig::default()).unwrap();
        provider.push(sample(1));
        provider.push(sample(1));
        provider.push(sample(2));
        service.stop_updates();

        let times: Vec<f64> = stream.by_ref().map(|fix| fix.time).collect().await;
        assert_eq!(times, vec![1.0, 1.0, 2.0]);
    }

    #[test]
    fn stop_without_subscription_is_a_no_op() {
        let provider = ScriptedProvider::new(Script::Fix);
        let service = LocationService::new(provider.clone());

        service.stop_updates();
        service.stop_updates();

        assert_eq!(provider.stops.load(Ordering::SeqCst), 0);
        assert!(!service.is_updating());
    }

    #[tokio::test]
    async fn restart_ends_previous_stream() {
        let provider = ScriptedProvider::new(Script::Fix);
        let service = LocationService::new(provider.clone());

        let first = service.start_updates(&UpdateConfig::default()).unwrap();
        let mut second = service.start_updates(&UpdateConfig::default()).unwrap();
        provider.push(sample(7));

        let drained: Vec<LocationFix> = first.collect().await;
        assert!(drained.is_empty());
        assert_eq!(second.next().await.map(|fix| fix.time), Some(7.0));
        assert_eq!(provider.stops.load(Ordering::SeqCst), 1);
        assert!(service.is_updating());
    }
}
