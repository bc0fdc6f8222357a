use crate::{
    CancellationToken, CurrentFixResponder, FixSink, LocationError, LocationProvider,
    LocationResult, Release, UpdateConfig,
};

/// Provider for targets without a location stack.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedProvider;

impl UnsupportedProvider {
    /// Creates the provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LocationProvider for UnsupportedProvider {
    fn request_current(
        &self,
        _token: CancellationToken,
        responder: CurrentFixResponder,
    ) -> Box<dyn Release> {
        responder.fail(LocationError::NotSupported);
        Box::new(())
    }

    fn start_updates(&self, _config: &UpdateConfig, _sink: FixSink) -> LocationResult<()> {
        Err(LocationError::NotSupported)
    }

    fn stop_updates(&self) {}

    fn is_service_enabled(&self) -> LocationResult<bool> {
        Ok(false)
    }
}
