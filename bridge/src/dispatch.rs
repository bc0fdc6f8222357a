use std::fmt;
use std::sync::Arc;

use bglocation_location::{
    FixSink, ListenerSlot, LocationError, LocationFix, LocationResult, LocationService,
    LocationStream, UpdateConfig,
};
use bglocation_permission::{PermissionError, PermissionInspector, PermissionStatus};
use serde_json::Value;

use crate::collab::{PreferenceStore, REQUESTING_LOCATION_UPDATES, SettingsNavigator};
use crate::wire::{Method, MethodCall, Platform, Reply};
use crate::BridgeError;

/// Routes host calls to the location service, the permission classifier and
/// the OS collaborators, and owns the event channel.
///
/// The event listener outlives individual subscriptions, so stopping and
/// restarting the location service keeps feeding the same [`Bridge::events`]
/// stream. Updates arriving while no listener is attached are dropped.
pub struct Bridge {
    location: LocationService,
    permissions: Arc<dyn PermissionInspector>,
    settings: Arc<dyn SettingsNavigator>,
    preferences: Arc<dyn PreferenceStore>,
    platform: Platform,
    listener: ListenerSlot,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("location", &self.location)
            .field("permissions", &self.permissions)
            .field("settings", &self.settings)
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

impl Bridge {
    /// Creates a bridge over explicit collaborators.
    pub fn new(
        location: LocationService,
        permissions: Arc<dyn PermissionInspector>,
        settings: Arc<dyn SettingsNavigator>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        Self {
            location,
            permissions,
            settings,
            preferences,
            platform: Platform::current(),
            listener: ListenerSlot::new(),
        }
    }

    /// Creates a bridge over this platform's backends.
    ///
    /// On Android, [`crate::sys::android::init`] must have been called first.
    #[must_use]
    pub fn platform() -> Self {
        Self::new(
            LocationService::platform(),
            Arc::new(bglocation_permission::sys::PlatformInspector::new()),
            Arc::new(crate::sys::PlatformSettings::new()),
            Arc::new(crate::sys::PlatformPreferences::new()),
        )
    }

    /// Overrides the platform used to prefix error messages.
    #[must_use]
    pub const fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Attaches the event listener and returns its stream.
    ///
    /// Only the latest listener receives updates. Calling this again ends the
    /// previous stream once it has yielded what was already queued.
    #[must_use]
    pub fn events(&self) -> LocationStream {
        Box::pin(self.listener.attach())
    }

    /// Requests one fix.
    ///
    /// # Errors
    /// See [`LocationService::current_location`].
    pub async fn get_current_location(&self) -> LocationResult<LocationFix> {
        self.location.current_location().await
    }

    /// Starts streaming updates to [`Bridge::events`] and records the request
    /// in the preference store.
    ///
    /// # Errors
    /// Returns a [`LocationError`] if the platform refuses to start. The
    /// preference flag is left untouched in that case.
    pub fn start_location_service(&self, config: &UpdateConfig) -> LocationResult<()> {
        self.location
            .start_with_sink(config, FixSink::forwarding(self.listener.clone()))?;
        self.record_requested(true);
        Ok(())
    }

    /// Stops streaming updates and clears the preference flag. Safe to call
    /// when nothing is running.
    pub fn stop_location_service(&self) {
        self.location.stop_updates();
        self.record_requested(false);
    }

    fn record_requested(&self, requested: bool) {
        if !self.preferences.set_bool(REQUESTING_LOCATION_UPDATES, requested) {
            log::warn!("failed to persist `{REQUESTING_LOCATION_UPDATES}` = {requested}");
        }
    }

    /// Restarts updates if the preference flag says the host still wants them.
    ///
    /// Returns whether updates were restarted.
    ///
    /// # Errors
    /// Returns a [`LocationError`] if the platform refuses to start.
    pub fn resume_if_requested(&self, config: &UpdateConfig) -> LocationResult<bool> {
        if !self.preferences.get_bool(REQUESTING_LOCATION_UPDATES) || self.location.is_updating() {
            return Ok(false);
        }
        log::info!("resuming location updates requested before restart");
        self.start_location_service(config)?;
        Ok(true)
    }

    /// Opens this app's settings page.
    pub fn open_app_settings(&self) -> bool {
        self.settings.open_app_settings()
    }

    /// Opens the system location settings.
    pub fn open_location_settings(&self) -> bool {
        self.settings.open_location_settings()
    }

    /// Classifies the current permission state.
    ///
    /// # Errors
    /// Returns a [`PermissionError`] when no location permission is declared or
    /// the platform query fails.
    pub fn check_permission(&self) -> Result<PermissionStatus, PermissionError> {
        bglocation_permission::check(self.permissions.as_ref())
    }

    /// Whether the device's location services are switched on.
    ///
    /// # Errors
    /// Returns a [`LocationError`] if the platform query fails.
    pub fn is_location_service_enabled(&self) -> LocationResult<bool> {
        self.location.is_service_enabled()
    }

    /// Answers one host call.
    pub async fn handle(&self, call: MethodCall) -> Reply {
        match self.dispatch(&call).await {
            Ok(value) => Reply::Success(value),
            Err(BridgeError::UnknownMethod(name)) => {
                log::debug!("unknown method `{name}`");
                Reply::NotImplemented
            }
            Err(err) => {
                log::warn!("`{}` failed: {err}", call.method);
                Reply::error(format!("{}{err}", self.platform.message_prefix()))
            }
        }
    }

    async fn dispatch(&self, call: &MethodCall) -> Result<Value, BridgeError> {
        let method: Method = call.method.parse()?;

        match method {
            Method::GetCurrentLocation => {
                let fix = self.get_current_location().await?;
                serde_json::to_value(fix).map_err(|err| {
                    LocationError::Serialization {
                        message: err.to_string(),
                    }
                    .into()
                })
            }
            Method::StartLocationService => {
                let config = parse_arguments(method, call.arguments.as_ref())?;
                self.start_location_service(&config)?;
                Ok(Value::Bool(true))
            }
            Method::StopLocationService => {
                self.stop_location_service();
                Ok(Value::Bool(true))
            }
            Method::OpenAppSettings => Ok(Value::Bool(self.open_app_settings())),
            Method::OpenLocationSettings => Ok(Value::Bool(self.open_location_settings())),
            Method::CheckPermission => Ok(match self.check_permission() {
                Ok(status) => Value::from(status.code()),
                // Existing hosts read `false` as "could not classify".
                Err(err) => {
                    log::warn!("permission check failed: {err}");
                    Value::Bool(false)
                }
            }),
            Method::IsLocationServiceEnabled => {
                Ok(Value::Bool(self.is_location_service_enabled()?))
            }
        }
    }
}

fn parse_arguments(method: Method, arguments: Option<&Value>) -> Result<UpdateConfig, BridgeError> {
    match arguments {
        None | Some(Value::Null) => Ok(UpdateConfig::default()),
        Some(value) => {
            serde_json::from_value(value.clone()).map_err(|err| BridgeError::InvalidArguments {
                method,
                message: err.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_arguments_default_the_distance_filter() {
        let config = parse_arguments(Method::StartLocationService, None).unwrap();
        assert_eq!(config.distance_filter_meters(), 0.0);

        let config = parse_arguments(Method::StartLocationService, Some(&json!({}))).unwrap();
        assert_eq!(config.distance_filter_meters(), 0.0);

        let config =
            parse_arguments(Method::StartLocationService, Some(&json!({"distance_filter": 10})))
                .unwrap();
        assert_eq!(config.distance_filter_meters(), 10.0);
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        let err = parse_arguments(
            Method::StartLocationService,
            Some(&json!({"distance_filter": "far"})),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::InvalidArguments {
                method: Method::StartLocationService,
                ..
            }
        ));
    }
}
