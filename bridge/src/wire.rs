use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the method channel the host registers.
pub const METHOD_CHANNEL: &str = "almoullim.com/background_location";
/// Name of the event channel carrying location updates.
pub const EVENT_CHANNEL: &str = "almoullim.com/background_location_stream";
/// Error code attached to every failed reply.
pub const ERROR_CODE: &str = "BackgroundLocation-Error";

/// Operations the dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// One high-accuracy fix.
    GetCurrentLocation,
    /// Begin streaming updates to the event channel.
    StartLocationService,
    /// End the update stream.
    StopLocationService,
    /// Open this app's settings page.
    OpenAppSettings,
    /// Open the system location settings.
    OpenLocationSettings,
    /// Classify the current permission state.
    CheckPermission,
    /// Whether location services are switched on.
    IsLocationServiceEnabled,
}

impl Method {
    /// Every method, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::GetCurrentLocation,
        Self::StartLocationService,
        Self::StopLocationService,
        Self::OpenAppSettings,
        Self::OpenLocationSettings,
        Self::CheckPermission,
        Self::IsLocationServiceEnabled,
    ];

    /// Wire name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetCurrentLocation => "get_current_location",
            Self::StartLocationService => "start_location_service",
            Self::StopLocationService => "stop_location_service",
            Self::OpenAppSettings => "open_app_settings",
            Self::OpenLocationSettings => "open_location_settings",
            Self::CheckPermission => "check_permission",
            Self::IsLocationServiceEnabled => "is_location_service_enabled",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a method name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == name)
            .ok_or_else(|| UnknownMethod(name.to_string()))
    }
}

/// An inbound call from the host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MethodCall {
    /// Method name.
    pub method: String,
    /// Call arguments, usually a map or absent.
    #[serde(default)]
    pub arguments: Option<Value>,
}

impl MethodCall {
    /// A call without arguments.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: None,
        }
    }

    /// Attaches arguments.
    #[must_use]
    pub fn with_arguments(mut self, arguments: Value) -> Self {
        self.arguments = Some(arguments);
        self
    }
}

/// The answer to a [`MethodCall`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Reply {
    /// The call succeeded with this result.
    Success(Value),
    /// The call failed.
    Error {
        /// Always [`ERROR_CODE`].
        code: String,
        /// Platform-prefixed description.
        message: String,
        /// Extra payload, if any.
        details: Option<Value>,
    },
    /// The method is not known.
    NotImplemented,
}

impl Reply {
    /// A failed reply with the standard code.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            code: ERROR_CODE.to_string(),
            message: message.into(),
            details: None,
        }
    }

    /// Encodes the reply as the envelope the host channel expects.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Which platform is answering, used to prefix error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Android.
    Android,
    /// iOS or macOS.
    Apple,
    /// Anything else, such as desktop test hosts.
    Host,
}

impl Platform {
    /// The platform this crate was built for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "android") {
            Self::Android
        } else if cfg!(any(target_os = "ios", target_os = "macos")) {
            Self::Apple
        } else {
            Self::Host
        }
    }

    /// Prefix of every error message sent from this platform.
    #[must_use]
    pub const fn message_prefix(self) -> &'static str {
        match self {
            Self::Android => "Android: ",
            Self::Apple => "iOS: ",
            Self::Host => "Host: ",
        }
    }
}
