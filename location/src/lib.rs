//! Location fix normalization.
//!
//! Platform location stacks deliver fixes in their own shapes: Android's
//! `Location` has `f32` accuracy and epoch-millisecond `Long` time, Apple's
//! `CLLocation` has `f64` fields, a seconds-based timestamp and negative
//! sentinels for "invalid". This crate turns either into one [`LocationFix`],
//! for a single request ([`LocationService::current_location`]) or a stream of
//! updates ([`LocationService::start_updates`]).
//!
//! The platform itself sits behind [`LocationProvider`], so everything here can
//! run against a test double.

#![warn(missing_docs)]

mod cancel;
mod fix;
mod provider;
mod service;

/// Platform-specific implementations.
pub mod sys;

pub use cancel::{Release, RequestGuard};
pub use fix::{AndroidFix, AppleFix, PlatformFix};
pub use provider::{
    CurrentFixReceiver, CurrentFixResponder, CurrentOutcome, FixSink, ListenerSlot,
    LocationProvider, UpdateConfig,
};
pub use service::{LocationService, LocationStream};
pub use tokio_util::sync::CancellationToken;

use serde::Serialize;

/// A normalized location fix.
///
/// Serializes to the wire map with exactly these keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationFix {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in meters. Accuracy depends on the provider.
    pub altitude: f64,
    /// Horizontal accuracy radius in meters.
    pub accuracy: f64,
    /// Course in degrees, 0 when unavailable.
    pub bearing: f64,
    /// Speed in meters per second, 0 when unavailable.
    pub speed: f64,
    /// Fix time as Unix epoch milliseconds.
    pub time: f64,
    /// Whether the fix came from a mock provider.
    pub is_mock: bool,
}

/// Errors that can occur when accessing location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    /// The platform answered without a fix.
    #[error("the location is empty")]
    Empty,
    /// The platform canceled the request.
    #[error("operation canceled")]
    Canceled,
    /// The platform reported a failure.
    #[error("{message}")]
    Platform {
        /// Platform error description.
        message: String,
    },
    /// A fix payload from the platform bridge could not be decoded.
    #[error("invalid location payload: {message}")]
    Serialization {
        /// Decoder error description.
        message: String,
    },
    /// Location is not available on this platform.
    #[error("location not supported on this platform")]
    NotSupported,
}

/// Result alias for location operations.
pub type LocationResult<T> = Result<T, LocationError>;
