//! Method-call and event-stream bridge.
//!
//! A host runtime talks to the device over two channels: a method channel
//! ([`METHOD_CHANNEL`]) carrying [`MethodCall`]s answered with a [`Reply`], and
//! an event channel ([`EVENT_CHANNEL`]) carrying [`LocationFix`]es while the
//! location service runs. [`Bridge`] implements both on top of
//! `bglocation-location` and `bglocation-permission`.
//!
//! Settings navigation and the preference flag are process-wide side effects,
//! so they are injected as [`SettingsNavigator`] and [`PreferenceStore`].
//!
//! ```no_run
//! # async fn run() {
//! use bglocation_bridge::{Bridge, MethodCall};
//!
//! let bridge = Bridge::platform();
//! let reply = bridge.handle(MethodCall::new("check_permission")).await;
//! println!("{}", reply.to_value());
//! # }
//! ```

#![warn(missing_docs)]

mod collab;
mod dispatch;
mod wire;

/// Platform-specific collaborators.
pub mod sys;

pub use bglocation_location::{LocationFix, LocationStream, UpdateConfig};
pub use bglocation_permission::PermissionStatus;
pub use collab::{
    MemoryPreferences, PreferenceStore, REQUESTING_LOCATION_UPDATES, SettingsNavigator,
};
pub use dispatch::Bridge;
pub use wire::{
    ERROR_CODE, EVENT_CHANNEL, METHOD_CHANNEL, Method, MethodCall, Platform, Reply, UnknownMethod,
};

use bglocation_location::LocationError;
use bglocation_permission::PermissionError;

/// Errors raised while dispatching a call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// The method name is not known.
    #[error("unknown method `{0}`")]
    UnknownMethod(String),
    /// The call arguments could not be decoded.
    #[error("invalid arguments for `{method}`: {message}")]
    InvalidArguments {
        /// Method being called.
        method: Method,
        /// Decoder error description.
        message: String,
    },
    /// A location operation failed.
    #[error(transparent)]
    Location(#[from] LocationError),
    /// Permission inspection failed.
    #[error(transparent)]
    Permission(#[from] PermissionError),
}

impl From<UnknownMethod> for BridgeError {
    fn from(err: UnknownMethod) -> Self {
        Self::UnknownMethod(err.0)
    }
}
