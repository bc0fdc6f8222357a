//! Apple platform (iOS/macOS) authorization lookup using swift-bridge.

use crate::{Authorization, PermissionError, PermissionInspector, PermissionSnapshot};

#[swift_bridge::bridge]
mod ffi {
    enum AuthorizationStatus {
        NotDetermined,
        Restricted,
        Denied,
        AuthorizedWhenInUse,
        AuthorizedAlways,
    }

    extern "Swift" {
        fn location_authorization_status() -> AuthorizationStatus;
    }
}

const fn authorization_from_ffi(status: ffi::AuthorizationStatus) -> Authorization {
    match status {
        ffi::AuthorizationStatus::NotDetermined => Authorization::NotDetermined,
        ffi::AuthorizationStatus::Restricted => Authorization::Restricted,
        ffi::AuthorizationStatus::Denied => Authorization::Denied,
        ffi::AuthorizationStatus::AuthorizedWhenInUse => Authorization::AuthorizedWhenInUse,
        ffi::AuthorizationStatus::AuthorizedAlways => Authorization::AuthorizedAlways,
    }
}

/// Inspector backed by `CLLocationManager.authorizationStatus`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppleInspector;

impl AppleInspector {
    /// Creates the inspector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PermissionInspector for AppleInspector {
    fn inspect(&self) -> Result<PermissionSnapshot, PermissionError> {
        let status = ffi::location_authorization_status();
        Ok(PermissionSnapshot::Apple(authorization_from_ffi(status)))
    }
}
