//! Apple platform (iOS/macOS) settings URLs and `UserDefaults` using swift-bridge.

use crate::{PreferenceStore, SettingsNavigator};

#[swift_bridge::bridge]
mod ffi {
    extern "Swift" {
        fn open_app_settings_url() -> bool;
        fn user_defaults_bool(key: &str) -> bool;
        fn set_user_defaults_bool(key: &str, value: bool);
    }
}

/// Settings navigation through the app settings URL.
///
/// iOS has no public URL for the location settings page, so both methods open
/// the app's own settings.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppleSettings;

impl AppleSettings {
    /// Creates the navigator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SettingsNavigator for AppleSettings {
    fn open_app_settings(&self) -> bool {
        ffi::open_app_settings_url()
    }

    fn open_location_settings(&self) -> bool {
        ffi::open_app_settings_url()
    }
}

/// Preferences stored in `UserDefaults.standard`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UserDefaultsStore;

impl UserDefaultsStore {
    /// Creates the store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PreferenceStore for UserDefaultsStore {
    fn get_bool(&self, key: &str) -> bool {
        ffi::user_defaults_bool(key)
    }

    fn set_bool(&self, key: &str, value: bool) -> bool {
        ffi::set_user_defaults_bool(key, value);
        true
    }
}
