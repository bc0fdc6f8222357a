use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

/// Preference key recording whether the host asked for location updates.
pub const REQUESTING_LOCATION_UPDATES: &str = "requesting_location_updates";

/// Opens OS settings screens.
///
/// Both methods report whether the screen was launched, never why not.
pub trait SettingsNavigator: Send + Sync + fmt::Debug {
    /// Opens this app's settings page.
    fn open_app_settings(&self) -> bool;

    /// Opens the system location settings.
    fn open_location_settings(&self) -> bool;
}

/// Durable boolean preferences.
pub trait PreferenceStore: Send + Sync + fmt::Debug {
    /// Reads `key`, `false` when unset.
    fn get_bool(&self, key: &str) -> bool;

    /// Writes `key`. Returns whether the value was stored.
    fn set_bool(&self, key: &str, value: bool) -> bool;
}

/// Process-lifetime preferences.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, bool>>,
}

impl MemoryPreferences {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_bool(&self, key: &str) -> bool {
        self.values
            .lock()
            .expect("preference mutex poisoned")
            .get(key)
            .copied()
            .unwrap_or(false)
    }

    fn set_bool(&self, key: &str, value: bool) -> bool {
        self.values
            .lock()
            .expect("preference mutex poisoned")
            .insert(key.to_string(), value);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_key_reads_false() {
        let prefs = MemoryPreferences::new();
        assert!(!prefs.get_bool(REQUESTING_LOCATION_UPDATES));

        assert!(prefs.set_bool(REQUESTING_LOCATION_UPDATES, true));
        assert!(prefs.get_bool(REQUESTING_LOCATION_UPDATES));

        assert!(prefs.set_bool(REQUESTING_LOCATION_UPDATES, false));
        assert!(!prefs.get_bool(REQUESTING_LOCATION_UPDATES));
    }
}
