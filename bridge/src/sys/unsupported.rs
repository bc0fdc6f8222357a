use crate::SettingsNavigator;

/// Settings navigation for targets without a settings app.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedSettings;

impl UnsupportedSettings {
    /// Creates the navigator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SettingsNavigator for UnsupportedSettings {
    fn open_app_settings(&self) -> bool {
        false
    }

    fn open_location_settings(&self) -> bool {
        false
    }
}
