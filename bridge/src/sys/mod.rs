//! Platform-specific settings navigation and preference storage.

cfg_if::cfg_if! {
    if #[cfg(target_os = "android")] {
        /// Android implementation using JNI.
        pub mod android;
        pub use android::{
            AndroidSettings as PlatformSettings, SharedPreferencesStore as PlatformPreferences,
        };
    } else if #[cfg(any(target_os = "ios", target_os = "macos"))] {
        mod apple;
        pub use apple::{
            AppleSettings as PlatformSettings, UserDefaultsStore as PlatformPreferences,
        };
    } else {
        mod unsupported;
        pub use unsupported::UnsupportedSettings as PlatformSettings;
        pub use crate::MemoryPreferences as PlatformPreferences;
    }
}
