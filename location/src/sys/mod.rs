//! Platform-specific location providers.

cfg_if::cfg_if! {
    if #[cfg(target_os = "android")] {
        /// Android implementation using JNI and an embedded Kotlin helper.
        pub mod android;
        pub use android::AndroidLocationProvider as PlatformProvider;
    } else if #[cfg(any(target_os = "ios", target_os = "macos"))] {
        mod apple;
        pub use apple::AppleLocationProvider as PlatformProvider;
    } else {
        mod unsupported;
        pub use unsupported::UnsupportedProvider as PlatformProvider;
    }
}
