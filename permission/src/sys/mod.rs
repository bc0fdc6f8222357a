//! Platform-specific permission inspection.

cfg_if::cfg_if! {
    if #[cfg(target_os = "android")] {
        /// Android implementation using JNI.
        pub mod android;
        pub use android::AndroidInspector as PlatformInspector;
    } else if #[cfg(any(target_os = "ios", target_os = "macos"))] {
        mod apple;
        pub use apple::AppleInspector as PlatformInspector;
    } else {
        mod unsupported;
        pub use unsupported::UnsupportedInspector as PlatformInspector;
    }
}
