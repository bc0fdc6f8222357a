//! Shared build utilities for bglocation crates.
//!
//! This crate provides common functionality for:
//! - Apple: swift-bridge glue plus the crate's own Swift, built into a static library
//! - Android: Kotlin → DEX compilation
//!
//! Every helper checks `CARGO_CFG_TARGET_OS` and does nothing for other
//! targets, so build scripts can call them unconditionally.
//!
//! # Usage
//!
//! In your `build.rs`:
//!
//! ```ignore
//! use bglocation_build::{AndroidConfig, AppleSwiftConfig, build_kotlin, compile_swift};
//!
//! fn main() {
//!     compile_swift(
//!         "src/sys/apple/mod.rs",
//!         &AppleSwiftConfig::new(env!("CARGO_PKG_NAME"), "LocationHelper")
//!             .swift_source("src/sys/apple/LocationHelper.swift"),
//!     );
//!     build_kotlin(&AndroidConfig::new("src/sys/android/LocationHelper.kt"));
//! }
//! ```

#![warn(missing_docs)]

mod android;
mod apple;

pub use android::{AndroidConfig, build_kotlin};
pub use apple::{AppleSwiftConfig, compile_swift};

fn target_os() -> String {
    std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default()
}

fn targets_apple() -> bool {
    matches!(target_os().as_str(), "ios" | "macos")
}

fn targets_android() -> bool {
    target_os() == "android"
}
