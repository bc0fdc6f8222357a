//! Build script for bglocation-location.

use bglocation_build::{AndroidConfig, AppleSwiftConfig};

fn main() {
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap();

    if target_os == "ios" || target_os == "macos" {
        let config = AppleSwiftConfig::new(env!("CARGO_PKG_NAME"), "LocationHelper")
            .swift_source("src/sys/apple/LocationHelper.swift")
            .framework("CoreLocation");
        bglocation_build::compile_swift("src/sys/apple/mod.rs", &config);
    }

    if target_os == "android" {
        bglocation_build::build_kotlin(&AndroidConfig::new("src/sys/android/LocationHelper.kt"));
    }
}
