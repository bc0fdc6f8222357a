//! Build script for bglocation-permission.
//!
//! Android inspection is plain JNI, so only Apple needs generated code.

use bglocation_build::AppleSwiftConfig;

fn main() {
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap();

    if target_os == "ios" || target_os == "macos" {
        let config = AppleSwiftConfig::new(env!("CARGO_PKG_NAME"), "PermissionHelper")
            .swift_source("src/sys/apple/PermissionHelper.swift")
            .framework("CoreLocation");
        bglocation_build::compile_swift("src/sys/apple/mod.rs", &config);
    }
}
