//! Build script for bglocation-bridge.

use bglocation_build::AppleSwiftConfig;

fn main() {
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap();

    if target_os == "ios" || target_os == "macos" {
        let ui_framework = if target_os == "ios" { "UIKit" } else { "AppKit" };
        let config = AppleSwiftConfig::new(env!("CARGO_PKG_NAME"), "BridgeHelper")
            .swift_source("src/sys/apple/BridgeHelper.swift")
            .framework(ui_framework);
        bglocation_build::compile_swift("src/sys/apple/mod.rs", &config);
    }
}
