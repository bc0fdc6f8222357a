//! Apple build utilities.
//!
//! The crate's Swift helper and the glue swift-bridge generates for it are
//! compiled together into one module and archived as `lib<lib_name>.a`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Minimum OS versions the helpers are built for.
const IOS_TARGET: &str = "arm64-apple-ios14.0";
const MACOS_ARM_TARGET: &str = "arm64-apple-macos12.3";
const MACOS_X86_TARGET: &str = "x86_64-apple-macos12.3";

/// Configuration for Swift compilation.
#[derive(Debug, Clone)]
pub struct AppleSwiftConfig {
    /// Package name the generated glue is filed under.
    pub pkg_name: String,
    /// Swift sources, relative to the crate manifest.
    pub swift_sources: Vec<PathBuf>,
    /// Swift module and static library name.
    pub lib_name: String,
    /// Frameworks the helper links against.
    pub frameworks: Vec<String>,
}

impl AppleSwiftConfig {
    /// Create a config linking only `Foundation`.
    #[must_use]
    pub fn new(pkg_name: impl Into<String>, lib_name: impl Into<String>) -> Self {
        Self {
            pkg_name: pkg_name.into(),
            swift_sources: Vec::new(),
            lib_name: lib_name.into(),
            frameworks: vec!["Foundation".to_string()],
        }
    }

    /// Add a Swift source file.
    #[must_use]
    pub fn swift_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.swift_sources.push(path.into());
        self
    }

    /// Add a framework to link.
    #[must_use]
    pub fn framework(mut self, name: impl Into<String>) -> Self {
        self.frameworks.push(name.into());
        self
    }
}

/// Build the Swift side of `bridge_rs` and link it into the crate.
///
/// Generates swift-bridge glue for `bridge_rs`, compiles it together with the
/// configured sources, archives the object and emits the link directives for
/// the library, the Swift runtime and the frameworks.
///
/// # Panics
/// Panics if any toolchain step fails.
pub fn compile_swift(bridge_rs: &str, config: &AppleSwiftConfig) {
    println!("cargo:rerun-if-changed={bridge_rs}");
    for source in &config.swift_sources {
        println!("cargo:rerun-if-changed={}", source.display());
    }

    if !crate::targets_apple() {
        return;
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));
    let manifest_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
    let target = env::var("TARGET").expect("TARGET not set");
    let ios = target.contains("ios");

    swift_bridge_build::parse_bridges(vec![bridge_rs])
        .write_all_concatenated(out_dir.clone(), &config.pkg_name);

    let header = write_bridging_header(&out_dir, &config.pkg_name);
    let module = write_module_source(&out_dir, &manifest_dir, config);

    let object = out_dir.join(format!("{}.o", config.lib_name));
    let triple = if ios {
        IOS_TARGET
    } else if target.contains("aarch64") {
        MACOS_ARM_TARGET
    } else {
        MACOS_X86_TARGET
    };
    let sdk = xcrun(&["--sdk", if ios { "iphoneos" } else { "macosx" }, "--show-sdk-path"]);

    let mut swiftc = Command::new("swiftc");
    swiftc
        .args(["-emit-object", "-parse-as-library"])
        .args(["-module-name", config.lib_name.as_str()])
        .args(["-target", triple])
        .arg("-sdk")
        .arg(&sdk)
        .arg("-import-objc-header")
        .arg(&header)
        .arg("-o")
        .arg(&object)
        .arg(&module);
    run(&mut swiftc, "swiftc");

    let archive = out_dir.join(format!("lib{}.a", config.lib_name));
    run(Command::new("ar").arg("rcs").arg(&archive).arg(&object), "ar");

    println!("cargo:rustc-link-search=native={}", out_dir.display());
    println!("cargo:rustc-link-lib=static={}", config.lib_name);
    println!(
        "cargo:rustc-link-search=native={}",
        swift_runtime_dir(ios).display()
    );
    for framework in &config.frameworks {
        println!("cargo:rustc-link-lib=framework={framework}");
    }
}

/// Header importing the swift-bridge core and the package's generated C API.
fn write_bridging_header(out_dir: &Path, pkg_name: &str) -> PathBuf {
    let path = out_dir.join("Bridging-Header.h");
    let contents = format!(
        "#include \"{}\"\n#include \"{}\"\n",
        out_dir.join("SwiftBridgeCore.h").display(),
        out_dir.join(pkg_name).join(format!("{pkg_name}.h")).display(),
    );
    fs::write(&path, contents).expect("failed to write bridging header");
    path
}

/// One Swift file holding the generated glue followed by the crate's sources.
fn write_module_source(out_dir: &Path, manifest_dir: &Path, config: &AppleSwiftConfig) -> PathBuf {
    let pkg = &config.pkg_name;
    let parts = [
        out_dir.join("SwiftBridgeCore.swift"),
        out_dir.join(pkg).join(format!("{pkg}.swift")),
    ]
    .into_iter()
    .chain(config.swift_sources.iter().map(|source| manifest_dir.join(source)));

    let mut module = String::new();
    for part in parts {
        let text = fs::read_to_string(&part)
            .unwrap_or_else(|err| panic!("failed to read {}: {err}", part.display()));
        module.push_str(&text);
        module.push('\n');
    }

    let path = out_dir.join(format!("{}Module.swift", config.lib_name));
    fs::write(&path, module).expect("failed to write combined Swift module");
    path
}

/// Directory of the Swift runtime libraries next to the active `swiftc`.
fn swift_runtime_dir(ios: bool) -> PathBuf {
    let swiftc = PathBuf::from(xcrun(&["--find", "swiftc"]));
    let toolchain = swiftc
        .parent()
        .and_then(Path::parent)
        .expect("unexpected swiftc location");
    toolchain
        .join("lib/swift")
        .join(if ios { "iphoneos" } else { "macosx" })
}

fn xcrun(args: &[&str]) -> String {
    let output = Command::new("xcrun")
        .args(args)
        .output()
        .unwrap_or_else(|err| panic!("xcrun {args:?} failed to start: {err}"));
    assert!(output.status.success(), "xcrun {args:?} failed");
    String::from_utf8(output.stdout)
        .expect("xcrun printed non-UTF-8 output")
        .trim()
        .to_string()
}

fn run(command: &mut Command, what: &str) {
    let output = command
        .output()
        .unwrap_or_else(|err| panic!("{what} failed to start: {err}"));
    if !output.status.success() {
        eprintln!("{what} args: {:?}", command.get_args().collect::<Vec<_>>());
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        panic!("{what} failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("bglocation-build-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn module_source_puts_glue_before_crate_sources() {
        let out_dir = scratch("module");
        fs::create_dir_all(out_dir.join("pkg")).unwrap();
        fs::write(out_dir.join("SwiftBridgeCore.swift"), "// core").unwrap();
        fs::write(out_dir.join("pkg/pkg.swift"), "// glue").unwrap();
        fs::write(out_dir.join("Helper.swift"), "// helper").unwrap();

        let config = AppleSwiftConfig::new("pkg", "Helper").swift_source("Helper.swift");
        let path = write_module_source(&out_dir, &out_dir, &config);

        assert_eq!(path, out_dir.join("HelperModule.swift"));
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "// core\n// glue\n// helper\n"
        );
        fs::remove_dir_all(out_dir).unwrap();
    }

    #[test]
    fn bridging_header_includes_core_and_package_headers() {
        let out_dir = scratch("header");

        let header = fs::read_to_string(write_bridging_header(&out_dir, "pkg")).unwrap();

        let core = out_dir.join("SwiftBridgeCore.h");
        let package = out_dir.join("pkg").join("pkg.h");
        assert_eq!(
            header,
            format!("#include \"{}\"\n#include \"{}\"\n", core.display(), package.display())
        );
        fs::remove_dir_all(out_dir).unwrap();
    }

    #[test]
    fn config_links_foundation_first() {
        let config = AppleSwiftConfig::new("pkg", "Helper").framework("CoreLocation");
        assert_eq!(config.frameworks, ["Foundation", "CoreLocation"]);
        assert!(config.swift_sources.is_empty());
    }
}
