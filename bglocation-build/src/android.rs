//! Android build utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Environment variable with extra compile-time classpath entries, separated
/// by the platform path separator (e.g. the play-services-location jar).
pub const CLASSPATH_ENV: &str = "BGLOCATION_ANDROID_CLASSPATH";

/// Configuration for Kotlin → DEX compilation.
#[derive(Debug, Clone)]
pub struct AndroidConfig {
    /// Kotlin source files, relative to the crate manifest.
    pub kotlin_sources: Vec<PathBuf>,
    /// Extra jars the sources compile against. They are not dexed; the host
    /// app ships them.
    pub classpath: Vec<PathBuf>,
}

impl AndroidConfig {
    /// Create a config with a single Kotlin source.
    #[must_use]
    pub fn new(source: impl Into<PathBuf>) -> Self {
        let classpath = env::var_os(CLASSPATH_ENV)
            .map(|value| env::split_paths(&value).collect())
            .unwrap_or_default();
        Self {
            kotlin_sources: vec![source.into()],
            classpath,
        }
    }
}

/// Compile Kotlin sources to `$OUT_DIR/classes.dex`.
///
/// Crates embed the result with
/// `include_bytes!(concat!(env!("OUT_DIR"), "/classes.dex"))`.
///
/// # Panics
/// Panics if `kotlinc` or D8 fail, or the Android SDK cannot be found.
pub fn build_kotlin(config: &AndroidConfig) {
    println!("cargo:rerun-if-env-changed={CLASSPATH_ENV}");
    for source in &config.kotlin_sources {
        println!("cargo:rerun-if-changed={}", source.display());
    }

    if !crate::targets_android() {
        return;
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());

    let android_jar_path = android_build::android_jar(None).expect("Failed to find android.jar");

    let mut classpath = vec![android_jar_path.clone()];
    classpath.extend(config.classpath.iter().cloned());
    let classpath = env::join_paths(&classpath).expect("invalid classpath entry");

    // Compile .kt -> .class using kotlinc
    let classes_dir = out_dir.join("classes");
    fs::create_dir_all(&classes_dir).expect("Failed to create classes directory");

    let kotlinc_status = Command::new("kotlinc")
        .arg("-classpath")
        .arg(&classpath)
        .arg("-d")
        .arg(&classes_dir)
        .args(config.kotlin_sources.iter().map(|s| manifest_dir.join(s)))
        .status()
        .expect("Failed to run kotlinc - is Kotlin compiler installed?");

    assert!(kotlinc_status.success(), "kotlinc compilation failed");

    let mut class_files = Vec::new();
    collect_class_files(&classes_dir, &mut class_files);

    let d8_jar_path = android_build::android_d8_jar(None).expect("Failed to find d8.jar");

    // Convert .class -> .dex using D8
    let mut d8 = android_build::JavaRun::new();
    d8.class_path(d8_jar_path)
        .main_class("com.android.tools.r8.D8")
        .arg("--classpath")
        .arg(&android_jar_path);
    for jar in &config.classpath {
        d8.arg("--classpath").arg(jar);
    }
    d8.arg("--output").arg(&out_dir);
    for class_file in &class_files {
        d8.arg(class_file);
    }

    assert!(
        d8.run()
            .expect("failed to acquire exit status for java d8.jar invocation")
            .success(),
        "D8 dexing failed"
    );
}

fn collect_class_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = fs::read_dir(dir).expect("Failed to read classes directory");
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_class_files(&path, out);
        } else if path.extension().is_some_and(|ext| ext == "class") {
            out.push(path);
        }
    }
}
