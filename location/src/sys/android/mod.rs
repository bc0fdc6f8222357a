//! Android location provider using JNI.
//!
//! `FusedLocationProviderClient` is driven by `LocationHelper.kt`, compiled to
//! DEX at build time and loaded through a `DexClassLoader`. The helper calls
//! back into the native methods registered here, tagging every callback with
//! the handle of the request or subscription it belongs to.

use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

use jni::objects::{GlobalRef, JClass, JObject, JString, JValue};
use jni::sys::jlong;
use jni::{JNIEnv, JavaVM, NativeMethod};
use log::error;

use crate::{
    AndroidFix, CancellationToken, CurrentFixResponder, FixSink, LocationError,
    LocationProvider, LocationResult, PlatformFix, Release, UpdateConfig,
};

/// Embedded DEX bytecode containing the LocationHelper class.
/// Generated at build time by kotlinc + D8.
static DEX_BYTES: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/classes.dex"));

const HELPER_CLASS_NAME: &str = "bglocation.location.LocationHelper";

/// `Priority.PRIORITY_HIGH_ACCURACY`, used for every single request.
const PRIORITY_HIGH_ACCURACY: i32 = 100;

/// Global reference to the Java VM.
static JAVA_VM: OnceLock<JavaVM> = OnceLock::new();
/// Global reference to the application Context.
static GLOBAL_CONTEXT: OnceLock<GlobalRef> = OnceLock::new();
/// Global reference to the loaded helper class.
static HELPER_CLASS: OnceLock<GlobalRef> = OnceLock::new();

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);
static PENDING: OnceLock<Mutex<HashMap<u64, CurrentFixResponder>>> = OnceLock::new();
static SINKS: OnceLock<Mutex<HashMap<u64, FixSink>>> = OnceLock::new();

fn pending() -> &'static Mutex<HashMap<u64, CurrentFixResponder>> {
    PENDING.get_or_init(|| Mutex::new(HashMap::new()))
}

fn sinks() -> &'static Mutex<HashMap<u64, FixSink>> {
    SINKS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Initialize the location subsystem with an application Context.
///
/// Must be called before using [`AndroidLocationProvider`]. Later calls are
/// no-ops.
///
/// # Errors
/// Returns [`LocationError::Platform`] if the helper class cannot be loaded.
pub fn init(env: &mut JNIEnv, context: &JObject) -> LocationResult<()> {
    if HELPER_CLASS.get().is_some() {
        return Ok(());
    }

    if JAVA_VM.get().is_none() {
        let vm = env.get_java_vm().map_err(map_jni_error)?;
        let _ = JAVA_VM.set(vm);
    }

    if GLOBAL_CONTEXT.get().is_none() {
        let context_ref = env.new_global_ref(context).map_err(map_jni_error)?;
        let _ = GLOBAL_CONTEXT.set(context_ref);
    }

    let helper = load_helper_class(env, context)?;
    let _ = HELPER_CLASS.set(helper);
    Ok(())
}

fn load_helper_class(env: &mut JNIEnv, context: &JObject) -> LocationResult<GlobalRef> {
    let cache_dir = env
        .call_method(context, "getCodeCacheDir", "()Ljava/io/File;", &[])
        .map_err(|e| platform(format!("getCodeCacheDir failed: {e}")))?
        .l()
        .map_err(|e| platform(format!("getCodeCacheDir result: {e}")))?;

    let cache_path = env
        .call_method(&cache_dir, "getAbsolutePath", "()Ljava/lang/String;", &[])
        .map_err(|e| platform(format!("getAbsolutePath failed: {e}")))?
        .l()
        .map_err(|e| platform(format!("getAbsolutePath result: {e}")))?;

    let dex_path = format!(
        "{}/bglocation_location.dex",
        env.get_string((&cache_path).into())
            .map_err(|e| platform(format!("get_string failed: {e}")))?
            .to_str()
            .map_err(|e| platform(format!("to_str failed: {e}")))?
    );

    // Remove if exists to handle previous read-only setting
    let _ = std::fs::remove_file(&dex_path);

    log::info!("writing location helper DEX to {dex_path}");
    std::fs::write(&dex_path, DEX_BYTES).map_err(|e| platform(format!("write DEX failed: {e}")))?;

    // Make DEX read-only as required by modern Android security
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&dex_path)
            .map_err(|e| platform(format!("metadata DEX failed: {e}")))?
            .permissions();
        perms.set_mode(0o444);
        std::fs::set_permissions(&dex_path, perms)
            .map_err(|e| platform(format!("set_permissions DEX failed: {e}")))?;
    }

    let dex_path_jstring = env
        .new_string(&dex_path)
        .map_err(|e| platform(format!("new_string failed: {e}")))?;

    let parent_loader = env
        .call_method(context, "getClassLoader", "()Ljava/lang/ClassLoader;", &[])
        .map_err(|e| platform(format!("getClassLoader failed: {e}")))?
        .l()
        .map_err(|e| platform(format!("getClassLoader result: {e}")))?;

    let class_loader = env
        .new_object(
            "dalvik/system/DexClassLoader",
            "(Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;Ljava/lang/ClassLoader;)V",
            &[
                JValue::Object(&dex_path_jstring),
                JValue::Object(&cache_path),
                JValue::Object(&JObject::null()),
                JValue::Object(&parent_loader),
            ],
        )
        .map_err(|e| {
            error!("new DexClassLoader failed: {e}");
            platform(format!("new DexClassLoader: {e}"))
        })?;

    let helper_class_name = env
        .new_string(HELPER_CLASS_NAME)
        .map_err(|e| platform(format!("new_string: {e}")))?;

    let helper_class = env
        .call_method(
            &class_loader,
            "loadClass",
            "(Ljava/lang/String;)Ljava/lang/Class;",
            &[JValue::Object(&helper_class_name)],
        )
        .map_err(|e| platform(format!("loadClass: {e}")))?
        .l()
        .map_err(|e| platform(format!("loadClass result: {e}")))?;

    let helper_class = JClass::from(helper_class);
    env.register_native_methods(
        &helper_class,
        &[
            NativeMethod {
                name: "nativeOnCurrentLocation".into(),
                sig: "(JLjava/lang/String;)V".into(),
                fn_ptr: on_current_location as *mut c_void,
            },
            NativeMethod {
                name: "nativeOnCurrentCanceled".into(),
                sig: "(J)V".into(),
                fn_ptr: on_current_canceled as *mut c_void,
            },
            NativeMethod {
                name: "nativeOnCurrentFailed".into(),
                sig: "(JLjava/lang/String;)V".into(),
                fn_ptr: on_current_failed as *mut c_void,
            },
            NativeMethod {
                name: "nativeOnLocationUpdate".into(),
                sig: "(JLjava/lang/String;)V".into(),
                fn_ptr: on_location_update as *mut c_void,
            },
        ],
    )
    .map_err(|e| platform(format!("register natives: {e}")))?;

    env.new_global_ref(helper_class)
        .map_err(|e| platform(format!("new_global_ref: {e}")))
}

fn with_helper<T, F>(action: F) -> LocationResult<T>
where
    F: FnOnce(&mut JNIEnv<'_>, &JClass<'_>, &JObject<'_>) -> jni::errors::Result<T>,
{
    let (vm, context, helper) = match (JAVA_VM.get(), GLOBAL_CONTEXT.get(), HELPER_CLASS.get()) {
        (Some(vm), Some(context), Some(helper)) => (vm, context, helper),
        _ => return Err(platform("location not initialized, call init() first".into())),
    };

    let mut env = vm.attach_current_thread().map_err(map_jni_error)?;
    let class: &JClass = helper.as_obj().into();
    let result = action(&mut *env, class, context.as_obj());
    if result.is_err() && env.exception_check().unwrap_or(false) {
        let _ = env.exception_describe();
        let _ = env.exception_clear();
    }
    result.map_err(map_jni_error)
}

#[allow(clippy::cast_possible_wrap)]
const fn to_jlong(handle: u64) -> jlong {
    handle as jlong
}

#[allow(clippy::cast_sign_loss)]
const fn from_jlong(handle: jlong) -> u64 {
    handle as u64
}

/// Provider backed by `FusedLocationProviderClient`.
#[derive(Debug, Default)]
pub struct AndroidLocationProvider {
    active: Mutex<Option<u64>>,
}

impl AndroidLocationProvider {
    /// Creates the provider. [`init`] must have been called.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// An in-flight `getCurrentLocation` call, withdrawn from the helper on release.
struct PendingRequest {
    handle: u64,
}

impl Release for PendingRequest {
    fn release(self: Box<Self>) {
        let handle = self.handle;
        let waiting = pending()
            .lock()
            .expect("pending request mutex poisoned")
            .remove(&handle);
        // Already answered; the helper has nothing left to cancel.
        if waiting.is_none() {
            return;
        }
        if let Err(err) = with_helper(|env, class, _context| {
            env.call_static_method(
                class,
                "cancelCurrentLocation",
                "(J)V",
                &[JValue::Long(to_jlong(handle))],
            )?;
            Ok(())
        }) {
            error!("failed to release Android location request {handle}: {err}");
        }
    }
}

impl LocationProvider for AndroidLocationProvider {
    fn request_current(
        &self,
        _token: CancellationToken,
        responder: CurrentFixResponder,
    ) -> Box<dyn Release> {
        let handle = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
        pending()
            .lock()
            .expect("pending request mutex poisoned")
            .insert(handle, responder);

        let issued = with_helper(|env, class, context| {
            env.call_static_method(
                class,
                "getCurrentLocation",
                "(Landroid/content/Context;JI)V",
                &[
                    JValue::Object(context),
                    JValue::Long(to_jlong(handle)),
                    JValue::Int(PRIORITY_HIGH_ACCURACY),
                ],
            )?;
            Ok(())
        });

        if let Err(err) = issued {
            let responder = pending()
                .lock()
                .expect("pending request mutex poisoned")
                .remove(&handle);
            if let Some(responder) = responder {
                responder.fail(err);
            }
            return Box::new(());
        }
        Box::new(PendingRequest { handle })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn start_updates(&self, config: &UpdateConfig, sink: FixSink) -> LocationResult<()> {
        let handle = NEXT_HANDLE.fetch_add(1, Ordering::Relaxed);
        let mut active = self.active.lock().expect("active handle mutex poisoned");

        {
            let mut sinks = sinks().lock().expect("sink registry mutex poisoned");
            if let Some(previous) = active.take() {
                sinks.remove(&previous);
            }
            sinks.insert(handle, sink);
        }

        let distance = config.distance_filter_meters() as f32;
        let started = with_helper(|env, class, context| {
            env.call_static_method(
                class,
                "startUpdates",
                "(Landroid/content/Context;JF)V",
                &[
                    JValue::Object(context),
                    JValue::Long(to_jlong(handle)),
                    JValue::Float(distance),
                ],
            )?;
            Ok(())
        });

        match started {
            Ok(()) => {
                *active = Some(handle);
                Ok(())
            }
            Err(err) => {
                sinks()
                    .lock()
                    .expect("sink registry mutex poisoned")
                    .remove(&handle);
                Err(err)
            }
        }
    }

    fn stop_updates(&self) {
        let Some(handle) = self.active.lock().expect("active handle mutex poisoned").take() else {
            return;
        };

        sinks()
            .lock()
            .expect("sink registry mutex poisoned")
            .remove(&handle);

        if let Err(err) = with_helper(|env, class, context| {
            env.call_static_method(
                class,
                "stopUpdates",
                "(Landroid/content/Context;)V",
                &[JValue::Object(context)],
            )?;
            Ok(())
        }) {
            error!("failed to stop Android location updates: {err}");
        }
    }

    fn is_service_enabled(&self) -> LocationResult<bool> {
        with_helper(|env, class, context| {
            env.call_static_method(
                class,
                "isLocationServiceEnabled",
                "(Landroid/content/Context;)Z",
                &[JValue::Object(context)],
            )?
            .z()
        })
    }
}

fn take_pending(handle: u64) -> Option<CurrentFixResponder> {
    let responder = pending()
        .lock()
        .expect("pending request mutex poisoned")
        .remove(&handle);
    if responder.is_none() {
        log::debug!("Android location callback for released request {handle}");
    }
    responder
}

fn read_optional_string(
    env: &mut JNIEnv<'_>,
    value: &JString<'_>,
) -> Result<Option<String>, String> {
    if value.is_null() {
        return Ok(None);
    }
    env.get_string(value)
        .map(|s| Some(s.to_string_lossy().into_owned()))
        .map_err(|err| err.to_string())
}

fn parse_fix(json: &str) -> LocationResult<PlatformFix> {
    serde_json::from_str::<AndroidFix>(json)
        .map(PlatformFix::Android)
        .map_err(|err| LocationError::Serialization {
            message: err.to_string(),
        })
}

extern "system" fn on_current_location(
    mut env: JNIEnv<'_>,
    _class: JClass<'_>,
    handle: jlong,
    json: JString<'_>,
) {
    let Some(responder) = take_pending(from_jlong(handle)) else {
        return;
    };

    match read_optional_string(&mut env, &json) {
        Ok(None) => responder.deliver(None),
        Ok(Some(json)) => match parse_fix(&json) {
            Ok(fix) => responder.deliver(Some(fix)),
            Err(err) => responder.fail(err),
        },
        Err(message) => responder.fail(LocationError::Platform { message }),
    }
}

extern "system" fn on_current_canceled(_env: JNIEnv<'_>, _class: JClass<'_>, handle: jlong) {
    if let Some(responder) = take_pending(from_jlong(handle)) {
        responder.cancel();
    }
}

extern "system" fn on_current_failed(
    mut env: JNIEnv<'_>,
    _class: JClass<'_>,
    handle: jlong,
    message: JString<'_>,
) {
    let Some(responder) = take_pending(from_jlong(handle)) else {
        return;
    };

    let message = read_optional_string(&mut env, &message)
        .ok()
        .flatten()
        .unwrap_or_else(|| "unknown failure".to_string());
    responder.fail(LocationError::Platform { message });
}

extern "system" fn on_location_update(
    mut env: JNIEnv<'_>,
    _class: JClass<'_>,
    handle: jlong,
    json: JString<'_>,
) {
    let handle = from_jlong(handle);
    let sink = {
        let sinks = sinks().lock().expect("sink registry mutex poisoned");
        sinks.get(&handle).cloned()
    };

    let Some(sink) = sink else {
        log::warn!("received Android location update for unknown handle {handle}");
        return;
    };

    let json = match read_optional_string(&mut env, &json) {
        Ok(Some(json)) => json,
        Ok(None) => return,
        Err(err) => {
            error!("failed to read Android update payload: {err}");
            return;
        }
    };

    match parse_fix(&json) {
        Ok(fix) => {
            sink.deliver(fix);
        }
        Err(err) => error!("failed to decode Android location update: {err}"),
    }
}

fn platform(message: String) -> LocationError {
    LocationError::Platform { message }
}

#[allow(clippy::needless_pass_by_value)]
fn map_jni_error(err: jni::errors::Error) -> LocationError {
    LocationError::Platform {
        message: err.to_string(),
    }
}
