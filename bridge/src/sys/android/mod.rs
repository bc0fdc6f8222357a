//! Android settings intents and `SharedPreferences` using JNI.

use std::sync::OnceLock;

use jni::objects::{GlobalRef, JObject, JValue};
use jni::{JNIEnv, JavaVM};
use log::error;

use crate::{BridgeError, PreferenceStore, SettingsNavigator};

/// `Settings.ACTION_APPLICATION_DETAILS_SETTINGS`.
const ACTION_APPLICATION_DETAILS_SETTINGS: &str = "android.settings.APPLICATION_DETAILS_SETTINGS";
/// `Settings.ACTION_LOCATION_SOURCE_SETTINGS`.
const ACTION_LOCATION_SOURCE_SETTINGS: &str = "android.settings.LOCATION_SOURCE_SETTINGS";
/// `Intent.CATEGORY_DEFAULT`.
const CATEGORY_DEFAULT: &str = "android.intent.category.DEFAULT";
/// `FLAG_ACTIVITY_NEW_TASK | FLAG_ACTIVITY_NO_HISTORY | FLAG_ACTIVITY_EXCLUDE_FROM_RECENTS`.
const SETTINGS_FLAGS: i32 = 0x1000_0000 | 0x4000_0000 | 0x0080_0000;

/// Global reference to the Java VM.
static JAVA_VM: OnceLock<JavaVM> = OnceLock::new();
/// Global reference to the application Context.
static GLOBAL_CONTEXT: OnceLock<GlobalRef> = OnceLock::new();

/// Initializes every Android backend with the application Context.
///
/// Call once from `JNI_OnLoad` or the host plugin's attach hook, before
/// [`crate::Bridge::platform`].
///
/// # Errors
/// Returns a [`BridgeError`] if any backend fails to initialize.
pub fn init(env: &mut JNIEnv, context: &JObject) -> Result<(), BridgeError> {
    bglocation_permission::sys::android::init(env, context)?;
    bglocation_location::sys::android::init(env, context)?;

    if JAVA_VM.get().is_none() {
        let vm = env
            .get_java_vm()
            .map_err(|err| bglocation_location::LocationError::Platform {
                message: err.to_string(),
            })?;
        let _ = JAVA_VM.set(vm);
    }

    if GLOBAL_CONTEXT.get().is_none() {
        let context_ref =
            env.new_global_ref(context)
                .map_err(|err| bglocation_location::LocationError::Platform {
                    message: err.to_string(),
                })?;
        let _ = GLOBAL_CONTEXT.set(context_ref);
    }
    Ok(())
}

fn with_context<T>(
    action: impl FnOnce(&mut JNIEnv<'_>, &JObject<'_>) -> jni::errors::Result<T>,
) -> Option<T> {
    let (vm, context) = JAVA_VM.get().zip(GLOBAL_CONTEXT.get())?;
    let mut env = match vm.attach_current_thread() {
        Ok(env) => env,
        Err(err) => {
            error!("failed to attach to the Java VM: {err}");
            return None;
        }
    };

    match action(&mut *env, context.as_obj()) {
        Ok(value) => Some(value),
        Err(err) => {
            if env.exception_check().unwrap_or(false) {
                let _ = env.exception_describe();
                let _ = env.exception_clear();
            }
            error!("Android call failed: {err}");
            None
        }
    }
}

fn launch_settings(
    env: &mut JNIEnv<'_>,
    context: &JObject<'_>,
    action: &str,
    package_uri: bool,
) -> jni::errors::Result<()> {
    let action = env.new_string(action)?;
    let intent = env.new_object(
        "android/content/Intent",
        "(Ljava/lang/String;)V",
        &[JValue::Object(&action)],
    )?;

    let category = env.new_string(CATEGORY_DEFAULT)?;
    env.call_method(
        &intent,
        "addCategory",
        "(Ljava/lang/String;)Landroid/content/Intent;",
        &[JValue::Object(&category)],
    )?;

    if package_uri {
        let package = env
            .call_method(context, "getPackageName", "()Ljava/lang/String;", &[])?
            .l()?;
        let package = env.get_string((&package).into())?.to_string_lossy().into_owned();
        let uri_string = env.new_string(format!("package:{package}"))?;
        let uri = env
            .call_static_method(
                "android/net/Uri",
                "parse",
                "(Ljava/lang/String;)Landroid/net/Uri;",
                &[JValue::Object(&uri_string)],
            )?
            .l()?;
        env.call_method(
            &intent,
            "setData",
            "(Landroid/net/Uri;)Landroid/content/Intent;",
            &[JValue::Object(&uri)],
        )?;
    }

    env.call_method(
        &intent,
        "addFlags",
        "(I)Landroid/content/Intent;",
        &[JValue::Int(SETTINGS_FLAGS)],
    )?;
    env.call_method(
        context,
        "startActivity",
        "(Landroid/content/Intent;)V",
        &[JValue::Object(&intent)],
    )?;
    Ok(())
}

/// Settings navigation through activity intents.
#[derive(Debug, Default, Clone, Copy)]
pub struct AndroidSettings;

impl AndroidSettings {
    /// Creates the navigator. [`init`] must have been called.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SettingsNavigator for AndroidSettings {
    fn open_app_settings(&self) -> bool {
        with_context(|env, context| {
            launch_settings(env, context, ACTION_APPLICATION_DETAILS_SETTINGS, true)
        })
        .is_some()
    }

    fn open_location_settings(&self) -> bool {
        with_context(|env, context| {
            launch_settings(env, context, ACTION_LOCATION_SOURCE_SETTINGS, false)
        })
        .is_some()
    }
}

fn default_preferences<'local>(
    env: &mut JNIEnv<'local>,
    context: &JObject<'_>,
) -> jni::errors::Result<JObject<'local>> {
    env.call_static_method(
        "android/preference/PreferenceManager",
        "getDefaultSharedPreferences",
        "(Landroid/content/Context;)Landroid/content/SharedPreferences;",
        &[JValue::Object(context)],
    )?
    .l()
}

/// Preferences stored in the app's default `SharedPreferences`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SharedPreferencesStore;

impl SharedPreferencesStore {
    /// Creates the store. [`init`] must have been called.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PreferenceStore for SharedPreferencesStore {
    fn get_bool(&self, key: &str) -> bool {
        with_context(|env, context| {
            let prefs = default_preferences(env, context)?;
            let key = env.new_string(key)?;
            env.call_method(
                &prefs,
                "getBoolean",
                "(Ljava/lang/String;Z)Z",
                &[JValue::Object(&key), JValue::Bool(0)],
            )?
            .z()
        })
        .unwrap_or(false)
    }

    fn set_bool(&self, key: &str, value: bool) -> bool {
        with_context(|env, context| {
            let prefs = default_preferences(env, context)?;
            let editor = env
                .call_method(
                    &prefs,
                    "edit",
                    "()Landroid/content/SharedPreferences$Editor;",
                    &[],
                )?
                .l()?;
            let key = env.new_string(key)?;
            env.call_method(
                &editor,
                "putBoolean",
                "(Ljava/lang/String;Z)Landroid/content/SharedPreferences$Editor;",
                &[JValue::Object(&key), JValue::Bool(u8::from(value))],
            )?;
            env.call_method(&editor, "apply", "()V", &[])?;
            Ok(())
        })
        .is_some()
    }
}
