//! Android permission inspection using JNI.
//!
//! Reads the manifest through `PackageManager` and runtime grants through
//! `Context.checkSelfPermission`. No helper classes are needed.

use std::sync::OnceLock;

use jni::objects::{GlobalRef, JObject, JObjectArray, JString, JValue};
use jni::{JNIEnv, JavaVM};

use crate::{
    AndroidPermission, AndroidPermissionState, DeclaredPermissions, PermissionError,
    PermissionInspector, PermissionSnapshot, RuntimeGrants, SDK_RUNTIME_PERMISSIONS,
};

/// `PackageManager.GET_PERMISSIONS`.
const GET_PERMISSIONS: i32 = 0x0000_1000;
/// `PackageManager.PERMISSION_GRANTED`.
const PERMISSION_GRANTED: i32 = 0;

/// Global reference to the Java VM.
static JAVA_VM: OnceLock<JavaVM> = OnceLock::new();
/// Global reference to the application Context.
static GLOBAL_CONTEXT: OnceLock<GlobalRef> = OnceLock::new();

/// Stores the VM and application context used by [`AndroidInspector`].
///
/// Must be called once before any inspection. Later calls are no-ops.
///
/// # Errors
/// Returns [`PermissionError::Inspection`] if the VM or a global reference
/// cannot be obtained.
pub fn init(env: &mut JNIEnv, context: &JObject) -> Result<(), PermissionError> {
    if GLOBAL_CONTEXT.get().is_some() {
        return Ok(());
    }

    if JAVA_VM.get().is_none() {
        let vm = env.get_java_vm().map_err(map_jni_error)?;
        let _ = JAVA_VM.set(vm);
    }

    let context_ref = env.new_global_ref(context).map_err(map_jni_error)?;
    let _ = GLOBAL_CONTEXT.set(context_ref);
    Ok(())
}

/// Inspector backed by the Android package manager.
#[derive(Debug, Default, Clone, Copy)]
pub struct AndroidInspector;

impl AndroidInspector {
    /// Creates the inspector. [`init`] must have been called.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PermissionInspector for AndroidInspector {
    fn inspect(&self) -> Result<PermissionSnapshot, PermissionError> {
        let (vm, context) = JAVA_VM
            .get()
            .zip(GLOBAL_CONTEXT.get())
            .ok_or_else(|| PermissionError::Inspection {
                message: "Android context not initialized".into(),
            })?;

        let mut env = vm.attach_current_thread().map_err(map_jni_error)?;
        let state = inspect_with_context(&mut env, context.as_obj());
        if env.exception_check().unwrap_or(false) {
            let _ = env.exception_clear();
        }
        state.map(PermissionSnapshot::Android)
    }
}

/// Captures the permission state using an explicit context.
///
/// # Errors
/// Returns [`PermissionError::Inspection`] if any JNI call fails.
pub fn inspect_with_context(
    env: &mut JNIEnv,
    context: &JObject,
) -> Result<AndroidPermissionState, PermissionError> {
    let sdk_int = sdk_int(env)?;
    let declared = declared_permissions(env, context)?;

    let mut granted = RuntimeGrants::default();
    if sdk_int >= SDK_RUNTIME_PERMISSIONS {
        for permission in AndroidPermission::ALL {
            if declared.contains(permission) && is_granted(env, context, permission)? {
                match permission {
                    AndroidPermission::FineLocation => granted.fine = true,
                    AndroidPermission::CoarseLocation => granted.coarse = true,
                    AndroidPermission::BackgroundLocation => granted.background = true,
                }
            }
        }
    }

    Ok(AndroidPermissionState {
        sdk_int,
        declared,
        granted,
    })
}

/// Reads `Build.VERSION.SDK_INT`.
///
/// # Errors
/// Returns [`PermissionError::Inspection`] if the field cannot be read.
pub fn sdk_int(env: &mut JNIEnv) -> Result<u32, PermissionError> {
    let value = env
        .get_static_field("android/os/Build$VERSION", "SDK_INT", "I")
        .map_err(map_jni_error)?
        .i()
        .map_err(map_jni_error)?;
    u32::try_from(value).map_err(|_| PermissionError::Inspection {
        message: format!("invalid SDK_INT {value}"),
    })
}

fn declared_permissions(
    env: &mut JNIEnv,
    context: &JObject,
) -> Result<DeclaredPermissions, PermissionError> {
    let package_manager = env
        .call_method(
            context,
            "getPackageManager",
            "()Landroid/content/pm/PackageManager;",
            &[],
        )
        .map_err(map_jni_error)?
        .l()
        .map_err(map_jni_error)?;

    let package_name = env
        .call_method(context, "getPackageName", "()Ljava/lang/String;", &[])
        .map_err(map_jni_error)?
        .l()
        .map_err(map_jni_error)?;

    let package_info = env
        .call_method(
            &package_manager,
            "getPackageInfo",
            "(Ljava/lang/String;I)Landroid/content/pm/PackageInfo;",
            &[JValue::Object(&package_name), JValue::Int(GET_PERMISSIONS)],
        )
        .map_err(map_jni_error)?
        .l()
        .map_err(map_jni_error)?;

    let requested = env
        .get_field(&package_info, "requestedPermissions", "[Ljava/lang/String;")
        .map_err(map_jni_error)?
        .l()
        .map_err(map_jni_error)?;

    if requested.is_null() {
        return Ok(DeclaredPermissions::default());
    }

    let requested = JObjectArray::from(requested);
    let len = env.get_array_length(&requested).map_err(map_jni_error)?;
    let mut names = Vec::with_capacity(usize::try_from(len).unwrap_or_default());
    for index in 0..len {
        let element = env
            .get_object_array_element(&requested, index)
            .map_err(map_jni_error)?;
        if element.is_null() {
            continue;
        }
        let name: String = env
            .get_string(&JString::from(element))
            .map_err(map_jni_error)?
            .into();
        names.push(name);
    }

    Ok(DeclaredPermissions::from_manifest(names))
}

fn is_granted(
    env: &mut JNIEnv,
    context: &JObject,
    permission: AndroidPermission,
) -> Result<bool, PermissionError> {
    let name = env
        .new_string(permission.manifest_name())
        .map_err(map_jni_error)?;
    let result = env
        .call_method(
            context,
            "checkSelfPermission",
            "(Ljava/lang/String;)I",
            &[JValue::Object(&name)],
        )
        .map_err(map_jni_error)?
        .i()
        .map_err(map_jni_error)?;
    Ok(result == PERMISSION_GRANTED)
}

#[allow(clippy::needless_pass_by_value)]
fn map_jni_error(err: jni::errors::Error) -> PermissionError {
    PermissionError::Inspection {
        message: err.to_string(),
    }
}
