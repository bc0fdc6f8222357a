use crate::{AndroidPermissionState, PermissionError, PermissionSnapshot, PermissionStatus};

/// First API level with runtime permissions (Android 6.0, `M`).
pub const SDK_RUNTIME_PERMISSIONS: u32 = 23;

/// First API level with a separate background location permission (Android 10, `Q`).
pub const SDK_BACKGROUND_PERMISSION: u32 = 29;

/// Reduces a permission snapshot to a [`PermissionStatus`].
///
/// # Errors
/// Returns [`PermissionError::NotDeclared`] for an Android snapshot that
/// declares neither fine nor coarse location, whatever the runtime grants are.
pub fn classify(snapshot: &PermissionSnapshot) -> Result<PermissionStatus, PermissionError> {
    match snapshot {
        PermissionSnapshot::Android(state) => classify_android(state),
        PermissionSnapshot::Apple(authorization) => Ok((*authorization).into()),
    }
}

fn classify_android(state: &AndroidPermissionState) -> Result<PermissionStatus, PermissionError> {
    let declared = state.declared;
    let granted = state.granted;

    if !declared.fine && !declared.coarse {
        return Err(PermissionError::NotDeclared);
    }

    if state.sdk_int < SDK_RUNTIME_PERMISSIONS {
        return Ok(PermissionStatus::Always);
    }

    // Fine and coarse are interchangeable here, but only if declared.
    let foreground = (declared.fine && granted.fine) || (declared.coarse && granted.coarse);
    if !foreground {
        return Ok(PermissionStatus::Denied);
    }

    if state.sdk_int < SDK_BACKGROUND_PERMISSION || (declared.background && granted.background) {
        return Ok(PermissionStatus::Always);
    }

    Ok(PermissionStatus::ForegroundOnly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Authorization, DeclaredPermissions, RuntimeGrants};

    const MODERN: u32 = 34;

    fn android(
        sdk_int: u32,
        declared: DeclaredPermissions,
        granted: RuntimeGrants,
    ) -> PermissionSnapshot {
        PermissionSnapshot::Android(AndroidPermissionState {
            sdk_int,
            declared,
            granted,
        })
    }

    const fn declared(fine: bool, coarse: bool, background: bool) -> DeclaredPermissions {
        DeclaredPermissions {
            fine,
            coarse,
            background,
        }
    }

    const fn granted(fine: bool, coarse: bool, background: bool) -> RuntimeGrants {
        RuntimeGrants {
            fine,
            coarse,
            background,
        }
    }

    #[test]
    fn undeclared_is_a_configuration_error_regardless_of_grants() {
        for sdk in [19, 23, 28, 29, MODERN] {
            for grants in [granted(false, false, false), granted(true, true, true)] {
                let snapshot = android(sdk, declared(false, false, true), grants);
                assert_eq!(classify(&snapshot), Err(PermissionError::NotDeclared));
            }
        }
    }

    #[test]
    fn pre_runtime_permission_platform_is_always_granted() {
        let snapshot = android(22, declared(true, false, false), granted(false, false, false));
        assert_eq!(classify(&snapshot), Ok(PermissionStatus::Always));
    }

    #[test]
    fn nothing_granted_is_denied() {
        let snapshot = android(MODERN, declared(true, true, true), granted(false, false, true));
        assert_eq!(classify(&snapshot), Ok(PermissionStatus::Denied));
    }

    #[test]
    fn undeclared_grant_does_not_count() {
        let snapshot = android(MODERN, declared(false, true, false), granted(true, false, false));
        assert_eq!(classify(&snapshot), Ok(PermissionStatus::Denied));
    }

    #[test]
    fn coarse_grant_is_equivalent_to_fine() {
        let fine = android(MODERN, declared(true, true, false), granted(true, false, false));
        let coarse = android(MODERN, declared(true, true, false), granted(false, true, false));
        assert_eq!(classify(&fine), classify(&coarse));
    }

    #[test]
    fn pre_background_platform_is_always_once_granted() {
        let snapshot = android(28, declared(true, false, false), granted(true, false, false));
        assert_eq!(classify(&snapshot), Ok(PermissionStatus::Always));
    }

    #[test]
    fn background_not_declared_is_foreground_only() {
        let snapshot = android(MODERN, declared(true, false, false), granted(true, false, true));
        assert_eq!(classify(&snapshot), Ok(PermissionStatus::ForegroundOnly));
    }

    #[test]
    fn background_declared_and_granted_is_always() {
        let snapshot = android(MODERN, declared(true, false, true), granted(true, false, true));
        assert_eq!(classify(&snapshot), Ok(PermissionStatus::Always));
    }

    #[test]
    fn background_declared_but_not_granted_is_foreground_only() {
        let snapshot = android(MODERN, declared(true, false, true), granted(true, false, false));
        assert_eq!(classify(&snapshot), Ok(PermissionStatus::ForegroundOnly));
    }

    #[test]
    fn apple_authorization_maps_directly() {
        let cases = [
            (Authorization::NotDetermined, PermissionStatus::NotDetermined),
            (Authorization::Restricted, PermissionStatus::Restricted),
            (Authorization::Denied, PermissionStatus::Denied),
            (Authorization::AuthorizedWhenInUse, PermissionStatus::ForegroundOnly),
            (Authorization::AuthorizedAlways, PermissionStatus::Always),
        ];
        for (authorization, expected) in cases {
            assert_eq!(
                classify(&PermissionSnapshot::Apple(authorization)),
                Ok(expected)
            );
        }
    }
}
