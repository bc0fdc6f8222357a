//! Location permission classification.
//!
//! Android and Apple describe location access differently. Android has a set of
//! manifest-declared permissions, a runtime grant per permission and two API
//! levels that change the rules; Apple has a single five-state authorization.
//! This crate reduces either shape to one [`PermissionStatus`], an ordinal that
//! is stable across platforms.
//!
//! ```
//! use bglocation_permission::{
//!     AndroidPermissionState, DeclaredPermissions, PermissionSnapshot, PermissionStatus,
//!     RuntimeGrants, classify,
//! };
//!
//! let snapshot = PermissionSnapshot::Android(AndroidPermissionState {
//!     sdk_int: 33,
//!     declared: DeclaredPermissions { fine: true, coarse: true, background: false },
//!     granted: RuntimeGrants { fine: true, ..RuntimeGrants::default() },
//! });
//! assert_eq!(classify(&snapshot).unwrap(), PermissionStatus::ForegroundOnly);
//! ```

#![warn(missing_docs)]

mod classify;

/// Platform-specific implementations.
pub mod sys;

pub use classify::{SDK_BACKGROUND_PERMISSION, SDK_RUNTIME_PERMISSIONS, classify};

use std::fmt;

/// Ordinal permission status reported to the host.
///
/// The discriminants are the wire values and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PermissionStatus {
    /// No location permission granted.
    Denied = 0,
    /// Access blocked by a platform policy such as parental controls or MDM.
    Restricted = 1,
    /// Granted while the app is in the foreground only.
    ForegroundOnly = 2,
    /// Granted in the foreground and the background, or implicitly granted on
    /// platforms that predate runtime permissions.
    Always = 3,
    /// The user has not been asked yet.
    NotDetermined = 4,
}

impl PermissionStatus {
    /// Wire value of this status.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for PermissionStatus {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Denied),
            1 => Ok(Self::Restricted),
            2 => Ok(Self::ForegroundOnly),
            3 => Ok(Self::Always),
            4 => Ok(Self::NotDetermined),
            other => Err(other),
        }
    }
}

impl fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Denied => "denied",
            Self::Restricted => "restricted",
            Self::ForegroundOnly => "foreground only",
            Self::Always => "always",
            Self::NotDetermined => "not determined",
        };
        f.write_str(label)
    }
}

/// Android location permissions relevant to classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AndroidPermission {
    /// `ACCESS_FINE_LOCATION`.
    FineLocation,
    /// `ACCESS_COARSE_LOCATION`.
    CoarseLocation,
    /// `ACCESS_BACKGROUND_LOCATION`, introduced in API 29.
    BackgroundLocation,
}

impl AndroidPermission {
    /// All permissions, in manifest lookup order.
    pub const ALL: [Self; 3] = [
        Self::FineLocation,
        Self::CoarseLocation,
        Self::BackgroundLocation,
    ];

    /// Fully qualified manifest name.
    #[must_use]
    pub const fn manifest_name(self) -> &'static str {
        match self {
            Self::FineLocation => "android.permission.ACCESS_FINE_LOCATION",
            Self::CoarseLocation => "android.permission.ACCESS_COARSE_LOCATION",
            Self::BackgroundLocation => "android.permission.ACCESS_BACKGROUND_LOCATION",
        }
    }
}

/// Location permissions the host app declares in its manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeclaredPermissions {
    /// `ACCESS_FINE_LOCATION` is declared.
    pub fine: bool,
    /// `ACCESS_COARSE_LOCATION` is declared.
    pub coarse: bool,
    /// `ACCESS_BACKGROUND_LOCATION` is declared.
    pub background: bool,
}

impl DeclaredPermissions {
    /// Builds the declared set from a manifest's requested permission names.
    pub fn from_manifest<I, S>(requested: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut declared = Self::default();
        for name in requested {
            match name.as_ref() {
                n if n == AndroidPermission::FineLocation.manifest_name() => declared.fine = true,
                n if n == AndroidPermission::CoarseLocation.manifest_name() => {
                    declared.coarse = true;
                }
                n if n == AndroidPermission::BackgroundLocation.manifest_name() => {
                    declared.background = true;
                }
                _ => {}
            }
        }
        declared
    }

    /// Whether `permission` is declared.
    #[must_use]
    pub const fn contains(&self, permission: AndroidPermission) -> bool {
        match permission {
            AndroidPermission::FineLocation => self.fine,
            AndroidPermission::CoarseLocation => self.coarse,
            AndroidPermission::BackgroundLocation => self.background,
        }
    }
}

/// Runtime grant state of each location permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuntimeGrants {
    /// `ACCESS_FINE_LOCATION` is granted.
    pub fine: bool,
    /// `ACCESS_COARSE_LOCATION` is granted.
    pub coarse: bool,
    /// `ACCESS_BACKGROUND_LOCATION` is granted.
    pub background: bool,
}

impl RuntimeGrants {
    /// Whether `permission` is granted.
    #[must_use]
    pub const fn contains(&self, permission: AndroidPermission) -> bool {
        match permission {
            AndroidPermission::FineLocation => self.fine,
            AndroidPermission::CoarseLocation => self.coarse,
            AndroidPermission::BackgroundLocation => self.background,
        }
    }
}

/// Everything the Android classification needs, captured at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AndroidPermissionState {
    /// `Build.VERSION.SDK_INT` of the running OS.
    pub sdk_int: u32,
    /// Permissions declared in the manifest.
    pub declared: DeclaredPermissions,
    /// Runtime grants. Ignored below [`SDK_RUNTIME_PERMISSIONS`].
    pub granted: RuntimeGrants,
}

/// Apple `CLAuthorizationStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Authorization {
    /// `.notDetermined`
    NotDetermined,
    /// `.restricted`
    Restricted,
    /// `.denied`
    Denied,
    /// `.authorizedWhenInUse`
    AuthorizedWhenInUse,
    /// `.authorizedAlways`
    AuthorizedAlways,
}

impl From<Authorization> for PermissionStatus {
    fn from(authorization: Authorization) -> Self {
        match authorization {
            Authorization::NotDetermined => Self::NotDetermined,
            Authorization::Restricted => Self::Restricted,
            Authorization::Denied => Self::Denied,
            Authorization::AuthorizedWhenInUse => Self::ForegroundOnly,
            Authorization::AuthorizedAlways => Self::Always,
        }
    }
}

/// Platform permission state, tagged by platform model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionSnapshot {
    /// Manifest-declared permissions with version-gated runtime grants.
    Android(AndroidPermissionState),
    /// A single authorization enum.
    Apple(Authorization),
}

/// Errors that can occur while classifying permissions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionError {
    /// Neither fine nor coarse location is declared by the host app.
    #[error("no location permission declared in the manifest")]
    NotDeclared,
    /// The platform permission query itself failed.
    #[error("permission inspection failed: {message}")]
    Inspection {
        /// Platform error description.
        message: String,
    },
    /// There is no permission model for this platform.
    #[error("permission inspection not supported on this platform")]
    NotSupported,
}

/// Source of platform permission state.
///
/// Implementations query the OS on every call. Results are never cached.
pub trait PermissionInspector: Send + Sync + fmt::Debug {
    /// Captures the current permission state.
    ///
    /// # Errors
    /// Returns [`PermissionError::Inspection`] if the platform query fails.
    fn inspect(&self) -> Result<PermissionSnapshot, PermissionError>;
}

/// Inspects and classifies the current permission state.
///
/// # Errors
/// Returns a [`PermissionError`] if inspection fails or no location permission
/// is declared.
pub fn check(inspector: &dyn PermissionInspector) -> Result<PermissionStatus, PermissionError> {
    let snapshot = inspector.inspect()?;
    let status = classify(&snapshot)?;
    log::debug!("location permission status: {status}");
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Failing;

    impl PermissionInspector for Failing {
        fn inspect(&self) -> Result<PermissionSnapshot, PermissionError> {
            Err(PermissionError::Inspection {
                message: "package manager unavailable".into(),
            })
        }
    }

    #[derive(Debug)]
    struct Fixed(PermissionSnapshot);

    impl PermissionInspector for Fixed {
        fn inspect(&self) -> Result<PermissionSnapshot, PermissionError> {
            Ok(self.0)
        }
    }

    #[test]
    fn status_codes_are_stable() {
        let codes: Vec<u8> = [
            PermissionStatus::Denied,
            PermissionStatus::Restricted,
            PermissionStatus::ForegroundOnly,
            PermissionStatus::Always,
            PermissionStatus::NotDetermined,
        ]
        .into_iter()
        .map(PermissionStatus::code)
        .collect();
        assert_eq!(codes, vec![0, 1, 2, 3, 4]);
        assert_eq!(PermissionStatus::try_from(3), Ok(PermissionStatus::Always));
        assert_eq!(PermissionStatus::try_from(9), Err(9));
    }

    #[test]
    fn manifest_names_are_recognized() {
        let declared = DeclaredPermissions::from_manifest([
            "android.permission.INTERNET",
            "android.permission.ACCESS_COARSE_LOCATION",
            "android.permission.ACCESS_BACKGROUND_LOCATION",
        ]);
        assert_eq!(
            declared,
            DeclaredPermissions {
                fine: false,
                coarse: true,
                background: true,
            }
        );
    }

    #[test]
    fn inspection_fault_is_propagated() {
        assert!(matches!(
            check(&Failing),
            Err(PermissionError::Inspection { .. })
        ));
    }

    #[test]
    fn check_classifies_apple_snapshot() {
        let inspector = Fixed(PermissionSnapshot::Apple(Authorization::AuthorizedAlways));
        assert_eq!(check(&inspector), Ok(PermissionStatus::Always));
    }
}
