use crate::{PermissionError, PermissionInspector, PermissionSnapshot};

/// Inspector for targets without a location permission model.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedInspector;

impl UnsupportedInspector {
    /// Creates the inspector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PermissionInspector for UnsupportedInspector {
    fn inspect(&self) -> Result<PermissionSnapshot, PermissionError> {
        Err(PermissionError::NotSupported)
    }
}
