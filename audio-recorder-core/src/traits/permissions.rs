/// Recording permission check.
///
/// May trigger an OS prompt as a side effect. Denial is reported as `false`,
/// never as an error.
pub trait PermissionProvider: Send + Sync {
    fn has_permissions(&self) -> bool;
}

/// Permission policy for platforms that never prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysGranted;

impl PermissionProvider for AlwaysGranted {
    fn has_permissions(&self) -> bool {
        true
    }
}
