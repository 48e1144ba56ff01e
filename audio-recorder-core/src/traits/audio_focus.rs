/// Platform audio-focus arbitration.
///
/// Focus is requested when capture starts or resumes and abandoned when it
/// pauses or stops.
pub trait AudioFocus: Send + Sync {
    /// Request exclusive microphone focus. `false` means denied.
    fn request(&self) -> bool;

    /// Give focus back to the platform.
    fn abandon(&self);
}

/// Focus policy for platforms without arbitration: always granted.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnmanagedFocus;

impl AudioFocus for UnmanagedFocus {
    fn request(&self) -> bool {
        true
    }

    fn abandon(&self) {}
}
