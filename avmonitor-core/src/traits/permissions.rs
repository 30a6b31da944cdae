use crate::models::device::{MediaKind, PermissionState};

/// Completion for an asynchronous permission request.
pub type PermissionCallback = Box<dyn FnOnce(PermissionState) + Send + 'static>;

/// Capture permission checks for a media kind.
///
/// `request` must not block the calling lane; the completion may fire
/// on an arbitrary thread and implementations of the monitor marshal
/// the result back into control-lane state.
pub trait PermissionProbe: Send + Sync {
    /// Current permission state without prompting the user.
    fn status(&self, kind: MediaKind) -> PermissionState;

    /// Ask the user for access, resolving `Unknown` to a final state.
    fn request(&self, kind: MediaKind, completion: PermissionCallback);
}
