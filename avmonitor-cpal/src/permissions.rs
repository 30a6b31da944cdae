//! Capture permission checks for cpal hosts.
//!
//! cpal exposes no permission API; on the platforms this backend
//! targets, access control surfaces as device visibility. A host with
//! at least one usable input device is treated as granted.

use cpal::traits::HostTrait;

use avmonitor_core::models::device::{MediaKind, PermissionState};
use avmonitor_core::traits::permissions::{PermissionCallback, PermissionProbe};

pub struct CpalPermissionProbe;

impl CpalPermissionProbe {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpalPermissionProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionProbe for CpalPermissionProbe {
    fn status(&self, kind: MediaKind) -> PermissionState {
        if kind == MediaKind::Video {
            return PermissionState::Unknown;
        }
        if cpal::default_host().default_input_device().is_some() {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        }
    }

    /// Resolves immediately; there is no prompt to wait on.
    fn request(&self, kind: MediaKind, completion: PermissionCallback) {
        completion(self.status(kind));
    }
}
