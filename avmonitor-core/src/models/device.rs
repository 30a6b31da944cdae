use serde::{Deserialize, Serialize};

/// Kind of media an input device produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

/// An input device available for capture.
///
/// Immutable snapshot from one catalog query; identifiers are unique
/// within a kind at the time of enumeration. Never cached across
/// refreshes — devices come and go with hotplug events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDevice {
    pub id: String,
    pub name: String,
    pub kind: MediaKind,
    pub is_default: bool,
}

/// Capture permission for a media kind.
///
/// `Unknown` means the user has not been asked yet; a capture session
/// may only be created once the state is `Granted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl PermissionState {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied)
    }
}
