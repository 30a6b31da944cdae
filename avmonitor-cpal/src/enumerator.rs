//! Input device enumeration via the default cpal host.

use cpal::traits::{DeviceTrait, HostTrait};

use avmonitor_core::models::device::{InputDevice, MediaKind};
use avmonitor_core::models::error::MonitorError;
use avmonitor_core::DeviceCatalog;

/// Catalog backed by the default cpal host.
///
/// cpal does not expose stable device identifiers, so device names
/// double as ids — consistent with how the host itself looks devices
/// up. Video enumeration has no cpal backing and yields an empty list.
pub struct CpalDeviceCatalog;

impl CpalDeviceCatalog {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpalDeviceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceCatalog for CpalDeviceCatalog {
    fn list_devices(&self, kind: MediaKind) -> Result<Vec<InputDevice>, MonitorError> {
        if kind == MediaKind::Video {
            return Ok(Vec::new());
        }

        let host = cpal::default_host();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());

        let devices = host
            .input_devices()
            .map_err(|e| MonitorError::Unknown(format!("device enumeration failed: {}", e)))?;

        let mut list = Vec::new();
        for device in devices {
            let Ok(name) = device.name() else {
                continue;
            };
            // Devices that cannot produce an input config are not
            // usable capture sources.
            if device.default_input_config().is_err() {
                continue;
            }
            list.push(InputDevice {
                id: name.clone(),
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
                kind: MediaKind::Audio,
            });
        }
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_enumeration_is_empty() {
        let catalog = CpalDeviceCatalog::new();
        assert!(catalog.list_devices(MediaKind::Video).unwrap().is_empty());
    }
}
