//! Device catalog: enumeration seam plus the filtering and ordering
//! applied to every device list before it reaches the UI.

use crate::models::device::{InputDevice, MediaKind};
use crate::models::error::MonitorError;

/// Enumerates input devices for a media kind.
///
/// Pure query against the platform media subsystem: no state, called
/// fresh on app start, permission changes, and connect/disconnect
/// notifications.
pub trait DeviceCatalog: Send + Sync {
    fn list_devices(&self, kind: MediaKind) -> Result<Vec<InputDevice>, MonitorError>;
}

/// Drop synthetic aggregate devices and sort by display name.
///
/// Name comparison is case-insensitive with the original spelling as a
/// tiebreaker, approximating a localized ascending sort.
pub fn filter_devices(mut devices: Vec<InputDevice>, excluded_fragments: &[String]) -> Vec<InputDevice> {
    devices.retain(|device| {
        !excluded_fragments
            .iter()
            .any(|fragment| device.name.contains(fragment))
    });
    devices.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: &str, name: &str) -> InputDevice {
        InputDevice {
            id: id.into(),
            name: name.into(),
            kind: MediaKind::Audio,
            is_default: false,
        }
    }

    #[test]
    fn excludes_aggregate_devices() {
        let devices = vec![
            device("a", "Built-in Microphone"),
            device("b", "CADefaultDeviceAggregate-1234"),
        ];
        let filtered = filter_devices(devices, &["CADefaultDeviceAggregate".to_string()]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "a");
    }

    #[test]
    fn sorts_case_insensitively() {
        let devices = vec![
            device("a", "zoom Mic"),
            device("b", "AirPods"),
            device("c", "Blue Yeti"),
        ];
        let sorted = filter_devices(devices, &[]);
        let names: Vec<&str> = sorted.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["AirPods", "Blue Yeti", "zoom Mic"]);
    }

    #[test]
    fn no_fragments_keeps_everything() {
        let devices = vec![device("a", "Mic A"), device("b", "Mic B")];
        assert_eq!(filter_devices(devices, &[]).len(), 2);
    }
}
