//! Core route and device types
//!
//! [`LogicalRoute`] is the small, stable vocabulary exposed to the application.
//! [`RawDevice`] is what the platform reports; it is only ever read and
//! classified, never mutated.

use serde::{Deserialize, Serialize};
use std::fmt;

/// App-facing audio output route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogicalRoute {
    /// Built-in loudspeaker
    Speaker,
    /// Built-in earpiece (handset receiver)
    Earpiece,
    /// Wired or USB headset / headphones
    WiredHeadset,
    /// Bluetooth hands-free or stereo device
    Bluetooth,
}

impl LogicalRoute {
    /// Wire name of the route
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalRoute::Speaker => "SPEAKER",
            LogicalRoute::Earpiece => "EARPIECE",
            LogicalRoute::WiredHeadset => "WIRED_HEADSET",
            LogicalRoute::Bluetooth => "BLUETOOTH",
        }
    }

    /// Rank used by [`RouteSet::preferred`]; higher wins
    fn preference(&self) -> u8 {
        match self {
            LogicalRoute::Bluetooth => 3,
            LogicalRoute::WiredHeadset => 2,
            LogicalRoute::Earpiece => 1,
            LogicalRoute::Speaker => 0,
        }
    }
}

impl fmt::Display for LogicalRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hardware device type reported by the platform
///
/// Codes follow the platform's device-type constants. Only the kinds the route
/// mapping cares about get a named variant; everything else is kept verbatim
/// in [`DeviceKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    BuiltinEarpiece,
    BuiltinSpeaker,
    WiredHeadset,
    WiredHeadphones,
    BluetoothSco,
    BluetoothA2dp,
    UsbHeadset,
    Other(i32),
}

impl DeviceKind {
    /// Map a raw platform type code
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => DeviceKind::BuiltinEarpiece,
            2 => DeviceKind::BuiltinSpeaker,
            3 => DeviceKind::WiredHeadset,
            4 => DeviceKind::WiredHeadphones,
            7 => DeviceKind::BluetoothSco,
            8 => DeviceKind::BluetoothA2dp,
            22 => DeviceKind::UsbHeadset,
            other => DeviceKind::Other(other),
        }
    }

    /// Raw platform type code
    pub fn code(&self) -> i32 {
        match self {
            DeviceKind::BuiltinEarpiece => 1,
            DeviceKind::BuiltinSpeaker => 2,
            DeviceKind::WiredHeadset => 3,
            DeviceKind::WiredHeadphones => 4,
            DeviceKind::BluetoothSco => 7,
            DeviceKind::BluetoothA2dp => 8,
            DeviceKind::UsbHeadset => 22,
            DeviceKind::Other(code) => *code,
        }
    }
}

/// Device direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceDirection {
    /// Playback device
    Output,
    /// Capture device
    Input,
}

/// Hardware device descriptor as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDevice {
    /// Platform device identifier
    pub id: i32,
    /// Device type
    pub kind: DeviceKind,
    /// Device direction
    pub direction: DeviceDirection,
}

impl RawDevice {
    /// Create a new device descriptor
    pub fn new(id: i32, kind: DeviceKind, direction: DeviceDirection) -> Self {
        Self {
            id,
            kind,
            direction,
        }
    }

    /// Create an output device descriptor
    pub fn output(id: i32, kind: DeviceKind) -> Self {
        Self::new(id, kind, DeviceDirection::Output)
    }

    /// Create an input device descriptor
    pub fn input(id: i32, kind: DeviceKind) -> Self {
        Self::new(id, kind, DeviceDirection::Input)
    }

    pub fn is_output(&self) -> bool {
        self.direction == DeviceDirection::Output
    }
}

/// Ordered, de-duplicated set of logical routes
///
/// Insertion order is the platform's enumeration order. A route is only ever
/// stored once; later duplicates are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RouteSet {
    routes: Vec<LogicalRoute>,
}

impl RouteSet {
    /// Create an empty route set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route unless already present. Returns whether it was added.
    pub fn insert(&mut self, route: LogicalRoute) -> bool {
        if self.routes.contains(&route) {
            return false;
        }
        self.routes.push(route);
        true
    }

    pub fn contains(&self, route: LogicalRoute) -> bool {
        self.routes.contains(&route)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LogicalRoute> {
        self.routes.iter()
    }

    pub fn as_slice(&self) -> &[LogicalRoute] {
        &self.routes
    }

    /// Best route to use for a call: Bluetooth, then wired headset, then
    /// earpiece, then speaker. An empty set yields the speaker.
    pub fn preferred(&self) -> LogicalRoute {
        self.routes
            .iter()
            .copied()
            .max_by_key(LogicalRoute::preference)
            .unwrap_or(LogicalRoute::Speaker)
    }
}

impl FromIterator<LogicalRoute> for RouteSet {
    fn from_iter<I: IntoIterator<Item = LogicalRoute>>(iter: I) -> Self {
        let mut set = RouteSet::new();
        for route in iter {
            set.insert(route);
        }
        set
    }
}

impl IntoIterator for RouteSet {
    type Item = LogicalRoute;
    type IntoIter = std::vec::IntoIter<LogicalRoute>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.into_iter()
    }
}

impl<'a> IntoIterator for &'a RouteSet {
    type Item = &'a LogicalRoute;
    type IntoIter = std::slice::Iter<'a, LogicalRoute>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}

/// Device attach/detach report delivered by the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceChange {
    /// Devices were attached
    Attached(Vec<RawDevice>),
    /// Devices were detached
    Detached(Vec<RawDevice>),
}

impl DeviceChange {
    pub fn devices(&self) -> &[RawDevice] {
        match self {
            DeviceChange::Attached(devices) | DeviceChange::Detached(devices) => devices,
        }
    }

    /// Whether this change can affect the output route set.
    ///
    /// An empty batch is treated as relevant since the platform did not say
    /// what changed.
    pub fn affects_outputs(&self) -> bool {
        let devices = self.devices();
        devices.is_empty() || devices.iter().any(RawDevice::is_output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_wire_names() {
        let json = serde_json::to_string(&[
            LogicalRoute::Speaker,
            LogicalRoute::Earpiece,
            LogicalRoute::WiredHeadset,
            LogicalRoute::Bluetooth,
        ])
        .unwrap();
        assert_eq!(json, r#"["SPEAKER","EARPIECE","WIRED_HEADSET","BLUETOOTH"]"#);
        assert_eq!(LogicalRoute::WiredHeadset.to_string(), "WIRED_HEADSET");
    }

    #[test]
    fn test_route_set_keeps_first_occurrence_order() {
        let set: RouteSet = [
            LogicalRoute::Speaker,
            LogicalRoute::Bluetooth,
            LogicalRoute::Speaker,
            LogicalRoute::Bluetooth,
            LogicalRoute::Earpiece,
        ]
        .into_iter()
        .collect();

        assert_eq!(
            set.as_slice(),
            &[LogicalRoute::Speaker, LogicalRoute::Bluetooth, LogicalRoute::Earpiece]
        );
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["SPEAKER","BLUETOOTH","EARPIECE"]"#);
    }

    #[test]
    fn test_insert_reports_duplicates() {
        let mut set = RouteSet::new();
        assert!(set.insert(LogicalRoute::Earpiece));
        assert!(!set.insert(LogicalRoute::Earpiece));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_preferred_route_priority() {
        let set: RouteSet = [LogicalRoute::Speaker, LogicalRoute::Earpiece].into_iter().collect();
        assert_eq!(set.preferred(), LogicalRoute::Earpiece);

        let set: RouteSet = [
            LogicalRoute::Speaker,
            LogicalRoute::WiredHeadset,
            LogicalRoute::Earpiece,
        ]
        .into_iter()
        .collect();
        assert_eq!(set.preferred(), LogicalRoute::WiredHeadset);

        let set: RouteSet = [
            LogicalRoute::WiredHeadset,
            LogicalRoute::Bluetooth,
            LogicalRoute::Speaker,
        ]
        .into_iter()
        .collect();
        assert_eq!(set.preferred(), LogicalRoute::Bluetooth);

        assert_eq!(RouteSet::new().preferred(), LogicalRoute::Speaker);
    }

    #[test]
    fn test_device_kind_codes() {
        for kind in [
            DeviceKind::BuiltinEarpiece,
            DeviceKind::BuiltinSpeaker,
            DeviceKind::WiredHeadset,
            DeviceKind::WiredHeadphones,
            DeviceKind::BluetoothSco,
            DeviceKind::BluetoothA2dp,
            DeviceKind::UsbHeadset,
        ] {
            assert_eq!(DeviceKind::from_code(kind.code()), kind);
        }
        assert_eq!(DeviceKind::from_code(9), DeviceKind::Other(9));
        assert_eq!(DeviceKind::Other(9).code(), 9);
    }

    #[test]
    fn test_change_relevance() {
        let mic_only = DeviceChange::Attached(vec![RawDevice::input(4, DeviceKind::WiredHeadset)]);
        assert!(!mic_only.affects_outputs());

        let headset = DeviceChange::Detached(vec![
            RawDevice::input(4, DeviceKind::WiredHeadset),
            RawDevice::output(5, DeviceKind::WiredHeadset),
        ]);
        assert!(headset.affects_outputs());

        assert!(DeviceChange::Attached(Vec::new()).affects_outputs());
    }
}
