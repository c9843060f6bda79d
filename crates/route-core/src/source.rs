//! Route sources
//!
//! Two strategies produce a [`RouteSet`]:
//!
//! - [`EnumeratingRouteSource`] asks the platform for every attached output
//!   device and classifies each one.
//! - [`HeuristicRouteSource`] is used where per-device enumeration does not
//!   exist and builds the set from coarse capability flags.
//!
//! The strategy is chosen once, when the manager is built.

use std::fmt;

use tracing::{debug, trace};

use crate::config::SourceSelection;
use crate::platform::{PlatformAudioService, PlatformResult};
use crate::types::{DeviceKind, LogicalRoute, RawDevice, RouteSet};

/// Strategy for computing the currently available routes
pub trait RouteSource: Send + Sync + fmt::Debug {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Compute the current route set
    fn available_routes(&self, platform: &dyn PlatformAudioService) -> PlatformResult<RouteSet>;

    /// Whether this source depends on device attach/detach notifications
    fn observes_devices(&self) -> bool;
}

/// Map a raw device to its logical route
///
/// Input devices and unknown device types map to `None`.
pub fn classify(device: &RawDevice) -> Option<LogicalRoute> {
    if !device.is_output() {
        return None;
    }

    match device.kind {
        DeviceKind::BluetoothSco | DeviceKind::BluetoothA2dp => Some(LogicalRoute::Bluetooth),
        DeviceKind::WiredHeadset | DeviceKind::WiredHeadphones | DeviceKind::UsbHeadset => {
            Some(LogicalRoute::WiredHeadset)
        }
        DeviceKind::BuiltinSpeaker => Some(LogicalRoute::Speaker),
        DeviceKind::BuiltinEarpiece => Some(LogicalRoute::Earpiece),
        DeviceKind::Other(_) => None,
    }
}

/// Build a route set from a device list, keeping first-occurrence order
pub fn routes_from_devices<'a, I>(devices: I) -> RouteSet
where
    I: IntoIterator<Item = &'a RawDevice>,
{
    let mut routes = RouteSet::new();
    for device in devices {
        match classify(device) {
            Some(route) => {
                if routes.insert(route) {
                    trace!("Device {} ({:?}) -> {}", device.id, device.kind, route);
                }
            }
            None => trace!("Skipping device {} ({:?})", device.id, device.kind),
        }
    }
    routes
}

/// Per-device enumeration
#[derive(Debug, Default, Clone, Copy)]
pub struct EnumeratingRouteSource;

impl RouteSource for EnumeratingRouteSource {
    fn name(&self) -> &'static str {
        "enumerating"
    }

    fn available_routes(&self, platform: &dyn PlatformAudioService) -> PlatformResult<RouteSet> {
        let devices = platform.enumerate_output_devices()?;
        debug!("Platform reported {} output device(s)", devices.len());
        Ok(routes_from_devices(&devices))
    }

    fn observes_devices(&self) -> bool {
        true
    }
}

/// Capability-flag fallback
///
/// Always yields the speaker first and the earpiece last, with Bluetooth and
/// wired headset in between when the platform reports them.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicRouteSource;

impl RouteSource for HeuristicRouteSource {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn available_routes(&self, platform: &dyn PlatformAudioService) -> PlatformResult<RouteSet> {
        let mut routes = RouteSet::new();
        routes.insert(LogicalRoute::Speaker);

        if platform.is_hands_free_available_off_call()? {
            routes.insert(LogicalRoute::Bluetooth);
        }
        if platform.is_wired_headset_connected()? {
            routes.insert(LogicalRoute::WiredHeadset);
        }

        routes.insert(LogicalRoute::Earpiece);
        Ok(routes)
    }

    // No device notifications exist on platforms that need this source.
    fn observes_devices(&self) -> bool {
        false
    }
}

/// Pick the route source for a platform
pub fn select_source(
    selection: SourceSelection,
    platform: &dyn PlatformAudioService,
) -> Box<dyn RouteSource> {
    let source: Box<dyn RouteSource> = match selection {
        SourceSelection::Enumerating => Box::new(EnumeratingRouteSource),
        SourceSelection::Heuristic => Box::new(HeuristicRouteSource),
        SourceSelection::Auto if platform.supports_device_enumeration() => {
            Box::new(EnumeratingRouteSource)
        }
        SourceSelection::Auto => Box::new(HeuristicRouteSource),
    };
    debug!("Using {} route source ({:?})", source.name(), selection);
    source
}
