//! Route Bridge Integration Tests
//!
//! Drives the route manager purely through method names and the pushed
//! event stream, the way an application layer would.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::time::timeout;
use tokio_stream::StreamExt;

use callaudio_route_core::bridge::methods;
use callaudio_route_core::{
    DeviceKind, PlatformError, RawDevice, RouteBridge, RouteManagerConfig, SimulatedAudioService,
    SourceSelection,
};

fn bridge_for(platform: &SimulatedAudioService) -> RouteBridge {
    RouteBridge::new(Arc::new(platform.clone()), RouteManagerConfig::default()).unwrap()
}

#[tokio::test]
async fn test_call_flow_over_bridge() {
    let platform = SimulatedAudioService::new();
    let bridge = bridge_for(&platform);
    let mut events = bridge.events();

    let routes = bridge.call(methods::LIST_ROUTES).unwrap();
    assert_eq!(routes, json!(["EARPIECE", "SPEAKER"]));

    platform.attach_device(RawDevice::output(3, DeviceKind::BluetoothSco));
    let event = timeout(Duration::from_secs(1), events.next()).await.unwrap().unwrap();
    assert_eq!(event.name, "routesChanged");
    assert_eq!(event.payload, None);

    let routes = bridge.call(methods::LIST_ROUTES).unwrap();
    assert_eq!(routes, json!(["EARPIECE", "SPEAKER", "BLUETOOTH"]));

    assert_eq!(bridge.call(methods::ENABLE_HANDS_FREE).unwrap(), Value::Null);
    platform.fire_hands_free_state(1);

    let event = timeout(Duration::from_secs(1), events.next()).await.unwrap().unwrap();
    assert_eq!(event.name, "scoStateChanged");
    assert_eq!(event.payload, Some(json!({ "state": 1 })));

    assert_eq!(bridge.call(methods::DISABLE_HANDS_FREE).unwrap(), Value::Null);
    assert!(!bridge.manager().is_hands_free_requested());
}

#[tokio::test]
async fn test_enable_rejection() {
    let platform = SimulatedAudioService::new()
        .with_hands_free_failure(PlatformError::rejected("bluetooth off"));
    let bridge = bridge_for(&platform);

    let rejection = bridge.call(methods::ENABLE_HANDS_FREE).unwrap_err();
    assert_eq!(rejection.code, "SCO_ENABLE_ERROR");
    assert_eq!(
        rejection.message,
        "Failed to enable hands-free audio: Request rejected by platform: bluetooth off"
    );
    assert_eq!(
        rejection.cause.as_deref(),
        Some("Request rejected by platform: bluetooth off")
    );
}

#[tokio::test]
async fn test_disable_rejection() {
    let platform = SimulatedAudioService::new();
    let bridge = bridge_for(&platform);
    bridge.call(methods::ENABLE_HANDS_FREE).unwrap();

    platform.set_hands_free_failure(Some(PlatformError::unavailable("service restarting")));
    let rejection = bridge.call(methods::DISABLE_HANDS_FREE).unwrap_err();
    assert_eq!(rejection.code, "SCO_DISABLE_ERROR");
}

#[tokio::test]
async fn test_events_before_subscription_are_not_replayed() {
    let platform = SimulatedAudioService::new();
    let bridge = bridge_for(&platform);
    bridge.call(methods::LIST_ROUTES).unwrap();

    // Nobody listening yet
    platform.fire_hands_free_state(0);

    let mut events = bridge.events();
    platform.fire_hands_free_state(1);

    let event = timeout(Duration::from_secs(1), events.next()).await.unwrap().unwrap();
    assert_eq!(event.payload, Some(json!({ "state": 1 })));
}

#[tokio::test]
async fn test_heuristic_bridge() {
    let platform = SimulatedAudioService::new().with_wired_headset(true);
    let bridge = RouteBridge::new(
        Arc::new(platform),
        RouteManagerConfig::new().with_source_selection(SourceSelection::Heuristic),
    )
    .unwrap();

    let routes = bridge.call(methods::LIST_ROUTES).unwrap();
    assert_eq!(routes, json!(["SPEAKER", "WIRED_HEADSET", "EARPIECE"]));
}

#[tokio::test]
async fn test_rejection_serializes_for_transport() {
    let platform = SimulatedAudioService::new();
    let rejection = bridge_for(&platform).call("getRoutes").unwrap_err();
    assert_eq!(
        serde_json::to_value(&rejection).unwrap(),
        json!({ "code": "UNKNOWN_METHOD", "message": "Unknown method: getRoutes" })
    );
}
