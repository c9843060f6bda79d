//! Route monitor demo
//!
//! Runs a route manager against the simulated platform, plugs in a wired
//! headset and a Bluetooth headset, brings up the hands-free link and prints
//! every event along the way.
//!
//! ```bash
//! RUST_LOG=callaudio_route_core=debug cargo run --example route_monitor
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use callaudio_route_core::{DeviceKind, RawDevice, RouteManager, SimulatedAudioService};
use tokio_stream::StreamExt;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,callaudio_route_core=debug".into()),
        )
        .init();

    let platform = SimulatedAudioService::new();
    let manager = RouteManager::new(Arc::new(platform.clone()));
    let mut events = manager.subscribe().context("manager has no event stream")?;

    let monitor = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => info!("event {} payload={:?}", event.name(), event.payload()),
                Err(e) => info!("missed events: {}", e),
            }
        }
    });

    let routes = manager.list_routes()?;
    info!("initial routes: {}", serde_json::to_string(&routes)?);

    platform.attach_device(RawDevice::output(10, DeviceKind::WiredHeadset));
    platform.attach_device(RawDevice::output(11, DeviceKind::BluetoothSco));
    info!("preferred route: {}", manager.preferred_route()?);

    manager.enable_hands_free()?;
    // Link comes up asynchronously: connecting, then connected
    platform.fire_hands_free_state(2);
    platform.fire_hands_free_state(1);

    platform.detach_device(11);
    manager.disable_hands_free()?;
    platform.fire_hands_free_state(0);
    info!("routes after unplugging bluetooth: {}", serde_json::to_string(&manager.list_routes()?)?);

    tokio::time::sleep(Duration::from_millis(100)).await;
    manager.shutdown();
    drop(manager);
    monitor.abort();
    Ok(())
}
