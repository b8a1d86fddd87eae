use crate::app::SessionEvent;
use crate::monitor::MonitorId;
use crate::protocol::{PM_BASE_SERVICE_UUID, ROWING_SERVICE_UUID};
use btleplug::api::{
    Central, CentralEvent, Manager as _, Peripheral, PeripheralProperties, ScanFilter,
};
use btleplug::platform::Manager;
use futures::StreamExt;
use log::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A peripheral the scanner believes is a rowing monitor, with the handle
/// needed to connect to it.
#[derive(Clone, Debug)]
pub struct DiscoveredMonitor {
    pub id: MonitorId,
    pub name: Option<String>,
    pub rssi: Option<i16>,
    pub device: btleplug::platform::Peripheral,
}

/// Advertises the rowing service, or carries a PM-style name. Some hosts
/// strip service UUIDs from advertisements, so the name check stays.
fn looks_like_monitor(properties: &PeripheralProperties) -> bool {
    if properties.services.contains(&PM_BASE_SERVICE_UUID)
        || properties.services.contains(&ROWING_SERVICE_UUID)
    {
        return true;
    }
    properties
        .local_name
        .as_deref()
        .is_some_and(|name| name.starts_with("PM"))
}

/// Scans for rowing monitors and forwards them to the provided
/// `mpsc::Sender`. The scan can be paused by setting the `pause_signal`
/// to `true`.
pub async fn bluetooth_event_thread(
    tx: mpsc::Sender<SessionEvent>,
    mut restart_signal: mpsc::Receiver<()>,
    pause_signal: Arc<AtomicBool>,
    cancel_token: CancellationToken,
) {
    // If no event is heard in this period,
    // the manager and adapter will be recreated
    // (if the scan isn't paused)
    let duration = Duration::from_secs(30);

    'adapter: loop {
        info!("Bluetooth CentralEvent thread started!");
        if cancel_token.is_cancelled() {
            info!("Shutting down Bluetooth CentralEvent thread!");
            break 'adapter;
        }
        let manager = match Manager::new().await {
            Ok(manager) => manager,
            Err(e) => {
                error!("Failed to create manager: {}", e);
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue 'adapter;
            }
        };
        let central = match manager.adapters().await.and_then(|adapters| {
            adapters
                .into_iter()
                .next()
                .ok_or(btleplug::Error::DeviceNotFound)
        }) {
            Ok(central) => central,
            Err(_) => {
                error!("No Bluetooth adapters found! Make sure it's plugged in and enabled.");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue 'adapter;
            }
        };

        if let Err(e) = central.start_scan(ScanFilter::default()).await {
            error!("Scanning failure: {}", e);
            tokio::time::sleep(Duration::from_secs(1)).await;
            continue 'adapter;
        }
        let mut events = match central.events().await {
            Ok(e) => e,
            Err(e) => {
                error!("BLE failure: {}", e);
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue 'adapter;
            }
        };
        debug!("Initial scanning started!");
        let mut scanning = true;

        'events: loop {
            if pause_signal.load(Ordering::SeqCst) {
                if scanning {
                    info!("Pausing scan");
                    central.stop_scan().await.expect("Failed to stop scan!");
                    scanning = false;
                }
            } else if !scanning {
                info!("Resuming scan");
                if let Err(e) = central.start_scan(ScanFilter::default()).await {
                    error!("Failed to resume scanning: {}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue 'events;
                }
                scanning = true;
            }
            tokio::select! {
                Some(event) = events.next() => {
                    match event {
                        CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => {
                            if let Ok(device) = central.peripheral(&id).await {
                                let properties = device
                                    .properties()
                                    .await
                                    .ok()
                                    .flatten()
                                    .unwrap_or_default();

                                if !looks_like_monitor(&properties) {
                                    continue 'events;
                                }

                                let monitor = DiscoveredMonitor {
                                    id: MonitorId::from(device.id().to_string()),
                                    name: properties.local_name,
                                    rssi: properties.rssi,
                                    device: device.clone(),
                                };

                                // Send a clone of the accumulated device information so far
                                if tx.send(SessionEvent::Discovered(monitor)).await.is_err() {
                                    error!("Couldn't send monitor info update!");
                                    break 'adapter;
                                }
                            }
                        }
                        CentralEvent::DeviceDisconnected(id) => {
                            warn!("Device disconnected: {}", id);
                            let id = MonitorId::from(id.to_string());
                            if tx.send(SessionEvent::Disconnected(id)).await.is_err() {
                                error!("Couldn't send Disconnected event!");
                                break 'adapter;
                            }
                        }
                        CentralEvent::DeviceConnected(id) => {
                            info!("Device connected: {}", id);
                            let id = MonitorId::from(id.to_string());
                            if tx.send(SessionEvent::Connected(id)).await.is_err() {
                                error!("Couldn't send Connected event!");
                                break 'adapter;
                            }
                        }
                        _ => {}
                    }
                }
                _ = cancel_token.cancelled() => {
                    info!("Shutting down Bluetooth CentralEvent thread!");
                    break 'adapter;
                }
                _ = tokio::time::sleep(duration) => {
                    debug!("CentralEvent timeout");
                    if !pause_signal.load(Ordering::SeqCst) {
                        warn!("Restarting manager and adapter!");
                        break 'events;
                    }
                }
                _ = restart_signal.recv() => {
                    warn!("Got signal to restart BLE manager and adapter!");
                    pause_signal.store(false, Ordering::SeqCst);
                    break 'events;
                }
            }
        }
    }
}
