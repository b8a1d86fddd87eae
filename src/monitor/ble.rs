use crate::app::SessionEvent;
use crate::errors::AppError;
use crate::protocol::{
    decode_characteristic, CharacteristicKind, SampleRate, MULTIPLEXED_INFO_UUID, SAMPLE_RATE_UUID,
};
use crate::scan::DiscoveredMonitor;
use crate::settings::BleSettings;

use btleplug::api::{Characteristic, Peripheral, ValueNotification, WriteType};
use futures::{Stream, StreamExt};
use log::*;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

struct RowerSessionActor {
    monitor: DiscoveredMonitor,
    sample_rate: SampleRate,
    use_multiplexed: bool,
    no_data_timeout: Duration,
    cancel_token: CancellationToken,
}

impl RowerSessionActor {
    async fn connect(
        &mut self,
        event_tx: &Sender<SessionEvent>,
        restart_tx: Sender<()>,
    ) -> Result<(), AppError> {
        let device = self.monitor.device.clone();
        'connection: loop {
            if self.cancel_token.is_cancelled() {
                break 'connection;
            }
            info!(
                "Connecting to rowing monitor! Name: {:?} | Id: {}",
                self.monitor.name, self.monitor.id
            );
            tokio::select! {
                conn_result = device.connect() => {
                    match conn_result {
                        Ok(_) => {
                            if let Err(e) = device.discover_services().await {
                                error!("Couldn't read services from connected device: {}", e);
                                continue 'connection;
                            }
                            let characteristics = device.characteristics();
                            debug!("Found {} characteristics", characteristics.len());

                            if !self.subscribe_to_rowing_service(&device, &characteristics).await {
                                error!("Didn't find rowing service during notification setup!");
                                device.disconnect().await?;
                                continue 'connection;
                            }
                            self.request_sample_rate(&device, &characteristics).await;

                            let notification_stream = match device.notifications().await {
                                Ok(stream) => stream,
                                Err(e) => {
                                    error!("Failed to get BLE notification stream: {}", e);
                                    device.disconnect().await?;
                                    continue 'connection;
                                }
                            };

                            self.notification_loop(event_tx, notification_stream).await;

                            info!("Rowing monitor stream closed!");
                            device.disconnect().await?;
                        }
                        Err(e) => {
                            error!("BLE Connection error: {}", e);
                            // This is the "Device Unreachable" error
                            // Weirdly enough, the Central manager doesn't get this error, only we do here
                            // So, we'll just restart the BLE manager to try to avoid continuous failed reconnects
                            if let btleplug::Error::NotConnected = e {
                                if restart_tx.send(()).await.is_err() {
                                    warn!("Couldn't ask for a BLE manager restart, app is closing?");
                                    break 'connection;
                                }
                                tokio::time::sleep(Duration::from_secs(3)).await;
                            }
                        }
                    }
                }
                _ = self.cancel_token.cancelled() => {
                    if device.is_connected().await.unwrap_or(false) {
                        device.disconnect().await?;
                    }
                    break 'connection;
                }
                _ = tokio::time::sleep(self.no_data_timeout) => {
                    error!("Connection timed out");
                }
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        Ok(())
    }

    /// Subscribes to every rowing-service record we want notifications for.
    /// Honors the multiplexed preference when the characteristic exists.
    /// Returns false if the device turns out to have no rowing service.
    async fn subscribe_to_rowing_service(
        &self,
        device: &btleplug::platform::Peripheral,
        characteristics: &std::collections::BTreeSet<Characteristic>,
    ) -> bool {
        if self.use_multiplexed {
            if let Some(multiplexed) = characteristics
                .iter()
                .find(|c| c.uuid == MULTIPLEXED_INFO_UUID)
            {
                if device.subscribe(multiplexed).await.is_ok() {
                    debug!("Subscribed to the multiplexed characteristic");
                    return true;
                }
                error!("Failed to subscribe to the multiplexed characteristic!");
            } else {
                warn!("Monitor doesn't offer the multiplexed characteristic, subscribing to each record");
            }
        }
        let mut subscribed = 0usize;
        for characteristic in characteristics {
            let known = CharacteristicKind::from_uuid(characteristic.uuid)
                .is_some_and(|kind| kind != CharacteristicKind::Multiplexed);
            if !known {
                continue;
            }
            match device.subscribe(characteristic).await {
                Ok(()) => subscribed += 1,
                Err(e) => error!("Failed to subscribe to {}: {}", characteristic.uuid, e),
            }
        }
        debug!("Subscribed to {subscribed} rowing characteristics");
        subscribed > 0
    }

    /// Asks the monitor to push status records at the configured rate.
    /// Best effort, older firmware rejects the write.
    async fn request_sample_rate(
        &self,
        device: &btleplug::platform::Peripheral,
        characteristics: &std::collections::BTreeSet<Characteristic>,
    ) {
        let Some(characteristic) = characteristics.iter().find(|c| c.uuid == SAMPLE_RATE_UUID)
        else {
            debug!("Monitor has no sample rate characteristic");
            return;
        };
        let payload = [u8::from(self.sample_rate)];
        match device
            .write(characteristic, &payload, WriteType::WithResponse)
            .await
        {
            Ok(()) => debug!("Set sample rate to {:?}", self.sample_rate),
            Err(e) => warn!("Failed to set sample rate, keeping monitor default: {}", e),
        }
    }

    async fn notification_loop(
        &mut self,
        event_tx: &Sender<SessionEvent>,
        mut notification_stream: Pin<Box<dyn Stream<Item = ValueNotification> + Send>>,
    ) {
        loop {
            tokio::select! {
                // Assume we have a good connection if we keep getting updates
                Some(data) = notification_stream.next() => {
                    match decode_characteristic(data.uuid, &data.value) {
                        Ok(rowing_data) => {
                            let event = SessionEvent::Data(self.monitor.id.clone(), rowing_data);
                            if event_tx.send(event).await.is_err() {
                                warn!("Couldn't send rowing data, app is closing?");
                                return;
                            }
                        }
                        Err(e) => {
                            warn!("Dropping notification: {}", e);
                        }
                    }
                }
                _ = tokio::time::sleep(self.no_data_timeout) => {
                    error!(
                        "No rowing data received in {} seconds!",
                        self.no_data_timeout.as_secs()
                    );
                    return;
                }
                _ = self.cancel_token.cancelled() => {
                    info!("Shutting down rowing notification thread!");
                    return;
                }
            }
        }
    }
}

pub async fn monitor_session_thread(
    event_tx: Sender<SessionEvent>,
    restart_tx: Sender<()>,
    monitor: DiscoveredMonitor,
    ble_settings: BleSettings,
    cancel_token: CancellationToken,
) {
    let no_data_timeout = Duration::from_secs(30);
    let monitor_id = monitor.id.clone();
    let mut session = RowerSessionActor {
        monitor,
        sample_rate: SampleRate::from_setting(&ble_settings.sample_rate).unwrap_or_default(),
        use_multiplexed: ble_settings.use_multiplexed,
        no_data_timeout,
        cancel_token,
    };

    if let Err(e) = session.connect(&event_tx, restart_tx).await {
        error!("Fatal BLE Error: {e}");
        let _ = event_tx
            .send(SessionEvent::Failed(monitor_id, e.to_string()))
            .await;
    }
}
