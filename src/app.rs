use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::*;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::args::{SubCommands, TopLevelCmd};
use crate::errors::AppError;
use crate::logging::csv_logging_thread;
use crate::monitor::ble::monitor_session_thread;
use crate::monitor::dummy::{dummy_thread, SIMULATOR_ID, SIMULATOR_NAME};
use crate::monitor::registry::MonitorRegistry;
use crate::monitor::MonitorId;
use crate::protocol::{RowingData, SampleRate};
use crate::scan::{bluetooth_event_thread, DiscoveredMonitor};
use crate::settings::Settings;

const EVENT_CHANNEL_SIZE: usize = 64;
const RESTART_CHANNEL_SIZE: usize = 4;

/// Everything the actor threads report back to the app.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Discovered(DiscoveredMonitor),
    Connected(MonitorId),
    Disconnected(MonitorId),
    Data(MonitorId, RowingData),
    Failed(MonitorId, String),
}

pub struct App {
    pub settings: Settings,
    pub config_path: PathBuf,
    pub registry: MonitorRegistry,

    pub cancel_app: CancellationToken,
    pub cancel_actors: CancellationToken,

    event_tx: Sender<SessionEvent>,
    event_rx: Receiver<SessionEvent>,
    restart_tx: Sender<()>,
    restart_rx: Option<Receiver<()>>,
    ble_scan_paused: Arc<AtomicBool>,

    session_token: Option<CancellationToken>,
    active_monitor: Option<MonitorId>,
    threads: Vec<JoinHandle<()>>,
}

impl App {
    pub fn build(
        arg_config: &TopLevelCmd,
        parent_token: Option<CancellationToken>,
    ) -> Result<Self, AppError> {
        let (settings, config_path) = Settings::load(
            arg_config.config_override.as_deref(),
            arg_config.config_required,
        )?;
        if !arg_config.no_save {
            settings.save(&config_path)?;
        }
        // Catch a bad sample rate before any actor spawns with it
        SampleRate::from_setting(&settings.ble.sample_rate)
            .ok_or_else(|| AppError::SampleRate(settings.ble.sample_rate.clone()))?;

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);
        let (restart_tx, restart_rx) = mpsc::channel(RESTART_CHANNEL_SIZE);

        let cancel_app = parent_token.unwrap_or_default();
        let cancel_actors = cancel_app.child_token();

        Ok(Self {
            settings,
            config_path,
            registry: MonitorRegistry::new(),
            cancel_app,
            cancel_actors,
            event_tx,
            event_rx,
            restart_tx,
            restart_rx: Some(restart_rx),
            ble_scan_paused: Arc::new(AtomicBool::default()),
            session_token: None,
            active_monitor: None,
            threads: Vec::new(),
        })
    }

    /// Spawns the actor threads for the chosen mode. The simulator replaces
    /// the BLE scanner when enabled, everything downstream is identical.
    pub async fn init(&mut self, arg_config: &TopLevelCmd) {
        let subscription = self.registry.subscribe();
        let misc_settings = self.settings.misc.clone();
        let logging_token = self.cancel_actors.clone();
        self.threads.push(tokio::spawn(async move {
            csv_logging_thread(subscription, misc_settings, logging_token).await;
        }));

        let dummy_mode = self.settings.dummy.enabled
            || matches!(arg_config.subcommands, Some(SubCommands::Dummy(_)));

        if dummy_mode {
            let id = MonitorId::from(SIMULATOR_ID);
            self.registry
                .discovered(id.clone(), Some(SIMULATOR_NAME.to_owned()), None);
            self.registry.connecting(&id);
            self.active_monitor = Some(id);

            let event_tx = self.event_tx.clone();
            let dummy_settings = self.settings.dummy.clone();
            let dummy_token = self.cancel_actors.clone();
            self.threads.push(tokio::spawn(async move {
                dummy_thread(event_tx, dummy_settings, dummy_token).await;
            }));
        } else if let Some(restart_rx) = self.restart_rx.take() {
            let event_tx = self.event_tx.clone();
            let pause_signal = Arc::clone(&self.ble_scan_paused);
            let scan_token = self.cancel_actors.clone();
            self.threads.push(tokio::spawn(async move {
                bluetooth_event_thread(event_tx, restart_rx, pause_signal, scan_token).await;
            }));
        }
    }

    pub async fn app_receivers(&mut self) -> Option<SessionEvent> {
        self.event_rx.recv().await
    }

    pub async fn app_handlers(&mut self, data: Option<SessionEvent>) {
        match data {
            Some(event) => self.handle_event(event).await,
            None => {
                warn!("Event channel closed, shutting down");
                self.cancel_actors.cancel();
            }
        }
    }

    async fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Discovered(monitor) => {
                self.registry
                    .discovered(monitor.id.clone(), monitor.name.clone(), monitor.rssi);
                if self.active_monitor.is_none() && self.should_connect(&monitor) {
                    self.connect_monitor(monitor);
                }
            }
            SessionEvent::Connected(id) => {
                self.registry.connected(&id);
            }
            SessionEvent::Disconnected(id) => {
                // The session actor keeps retrying on its own, scanning
                // stays paused until it gives up for good
                self.registry.disconnected(&id);
            }
            SessionEvent::Data(id, data) => {
                // The registry broadcasts accepted changes itself
                let _ = self.registry.apply(&id, &data);
            }
            SessionEvent::Failed(id, message) => {
                error!("Monitor session failed: {message}");
                self.registry.disconnected(&id);
                if self.active_monitor.as_ref() == Some(&id) {
                    self.active_monitor = None;
                    if let Some(token) = self.session_token.take() {
                        token.cancel();
                    }
                    self.ble_scan_paused.store(false, Ordering::SeqCst);
                }
            }
        }
    }

    /// Saved address wins, then saved name, then the configured name prefix.
    fn should_connect(&self, monitor: &DiscoveredMonitor) -> bool {
        let ble = &self.settings.ble;
        if !ble.saved_address.is_empty() {
            return monitor.id.as_str() == ble.saved_address;
        }
        if !ble.saved_name.is_empty() {
            return monitor.name.as_deref() == Some(ble.saved_name.as_str());
        }
        if ble.name_prefix.is_empty() {
            return false;
        }
        monitor
            .name
            .as_deref()
            .is_some_and(|name| name.starts_with(&ble.name_prefix))
    }

    fn connect_monitor(&mut self, monitor: DiscoveredMonitor) {
        info!(
            "Starting session with {} ({})",
            monitor.name.as_deref().unwrap_or("unnamed monitor"),
            monitor.id
        );
        self.ble_scan_paused.store(true, Ordering::SeqCst);
        self.registry.connecting(&monitor.id);
        self.active_monitor = Some(monitor.id.clone());

        let session_token = self.cancel_actors.child_token();
        self.session_token = Some(session_token.clone());
        let event_tx = self.event_tx.clone();
        let restart_tx = self.restart_tx.clone();
        let ble_settings = self.settings.ble.clone();
        self.threads.push(tokio::spawn(async move {
            monitor_session_thread(event_tx, restart_tx, monitor, ble_settings, session_token)
                .await;
        }));
    }

    pub async fn join_threads(&mut self) {
        self.cancel_actors.cancel();
        for thread in self.threads.drain(..) {
            if let Err(e) = thread.await {
                error!("Actor thread panicked: {e}");
            }
        }
    }
}
