//! The single home for monitor state.
//!
//! Exactly one task (the app loop) mutates the registry; everyone else gets
//! immutable snapshots over a broadcast channel. That keeps each record's
//! merge atomic: no subscriber can observe a record half-applied.

use std::collections::HashMap;

use tokio::sync::broadcast::{self, error::RecvError, Receiver as BReceiver, Sender as BSender};
use tracing::{debug, info, warn};

use super::{ConnectionState, FieldSet, MonitorId, MonitorState};
use crate::protocol::RowingData;

const UPDATE_CHANNEL_SIZE: usize = 32;

/// Snapshot of one monitor after a mutation, plus which workout fields the
/// mutation moved. Connection-only changes carry an empty set.
#[derive(Clone, Debug)]
pub struct MonitorUpdate {
    pub state: MonitorState,
    pub changed: FieldSet,
}

/// A live feed of [`MonitorUpdate`]s. Dropping it unsubscribes; a slow
/// subscriber that falls behind gets `RecvError::Lagged` and keeps going,
/// it never blocks the registry.
pub struct StateSubscription {
    rx: BReceiver<MonitorUpdate>,
}

impl StateSubscription {
    pub async fn recv(&mut self) -> Result<MonitorUpdate, RecvError> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Result<MonitorUpdate, broadcast::error::TryRecvError> {
        self.rx.try_recv()
    }
}

pub struct MonitorRegistry {
    monitors: HashMap<MonitorId, MonitorState>,
    update_tx: BSender<MonitorUpdate>,
}

impl MonitorRegistry {
    pub fn new() -> Self {
        let (update_tx, _) = broadcast::channel(UPDATE_CHANNEL_SIZE);
        Self {
            monitors: HashMap::new(),
            update_tx,
        }
    }

    pub fn subscribe(&self) -> StateSubscription {
        StateSubscription {
            rx: self.update_tx.subscribe(),
        }
    }

    pub fn get(&self, id: &MonitorId) -> Option<&MonitorState> {
        self.monitors.get(id)
    }

    pub fn monitors(&self) -> impl Iterator<Item = &MonitorState> {
        self.monitors.values()
    }

    /// Records an advertisement. New monitors enter as `Discovered`; known
    /// ones just refresh their advertised name and signal strength.
    pub fn discovered(&mut self, id: MonitorId, name: Option<String>, rssi: Option<i16>) {
        let state = self
            .monitors
            .entry(id.clone())
            .or_insert_with(|| MonitorState::new(id));
        let mut moved = false;
        if name.is_some() && state.name != name {
            state.name = name;
            moved = true;
        }
        if rssi.is_some() && state.rssi != rssi {
            state.rssi = rssi;
            moved = true;
        }
        if moved {
            let update = MonitorUpdate {
                state: state.clone(),
                changed: FieldSet::EMPTY,
            };
            let _ = self.update_tx.send(update);
        }
    }

    pub fn connecting(&mut self, id: &MonitorId) {
        self.transition(id, ConnectionState::Connecting);
    }

    pub fn connected(&mut self, id: &MonitorId) {
        self.transition(id, ConnectionState::Connected);
    }

    /// Marks the session over. Signal strength goes stale with the link and
    /// is dropped; the merged workout fields survive so consumers can still
    /// show the last known numbers.
    pub fn disconnected(&mut self, id: &MonitorId) {
        if let Some(state) = self.monitors.get_mut(id) {
            state.rssi = None;
        }
        self.transition(id, ConnectionState::Disconnected);
    }

    /// The adapter surfaces link events for every device on the host, so ids
    /// that never went through [`discovered`](Self::discovered) are dropped.
    fn transition(&mut self, id: &MonitorId, connection: ConnectionState) {
        let Some(state) = self.monitors.get_mut(id) else {
            warn!("Dropping {connection:?} transition for unknown monitor {id}");
            return;
        };
        if state.connection == connection {
            return;
        }
        info!("Monitor {id} is now {connection:?} (was {:?})", state.connection);
        state.connection = connection;
        let update = MonitorUpdate {
            state: state.clone(),
            changed: FieldSet::EMPTY,
        };
        let _ = self.update_tx.send(update);
    }

    /// Merges one decoded record into its monitor and broadcasts the result.
    /// Returns `None` when the record was dropped: unknown monitor, or a
    /// stale delivery to a monitor that is not `Connected`.
    pub fn apply(&mut self, id: &MonitorId, data: &RowingData) -> Option<FieldSet> {
        let Some(state) = self.monitors.get_mut(id) else {
            warn!("Dropping {} record for unknown monitor {id}", data.kind());
            return None;
        };
        let Some(changed) = state.apply(data) else {
            warn!(
                "Dropping stale {} record for {id}: monitor is {:?}",
                data.kind(),
                state.connection
            );
            return None;
        };
        if changed.is_empty() {
            debug!("{} record for {id} changed nothing", data.kind());
        } else {
            let update = MonitorUpdate {
                state: state.clone(),
                changed,
            };
            let _ = self.update_tx.send(update);
        }
        Some(changed)
    }

    pub fn forget(&mut self, id: &MonitorId) -> Option<MonitorState> {
        self.monitors.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::Field;
    use crate::protocol::{decode_kind, CharacteristicKind};

    fn stroke_record(count: u16) -> RowingData {
        let mut payload = [0u8; 20];
        payload[18] = count as u8;
        payload[19] = (count >> 8) as u8;
        decode_kind(CharacteristicKind::StrokeData, &payload).unwrap()
    }

    #[test_log::test]
    fn lifecycle_reaches_connected_and_applies() {
        let mut registry = MonitorRegistry::new();
        let id = MonitorId::from("pm5-1");

        registry.discovered(id.clone(), Some("PM5 430123456".into()), Some(-60));
        assert_eq!(
            registry.get(&id).unwrap().connection,
            ConnectionState::Discovered
        );

        registry.connecting(&id);
        registry.connected(&id);
        let changed = registry.apply(&id, &stroke_record(5)).unwrap();
        assert!(changed.contains(Field::StrokeCount));
        assert_eq!(
            registry
                .get(&id)
                .unwrap()
                .workout
                .stroke_count
                .unwrap()
                .strokes(),
            5
        );
    }

    #[test_log::test]
    fn records_before_connected_are_dropped() {
        let mut registry = MonitorRegistry::new();
        let id = MonitorId::from("pm5-1");
        registry.discovered(id.clone(), None, None);

        assert_eq!(registry.apply(&id, &stroke_record(5)), None);
        registry.connecting(&id);
        assert_eq!(registry.apply(&id, &stroke_record(5)), None);
        assert!(registry.get(&id).unwrap().workout.stroke_count.is_none());
    }

    #[test_log::test]
    fn records_for_unknown_monitors_are_dropped() {
        let mut registry = MonitorRegistry::new();
        let id = MonitorId::from("never-seen");
        assert_eq!(registry.apply(&id, &stroke_record(5)), None);
        assert!(registry.get(&id).is_none());
    }

    #[test_log::test]
    fn transitions_for_unknown_monitors_are_dropped() {
        let mut registry = MonitorRegistry::new();
        let mut subscription = registry.subscribe();

        // Link events arrive for every device on the adapter, not just the
        // ones the scanner reported. They must not materialize entries.
        registry.connected(&MonitorId::from("never-seen"));
        registry.disconnected(&MonitorId::from("never-seen-either"));

        assert!(registry.get(&MonitorId::from("never-seen")).is_none());
        assert_eq!(registry.monitors().count(), 0);
        assert!(subscription.try_recv().is_err());
    }

    #[test]
    fn disconnect_drops_rssi_but_keeps_fields() {
        let mut registry = MonitorRegistry::new();
        let id = MonitorId::from("pm5-1");
        registry.discovered(id.clone(), Some("PM5".into()), Some(-55));
        registry.connecting(&id);
        registry.connected(&id);
        registry.apply(&id, &stroke_record(12)).unwrap();

        registry.disconnected(&id);
        let state = registry.get(&id).unwrap();
        assert_eq!(state.connection, ConnectionState::Disconnected);
        assert_eq!(state.rssi, None);
        assert_eq!(state.name.as_deref(), Some("PM5"));
        assert_eq!(state.workout.stroke_count.unwrap().strokes(), 12);

        assert_eq!(registry.apply(&id, &stroke_record(13)), None);
    }

    #[test]
    fn subscribers_see_each_mutation_once() {
        let mut registry = MonitorRegistry::new();
        let mut subscription = registry.subscribe();
        let id = MonitorId::from("pm5-1");

        registry.discovered(id.clone(), Some("PM5".into()), None);
        registry.connecting(&id);
        registry.connected(&id);
        registry.apply(&id, &stroke_record(3)).unwrap();
        // Same record again: no movement, no broadcast
        registry.apply(&id, &stroke_record(3)).unwrap();

        let discovered = subscription.try_recv().unwrap();
        assert_eq!(discovered.state.connection, ConnectionState::Discovered);
        assert!(discovered.changed.is_empty());

        let connecting = subscription.try_recv().unwrap();
        assert_eq!(connecting.state.connection, ConnectionState::Connecting);
        let connected = subscription.try_recv().unwrap();
        assert_eq!(connected.state.connection, ConnectionState::Connected);

        let data = subscription.try_recv().unwrap();
        assert!(data.changed.contains(Field::StrokeCount));
        assert_eq!(data.state.workout.stroke_count.unwrap().strokes(), 3);

        assert!(subscription.try_recv().is_err());
    }

    #[test]
    fn dropped_subscription_does_not_block_publishing() {
        let mut registry = MonitorRegistry::new();
        let subscription = registry.subscribe();
        drop(subscription);
        let id = MonitorId::from("pm5-1");
        registry.discovered(id.clone(), Some("PM5".into()), None);
        registry.connecting(&id);
        registry.connected(&id);
        assert!(registry.apply(&id, &stroke_record(1)).is_some());
    }

    #[test]
    fn forget_removes_the_monitor() {
        let mut registry = MonitorRegistry::new();
        let id = MonitorId::from("pm5-1");
        registry.discovered(id.clone(), None, None);
        assert!(registry.forget(&id).is_some());
        assert!(registry.get(&id).is_none());
        assert_eq!(registry.monitors().count(), 0);
    }
}
