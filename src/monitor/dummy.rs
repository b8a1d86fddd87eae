use crate::app::SessionEvent;
use crate::monitor::MonitorId;
use crate::protocol::workout::{
    DurationType, ErgMachineType, IntervalType, RowingState, StrokeState, WorkoutState, WorkoutType,
};
use crate::protocol::{decode_kind, CharacteristicKind};
use crate::settings::DummySettings;

use log::*;
use rand::Rng;
use std::time::Duration;

use tokio::sync::mpsc::Sender;
use tokio::time;
use tokio_util::sync::CancellationToken;

/// Registry id used for the simulated monitor.
pub const SIMULATOR_ID: &str = "sim-pm5";
pub const SIMULATOR_NAME: &str = "PM5 Simulator";

const TICK: Duration = Duration::from_millis(500);
const TICK_CS: u32 = 50;

fn pair(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

fn triple(value: u32) -> [u8; 3] {
    [value as u8, (value >> 8) as u8, (value >> 16) as u8]
}

/// Rolling state of the fake rower. Payload builders emit the exact
/// byte layouts a PM sends so updates travel the normal decode path.
struct Simulation {
    stroke_rate: u8,
    drag_factor: u8,
    base_pace_cs: u32,

    elapsed_cs: u32,
    distance_cm: f64,
    calories: f64,
    stroke_count: u16,
    pace_cs: u32,
    watts: u16,
    watt_sum: u64,
    ticks: u64,
}

impl Simulation {
    fn new(dummy_settings: &DummySettings) -> Self {
        let base_pace_cs = (dummy_settings.pace_secs_per_500m * 100.0) as u32;
        Self {
            stroke_rate: dummy_settings.stroke_rate.max(10),
            drag_factor: dummy_settings.drag_factor,
            base_pace_cs: base_pace_cs.max(100),
            elapsed_cs: 0,
            distance_cm: 0.0,
            calories: 0.0,
            stroke_count: 0,
            pace_cs: base_pace_cs.max(100),
            watts: 0,
            watt_sum: 0,
            ticks: 0,
        }
    }

    /// Centiseconds per full drive-and-recovery cycle.
    fn stroke_period_cs(&self) -> u32 {
        6000 / u32::from(self.stroke_rate)
    }

    fn speed_mps(&self) -> f64 {
        500.0 / (f64::from(self.pace_cs) / 100.0)
    }

    /// Advances one sample tick. Returns true when a stroke finished
    /// during the tick.
    fn tick(&mut self) -> bool {
        let strokes_before = self.elapsed_cs / self.stroke_period_cs();
        self.elapsed_cs += TICK_CS;
        let strokes_after = self.elapsed_cs / self.stroke_period_cs();

        let mut rng = rand::thread_rng();
        let jitter = rng.gen_range(-4i32..=4);
        self.pace_cs = self.base_pace_cs.saturating_add_signed(jitter).max(100);
        // Concept2 pace-to-watts curve
        let secs_per_meter = f64::from(self.pace_cs) / 100.0 / 500.0;
        self.watts = (2.8 / secs_per_meter.powi(3)).round() as u16;

        self.distance_cm += self.speed_mps() * TICK.as_secs_f64() * 100.0;
        let calories_per_hour = f64::from(self.watts) * 3.44 + 300.0;
        self.calories += calories_per_hour * TICK.as_secs_f64() / 3600.0;
        self.watt_sum += u64::from(self.watts);
        self.ticks += 1;

        let stroke_finished = strokes_after > strokes_before;
        if stroke_finished {
            self.stroke_count = self.stroke_count.wrapping_add(1);
        }
        stroke_finished
    }

    fn average_watts(&self) -> u16 {
        if self.ticks == 0 {
            0
        } else {
            (self.watt_sum / self.ticks) as u16
        }
    }

    fn average_pace_cs(&self) -> u32 {
        if self.distance_cm < 1.0 {
            0
        } else {
            (u64::from(self.elapsed_cs) * 50_000 / self.distance_cm as u64) as u32
        }
    }

    fn heart_rate(&self) -> u8 {
        110u8.saturating_add(self.stroke_count.min(50) as u8)
    }

    fn drive_time_cs(&self) -> u32 {
        self.stroke_period_cs() * 35 / 100
    }

    fn general_status(&self) -> Vec<u8> {
        let in_drive = self.elapsed_cs % self.stroke_period_cs() < self.drive_time_cs();
        let stroke_state = if in_drive {
            StrokeState::Driving
        } else {
            StrokeState::Recovery
        };
        let mut payload = Vec::with_capacity(19);
        payload.extend_from_slice(&triple(self.elapsed_cs));
        payload.extend_from_slice(&triple(self.distance_cm as u32 / 10));
        payload.push(u8::from(WorkoutType::JustRowSplits));
        payload.push(u8::from(IntervalType::None));
        payload.push(u8::from(WorkoutState::WorkoutRow));
        payload.push(u8::from(RowingState::Active));
        payload.push(u8::from(stroke_state));
        payload.extend_from_slice(&triple(self.distance_cm as u32 / 100));
        payload.extend_from_slice(&triple(0));
        payload.push(u8::from(DurationType::Time));
        payload.push(self.drag_factor);
        payload
    }

    fn additional_status_1(&self) -> Vec<u8> {
        let speed_mmps = (self.speed_mps() * 1000.0) as u16;
        let mut payload = Vec::with_capacity(17);
        payload.extend_from_slice(&triple(self.elapsed_cs));
        payload.extend_from_slice(&pair(speed_mmps));
        payload.push(self.stroke_rate);
        payload.push(self.heart_rate());
        payload.extend_from_slice(&pair(self.pace_cs as u16));
        payload.extend_from_slice(&pair(self.average_pace_cs() as u16));
        payload.extend_from_slice(&pair(0));
        payload.extend_from_slice(&triple(0));
        payload.push(u8::from(ErgMachineType::StaticD));
        payload
    }

    fn additional_status_2(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(20);
        payload.extend_from_slice(&triple(self.elapsed_cs));
        payload.push(0); // interval count
        payload.extend_from_slice(&pair(self.average_watts()));
        payload.extend_from_slice(&pair(self.calories as u16));
        payload.extend_from_slice(&pair(self.average_pace_cs() as u16));
        payload.extend_from_slice(&pair(self.average_watts()));
        payload.extend_from_slice(&pair((f64::from(self.average_watts()) * 3.44 + 300.0) as u16));
        payload.extend_from_slice(&triple(self.elapsed_cs / 10));
        payload.extend_from_slice(&triple(self.distance_cm as u32 / 100));
        payload
    }

    fn stroke_data(&self) -> Vec<u8> {
        let period_cs = self.stroke_period_cs();
        let drive_cs = self.drive_time_cs();
        let stroke_distance_cm = (self.speed_mps() * f64::from(period_cs) / 100.0 * 100.0) as u16;
        let work_per_stroke_dj = u32::from(self.watts) * period_cs / 10;
        let mut payload = Vec::with_capacity(20);
        payload.extend_from_slice(&triple(self.elapsed_cs));
        payload.extend_from_slice(&triple(self.distance_cm as u32 / 10));
        payload.push(140); // drive length, cm
        payload.push(drive_cs.min(255) as u8);
        payload.extend_from_slice(&pair((period_cs - drive_cs) as u16));
        payload.extend_from_slice(&pair(stroke_distance_cm));
        payload.extend_from_slice(&pair(1200)); // peak force, 0.1 lbf
        payload.extend_from_slice(&pair(700)); // average force, 0.1 lbf
        payload.extend_from_slice(&pair(work_per_stroke_dj.min(u16::MAX.into()) as u16));
        payload.extend_from_slice(&pair(self.stroke_count));
        payload
    }
}

async fn send_record(
    event_tx: &Sender<SessionEvent>,
    id: &MonitorId,
    kind: CharacteristicKind,
    payload: &[u8],
) -> bool {
    match decode_kind(kind, payload) {
        Ok(data) => event_tx
            .send(SessionEvent::Data(id.clone(), data))
            .await
            .is_ok(),
        Err(e) => {
            error!("Simulator built a bad {kind} payload: {e}");
            true
        }
    }
}

pub async fn dummy_thread(
    event_tx: Sender<SessionEvent>,
    dummy_settings: DummySettings,
    cancel_token: CancellationToken,
) {
    let id = MonitorId::from(SIMULATOR_ID);
    let strokes_before_dc = dummy_settings.strokes_before_dc;
    let mut sim = Simulation::new(&dummy_settings);
    let mut update_interval = time::interval(TICK);

    if event_tx
        .send(SessionEvent::Connected(id.clone()))
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            _ = update_interval.tick() => {
                let stroke_finished = sim.tick();

                let sent = send_record(&event_tx, &id, CharacteristicKind::GeneralStatus, &sim.general_status()).await
                    && send_record(&event_tx, &id, CharacteristicKind::AdditionalStatus1, &sim.additional_status_1()).await
                    && send_record(&event_tx, &id, CharacteristicKind::AdditionalStatus2, &sim.additional_status_2()).await;
                if !sent {
                    break;
                }
                if stroke_finished
                    && !send_record(&event_tx, &id, CharacteristicKind::StrokeData, &sim.stroke_data()).await
                {
                    break;
                }

                if strokes_before_dc != 0
                    && stroke_finished
                    && sim.stroke_count % strokes_before_dc == 0
                {
                    info!("Simulating lost connection");
                    if event_tx.send(SessionEvent::Disconnected(id.clone())).await.is_err() {
                        break;
                    }
                    tokio::select! {
                        _ = time::sleep(Duration::from_secs(2)) => {
                            if event_tx.send(SessionEvent::Connected(id.clone())).await.is_err() {
                                break;
                            }
                            update_interval.reset();
                        }
                        _ = cancel_token.cancelled() => {
                            info!("Shutting down Dummy thread!");
                            break;
                        }
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                info!("Shutting down Dummy thread!");
                break;
            }
        }
    }
}
