//! Per-monitor workout state.
//!
//! Every decoded record lands here. [`MonitorState`] keeps the last known
//! value of each field the rowing service can report, merges new records in,
//! and says exactly which fields a record changed so consumers only react to
//! real movement. Records overlap on purpose (several carry elapsed time),
//! so "changed" is computed per field, not per record.

pub mod ble;
pub mod dummy;
pub mod registry;

use std::fmt;

use crate::protocol::frames::{HeartRateBeltInfo, LogEntry};
use crate::protocol::units::{
    Calories, Distance, DragFactor, Force, HeartRate, IntervalCount, Pace, Power, Speed,
    StrokeCount, StrokeRate, TimeInterval, Work,
};
use crate::protocol::workout::{
    DurationType, ErgMachineType, IntervalType, RowingState, StrokeState, WorkoutState, WorkoutType,
};
use crate::protocol::RowingData;

/// Stable identifier for one monitor, the transport's peripheral id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonitorId(String);

impl MonitorId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MonitorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for MonitorId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Discovered,
    Connecting,
    Connected,
    Disconnected,
}

/// Names every field the rowing service can report, across all records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    // general status
    ElapsedTime,
    Distance,
    WorkoutType,
    IntervalType,
    WorkoutState,
    RowingState,
    StrokeState,
    TotalWorkDistance,
    WorkoutDuration,
    WorkoutDurationType,
    DragFactor,
    // additional status 1
    Speed,
    StrokeRate,
    HeartRate,
    CurrentPace,
    AveragePace,
    RestDistance,
    RestTime,
    ErgMachineType,
    // additional status 2
    IntervalCount,
    AveragePower,
    TotalCalories,
    IntervalAveragePace,
    IntervalAveragePower,
    IntervalAverageCalories,
    LastSplitTime,
    LastSplitDistance,
    // stroke data
    DriveLength,
    DriveTime,
    StrokeRecoveryTime,
    StrokeDistance,
    PeakDriveForce,
    AverageDriveForce,
    WorkPerStroke,
    StrokeCount,
    // additional stroke data
    StrokePower,
    StrokeCalories,
    ProjectedWorkTime,
    ProjectedWorkDistance,
    // split data
    SplitTime,
    SplitDistance,
    IntervalRestTime,
    IntervalRestDistance,
    SplitType,
    SplitNumber,
    // additional split data
    SplitAverageStrokeRate,
    SplitWorkHeartRate,
    SplitRestHeartRate,
    SplitAveragePace,
    SplitTotalCalories,
    SplitAverageCalories,
    SplitSpeed,
    SplitPower,
    SplitAverageDragFactor,
    // workout summary
    LogEntry,
    AverageStrokeRate,
    EndingHeartRate,
    AverageHeartRate,
    MinHeartRate,
    MaxHeartRate,
    AverageDragFactor,
    RecoveryHeartRate,
    WorkoutAveragePace,
    // heart rate belt info
    BeltInfo,
}

impl Field {
    pub const ALL: [Field; 64] = [
        Field::ElapsedTime,
        Field::Distance,
        Field::WorkoutType,
        Field::IntervalType,
        Field::WorkoutState,
        Field::RowingState,
        Field::StrokeState,
        Field::TotalWorkDistance,
        Field::WorkoutDuration,
        Field::WorkoutDurationType,
        Field::DragFactor,
        Field::Speed,
        Field::StrokeRate,
        Field::HeartRate,
        Field::CurrentPace,
        Field::AveragePace,
        Field::RestDistance,
        Field::RestTime,
        Field::ErgMachineType,
        Field::IntervalCount,
        Field::AveragePower,
        Field::TotalCalories,
        Field::IntervalAveragePace,
        Field::IntervalAveragePower,
        Field::IntervalAverageCalories,
        Field::LastSplitTime,
        Field::LastSplitDistance,
        Field::DriveLength,
        Field::DriveTime,
        Field::StrokeRecoveryTime,
        Field::StrokeDistance,
        Field::PeakDriveForce,
        Field::AverageDriveForce,
        Field::WorkPerStroke,
        Field::StrokeCount,
        Field::StrokePower,
        Field::StrokeCalories,
        Field::ProjectedWorkTime,
        Field::ProjectedWorkDistance,
        Field::SplitTime,
        Field::SplitDistance,
        Field::IntervalRestTime,
        Field::IntervalRestDistance,
        Field::SplitType,
        Field::SplitNumber,
        Field::SplitAverageStrokeRate,
        Field::SplitWorkHeartRate,
        Field::SplitRestHeartRate,
        Field::SplitAveragePace,
        Field::SplitTotalCalories,
        Field::SplitAverageCalories,
        Field::SplitSpeed,
        Field::SplitPower,
        Field::SplitAverageDragFactor,
        Field::LogEntry,
        Field::AverageStrokeRate,
        Field::EndingHeartRate,
        Field::AverageHeartRate,
        Field::MinHeartRate,
        Field::MaxHeartRate,
        Field::AverageDragFactor,
        Field::RecoveryHeartRate,
        Field::WorkoutAveragePace,
        Field::BeltInfo,
    ];

    const fn bit(self) -> u128 {
        1u128 << (self as u32)
    }
}

/// Which fields one record actually changed. Cheap to copy around, so every
/// state broadcast carries one.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldSet(u128);

impl FieldSet {
    pub const EMPTY: FieldSet = FieldSet(0);

    pub fn insert(&mut self, field: Field) {
        self.0 |= field.bit();
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0 & field.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn iter(&self) -> impl Iterator<Item = Field> + '_ {
        Field::ALL.into_iter().filter(|field| self.contains(*field))
    }
}

impl FromIterator<Field> for FieldSet {
    fn from_iter<I: IntoIterator<Item = Field>>(fields: I) -> Self {
        let mut set = FieldSet::EMPTY;
        for field in fields {
            set.insert(field);
        }
        set
    }
}

impl fmt::Debug for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Last known value of every reportable field, one slot per [`Field`].
/// `None` means the monitor has not sent a record carrying that field yet.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorkoutFields {
    pub elapsed_time: Option<TimeInterval>,
    pub distance: Option<Distance>,
    pub workout_type: Option<WorkoutType>,
    pub interval_type: Option<IntervalType>,
    pub workout_state: Option<WorkoutState>,
    pub rowing_state: Option<RowingState>,
    pub stroke_state: Option<StrokeState>,
    pub total_work_distance: Option<Distance>,
    pub workout_duration: Option<TimeInterval>,
    pub workout_duration_type: Option<DurationType>,
    pub drag_factor: Option<DragFactor>,
    pub speed: Option<Speed>,
    pub stroke_rate: Option<StrokeRate>,
    pub heart_rate: Option<HeartRate>,
    pub current_pace: Option<Pace>,
    pub average_pace: Option<Pace>,
    pub rest_distance: Option<Distance>,
    pub rest_time: Option<TimeInterval>,
    pub erg_machine_type: Option<ErgMachineType>,
    pub interval_count: Option<IntervalCount>,
    pub average_power: Option<Power>,
    pub total_calories: Option<Calories>,
    pub interval_average_pace: Option<Pace>,
    pub interval_average_power: Option<Power>,
    pub interval_average_calories: Option<Calories>,
    pub last_split_time: Option<TimeInterval>,
    pub last_split_distance: Option<Distance>,
    pub drive_length: Option<Distance>,
    pub drive_time: Option<TimeInterval>,
    pub stroke_recovery_time: Option<TimeInterval>,
    pub stroke_distance: Option<Distance>,
    pub peak_drive_force: Option<Force>,
    pub average_drive_force: Option<Force>,
    pub work_per_stroke: Option<Work>,
    pub stroke_count: Option<StrokeCount>,
    pub stroke_power: Option<Power>,
    pub stroke_calories: Option<Calories>,
    pub projected_work_time: Option<TimeInterval>,
    pub projected_work_distance: Option<Distance>,
    pub split_time: Option<TimeInterval>,
    pub split_distance: Option<Distance>,
    pub interval_rest_time: Option<TimeInterval>,
    pub interval_rest_distance: Option<Distance>,
    pub split_type: Option<IntervalType>,
    pub split_number: Option<u8>,
    pub split_average_stroke_rate: Option<StrokeRate>,
    pub split_work_heart_rate: Option<HeartRate>,
    pub split_rest_heart_rate: Option<HeartRate>,
    pub split_average_pace: Option<Pace>,
    pub split_total_calories: Option<Calories>,
    pub split_average_calories: Option<Calories>,
    pub split_speed: Option<Speed>,
    pub split_power: Option<Power>,
    pub split_average_drag_factor: Option<DragFactor>,
    pub log_entry: Option<LogEntry>,
    pub average_stroke_rate: Option<StrokeRate>,
    pub ending_heart_rate: Option<HeartRate>,
    pub average_heart_rate: Option<HeartRate>,
    pub min_heart_rate: Option<HeartRate>,
    pub max_heart_rate: Option<HeartRate>,
    pub average_drag_factor: Option<DragFactor>,
    pub recovery_heart_rate: Option<HeartRate>,
    pub workout_average_pace: Option<Pace>,
    pub belt_info: Option<HeartRateBeltInfo>,
}

fn set<T>(slot: &mut Option<T>, value: T, field: Field, changed: &mut FieldSet)
where
    T: Copy + PartialEq,
{
    if *slot != Some(value) {
        *slot = Some(value);
        changed.insert(field);
    }
}

impl WorkoutFields {
    /// Writes every field the record carries, returning the set of fields
    /// whose value actually moved. A record identical to what we already
    /// know comes back empty.
    pub fn merge(&mut self, data: &RowingData) -> FieldSet {
        let mut changed = FieldSet::EMPTY;
        match data {
            RowingData::GeneralStatus(status) => {
                set(
                    &mut self.elapsed_time,
                    status.elapsed_time,
                    Field::ElapsedTime,
                    &mut changed,
                );
                set(
                    &mut self.distance,
                    status.distance,
                    Field::Distance,
                    &mut changed,
                );
                set(
                    &mut self.workout_type,
                    status.workout_type,
                    Field::WorkoutType,
                    &mut changed,
                );
                set(
                    &mut self.interval_type,
                    status.interval_type,
                    Field::IntervalType,
                    &mut changed,
                );
                set(
                    &mut self.workout_state,
                    status.workout_state,
                    Field::WorkoutState,
                    &mut changed,
                );
                set(
                    &mut self.rowing_state,
                    status.rowing_state,
                    Field::RowingState,
                    &mut changed,
                );
                set(
                    &mut self.stroke_state,
                    status.stroke_state,
                    Field::StrokeState,
                    &mut changed,
                );
                set(
                    &mut self.total_work_distance,
                    status.total_work_distance,
                    Field::TotalWorkDistance,
                    &mut changed,
                );
                set(
                    &mut self.workout_duration,
                    status.workout_duration,
                    Field::WorkoutDuration,
                    &mut changed,
                );
                set(
                    &mut self.workout_duration_type,
                    status.workout_duration_type,
                    Field::WorkoutDurationType,
                    &mut changed,
                );
                set(
                    &mut self.drag_factor,
                    status.drag_factor,
                    Field::DragFactor,
                    &mut changed,
                );
            }
            RowingData::AdditionalStatus1(status) => {
                set(
                    &mut self.elapsed_time,
                    status.elapsed_time,
                    Field::ElapsedTime,
                    &mut changed,
                );
                set(&mut self.speed, status.speed, Field::Speed, &mut changed);
                set(
                    &mut self.stroke_rate,
                    status.stroke_rate,
                    Field::StrokeRate,
                    &mut changed,
                );
                set(
                    &mut self.heart_rate,
                    status.heart_rate,
                    Field::HeartRate,
                    &mut changed,
                );
                set(
                    &mut self.current_pace,
                    status.current_pace,
                    Field::CurrentPace,
                    &mut changed,
                );
                set(
                    &mut self.average_pace,
                    status.average_pace,
                    Field::AveragePace,
                    &mut changed,
                );
                set(
                    &mut self.rest_distance,
                    status.rest_distance,
                    Field::RestDistance,
                    &mut changed,
                );
                set(
                    &mut self.rest_time,
                    status.rest_time,
                    Field::RestTime,
                    &mut changed,
                );
                set(
                    &mut self.erg_machine_type,
                    status.erg_machine_type,
                    Field::ErgMachineType,
                    &mut changed,
                );
            }
            RowingData::AdditionalStatus2(status) => {
                set(
                    &mut self.elapsed_time,
                    status.elapsed_time,
                    Field::ElapsedTime,
                    &mut changed,
                );
                set(
                    &mut self.interval_count,
                    status.interval_count,
                    Field::IntervalCount,
                    &mut changed,
                );
                set(
                    &mut self.average_power,
                    status.average_power,
                    Field::AveragePower,
                    &mut changed,
                );
                set(
                    &mut self.total_calories,
                    status.total_calories,
                    Field::TotalCalories,
                    &mut changed,
                );
                set(
                    &mut self.interval_average_pace,
                    status.interval_average_pace,
                    Field::IntervalAveragePace,
                    &mut changed,
                );
                set(
                    &mut self.interval_average_power,
                    status.interval_average_power,
                    Field::IntervalAveragePower,
                    &mut changed,
                );
                set(
                    &mut self.interval_average_calories,
                    status.interval_average_calories,
                    Field::IntervalAverageCalories,
                    &mut changed,
                );
                set(
                    &mut self.last_split_time,
                    status.last_split_time,
                    Field::LastSplitTime,
                    &mut changed,
                );
                set(
                    &mut self.last_split_distance,
                    status.last_split_distance,
                    Field::LastSplitDistance,
                    &mut changed,
                );
            }
            RowingData::StrokeData(stroke) => {
                set(
                    &mut self.elapsed_time,
                    stroke.elapsed_time,
                    Field::ElapsedTime,
                    &mut changed,
                );
                set(
                    &mut self.distance,
                    stroke.distance,
                    Field::Distance,
                    &mut changed,
                );
                set(
                    &mut self.drive_length,
                    stroke.drive_length,
                    Field::DriveLength,
                    &mut changed,
                );
                set(
                    &mut self.drive_time,
                    stroke.drive_time,
                    Field::DriveTime,
                    &mut changed,
                );
                set(
                    &mut self.stroke_recovery_time,
                    stroke.stroke_recovery_time,
                    Field::StrokeRecoveryTime,
                    &mut changed,
                );
                set(
                    &mut self.stroke_distance,
                    stroke.stroke_distance,
                    Field::StrokeDistance,
                    &mut changed,
                );
                set(
                    &mut self.peak_drive_force,
                    stroke.peak_drive_force,
                    Field::PeakDriveForce,
                    &mut changed,
                );
                set(
                    &mut self.average_drive_force,
                    stroke.average_drive_force,
                    Field::AverageDriveForce,
                    &mut changed,
                );
                set(
                    &mut self.work_per_stroke,
                    stroke.work_per_stroke,
                    Field::WorkPerStroke,
                    &mut changed,
                );
                set(
                    &mut self.stroke_count,
                    stroke.stroke_count,
                    Field::StrokeCount,
                    &mut changed,
                );
            }
            RowingData::AdditionalStrokeData(stroke) => {
                set(
                    &mut self.elapsed_time,
                    stroke.elapsed_time,
                    Field::ElapsedTime,
                    &mut changed,
                );
                set(
                    &mut self.stroke_power,
                    stroke.stroke_power,
                    Field::StrokePower,
                    &mut changed,
                );
                set(
                    &mut self.stroke_calories,
                    stroke.stroke_calories,
                    Field::StrokeCalories,
                    &mut changed,
                );
                set(
                    &mut self.stroke_count,
                    stroke.stroke_count,
                    Field::StrokeCount,
                    &mut changed,
                );
                set(
                    &mut self.projected_work_time,
                    stroke.projected_work_time,
                    Field::ProjectedWorkTime,
                    &mut changed,
                );
                set(
                    &mut self.projected_work_distance,
                    stroke.projected_work_distance,
                    Field::ProjectedWorkDistance,
                    &mut changed,
                );
            }
            RowingData::SplitData(split) => {
                set(
                    &mut self.elapsed_time,
                    split.elapsed_time,
                    Field::ElapsedTime,
                    &mut changed,
                );
                set(
                    &mut self.distance,
                    split.distance,
                    Field::Distance,
                    &mut changed,
                );
                set(
                    &mut self.split_time,
                    split.split_time,
                    Field::SplitTime,
                    &mut changed,
                );
                set(
                    &mut self.split_distance,
                    split.split_distance,
                    Field::SplitDistance,
                    &mut changed,
                );
                set(
                    &mut self.interval_rest_time,
                    split.interval_rest_time,
                    Field::IntervalRestTime,
                    &mut changed,
                );
                set(
                    &mut self.interval_rest_distance,
                    split.interval_rest_distance,
                    Field::IntervalRestDistance,
                    &mut changed,
                );
                set(
                    &mut self.split_type,
                    split.split_type,
                    Field::SplitType,
                    &mut changed,
                );
                set(
                    &mut self.split_number,
                    split.split_number,
                    Field::SplitNumber,
                    &mut changed,
                );
            }
            RowingData::AdditionalSplitData(split) => {
                set(
                    &mut self.elapsed_time,
                    split.elapsed_time,
                    Field::ElapsedTime,
                    &mut changed,
                );
                set(
                    &mut self.split_average_stroke_rate,
                    split.split_average_stroke_rate,
                    Field::SplitAverageStrokeRate,
                    &mut changed,
                );
                set(
                    &mut self.split_work_heart_rate,
                    split.split_work_heart_rate,
                    Field::SplitWorkHeartRate,
                    &mut changed,
                );
                set(
                    &mut self.split_rest_heart_rate,
                    split.split_rest_heart_rate,
                    Field::SplitRestHeartRate,
                    &mut changed,
                );
                set(
                    &mut self.split_average_pace,
                    split.split_average_pace,
                    Field::SplitAveragePace,
                    &mut changed,
                );
                set(
                    &mut self.split_total_calories,
                    split.split_total_calories,
                    Field::SplitTotalCalories,
                    &mut changed,
                );
                set(
                    &mut self.split_average_calories,
                    split.split_average_calories,
                    Field::SplitAverageCalories,
                    &mut changed,
                );
                set(
                    &mut self.split_speed,
                    split.split_speed,
                    Field::SplitSpeed,
                    &mut changed,
                );
                set(
                    &mut self.split_power,
                    split.split_power,
                    Field::SplitPower,
                    &mut changed,
                );
                set(
                    &mut self.split_average_drag_factor,
                    split.split_average_drag_factor,
                    Field::SplitAverageDragFactor,
                    &mut changed,
                );
                set(
                    &mut self.split_number,
                    split.split_number,
                    Field::SplitNumber,
                    &mut changed,
                );
            }
            RowingData::WorkoutSummary(summary) => {
                set(
                    &mut self.log_entry,
                    summary.log_entry,
                    Field::LogEntry,
                    &mut changed,
                );
                set(
                    &mut self.elapsed_time,
                    summary.elapsed_time,
                    Field::ElapsedTime,
                    &mut changed,
                );
                set(
                    &mut self.distance,
                    summary.distance,
                    Field::Distance,
                    &mut changed,
                );
                set(
                    &mut self.average_stroke_rate,
                    summary.average_stroke_rate,
                    Field::AverageStrokeRate,
                    &mut changed,
                );
                set(
                    &mut self.ending_heart_rate,
                    summary.ending_heart_rate,
                    Field::EndingHeartRate,
                    &mut changed,
                );
                set(
                    &mut self.average_heart_rate,
                    summary.average_heart_rate,
                    Field::AverageHeartRate,
                    &mut changed,
                );
                set(
                    &mut self.min_heart_rate,
                    summary.min_heart_rate,
                    Field::MinHeartRate,
                    &mut changed,
                );
                set(
                    &mut self.max_heart_rate,
                    summary.max_heart_rate,
                    Field::MaxHeartRate,
                    &mut changed,
                );
                set(
                    &mut self.average_drag_factor,
                    summary.average_drag_factor,
                    Field::AverageDragFactor,
                    &mut changed,
                );
                set(
                    &mut self.recovery_heart_rate,
                    summary.recovery_heart_rate,
                    Field::RecoveryHeartRate,
                    &mut changed,
                );
                set(
                    &mut self.workout_type,
                    summary.workout_type,
                    Field::WorkoutType,
                    &mut changed,
                );
                set(
                    &mut self.workout_average_pace,
                    summary.average_pace,
                    Field::WorkoutAveragePace,
                    &mut changed,
                );
            }
            RowingData::HeartRateBeltInfo(belt) => {
                set(&mut self.belt_info, *belt, Field::BeltInfo, &mut changed);
            }
        }
        changed
    }
}

/// One monitor as the app knows it: identity, connection status, and the
/// merged workout fields. Cloned wholesale into every broadcast, so it stays
/// plain data with no transport handles.
#[derive(Clone, Debug, PartialEq)]
pub struct MonitorState {
    pub id: MonitorId,
    pub name: Option<String>,
    pub rssi: Option<i16>,
    pub connection: ConnectionState,
    pub workout: WorkoutFields,
}

impl MonitorState {
    pub fn new(id: MonitorId) -> Self {
        Self {
            id,
            name: None,
            rssi: None,
            connection: ConnectionState::default(),
            workout: WorkoutFields::default(),
        }
    }

    /// Merges a decoded record into the workout fields. Only a `Connected`
    /// monitor accepts records; for any other state the record is stale
    /// (delivered after a disconnect, or before the connection finished)
    /// and `None` comes back so the caller can log and drop it.
    pub fn apply(&mut self, data: &RowingData) -> Option<FieldSet> {
        if self.connection != ConnectionState::Connected {
            return None;
        }
        Some(self.workout.merge(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{decode_kind, CharacteristicKind};

    fn status2_payload(elapsed_cs: u32, power: u16) -> [u8; 20] {
        let mut payload = [0u8; 20];
        payload[0] = elapsed_cs as u8;
        payload[1] = (elapsed_cs >> 8) as u8;
        payload[2] = (elapsed_cs >> 16) as u8;
        payload[4] = power as u8;
        payload[5] = (power >> 8) as u8;
        payload
    }

    fn decoded_status2(elapsed_cs: u32, power: u16) -> RowingData {
        decode_kind(
            CharacteristicKind::AdditionalStatus2,
            &status2_payload(elapsed_cs, power),
        )
        .unwrap()
    }

    #[test]
    fn field_bits_are_unique() {
        let mut seen = FieldSet::EMPTY;
        for field in Field::ALL {
            assert!(!seen.contains(field), "{field:?} bit collides");
            seen.insert(field);
        }
        assert_eq!(seen.len(), Field::ALL.len() as u32);
    }

    #[test]
    fn first_record_reports_every_carried_field() {
        let mut state = MonitorState::new("test".into());
        state.connection = ConnectionState::Connected;
        let changed = state.apply(&decoded_status2(10, 200)).unwrap();
        // Nine fields in the record, all fresh
        assert_eq!(changed.len(), 9);
        assert!(changed.contains(Field::ElapsedTime));
        assert!(changed.contains(Field::AveragePower));
        assert!(!changed.contains(Field::Distance));
        assert_eq!(state.workout.average_power.unwrap().watts(), 200);
    }

    #[test]
    fn identical_redelivery_changes_nothing() {
        let mut state = MonitorState::new("test".into());
        state.connection = ConnectionState::Connected;
        let record = decoded_status2(10, 200);
        state.apply(&record).unwrap();
        let rerun = state.apply(&record).unwrap();
        assert!(rerun.is_empty());
        assert_eq!(rerun, FieldSet::EMPTY);
    }

    #[test]
    fn partial_update_reports_only_moved_fields() {
        let mut state = MonitorState::new("test".into());
        state.connection = ConnectionState::Connected;
        state.apply(&decoded_status2(10, 200)).unwrap();
        // Elapsed time ticks forward, power holds
        let changed = state.apply(&decoded_status2(11, 200)).unwrap();
        assert_eq!(changed, FieldSet::from_iter([Field::ElapsedTime]));
        assert_eq!(state.workout.elapsed_time.unwrap().centiseconds(), 11);
    }

    #[test]
    fn overlapping_records_share_the_elapsed_time_slot() {
        let mut state = MonitorState::new("test".into());
        state.connection = ConnectionState::Connected;
        state.apply(&decoded_status2(500, 200)).unwrap();

        let mut general = [0u8; 19];
        general[0] = 0xF4;
        general[1] = 0x01; // same 500 cs
        let general = decode_kind(CharacteristicKind::GeneralStatus, &general).unwrap();
        let changed = state.apply(&general).unwrap();
        // Elapsed time already known from the other record
        assert!(!changed.contains(Field::ElapsedTime));
        assert!(changed.contains(Field::WorkoutType));
    }

    #[test]
    fn records_bounce_off_unconnected_monitors() {
        let record = decoded_status2(10, 200);
        for connection in [
            ConnectionState::Discovered,
            ConnectionState::Connecting,
            ConnectionState::Disconnected,
        ] {
            let mut state = MonitorState::new("test".into());
            state.connection = connection;
            assert_eq!(state.apply(&record), None);
            assert_eq!(state.workout, WorkoutFields::default());
        }
    }

    #[test]
    fn disconnect_preserves_last_known_fields() {
        let mut state = MonitorState::new("test".into());
        state.connection = ConnectionState::Connected;
        state.apply(&decoded_status2(10, 200)).unwrap();

        state.connection = ConnectionState::Disconnected;
        assert_eq!(state.workout.average_power.unwrap().watts(), 200);
        assert_eq!(state.apply(&decoded_status2(11, 200)), None);
    }
}
