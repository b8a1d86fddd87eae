//! The fixed-length records carried by each rowing-service characteristic.
//!
//! Each struct lists its fields in wire order and its `read` sequence mirrors
//! the monitor's byte layout table for that characteristic. Widths and tick
//! sizes vary per characteristic even for the same physical quantity, so the
//! unit constructors are chosen field by field.

use super::units::{
    Calories, Distance, DragFactor, Force, HeartRate, IntervalCount, Pace, Power, Speed,
    StrokeCount, StrokeRate, TimeInterval, Work,
};
use super::workout::{
    DurationType, ErgMachineType, IntervalType, RowingState, StrokeState, WorkoutState, WorkoutType,
};
use super::{CharacteristicKind, FieldReader, Frame};

/// 0xCE060031, 19 bytes: elapsed time (0.01 s x3), distance (0.1 m x3),
/// workout type, interval type, workout state, rowing state, stroke state,
/// total work distance (1 m x3), workout duration (0.01 s x3 when
/// time-based), duration type, drag factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeneralStatus {
    pub elapsed_time: TimeInterval,
    pub distance: Distance,
    pub workout_type: WorkoutType,
    pub interval_type: IntervalType,
    pub workout_state: WorkoutState,
    pub rowing_state: RowingState,
    pub stroke_state: StrokeState,
    pub total_work_distance: Distance,
    /// Scaled as time; for calorie/distance-limited workouts the monitor
    /// reports the remaining quantity in this field instead.
    pub workout_duration: TimeInterval,
    pub workout_duration_type: DurationType,
    pub drag_factor: DragFactor,
}

impl Frame for GeneralStatus {
    const KIND: CharacteristicKind = CharacteristicKind::GeneralStatus;
    const LEN: usize = 19;

    fn read(fields: &mut FieldReader<'_>) -> Self {
        let (low, mid, high) = fields.triple();
        let elapsed_time = TimeInterval::from_centiseconds(low, mid, high);
        let (low, mid, high) = fields.triple();
        let distance = Distance::from_decimeters(low, mid, high);
        let workout_type = WorkoutType::from(fields.byte());
        let interval_type = IntervalType::from(fields.byte());
        let workout_state = WorkoutState::from(fields.byte());
        let rowing_state = RowingState::from(fields.byte());
        let stroke_state = StrokeState::from(fields.byte());
        let (low, mid, high) = fields.triple();
        let total_work_distance = Distance::from_meters(low, mid, high);
        let (low, mid, high) = fields.triple();
        let workout_duration = TimeInterval::from_centiseconds(low, mid, high);
        let workout_duration_type = DurationType::from(fields.byte());
        let drag_factor = DragFactor(fields.byte());
        Self {
            elapsed_time,
            distance,
            workout_type,
            interval_type,
            workout_state,
            rowing_state,
            stroke_state,
            total_work_distance,
            workout_duration,
            workout_duration_type,
            drag_factor,
        }
    }
}

/// 0xCE060032, 17 bytes: elapsed time (0.01 s x3), speed (0.001 m/s x2),
/// stroke rate, heart rate, current pace (0.01 s x2), average pace
/// (0.01 s x2), rest distance (1 m x2), rest time (0.01 s x3), erg machine
/// type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdditionalStatus1 {
    pub elapsed_time: TimeInterval,
    pub speed: Speed,
    pub stroke_rate: StrokeRate,
    pub heart_rate: HeartRate,
    pub current_pace: Pace,
    pub average_pace: Pace,
    pub rest_distance: Distance,
    pub rest_time: TimeInterval,
    pub erg_machine_type: ErgMachineType,
}

impl Frame for AdditionalStatus1 {
    const KIND: CharacteristicKind = CharacteristicKind::AdditionalStatus1;
    const LEN: usize = 17;

    fn read(fields: &mut FieldReader<'_>) -> Self {
        let (low, mid, high) = fields.triple();
        let elapsed_time = TimeInterval::from_centiseconds(low, mid, high);
        let (low, high) = fields.pair();
        let speed = Speed::from_milli_mps(low, high);
        let stroke_rate = StrokeRate(fields.byte());
        let heart_rate = HeartRate::from(fields.byte());
        let (low, high) = fields.pair();
        let current_pace = Pace::from_centiseconds(low, high);
        let (low, high) = fields.pair();
        let average_pace = Pace::from_centiseconds(low, high);
        let (low, high) = fields.pair();
        let rest_distance = Distance::from_meters_pair(low, high);
        let (low, mid, high) = fields.triple();
        let rest_time = TimeInterval::from_centiseconds(low, mid, high);
        let erg_machine_type = ErgMachineType::from(fields.byte());
        Self {
            elapsed_time,
            speed,
            stroke_rate,
            heart_rate,
            current_pace,
            average_pace,
            rest_distance,
            rest_time,
            erg_machine_type,
        }
    }
}

/// 0xCE060033, 20 bytes: elapsed time (0.01 s x3), interval count, average
/// power (W x2), total calories (cal x2), interval average pace (0.01 s x2),
/// interval average power (W x2), interval average calories (cal/hr x2),
/// last split time (0.1 s x3), last split distance (1 m x3).
///
/// Note the resolution drop: elapsed time ticks at 0.01 s while last split
/// time ticks at 0.1 s.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdditionalStatus2 {
    pub elapsed_time: TimeInterval,
    pub interval_count: IntervalCount,
    pub average_power: Power,
    pub total_calories: Calories,
    pub interval_average_pace: Pace,
    pub interval_average_power: Power,
    /// Burn rate in cal/hr.
    pub interval_average_calories: Calories,
    pub last_split_time: TimeInterval,
    pub last_split_distance: Distance,
}

impl Frame for AdditionalStatus2 {
    const KIND: CharacteristicKind = CharacteristicKind::AdditionalStatus2;
    const LEN: usize = 20;

    fn read(fields: &mut FieldReader<'_>) -> Self {
        let (low, mid, high) = fields.triple();
        let elapsed_time = TimeInterval::from_centiseconds(low, mid, high);
        let interval_count = IntervalCount(fields.byte());
        let (low, high) = fields.pair();
        let average_power = Power::from_watts(low, high);
        let (low, high) = fields.pair();
        let total_calories = Calories::from_cals(low, high);
        let (low, high) = fields.pair();
        let interval_average_pace = Pace::from_centiseconds(low, high);
        let (low, high) = fields.pair();
        let interval_average_power = Power::from_watts(low, high);
        let (low, high) = fields.pair();
        let interval_average_calories = Calories::from_cals(low, high);
        let (low, mid, high) = fields.triple();
        let last_split_time = TimeInterval::from_deciseconds(low, mid, high);
        let (low, mid, high) = fields.triple();
        let last_split_distance = Distance::from_meters(low, mid, high);
        Self {
            elapsed_time,
            interval_count,
            average_power,
            total_calories,
            interval_average_pace,
            interval_average_power,
            interval_average_calories,
            last_split_time,
            last_split_distance,
        }
    }
}

/// 0xCE060035, 20 bytes: elapsed time (0.01 s x3), distance (0.1 m x3),
/// drive length (0.01 m x1), drive time (0.01 s x1), stroke recovery time
/// (0.01 s x2), stroke distance (0.01 m x2), peak drive force (0.1 lbf x2),
/// average drive force (0.1 lbf x2), work per stroke (0.1 J x2), stroke
/// count (x2).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeData {
    pub elapsed_time: TimeInterval,
    pub distance: Distance,
    pub drive_length: Distance,
    pub drive_time: TimeInterval,
    pub stroke_recovery_time: TimeInterval,
    pub stroke_distance: Distance,
    pub peak_drive_force: Force,
    pub average_drive_force: Force,
    pub work_per_stroke: Work,
    pub stroke_count: StrokeCount,
}

impl Frame for StrokeData {
    const KIND: CharacteristicKind = CharacteristicKind::StrokeData;
    const LEN: usize = 20;

    fn read(fields: &mut FieldReader<'_>) -> Self {
        let (low, mid, high) = fields.triple();
        let elapsed_time = TimeInterval::from_centiseconds(low, mid, high);
        let (low, mid, high) = fields.triple();
        let distance = Distance::from_decimeters(low, mid, high);
        let drive_length = Distance::from_centimeters_byte(fields.byte());
        let drive_time = TimeInterval::from_centiseconds_byte(fields.byte());
        let (low, high) = fields.pair();
        let stroke_recovery_time = TimeInterval::from_centiseconds_pair(low, high);
        let (low, high) = fields.pair();
        let stroke_distance = Distance::from_centimeters_pair(low, high);
        let (low, high) = fields.pair();
        let peak_drive_force = Force::from_deci_lbf(low, high);
        let (low, high) = fields.pair();
        let average_drive_force = Force::from_deci_lbf(low, high);
        let (low, high) = fields.pair();
        let work_per_stroke = Work::from_deci_joules(low, high);
        let (low, high) = fields.pair();
        let stroke_count = StrokeCount::from_strokes(low, high);
        Self {
            elapsed_time,
            distance,
            drive_length,
            drive_time,
            stroke_recovery_time,
            stroke_distance,
            peak_drive_force,
            average_drive_force,
            work_per_stroke,
            stroke_count,
        }
    }
}

/// 0xCE060036, 15 bytes: elapsed time (0.01 s x3), stroke power (W x2),
/// stroke calories (cal/hr x2), stroke count (x2), projected work time
/// (1 s x3), projected work distance (1 m x3).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdditionalStrokeData {
    pub elapsed_time: TimeInterval,
    pub stroke_power: Power,
    /// Burn rate in cal/hr.
    pub stroke_calories: Calories,
    pub stroke_count: StrokeCount,
    pub projected_work_time: TimeInterval,
    pub projected_work_distance: Distance,
}

impl Frame for AdditionalStrokeData {
    const KIND: CharacteristicKind = CharacteristicKind::AdditionalStrokeData;
    const LEN: usize = 15;

    fn read(fields: &mut FieldReader<'_>) -> Self {
        let (low, mid, high) = fields.triple();
        let elapsed_time = TimeInterval::from_centiseconds(low, mid, high);
        let (low, high) = fields.pair();
        let stroke_power = Power::from_watts(low, high);
        let (low, high) = fields.pair();
        let stroke_calories = Calories::from_cals(low, high);
        let (low, high) = fields.pair();
        let stroke_count = StrokeCount::from_strokes(low, high);
        let (low, mid, high) = fields.triple();
        let projected_work_time = TimeInterval::from_seconds(low, mid, high);
        let (low, mid, high) = fields.triple();
        let projected_work_distance = Distance::from_meters(low, mid, high);
        Self {
            elapsed_time,
            stroke_power,
            stroke_calories,
            stroke_count,
            projected_work_time,
            projected_work_distance,
        }
    }
}

/// 0xCE060037, 18 bytes: elapsed time (0.01 s x3), distance (0.1 m x3),
/// split time (0.1 s x3), split distance (1 m x3), interval rest time
/// (1 s x2), interval rest distance (1 m x2), split type, split number.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitData {
    pub elapsed_time: TimeInterval,
    pub distance: Distance,
    pub split_time: TimeInterval,
    pub split_distance: Distance,
    pub interval_rest_time: TimeInterval,
    pub interval_rest_distance: Distance,
    pub split_type: IntervalType,
    pub split_number: u8,
}

impl Frame for SplitData {
    const KIND: CharacteristicKind = CharacteristicKind::SplitData;
    const LEN: usize = 18;

    fn read(fields: &mut FieldReader<'_>) -> Self {
        let (low, mid, high) = fields.triple();
        let elapsed_time = TimeInterval::from_centiseconds(low, mid, high);
        let (low, mid, high) = fields.triple();
        let distance = Distance::from_decimeters(low, mid, high);
        let (low, mid, high) = fields.triple();
        let split_time = TimeInterval::from_deciseconds(low, mid, high);
        let (low, mid, high) = fields.triple();
        let split_distance = Distance::from_meters(low, mid, high);
        let (low, high) = fields.pair();
        let interval_rest_time = TimeInterval::from_seconds_pair(low, high);
        let (low, high) = fields.pair();
        let interval_rest_distance = Distance::from_meters_pair(low, high);
        let split_type = IntervalType::from(fields.byte());
        let split_number = fields.byte();
        Self {
            elapsed_time,
            distance,
            split_time,
            split_distance,
            interval_rest_time,
            interval_rest_distance,
            split_type,
            split_number,
        }
    }
}

/// 0xCE060038, 18 bytes: elapsed time (0.01 s x3), split average stroke
/// rate, split work heart rate, split rest heart rate, split average pace
/// (0.1 s x2), split total calories (cal x2), split average calories
/// (cal/hr x2), split speed (0.001 m/s x2), split power (W x2), split
/// average drag factor, split number.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdditionalSplitData {
    pub elapsed_time: TimeInterval,
    pub split_average_stroke_rate: StrokeRate,
    pub split_work_heart_rate: HeartRate,
    pub split_rest_heart_rate: HeartRate,
    pub split_average_pace: Pace,
    pub split_total_calories: Calories,
    /// Burn rate in cal/hr.
    pub split_average_calories: Calories,
    pub split_speed: Speed,
    pub split_power: Power,
    pub split_average_drag_factor: DragFactor,
    pub split_number: u8,
}

impl Frame for AdditionalSplitData {
    const KIND: CharacteristicKind = CharacteristicKind::AdditionalSplitData;
    const LEN: usize = 18;

    fn read(fields: &mut FieldReader<'_>) -> Self {
        let (low, mid, high) = fields.triple();
        let elapsed_time = TimeInterval::from_centiseconds(low, mid, high);
        let split_average_stroke_rate = StrokeRate(fields.byte());
        let split_work_heart_rate = HeartRate::from(fields.byte());
        let split_rest_heart_rate = HeartRate::from(fields.byte());
        let (low, high) = fields.pair();
        let split_average_pace = Pace::from_deciseconds(low, high);
        let (low, high) = fields.pair();
        let split_total_calories = Calories::from_cals(low, high);
        let (low, high) = fields.pair();
        let split_average_calories = Calories::from_cals(low, high);
        let (low, high) = fields.pair();
        let split_speed = Speed::from_milli_mps(low, high);
        let (low, high) = fields.pair();
        let split_power = Power::from_watts(low, high);
        let split_average_drag_factor = DragFactor(fields.byte());
        let split_number = fields.byte();
        Self {
            elapsed_time,
            split_average_stroke_rate,
            split_work_heart_rate,
            split_rest_heart_rate,
            split_average_pace,
            split_total_calories,
            split_average_calories,
            split_speed,
            split_power,
            split_average_drag_factor,
            split_number,
        }
    }
}

/// The monitor's packed log-entry timestamp, kept raw. Date packs
/// day/month/year bitfields, time packs hours and minutes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LogEntry {
    pub date: u16,
    pub time: u16,
}

/// 0xCE060039, 20 bytes: log entry date (x2), log entry time (x2), elapsed
/// time (0.01 s x3), distance (0.1 m x3), average stroke rate, ending heart
/// rate, average heart rate, min heart rate, max heart rate, average drag
/// factor, recovery heart rate, workout type, average pace (0.1 s x2).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorkoutSummary {
    pub log_entry: LogEntry,
    pub elapsed_time: TimeInterval,
    pub distance: Distance,
    pub average_stroke_rate: StrokeRate,
    pub ending_heart_rate: HeartRate,
    pub average_heart_rate: HeartRate,
    pub min_heart_rate: HeartRate,
    pub max_heart_rate: HeartRate,
    pub average_drag_factor: DragFactor,
    pub recovery_heart_rate: HeartRate,
    pub workout_type: WorkoutType,
    pub average_pace: Pace,
}

impl Frame for WorkoutSummary {
    const KIND: CharacteristicKind = CharacteristicKind::WorkoutSummary;
    const LEN: usize = 20;

    fn read(fields: &mut FieldReader<'_>) -> Self {
        let (low, high) = fields.pair();
        let date = u16::from_le_bytes([low, high]);
        let (low, high) = fields.pair();
        let time = u16::from_le_bytes([low, high]);
        let log_entry = LogEntry { date, time };
        let (low, mid, high) = fields.triple();
        let elapsed_time = TimeInterval::from_centiseconds(low, mid, high);
        let (low, mid, high) = fields.triple();
        let distance = Distance::from_decimeters(low, mid, high);
        let average_stroke_rate = StrokeRate(fields.byte());
        let ending_heart_rate = HeartRate::from(fields.byte());
        let average_heart_rate = HeartRate::from(fields.byte());
        let min_heart_rate = HeartRate::from(fields.byte());
        let max_heart_rate = HeartRate::from(fields.byte());
        let average_drag_factor = DragFactor(fields.byte());
        let recovery_heart_rate = HeartRate::from(fields.byte());
        let workout_type = WorkoutType::from(fields.byte());
        let (low, high) = fields.pair();
        let average_pace = Pace::from_deciseconds(low, high);
        Self {
            log_entry,
            elapsed_time,
            distance,
            average_stroke_rate,
            ending_heart_rate,
            average_heart_rate,
            min_heart_rate,
            max_heart_rate,
            average_drag_factor,
            recovery_heart_rate,
            workout_type,
            average_pace,
        }
    }
}

/// 0xCE06003B, 6 bytes: manufacturer id, device type, belt id (x4).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeartRateBeltInfo {
    pub manufacturer_id: u8,
    pub device_type: u8,
    pub belt_id: u32,
}

impl Frame for HeartRateBeltInfo {
    const KIND: CharacteristicKind = CharacteristicKind::HeartRateBeltInfo;
    const LEN: usize = 6;

    fn read(fields: &mut FieldReader<'_>) -> Self {
        let manufacturer_id = fields.byte();
        let device_type = fields.byte();
        let belt_id = u32::from_le_bytes(fields.quad());
        Self {
            manufacturer_id,
            device_type,
            belt_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{decode_characteristic, decode_kind, RowingData};
    use crate::protocol::{ADDITIONAL_STATUS_2_UUID, GENERAL_STATUS_UUID};

    #[test]
    fn additional_status_2_decodes_field_by_field() {
        let payload = [
            10, 0, 0, // elapsed: 10 cs
            3, // interval count
            200, 0, // avg power
            50, 0, // total calories
            100, 0, // split avg pace
            150, 0, // split avg power
            20, 0, // split avg calories
            5, 0, 0, // last split time: 5 ds
            25, 0, 0, // last split distance: 25 m
        ];
        let decoded = decode_characteristic(ADDITIONAL_STATUS_2_UUID, &payload).unwrap();
        let RowingData::AdditionalStatus2(status) = decoded else {
            panic!("wrong record: {decoded:?}");
        };
        assert_eq!(status.elapsed_time.centiseconds(), 10);
        assert_eq!(status.interval_count, IntervalCount(3));
        assert_eq!(status.average_power.watts(), 200);
        assert_eq!(status.total_calories.cals(), 50);
        assert_eq!(status.interval_average_pace.centiseconds(), 100);
        assert_eq!(status.interval_average_power.watts(), 150);
        assert_eq!(status.interval_average_calories.cals(), 20);
        // 5 ticks of 0.1 s, not 0.01 s
        assert_eq!(status.last_split_time.centiseconds(), 50);
        assert_eq!(status.last_split_distance.centimeters(), 2500);
    }

    #[test]
    fn additional_status_2_multi_byte_fields_compose() {
        let mut payload = [0u8; 20];
        payload[0] = 0x01;
        payload[1] = 0x02;
        payload[2] = 0x03; // elapsed = 0x030201
        payload[4] = 0x34;
        payload[5] = 0x12; // avg power = 0x1234
        let RowingData::AdditionalStatus2(status) =
            decode_kind(CharacteristicKind::AdditionalStatus2, &payload).unwrap()
        else {
            unreachable!()
        };
        assert_eq!(status.elapsed_time.centiseconds(), 0x030201);
        assert_eq!(status.average_power.watts(), 0x1234);
    }

    #[test]
    fn general_status_decodes() {
        let mut payload = [0u8; 19];
        payload[0] = 0xE8;
        payload[1] = 0x03; // elapsed = 1000 cs
        payload[3] = 0xF4;
        payload[4] = 0x01; // distance = 500 dm
        payload[6] = 1; // workout type: just row with splits
        payload[7] = 255; // interval type: none
        payload[8] = 1; // workout state: workout row
        payload[9] = 1; // rowing state: active
        payload[10] = 2; // stroke state: driving
        payload[11] = 0x10;
        payload[12] = 0x27; // total work distance = 10000 m
        payload[17] = 0x40; // duration type: calories
        payload[18] = 115; // drag factor
        let decoded = decode_characteristic(GENERAL_STATUS_UUID, &payload).unwrap();
        let RowingData::GeneralStatus(status) = decoded else {
            panic!("wrong record: {decoded:?}");
        };
        assert_eq!(status.elapsed_time.centiseconds(), 1000);
        assert_eq!(status.distance.centimeters(), 5000);
        assert_eq!(status.workout_type, WorkoutType::JustRowSplits);
        assert_eq!(status.interval_type, IntervalType::None);
        assert_eq!(status.workout_state, WorkoutState::WorkoutRow);
        assert_eq!(status.rowing_state, RowingState::Active);
        assert_eq!(status.stroke_state, StrokeState::Driving);
        assert_eq!(status.total_work_distance.centimeters(), 1_000_000);
        assert_eq!(status.workout_duration_type, DurationType::Calories);
        assert_eq!(status.drag_factor, DragFactor(115));
    }

    #[test]
    fn stroke_data_single_byte_fields_scale() {
        let mut payload = [0u8; 20];
        payload[6] = 142; // drive length: 1.42 m
        payload[7] = 80; // drive time: 0.80 s
        payload[18] = 0x2A; // stroke count = 42
        let RowingData::StrokeData(stroke) =
            decode_kind(CharacteristicKind::StrokeData, &payload).unwrap()
        else {
            unreachable!()
        };
        assert_eq!(stroke.drive_length.centimeters(), 142);
        assert_eq!(stroke.drive_time.centiseconds(), 80);
        assert_eq!(stroke.stroke_count.strokes(), 42);
    }

    #[test]
    fn split_data_mixed_tick_sizes() {
        let mut payload = [0u8; 18];
        payload[6] = 60; // split time: 60 ds = 6 s
        payload[9] = 100; // split distance: 100 m
        payload[12] = 90; // rest time: 90 s
        payload[16] = 1; // split type: distance
        payload[17] = 4; // split number
        let RowingData::SplitData(split) =
            decode_kind(CharacteristicKind::SplitData, &payload).unwrap()
        else {
            unreachable!()
        };
        assert_eq!(split.split_time.centiseconds(), 600);
        assert_eq!(split.split_distance.centimeters(), 10_000);
        assert_eq!(split.interval_rest_time.centiseconds(), 9000);
        assert_eq!(split.split_type, IntervalType::Distance);
        assert_eq!(split.split_number, 4);
    }

    #[test]
    fn workout_summary_decodes_heart_rates() {
        let mut payload = [0u8; 20];
        payload[11] = 170; // ending
        payload[12] = 155; // average
        payload[13] = 255; // min: invalid
        payload[14] = 181; // max
        payload[18] = 0xB4; // avg pace: 180 ds
        let RowingData::WorkoutSummary(summary) =
            decode_kind(CharacteristicKind::WorkoutSummary, &payload).unwrap()
        else {
            unreachable!()
        };
        assert_eq!(summary.ending_heart_rate, HeartRate::Bpm(170));
        assert_eq!(summary.average_heart_rate, HeartRate::Bpm(155));
        assert_eq!(summary.min_heart_rate, HeartRate::Invalid);
        assert_eq!(summary.max_heart_rate, HeartRate::Bpm(181));
        assert_eq!(summary.average_pace.centiseconds(), 1800);
    }

    #[test]
    fn heart_rate_belt_id_is_little_endian() {
        let payload = [0x01, 0x02, 0xDD, 0xCC, 0xBB, 0xAA];
        let RowingData::HeartRateBeltInfo(belt) =
            decode_kind(CharacteristicKind::HeartRateBeltInfo, &payload).unwrap()
        else {
            unreachable!()
        };
        assert_eq!(belt.manufacturer_id, 0x01);
        assert_eq!(belt.device_type, 0x02);
        assert_eq!(belt.belt_id, 0xAABBCCDD);
    }

    #[test]
    fn multiplexed_wrapping_matches_direct_decode() {
        let payload = [
            10u8, 0, 0, 3, 200, 0, 50, 0, 100, 0, 150, 0, 20, 0, 5, 0, 0, 25, 0, 0,
        ];
        let direct = decode_kind(CharacteristicKind::AdditionalStatus2, &payload).unwrap();

        let mut wrapped = vec![0x33];
        wrapped.extend_from_slice(&payload);
        let muxed = decode_kind(CharacteristicKind::Multiplexed, &wrapped).unwrap();

        assert_eq!(direct, muxed);
    }

    #[test]
    fn multiplexed_inner_length_still_checked() {
        // stroke data id with a truncated body
        let wrapped = [0x35u8, 1, 2, 3];
        let err = decode_kind(CharacteristicKind::Multiplexed, &wrapped).unwrap_err();
        match err {
            crate::protocol::DecodeError::LengthMismatch {
                kind,
                expected,
                actual,
            } => {
                assert_eq!(kind, CharacteristicKind::StrokeData);
                assert_eq!(expected, 20);
                assert_eq!(actual, 3);
            }
            other => panic!("expected length mismatch, got {other:?}"),
        }
    }
}
