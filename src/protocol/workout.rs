//! Enumerated fields reported by the rowing service.
//!
//! Values match the PM CSAFE enumerations. Monitors running newer firmware
//! can report values this build has never heard of, so every enum keeps the
//! raw byte in an `Unknown` variant instead of failing the record.

use num_enum::{FromPrimitive, IntoPrimitive};

#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum WorkoutType {
    JustRowNoSplits = 0,
    JustRowSplits = 1,
    FixedDistanceNoSplits = 2,
    FixedDistanceSplits = 3,
    FixedTimeNoSplits = 4,
    FixedTimeSplits = 5,
    FixedTimeInterval = 6,
    FixedDistanceInterval = 7,
    VariableInterval = 8,
    VariableUndefinedRest = 9,
    FixedCalorie = 10,
    FixedWattMinutes = 11,
    FixedCaloriesInterval = 12,
    #[num_enum(catch_all)]
    Unknown(u8),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum IntervalType {
    Time = 0,
    Distance = 1,
    Rest = 2,
    TimeRestUndefined = 3,
    DistanceRestUndefined = 4,
    RestUndefined = 5,
    Calorie = 6,
    CalorieRestUndefined = 7,
    WattMinute = 8,
    WattMinuteRestUndefined = 9,
    None = 255,
    // An implicit discriminant after None would overflow u8; the catch-all
    // conversion carries the raw byte regardless
    #[num_enum(catch_all)]
    Unknown(u8) = 10,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum WorkoutState {
    WaitToBegin = 0,
    WorkoutRow = 1,
    CountdownPause = 2,
    IntervalRest = 3,
    IntervalWorkTime = 4,
    IntervalWorkDistance = 5,
    WorkoutEnd = 6,
    Terminate = 7,
    WorkoutLogged = 8,
    Rearm = 9,
    #[num_enum(catch_all)]
    Unknown(u8),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum RowingState {
    Inactive = 0,
    Active = 1,
    #[num_enum(catch_all)]
    Unknown(u8),
}

/// Where the flywheel is within the stroke cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum StrokeState {
    WaitingForWheelToReachMinSpeed = 0,
    WaitingForWheelToAccelerate = 1,
    Driving = 2,
    DwellingAfterDrive = 3,
    Recovery = 4,
    #[num_enum(catch_all)]
    Unknown(u8),
}

/// What the workout duration field counts. The non-zero values sit in the
/// top two bits, they are flags rather than a sequence.
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum DurationType {
    Time = 0,
    Calories = 0x40,
    Distance = 0x80,
    WattMinutes = 0xC0,
    #[num_enum(catch_all)]
    Unknown(u8),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ErgMachineType {
    StaticD = 0,
    StaticC = 1,
    StaticA = 2,
    StaticB = 3,
    StaticE = 5,
    StaticDynamic = 7,
    SlidesA = 8,
    SlidesB = 9,
    SlidesC = 10,
    SlidesE = 12,
    SlidesDynamic = 14,
    StaticDyno = 16,
    StaticSki = 32,
    Bike = 64,
    #[num_enum(catch_all)]
    Unknown(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_discriminants_round_trip() {
        assert_eq!(WorkoutType::from(3), WorkoutType::FixedDistanceSplits);
        assert_eq!(IntervalType::from(255), IntervalType::None);
        assert_eq!(WorkoutState::from(6), WorkoutState::WorkoutEnd);
        assert_eq!(StrokeState::from(2), StrokeState::Driving);
        assert_eq!(DurationType::from(0xC0), DurationType::WattMinutes);
        assert_eq!(ErgMachineType::from(32), ErgMachineType::StaticSki);
    }

    #[test]
    fn unrecognized_bytes_are_preserved() {
        assert_eq!(WorkoutType::from(200), WorkoutType::Unknown(200));
        // 10 doubles as the catch-all's own discriminant, 254 borders the
        // reserved None byte. Both must come back as the raw value.
        assert_eq!(IntervalType::from(10), IntervalType::Unknown(10));
        assert_eq!(IntervalType::from(254), IntervalType::Unknown(254));
        assert_eq!(u8::from(IntervalType::Unknown(254)), 254);
        assert_eq!(RowingState::from(9), RowingState::Unknown(9));
        assert_eq!(DurationType::from(0x41), DurationType::Unknown(0x41));
    }
}
