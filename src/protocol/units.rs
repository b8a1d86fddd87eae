//! Typed quantities decoded from raw characteristic bytes.
//!
//! Multi-byte fields on the wire are little-endian and arrive as separately
//! named bytes, so every constructor takes exactly the bytes that make up one
//! field: `value = low + (mid << 8) + (high << 16)`. Each quantity stores a
//! canonical integer magnitude (no floats on the decode path), with the tick
//! size of the wire field named in the constructor. The same physical unit is
//! carried at different resolutions by different characteristics, so e.g.
//! [`TimeInterval`] has both centisecond and decisecond constructors.

use std::fmt;

#[inline]
fn compose16(low: u8, high: u8) -> u32 {
    u32::from(u16::from_le_bytes([low, high]))
}

#[inline]
fn compose24(low: u8, mid: u8, high: u8) -> u32 {
    u32::from(low) | u32::from(mid) << 8 | u32::from(high) << 16
}

/// A span of workout time, stored in centiseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeInterval(u32);

impl TimeInterval {
    /// Three-byte field with 0.01 s ticks.
    pub fn from_centiseconds(low: u8, mid: u8, high: u8) -> Self {
        Self(compose24(low, mid, high))
    }
    /// Three-byte field with 0.1 s ticks.
    pub fn from_deciseconds(low: u8, mid: u8, high: u8) -> Self {
        Self(compose24(low, mid, high) * 10)
    }
    /// Three-byte field with whole-second ticks.
    pub fn from_seconds(low: u8, mid: u8, high: u8) -> Self {
        Self(compose24(low, mid, high) * 100)
    }
    /// Two-byte field with 0.01 s ticks.
    pub fn from_centiseconds_pair(low: u8, high: u8) -> Self {
        Self(compose16(low, high))
    }
    /// Two-byte field with whole-second ticks.
    pub fn from_seconds_pair(low: u8, high: u8) -> Self {
        Self(compose16(low, high) * 100)
    }
    /// Single-byte field with 0.01 s ticks.
    pub fn from_centiseconds_byte(byte: u8) -> Self {
        Self(u32::from(byte))
    }
    pub fn centiseconds(self) -> u32 {
        self.0
    }
    pub fn as_secs_f64(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl fmt::Display for TimeInterval {
    /// `m:ss.c`, the format monitors show on their own displays.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.0 / 6000;
        let seconds = (self.0 % 6000) / 100;
        let tenths = (self.0 % 100) / 10;
        write!(f, "{minutes}:{seconds:02}.{tenths}")
    }
}

/// A distance, stored in centimeters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Distance(u32);

impl Distance {
    /// Three-byte field with whole-meter ticks.
    pub fn from_meters(low: u8, mid: u8, high: u8) -> Self {
        Self(compose24(low, mid, high) * 100)
    }
    /// Three-byte field with 0.1 m ticks.
    pub fn from_decimeters(low: u8, mid: u8, high: u8) -> Self {
        Self(compose24(low, mid, high) * 10)
    }
    /// Two-byte field with whole-meter ticks.
    pub fn from_meters_pair(low: u8, high: u8) -> Self {
        Self(compose16(low, high) * 100)
    }
    /// Two-byte field with 0.01 m ticks.
    pub fn from_centimeters_pair(low: u8, high: u8) -> Self {
        Self(compose16(low, high))
    }
    /// Single-byte field with 0.01 m ticks.
    pub fn from_centimeters_byte(byte: u8) -> Self {
        Self(u32::from(byte))
    }
    pub fn centimeters(self) -> u32 {
        self.0
    }
    pub fn as_meters_f64(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        write!(f, "{whole}.{frac:02}m")
    }
}

/// Boat pace as time per 500 m, stored in centiseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pace(u32);

impl Pace {
    /// Two-byte field with 0.01 s ticks.
    pub fn from_centiseconds(low: u8, high: u8) -> Self {
        Self(compose16(low, high))
    }
    /// Two-byte field with 0.1 s ticks.
    pub fn from_deciseconds(low: u8, high: u8) -> Self {
        Self(compose16(low, high) * 10)
    }
    pub fn centiseconds(self) -> u32 {
        self.0
    }
    pub fn as_secs_per_500m_f64(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl fmt::Display for Pace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.0 / 6000;
        let seconds = (self.0 % 6000) / 100;
        let tenths = (self.0 % 100) / 10;
        write!(f, "{minutes}:{seconds:02}.{tenths}/500m")
    }
}

/// Power output in watts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Power(u16);

impl Power {
    pub fn from_watts(low: u8, high: u8) -> Self {
        Self(u16::from_le_bytes([low, high]))
    }
    pub fn watts(self) -> u16 {
        self.0
    }
}

/// A calorie figure. Depending on the field this is a running total (cal)
/// or a burn rate (cal/hr); the record structs document which.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Calories(u16);

impl Calories {
    pub fn from_cals(low: u8, high: u8) -> Self {
        Self(u16::from_le_bytes([low, high]))
    }
    pub fn cals(self) -> u16 {
        self.0
    }
}

/// Boat speed, stored in millimeters per second (0.001 m/s wire ticks).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Speed(u16);

impl Speed {
    pub fn from_milli_mps(low: u8, high: u8) -> Self {
        Self(u16::from_le_bytes([low, high]))
    }
    pub fn milli_mps(self) -> u16 {
        self.0
    }
    pub fn as_mps_f64(self) -> f64 {
        f64::from(self.0) / 1000.0
    }
}

/// Handle force, stored in 0.1 lbf ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Force(u16);

impl Force {
    pub fn from_deci_lbf(low: u8, high: u8) -> Self {
        Self(u16::from_le_bytes([low, high]))
    }
    pub fn deci_lbf(self) -> u16 {
        self.0
    }
    pub fn as_lbf_f64(self) -> f64 {
        f64::from(self.0) / 10.0
    }
}

/// Mechanical work, stored in 0.1 J ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Work(u16);

impl Work {
    pub fn from_deci_joules(low: u8, high: u8) -> Self {
        Self(u16::from_le_bytes([low, high]))
    }
    pub fn deci_joules(self) -> u16 {
        self.0
    }
    pub fn as_joules_f64(self) -> f64 {
        f64::from(self.0) / 10.0
    }
}

/// Cumulative strokes since the workout started.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct StrokeCount(u16);

impl StrokeCount {
    pub fn from_strokes(low: u8, high: u8) -> Self {
        Self(u16::from_le_bytes([low, high]))
    }
    pub fn strokes(self) -> u16 {
        self.0
    }
}

/// Strokes per minute, a single unscaled byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct StrokeRate(pub u8);

/// Which interval of the workout the monitor is in, a single unscaled byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct IntervalCount(pub u8);

/// Flywheel drag factor, a single unscaled byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct DragFactor(pub u8);

/// Heart rate as reported by a paired belt. Monitors send 255 when no belt
/// is paired or the reading is unusable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HeartRate {
    #[default]
    Invalid,
    Bpm(u8),
}

impl From<u8> for HeartRate {
    fn from(byte: u8) -> Self {
        match byte {
            u8::MAX => Self::Invalid,
            bpm => Self::Bpm(bpm),
        }
    }
}

impl fmt::Display for HeartRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => write!(f, "--"),
            Self::Bpm(bpm) => write!(f, "{bpm}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_byte_composition_is_little_endian() {
        // 0x030201 = 197121
        let t = TimeInterval::from_centiseconds(0x01, 0x02, 0x03);
        assert_eq!(t.centiseconds(), 1 + (2 << 8) + (3 << 16));
        assert_eq!(t.centiseconds(), 197_121);
    }

    #[test]
    fn byte_order_is_not_symmetric() {
        let forward = Distance::from_meters(0x01, 0x02, 0x03);
        let reversed = Distance::from_meters(0x03, 0x02, 0x01);
        assert_ne!(forward, reversed);
    }

    #[test]
    fn tick_scaling_reaches_canonical_magnitudes() {
        // 10 ticks of 0.1 s == 100 ticks of 0.01 s == 1 s
        assert_eq!(
            TimeInterval::from_deciseconds(10, 0, 0),
            TimeInterval::from_centiseconds(100, 0, 0)
        );
        assert_eq!(TimeInterval::from_seconds_pair(2, 0).centiseconds(), 200);
        assert_eq!(Distance::from_meters(1, 0, 0).centimeters(), 100);
        assert_eq!(Distance::from_decimeters(25, 0, 0).centimeters(), 250);
        assert_eq!(Pace::from_deciseconds(0xDC, 0x05).centiseconds(), 15_000);
    }

    #[test]
    fn max_wire_values_do_not_overflow() {
        let t = TimeInterval::from_seconds(0xFF, 0xFF, 0xFF);
        assert_eq!(t.centiseconds(), 16_777_215 * 100);
        let d = Distance::from_meters(0xFF, 0xFF, 0xFF);
        assert_eq!(d.centimeters(), 16_777_215 * 100);
    }

    #[test]
    fn pace_formats_as_split() {
        // 90.00 s/500m
        let pace = Pace::from_centiseconds(0x28, 0x23);
        assert_eq!(pace.centiseconds(), 9000);
        assert_eq!(pace.to_string(), "1:30.0/500m");
    }

    #[test]
    fn time_formats_with_minutes() {
        let t = TimeInterval::from_centiseconds(0x7C, 0x92, 0x00); // 37500 cs
        assert_eq!(t.to_string(), "6:15.0");
    }

    #[test]
    fn heart_rate_reserves_255() {
        assert_eq!(HeartRate::from(255), HeartRate::Invalid);
        assert_eq!(HeartRate::from(0), HeartRate::Bpm(0));
        assert_eq!(HeartRate::from(162), HeartRate::Bpm(162));
    }
}
