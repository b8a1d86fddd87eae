//! Decoding of the PM rowing service.
//!
//! Each characteristic carries one fixed-length record. Decoding is split in
//! two layers: [`FieldReader`] walks a length-checked payload byte by byte,
//! and each record type in [`frames`] declares its characteristic, its exact
//! length, and the field sequence that consumes the whole payload. The only
//! ways a notification can fail to decode are a payload of the wrong length
//! or a characteristic this service does not define; bad field *values* never
//! fail, they come out as `Unknown` enum variants.

pub mod frames;
pub mod units;
pub mod workout;

use std::fmt;

use num_enum::IntoPrimitive;
use thiserror::Error;
use uuid::Uuid;

use frames::{
    AdditionalSplitData, AdditionalStatus1, AdditionalStatus2, AdditionalStrokeData, GeneralStatus,
    HeartRateBeltInfo, SplitData, StrokeData, WorkoutSummary,
};

/// Advertised base service, useful for scan filtering.
pub const PM_BASE_SERVICE_UUID: Uuid = Uuid::from_u128(0xce060000_43e5_11e4_916c_0800200c9a66);
pub const ROWING_SERVICE_UUID: Uuid = Uuid::from_u128(0xce060030_43e5_11e4_916c_0800200c9a66);

pub const GENERAL_STATUS_UUID: Uuid = Uuid::from_u128(0xce060031_43e5_11e4_916c_0800200c9a66);
pub const ADDITIONAL_STATUS_1_UUID: Uuid = Uuid::from_u128(0xce060032_43e5_11e4_916c_0800200c9a66);
pub const ADDITIONAL_STATUS_2_UUID: Uuid = Uuid::from_u128(0xce060033_43e5_11e4_916c_0800200c9a66);
/// Write-only characteristic controlling how often status records arrive.
pub const SAMPLE_RATE_UUID: Uuid = Uuid::from_u128(0xce060034_43e5_11e4_916c_0800200c9a66);
pub const STROKE_DATA_UUID: Uuid = Uuid::from_u128(0xce060035_43e5_11e4_916c_0800200c9a66);
pub const ADDITIONAL_STROKE_DATA_UUID: Uuid =
    Uuid::from_u128(0xce060036_43e5_11e4_916c_0800200c9a66);
pub const SPLIT_DATA_UUID: Uuid = Uuid::from_u128(0xce060037_43e5_11e4_916c_0800200c9a66);
pub const ADDITIONAL_SPLIT_DATA_UUID: Uuid =
    Uuid::from_u128(0xce060038_43e5_11e4_916c_0800200c9a66);
pub const WORKOUT_SUMMARY_UUID: Uuid = Uuid::from_u128(0xce060039_43e5_11e4_916c_0800200c9a66);
pub const HEART_RATE_BELT_INFO_UUID: Uuid =
    Uuid::from_u128(0xce06003b_43e5_11e4_916c_0800200c9a66);
pub const MULTIPLEXED_INFO_UUID: Uuid = Uuid::from_u128(0xce060080_43e5_11e4_916c_0800200c9a66);

/// The notifying characteristics of the rowing service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CharacteristicKind {
    GeneralStatus,
    AdditionalStatus1,
    AdditionalStatus2,
    StrokeData,
    AdditionalStrokeData,
    SplitData,
    AdditionalSplitData,
    WorkoutSummary,
    HeartRateBeltInfo,
    /// Wraps any of the others: first byte names the record, the rest is its
    /// payload. Meant for hosts that cap how many subscriptions they allow.
    Multiplexed,
}

impl CharacteristicKind {
    pub const NOTIFYING: [CharacteristicKind; 10] = [
        Self::GeneralStatus,
        Self::AdditionalStatus1,
        Self::AdditionalStatus2,
        Self::StrokeData,
        Self::AdditionalStrokeData,
        Self::SplitData,
        Self::AdditionalSplitData,
        Self::WorkoutSummary,
        Self::HeartRateBeltInfo,
        Self::Multiplexed,
    ];

    pub const fn uuid(self) -> Uuid {
        match self {
            Self::GeneralStatus => GENERAL_STATUS_UUID,
            Self::AdditionalStatus1 => ADDITIONAL_STATUS_1_UUID,
            Self::AdditionalStatus2 => ADDITIONAL_STATUS_2_UUID,
            Self::StrokeData => STROKE_DATA_UUID,
            Self::AdditionalStrokeData => ADDITIONAL_STROKE_DATA_UUID,
            Self::SplitData => SPLIT_DATA_UUID,
            Self::AdditionalSplitData => ADDITIONAL_SPLIT_DATA_UUID,
            Self::WorkoutSummary => WORKOUT_SUMMARY_UUID,
            Self::HeartRateBeltInfo => HEART_RATE_BELT_INFO_UUID,
            Self::Multiplexed => MULTIPLEXED_INFO_UUID,
        }
    }

    pub fn from_uuid(uuid: Uuid) -> Option<Self> {
        Self::NOTIFYING.into_iter().find(|kind| kind.uuid() == uuid)
    }

    /// Payload length of the fixed-size records. `None` for the multiplexed
    /// characteristic, whose length depends on what it wraps.
    pub const fn data_len(self) -> Option<usize> {
        match self {
            Self::GeneralStatus => Some(GeneralStatus::LEN),
            Self::AdditionalStatus1 => Some(AdditionalStatus1::LEN),
            Self::AdditionalStatus2 => Some(AdditionalStatus2::LEN),
            Self::StrokeData => Some(StrokeData::LEN),
            Self::AdditionalStrokeData => Some(AdditionalStrokeData::LEN),
            Self::SplitData => Some(SplitData::LEN),
            Self::AdditionalSplitData => Some(AdditionalSplitData::LEN),
            Self::WorkoutSummary => Some(WorkoutSummary::LEN),
            Self::HeartRateBeltInfo => Some(HeartRateBeltInfo::LEN),
            Self::Multiplexed => None,
        }
    }

    /// Record id used as the first byte of multiplexed payloads. These match
    /// the low byte of each characteristic's UUID. The multiplexed
    /// characteristic never wraps itself.
    fn from_mux_id(id: u8) -> Option<Self> {
        match id {
            0x31 => Some(Self::GeneralStatus),
            0x32 => Some(Self::AdditionalStatus1),
            0x33 => Some(Self::AdditionalStatus2),
            0x35 => Some(Self::StrokeData),
            0x36 => Some(Self::AdditionalStrokeData),
            0x37 => Some(Self::SplitData),
            0x38 => Some(Self::AdditionalSplitData),
            0x39 => Some(Self::WorkoutSummary),
            0x3B => Some(Self::HeartRateBeltInfo),
            _ => None,
        }
    }
}

impl fmt::Display for CharacteristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GeneralStatus => "general status",
            Self::AdditionalStatus1 => "additional status 1",
            Self::AdditionalStatus2 => "additional status 2",
            Self::StrokeData => "stroke data",
            Self::AdditionalStrokeData => "additional stroke data",
            Self::SplitData => "split data",
            Self::AdditionalSplitData => "additional split data",
            Self::WorkoutSummary => "workout summary",
            Self::HeartRateBeltInfo => "heart rate belt info",
            Self::Multiplexed => "multiplexed info",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("{kind} payload is {actual} bytes, expected {expected}")]
    LengthMismatch {
        kind: CharacteristicKind,
        expected: usize,
        actual: usize,
    },
    #[error("characteristic {0} is not part of the rowing service")]
    UnknownCharacteristic(Uuid),
    #[error("multiplexed payload wraps unknown record id {0:#04x}")]
    UnknownMultiplexed(u8),
}

/// Sequential cursor over a payload whose length was already checked.
///
/// Accessors return the raw bytes in wire order (low byte first) so record
/// constructors feed them straight into the unit types. Reading past the end
/// is a bug in a record's field sequence, not a wire condition, and panics;
/// [`decode`] pairs every read sequence with an up-front length check and a
/// final [`FieldReader::finish`].
pub(crate) struct FieldReader<'p> {
    bytes: &'p [u8],
    at: usize,
}

impl<'p> FieldReader<'p> {
    fn new(bytes: &'p [u8]) -> Self {
        Self { bytes, at: 0 }
    }

    pub fn byte(&mut self) -> u8 {
        let byte = self.bytes[self.at];
        self.at += 1;
        byte
    }

    /// Next two bytes as (low, high).
    pub fn pair(&mut self) -> (u8, u8) {
        (self.byte(), self.byte())
    }

    /// Next three bytes as (low, mid, high).
    pub fn triple(&mut self) -> (u8, u8, u8) {
        (self.byte(), self.byte(), self.byte())
    }

    /// Next four bytes in wire order.
    pub fn quad(&mut self) -> [u8; 4] {
        [self.byte(), self.byte(), self.byte(), self.byte()]
    }

    fn finish(self) {
        debug_assert_eq!(
            self.at,
            self.bytes.len(),
            "record field sequence did not consume the whole payload"
        );
    }
}

/// A fixed-length record: which characteristic carries it, how long its
/// payload is, and the field sequence that reads it.
pub(crate) trait Frame: Sized {
    const KIND: CharacteristicKind;
    const LEN: usize;

    fn read(fields: &mut FieldReader<'_>) -> Self;
}

fn decode<F: Frame>(payload: &[u8]) -> Result<F, DecodeError> {
    if payload.len() != F::LEN {
        return Err(DecodeError::LengthMismatch {
            kind: F::KIND,
            expected: F::LEN,
            actual: payload.len(),
        });
    }
    let mut fields = FieldReader::new(payload);
    let frame = F::read(&mut fields);
    fields.finish();
    Ok(frame)
}

/// One decoded notification from any characteristic of the rowing service.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RowingData {
    GeneralStatus(GeneralStatus),
    AdditionalStatus1(AdditionalStatus1),
    AdditionalStatus2(AdditionalStatus2),
    StrokeData(StrokeData),
    AdditionalStrokeData(AdditionalStrokeData),
    SplitData(SplitData),
    AdditionalSplitData(AdditionalSplitData),
    WorkoutSummary(WorkoutSummary),
    HeartRateBeltInfo(HeartRateBeltInfo),
}

impl RowingData {
    pub fn kind(&self) -> CharacteristicKind {
        match self {
            Self::GeneralStatus(_) => CharacteristicKind::GeneralStatus,
            Self::AdditionalStatus1(_) => CharacteristicKind::AdditionalStatus1,
            Self::AdditionalStatus2(_) => CharacteristicKind::AdditionalStatus2,
            Self::StrokeData(_) => CharacteristicKind::StrokeData,
            Self::AdditionalStrokeData(_) => CharacteristicKind::AdditionalStrokeData,
            Self::SplitData(_) => CharacteristicKind::SplitData,
            Self::AdditionalSplitData(_) => CharacteristicKind::AdditionalSplitData,
            Self::WorkoutSummary(_) => CharacteristicKind::WorkoutSummary,
            Self::HeartRateBeltInfo(_) => CharacteristicKind::HeartRateBeltInfo,
        }
    }
}

/// Decodes a notification straight off the wire, by characteristic UUID.
pub fn decode_characteristic(uuid: Uuid, payload: &[u8]) -> Result<RowingData, DecodeError> {
    let kind =
        CharacteristicKind::from_uuid(uuid).ok_or(DecodeError::UnknownCharacteristic(uuid))?;
    decode_kind(kind, payload)
}

/// Decodes a payload known to belong to `kind`. Multiplexed payloads are
/// unwrapped and dispatched to the record the leading id byte names.
pub fn decode_kind(kind: CharacteristicKind, payload: &[u8]) -> Result<RowingData, DecodeError> {
    match kind {
        CharacteristicKind::GeneralStatus => decode(payload).map(RowingData::GeneralStatus),
        CharacteristicKind::AdditionalStatus1 => decode(payload).map(RowingData::AdditionalStatus1),
        CharacteristicKind::AdditionalStatus2 => decode(payload).map(RowingData::AdditionalStatus2),
        CharacteristicKind::StrokeData => decode(payload).map(RowingData::StrokeData),
        CharacteristicKind::AdditionalStrokeData => {
            decode(payload).map(RowingData::AdditionalStrokeData)
        }
        CharacteristicKind::SplitData => decode(payload).map(RowingData::SplitData),
        CharacteristicKind::AdditionalSplitData => {
            decode(payload).map(RowingData::AdditionalSplitData)
        }
        CharacteristicKind::WorkoutSummary => decode(payload).map(RowingData::WorkoutSummary),
        CharacteristicKind::HeartRateBeltInfo => decode(payload).map(RowingData::HeartRateBeltInfo),
        CharacteristicKind::Multiplexed => {
            let (id, wrapped) = payload.split_first().ok_or(DecodeError::LengthMismatch {
                kind: CharacteristicKind::Multiplexed,
                expected: 1,
                actual: 0,
            })?;
            let inner =
                CharacteristicKind::from_mux_id(*id).ok_or(DecodeError::UnknownMultiplexed(*id))?;
            decode_kind(inner, wrapped)
        }
    }
}

/// Values accepted by the sample rate control characteristic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, IntoPrimitive)]
#[repr(u8)]
pub enum SampleRate {
    #[default]
    OneSecond = 0,
    HalfSecond = 1,
    QuarterSecond = 2,
    TenthSecond = 3,
}

impl SampleRate {
    /// Parses the config-file spelling.
    pub fn from_setting(value: &str) -> Option<Self> {
        match value {
            "1s" => Some(Self::OneSecond),
            "500ms" => Some(Self::HalfSecond),
            "250ms" => Some(Self::QuarterSecond),
            "100ms" => Some(Self::TenthSecond),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_maps_to_and_from_uuid() {
        for kind in CharacteristicKind::NOTIFYING {
            assert_eq!(CharacteristicKind::from_uuid(kind.uuid()), Some(kind));
        }
        assert_eq!(CharacteristicKind::from_uuid(SAMPLE_RATE_UUID), None);
    }

    #[test]
    fn foreign_uuid_is_rejected() {
        let heart_rate_measurement = Uuid::from_u128(0x00002a37_0000_1000_8000_00805f9b34fb);
        let err = decode_characteristic(heart_rate_measurement, &[0; 19]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownCharacteristic(heart_rate_measurement)
        );
    }

    #[test]
    fn length_is_checked_before_any_field() {
        for kind in CharacteristicKind::NOTIFYING {
            let Some(expected) = kind.data_len() else {
                continue;
            };
            let short = vec![0u8; expected - 1];
            let long = vec![0u8; expected + 1];
            for payload in [&short, &long] {
                match decode_kind(kind, payload) {
                    Err(DecodeError::LengthMismatch {
                        kind: got,
                        expected: want,
                        actual,
                    }) => {
                        assert_eq!(got, kind);
                        assert_eq!(want, expected);
                        assert_eq!(actual, payload.len());
                    }
                    other => panic!("{kind}: expected length mismatch, got {other:?}"),
                }
            }
        }
    }

    #[test]
    fn empty_multiplexed_payload_is_a_length_error() {
        let err = decode_kind(CharacteristicKind::Multiplexed, &[]).unwrap_err();
        assert!(matches!(err, DecodeError::LengthMismatch { .. }));
    }

    #[test]
    fn multiplexed_unknown_id_is_rejected() {
        let err = decode_kind(CharacteristicKind::Multiplexed, &[0x7F, 1, 2, 3]).unwrap_err();
        assert_eq!(err, DecodeError::UnknownMultiplexed(0x7F));
    }

    #[test]
    fn sample_rate_settings_parse() {
        assert_eq!(SampleRate::from_setting("1s"), Some(SampleRate::OneSecond));
        assert_eq!(
            SampleRate::from_setting("500ms"),
            Some(SampleRate::HalfSecond)
        );
        assert_eq!(SampleRate::from_setting("2s"), None);
        assert_eq!(u8::from(SampleRate::TenthSecond), 3);
    }
}
