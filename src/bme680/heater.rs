use super::calibration::Calibration;

pub const MIN_TARGET_CELSIUS: u16 = 200;
pub const MAX_TARGET_CELSIUS: u16 = 400;
/// Longest duration the wait register can express (63 * 64 ms).
pub const MAX_DURATION_MS: u16 = 0xFC0;
/// Ambient temperature assumed before the first reading.
pub const DEFAULT_AMBIENT_CELSIUS: f32 = 25.0;

/// Heater set-point slots stored in the sensor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HeaterSlot {
    #[default]
    Slot0 = 0,
    Slot1 = 1,
    Slot2 = 2,
    Slot3 = 3,
    Slot4 = 4,
    Slot5 = 5,
    Slot6 = 6,
    Slot7 = 7,
    Slot8 = 8,
    Slot9 = 9,
}

impl TryFrom<u8> for HeaterSlot {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => HeaterSlot::Slot0,
            1 => HeaterSlot::Slot1,
            2 => HeaterSlot::Slot2,
            3 => HeaterSlot::Slot3,
            4 => HeaterSlot::Slot4,
            5 => HeaterSlot::Slot5,
            6 => HeaterSlot::Slot6,
            7 => HeaterSlot::Slot7,
            8 => HeaterSlot::Slot8,
            9 => HeaterSlot::Slot9,
            other => return Err(other),
        })
    }
}

/// Target temperature and duration of the gas heater for one slot.
///
/// Out-of-range values are clamped when the profile is encoded, not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaterProfile {
    pub slot: HeaterSlot,
    /// Heater plate target, °C.
    pub target_celsius: u16,
    /// Time the target is held before the gas measurement, ms.
    pub duration_ms: u16,
}

impl Default for HeaterProfile {
    fn default() -> Self {
        Self {
            slot: HeaterSlot::Slot0,
            target_celsius: 320,
            duration_ms: 150,
        }
    }
}

impl HeaterProfile {
    pub fn resistance_byte(&self, ambient_celsius: f32, cal: &Calibration) -> u8 {
        encode_resistance(self.target_celsius, ambient_celsius, cal)
    }

    pub fn duration_byte(&self) -> u8 {
        encode_duration(self.duration_ms)
    }
}

/// Encodes a heater duration as a 6-bit mantissa and a 2-bit factor of 4.
///
/// Durations that do not fit saturate to `0xFF`.
pub fn encode_duration(duration_ms: u16) -> u8 {
    if duration_ms >= MAX_DURATION_MS {
        return 0xFF;
    }

    let mut mantissa = duration_ms;
    let mut factor = 0u8;
    while mantissa > 0x3F {
        mantissa /= 4;
        factor += 1;
    }

    mantissa as u8 + factor * 64
}

/// Computes the `res_heat_x` value for a target plate temperature.
pub fn encode_resistance(target_celsius: u16, ambient_celsius: f32, cal: &Calibration) -> u8 {
    let target = target_celsius.clamp(MIN_TARGET_CELSIUS, MAX_TARGET_CELSIUS) as f32;

    let var1 = cal.par_g1 as f32 / 16.0 + 49.0;
    let var2 = cal.par_g2 as f32 / 32768.0 * 0.0005 + 0.00235;
    let var3 = cal.par_g3 as f32 / 1024.0;
    let var4 = var1 * (1.0 + var2 * target);
    let var5 = var4 + var3 * ambient_celsius;

    let res_heat = 3.4
        * (var5
            * (4.0 / (4.0 + cal.res_heat_range as f32))
            * (1.0 / (1.0 + cal.res_heat_val as f32 * 0.002))
            - 25.0);

    // float to int casts saturate
    res_heat as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug_utils::reference_calibration;

    #[test]
    fn test_duration_encoding() {
        assert_eq!(encode_duration(0), 0x00);
        assert_eq!(encode_duration(1), 0x01);
        assert_eq!(encode_duration(63), 0x3F);
        assert_eq!(encode_duration(64), 0x50);
        assert_eq!(encode_duration(150), 0x65);
        assert_eq!(encode_duration(4031), 0xFE);
    }

    #[test]
    fn test_duration_saturates() {
        assert_eq!(encode_duration(4032), 0xFF);
        assert_eq!(encode_duration(4033), 0xFF);
        assert_eq!(encode_duration(10_000), 0xFF);
        assert_eq!(encode_duration(u16::MAX), 0xFF);
    }

    #[test]
    fn test_resistance() {
        let cal = reference_calibration();

        assert_eq!(encode_resistance(320, 25.0, &cal), 118);
        assert!(encode_resistance(400, 25.0, &cal) > encode_resistance(300, 25.0, &cal));
    }

    #[test]
    fn test_resistance_clamps_target() {
        let cal = reference_calibration();

        assert_eq!(
            encode_resistance(100, 25.0, &cal),
            encode_resistance(200, 25.0, &cal)
        );
        assert_eq!(
            encode_resistance(0, 25.0, &cal),
            encode_resistance(200, 25.0, &cal)
        );
        assert_eq!(
            encode_resistance(500, 25.0, &cal),
            encode_resistance(400, 25.0, &cal)
        );
    }

    #[test]
    fn test_slot_conversion() {
        assert_eq!(HeaterSlot::try_from(9), Ok(HeaterSlot::Slot9));
        assert_eq!(HeaterSlot::try_from(10), Err(10));
    }

    #[test]
    fn test_default_profile_matches_power_on_wait() {
        assert_eq!(HeaterProfile::default().duration_byte(), 0x65);
    }
}
