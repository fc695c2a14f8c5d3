use core::fmt;

use super::registers;

/// Uncompensated frame read from `meas_status_0` onwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawSample {
    pub new_data: bool,
    pub gas_index: u8,
    pub measurement_index: u8,
    /// 20 bits.
    pub pressure_adc: u32,
    /// 20 bits.
    pub temperature_adc: u32,
    pub humidity_adc: u16,
    /// 10 bits.
    pub gas_adc: u16,
    /// 4 bits.
    pub gas_range: u8,
    pub gas_valid: bool,
    pub heater_stable: bool,
}

impl RawSample {
    pub fn decode(frame: &[u8; registers::FIELD_LEN]) -> Self {
        let adc20 =
            |msb: u8, lsb: u8, xlsb: u8| ((msb as u32) << 12) | ((lsb as u32) << 4) | (xlsb as u32 >> 4);

        Self {
            new_data: frame[0] & registers::NEW_DATA != 0,
            gas_index: frame[0] & registers::GAS_INDEX_MASK,
            measurement_index: frame[1],
            pressure_adc: adc20(frame[2], frame[3], frame[4]),
            temperature_adc: adc20(frame[5], frame[6], frame[7]),
            humidity_adc: u16::from_be_bytes([frame[8], frame[9]]),
            gas_adc: ((frame[13] as u16) << 2) | (frame[14] as u16 >> 6),
            gas_range: frame[14] & registers::GAS_RANGE_MASK,
            gas_valid: frame[14] & registers::GAS_VALID != 0,
            heater_stable: frame[14] & registers::HEAT_STAB != 0,
        }
    }
}

/// Compensated values of one conversion. Fields that were not measured are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhysicalReading {
    /// °C
    pub temperature: Option<f32>,
    /// hPa
    pub pressure: Option<f32>,
    /// %RH, within 0..=100
    pub humidity: Option<f32>,
    /// Ω
    pub gas_resistance: Option<f32>,
    /// m, from pressure and the configured sea-level reference
    pub altitude: Option<f32>,
}

impl PhysicalReading {
    pub const EMPTY: Self = Self {
        temperature: None,
        pressure: None,
        humidity: None,
        gas_resistance: None,
        altitude: None,
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

struct Field(Option<f32>, usize, &'static str);

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{:.*}{}", self.1, value, self.2),
            None => write!(f, "-{}", self.2),
        }
    }
}

impl fmt::Display for PhysicalReading {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}",
            Field(self.temperature, 2, "°C"),
            Field(self.pressure, 2, " hPa"),
            Field(self.humidity, 1, "% RH"),
            Field(self.gas_resistance, 0, " Ω"),
            Field(self.altitude, 1, " m"),
        )
    }
}

/// A new reading, the one it replaced and their per-field difference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeResult {
    pub new: PhysicalReading,
    pub old: PhysicalReading,
    /// `new - old` for every field present on both sides, `None` elsewhere.
    pub delta: PhysicalReading,
}

impl ChangeResult {
    pub fn compute(old: PhysicalReading, new: PhysicalReading) -> Self {
        let diff = |new: Option<f32>, old: Option<f32>| Some(new? - old?);

        Self {
            new,
            old,
            delta: PhysicalReading {
                temperature: diff(new.temperature, old.temperature),
                pressure: diff(new.pressure, old.pressure),
                humidity: diff(new.humidity, old.humidity),
                gas_resistance: diff(new.gas_resistance, old.gas_resistance),
                altitude: diff(new.altitude, old.altitude),
            },
        }
    }
}
