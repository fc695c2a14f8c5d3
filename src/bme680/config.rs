use super::heater::HeaterProfile;
use crate::transport::Error;

/// Oversampling for one measurement channel.
///
/// Higher rates average more internal samples, trading conversion time for noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Oversampling {
    /// Channel is not measured.
    Skip = 0,
    #[default]
    X1 = 1,
    X2 = 2,
    X4 = 3,
    X8 = 4,
    X16 = 5,
}

impl Oversampling {
    pub fn is_skipped(self) -> bool {
        self == Oversampling::Skip
    }

    fn bits(self) -> u8 {
        self as u8
    }
}

/// IIR filter coefficient for temperature and pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Filter {
    #[default]
    Off = 0,
    Coeff2 = 1,
    Coeff4 = 2,
    Coeff8 = 3,
    Coeff16 = 4,
}

/// Bounded status polling after a conversion has been armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u8,
    pub interval_ms: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            interval_ms: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub temperature_oversampling: Oversampling,
    pub pressure_oversampling: Oversampling,
    pub humidity_oversampling: Oversampling,
    pub filter: Filter,
    pub gas_enabled: bool,
    /// Heater set-point used for the gas measurement.
    pub heater: HeaterProfile,
    /// Reference for the altitude estimate, hPa.
    pub sea_level_pressure: f32,
    pub poll: PollPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            temperature_oversampling: Oversampling::X8,
            pressure_oversampling: Oversampling::X4,
            humidity_oversampling: Oversampling::X2,
            filter: Filter::Coeff4,
            gas_enabled: true,
            heater: HeaterProfile::default(),
            sea_level_pressure: 1013.25,
            poll: PollPolicy::default(),
        }
    }
}

impl Config {
    pub fn validate<E>(&self) -> Result<(), Error<E>> {
        if !(self.sea_level_pressure.is_finite() && self.sea_level_pressure > 0.0) {
            return Err(Error::InvalidConfiguration(
                "sea level pressure must be positive",
            ));
        }
        if self.poll.attempts == 0 {
            return Err(Error::InvalidConfiguration(
                "at least one status poll is required",
            ));
        }
        Ok(())
    }

    /// `config` register: filter coefficient in bits 4:2.
    pub(crate) fn config_bits(&self) -> u8 {
        (self.filter as u8) << 2
    }

    /// `ctrl_meas` register in sleep mode: osrs_t in bits 7:5, osrs_p in bits 4:2.
    pub(crate) fn ctrl_meas_bits(&self) -> u8 {
        (self.temperature_oversampling.bits() << 5) | (self.pressure_oversampling.bits() << 2)
    }

    /// `ctrl_hum` register: osrs_h in bits 2:0.
    pub(crate) fn ctrl_hum_bits(&self) -> u8 {
        self.humidity_oversampling.bits()
    }
}
