use embedded_hal_async::delay::DelayNs;

use crate::transport::{Error, RegisterTransport};

pub mod calibration;
pub mod compensation;
mod config;
mod heater;
mod reading;
pub mod registers;

pub use calibration::Calibration;
pub use config::{Config, Filter, Oversampling, PollPolicy};
pub use heater::{
    DEFAULT_AMBIENT_CELSIUS, HeaterProfile, HeaterSlot, MAX_DURATION_MS, MAX_TARGET_CELSIUS,
    MIN_TARGET_CELSIUS, encode_duration, encode_resistance,
};
pub use reading::{ChangeResult, PhysicalReading, RawSample};

// Settle time after a soft reset.
const RESET_DELAY_MS: u32 = 2;

/// One BME680 on a register transport.
///
/// Every conversion is a forced-mode one-shot: the device is configured, armed,
/// polled until the new-data flag appears, and then returns to sleep.
#[derive(Debug)]
pub struct Bme680<T, D> {
    transport: T,
    delay: D,
    calibration: Calibration,
    chip_id: u8,
    ambient_celsius: f32,
    last: PhysicalReading,
}

impl<T: RegisterTransport, D: DelayNs> Bme680<T, D> {
    /// Resets the device, checks its chip id and loads the calibration.
    pub async fn new(mut transport: T, mut delay: D) -> Result<Self, Error<T::Error>> {
        transport
            .write_register(registers::RESET, registers::RESET_COMMAND)
            .await?;
        delay.delay_ms(RESET_DELAY_MS).await;

        let chip_id = transport.read_register(registers::CHIP_ID).await?;
        if chip_id != registers::CHIP_ID_VALUE {
            warn!("unexpected chip id {}", chip_id);
            return Err(Error::UnexpectedChipId(chip_id));
        }
        debug!("bme680 found, chip id {}", chip_id);

        let calibration = Calibration::load(&mut transport).await?;

        Ok(Self {
            transport,
            delay,
            calibration,
            chip_id,
            ambient_celsius: DEFAULT_AMBIENT_CELSIUS,
            last: PhysicalReading::EMPTY,
        })
    }

    pub fn chip_id(&self) -> u8 {
        self.chip_id
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// The reading produced by the last successful conversion.
    pub fn last_reading(&self) -> PhysicalReading {
        self.last
    }

    /// Ambient temperature used for heater encoding: the last measured
    /// temperature, or 25 °C before one exists.
    pub fn ambient_temperature(&self) -> f32 {
        self.ambient_celsius
    }

    pub fn release(self) -> (T, D) {
        (self.transport, self.delay)
    }

    pub(crate) fn delay(&self) -> &D {
        &self.delay
    }

    /// Stores a heater set-point in its slot. Does not start a conversion.
    pub async fn set_heater_profile(
        &mut self,
        profile: &HeaterProfile,
    ) -> Result<(), Error<T::Error>> {
        let slot = profile.slot as u8;
        let resistance = profile.resistance_byte(self.ambient_celsius, &self.calibration);
        let duration = profile.duration_byte();
        trace!(
            "heater slot {}: res_heat {} gas_wait {}",
            slot,
            resistance,
            duration
        );

        self.transport
            .write_register(registers::RES_HEAT_0 + slot, resistance)
            .await?;
        self.transport
            .write_register(registers::GAS_WAIT_0 + slot, duration)
            .await?;
        Ok(())
    }

    /// Writes oversampling, filter and gas settings with the device asleep.
    pub async fn configure(&mut self, config: &Config) -> Result<(), Error<T::Error>> {
        config.validate()?;

        self.transport
            .write_register(registers::CTRL_MEAS, registers::MODE_SLEEP)
            .await?;
        self.transport
            .write_register(registers::CONFIG, config.config_bits())
            .await?;
        self.transport
            .write_register(registers::CTRL_MEAS, config.ctrl_meas_bits())
            .await?;
        self.transport
            .write_register(registers::CTRL_HUM, config.ctrl_hum_bits())
            .await?;

        let ctrl_gas = if config.gas_enabled {
            self.set_heater_profile(&config.heater).await?;
            registers::RUN_GAS | (config.heater.slot as u8 & registers::NB_CONV_MASK)
        } else {
            0
        };
        self.transport
            .write_register(registers::CTRL_GAS_1, ctrl_gas)
            .await?;

        trace!("configured, ctrl_meas {} ctrl_gas_1 {}", config.ctrl_meas_bits(), ctrl_gas);
        Ok(())
    }

    /// Runs one forced-mode conversion and returns the compensated reading.
    ///
    /// Fails with [`Error::ConversionTimeout`] when the new-data flag does not
    /// show up within `config.poll.attempts` polls.
    pub async fn read_once(&mut self, config: &Config) -> Result<PhysicalReading, Error<T::Error>> {
        self.configure(config).await?;

        let ctrl_meas = self.transport.read_register(registers::CTRL_MEAS).await?;
        self.transport
            .write_register(
                registers::CTRL_MEAS,
                (ctrl_meas & !registers::MODE_MASK) | registers::MODE_FORCED,
            )
            .await?;

        // the gas measurement starts after the heater has been held at target
        if config.gas_enabled {
            self.delay
                .delay_ms(config.heater.duration_ms.min(MAX_DURATION_MS) as u32)
                .await;
        }

        let raw = self.poll_new_data(config).await?;
        let reading = self.compensate(&raw, config);

        if let Some(temperature) = reading.temperature {
            self.ambient_celsius = temperature;
        }
        self.last = reading;
        Ok(reading)
    }

    async fn poll_new_data(&mut self, config: &Config) -> Result<RawSample, Error<T::Error>> {
        let mut frame = [0u8; registers::FIELD_LEN];

        for attempt in 1..=config.poll.attempts {
            self.transport
                .read_burst(registers::MEAS_STATUS_0, &mut frame)
                .await?;
            let raw = RawSample::decode(&frame);
            if raw.new_data {
                return Ok(raw);
            }

            trace!("no new data on poll {}", attempt);
            if attempt < config.poll.attempts {
                self.delay.delay_ms(config.poll.interval_ms).await;
            }
        }

        warn!("conversion timed out after {} polls", config.poll.attempts);
        Err(Error::ConversionTimeout(config.poll.attempts))
    }

    fn compensate(&self, raw: &RawSample, config: &Config) -> PhysicalReading {
        let cal = &self.calibration;
        let mut reading = PhysicalReading::EMPTY;

        // pressure and humidity need the fine temperature of this cycle
        if !config.temperature_oversampling.is_skipped() {
            let (celsius, fine) = compensation::temperature(raw.temperature_adc, cal);
            reading.temperature = Some(celsius);

            if !config.pressure_oversampling.is_skipped() {
                let pressure = compensation::pressure(raw.pressure_adc, fine, cal);
                reading.pressure = Some(pressure);
                reading.altitude = Some(compensation::altitude(
                    pressure,
                    config.sea_level_pressure,
                ));
            }
            if !config.humidity_oversampling.is_skipped() {
                reading.humidity = Some(compensation::humidity(raw.humidity_adc, fine, cal));
            }
        }

        if config.gas_enabled {
            if raw.gas_valid && raw.heater_stable {
                reading.gas_resistance =
                    Some(compensation::gas_resistance(raw.gas_adc, raw.gas_range, cal));
            } else {
                warn!(
                    "gas data discarded, valid {} heater stable {}",
                    raw.gas_valid,
                    raw.heater_stable
                );
            }
        }

        reading
    }
}
