use std::collections::VecDeque;

use embedded_hal::i2c::Operation;
use embedded_hal_async::delay::DelayNs;

use crate::bme680::{Calibration, registers};
use crate::transport::RegisterTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DummyError {
    InvalidTest,
    Injected,
}

impl embedded_hal::i2c::Error for DummyError {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        embedded_hal::i2c::ErrorKind::Other
    }
}

impl embedded_hal::spi::Error for DummyError {
    fn kind(&self) -> embedded_hal::spi::ErrorKind {
        embedded_hal::spi::ErrorKind::Other
    }
}

pub struct DummyBus<'a> {
    pub response: &'a [u8],
}

impl embedded_hal::i2c::ErrorType for DummyBus<'_> {
    type Error = DummyError;
}

impl embedded_hal_async::i2c::I2c for DummyBus<'_> {
    async fn transaction(
        &mut self,
        _address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        match operations {
            [Operation::Write(_), Operation::Read(response)] => {
                if response.len() != self.response.len() {
                    return Err(DummyError::InvalidTest);
                }

                response.copy_from_slice(self.response);

                Ok(())
            }
            [Operation::Write(_)] => Ok(()),
            // Other transactions are invalid
            _ => Err(DummyError::InvalidTest),
        }
    }
}

/// Records every byte written, reads back zeros.
#[derive(Default)]
pub struct DummySpi {
    pub writes: Vec<Vec<u8>>,
}

impl embedded_hal::spi::ErrorType for DummySpi {
    type Error = DummyError;
}

impl embedded_hal_async::spi::SpiDevice for DummySpi {
    async fn transaction(
        &mut self,
        operations: &mut [embedded_hal::spi::Operation<'_, u8>],
    ) -> Result<(), Self::Error> {
        for operation in operations {
            match operation {
                embedded_hal::spi::Operation::Write(data) => self.writes.push(data.to_vec()),
                embedded_hal::spi::Operation::Read(buffer) => buffer.fill(0),
                _ => return Err(DummyError::InvalidTest),
            }
        }
        Ok(())
    }
}

/// Delay that only yields to the executor.
#[derive(Debug, Clone, Copy, Default)]
pub struct YieldDelay;

impl DelayNs for YieldDelay {
    async fn delay_ns(&mut self, _ns: u32) {
        embassy_futures::yield_now().await;
    }
}

/// Coefficient blocks 0x89..0xA1 and 0xE1..0xF0 of a sample part.
#[rustfmt::skip]
pub const REFERENCE_COEFFICIENTS: [u8; registers::COEFF_LEN] = [
    0x00, 0x22, 0x67, 0x03, 0x00, 0x94, 0x8E, 0x71, 0xD7, 0x58,
    0x00, 0xB4, 0x1A, 0x83, 0xFF, 0x21, 0x1E, 0x00, 0x00, 0xCA,
    0xF3, 0x10, 0xF5, 0x1E, 0x00,
    0x3F, 0x9D, 0x31, 0x00, 0x2D, 0x14, 0x78, 0x9C, 0xEF, 0x65,
    0x38, 0xD8, 0xE2, 0x12, 0x00, 0x00,
];
const REFERENCE_RES_HEAT_VAL: u8 = 0x28;
const REFERENCE_RES_HEAT_RANGE: u8 = 0x10;
const REFERENCE_RANGE_SW_ERR: u8 = 0x00;

pub fn reference_calibration() -> Calibration {
    Calibration::from_registers(
        &REFERENCE_COEFFICIENTS,
        REFERENCE_RES_HEAT_VAL,
        REFERENCE_RES_HEAT_RANGE,
        REFERENCE_RANGE_SW_ERR,
    )
}

/// A ready measurement frame with valid gas data and a stable heater.
pub fn frame(
    temperature_adc: u32,
    pressure_adc: u32,
    humidity_adc: u16,
    gas_adc: u16,
    gas_range: u8,
) -> [u8; registers::FIELD_LEN] {
    let mut frame = [0u8; registers::FIELD_LEN];
    frame[0] = registers::NEW_DATA;
    frame[2] = (pressure_adc >> 12) as u8;
    frame[3] = (pressure_adc >> 4) as u8;
    frame[4] = (pressure_adc << 4) as u8;
    frame[5] = (temperature_adc >> 12) as u8;
    frame[6] = (temperature_adc >> 4) as u8;
    frame[7] = (temperature_adc << 4) as u8;
    frame[8..10].copy_from_slice(&humidity_adc.to_be_bytes());
    frame[13] = (gas_adc >> 2) as u8;
    frame[14] = ((gas_adc << 6) as u8)
        | registers::GAS_VALID
        | registers::HEAT_STAB
        | (gas_range & registers::GAS_RANGE_MASK);
    frame
}

/// Register-level stand-in for a BME680.
///
/// Writes land in the register map and are recorded. Status polls are answered
/// with "not ready" `not_ready_polls` times, then with the queued frames in
/// order; the last frame repeats once the queue is down to one.
pub struct FakeDevice {
    pub registers: [u8; 256],
    pub writes: Vec<(u8, u8)>,
    pub bursts: Vec<(u8, usize)>,
    pub frames: VecDeque<[u8; registers::FIELD_LEN]>,
    pub not_ready_polls: usize,
    pub status_polls: usize,
    /// Burst reads fail once this many have been issued.
    pub fail_bursts_after: Option<usize>,
    pub fail_writes: bool,
}

impl FakeDevice {
    pub fn reference() -> Self {
        let mut map = [0u8; 256];
        let first = registers::COEFF_BLOCK_1 as usize;
        let second = registers::COEFF_BLOCK_2 as usize;
        map[first..first + registers::COEFF_BLOCK_1_LEN]
            .copy_from_slice(&REFERENCE_COEFFICIENTS[..registers::COEFF_BLOCK_1_LEN]);
        map[second..second + registers::COEFF_BLOCK_2_LEN]
            .copy_from_slice(&REFERENCE_COEFFICIENTS[registers::COEFF_BLOCK_1_LEN..]);
        map[registers::RES_HEAT_VAL as usize] = REFERENCE_RES_HEAT_VAL;
        map[registers::RES_HEAT_RANGE as usize] = REFERENCE_RES_HEAT_RANGE;
        map[registers::RANGE_SW_ERR as usize] = REFERENCE_RANGE_SW_ERR;
        map[registers::CHIP_ID as usize] = registers::CHIP_ID_VALUE;

        Self {
            registers: map,
            writes: Vec::new(),
            bursts: Vec::new(),
            frames: VecDeque::new(),
            not_ready_polls: 0,
            status_polls: 0,
            fail_bursts_after: None,
            fail_writes: false,
        }
    }

    fn next_frame(&mut self) -> [u8; registers::FIELD_LEN] {
        if self.frames.len() > 1 {
            self.frames.pop_front().unwrap()
        } else {
            self.frames
                .front()
                .copied()
                .unwrap_or_else(|| frame(500_000, 350_000, 20_000, 512, 5))
        }
    }
}

impl RegisterTransport for FakeDevice {
    type Error = DummyError;

    async fn read_burst(&mut self, start: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        if self
            .fail_bursts_after
            .is_some_and(|limit| self.bursts.len() >= limit)
        {
            return Err(DummyError::Injected);
        }
        self.bursts.push((start, buffer.len()));

        if start == registers::MEAS_STATUS_0 {
            self.status_polls += 1;
            if self.not_ready_polls > 0 {
                self.not_ready_polls -= 1;
                buffer.fill(0);
            } else {
                let frame = self.next_frame();
                buffer.copy_from_slice(&frame[..buffer.len()]);
            }
            return Ok(());
        }

        let start = start as usize;
        buffer.copy_from_slice(&self.registers[start..start + buffer.len()]);
        Ok(())
    }

    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err(DummyError::Injected);
        }
        self.writes.push((register, value));
        self.registers[register as usize] = value;
        Ok(())
    }
}
