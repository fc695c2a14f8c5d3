use embedded_hal_async::i2c::I2c;
use embedded_hal_async::spi::{Operation, SpiDevice};
use thiserror::Error;

#[derive(Clone, Copy, Hash, Debug, PartialEq, Eq, Error)]
pub enum Error<BusError> {
    /// The status register never reported new data within the poll budget.
    #[error("conversion not ready after {0} status polls")]
    ConversionTimeout(u8),
    #[error("sampling session already running")]
    AlreadyRunning,
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("unexpected chip id {0:#04x}")]
    UnexpectedChipId(u8),
    #[error(transparent)]
    Bus(#[from] BusError),
}

/// Byte-register access to the sensor, independent of the wire protocol.
///
/// Register addresses are the 8-bit addresses of the I2C register map. Backends
/// that address the device differently translate them.
#[allow(async_fn_in_trait)]
pub trait RegisterTransport {
    type Error: core::fmt::Debug;

    async fn read_register(&mut self, register: u8) -> Result<u8, Self::Error> {
        let mut value = [0u8];
        self.read_burst(register, &mut value).await?;
        Ok(value[0])
    }

    /// Fills `buffer` with consecutive registers starting at `start`.
    async fn read_burst(&mut self, start: u8, buffer: &mut [u8]) -> Result<(), Self::Error>;

    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), Self::Error>;
}

/// I2C address, selected by the level of the SDO pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Address {
    #[default]
    Primary = 0x76,
    Secondary = 0x77,
}

pub struct I2cTransport<I2C> {
    i2c: I2C,
    addr: u8,
}

impl<I2C> I2cTransport<I2C> {
    pub fn new(i2c: I2C, address: Address) -> Self {
        Self {
            i2c,
            addr: address as u8,
        }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> RegisterTransport for I2cTransport<I2C> {
    type Error = I2C::Error;

    async fn read_burst(&mut self, start: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.write_read(self.addr, &[start], buffer).await
    }

    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), Self::Error> {
        self.i2c.write(self.addr, &[register, value]).await
    }
}

const SPI_READ: u8 = 0x80;
const SPI_ADDR_MASK: u8 = 0x7F;
// Status register, visible at the same SPI address on both pages.
const SPI_STATUS: u8 = 0x73;
const SPI_MEM_PAGE: u8 = 0x10;

/// Which half of the register map the 7-bit SPI address space currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemPage {
    /// Page 0: registers 0x80..=0xFF.
    High,
    /// Page 1: registers 0x00..=0x7F.
    Low,
}

impl MemPage {
    fn of(register: u8) -> Self {
        if register & SPI_READ != 0 {
            MemPage::High
        } else {
            MemPage::Low
        }
    }

    fn status_bits(self) -> u8 {
        match self {
            MemPage::High => 0,
            MemPage::Low => SPI_MEM_PAGE,
        }
    }
}

pub struct SpiTransport<SPI> {
    spi: SPI,
    page: Option<MemPage>,
}

impl<SPI> SpiTransport<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self { spi, page: None }
    }

    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiDevice> SpiTransport<SPI> {
    async fn select_page(&mut self, register: u8) -> Result<(), SPI::Error> {
        let page = MemPage::of(register);
        if self.page == Some(page) {
            return Ok(());
        }

        let mut status = [0u8];
        self.spi
            .transaction(&mut [
                Operation::Write(&[SPI_STATUS | SPI_READ]),
                Operation::Read(&mut status),
            ])
            .await?;
        let value = (status[0] & !SPI_MEM_PAGE) | page.status_bits();
        self.spi.write(&[SPI_STATUS, value]).await?;

        trace!("spi memory page switched, status {}", value);
        self.page = Some(page);
        Ok(())
    }
}

impl<SPI: SpiDevice> RegisterTransport for SpiTransport<SPI> {
    type Error = SPI::Error;

    async fn read_burst(&mut self, start: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.select_page(start).await?;
        self.spi
            .transaction(&mut [
                Operation::Write(&[(start & SPI_ADDR_MASK) | SPI_READ]),
                Operation::Read(buffer),
            ])
            .await
    }

    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), Self::Error> {
        self.select_page(register).await?;
        self.spi.write(&[register & SPI_ADDR_MASK, value]).await
    }
}
