use super::registers;
use crate::transport::{Error, RegisterTransport};

/// Factory calibration coefficients, unique to every chip.
///
/// The byte offsets below index the concatenation of the two coefficient blocks
/// (25 bytes from 0x89, 16 bytes from 0xE1). Pairs are little-endian except for
/// the humidity terms, which share a nibble in byte 26.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    pub par_t1: u16,
    pub par_t2: i16,
    pub par_t3: i8,
    pub par_p1: u16,
    pub par_p2: i16,
    pub par_p3: i8,
    pub par_p4: i16,
    pub par_p5: i16,
    pub par_p6: i8,
    pub par_p7: i8,
    pub par_p8: i16,
    pub par_p9: i16,
    pub par_p10: i8,
    pub par_h1: u16,
    pub par_h2: u16,
    pub par_h3: i8,
    pub par_h4: i8,
    pub par_h5: i8,
    pub par_h6: u8,
    pub par_h7: i8,
    pub par_g1: i8,
    pub par_g2: i16,
    pub par_g3: i8,
    /// Heater resistance range, 2 bits.
    pub res_heat_range: u8,
    pub res_heat_val: i8,
    /// Gas range switching error, signed 4 bits.
    pub range_sw_err: i8,
}

fn pair(lsb: u8, msb: u8) -> u16 {
    u16::from_le_bytes([lsb, msb])
}

impl Calibration {
    /// Decodes the coefficient dump and the three heater trim registers.
    pub fn from_registers(
        coeff: &[u8; registers::COEFF_LEN],
        res_heat_val: u8,
        res_heat_range: u8,
        range_sw_err: u8,
    ) -> Self {
        Self {
            par_t1: pair(coeff[33], coeff[34]),
            par_t2: pair(coeff[1], coeff[2]) as i16,
            par_t3: coeff[3] as i8,
            par_p1: pair(coeff[5], coeff[6]),
            par_p2: pair(coeff[7], coeff[8]) as i16,
            par_p3: coeff[9] as i8,
            par_p4: pair(coeff[11], coeff[12]) as i16,
            par_p5: pair(coeff[13], coeff[14]) as i16,
            par_p6: coeff[16] as i8,
            par_p7: coeff[15] as i8,
            par_p8: pair(coeff[19], coeff[20]) as i16,
            par_p9: pair(coeff[21], coeff[22]) as i16,
            par_p10: coeff[23] as i8,
            par_h1: ((coeff[27] as u16) << 4) | (coeff[26] & 0x0F) as u16,
            par_h2: ((coeff[25] as u16) << 4) | (coeff[26] >> 4) as u16,
            par_h3: coeff[28] as i8,
            par_h4: coeff[29] as i8,
            par_h5: coeff[30] as i8,
            par_h6: coeff[31],
            par_h7: coeff[32] as i8,
            par_g1: coeff[37] as i8,
            par_g2: pair(coeff[35], coeff[36]) as i16,
            par_g3: coeff[38] as i8,
            res_heat_range: (res_heat_range & 0x30) >> 4,
            res_heat_val: res_heat_val as i8,
            // arithmetic shift keeps the sign of the upper nibble
            range_sw_err: ((range_sw_err & 0xF0) as i8) >> 4,
        }
    }

    /// Reads both coefficient blocks and the heater trim registers.
    pub async fn load<T: RegisterTransport>(transport: &mut T) -> Result<Self, Error<T::Error>> {
        let mut coeff = [0u8; registers::COEFF_LEN];
        let (first, second) = coeff.split_at_mut(registers::COEFF_BLOCK_1_LEN);
        transport
            .read_burst(registers::COEFF_BLOCK_1, first)
            .await?;
        transport
            .read_burst(registers::COEFF_BLOCK_2, second)
            .await?;

        let res_heat_val = transport.read_register(registers::RES_HEAT_VAL).await?;
        let res_heat_range = transport.read_register(registers::RES_HEAT_RANGE).await?;
        let range_sw_err = transport.read_register(registers::RANGE_SW_ERR).await?;

        let calibration =
            Self::from_registers(&coeff, res_heat_val, res_heat_range, range_sw_err);
        debug!(
            "calibration loaded: t1={} p1={} h1={} g1={}",
            calibration.par_t1,
            calibration.par_p1,
            calibration.par_h1,
            calibration.par_g1
        );
        Ok(calibration)
    }
}
