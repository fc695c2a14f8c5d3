//! Floating-point compensation formulas from the BME680 datasheet.
//!
//! Pressure and humidity depend on the fine temperature produced by
//! [`temperature`]. It is handed back as a [`FineTemperature`] token that only
//! [`temperature`] can create, so the compensation order is checked by the type
//! system instead of by convention.

use super::calibration::Calibration;

/// Gas range correction tables, indexed by the 4-bit gas range.
static GAS_RANGE_K1: [f32; 16] = [
    0.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, -0.8, 0.0, 0.0, -0.2, -0.5, 0.0, -1.0, 0.0, 0.0,
];
static GAS_RANGE_K2: [f32; 16] = [
    0.0, 0.0, 0.0, 0.0, 0.1, 0.7, 0.0, -0.8, -0.1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

/// Intermediate temperature term shared by the pressure and humidity formulas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FineTemperature(pub(crate) f32);

impl FineTemperature {
    pub fn value(self) -> f32 {
        self.0
    }

    pub fn celsius(self) -> f32 {
        self.0 / 5120.0
    }
}

/// Compensated temperature in °C, together with the fine temperature for the
/// rest of the cycle.
pub fn temperature(temp_adc: u32, cal: &Calibration) -> (f32, FineTemperature) {
    let adc = temp_adc as f32;
    let t1 = cal.par_t1 as f32;

    let var1 = (adc / 16384.0 - t1 / 1024.0) * cal.par_t2 as f32;
    let delta = adc / 131072.0 - t1 / 8192.0;
    let var2 = delta * delta * (cal.par_t3 as f32 * 16.0);

    let fine = FineTemperature(var1 + var2);
    (fine.celsius(), fine)
}

/// Compensated pressure in hPa.
///
/// Returns exactly `0.0` when the denominator term truncates to zero.
pub fn pressure(press_adc: u32, fine: FineTemperature, cal: &Calibration) -> f32 {
    let mut var1 = fine.0 / 2.0 - 64000.0;
    let mut var2 = var1 * var1 * (cal.par_p6 as f32 / 131072.0);
    var2 += var1 * cal.par_p5 as f32 * 2.0;
    var2 = var2 / 4.0 + cal.par_p4 as f32 * 65536.0;
    var1 = (cal.par_p3 as f32 * var1 * var1 / 16384.0 + cal.par_p2 as f32 * var1) / 524288.0;
    var1 = (1.0 + var1 / 32768.0) * cal.par_p1 as f32;

    if var1 as i32 == 0 {
        return 0.0;
    }

    let mut calc = 1048576.0 - press_adc as f32;
    calc = (calc - var2 / 4096.0) * 6250.0 / var1;
    let var1 = cal.par_p9 as f32 * calc * calc / 2147483648.0;
    let var2 = calc * (cal.par_p8 as f32 / 32768.0);
    let scaled = calc / 256.0;
    let var3 = scaled * scaled * scaled * (cal.par_p10 as f32 / 131072.0);
    calc += (var1 + var2 + var3 + cal.par_p7 as f32 * 128.0) / 16.0;

    calc / 100.0
}

/// Compensated relative humidity in %, always within `0.0..=100.0`.
pub fn humidity(hum_adc: u16, fine: FineTemperature, cal: &Calibration) -> f32 {
    let temp = fine.celsius();

    let var1 = hum_adc as f32 - (cal.par_h1 as f32 * 16.0 + cal.par_h3 as f32 / 2.0 * temp);
    let var2 = var1
        * (cal.par_h2 as f32 / 262144.0
            * (1.0
                + cal.par_h4 as f32 / 16384.0 * temp
                + cal.par_h5 as f32 / 1048576.0 * temp * temp));
    let var3 = cal.par_h6 as f32 / 16384.0;
    let var4 = cal.par_h7 as f32 / 2097152.0;
    let calc = var2 + (var3 + var4 * temp) * var2 * var2;

    // max/min instead of clamp: a NaN collapses to 0 rather than escaping
    calc.max(0.0).min(100.0)
}

/// Gas resistance in Ω.
pub fn gas_resistance(gas_adc: u16, gas_range: u8, cal: &Calibration) -> f32 {
    let range = (gas_range & 0x0F) as usize;

    let var1 = 1340.0 + 5.0 * cal.range_sw_err as f32;
    let var2 = var1 * (1.0 + GAS_RANGE_K1[range] / 100.0);
    let var3 = 1.0 + GAS_RANGE_K2[range] / 100.0;

    1.0 / (var3 * 0.000000125 * (1u32 << range) as f32 * ((gas_adc as f32 - 512.0) / var2 + 1.0))
}

/// Barometric altitude in metres for `pressure` against a sea-level reference,
/// both in hPa.
pub fn altitude(pressure: f32, sea_level_pressure: f32) -> f32 {
    44330.0 * (1.0 - libm::powf(pressure / sea_level_pressure, 0.1903))
}
