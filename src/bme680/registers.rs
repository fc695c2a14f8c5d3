// Register map, BME680 datasheet section 5.

// Calibration blocks and the heater trim registers
pub const COEFF_BLOCK_1: u8 = 0x89;
pub const COEFF_BLOCK_1_LEN: usize = 25;
pub const COEFF_BLOCK_2: u8 = 0xE1;
pub const COEFF_BLOCK_2_LEN: usize = 16;
pub const COEFF_LEN: usize = COEFF_BLOCK_1_LEN + COEFF_BLOCK_2_LEN;
pub const RES_HEAT_VAL: u8 = 0x00;
pub const RES_HEAT_RANGE: u8 = 0x02;
pub const RANGE_SW_ERR: u8 = 0x04;

// Measurement data, burst-read from meas_status_0
pub const MEAS_STATUS_0: u8 = 0x1D;
pub const FIELD_LEN: usize = 15;

// Heater set-points, one register per profile slot
pub const RES_HEAT_0: u8 = 0x5A;
pub const GAS_WAIT_0: u8 = 0x64;

// Control
pub const CTRL_GAS_1: u8 = 0x71;
pub const CTRL_HUM: u8 = 0x72;
pub const CTRL_MEAS: u8 = 0x74;
pub const CONFIG: u8 = 0x75;

// Identification and reset
pub const CHIP_ID: u8 = 0xD0;
pub const CHIP_ID_VALUE: u8 = 0x61;
pub const RESET: u8 = 0xE0;
pub const RESET_COMMAND: u8 = 0xB6;

// Bit fields
pub const NEW_DATA: u8 = 0x80;
pub const GAS_INDEX_MASK: u8 = 0x0F;
pub const GAS_VALID: u8 = 0x20;
pub const HEAT_STAB: u8 = 0x10;
pub const GAS_RANGE_MASK: u8 = 0x0F;
pub const RUN_GAS: u8 = 0x10;
pub const NB_CONV_MASK: u8 = 0x0F;
pub const MODE_MASK: u8 = 0x03;
pub const MODE_SLEEP: u8 = 0x00;
pub const MODE_FORCED: u8 = 0x01;
