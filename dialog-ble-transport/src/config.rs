//! Device sensor configuration overlay (spec.md §4.3 step 2, §6).
//!
//! Recognized fields mirror the FoshWrapper-equivalent config dict:
//! `sensor_combination`, `accelerometer_rate`, `accelerometer_range`,
//! `gyroscope_range`. Values are the raw wire codes the device expects,
//! not engineering units.

/// `SENSOR_COMBINATION`: accelerometer + gyroscope enabled.
pub const SENSOR_COMBINATION_ACCEL_GYRO: u8 = 3;

/// `accelerometer_rate`: 100 Hz.
pub const ACCELEROMETER_RATE_100HZ: u8 = 0x08;

/// `ACCELEROMETER_RANGE`: ±8 g.
pub const ACCELEROMETER_RANGE_8G: u8 = 0x08;

/// `GYROSCOPE_RANGE`: 2000 °/s.
pub const GYROSCOPE_RANGE_2000DPS: u8 = 0x08;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorConfig {
    pub sensor_combination: u8,
    pub accelerometer_rate: u8,
    pub accelerometer_range: u8,
    pub gyroscope_range: u8,
}

impl SensorConfig {
    /// The overlay every Listener applies at connect time (spec.md §4.3 step 2).
    pub const DESIRED: SensorConfig = SensorConfig {
        sensor_combination: SENSOR_COMBINATION_ACCEL_GYRO,
        accelerometer_rate: ACCELEROMETER_RATE_100HZ,
        accelerometer_range: ACCELEROMETER_RANGE_8G,
        gyroscope_range: GYROSCOPE_RANGE_2000DPS,
    };
}

/// Maps the device's wire-level `gyroscope_range` config byte to the
/// engineering-units full-scale range in degrees/s the gateway's frame
/// decoder expects as its scaling divisor. The only value this gateway ever
/// configures is
/// `GYROSCOPE_RANGE_2000DPS`, so this is a one-entry table rather than a
/// general decoder; an unrecognized code falls back to 2000 dps too, since
/// no other overlay is ever written (spec.md §4.3 step 2: config is fixed at
/// connect time).
pub fn gyroscope_range_dps(range_code: u8) -> u16 {
    match range_code {
        GYROSCOPE_RANGE_2000DPS => 2000,
        _ => 2000,
    }
}
