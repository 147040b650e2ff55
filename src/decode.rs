//! Frame Decoder (C1): parses raw BLE notification payloads into typed
//! readings (spec.md §4.1).
//!
//! Every payload begins with a 3-byte header (notification-id, sensor-state,
//! sensor-event) that is skipped. Never logs; always returns a typed error
//! on short input so the caller (Listener) can decide whether/how to log.

use byteorder::{ByteOrder, LittleEndian};
use dialog_ble_transport::TransportError;

use crate::model::Reading;

const HEADER_LEN: usize = 3;

/// ±8 g maps to the original's hard-coded `ACCELEROMETER_SCALE = 2048`.
/// Other ranges follow the same `32768 / (2 * range_g)` relationship implied
/// by the spec's general form, though only ±8 g is exercised by a concrete
/// test scenario (spec.md §8).
fn accelerometer_scale(range_g: u8) -> f64 {
    match range_g {
        8 => 2048.0,
        range_g if range_g > 0 => 32768.0 / (2.0 * range_g as f64),
        _ => 2048.0,
    }
}

fn gyroscope_scale(range_dps: u16) -> f64 {
    if range_dps == 0 {
        32768.0 / 2000.0
    } else {
        32768.0 / range_dps as f64
    }
}

fn require_len(data: &[u8], expected: usize) -> Result<(), TransportError> {
    if data.len() < expected {
        return Err(TransportError::MalformedFrame {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Three little-endian signed 16-bit integers, scaled by the configured
/// accelerometer range. `range_g` is the device's current `accelerometer_range`
/// config value (spec.md §4.1).
pub fn decode_accelerometer(data: &[u8], range_g: u8) -> Result<Reading, TransportError> {
    require_len(data, HEADER_LEN + 6)?;
    let body = &data[HEADER_LEN..];
    let x = LittleEndian::read_i16(&body[0..2]);
    let y = LittleEndian::read_i16(&body[2..4]);
    let z = LittleEndian::read_i16(&body[4..6]);
    let scale = accelerometer_scale(range_g);
    Ok(Reading::Accelerometer {
        x: x as f64 / scale,
        y: y as f64 / scale,
        z: z as f64 / scale,
    })
}

/// Three little-endian signed 16-bit integers, scaled by the configured
/// gyroscope range (spec.md §4.1, §6 `read_gyroscope_values`).
pub fn decode_gyroscope(data: &[u8], range_dps: u16) -> Result<Reading, TransportError> {
    require_len(data, HEADER_LEN + 6)?;
    let body = &data[HEADER_LEN..];
    let x = LittleEndian::read_i16(&body[0..2]);
    let y = LittleEndian::read_i16(&body[2..4]);
    let z = LittleEndian::read_i16(&body[4..6]);
    let scale = gyroscope_scale(range_dps);
    Ok(Reading::Gyroscope {
        x: x as f64 / scale,
        y: y as f64 / scale,
        z: z as f64 / scale,
    })
}

/// One little-endian unsigned 32-bit integer, divided by 100 to yield hPa.
/// The three-byte header is assumed identical to the accelerometer's; this
/// is unverified against the device datasheet (spec.md §9).
pub fn decode_barometer(data: &[u8]) -> Result<Reading, TransportError> {
    require_len(data, HEADER_LEN + 4)?;
    let raw = LittleEndian::read_u32(&data[HEADER_LEN..HEADER_LEN + 4]);
    Ok(Reading::Barometer { hpa: raw as f64 / 100.0 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accelerometer_decode_matches_spec_scenario() {
        let payload = [0x00, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00, 0xF0];
        let reading = decode_accelerometer(&payload, 8).unwrap();
        match reading {
            Reading::Accelerometer { x, y, z } => {
                assert!((x - 1.0).abs() < 1e-6);
                assert!((y - 0.0).abs() < 1e-6);
                assert!((z - (-2.0)).abs() < 1e-6);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn barometer_decode_matches_spec_scenario() {
        let payload = [0x00, 0x00, 0x00, 0x40, 0x9C, 0x00, 0x00];
        let reading = decode_barometer(&payload).unwrap();
        match reading {
            Reading::Barometer { hpa } => assert!((hpa - 400.00).abs() < 1e-6),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn short_payload_is_malformed_frame_not_panic() {
        let err = decode_accelerometer(&[0x00, 0x00], 8).unwrap_err();
        assert!(matches!(err, TransportError::MalformedFrame { .. }));

        let err = decode_barometer(&[0x00, 0x00]).unwrap_err();
        assert!(matches!(err, TransportError::MalformedFrame { .. }));
    }
}
