//! GATT service/characteristic identifiers for the Dialog IoT-DK-SFL tag.
//!
//! The vendor datasheet is not part of this repository's retrieval set;
//! these UUIDs follow Dialog's documented custom-profile convention
//! (a 128-bit base UUID with a per-characteristic 16-bit offset) and are
//! placeholders pending verification against real hardware, same caveat
//! the spec already carries for the barometer header length.

use uuid::{uuid, Uuid};

pub const SENSOR_SERVICE: Uuid = uuid!("0000fef0-8e22-4541-9d4c-21edae82ed19");

pub const CONFIG_CHARACTERISTIC: Uuid = uuid!("0000fef1-8e22-4541-9d4c-21edae82ed19");
pub const CONTROL_CHARACTERISTIC: Uuid = uuid!("0000fef2-8e22-4541-9d4c-21edae82ed19");

pub const ACCELEROMETER_CHARACTERISTIC: Uuid = uuid!("0000fef3-8e22-4541-9d4c-21edae82ed19");
pub const GYROSCOPE_CHARACTERISTIC: Uuid = uuid!("0000fef4-8e22-4541-9d4c-21edae82ed19");
pub const BAROMETER_CHARACTERISTIC: Uuid = uuid!("0000fef5-8e22-4541-9d4c-21edae82ed19");
