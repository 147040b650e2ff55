//! Environment configuration (spec.md §6; expansion A3).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, warn};

/// Only addresses beginning with this prefix are accepted (spec.md §3).
pub const DIALOG_MAC_PREFIX: &str = "80:EA:CA:";

/// Listener watchdog timeout (spec.md §4.3). Hard-coded per spec.md §9:
/// "making it configurable is a likely desired extension but not part of
/// this spec."
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(5);

/// Scanner per-sweep scan window (spec.md §4.4).
pub const SCAN_TIMEOUT: Duration = Duration::from_secs(5);

/// Scanner idle time between sweeps (spec.md §4.4).
pub const SCAN_IDLE: Duration = Duration::from_secs(6);

#[derive(Debug, Clone, Copy)]
pub struct GatewayConfig {
    pub grpc_port: u16,
    pub aggregate_period: Duration,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let grpc_port = env_parse("GRPC_PORT", 5065u16);
        let aggregate_period_seconds = env_parse("AGGREGATE_PERIOD_SECONDS", 0.25f64);
        GatewayConfig {
            grpc_port,
            aggregate_period: Duration::from_secs_f64(aggregate_period_seconds),
        }
    }
}

fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(value) => {
                debug!("{}={}", name, raw);
                value
            }
            Err(_) => {
                warn!("{}={:?} is not valid, using default", name, raw);
                default
            }
        },
        Err(_) => default,
    }
}
