//! BLE telemetry gateway for Dialog IoT sensor tags.
//!
//! Discovers tags over BLE, decodes their notification frames, aggregates
//! per-device state, and republishes it on a fixed period over gRPC server
//! streaming.

pub mod aggregator;
pub mod broadcaster;
pub mod config;
pub mod decode;
pub mod error;
pub mod grpc;
pub mod listener;
pub mod model;
pub mod queue;
pub mod scanner;
pub mod supervisor;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use supervisor::Supervisor;
