//! Supervisor (C8): owns startup order, wires the pipeline's channels
//! together, and drives graceful shutdown (spec.md §4.8).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dialog_ble_transport::session;
use tonic::transport::Server;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::aggregator::Aggregator;
use crate::broadcaster;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::grpc::{GraspVerificationServiceServer, StreamService};
use crate::queue;
use crate::scanner;

/// Startup order (spec.md §4.8): Sensor Queue, Aggregator, Scanner, RPC
/// server + Stream Service, Broadcaster. Host adapter enumeration happens
/// first and is fail-fast (spec.md §7 "if hcitool-equivalent yields no
/// adapters, Supervisor fails fast at startup") — the scanner is handed an
/// already-nonempty adapter list rather than probing for adapters itself.
pub struct Supervisor {
    config: GatewayConfig,
}

impl Supervisor {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    pub async fn run(self, cancel: Arc<AtomicBool>) -> Result<(), GatewayError> {
        let adapters = session::host_adapters()
            .await
            .map_err(|_| GatewayError::AdapterUnavailable)?;
        info!(
            count = adapters.len(),
            names = ?adapters.iter().map(|a| a.name.clone()).collect::<Vec<_>>(),
            "discovered host BLE adapters"
        );

        let (sink, receiver) = queue::channel();
        let aggregator = Aggregator::new();

        let scanner_cancel = cancel.clone();
        let scanner_handle = tokio::spawn(scanner::run(adapters, sink, scanner_cancel));

        let aggregator_cancel = cancel.clone();
        let aggregator_for_consume = aggregator.clone();
        let aggregator_handle =
            tokio::spawn(async move { aggregator_for_consume.run(receiver, aggregator_cancel).await });

        let stream_service = StreamService::new();

        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", self.config.grpc_port)
            .parse()
            .expect("constructed address is always valid");

        // Bind eagerly so a port conflict surfaces as a `GatewayError`
        // before any other worker spawns, rather than only being logged
        // from inside the server task once it's polled (spec.md §7
        // "RPC server faults: surfaced by the underlying framework").
        let bind_probe = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::BindFailed(e.to_string()))?;
        drop(bind_probe);
        info!(%addr, "starting gRPC server");

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_headers(Any)
            .allow_methods(Any)
            .expose_headers(Any);

        let grpc_service =
            tonic_web::enable(GraspVerificationServiceServer::new(stream_service.clone()));

        let server_cancel = cancel.clone();
        let server_handle = tokio::spawn(async move {
            let server = Server::builder()
                .accept_http1(true)
                .layer(cors)
                .add_service(grpc_service)
                .serve(addr);

            tokio::select! {
                result = server => {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "gRPC server exited with error");
                    }
                }
                _ = wait_for_cancel(server_cancel) => {}
            }
        });

        broadcaster::run(
            aggregator,
            stream_service,
            self.config.aggregate_period,
            cancel.clone(),
        )
        .await;

        let _ = scanner_handle.await;
        let _ = aggregator_handle.await;
        let _ = server_handle.await;

        Ok(())
    }
}

async fn wait_for_cancel(cancel: Arc<AtomicBool>) {
    while !cancel.load(Ordering::Relaxed) {
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    }
}
