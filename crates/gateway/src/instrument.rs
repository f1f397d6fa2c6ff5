//! Gateway Metrics

use crate::error::GatewayError;
use healing_engine::EngineOutput;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use telemetry::Command;
use tracing::info;

pub const SAMPLES_RECEIVED: &str = "neurodrive_samples_received_total";
pub const SAMPLES_REJECTED: &str = "neurodrive_samples_rejected_total";
pub const SAMPLES_DROPPED: &str = "neurodrive_samples_dropped_total";
pub const COMMANDS_SENT: &str = "neurodrive_commands_sent_total";
pub const COMMANDS_FAILED: &str = "neurodrive_commands_failed_total";
pub const HEALTH_STATE: &str = "neurodrive_health_state";
pub const SPEED_CORRECTION: &str = "neurodrive_speed_correction_kmh";

/// Serve metrics for Prometheus scraping
pub fn install_exporter(addr: SocketAddr) -> Result<(), GatewayError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| GatewayError::Metrics(e.to_string()))?;
    info!("Prometheus exporter listening on {}", addr);
    Ok(())
}

/// A datagram arrived on the telemetry socket
pub fn sample_received() {
    counter!(SAMPLES_RECEIVED).increment(1);
}

/// A sample was refused by the decoder or the engine
pub fn sample_rejected(reason: &'static str) {
    counter!(SAMPLES_REJECTED, "reason" => reason).increment(1);
}

/// A queue was full and the item was discarded
pub fn queue_overflow(queue: &'static str) {
    counter!(SAMPLES_DROPPED, "queue" => queue).increment(1);
}

/// Outcome of one command transmission
pub fn command_sent(command: &Command, delivered: bool) {
    let kind = command.kind().as_str();
    if delivered {
        counter!(COMMANDS_SENT, "type" => kind).increment(1);
    } else {
        counter!(COMMANDS_FAILED, "type" => kind).increment(1);
    }
}

/// Health state and applied correction for one processed sample
pub fn engine_output(output: &EngineOutput) {
    let telemetry = &output.telemetry;
    gauge!(HEALTH_STATE).set(f64::from(telemetry.state.code()));
    if telemetry.is_substituted() {
        histogram!(SPEED_CORRECTION).record((telemetry.sample.speed - telemetry.raw_speed).abs());
    }
}
