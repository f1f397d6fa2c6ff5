//! Telemetry Listener

use crate::config::NetworkConfig;
use crate::error::GatewayError;
use crate::instrument;
use std::net::SocketAddr;
use telemetry::{PacketDecoder, TelemetrySample};
use tokio::net::UdpSocket;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

/// Receives simulator datagrams and queues the decoded samples
pub struct TelemetryListener {
    socket: UdpSocket,
    decoder: PacketDecoder,
    max_packet_size: usize,
}

impl TelemetryListener {
    /// Bind the telemetry socket
    pub async fn bind(config: &NetworkConfig) -> Result<Self, GatewayError> {
        let socket = UdpSocket::bind(config.listen_addr).await?;
        info!("Listening for telemetry on {}", socket.local_addr()?);
        Ok(Self {
            socket,
            decoder: PacketDecoder::new(),
            max_packet_size: config.max_packet_size.max(1),
        })
    }

    /// Bound address
    pub fn local_addr(&self) -> Result<SocketAddr, GatewayError> {
        Ok(self.socket.local_addr()?)
    }

    /// Receive until the pipeline goes away
    ///
    /// Malformed packets are logged and dropped. A full queue drops the
    /// sample rather than stalling the socket.
    pub async fn run(mut self, samples: mpsc::Sender<TelemetrySample>) -> Result<(), GatewayError> {
        let mut buf = vec![0u8; self.max_packet_size];

        loop {
            let (len, peer) = self.socket.recv_from(&mut buf).await?;
            instrument::sample_received();

            let sample = match self.decoder.decode(&buf[..len]) {
                Ok(sample) => sample,
                Err(e) => {
                    warn!("Dropping packet from {}: {}", peer, e);
                    instrument::sample_rejected("malformed");
                    continue;
                }
            };

            match samples.try_send(sample) {
                Ok(()) => {}
                Err(TrySendError::Full(sample)) => {
                    warn!("Sample queue full, dropping t={}", sample.timestamp);
                    instrument::queue_overflow("samples");
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("Sample queue closed");
                    break;
                }
            }
        }

        info!("Telemetry listener stopped");
        Ok(())
    }
}
