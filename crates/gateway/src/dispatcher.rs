//! Command Dispatcher

use crate::error::GatewayError;
use crate::instrument;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use telemetry::Command;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Delivers commands to the vehicle's command port
///
/// Delivery is best effort: a failed send is logged and never retried.
pub struct CommandDispatcher {
    socket: UdpSocket,
    target: SocketAddr,
}

impl CommandDispatcher {
    /// Bind an ephemeral socket for sending to `target`
    pub async fn bind(target: SocketAddr) -> Result<Self, GatewayError> {
        let local = match target {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        };
        let socket = UdpSocket::bind(local).await?;
        info!("Sending commands to {}", target);
        Ok(Self { socket, target })
    }

    /// Send one command
    pub async fn send(&self, command: &Command) -> Result<(), GatewayError> {
        let payload = command.encode()?;
        self.socket.send_to(&payload, self.target).await?;
        Ok(())
    }

    /// Drain the command queue until every sender is gone
    pub async fn run(self, mut commands: mpsc::Receiver<Command>) {
        while let Some(command) = commands.recv().await {
            match self.send(&command).await {
                Ok(()) => {
                    info!("Sent {} ({:?})", command.kind().as_str(), command);
                    instrument::command_sent(&command, true);
                }
                Err(e) => {
                    warn!("Failed to send {}: {}", command.kind().as_str(), e);
                    instrument::command_sent(&command, false);
                }
            }
        }
        debug!("Command dispatcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_send_heal() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let dispatcher = CommandDispatcher::bind(receiver.local_addr().unwrap())
            .await
            .unwrap();

        dispatcher.send(&Command::heal()).await.unwrap();

        let mut buf = [0u8; 256];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), receiver.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(Command::decode(&buf[..len]).unwrap(), Command::heal());
    }

    #[tokio::test]
    async fn test_run_stops_when_senders_dropped() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let dispatcher = CommandDispatcher::bind(receiver.local_addr().unwrap())
            .await
            .unwrap();
        let (tx, rx) = mpsc::channel(4);
        tx.send(Command::clear_faults()).await.unwrap();
        drop(tx);

        tokio::time::timeout(Duration::from_secs(2), dispatcher.run(rx))
            .await
            .unwrap();

        let mut buf = [0u8; 256];
        let (len, _) = receiver.recv_from(&mut buf).await.unwrap();
        assert_eq!(Command::decode(&buf[..len]).unwrap(), Command::clear_faults());
    }
}
