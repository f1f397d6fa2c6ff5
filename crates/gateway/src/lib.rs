//! NeuroDrive Gateway
//!
//! Connects the self-healing engine to the vehicle simulator: telemetry
//! arrives as JSON datagrams, commands leave the same way. Three tasks are
//! joined by bounded queues:
//!
//! ```text
//! UDP --> listener --samples--> pipeline (engine) --commands--> dispatcher --> UDP
//! ```

mod config;
mod dispatcher;
mod error;
mod instrument;
mod listener;
mod logging;
mod pipeline;

pub use config::{GatewayConfig, LoggingConfig, MetricsConfig, NetworkConfig, ENV_PREFIX};
pub use dispatcher::CommandDispatcher;
pub use error::GatewayError;
pub use instrument::install_exporter;
pub use listener::TelemetryListener;
pub use logging::init_logging;
pub use pipeline::{Pipeline, PipelineStats};

use healing_engine::{CorrectedTelemetry, Engine};
use std::future::Future;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Bound sockets and a ready engine
pub struct Gateway {
    listener: TelemetryListener,
    dispatcher: CommandDispatcher,
    engine: Engine,
    queue_capacity: usize,
    corrected: Option<mpsc::Sender<CorrectedTelemetry>>,
}

impl Gateway {
    /// Create the engine and bind both sockets
    pub async fn bind(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let engine = Engine::new(config.engine.clone())?;
        let listener = TelemetryListener::bind(&config.network).await?;
        let dispatcher = CommandDispatcher::bind(config.network.command_addr).await?;
        Ok(Self {
            listener,
            dispatcher,
            engine,
            queue_capacity: config.network.queue_capacity.max(1),
            corrected: None,
        })
    }

    /// Telemetry address actually bound
    pub fn telemetry_addr(&self) -> Result<SocketAddr, GatewayError> {
        self.listener.local_addr()
    }

    /// Publish corrected telemetry records to `sink`
    pub fn with_output(mut self, sink: mpsc::Sender<CorrectedTelemetry>) -> Self {
        self.corrected = Some(sink);
        self
    }

    /// Run until `shutdown` resolves or the listener fails
    pub async fn run<F>(self, shutdown: F) -> Result<PipelineStats, GatewayError>
    where
        F: Future<Output = ()>,
    {
        let (sample_tx, sample_rx) = mpsc::channel(self.queue_capacity);
        let (command_tx, command_rx) = mpsc::channel(self.queue_capacity);

        let mut pipeline = Pipeline::new(self.engine, command_tx);
        if let Some(sink) = self.corrected {
            pipeline = pipeline.with_output(sink);
        }

        let mut listener_task = tokio::spawn(self.listener.run(sample_tx));
        let pipeline_task = tokio::spawn(pipeline.run(sample_rx));
        let dispatcher_task = tokio::spawn(self.dispatcher.run(command_rx));

        let mut failure = None;
        tokio::select! {
            _ = shutdown => info!("Shutdown requested"),
            result = &mut listener_task => {
                match result {
                    Ok(Ok(())) => info!("Telemetry listener finished"),
                    Ok(Err(e)) => {
                        error!("Telemetry listener failed: {}", e);
                        failure = Some(e);
                    }
                    Err(e) => failure = Some(GatewayError::Task(e.to_string())),
                }
            }
        }

        // Dropping the listener closes the sample queue, which winds down
        // the pipeline and then the dispatcher
        listener_task.abort();
        let stats = pipeline_task
            .await
            .map_err(|e| GatewayError::Task(e.to_string()))?;
        dispatcher_task
            .await
            .map_err(|e| GatewayError::Task(e.to_string()))?;

        match failure {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }
}
