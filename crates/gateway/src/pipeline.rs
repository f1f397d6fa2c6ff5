//! Engine Task

use crate::instrument;
use healing_engine::{CorrectedTelemetry, Engine, EngineError};
use telemetry::{Command, TelemetrySample};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

/// Counters reported when the pipeline stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub processed: u64,
    pub rejected: u64,
    pub commands: u64,
}

/// Feeds queued samples through the engine one at a time
pub struct Pipeline {
    engine: Engine,
    commands: mpsc::Sender<Command>,
    corrected: Option<mpsc::Sender<CorrectedTelemetry>>,
    stats: PipelineStats,
}

impl Pipeline {
    /// Create a pipeline that forwards engine commands to `commands`
    pub fn new(engine: Engine, commands: mpsc::Sender<Command>) -> Self {
        Self {
            engine,
            commands,
            corrected: None,
            stats: PipelineStats::default(),
        }
    }

    /// Also publish every corrected telemetry record
    pub fn with_output(mut self, corrected: mpsc::Sender<CorrectedTelemetry>) -> Self {
        self.corrected = Some(corrected);
        self
    }

    /// Process samples until the listener goes away
    pub async fn run(mut self, mut samples: mpsc::Receiver<TelemetrySample>) -> PipelineStats {
        info!("Starting engine pipeline");
        while let Some(sample) = samples.recv().await {
            self.handle(sample);
        }
        info!(
            "Engine pipeline stopped: {} processed, {} rejected, {} commands",
            self.stats.processed, self.stats.rejected, self.stats.commands
        );
        self.stats
    }

    fn handle(&mut self, sample: TelemetrySample) {
        let output = match self.engine.process(sample) {
            Ok(output) => output,
            Err(e) => {
                self.stats.rejected += 1;
                instrument::sample_rejected(match e {
                    EngineError::OutOfOrderSample { .. } => "out_of_order",
                    _ => "malformed",
                });
                return;
            }
        };
        self.stats.processed += 1;
        instrument::engine_output(&output);

        if let Some(command) = output.command {
            self.stats.commands += 1;
            // Fire and forget
            match self.commands.try_send(command) {
                Ok(()) => {}
                Err(TrySendError::Full(command)) => {
                    warn!("Command queue full, dropping {}", command.kind().as_str());
                    instrument::queue_overflow("commands");
                }
                Err(TrySendError::Closed(command)) => {
                    warn!("Command dispatcher gone, dropping {}", command.kind().as_str());
                }
            }
        }

        if let Some(corrected) = &self.corrected {
            if let Err(TrySendError::Full(_)) = corrected.try_send(output.telemetry) {
                debug!("Corrected telemetry consumer lagging");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use healing_engine::{EngineConfig, HealthState};

    #[tokio::test]
    async fn test_paradox_emits_heal() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let (command_tx, mut command_rx) = mpsc::channel(8);
        let (out_tx, mut out_rx) = mpsc::channel(8);
        let (sample_tx, sample_rx) = mpsc::channel(8);
        let pipeline = Pipeline::new(engine, command_tx).with_output(out_tx);

        sample_tx.send(TelemetrySample::new(0.0, 50.0, 0.05, 0.6)).await.unwrap();
        sample_tx.send(TelemetrySample::new(0.1, 0.0, 0.05, 0.6)).await.unwrap();
        sample_tx.send(TelemetrySample::new(0.2, 0.0, 0.05, 0.6)).await.unwrap();
        sample_tx.send(TelemetrySample::new(0.2, 0.0, 0.05, 0.6)).await.unwrap();
        drop(sample_tx);

        let stats = pipeline.run(sample_rx).await;
        assert_eq!(
            stats,
            PipelineStats {
                processed: 3,
                rejected: 1,
                commands: 1
            }
        );
        assert_eq!(command_rx.recv().await, Some(Command::heal()));

        let mut states = Vec::new();
        while let Ok(record) = out_rx.try_recv() {
            states.push(record.state);
        }
        assert_eq!(
            states,
            vec![HealthState::Normal, HealthState::Suspect, HealthState::Healing]
        );
    }
}
