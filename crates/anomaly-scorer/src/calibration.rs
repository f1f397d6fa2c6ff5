//! Calibration Window

use crate::error::ScorerError;
use serde::{Deserialize, Serialize};
use telemetry::TelemetrySample;
use tracing::{debug, info, warn};

/// Calibration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Length of the calibration window (seconds of sample time)
    pub duration_secs: f64,
    /// Fewest trusted samples that make a usable baseline
    pub min_samples: usize,
    /// Samples slower than this teach nothing about the speed/vibration relation (km/h)
    pub min_speed: f64,
    /// Hard cap on buffered samples
    pub max_samples: usize,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            duration_secs: 10.0,
            min_samples: 30,
            min_speed: 1.0,
            max_samples: 5000,
        }
    }
}

/// Progress of the calibration window
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationStatus {
    /// Window still open
    Collecting { remaining_secs: f64, collected: usize },
    /// Window closed with enough samples; the buffer has been emptied
    Ready(Vec<TelemetrySample>),
}

/// Accumulates trusted samples over a fixed window of sample time
///
/// The window opens on the first sample seen after construction or
/// [`CalibrationBuffer::restart`]. When it closes the buffer hands back its
/// samples (or reports `InsufficientData`) and starts over empty.
pub struct CalibrationBuffer {
    config: CalibrationConfig,
    samples: Vec<TelemetrySample>,
    window_start: Option<f64>,
}

impl CalibrationBuffer {
    /// Create a new calibration buffer
    pub fn new(config: CalibrationConfig) -> Self {
        info!(
            "Creating calibration buffer: {:.1}s window, min {} samples",
            config.duration_secs, config.min_samples
        );
        Self {
            config,
            samples: Vec::new(),
            window_start: None,
        }
    }

    /// Record a trusted sample
    pub fn record(&mut self, sample: &TelemetrySample) -> Result<CalibrationStatus, ScorerError> {
        self.advance(sample, true)
    }

    /// Advance the window clock with a sample that must not enter the baseline
    pub fn observe(&mut self, sample: &TelemetrySample) -> Result<CalibrationStatus, ScorerError> {
        self.advance(sample, false)
    }

    /// Discard collected samples and reopen the window on the next sample
    pub fn restart(&mut self) {
        debug!("Calibration window restarted");
        self.samples.clear();
        self.window_start = None;
    }

    /// Number of samples collected in the open window
    pub fn collected(&self) -> usize {
        self.samples.len()
    }

    /// Calibration configuration
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    fn advance(
        &mut self,
        sample: &TelemetrySample,
        trusted: bool,
    ) -> Result<CalibrationStatus, ScorerError> {
        let start = *self.window_start.get_or_insert(sample.timestamp);

        if trusted
            && sample.speed >= self.config.min_speed
            && self.samples.len() < self.config.max_samples
        {
            self.samples.push(*sample);
        }

        let elapsed = sample.timestamp - start;
        if elapsed < self.config.duration_secs {
            return Ok(CalibrationStatus::Collecting {
                remaining_secs: self.config.duration_secs - elapsed,
                collected: self.samples.len(),
            });
        }

        let collected = std::mem::take(&mut self.samples);
        self.window_start = None;

        if collected.len() < self.config.min_samples {
            warn!(
                "Calibration window closed with {} samples ({} required), restarting",
                collected.len(),
                self.config.min_samples
            );
            return Err(ScorerError::InsufficientData(format!(
                "{} samples collected, {} required",
                collected.len(),
                self.config.min_samples
            )));
        }

        info!("Calibration window closed with {} samples", collected.len());
        Ok(CalibrationStatus::Ready(collected))
    }
}

impl Default for CalibrationBuffer {
    fn default() -> Self {
        Self::new(CalibrationConfig::default())
    }
}
