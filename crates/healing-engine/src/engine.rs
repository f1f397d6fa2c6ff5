//! Per-Sample Fault Detection Pipeline

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::output::{CalibrationProgress, CorrectedTelemetry, EngineOutput, Verdicts};
use anomaly_scorer::{AnomalyScorer, CalibrationBaseline, CalibrationBuffer, CalibrationStatus};
use health_monitor::{HealthMonitor, HealthState};
use rule_engine::RuleEngine;
use telemetry::{SlidingWindow, TelemetrySample};
use tracing::{debug, info, warn};
use virtual_sensor::{EstimatorParams, VirtualSensor};

/// Fault detection and self-healing engine for one telemetry stream
pub struct Engine {
    rules: RuleEngine,
    calibration: CalibrationBuffer,
    progress: CalibrationProgress,
    scorer: AnomalyScorer,
    sensor: VirtualSensor,
    params: Option<EstimatorParams>,
    monitor: HealthMonitor,
    previous: Option<TelemetrySample>,
    trusted_speeds: SlidingWindow<f64>,
    samples_processed: u64,
}

impl Engine {
    /// Create a new engine
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        info!("Creating healing engine with config: {:?}", config);
        Ok(Self {
            rules: RuleEngine::new(config.rules),
            progress: collecting(config.calibration.duration_secs),
            calibration: CalibrationBuffer::new(config.calibration),
            scorer: AnomalyScorer::new(config.scorer)?,
            sensor: VirtualSensor::new(config.estimator),
            params: None,
            monitor: HealthMonitor::new(config.hysteresis),
            previous: None,
            trusted_speeds: SlidingWindow::new(config.history_len),
            samples_processed: 0,
        })
    }

    /// Process one sample to completion
    ///
    /// Rejected samples leave every piece of engine state untouched.
    pub fn process(&mut self, sample: TelemetrySample) -> Result<EngineOutput, EngineError> {
        if let Err(e) = sample.validate() {
            warn!("Dropping malformed sample: {}", e);
            return Err(EngineError::MalformedInput(e.to_string()));
        }
        if let Some(previous) = &self.previous {
            if sample.timestamp <= previous.timestamp {
                warn!(
                    "Dropping out-of-order sample: t={} after t={}",
                    sample.timestamp, previous.timestamp
                );
                return Err(EngineError::OutOfOrderSample {
                    timestamp: sample.timestamp,
                    previous: previous.timestamp,
                });
            }
        }

        let rule = self.rules.evaluate(&sample, self.previous.as_ref());
        if !self.scorer.is_fitted() {
            self.calibrate(&sample, !rule.is_fault());
        }
        let anomaly = self.scorer.score(&sample);
        let verdicts = Verdicts { rule, anomaly };

        let step = self.monitor.step(&verdicts.rule, &verdicts.anomaly);

        let estimate = step.state.uses_estimate().then(|| {
            self.sensor.estimate(
                self.params.as_ref(),
                sample.throttle_command,
                sample.vibration,
                &self.trusted_speeds.to_vec(),
            )
        });

        if verdicts.is_clean() {
            self.trusted_speeds.push(sample.speed);
        }
        self.previous = Some(sample);
        self.samples_processed += 1;

        let corrected = match estimate {
            Some(estimate) => sample.with_speed(estimate.speed),
            None => sample,
        };
        if let Some(estimate) = &estimate {
            debug!(
                "t={:.3}: raw speed {:.2} replaced by {:.2} ({:?})",
                sample.timestamp, sample.speed, estimate.speed, estimate.source
            );
        }

        Ok(EngineOutput {
            telemetry: CorrectedTelemetry {
                sample: corrected,
                raw_speed: sample.speed,
                state: step.state,
                verdicts,
                estimate,
                calibration: self.progress,
            },
            transition: step.transition,
            command: step.command,
        })
    }

    /// Discard the baseline and learn a new one from the next samples
    ///
    /// Health state and rule history are kept.
    pub fn recalibrate(&mut self) {
        info!("Recalibration requested");
        self.scorer.reset();
        self.params = None;
        self.calibration.restart();
        self.progress = collecting(self.calibration.config().duration_secs);
    }

    /// Return to the state of a freshly created engine
    pub fn reset(&mut self) {
        info!("Engine reset after {} samples", self.samples_processed);
        self.recalibrate();
        self.rules.reset();
        self.monitor.reset();
        self.previous = None;
        self.trusted_speeds.clear();
        self.samples_processed = 0;
    }

    /// Current health state
    pub fn state(&self) -> HealthState {
        self.monitor.state()
    }

    /// Calibration progress
    pub fn calibration(&self) -> CalibrationProgress {
        self.progress
    }

    /// Whether the statistical detector is active
    pub fn is_calibrated(&self) -> bool {
        self.scorer.is_fitted()
    }

    /// Current calibration baseline
    pub fn baseline(&self) -> Option<&CalibrationBaseline> {
        self.scorer.baseline()
    }

    /// Samples accepted since creation or reset
    pub fn samples_processed(&self) -> u64 {
        self.samples_processed
    }

    fn calibrate(&mut self, sample: &TelemetrySample, trusted: bool) {
        let window = self.calibration.config().duration_secs;
        let status = if trusted {
            self.calibration.record(sample)
        } else {
            self.calibration.observe(sample)
        };

        self.progress = match status {
            Ok(CalibrationStatus::Collecting {
                remaining_secs,
                collected,
            }) => CalibrationProgress::Collecting {
                remaining_secs,
                collected,
            },
            Ok(CalibrationStatus::Ready(samples)) => match self.scorer.fit(&samples) {
                Ok(baseline) => {
                    self.params = Some(EstimatorParams::from_baseline(baseline));
                    CalibrationProgress::Calibrated {
                        sample_count: baseline.sample_count,
                    }
                }
                Err(e) => {
                    warn!("Calibration rejected ({}), collecting a new window", e);
                    collecting(window)
                }
            },
            // Window already reopened by the buffer
            Err(_) => collecting(window),
        };
    }
}

fn collecting(remaining_secs: f64) -> CalibrationProgress {
    CalibrationProgress::Collecting {
        remaining_secs,
        collected: 0,
    }
}
