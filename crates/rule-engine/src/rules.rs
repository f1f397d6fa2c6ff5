//! Rule Evaluation

use crate::config::RuleConfig;
use telemetry::{RuleKind, TelemetrySample, Verdict};
use tracing::{debug, info};

/// Symbolic rule engine
///
/// Rules run in fixed priority order and the first match wins:
/// physics paradox, frozen signal, sudden stop. The only state kept is the
/// length of the current run of identical speed readings.
pub struct RuleEngine {
    config: RuleConfig,
    frozen_streak: u32,
}

impl RuleEngine {
    /// Create a new rule engine
    pub fn new(config: RuleConfig) -> Self {
        info!("Creating rule engine with config: {:?}", config);
        Self {
            config,
            frozen_streak: 0,
        }
    }

    /// Evaluate `current` against the previous accepted sample
    pub fn evaluate(
        &mut self,
        current: &TelemetrySample,
        previous: Option<&TelemetrySample>,
    ) -> Verdict {
        self.update_streak(current, previous);

        let verdict = if self.is_paradox(current) {
            Verdict::rule(RuleKind::PhysicsParadox)
        } else if self.frozen_streak > self.config.freeze_window {
            Verdict::rule(RuleKind::FrozenSignal)
        } else if self.is_sudden_stop(current, previous) {
            Verdict::rule(RuleKind::SuddenStop)
        } else {
            Verdict::Normal
        };

        if verdict.is_fault() {
            debug!(
                "Rule violation at t={:.3}: {:?} (speed={:.1}, vib={:.3})",
                current.timestamp, verdict, current.speed, current.vibration
            );
        }
        verdict
    }

    /// Length of the current identical-speed run
    pub fn frozen_streak(&self) -> u32 {
        self.frozen_streak
    }

    /// Rule configuration
    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Forget the identical-speed run
    pub fn reset(&mut self) {
        self.frozen_streak = 0;
    }

    fn update_streak(&mut self, current: &TelemetrySample, previous: Option<&TelemetrySample>) {
        let repeated = previous.is_some_and(|prev| prev.speed == current.speed);
        if repeated && current.vibration > self.config.frozen_min_vibration {
            self.frozen_streak = self.frozen_streak.saturating_add(1);
        } else {
            self.frozen_streak = 0;
        }
    }

    // Stopped but vibrating
    fn is_paradox(&self, sample: &TelemetrySample) -> bool {
        sample.speed < self.config.paradox_speed && sample.vibration > self.config.vibration_threshold
    }

    fn is_sudden_stop(&self, current: &TelemetrySample, previous: Option<&TelemetrySample>) -> bool {
        match (self.config.sudden_stop_from, previous) {
            (Some(from), Some(prev)) => prev.speed > from && current.speed < self.config.paradox_speed,
            _ => false,
        }
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(RuleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample(t: f64, speed: f64, vibration: f64) -> TelemetrySample {
        TelemetrySample::new(t, speed, vibration, 0.5)
    }

    #[test]
    fn test_physics_paradox() {
        let mut engine = RuleEngine::default();
        let verdict = engine.evaluate(&sample(0.0, 0.0, 0.05), None);
        assert_eq!(verdict, Verdict::rule(RuleKind::PhysicsParadox));
    }

    #[test]
    fn test_stopped_and_quiet_is_normal() {
        let mut engine = RuleEngine::default();
        assert_eq!(engine.evaluate(&sample(0.0, 0.0, 0.01), None), Verdict::Normal);
        assert_eq!(engine.evaluate(&sample(0.0, 0.5, 0.02), None), Verdict::Normal);
    }

    #[test]
    fn test_frozen_signal_after_window() {
        let config = RuleConfig {
            freeze_window: 3,
            ..Default::default()
        };
        let mut engine = RuleEngine::new(config);
        let mut previous = sample(0.0, 42.0, 0.04);
        engine.evaluate(&previous, None);

        let mut verdicts = Vec::new();
        for i in 1..=4 {
            let current = sample(i as f64, 42.0, 0.04);
            verdicts.push(engine.evaluate(&current, Some(&previous)));
            previous = current;
        }

        assert_eq!(verdicts[..3], [Verdict::Normal, Verdict::Normal, Verdict::Normal]);
        assert_eq!(verdicts[3], Verdict::rule(RuleKind::FrozenSignal));
    }

    #[test]
    fn test_frozen_streak_resets_on_change() {
        let config = RuleConfig {
            freeze_window: 2,
            ..Default::default()
        };
        let mut engine = RuleEngine::new(config);
        let a = sample(0.0, 42.0, 0.04);
        let b = sample(1.0, 42.0, 0.04);
        let c = sample(2.0, 42.5, 0.04);

        engine.evaluate(&b, Some(&a));
        assert_eq!(engine.frozen_streak(), 1);
        engine.evaluate(&c, Some(&b));
        assert_eq!(engine.frozen_streak(), 0);
    }

    #[test]
    fn test_parked_vehicle_is_not_frozen() {
        let mut engine = RuleEngine::default();
        let mut previous = sample(0.0, 0.0, 0.0);
        for i in 1..50 {
            let current = sample(i as f64, 0.0, 0.0);
            assert_eq!(engine.evaluate(&current, Some(&previous)), Verdict::Normal);
            previous = current;
        }
    }

    #[test]
    fn test_paradox_wins_over_frozen() {
        let config = RuleConfig {
            freeze_window: 0,
            ..Default::default()
        };
        let mut engine = RuleEngine::new(config);
        let a = sample(0.0, 0.0, 0.05);
        let b = sample(1.0, 0.0, 0.05);
        engine.evaluate(&a, None);
        assert_eq!(
            engine.evaluate(&b, Some(&a)),
            Verdict::rule(RuleKind::PhysicsParadox)
        );
    }

    #[test]
    fn test_sudden_stop_only_when_enabled() {
        let prev = sample(0.0, 50.0, 0.01);
        let curr = sample(0.1, 0.0, 0.01);

        let mut default_engine = RuleEngine::default();
        assert_eq!(default_engine.evaluate(&curr, Some(&prev)), Verdict::Normal);

        let mut strict_engine = RuleEngine::new(RuleConfig::strict());
        assert_eq!(
            strict_engine.evaluate(&curr, Some(&prev)),
            Verdict::rule(RuleKind::SuddenStop)
        );
    }

    proptest! {
        #[test]
        fn moving_vehicle_with_changing_speed_is_normal(
            speeds in prop::collection::vec(1.0f64..200.0, 2..50),
            vibration in 0.0f64..1.0,
        ) {
            let mut engine = RuleEngine::default();
            let mut previous: Option<TelemetrySample> = None;
            for (i, speed) in speeds.iter().enumerate() {
                // Nudge to keep consecutive readings distinct
                let current = sample(i as f64, speed + (i as f64) * 1e-6, vibration);
                prop_assert_eq!(engine.evaluate(&current, previous.as_ref()), Verdict::Normal);
                previous = Some(current);
            }
        }
    }
}
