//! Health State Machine

use crate::config::HysteresisConfig;
use crate::counter::BoundedCounter;
use crate::state::{HealthState, Transition};
use telemetry::{Command, Verdict};
use tracing::{debug, info, warn};

/// Result of one step of the state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// State after the step
    pub state: HealthState,
    /// Set when the step changed state
    pub transition: Option<Transition>,
    /// Command to send to the vehicle
    pub command: Option<Command>,
}

/// Owns the sensor health state
///
/// ```text
/// Normal --fault--> Suspect --N faults--> Healing --M clean--> Recovered --1 cycle--> Normal
///                      |                     ^ fault resets M       |
///                      +--clean--> Normal                           +--fault--> Suspect
/// ```
pub struct HealthMonitor {
    config: HysteresisConfig,
    state: HealthState,
    fault_streak: BoundedCounter,
    clean_streak: BoundedCounter,
}

impl HealthMonitor {
    /// Create a new health monitor
    pub fn new(config: HysteresisConfig) -> Self {
        info!("Creating health monitor with config: {:?}", config);
        Self {
            fault_streak: BoundedCounter::new(config.suspect_confirmation),
            clean_streak: BoundedCounter::new(config.recovery_confirmation),
            config,
            state: HealthState::Normal,
        }
    }

    /// Fuse both verdicts for one sample and advance the state
    pub fn step(&mut self, rule: &Verdict, anomaly: &Verdict) -> StepOutcome {
        let faulty = match (rule, anomaly) {
            (Verdict::Normal, Verdict::Normal) => false,
            (Verdict::Fault(_), _) | (_, Verdict::Fault(_)) => true,
        };

        let from = self.state;
        let command = match (from, faulty) {
            (HealthState::Normal, false) => None,
            (HealthState::Normal, true) | (HealthState::Recovered, true) => self.suspect(),

            (HealthState::Suspect, true) => {
                if self.fault_streak.increment() {
                    self.heal()
                } else {
                    None
                }
            }
            (HealthState::Suspect, false) => {
                debug!("Suspicion cleared after {} faulty samples", self.fault_streak.count());
                self.fault_streak.reset();
                self.state = HealthState::Normal;
                None
            }

            (HealthState::Healing, true) => {
                self.clean_streak.reset();
                None
            }
            (HealthState::Healing, false) => {
                if self.clean_streak.increment() {
                    self.clean_streak.reset();
                    self.state = HealthState::Recovered;
                    Some(Command::clear_faults())
                } else {
                    None
                }
            }

            (HealthState::Recovered, false) => {
                self.state = HealthState::Normal;
                None
            }
        };

        let transition = (self.state != from).then(|| Transition {
            from,
            to: self.state,
        });
        if let Some(transition) = transition {
            match transition.to {
                HealthState::Healing => warn!("Sensor fault confirmed: {}", transition),
                _ => info!("Health transition: {}", transition),
            }
        }

        StepOutcome {
            state: self.state,
            transition,
            command,
        }
    }

    /// Current state
    pub fn state(&self) -> HealthState {
        self.state
    }

    /// Hysteresis configuration
    pub fn config(&self) -> &HysteresisConfig {
        &self.config
    }

    /// Back to `Normal` with cleared counters
    pub fn reset(&mut self) {
        self.state = HealthState::Normal;
        self.fault_streak.reset();
        self.clean_streak.reset();
    }

    // The faulty sample that raises suspicion counts towards confirmation
    fn suspect(&mut self) -> Option<Command> {
        self.fault_streak.reset();
        self.state = HealthState::Suspect;
        if self.fault_streak.increment() {
            self.heal()
        } else {
            None
        }
    }

    fn heal(&mut self) -> Option<Command> {
        self.fault_streak.reset();
        self.clean_streak.reset();
        self.state = HealthState::Healing;
        Some(Command::heal())
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new(HysteresisConfig::default())
    }
}
