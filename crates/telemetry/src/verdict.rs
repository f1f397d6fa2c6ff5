//! Detector Verdicts

use serde::{Deserialize, Serialize};

/// Symbolic rule that produced a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    /// Vehicle reports standstill while vibrating like it is moving
    PhysicsParadox,
    /// Speed reading stuck on the same value while the chassis vibrates
    FrozenSignal,
    /// Speed collapsed to zero from cruising speed within one sample
    SuddenStop,
}

impl RuleKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::PhysicsParadox => "physics_paradox",
            RuleKind::FrozenSignal => "frozen_signal",
            RuleKind::SuddenStop => "sudden_stop",
        }
    }
}

/// Why a detector flagged a sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FaultReason {
    /// Deterministic rule violated
    RuleViolation { rule: RuleKind },
    /// Score above the calibrated cutoff
    StatisticalAnomaly { score: f64, cutoff: f64 },
}

/// Result of one detector on one sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Normal,
    Fault(FaultReason),
}

impl Verdict {
    /// Shorthand for a rule violation
    pub fn rule(rule: RuleKind) -> Self {
        Verdict::Fault(FaultReason::RuleViolation { rule })
    }

    /// Shorthand for a statistical anomaly
    pub fn anomaly(score: f64, cutoff: f64) -> Self {
        Verdict::Fault(FaultReason::StatisticalAnomaly { score, cutoff })
    }

    /// Whether this verdict signals a fault
    pub fn is_fault(&self) -> bool {
        matches!(self, Verdict::Fault(_))
    }

    /// Fault reason, if any
    pub fn reason(&self) -> Option<FaultReason> {
        match self {
            Verdict::Normal => None,
            Verdict::Fault(reason) => Some(*reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_reason() {
        assert_eq!(Verdict::Normal.reason(), None);
        assert!(!Verdict::Normal.is_fault());

        let verdict = Verdict::rule(RuleKind::PhysicsParadox);
        assert!(verdict.is_fault());
        assert_eq!(
            verdict.reason(),
            Some(FaultReason::RuleViolation { rule: RuleKind::PhysicsParadox })
        );
    }

    #[test]
    fn test_verdict_serializes_tagged() {
        let json = serde_json::to_string(&Verdict::anomaly(7.5, 4.0)).unwrap();
        assert!(json.contains("\"verdict\":\"fault\""));
        assert!(json.contains("\"reason\":\"statistical_anomaly\""));
    }
}
