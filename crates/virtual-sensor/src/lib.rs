//! Virtual Speed Sensor
//!
//! Estimates true wheel speed from signals that do not pass through the
//! wheel-speed sensor: the commanded throttle and the chassis vibration.
//! Parameters come from the calibration baseline, so the estimate is tuned
//! to the vehicle and session rather than to a global constant.

mod estimator;

pub use estimator::{
    Estimate, EstimateError, EstimateSource, EstimatorConfig, EstimatorParams, VirtualSensor,
};
