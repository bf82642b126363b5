use std::fmt;
use std::str::FromStr;

use nalgebra as na;
use ndarray::{s, Array1};
use serde_derive::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::math;

/// Linreg considers a vehicle parked only below this mean speed.
const PARKED_MEAN_SPEED: f32 = 2.0;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VehicleState {
    #[default]
    Unknown,
    Arriving,
    Departing,
    Moving,
    Parked,
}

impl VehicleState {
    pub fn code(&self) -> &'static str {
        match self {
            VehicleState::Arriving => "A",
            VehicleState::Departing => "D",
            VehicleState::Moving => "M",
            VehicleState::Parked => "P",
            VehicleState::Unknown => "N/A",
        }
    }
}

impl fmt::Display for VehicleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMethod {
    Simple,
    #[default]
    Linreg,
}

impl AnalysisMethod {
    pub fn policy(&self, config: &Config) -> Box<dyn TrendPolicy> {
        match self {
            AnalysisMethod::Simple => Box::new(Simple::from(config)),
            AnalysisMethod::Linreg => Box::new(LinReg::from(config)),
        }
    }
}

impl FromStr for AnalysisMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(AnalysisMethod::Simple),
            "linreg" => Ok(AnalysisMethod::Linreg),
            other => Err(Error::InvalidConfig {
                field: "analysis_method",
                reason: format!("unknown method `{}`, expected `simple` or `linreg`", other),
            }),
        }
    }
}

impl fmt::Display for AnalysisMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMethod::Simple => f.write_str("simple"),
            AnalysisMethod::Linreg => f.write_str("linreg"),
        }
    }
}

/// Maps a window of speed samples (oldest first) to a vehicle state.
///
/// Implementations may assume the window already passed the minimum
/// history check in [`TrendClassifier`].
pub trait TrendPolicy: fmt::Debug {
    fn analyze(&self, speeds: &[f32]) -> VehicleState;
}

/// Speed-vs-index regression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinReg {
    pub slope_threshold: f32,
    pub speed_threshold: f32,
    pub correlation_threshold: f32,
}

impl From<&Config> for LinReg {
    fn from(config: &Config) -> Self {
        Self {
            slope_threshold: config.slope_threshold,
            speed_threshold: config.speed_threshold,
            correlation_threshold: config.correlation_threshold,
        }
    }
}

impl TrendPolicy for LinReg {
    fn analyze(&self, speeds: &[f32]) -> VehicleState {
        let fit = match math::linear_fit(&na::DVector::from_vec(speeds.to_vec())) {
            Some(fit) => fit,
            None => return VehicleState::Unknown,
        };

        // flat windows have r = 0 and land here too
        if fit.r.abs() < self.correlation_threshold {
            return VehicleState::Moving;
        }

        let (slope, speed) = (fit.slope, fit.mean);

        if slope > self.slope_threshold && speed < self.speed_threshold {
            VehicleState::Departing
        } else if slope < -self.slope_threshold && speed > self.speed_threshold {
            VehicleState::Arriving
        } else if slope.abs() < self.slope_threshold / 5.0 && speed < PARKED_MEAN_SPEED {
            VehicleState::Parked
        } else {
            VehicleState::Moving
        }
    }
}

/// Sign counting over consecutive differences.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simple {
    pub speed_threshold: f32,
    pub parked_speed_threshold: f32,
    pub abs_mean_threshold: f32,
}

impl From<&Config> for Simple {
    fn from(config: &Config) -> Self {
        Self {
            speed_threshold: config.speed_threshold,
            parked_speed_threshold: config.parked_speed_threshold,
            abs_mean_threshold: config.abs_mean_threshold,
        }
    }
}

impl TrendPolicy for Simple {
    fn analyze(&self, speeds: &[f32]) -> VehicleState {
        if speeds.is_empty() {
            return VehicleState::Unknown;
        }

        let speeds = Array1::from(speeds.to_vec());
        let diffs = &speeds.slice(s![1..]) - &speeds.slice(s![..-1]);

        let mean_abs_diff = diffs.mapv(f32::abs).mean().unwrap_or(0.0);
        let speed = speeds.mean().unwrap_or(0.0);
        let positive = diffs.iter().filter(|d| **d > 0.0).count();
        let negative = diffs.iter().filter(|d| **d < 0.0).count();

        if positive > negative
            && mean_abs_diff > self.abs_mean_threshold
            && speed < self.speed_threshold
        {
            VehicleState::Departing
        } else if positive < negative && mean_abs_diff > self.abs_mean_threshold {
            VehicleState::Arriving
        } else if mean_abs_diff < self.abs_mean_threshold && speed < self.parked_speed_threshold {
            VehicleState::Parked
        } else {
            VehicleState::Moving
        }
    }
}

/// Minimum history gate in front of the selected policy.
#[derive(Debug)]
pub struct TrendClassifier {
    policy: Box<dyn TrendPolicy>,
    min_history_points: usize,
}

impl TrendClassifier {
    pub fn new(policy: Box<dyn TrendPolicy>, min_history_points: usize) -> Self {
        Self {
            policy,
            min_history_points,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.analysis_method.policy(config),
            config.min_history_points,
        )
    }

    pub fn classify(&self, speeds: &[f32]) -> VehicleState {
        if speeds.len() < self.min_history_points {
            return VehicleState::Unknown;
        }

        self.policy.analyze(speeds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier(method: AnalysisMethod) -> TrendClassifier {
        let config = Config {
            analysis_method: method,
            ..Config::default()
        };

        TrendClassifier::from_config(&config)
    }

    #[test]
    fn short_history_is_unknown_for_both_policies() {
        for method in [AnalysisMethod::Linreg, AnalysisMethod::Simple] {
            let c = classifier(method);

            assert_eq!(c.classify(&[]), VehicleState::Unknown);
            assert_eq!(c.classify(&[1.0, 50.0, 2.0, 80.0]), VehicleState::Unknown);
        }
    }

    #[test]
    fn linreg_departing() {
        let c = classifier(AnalysisMethod::Linreg);

        assert_eq!(
            c.classify(&[0.0, 11.0, 22.0, 33.0, 44.0]),
            VehicleState::Departing
        );
    }

    #[test]
    fn linreg_arriving() {
        let c = classifier(AnalysisMethod::Linreg);

        assert_eq!(
            c.classify(&[120.0, 100.0, 80.0, 60.0, 40.0]),
            VehicleState::Arriving
        );
    }

    #[test]
    fn linreg_weak_correlation_is_moving() {
        let c = classifier(AnalysisMethod::Linreg);

        assert_eq!(
            c.classify(&[0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0]),
            VehicleState::Moving
        );
    }

    #[test]
    fn linreg_settled_tail_is_parked() {
        let c = classifier(AnalysisMethod::Linreg);

        assert_eq!(
            c.classify(&[1.0, 0.8, 0.6, 0.4, 0.2, 0.0, 0.0, 0.0, 0.0, 0.0]),
            VehicleState::Parked
        );
    }

    #[test]
    fn linreg_flat_window_has_no_trend() {
        let c = classifier(AnalysisMethod::Linreg);

        assert_eq!(c.classify(&[0.0; 10]), VehicleState::Moving);
        assert_eq!(c.classify(&[1.5; 10]), VehicleState::Moving);
        assert_eq!(
            LinReg::from(&Config::default()).analyze(&[0.0; 10]),
            VehicleState::Moving
        );
    }

    #[test]
    fn linreg_braking_to_a_stop_is_still_moving() {
        // slope magnitude 2.13 exceeds slope_threshold / 5 and the mean is 5.1
        let c = classifier(AnalysisMethod::Linreg);

        assert_eq!(
            c.classify(&[20.0, 15.0, 10.0, 5.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            VehicleState::Moving
        );
    }

    #[test]
    fn linreg_fast_steady_is_moving() {
        let c = classifier(AnalysisMethod::Linreg);

        assert_eq!(
            c.classify(&[40.0, 42.0, 44.0, 46.0, 48.0, 50.0]),
            VehicleState::Moving
        );
    }

    #[test]
    fn simple_policy_rules() {
        let c = classifier(AnalysisMethod::Simple);

        assert_eq!(
            c.classify(&[1.0, 3.0, 6.0, 10.0, 15.0]),
            VehicleState::Departing
        );
        assert_eq!(
            c.classify(&[50.0, 45.0, 41.0, 38.0, 36.0]),
            VehicleState::Arriving
        );
        assert_eq!(
            c.classify(&[0.5, 0.6, 0.5, 0.4, 0.5]),
            VehicleState::Parked
        );
        // steady high speed, small differences
        assert_eq!(
            c.classify(&[40.0, 40.5, 40.0, 40.5, 40.0]),
            VehicleState::Moving
        );
    }

    #[test]
    fn simple_departing_needs_low_mean_speed() {
        let c = classifier(AnalysisMethod::Simple);

        assert_eq!(
            c.classify(&[40.0, 45.0, 50.0, 55.0, 60.0]),
            VehicleState::Moving
        );
    }

    #[test]
    fn simple_braking_to_a_stop_is_arriving() {
        let c = classifier(AnalysisMethod::Simple);

        assert_eq!(
            c.classify(&[20.0, 15.0, 10.0, 5.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
            VehicleState::Arriving
        );
    }

    #[test]
    fn method_parses_from_str() {
        assert_eq!("simple".parse::<AnalysisMethod>().unwrap(), AnalysisMethod::Simple);
        assert_eq!("linreg".parse::<AnalysisMethod>().unwrap(), AnalysisMethod::Linreg);
        assert!("kalman".parse::<AnalysisMethod>().is_err());
    }

    #[test]
    fn state_codes() {
        assert_eq!(VehicleState::Arriving.to_string(), "A");
        assert_eq!(VehicleState::Unknown.to_string(), "N/A");
    }
}
