use std::fs;
use std::path::Path;

use serde_derive::{Deserialize, Serialize};

use crate::error::Error;
use crate::trend::AnalysisMethod;

const VISDRONE_CLASSES: [&str; 10] = [
    "pedestrian",
    "people",
    "bicycle",
    "car",
    "van",
    "truck",
    "tricycle",
    "awning-tricycle",
    "bus",
    "motor",
];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Converts pixel distance per second into the reported speed unit
    pub pixel_speed_coef: f32,
    /// Sampling period: frames between trend/direction updates of a track
    pub write_every_n_frames: usize,
    pub analysis_method: AnalysisMethod,

    pub slope_threshold: f32,
    pub speed_threshold: f32,
    pub parked_speed_threshold: f32,
    pub abs_mean_threshold: f32,
    pub min_history_points: usize,
    pub correlation_threshold: f32,
    pub speed_history_window_size: usize,

    pub draw_tracks: bool,
    pub draw_direction: bool,
    pub do_analyze: bool,
    pub line_width: u32,

    pub speed_unit: String,
    /// Positions kept per track for the trajectory polyline
    pub trajectory_length: usize,
    /// Indexed by class id
    pub class_names: Vec<String>,
    /// Drop a track after this many consecutive frames without it. Off when `None`.
    pub max_missed_frames: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pixel_speed_coef: 2.0,
            write_every_n_frames: 10,
            analysis_method: AnalysisMethod::Linreg,
            slope_threshold: 10.0,
            speed_threshold: 30.0,
            parked_speed_threshold: 4.0,
            abs_mean_threshold: 1.0,
            min_history_points: 5,
            correlation_threshold: 0.5,
            speed_history_window_size: 15,
            draw_tracks: false,
            draw_direction: false,
            do_analyze: true,
            line_width: 2,
            speed_unit: "km/h".to_string(),
            trajectory_length: 30,
            class_names: VISDRONE_CLASSES.iter().map(|s| s.to_string()).collect(),
            max_missed_frames: None,
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> Error {
    Error::InvalidConfig {
        field,
        reason: reason.into(),
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), Error> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be a finite non-negative number, got {}", value)))
    }
}

impl Config {
    /// Reads a YAML (`.yaml`, `.yml`) or JSON (`.json`) file and validates it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();

        let config: Config = match extension(path).as_deref() {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&fs::read_to_string(path)?)?,
            Some("json") => serde_json::from_str(&fs::read_to_string(path)?)?,
            _ => return Err(Error::UnsupportedConfigFormat(path.display().to_string())),
        };

        config.validate()?;

        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        fs::write(path, serde_yaml::to_string(self)?)?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !(self.pixel_speed_coef.is_finite() && self.pixel_speed_coef > 0.0) {
            return Err(invalid("pixel_speed_coef", "must be a finite positive number"));
        }

        if self.write_every_n_frames == 0 {
            return Err(invalid("write_every_n_frames", "must be at least 1"));
        }

        if self.min_history_points == 0 {
            return Err(invalid("min_history_points", "must be at least 1"));
        }

        if self.speed_history_window_size < self.min_history_points {
            return Err(invalid(
                "speed_history_window_size",
                format!(
                    "must be at least min_history_points ({})",
                    self.min_history_points
                ),
            ));
        }

        non_negative("slope_threshold", self.slope_threshold)?;
        non_negative("speed_threshold", self.speed_threshold)?;
        non_negative("parked_speed_threshold", self.parked_speed_threshold)?;
        non_negative("abs_mean_threshold", self.abs_mean_threshold)?;

        if !(0.0..=1.0).contains(&self.correlation_threshold) {
            return Err(invalid("correlation_threshold", "must be within [0, 1]"));
        }

        if self.line_width == 0 {
            return Err(invalid("line_width", "must be at least 1"));
        }

        if self.trajectory_length == 0 {
            return Err(invalid("trajectory_length", "must be at least 1"));
        }

        Ok(())
    }

    pub fn class_name(&self, class: i32) -> String {
        usize::try_from(class)
            .ok()
            .and_then(|idx| self.class_names.get(idx))
            .cloned()
            .unwrap_or_else(|| class.to_string())
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
