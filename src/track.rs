use nalgebra as na;
use tracing::{debug, trace};

use crate::bbox::{BBox, Ltrb};
use crate::circular_queue::CircularQueue;
use crate::config::Config;
use crate::detection::Detection;
use crate::math;
use crate::speed::{SpeedEstimator, SpeedHistory};
use crate::trend::{TrendClassifier, VehicleState};
use crate::TrackId;

/// Kinematic state of one track id.
#[derive(Debug, Clone)]
pub struct TrackRecord {
    pub track_id: TrackId,
    pub class: i32,
    pub bbox: BBox<Ltrb>,

    /// First position ever observed, never changes
    pub first_anchor: na::Point2<f32>,
    pub last_anchor: na::Point2<f32>,
    pub boundary_anchor: na::Point2<f32>,
    pub boundary_time: f64,
    pub frames_since_boundary: usize,

    pub speed_history: SpeedHistory,
    pub trajectory: CircularQueue<na::Point2<f32>>,

    /// Rolling mean over the last sampling period, `None` until the first boundary
    pub speed: Option<f32>,
    pub state: VehicleState,
    /// Bearing from `first_anchor` to the latest position at the last boundary (rad)
    pub direction: f32,

    pub last_seen_frame: u64,
}

impl TrackRecord {
    pub fn new(det: &Detection, ts: f64, frame: u64, config: &Config) -> Self {
        let anchor = det.anchor();
        let mut trajectory = CircularQueue::with_capacity(config.trajectory_length);
        trajectory.push(anchor);

        Self {
            track_id: det.track_id,
            class: det.class,
            bbox: det.bbox,
            first_anchor: anchor,
            last_anchor: anchor,
            boundary_anchor: anchor,
            boundary_time: ts,
            frames_since_boundary: 0,
            speed_history: SpeedHistory::new(config.speed_history_window_size),
            trajectory,
            speed: None,
            state: VehicleState::Unknown,
            direction: 0.0,
            last_seen_frame: frame,
        }
    }

    pub(crate) fn observe(&mut self, det: &Detection, frame: u64) {
        let anchor = det.anchor();

        self.class = det.class;
        self.bbox = det.bbox;
        self.last_anchor = anchor;
        self.last_seen_frame = frame;
        self.trajectory.push(anchor);
    }

    /// Buffers one speed sample and, once `period` samples accumulated since
    /// the last boundary, recomputes speed, state and direction.
    ///
    /// Returns `true` when this call crossed a sampling boundary.
    pub(crate) fn sample(
        &mut self,
        estimator: &SpeedEstimator,
        classifier: &TrendClassifier,
        period: usize,
        ts: f64,
    ) -> bool {
        let speed = estimator.estimate(
            &self.boundary_anchor,
            &self.last_anchor,
            ts - self.boundary_time,
        );

        self.speed_history.push(speed);
        self.frames_since_boundary += 1;

        trace!(track_id = self.track_id, speed, "speed sample");

        if self.frames_since_boundary < period {
            return false;
        }

        let window = self.speed_history.window(period);

        self.speed = math::mean(&window);
        self.state = classifier.classify(&window);
        self.direction = math::direction(&self.first_anchor, &self.last_anchor);

        self.frames_since_boundary = 0;
        self.boundary_time = ts;
        self.boundary_anchor = self.last_anchor;

        debug!(
            track_id = self.track_id,
            speed = ?self.speed,
            state = %self.state,
            direction = self.direction,
            "sampling boundary"
        );

        true
    }

    #[inline]
    pub fn frames_missed(&self, frame: u64) -> u64 {
        frame.saturating_sub(self.last_seen_frame)
    }
}
