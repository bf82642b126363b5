use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::annotation::{self, Annotation, TrackFilter};
use crate::clock::Clock;
use crate::config::Config;
use crate::detection::Detection;
use crate::error::Error;
use crate::frame::Frame;
use crate::speed::SpeedEstimator;
use crate::track::TrackRecord;
use crate::trend::TrendClassifier;
use crate::TrackId;

/// Owns every track record of one processing session and drives the
/// per-frame update cycle.
///
/// Frames must be fed in order; a frame's updates complete before the next
/// one starts. Callers sharing a scene across threads serialize access.
#[derive(Debug)]
pub struct Scene {
    config: Config,
    estimator: SpeedEstimator,
    classifier: TrendClassifier,
    tracks: HashMap<TrackId, TrackRecord>,
    frame_index: u64,
    last_timestamp: Option<f64>,
}

impl Scene {
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;

        info!(
            method = %config.analysis_method,
            period = config.write_every_n_frames,
            window = config.speed_history_window_size,
            eviction = ?config.max_missed_frames,
            "scene created"
        );

        if config.max_missed_frames.is_none() {
            debug!("track eviction disabled, records live for the whole session");
        }

        Ok(Self {
            estimator: SpeedEstimator::new(config.pixel_speed_coef),
            classifier: TrendClassifier::from_config(&config),
            tracks: HashMap::new(),
            frame_index: 0,
            last_timestamp: None,
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn track(&self, track_id: TrackId) -> Option<&TrackRecord> {
        self.tracks.get(&track_id)
    }

    #[inline]
    pub fn tracks(&self) -> impl Iterator<Item = &TrackRecord> {
        self.tracks.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Frames processed so far.
    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Creates the record on first sight of `det.track_id`, otherwise moves its
    /// latest position. Creation never resets an existing record.
    pub fn observe(&mut self, det: &Detection, ts: f64) -> &TrackRecord {
        let frame = self.frame_index;
        let config = &self.config;

        match self.tracks.entry(det.track_id) {
            Entry::Occupied(entry) => {
                let record = entry.into_mut();
                record.observe(det, frame);

                record
            }
            Entry::Vacant(entry) => {
                debug!(track_id = det.track_id, class = det.class, "new track");

                entry.insert(TrackRecord::new(det, ts, frame, config))
            }
        }
    }

    /// Runs one frame through the engine: position update, speed sample and,
    /// on each track's sampling boundary, trend and direction.
    pub fn update(&mut self, frame: &Frame) -> Result<(), Error> {
        let ts = frame.timestamp;

        if let Some(previous) = self.last_timestamp {
            if ts < previous {
                return Err(Error::ClockWentBackwards {
                    previous,
                    current: ts,
                });
            }
        }

        self.last_timestamp = Some(ts);
        self.frame_index += 1;

        let period = self.config.write_every_n_frames;
        let mut seen = HashSet::with_capacity(frame.len());

        for det in frame.iter() {
            if !seen.insert(det.track_id) {
                warn!(track_id = det.track_id, "duplicate track id in frame, ignored");
                continue;
            }

            self.observe(det, ts);

            if let Some(record) = self.tracks.get_mut(&det.track_id) {
                record.sample(&self.estimator, &self.classifier, period, ts);
            }
        }

        self.evict_stale();

        Ok(())
    }

    /// Same as [`Scene::update`], stamped with `clock`.
    pub fn update_now<C: Clock>(&mut self, detections: &[Detection], clock: &C) -> Result<(), Error> {
        let frame = Frame::new(clock.now(), detections.to_vec());

        self.update(&frame)
    }

    /// One descriptor per detection of `frame` that has a record and passes `filter`.
    pub fn annotations<F: TrackFilter + ?Sized>(&self, frame: &Frame, filter: &F) -> Vec<Annotation> {
        frame
            .iter()
            .filter(|det| filter.is_selected(det.track_id))
            .filter_map(|det| self.tracks.get(&det.track_id))
            .map(|record| annotation::annotate(record, &self.config))
            .collect()
    }

    fn evict_stale(&mut self) {
        let max_missed = match self.config.max_missed_frames {
            Some(max_missed) => max_missed,
            None => return,
        };

        let frame = self.frame_index;
        let before = self.tracks.len();

        self.tracks
            .retain(|_, record| record.frames_missed(frame) <= max_missed);

        let evicted = before - self.tracks.len();
        if evicted > 0 {
            warn!(evicted, max_missed, remaining = self.tracks.len(), "evicted stale tracks");
        }
    }
}
