//! Per-track speed, heading and motion-trend estimation for tracked vehicles.
//!
//! Feed [`Frame`]s of tracker output into a [`Scene`]; every
//! `write_every_n_frames` frames each track gets a fresh rolling speed, a
//! bearing since it was first seen and a [`VehicleState`]. [`Scene::annotations`]
//! turns the result into descriptors for an external renderer.

pub mod annotation;
pub mod bbox;
pub mod clock;
pub mod config;
pub mod detection;
pub mod error;
pub mod frame;
pub mod math;
pub mod scene;
pub mod speed;
pub mod track;
pub mod trend;

mod circular_queue;

pub use annotation::{Annotation, Arrow, Selection, TrackFilter};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::Config;
pub use detection::Detection;
pub use error::Error;
pub use frame::Frame;
pub use scene::Scene;
pub use track::TrackRecord;
pub use trend::{AnalysisMethod, TrendClassifier, TrendPolicy, VehicleState};

/// Identifier assigned by the upstream tracker.
pub type TrackId = i32;
