use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};
use crate::TrackId;

/// One tracked object as reported by the upstream detector/tracker.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub bbox: BBox<Ltrb>,
    #[serde(rename = "id")]
    pub track_id: TrackId,
    #[serde(rename = "c")]
    pub class: i32,
    #[serde(rename = "p", default)]
    pub confidence: f32,
    /// Reference point of the object; the box center when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<[f32; 2]>,
}

impl Detection {
    pub fn new(bbox: BBox<Ltrb>, track_id: TrackId, class: i32) -> Self {
        Self {
            bbox,
            track_id,
            class,
            confidence: 1.0,
            anchor: None,
        }
    }

    pub fn with_anchor(mut self, x: f32, y: f32) -> Self {
        self.anchor = Some([x, y]);
        self
    }

    #[inline]
    pub fn anchor(&self) -> na::Point2<f32> {
        match self.anchor {
            Some([x, y]) => na::Point2::new(x, y),
            None => self.bbox.center(),
        }
    }
}
