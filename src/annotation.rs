use std::collections::HashSet;

use nalgebra as na;
use serde_derive::Serialize;

use crate::bbox::{BBox, Ltrb};
use crate::config::Config;
use crate::detection::Detection;
use crate::track::TrackRecord;
use crate::TrackId;

/// Slower tracks get a zero-length arrow.
const MIN_ARROW_SPEED: f32 = 2.0;

const PALETTE: [[u8; 3]; 20] = [
    [0xFF, 0x38, 0x38],
    [0xFF, 0x9D, 0x97],
    [0xFF, 0x70, 0x1F],
    [0xFF, 0xB2, 0x1D],
    [0xCF, 0xD2, 0x31],
    [0x48, 0xF9, 0x0A],
    [0x92, 0xCC, 0x17],
    [0x3D, 0xDB, 0x86],
    [0x1A, 0x93, 0x34],
    [0x00, 0xD4, 0xBB],
    [0x2C, 0x99, 0xA8],
    [0x00, 0xC2, 0xFF],
    [0x34, 0x45, 0x93],
    [0x64, 0x73, 0xFF],
    [0x00, 0x18, 0xEC],
    [0x84, 0x38, 0xFF],
    [0x52, 0x00, 0x85],
    [0xCB, 0x38, 0xFF],
    [0xFF, 0x95, 0xC8],
    [0xFF, 0x37, 0xC7],
];

/// Direction arrow. The tip lies *behind* the anchor along the stored
/// direction; renderers rely on this orientation.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Arrow {
    pub tail: [f32; 2],
    pub tip: [f32; 2],
}

/// Everything a renderer needs to draw one track on one frame.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Annotation {
    pub track_id: TrackId,
    pub class: i32,
    pub bbox: BBox<Ltrb>,
    pub label: String,
    /// RGB
    pub color: [u8; 3],
    pub line_width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trajectory: Option<Vec<[f32; 2]>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrow: Option<Arrow>,
}

#[inline]
pub fn color(track_id: TrackId) -> [u8; 3] {
    PALETTE[track_id.rem_euclid(PALETTE.len() as TrackId) as usize]
}

pub fn label(record: &TrackRecord, config: &Config) -> String {
    match record.speed {
        None => config.class_name(record.class),
        Some(speed) if config.do_analyze => format!(
            "{} | {} {}",
            record.state,
            speed.round() as i64,
            config.speed_unit
        ),
        Some(speed) => format!("{} {}", speed.round() as i64, config.speed_unit),
    }
}

pub fn arrow(anchor: &na::Point2<f32>, direction: f32, speed: Option<f32>) -> Arrow {
    let m = match speed {
        Some(v) if v > MIN_ARROW_SPEED => v,
        _ => 0.0,
    };

    let tip = *anchor - na::Vector2::new(direction.cos(), direction.sin()) * m;

    Arrow {
        tail: [anchor.x, anchor.y],
        tip: [tip.x, tip.y],
    }
}

pub fn annotate(record: &TrackRecord, config: &Config) -> Annotation {
    let trajectory = if config.draw_tracks {
        Some(record.trajectory.iter().map(|p| [p.x, p.y]).collect())
    } else {
        None
    };

    let arrow = if config.draw_direction {
        Some(arrow(&record.last_anchor, record.direction, record.speed))
    } else {
        None
    };

    Annotation {
        track_id: record.track_id,
        class: record.class,
        bbox: record.bbox,
        label: label(record, config),
        color: color(record.track_id),
        line_width: config.line_width,
        trajectory,
        arrow,
    }
}

/// Decides which tracks get annotated. Tracking itself is never filtered.
pub trait TrackFilter {
    fn is_selected(&self, track_id: TrackId) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AllTracks;

impl TrackFilter for AllTracks {
    #[inline]
    fn is_selected(&self, _track_id: TrackId) -> bool {
        true
    }
}

impl<F: Fn(TrackId) -> bool> TrackFilter for F {
    #[inline]
    fn is_selected(&self, track_id: TrackId) -> bool {
        self(track_id)
    }
}

/// Click-to-select state: either everything is shown, or only picked tracks.
#[derive(Debug, Clone)]
pub struct Selection {
    display_everything: bool,
    selected: HashSet<TrackId>,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}

impl Selection {
    pub fn new() -> Self {
        Self {
            display_everything: true,
            selected: HashSet::new(),
        }
    }

    #[inline]
    pub fn display_everything(&self) -> bool {
        self.display_everything
    }

    #[inline]
    pub fn selected(&self) -> &HashSet<TrackId> {
        &self.selected
    }

    /// Flips between showing everything and showing the selection, which is emptied.
    pub fn toggle_display_everything(&mut self) {
        self.display_everything = !self.display_everything;
        self.selected.clear();
    }

    pub fn select(&mut self, track_id: TrackId) -> bool {
        self.selected.insert(track_id)
    }

    /// Selects every detection whose box contains `point`, returning the newly added ids.
    pub fn select_at<'a, I>(&mut self, point: na::Point2<f32>, detections: I) -> Vec<TrackId>
    where
        I: IntoIterator<Item = &'a Detection>,
    {
        detections
            .into_iter()
            .filter(|det| det.bbox.contains(&point))
            .filter_map(|det| self.select(det.track_id).then(|| det.track_id))
            .collect()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}

impl TrackFilter for Selection {
    #[inline]
    fn is_selected(&self, track_id: TrackId) -> bool {
        self.display_everything || self.selected.contains(&track_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trend::VehicleState;
    use approx::assert_relative_eq;

    fn record() -> TrackRecord {
        let det = Detection::new(BBox::ltrb(90.0, 90.0, 110.0, 110.0), 4, 3);

        TrackRecord::new(&det, 0.0, 1, &Config::default())
    }

    #[test]
    fn arrow_points_backwards() {
        let a = arrow(&na::Point2::new(100.0, 100.0), 0.0, Some(10.0));

        assert_eq!(a.tail, [100.0, 100.0]);
        assert_relative_eq!(a.tip[0], 90.0);
        assert_relative_eq!(a.tip[1], 100.0);
    }

    #[test]
    fn slow_or_unknown_speed_collapses_arrow() {
        let anchor = na::Point2::new(5.0, 5.0);

        assert_eq!(arrow(&anchor, 1.0, Some(2.0)).tip, [5.0, 5.0]);
        assert_eq!(arrow(&anchor, 1.0, None).tip, [5.0, 5.0]);
    }

    #[test]
    fn label_before_first_boundary_is_class_name() {
        assert_eq!(label(&record(), &Config::default()), "car");
    }

    #[test]
    fn label_with_and_without_analysis() {
        let mut r = record();
        r.speed = Some(12.6);
        r.state = VehicleState::Departing;

        assert_eq!(label(&r, &Config::default()), "D | 13 km/h");

        let config = Config {
            do_analyze: false,
            ..Config::default()
        };
        assert_eq!(label(&r, &config), "13 km/h");
    }

    #[test]
    fn optional_parts_follow_config() {
        let r = record();
        let plain = annotate(&r, &Config::default());

        assert!(plain.trajectory.is_none());
        assert!(plain.arrow.is_none());
        assert_eq!(plain.color, PALETTE[4]);

        let config = Config {
            draw_tracks: true,
            draw_direction: true,
            ..Config::default()
        };
        let full = annotate(&r, &config);

        assert_eq!(full.trajectory, Some(vec![[100.0, 100.0]]));
        assert_eq!(full.arrow.unwrap().tip, [100.0, 100.0]);
    }

    #[test]
    fn negative_ids_still_get_a_color() {
        assert_eq!(color(-1), PALETTE[19]);
        assert_eq!(color(21), PALETTE[1]);
    }

    #[test]
    fn selection_by_click() {
        let dets = [
            Detection::new(BBox::ltrb(0.0, 0.0, 10.0, 10.0), 1, 3),
            Detection::new(BBox::ltrb(20.0, 0.0, 30.0, 10.0), 2, 3),
        ];
        let mut selection = Selection::new();

        assert!(selection.is_selected(2));

        selection.toggle_display_everything();
        assert!(!selection.is_selected(1));

        assert_eq!(selection.select_at(na::Point2::new(25.0, 5.0), &dets), vec![2]);
        assert!(selection.select_at(na::Point2::new(25.0, 5.0), &dets).is_empty());
        assert!(selection.is_selected(2));
        assert!(!selection.is_selected(1));

        selection.clear();
        assert!(!selection.is_selected(2));
    }

    #[test]
    fn closures_are_filters() {
        let odd = |id: TrackId| id % 2 == 1;

        assert!(odd.is_selected(3));
        assert!(!odd.is_selected(4));
    }
}
