use crate::circular_queue::CircularQueue;
use crate::math;
use nalgebra as na;

/// Most recent speed samples of one track, oldest first.
#[derive(Debug, Clone)]
pub struct SpeedHistory {
    samples: CircularQueue<f32>,
}

impl SpeedHistory {
    pub fn new(window: usize) -> Self {
        Self {
            samples: CircularQueue::with_capacity(window),
        }
    }

    /// Returns the sample dropped to make room, if any.
    #[inline]
    pub fn push(&mut self, speed: f32) -> Option<f32> {
        self.samples.push(speed)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.samples.capacity()
    }

    #[inline]
    pub fn latest(&self) -> Option<f32> {
        self.samples.newest().copied()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().copied()
    }

    /// Trailing `n` samples in insertion order.
    pub fn window(&self, n: usize) -> Vec<f32> {
        self.samples.tail(n).copied().collect()
    }
}

/// Turns displacement since the last sampling boundary into a speed figure.
#[derive(Debug, Clone, Copy)]
pub struct SpeedEstimator {
    pixel_speed_coef: f32,
}

impl SpeedEstimator {
    pub fn new(pixel_speed_coef: f32) -> Self {
        Self { pixel_speed_coef }
    }

    #[inline]
    pub fn estimate(&self, from: &na::Point2<f32>, to: &na::Point2<f32>, elapsed: f64) -> f32 {
        if elapsed > 0.0 {
            self.pixel_speed_coef * (math::distance(to, from) as f64 / elapsed) as f32
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn estimate_scales_by_coefficient() {
        let est = SpeedEstimator::new(2.0);
        let v = est.estimate(&na::Point2::new(0.0, 0.0), &na::Point2::new(3.0, 4.0), 0.5);

        assert_relative_eq!(v, 20.0);
    }

    #[test]
    fn non_positive_elapsed_gives_zero() {
        let est = SpeedEstimator::new(2.0);
        let a = na::Point2::new(0.0, 0.0);
        let b = na::Point2::new(30.0, 40.0);

        assert_eq!(est.estimate(&a, &b, 0.0), 0.0);
        assert_eq!(est.estimate(&a, &b, -1.0), 0.0);
    }

    #[test]
    fn window_takes_trailing_samples() {
        let mut history = SpeedHistory::new(4);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            history.push(v);
        }

        assert_eq!(history.window(2), vec![4.0, 5.0]);
        assert_eq!(history.window(10), vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(history.latest(), Some(5.0));
    }

    proptest! {
        #[test]
        fn history_keeps_last_w_in_order(
            window in 1usize..32,
            samples in prop::collection::vec(0.0f32..500.0, 0..128),
        ) {
            let mut history = SpeedHistory::new(window);
            for &s in &samples {
                history.push(s);
                prop_assert!(history.len() <= window);
            }

            let expected: Vec<f32> = samples[samples.len().saturating_sub(window)..].to_vec();
            prop_assert_eq!(history.iter().collect::<Vec<_>>(), expected);
        }
    }
}
