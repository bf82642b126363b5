use nalgebra as na;
use num_traits::Float;

/// Least-squares line through `(i, y[i])`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit<T> {
    pub slope: T,
    pub intercept: T,
    /// Pearson correlation of index and value, zero when `y` has no variance.
    pub r: T,
    pub mean: T,
}

pub fn linear_fit<T: na::RealField + Float>(y: &na::DVector<T>) -> Option<LineFit<T>> {
    let n = y.len();
    if n < 2 {
        return None;
    }

    let mut xs = Vec::with_capacity(n);
    for i in 0..n {
        xs.push(T::from(i)?);
    }

    let x = na::DVector::from_vec(xs);
    let x_mean = x.mean();
    let y_mean = y.mean();

    let dx = x.add_scalar(-x_mean);
    let dy = y.add_scalar(-y_mean);

    let s_xx = dx.dot(&dx);
    let s_yy = dy.dot(&dy);
    let s_xy = dx.dot(&dy);

    let slope = s_xy / s_xx;
    let intercept = y_mean - slope * x_mean;

    let r = if s_yy > T::zero() {
        let r = s_xy / Float::sqrt(s_xx * s_yy);

        Float::max(Float::min(r, T::one()), -T::one())
    } else {
        T::zero()
    };

    Some(LineFit {
        slope,
        intercept,
        r,
        mean: y_mean,
    })
}

#[inline]
pub fn distance(a: &na::Point2<f32>, b: &na::Point2<f32>) -> f32 {
    na::distance(a, b)
}

/// Bearing of `to` as seen from `from`, in radians.
#[inline]
pub fn direction(from: &na::Point2<f32>, to: &na::Point2<f32>) -> f32 {
    (to.y - from.y).atan2(to.x - from.x)
}

#[inline]
pub fn mean(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f32>() / values.len() as f32)
    }
}
