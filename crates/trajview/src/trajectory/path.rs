use std::cmp::Ordering;
use std::fmt;

use crate::geometry::Vec2;

const CURVE_TABLE_SAMPLES: usize = 64;
const LENGTH_EPSILON: f64 = 1e-9;

/// Continuous curve parameterized by arc length, in field units.
///
/// Implementations clamp `distance` into `0.0..=length()`.
pub trait ParametricPath: fmt::Debug + Send + Sync {
    fn length(&self) -> f64;
    fn point_at(&self, distance: f64) -> Vec2;
    /// Direction of travel at `distance`, radians counter-clockwise from +x.
    fn tangent_angle_at(&self, distance: f64) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePath {
    start: Vec2,
    end: Vec2,
}

impl LinePath {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }
}

impl ParametricPath for LinePath {
    fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    fn point_at(&self, distance: f64) -> Vec2 {
        let length = self.length();
        if length <= LENGTH_EPSILON {
            return self.start;
        }
        self.start
            .lerp(self.end, distance.clamp(0.0, length) / length)
    }

    fn tangent_angle_at(&self, _distance: f64) -> f64 {
        (self.end - self.start).angle()
    }
}

#[derive(Debug, Clone)]
struct ArcLengthTable {
    cumulative: Vec<f64>,
    total: f64,
}

impl ArcLengthTable {
    fn new(samples: usize, mut sample_fn: impl FnMut(f64) -> Vec2) -> Self {
        let samples = samples.max(1);
        let mut cumulative = Vec::with_capacity(samples + 1);
        let mut total = 0.0;
        let mut prev = sample_fn(0.0);
        cumulative.push(0.0);

        for i in 1..=samples {
            let point = sample_fn(i as f64 / samples as f64);
            total += prev.distance(point);
            cumulative.push(total);
            prev = point;
        }

        Self { cumulative, total }
    }

    fn param_for_length(&self, length: f64) -> f64 {
        if self.total <= LENGTH_EPSILON {
            return 0.0;
        }
        let target = length.clamp(0.0, self.total);
        let idx = match self
            .cumulative
            .binary_search_by(|val| val.partial_cmp(&target).unwrap_or(Ordering::Less))
        {
            Ok(ix) | Err(ix) => ix,
        };
        if idx == 0 {
            return 0.0;
        }
        let segments = self.cumulative.len() - 1;
        if idx > segments {
            return 1.0;
        }
        let prev = self.cumulative[idx - 1];
        let next = self.cumulative[idx];
        let span = next - prev;
        let local = if span <= LENGTH_EPSILON {
            0.0
        } else {
            (target - prev) / span
        };
        ((idx - 1) as f64 + local) / segments as f64
    }
}

/// Cubic Bezier curve reparameterized by arc length through a lookup table.
#[derive(Debug, Clone)]
pub struct CubicBezierPath {
    control: [Vec2; 4],
    table: ArcLengthTable,
}

impl CubicBezierPath {
    pub fn new(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2) -> Self {
        let control = [p0, p1, p2, p3];
        let table = ArcLengthTable::new(CURVE_TABLE_SAMPLES, |t| bezier_point(&control, t));
        Self { control, table }
    }

    /// Curve leaving `start` along `start_tangent` and arriving at `end` along
    /// `end_tangent`, with control arms a third of the chord long.
    pub fn from_tangents(start: Vec2, start_tangent: f64, end: Vec2, end_tangent: f64) -> Self {
        let arm = start.distance(end) / 3.0;
        Self::new(
            start,
            start + Vec2::from_angle(start_tangent) * arm,
            end - Vec2::from_angle(end_tangent) * arm,
            end,
        )
    }
}

impl ParametricPath for CubicBezierPath {
    fn length(&self) -> f64 {
        self.table.total
    }

    fn point_at(&self, distance: f64) -> Vec2 {
        bezier_point(&self.control, self.table.param_for_length(distance))
    }

    fn tangent_angle_at(&self, distance: f64) -> f64 {
        let t = self.table.param_for_length(distance);
        let derivative = bezier_derivative(&self.control, t);
        if derivative.length() > LENGTH_EPSILON {
            return derivative.angle();
        }
        (self.control[3] - self.control[0]).angle()
    }
}

fn bezier_point(c: &[Vec2; 4], t: f64) -> Vec2 {
    let u = 1.0 - t;
    c[0] * (u * u * u) + c[1] * (3.0 * u * u * t) + c[2] * (3.0 * u * t * t) + c[3] * (t * t * t)
}

fn bezier_derivative(c: &[Vec2; 4], t: f64) -> Vec2 {
    let u = 1.0 - t;
    (c[1] - c[0]) * (3.0 * u * u) + (c[2] - c[1]) * (6.0 * u * t) + (c[3] - c[2]) * (3.0 * t * t)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn line_length_and_midpoint() {
        let line = LinePath::new(Vec2::new(0.0, 0.0), Vec2::new(3.0, 4.0));
        assert!((line.length() - 5.0).abs() < 1e-12);
        let mid = line.point_at(2.5);
        assert!((mid.x - 1.5).abs() < 1e-12);
        assert!((mid.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn line_clamps_out_of_range_distances() {
        let line = LinePath::new(Vec2::new(1.0, 1.0), Vec2::new(1.0, 5.0));
        assert_eq!(line.point_at(-3.0), Vec2::new(1.0, 1.0));
        assert_eq!(line.point_at(100.0), Vec2::new(1.0, 5.0));
        assert!((line.tangent_angle_at(0.0) - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn straight_bezier_matches_chord_length() {
        let curve = CubicBezierPath::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(3.0, 0.0),
        );
        assert!((curve.length() - 3.0).abs() < 1e-9);
        let p = curve.point_at(1.5);
        assert!((p.x - 1.5).abs() < 1e-6);
        assert!(p.y.abs() < 1e-12);
    }

    #[test]
    fn bezier_endpoints_and_tangents() {
        let curve = CubicBezierPath::from_tangents(
            Vec2::new(0.0, 0.0),
            0.0,
            Vec2::new(10.0, 10.0),
            FRAC_PI_2,
        );
        assert_eq!(curve.point_at(0.0), Vec2::new(0.0, 0.0));
        let end = curve.point_at(curve.length());
        assert!((end.x - 10.0).abs() < 1e-9);
        assert!((end.y - 10.0).abs() < 1e-9);
        assert!(curve.tangent_angle_at(0.0).abs() < 1e-9);
        assert!((curve.tangent_angle_at(curve.length()) - FRAC_PI_2).abs() < 1e-9);
        assert!(curve.length() > 10.0_f64.hypot(10.0));
    }

    #[test]
    fn arc_length_parameter_is_monotonic() {
        let curve = CubicBezierPath::from_tangents(
            Vec2::new(-5.0, 2.0),
            1.0,
            Vec2::new(8.0, -3.0),
            -0.5,
        );
        let mut last = -1.0;
        for i in 0..=50 {
            let t = curve.table.param_for_length(curve.length() * i as f64 / 50.0);
            assert!(t >= last);
            last = t;
        }
        assert!((last - 1.0).abs() < 1e-12);
    }
}
