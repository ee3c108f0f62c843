use std::ops::{Add, Mul, Sub};

/// Point or direction in either field units or screen pixels; the owning API
/// says which.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector rotated `angle_radians` counter-clockwise from +x.
    pub fn from_angle(angle_radians: f64) -> Self {
        Self {
            x: angle_radians.cos(),
            y: angle_radians.sin(),
        }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f64 {
        (other - self).length()
    }

    /// Angle of the vector from +x, in `(-PI, PI]`.
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn lerp(self, other: Vec2, t: f64) -> Vec2 {
        self + (other - self) * t
    }

    pub fn rotated(self, angle_radians: f64) -> Vec2 {
        let (sin, cos) = angle_radians.sin_cos();
        Vec2 {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Field-space position plus heading (radians, counter-clockwise from +x).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose2d {
    pub position: Vec2,
    pub heading: f64,
}

impl Pose2d {
    pub const fn new(x: f64, y: f64, heading: f64) -> Self {
        Self {
            position: Vec2::new(x, y),
            heading,
        }
    }

    pub fn heading_vec(&self) -> Vec2 {
        Vec2::from_angle(self.heading)
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;

    #[test]
    fn rotation_by_quarter_turn_swaps_axes() {
        let rotated = Vec2::new(1.0, 0.0).rotated(FRAC_PI_2);
        assert!(rotated.x.abs() < 1e-12);
        assert!((rotated.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn lerp_hits_endpoints_and_midpoint() {
        let a = Vec2::new(-2.0, 4.0);
        let b = Vec2::new(6.0, 0.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Vec2::new(2.0, 2.0));
    }

    #[test]
    fn angle_of_from_angle_round_trips() {
        for angle in [-3.0, -1.0, 0.0, 0.5, 2.5] {
            assert!((Vec2::from_angle(angle).angle() - angle).abs() < 1e-12);
        }
    }
}
