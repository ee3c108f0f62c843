use std::sync::Arc;
use std::time::Duration;

use crate::geometry::{Pose2d, Vec2};

use super::path::{LinePath, ParametricPath};

/// How the robot heading evolves along a path segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeadingProfile {
    /// Heading follows the direction of travel.
    Tangent,
    /// Heading stays fixed (strafing).
    Constant(f64),
    /// Heading interpolates linearly in arc length from `start` to `end`.
    Linear { start: f64, end: f64 },
}

#[derive(Debug, Clone)]
pub struct PathSegment {
    path: Arc<dyn ParametricPath>,
    heading: HeadingProfile,
    duration: Duration,
}

impl PathSegment {
    pub fn new(path: Arc<dyn ParametricPath>, heading: HeadingProfile, duration: Duration) -> Self {
        Self {
            path,
            heading,
            duration,
        }
    }

    pub fn path(&self) -> &dyn ParametricPath {
        self.path.as_ref()
    }

    pub fn length(&self) -> f64 {
        self.path.length()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn heading_at(&self, distance: f64) -> f64 {
        match self.heading {
            HeadingProfile::Tangent => self.path.tangent_angle_at(distance),
            HeadingProfile::Constant(heading) => heading,
            HeadingProfile::Linear { start, end } => {
                let length = self.path.length();
                if length <= 0.0 {
                    return start;
                }
                start + (end - start) * (distance.clamp(0.0, length) / length)
            }
        }
    }

    pub fn pose_at_distance(&self, distance: f64) -> Pose2d {
        Pose2d {
            position: self.path.point_at(distance),
            heading: self.heading_at(distance),
        }
    }

    /// Pose after `elapsed`, traversing arc length at constant speed.
    pub fn pose_at(&self, elapsed: Duration) -> Pose2d {
        let fraction = duration_fraction(elapsed, self.duration);
        self.pose_at_distance(fraction * self.path.length())
    }
}

/// In-place rotation. `rotation` is signed: positive is counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnSegment {
    pub start: Pose2d,
    pub rotation: f64,
    pub duration: Duration,
}

impl TurnSegment {
    pub fn end_heading(&self) -> f64 {
        self.start.heading + self.rotation
    }

    /// Midpoint between start and end heading, without wrapping.
    pub fn diagonal_heading(&self) -> f64 {
        (self.start.heading + self.end_heading()) / 2.0
    }

    pub fn pose_at(&self, elapsed: Duration) -> Pose2d {
        let fraction = duration_fraction(elapsed, self.duration);
        Pose2d {
            position: self.start.position,
            heading: self.start.heading + self.rotation * fraction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitSegment {
    pub pose: Pose2d,
    pub duration: Duration,
}

#[derive(Debug, Clone)]
pub enum Segment {
    Path(PathSegment),
    Turn(TurnSegment),
    Wait(WaitSegment),
}

impl Segment {
    pub fn duration(&self) -> Duration {
        match self {
            Segment::Path(segment) => segment.duration(),
            Segment::Turn(segment) => segment.duration,
            Segment::Wait(segment) => segment.duration,
        }
    }

    pub fn start_pose(&self) -> Pose2d {
        match self {
            Segment::Path(segment) => segment.pose_at_distance(0.0),
            Segment::Turn(segment) => segment.start,
            Segment::Wait(segment) => segment.pose,
        }
    }

    pub fn end_pose(&self) -> Pose2d {
        match self {
            Segment::Path(segment) => segment.pose_at_distance(segment.length()),
            Segment::Turn(segment) => Pose2d {
                position: segment.start.position,
                heading: segment.end_heading(),
            },
            Segment::Wait(segment) => segment.pose,
        }
    }

    pub fn pose_at(&self, elapsed: Duration) -> Pose2d {
        match self {
            Segment::Path(segment) => segment.pose_at(elapsed),
            Segment::Turn(segment) => segment.pose_at(elapsed),
            Segment::Wait(segment) => segment.pose,
        }
    }
}

/// Planner output: an ordered, read-only list of segments.
///
/// Cloning shares the underlying path curves.
#[derive(Debug, Clone, Default)]
pub struct TrajectorySequence {
    segments: Vec<Segment>,
    duration: Duration,
}

impl TrajectorySequence {
    pub fn new(segments: Vec<Segment>) -> Self {
        let duration = segments.iter().map(Segment::duration).sum();
        Self { segments, duration }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn start_pose(&self) -> Option<Pose2d> {
        self.segments.first().map(Segment::start_pose)
    }

    pub fn end_pose(&self) -> Option<Pose2d> {
        self.segments.last().map(Segment::end_pose)
    }

    /// Pose at playback time `elapsed`, clamped to the end of the sequence.
    pub fn pose_at(&self, elapsed: Duration) -> Option<Pose2d> {
        let mut remaining = elapsed;
        for segment in &self.segments {
            let duration = segment.duration();
            if remaining < duration {
                return Some(segment.pose_at(remaining));
            }
            remaining -= duration;
        }
        self.end_pose()
    }
}

fn duration_fraction(elapsed: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
}

/// Straight-line helper used by callers that only have two points.
pub fn line_segment(start: Vec2, end: Vec2, heading: HeadingProfile, duration: Duration) -> Segment {
    Segment::Path(PathSegment::new(
        Arc::new(LinePath::new(start, end)),
        heading,
        duration,
    ))
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use super::*;

    fn sample_sequence() -> TrajectorySequence {
        TrajectorySequence::new(vec![
            line_segment(
                Vec2::new(0.0, 0.0),
                Vec2::new(10.0, 0.0),
                HeadingProfile::Tangent,
                Duration::from_secs(2),
            ),
            Segment::Turn(TurnSegment {
                start: Pose2d::new(10.0, 0.0, 0.0),
                rotation: FRAC_PI_2,
                duration: Duration::from_secs(1),
            }),
            Segment::Wait(WaitSegment {
                pose: Pose2d::new(10.0, 0.0, FRAC_PI_2),
                duration: Duration::from_millis(500),
            }),
        ])
    }

    #[test]
    fn sequence_duration_is_sum_of_segments() {
        assert_eq!(sample_sequence().duration(), Duration::from_millis(3500));
    }

    #[test]
    fn pose_at_walks_segments_in_order() {
        let sequence = sample_sequence();
        let mid_path = sequence.pose_at(Duration::from_secs(1)).expect("pose");
        assert!((mid_path.position.x - 5.0).abs() < 1e-9);
        assert!(mid_path.heading.abs() < 1e-12);

        let mid_turn = sequence.pose_at(Duration::from_millis(2500)).expect("pose");
        assert!((mid_turn.position.x - 10.0).abs() < 1e-9);
        assert!((mid_turn.heading - FRAC_PI_2 / 2.0).abs() < 1e-9);

        let past_end = sequence.pose_at(Duration::from_secs(60)).expect("pose");
        assert!((past_end.heading - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn empty_sequence_has_no_pose() {
        let sequence = TrajectorySequence::default();
        assert!(sequence.is_empty());
        assert!(sequence.pose_at(Duration::ZERO).is_none());
        assert_eq!(sequence.duration(), Duration::ZERO);
    }

    #[test]
    fn linear_heading_profile_interpolates_by_distance() {
        let segment = PathSegment::new(
            Arc::new(LinePath::new(Vec2::new(0.0, 0.0), Vec2::new(0.0, 8.0))),
            HeadingProfile::Linear {
                start: 0.0,
                end: PI,
            },
            Duration::from_secs(1),
        );
        assert!((segment.heading_at(4.0) - FRAC_PI_2).abs() < 1e-12);
        assert!((segment.heading_at(20.0) - PI).abs() < 1e-12);
    }

    #[test]
    fn turn_diagonal_is_unwrapped_midpoint() {
        let turn = TurnSegment {
            start: Pose2d::new(0.0, 0.0, 3.0),
            rotation: 1.0,
            duration: Duration::from_secs(1),
        };
        assert!((turn.diagonal_heading() - 3.5).abs() < 1e-12);
        assert!((turn.end_heading() - 4.0).abs() < 1e-12);
    }
}
