use std::f64::consts::{FRAC_PI_2, PI};
use std::sync::Arc;
use std::time::Duration;

use trajview::trajectory::line_segment;
use trajview::{
    CubicBezierPath, HeadingProfile, PathSegment, Pose2d, Segment, Simulation, TrajectorySequence,
    TurnSegment, Vec2, WaitSegment,
};

/// Square-ish lap through all three segment kinds.
fn lap_sequence() -> TrajectorySequence {
    TrajectorySequence::new(vec![
        line_segment(
            Vec2::new(-48.0, -48.0),
            Vec2::new(0.0, -48.0),
            HeadingProfile::Tangent,
            Duration::from_secs(2),
        ),
        Segment::Turn(TurnSegment {
            start: Pose2d::new(0.0, -48.0, 0.0),
            rotation: FRAC_PI_2,
            duration: Duration::from_secs(1),
        }),
        Segment::Path(PathSegment::new(
            Arc::new(CubicBezierPath::new(
                Vec2::new(0.0, -48.0),
                Vec2::new(0.0, -20.0),
                Vec2::new(20.0, 0.0),
                Vec2::new(48.0, 0.0),
            )),
            HeadingProfile::Tangent,
            Duration::from_secs(3),
        )),
        Segment::Wait(WaitSegment {
            pose: Pose2d::new(48.0, 0.0, 0.0),
            duration: Duration::from_secs(1),
        }),
        line_segment(
            Vec2::new(48.0, 0.0),
            Vec2::new(48.0, 48.0),
            HeadingProfile::Constant(0.0),
            Duration::from_secs(2),
        ),
        Segment::Turn(TurnSegment {
            start: Pose2d::new(48.0, 48.0, 0.0),
            rotation: -FRAC_PI_2,
            duration: Duration::from_millis(800),
        }),
    ])
}

/// Strafing pass that spins in place before curving back.
fn strafe_sequence() -> TrajectorySequence {
    TrajectorySequence::new(vec![
        line_segment(
            Vec2::new(-60.0, 20.0),
            Vec2::new(-20.0, 20.0),
            HeadingProfile::Linear { start: 0.0, end: PI },
            Duration::from_millis(2_500),
        ),
        Segment::Wait(WaitSegment {
            pose: Pose2d::new(-20.0, 20.0, PI),
            duration: Duration::from_millis(500),
        }),
        Segment::Turn(TurnSegment {
            start: Pose2d::new(-20.0, 20.0, PI),
            rotation: -FRAC_PI_2,
            duration: Duration::from_secs(1),
        }),
        Segment::Path(PathSegment::new(
            Arc::new(CubicBezierPath::new(
                Vec2::new(-20.0, 20.0),
                Vec2::new(-20.0, 50.0),
                Vec2::new(-40.0, 60.0),
                Vec2::new(-60.0, 40.0),
            )),
            HeadingProfile::Tangent,
            Duration::from_secs(3),
        )),
    ])
}

pub(crate) fn demo_sequences() -> Vec<TrajectorySequence> {
    vec![lap_sequence(), strafe_sequence()]
}

/// Queues a trajectory and a robot for every demo sequence. Returns the number
/// of sequences installed.
pub(crate) fn install(simulation: &mut Simulation) -> usize {
    let sequences = demo_sequences();
    let count = sequences.len();
    for sequence in sequences {
        let sequence = Arc::new(sequence);
        simulation.add_trajectory(Arc::clone(&sequence));
        simulation.add_robot(sequence);
    }
    count
}

#[cfg(test)]
mod tests {
    use trajview::app::DEFAULT_FIELD_SIZE;
    use trajview::PathSampler;

    use super::*;

    #[test]
    fn demo_segments_are_positionally_continuous() {
        for sequence in demo_sequences() {
            for pair in sequence.segments().windows(2) {
                let end = pair[0].end_pose().position;
                let start = pair[1].start_pose().position;
                assert!(end.distance(start) < 1e-9, "gap between {end:?} and {start:?}");
            }
        }
    }

    #[test]
    fn demo_paths_stay_on_the_field() {
        let half = DEFAULT_FIELD_SIZE / 2.0;
        for sequence in demo_sequences() {
            for segment in sequence.segments() {
                let Segment::Path(path) = segment else {
                    continue;
                };
                for sample in &PathSampler::new(path.path(), 1.0, 0.0) {
                    let position = sample.position;
                    assert!(position.x.abs() <= half && position.y.abs() <= half);
                }
            }
        }
    }

    #[test]
    fn demo_sequences_have_playback_time() {
        for sequence in demo_sequences() {
            assert!(!sequence.is_empty());
            assert!(sequence.duration() > Duration::ZERO);
        }
    }
}
