use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::app::entity::{EntityBehavior, EntityId, RegistryAware, Renderable, Themed, Updatable};
use crate::app::registry::EntityCommands;
use crate::app::rendering::FieldPainter;
use crate::app::simulation::SimError;
use crate::app::theme::ColorScheme;
use crate::geometry::{Pose2d, Vec2};
use crate::trajectory::TrajectorySequence;

/// Side length of the square robot footprint, in field units.
pub const ROBOT_SIZE: f64 = 18.0;
const OUTLINE_WIDTH: f64 = 0.6;
const HEADING_WIDTH: f64 = 0.8;

/// Plays a sequence back in real time, looping at the end.
#[derive(Debug)]
pub struct RobotEntity {
    sequence: Arc<TrajectorySequence>,
    playback: Duration,
    pose: Pose2d,
    scheme: ColorScheme,
}

impl RobotEntity {
    pub fn new(sequence: Arc<TrajectorySequence>, scheme: ColorScheme) -> Self {
        let pose = sequence.start_pose().unwrap_or_default();
        Self {
            sequence,
            playback: Duration::ZERO,
            pose,
            scheme,
        }
    }

    pub fn pose(&self) -> Pose2d {
        self.pose
    }

    pub fn playback(&self) -> Duration {
        self.playback
    }

    pub fn reset(&mut self) {
        self.seek(Duration::ZERO);
    }

    fn seek(&mut self, playback: Duration) {
        self.playback = playback;
        self.pose = self
            .sequence
            .pose_at(playback)
            .unwrap_or(self.pose);
    }

    /// Footprint corners in counter-clockwise order, rotated by the heading.
    pub fn footprint(&self) -> [Vec2; 4] {
        let half = ROBOT_SIZE * 0.5;
        [
            Vec2::new(half, half),
            Vec2::new(-half, half),
            Vec2::new(-half, -half),
            Vec2::new(half, -half),
        ]
        .map(|corner| self.pose.position + corner.rotated(self.pose.heading))
    }
}

impl EntityBehavior for RobotEntity {
    fn name(&self) -> &str {
        "robot"
    }

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        Some(self)
    }

    fn as_updatable(&mut self) -> Option<&mut dyn Updatable> {
        Some(self)
    }

    fn as_themed(&mut self) -> Option<&mut dyn Themed> {
        Some(self)
    }

    fn as_registry_aware(&mut self) -> Option<&mut dyn RegistryAware> {
        Some(self)
    }
}

impl Updatable for RobotEntity {
    fn update(&mut self, elapsed: Duration, _commands: &mut EntityCommands) -> Result<(), SimError> {
        let total = self.sequence.duration();
        if total.is_zero() {
            return Ok(());
        }
        let advanced = self.playback.saturating_add(elapsed).as_nanos() % total.as_nanos();
        self.seek(Duration::from_nanos(advanced as u64));
        Ok(())
    }
}

impl Renderable for RobotEntity {
    fn render(&self, painter: &mut FieldPainter<'_>) {
        let palette = self.scheme.palette();
        let corners = self.footprint();
        let outline = [corners[0], corners[1], corners[2], corners[3], corners[0]];
        painter.polyline(&outline, OUTLINE_WIDTH, palette.robot_body);
        let front = self.pose.position + self.pose.heading_vec() * (ROBOT_SIZE * 0.5);
        painter.line(self.pose.position, front, HEADING_WIDTH, palette.robot_heading);
    }
}

impl Themed for RobotEntity {
    fn switch_scheme(&mut self, scheme: ColorScheme) {
        self.scheme = scheme;
    }
}

impl RegistryAware for RobotEntity {
    fn on_added(&mut self, id: EntityId) {
        self.reset();
        debug!(
            entity = %id,
            duration_ms = self.sequence.duration().as_millis() as u64,
            "robot_playback_started"
        );
    }

    fn on_removed(&mut self, id: EntityId) {
        debug!(
            entity = %id,
            playback_ms = self.playback.as_millis() as u64,
            "robot_playback_stopped"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;
    use crate::trajectory::{line_segment, HeadingProfile, Segment, TurnSegment};

    fn sequence() -> Arc<TrajectorySequence> {
        Arc::new(TrajectorySequence::new(vec![
            line_segment(
                Vec2::ZERO,
                Vec2::new(10.0, 0.0),
                HeadingProfile::Tangent,
                Duration::from_secs(1),
            ),
            Segment::Turn(TurnSegment {
                start: Pose2d::new(10.0, 0.0, 0.0),
                rotation: FRAC_PI_2,
                duration: Duration::from_secs(1),
            }),
        ]))
    }

    fn step(robot: &mut RobotEntity, elapsed: Duration) {
        let mut commands = EntityCommands::default();
        robot.update(elapsed, &mut commands).expect("update");
        assert!(commands.is_empty());
    }

    #[test]
    fn playback_follows_sequence_and_loops() {
        let mut robot = RobotEntity::new(sequence(), ColorScheme::Dark);
        assert_eq!(robot.pose().position, Vec2::ZERO);

        step(&mut robot, Duration::from_millis(500));
        assert!((robot.pose().position.x - 5.0).abs() < 1e-9);

        step(&mut robot, Duration::from_millis(1_000));
        assert!((robot.pose().position.x - 10.0).abs() < 1e-9);
        assert!((robot.pose().heading - FRAC_PI_2 / 2.0).abs() < 1e-9);

        step(&mut robot, Duration::from_millis(750));
        assert_eq!(robot.playback(), Duration::from_millis(250));
        assert!((robot.pose().position.x - 2.5).abs() < 1e-9);
    }

    #[test]
    fn empty_sequence_keeps_robot_at_origin() {
        let mut robot = RobotEntity::new(Arc::new(TrajectorySequence::default()), ColorScheme::Dark);
        step(&mut robot, Duration::from_secs(3));
        assert_eq!(robot.pose(), Pose2d::default());
        assert_eq!(robot.playback(), Duration::ZERO);
    }

    #[test]
    fn registry_add_resets_playback() {
        let mut robot = RobotEntity::new(sequence(), ColorScheme::Dark);
        step(&mut robot, Duration::from_millis(400));
        robot.on_added(EntityId(1));
        assert_eq!(robot.playback(), Duration::ZERO);
    }

    #[test]
    fn footprint_rotates_with_heading() {
        let mut robot = RobotEntity::new(sequence(), ColorScheme::Dark);
        step(&mut robot, Duration::from_millis(2_000));
        // wrapped to the start: heading 0, axis-aligned square
        let corners = robot.footprint();
        assert!((corners[0].x - 9.0).abs() < 1e-9 && (corners[0].y - 9.0).abs() < 1e-9);

        step(&mut robot, Duration::from_millis(1_999));
        let corners = robot.footprint();
        let heading = robot.pose().heading;
        let expected = robot.pose().position + Vec2::new(9.0, 9.0).rotated(heading);
        assert!((corners[0].x - expected.x).abs() < 1e-9);
        assert!((corners[0].y - expected.y).abs() < 1e-9);
    }
}
