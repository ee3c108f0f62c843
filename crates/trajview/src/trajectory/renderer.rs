use std::f64::consts::{FRAC_PI_2, FRAC_PI_6, PI};

use crate::app::{FieldPainter, Palette, Rgba};
use crate::geometry::Vec2;

use super::sampler::{trailing_heading, PathSampler};
use super::segment::{PathSegment, Segment, TrajectorySequence, TurnSegment, WaitSegment};

// All lengths below are field units.
pub const DEFAULT_SAMPLE_SPACING: f64 = 1.2;
pub const PATH_TRIM_DISTANCE: f64 = 1.5;
pub const PATH_STROKE_WIDTH: f64 = 0.5;
pub const PATH_OUTLINE_WIDTH: f64 = 2.0;
pub const START_MARKER_RADIUS: f64 = 1.5;
pub const MARKER_STROKE_WIDTH: f64 = 0.4;
pub const ARROW_LENGTH: f64 = 2.5;
pub const ARROW_HALF_ANGLE: f64 = FRAC_PI_6;
pub const TURN_MARKER_RADIUS: f64 = 1.5;
pub const TURN_ARC_RADIUS: f64 = 5.0;
pub const TURN_ARROW_LENGTH: f64 = 1.5;
pub const WAIT_MARKER_RADIUS: f64 = 1.5;

/// Two strokes meeting at `tip`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrowhead {
    pub tip: Vec2,
    pub wings: [Vec2; 2],
}

impl Arrowhead {
    /// Arrow pointing along `heading`: each wing sits `length` behind the tip,
    /// rotated `half_angle` to either side of the reversed heading.
    pub fn new(tip: Vec2, heading: f64, length: f64, half_angle: f64) -> Self {
        let back = heading + PI;
        Self {
            tip,
            wings: [
                tip + Vec2::from_angle(back + half_angle) * length,
                tip + Vec2::from_angle(back - half_angle) * length,
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathGeometry {
    /// Sampled, trimmed points. May be empty for short paths.
    pub points: Vec<Vec2>,
    pub start_marker: Option<Vec2>,
    pub arrow: Option<Arrowhead>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnGeometry {
    pub center: Vec2,
    pub arc_start: f64,
    pub arc_sweep: f64,
    pub arrow: Arrowhead,
    /// Set when the diagonal heading is below the start heading, which
    /// reverses the arrow's direction of travel around the arc.
    pub flipped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitGeometry {
    pub center: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SegmentGeometry {
    Path(PathGeometry),
    Turn(TurnGeometry),
    Wait(WaitGeometry),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentStyle {
    pub path: Rgba,
    pub path_outline: Rgba,
    pub start_marker: Rgba,
    pub turn_marker: Rgba,
    pub wait_marker: Rgba,
}

impl SegmentStyle {
    pub fn from_palette(palette: &Palette) -> Self {
        Self {
            path: palette.path,
            path_outline: palette.path_outline,
            start_marker: palette.start_marker,
            turn_marker: palette.turn_marker,
            wait_marker: palette.wait_marker,
        }
    }

    pub fn highlighted(palette: &Palette) -> Self {
        Self {
            path: palette.path_hover,
            ..Self::from_palette(palette)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentRenderer {
    sample_spacing: f64,
    trim_distance: f64,
}

impl Default for SegmentRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_SPACING, PATH_TRIM_DISTANCE)
    }
}

impl SegmentRenderer {
    pub fn new(sample_spacing: f64, trim_distance: f64) -> Self {
        Self {
            sample_spacing,
            trim_distance,
        }
    }

    pub fn sample_spacing(&self) -> f64 {
        self.sample_spacing
    }

    pub fn path_geometry(&self, segment: &PathSegment, is_first: bool) -> PathGeometry {
        let sampler = PathSampler::new(segment.path(), self.sample_spacing, self.trim_distance);
        let points = sampler
            .iter()
            .map(|sample| sample.position)
            .collect::<Vec<_>>();
        let arrow = match (points.last(), trailing_heading(&points)) {
            (Some(tip), Some(heading)) => {
                Some(Arrowhead::new(*tip, heading, ARROW_LENGTH, ARROW_HALF_ANGLE))
            }
            _ => None,
        };
        PathGeometry {
            points,
            start_marker: is_first.then(|| segment.path().point_at(0.0)),
            arrow,
        }
    }

    pub fn turn_geometry(segment: &TurnSegment) -> TurnGeometry {
        let start = segment.start.heading;
        let diagonal = segment.diagonal_heading();
        let flipped = diagonal < start;
        let center = segment.start.position;
        let tip = center + Vec2::from_angle(diagonal) * TURN_ARC_RADIUS;
        let travel = if flipped {
            diagonal - FRAC_PI_2
        } else {
            diagonal + FRAC_PI_2
        };
        TurnGeometry {
            center,
            arc_start: start,
            arc_sweep: diagonal - start,
            arrow: Arrowhead::new(tip, travel, TURN_ARROW_LENGTH, ARROW_HALF_ANGLE),
            flipped,
        }
    }

    pub fn wait_geometry(segment: &WaitSegment) -> WaitGeometry {
        WaitGeometry {
            center: segment.pose.position,
        }
    }

    pub fn segment_geometry(&self, segment: &Segment, is_first: bool) -> SegmentGeometry {
        match segment {
            Segment::Path(path) => SegmentGeometry::Path(self.path_geometry(path, is_first)),
            Segment::Turn(turn) => SegmentGeometry::Turn(Self::turn_geometry(turn)),
            Segment::Wait(wait) => SegmentGeometry::Wait(Self::wait_geometry(wait)),
        }
    }

    pub fn sequence_geometry(&self, sequence: &TrajectorySequence) -> Vec<SegmentGeometry> {
        sequence
            .segments()
            .iter()
            .enumerate()
            .map(|(index, segment)| self.segment_geometry(segment, index == 0))
            .collect()
    }

    pub fn draw_sequence(
        &self,
        painter: &mut FieldPainter<'_>,
        sequence: &TrajectorySequence,
        style: &SegmentStyle,
    ) {
        for geometry in self.sequence_geometry(sequence) {
            draw_geometry(painter, &geometry, style);
        }
    }
}

pub fn draw_geometry(painter: &mut FieldPainter<'_>, geometry: &SegmentGeometry, style: &SegmentStyle) {
    match geometry {
        SegmentGeometry::Path(path) => {
            if path.points.len() >= 2 {
                painter.polyline(&path.points, PATH_OUTLINE_WIDTH, style.path_outline);
                painter.polyline(&path.points, PATH_STROKE_WIDTH, style.path);
            }
            if let Some(start) = path.start_marker {
                painter.ring(start, START_MARKER_RADIUS, MARKER_STROKE_WIDTH, style.start_marker);
            }
            if let Some(arrow) = path.arrow {
                draw_arrowhead(painter, &arrow, PATH_STROKE_WIDTH, style.path);
            }
        }
        SegmentGeometry::Turn(turn) => {
            painter.disc(turn.center, TURN_MARKER_RADIUS, style.turn_marker);
            painter.arc(
                turn.center,
                TURN_ARC_RADIUS,
                turn.arc_start,
                turn.arc_sweep,
                MARKER_STROKE_WIDTH,
                style.turn_marker,
            );
            draw_arrowhead(painter, &turn.arrow, MARKER_STROKE_WIDTH, style.turn_marker);
        }
        SegmentGeometry::Wait(wait) => {
            painter.disc(wait.center, WAIT_MARKER_RADIUS, style.wait_marker);
        }
    }
}

fn draw_arrowhead(painter: &mut FieldPainter<'_>, arrow: &Arrowhead, width: f64, color: Rgba) {
    for wing in arrow.wings {
        painter.line(wing, arrow.tip, width, color);
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_4;
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::app::{ColorScheme, FieldTransform, Surface, Viewport};
    use crate::geometry::Pose2d;
    use crate::trajectory::{line_segment, HeadingProfile, LinePath};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn approx_vec(a: Vec2, b: Vec2) -> bool {
        approx(a.x, b.x) && approx(a.y, b.y)
    }

    fn straight(length: f64) -> PathSegment {
        PathSegment::new(
            Arc::new(LinePath::new(Vec2::ZERO, Vec2::new(length, 0.0))),
            HeadingProfile::Tangent,
            Duration::from_secs(1),
        )
    }

    fn turn(rotation_degrees: f64) -> TurnSegment {
        TurnSegment {
            start: Pose2d::new(0.0, 0.0, 0.0),
            rotation: rotation_degrees.to_radians(),
            duration: Duration::from_secs(1),
        }
    }

    #[test]
    fn path_geometry_trims_and_points_arrow_along_travel() {
        let renderer = SegmentRenderer::new(0.1, 2.5);
        let geometry = renderer.path_geometry(&straight(10.0), true);

        assert_eq!(geometry.points.len(), 49);
        assert!(geometry.points.iter().all(|p| p.x > 2.5 && p.x < 7.5));
        assert_eq!(geometry.start_marker, Some(Vec2::ZERO));

        let arrow = geometry.arrow.expect("arrow");
        assert!(approx(arrow.tip.x, 7.4));
        for wing in arrow.wings {
            assert!(wing.x < arrow.tip.x);
            assert!(approx(wing.distance(arrow.tip), ARROW_LENGTH));
        }
        assert!(approx(arrow.wings[0].y, -arrow.wings[1].y));
        assert!(approx(
            arrow.wings[0].y.abs(),
            ARROW_LENGTH * ARROW_HALF_ANGLE.sin()
        ));
    }

    #[test]
    fn only_first_segment_gets_start_marker() {
        let renderer = SegmentRenderer::default();
        let sequence = TrajectorySequence::new(vec![
            Segment::Path(straight(20.0)),
            line_segment(
                Vec2::new(20.0, 0.0),
                Vec2::new(20.0, 20.0),
                HeadingProfile::Tangent,
                Duration::from_secs(1),
            ),
        ]);
        let geometry = renderer.sequence_geometry(&sequence);
        let markers = geometry
            .iter()
            .map(|g| match g {
                SegmentGeometry::Path(path) => path.start_marker.is_some(),
                _ => false,
            })
            .collect::<Vec<_>>();
        assert_eq!(markers, vec![true, false]);
    }

    #[test]
    fn degenerate_path_keeps_marker_but_drops_body_and_arrow() {
        let renderer = SegmentRenderer::new(0.1, 2.5);
        let geometry = renderer.path_geometry(&straight(4.0), true);
        assert!(geometry.points.is_empty());
        assert!(geometry.arrow.is_none());
        assert!(geometry.start_marker.is_some());
    }

    #[test]
    fn single_retained_point_has_no_arrow() {
        // length 1, spacing 0.5: candidates 0, 0.5, 1 -> only 0.5 survives
        let renderer = SegmentRenderer::new(0.5, 0.1);
        let geometry = renderer.path_geometry(&straight(1.0), false);
        assert_eq!(geometry.points.len(), 1);
        assert!(geometry.arrow.is_none());
    }

    #[test]
    fn positive_quarter_turn_arcs_from_zero_to_forty_five_degrees() {
        let geometry = SegmentRenderer::turn_geometry(&turn(90.0));
        assert!(approx(geometry.arc_start, 0.0));
        assert!(approx(geometry.arc_start + geometry.arc_sweep, FRAC_PI_4));
        assert!(!geometry.flipped);

        let expected_tip = Vec2::from_angle(FRAC_PI_4) * TURN_ARC_RADIUS;
        assert!(approx_vec(geometry.arrow.tip, expected_tip));
        // counter-clockwise travel at 45 degrees heads toward 135 degrees
        let travel = 3.0 * FRAC_PI_4;
        let expected = Arrowhead::new(expected_tip, travel, TURN_ARROW_LENGTH, ARROW_HALF_ANGLE);
        assert!(approx_vec(geometry.arrow.wings[0], expected.wings[0]));
        assert!(approx_vec(geometry.arrow.wings[1], expected.wings[1]));
    }

    #[test]
    fn negative_quarter_turn_flips_arrow_direction() {
        let positive = SegmentRenderer::turn_geometry(&turn(90.0));
        let negative = SegmentRenderer::turn_geometry(&turn(-90.0));

        assert!(negative.flipped);
        assert!(approx(negative.arc_start, 0.0));
        assert!(approx(negative.arc_sweep, -FRAC_PI_4));

        let tip = Vec2::from_angle(-FRAC_PI_4) * TURN_ARC_RADIUS;
        assert!(approx_vec(negative.arrow.tip, tip));
        // clockwise travel at -45 degrees heads toward -135 degrees
        let expected = Arrowhead::new(tip, -3.0 * FRAC_PI_4, TURN_ARROW_LENGTH, ARROW_HALF_ANGLE);
        assert!(approx_vec(negative.arrow.wings[0], expected.wings[0]));
        assert!(approx_vec(negative.arrow.wings[1], expected.wings[1]));

        // mirror images across the x axis: the rotation sense is reversed
        for (p, n) in positive.arrow.wings.iter().zip(negative.arrow.wings.iter().rev()) {
            assert!(approx(p.x, n.x));
            assert!(approx(p.y, -n.y));
        }
    }

    #[test]
    fn flip_compares_unwrapped_headings() {
        // Starting just below PI and turning counter-clockwise past it keeps
        // the diagonal above the start heading, so no flip.
        let ccw = TurnSegment {
            start: Pose2d::new(0.0, 0.0, 3.0),
            rotation: 1.0,
            duration: Duration::ZERO,
        };
        assert!(!SegmentRenderer::turn_geometry(&ccw).flipped);

        let cw = TurnSegment {
            start: Pose2d::new(0.0, 0.0, -3.0),
            rotation: -1.0,
            duration: Duration::ZERO,
        };
        assert!(SegmentRenderer::turn_geometry(&cw).flipped);
    }

    #[test]
    fn zero_rotation_turn_is_not_flipped() {
        let geometry = SegmentRenderer::turn_geometry(&turn(0.0));
        assert!(!geometry.flipped);
        assert!(approx(geometry.arc_sweep, 0.0));
    }

    #[test]
    fn wait_geometry_sits_on_pose() {
        let wait = WaitSegment {
            pose: Pose2d::new(3.0, -4.0, 1.0),
            duration: Duration::from_secs(2),
        };
        assert_eq!(
            SegmentRenderer::wait_geometry(&wait).center,
            Vec2::new(3.0, -4.0)
        );
    }

    #[test]
    fn draw_sequence_paints_turn_and_wait_markers_in_distinct_colors() {
        let palette = ColorScheme::Dark.palette();
        let style = SegmentStyle::from_palette(palette);
        let transform = FieldTransform::new(Viewport::new(288, 288), 144.0);
        let mut surface = Surface::new(288, 288);
        let sequence = TrajectorySequence::new(vec![
            Segment::Turn(TurnSegment {
                start: Pose2d::new(-30.0, 0.0, 0.0),
                rotation: FRAC_PI_2,
                duration: Duration::from_secs(1),
            }),
            Segment::Wait(WaitSegment {
                pose: Pose2d::new(30.0, 0.0, 0.0),
                duration: Duration::from_secs(1),
            }),
        ]);
        let renderer = SegmentRenderer::default();
        renderer.draw_sequence(
            &mut FieldPainter::new(&mut surface, &transform),
            &sequence,
            &style,
        );

        let (tx, ty) = transform.field_to_screen_px(Vec2::new(-30.0, 0.0));
        let (wx, wy) = transform.field_to_screen_px(Vec2::new(30.0, 0.0));
        assert_eq!(surface.pixel(tx as u32, ty as u32), Some(palette.turn_marker));
        assert_eq!(surface.pixel(wx as u32, wy as u32), Some(palette.wait_marker));
    }

    #[test]
    fn path_drawing_scales_with_canvas() {
        let palette = ColorScheme::Dark.palette();
        let style = SegmentStyle::from_palette(palette);
        let sequence = TrajectorySequence::new(vec![Segment::Path(straight(40.0))]);
        let renderer = SegmentRenderer::default();

        let count_path_pixels = |size: u32| {
            let transform = FieldTransform::new(Viewport::new(size, size), 144.0);
            let mut surface = Surface::new(size, size);
            renderer.draw_sequence(
                &mut FieldPainter::new(&mut surface, &transform),
                &sequence,
                &style,
            );
            surface
                .frame()
                .chunks_exact(4)
                .filter(|px| px[3] != 0)
                .count()
        };

        assert!(count_path_pixels(576) > 2 * count_path_pixels(288));
    }
}
