use std::f64::consts::PI;

use crate::geometry::Vec2;

use super::surface::{Rgba, Surface};
use super::transform::FieldTransform;

const ARC_STEPS_PER_HALF_TURN: f64 = 24.0;

/// Draws field-space geometry onto a [`Surface`]. Positions go through
/// [`FieldTransform::field_to_screen`] and lengths through
/// [`FieldTransform::length_to_px`], so everything stays proportional when the
/// canvas is resized.
pub struct FieldPainter<'a> {
    surface: &'a mut Surface,
    transform: &'a FieldTransform,
}

impl<'a> FieldPainter<'a> {
    pub fn new(surface: &'a mut Surface, transform: &'a FieldTransform) -> Self {
        Self { surface, transform }
    }

    pub fn transform(&self) -> &FieldTransform {
        self.transform
    }

    pub fn surface(&mut self) -> &mut Surface {
        self.surface
    }

    pub fn line(&mut self, from: Vec2, to: Vec2, width: f64, color: Rgba) {
        let from = self.transform.field_to_screen(from);
        let to = self.transform.field_to_screen(to);
        let width_px = self.transform.length_to_px(width);
        self.surface.stroke_line(from, to, width_px, color);
    }

    pub fn polyline(&mut self, points: &[Vec2], width: f64, color: Rgba) {
        if points.len() < 2 {
            return;
        }
        let screen = points
            .iter()
            .map(|point| self.transform.field_to_screen(*point))
            .collect::<Vec<_>>();
        let width_px = self.transform.length_to_px(width);
        self.surface.stroke_polyline(&screen, width_px, color);
    }

    pub fn ring(&mut self, center: Vec2, radius: f64, width: f64, color: Rgba) {
        let center = self.transform.field_to_screen(center);
        self.surface.stroke_ring(
            center,
            self.transform.length_to_px(radius),
            self.transform.length_to_px(width),
            color,
        );
    }

    pub fn disc(&mut self, center: Vec2, radius: f64, color: Rgba) {
        let center = self.transform.field_to_screen(center);
        self.surface
            .fill_disc(center, self.transform.length_to_px(radius), color);
    }

    /// Arc around `center` starting at `start_angle` and sweeping `sweep`
    /// radians (positive is counter-clockwise in field space).
    pub fn arc(&mut self, center: Vec2, radius: f64, start_angle: f64, sweep: f64, width: f64, color: Rgba) {
        let points = arc_points(center, radius, start_angle, sweep);
        self.polyline(&points, width, color);
    }
}

/// Field-space polyline approximating an arc, endpoints included.
pub fn arc_points(center: Vec2, radius: f64, start_angle: f64, sweep: f64) -> Vec<Vec2> {
    let steps = ((sweep.abs() / PI) * ARC_STEPS_PER_HALF_TURN).ceil().max(1.0) as usize;
    (0..=steps)
        .map(|i| {
            let angle = start_angle + sweep * i as f64 / steps as f64;
            center + Vec2::from_angle(angle) * radius
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;
    use crate::app::rendering::Viewport;

    #[test]
    fn arc_points_span_start_to_end() {
        let points = arc_points(Vec2::ZERO, 2.0, 0.0, FRAC_PI_2);
        let first = points[0];
        let last = *points.last().expect("last");
        assert!((first.x - 2.0).abs() < 1e-12 && first.y.abs() < 1e-12);
        assert!(last.x.abs() < 1e-12 && (last.y - 2.0).abs() < 1e-12);
        assert!(points.iter().all(|p| (p.length() - 2.0).abs() < 1e-12));
    }

    #[test]
    fn zero_sweep_arc_is_a_single_step() {
        assert_eq!(arc_points(Vec2::ZERO, 1.0, 0.3, 0.0).len(), 2);
    }

    #[test]
    fn disc_lands_at_transformed_position() {
        let transform = FieldTransform::new(Viewport::new(144, 144), 144.0);
        let mut surface = Surface::new(144, 144);
        FieldPainter::new(&mut surface, &transform).disc(Vec2::new(10.0, 10.0), 2.0, [9, 9, 9, 255]);
        assert_eq!(surface.pixel(82, 61), Some([9, 9, 9, 255]));
        assert_eq!(surface.pixel(72, 72), Some([0, 0, 0, 0]));
    }
}
