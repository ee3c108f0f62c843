use std::f64::consts::FRAC_PI_2;

use crate::app::entity::{EntityBehavior, Renderable, Themed};
use crate::app::rendering::FieldPainter;
use crate::app::theme::ColorScheme;
use crate::geometry::Vec2;

const COMPASS_RADIUS: f64 = 5.0;
const COMPASS_MARGIN: f64 = 3.0;
const RING_WIDTH: f64 = 0.4;
const NEEDLE_WIDTH: f64 = 0.6;
const HUB_RADIUS: f64 = 0.8;

/// Compass rose in the lower-left corner of the field; north is field +y.
#[derive(Debug, Clone)]
pub struct CompassEntity {
    scheme: ColorScheme,
    center: Vec2,
}

impl CompassEntity {
    pub fn new(field_size: f64, scheme: ColorScheme) -> Self {
        let inset = field_size * 0.5 - COMPASS_RADIUS - COMPASS_MARGIN;
        Self {
            scheme,
            center: Vec2::new(-inset, -inset),
        }
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn north_tip(&self) -> Vec2 {
        self.center + Vec2::from_angle(FRAC_PI_2) * COMPASS_RADIUS
    }
}

impl EntityBehavior for CompassEntity {
    fn name(&self) -> &str {
        "compass"
    }

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        Some(self)
    }

    fn as_themed(&mut self) -> Option<&mut dyn Themed> {
        Some(self)
    }
}

impl Renderable for CompassEntity {
    fn render(&self, painter: &mut FieldPainter<'_>) {
        let palette = self.scheme.palette();
        painter.ring(self.center, COMPASS_RADIUS, RING_WIDTH, palette.compass);
        for quarter in 1..4 {
            let tip = self.center + Vec2::from_angle(FRAC_PI_2 * (quarter as f64 + 1.0)) * COMPASS_RADIUS;
            painter.line(self.center, tip, RING_WIDTH, palette.compass);
        }
        painter.line(self.center, self.north_tip(), NEEDLE_WIDTH, palette.compass_north);
        painter.disc(self.center, HUB_RADIUS, palette.compass);
    }
}

impl Themed for CompassEntity {
    fn switch_scheme(&mut self, scheme: ColorScheme) {
        self.scheme = scheme;
    }
}
