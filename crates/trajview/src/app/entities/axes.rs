use crate::app::entity::{EntityBehavior, Renderable, Themed};
use crate::app::rendering::FieldPainter;
use crate::app::theme::ColorScheme;
use crate::geometry::Vec2;

const AXIS_WIDTH: f64 = 0.35;
const TICK_SPACING: f64 = 12.0;
const TICK_HALF_LENGTH: f64 = 1.0;

/// Field x/y axes through the origin with a tick every [`TICK_SPACING`] units.
#[derive(Debug, Clone)]
pub struct AxesEntity {
    scheme: ColorScheme,
    half_extent: f64,
}

impl AxesEntity {
    pub fn new(field_size: f64, scheme: ColorScheme) -> Self {
        Self {
            scheme,
            half_extent: field_size * 0.5,
        }
    }

    /// Tick offsets along either axis, origin excluded.
    pub fn tick_offsets(&self) -> Vec<f64> {
        let count = (self.half_extent / TICK_SPACING).floor() as i32;
        (-count..=count)
            .filter(|index| *index != 0)
            .map(|index| index as f64 * TICK_SPACING)
            .collect()
    }
}

impl EntityBehavior for AxesEntity {
    fn name(&self) -> &str {
        "axes"
    }

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        Some(self)
    }

    fn as_themed(&mut self) -> Option<&mut dyn Themed> {
        Some(self)
    }
}

impl Renderable for AxesEntity {
    fn render(&self, painter: &mut FieldPainter<'_>) {
        let color = self.scheme.palette().axis;
        let extent = self.half_extent;
        painter.line(Vec2::new(-extent, 0.0), Vec2::new(extent, 0.0), AXIS_WIDTH, color);
        painter.line(Vec2::new(0.0, -extent), Vec2::new(0.0, extent), AXIS_WIDTH, color);
        for offset in self.tick_offsets() {
            painter.line(
                Vec2::new(offset, -TICK_HALF_LENGTH),
                Vec2::new(offset, TICK_HALF_LENGTH),
                AXIS_WIDTH,
                color,
            );
            painter.line(
                Vec2::new(-TICK_HALF_LENGTH, offset),
                Vec2::new(TICK_HALF_LENGTH, offset),
                AXIS_WIDTH,
                color,
            );
        }
    }
}

impl Themed for AxesEntity {
    fn switch_scheme(&mut self, scheme: ColorScheme) {
        self.scheme = scheme;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::rendering::{FieldTransform, Surface, Viewport};

    #[test]
    fn ticks_cover_field_symmetrically() {
        let axes = AxesEntity::new(144.0, ColorScheme::Dark);
        let ticks = axes.tick_offsets();
        assert_eq!(ticks.len(), 12);
        assert_eq!(ticks.first().copied(), Some(-72.0));
        assert_eq!(ticks.last().copied(), Some(72.0));
        assert!(!ticks.contains(&0.0));
    }

    #[test]
    fn axes_use_current_scheme_color() {
        let mut axes = AxesEntity::new(144.0, ColorScheme::Dark);
        axes.switch_scheme(ColorScheme::Light);

        let transform = FieldTransform::new(Viewport::new(288, 288), 144.0);
        let mut surface = Surface::new(288, 288);
        axes.render(&mut FieldPainter::new(&mut surface, &transform));
        assert_eq!(surface.pixel(144, 20), Some(ColorScheme::Light.palette().axis));
        assert_eq!(surface.pixel(20, 144), Some(ColorScheme::Light.palette().axis));
    }
}
