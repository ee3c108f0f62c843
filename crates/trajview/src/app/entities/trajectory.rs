use std::sync::Arc;

use crate::app::entity::{EntityBehavior, PointerInteractive, Renderable, Themed};
use crate::app::input::PointerEvent;
use crate::app::rendering::{FieldPainter, FieldTransform};
use crate::app::theme::ColorScheme;
use crate::geometry::Vec2;
use crate::trajectory::{
    draw_geometry, SegmentGeometry, SegmentRenderer, SegmentStyle, TrajectorySequence,
};

/// Cursor distance, in field units, that counts as hovering a path.
pub const HOVER_RADIUS: f64 = 2.0;

/// Draws one trajectory sequence. Geometry lives in field space, so it is
/// built once per sequence and reused across resizes.
#[derive(Debug)]
pub struct TrajectoryEntity {
    sequence: Option<Arc<TrajectorySequence>>,
    geometry: Vec<SegmentGeometry>,
    renderer: SegmentRenderer,
    scheme: ColorScheme,
    hovered: bool,
}

impl TrajectoryEntity {
    pub fn new(renderer: SegmentRenderer, scheme: ColorScheme) -> Self {
        Self {
            sequence: None,
            geometry: Vec::new(),
            renderer,
            scheme,
            hovered: false,
        }
    }

    pub fn with_sequence(mut self, sequence: Arc<TrajectorySequence>) -> Self {
        self.set_sequence(Some(sequence));
        self
    }

    /// Replaces the active sequence wholesale; `None` clears it.
    pub fn set_sequence(&mut self, sequence: Option<Arc<TrajectorySequence>>) {
        self.geometry = sequence
            .as_deref()
            .map(|sequence| self.renderer.sequence_geometry(sequence))
            .unwrap_or_default();
        self.sequence = sequence;
        self.hovered = false;
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn geometry(&self) -> &[SegmentGeometry] {
        &self.geometry
    }

    fn style(&self) -> SegmentStyle {
        let palette = self.scheme.palette();
        if self.hovered {
            SegmentStyle::highlighted(palette)
        } else {
            SegmentStyle::from_palette(palette)
        }
    }

    fn is_near_path(&self, field: Vec2) -> bool {
        self.geometry.iter().any(|geometry| match geometry {
            SegmentGeometry::Path(path) => path
                .points
                .iter()
                .any(|point| point.distance(field) <= HOVER_RADIUS),
            SegmentGeometry::Turn(_) | SegmentGeometry::Wait(_) => false,
        })
    }
}

impl EntityBehavior for TrajectoryEntity {
    fn name(&self) -> &str {
        "trajectory"
    }

    fn as_renderable(&self) -> Option<&dyn Renderable> {
        Some(self)
    }

    fn as_themed(&mut self) -> Option<&mut dyn Themed> {
        Some(self)
    }

    fn as_pointer_interactive(&mut self) -> Option<&mut dyn PointerInteractive> {
        Some(self)
    }

    fn trajectory(&self) -> Option<&TrajectorySequence> {
        self.sequence.as_deref()
    }
}

impl Renderable for TrajectoryEntity {
    fn render(&self, painter: &mut FieldPainter<'_>) {
        let style = self.style();
        for geometry in &self.geometry {
            draw_geometry(painter, geometry, &style);
        }
    }
}

impl Themed for TrajectoryEntity {
    fn switch_scheme(&mut self, scheme: ColorScheme) {
        self.scheme = scheme;
    }
}

impl PointerInteractive for TrajectoryEntity {
    fn on_pointer(&mut self, event: PointerEvent, transform: &FieldTransform) {
        self.hovered = match event {
            PointerEvent::Moved(screen) => self.is_near_path(transform.screen_to_field(screen)),
            PointerEvent::Left => false,
        };
    }
}
