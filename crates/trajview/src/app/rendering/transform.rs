use crate::geometry::Vec2;

/// Real-world extent of one side of the square field, in field units.
pub const DEFAULT_FIELD_SIZE: f64 = 144.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Field <-> screen mapping for the current canvas size.
///
/// The field origin sits at the canvas center, field +y points up and screen
/// +y points down. One scale factor (smaller canvas side over field size) is
/// applied to both axes so the whole field stays visible and undistorted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldTransform {
    viewport: Viewport,
    field_size: f64,
    pixels_per_unit: f64,
}

impl FieldTransform {
    pub fn new(viewport: Viewport, field_size: f64) -> Self {
        let field_size = normalize_field_size(field_size);
        let viewport = Viewport {
            width: viewport.width.max(1),
            height: viewport.height.max(1),
        };
        Self {
            viewport,
            field_size,
            pixels_per_unit: compute_pixels_per_unit(viewport, field_size),
        }
    }

    /// Returns true when the canvas size actually changed. Zero-sized canvases
    /// (minimized windows) are ignored.
    pub fn resize(&mut self, viewport: Viewport) -> bool {
        if viewport.is_empty() || viewport == self.viewport {
            return false;
        }
        self.viewport = viewport;
        self.pixels_per_unit = compute_pixels_per_unit(viewport, self.field_size);
        true
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn field_size(&self) -> f64 {
        self.field_size
    }

    pub fn pixels_per_unit(&self) -> f64 {
        self.pixels_per_unit
    }

    pub fn field_to_screen(&self, field: Vec2) -> Vec2 {
        Vec2 {
            x: self.viewport.width as f64 * 0.5 + field.x * self.pixels_per_unit,
            y: self.viewport.height as f64 * 0.5 - field.y * self.pixels_per_unit,
        }
    }

    pub fn screen_to_field(&self, screen: Vec2) -> Vec2 {
        Vec2 {
            x: (screen.x - self.viewport.width as f64 * 0.5) / self.pixels_per_unit,
            y: (self.viewport.height as f64 * 0.5 - screen.y) / self.pixels_per_unit,
        }
    }

    pub fn field_to_screen_px(&self, field: Vec2) -> (i32, i32) {
        let screen = self.field_to_screen(field);
        (screen.x.round() as i32, screen.y.round() as i32)
    }

    /// Converts a real-world length (radius, stroke width) to pixels.
    pub fn length_to_px(&self, units: f64) -> f64 {
        units * self.pixels_per_unit
    }

    /// Screen-space square covered by the field: `(left, top, side)`.
    pub fn field_rect_px(&self) -> (i32, i32, u32) {
        let side = self.length_to_px(self.field_size);
        let top_left = self.field_to_screen(Vec2::new(
            -self.field_size * 0.5,
            self.field_size * 0.5,
        ));
        (
            top_left.x.round() as i32,
            top_left.y.round() as i32,
            side.round().max(1.0) as u32,
        )
    }
}

fn normalize_field_size(field_size: f64) -> f64 {
    if field_size.is_finite() && field_size > 0.0 {
        field_size
    } else {
        DEFAULT_FIELD_SIZE
    }
}

fn compute_pixels_per_unit(viewport: Viewport, field_size: f64) -> f64 {
    viewport.width.min(viewport.height).max(1) as f64 / field_size
}
