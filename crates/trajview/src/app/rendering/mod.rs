mod background;
mod painter;
mod surface;
mod transform;

pub use background::{Background, BackgroundLayer};
pub use painter::{arc_points, FieldPainter};
pub use surface::{Rgba, Surface};
pub use transform::{FieldTransform, Viewport, DEFAULT_FIELD_SIZE};
