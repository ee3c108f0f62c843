use std::path::Path;

use image::{ImageReader, RgbaImage};
use serde::Deserialize;
use tracing::info;

use crate::app::{ColorScheme, Palette, SimError};
use crate::geometry::Vec2;

use super::surface::Surface;
use super::transform::FieldTransform;

const GRID_CELL_UNITS: f64 = 6.0;
const GRID_MAJOR_EVERY: i32 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Background {
    #[default]
    GridDark,
    GridLight,
    FieldTiles,
    FieldCarpet,
}

/// Image-backed variants and their files under the assets directory.
const BACKGROUND_IMAGES: &[(Background, &str)] = &[
    (Background::FieldTiles, "backgrounds/field_tiles.png"),
    (Background::FieldCarpet, "backgrounds/field_carpet.png"),
];

impl Background {
    pub fn image_path(self) -> Option<&'static str> {
        BACKGROUND_IMAGES
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, path)| *path)
    }

    pub fn is_procedural(self) -> bool {
        self.image_path().is_none()
    }

    /// Procedural grids follow the active scheme; image backgrounds are fixed.
    pub fn for_scheme(self, scheme: ColorScheme) -> Self {
        if !self.is_procedural() {
            return self;
        }
        match scheme {
            ColorScheme::Dark => Background::GridDark,
            ColorScheme::Light => Background::GridLight,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackgroundLayer {
    kind: Background,
    scheme: ColorScheme,
    image: Option<RgbaImage>,
}

impl BackgroundLayer {
    /// Loads the image for image-backed variants. A missing or undecodable
    /// file is an error; no fallback is substituted.
    pub fn load(kind: Background, scheme: ColorScheme, assets_dir: &Path) -> Result<Self, SimError> {
        let image = match kind.image_path() {
            Some(relative) => {
                let path = assets_dir.join(relative);
                let image = load_background_rgba(&path)?;
                info!(
                    background = ?kind,
                    path = %path.display(),
                    width = image.width(),
                    height = image.height(),
                    "background_loaded"
                );
                Some(image)
            }
            None => None,
        };
        Ok(Self {
            kind: kind.for_scheme(scheme),
            scheme,
            image,
        })
    }

    pub fn kind(&self) -> Background {
        self.kind
    }

    pub fn switch_scheme(&mut self, scheme: ColorScheme) {
        self.scheme = scheme;
        self.kind = self.kind.for_scheme(scheme);
    }

    pub fn draw(&self, surface: &mut Surface, transform: &FieldTransform) {
        let palette = self.palette();
        surface.clear(palette.clear);
        let (left, top, side) = transform.field_rect_px();
        match &self.image {
            Some(image) => surface.blit_scaled(image, left, top, side, side),
            None => draw_field_grid(surface, transform, palette),
        }
    }

    fn palette(&self) -> &'static Palette {
        match self.kind {
            Background::GridDark => ColorScheme::Dark.palette(),
            Background::GridLight => ColorScheme::Light.palette(),
            Background::FieldTiles | Background::FieldCarpet => self.scheme.palette(),
        }
    }
}

fn load_background_rgba(path: &Path) -> Result<RgbaImage, SimError> {
    let background_error = |message: String| SimError::BackgroundLoad {
        path: path.to_path_buf(),
        message,
    };
    let reader = ImageReader::open(path)
        .map_err(|error| background_error(format!("file_open_failed:{error}")))?;
    let decoded = reader
        .decode()
        .map_err(|error| background_error(format!("decode_failed:{error}")))?;
    Ok(decoded.to_rgba8())
}

/// Grid lines are confined to the field square.
fn draw_field_grid(surface: &mut Surface, transform: &FieldTransform, palette: &Palette) {
    let (left, top, side) = transform.field_rect_px();
    let half_field = transform.field_size() * 0.5;
    let cells = (half_field / GRID_CELL_UNITS).floor() as i32;

    for index in -cells..=cells {
        let offset = index as f64 * GRID_CELL_UNITS;
        let color = if is_major_index(index) {
            palette.grid_major
        } else {
            palette.grid_minor
        };
        let (x, _) = transform.field_to_screen_px(Vec2::new(offset, 0.0));
        surface.fill_rect(x, top, 1, side as i32, color);
        let (_, y) = transform.field_to_screen_px(Vec2::new(0.0, offset));
        surface.fill_rect(left, y, side as i32, 1, color);
    }
}

fn is_major_index(index: i32) -> bool {
    index.rem_euclid(GRID_MAJOR_EVERY) == 0
}
