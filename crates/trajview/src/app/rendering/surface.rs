use image::RgbaImage;

use crate::geometry::Vec2;

pub type Rgba = [u8; 4];

const MIN_HALF_WIDTH_PX: f64 = 0.5;

/// CPU-side RGBA8 frame. All drawing is clipped to the surface bounds; every
/// coordinate argument is in screen pixels.
#[derive(Debug, Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    frame: Vec<u8>,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame: vec![0; frame_len(width, height)],
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        self.frame = vec![0; frame_len(width, height)];
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    pub fn clear(&mut self, color: Rgba) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let offset = self.byte_offset(x as i32, y as i32)?;
        let mut out = [0; 4];
        out.copy_from_slice(&self.frame[offset..offset + 4]);
        Some(out)
    }

    pub fn write_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if let Some(offset) = self.byte_offset(x, y) {
            self.frame[offset..offset + 4].copy_from_slice(&color);
        }
    }

    /// Source-over blend of `color` onto the pixel at `(x, y)`.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        let alpha = color[3];
        if alpha == 0 {
            return;
        }
        if alpha == u8::MAX {
            self.write_pixel(x, y, color);
            return;
        }
        let Some(offset) = self.byte_offset(x, y) else {
            return;
        };
        let a = alpha as u32;
        let inv = 255 - a;
        let dst = &mut self.frame[offset..offset + 4];
        for channel in 0..3 {
            dst[channel] = ((color[channel] as u32 * a + dst[channel] as u32 * inv) / 255) as u8;
        }
        dst[3] = dst[3].max(alpha);
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, rect_width: i32, rect_height: i32, color: Rgba) {
        let start_x = x.max(0);
        let start_y = y.max(0);
        let end_x = x.saturating_add(rect_width).min(self.width as i32);
        let end_y = y.saturating_add(rect_height).min(self.height as i32);
        for py in start_y..end_y {
            for px in start_x..end_x {
                self.blend_pixel(px, py, color);
            }
        }
    }

    /// Round-capped stroke between two points.
    pub fn stroke_line(&mut self, from: Vec2, to: Vec2, width_px: f64, color: Rgba) {
        let half = half_width(width_px);
        let Some((min_x, min_y, max_x, max_y)) = self.clip_box(
            from.x.min(to.x) - half,
            from.y.min(to.y) - half,
            from.x.max(to.x) + half,
            from.y.max(to.y) + half,
        ) else {
            return;
        };
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let center = pixel_center(x, y);
                if distance_to_segment(center, from, to) <= half {
                    self.blend_pixel(x, y, color);
                }
            }
        }
    }

    pub fn stroke_polyline(&mut self, points: &[Vec2], width_px: f64, color: Rgba) {
        for pair in points.windows(2) {
            self.stroke_line(pair[0], pair[1], width_px, color);
        }
    }

    pub fn stroke_ring(&mut self, center: Vec2, radius_px: f64, width_px: f64, color: Rgba) {
        let half = half_width(width_px);
        let outer = radius_px + half;
        let Some((min_x, min_y, max_x, max_y)) = self.clip_box(
            center.x - outer,
            center.y - outer,
            center.x + outer,
            center.y + outer,
        ) else {
            return;
        };
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let distance = pixel_center(x, y).distance(center);
                if (distance - radius_px).abs() <= half {
                    self.blend_pixel(x, y, color);
                }
            }
        }
    }

    pub fn fill_disc(&mut self, center: Vec2, radius_px: f64, color: Rgba) {
        let radius = radius_px.max(MIN_HALF_WIDTH_PX);
        let Some((min_x, min_y, max_x, max_y)) = self.clip_box(
            center.x - radius,
            center.y - radius,
            center.x + radius,
            center.y + radius,
        ) else {
            return;
        };
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                if pixel_center(x, y).distance(center) <= radius {
                    self.blend_pixel(x, y, color);
                }
            }
        }
    }

    /// Nearest-neighbour scaled copy of `image` into the given destination
    /// rectangle. Fully transparent source pixels are skipped.
    pub fn blit_scaled(&mut self, image: &RgbaImage, left: i32, top: i32, dest_w: u32, dest_h: u32) {
        if image.width() == 0 || image.height() == 0 || dest_w == 0 || dest_h == 0 {
            return;
        }
        let draw_left = left.max(0);
        let draw_top = top.max(0);
        let draw_right = left.saturating_add(dest_w as i32).min(self.width as i32);
        let draw_bottom = top.saturating_add(dest_h as i32).min(self.height as i32);
        if draw_left >= draw_right || draw_top >= draw_bottom {
            return;
        }

        let x_ratio = image.width() as f64 / dest_w as f64;
        let y_ratio = image.height() as f64 / dest_h as f64;
        for out_y in draw_top..draw_bottom {
            let src_y = (((out_y - top) as f64) * y_ratio) as u32;
            let src_y = src_y.min(image.height() - 1);
            for out_x in draw_left..draw_right {
                let src_x = (((out_x - left) as f64) * x_ratio) as u32;
                let src_x = src_x.min(image.width() - 1);
                self.blend_pixel(out_x, out_y, image.get_pixel(src_x, src_y).0);
            }
        }
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        // Buffer length always matches the dimensions, see `frame_len`.
        RgbaImage::from_raw(self.width, self.height, self.frame.clone())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    fn byte_offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let pixel_offset = (y as usize)
            .checked_mul(self.width as usize)
            .and_then(|row| row.checked_add(x as usize))?;
        let byte_offset = pixel_offset.checked_mul(4)?;
        if byte_offset + 4 > self.frame.len() {
            return None;
        }
        Some(byte_offset)
    }

    fn clip_box(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Option<(i32, i32, i32, i32)> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        if ![min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite()) {
            return None;
        }
        let min_x = (min_x.floor() as i64).max(0);
        let min_y = (min_y.floor() as i64).max(0);
        let max_x = (max_x.ceil() as i64).min(self.width as i64 - 1);
        let max_y = (max_y.ceil() as i64).min(self.height as i64 - 1);
        if min_x > max_x || min_y > max_y {
            return None;
        }
        Some((min_x as i32, min_y as i32, max_x as i32, max_y as i32))
    }
}

fn frame_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

fn half_width(width_px: f64) -> f64 {
    (width_px * 0.5).max(MIN_HALF_WIDTH_PX)
}

fn pixel_center(x: i32, y: i32) -> Vec2 {
    Vec2::new(x as f64 + 0.5, y as f64 + 0.5)
}

fn distance_to_segment(point: Vec2, a: Vec2, b: Vec2) -> f64 {
    let ab = b - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq <= f64::EPSILON {
        return point.distance(a);
    }
    let ap = point - a;
    let t = ((ap.x * ab.x + ap.y * ab.y) / len_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}
