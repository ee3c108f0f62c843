use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::geometry::Vec2;

use super::rendering::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerAction {
    TogglePause,
    ToggleOverlay,
    SwitchScheme,
    ExportImage,
    Quit,
}

/// Pointer activity in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Moved(Vec2),
    Left,
}

const NO_CURSOR: u64 = u64::MAX;

/// Latest cursor position, written by the window thread and read by the loop
/// thread. Both coordinates live in one atomic so readers never see a torn
/// update.
#[derive(Debug, Clone)]
pub struct CursorTracker {
    packed: Arc<AtomicU64>,
}

impl Default for CursorTracker {
    fn default() -> Self {
        Self {
            packed: Arc::new(AtomicU64::new(NO_CURSOR)),
        }
    }
}

impl CursorTracker {
    pub fn set(&self, screen: Vec2) {
        if !screen.x.is_finite() || !screen.y.is_finite() {
            return;
        }
        let packed = pack_pair((screen.x as f32).to_bits(), (screen.y as f32).to_bits());
        self.packed.store(packed, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        self.packed.store(NO_CURSOR, Ordering::Relaxed);
    }

    pub fn position(&self) -> Option<Vec2> {
        let packed = self.packed.load(Ordering::Relaxed);
        if packed == NO_CURSOR {
            return None;
        }
        let (x, y) = unpack_pair(packed);
        Some(Vec2::new(f32::from_bits(x) as f64, f32::from_bits(y) as f64))
    }

    pub fn apply(&self, event: PointerEvent) {
        match event {
            PointerEvent::Moved(screen) => self.set(screen),
            PointerEvent::Left => self.clear(),
        }
    }
}

/// Canvas size published by the window host and picked up by the loop before
/// the next render.
#[derive(Debug, Clone)]
pub struct SharedCanvasSize {
    packed: Arc<AtomicU64>,
}

impl SharedCanvasSize {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            packed: Arc::new(AtomicU64::new(pack_pair(viewport.width, viewport.height))),
        }
    }

    pub fn set(&self, viewport: Viewport) {
        self.packed
            .store(pack_pair(viewport.width, viewport.height), Ordering::Relaxed);
    }

    pub fn get(&self) -> Viewport {
        let (width, height) = unpack_pair(self.packed.load(Ordering::Relaxed));
        Viewport::new(width, height)
    }
}

fn pack_pair(high: u32, low: u32) -> u64 {
    ((high as u64) << 32) | low as u64
}

fn unpack_pair(packed: u64) -> (u32, u32) {
    ((packed >> 32) as u32, packed as u32)
}
