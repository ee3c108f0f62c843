use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use super::rendering::{Surface, Viewport};

static FRAME_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Default)]
struct FrameSlot {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    generation: u64,
}

/// Latest finished frame, published by the loop thread and presented by the
/// window thread.
#[derive(Debug, Clone, Default)]
pub struct SharedFrame {
    slot: Arc<Mutex<FrameSlot>>,
}

impl SharedFrame {
    pub fn publish(&self, surface: &Surface) {
        let mut slot = self.lock("publish");
        slot.width = surface.width();
        slot.height = surface.height();
        slot.pixels.clear();
        slot.pixels.extend_from_slice(surface.frame());
        slot.generation = slot.generation.wrapping_add(1);
    }

    pub fn viewport(&self) -> Viewport {
        let slot = self.lock("viewport");
        Viewport::new(slot.width, slot.height)
    }

    /// Copies the latest frame into `target` when it is newer than
    /// `seen_generation` and matches the target size. Returns true on copy.
    pub fn copy_latest_into(&self, target: &mut [u8], viewport: Viewport, seen_generation: &mut u64) -> bool {
        let slot = self.lock("copy");
        if slot.generation == *seen_generation {
            return false;
        }
        if Viewport::new(slot.width, slot.height) != viewport || slot.pixels.len() != target.len() {
            return false;
        }
        target.copy_from_slice(&slot.pixels);
        *seen_generation = slot.generation;
        true
    }

    fn lock(&self, operation: &'static str) -> MutexGuard<'_, FrameSlot> {
        match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                if FRAME_LOCK_POISON_WARNED
                    .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
                    .is_ok()
                {
                    warn!(operation, "frame lock poisoned; recovered inner value");
                }
                poisoned.into_inner()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn copy_only_happens_for_new_matching_frames() {
        let shared = SharedFrame::default();
        let mut surface = Surface::new(2, 1);
        surface.clear([1, 2, 3, 4]);
        shared.publish(&surface);

        let mut target = vec![0; 8];
        let mut seen = 0;
        assert!(shared.copy_latest_into(&mut target, Viewport::new(2, 1), &mut seen));
        assert_eq!(target, vec![1, 2, 3, 4, 1, 2, 3, 4]);
        assert_eq!(seen, 1);

        assert!(!shared.copy_latest_into(&mut target, Viewport::new(2, 1), &mut seen));

        surface.resize(4, 4);
        shared.publish(&surface);
        assert!(!shared.copy_latest_into(&mut target, Viewport::new(2, 1), &mut seen));
        assert_eq!(shared.viewport(), Viewport::new(4, 4));
    }

    #[test]
    fn poisoned_slot_still_accepts_frames() {
        let shared = SharedFrame::default();
        let poisoner = shared.clone();
        let _ = thread::spawn(move || {
            let _guard = poisoner.slot.lock().expect("lock");
            panic!("poison frame lock");
        })
        .join();

        shared.publish(&Surface::new(1, 1));
        let mut target = vec![0; 4];
        let mut seen = 0;
        assert!(shared.copy_latest_into(&mut target, Viewport::new(1, 1), &mut seen));
        assert_eq!(seen, 1);
    }
}
