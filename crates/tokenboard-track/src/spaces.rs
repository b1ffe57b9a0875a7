use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokenboard_core::Extent;

#[derive(Debug, Default, Clone)]
struct Slots {
    board: Option<Extent>,
    display: Option<Extent>,
    map: Option<Extent>,
    minimap: Option<Extent>,
}

/// Shared read access to the current coordinate-space extents.
///
/// One registry is built at startup and handed by reference to the
/// calibrator, tracker and renderer; there is no process-wide global.
/// Extents are replaced wholesale, never mutated in place. Replacing
/// the map extent additionally raises a change signal that the
/// tracker's next update consumes exactly once.
#[derive(Debug, Default)]
pub struct SpaceRegistry {
    slots: Mutex<Slots>,
    map_changed: AtomicBool,
}

impl SpaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        // A poisoned registry means a panic already unwound through a
        // setter; the slots themselves are plain copies and stay valid.
        match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn board(&self) -> Option<Extent> {
        self.slots().board
    }

    /// Publish the calibrated board extent.
    pub fn set_board(&self, extent: Extent) {
        self.slots().board = Some(extent);
    }

    pub fn display(&self) -> Option<Extent> {
        self.slots().display
    }

    /// Publish the projector viewport extent (window resize).
    pub fn set_display(&self, extent: Extent) {
        self.slots().display = Some(extent);
    }

    pub fn map(&self) -> Option<Extent> {
        self.slots().map
    }

    /// Publish a new map extent (pan/zoom or server handshake) and
    /// raise the change signal.
    pub fn set_map(&self, extent: Extent) {
        self.slots().map = Some(extent);
        self.map_changed.store(true, Ordering::Release);
    }

    pub fn minimap(&self) -> Option<Extent> {
        self.slots().minimap
    }

    pub fn set_minimap(&self, extent: Extent) {
        self.slots().minimap = Some(extent);
    }

    /// Consume the map-changed signal. Single consumer by contract:
    /// the tracker's update step 6.
    pub fn take_map_changed(&self) -> bool {
        self.map_changed.swap(false, Ordering::AcqRel)
    }
}
