use std::collections::VecDeque;
use std::sync::Arc;

use crate::canvas::PixelSurface;

// ============================================================================
// SURFACE SNAPSHOT - full-canvas history entry
// ============================================================================

/// Immutable copy of a surface's pixels taken at an edit boundary.
///
/// Cloning only bumps the reference count, so handing an entry back out of the
/// history buffer never copies pixel data.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceSnapshot {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl SurfaceSnapshot {
    pub fn capture(surface: &PixelSurface) -> Self {
        Self {
            width: surface.width(),
            height: surface.height(),
            pixels: Arc::from(surface.as_raw()),
        }
    }

    /// Rebuild a surface holding exactly the captured pixels.
    pub fn to_surface(&self) -> PixelSurface {
        let mut surface = PixelSurface::new(self.width, self.height);
        surface.copy_from_raw(&self.pixels);
        surface
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn memory_bytes(&self) -> usize {
        self.pixels.len()
    }
}

// ============================================================================
// HISTORY BUFFER - bounded linear undo/redo
// ============================================================================

/// Bounded undo/redo buffer with a cursor.
///
/// Entries before the cursor are the past (reachable by `undo`), entries at or
/// after it are the future (reachable by `redo`, dropped by the next `push`).
/// At most `max_size` entries are kept; the oldest is evicted on overflow.
#[derive(Clone, Debug)]
pub struct HistoryBuffer<T> {
    entries: VecDeque<T>,
    position: usize,
    max_size: usize,
}

impl<T> Default for HistoryBuffer<T> {
    fn default() -> Self {
        Self::new(50)
    }
}

impl<T> HistoryBuffer<T> {
    /// A `max_size` of zero is treated as one.
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            entries: VecDeque::with_capacity(max_size.min(64) + 1),
            position: 0,
            max_size,
        }
    }

    /// Drop the future, append `entry` and advance the cursor. On overflow the
    /// oldest entry is evicted and the cursor stays put.
    pub fn push(&mut self, entry: T) {
        self.entries.truncate(self.position);
        self.entries.push_back(entry);

        if self.entries.len() > self.max_size {
            self.entries.pop_front();
            log::debug!("history: evicted oldest entry (max {})", self.max_size);
        } else {
            self.position += 1;
        }
    }

    /// Step the cursor back and return the entry it now points at.
    pub fn undo(&mut self) -> Option<&T> {
        if self.position == 0 {
            return None;
        }
        self.position -= 1;
        self.entries.get(self.position)
    }

    /// Return the entry at the cursor and step past it.
    pub fn redo(&mut self) -> Option<&T> {
        if self.position == self.entries.len() {
            return None;
        }
        self.position += 1;
        self.entries.get(self.position - 1)
    }

    /// The most recent entry before the cursor.
    pub fn current(&self) -> Option<&T> {
        self.position.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    pub fn can_undo(&self) -> bool {
        self.position > 0
    }

    pub fn can_redo(&self) -> bool {
        self.position < self.entries.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Number of entries reachable through `undo`.
    pub fn undo_count(&self) -> usize {
        self.position
    }

    /// Number of entries reachable through `redo`.
    pub fn redo_count(&self) -> usize {
        self.entries.len() - self.position
    }

    /// Shrink or grow the capacity. Shrinking evicts the oldest entries first.
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size.max(1);
        while self.entries.len() > self.max_size {
            self.entries.pop_front();
            self.position = self.position.saturating_sub(1);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.position = 0;
    }
}

impl HistoryBuffer<SurfaceSnapshot> {
    /// Total pixel bytes held across all snapshots.
    pub fn memory_usage(&self) -> usize {
        self.entries.iter().map(SurfaceSnapshot::memory_bytes).sum()
    }
}
