//! Viewport scheduler
//!
//! Watches visibility fractions for the vertically scrolling broadcast list
//! and derives exactly one active index. A slot becomes active the first
//! time its visible fraction crosses the threshold; when several cross, the
//! most recent crossing wins. The initial active index is 0 before any
//! crossing has occurred.

/// Derives the single active slot index from visibility events.
#[derive(Debug, Clone)]
pub struct ViewportScheduler {
    threshold: f32,
    active_index: usize,
    /// Per-slot crossing latch: a slot must drop back below the threshold
    /// before it can cross (and win) again.
    above: Vec<bool>,
}

impl ViewportScheduler {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            active_index: 0,
            above: Vec::new(),
        }
    }

    /// Feed one visibility event. Returns `Some(new_index)` only when the
    /// active index changes; the caller must deactivate the previous slot's
    /// session before activating the new one.
    pub fn observe(&mut self, slot: usize, visible_fraction: f32) -> Option<usize> {
        if slot >= self.above.len() {
            self.above.resize(slot + 1, false);
        }

        let was_above = self.above[slot];
        let is_above = visible_fraction >= self.threshold;
        self.above[slot] = is_above;

        if is_above && !was_above && self.active_index != slot {
            self.active_index = slot;
            tracing::debug!(slot, visible_fraction, "active index changed");
            return Some(slot);
        }

        None
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// Forget all crossings, e.g. when the broadcast list is refetched.
    pub fn reset(&mut self) {
        self.active_index = 0;
        self.above.clear();
    }
}
