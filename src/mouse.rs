//! Pointer input aggregation.
//!
//! The input side appends [`Motion`]s at any time; the solver drains the
//! whole queue once per frame. Both sides go through one mutex, so a motion
//! is either in the batch being drained or left for the next frame, never
//! lost or seen twice.

use std::sync::{Mutex, MutexGuard, PoisonError};

use glam::Vec2;

/// One pointer sample, in window pixels (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub position: Vec2,
    /// Displacement since the previous sample.
    pub drag: Vec2,
    pub left: bool,
    pub right: bool,
}

#[derive(Debug, Default)]
pub struct Mouse {
    motions: Mutex<Vec<Motion>>,
}

impl Mouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, motion: Motion) {
        self.queue().push(motion);
    }

    /// Takes every queued motion in arrival order, leaving the queue empty.
    pub fn drain(&self) -> Vec<Motion> {
        std::mem::take(&mut *self.queue())
    }

    pub fn len(&self) -> usize {
        self.queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue().is_empty()
    }

    // A panicking producer cannot leave a Vec half-pushed, so the data is
    // still usable after poisoning.
    fn queue(&self) -> MutexGuard<'_, Vec<Motion>> {
        self.motions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Turns raw pointer samples into motions, tracking the previous position
/// to compute the drag.
#[derive(Debug, Default, Clone)]
pub struct PointerTracker {
    last: Option<Vec2>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a sample. Returns a motion when a button is held and the
    /// pointer actually moved since the previous sample.
    pub fn sample(&mut self, position: Vec2, left: bool, right: bool) -> Option<Motion> {
        let previous = self.last.replace(position);
        if !(left || right) {
            return None;
        }
        let drag = position - previous?;
        if drag == Vec2::ZERO {
            return None;
        }
        Some(Motion {
            position,
            drag,
            left,
            right,
        })
    }

    /// Forgets the previous sample, e.g. when the pointer leaves the canvas.
    pub fn release(&mut self) {
        self.last = None;
    }
}
