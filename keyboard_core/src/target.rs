//! Rectangular hit targets with a one-shot activation latch.
//!
//! A target fires at most once per continuous hover: the latch is set when a
//! hovering pointer fires it and is only cleared once the pointer leaves the
//! (tolerance-expanded) box.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::hand::GestureSample;

/// Default hit-test margin in frame pixels.
pub const DEFAULT_TOLERANCE: i32 = 10;

// ════════════════════════════════════════════════════════════════════════════
// Point
// ════════════════════════════════════════════════════════════════════════════

/// A point in frame-pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point { x, y }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TargetState
// ════════════════════════════════════════════════════════════════════════════

/// Where a target sits in the hover/latch state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetState {
    /// Pointer is outside the box; latch is clear.
    Idle,
    /// Pointer is inside and the target can still fire.
    HoveredArmed,
    /// Pointer is inside and the target already fired during this hover.
    HoveredLatched,
}

/// Result of feeding one gesture sample to one target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The pointer is not over the target; the latch was cleared.
    Released,
    /// The pointer is over the target but nothing fired.
    Hovering,
    /// The target fired on this sample.
    Fired,
}

// ════════════════════════════════════════════════════════════════════════════
// InteractiveTarget
// ════════════════════════════════════════════════════════════════════════════

/// A labelled rectangle that can be pointed at and activated.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractiveTarget {
    /// Top-left corner.
    pub pos:    Point,
    pub width:  u32,
    pub height: u32,
    pub label:  String,
    activated:  bool,
}

impl InteractiveTarget {
    pub fn new(pos: impl Into<Point>, width: u32, height: u32, label: impl Into<String>) -> Self {
        InteractiveTarget {
            pos: pos.into(),
            width,
            height,
            label: label.into(),
            activated: false,
        }
    }

    pub fn right(&self) -> i32 {
        saturate(self.pos.x as i64 + self.width as i64)
    }

    pub fn bottom(&self) -> i32 {
        saturate(self.pos.y as i64 + self.height as i64)
    }

    /// True while the current hover has already fired.
    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Is `point` strictly inside the box grown by `tolerance` on every side?
    ///
    /// Points lying exactly on the grown boundary are outside.
    pub fn contains(&self, point: Point, tolerance: i32) -> bool {
        // widened so extreme sizes and tolerances cannot overflow
        let (x, y, tol) = (point.x as i64, point.y as i64, tolerance as i64);
        let left = self.pos.x as i64;
        let top  = self.pos.y as i64;
        left - tol < x
            && x < left + self.width as i64 + tol
            && top - tol < y
            && y < top + self.height as i64 + tol
    }

    /// Derived state for a given pointer, without mutating anything.
    pub fn state(&self, pointer: Option<Point>, tolerance: i32) -> TargetState {
        match pointer {
            Some(p) if self.contains(p, tolerance) => {
                if self.activated { TargetState::HoveredLatched } else { TargetState::HoveredArmed }
            }
            _ => TargetState::Idle,
        }
    }

    /// Advance the state machine by one sample.
    pub fn update(&mut self, sample: &GestureSample, tolerance: i32) -> Transition {
        if !self.contains(sample.pointer, tolerance) {
            self.release();
            return Transition::Released;
        }
        if sample.trigger_active && !self.activated {
            self.activated = true;
            debug!(label = %self.label, "target fired");
            return Transition::Fired;
        }
        Transition::Hovering
    }

    /// Drop back to idle, re-arming the target.
    pub fn release(&mut self) {
        if self.activated {
            debug!(label = %self.label, "target re-armed");
        }
        self.activated = false;
    }
}

/// Clamp a widened coordinate back into `i32`.
pub(crate) fn saturate(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

impl AsMut<InteractiveTarget> for InteractiveTarget {
    fn as_mut(&mut self) -> &mut InteractiveTarget {
        self
    }
}

// ════════════════════════════════════════════════════════════════════════════
// First-match scan
// ════════════════════════════════════════════════════════════════════════════

/// Outcome of scanning one ordered group of targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Index of the first target containing the pointer.
    pub hovered: Option<usize>,
    /// Set when that target fired on this sample.
    pub fired:   bool,
}

impl ScanOutcome {
    /// Index of the target that fired, if any.
    pub fn fired_index(&self) -> Option<usize> {
        if self.fired { self.hovered } else { None }
    }
}

/// Feed `sample` to `targets` in order, stopping at the first one that
/// contains the pointer.
///
/// Targets ahead of the match are released; targets after it are left
/// untouched for this frame.
pub fn scan<T: AsMut<InteractiveTarget>>(
    targets:   &mut [T],
    sample:    &GestureSample,
    tolerance: i32,
) -> ScanOutcome {
    for (i, target) in targets.iter_mut().enumerate() {
        match target.as_mut().update(sample, tolerance) {
            Transition::Released => continue,
            Transition::Hovering => return ScanOutcome { hovered: Some(i), fired: false },
            Transition::Fired    => return ScanOutcome { hovered: Some(i), fired: true  },
        }
    }
    ScanOutcome::default()
}

/// Release every target in the group.
pub fn release_all<T: AsMut<InteractiveTarget>>(targets: &mut [T]) {
    for t in targets {
        t.as_mut().release();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
