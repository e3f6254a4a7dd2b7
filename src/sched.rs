//! Scheduler adapter - deadline budgets for the cooperative work loop.
//!
//! The engine never owns a scheduler. Whoever drives it passes a [`Deadline`]
//! into each tick; the work loop asks it whether to yield after every
//! completed unit, and never mid-unit. Wall-clock slices suit real drivers;
//! unit quotas make interruption deterministic in tests.

use std::time::{Duration, Instant};

/// Remaining-budget object consulted at fiber boundaries.
pub trait Deadline {
    /// Called after each completed unit of work. Return true to yield
    /// control back to the host scheduler.
    fn should_yield(&mut self) -> bool;
}

// =============================================================================
// TimeSlice
// =============================================================================

/// Wall-clock budget, e.g. one frame's idle time.
#[derive(Debug, Clone, Copy)]
pub struct TimeSlice {
    end: Instant,
}

impl TimeSlice {
    /// Budget starting now.
    pub fn new(budget: Duration) -> Self {
        Self {
            end: Instant::now() + budget,
        }
    }

    /// Time left before the slice expires.
    pub fn remaining(&self) -> Duration {
        self.end.saturating_duration_since(Instant::now())
    }
}

impl Deadline for TimeSlice {
    fn should_yield(&mut self) -> bool {
        Instant::now() >= self.end
    }
}

// =============================================================================
// UnitQuota
// =============================================================================

/// Fixed number of units per tick. Deterministic, so tests can interrupt a
/// pass at an exact fiber boundary.
#[derive(Debug, Clone, Copy)]
pub struct UnitQuota {
    left: usize,
}

impl UnitQuota {
    /// Allow `units` units of work before yielding.
    pub fn new(units: usize) -> Self {
        Self { left: units }
    }
}

impl Deadline for UnitQuota {
    fn should_yield(&mut self) -> bool {
        self.left = self.left.saturating_sub(1);
        self.left == 0
    }
}

// =============================================================================
// NoYield
// =============================================================================

/// Unlimited budget: the pass runs to completion in one tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoYield;

impl Deadline for NoYield {
    fn should_yield(&mut self) -> bool {
        false
    }
}

// =============================================================================
// Tests
// =============================================================================
