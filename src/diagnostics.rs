//! Per-kind warning counters and stage timers, mirroring `mjData::warning`
//! and `mjData::timer` without tying either to a process-global.

use std::time::{Duration, Instant};

use crate::error::{Warning, WarningKind};

/// Count and last-seen index for one [`WarningKind`].
#[derive(Clone, Copy, Debug, Default)]
pub struct WarningCount {
    pub number: u64,
    pub lastinfo: usize,
}

/// Which stage a [`Timer`] accumulates time for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Position,
    Velocity,
    Actuation,
    Acceleration,
    Constraint,
    Integrate,
}

impl TimerKind {
    pub const ALL: [TimerKind; 6] = [
        TimerKind::Position,
        TimerKind::Velocity,
        TimerKind::Actuation,
        TimerKind::Acceleration,
        TimerKind::Constraint,
        TimerKind::Integrate,
    ];
}

/// Per-step diagnostics: warning counters and stage timing, reset once per
/// call to `Simulation::step` the way `mj_resetData` clears `mjData::warning`
/// between runs but accumulates within one.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    warnings: [WarningCount; 4],
    timers: [Duration; 6],
    pub solver_iter: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    fn slot(kind: WarningKind) -> usize {
        WarningKind::ALL.iter().position(|k| *k == kind).unwrap()
    }

    fn timer_slot(kind: TimerKind) -> usize {
        TimerKind::ALL.iter().position(|k| *k == kind).unwrap()
    }

    /// Record a recoverable [`Warning`], bumping its counter and updating
    /// `lastinfo` to the offending index.
    pub fn record(&mut self, warning: Warning) {
        log::warn!("{warning}");
        let slot = &mut self.warnings[Self::slot(warning.kind())];
        slot.number += 1;
        slot.lastinfo = warning.index();
    }

    pub fn warning(&self, kind: WarningKind) -> WarningCount {
        self.warnings[Self::slot(kind)]
    }

    /// Time `f`, adding its wall-clock duration to `kind`'s accumulator.
    pub fn timed<T>(&mut self, kind: TimerKind, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        self.timers[Self::timer_slot(kind)] += start.elapsed();
        result
    }

    pub fn elapsed(&self, kind: TimerKind) -> Duration {
        self.timers[Self::timer_slot(kind)]
    }

    /// Clear warning counters and timers, keeping the allocation.
    pub fn reset(&mut self) {
        *self = Diagnostics::default();
    }
}
