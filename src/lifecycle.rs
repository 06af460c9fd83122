//! Phases of one wake cycle and the timer that ends it.

use std::fmt;
use std::time::Duration;

use log::info;

use crate::fetch::Completeness;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    NetworkUp,
    DataFetched(Completeness),
    Rendered,
    Sleeping,
}

impl Phase {
    fn rank(self) -> u8 {
        match self {
            Phase::Init => 0,
            Phase::NetworkUp => 1,
            Phase::DataFetched(_) => 2,
            Phase::Rendered => 3,
            Phase::Sleeping => 4,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Init => f.write_str("init"),
            Phase::NetworkUp => f.write_str("network-up"),
            Phase::DataFetched(Completeness::Full) => f.write_str("data-fetched(full)"),
            Phase::DataFetched(Completeness::Partial) => f.write_str("data-fetched(partial)"),
            Phase::Rendered => f.write_str("rendered"),
            Phase::Sleeping => f.write_str("sleeping"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("cannot go from {from} to {to}")]
    OutOfOrder { from: Phase, to: Phase },
    #[error("already sleeping")]
    Terminal,
}

/// Tracks the current phase. Phases advance one step at a time; `Sleeping`
/// may be entered from anywhere so a failed cycle still powers down.
#[derive(Debug)]
pub struct Lifecycle {
    phase: Phase,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Lifecycle { phase: Phase::Init }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn advance(&mut self, to: Phase) -> Result<(), LifecycleError> {
        let from = self.phase;
        if from == Phase::Sleeping {
            return Err(LifecycleError::Terminal);
        }
        if to != Phase::Sleeping && to.rank() != from.rank() + 1 {
            return Err(LifecycleError::OutOfOrder { from, to });
        }
        info!("phase {} -> {}", from, to);
        self.phase = to;
        Ok(())
    }
}

/// Timer wake computed from a monotonic clock in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakeAlarm {
    deadline_us: u64,
}

impl WakeAlarm {
    pub fn arm(now_us: u64, interval: Duration) -> Self {
        let interval_us = u64::try_from(interval.as_micros()).unwrap_or(u64::MAX);
        WakeAlarm {
            deadline_us: now_us.saturating_add(interval_us),
        }
    }

    pub fn deadline_us(&self) -> u64 {
        self.deadline_us
    }

    /// Time left until the deadline, zero once it has passed.
    pub fn remaining_at(&self, now_us: u64) -> Duration {
        Duration::from_micros(self.deadline_us.saturating_sub(now_us))
    }
}
