use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierState {
    Idle,
    Polling,
}

impl fmt::Display for NotifierState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifierState::Idle => write!(f, "idle"),
            NotifierState::Polling => write!(f, "polling"),
        }
    }
}

/// Why a polling cycle did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoLocation,
    CycleInFlight,
    ShuttingDown,
    TooSoon { remaining: Duration },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoLocation => write!(f, "no current location"),
            SkipReason::CycleInFlight => write!(f, "previous cycle still in flight"),
            SkipReason::ShuttingDown => write!(f, "notifier is shutting down"),
            SkipReason::TooSoon { remaining } => {
                write!(f, "minimum interval not elapsed ({:?} remaining)", remaining)
            }
        }
    }
}

/// Admission control for polling cycles.
///
/// Owned by the notifier behind a single mutex: `try_begin` and the matching
/// `complete`/`abort` are the only transitions.
#[derive(Debug)]
pub struct CycleGate {
    state: NotifierState,
    last_completed: Option<Instant>,
    min_interval: Duration,
}

impl CycleGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            state: NotifierState::Idle,
            last_completed: None,
            min_interval,
        }
    }

    pub fn state(&self) -> NotifierState {
        self.state
    }

    pub fn last_completed(&self) -> Option<Instant> {
        self.last_completed
    }

    /// Moves to `Polling` and hands back the location the cycle should use.
    pub fn try_begin<L>(&mut self, now: Instant, location: Option<L>) -> Result<L, SkipReason> {
        let Some(location) = location else {
            return Err(SkipReason::NoLocation);
        };
        if self.state == NotifierState::Polling {
            return Err(SkipReason::CycleInFlight);
        }
        if let Some(last) = self.last_completed {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.min_interval {
                return Err(SkipReason::TooSoon {
                    remaining: self.min_interval - elapsed,
                });
            }
        }
        self.state = NotifierState::Polling;
        Ok(location)
    }

    /// Candidate selection finished; dispatches may still be pending.
    pub fn complete(&mut self, now: Instant) {
        self.last_completed = Some(now);
        self.state = NotifierState::Idle;
    }

    /// The cycle failed before selection. The interval gate is left untouched.
    pub fn abort(&mut self) {
        self.state = NotifierState::Idle;
    }
}
