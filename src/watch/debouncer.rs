use std::time::{Duration, Instant};

/// Default quiet period before a rebuild.
pub const DEBOUNCE_MS: u64 = 300;

/// Single-slot build state for the watched file.
///
/// ```text
/// Idle ──change──▶ Pending ──deadline──▶ Building ──done──▶ Idle
///                    ▲  │change resets         │change sets rerun
///                    └──┘                       └──done + rerun──▶ Pending
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Phase {
    Idle,
    Pending { deadline: Instant },
    Building { rerun: bool },
}

/// Pure debouncer: timing and the in-flight slot, no I/O.
pub(super) struct Debouncer {
    pub(super) phase: Phase,
    delay: Duration,
}

impl Debouncer {
    pub(super) fn new(delay: Duration) -> Self {
        Self {
            phase: Phase::Idle,
            delay,
        }
    }

    /// Record a relevant change at `now`.
    pub(super) fn on_change(&mut self, now: Instant) {
        self.phase = match self.phase {
            Phase::Idle | Phase::Pending { .. } => Phase::Pending {
                deadline: now + self.delay,
            },
            Phase::Building { .. } => Phase::Building { rerun: true },
        };
    }

    /// When the pending timer fires, if any.
    pub(super) fn deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Pending { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Claim the build slot if the quiet period has elapsed.
    ///
    /// Returns `true` exactly once per settled burst; the caller must start
    /// a build and later call [`finish`](Self::finish).
    pub(super) fn try_start(&mut self, now: Instant) -> bool {
        match self.phase {
            Phase::Pending { deadline } if now >= deadline => {
                self.phase = Phase::Building { rerun: false };
                true
            }
            _ => false,
        }
    }

    /// Release the build slot. A change seen during the build schedules one
    /// follow-up, debounced from now.
    pub(super) fn finish(&mut self, now: Instant) {
        self.phase = match self.phase {
            Phase::Building { rerun: true } => Phase::Pending {
                deadline: now + self.delay,
            },
            _ => Phase::Idle,
        };
    }

    pub(super) fn is_building(&self) -> bool {
        matches!(self.phase, Phase::Building { .. })
    }
}
