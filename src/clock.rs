//! Fixed-tick phase clock driving the breathing cycle state machine.
//!
//! The clock holds no wall-clock time of its own: the caller injects
//! elapsed time through `tick(delta_ms)`, so tests can advance the
//! machine deterministically and the harness can drive it from a real
//! 100 ms interval.

use crate::params::{Phase, PhaseDurations, PhasePattern};

/// Tick period the harness drives the clock at (milliseconds).
pub const TICK_MS: u64 = 100;

/// Current position within the breathing session.
///
/// Invariants, upheld by [`PhaseClock::tick`]:
/// - `0 <= elapsed_ms < duration(phase)`
/// - `1 <= cycle <= total_cycles`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleState {
    pub phase: Phase,
    pub cycle: u32,
    pub elapsed_ms: u64,
}

/// Deterministic finite state machine over the configured phase set.
pub struct PhaseClock {
    state: CycleState,
    durations: PhaseDurations,
    pattern: PhasePattern,
    total_cycles: u32,
}

impl PhaseClock {
    /// Create a clock at the start of the session: `(Inhale, 1, 0)`.
    ///
    /// Durations must already be validated (strictly positive for every
    /// phase the pattern can reach); given that, no invalid state is
    /// reachable and the machine never errors.
    pub fn new(durations: PhaseDurations, pattern: PhasePattern, total_cycles: u32) -> Self {
        Self {
            state: CycleState {
                phase: Phase::Inhale,
                cycle: 1,
                elapsed_ms: 0,
            },
            durations,
            pattern,
            total_cycles,
        }
    }

    pub fn state(&self) -> &CycleState {
        &self.state
    }

    /// Advance the clock by `delta_ms`.
    ///
    /// A phase transition fires when `elapsed + delta` reaches the phase
    /// duration; elapsed resets to 0 and any overshoot beyond the boundary
    /// is discarded rather than carried into the next phase.
    pub fn tick(&mut self, delta_ms: u64) -> &CycleState {
        let duration = self.durations.get(self.state.phase);
        if self.state.elapsed_ms + delta_ms >= duration {
            self.advance();
        } else {
            self.state.elapsed_ms += delta_ms;
        }
        &self.state
    }

    /// Apply one phase transition and reset elapsed time.
    fn advance(&mut self) {
        let (next_phase, next_cycle) = match (self.pattern, self.state.phase) {
            (_, Phase::Inhale) => (Phase::Exhale, self.state.cycle),

            // Two-phase: the cycle turns over on Exhale -> Inhale,
            // wrapping back to 1 for a seamless loop.
            (PhasePattern::TwoPhase, Phase::Exhale) => {
                if self.state.cycle < self.total_cycles {
                    (Phase::Inhale, self.state.cycle + 1)
                } else {
                    (Phase::Inhale, 1)
                }
            }

            // Three-phase: pause between cycles, except after the final
            // exhale, which loops straight back to the first inhale.
            (PhasePattern::ThreePhase, Phase::Exhale) => {
                if self.state.cycle < self.total_cycles {
                    (Phase::Pause, self.state.cycle)
                } else {
                    (Phase::Inhale, 1)
                }
            }
            (_, Phase::Pause) => (Phase::Inhale, self.state.cycle + 1),
        };

        self.state = CycleState {
            phase: next_phase,
            cycle: next_cycle,
            elapsed_ms: 0,
        };
    }
}
