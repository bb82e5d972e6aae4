//! Parameter definitions with physical units and documented semantics.
//!
//! Everything the engine can be configured with lives here:
//! - Phase durations in milliseconds, with documented defaults
//! - Phase pattern selection (with or without the between-cycle pause)
//! - Audio asset candidates and load timeout
//! - Validation that rejects unusable configurations up front

use thiserror::Error;

/// A named stage of the breathing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Inhale,
    Exhale,
    Pause,
}

impl Phase {
    /// Guidance text shown while this phase is active.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Inhale => "Inhale",
            Phase::Exhale => "Now exhale slowly...",
            Phase::Pause => "",
        }
    }
}

/// Which phases make up one breathing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhasePattern {
    /// Inhale → Exhale
    TwoPhase,
    /// Inhale → Exhale → Pause (pause skipped on the final cycle)
    ThreePhase,
}

/// Per-phase durations (milliseconds).
///
/// Defaults follow the 4-6 breathing method: 4 s inhale, 6 s exhale,
/// 1 s pause between cycles.
#[derive(Debug, Clone)]
pub struct PhaseDurations {
    pub inhale_ms: u64,
    pub exhale_ms: u64,
    pub pause_ms: u64,
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            inhale_ms: 4000,
            exhale_ms: 6000,
            pause_ms: 1000,
        }
    }
}

impl PhaseDurations {
    /// Duration of the given phase in milliseconds.
    pub fn get(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Inhale => self.inhale_ms,
            Phase::Exhale => self.exhale_ms,
            Phase::Pause => self.pause_ms,
        }
    }
}

/// Exhale easing variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    /// Weighted blend of linear and slow ease-out (default)
    Blended,
    /// Pure ease-out with exponent 0.3 (fast initial release)
    EaseOut,
}

/// Audio subsystem configuration.
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Ordered asset candidates, primary path first (WAV files)
    pub candidates: Vec<String>,

    /// Deadline for the whole load attempt (milliseconds);
    /// fallback tone synthesis is forced when it elapses
    pub load_timeout_ms: u64,

    /// Fallback oscillator frequency (Hz)
    pub fallback_freq_hz: f32,

    /// Fallback oscillator peak gain (linear, kept low on purpose)
    pub fallback_gain: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            candidates: vec!["assets/ambient.wav".to_string()],
            load_timeout_ms: 4000,
            fallback_freq_hz: 220.0,
            fallback_gain: 0.08,
        }
    }
}

/// Full session configuration, supplied externally (CLI or embedding code).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub durations: PhaseDurations,

    /// Number of cycles before the counter wraps back to 1
    pub total_cycles: u32,

    pub pattern: PhasePattern,

    pub easing: Easing,

    /// Fade guidance text back out over the last 15% of each phase.
    /// Disable when the text should persist across a merged visual phase.
    pub text_fade_out: bool,

    pub audio: AudioConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            durations: PhaseDurations::default(),
            total_cycles: 4,
            pattern: PhasePattern::ThreePhase,
            easing: Easing::Blended,
            text_fade_out: true,
            audio: AudioConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Validate the configuration.
    ///
    /// Only durations reachable under the configured pattern are checked;
    /// a two-phase session never enters Pause, so its pause duration may
    /// be anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.durations.inhale_ms == 0 {
            return Err(ConfigError::NonPositiveDuration(Phase::Inhale));
        }
        if self.durations.exhale_ms == 0 {
            return Err(ConfigError::NonPositiveDuration(Phase::Exhale));
        }
        if self.pattern == PhasePattern::ThreePhase && self.durations.pause_ms == 0 {
            return Err(ConfigError::NonPositiveDuration(Phase::Pause));
        }
        if self.total_cycles == 0 {
            return Err(ConfigError::ZeroCycles);
        }
        Ok(())
    }

    /// Length of one full breathing cycle (milliseconds), used to time
    /// the fallback tone envelope to the rhythm.
    pub fn cycle_period_ms(&self) -> u64 {
        let base = self.durations.inhale_ms + self.durations.exhale_ms;
        match self.pattern {
            PhasePattern::TwoPhase => base,
            PhasePattern::ThreePhase => base + self.durations.pause_ms,
        }
    }
}

/// Configuration errors, fatal at construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0:?} duration must be greater than zero")]
    NonPositiveDuration(Phase),

    #[error("total_cycles must be at least 1")]
    ZeroCycles,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_inhale_rejected() {
        let mut config = SessionConfig::default();
        config.durations.inhale_ms = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonPositiveDuration(Phase::Inhale))
        );
    }

    #[test]
    fn test_zero_pause_rejected_only_for_three_phase() {
        let mut config = SessionConfig::default();
        config.durations.pause_ms = 0;
        assert!(config.validate().is_err());

        config.pattern = PhasePattern::TwoPhase;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_cycles_rejected() {
        let mut config = SessionConfig::default();
        config.total_cycles = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroCycles));
    }

    #[test]
    fn test_cycle_period_tracks_pattern() {
        let mut config = SessionConfig::default();
        assert_eq!(config.cycle_period_ms(), 4000 + 6000 + 1000);

        config.pattern = PhasePattern::TwoPhase;
        assert_eq!(config.cycle_period_ms(), 4000 + 6000);
    }
}
