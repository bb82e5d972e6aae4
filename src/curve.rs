//! Animation curve derivation for the breathing indicator.
//!
//! Pure, total functions from clock position to visual parameters.
//! Nothing here can fail: configuration validation guarantees positive
//! phase durations, and progress is clamped to [0, 1] regardless.

use crate::params::{Easing, Phase, PhaseDurations};

/// Orb scale bounds: the indicator breathes between 1.0x and 1.7x.
const SCALE_SPAN: f32 = 0.7;

/// Glow intensity bounds.
const GLOW_MIN: f32 = 0.6;
const GLOW_SPAN: f32 = 0.4;

/// Fraction of a phase over which guidance text fades in (and out).
const TEXT_FADE_FRACTION: f32 = 0.15;

/// Visual parameters consumed by the renderer each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visuals {
    /// Orb scale factor in [1.0, 1.7]
    pub scale: f32,
    /// Glow intensity in [0.6, 1.0]
    pub glow: f32,
    /// Guidance text opacity in [0.0, 1.0]
    pub text_opacity: f32,
}

/// Curve engine with the selected exhale easing and text fade policy.
pub struct CurveEngine {
    easing: Easing,
    text_fade_out: bool,
}

impl CurveEngine {
    pub fn new(easing: Easing, text_fade_out: bool) -> Self {
        Self {
            easing,
            text_fade_out,
        }
    }

    /// Derive visual parameters for a clock position.
    pub fn compute(&self, phase: Phase, elapsed_ms: u64, durations: &PhaseDurations) -> Visuals {
        let duration = durations.get(phase);
        let progress = (elapsed_ms as f32 / duration as f32).clamp(0.0, 1.0);

        Visuals {
            scale: self.scale(phase, progress),
            glow: glow(phase, progress),
            text_opacity: self.text_opacity(phase, progress),
        }
    }

    /// Orb scale: quadratic ease-in expansion on inhale, eased
    /// contraction on exhale, resting size during the pause.
    fn scale(&self, phase: Phase, progress: f32) -> f32 {
        match phase {
            Phase::Inhale => {
                let eased = 1.0 - (1.0 - progress).powi(2);
                1.0 + SCALE_SPAN * eased
            }
            Phase::Exhale => {
                let contraction = match self.easing {
                    Easing::Blended => {
                        0.7 * progress + 0.3 * (1.0 - (1.0 - progress).powf(1.2))
                    }
                    Easing::EaseOut => progress.powf(0.3),
                };
                1.0 + SCALE_SPAN - SCALE_SPAN * contraction
            }
            Phase::Pause => 1.0,
        }
    }

    /// Guidance text opacity: fade in over the first 15% of the phase,
    /// optionally fade out over the last 15%. The pause shows no text.
    fn text_opacity(&self, phase: Phase, progress: f32) -> f32 {
        if phase == Phase::Pause {
            return 0.0;
        }
        if progress < TEXT_FADE_FRACTION {
            progress / TEXT_FADE_FRACTION
        } else if self.text_fade_out && progress > 1.0 - TEXT_FADE_FRACTION {
            (1.0 - progress) / TEXT_FADE_FRACTION
        } else {
            1.0
        }
    }
}

/// Glow ramps up with the inhale, back down with the exhale, and rests
/// at its floor during the pause.
fn glow(phase: Phase, progress: f32) -> f32 {
    match phase {
        Phase::Inhale => GLOW_MIN + GLOW_SPAN * progress,
        Phase::Exhale => GLOW_MIN + GLOW_SPAN * (1.0 - progress),
        Phase::Pause => GLOW_MIN,
    }
}
