//! Session lifecycle: wires the phase clock, curve engine and audio
//! manager together and produces one frame per tick for the renderer.

use crate::audio::{AudioManager, AudioState};
use crate::clock::PhaseClock;
use crate::curve::CurveEngine;
use crate::params::{ConfigError, Phase, PhaseDurations, SessionConfig};

/// Everything the renderer needs for one tick.
#[derive(Debug, Clone)]
pub struct Frame {
    pub scale: f32,
    pub glow: f32,
    pub text_opacity: f32,
    pub phase: Phase,
    pub phase_label: &'static str,
    pub cycle: u32,
    pub total_cycles: u32,
    pub audio: AudioState,
}

/// A running breathing session.
///
/// Owns the clock, the curve engine and the audio manager; the caller
/// owns the tick cadence. Audio failures surface only through the frame's
/// [`AudioState`] and can never stall a tick.
pub struct Session {
    clock: PhaseClock,
    curves: CurveEngine,
    audio: AudioManager,
    durations: PhaseDurations,
    total_cycles: u32,
}

impl Session {
    /// Validate the configuration and start the session, kicking off the
    /// non-blocking audio load.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut audio = AudioManager::new(config.audio.clone(), config.cycle_period_ms());
        audio.initialize();

        Ok(Self {
            clock: PhaseClock::new(
                config.durations.clone(),
                config.pattern,
                config.total_cycles,
            ),
            curves: CurveEngine::new(config.easing, config.text_fade_out),
            audio,
            durations: config.durations,
            total_cycles: config.total_cycles,
        })
    }

    /// Advance the session by `delta_ms` and derive the next frame.
    pub fn tick(&mut self, delta_ms: u64) -> Frame {
        self.audio.pump();
        let state = *self.clock.tick(delta_ms);
        let visuals = self
            .curves
            .compute(state.phase, state.elapsed_ms, &self.durations);

        Frame {
            scale: visuals.scale,
            glow: visuals.glow,
            text_opacity: visuals.text_opacity,
            phase: state.phase,
            phase_label: state.phase.label(),
            cycle: state.cycle,
            total_cycles: self.total_cycles,
            audio: self.audio.state(),
        }
    }

    /// User toggle event from the renderer boundary.
    pub fn toggle_audio(&mut self) {
        self.audio.toggle();
    }

    /// Release the tick-independent resources (audio stream, loader).
    /// Safe to call repeatedly; also run on drop.
    pub fn teardown(&mut self) {
        self.audio.teardown();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}
