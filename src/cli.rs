//! Command-line argument parsing.

use clap::Parser;

use breathwave::params::{
    AudioConfig, Easing, PhaseDurations, PhasePattern, SessionConfig,
};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Breathwave")]
#[command(about = "Guided 4-6 breathing exercise", long_about = None)]
pub struct Args {
    /// Inhale duration (milliseconds)
    #[arg(long, value_name = "MS", default_value = "4000")]
    pub inhale_ms: u64,

    /// Exhale duration (milliseconds)
    #[arg(long, value_name = "MS", default_value = "6000")]
    pub exhale_ms: u64,

    /// Pause duration between cycles (milliseconds, three-phase only)
    #[arg(long, value_name = "MS", default_value = "1000")]
    pub pause_ms: u64,

    /// Cycles before the counter wraps
    #[arg(long, default_value = "4")]
    pub cycles: u32,

    /// Phase pattern: two (inhale/exhale) or three (adds pause)
    #[arg(long, value_name = "PATTERN", default_value = "three")]
    pub pattern: String,

    /// Exhale easing: blended or ease-out
    #[arg(long, value_name = "EASING", default_value = "blended")]
    pub easing: String,

    /// Ambient audio candidate, primary first (repeatable)
    #[arg(long = "audio-file", value_name = "PATH")]
    pub audio_files: Vec<String>,

    /// Audio load deadline before fallback tone synthesis (milliseconds)
    #[arg(long, value_name = "MS", default_value = "4000")]
    pub audio_timeout_ms: u64,

    /// Enable ambient audio as soon as it is ready
    #[arg(long)]
    pub audio: bool,

    /// Stop after this many seconds (runs until Ctrl+C otherwise)
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<f32>,
}

impl Args {
    /// Parse phase pattern from command-line arguments
    pub fn parse_pattern(&self) -> PhasePattern {
        match self.pattern.to_lowercase().as_str() {
            "two" => PhasePattern::TwoPhase,
            "three" => PhasePattern::ThreePhase,
            other => {
                eprintln!("Warning: Unknown pattern '{}', using three", other);
                PhasePattern::ThreePhase
            }
        }
    }

    /// Parse exhale easing from command-line arguments
    pub fn parse_easing(&self) -> Easing {
        match self.easing.to_lowercase().as_str() {
            "blended" => Easing::Blended,
            "ease-out" => Easing::EaseOut,
            other => {
                eprintln!("Warning: Unknown easing '{}', using blended", other);
                Easing::Blended
            }
        }
    }

    /// Assemble the full session configuration
    pub fn session_config(&self) -> SessionConfig {
        let mut audio = AudioConfig::default();
        if !self.audio_files.is_empty() {
            audio.candidates = self.audio_files.clone();
        }
        audio.load_timeout_ms = self.audio_timeout_ms;

        SessionConfig {
            durations: PhaseDurations {
                inhale_ms: self.inhale_ms,
                exhale_ms: self.exhale_ms,
                pause_ms: self.pause_ms,
            },
            total_cycles: self.cycles,
            pattern: self.parse_pattern(),
            easing: self.parse_easing(),
            text_fade_out: true,
            audio,
        }
    }
}
