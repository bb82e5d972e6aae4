//! Ambient audio with graceful degradation.
//!
//! The manager tries each asset candidate in order on a loader thread,
//! and synthesizes a low-volume sine tone when every candidate fails or
//! the load deadline passes. Nothing in here blocks or panics on the
//! session's tick path: loader results are drained by `pump()` once per
//! tick, playback runs inside the cpal callback, and every failure mode
//! downgrades to the fallback tone or to silence.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::params::AudioConfig;

/// Fallback envelope: linear attack to peak over 0.1 s, then exponential
/// decay toward a low sustain, effectively settled by 0.5 s.
const ENVELOPE_ATTACK_S: f32 = 0.1;
const ENVELOPE_DECAY_RATE: f32 = 12.0;
const ENVELOPE_SUSTAIN_FRACTION: f32 = 0.25;

/// Recoverable audio failures. None of these ever reach the phase clock;
/// they are recorded in [`AudioState::last_error`] and degrade playback
/// to the fallback tone or to silence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("failed to load {path}: {reason}")]
    AssetLoad { path: String, reason: String },

    #[error("all {0} asset candidates failed")]
    CandidatesExhausted(usize),

    #[error("asset load timed out after {0} ms")]
    TimeoutExceeded(u64),

    #[error("no audio output device available")]
    DeviceUnavailable,

    #[error("audio stream error: {0}")]
    Stream(String),
}

/// Lifecycle position of the audio subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioStatus {
    Uninitialized,
    Loading,
    /// Primary asset decoded and held for looped playback
    Ready,
    /// Candidates exhausted or deadline passed; sine tone stands in
    FallbackReady,
}

/// Per-tick snapshot handed to the renderer.
#[derive(Debug, Clone)]
pub struct AudioState {
    pub enabled: bool,
    pub loaded: bool,
    pub using_fallback: bool,
    pub last_error: Option<AudioError>,
}

/// Events sent from the loader thread back to the manager.
enum LoadEvent {
    Failed { path: String, reason: String },
    Loaded { samples: Arc<Vec<f32>>, sample_rate: u32 },
    Exhausted { attempts: usize },
}

/// Flags shared with the cpal callback. The callback owns its sample
/// cursor locally; the manager only flips these.
struct PlaybackShared {
    playing: AtomicBool,
    restart: AtomicBool,
}

/// Audio manager with exclusive ownership of its device stream, decoded
/// samples, and loader channel.
pub struct AudioManager {
    status: AudioStatus,
    enabled: bool,
    last_error: Option<AudioError>,
    config: AudioConfig,
    /// One full breathing cycle in ms; times the fallback envelope
    cycle_period_ms: u64,
    events: Option<mpsc::Receiver<LoadEvent>>,
    deadline: Option<Instant>,
    asset: Option<(Arc<Vec<f32>>, u32)>,
    stream: Option<cpal::Stream>,
    shared: Arc<PlaybackShared>,
}

impl AudioManager {
    pub fn new(config: AudioConfig, cycle_period_ms: u64) -> Self {
        Self {
            status: AudioStatus::Uninitialized,
            enabled: false,
            last_error: None,
            config,
            cycle_period_ms,
            events: None,
            deadline: None,
            asset: None,
            stream: None,
            shared: Arc::new(PlaybackShared {
                playing: AtomicBool::new(false),
                restart: AtomicBool::new(false),
            }),
        }
    }

    /// Begin the non-blocking asset load and arm the fallback deadline.
    pub fn initialize(&mut self) {
        if self.status != AudioStatus::Uninitialized {
            return;
        }
        let (tx, rx) = mpsc::channel();
        let candidates = self.config.candidates.clone();
        thread::spawn(move || loader_thread(candidates, tx));

        self.events = Some(rx);
        self.deadline =
            Some(Instant::now() + Duration::from_millis(self.config.load_timeout_ms));
        self.status = AudioStatus::Loading;
    }

    /// Drain loader events and enforce the load deadline.
    ///
    /// Called once per session tick; never blocks.
    pub fn pump(&mut self) {
        if self.status != AudioStatus::Loading {
            return;
        }

        let mut outcome = None;
        if let Some(events) = &self.events {
            while let Ok(event) = events.try_recv() {
                match event {
                    LoadEvent::Failed { path, reason } => {
                        self.last_error = Some(AudioError::AssetLoad { path, reason });
                    }
                    LoadEvent::Loaded {
                        samples,
                        sample_rate,
                    } => {
                        outcome = Some(Ok((samples, sample_rate)));
                        break;
                    }
                    LoadEvent::Exhausted { attempts } => {
                        outcome = Some(Err(AudioError::CandidatesExhausted(attempts)));
                        break;
                    }
                }
            }
        }

        match outcome {
            Some(Ok((samples, sample_rate))) => {
                self.asset = Some((samples, sample_rate));
                self.status = AudioStatus::Ready;
                self.deadline = None;
                self.events = None;
            }
            Some(Err(err)) => self.force_fallback(err),
            None => {
                if let Some(deadline) = self.deadline {
                    if Instant::now() >= deadline {
                        self.force_fallback(AudioError::TimeoutExceeded(
                            self.config.load_timeout_ms,
                        ));
                    }
                }
            }
        }
    }

    /// Switch to the synthesized tone. Dropping the receiver also stops
    /// a still-running loader thread at its next send.
    fn force_fallback(&mut self, err: AudioError) {
        self.last_error = Some(err);
        self.status = AudioStatus::FallbackReady;
        self.deadline = None;
        self.events = None;
    }

    /// Flip the enabled flag.
    ///
    /// Silent no-op while not Ready/FallbackReady. Repeated toggles apply
    /// in order; the latest request wins. Enabling restarts playback from
    /// the start (sample 0, or a fresh envelope for the fallback tone);
    /// disabling silences output but keeps the stream and decoded samples
    /// alive for re-enable. A missing output device is recorded and
    /// degrades to silence.
    pub fn toggle(&mut self) {
        if !matches!(self.status, AudioStatus::Ready | AudioStatus::FallbackReady) {
            return;
        }

        self.enabled = !self.enabled;
        if self.enabled {
            if self.stream.is_none() {
                match self.build_stream() {
                    Ok(stream) => self.stream = Some(stream),
                    Err(err) => {
                        self.last_error = Some(err);
                        self.shared.playing.store(false, Ordering::Relaxed);
                        return;
                    }
                }
            }
            self.shared.restart.store(true, Ordering::Relaxed);
            self.shared.playing.store(true, Ordering::Relaxed);
        } else {
            self.shared.playing.store(false, Ordering::Relaxed);
        }
    }

    /// Stop playback and release every audio resource. Safe from any
    /// state, idempotent, and also run on drop.
    pub fn teardown(&mut self) {
        self.shared.playing.store(false, Ordering::Relaxed);
        self.stream = None;
        self.events = None;
        self.deadline = None;
        self.asset = None;
        self.enabled = false;
        self.status = AudioStatus::Uninitialized;
    }

    pub fn status(&self) -> AudioStatus {
        self.status
    }

    pub fn state(&self) -> AudioState {
        AudioState {
            enabled: self.enabled,
            loaded: self.asset.is_some(),
            using_fallback: self.status == AudioStatus::FallbackReady,
            last_error: self.last_error.clone(),
        }
    }

    /// Open the default output device and build the playback stream for
    /// whichever source is available (decoded asset or fallback tone).
    fn build_stream(&self) -> Result<cpal::Stream, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::DeviceUnavailable)?;
        let device_config = device
            .default_output_config()
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        let device_rate = device_config.sample_rate().0;
        let channels = device_config.channels() as usize;
        let shared = Arc::clone(&self.shared);

        let mut render: Box<dyn FnMut() -> f32 + Send> = match &self.asset {
            Some((samples, asset_rate)) => asset_source(
                Arc::clone(samples),
                *asset_rate,
                device_rate,
                Arc::clone(&shared),
            ),
            None => fallback_source(
                self.config.fallback_freq_hz,
                self.config.fallback_gain,
                self.cycle_period_ms,
                device_rate,
                Arc::clone(&shared),
            ),
        };

        let stream = device
            .build_output_stream(
                &device_config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels) {
                        let sample = if shared.playing.load(Ordering::Relaxed) {
                            render()
                        } else {
                            0.0
                        };
                        for out in frame {
                            *out = sample;
                        }
                    }
                },
                |err| eprintln!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| AudioError::Stream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| AudioError::Stream(e.to_string()))?;
        Ok(stream)
    }
}

impl Drop for AudioManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Looped asset playback, stepped at the asset's rate relative to the
/// device rate. The restart flag snaps the cursor back to sample 0.
fn asset_source(
    samples: Arc<Vec<f32>>,
    asset_rate: u32,
    device_rate: u32,
    shared: Arc<PlaybackShared>,
) -> Box<dyn FnMut() -> f32 + Send> {
    let step = asset_rate as f64 / device_rate as f64;
    let mut cursor = 0.0_f64;
    Box::new(move || {
        if shared.restart.swap(false, Ordering::Relaxed) {
            cursor = 0.0;
        }
        let index = cursor as usize % samples.len();
        cursor += step;
        samples[index]
    })
}

/// Synthesized sine tone with a gain envelope retriggered on the
/// breathing-cycle period.
fn fallback_source(
    freq_hz: f32,
    peak_gain: f32,
    cycle_period_ms: u64,
    device_rate: u32,
    shared: Arc<PlaybackShared>,
) -> Box<dyn FnMut() -> f32 + Send> {
    let period_s = (cycle_period_ms as f32 / 1000.0).max(ENVELOPE_ATTACK_S);
    let mut position = 0_u64;
    Box::new(move || {
        if shared.restart.swap(false, Ordering::Relaxed) {
            position = 0;
        }
        let t = position as f32 / device_rate as f32;
        position += 1;

        let cycle_t = t % period_s;
        let gain = peak_gain * envelope(cycle_t);
        (2.0 * PI * freq_hz * t).sin() * gain
    })
}

/// Normalized envelope over time since the last cycle start.
fn envelope(t: f32) -> f32 {
    let sustain = ENVELOPE_SUSTAIN_FRACTION;
    if t < ENVELOPE_ATTACK_S {
        t / ENVELOPE_ATTACK_S
    } else {
        sustain + (1.0 - sustain) * (-ENVELOPE_DECAY_RATE * (t - ENVELOPE_ATTACK_S)).exp()
    }
}

/// Walk the candidate queue in order, reporting each failure and the
/// first success. Runs on its own thread; a dropped receiver ends it.
fn loader_thread(candidates: Vec<String>, tx: mpsc::Sender<LoadEvent>) {
    let attempts = candidates.len();
    for path in candidates {
        match decode_wav(&path) {
            Ok((samples, sample_rate)) => {
                let _ = tx.send(LoadEvent::Loaded {
                    samples: Arc::new(samples),
                    sample_rate,
                });
                return;
            }
            Err(reason) => {
                if tx.send(LoadEvent::Failed { path, reason }).is_err() {
                    return;
                }
            }
        }
    }
    let _ = tx.send(LoadEvent::Exhausted { attempts });
}

/// Decode a WAV file to mono f32 samples.
fn decode_wav(path: &str) -> Result<(Vec<f32>, u32), String> {
    let mut reader = hound::WavReader::open(path).map_err(|e| e.to_string())?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err("zero channels".to_string());
    }

    let raw: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| e.to_string())?,
        hound::SampleFormat::Int => {
            let full_scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<_, _>>()
                .map_err(|e| e.to_string())?
        }
    };
    if raw.is_empty() {
        return Err("no samples".to_string());
    }

    let mono = raw
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(candidates: Vec<String>, timeout_ms: u64) -> AudioConfig {
        AudioConfig {
            candidates,
            load_timeout_ms: timeout_ms,
            ..AudioConfig::default()
        }
    }

    /// Pump until the manager leaves Loading or the deadline passes.
    fn pump_until_settled(manager: &mut AudioManager, budget_ms: u64) {
        let start = Instant::now();
        while manager.status() == AudioStatus::Loading
            && start.elapsed() < Duration::from_millis(budget_ms)
        {
            manager.pump();
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn write_test_wav(samples: u32) -> String {
        let path = std::env::temp_dir().join(format!(
            "breathwave_test_{}_{}.wav",
            std::process::id(),
            samples
        ));
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..samples {
            writer.write_sample((i % 128) as i16).unwrap();
        }
        writer.finalize().unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_toggle_ignored_before_ready() {
        let mut manager = AudioManager::new(test_config(vec![], 1000), 10000);
        manager.toggle();
        assert!(!manager.state().enabled);
        assert_eq!(manager.status(), AudioStatus::Uninitialized);
    }

    #[test]
    fn test_all_candidates_failing_reaches_fallback() {
        let candidates = vec![
            "/nonexistent/primary.wav".to_string(),
            "/nonexistent/backup.wav".to_string(),
        ];
        let mut manager = AudioManager::new(test_config(candidates, 2000), 10000);
        manager.initialize();
        pump_until_settled(&mut manager, 2000);

        assert_eq!(manager.status(), AudioStatus::FallbackReady);
        let state = manager.state();
        assert!(!state.loaded);
        assert!(state.using_fallback);
        assert!(state.last_error.is_some());

        // Starting the oscillator must not panic, even headless; a
        // missing device downgrades to silence.
        manager.toggle();
        assert!(manager.state().enabled);
    }

    #[test]
    fn test_zero_timeout_forces_fallback() {
        let mut manager = AudioManager::new(test_config(vec![], 0), 10000);
        manager.initialize();
        pump_until_settled(&mut manager, 500);
        assert_eq!(manager.status(), AudioStatus::FallbackReady);
    }

    #[test]
    fn test_loads_generated_wav() {
        let path = write_test_wav(441);
        let mut manager = AudioManager::new(test_config(vec![path.clone()], 2000), 10000);
        manager.initialize();
        pump_until_settled(&mut manager, 2000);

        assert_eq!(manager.status(), AudioStatus::Ready);
        let state = manager.state();
        assert!(state.loaded);
        assert!(!state.using_fallback);

        // Teardown from Ready releases the decoded asset too.
        manager.teardown();
        assert!(!manager.state().loaded);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_retry_skips_bad_candidate() {
        let good = write_test_wav(256);
        let candidates = vec!["/nonexistent/first.wav".to_string(), good.clone()];
        let mut manager = AudioManager::new(test_config(candidates, 2000), 10000);
        manager.initialize();
        pump_until_settled(&mut manager, 2000);

        assert_eq!(manager.status(), AudioStatus::Ready);
        // The failed first candidate was recorded on the way through.
        assert!(matches!(
            manager.state().last_error,
            Some(AudioError::AssetLoad { .. })
        ));

        let _ = std::fs::remove_file(good);
    }

    #[test]
    fn test_double_toggle_restores_enabled() {
        let mut manager = AudioManager::new(test_config(vec![], 0), 10000);
        manager.initialize();
        pump_until_settled(&mut manager, 500);
        assert_eq!(manager.status(), AudioStatus::FallbackReady);

        let before = manager.state().enabled;
        manager.toggle();
        manager.toggle();
        assert_eq!(manager.state().enabled, before);
    }

    #[test]
    fn test_teardown_from_every_state() {
        // Uninitialized
        let mut manager = AudioManager::new(test_config(vec![], 1000), 10000);
        manager.teardown();
        manager.teardown();

        // Loading
        let mut manager =
            AudioManager::new(test_config(vec!["/nonexistent/a.wav".to_string()], 5000), 10000);
        manager.initialize();
        manager.teardown();
        assert_eq!(manager.status(), AudioStatus::Uninitialized);

        // FallbackReady, enabled
        let mut manager = AudioManager::new(test_config(vec![], 0), 10000);
        manager.initialize();
        pump_until_settled(&mut manager, 500);
        manager.toggle();
        manager.teardown();
        let state = manager.state();
        assert!(!state.enabled);
        assert_eq!(manager.status(), AudioStatus::Uninitialized);

        // Toggle after teardown is a no-op again.
        manager.toggle();
        assert!(!manager.state().enabled);
    }

    #[test]
    fn test_envelope_shape() {
        // Linear attack to peak at 0.1 s.
        assert!((envelope(0.0) - 0.0).abs() < 1e-6);
        assert!((envelope(0.05) - 0.5).abs() < 1e-6);
        assert!((envelope(ENVELOPE_ATTACK_S) - 1.0).abs() < 1e-3);

        // Settled near the sustain level by 0.5 s.
        let settled = envelope(0.5);
        assert!(settled < ENVELOPE_SUSTAIN_FRACTION + 0.02);
        assert!(settled >= ENVELOPE_SUSTAIN_FRACTION);
    }

    #[test]
    fn test_decode_rejects_missing_file() {
        assert!(decode_wav("/nonexistent/missing.wav").is_err());
    }

    #[test]
    fn test_decode_normalizes_int_samples() {
        let path = write_test_wav(64);
        let (samples, rate) = decode_wav(&path).unwrap();
        assert_eq!(rate, 44100);
        assert_eq!(samples.len(), 64);
        assert!(samples.iter().all(|s| s.abs() <= 1.0));
        let _ = std::fs::remove_file(path);
    }
}
