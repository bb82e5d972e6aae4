//! Breathwave - guided 4-6 breathing exercise
//!
//! Console harness around the breathing engine: drives the session at
//! the fixed tick period and draws each frame as a one-line orb meter.

mod cli;

use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;

use breathwave::clock::TICK_MS;
use breathwave::session::{Frame, Session};
use cli::Args;

fn main() {
    let args = Args::parse();
    let config = args.session_config();

    println!("Breathwave - guided breathing");
    println!(
        "{}s inhale · {}s exhale · {} cycles\n",
        config.durations.inhale_ms / 1000,
        config.durations.exhale_ms / 1000,
        config.total_cycles
    );

    let mut session = match Session::new(config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let start = Instant::now();
    let mut audio_requested = args.audio;

    loop {
        let frame = session.tick(TICK_MS);

        // Honor --audio once the subsystem has settled (asset or tone);
        // earlier toggles would be silently ignored.
        if audio_requested && (frame.audio.loaded || frame.audio.using_fallback) {
            session.toggle_audio();
            audio_requested = false;
        }

        draw(&frame);

        if let Some(limit) = args.duration {
            if start.elapsed().as_secs_f32() >= limit {
                break;
            }
        }
        thread::sleep(Duration::from_millis(TICK_MS));
    }

    session.teardown();
    println!("\nDone.");
}

/// Draw one frame as a single rewritten console line:
/// cycle dots, orb meter scaled by breath, glow level, guidance text.
fn draw(frame: &Frame) {
    let mut dots = String::new();
    for i in 1..=frame.total_cycles {
        dots.push(if i <= frame.cycle { '●' } else { '○' });
    }

    // Map scale [1.0, 1.7] onto a 10..24 character meter.
    let width = (10.0 + (frame.scale - 1.0) * 20.0).round() as usize;
    let meter = "◉".repeat(width);

    let label = if frame.text_opacity > 0.5 {
        frame.phase_label
    } else {
        ""
    };

    print!(
        "\r{} {:<24} glow {:.2} {:<24}",
        dots, meter, frame.glow, label
    );
    let _ = std::io::stdout().flush();
}
